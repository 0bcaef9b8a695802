//! Test data generators for synthetic rasters.
//!
//! These generators create predictable, verifiable patterns that can be used
//! across the test suite.

/// Creates a test grid with predictable values.
///
/// Each cell value is calculated as: `col * 1000 + row`
///
/// # Example
///
/// ```
/// use test_utils::create_test_grid;
///
/// let grid = create_test_grid(10, 5);
/// assert_eq!(grid.len(), 50);
/// assert_eq!(grid[1], 1000.0); // col=1, row=0
/// assert_eq!(grid[10], 1.0);   // col=0, row=1
/// ```
pub fn create_test_grid(width: usize, height: usize) -> Vec<f32> {
    let mut data = Vec::with_capacity(width * height);
    for row in 0..height {
        for col in 0..width {
            data.push((col * 1000 + row) as f32);
        }
    }
    data
}

/// Row-major ramp `0, 1, 2, ...` of `width * height` cells.
pub fn create_ramp(width: usize, height: usize) -> Vec<f32> {
    (0..width * height).map(|v| v as f32).collect()
}

/// Interleaved RGB samples where every pixel is `(r, g, b)`.
pub fn create_solid_rgb(width: usize, height: usize, rgb: [u8; 3]) -> Vec<u8> {
    rgb.iter().copied().cycle().take(width * height * 3).collect()
}

/// Replace every cell on the outer border with `value`.
pub fn with_border(mut data: Vec<f32>, width: usize, height: usize, value: f32) -> Vec<f32> {
    for row in 0..height {
        for col in 0..width {
            if row == 0 || col == 0 || row == height - 1 || col == width - 1 {
                data[row * width + col] = value;
            }
        }
    }
    data
}
