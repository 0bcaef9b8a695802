//! Band planes handed to the colormap engine.

use raster::RasterDataset;

use crate::error::{RenderError, Result};

/// Band-major `f64` planes of one grid with a mask per band.
///
/// A cell is masked when it equals the nodata value the band was added with,
/// or when it is NaN.
#[derive(Debug, Clone, PartialEq)]
pub struct PixelBuffer {
    width: usize,
    height: usize,
    bands: Vec<Vec<f64>>,
    masks: Vec<Vec<bool>>,
}

impl PixelBuffer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            bands: Vec::new(),
            masks: Vec::new(),
        }
    }

    /// Append a band, masking cells equal to `nodata`.
    pub fn push_band(&mut self, values: Vec<f64>, nodata: Option<f64>) -> Result<()> {
        let expected = self.width * self.height;
        if values.len() != expected {
            return Err(RenderError::SizeMismatch {
                expected,
                actual: values.len(),
            });
        }
        let mask = values
            .iter()
            .map(|v| v.is_nan() || nodata.map_or(false, |nd| *v == nd))
            .collect();
        self.bands.push(values);
        self.masks.push(mask);
        Ok(())
    }

    pub fn with_band(mut self, values: Vec<f64>, nodata: Option<f64>) -> Result<Self> {
        self.push_band(values, nodata)?;
        Ok(self)
    }

    /// Read every band of `dataset`, masking all of them against `nodata`.
    pub fn from_dataset(dataset: &dyn RasterDataset, nodata: Option<f64>) -> Result<Self> {
        let mut buffer = Self::new(dataset.width(), dataset.height());
        for band in 1..=dataset.band_count() {
            buffer.push_band(dataset.read_band(band)?, nodata)?;
        }
        Ok(buffer)
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn len(&self) -> usize {
        self.width * self.height
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn band_count(&self) -> usize {
        self.bands.len()
    }

    /// Values of a 0-based band.
    pub fn band(&self, index: usize) -> Option<&[f64]> {
        self.bands.get(index).map(Vec::as_slice)
    }

    /// Mask of a 0-based band, `true` where masked.
    pub fn mask(&self, index: usize) -> Option<&[bool]> {
        self.masks.get(index).map(Vec::as_slice)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use raster::{DataType, GeoTransform, MemRaster};

    #[test]
    fn test_mask_nodata_and_nan() {
        let buf = PixelBuffer::new(2, 2)
            .with_band(vec![1.0, -1.0, f64::NAN, 4.0], Some(-1.0))
            .unwrap();
        assert_eq!(buf.mask(0).unwrap(), &[false, true, true, false]);
    }

    #[test]
    fn test_wrong_size_rejected() {
        let err = PixelBuffer::new(2, 2).with_band(vec![1.0], None).unwrap_err();
        assert!(matches!(
            err,
            RenderError::SizeMismatch {
                expected: 4,
                actual: 1
            }
        ));
    }

    #[test]
    fn test_from_dataset_masks_every_band_with_one_value() {
        let raster = MemRaster::new(2, 1, GeoTransform::default(), "EPSG:3857")
            .with_band(DataType::Byte, Some(0.0), vec![0.0, 5.0])
            .unwrap()
            .with_band(DataType::Byte, Some(9.0), vec![5.0, 0.0])
            .unwrap();
        let buf = PixelBuffer::from_dataset(&raster, Some(0.0)).unwrap();
        assert_eq!(buf.band_count(), 2);
        assert_eq!(buf.mask(0).unwrap(), &[true, false]);
        assert_eq!(buf.mask(1).unwrap(), &[false, true]);
    }
}
