//! Nearest-neighbour warping into a Web Mercator grid.

use mapdrop_common::{BoundingBox, TileCoord};
use projection::{CoordinateTransform, Crs, ProjTransform, EPSG_WEB_MERCATOR};
use tracing::debug;

use crate::{GeoTransform, MemRaster, RasterDataset, Result};

/// Warp every band of `dataset` into `bounds` at `width` x `height`.
///
/// `dst_to_src` maps target coordinates into the dataset CRS. Each target
/// pixel takes the source cell under its center. Values are cast to band 1's
/// datatype; cells with no source take band 1's nodata, or 0 without one.
/// The result carries band 1's datatype and nodata on every band.
pub fn warp_to_bounds(
    dataset: &dyn RasterDataset,
    dst_to_src: &dyn CoordinateTransform,
    bounds: &BoundingBox,
    width: usize,
    height: usize,
) -> Result<MemRaster> {
    let datatype = dataset.band_datatype(1)?;
    let nodata = dataset.band_nodata(1)?;
    let fill = datatype.cast(nodata.unwrap_or(0.0));

    let dst_gt = GeoTransform::north_up(
        bounds.min_x,
        bounds.max_y,
        bounds.width() / width as f64,
        -bounds.height() / height as f64,
    );
    let lookup = source_lookup(dataset, dst_to_src, &dst_gt, width, height);
    let cells: Vec<usize> = lookup.iter().flatten().copied().collect();

    let mut warped = MemRaster::new(width, height, dst_gt, format!("EPSG:{}", EPSG_WEB_MERCATOR));
    for band in 1..=dataset.band_count() {
        let mut sampled = dataset.read_cells(band, &cells)?.into_iter();
        let values = lookup
            .iter()
            .map(|cell| match cell {
                Some(_) => sampled.next().map_or(fill, |v| datatype.cast(v)),
                None => fill,
            })
            .collect();
        warped.add_band(datatype, nodata, values)?;
    }

    Ok(warped)
}

/// Source cell index for each target pixel, `None` outside the source.
fn source_lookup(
    dataset: &dyn RasterDataset,
    dst_to_src: &dyn CoordinateTransform,
    dst_gt: &GeoTransform,
    width: usize,
    height: usize,
) -> Vec<Option<usize>> {
    let src_gt = dataset.geotransform();
    let (src_w, src_h) = (dataset.width(), dataset.height());
    let mut lookup = Vec::with_capacity(width * height);
    let mut missed = 0usize;

    for row in 0..height {
        for col in 0..width {
            let (x, y) = dst_gt.pixel_to_geo(col as f64 + 0.5, row as f64 + 0.5);
            let cell = dst_to_src
                .transform(x, y)
                .ok()
                .and_then(|(sx, sy)| src_gt.geo_to_pixel(sx, sy))
                .and_then(|(c, r)| {
                    let (c, r) = (c.floor(), r.floor());
                    if c < 0.0 || r < 0.0 || c >= src_w as f64 || r >= src_h as f64 {
                        return None;
                    }
                    Some(r as usize * src_w + c as usize)
                });
            if cell.is_none() {
                missed += 1;
            }
            lookup.push(cell);
        }
    }

    debug!(
        pixels = width * height,
        outside = missed,
        "Computed warp lookup"
    );
    lookup
}

/// Warp a raster into the Web Mercator bounds of a tile.
pub fn warp_tile(
    dataset: &dyn RasterDataset,
    tile: TileCoord,
    width: usize,
    height: usize,
) -> Result<MemRaster> {
    let source = Crs::from_definition(dataset.projection())?;
    let dst_to_src = ProjTransform::between(&Crs::web_mercator(), &source)?;
    warp_to_bounds(dataset, dst_to_src.as_ref(), &tile.xy_bounds(), width, height)
}
