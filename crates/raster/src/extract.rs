//! Raster metadata extraction.

use std::time::Instant;

use mapdrop_common::{DatasetKind, LayerMetadata, RasterMetadata};
use projection::{identify_epsg, CoordinateTransform, Crs, ProjTransform};
use rayon::prelude::*;
use tracing::{debug, info};

use crate::footprint::footprint;
use crate::stats::band_stats;
use crate::{RasterDataset, Result};

/// Derive metadata for an open raster, transforming the footprint with `to_wgs84`.
pub fn extract_metadata(
    dataset: &dyn RasterDataset,
    to_wgs84: &dyn CoordinateTransform,
) -> Result<RasterMetadata> {
    let start = Instant::now();
    let crs = dataset.projection().to_string();
    let epsg = identify_epsg(&crs);
    let geotransform = dataset.geotransform();

    let fp = footprint(&geotransform, dataset.width(), dataset.height(), to_wgs84)?;

    let mut bands = Vec::with_capacity(dataset.band_count());
    for band in 1..=dataset.band_count() {
        bands.push((
            band,
            dataset.band_datatype(band)?,
            dataset.band_nodata(band)?,
            dataset.read_band(band)?,
        ));
    }

    let layers = bands
        .into_par_iter()
        .map(|(band, datatype, nodata, values)| LayerMetadata {
            datatype: datatype.gdal_code(),
            nodata,
            name: format!("b{}", band),
            stats: band_stats(&values, nodata),
        })
        .collect::<Vec<_>>();

    for layer in layers.iter().filter(|l| l.stats.is_none()) {
        debug!(band = %layer.name, "Band is fully masked, no statistics");
    }

    info!(
        epsg = ?epsg,
        width = dataset.width(),
        height = dataset.height(),
        bands = layers.len(),
        elapsed_ms = start.elapsed().as_millis() as u64,
        "Extracted raster metadata"
    );

    Ok(RasterMetadata {
        crs,
        epsg,
        geotransform: geotransform.0,
        width: dataset.width(),
        height: dataset.height(),
        layers,
        extent: fp.extent.to_wkt(),
        envelope: fp.envelope.to_wkt(),
        kind: DatasetKind::Raster,
    })
}

/// Extracts metadata using the raster's own projection for the footprint.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetadataExtractor;

impl MetadataExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Resolve the raster's projection, then [`extract_metadata`].
    ///
    /// Fails with a projection error when the projection text cannot be
    /// resolved or a footprint point cannot be transformed.
    pub fn extract(&self, dataset: &dyn RasterDataset) -> Result<RasterMetadata> {
        let source = Crs::from_definition(dataset.projection())?;
        let to_wgs84 = ProjTransform::between(&source, &Crs::wgs84())?;
        extract_metadata(dataset, to_wgs84.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DataType, GeoTransform, MemRaster, RasterError};
    use projection::IdentityTransform;

    fn sample_raster(projection: &str) -> MemRaster {
        let values: Vec<f64> = (0..16).map(|v| v as f64).collect();
        MemRaster::new(4, 4, GeoTransform::north_up(10.0, 50.0, 0.5, -0.5), projection)
            .with_band(DataType::Int16, Some(0.0), values)
            .unwrap()
    }

    #[test]
    fn test_layer_metadata() {
        let meta = extract_metadata(&sample_raster("EPSG:4326"), &IdentityTransform).unwrap();

        assert_eq!(meta.epsg, Some(4326));
        assert_eq!(meta.width, 4);
        assert_eq!(meta.height, 4);
        assert_eq!(meta.geotransform, [10.0, 0.5, 0.0, 50.0, 0.0, -0.5]);
        assert_eq!(meta.layers.len(), 1);

        let layer = &meta.layers[0];
        assert_eq!(layer.name, "b1");
        assert_eq!(layer.datatype, 3);
        assert_eq!(layer.nodata, Some(0.0));
        let stats = layer.stats.as_ref().unwrap();
        assert_eq!(stats.min, 1.0);
        assert_eq!(stats.max, 15.0);
        assert_eq!(stats.avg, 8.0);
    }

    #[test]
    fn test_extractor_geographic_footprint() {
        let meta = MetadataExtractor::new()
            .extract(&sample_raster("EPSG:4326"))
            .unwrap();
        assert_eq!(
            meta.envelope,
            "POLYGON ((12 48, 12 50, 10 50, 10 48, 12 48))"
        );
    }

    #[test]
    fn test_unidentified_projection_fails() {
        let err = MetadataExtractor::new()
            .extract(&sample_raster("LOCAL_CS[\"nowhere\"]"))
            .unwrap_err();
        assert!(matches!(err, RasterError::Projection(_)));
    }

    #[test]
    fn test_band_names_are_one_based() {
        let raster = MemRaster::new(1, 1, GeoTransform::default(), "EPSG:4326")
            .with_band(DataType::Byte, None, vec![1.0])
            .unwrap()
            .with_band(DataType::Byte, None, vec![2.0])
            .unwrap()
            .with_band(DataType::Byte, None, vec![3.0])
            .unwrap();
        let meta = extract_metadata(&raster, &IdentityTransform).unwrap();
        let names: Vec<_> = meta.layers.iter().map(|l| l.name.as_str()).collect();
        assert_eq!(names, ["b1", "b2", "b3"]);
    }
}
