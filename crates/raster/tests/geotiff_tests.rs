//! GeoTIFF backend and extraction against files written by test-utils.

use raster::{
    DataType, GeoTiffOpener, MetadataExtractor, RasterDataset, RasterError, RasterOpener,
};
use test_utils::{assert_approx_eq, create_ramp, create_solid_rgb, GeoTiffSpec, TestDataDir};

// ============================================================================
// Reading
// ============================================================================

#[test]
fn test_open_single_band_geotiff() {
    let dir = TestDataDir::new().unwrap();
    let spec = GeoTiffSpec::wgs84(4, 3, (10.0, 50.0), 0.25).with_nodata(-9999.0);
    dir.add_f32("dem/ramp.tif", &spec, &create_ramp(4, 3)).unwrap();

    let opener = GeoTiffOpener::new(dir.path());
    let raster = opener.open("dem/ramp.tif").unwrap();

    assert_eq!(raster.width(), 4);
    assert_eq!(raster.height(), 3);
    assert_eq!(raster.band_count(), 1);
    assert_eq!(raster.projection(), "EPSG:4326");
    assert_eq!(raster.band_datatype(1).unwrap(), DataType::Float32);
    assert_eq!(raster.band_nodata(1).unwrap(), Some(-9999.0));
    assert_eq!(raster.geotransform().0, [10.0, 0.25, 0.0, 50.0, 0.0, -0.25]);
    assert_eq!(raster.read_band(1).unwrap()[5], 5.0);
}

#[test]
fn test_open_rgb_geotiff() {
    let dir = TestDataDir::new().unwrap();
    let spec = GeoTiffSpec::web_mercator(2, 2, (0.0, 0.0), 10.0);
    dir.add_rgb8("rgb.tif", &spec, &create_solid_rgb(2, 2, [10, 20, 30]))
        .unwrap();

    let raster = GeoTiffOpener::new(dir.path()).open("rgb.tif").unwrap();
    assert_eq!(raster.band_count(), 3);
    assert_eq!(raster.projection(), "EPSG:3857");
    assert_eq!(raster.band_datatype(2).unwrap(), DataType::Byte);
    assert_eq!(raster.read_band(1).unwrap(), vec![10.0; 4]);
    assert_eq!(raster.read_band(3).unwrap(), vec![30.0; 4]);
}

#[test]
fn test_missing_file_is_not_found() {
    let dir = TestDataDir::new().unwrap();
    let err = GeoTiffOpener::new(dir.path())
        .open("nope.tif")
        .err()
        .unwrap();
    assert!(matches!(err, RasterError::NotFound(ref p) if p == "nope.tif"));
}

#[test]
fn test_garbage_file_fails_to_open() {
    let dir = TestDataDir::new().unwrap();
    std::fs::write(dir.file("junk.tif").unwrap(), b"definitely not a tiff").unwrap();

    let err = GeoTiffOpener::new(dir.path()).open("junk.tif").err().unwrap();
    assert!(matches!(err, RasterError::OpenFailed(_)));
}

#[test]
fn test_fingerprint_only_when_enabled() {
    let dir = TestDataDir::new().unwrap();
    let spec = GeoTiffSpec::wgs84(2, 2, (0.0, 0.0), 1.0);
    dir.add_f32("f.tif", &spec, &create_ramp(2, 2)).unwrap();

    assert_eq!(GeoTiffOpener::new(dir.path()).fingerprint("f.tif").unwrap(), None);

    let fp = GeoTiffOpener::new(dir.path())
        .with_fingerprints(true)
        .fingerprint("f.tif")
        .unwrap()
        .unwrap();
    let size = std::fs::metadata(dir.path().join("f.tif")).unwrap().len();
    assert!(fp.starts_with(&format!("{}-", size)));
}

// ============================================================================
// Extraction
// ============================================================================

#[test]
fn test_extract_metadata_from_file() {
    let dir = TestDataDir::new().unwrap();
    let mut data = create_ramp(4, 4);
    data[0] = -9999.0;
    let spec = GeoTiffSpec::wgs84(4, 4, (-2.0, 2.0), 1.0).with_nodata(-9999.0);
    dir.add_f32("ramp.tif", &spec, &data).unwrap();

    let raster = GeoTiffOpener::new(dir.path()).open("ramp.tif").unwrap();
    let meta = MetadataExtractor::new().extract(raster.as_ref()).unwrap();

    assert_eq!(meta.epsg, Some(4326));
    assert_eq!(meta.layers[0].datatype, 6);
    let stats = meta.layers[0].stats.as_ref().unwrap();
    assert_eq!(stats.min, 1.0);
    assert_eq!(stats.max, 15.0);
    assert_approx_eq!(stats.avg, 8.0, 1e-12);
    assert_eq!(
        meta.envelope,
        "POLYGON ((2 -2, 2 2, -2 2, -2 -2, 2 -2))"
    );
}

#[test]
fn test_projected_footprint_is_reprojected() {
    let dir = TestDataDir::new().unwrap();
    // 2x2 km square at the Web Mercator origin
    let spec = GeoTiffSpec::web_mercator(2, 2, (0.0, 2000.0), 1000.0);
    dir.add_f32("merc.tif", &spec, &create_ramp(2, 2)).unwrap();

    let raster = GeoTiffOpener::new(dir.path()).open("merc.tif").unwrap();
    let meta = MetadataExtractor::new().extract(raster.as_ref()).unwrap();

    assert_eq!(meta.epsg, Some(3857));
    assert!(meta.extent.starts_with("POLYGON (("));
    // 2000 m east of the origin is about 0.018 degrees
    assert!(meta.envelope.contains("0.0179"), "{}", meta.envelope);
}

#[test]
fn test_missing_crs_fails_extraction() {
    let dir = TestDataDir::new().unwrap();
    let spec = GeoTiffSpec::wgs84(2, 2, (0.0, 0.0), 1.0).with_epsg(None);
    dir.add_f32("nocrs.tif", &spec, &create_ramp(2, 2)).unwrap();

    let raster = GeoTiffOpener::new(dir.path()).open("nocrs.tif").unwrap();
    let err = MetadataExtractor::new().extract(raster.as_ref()).unwrap_err();
    assert!(matches!(err, RasterError::Projection(_)));
}
