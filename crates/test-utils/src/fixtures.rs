//! On-disk raster fixtures.
//!
//! Writes small GeoTIFFs with the standard georeferencing tags so tests can
//! exercise the real file backend without external test data.

use std::fs::File;
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};

use tempfile::TempDir;
use tiff::encoder::colortype::{ColorType, Gray16, Gray32Float, Gray8, RGB8};
use tiff::encoder::{DirectoryEncoder, TiffEncoder, TiffKind, TiffValue};
use tiff::tags::Tag;
use tiff::TiffResult;

// GeoKey IDs
const GT_MODEL_TYPE_GEO_KEY: u16 = 1024;
const GT_RASTER_TYPE_GEO_KEY: u16 = 1025;
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

// GeoKey values
const MODEL_TYPE_PROJECTED: u16 = 1;
const MODEL_TYPE_GEOGRAPHIC: u16 = 2;
const RASTER_PIXEL_IS_AREA: u16 = 1;

/// Georeferencing of a fixture raster.
#[derive(Debug, Clone, PartialEq)]
pub struct GeoTiffSpec {
    pub width: u32,
    pub height: u32,
    /// World coordinate of the top-left corner.
    pub origin: (f64, f64),
    /// Pixel width and height, both positive.
    pub pixel_size: (f64, f64),
    /// `None` writes no CRS keys.
    pub epsg: Option<u16>,
    pub nodata: Option<f64>,
}

impl GeoTiffSpec {
    /// A north-up grid in EPSG:4326.
    pub fn wgs84(width: u32, height: u32, origin: (f64, f64), pixel_size: f64) -> Self {
        Self {
            width,
            height,
            origin,
            pixel_size: (pixel_size, pixel_size),
            epsg: Some(4326),
            nodata: None,
        }
    }

    /// A north-up grid in EPSG:3857.
    pub fn web_mercator(width: u32, height: u32, origin: (f64, f64), pixel_size: f64) -> Self {
        Self {
            epsg: Some(3857),
            ..Self::wgs84(width, height, origin, pixel_size)
        }
    }

    pub fn with_epsg(mut self, epsg: Option<u16>) -> Self {
        self.epsg = epsg;
        self
    }

    pub fn with_nodata(mut self, nodata: f64) -> Self {
        self.nodata = Some(nodata);
        self
    }
}

fn is_geographic(epsg: u16) -> bool {
    (4000..5000).contains(&epsg)
}

fn write_geotiff_tags<W: Write + Seek, K: TiffKind>(
    dir: &mut DirectoryEncoder<W, K>,
    spec: &GeoTiffSpec,
) -> TiffResult<()> {
    let pixel_scale = [spec.pixel_size.0, spec.pixel_size.1, 0.0];
    dir.write_tag(Tag::ModelPixelScaleTag, pixel_scale.as_slice())?;

    // Ties pixel (0, 0) to the top-left corner
    let tiepoint = [0.0, 0.0, 0.0, spec.origin.0, spec.origin.1, 0.0];
    dir.write_tag(Tag::ModelTiepointTag, tiepoint.as_slice())?;

    if let Some(epsg) = spec.epsg {
        let (model_type, crs_key) = if is_geographic(epsg) {
            (MODEL_TYPE_GEOGRAPHIC, GEOGRAPHIC_TYPE_GEO_KEY)
        } else {
            (MODEL_TYPE_PROJECTED, PROJECTED_CS_TYPE_GEO_KEY)
        };
        let keys: [u16; 16] = [
            1, 1, 0, 3,
            GT_MODEL_TYPE_GEO_KEY, 0, 1, model_type,
            GT_RASTER_TYPE_GEO_KEY, 0, 1, RASTER_PIXEL_IS_AREA,
            crs_key, 0, 1, epsg,
        ];
        dir.write_tag(Tag::GeoKeyDirectoryTag, keys.as_slice())?;
    }

    if let Some(nodata) = spec.nodata {
        dir.write_tag(Tag::GdalNodata, nodata.to_string().as_str())?;
    }

    Ok(())
}

fn write_image<C: ColorType>(path: &Path, spec: &GeoTiffSpec, data: &[C::Inner]) -> TiffResult<()>
where
    [C::Inner]: TiffValue,
{
    let file = BufWriter::new(File::create(path)?);
    let mut encoder = TiffEncoder::new(file)?;
    let mut image = encoder.new_image::<C>(spec.width, spec.height)?;
    write_geotiff_tags(image.encoder(), spec)?;
    image.write_data(data)
}

/// Write a single-band Float32 GeoTIFF.
pub fn write_geotiff_f32(path: &Path, spec: &GeoTiffSpec, data: &[f32]) -> TiffResult<()> {
    write_image::<Gray32Float>(path, spec, data)
}

/// Write a single-band UInt16 GeoTIFF.
pub fn write_geotiff_u16(path: &Path, spec: &GeoTiffSpec, data: &[u16]) -> TiffResult<()> {
    write_image::<Gray16>(path, spec, data)
}

/// Write a single-band Byte GeoTIFF.
pub fn write_geotiff_u8(path: &Path, spec: &GeoTiffSpec, data: &[u8]) -> TiffResult<()> {
    write_image::<Gray8>(path, spec, data)
}

/// Write a 3-band Byte GeoTIFF from interleaved `RGBRGB...` samples.
pub fn write_geotiff_rgb8(path: &Path, spec: &GeoTiffSpec, data: &[u8]) -> TiffResult<()> {
    write_image::<RGB8>(path, spec, data)
}

/// A temporary data directory that is removed on drop.
pub struct TestDataDir {
    dir: TempDir,
}

impl TestDataDir {
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {
            dir: tempfile::tempdir()?,
        })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of a file in the directory, creating parent directories.
    pub fn file(&self, relative: &str) -> std::io::Result<PathBuf> {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        Ok(path)
    }

    /// Write a Float32 GeoTIFF and return its absolute path.
    pub fn add_f32(&self, relative: &str, spec: &GeoTiffSpec, data: &[f32]) -> TiffResult<PathBuf> {
        let path = self.file(relative)?;
        write_geotiff_f32(&path, spec, data)?;
        Ok(path)
    }

    /// Write an RGB8 GeoTIFF and return its absolute path.
    pub fn add_rgb8(&self, relative: &str, spec: &GeoTiffSpec, data: &[u8]) -> TiffResult<PathBuf> {
        let path = self.file(relative)?;
        write_geotiff_rgb8(&path, spec, data)?;
        Ok(path)
    }
}
