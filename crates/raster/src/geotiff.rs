//! GeoTIFF backend built on the `tiff` crate.
//!
//! Georeferencing comes from the standard GeoTIFF tags:
//! - ModelPixelScale + ModelTiepoint, or ModelTransformation, for the geotransform
//! - the GeoKey directory for the EPSG code (projected before geographic)
//! - GeoAsciiParams for user-defined proj4 strings
//! - the GDAL_NODATA ASCII tag for the nodata value, shared by all bands

use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;

use tiff::decoder::{Decoder, DecodingResult, Limits};
use tiff::tags::Tag;
use tiff::ColorType;
use tracing::debug;

use crate::{DataType, GeoTransform, RasterDataset, RasterError, RasterOpener, Result};
use crate::dataset::pick_cells;

// GeoKey IDs
const GEOGRAPHIC_TYPE_GEO_KEY: u16 = 2048;
const PROJECTED_CS_TYPE_GEO_KEY: u16 = 3072;

/// GeoKey value meaning "user-defined"
const USER_DEFINED: u16 = 32767;

/// A GeoTIFF decoded into per-band `f64` planes.
#[derive(Debug, Clone)]
pub struct GeoTiffRaster {
    width: usize,
    height: usize,
    geotransform: GeoTransform,
    projection: String,
    datatype: DataType,
    nodata: Option<f64>,
    bands: Vec<Vec<f64>>,
}

impl GeoTiffRaster {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            RasterError::open_failed(format!("{}: {}", path.display(), e))
        })?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read + Seek>(reader: R) -> Result<Self> {
        let mut decoder = Decoder::new(reader)?.with_limits(Limits::unlimited());

        let (width_u32, height_u32) = decoder.dimensions()?;
        let width = width_u32 as usize;
        let height = height_u32 as usize;

        let samples = match decoder.colortype()? {
            ColorType::Gray(_) => 1,
            ColorType::GrayA(_) => 2,
            ColorType::RGB(_) => 3,
            ColorType::RGBA(_) => 4,
            other => {
                return Err(RasterError::Unsupported(format!(
                    "color type {:?}",
                    other
                )))
            }
        };

        let geotransform = read_geotransform(&mut decoder);
        let projection = read_projection(&mut decoder);
        let nodata = decoder
            .get_tag_ascii_string(Tag::GdalNodata)
            .ok()
            .and_then(|s| parse_nodata(&s));

        // TODO: decode only the chunks a tile warp touches via `Decoder::read_chunk`
        let (datatype, cells) = decoded_to_f64(decoder.read_image()?);
        let expected = width * height * samples;
        if cells.len() != expected {
            return Err(RasterError::read_failed(format!(
                "decoded {} samples, expected {}",
                cells.len(),
                expected
            )));
        }

        debug!(
            width = width,
            height = height,
            bands = samples,
            datatype = %datatype,
            "Decoded GeoTIFF"
        );

        Ok(Self {
            width,
            height,
            geotransform,
            projection,
            datatype,
            nodata,
            bands: deinterleave(&cells, samples),
        })
    }
}

impl RasterDataset for GeoTiffRaster {
    fn width(&self) -> usize {
        self.width
    }

    fn height(&self) -> usize {
        self.height
    }

    fn band_count(&self) -> usize {
        self.bands.len()
    }

    fn geotransform(&self) -> GeoTransform {
        self.geotransform
    }

    fn projection(&self) -> &str {
        &self.projection
    }

    fn band_datatype(&self, band: usize) -> Result<DataType> {
        self.check_band(band)?;
        Ok(self.datatype)
    }

    fn band_nodata(&self, band: usize) -> Result<Option<f64>> {
        self.check_band(band)?;
        Ok(self.nodata)
    }

    fn read_band(&self, band: usize) -> Result<Vec<f64>> {
        self.check_band(band)?;
        Ok(self.bands[band - 1].clone())
    }

    fn read_cells(&self, band: usize, cells: &[usize]) -> Result<Vec<f64>> {
        self.check_band(band)?;
        pick_cells(&self.bands[band - 1], cells)
    }
}

fn read_geotransform<R: Read + Seek>(decoder: &mut Decoder<R>) -> GeoTransform {
    if let Ok(m) = decoder.get_tag_f64_vec(Tag::ModelTransformationTag) {
        if m.len() >= 8 {
            return GeoTransform([m[3], m[0], m[1], m[7], m[4], m[5]]);
        }
    }

    let pixel_scale = decoder
        .get_tag_f64_vec(Tag::ModelPixelScaleTag)
        .ok()
        .filter(|v| v.len() >= 2);
    let tiepoint = decoder
        .get_tag_f64_vec(Tag::ModelTiepointTag)
        .ok()
        .filter(|v| v.len() >= 6);

    match (pixel_scale, tiepoint) {
        (Some(scale), Some(tie)) => {
            // Tiepoint maps raster (I, J) to world (X, Y)
            let (i, j, x, y) = (tie[0], tie[1], tie[3], tie[4]);
            GeoTransform::north_up(x - i * scale[0], y + j * scale[1], scale[0], -scale[1])
        }
        _ => GeoTransform::default(),
    }
}

fn read_projection<R: Read + Seek>(decoder: &mut Decoder<R>) -> String {
    let keys = decoder
        .get_tag_u16_vec(Tag::GeoKeyDirectoryTag)
        .unwrap_or_default();

    let code = geokey_value(&keys, PROJECTED_CS_TYPE_GEO_KEY)
        .filter(|&v| v != USER_DEFINED)
        .or_else(|| geokey_value(&keys, GEOGRAPHIC_TYPE_GEO_KEY).filter(|&v| v != USER_DEFINED));
    if let Some(code) = code {
        return format!("EPSG:{}", code);
    }

    // User-defined CRS: look for a proj4 string among the ASCII params
    decoder
        .get_tag_ascii_string(Tag::GeoAsciiParamsTag)
        .ok()
        .and_then(|ascii| {
            ascii
                .split('|')
                .map(|s| s.trim_matches(char::from(0)).trim())
                .find(|s| s.contains("+proj="))
                .map(|s| s.to_string())
        })
        .unwrap_or_default()
}

/// Inline value of a key in a GeoKey directory.
///
/// Layout: `[version, revision, minor, count, (key, location, count, value)*]`.
fn geokey_value(directory: &[u16], key: u16) -> Option<u16> {
    let count = *directory.get(3)? as usize;
    directory
        .get(4..)?
        .chunks_exact(4)
        .take(count)
        .find(|entry| entry[0] == key && entry[1] == 0)
        .map(|entry| entry[3])
}

fn parse_nodata(text: &str) -> Option<f64> {
    let trimmed = text.trim_matches(char::from(0)).trim();
    match trimmed.to_ascii_lowercase().as_str() {
        "nan" | "-nan" => Some(f64::NAN),
        _ => trimmed.parse().ok(),
    }
}

fn decoded_to_f64(result: DecodingResult) -> (DataType, Vec<f64>) {
    fn widen<T: Copy + Into<f64>>(values: Vec<T>) -> Vec<f64> {
        values.into_iter().map(Into::into).collect()
    }

    match result {
        DecodingResult::U8(v) => (DataType::Byte, widen(v)),
        DecodingResult::U16(v) => (DataType::UInt16, widen(v)),
        DecodingResult::U32(v) => (DataType::UInt32, widen(v)),
        DecodingResult::U64(v) => (DataType::UInt64, v.into_iter().map(|x| x as f64).collect()),
        DecodingResult::F32(v) => (DataType::Float32, widen(v)),
        DecodingResult::F64(v) => (DataType::Float64, v),
        DecodingResult::I8(v) => (DataType::Int8, widen(v)),
        DecodingResult::I16(v) => (DataType::Int16, widen(v)),
        DecodingResult::I32(v) => (DataType::Int32, widen(v)),
        DecodingResult::I64(v) => (DataType::Int64, v.into_iter().map(|x| x as f64).collect()),
    }
}

/// Split chunky (`RGBRGB...`) samples into band planes.
fn deinterleave(cells: &[f64], samples: usize) -> Vec<Vec<f64>> {
    if samples == 1 {
        return vec![cells.to_vec()];
    }
    (0..samples)
        .map(|band| cells.iter().skip(band).step_by(samples).copied().collect())
        .collect()
}

/// Opens GeoTIFFs below a data directory.
#[derive(Debug, Clone)]
pub struct GeoTiffOpener {
    root: PathBuf,
    fingerprints: bool,
}

impl GeoTiffOpener {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            fingerprints: false,
        }
    }

    /// Report `<size>-<mtime>` fingerprints so cache keys follow file replacement.
    pub fn with_fingerprints(mut self, enabled: bool) -> Self {
        self.fingerprints = enabled;
        self
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Resolve a storage path below the root.
    pub fn resolve(&self, path: &str) -> Result<PathBuf> {
        let relative = Path::new(path);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if path.is_empty() || escapes {
            return Err(RasterError::NotFound(path.to_string()));
        }

        let full = self.root.join(relative);
        if !full.is_file() {
            return Err(RasterError::NotFound(path.to_string()));
        }
        Ok(full)
    }
}

impl RasterOpener for GeoTiffOpener {
    fn open(&self, path: &str) -> Result<Box<dyn RasterDataset + Send>> {
        let full = self.resolve(path)?;
        Ok(Box::new(GeoTiffRaster::open(&full)?))
    }

    fn fingerprint(&self, path: &str) -> Result<Option<String>> {
        if !self.fingerprints {
            return Ok(None);
        }
        let meta = std::fs::metadata(self.resolve(path)?)?;
        let mtime = meta
            .modified()?
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Ok(Some(format!("{}-{}", meta.len(), mtime)))
    }
}
