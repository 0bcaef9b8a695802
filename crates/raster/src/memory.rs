//! In-memory rasters.

use crate::{DataType, GeoTransform, RasterDataset, RasterError, Result};
use crate::dataset::pick_cells;

#[derive(Debug, Clone)]
struct MemBand {
    datatype: DataType,
    nodata: Option<f64>,
    values: Vec<f64>,
}

/// A raster held entirely in memory.
///
/// Used for tests and as the target grid of a warp.
#[derive(Debug, Clone)]
pub struct MemRaster {
    width: usize,
    height: usize,
    geotransform: GeoTransform,
    projection: String,
    bands: Vec<MemBand>,
}

impl MemRaster {
    pub fn new(
        width: usize,
        height: usize,
        geotransform: GeoTransform,
        projection: impl Into<String>,
    ) -> Self {
        Self {
            width,
            height,
            geotransform,
            projection: projection.into(),
            bands: Vec::new(),
        }
    }

    /// Append a band. `values` must hold `width * height` cells, row-major.
    pub fn add_band(
        &mut self,
        datatype: DataType,
        nodata: Option<f64>,
        values: Vec<f64>,
    ) -> Result<()> {
        let expected = self.width * self.height;
        if values.len() != expected {
            return Err(RasterError::invalid_metadata(format!(
                "band has {} cells, expected {}x{} = {}",
                values.len(),
                self.width,
                self.height,
                expected
            )));
        }
        self.bands.push(MemBand {
            datatype,
            nodata,
            values,
        });
        Ok(())
    }

    /// Builder form of [`MemRaster::add_band`].
    pub fn with_band(
        mut self,
        datatype: DataType,
        nodata: Option<f64>,
        values: Vec<f64>,
    ) -> Result<Self> {
        self.add_band(datatype, nodata, values)?;
        Ok(self)
    }

    /// Borrow a band's cells without copying.
    pub fn band(&self, band: usize) -> Result<&[f64]> {
        self.check_band(band)?;
        Ok(&self.bands[band - 1].values)
    }
}

impl RasterDataset for MemRaster {
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
        Ok(self.bands[band - 1].datatype)
    }

    fn band_nodata(&self, band: usize) -> Result<Option<f64>> {
        self.check_band(band)?;
        Ok(self.bands[band - 1].nodata)
    }

    fn read_band(&self, band: usize) -> Result<Vec<f64>> {
        self.band(band).map(|values| values.to_vec())
    }

    fn read_cells(&self, band: usize, cells: &[usize]) -> Result<Vec<f64>> {
        pick_cells(self.band(band)?, cells)
    }
}
