//! Resolved coordinate reference systems.

use tracing::debug;

use crate::{identify_epsg, ProjectionError};

/// WGS84 Geographic (longitude/latitude in degrees)
pub const EPSG_WGS84: u32 = 4326;
/// Web Mercator (meters), the tiling CRS
pub const EPSG_WEB_MERCATOR: u32 = 3857;

const WGS84_PROJ4: &str = "+proj=longlat +datum=WGS84 +no_defs";
const WEB_MERCATOR_PROJ4: &str =
    "+proj=merc +a=6378137 +b=6378137 +lat_ts=0 +lon_0=0 +x_0=0 +y_0=0 +k=1 +units=m +no_defs";

/// Get the proj4 string for an EPSG code from the crs-definitions database.
pub fn proj4_for_epsg(code: u32) -> Option<&'static str> {
    u16::try_from(code)
        .ok()
        .and_then(crs_definitions::from_code)
        .map(|def| def.proj4)
}

/// A projection definition resolved to something proj4rs can use.
#[derive(Debug, Clone, PartialEq)]
pub struct Crs {
    /// The text the CRS was resolved from.
    pub definition: String,
    pub epsg: Option<u32>,
    pub proj4: String,
}

impl Crs {
    pub fn wgs84() -> Self {
        Self {
            definition: format!("EPSG:{}", EPSG_WGS84),
            epsg: Some(EPSG_WGS84),
            proj4: WGS84_PROJ4.to_string(),
        }
    }

    pub fn web_mercator() -> Self {
        Self {
            definition: format!("EPSG:{}", EPSG_WEB_MERCATOR),
            epsg: Some(EPSG_WEB_MERCATOR),
            proj4: WEB_MERCATOR_PROJ4.to_string(),
        }
    }

    pub fn from_epsg(code: u32) -> Result<Self, ProjectionError> {
        match code {
            EPSG_WGS84 => return Ok(Self::wgs84()),
            EPSG_WEB_MERCATOR => return Ok(Self::web_mercator()),
            _ => {}
        }

        let proj4 = proj4_for_epsg(code).ok_or(ProjectionError::UnknownEpsg(code))?;
        Ok(Self {
            definition: format!("EPSG:{}", code),
            epsg: Some(code),
            proj4: proj4.to_string(),
        })
    }

    /// Resolve a raster's projection text (WKT, proj4 or `EPSG:n`).
    ///
    /// proj4 strings are used as given. Everything else must be identifiable
    /// as an EPSG code present in the definitions database.
    pub fn from_definition(definition: &str) -> Result<Self, ProjectionError> {
        let text = definition.trim();
        let epsg = identify_epsg(text);

        if text.starts_with('+') && text.contains("+proj=") {
            return Ok(Self {
                definition: definition.to_string(),
                epsg,
                proj4: text.to_string(),
            });
        }

        let code = epsg.ok_or_else(|| {
            let preview: String = text.chars().take(80).collect();
            ProjectionError::Unidentified(preview)
        })?;

        debug!(epsg = code, "Resolved projection definition");
        let mut crs = Self::from_epsg(code)?;
        crs.definition = definition.to_string();
        Ok(crs)
    }

    /// Whether coordinates are longitude/latitude in degrees.
    pub fn is_geographic(&self) -> bool {
        self.proj4.contains("+proj=longlat") || self.proj4.contains("+proj=latlong")
    }

    /// Whether both definitions describe the same CRS.
    pub fn same_as(&self, other: &Crs) -> bool {
        match (self.epsg, other.epsg) {
            (Some(a), Some(b)) => a == b,
            _ => self.proj4.trim() == other.proj4.trim(),
        }
    }
}
