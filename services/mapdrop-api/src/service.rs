//! Metadata and tile operations behind the HTTP layer.

use std::sync::Arc;
use std::time::Instant;

use metrics::{counter, histogram};
use serde::Deserialize;
use tokio::task;
use tracing::{debug, instrument};

use mapdrop_common::{MapdropError, MapdropResult, RasterMetadata, TileCoord};
use raster::{GeoTiffOpener, MetadataExtractor, RasterOpener};
use renderer::{render_tile, EncodedTile, OutputFormat, RenderError, TileRequest, DEFAULT_QUALITY};
use storage::{KeyValueStore, MetadataCache};

use crate::config::ServiceConfig;
use crate::paths::validate_path;

/// Query parameters of a tile request.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TileParams {
    pub mode: Option<String>,
    pub colormap: Option<String>,
    pub ranges: Option<String>,
    /// JPEG quality, clamped to 1..=100.
    pub quality: Option<u32>,
}

impl TileParams {
    fn into_request(self, tile: TileCoord, format: &str) -> TileRequest {
        let mut request = TileRequest::new(tile, format);
        request.mode = self.mode;
        if let Some(colormap) = self.colormap {
            request.colormap = colormap;
        }
        if let Some(ranges) = self.ranges {
            request.ranges = ranges;
        }
        request.quality = self
            .quality
            .map_or(DEFAULT_QUALITY, |q| q.clamp(1, 100) as u8);
        request
    }
}

/// Metadata lookup and tile rendering for rasters under one data directory.
#[derive(Clone)]
pub struct MapdropService {
    opener: Arc<dyn RasterOpener>,
    cache: MetadataCache,
}

impl MapdropService {
    pub fn new(opener: Arc<dyn RasterOpener>, cache: MetadataCache) -> Self {
        Self { opener, cache }
    }

    /// GeoTIFF rasters under `config.data_dir`, metadata cached in `store`.
    pub fn from_config(config: &ServiceConfig, store: Arc<dyn KeyValueStore>) -> Self {
        let opener = GeoTiffOpener::new(&config.data_dir).with_fingerprints(config.fingerprint_keys);
        Self::new(
            Arc::new(opener),
            MetadataCache::with_settings(store, config.cache),
        )
    }

    /// Cache key of `path`: the path itself, with the file fingerprint
    /// appended when the opener provides one.
    fn cache_key(&self, path: &str) -> MapdropResult<String> {
        Ok(match self.opener.fingerprint(path)? {
            Some(fp) => format!("{}@{}", path, fp),
            None => path.to_string(),
        })
    }

    /// Metadata of the raster at `path`, extracted at most once per key.
    #[instrument(skip(self))]
    pub async fn get_metadata(&self, path: &str) -> MapdropResult<RasterMetadata> {
        let path = validate_path(path)?;
        let key = self.cache_key(path)?;
        let opener = self.opener.clone();
        let owned = path.to_string();

        self.cache
            .get_metadata(&key, || async move {
                let extracted = task::spawn_blocking(move || {
                    let dataset = opener.open(&owned)?;
                    MetadataExtractor::new().extract(dataset.as_ref())
                })
                .await;
                match extracted {
                    Ok(result) => result.map_err(MapdropError::from),
                    Err(e) => Err(MapdropError::Internal(format!(
                        "extraction task failed: {}",
                        e
                    ))),
                }
            })
            .await
    }

    /// Render tile `tile` of the raster at `path` as `format`.
    #[instrument(skip(self, params))]
    pub async fn render_tile(
        &self,
        path: &str,
        tile: TileCoord,
        format: &str,
        params: TileParams,
    ) -> MapdropResult<EncodedTile> {
        let path = validate_path(path)?;
        if !tile.is_valid() {
            return Err(MapdropError::validation(
                "tile",
                format!("tile {} is outside the zoom level", tile),
            ));
        }
        format
            .parse::<OutputFormat>()
            .map_err(MapdropError::from)?;

        let metadata = self.get_metadata(path).await?;
        let request = params.into_request(tile, format);
        let opener = self.opener.clone();
        let owned = path.to_string();
        let start = Instant::now();

        let encoded = task::spawn_blocking(move || -> Result<EncodedTile, RenderError> {
            let dataset = opener.open(&owned)?;
            render_tile(dataset.as_ref(), &metadata, &request)
        })
        .await
        .map_err(|e| MapdropError::Internal(format!("render task failed: {}", e)))??;

        counter!("mapdrop_tiles_rendered_total").increment(1);
        histogram!("mapdrop_tile_render_seconds").record(start.elapsed().as_secs_f64());
        debug!(bytes = encoded.bytes.len(), mime = encoded.mime, "Tile ready");
        Ok(encoded)
    }
}
