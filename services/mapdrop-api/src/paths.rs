//! Request path parsing and validation.

use std::path::{Component, Path};

use mapdrop_common::{MapdropError, MapdropResult, TileCoord};

/// Check a raster path is relative and stays inside the data directory.
pub fn validate_path(path: &str) -> MapdropResult<&str> {
    let invalid = |message: &str| Err(MapdropError::validation("path", message));

    if path.is_empty() {
        return invalid("path is empty");
    }
    if path.contains('\0') {
        return invalid("path contains a NUL byte");
    }
    if path.starts_with('/') || path.starts_with('\\') {
        return invalid("path must be relative");
    }
    for component in Path::new(path).components() {
        match component {
            Component::Normal(_) | Component::CurDir => {}
            Component::ParentDir => return invalid("path must not contain '..'"),
            Component::RootDir | Component::Prefix(_) => return invalid("path must be relative"),
        }
    }
    Ok(path)
}

/// Split `<path>/<z>/<x>/<y>.<format>` into its parts.
pub fn parse_tile_path(rest: &str) -> MapdropResult<(&str, TileCoord, &str)> {
    let bad = || {
        MapdropError::validation(
            "tile",
            format!("expected <path>/<z>/<x>/<y>.<format>, got '{}'", rest),
        )
    };

    let mut parts = rest.rsplitn(4, '/');
    let last = parts.next().ok_or_else(bad)?;
    let x = parts.next().ok_or_else(bad)?;
    let z = parts.next().ok_or_else(bad)?;
    let path = parts.next().ok_or_else(bad)?;

    let (y, format) = last.rsplit_once('.').ok_or_else(bad)?;
    let number = |s: &str| s.parse::<u32>().map_err(|_| bad());
    let tile = TileCoord::new(number(z)?, number(x)?, number(y)?);

    if !tile.is_valid() {
        return Err(MapdropError::validation(
            "tile",
            format!("tile {} is outside the zoom level", tile),
        ));
    }

    Ok((validate_path(path)?, tile, format))
}
