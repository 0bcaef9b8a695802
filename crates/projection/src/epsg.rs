//! EPSG code identification for projection definitions.
//!
//! Rasters carry their projection as free text: WKT1 (`PROJCS[...]`), WKT2
//! (`PROJCRS[...]`), proj4 strings or a bare `EPSG:n` reference. The
//! heuristic tries, in order:
//! 1. explicit references (`EPSG:4326`, OGC URNs and URLs)
//! 2. proj4 strings, by `+init=epsg:n` or by comparing against known definitions
//! 3. the root `AUTHORITY["EPSG","n"]` / `ID["EPSG",n]` clause of a WKT
//! 4. well-known WKT root names (`WGS 84`, `WGS 84 / UTM zone 33N`, ...)

use crate::crs::proj4_for_epsg;

/// Codes compared against when a proj4 string carries no explicit code.
const PROJ4_CANDIDATES: &[u32] = &[4326, 3857, 4269, 4258, 3035, 3413, 3031, 5070, 2154, 27700];

/// Identify the EPSG code of a projection definition, if possible.
pub fn identify_epsg(definition: &str) -> Option<u32> {
    let text = definition.trim();
    if text.is_empty() {
        return None;
    }

    if let Some(code) = parse_epsg_reference(text) {
        return Some(code);
    }

    if text.starts_with('+') || text.contains("+proj=") || text.contains("+init=") {
        return match_proj4(text);
    }

    root_authority(text).or_else(|| match_wkt_name(text))
}

/// `EPSG:4326`, `urn:ogc:def:crs:EPSG::4326`, `http://www.opengis.net/def/crs/EPSG/0/4326`.
fn parse_epsg_reference(text: &str) -> Option<u32> {
    let upper = text.to_ascii_uppercase();

    if let Some(rest) = upper.strip_prefix("EPSG:") {
        return rest.trim().parse().ok();
    }
    if upper.starts_with("URN:OGC:DEF:CRS:EPSG:") {
        return upper.rsplit(':').next()?.parse().ok();
    }
    if upper.contains("/DEF/CRS/EPSG/") {
        return upper.rsplit('/').next()?.parse().ok();
    }
    None
}

fn match_proj4(text: &str) -> Option<u32> {
    let lower = text.to_ascii_lowercase();
    if let Some(idx) = lower.find("+init=epsg:") {
        let digits: String = lower[idx + "+init=epsg:".len()..]
            .chars()
            .take_while(|c| c.is_ascii_digit())
            .collect();
        return digits.parse().ok();
    }

    let wanted = normalize_proj4(&lower);
    candidate_codes().find(|&code| {
        proj4_for_epsg(code)
            .map(|def| normalize_proj4(&def.to_ascii_lowercase()) == wanted)
            .unwrap_or(false)
    })
}

fn candidate_codes() -> impl Iterator<Item = u32> {
    PROJ4_CANDIDATES
        .iter()
        .copied()
        .chain(32601..=32660)
        .chain(32701..=32760)
}

/// Sorted parameter list without the flags that do not change the CRS.
fn normalize_proj4(text: &str) -> Vec<String> {
    let mut params: Vec<String> = text
        .split_whitespace()
        .filter(|p| !matches!(*p, "+no_defs" | "+type=crs" | "+wktext"))
        .map(|p| p.to_string())
        .collect();
    params.sort();
    params
}

/// Find the AUTHORITY or ID clause that belongs to the root WKT node.
///
/// Nested nodes (the GEOGCS inside a PROJCS, units, axes) carry their own
/// authority clauses; only the one at depth 1 names the whole CRS.
fn root_authority(wkt: &str) -> Option<u32> {
    let bytes = wkt.as_bytes();
    let mut depth = 0usize;
    let mut in_quote = false;
    let mut found = None;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if in_quote {
            if b == b'"' {
                in_quote = false;
            }
            i += 1;
            continue;
        }

        match b {
            b'"' => in_quote = true,
            b'[' | b'(' => depth += 1,
            b']' | b')' => depth = depth.saturating_sub(1),
            c if depth == 1 && c.is_ascii_alphabetic() => {
                let start = i;
                while i < bytes.len() && (bytes[i].is_ascii_alphanumeric() || bytes[i] == b'_') {
                    i += 1;
                }
                let word = &wkt[start..i];
                if word.eq_ignore_ascii_case("AUTHORITY") || word.eq_ignore_ascii_case("ID") {
                    let open = skip_whitespace(bytes, i);
                    if open < bytes.len() && matches!(bytes[open], b'[' | b'(') {
                        if let Some(close) = matching_close(bytes, open) {
                            if let Some(code) = parse_authority_body(&wkt[open + 1..close]) {
                                found = Some(code);
                            }
                        }
                    }
                }
                continue;
            }
            _ => {}
        }
        i += 1;
    }

    found
}

fn skip_whitespace(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_whitespace() {
        i += 1;
    }
    i
}

fn matching_close(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_quote = false;
    for (offset, &b) in bytes[open..].iter().enumerate() {
        match b {
            b'"' => in_quote = !in_quote,
            b'[' | b'(' if !in_quote => depth += 1,
            b']' | b')' if !in_quote => {
                depth -= 1;
                if depth == 0 {
                    return Some(open + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// `"EPSG","32633"` or `"EPSG",4326`
fn parse_authority_body(body: &str) -> Option<u32> {
    let mut parts = body.split(',').map(|p| p.trim().trim_matches('"'));
    let authority = parts.next()?;
    if !authority.eq_ignore_ascii_case("EPSG") {
        return None;
    }
    parts.next()?.parse().ok()
}

fn match_wkt_name(wkt: &str) -> Option<u32> {
    let open = wkt.find(|c: char| c == '[' || c == '(')?;
    let keyword = wkt[..open].trim().to_ascii_uppercase();
    let rest = &wkt[open + 1..];
    let name_start = rest.find('"')? + 1;
    let name_len = rest[name_start..].find('"')?;
    let name = rest[name_start..name_start + name_len]
        .replace('_', " ")
        .to_ascii_lowercase();

    let geographic = keyword.starts_with("GEOG");

    match name.as_str() {
        "wgs 84" | "wgs84" | "gcs wgs 1984" if geographic => Some(4326),
        "nad83" | "gcs north american 1983" if geographic => Some(4269),
        "etrs89" | "gcs etrs 1989" if geographic => Some(4258),
        "wgs 84 / pseudo-mercator"
        | "wgs 1984 web mercator auxiliary sphere"
        | "popular visualisation crs / mercator" => Some(3857),
        _ => utm_zone_code(&name),
    }
}

/// `wgs 84 / utm zone 33n` or `wgs 1984 utm zone 33n`
fn utm_zone_code(name: &str) -> Option<u32> {
    let zone = name
        .strip_prefix("wgs 84 / utm zone ")
        .or_else(|| name.strip_prefix("wgs 1984 utm zone "))?;
    let (number, hemisphere) = zone.split_at(zone.len().checked_sub(1)?);
    let number: u32 = number.trim().parse().ok()?;
    if !(1..=60).contains(&number) {
        return None;
    }
    match hemisphere {
        "n" => Some(32600 + number),
        "s" => Some(32700 + number),
        _ => None,
    }
}
