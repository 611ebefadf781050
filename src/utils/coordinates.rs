use crate::error::{ExportError, Result};

/// Parse an optional bounding-box value from a request parameter.
///
/// Absent and blank values mean "no bound". Anything else must be a finite
/// decimal number. Longitudes past +/-180 are accepted as map widgets emit them
/// after wrapping around the antimeridian.
///
/// # Examples
/// ```
/// use man_export::utils::coordinates::parse_bound;
///
/// assert_eq!(parse_bound("min_lat", Some("-12.5")).unwrap(), Some(-12.5));
/// assert_eq!(parse_bound("min_lat", Some("")).unwrap(), None);
/// assert!(parse_bound("min_lat", Some("north")).is_err());
/// ```
pub fn parse_bound(name: &str, value: Option<&str>) -> Result<Option<f64>> {
    let trimmed = match value.map(str::trim) {
        None | Some("") => return Ok(None),
        Some(v) => v,
    };

    let parsed = trimmed.parse::<f64>().map_err(|_| {
        ExportError::invalid_parameter(name, format!("'{}' is not a number", trimmed))
    })?;

    if !parsed.is_finite() {
        return Err(ExportError::invalid_parameter(
            name,
            format!("'{}' is not a finite number", trimmed),
        ));
    }

    Ok(Some(parsed))
}

/// Parse a coordinate cell from a data row. Blank or non-numeric cells yield `None`.
pub fn parse_cell(cell: &[u8]) -> Option<f64> {
    std::str::from_utf8(cell)
        .ok()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|v| v.is_finite())
}

/// Inclusive containment of a point in a lat/lng rectangle
pub fn within_box(lat: f64, lng: f64, min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> bool {
    (min_lat..=max_lat).contains(&lat) && (min_lng..=max_lng).contains(&lng)
}
