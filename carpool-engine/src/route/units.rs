//! Distance and duration text handling.
//!
//! The provider reports distances as display text ("12.3 km", "850 m").
//! Totals are accumulated in kilometres and rendered back to display text.

/// Error parsing provider display text.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum UnitsError {
    #[error("unparseable distance text: {0:?}")]
    Distance(String),
}

/// Parse a leg's distance text into kilometres.
///
/// Kilometre text is parsed as-is, ignoring thousands separators. Anything
/// else is taken to be metres and converted with floor division, so a
/// sub-kilometre leg contributes nothing to the total. The rounding is kept
/// deliberately: existing trip totals were computed this way.
pub fn leg_distance_km(text: &str) -> Result<f64, UnitsError> {
    let cleaned = text.replace(',', "");
    let value = cleaned
        .split_whitespace()
        .next()
        .and_then(|n| n.parse::<f64>().ok())
        .filter(|v| v.is_finite() && *v >= 0.0)
        .ok_or_else(|| UnitsError::Distance(text.to_string()))?;

    if cleaned.contains("km") {
        Ok(value)
    } else {
        Ok((value / 1000.0).floor())
    }
}

/// Render a total duration as "H hours, M min, SS sec".
///
/// Minutes lose their leading zero; seconds keep two digits.
pub fn format_duration(total_secs: u64) -> String {
    let hours = total_secs / 3600;
    let mins = (total_secs % 3600) / 60;
    let secs = total_secs % 60;

    let padded = format!("{mins:02}");
    let mins = match padded.trim_start_matches('0') {
        "" => "0",
        stripped => stripped,
    };

    format!("{hours} hours, {mins} min, {secs:02} sec")
}

/// Render a total distance in kilometres.
///
/// Whole totals print without a fraction. Anything else is rounded to one
/// decimal place and keeps it, so 12.96 renders as "13.0 km".
pub fn format_distance(km: f64) -> String {
    if km.fract() == 0.0 {
        format!("{km:.0} km")
    } else {
        format!("{km:.1} km")
    }
}
