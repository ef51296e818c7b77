//! Session-duration validation.
//!
//! Target durations arrive as untrusted navigation parameters. Anything absent,
//! non-numeric or outside the supported range is replaced by a safe fallback.

use tracing::warn;

pub const SAFE_FALLBACK_DURATION_SECS: u64 = 300;
pub const MIN_DURATION_SECS: f64 = 30.0;
pub const MAX_DURATION_SECS: f64 = 3600.0;

/// Clamp an untrusted duration in seconds to the supported range.
///
/// In-range values pass through, truncated to whole seconds.
pub fn validate_duration(duration: Option<f64>) -> u64 {
    let Some(duration) = duration.filter(|d| d.is_finite()) else {
        warn!(
            ?duration,
            "invalid duration value, using fallback of {SAFE_FALLBACK_DURATION_SECS}s"
        );
        return SAFE_FALLBACK_DURATION_SECS;
    };

    if duration < MIN_DURATION_SECS {
        warn!(
            duration,
            "duration below minimum of {MIN_DURATION_SECS}s, using fallback of {SAFE_FALLBACK_DURATION_SECS}s"
        );
        return SAFE_FALLBACK_DURATION_SECS;
    }

    if duration > MAX_DURATION_SECS {
        warn!(
            duration,
            "duration exceeds maximum of {MAX_DURATION_SECS}s, using fallback of {SAFE_FALLBACK_DURATION_SECS}s"
        );
        return SAFE_FALLBACK_DURATION_SECS;
    }

    duration as u64
}

/// Validate a raw duration parameter such as `?duration=120`.
pub fn parse_target_duration(raw: Option<&str>) -> u64 {
    let parsed = raw
        .map(str::trim)
        .and_then(|s| s.parse::<f64>().ok())
        .filter(|d| d.is_finite() && *d > 0.0);
    if parsed.is_none() && raw.is_some() {
        warn!(raw = ?raw, "unparseable duration parameter");
    }
    validate_duration(parsed)
}
