//! Unit-label normalization
//!
//! Source documents carry unit labels in dialect-specific spellings, often
//! behind a namespace prefix (`units:cm-1`, `unit:moverz`). Decoded spectra
//! store one canonical uppercase vocabulary so renderers and exporters can
//! compare labels directly.

/// Normalize a raw unit label to the canonical uppercase vocabulary.
///
/// Any namespace prefix up to the last `:` is stripped before matching.
/// Matching is case-insensitive; labels outside the known table are
/// uppercased as-is, which makes the function idempotent.
pub fn normalize(raw: &str) -> String {
    let suffix = match raw.rsplit_once(':') {
        Some((_, rest)) => rest,
        None => raw,
    };
    let trimmed = suffix.trim();
    let lower = trimmed.to_ascii_lowercase();

    if lower == "cm-1" || lower == "1/cm" {
        return "1/CM".to_string();
    }
    if lower == "nm" || lower == "nanometers" {
        return "NANOMETERS".to_string();
    }
    if lower.contains("arbitrary") {
        return "ARBITRARY UNITS".to_string();
    }
    if lower == "moverz" || lower == "m/z" {
        return "M/Z".to_string();
    }
    if lower == "relabundance" || lower == "relative abundance" {
        return "RELATIVE ABUNDANCE".to_string();
    }

    trimmed.to_ascii_uppercase()
}
