//! Numeric coordinate array decoding
//!
//! Spectrum payloads arrive in two shapes: an analytic range (start, end,
//! point count) from which the axis is reconstructed arithmetically, or a
//! delimited text run whose tokens are parsed and scaled one by one. Both
//! modes produce a `Vec<f64>` of exactly the declared point count.

/// Synthetic intensity assigned per referenced atom when a peak carries no
/// y value. Domain convention inherited from the CML peak-list dialect.
pub const INTENSITY_PER_ATOM_REF: f64 = 49.0;

/// Errors that can occur while decoding a coordinate payload.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    /// Fewer values were present than the declared point count.
    #[error("expected {expected} values, found {actual}")]
    Shortfall {
        /// Declared point count.
        expected: usize,
        /// Values actually decoded.
        actual: usize,
    },

    /// A token could not be parsed as a number.
    #[error("invalid numeric token {0:?}")]
    InvalidToken(String),

    /// The analytic range had no points to span.
    #[error("analytic range requires at least one point")]
    EmptyRange,
}

/// Reconstruct an evenly spaced axis from an analytic range.
///
/// `step = (end - start) / (n - 1)`; point *i* is `start + i * step`.
/// Data decoded this way is continuous by construction.
pub fn decode_analytic(start: f64, end: f64, n: usize) -> Result<Vec<f64>, DecodeError> {
    if n == 0 {
        return Err(DecodeError::EmptyRange);
    }
    if n == 1 {
        return Ok(vec![start]);
    }
    let step = (end - start) / (n - 1) as f64;
    let mut values = Vec::with_capacity(n);
    for i in 0..n {
        values.push(start + i as f64 * step);
    }
    Ok(values)
}

/// Decode a delimited text run into exactly `n` scaled values.
///
/// Tokens before each delimiter are parsed as f64 and multiplied by
/// `multiplier`. A space delimiter matches any ASCII whitespace, since
/// source documents routinely wrap long runs across lines. When no
/// delimiter remains but one value is still outstanding, the trimmed
/// remainder is the last point. Producing fewer than `n` values is an
/// error; surplus values beyond `n` are dropped.
pub fn decode_delimited(
    text: &str,
    delimiter: char,
    n: usize,
    multiplier: f64,
) -> Result<Vec<f64>, DecodeError> {
    let mut values = Vec::with_capacity(n);
    let mut rest = text.trim();

    for i in 0..n {
        if rest.is_empty() {
            return Err(DecodeError::Shortfall {
                expected: n,
                actual: i,
            });
        }
        let split = if delimiter == ' ' {
            rest.find(|c: char| c.is_ascii_whitespace())
        } else {
            rest.find(delimiter)
        };
        let (token, tail) = match split {
            Some(pos) => (
                &rest[..pos],
                rest[pos + delimiter.len_utf8()..].trim_start(),
            ),
            None => (rest, ""),
        };
        let token = token.trim();
        let value: f64 = token
            .parse()
            .map_err(|_| DecodeError::InvalidToken(token.to_string()))?;
        values.push(value * multiplier);
        rest = tail;
    }

    Ok(values)
}

/// Synthetic peak intensity for a peak without a y value: `49 * N` where
/// `N` is the number of whitespace-separated atom references.
pub fn synthetic_peak_intensity(atom_refs: &str) -> f64 {
    INTENSITY_PER_ATOM_REF * atom_refs.split_whitespace().count() as f64
}
