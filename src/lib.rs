//! # specdx - Spectroscopy Data Ingestion
//!
//! `specdx` is the parsing core of a scientific spectrum viewer: it decodes
//! chemical spectroscopy file formats into a common in-memory [`Spectrum`]
//! model consumed by rendering and export layers.
//!
//! ## Supported formats
//!
//! - **JCAMP-DX**: `##LABEL=value` records with ASDF-compressed ordinate
//!   tables and explicit peak tables, including compound (multi-block)
//!   files.
//! - **CML**: Chemical Markup Language spectra, both continuous
//!   `spectrumData` payloads and discrete `peakList` blocks.
//! - **AnIML**: Analytical Information Markup Language experiment steps
//!   with individual, auto-incremented or base64-encoded value sets.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! let outcome = specdx::parse_file("aspirin.jdx")?;
//!
//! for spectrum in &outcome.spectra {
//!     println!(
//!         "{}: {} points, {} .. {} {}",
//!         spectrum.title,
//!         spectrum.npoints,
//!         spectrum.first_x,
//!         spectrum.last_x,
//!         spectrum.x_units,
//!     );
//! }
//! for diagnostic in outcome.diagnostics.entries() {
//!     eprintln!("{:?}: {}", diagnostic.severity, diagnostic.message);
//! }
//! # Ok::<(), specdx::ParseError>(())
//! ```
//!
//! ## Error model
//!
//! Parsing never throws for recoverable conditions. Unknown tags, malformed
//! fields and discarded spectra accumulate in a per-document
//! [`DiagnosticLog`](diagnostics::DiagnosticLog) returned alongside the
//! spectra; a parse yielding zero spectra is the caller's failure signal.
//! The only hard failure surfaced to callers is the stream-open error from
//! [`parse_file`].
//!
//! ## Concurrency
//!
//! A parse call is single-threaded and owns its input for its duration.
//! Every invocation uses its own cursor, dispatcher and builder state, so
//! independent documents may be parsed concurrently. A built [`Spectrum`]
//! is immutable and safe for concurrent read-only access.

#![deny(missing_docs)]
#![deny(rustdoc::missing_crate_level_docs)]

pub mod coords;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod jcamp;
pub mod spectrum;
pub mod units;
pub mod xml;

pub use error::ParseError;
pub use spectrum::{ExportWindow, Spectrum};
pub use xml::{animl, cml};

use std::path::Path;

use diagnostics::DiagnosticLog;

/// Result of one document parse: the decoded spectra plus every diagnostic
/// recorded along the way.
#[derive(Debug, Default)]
pub struct ParseOutcome {
    /// Successfully decoded spectra, in document order.
    pub spectra: Vec<Spectrum>,
    /// Ordered diagnostics for the whole document.
    pub diagnostics: DiagnosticLog,
}

/// Parse a spectroscopy file, detecting the format from its content.
///
/// The only error surfaced here is failure to open or read the file; every
/// in-document condition is reported through the returned
/// [`ParseOutcome::diagnostics`].
pub fn parse_file(path: impl AsRef<Path>) -> Result<ParseOutcome, ParseError> {
    let text = std::fs::read_to_string(path)?;
    Ok(parse_str(&text))
}

/// Parse spectroscopy data from text, detecting the format from its
/// leading bytes: a `##` label line means JCAMP-DX, an XML document
/// dispatches on its root element (AnIML vs. CML).
pub fn parse_str(text: &str) -> ParseOutcome {
    let head = text.trim_start();
    let probe_len = head.len().min(2048);
    let probe = head.get(..probe_len).unwrap_or(head);
    // vendor export banners may precede the first ##TITLE= label
    let jcamp_like = !head.starts_with('<')
        && probe
            .lines()
            .any(|line| line.trim_start().starts_with("##"));
    if jcamp_like {
        return jcamp::parse_str(text);
    }
    let probe = probe.to_ascii_lowercase();
    if probe.contains("<animl") {
        animl::parse(text.as_bytes())
    } else {
        cml::parse(text.as_bytes())
    }
}
