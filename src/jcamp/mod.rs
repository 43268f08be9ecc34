//! JCAMP-DX parsing
//!
//! JCAMP-DX files are `##LABEL=value` records ([`ldr`]); header labels fill
//! the spectrum metadata, `##XYDATA=` carries ASDF-compressed ordinates
//! ([`asdf`]) over an analytic x range, and `##PEAK TABLE=`/`##XYPOINTS=`
//! carry explicit (x, y) pairs. Compound files chain blocks: a link block
//! (`##BLOCKS=`) followed by nested `##TITLE= ... ##END=` blocks, each
//! decoded independently.

use std::io::BufRead;

use crate::coords::{self, DecodeError};
use crate::diagnostics::{DiagnosticLog, Severity};
use crate::dispatch::{canonicalize_label, jcamp_labels, JcampLabel};
use crate::spectrum::{Spectrum, SpectrumBuilder};
use crate::ParseOutcome;

pub mod asdf;
pub mod ldr;

use ldr::LdrScanner;

/// Parse a JCAMP-DX document from a BufRead source.
pub fn parse<R: BufRead>(mut reader: R) -> ParseOutcome {
    let mut text = String::new();
    if let Err(e) = reader.read_to_string(&mut text) {
        let mut diagnostics = DiagnosticLog::new();
        diagnostics.error(format!("document terminated early: {e}"));
        return ParseOutcome {
            spectra: Vec::new(),
            diagnostics,
        };
    }
    parse_str(&text)
}

/// Parse JCAMP-DX text.
pub fn parse_str(text: &str) -> ParseOutcome {
    let table = jcamp_labels();
    let mut diagnostics = DiagnosticLog::new();
    let mut spectra = Vec::new();
    let mut block: Option<BlockState> = None;

    for record in LdrScanner::new(text) {
        let label = match table.resolve(&canonicalize_label(&record.label)) {
            Some(label) => label,
            None => {
                diagnostics.push_at(
                    Severity::Info,
                    &record.label,
                    format!("unrecognized label ##{}= skipped", record.label),
                );
                continue;
            }
        };

        match label {
            JcampLabel::Title => {
                // a new TITLE opens the next block
                if let Some(open) = block.take() {
                    open.finish(&mut spectra, &mut diagnostics);
                }
                block = Some(BlockState::new(record.value.trim()));
            }
            JcampLabel::End => {
                if let Some(open) = block.take() {
                    open.finish(&mut spectra, &mut diagnostics);
                }
            }
            _ => match block {
                Some(ref mut open) => open.apply(label, &record.value, &mut diagnostics),
                None => diagnostics.push_at(
                    Severity::Warning,
                    &record.label,
                    format!("##{}= outside any block ignored", record.label),
                ),
            },
        }
    }

    if let Some(open) = block.take() {
        diagnostics.warning("block not closed by ##END=");
        open.finish(&mut spectra, &mut diagnostics);
    }

    ParseOutcome {
        spectra,
        diagnostics,
    }
}

/// Accumulated state for one `##TITLE= ... ##END=` block.
struct BlockState {
    builder: SpectrumBuilder,
    title: String,
    link_block: bool,
    discarded: bool,
    x_factor: f64,
    y_factor: f64,
    first_x: Option<f64>,
    last_x: Option<f64>,
    npoints: Option<usize>,
}

impl BlockState {
    fn new(title: &str) -> Self {
        let mut builder = SpectrumBuilder::new();
        builder.set_title(title);
        Self {
            builder,
            title: title.to_string(),
            link_block: false,
            discarded: false,
            x_factor: 1.0,
            y_factor: 1.0,
            first_x: None,
            last_x: None,
            npoints: None,
        }
    }

    fn apply(&mut self, label: JcampLabel, value: &str, diagnostics: &mut DiagnosticLog) {
        if self.discarded {
            return;
        }
        let value = value.trim();
        match label {
            JcampLabel::DataType => {
                self.builder.set_data_type(value);
                if value.eq_ignore_ascii_case("link") {
                    self.link_block = true;
                }
            }
            JcampLabel::Blocks => self.link_block = true,
            JcampLabel::Origin => self.builder.set_origin(value),
            JcampLabel::Owner => self.builder.set_owner(value),
            JcampLabel::XUnits => self.builder.set_x_units(value),
            JcampLabel::YUnits => self.builder.set_y_units(value),
            JcampLabel::Resolution => self.builder.set_resolution(value),
            JcampLabel::CasRegistryNo => self.builder.set_cas_name(value),
            JcampLabel::MolForm => self.builder.set_mol_form(value),
            JcampLabel::Spectrometer => self.builder.set_model_type(value),
            JcampLabel::ObserveNucleus => self.builder.set_observed_nucleus(value),
            JcampLabel::ObserveFrequency => {
                // value in MHz, possibly followed by a unit remark
                match first_number(value) {
                    Some(mhz) => self.builder.set_observed_frequency(mhz * 1.0e6),
                    None => self.numeric_warning(label, value, diagnostics),
                }
            }
            JcampLabel::XFactor => match first_number(value) {
                Some(v) => self.x_factor = v,
                None => self.numeric_warning(label, value, diagnostics),
            },
            JcampLabel::YFactor => match first_number(value) {
                Some(v) => self.y_factor = v,
                None => self.numeric_warning(label, value, diagnostics),
            },
            JcampLabel::FirstX => match first_number(value) {
                Some(v) => self.first_x = Some(v),
                None => self.numeric_warning(label, value, diagnostics),
            },
            JcampLabel::LastX => match first_number(value) {
                Some(v) => self.last_x = Some(v),
                None => self.numeric_warning(label, value, diagnostics),
            },
            JcampLabel::NPoints => match value.parse::<usize>() {
                Ok(n) => self.npoints = Some(n),
                Err(_) => self.numeric_warning(label, value, diagnostics),
            },
            JcampLabel::DeltaX => match first_number(value) {
                Some(v) => self.builder.set_delta_x(v),
                None => self.numeric_warning(label, value, diagnostics),
            },
            // derived from the decoded arrays at build time
            JcampLabel::FirstY | JcampLabel::Version => {}
            JcampLabel::XYData => self.decode_xydata(value, diagnostics),
            JcampLabel::XYPoints | JcampLabel::PeakTable => {
                self.decode_pairs(value, diagnostics)
            }
            JcampLabel::Title | JcampLabel::End => {}
        }
    }

    fn numeric_warning(&self, label: JcampLabel, value: &str, diagnostics: &mut DiagnosticLog) {
        diagnostics.push_at(
            Severity::Warning,
            &format!("{label:?}"),
            format!("unparseable numeric value {value:?}"),
        );
    }

    /// Decode an `(X++(Y..Y))` table: the x axis comes analytically from
    /// FIRSTX/LASTX/NPOINTS, the ordinates from the ASDF lines.
    fn decode_xydata(&mut self, value: &str, diagnostics: &mut DiagnosticLog) {
        let (Some(first_x), Some(last_x), Some(n)) = (self.first_x, self.last_x, self.npoints)
        else {
            diagnostics.error(format!(
                "block {:?} discarded: XYDATA without FIRSTX/LASTX/NPOINTS",
                self.title
            ));
            self.discarded = true;
            return;
        };

        // first line is the variable list descriptor
        let data = match value.split_once('\n') {
            Some((_descriptor, rest)) => rest,
            None => "",
        };

        let mut y = match asdf::decode_ordinates(data, self.y_factor) {
            Ok(y) => y,
            Err(e) => {
                diagnostics.error(format!("block {:?} discarded: {e}", self.title));
                self.discarded = true;
                return;
            }
        };
        if y.len() < n {
            let e = DecodeError::Shortfall {
                expected: n,
                actual: y.len(),
            };
            diagnostics.error(format!("block {:?} discarded: {e}", self.title));
            self.discarded = true;
            return;
        }
        y.truncate(n);

        // FIRSTX/LASTX are actual values; XFACTOR only scales table entries
        let x = match coords::decode_analytic(first_x, last_x, n) {
            Ok(x) => x,
            Err(e) => {
                diagnostics.error(format!("block {:?} discarded: {e}", self.title));
                self.discarded = true;
                return;
            }
        };
        self.builder.set_continuous_x(x);
        self.builder.set_y(y);
    }

    /// Decode `(XY..XY)` pairs from PEAK TABLE or XYPOINTS records. Groups
    /// split on semicolons or line breaks; numbers within a group split on
    /// commas or whitespace and pair up in order.
    fn decode_pairs(&mut self, value: &str, diagnostics: &mut DiagnosticLog) {
        let data = match value.split_once('\n') {
            Some((_descriptor, rest)) => rest,
            None => "",
        };

        for group in data.split(|c| c == ';' || c == '\n') {
            let group = group.trim();
            if group.is_empty() {
                continue;
            }
            let mut numbers = Vec::new();
            let mut bad = false;
            for token in group.split(|c: char| c == ',' || c.is_whitespace()) {
                if token.is_empty() {
                    continue;
                }
                match token.parse::<f64>() {
                    Ok(v) => numbers.push(v),
                    Err(_) => {
                        diagnostics.push_at(
                            Severity::Warning,
                            "PEAKTABLE",
                            format!("unparseable pair entry {group:?} skipped"),
                        );
                        bad = true;
                        break;
                    }
                }
            }
            if bad {
                continue;
            }
            for pair in numbers.chunks(2) {
                if let [x, y] = *pair {
                    self.builder
                        .push_peak(x * self.x_factor, y * self.y_factor);
                }
            }
        }
    }

    /// Close the block: link blocks vanish silently, discarded blocks have
    /// already logged their reason, anything else builds a spectrum.
    fn finish(self, spectra: &mut Vec<Spectrum>, diagnostics: &mut DiagnosticLog) {
        if self.discarded {
            return;
        }
        if self.link_block && !self.builder.has_x() {
            return;
        }
        if let Some(spectrum) = self.builder.build(diagnostics) {
            spectra.push(spectrum);
        }
    }
}

/// First whitespace-delimited numeric token of a value.
fn first_number(value: &str) -> Option<f64> {
    value.split_whitespace().next()?.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    const IR_BLOCK: &str = "\
##TITLE=test IR
##JCAMP-DX=4.24
##DATA TYPE=INFRARED SPECTRUM
##ORIGIN=specdx tests
##OWNER=public domain
##XUNITS=1/CM
##YUNITS=ABSORBANCE
##XFACTOR=1.0
##YFACTOR=0.001
##FIRSTX=600
##LASTX=604
##NPOINTS=5
##XYDATA=(X++(Y..Y))
600 1000 2000 3000
603 4000 5000
##END=
";

    #[test]
    fn ir_block_decodes() {
        let outcome = parse_str(IR_BLOCK);
        assert_eq!(outcome.spectra.len(), 1);
        let s = &outcome.spectra[0];
        assert_eq!(s.title, "test IR");
        assert_eq!(s.x_units, "1/CM");
        assert_eq!(s.npoints, 5);
        assert!(s.continuous);
        assert!(s.increasing);
        assert_eq!(s.first_x, 600.0);
        assert_eq!(s.last_x, 604.0);
        assert!((s.y[0] - 1.0).abs() < 1e-12);
        assert!((s.y[4] - 5.0).abs() < 1e-12);
    }

    #[test]
    fn peak_table_is_discrete() {
        let doc = "\
##TITLE=ms
##DATA TYPE=MASS SPECTRUM
##XUNITS=M/Z
##YUNITS=RELATIVE ABUNDANCE
##PEAK TABLE=(XY..XY)
15,120; 29,999
43,500
##END=
";
        let outcome = parse_str(doc);
        assert_eq!(outcome.spectra.len(), 1);
        let s = &outcome.spectra[0];
        assert!(!s.continuous);
        assert_eq!(s.npoints, 3);
        assert_eq!(s.x, vec![15.0, 29.0, 43.0]);
        assert_eq!(s.y[1], 999.0);
        assert!(s.increasing);
    }

    #[test]
    fn observe_frequency_is_scaled_to_hz() {
        let doc = "\
##TITLE=nmr
##DATA TYPE=NMR SPECTRUM
##.OBSERVE FREQUENCY=400.13
##.OBSERVE NUCLEUS=1H
##PEAK TABLE=(XY..XY)
7.26,100
##END=
";
        let outcome = parse_str(doc);
        let s = &outcome.spectra[0];
        assert!((s.observed_frequency - 400.13e6).abs() < 1.0);
        assert_eq!(s.observed_nucleus, "1H");
    }

    #[test]
    fn explicit_deltax_overrides_derived_spacing() {
        // headers written with rounded DELTAX keep the declared value
        let doc = "\
##TITLE=rounded
##XUNITS=1/CM
##FIRSTX=0
##LASTX=10
##DELTAX=3.3333
##NPOINTS=4
##XYDATA=(X++(Y..Y))
0 1 2 3 4
##END=
";
        let outcome = parse_str(doc);
        let s = &outcome.spectra[0];
        assert_eq!(s.delta_x, 3.3333);
        assert_eq!(s.npoints, 4);
    }

    #[test]
    fn shortfall_discards_block_only() {
        let doc = "\
##TITLE=bad
##FIRSTX=0
##LASTX=9
##NPOINTS=10
##XYDATA=(X++(Y..Y))
0 1 2 3
##END=
##TITLE=good
##XUNITS=1/CM
##FIRSTX=0
##LASTX=2
##NPOINTS=3
##XYDATA=(X++(Y..Y))
0 5 6 7
##END=
";
        let outcome = parse_str(doc);
        assert_eq!(outcome.spectra.len(), 1);
        assert_eq!(outcome.spectra[0].title, "good");
        assert!(outcome.diagnostics.has_errors());
    }

    #[test]
    fn link_block_vanishes_silently() {
        let doc = "\
##TITLE=compound file
##DATA TYPE=LINK
##BLOCKS=2
##TITLE=inner
##FIRSTX=0
##LASTX=1
##NPOINTS=2
##XYDATA=(X++(Y..Y))
0 1 2
##END=
##END=
";
        let outcome = parse_str(doc);
        assert_eq!(outcome.spectra.len(), 1);
        assert_eq!(outcome.spectra[0].title, "inner");
    }
}
