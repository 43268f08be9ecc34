//! AnIML (Analytical Information Markup Language) spectrum parsing
//!
//! Each `<ExperimentStep>` yields one spectrum. Series data arrives in one
//! of three value-set forms: explicit values (`IndividualValueSet`), an
//! analytic range (`AutoIncrementedValueSet`), or base64 IEEE floats
//! (`EncodedValueSet`). The series with `dependency="independent"` is the
//! x axis, dependent series the y axis; the declared `SeriesSet` length is
//! the canonical point count.

use std::io::BufRead;

use crate::coords::{self, DecodeError};
use crate::diagnostics::{DiagnosticLog, Severity};
use crate::dispatch::{animl_tags, AnimlTag, TagTable};
use crate::error::ParseError;
use crate::spectrum::{Spectrum, SpectrumBuilder};
use crate::xml::cursor::{XmlCursor, XmlToken};
use crate::xml::encoded::{self, ValueEncoding};
use crate::ParseOutcome;

/// Parse an AnIML document from a BufRead source.
pub fn parse<R: BufRead>(reader: R) -> ParseOutcome {
    let mut diagnostics = DiagnosticLog::new();
    let mut spectra = Vec::new();
    let table = animl_tags();
    let mut cursor = XmlCursor::new(reader);
    let mut sample_name = String::new();

    loop {
        match cursor.advance() {
            Ok(XmlToken::Start {
                name,
                attributes,
                empty,
            }) => match table.resolve(&name) {
                Some(AnimlTag::Sample) => {
                    if let Some(n) = attributes.get("name") {
                        sample_name = n.to_string();
                    }
                }
                Some(AnimlTag::ExperimentStep) if !empty => {
                    let title = attributes
                        .get("name")
                        .filter(|n| !n.is_empty())
                        .unwrap_or(&sample_name)
                        .to_string();
                    if parse_experiment_step(
                        &mut cursor,
                        &table,
                        title,
                        &mut spectra,
                        &mut diagnostics,
                    )
                    .is_err()
                    {
                        break;
                    }
                }
                Some(_) => {}
                None => diagnostics.push_at(
                    Severity::Info,
                    &name,
                    format!("unrecognized tag <{name}> skipped"),
                ),
            },
            Ok(XmlToken::End { .. }) => {}
            Ok(XmlToken::Eof) => break,
            Err(e) => {
                diagnostics.error(format!("document terminated early: {e}"));
                break;
            }
        }
    }

    ParseOutcome {
        spectra,
        diagnostics,
    }
}

/// Raw content of one `<Series>` before it is committed to an axis.
#[derive(Debug, Default)]
struct SeriesState {
    independent: bool,
    encoding: ValueEncoding,
    unit_label: Option<String>,
    values: Option<Vec<f64>>,
    analytic_start: Option<f64>,
    analytic_end: Option<f64>,
    analytic_increment: Option<f64>,
}

/// Parse one `<ExperimentStep>` into `spectra`.
///
/// Decode failures discard only this step; `Err` means the document itself
/// is unusable (a partial spectrum with data is still pushed first).
fn parse_experiment_step<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    table: &TagTable<AnimlTag>,
    title: String,
    spectra: &mut Vec<Spectrum>,
    diagnostics: &mut DiagnosticLog,
) -> Result<(), ParseError> {
    let mut builder = SpectrumBuilder::new();
    builder.set_title(&title);

    let mut series_length: Option<usize> = None;
    let mut series: Option<SeriesState> = None;
    let mut parameter_name: Option<String> = None;
    let mut parameter_text: Option<String> = None;
    let mut parameter_unit: Option<String> = None;

    loop {
        match cursor.advance() {
            Ok(XmlToken::Start {
                name,
                attributes,
                empty,
            }) => match table.resolve(&name) {
                Some(AnimlTag::Technique) => {
                    if let Some(t) = attributes.get("name") {
                        builder.set_data_type(t);
                    }
                }
                Some(AnimlTag::SeriesSet) => {
                    series_length = attributes.get_usize("length");
                }
                Some(AnimlTag::Series) if !empty => {
                    let mut state = SeriesState {
                        independent: attributes
                            .get("dependency")
                            .is_some_and(|d| d.eq_ignore_ascii_case("independent")),
                        ..SeriesState::default()
                    };
                    if let Some(series_type) = attributes.get("seriestype") {
                        if let Some(enc) = ValueEncoding::from_series_type(series_type) {
                            state.encoding = enc;
                        }
                    }
                    series = Some(state);
                }
                Some(AnimlTag::IndividualValueSet) if !empty => {
                    match read_individual_values(cursor, table, diagnostics) {
                        Ok(values) => {
                            if let Some(ref mut s) = series {
                                s.values = Some(values);
                            }
                        }
                        Err(ParseError::Decode(e)) => {
                            diagnostics
                                .error(format!("experiment step {title:?} discarded: {e}"));
                            resync(cursor, table, diagnostics);
                            return Ok(());
                        }
                        Err(e) => {
                            diagnostics.error(format!("document terminated early: {e}"));
                            return Err(e);
                        }
                    }
                }
                Some(AnimlTag::AutoIncrementedValueSet) if !empty => {
                    if let Some(ref mut s) = series {
                        read_auto_incremented(cursor, table, s)?;
                    } else {
                        skip_to_end(cursor, table, AnimlTag::AutoIncrementedValueSet)?;
                    }
                }
                Some(AnimlTag::Unit) => {
                    let label = attributes.get("label").map(str::to_string);
                    if let Some(ref mut s) = series {
                        s.unit_label = label;
                    } else if parameter_name.is_some() {
                        parameter_unit = label;
                    }
                }
                Some(AnimlTag::Parameter) if !empty => {
                    parameter_name = attributes.get("name").map(|n| n.to_ascii_lowercase());
                    parameter_text = None;
                    parameter_unit = None;
                }
                Some(AnimlTag::ExperimentStep) => {
                    diagnostics.push_at(
                        Severity::Warning,
                        &name,
                        "nested <ExperimentStep> not supported, skipped",
                    );
                    if !empty {
                        skip_to_end(cursor, table, AnimlTag::ExperimentStep)?;
                    }
                }
                Some(_) => {}
                None => {
                    // value elements (<F>, <D>, ...) inside parameters carry
                    // the parameter value as their text
                    if parameter_name.is_none() {
                        diagnostics.push_at(
                            Severity::Info,
                            &name,
                            format!("unrecognized tag <{name}> skipped"),
                        );
                    }
                }
            },
            Ok(XmlToken::End { name }) => match table.resolve(&name) {
                Some(AnimlTag::ExperimentStep) => break,
                Some(AnimlTag::EncodedValueSet) => {
                    if let Some(ref mut s) = series {
                        match encoded::decode(cursor.text(), s.encoding) {
                            Ok(values) => s.values = Some(values),
                            Err(e) => {
                                diagnostics.error(format!(
                                    "experiment step {title:?} discarded: {e}"
                                ));
                                resync(cursor, table, diagnostics);
                                return Ok(());
                            }
                        }
                    }
                }
                Some(AnimlTag::Series) => {
                    if let Some(state) = series.take() {
                        match commit_series(state, series_length, &mut builder, diagnostics) {
                            Ok(()) => {}
                            Err(e) => {
                                diagnostics.error(format!(
                                    "experiment step {title:?} discarded: {e}"
                                ));
                                resync(cursor, table, diagnostics);
                                return Ok(());
                            }
                        }
                    }
                }
                Some(AnimlTag::Parameter) => {
                    if let Some(name) = parameter_name.take() {
                        apply_parameter(
                            &name,
                            parameter_text.take().as_deref(),
                            parameter_unit.take().as_deref(),
                            &mut builder,
                        );
                    }
                }
                _ => {
                    if parameter_name.is_some() && !cursor.text().trim().is_empty() {
                        parameter_text = Some(cursor.text().trim().to_string());
                    }
                }
            },
            Ok(XmlToken::Eof) => {
                diagnostics.error("unexpected end of document inside <ExperimentStep>");
                break;
            }
            Err(e) => {
                diagnostics.error(format!("document terminated early: {e}"));
                if builder.has_x() && builder.has_y() {
                    if let Some(spectrum) = builder.build(diagnostics) {
                        spectra.push(spectrum);
                    }
                }
                return Err(e);
            }
        }
    }

    if let Some(spectrum) = builder.build(diagnostics) {
        spectra.push(spectrum);
    }
    Ok(())
}

/// Install one completed series into the builder.
fn commit_series(
    state: SeriesState,
    series_length: Option<usize>,
    builder: &mut SpectrumBuilder,
    diagnostics: &mut DiagnosticLog,
) -> Result<(), ParseError> {
    if let Some(ref label) = state.unit_label {
        if state.independent {
            builder.set_x_units(label);
        } else {
            builder.set_y_units(label);
        }
    }

    if let Some(mut values) = state.values {
        if let Some(n) = series_length {
            if values.len() < n {
                return Err(ParseError::Decode(DecodeError::Shortfall {
                    expected: n,
                    actual: values.len(),
                }));
            }
            if values.len() > n {
                diagnostics.warning(format!(
                    "series carries {} values, declared length is {n}; surplus dropped",
                    values.len()
                ));
                values.truncate(n);
            }
        }
        if state.independent {
            builder.set_discrete_x(values);
        } else {
            builder.set_y(values);
        }
        return Ok(());
    }

    if let Some(start) = state.analytic_start {
        let Some(n) = series_length else {
            diagnostics.warning("auto-incremented series without SeriesSet length skipped");
            return Ok(());
        };
        let end = match (state.analytic_end, state.analytic_increment) {
            (Some(end), _) => end,
            (None, Some(increment)) => start + increment * n.saturating_sub(1) as f64,
            (None, None) => {
                diagnostics
                    .warning("auto-incremented series without EndValue or Increment skipped");
                return Ok(());
            }
        };
        let values = coords::decode_analytic(start, end, n)?;
        if state.independent {
            builder.set_continuous_x(values);
        } else {
            builder.set_y(values);
        }
        return Ok(());
    }

    diagnostics.warning("series without a value set skipped");
    Ok(())
}

/// Read an `<IndividualValueSet>`: each child element (`<F>`, `<D>`, ...)
/// holds one value as text. Some writers emit a single whitespace-delimited
/// text run instead; both forms are accepted.
fn read_individual_values<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    table: &TagTable<AnimlTag>,
    diagnostics: &mut DiagnosticLog,
) -> Result<Vec<f64>, ParseError> {
    let mut values = Vec::new();
    loop {
        match cursor.advance()? {
            XmlToken::Start { .. } => {}
            XmlToken::End { name } => {
                if table.resolve(&name) == Some(AnimlTag::IndividualValueSet) {
                    let trailing = cursor.text().trim();
                    if values.is_empty() && !trailing.is_empty() {
                        let n = trailing.split_whitespace().count();
                        return Ok(coords::decode_delimited(trailing, ' ', n, 1.0)?);
                    }
                    return Ok(values);
                }
                let text = cursor.text().trim();
                if text.is_empty() {
                    continue;
                }
                match text.parse::<f64>() {
                    Ok(v) => values.push(v),
                    Err(_) => diagnostics.push_at(
                        Severity::Warning,
                        &name,
                        format!("unparseable series value {text:?}"),
                    ),
                }
            }
            XmlToken::Eof => {
                return Err(ParseError::InvalidStructure(
                    "unexpected EOF inside <IndividualValueSet>".to_string(),
                ))
            }
        }
    }
}

/// Read an `<AutoIncrementedValueSet>`: StartValue plus EndValue or
/// Increment, each carried as the text of a nested value element.
fn read_auto_incremented<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    table: &TagTable<AnimlTag>,
    state: &mut SeriesState,
) -> Result<(), ParseError> {
    #[derive(Clone, Copy)]
    enum Field {
        Start,
        End,
        Increment,
    }
    let mut field: Option<Field> = None;

    loop {
        match cursor.advance()? {
            XmlToken::Start { name, .. } => match table.resolve(&name) {
                Some(AnimlTag::StartValue) => field = Some(Field::Start),
                Some(AnimlTag::EndValue) => field = Some(Field::End),
                Some(AnimlTag::Increment) => field = Some(Field::Increment),
                _ => {}
            },
            XmlToken::End { name } => {
                if table.resolve(&name) == Some(AnimlTag::AutoIncrementedValueSet) {
                    return Ok(());
                }
                if let (Some(f), Ok(v)) = (field, cursor.text().trim().parse::<f64>()) {
                    match f {
                        Field::Start => state.analytic_start = Some(v),
                        Field::End => state.analytic_end = Some(v),
                        Field::Increment => state.analytic_increment = Some(v),
                    }
                }
                match table.resolve(&name) {
                    Some(AnimlTag::StartValue)
                    | Some(AnimlTag::EndValue)
                    | Some(AnimlTag::Increment) => field = None,
                    _ => {}
                }
            }
            XmlToken::Eof => {
                return Err(ParseError::InvalidStructure(
                    "unexpected EOF inside <AutoIncrementedValueSet>".to_string(),
                ))
            }
        }
    }
}

/// Apply a completed `<Parameter>` to the builder.
fn apply_parameter(
    name: &str,
    text: Option<&str>,
    unit_label: Option<&str>,
    builder: &mut SpectrumBuilder,
) {
    let Some(text) = text else {
        return;
    };
    match name {
        "nmr.observe frequency" => {
            if let Ok(v) = text.parse::<f64>() {
                // MHz by convention unless the unit label says otherwise
                let scale = match unit_label.map(|u| u.to_ascii_lowercase()) {
                    Some(ref u) if u == "hz" => 1.0,
                    Some(ref u) if u == "khz" => 1.0e3,
                    Some(ref u) if u == "ghz" => 1.0e9,
                    _ => 1.0e6,
                };
                builder.set_observed_frequency(v * scale);
            }
        }
        "nmr.observe nucleus" => builder.set_observed_nucleus(text),
        _ => {}
    }
}

/// Skip the rest of the current element identified by `tag`.
fn skip_to_end<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    table: &TagTable<AnimlTag>,
    tag: AnimlTag,
) -> Result<(), ParseError> {
    let mut depth = 1usize;
    loop {
        match cursor.advance()? {
            XmlToken::Start { name, empty, .. } => {
                if !empty && table.resolve(&name) == Some(tag) {
                    depth += 1;
                }
            }
            XmlToken::End { name } => {
                if table.resolve(&name) == Some(tag) {
                    depth -= 1;
                    if depth == 0 {
                        return Ok(());
                    }
                }
            }
            XmlToken::Eof => {
                return Err(ParseError::InvalidStructure(format!(
                    "unexpected EOF inside <{tag:?}>"
                )))
            }
        }
    }
}

/// Best-effort skip to the end of the enclosing experiment step after a
/// per-step failure.
fn resync<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    table: &TagTable<AnimlTag>,
    diagnostics: &mut DiagnosticLog,
) {
    if let Err(e) = skip_to_end(cursor, table, AnimlTag::ExperimentStep) {
        diagnostics.error(format!("resynchronization failed: {e}"));
    }
}
