//! CML (Chemical Markup Language) spectrum parsing
//!
//! One forward pass per document. Each `<spectrum>` element yields at most
//! one [`Spectrum`]; sibling `<spectrum>` elements form a multi-spectrum
//! container and are decoded independently, so one malformed block never
//! takes down its siblings.
//!
//! A CML spectrum carries its data either as a continuous `<spectrumData>`
//! payload (x/y axes with analytic ranges or delimited text) or as a
//! discrete `<peakList>`. The two are mutually exclusive views of the same
//! spectrum: whichever appears first wins and the other is ignored.

use std::io::BufRead;

use crate::coords;
use crate::diagnostics::{DiagnosticLog, Severity};
use crate::dispatch::{cml_tags, CmlTag, TagTable};
use crate::error::ParseError;
use crate::spectrum::{Spectrum, SpectrumBuilder};
use crate::xml::cursor::{Attributes, XmlCursor, XmlToken};
use crate::ParseOutcome;

/// Parse a CML document from a BufRead source.
pub fn parse<R: BufRead>(reader: R) -> ParseOutcome {
    let mut diagnostics = DiagnosticLog::new();
    let mut spectra = Vec::new();
    let table = cml_tags();
    let mut cursor = XmlCursor::new(reader);

    loop {
        match cursor.advance() {
            Ok(XmlToken::Start {
                name,
                attributes,
                empty,
            }) => match table.resolve(&name) {
                Some(CmlTag::Spectrum) if !empty => {
                    if parse_spectrum(
                        &mut cursor,
                        &table,
                        &attributes,
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

/// Tags handled exactly once per `<spectrum>`; a repeat occurrence draws a
/// diagnostic and is skipped.
fn handled_once(tag: CmlTag) -> bool {
    matches!(
        tag,
        CmlTag::SpectrumData | CmlTag::PeakList | CmlTag::Sample | CmlTag::MetadataList
    )
}

/// Parse one `<spectrum>` element into `spectra`.
///
/// `Err` means the document itself is unusable (malformed markup); a
/// partially populated spectrum is still pushed first when it has data.
/// Per-spectrum failures (decode shortfall) discard only this spectrum.
fn parse_spectrum<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    table: &TagTable<CmlTag>,
    attributes: &Attributes,
    spectra: &mut Vec<Spectrum>,
    diagnostics: &mut DiagnosticLog,
) -> Result<(), ParseError> {
    let mut builder = SpectrumBuilder::new();
    let title = attributes.get("title").unwrap_or_default().to_string();
    builder.set_title(&title);
    if let Some(data_type) = attributes.get("type") {
        builder.set_data_type(data_type);
    }

    let mut done: Vec<CmlTag> = Vec::new();
    // scratch for elements whose value arrives as character data
    let mut pending_scalar: Option<(String, String)> = None;
    let mut in_sample_name = false;

    loop {
        match cursor.advance() {
            Ok(XmlToken::Start {
                name,
                attributes: attrs,
                empty,
            }) => {
                let tag = match table.resolve(&name) {
                    Some(tag) => tag,
                    None => {
                        diagnostics.push_at(
                            Severity::Info,
                            &name,
                            format!("unrecognized tag <{name}> skipped"),
                        );
                        continue;
                    }
                };

                if done.contains(&tag) {
                    diagnostics.push_at(
                        Severity::Warning,
                        &name,
                        format!("<{name}> already handled for this spectrum, ignoring repeat"),
                    );
                    if !empty {
                        skip_element(cursor, &name)?;
                    }
                    continue;
                }

                match tag {
                    CmlTag::Spectrum => {
                        diagnostics.push_at(
                            Severity::Warning,
                            &name,
                            "nested <spectrum> not supported, skipped",
                        );
                        if !empty {
                            skip_element(cursor, &name)?;
                        }
                    }
                    CmlTag::SpectrumData => {
                        if empty {
                            continue;
                        }
                        if builder.has_x() {
                            diagnostics.push_at(
                                Severity::Warning,
                                &name,
                                "spectrumData ignored: data already present (first-found wins)",
                            );
                            skip_element(cursor, &name)?;
                        } else {
                            match parse_spectrum_data(cursor, table, &mut builder, diagnostics) {
                                Ok(()) => {}
                                Err(ParseError::Decode(e)) => {
                                    diagnostics.error(format!(
                                        "spectrum {title:?} discarded: {e}"
                                    ));
                                    resync(cursor, "spectrum", diagnostics);
                                    return Ok(());
                                }
                                Err(e) => return abort(builder, spectra, diagnostics, e),
                            }
                        }
                    }
                    CmlTag::PeakList => {
                        if empty {
                            continue;
                        }
                        if builder.has_x() {
                            // mutually exclusive representations; the
                            // continuous payload was found first
                            diagnostics.push_at(
                                Severity::Info,
                                &name,
                                "peakList ignored: spectrumData already present",
                            );
                            skip_element(cursor, &name)?;
                        } else {
                            match parse_peak_list(cursor, table, &mut builder, diagnostics) {
                                Ok(()) => {}
                                Err(e) => return abort(builder, spectra, diagnostics, e),
                            }
                        }
                    }
                    CmlTag::Molecule => {
                        if !empty {
                            skip_element(cursor, &name)?;
                        }
                    }
                    CmlTag::Metadata => {
                        apply_metadata(&attrs, &mut builder);
                    }
                    CmlTag::Formula => {
                        if let Some(form) = attrs.get("concise").or_else(|| attrs.get("inline")) {
                            builder.set_mol_form(form.trim());
                        }
                    }
                    CmlTag::Name => {
                        in_sample_name = !empty;
                    }
                    CmlTag::Scalar => {
                        if !empty {
                            pending_scalar = Some((
                                attrs.get("dictref").unwrap_or_default().to_ascii_lowercase(),
                                attrs.get("units").unwrap_or_default().to_ascii_lowercase(),
                            ));
                        }
                    }
                    // plain containers; their children dispatch in this loop
                    CmlTag::Cml
                    | CmlTag::Sample
                    | CmlTag::MetadataList
                    | CmlTag::ConditionList
                    | CmlTag::ParameterList
                    | CmlTag::Parameter
                    | CmlTag::XAxis
                    | CmlTag::YAxis
                    | CmlTag::Array
                    | CmlTag::Peak => {}
                }

                if handled_once(tag) && !done.contains(&tag) {
                    done.push(tag);
                }
            }
            Ok(XmlToken::End { name }) => match table.resolve(&name) {
                Some(CmlTag::Spectrum) => break,
                Some(CmlTag::Name) if in_sample_name => {
                    builder.set_cas_name(cursor.text().trim());
                    in_sample_name = false;
                }
                Some(CmlTag::Scalar) => {
                    if let Some((dict_ref, units)) = pending_scalar.take() {
                        apply_scalar(&dict_ref, &units, cursor.text(), &mut builder, diagnostics);
                    }
                }
                _ => {}
            },
            Ok(XmlToken::Eof) => {
                diagnostics.error("unexpected end of document inside <spectrum>");
                break;
            }
            Err(e) => return abort(builder, spectra, diagnostics, e),
        }
    }

    if let Some(spectrum) = builder.build(diagnostics) {
        spectra.push(spectrum);
    }
    Ok(())
}

/// Document-fatal exit: keep whatever the builder accumulated, then abort.
fn abort(
    builder: SpectrumBuilder,
    spectra: &mut Vec<Spectrum>,
    diagnostics: &mut DiagnosticLog,
    e: ParseError,
) -> Result<(), ParseError> {
    diagnostics.error(format!("document terminated early: {e}"));
    if builder.has_x() && builder.has_y() {
        if let Some(spectrum) = builder.build(diagnostics) {
            spectra.push(spectrum);
        }
    }
    Err(e)
}

/// Parse `<spectrumData>`: xaxis/yaxis containers, each with one `<array>`.
fn parse_spectrum_data<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    table: &TagTable<CmlTag>,
    builder: &mut SpectrumBuilder,
    diagnostics: &mut DiagnosticLog,
) -> Result<(), ParseError> {
    #[derive(Clone, Copy, PartialEq)]
    enum Axis {
        X,
        Y,
    }

    let mut axis: Option<Axis> = None;
    let mut multiplier = 1.0;
    let mut pending_array: Option<Attributes> = None;

    loop {
        match cursor.advance()? {
            XmlToken::Start {
                name,
                attributes,
                empty,
            } => match table.resolve(&name) {
                Some(CmlTag::XAxis) => {
                    axis = Some(Axis::X);
                    multiplier = attributes.get_f64("multipliertodata").unwrap_or(1.0);
                }
                Some(CmlTag::YAxis) => {
                    axis = Some(Axis::Y);
                    multiplier = attributes.get_f64("multipliertodata").unwrap_or(1.0);
                }
                Some(CmlTag::Array) => {
                    if empty {
                        // analytic arrays are frequently self-closing
                        decode_array(&attributes, "", axis_is_x(axis), multiplier, builder, diagnostics)?;
                    } else {
                        pending_array = Some(attributes);
                    }
                }
                Some(_) => {}
                None => diagnostics.push_at(
                    Severity::Info,
                    &name,
                    format!("unrecognized tag <{name}> skipped"),
                ),
            },
            XmlToken::End { name } => match table.resolve(&name) {
                Some(CmlTag::SpectrumData) => return Ok(()),
                Some(CmlTag::Array) => {
                    if let Some(attrs) = pending_array.take() {
                        let text = cursor.text().to_string();
                        decode_array(&attrs, &text, axis_is_x(axis), multiplier, builder, diagnostics)?;
                    }
                }
                Some(CmlTag::XAxis) | Some(CmlTag::YAxis) => axis = None,
                _ => {}
            },
            XmlToken::Eof => {
                return Err(ParseError::InvalidStructure(
                    "unexpected EOF inside <spectrumData>".to_string(),
                ))
            }
        }
    }

    fn axis_is_x(axis: Option<Axis>) -> bool {
        matches!(axis, Some(Axis::X) | None)
    }
}

/// Decode one `<array>` payload into the builder.
///
/// An analytic range (`start`/`end` attributes) reconstructs the axis
/// arithmetically and marks the spectrum continuous; otherwise the element
/// text is a delimited run scaled by the axis multiplier.
fn decode_array(
    attrs: &Attributes,
    text: &str,
    is_x: bool,
    multiplier: f64,
    builder: &mut SpectrumBuilder,
    diagnostics: &mut DiagnosticLog,
) -> Result<(), ParseError> {
    if let Some(units) = attrs.get("units") {
        if is_x {
            builder.set_x_units(units);
        } else {
            builder.set_y_units(units);
        }
    }

    let size = attrs.get_usize("size");

    if let (Some(start), Some(end)) = (attrs.get_f64("start"), attrs.get_f64("end")) {
        let Some(n) = size else {
            diagnostics.push_at(
                Severity::Warning,
                "array",
                "analytic array without size attribute skipped",
            );
            return Ok(());
        };
        let values = coords::decode_analytic(start, end, n)?;
        if is_x {
            builder.set_continuous_x(values);
        } else {
            builder.set_y(values);
        }
        return Ok(());
    }

    let n = match size {
        Some(n) => n,
        // y arrays may omit size; the x decode established the point count
        None if !is_x && builder.x_len() > 0 => builder.x_len(),
        None => {
            diagnostics.push_at(
                Severity::Warning,
                "array",
                "array without size attribute skipped",
            );
            return Ok(());
        }
    };
    let delimiter = attrs
        .get("delimiter")
        .and_then(|d| d.chars().next())
        .unwrap_or(' ');
    let values = coords::decode_delimited(text, delimiter, n, multiplier)?;
    if is_x {
        builder.set_discrete_x(values);
    } else {
        builder.set_y(values);
    }
    Ok(())
}

/// Parse `<peakList>`: one `<peak>` per point.
fn parse_peak_list<R: BufRead>(
    cursor: &mut XmlCursor<R>,
    table: &TagTable<CmlTag>,
    builder: &mut SpectrumBuilder,
    diagnostics: &mut DiagnosticLog,
) -> Result<(), ParseError> {
    loop {
        match cursor.advance()? {
            XmlToken::Start {
                name,
                attributes,
                empty,
            } => match table.resolve(&name) {
                Some(CmlTag::Peak) => {
                    apply_peak(&attributes, builder, diagnostics);
                    if !empty {
                        // peak substructure (multiplets, atom assignments)
                        // belongs to the chemistry layers
                        skip_element(cursor, &name)?;
                    }
                }
                Some(_) => {}
                None => diagnostics.push_at(
                    Severity::Info,
                    &name,
                    format!("unrecognized tag <{name}> skipped"),
                ),
            },
            XmlToken::End { name } => {
                if table.resolve(&name) == Some(CmlTag::PeakList) {
                    return Ok(());
                }
            }
            XmlToken::Eof => {
                return Err(ParseError::InvalidStructure(
                    "unexpected EOF inside <peakList>".to_string(),
                ))
            }
        }
    }
}

/// Apply one `<peak>` element to the builder.
fn apply_peak(attrs: &Attributes, builder: &mut SpectrumBuilder, diagnostics: &mut DiagnosticLog) {
    let Some(x) = attrs.get_f64("xvalue") else {
        diagnostics.push_at(Severity::Warning, "peak", "peak without xValue skipped");
        return;
    };
    if let Some(units) = attrs.get("xunits") {
        builder.set_x_units(units);
    }
    if let Some(units) = attrs.get("yunits") {
        builder.set_y_units(units);
    }

    let y = match attrs.get_f64("yvalue") {
        Some(y) => y,
        None => match attrs.get("atomrefs") {
            Some(refs) => coords::synthetic_peak_intensity(refs),
            None => {
                diagnostics.push_at(
                    Severity::Info,
                    "peak",
                    "peak without yValue or atomRefs, intensity set to 0",
                );
                0.0
            }
        },
    };
    builder.push_peak(x, y);
}

/// Apply a `<metadata name=... content=...>` entry.
fn apply_metadata(attrs: &Attributes, builder: &mut SpectrumBuilder) {
    let (Some(name), Some(content)) = (attrs.get("name"), attrs.get("content")) else {
        return;
    };
    let key = name
        .rsplit_once(':')
        .map_or(name, |(_, suffix)| suffix)
        .to_ascii_lowercase();
    match key.as_str() {
        "origin" => builder.set_origin(content.trim()),
        "owner" => builder.set_owner(content.trim()),
        _ => {}
    }
}

/// Apply a condition/parameter `<scalar>` once its text is complete.
///
/// The NMR observed frequency arrives as a `field` scalar; its unit suffix
/// decides the scale to Hz.
fn apply_scalar(
    dict_ref: &str,
    units: &str,
    text: &str,
    builder: &mut SpectrumBuilder,
    diagnostics: &mut DiagnosticLog,
) {
    if !dict_ref.contains("field") {
        return;
    }
    let Ok(value) = text.trim().parse::<f64>() else {
        diagnostics.push_at(
            Severity::Warning,
            "scalar",
            format!("unparseable field scalar {:?}", text.trim()),
        );
        return;
    };
    builder.set_observed_frequency(value * frequency_scale_to_hz(units));
}

/// Scale factor from a frequency unit label (namespace stripped,
/// lowercased) to Hz. Unknown labels are taken as Hz.
fn frequency_scale_to_hz(units: &str) -> f64 {
    let suffix = units.rsplit_once(':').map_or(units, |(_, s)| s).trim();
    match suffix {
        "ghz" => 1.0e9,
        "mhz" => 1.0e6,
        "khz" => 1.0e3,
        _ => 1.0,
    }
}

/// Skip the rest of the current `name` element, honoring nesting.
fn skip_element<R: BufRead>(cursor: &mut XmlCursor<R>, name: &str) -> Result<(), ParseError> {
    let mut depth = 1usize;
    loop {
        match cursor.advance()? {
            XmlToken::Start {
                name: n, empty, ..
            } if n.eq_ignore_ascii_case(name) && !empty => depth += 1,
            XmlToken::End { name: n } if n.eq_ignore_ascii_case(name) => {
                depth -= 1;
                if depth == 0 {
                    return Ok(());
                }
            }
            XmlToken::Eof => {
                return Err(ParseError::InvalidStructure(format!(
                    "unexpected EOF inside <{name}>"
                )))
            }
            _ => {}
        }
    }
}

/// Best-effort skip to the end of the enclosing `name` element after a
/// per-spectrum failure; errors here are recorded, not propagated.
fn resync<R: BufRead>(cursor: &mut XmlCursor<R>, name: &str, diagnostics: &mut DiagnosticLog) {
    if let Err(e) = skip_element(cursor, name) {
        diagnostics.error(format!("resynchronization failed: {e}"));
    }
}
