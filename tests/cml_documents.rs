//! Integration tests for complete CML documents.

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

const CONTINUOUS_AND_PEAKS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<cml xmlns="http://www.xml-cml.org/schema">
  <spectrum title="both representations" type="infrared">
    <spectrumData>
      <xaxis>
        <array units="units:cm-1" start="600.0" end="603.0" size="4"/>
      </xaxis>
      <yaxis multiplierToData="0.5">
        <array units="units:absorbance" size="4">2 4 6 8</array>
      </yaxis>
    </spectrumData>
    <peakList>
      <peak xValue="100.0" yValue="50.0"/>
      <peak xValue="200.0" yValue="60.0"/>
    </peakList>
  </spectrum>
</cml>
"#;

#[test]
fn continuous_data_wins_over_peak_list() {
    init_logging();
    let outcome = specdx::parse_str(CONTINUOUS_AND_PEAKS);
    assert_eq!(outcome.spectra.len(), 1);

    let s = &outcome.spectra[0];
    assert!(s.continuous);
    assert_eq!(s.npoints, 4);
    assert_eq!(s.x_units, "1/CM");
    assert_eq!(s.y_units, "ABSORBANCE");
    // multiplierToData applied to the delimited ordinates
    assert_eq!(s.y, vec![1.0, 2.0, 3.0, 4.0]);
    // the peak list was ignored entirely
    assert!(!s.x.contains(&100.0));
    assert!(!s.x.contains(&200.0));
    assert!(s.increasing);
}

#[test]
fn analytic_axis_matches_range() {
    init_logging();
    let outcome = specdx::parse_str(CONTINUOUS_AND_PEAKS);
    let s = &outcome.spectra[0];
    assert_eq!(s.first_x, 600.0);
    assert_eq!(s.last_x, 603.0);
    for (i, x) in s.x.iter().enumerate() {
        assert!((x - (600.0 + i as f64 * s.delta_x)).abs() < 1e-9);
    }
}

#[test]
fn line_wrapped_array_payload_decodes() {
    init_logging();
    let doc = "<cml>
      <spectrum title=\"wrapped\">
        <spectrumData>
          <xaxis><array units=\"units:nm\" start=\"200\" end=\"203\" size=\"4\"/></xaxis>
          <yaxis><array size=\"4\">1 2\n3 4</array></yaxis>
        </spectrumData>
      </spectrum>
    </cml>";
    let outcome = specdx::parse_str(doc);

    assert_eq!(outcome.spectra.len(), 1);
    let s = &outcome.spectra[0];
    assert_eq!(s.y, vec![1.0, 2.0, 3.0, 4.0]);
    assert!(!outcome.diagnostics.has_errors());
}

#[test]
fn peak_without_y_value_synthesizes_from_atom_refs() {
    init_logging();
    let doc = r#"<cml>
      <spectrum title="assigned peaks" type="NMR">
        <peakList>
          <peak xValue="7.26" xUnits="units:ppm" atomRefs="a1 a2 a3"/>
          <peak xValue="2.10" yValue="500.0"/>
        </peakList>
      </spectrum>
    </cml>"#;
    let outcome = specdx::parse_str(doc);
    assert_eq!(outcome.spectra.len(), 1);

    let s = &outcome.spectra[0];
    assert!(!s.continuous);
    assert_eq!(s.npoints, 2);
    assert_eq!(s.y[0], 147.0);
    assert_eq!(s.y[1], 500.0);
    assert_eq!(s.x_units, "PPM");
    // endpoint comparison: 2.10 < 7.26
    assert!(!s.increasing);
    assert_eq!(s.increasing, s.last_x > s.first_x);
}

#[test]
fn malformed_sibling_does_not_take_down_the_document() {
    init_logging();
    let doc = r#"<cml>
      <spectrum title="first">
        <spectrumData>
          <xaxis><array units="units:nm" start="200" end="203" size="4"/></xaxis>
          <yaxis><array size="4">1 2 3 4</array></yaxis>
        </spectrumData>
      </spectrum>
      <spectrum title="broken">
        <spectrumData>
          <xaxis><array units="units:nm" start="200" end="204" size="5"/></xaxis>
          <yaxis><array size="5">1 2 3</array></yaxis>
        </spectrumData>
      </spectrum>
      <spectrum title="third">
        <peakList>
          <peak xValue="50.0" yValue="10.0"/>
        </peakList>
      </spectrum>
    </cml>"#;
    let outcome = specdx::parse_str(doc);

    assert_eq!(outcome.spectra.len(), 2);
    assert_eq!(outcome.spectra[0].title, "first");
    assert_eq!(outcome.spectra[1].title, "third");
    assert!(outcome.diagnostics.has_errors());
    assert_eq!(outcome.spectra[0].x_units, "NANOMETERS");
}

#[test]
fn metadata_sample_and_field_scalar_populate_the_model() {
    init_logging();
    let doc = r#"<cml>
      <spectrum title="ethanol 1H" type="NMR">
        <metadataList>
          <metadata name="jcamp:origin" content="example lab"/>
          <metadata name="jcamp:owner" content="public domain"/>
        </metadataList>
        <sample>
          <formula concise="C 2 H 6 O 1"/>
          <name convention="cas:regno">64-17-5</name>
        </sample>
        <conditionList>
          <scalar dictRef="cml:field" units="units:mhz">400.13</scalar>
        </conditionList>
        <peakList>
          <peak xValue="1.2" yValue="300.0"/>
          <peak xValue="3.6" yValue="200.0"/>
        </peakList>
      </spectrum>
    </cml>"#;
    let outcome = specdx::parse_str(doc);
    assert_eq!(outcome.spectra.len(), 1);

    let s = &outcome.spectra[0];
    assert_eq!(s.origin, "example lab");
    assert_eq!(s.owner, "public domain");
    assert_eq!(s.mol_form, "C 2 H 6 O 1");
    assert_eq!(s.cas_name, "64-17-5");
    assert!((s.observed_frequency - 400.13e6).abs() < 1.0);
    assert!(s.increasing);
}

#[test]
fn unknown_tags_are_reported_not_fatal() {
    init_logging();
    let doc = r#"<cml>
      <spectrum title="with extensions">
        <futureExtension level="3"/>
        <peakList>
          <peak xValue="1.0" yValue="2.0"/>
        </peakList>
      </spectrum>
    </cml>"#;
    let outcome = specdx::parse_str(doc);
    assert_eq!(outcome.spectra.len(), 1);
    assert!(!outcome.diagnostics.is_empty());
    assert!(!outcome.diagnostics.has_errors());
}

#[test]
fn truncated_document_keeps_partial_fields() {
    init_logging();
    // document ends mid-element: whatever was populated survives
    let doc = r#"<cml><spectrum title="cut short">
      <peakList><peak xValue="1.0" yValue="2.0"/>"#;
    let outcome = specdx::parse_str(doc);
    assert!(!outcome.diagnostics.is_empty());
    // no assertion on spectra count beyond "no panic": the partially
    // populated spectrum is returned when it has data
    for s in &outcome.spectra {
        assert_eq!(s.npoints, s.x.len());
    }
}
