//! Integration tests for complete AnIML documents.

use base64::prelude::*;

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn encode_f64(values: &[f64]) -> String {
    let mut bytes = Vec::with_capacity(values.len() * 8);
    for v in values {
        bytes.extend_from_slice(&v.to_le_bytes());
    }
    BASE64_STANDARD.encode(bytes)
}

#[test]
fn auto_incremented_and_individual_series() {
    init_logging();
    let doc = r#"<?xml version="1.0"?>
    <AnIML version="0.90">
      <SampleSet><Sample name="benzene" sampleID="s1"/></SampleSet>
      <ExperimentStepSet>
        <ExperimentStep name="IR scan">
          <Technique name="IR"/>
          <Result>
            <SeriesSet name="spectrum" length="5">
              <Series name="wavenumber" dependency="independent">
                <AutoIncrementedValueSet>
                  <StartValue><F>4000</F></StartValue>
                  <Increment><F>-2</F></Increment>
                </AutoIncrementedValueSet>
                <Unit label="1/cm"/>
              </Series>
              <Series name="absorbance" dependency="dependent">
                <IndividualValueSet>
                  <F>0.1</F><F>0.2</F><F>0.3</F><F>0.4</F><F>0.5</F>
                </IndividualValueSet>
                <Unit label="Absorbance"/>
              </Series>
            </SeriesSet>
          </Result>
        </ExperimentStep>
      </ExperimentStepSet>
    </AnIML>"#;
    let outcome = specdx::parse_str(doc);
    assert_eq!(outcome.spectra.len(), 1);

    let s = &outcome.spectra[0];
    assert_eq!(s.title, "IR scan");
    assert_eq!(s.data_type, "IR");
    assert!(s.continuous);
    assert_eq!(s.npoints, 5);
    assert_eq!(s.first_x, 4000.0);
    assert_eq!(s.last_x, 3992.0);
    assert!(!s.increasing);
    assert_eq!(s.x_units, "1/CM");
    assert_eq!(s.y_units, "ABSORBANCE");
    assert!((s.y[2] - 0.3).abs() < 1e-12);
}

#[test]
fn encoded_value_set_decodes() {
    init_logging();
    let payload = encode_f64(&[10.5, 20.5, 30.5]);
    let doc = format!(
        r#"<AnIML version="0.90">
          <ExperimentStepSet>
            <ExperimentStep name="uv scan">
              <Result>
                <SeriesSet length="3">
                  <Series dependency="independent">
                    <IndividualValueSet>200 201 202</IndividualValueSet>
                    <Unit label="nm"/>
                  </Series>
                  <Series dependency="dependent" seriesType="Float64">
                    <EncodedValueSet>{payload}</EncodedValueSet>
                  </Series>
                </SeriesSet>
              </Result>
            </ExperimentStep>
          </ExperimentStepSet>
        </AnIML>"#
    );
    let outcome = specdx::parse_str(&doc);
    assert_eq!(outcome.spectra.len(), 1);

    let s = &outcome.spectra[0];
    assert_eq!(s.x, vec![200.0, 201.0, 202.0]);
    assert_eq!(s.y, vec![10.5, 20.5, 30.5]);
    assert_eq!(s.x_units, "NANOMETERS");
}

#[test]
fn short_series_discards_only_its_step() {
    init_logging();
    let doc = r#"<AnIML version="0.90">
      <ExperimentStepSet>
        <ExperimentStep name="good one">
          <Result>
            <SeriesSet length="2">
              <Series dependency="independent">
                <IndividualValueSet><F>1</F><F>2</F></IndividualValueSet>
              </Series>
              <Series dependency="dependent">
                <IndividualValueSet><F>10</F><F>20</F></IndividualValueSet>
              </Series>
            </SeriesSet>
          </Result>
        </ExperimentStep>
        <ExperimentStep name="bad one">
          <Result>
            <SeriesSet length="4">
              <Series dependency="independent">
                <IndividualValueSet><F>1</F><F>2</F></IndividualValueSet>
              </Series>
              <Series dependency="dependent">
                <IndividualValueSet><F>10</F><F>20</F></IndividualValueSet>
              </Series>
            </SeriesSet>
          </Result>
        </ExperimentStep>
        <ExperimentStep name="good two">
          <Result>
            <SeriesSet length="2">
              <Series dependency="independent">
                <IndividualValueSet><F>5</F><F>6</F></IndividualValueSet>
              </Series>
              <Series dependency="dependent">
                <IndividualValueSet><F>50</F><F>60</F></IndividualValueSet>
              </Series>
            </SeriesSet>
          </Result>
        </ExperimentStep>
      </ExperimentStepSet>
    </AnIML>"#;
    let outcome = specdx::parse_str(doc);

    assert_eq!(outcome.spectra.len(), 2);
    assert_eq!(outcome.spectra[0].title, "good one");
    assert_eq!(outcome.spectra[1].title, "good two");
    assert!(outcome.diagnostics.has_errors());
}

#[test]
fn bad_value_token_discards_only_its_step() {
    init_logging();
    let doc = r#"<AnIML version="0.90">
      <ExperimentStepSet>
        <ExperimentStep name="corrupt">
          <Result>
            <SeriesSet length="3">
              <Series dependency="independent">
                <IndividualValueSet>1.0 abc 2.0</IndividualValueSet>
              </Series>
              <Series dependency="dependent">
                <IndividualValueSet>10 20 30</IndividualValueSet>
              </Series>
            </SeriesSet>
          </Result>
        </ExperimentStep>
        <ExperimentStep name="intact">
          <Result>
            <SeriesSet length="2">
              <Series dependency="independent">
                <IndividualValueSet><F>1</F><F>2</F></IndividualValueSet>
              </Series>
              <Series dependency="dependent">
                <IndividualValueSet><F>10</F><F>20</F></IndividualValueSet>
              </Series>
            </SeriesSet>
          </Result>
        </ExperimentStep>
      </ExperimentStepSet>
    </AnIML>"#;
    let outcome = specdx::parse_str(doc);

    assert_eq!(outcome.spectra.len(), 1);
    assert_eq!(outcome.spectra[0].title, "intact");
    assert!(outcome.diagnostics.has_errors());
}

#[test]
fn nmr_parameters_populate_the_model() {
    init_logging();
    let doc = r#"<AnIML version="0.90">
      <SampleSet><Sample name="chloroform-d"/></SampleSet>
      <ExperimentStepSet>
        <ExperimentStep>
          <Technique name="NMR"/>
          <Method>
            <Parameter name="NMR.Observe Frequency">
              <F>400.13</F>
              <Unit label="MHz"/>
            </Parameter>
            <Parameter name="NMR.Observe Nucleus">
              <S>1H</S>
            </Parameter>
          </Method>
          <Result>
            <SeriesSet length="2">
              <Series dependency="independent">
                <IndividualValueSet><F>7.26</F><F>1.56</F></IndividualValueSet>
                <Unit label="ppm"/>
              </Series>
              <Series dependency="dependent">
                <IndividualValueSet><F>100</F><F>12</F></IndividualValueSet>
              </Series>
            </SeriesSet>
          </Result>
        </ExperimentStep>
      </ExperimentStepSet>
    </AnIML>"#;
    let outcome = specdx::parse_str(doc);
    assert_eq!(outcome.spectra.len(), 1);

    let s = &outcome.spectra[0];
    // step without a name falls back to the sample name
    assert_eq!(s.title, "chloroform-d");
    assert!((s.observed_frequency - 400.13e6).abs() < 1.0);
    assert_eq!(s.observed_nucleus, "1H");
    assert_eq!(s.x_units, "PPM");
    assert!(!s.increasing);
}

#[test]
fn surplus_values_are_truncated_with_warning() {
    init_logging();
    let doc = r#"<AnIML version="0.90">
      <ExperimentStepSet>
        <ExperimentStep name="over-long">
          <Result>
            <SeriesSet length="2">
              <Series dependency="independent">
                <IndividualValueSet><F>1</F><F>2</F><F>3</F></IndividualValueSet>
              </Series>
              <Series dependency="dependent">
                <IndividualValueSet><F>10</F><F>20</F></IndividualValueSet>
              </Series>
            </SeriesSet>
          </Result>
        </ExperimentStep>
      </ExperimentStepSet>
    </AnIML>"#;
    let outcome = specdx::parse_str(doc);

    assert_eq!(outcome.spectra.len(), 1);
    let s = &outcome.spectra[0];
    assert_eq!(s.npoints, 2);
    assert_eq!(s.x, vec![1.0, 2.0]);
    assert!(!outcome.diagnostics.is_empty());
    assert!(!outcome.diagnostics.has_errors());
}
