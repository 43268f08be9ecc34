//! In-memory spectrum model
//!
//! A [`Spectrum`] is built once per source document section and read-only
//! afterwards; renderers and exporters may share it freely across threads.
//! [`SpectrumBuilder`] is the mutable accumulator the dialect handlers write
//! into while walking the document.

use serde::{Deserialize, Serialize};

use crate::diagnostics::DiagnosticLog;
use crate::units;

/// A decoded spectrum: index-aligned x/y arrays plus the header metadata
/// renderers and exporters need.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Spectrum {
    /// Document title.
    pub title: String,
    /// Technique label (e.g. "INFRARED SPECTRUM", "NMR SPECTRUM").
    pub data_type: String,
    /// Normalized x-axis unit label (e.g. "1/CM", "M/Z").
    pub x_units: String,
    /// Normalized y-axis unit label.
    pub y_units: String,
    /// X coordinates; `x[i]` pairs with `y[i]`.
    pub x: Vec<f64>,
    /// Y coordinates, same length as `x`.
    pub y: Vec<f64>,
    /// Cached `x[0]`.
    pub first_x: f64,
    /// Cached `x[npoints - 1]`.
    pub last_x: f64,
    /// Cached `y[0]`.
    pub first_y: f64,
    /// Implied x spacing for continuous data; NaN for peak lists.
    pub delta_x: f64,
    /// True when x was reconstructed analytically with even spacing.
    pub continuous: bool,
    /// True iff `last_x > first_x` (endpoint comparison only).
    pub increasing: bool,
    /// Number of points; always equals `x.len()`.
    pub npoints: usize,
    /// Data owner, empty when absent.
    pub owner: String,
    /// Originating institution or software, empty when absent.
    pub origin: String,
    /// CAS registry name/number, empty when absent.
    pub cas_name: String,
    /// Molecular formula, empty when absent.
    pub mol_form: String,
    /// NMR observed frequency in Hz; NaN when absent. X values for NMR
    /// data stay in ppm, Hz-domain conversion is the exporter's job.
    pub observed_frequency: f64,
    /// Observed nucleus (e.g. "1H"), empty when absent.
    pub observed_nucleus: String,
    /// Instrument resolution, empty when absent.
    pub resolution: String,
    /// Model/instrument type, empty when absent.
    pub model_type: String,
}

impl Spectrum {
    /// Coordinate window handed to exporters, restricted to
    /// `[start_index, end_index]` (inclusive, clamped to the data).
    pub fn export_window(&self, start_index: usize, end_index: usize) -> ExportWindow<'_> {
        let end = end_index.min(self.npoints.saturating_sub(1));
        let start = start_index.min(end);
        ExportWindow {
            title: &self.title,
            x_units: &self.x_units,
            y_units: &self.y_units,
            continuous: self.continuous,
            increasing: self.increasing,
            x: &self.x[start..=end],
            y: &self.y[start..=end],
        }
    }
}

/// The shape handed to templated exporters: header strings, ordering flags
/// and an index-aligned coordinate window.
#[derive(Debug, Clone, Copy)]
pub struct ExportWindow<'a> {
    /// Spectrum title.
    pub title: &'a str,
    /// Normalized x unit label.
    pub x_units: &'a str,
    /// Normalized y unit label.
    pub y_units: &'a str,
    /// Continuity flag of the source spectrum.
    pub continuous: bool,
    /// Endpoint-ordering flag of the source spectrum.
    pub increasing: bool,
    /// X values inside the window.
    pub x: &'a [f64],
    /// Y values inside the window.
    pub y: &'a [f64],
}

impl<'a> ExportWindow<'a> {
    /// Iterate the window as (x, y) pairs.
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + 'a {
        self.x.iter().copied().zip(self.y.iter().copied())
    }

    /// Number of points in the window.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// True when the window is empty.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// Mutable accumulator for one spectrum, populated incrementally by the
/// dialect handlers and finalized once at the end of the enclosing element.
#[derive(Debug, Default)]
pub struct SpectrumBuilder {
    title: String,
    data_type: String,
    x_units: String,
    y_units: String,
    x: Vec<f64>,
    y: Vec<f64>,
    continuous: bool,
    delta_x: Option<f64>,
    owner: String,
    origin: String,
    cas_name: String,
    mol_form: String,
    observed_frequency: Option<f64>,
    observed_nucleus: String,
    resolution: String,
    model_type: String,
}

impl SpectrumBuilder {
    /// Create an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the title.
    pub fn set_title(&mut self, title: impl Into<String>) {
        self.title = title.into();
    }

    /// Set the technique label.
    pub fn set_data_type(&mut self, data_type: impl Into<String>) {
        self.data_type = data_type.into();
    }

    /// Set the x unit label; normalization is applied here.
    pub fn set_x_units(&mut self, raw: &str) {
        self.x_units = units::normalize(raw);
    }

    /// Set the y unit label; normalization is applied here.
    pub fn set_y_units(&mut self, raw: &str) {
        self.y_units = units::normalize(raw);
    }

    /// Install a continuous (analytically reconstructed) x axis.
    pub fn set_continuous_x(&mut self, x: Vec<f64>) {
        self.x = x;
        self.continuous = true;
    }

    /// Install a decoded x axis for discrete data.
    pub fn set_discrete_x(&mut self, x: Vec<f64>) {
        self.x = x;
        self.continuous = false;
    }

    /// Install the y array. Length reconciliation against x happens in
    /// [`SpectrumBuilder::build`].
    pub fn set_y(&mut self, y: Vec<f64>) {
        self.y = y;
    }

    /// Append one peak to a discrete spectrum.
    pub fn push_peak(&mut self, x: f64, y: f64) {
        self.x.push(x);
        self.y.push(y);
        self.continuous = false;
    }

    /// Explicit x spacing, overriding the value derived from the range.
    pub fn set_delta_x(&mut self, delta_x: f64) {
        self.delta_x = Some(delta_x);
    }

    /// Set the owner metadata field.
    pub fn set_owner(&mut self, owner: impl Into<String>) {
        self.owner = owner.into();
    }

    /// Set the origin metadata field.
    pub fn set_origin(&mut self, origin: impl Into<String>) {
        self.origin = origin.into();
    }

    /// Set the CAS registry name.
    pub fn set_cas_name(&mut self, cas_name: impl Into<String>) {
        self.cas_name = cas_name.into();
    }

    /// Set the molecular formula.
    pub fn set_mol_form(&mut self, mol_form: impl Into<String>) {
        self.mol_form = mol_form.into();
    }

    /// Set the NMR observed frequency in Hz.
    pub fn set_observed_frequency(&mut self, hz: f64) {
        self.observed_frequency = Some(hz);
    }

    /// Set the observed nucleus.
    pub fn set_observed_nucleus(&mut self, nucleus: impl Into<String>) {
        self.observed_nucleus = nucleus.into();
    }

    /// Set the instrument resolution.
    pub fn set_resolution(&mut self, resolution: impl Into<String>) {
        self.resolution = resolution.into();
    }

    /// Set the model/instrument type.
    pub fn set_model_type(&mut self, model_type: impl Into<String>) {
        self.model_type = model_type.into();
    }

    /// True once an x axis (continuous or discrete) has been installed.
    pub fn has_x(&self) -> bool {
        !self.x.is_empty()
    }

    /// True once any y data has been installed.
    pub fn has_y(&self) -> bool {
        !self.y.is_empty()
    }

    /// Current number of x points, used to size dependent decodes.
    pub fn x_len(&self) -> usize {
        self.x.len()
    }

    /// Finalize the spectrum.
    ///
    /// Returns `None` (with an error diagnostic) when no data points were
    /// accumulated. On an X/Y length mismatch both arrays are truncated to
    /// the shorter length with a warning; `npoints` and the cached boundary
    /// values are recomputed from the truncated arrays.
    pub fn build(mut self, diagnostics: &mut DiagnosticLog) -> Option<Spectrum> {
        if self.x.is_empty() || self.y.is_empty() {
            diagnostics.error(format!(
                "spectrum {:?} discarded: no data points decoded",
                self.title
            ));
            return None;
        }

        if self.x.len() != self.y.len() {
            diagnostics.warning(format!(
                "x/y length mismatch ({} vs {}), truncating to shorter",
                self.x.len(),
                self.y.len()
            ));
            let n = self.x.len().min(self.y.len());
            self.x.truncate(n);
            self.y.truncate(n);
        }

        let npoints = self.x.len();
        let first_x = self.x[0];
        let last_x = self.x[npoints - 1];
        let first_y = self.y[0];
        let delta_x = if self.continuous {
            match self.delta_x {
                Some(d) => d,
                None if npoints > 1 => (last_x - first_x) / (npoints - 1) as f64,
                None => 0.0,
            }
        } else {
            f64::NAN
        };

        Some(Spectrum {
            title: self.title,
            data_type: self.data_type,
            x_units: self.x_units,
            y_units: self.y_units,
            x: self.x,
            y: self.y,
            first_x,
            last_x,
            first_y,
            delta_x,
            continuous: self.continuous,
            increasing: last_x > first_x,
            npoints,
            owner: self.owner,
            origin: self.origin,
            cas_name: self.cas_name,
            mol_form: self.mol_form,
            observed_frequency: self.observed_frequency.unwrap_or(f64::NAN),
            observed_nucleus: self.observed_nucleus,
            resolution: self.resolution,
            model_type: self.model_type,
        })
    }
}
