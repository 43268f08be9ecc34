//! Dialect tag dispatch tables
//!
//! Each dialect resolves raw tag or label names to an enumerated id exactly
//! once per tag, through a case-insensitive table built when the dispatcher
//! is constructed. Handlers then match on the id, keeping string comparison
//! out of the per-tag hot path while leaving dialects pluggable.

use std::collections::HashMap;

/// Case-insensitive name → id lookup table, built once per dialect.
#[derive(Debug)]
pub struct TagTable<T: Copy> {
    map: HashMap<String, T>,
}

impl<T: Copy> TagTable<T> {
    /// Build a table from (name, id) entries. Keys are stored lowercase.
    pub fn new(entries: &[(&str, T)]) -> Self {
        let map = entries
            .iter()
            .map(|(name, id)| (name.to_ascii_lowercase(), *id))
            .collect();
        Self { map }
    }

    /// Resolve a raw tag name, ignoring ASCII case. `None` means the tag is
    /// unknown to this dialect.
    pub fn resolve(&self, name: &str) -> Option<T> {
        self.map.get(&name.to_ascii_lowercase()).copied()
    }
}

/// Tag identifiers of the CML dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CmlTag {
    /// `<cml>` document root (no-op container).
    Cml,
    /// `<spectrum>` element, one decoded spectrum each.
    Spectrum,
    /// `<spectrumData>` continuous x/y payload container.
    SpectrumData,
    /// `<peakList>` discrete peak container.
    PeakList,
    /// `<peak>` single peak entry.
    Peak,
    /// `<sample>` sample description.
    Sample,
    /// `<formula>` inside sample.
    Formula,
    /// `<name>` inside sample.
    Name,
    /// `<metadataList>` container.
    MetadataList,
    /// `<metadata>` entry.
    Metadata,
    /// `<conditionList>` container.
    ConditionList,
    /// `<parameterList>` container.
    ParameterList,
    /// `<parameter>` entry.
    Parameter,
    /// `<scalar>` value inside condition/parameter lists.
    Scalar,
    /// `<xaxis>` axis container.
    XAxis,
    /// `<yaxis>` axis container.
    YAxis,
    /// `<array>` numeric payload.
    Array,
    /// `<molecule>` block (skipped, handled by chemistry layers).
    Molecule,
}

/// Build the CML tag table.
pub fn cml_tags() -> TagTable<CmlTag> {
    TagTable::new(&[
        ("cml", CmlTag::Cml),
        ("spectrum", CmlTag::Spectrum),
        ("spectrumdata", CmlTag::SpectrumData),
        ("peaklist", CmlTag::PeakList),
        ("peak", CmlTag::Peak),
        ("sample", CmlTag::Sample),
        ("formula", CmlTag::Formula),
        ("name", CmlTag::Name),
        ("metadatalist", CmlTag::MetadataList),
        ("metadata", CmlTag::Metadata),
        ("conditionlist", CmlTag::ConditionList),
        ("parameterlist", CmlTag::ParameterList),
        ("parameter", CmlTag::Parameter),
        ("scalar", CmlTag::Scalar),
        ("xaxis", CmlTag::XAxis),
        ("yaxis", CmlTag::YAxis),
        ("array", CmlTag::Array),
        ("molecule", CmlTag::Molecule),
    ])
}

/// Tag identifiers of the AnIML dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AnimlTag {
    /// `<AnIML>` document root.
    AnIml,
    /// `<SampleSet>` container.
    SampleSet,
    /// `<Sample>` element.
    Sample,
    /// `<ExperimentStepSet>` container.
    ExperimentStepSet,
    /// `<ExperimentStep>` element, one decoded spectrum each.
    ExperimentStep,
    /// `<Technique>` reference.
    Technique,
    /// `<Result>` container.
    Result,
    /// `<SeriesSet>` container carrying the point count.
    SeriesSet,
    /// `<Series>` one axis of data.
    Series,
    /// `<IndividualValueSet>` explicit values.
    IndividualValueSet,
    /// `<AutoIncrementedValueSet>` analytic range.
    AutoIncrementedValueSet,
    /// `<EncodedValueSet>` base64 IEEE floats.
    EncodedValueSet,
    /// `<StartValue>` of an auto-incremented set.
    StartValue,
    /// `<EndValue>` of an auto-incremented set.
    EndValue,
    /// `<Increment>` of an auto-incremented set.
    Increment,
    /// `<Unit>` label.
    Unit,
    /// `<Parameter>` named scalar (e.g. `nmr.observe frequency`).
    Parameter,
    /// `<Category>` grouping container.
    Category,
    /// `<Method>` container.
    Method,
}

/// Build the AnIML tag table.
pub fn animl_tags() -> TagTable<AnimlTag> {
    TagTable::new(&[
        ("animl", AnimlTag::AnIml),
        ("sampleset", AnimlTag::SampleSet),
        ("sample", AnimlTag::Sample),
        ("experimentstepset", AnimlTag::ExperimentStepSet),
        ("experimentstep", AnimlTag::ExperimentStep),
        ("technique", AnimlTag::Technique),
        ("result", AnimlTag::Result),
        ("seriesset", AnimlTag::SeriesSet),
        ("series", AnimlTag::Series),
        ("individualvalueset", AnimlTag::IndividualValueSet),
        ("autoincrementedvalueset", AnimlTag::AutoIncrementedValueSet),
        ("encodedvalueset", AnimlTag::EncodedValueSet),
        ("startvalue", AnimlTag::StartValue),
        ("endvalue", AnimlTag::EndValue),
        ("increment", AnimlTag::Increment),
        ("unit", AnimlTag::Unit),
        ("parameter", AnimlTag::Parameter),
        ("category", AnimlTag::Category),
        ("method", AnimlTag::Method),
    ])
}

/// Label identifiers of the JCAMP-DX dialect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JcampLabel {
    /// `##TITLE=`, starts a new block.
    Title,
    /// `##JCAMP-DX=` version record.
    Version,
    /// `##DATA TYPE=`.
    DataType,
    /// `##BLOCKS=`, marks a compound (link) block.
    Blocks,
    /// `##ORIGIN=`.
    Origin,
    /// `##OWNER=`.
    Owner,
    /// `##XUNITS=`.
    XUnits,
    /// `##YUNITS=`.
    YUnits,
    /// `##XFACTOR=`.
    XFactor,
    /// `##YFACTOR=`.
    YFactor,
    /// `##FIRSTX=`.
    FirstX,
    /// `##LASTX=`.
    LastX,
    /// `##FIRSTY=`.
    FirstY,
    /// `##DELTAX=`.
    DeltaX,
    /// `##NPOINTS=`.
    NPoints,
    /// `##RESOLUTION=`.
    Resolution,
    /// `##CAS REGISTRY NO=`.
    CasRegistryNo,
    /// `##MOLFORM=`.
    MolForm,
    /// `##.OBSERVE FREQUENCY=` (MHz).
    ObserveFrequency,
    /// `##.OBSERVE NUCLEUS=`.
    ObserveNucleus,
    /// `##SPECTROMETER/DATA SYSTEM=`.
    Spectrometer,
    /// `##XYDATA=` compressed ordinate table.
    XYData,
    /// `##XYPOINTS=` explicit (x,y) pairs.
    XYPoints,
    /// `##PEAK TABLE=` discrete peaks.
    PeakTable,
    /// `##END=`, closes the current block.
    End,
}

/// Build the JCAMP-DX label table. Keys are canonicalized the same way
/// [`canonicalize_label`] canonicalizes queries.
pub fn jcamp_labels() -> TagTable<JcampLabel> {
    TagTable::new(&[
        ("title", JcampLabel::Title),
        ("jcampdx", JcampLabel::Version),
        ("datatype", JcampLabel::DataType),
        ("blocks", JcampLabel::Blocks),
        ("origin", JcampLabel::Origin),
        ("owner", JcampLabel::Owner),
        ("xunits", JcampLabel::XUnits),
        ("yunits", JcampLabel::YUnits),
        ("xfactor", JcampLabel::XFactor),
        ("yfactor", JcampLabel::YFactor),
        ("firstx", JcampLabel::FirstX),
        ("lastx", JcampLabel::LastX),
        ("firsty", JcampLabel::FirstY),
        ("deltax", JcampLabel::DeltaX),
        ("npoints", JcampLabel::NPoints),
        ("resolution", JcampLabel::Resolution),
        ("casregistryno", JcampLabel::CasRegistryNo),
        ("molform", JcampLabel::MolForm),
        (".observefrequency", JcampLabel::ObserveFrequency),
        (".observenucleus", JcampLabel::ObserveNucleus),
        ("spectrometerdatasystem", JcampLabel::Spectrometer),
        ("xydata", JcampLabel::XYData),
        ("xypoints", JcampLabel::XYPoints),
        ("peaktable", JcampLabel::PeakTable),
        ("end", JcampLabel::End),
    ])
}

/// Canonicalize a JCAMP label: spaces, dashes, underscores and slashes are
/// insignificant in label comparison per the JCAMP-DX standard.
pub fn canonicalize_label(label: &str) -> String {
    label
        .chars()
        .filter(|c| !matches!(c, ' ' | '-' | '_' | '/'))
        .collect::<String>()
        .to_ascii_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_is_case_insensitive() {
        let table = cml_tags();
        assert_eq!(table.resolve("spectrumData"), Some(CmlTag::SpectrumData));
        assert_eq!(table.resolve("SPECTRUMDATA"), Some(CmlTag::SpectrumData));
        assert_eq!(table.resolve("unknownTag"), None);
    }

    #[test]
    fn jcamp_labels_ignore_separators() {
        let table = jcamp_labels();
        assert_eq!(
            table.resolve(&canonicalize_label("PEAK TABLE")),
            Some(JcampLabel::PeakTable)
        );
        assert_eq!(
            table.resolve(&canonicalize_label("CAS REGISTRY NO")),
            Some(JcampLabel::CasRegistryNo)
        );
        assert_eq!(
            table.resolve(&canonicalize_label(".OBSERVE FREQUENCY")),
            Some(JcampLabel::ObserveFrequency)
        );
        assert_eq!(
            table.resolve(&canonicalize_label("JCAMP-DX")),
            Some(JcampLabel::Version)
        );
    }
}
