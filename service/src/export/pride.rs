//! PRIDE-XML conversion of mass spectrometry assays
//!
//! One `ExperimentCollection` document is written per mass spectrometry
//! assay file, named `<accession>-<assay file stem>.xml`.

use crate::file_system_adapter::{FileSystemOperations, ensure_relative};
use indexmap::IndexSet;
use isatab_core::model::{AssayGroup, AssayRecord, Contact, OntologyTerm, Protocol, Publication, Sample, Study, TableRow};
use isatab_core::{IsaTabError, Result, Store};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// PRIDE-XML schema version written to the root element
pub const PRIDE_VERSION: &str = "2.1";
/// mzData version of the embedded description
pub const MZDATA_VERSION: &str = "1.05";

const MASS_SPECTROMETRY: &str = "mass spectrometry";

fn xml_error(e: impl std::fmt::Display) -> IsaTabError {
    IsaTabError::serialization(format!("Failed to write PRIDE-XML: {e}"))
}

/// Thin event writer over an indented buffer
struct XmlDocument {
    writer: Writer<Vec<u8>>,
}

impl XmlDocument {
    fn new() -> Result<Self> {
        let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
        writer
            .write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))
            .map_err(xml_error)?;
        Ok(Self { writer })
    }

    fn start(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Start(element)).map_err(xml_error)
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.writer.write_event(Event::End(BytesEnd::new(name))).map_err(xml_error)
    }

    fn empty(&mut self, name: &str, attributes: &[(&str, &str)]) -> Result<()> {
        let element = BytesStart::new(name).with_attributes(attributes.iter().copied());
        self.writer.write_event(Event::Empty(element)).map_err(xml_error)
    }

    /// `<name>text</name>`; nothing for blank text
    fn text(&mut self, name: &str, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            return Ok(());
        }
        self.start(name, &[])?;
        self.writer
            .write_event(Event::Text(BytesText::new(text)))
            .map_err(xml_error)?;
        self.end(name)
    }

    /// `cvParam` of a referenced term, `userParam` otherwise
    fn param(&mut self, name: &str, term: &OntologyTerm) -> Result<()> {
        if term.is_referenced() {
            self.empty(
                "cvParam",
                &[
                    ("cvLabel", term.source_text()),
                    ("accession", term.accession_text()),
                    ("name", name),
                    ("value", term.label.trim()),
                ],
            )
        } else {
            self.user_param(name, &term.label)
        }
    }

    fn user_param(&mut self, name: &str, value: &str) -> Result<()> {
        self.empty("userParam", &[("name", name), ("value", value.trim())])
    }

    fn finish(self) -> Result<String> {
        String::from_utf8(self.writer.into_inner()).map_err(xml_error)
    }
}

/// Everything one document draws from the store
struct Experiment<'a> {
    study: &'a Study,
    group: &'a AssayGroup,
    records: Vec<&'a AssayRecord>,
    samples: Vec<&'a Sample>,
    protocols: Vec<&'a Protocol>,
    publications: Vec<&'a Publication>,
    contacts: Vec<&'a Contact>,
}

impl<'a> Experiment<'a> {
    fn collect(store: &'a Store, study: &'a Study, group: &'a AssayGroup) -> Self {
        let mut records = store
            .values_of_type::<AssayRecord>()
            .into_iter()
            .filter(|r| r.study == study.accession && r.assay_file == group.file_name)
            .collect::<Vec<_>>();
        records.sort_by_key(|r| r.row);

        let sample_names = records.iter().filter_map(|r| r.sample_name()).collect::<IndexSet<_>>();
        let protocol_names = records.iter().flat_map(|r| r.protocol_refs()).collect::<IndexSet<_>>();

        let mut samples = store
            .values_of_type::<Sample>()
            .into_iter()
            .filter(|s| s.study == study.accession && s.sample_name().is_some_and(|n| sample_names.contains(n)))
            .collect::<Vec<_>>();
        samples.sort_by_key(|s| s.row);

        let in_study = |owner: Option<&str>| owner == Some(study.accession.as_str());
        Self {
            study,
            group,
            records,
            samples,
            protocols: store
                .values_of_type::<Protocol>()
                .into_iter()
                .filter(|p| p.study == study.accession && protocol_names.contains(p.name.as_str()))
                .collect(),
            publications: store
                .values_of_type::<Publication>()
                .into_iter()
                .filter(|p| in_study(p.study.as_deref()))
                .collect(),
            contacts: store
                .values_of_type::<Contact>()
                .into_iter()
                .filter(|c| in_study(c.study.as_deref()))
                .collect(),
        }
    }

    fn write(&self) -> Result<String> {
        let mut xml = XmlDocument::new()?;
        xml.start("ExperimentCollection", &[("version", PRIDE_VERSION)])?;
        xml.start("Experiment", &[])?;
        xml.text("ExperimentAccession", &self.study.accession)?;
        xml.text(
            "Title",
            self.study.title.as_deref().unwrap_or(&self.study.accession),
        )?;
        self.write_references(&mut xml)?;
        xml.text("ShortLabel", &self.study.accession)?;
        self.write_protocol(&mut xml)?;
        self.write_mzdata(&mut xml)?;
        self.write_additional(&mut xml)?;
        xml.end("Experiment")?;
        xml.end("ExperimentCollection")?;
        xml.finish()
    }

    fn write_references(&self, xml: &mut XmlDocument) -> Result<()> {
        for publication in &self.publications {
            let line = [&publication.author_list, &publication.title]
                .iter()
                .filter_map(|p| p.as_deref().map(str::trim))
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(". ");
            xml.start("Reference", &[])?;
            xml.text("RefLine", &line)?;
            xml.start("additional", &[])?;
            if let Some(id) = publication.pubmed_id.as_deref().map(str::trim).filter(|id| !id.is_empty()) {
                xml.empty("cvParam", &[("cvLabel", "PubMed"), ("accession", id), ("name", "PubMed")])?;
            }
            if let Some(doi) = publication.doi.as_deref().map(str::trim).filter(|d| !d.is_empty()) {
                xml.empty("cvParam", &[("cvLabel", "DOI"), ("accession", doi), ("name", "DOI")])?;
            }
            xml.end("additional")?;
            xml.end("Reference")?;
        }
        Ok(())
    }

    fn write_protocol(&self, xml: &mut XmlDocument) -> Result<()> {
        let name = self
            .protocols
            .iter()
            .map(|p| p.name.trim())
            .collect::<Vec<_>>()
            .join(", ");
        xml.start("Protocol", &[])?;
        xml.text("ProtocolName", if name.is_empty() { "unknown" } else { name.as_str() })?;
        if !self.protocols.is_empty() {
            xml.start("ProtocolSteps", &[])?;
            for protocol in &self.protocols {
                xml.start("StepDescription", &[])?;
                match &protocol.protocol_type {
                    Some(kind) => xml.param(&protocol.name, kind)?,
                    None => xml.user_param(&protocol.name, protocol.description.as_deref().unwrap_or(""))?,
                }
                xml.end("StepDescription")?;
            }
            xml.end("ProtocolSteps")?;
        }
        xml.end("Protocol")
    }

    fn write_mzdata(&self, xml: &mut XmlDocument) -> Result<()> {
        xml.start(
            "mzData",
            &[("version", MZDATA_VERSION), ("accessionNumber", &self.study.accession)],
        )?;
        xml.start("description", &[])?;
        xml.start("admin", &[])?;

        let names = self.samples.iter().filter_map(|s| s.sample_name()).collect::<Vec<_>>();
        xml.text("sampleName", &names.join(", "))?;
        xml.start("sampleDescription", &[])?;
        let characteristics = self
            .samples
            .iter()
            .flat_map(|s| s.characteristics())
            .filter(|c| !c.value.label.trim().is_empty())
            .map(|c| (c.category().to_string(), c.value.clone()))
            .collect::<IndexSet<_>>();
        for (category, value) in &characteristics {
            xml.param(category, value)?;
        }
        xml.end("sampleDescription")?;

        for contact in &self.contacts {
            let name = [&contact.first_name, &contact.last_name]
                .iter()
                .filter_map(|p| p.as_deref().map(str::trim))
                .filter(|p| !p.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            xml.start("contact", &[])?;
            xml.text("name", &name)?;
            xml.text("institution", contact.affiliation.as_deref().unwrap_or(""))?;
            xml.text("contactInfo", contact.email.as_deref().unwrap_or(""))?;
            xml.end("contact")?;
        }

        xml.end("admin")?;
        xml.end("description")?;
        xml.end("mzData")
    }

    fn write_additional(&self, xml: &mut XmlDocument) -> Result<()> {
        xml.start("additional", &[])?;
        if let Some(technology) = &self.group.technology {
            xml.param("technology type", technology)?;
        }
        if let Some(platform) = self.group.platform.as_deref().filter(|p| !p.trim().is_empty()) {
            xml.user_param("technology platform", platform)?;
        }
        let files = self
            .records
            .iter()
            .flat_map(|r| r.data_files())
            .map(|f| (f.header.as_str(), f.path.trim()))
            .collect::<IndexSet<_>>();
        for (header, path) in files {
            xml.user_param(header, path)?;
        }
        xml.end("additional")
    }
}

/// Whether an assay group was measured by mass spectrometry
#[must_use]
pub fn is_mass_spectrometry(group: &AssayGroup) -> bool {
    group.technology_label().to_lowercase().contains(MASS_SPECTROMETRY)
}

/// `<accession>-<assay file stem>.xml`
#[must_use]
pub fn pride_file_name(accession: &str, assay_file: &str) -> String {
    let stem = Path::new(assay_file)
        .file_stem()
        .map_or_else(|| assay_file.to_string(), |s| s.to_string_lossy().into_owned());
    format!("{accession}-{stem}.xml")
}

/// Writes PRIDE-XML for every mass spectrometry assay file
#[derive(Debug, Default)]
pub struct PrideXmlExporter;

impl PrideXmlExporter {
    /// Create the PRIDE-XML exporter
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Render every document as (file name, XML text)
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::SerializationError` when a document cannot be
    /// written.
    pub fn export(&self, store: &Store) -> Result<Vec<(String, String)>> {
        let studies = store.values_of_type::<Study>();
        let mut documents = Vec::new();
        for group in store.values_of_type::<AssayGroup>() {
            if !is_mass_spectrometry(group) {
                debug!(file = %group.file_name, "Not a mass spectrometry assay, skipped");
                continue;
            }
            let Some(study) = studies.iter().find(|s| s.accession == group.study) else {
                continue;
            };
            let experiment = Experiment::collect(store, study, group);
            documents.push((pride_file_name(&study.accession, &group.file_name), experiment.write()?));
        }
        Ok(documents)
    }

    /// Write every document below a directory
    ///
    /// # Errors
    ///
    /// Returns the errors of [`export`](Self::export) and of the file system.
    pub fn write_to_dir<F: FileSystemOperations>(&self, store: &Store, dir: &Path, fs: &F) -> Result<Vec<PathBuf>> {
        let mut written = Vec::new();
        for (file_name, xml) in self.export(store)? {
            ensure_relative(Path::new(&file_name))?;
            let path = dir.join(file_name);
            fs.write(&path, &xml)?;
            written.push(path);
        }
        info!(dir = %dir.display(), files = written.len(), "Wrote PRIDE-XML");
        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use isatab_core::model::{DataFile, MaterialNode, PropertyValue, ProtocolApplication, Step};
    use pretty_assertions::assert_eq;

    fn store(technology: &str) -> Store {
        let mut store = Store::new();
        let study = Study {
            accession: "MTBLS2".to_string(),
            title: Some("Lipids & sterols".to_string()),
            ..Default::default()
        };
        store.put(study.key(), study);
        let protocol = Protocol {
            study: "MTBLS2".to_string(),
            name: "Mass spectrometry".to_string(),
            protocol_type: Some(OntologyTerm::new("mass spectrometry")),
            ..Default::default()
        };
        store.put(protocol.key(), protocol);
        let group = AssayGroup {
            study: "MTBLS2".to_string(),
            file_name: "a_ms.txt".to_string(),
            technology: Some(OntologyTerm::new(technology)),
            ..Default::default()
        };
        store.put(group.key(), group);

        let mut organism = PropertyValue::new("Characteristics[organism]", "Homo sapiens");
        organism.value = OntologyTerm::referenced("Homo sapiens", "9606", "NCBITAXON");
        let sample = Sample {
            study: "MTBLS2".to_string(),
            row: 0,
            steps: vec![Step::Node(MaterialNode {
                header: "Sample Name".to_string(),
                name: "smp1".to_string(),
                attributes: vec![organism],
            })],
        };
        store.put(sample.key(), sample);
        let assay = AssayRecord {
            study: "MTBLS2".to_string(),
            assay_file: "a_ms.txt".to_string(),
            row: 0,
            steps: vec![
                Step::Node(MaterialNode {
                    header: "Sample Name".to_string(),
                    name: "smp1".to_string(),
                    attributes: Vec::new(),
                }),
                Step::Protocol(ProtocolApplication {
                    protocol: "Mass spectrometry".to_string(),
                    parameters: Vec::new(),
                }),
                Step::Data(DataFile {
                    header: "Raw Spectral Data File".to_string(),
                    path: "run1.mzML".to_string(),
                    kind: None,
                }),
            ],
        };
        store.put(assay.key(), assay);
        store
    }

    #[test]
    fn test_file_name() {
        assert_eq!(pride_file_name("MTBLS2", "a_ms.txt"), "MTBLS2-a_ms.xml");
    }

    #[test]
    fn test_document_content() {
        let documents = PrideXmlExporter::new().export(&store("mass spectrometry")).unwrap();
        assert_eq!(documents.len(), 1);
        let (name, xml) = &documents[0];
        assert_eq!(name, "MTBLS2-a_ms.xml");
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<Title>Lipids &amp; sterols</Title>"));
        assert!(xml.contains("<sampleName>smp1</sampleName>"));
        assert!(xml.contains(r#"cvLabel="NCBITAXON" accession="9606" name="organism""#));
        assert!(xml.contains(r#"<userParam name="Raw Spectral Data File" value="run1.mzML"/>"#));
        assert!(xml.contains("<ProtocolName>Mass spectrometry</ProtocolName>"));
    }

    #[test]
    fn test_other_technologies_skipped() {
        let documents = PrideXmlExporter::new().export(&store("NMR spectroscopy")).unwrap();
        assert!(documents.is_empty());
    }
}
