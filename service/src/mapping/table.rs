//! Study-sample and assay table rows
//!
//! Columns of a table are positional: properties bind to the node or
//! protocol to their left and claim the `Unit`, `Term Source REF` and
//! `Term Accession Number` columns that follow them. The column plan is
//! derived once per section instance and applied to every row.

use super::{MappingContext, SectionMapper};
use isatab_core::model::{
    AssayRecord, DataFile, MaterialNode, OntologyTerm, PropertyValue, ProtocolApplication, Sample,
    Step, TermColumns,
};
use isatab_core::{Field, IsaTabError, Record, RefFileType, Result, SectionInstance, Store};
use tracing::debug;

const TERM_SOURCE: &str = "Term Source REF";
const TERM_ACCESSION: &str = "Term Accession Number";
const UNIT: &str = "Unit";
const PROTOCOL_REF: &str = "Protocol REF";

/// Which domain object a table row becomes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableKind {
    /// Study-sample table rows become [`Sample`]s
    StudySample,
    /// Assay table rows become [`AssayRecord`]s
    Assay,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PropertyPlan {
    header: String,
    value: usize,
    term_refs: Option<(usize, usize)>,
    unit: Option<usize>,
    unit_refs: Option<(usize, usize)>,
}

impl PropertyPlan {
    fn read(&self, record: &Record) -> PropertyValue {
        let cell = |i: usize| record.get(i).map(str::to_string);
        let value = OntologyTerm {
            label: record.raw(self.value).trim().to_string(),
            accession: self.term_refs.and_then(|(_, acc)| cell(acc)),
            source: self.term_refs.and_then(|(src, _)| cell(src)),
        };
        let unit = self.unit.map(|u| OntologyTerm {
            label: record.raw(u).trim().to_string(),
            accession: self.unit_refs.and_then(|(_, acc)| cell(acc)),
            source: self.unit_refs.and_then(|(src, _)| cell(src)),
        });
        PropertyValue {
            header: self.header.clone(),
            value,
            unit,
            columns: TermColumns {
                term_refs: self.term_refs.is_some(),
                unit: self.unit.is_some(),
                unit_refs: self.unit_refs.is_some(),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ColumnPlan {
    Node { column: usize, header: String },
    NodeProperty(PropertyPlan),
    Protocol { column: usize },
    Parameter(PropertyPlan),
    Factor(PropertyPlan),
    Data { column: usize, header: String, kind: Option<RefFileType> },
    Plain { column: usize, header: String },
}

fn is_id(field: Option<&Field>, id: &str) -> bool {
    field.is_some_and(|f| f.id == id)
}

/// Derive the positional plan of a table, claiming every column once.
fn plan_columns(instance: &SectionInstance) -> Result<Vec<ColumnPlan>> {
    let fields = instance.fields();
    let mut plan = Vec::new();
    let mut has_node = false;
    let mut has_protocol = false;
    let mut i = 0;

    while i < fields.len() {
        let field = &fields[i];
        let header = field.dump();

        let property = |start: usize| -> (PropertyPlan, usize) {
            let mut next = start + 1;
            let mut plan = PropertyPlan {
                header: fields[start].dump(),
                value: start,
                term_refs: None,
                unit: None,
                unit_refs: None,
            };
            if is_id(fields.get(next), UNIT) {
                plan.unit = Some(next);
                next += 1;
                if is_id(fields.get(next), TERM_SOURCE) && is_id(fields.get(next + 1), TERM_ACCESSION) {
                    plan.unit_refs = Some((next, next + 1));
                    next += 2;
                }
            } else if is_id(fields.get(next), TERM_SOURCE)
                && is_id(fields.get(next + 1), TERM_ACCESSION)
            {
                plan.term_refs = Some((next, next + 1));
                next += 2;
            }
            (plan, next)
        };

        match field.id.as_str() {
            _ if field.ref_file_type.is_some() || field.id.ends_with(" File") => {
                plan.push(ColumnPlan::Data {
                    column: i,
                    header,
                    kind: field.ref_file_type,
                });
                i += 1;
            }
            _ if field.is_node() => {
                has_node = true;
                plan.push(ColumnPlan::Node { column: i, header });
                i += 1;
            }
            "Characteristics" | "Material Type" | "Label" => {
                if !has_node {
                    return Err(IsaTabError::structure(
                        instance.id(),
                        format!("'{header}' in column {i} precedes every node column"),
                    ));
                }
                let (property, next) = property(i);
                plan.push(ColumnPlan::NodeProperty(property));
                i = next;
            }
            "Parameter Value" => {
                if !has_protocol {
                    return Err(IsaTabError::structure(
                        instance.id(),
                        format!("'{header}' in column {i} precedes every Protocol REF column"),
                    ));
                }
                let (property, next) = property(i);
                plan.push(ColumnPlan::Parameter(property));
                i = next;
            }
            "Factor Value" => {
                let (property, next) = property(i);
                plan.push(ColumnPlan::Factor(property));
                i = next;
            }
            PROTOCOL_REF => {
                has_protocol = true;
                plan.push(ColumnPlan::Protocol { column: i });
                i += 1;
            }
            UNIT | TERM_SOURCE | TERM_ACCESSION => {
                return Err(IsaTabError::structure(
                    instance.id(),
                    format!("'{header}' in column {i} does not follow a property column"),
                ));
            }
            _ => {
                plan.push(ColumnPlan::Plain { column: i, header });
                i += 1;
            }
        }
    }

    Ok(plan)
}

fn read_steps(plan: &[ColumnPlan], record: &Record) -> Vec<Step> {
    let mut steps: Vec<Step> = Vec::new();
    let mut node = None;
    let mut protocol = None;

    for column in plan {
        match column {
            ColumnPlan::Node { column, header } => {
                node = Some(steps.len());
                steps.push(Step::Node(MaterialNode {
                    header: header.clone(),
                    name: record.raw(*column).trim().to_string(),
                    attributes: Vec::new(),
                }));
            }
            ColumnPlan::NodeProperty(property) => {
                if let Some(Step::Node(node)) = node.and_then(|n| steps.get_mut(n)) {
                    node.attributes.push(property.read(record));
                }
            }
            ColumnPlan::Protocol { column } => {
                protocol = Some(steps.len());
                steps.push(Step::Protocol(ProtocolApplication {
                    protocol: record.raw(*column).trim().to_string(),
                    parameters: Vec::new(),
                }));
            }
            ColumnPlan::Parameter(property) => {
                if let Some(Step::Protocol(application)) = protocol.and_then(|p| steps.get_mut(p)) {
                    application.parameters.push(property.read(record));
                }
            }
            ColumnPlan::Factor(property) => steps.push(Step::FactorValue(property.read(record))),
            ColumnPlan::Data {
                column,
                header,
                kind,
            } => steps.push(Step::Data(DataFile {
                header: header.clone(),
                path: record.raw(*column).trim().to_string(),
                kind: *kind,
            })),
            ColumnPlan::Plain { column, header } => steps.push(Step::Attribute {
                header: header.clone(),
                value: record.raw(*column).trim().to_string(),
            }),
        }
    }

    steps
}

/// Maps every row of a study-sample or assay table
#[derive(Debug, Clone)]
pub struct TableRowMapper {
    section_id: &'static str,
    kind: TableKind,
}

impl TableRowMapper {
    /// Mapper for the `study_table` section
    #[must_use]
    pub fn study_sample() -> Self {
        Self {
            section_id: "study_table",
            kind: TableKind::StudySample,
        }
    }

    /// Mapper for the `assay_table` section
    #[must_use]
    pub fn assay() -> Self {
        Self {
            section_id: "assay_table",
            kind: TableKind::Assay,
        }
    }

    /// Kind of object produced
    #[must_use]
    pub fn kind(&self) -> TableKind {
        self.kind
    }
}

impl SectionMapper for TableRowMapper {
    fn section_id(&self) -> &str {
        self.section_id
    }

    fn map(
        &self,
        instance: &SectionInstance,
        store: &mut Store,
        ctx: &mut MappingContext,
    ) -> Result<usize> {
        let plan = plan_columns(instance)?;
        instance.check_structure()?;

        let study = ctx.require_study()?.to_string();
        let assay_file = match self.kind {
            TableKind::Assay => Some(ctx.require_assay_file()?.to_string()),
            TableKind::StudySample => None,
        };

        let mut stored = 0;
        for (row, record) in instance.records().iter().enumerate() {
            if record.is_blank() {
                continue;
            }
            let steps = read_steps(&plan, record);
            match &assay_file {
                Some(assay_file) => {
                    let assay = AssayRecord {
                        study: study.clone(),
                        assay_file: assay_file.clone(),
                        row,
                        steps,
                    };
                    store.put(assay.key(), assay);
                }
                None => {
                    let sample = Sample {
                        study: study.clone(),
                        row,
                        steps,
                    };
                    store.put(sample.key(), sample);
                }
            }
            stored += 1;
        }

        debug!(section = self.section_id, %study, rows = stored, "Mapped table");
        Ok(stored)
    }
}
