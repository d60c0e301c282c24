//! Table validators, run in the order [`default_validators`] lists them

use super::configuration::{DataType, FieldConfig, ProtocolConfig};
use super::context::{TableContext, row_list};
use super::report::ValidationIssue;
use crate::mapping::helpers::parse_date;
use isatab_core::schema::is_node_header;
use regex::Regex;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::debug;

const TERM_SOURCE_REF: &str = "Term Source REF";
const TERM_ACCESSION: &str = "Term Accession Number";
const UNIT: &str = "Unit";
const PROTOCOL_REF: &str = "Protocol REF";
const SAMPLE_NAME: &str = "Sample Name";

/// Trait for all table validators
pub trait TableValidator {
    /// Validate one table
    fn validate(&self, ctx: &TableContext<'_>) -> Vec<ValidationIssue>;

    /// Get the validator name
    fn name(&self) -> &str;
}

/// Every validator, in execution order
#[must_use]
pub fn default_validators() -> Vec<Box<dyn TableValidator>> {
    vec![
        Box::new(RequiredFieldsValidator),
        Box::new(FieldValuesValidator),
        Box::new(OntologyFieldsValidator),
        Box::new(UnitFieldsValidator),
        Box::new(ProtocolFieldsValidator),
        Box::new(FactorPresenceValidator),
        Box::new(SampleReferenceValidator),
    ]
}

/// Required columns exist and carry a value on every row
pub struct RequiredFieldsValidator;

impl TableValidator for RequiredFieldsValidator {
    fn validate(&self, ctx: &TableContext<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for field in ctx.configuration.fields().filter(|f| f.required) {
            let Some(column) = ctx.column(&field.field) else {
                issues.push(ValidationIssue::error(
                    format!("required column '{}' is missing", field.field),
                    ctx.file_name,
                    self.name(),
                ));
                continue;
            };

            let empty = ctx
                .cells(column)
                .filter(|(_, value)| value.is_empty())
                .map(|(row, _)| row)
                .collect::<Vec<_>>();
            if !empty.is_empty() {
                issues.push(ValidationIssue::error(
                    format!(
                        "required column '{}' is empty in rows {}",
                        field.field,
                        row_list(&empty)
                    ),
                    ctx.file_name,
                    self.name(),
                ));
            }
        }
        issues
    }

    fn name(&self) -> &str {
        "required_fields"
    }
}

/// Values match the configured data type, value list and pattern
pub struct FieldValuesValidator;

impl FieldValuesValidator {
    fn check(field: &FieldConfig, value: &str, pattern: Option<&Regex>) -> Option<String> {
        let type_error = match field.data_type {
            DataType::Date => parse_date(&field.field, value)
                .is_err()
                .then(|| "is not a date".to_string()),
            DataType::Numeric => value
                .parse::<f64>()
                .is_err()
                .then(|| "is not a number".to_string()),
            DataType::List => (!field.values.iter().any(|v| v.eq_ignore_ascii_case(value)))
                .then(|| format!("is not one of [{}]", field.values.join(", "))),
            DataType::String | DataType::Ontology => None,
        };
        type_error.or_else(|| {
            pattern
                .is_some_and(|re| !re.is_match(value))
                .then(|| format!("does not match '{}'", field.pattern.as_deref().unwrap_or_default()))
        })
    }
}

impl TableValidator for FieldValuesValidator {
    fn validate(&self, ctx: &TableContext<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for field in ctx.configuration.fields() {
            let Some(column) = ctx.column(&field.field) else {
                continue;
            };

            let pattern = match field.pattern.as_deref().map(Regex::new) {
                Some(Ok(re)) => Some(re),
                Some(Err(e)) => {
                    issues.push(ValidationIssue::error(
                        format!("configured pattern of '{}' is invalid: {e}", field.field),
                        ctx.configuration.name(),
                        self.name(),
                    ));
                    None
                }
                None => None,
            };

            let mut reported = HashSet::new();
            for (row, value) in ctx.cells(column) {
                if value.is_empty() || !reported.insert(value) {
                    continue;
                }
                if let Some(problem) = Self::check(field, value, pattern.as_ref()) {
                    issues.push(ValidationIssue::error(
                        format!("value '{value}' of column '{}' (row {row}) {problem}", field.field),
                        ctx.file_name,
                        self.name(),
                    ));
                }
            }
        }
        issues
    }

    fn name(&self) -> &str {
        "field_values"
    }
}

/// Ontology columns carry complete, allowed and well-placed terms
pub struct OntologyFieldsValidator;

impl OntologyFieldsValidator {
    fn check_column(
        &self,
        ctx: &TableContext<'_>,
        field: &FieldConfig,
        column: usize,
        issues: &mut Vec<ValidationIssue>,
    ) {
        if !ctx.header_is(column + 1, TERM_SOURCE_REF) || !ctx.header_is(column + 2, TERM_ACCESSION) {
            issues.push(ValidationIssue::error(
                format!(
                    "ontology column '{}' must be followed by '{TERM_SOURCE_REF}' and '{TERM_ACCESSION}'",
                    field.field
                ),
                ctx.file_name,
                self.name(),
            ));
            return;
        }

        let constraint = field.ontology.clone().unwrap_or_default();
        let mut seen = HashSet::new();
        for (row, record) in ctx.table.records().iter().enumerate() {
            let label = record.raw(column).trim();
            let source = record.raw(column + 1).trim();
            let accession = record.raw(column + 2).trim();
            if (label.is_empty() && source.is_empty() && accession.is_empty())
                || !seen.insert((label, source, accession))
            {
                continue;
            }

            let missing = [("label", label), ("source", source), ("accession", accession)]
                .into_iter()
                .filter(|(_, v)| v.is_empty())
                .map(|(part, _)| part)
                .collect::<Vec<_>>();
            if !missing.is_empty() {
                issues.push(ValidationIssue::error(
                    format!(
                        "term '{label}' of column '{}' (row {}) has no {}",
                        field.field,
                        row + 1,
                        missing.join(" or ")
                    ),
                    ctx.file_name,
                    self.name(),
                ));
                continue;
            }

            if !constraint.sources.is_empty()
                && !constraint.sources.iter().any(|s| s.eq_ignore_ascii_case(source))
            {
                issues.push(ValidationIssue::error(
                    format!(
                        "term source '{source}' of column '{}' is not one of [{}]",
                        field.field,
                        constraint.sources.join(", ")
                    ),
                    ctx.file_name,
                    self.name(),
                ));
            }

            if let Some(lookup) = ctx.lookup
                && !constraint.branches.is_empty()
                && !constraint.branches.iter().any(|b| lookup.is_under(accession, b))
            {
                issues.push(ValidationIssue::error(
                    format!(
                        "term '{label}' ({accession}) of column '{}' is not under [{}]",
                        field.field,
                        constraint.branches.join(", ")
                    ),
                    ctx.file_name,
                    self.name(),
                ));
            }
        }
    }
}

impl TableValidator for OntologyFieldsValidator {
    fn validate(&self, ctx: &TableContext<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for field in ctx
            .configuration
            .fields()
            .filter(|f| f.data_type == DataType::Ontology)
        {
            if let Some(column) = ctx.column(&field.field) {
                self.check_column(ctx, field, column, &mut issues);
            }
        }

        if !ctx.facts.ontology_sources.is_empty() {
            let undeclared = ctx
                .headers()
                .iter()
                .enumerate()
                .filter(|(_, h)| h.eq_ignore_ascii_case(TERM_SOURCE_REF))
                .flat_map(|(column, _)| ctx.cells(column))
                .map(|(_, source)| source)
                .filter(|s| !s.is_empty() && !ctx.facts.ontology_sources.contains(&s.to_lowercase()))
                .collect::<BTreeSet<_>>();
            for source in undeclared {
                issues.push(ValidationIssue::warning(
                    format!("term source '{source}' is not declared in ONTOLOGY SOURCE REFERENCE"),
                    ctx.file_name,
                    self.name(),
                ));
            }
        }
        issues
    }

    fn name(&self) -> &str {
        "ontology_fields"
    }
}

/// Columns configured with a unit are followed by a filled `Unit` column
pub struct UnitFieldsValidator;

impl TableValidator for UnitFieldsValidator {
    fn validate(&self, ctx: &TableContext<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        for field in ctx.configuration.fields().filter(|f| f.unit) {
            let Some(column) = ctx.column(&field.field) else {
                continue;
            };
            let unit = column + 1;
            if !ctx.header_is(unit, UNIT) {
                issues.push(ValidationIssue::error(
                    format!("column '{}' must be followed by a '{UNIT}' column", field.field),
                    ctx.file_name,
                    self.name(),
                ));
                continue;
            }

            let missing = ctx
                .table
                .records()
                .iter()
                .enumerate()
                .filter(|(_, r)| r.get(column).is_some() && r.get(unit).is_none())
                .map(|(row, _)| row + 1)
                .collect::<Vec<_>>();
            if !missing.is_empty() {
                issues.push(ValidationIssue::error(
                    format!("values of '{}' have no unit in rows {}", field.field, row_list(&missing)),
                    ctx.file_name,
                    self.name(),
                ));
            }

            if !ctx.header_is(unit + 1, TERM_SOURCE_REF) || !ctx.header_is(unit + 2, TERM_ACCESSION) {
                issues.push(ValidationIssue::warning(
                    format!("unit of '{}' has no term source and accession columns", field.field),
                    ctx.file_name,
                    self.name(),
                ));
            }
        }
        issues
    }

    fn name(&self) -> &str {
        "unit_fields"
    }
}

/// `Protocol REF` columns grouped by the node header that closes them
#[derive(Debug, Default)]
struct TableSpan {
    node: String,
    columns: Vec<usize>,
}

fn table_spans(ctx: &TableContext<'_>) -> Vec<TableSpan> {
    let mut spans = Vec::new();
    let mut pending = Vec::new();
    for (column, header) in ctx.headers().iter().enumerate() {
        if header.eq_ignore_ascii_case(PROTOCOL_REF) {
            pending.push(column);
        } else if is_node_header(header) {
            spans.push(TableSpan {
                node: header.clone(),
                columns: std::mem::take(&mut pending),
            });
        }
    }
    if !pending.is_empty() {
        spans.push(TableSpan {
            node: String::new(),
            columns: pending,
        });
    }
    spans
}

/// Protocol references are declared and match the configured types of each
/// node span
pub struct ProtocolFieldsValidator;

impl ProtocolFieldsValidator {
    /// Protocol type -> number of matches in one span
    fn count_types(
        &self,
        ctx: &TableContext<'_>,
        span: &TableSpan,
        issues: &mut Vec<ValidationIssue>,
    ) -> BTreeMap<String, usize> {
        let mut counts = BTreeMap::new();
        for &column in &span.columns {
            let mut types = BTreeSet::new();
            for name in ctx.table.column_values(column) {
                match ctx.facts.protocol_types.get(&name.to_lowercase()) {
                    Some(kind) => {
                        types.insert(kind.clone());
                    }
                    None => issues.push(ValidationIssue::error(
                        format!(
                            "protocol '{name}' (column {}) is not declared in study '{}'",
                            column + 1,
                            ctx.facts.accession
                        ),
                        ctx.file_name,
                        self.name(),
                    )),
                }
            }
            for kind in types {
                *counts.entry(kind).or_insert(0) += 1;
            }
        }
        counts
    }

    /// Required slots need a match, any slot warns on repeats
    fn check_slots(
        &self,
        ctx: &TableContext<'_>,
        protocols: &[ProtocolConfig],
        counts: &BTreeMap<String, usize>,
        place: &str,
        issues: &mut Vec<ValidationIssue>,
    ) {
        for protocol in protocols {
            let count = counts
                .get(&protocol.protocol.to_lowercase())
                .copied()
                .unwrap_or(0);
            if count == 0 && protocol.required {
                issues.push(ValidationIssue::error(
                    format!("no protocol of type '{}' {place}", protocol.protocol),
                    ctx.file_name,
                    self.name(),
                ));
            } else if count > 1 {
                issues.push(ValidationIssue::warning(
                    format!(
                        "protocol type '{}' is referenced {count} times {place}",
                        protocol.protocol
                    ),
                    ctx.file_name,
                    self.name(),
                ));
            }
        }
    }
}

fn merge_counts(spans: &[(String, BTreeMap<String, usize>)]) -> BTreeMap<String, usize> {
    let mut merged = BTreeMap::new();
    for (_, counts) in spans {
        for (kind, count) in counts {
            *merged.entry(kind.clone()).or_insert(0) += count;
        }
    }
    merged
}

impl TableValidator for ProtocolFieldsValidator {
    fn validate(&self, ctx: &TableContext<'_>) -> Vec<ValidationIssue> {
        let mut issues = Vec::new();
        let spans = table_spans(ctx);
        let counted = spans
            .iter()
            .map(|span| (span.node.to_lowercase(), self.count_types(ctx, span, &mut issues)))
            .collect::<Vec<_>>();

        // Slots of a configured node the table lacks move on to the next
        // node it has. Table spans between two matched nodes are merged.
        let mut carried = Vec::new();
        let mut next = 0;
        let mut last_node = None;
        for configured in ctx.configuration.protocol_spans() {
            carried.extend(configured.protocols);
            let node = configured.node.to_lowercase();
            let Some(found) = counted[next..].iter().position(|(n, _)| *n == node) else {
                debug!(node = %configured.node, "Node column absent, protocol slots carried forward");
                continue;
            };
            let place = if configured.node.is_empty() {
                "after the last node".to_string()
            } else {
                format!("before '{}'", configured.node)
            };
            let counts = merge_counts(&counted[next..=next + found]);
            self.check_slots(ctx, &std::mem::take(&mut carried), &counts, &place, &mut issues);
            next += found + 1;
            last_node = Some(configured.node);
        }

        if !carried.is_empty() {
            let place = match last_node.filter(|node| !node.is_empty()) {
                Some(node) => format!("after '{node}'"),
                None => "in the table".to_string(),
            };
            let counts = merge_counts(&counted[next..]);
            self.check_slots(ctx, &carried, &counts, &place, &mut issues);
        }
        issues
    }

    fn name(&self) -> &str {
        "protocol_fields"
    }
}

fn factor_columns(table: &isatab_core::SectionInstance) -> Vec<String> {
    table
        .fields()
        .iter()
        .filter(|f| f.id.eq_ignore_ascii_case("Factor Value"))
        .filter_map(|f| f.field_type.as_deref())
        .map(|t| t.trim().to_lowercase())
        .collect()
}

/// Every declared factor has values in the study-sample or assay table, and
/// no factor value names an undeclared factor
pub struct FactorPresenceValidator;

impl TableValidator for FactorPresenceValidator {
    fn validate(&self, ctx: &TableContext<'_>) -> Vec<ValidationIssue> {
        let Some(samples) = ctx.samples else {
            return Vec::new();
        };

        let mut present = factor_columns(ctx.table);
        present.extend(factor_columns(samples));

        let mut issues = Vec::new();
        for factor in &ctx.facts.factors {
            if !present.contains(&factor.to_lowercase()) {
                issues.push(ValidationIssue::error(
                    format!("factor '{factor}' has no 'Factor Value[{factor}]' column"),
                    ctx.file_name,
                    self.name(),
                ));
            }
        }

        let declared = ctx
            .facts
            .factors
            .iter()
            .map(|f| f.to_lowercase())
            .collect::<HashSet<_>>();
        for column in factor_columns(ctx.table) {
            if !declared.contains(&column) {
                issues.push(ValidationIssue::warning(
                    format!("'Factor Value[{column}]' names a factor the study does not declare"),
                    ctx.file_name,
                    self.name(),
                ));
            }
        }
        issues
    }

    fn name(&self) -> &str {
        "factor_presence"
    }
}

/// Assay sample names exist in the study-sample table
pub struct SampleReferenceValidator;

impl TableValidator for SampleReferenceValidator {
    fn validate(&self, ctx: &TableContext<'_>) -> Vec<ValidationIssue> {
        let (Some(samples), Some(column)) = (ctx.samples, ctx.column(SAMPLE_NAME)) else {
            return Vec::new();
        };

        let known = samples
            .header_index(SAMPLE_NAME)
            .map(|c| samples.column_values(c).into_iter().collect::<HashSet<_>>())
            .unwrap_or_default();
        let unknown = ctx
            .table
            .column_values(column)
            .into_iter()
            .filter(|name| !known.contains(name))
            .collect::<BTreeSet<_>>();

        if unknown.is_empty() {
            return Vec::new();
        }
        vec![ValidationIssue::error(
            format!(
                "samples not defined in the study-sample file: {}",
                unknown.into_iter().collect::<Vec<_>>().join(", ")
            ),
            ctx.file_name,
            self.name(),
        )]
    }

    fn name(&self) -> &str {
        "sample_reference"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::validation::configuration::TableConfiguration;
    use crate::validation::context::StudyFacts;
    use crate::validation::ontology::OntologyIndex;
    use crate::validation::report::Severity;
    use isatab_core::schema::{ISATAB_FORMAT_SET, SchemaRegistry};
    use crate::parser::TabParser;

    fn table(format: &str, content: &str) -> isatab_core::SectionInstance {
        let registry = SchemaRegistry::with_builtin().unwrap();
        let set = registry.format_set(ISATAB_FORMAT_SET).unwrap();
        let instance = TabParser::default()
            .parse_str(set.require_format(format).unwrap(), content, None)
            .unwrap();
        instance.sections()[0].clone()
    }

    fn configuration(yaml: &str) -> TableConfiguration {
        serde_yaml::from_str(yaml).unwrap()
    }

    fn facts() -> StudyFacts {
        let mut facts = StudyFacts {
            accession: "S1".to_string(),
            ..StudyFacts::default()
        };
        facts.protocol_types.insert("extract".into(), "extraction".into());
        facts.protocol_types.insert("extract again".into(), "extraction".into());
        facts.protocol_types.insert("ms".into(), "mass spectrometry".into());
        facts.protocol_types.insert("nmr".into(), "nmr spectroscopy".into());
        facts.ontology_sources.insert("ncbitaxon".into());
        facts
    }

    fn messages(issues: &[ValidationIssue]) -> Vec<(Severity, String)> {
        issues.iter().map(|i| (i.severity, i.message.clone())).collect()
    }

    #[test]
    fn test_required_fields() {
        let table = table("assay", "Sample Name\tExtract Name\ns1\t\ns2\te2\n");
        let config = configuration(
            "elements:\n  - { field: Sample Name, required: true }\n  - { field: Extract Name, required: true }\n  - { field: MS Assay Name, required: true }\n",
        );
        let facts = facts();
        let ctx = TableContext::new("a.txt", &table, &config, &facts);

        assert_eq!(
            messages(&RequiredFieldsValidator.validate(&ctx)),
            vec![
                (Severity::Error, "required column 'Extract Name' is empty in rows 1".to_string()),
                (Severity::Error, "required column 'MS Assay Name' is missing".to_string()),
            ]
        );
    }

    #[test]
    fn test_field_values() {
        let table = table(
            "assay",
            "Sample Name\tDate\tParameter Value[Scan polarity]\ns1\t2020-01-02\tpositive\ns2\tyesterday\tsideways\n",
        );
        let config = configuration(
            "elements:\n  - { field: Date, data_type: date }\n  - { field: 'Parameter Value[Scan polarity]', data_type: list, values: [positive, negative] }\n",
        );
        let facts = facts();
        let ctx = TableContext::new("a.txt", &table, &config, &facts);

        let issues = FieldValuesValidator.validate(&ctx);
        assert_eq!(issues.len(), 2);
        assert!(issues[0].message.contains("'yesterday'"));
        assert!(issues[1].message.contains("'sideways'"));
    }

    #[test]
    fn test_ontology_triples_and_branches() {
        let table = table(
            "study_sample",
            "Source Name\tCharacteristics[organism]\tTerm Source REF\tTerm Accession Number\tSample Name\n\
             src1\tHomo sapiens\tNCBITAXON\tNCBITaxon:9606\ts1\n\
             src2\tyeast\tNCBITAXON\tNCBITaxon:4932\ts2\n\
             src3\tmouse\t\t\ts3\n\
             src4\tthing\tMADEUP\tX:1\ts4\n",
        );
        let config = configuration(
            "table: study_sample\nelements:\n  - field: 'Characteristics[Organism]'\n    data_type: ontology\n    ontology: { sources: [NCBITAXON], branches: ['NCBITaxon:33208'] }\n",
        );
        let index = OntologyIndex::from_yaml(
            "terms:\n  - { accession: 'NCBITaxon:9606', parents: ['NCBITaxon:33208'] }\n",
        )
        .unwrap();
        let facts = facts();
        let ctx = TableContext::new("s.txt", &table, &config, &facts).with_lookup(Some(&index));

        let issues = messages(&OntologyFieldsValidator.validate(&ctx));
        let errors = issues.iter().filter(|(s, _)| *s == Severity::Error).count();
        assert_eq!(errors, 4, "{issues:?}");
        assert!(issues.iter().any(|(_, m)| m.contains("'yeast' (NCBITaxon:4932)")));
        assert!(issues.iter().any(|(_, m)| m.contains("'mouse'") && m.contains("no source or accession")));
        assert!(issues.iter().any(|(s, m)| *s == Severity::Warning && m.contains("'MADEUP'")));
    }

    #[test]
    fn test_ontology_column_without_companions() {
        let table = table("study_sample", "Characteristics[organism]\tSample Name\nHomo sapiens\ts1\n");
        let config = configuration(
            "elements:\n  - { field: 'Characteristics[organism]', data_type: ontology }\n",
        );
        let facts = facts();
        let ctx = TableContext::new("s.txt", &table, &config, &facts);

        let issues = OntologyFieldsValidator.validate(&ctx);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].message.contains("must be followed by"));
    }

    #[test]
    fn test_unit_fields() {
        let table = table(
            "assay",
            "Sample Name\tProtocol REF\tParameter Value[Field]\tUnit\ns1\tms\t600\tMHz\ns2\tms\t500\t\n",
        );
        let config = configuration(
            "elements:\n  - { field: 'Parameter Value[Field]', unit: true }\n",
        );
        let facts = facts();
        let ctx = TableContext::new("a.txt", &table, &config, &facts);

        assert_eq!(
            messages(&UnitFieldsValidator.validate(&ctx)),
            vec![
                (Severity::Error, "values of 'Parameter Value[Field]' have no unit in rows 2".to_string()),
                (
                    Severity::Warning,
                    "unit of 'Parameter Value[Field]' has no term source and accession columns".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_protocol_spans() {
        let table = table(
            "assay",
            "Sample Name\tProtocol REF\tProtocol REF\tExtract Name\tProtocol REF\tMS Assay Name\n\
             s1\textract\textract again\te1\tunknown\trun1\n",
        );
        let config = configuration(
            "elements:\n  - { field: Sample Name }\n  - { protocol: extraction, required: true }\n  - { field: Extract Name }\n  - { protocol: mass spectrometry, required: true }\n  - { field: MS Assay Name }\n",
        );
        let facts = facts();
        let ctx = TableContext::new("a.txt", &table, &config, &facts);

        let issues = messages(&ProtocolFieldsValidator.validate(&ctx));
        assert_eq!(
            issues,
            vec![
                (
                    Severity::Error,
                    "protocol 'unknown' (column 5) is not declared in study 'S1'".to_string()
                ),
                (
                    Severity::Warning,
                    "protocol type 'extraction' is referenced 2 times before 'Extract Name'".to_string()
                ),
                (
                    Severity::Error,
                    "no protocol of type 'mass spectrometry' before 'MS Assay Name'".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_protocol_slots_of_absent_node_move_on() {
        let config = configuration(
            "elements:\n  - { field: Sample Name, required: true }\n  - { protocol: extraction, required: true }\n  - { field: Extract Name }\n  - { protocol: nmr spectroscopy, required: true }\n  - { field: NMR Assay Name, required: true }\n  - { protocol: metabolite identification }\n  - { protocol: mass spectrometry, required: true }\n",
        );
        let facts = facts();

        let tbl = table("assay", "Sample Name\tProtocol REF\tNMR Assay Name\ns1\tnmr\trun1\n");
        let ctx = TableContext::new("a.txt", &tbl, &config, &facts);
        assert_eq!(
            messages(&ProtocolFieldsValidator.validate(&ctx)),
            vec![
                (
                    Severity::Error,
                    "no protocol of type 'extraction' before 'NMR Assay Name'".to_string()
                ),
                (
                    Severity::Error,
                    "no protocol of type 'mass spectrometry' after 'NMR Assay Name'".to_string()
                ),
            ]
        );

        let tbl = table(
            "assay",
            "Sample Name\tProtocol REF\tProtocol REF\tNMR Assay Name\tProtocol REF\ns1\textract\tnmr\trun1\tms\n",
        );
        let ctx = TableContext::new("a.txt", &tbl, &config, &facts);
        assert!(ProtocolFieldsValidator.validate(&ctx).is_empty());
    }

    #[test]
    fn test_factor_presence_and_sample_reference() {
        let samples = table(
            "study_sample",
            "Sample Name\tFactor Value[Dose]\ns1\t1\ns2\t2\n",
        );
        let assay = table("assay", "Sample Name\tFactor Value[Time]\ns1\t1\ns9\t2\n");
        let config = configuration("elements: []\n");
        let mut facts = facts();
        facts.factors = vec!["Dose".to_string(), "Strain".to_string()];
        let ctx = TableContext::new("a.txt", &assay, &config, &facts).with_samples(Some(&samples));

        assert_eq!(
            messages(&FactorPresenceValidator.validate(&ctx)),
            vec![
                (Severity::Error, "factor 'Strain' has no 'Factor Value[Strain]' column".to_string()),
                (
                    Severity::Warning,
                    "'Factor Value[time]' names a factor the study does not declare".to_string()
                ),
            ]
        );
        assert_eq!(
            messages(&SampleReferenceValidator.validate(&ctx)),
            vec![(
                Severity::Error,
                "samples not defined in the study-sample file: s9".to_string()
            )]
        );
    }
}
