//! Property-mapping helpers
//!
//! A mapper declares, per domain type, a static table of
//! `(field id, helper kind)` pairs built with [`HelperTable`]. The table is
//! resolved once against a concrete [`SectionInstance`] into the immutable
//! list of claimed column indexes and strategies that is then applied to
//! every record.

use chrono::NaiveDate;
use isatab_core::model::{Annotation, OntologyTerm};
use isatab_core::{IsaTabError, Record, Result, SectionInstance};
use std::collections::BTreeSet;
use std::fmt;

/// Separator of multi-valued cells
pub const MULTI_VALUE_SEPARATOR: char = ';';

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%d/%m/%Y"];
const DATE_TIME_FORMATS: &[&str] = &["%Y-%m-%dT%H:%M:%S", "%Y-%m-%d %H:%M:%S"];

/// Setter of a plain text property
pub type TextSetter<T> = fn(&mut T, String);
/// Setter of a date property
pub type DateSetter<T> = fn(&mut T, NaiveDate);
/// Setter of a multi-valued text property
pub type TextsSetter<T> = fn(&mut T, Vec<String>);
/// Setter of a single ontology term
pub type TermSetter<T> = fn(&mut T, OntologyTerm);
/// Setter of a multi-valued ontology term list
pub type TermsSetter<T> = fn(&mut T, Vec<OntologyTerm>);
/// Appender of one `Comment[...]` value
pub type CommentSetter<T> = fn(&mut T, Annotation);

/// What a helper does with its columns
pub enum HelperKind<T> {
    /// Single text value
    Text(TextSetter<T>),
    /// Single date value
    Date(DateSetter<T>),
    /// `;`-separated text values
    Texts(TextsSetter<T>),
    /// Ontology term with its companion accession and source columns
    Term {
        /// Field id of the accession column
        accession: &'static str,
        /// Field id of the source column
        source: &'static str,
        /// Setter
        set: TermSetter<T>,
    },
    /// `;`-separated ontology terms with companion columns
    Terms {
        /// Field id of the accession column
        accession: &'static str,
        /// Field id of the source column
        source: &'static str,
        /// Setter
        set: TermsSetter<T>,
    },
    /// Every `Comment[...]` column
    Comments(CommentSetter<T>),
}

/// One entry of a helper table
pub struct HelperSpec<T> {
    /// Id of the value field the helper is bound to
    pub field: &'static str,
    /// Strategy
    pub kind: HelperKind<T>,
}

/// Immutable list of helper specifications for one domain type
pub struct HelperTable<T> {
    specs: Vec<HelperSpec<T>>,
}

impl<T> Default for HelperTable<T> {
    fn default() -> Self {
        Self { specs: Vec::new() }
    }
}

impl<T> HelperTable<T> {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a text property
    #[must_use]
    pub fn text(mut self, field: &'static str, set: TextSetter<T>) -> Self {
        self.specs.push(HelperSpec {
            field,
            kind: HelperKind::Text(set),
        });
        self
    }

    /// Bind a date property
    #[must_use]
    pub fn date(mut self, field: &'static str, set: DateSetter<T>) -> Self {
        self.specs.push(HelperSpec {
            field,
            kind: HelperKind::Date(set),
        });
        self
    }

    /// Bind a multi-valued text property
    #[must_use]
    pub fn texts(mut self, field: &'static str, set: TextsSetter<T>) -> Self {
        self.specs.push(HelperSpec {
            field,
            kind: HelperKind::Texts(set),
        });
        self
    }

    /// Bind an ontology term whose companion columns are
    /// `<field> Term Accession Number` and `<field> Term Source REF`
    #[must_use]
    pub fn term(
        mut self,
        field: &'static str,
        accession: &'static str,
        source: &'static str,
        set: TermSetter<T>,
    ) -> Self {
        self.specs.push(HelperSpec {
            field,
            kind: HelperKind::Term {
                accession,
                source,
                set,
            },
        });
        self
    }

    /// Bind a multi-valued ontology term list
    #[must_use]
    pub fn terms(
        mut self,
        field: &'static str,
        accession: &'static str,
        source: &'static str,
        set: TermsSetter<T>,
    ) -> Self {
        self.specs.push(HelperSpec {
            field,
            kind: HelperKind::Terms {
                accession,
                source,
                set,
            },
        });
        self
    }

    /// Collect every `Comment[...]` column
    #[must_use]
    pub fn comments(mut self, set: CommentSetter<T>) -> Self {
        self.specs.push(HelperSpec {
            field: "Comment",
            kind: HelperKind::Comments(set),
        });
        self
    }

    /// Specifications in declaration order
    #[must_use]
    pub fn specs(&self) -> &[HelperSpec<T>] {
        &self.specs
    }

    /// Resolve the table against the columns of a section instance.
    ///
    /// Helpers whose value field is absent are dropped. Every column must be
    /// claimed by exactly one helper or be a repeatable column.
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::StructureError` naming the first unclaimed or
    /// doubly claimed column.
    pub fn resolve(&self, instance: &SectionInstance) -> Result<Vec<ResolvedHelper<T>>> {
        let mut resolved = Vec::new();
        let mut claimed = BTreeSet::new();

        for spec in &self.specs {
            let strategy = match spec.kind {
                HelperKind::Comments(set) => {
                    let columns = instance
                        .fields()
                        .iter()
                        .enumerate()
                        .filter(|(_, f)| f.id == spec.field)
                        .map(|(i, f)| (i, f.field_type.clone().unwrap_or_default()))
                        .collect::<Vec<_>>();
                    if columns.is_empty() {
                        continue;
                    }
                    Strategy::Comments { columns, set }
                }
                _ => {
                    let Some(column) = instance.field_index(spec.field) else {
                        continue;
                    };
                    match spec.kind {
                        HelperKind::Text(set) => Strategy::Text { column, set },
                        HelperKind::Date(set) => Strategy::Date { column, set },
                        HelperKind::Texts(set) => Strategy::Texts { column, set },
                        HelperKind::Term {
                            accession,
                            source,
                            set,
                        } => Strategy::Term {
                            columns: TermIndexes::resolve(instance, column, accession, source),
                            set,
                        },
                        HelperKind::Terms {
                            accession,
                            source,
                            set,
                        } => Strategy::Terms {
                            columns: TermIndexes::resolve(instance, column, accession, source),
                            set,
                        },
                        HelperKind::Comments(_) => continue,
                    }
                }
            };

            let helper = ResolvedHelper {
                field: spec.field,
                strategy,
            };
            for column in helper.columns() {
                if !claimed.insert(column) {
                    return Err(IsaTabError::structure(
                        instance.id(),
                        format!("column {column} is claimed by more than one helper"),
                    ));
                }
            }
            resolved.push(helper);
        }

        for (i, field) in instance.fields().iter().enumerate() {
            if claimed.contains(&i) || field.repeatable {
                continue;
            }
            return Err(IsaTabError::structure(
                instance.id(),
                format!("column {i} '{}' is not mapped to any property", field.dump()),
            ));
        }

        Ok(resolved)
    }
}

/// Column indexes of a term triple
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TermIndexes {
    /// Label column
    pub label: usize,
    /// Accession column, when present
    pub accession: Option<usize>,
    /// Source column, when present
    pub source: Option<usize>,
}

impl TermIndexes {
    fn resolve(instance: &SectionInstance, label: usize, accession: &str, source: &str) -> Self {
        Self {
            label,
            accession: instance.field_index(accession),
            source: instance.field_index(source),
        }
    }

    fn columns(self) -> Vec<usize> {
        std::iter::once(self.label)
            .chain(self.accession)
            .chain(self.source)
            .collect()
    }
}

/// Strategy bound to concrete column indexes
pub enum Strategy<T> {
    /// Single text value
    Text {
        /// Value column
        column: usize,
        /// Setter
        set: TextSetter<T>,
    },
    /// Single date value
    Date {
        /// Value column
        column: usize,
        /// Setter
        set: DateSetter<T>,
    },
    /// Multi-valued text
    Texts {
        /// Value column
        column: usize,
        /// Setter
        set: TextsSetter<T>,
    },
    /// Ontology term
    Term {
        /// Term columns
        columns: TermIndexes,
        /// Setter
        set: TermSetter<T>,
    },
    /// Multi-valued ontology terms
    Terms {
        /// Term columns
        columns: TermIndexes,
        /// Setter
        set: TermsSetter<T>,
    },
    /// Comment columns with their bracketed names
    Comments {
        /// (column, comment name)
        columns: Vec<(usize, String)>,
        /// Appender
        set: CommentSetter<T>,
    },
}

/// A helper resolved against one section instance
pub struct ResolvedHelper<T> {
    field: &'static str,
    strategy: Strategy<T>,
}

impl<T> fmt::Debug for ResolvedHelper<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResolvedHelper")
            .field("field", &self.field)
            .field("columns", &self.columns())
            .finish()
    }
}

impl<T> ResolvedHelper<T> {
    /// Field id the helper is bound to
    #[must_use]
    pub fn field(&self) -> &'static str {
        self.field
    }

    /// Columns claimed by this helper
    #[must_use]
    pub fn columns(&self) -> Vec<usize> {
        match &self.strategy {
            Strategy::Text { column, .. }
            | Strategy::Date { column, .. }
            | Strategy::Texts { column, .. } => vec![*column],
            Strategy::Term { columns, .. } | Strategy::Terms { columns, .. } => columns.columns(),
            Strategy::Comments { columns, .. } => columns.iter().map(|(i, _)| *i).collect(),
        }
    }

    /// Apply the helper to one record. Missing values are skipped.
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::InvalidValue` when a date cannot be parsed or
    /// multi-valued columns disagree on their value count.
    pub fn apply(&self, target: &mut T, record: &Record) -> Result<()> {
        match &self.strategy {
            Strategy::Text { column, set } => {
                if let Some(value) = record.get(*column) {
                    set(target, value.to_string());
                }
            }
            Strategy::Date { column, set } => {
                if let Some(value) = record.get(*column) {
                    set(target, parse_date(self.field, value)?);
                }
            }
            Strategy::Texts { column, set } => {
                if let Some(value) = record.get(*column) {
                    set(target, split_values(value));
                }
            }
            Strategy::Term { columns, set } => {
                let term = OntologyTerm::from_cells(
                    record.get(columns.label),
                    columns.accession.and_then(|i| record.get(i)),
                    columns.source.and_then(|i| record.get(i)),
                );
                if let Some(term) = term {
                    set(target, term);
                }
            }
            Strategy::Terms { columns, set } => {
                let terms = split_terms(
                    self.field,
                    record.get(columns.label),
                    columns.accession.and_then(|i| record.get(i)),
                    columns.source.and_then(|i| record.get(i)),
                )?;
                if !terms.is_empty() {
                    set(target, terms);
                }
            }
            Strategy::Comments { columns, set } => {
                for (column, name) in columns {
                    if let Some(value) = record.get(*column) {
                        set(target, Annotation::new(name.clone(), value));
                    }
                }
            }
        }
        Ok(())
    }
}

/// Parse a date cell
///
/// # Errors
///
/// Returns `IsaTabError::InvalidValue` if no supported layout matches.
pub fn parse_date(field: &str, value: &str) -> Result<NaiveDate> {
    let value = value.trim();
    DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value, format).ok())
        .or_else(|| {
            DATE_TIME_FORMATS.iter().find_map(|format| {
                chrono::NaiveDateTime::parse_from_str(value, format)
                    .ok()
                    .map(|dt| dt.date())
            })
        })
        .ok_or_else(|| IsaTabError::invalid_value(field, value, "expected a YYYY-MM-DD date"))
}

/// Split a multi-valued cell, trimming each value
#[must_use]
pub fn split_values(value: &str) -> Vec<String> {
    if value.trim().is_empty() {
        return Vec::new();
    }
    value
        .split(MULTI_VALUE_SEPARATOR)
        .map(|v| v.trim().to_string())
        .collect()
}

/// Split parallel label/accession/source cells into terms.
///
/// Labels and accessions must have the same count, or one of them must be
/// empty. Sources must match that count, be empty, or hold a single value
/// that is broadcast to every term.
///
/// # Errors
///
/// Returns `IsaTabError::InvalidValue` when the counts disagree.
pub fn split_terms(
    field: &str,
    labels: Option<&str>,
    accessions: Option<&str>,
    sources: Option<&str>,
) -> Result<Vec<OntologyTerm>> {
    let labels = labels.map(split_values).unwrap_or_default();
    let accessions = accessions.map(split_values).unwrap_or_default();
    let sources = sources.map(split_values).unwrap_or_default();

    let count = labels.len().max(accessions.len());
    let agrees = |len: usize| len == count || len == 0;
    if !agrees(labels.len()) || !agrees(accessions.len()) || !(agrees(sources.len()) || sources.len() == 1)
    {
        return Err(IsaTabError::invalid_value(
            field,
            format!(
                "{} / {} / {}",
                labels.join(";"),
                accessions.join(";"),
                sources.join(";")
            ),
            format!(
                "multi-valued columns disagree: {} labels, {} accessions, {} sources",
                labels.len(),
                accessions.len(),
                sources.len()
            ),
        ));
    }

    let non_empty = |v: Option<&String>| v.filter(|v| !v.is_empty()).cloned();
    Ok((0..count)
        .map(|i| {
            let source = if sources.len() == 1 {
                sources.first()
            } else {
                sources.get(i)
            };
            OntologyTerm {
                label: labels.get(i).cloned().unwrap_or_default(),
                accession: non_empty(accessions.get(i)),
                source: non_empty(source),
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use isatab_core::schema::{Field, Section, SectionType};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[derive(Debug, Default)]
    struct Target {
        name: Option<String>,
        kinds: Vec<OntologyTerm>,
        comments: Vec<Annotation>,
    }

    fn section() -> Arc<Section> {
        Arc::new(Section {
            id: "things".to_string(),
            header: None,
            section_type: SectionType::ManyInCols,
            fields: vec![
                Field::new("Thing Name"),
                Field::new("Thing Kind"),
                Field::new("Thing Kind Term Accession Number"),
                Field::new("Thing Kind Term Source REF"),
                Field::new("Comment").repeatable(),
            ],
        })
    }

    fn table() -> HelperTable<Target> {
        HelperTable::<Target>::new()
            .text("Thing Name", |t, v| t.name = Some(v))
            .terms(
                "Thing Kind",
                "Thing Kind Term Accession Number",
                "Thing Kind Term Source REF",
                |t, v| t.kinds = v,
            )
            .comments(|t, c| t.comments.push(c))
    }

    #[test]
    fn test_split_terms_broadcasts_source() {
        let terms = split_terms("kind", Some("A;B"), Some("1;2"), Some("src")).unwrap();
        assert_eq!(
            terms,
            vec![
                OntologyTerm::referenced("A", "1", "src"),
                OntologyTerm::referenced("B", "2", "src"),
            ]
        );
    }

    #[test]
    fn test_split_terms_count_mismatch() {
        let err = split_terms("kind", Some("A;B"), Some("1;2;3"), None).unwrap_err();
        assert!(matches!(err, IsaTabError::InvalidValue { .. }));

        let err = split_terms("kind", Some("A;B"), None, Some("x;y;z")).unwrap_err();
        assert!(matches!(err, IsaTabError::InvalidValue { .. }));
    }

    #[test]
    fn test_split_terms_without_references() {
        let terms = split_terms("kind", Some("A; B"), None, None).unwrap();
        assert_eq!(terms, vec![OntologyTerm::new("A"), OntologyTerm::new("B")]);
        assert!(split_terms("kind", None, None, None).unwrap().is_empty());
    }

    #[test]
    fn test_resolve_and_apply() {
        let mut instance = SectionInstance::new(section());
        for header in [
            "Thing Name",
            "Thing Kind",
            "Thing Kind Term Source REF",
            "Comment[origin]",
        ] {
            instance.add_header(header, false).unwrap();
        }

        let helpers = table().resolve(&instance).unwrap();
        assert_eq!(helpers.len(), 3);
        assert_eq!(
            format!("{:?}", helpers[0]),
            "ResolvedHelper { field: \"Thing Name\", columns: [0] }"
        );

        let record = Record::new(vec![
            "widget".to_string(),
            "round;square".to_string(),
            "SHAPES".to_string(),
            "lab".to_string(),
        ]);
        let mut target = Target::default();
        for helper in &helpers {
            helper.apply(&mut target, &record).unwrap();
        }

        assert_eq!(target.name.as_deref(), Some("widget"));
        assert_eq!(target.kinds.len(), 2);
        assert_eq!(target.kinds[1].source.as_deref(), Some("SHAPES"));
        assert_eq!(target.comments, vec![Annotation::new("origin", "lab")]);
    }

    #[test]
    fn test_unclaimed_column_is_rejected() {
        let mut instance = SectionInstance::new(section());
        instance.add_header("Thing Name", false).unwrap();
        instance.add_header("Thing Kind", false).unwrap();

        let resolved = HelperTable::<Target>::new()
            .text("Thing Name", |t, v| t.name = Some(v))
            .resolve(&instance);
        assert!(matches!(resolved, Err(IsaTabError::StructureError { .. })));
    }

    #[test]
    fn test_parse_date() {
        assert_eq!(
            parse_date("d", "2012-03-04").unwrap(),
            NaiveDate::from_ymd_opt(2012, 3, 4).unwrap()
        );
        assert_eq!(
            parse_date("d", "04/03/2012").unwrap(),
            NaiveDate::from_ymd_opt(2012, 3, 4).unwrap()
        );
        assert!(parse_date("d", "yesterday").is_err());
    }
}
