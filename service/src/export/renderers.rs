//! Column renderers: the export-side counterpart of the mapping helpers
//!
//! A [`RendererTable`] lists, per domain type, which columns an object is
//! written to and how. Static columns are declared once per section; the
//! `Comment[...]` renderer appends one dynamic column per distinct comment
//! name found among the exported objects.

use crate::mapping::helpers::MULTI_VALUE_SEPARATOR;
use chrono::NaiveDate;
use indexmap::IndexSet;
use isatab_core::Record;
use isatab_core::model::{Annotation, OntologyTerm};

/// Getter of a plain text property
pub type TextGetter<T> = fn(&T) -> Option<String>;
/// Getter of a date property
pub type DateGetter<T> = fn(&T) -> Option<NaiveDate>;
/// Getter of a multi-valued text property
pub type TextsGetter<T> = fn(&T) -> &[String];
/// Getter of a single ontology term
pub type TermGetter<T> = fn(&T) -> Option<&OntologyTerm>;
/// Getter of a multi-valued ontology term list
pub type TermsGetter<T> = fn(&T) -> &[OntologyTerm];
/// Getter of the `Comment[...]` values
pub type CommentsGetter<T> = fn(&T) -> &[Annotation];

/// What a renderer writes
pub enum RendererKind<T> {
    /// Single text value
    Text(TextGetter<T>),
    /// Single date value
    Date(DateGetter<T>),
    /// `;`-joined text values
    Texts(TextsGetter<T>),
    /// Ontology term with its accession and source columns
    Term {
        /// Field id of the accession column
        accession: &'static str,
        /// Field id of the source column
        source: &'static str,
        /// Getter
        get: TermGetter<T>,
    },
    /// `;`-joined ontology terms with accession and source columns
    Terms {
        /// Field id of the accession column
        accession: &'static str,
        /// Field id of the source column
        source: &'static str,
        /// Getter
        get: TermsGetter<T>,
    },
    /// Every `Comment[...]` value
    Comments(CommentsGetter<T>),
}

/// One entry of a renderer table
pub struct RendererSpec<T> {
    /// Field id of the value column (unused by comment renderers)
    pub field: &'static str,
    /// Strategy
    pub kind: RendererKind<T>,
}

impl<T> RendererSpec<T> {
    /// Field ids of the fixed columns this renderer writes, in order
    #[must_use]
    pub fn static_columns(&self) -> Vec<&'static str> {
        match &self.kind {
            RendererKind::Text(_) | RendererKind::Date(_) | RendererKind::Texts(_) => {
                vec![self.field]
            }
            RendererKind::Term { accession, source, .. }
            | RendererKind::Terms { accession, source, .. } => vec![self.field, *accession, *source],
            RendererKind::Comments(_) => Vec::new(),
        }
    }

    /// Cells of the fixed columns, aligned with
    /// [`static_columns`](Self::static_columns)
    fn static_cells(&self, object: &T) -> Vec<String> {
        let text = |v: Option<&str>| v.map(str::trim).unwrap_or_default().to_string();
        match &self.kind {
            RendererKind::Text(get) => vec![text(get(object).as_deref())],
            RendererKind::Date(get) => vec![
                get(object)
                    .map(|d| d.format("%Y-%m-%d").to_string())
                    .unwrap_or_default(),
            ],
            RendererKind::Texts(get) => vec![join(get(object).iter().map(String::as_str))],
            RendererKind::Term { get, .. } => {
                let term = get(object);
                vec![
                    text(term.map(|t| t.label.as_str())),
                    text(term.map(OntologyTerm::accession_text)),
                    text(term.map(OntologyTerm::source_text)),
                ]
            }
            RendererKind::Terms { get, .. } => {
                let terms = get(object);
                vec![
                    join(terms.iter().map(|t| t.label.as_str())),
                    join(terms.iter().map(OntologyTerm::accession_text)),
                    join(terms.iter().map(OntologyTerm::source_text)),
                ]
            }
            RendererKind::Comments(_) => Vec::new(),
        }
    }
}

/// Join values with `;`, or nothing when every value is empty
fn join<'a>(values: impl Iterator<Item = &'a str>) -> String {
    let values = values.map(str::trim).collect::<Vec<_>>();
    if values.iter().all(|v| v.is_empty()) {
        return String::new();
    }
    values.join(&MULTI_VALUE_SEPARATOR.to_string())
}

/// Immutable list of renderer specifications for one domain type
pub struct RendererTable<T> {
    specs: Vec<RendererSpec<T>>,
}

impl<T> Default for RendererTable<T> {
    fn default() -> Self {
        Self { specs: Vec::new() }
    }
}

impl<T> RendererTable<T> {
    /// Create an empty table
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn with(mut self, field: &'static str, kind: RendererKind<T>) -> Self {
        self.specs.push(RendererSpec { field, kind });
        self
    }

    /// Write a text property
    #[must_use]
    pub fn text(self, field: &'static str, get: TextGetter<T>) -> Self {
        self.with(field, RendererKind::Text(get))
    }

    /// Write a date property as `YYYY-MM-DD`
    #[must_use]
    pub fn date(self, field: &'static str, get: DateGetter<T>) -> Self {
        self.with(field, RendererKind::Date(get))
    }

    /// Write a multi-valued text property
    #[must_use]
    pub fn texts(self, field: &'static str, get: TextsGetter<T>) -> Self {
        self.with(field, RendererKind::Texts(get))
    }

    /// Write an ontology term to its three columns
    #[must_use]
    pub fn term(
        self,
        field: &'static str,
        accession: &'static str,
        source: &'static str,
        get: TermGetter<T>,
    ) -> Self {
        self.with(field, RendererKind::Term { accession, source, get })
    }

    /// Write an ontology term list to its three columns
    #[must_use]
    pub fn terms(
        self,
        field: &'static str,
        accession: &'static str,
        source: &'static str,
        get: TermsGetter<T>,
    ) -> Self {
        self.with(field, RendererKind::Terms { accession, source, get })
    }

    /// Write every `Comment[...]` value
    #[must_use]
    pub fn comments(self, get: CommentsGetter<T>) -> Self {
        self.with("Comment", RendererKind::Comments(get))
    }

    /// Specifications in declaration order
    #[must_use]
    pub fn specs(&self) -> &[RendererSpec<T>] {
        &self.specs
    }

    /// Field ids of every fixed column, in order
    #[must_use]
    pub fn static_columns(&self) -> Vec<&'static str> {
        self.specs.iter().flat_map(RendererSpec::static_columns).collect()
    }

    /// Distinct comment names of the given objects, in first-seen order
    pub fn comment_names<'a>(&self, objects: impl IntoIterator<Item = &'a T>) -> IndexSet<String>
    where
        T: 'a,
    {
        let getters = self
            .specs
            .iter()
            .filter_map(|spec| match spec.kind {
                RendererKind::Comments(get) => Some(get),
                _ => None,
            })
            .collect::<Vec<_>>();

        let mut names = IndexSet::new();
        for object in objects {
            for get in &getters {
                for annotation in get(object) {
                    let name = annotation.name.trim();
                    if !name.is_empty() {
                        names.insert(name.to_string());
                    }
                }
            }
        }
        names
    }

    /// Render one object: fixed columns first, then one cell per comment name
    #[must_use]
    pub fn render(&self, object: &T, comment_names: &IndexSet<String>) -> Record {
        let mut cells = self
            .specs
            .iter()
            .flat_map(|spec| spec.static_cells(object))
            .collect::<Vec<_>>();

        let fixed = cells.len();
        cells.resize(fixed + comment_names.len(), String::new());
        for spec in &self.specs {
            let RendererKind::Comments(get) = spec.kind else {
                continue;
            };
            for annotation in get(object) {
                if let Some(position) = comment_names.get_index_of(annotation.name.trim()) {
                    cells[fixed + position] = annotation.value.trim().to_string();
                }
            }
        }

        Record::new(cells)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Default)]
    struct Target {
        name: Option<String>,
        released: Option<NaiveDate>,
        roles: Vec<OntologyTerm>,
        comments: Vec<Annotation>,
    }

    fn table() -> RendererTable<Target> {
        RendererTable::<Target>::new()
            .text("Person Name", |t| t.name.clone())
            .date("Release Date", |t| t.released)
            .terms(
                "Person Roles",
                "Person Roles Term Accession Number",
                "Person Roles Term Source REF",
                |t| &t.roles,
            )
            .comments(|t| &t.comments)
    }

    #[test]
    fn test_static_columns() {
        assert_eq!(
            table().static_columns(),
            vec![
                "Person Name",
                "Release Date",
                "Person Roles",
                "Person Roles Term Accession Number",
                "Person Roles Term Source REF",
            ]
        );
    }

    #[test]
    fn test_render_joins_terms_and_places_comments() {
        let first = Target {
            name: Some("Smith".to_string()),
            released: NaiveDate::from_ymd_opt(2012, 3, 4),
            roles: vec![
                OntologyTerm::referenced("author", "1", "EFO"),
                OntologyTerm::new("curator"),
            ],
            comments: vec![Annotation::new("Orcid", "0000-0001")],
        };
        let second = Target {
            comments: vec![Annotation::new("Funder", "EU"), Annotation::new("Orcid", "x")],
            ..Default::default()
        };

        let table = table();
        let names = table.comment_names([&first, &second]);
        assert_eq!(names.iter().collect::<Vec<_>>(), vec!["Orcid", "Funder"]);

        let record = table.render(&first, &names);
        assert_eq!(
            record.values(),
            &["Smith", "2012-03-04", "author;curator", "1;", "EFO;", "0000-0001", ""]
        );

        let record = table.render(&second, &names);
        assert_eq!(record.values(), &["", "", "", "", "", "x", "EU"]);
        assert!(table.render(&Target::default(), &names).is_blank());
    }
}
