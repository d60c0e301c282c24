//! Column definitions and the `Id[Type](SubType)` header grammar

use crate::error::{IsaTabError, Result};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

static HEADER_GRAMMAR: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r"^([^\[\]()]+?)\s*(?:\[\s*([^\[\]]+?)\s*\])?\s*(?:\(\s*([^()]+?)\s*\))?$").ok()
});

/// Kind of external file a column refers to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RefFileType {
    /// Raw instrument output
    Raw,
    /// Processed or derived data
    Processed,
    /// Anything else (images, assignment files)
    Generic,
}

impl fmt::Display for RefFileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RefFileType::Raw => write!(f, "raw"),
            RefFileType::Processed => write!(f, "processed"),
            RefFileType::Generic => write!(f, "generic"),
        }
    }
}

/// Header definition of one column pattern.
///
/// Templates live in a [`Section`](super::Section); parsing a concrete header
/// produces a positioned clone carrying the bracket type, paren subtype and
/// column index. Templates themselves never carry an index.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    /// Header identifier, e.g. `Characteristics` or `Study Identifier`
    pub id: String,

    /// Bracket type, e.g. `organism` in `Characteristics[organism]`
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub field_type: Option<String>,

    /// Paren subtype, e.g. `h` in `Factor Value[Time](h)`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtype: Option<String>,

    /// Column index, assigned only by [`Field::parse_header`]
    #[serde(skip)]
    pub index: Option<usize>,

    /// Minimum number of columns with this id in one section
    #[serde(default)]
    pub min_cardinality: u32,

    /// Maximum number of columns per distinct signature (`None` = unbounded)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_cardinality: Option<u32>,

    /// Field ids allowed immediately before this column (empty = anywhere)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub follows: Vec<String>,

    /// Column values name external files of this kind
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ref_file_type: Option<RefFileType>,

    /// Values may be ontology terms followed by source/accession columns
    #[serde(default)]
    pub ontology: bool,

    /// Comment-style column that may repeat freely and is never rejected
    #[serde(default)]
    pub repeatable: bool,
}

/// (id, type, subtype) identity of a field within one section
pub type FieldSignature = (String, Option<String>, Option<String>);

impl Field {
    /// Create a plain template field
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            field_type: None,
            subtype: None,
            index: None,
            min_cardinality: 0,
            max_cardinality: None,
            follows: Vec::new(),
            ref_file_type: None,
            ontology: false,
            repeatable: false,
        }
    }

    /// Set the maximum cardinality
    #[must_use]
    pub fn with_max(mut self, max: u32) -> Self {
        self.max_cardinality = Some(max);
        self
    }

    /// Set the minimum cardinality
    #[must_use]
    pub fn with_min(mut self, min: u32) -> Self {
        self.min_cardinality = min;
        self
    }

    /// Mark the field as a freely repeatable comment-style column
    #[must_use]
    pub fn repeatable(mut self) -> Self {
        self.repeatable = true;
        self
    }

    /// Parse a concrete header against this template.
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::InvalidValue` if the header does not follow the
    /// `Id[Type](SubType)` grammar, if its id differs from the template id, or
    /// if the template pins a type or subtype the header does not carry.
    pub fn parse_header(&self, header: &str, column: usize, case_sensitive: bool) -> Result<Field> {
        let (id, field_type, subtype) = split_header(header)?;

        if !names_match(&id, &self.id, case_sensitive) {
            return Err(IsaTabError::invalid_value(
                &self.id,
                header,
                format!("header id '{id}' does not match field '{}'", self.id),
            ));
        }

        if let Some(expected) = &self.field_type {
            let matches = field_type
                .as_deref()
                .is_some_and(|t| names_match(t, expected, case_sensitive));
            if !matches {
                return Err(IsaTabError::invalid_value(
                    &self.id,
                    header,
                    format!("expected type [{expected}]"),
                ));
            }
        }

        if let Some(expected) = &self.subtype {
            let matches = subtype
                .as_deref()
                .is_some_and(|t| names_match(t, expected, case_sensitive));
            if !matches {
                return Err(IsaTabError::invalid_value(
                    &self.id,
                    header,
                    format!("expected subtype ({expected})"),
                ));
            }
        }

        let mut positioned = self.clone();
        positioned.field_type = field_type;
        positioned.subtype = subtype;
        positioned.index = Some(column);
        Ok(positioned)
    }

    /// Render the header text of this field
    #[must_use]
    pub fn dump(&self) -> String {
        let mut header = self.id.clone();
        if let Some(t) = &self.field_type {
            header.push('[');
            header.push_str(t);
            header.push(']');
        }
        if let Some(s) = &self.subtype {
            header.push('(');
            header.push_str(s);
            header.push(')');
        }
        header
    }

    /// Identity of this field within its section
    #[must_use]
    pub fn signature(&self) -> FieldSignature {
        (self.id.clone(), self.field_type.clone(), self.subtype.clone())
    }

    /// Whether this column names a node of an experimental graph
    /// (`Sample Name`, `Raw Data File`, `Derived Array Data Matrix File`, ...)
    #[must_use]
    pub fn is_node(&self) -> bool {
        is_node_header(&self.id)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.dump())
    }
}

/// Whether a header names a material or data node
#[must_use]
pub fn is_node_header(header: &str) -> bool {
    let lower = header.trim().to_lowercase();
    lower.ends_with(" name") || lower.ends_with(" data file") || lower.ends_with(" data matrix file")
}

/// Split a header into (id, type, subtype) according to the header grammar.
///
/// # Errors
///
/// Returns `IsaTabError::InvalidValue` on malformed syntax.
pub fn split_header(header: &str) -> Result<FieldSignature> {
    let trimmed = header.trim();
    let grammar = HEADER_GRAMMAR
        .as_ref()
        .ok_or_else(|| IsaTabError::internal("header grammar failed to compile"))?;
    let caps = grammar.captures(trimmed).ok_or_else(|| {
        IsaTabError::invalid_value(trimmed, header, "header does not match Id[Type](SubType)")
    })?;

    let id = caps
        .get(1)
        .map(|m| m.as_str().trim().to_string())
        .unwrap_or_default();
    let field_type = caps.get(2).map(|m| m.as_str().to_string());
    let subtype = caps.get(3).map(|m| m.as_str().to_string());
    Ok((id, field_type, subtype))
}

fn names_match(a: &str, b: &str, case_sensitive: bool) -> bool {
    if case_sensitive {
        a == b
    } else {
        a.eq_ignore_ascii_case(b)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_parse_typed_header() {
        let template = Field::new("Factor Value");
        let field = template
            .parse_header("Factor Value[Time](h)", 4, true)
            .unwrap();

        assert_eq!(field.id, "Factor Value");
        assert_eq!(field.field_type.as_deref(), Some("Time"));
        assert_eq!(field.subtype.as_deref(), Some("h"));
        assert_eq!(field.index, Some(4));
        // the template is untouched
        assert_eq!(template.index, None);
        assert_eq!(template.field_type, None);
    }

    #[test]
    fn test_parse_header_whitespace() {
        let template = Field::new("Characteristics");
        let field = template
            .parse_header("  Characteristics [ organism ] ", 0, true)
            .unwrap();
        assert_eq!(field.dump(), "Characteristics[organism]");
    }

    #[test]
    fn test_parse_header_rejects_other_id() {
        let template = Field::new("Sample Name");
        let err = template.parse_header("Source Name", 0, true).unwrap_err();
        assert!(matches!(err, IsaTabError::InvalidValue { .. }));
    }

    #[test]
    fn test_parse_header_malformed() {
        let template = Field::new("Characteristics");
        assert!(template.parse_header("Characteristics[organism", 0, true).is_err());
        assert!(template.parse_header("Characteristics[]", 0, true).is_err());
        assert!(template.parse_header("Characteristics]x[", 0, true).is_err());
    }

    #[test]
    fn test_case_sensitivity() {
        let template = Field::new("Sample Name");
        assert!(template.parse_header("sample name", 0, true).is_err());
        let field = template.parse_header("sample name", 0, false).unwrap();
        assert_eq!(field.id, "Sample Name");
    }

    #[test]
    fn test_pinned_type() {
        let mut template = Field::new("Comment");
        template.field_type = Some("Data Record Accession".to_string());
        assert!(template.parse_header("Comment[Data Record Accession]", 1, true).is_ok());
        assert!(template.parse_header("Comment[other]", 1, true).is_err());
        assert!(template.parse_header("Comment", 1, true).is_err());
    }

    #[test]
    fn test_is_node_header() {
        assert!(is_node_header("Sample Name"));
        assert!(is_node_header("Raw Data File"));
        assert!(is_node_header("Derived Array Data Matrix File"));
        assert!(!is_node_header("Protocol REF"));
        assert!(!is_node_header("Characteristics[organism]"));
    }

    proptest! {
        #[test]
        fn header_round_trip(
            id in "[A-Za-z][A-Za-z ]{0,20}[A-Za-z]",
            field_type in proptest::option::of("[A-Za-z0-9][A-Za-z0-9 _-]{0,12}[A-Za-z0-9]"),
            subtype in proptest::option::of("[A-Za-z0-9][A-Za-z0-9 _-]{0,8}[A-Za-z0-9]"),
        ) {
            let template = Field::new(id.clone());
            let mut header = id.clone();
            if let Some(t) = &field_type {
                header.push_str(&format!("[{t}]"));
            }
            if let Some(s) = &subtype {
                header.push_str(&format!("({s})"));
            }

            let parsed = template.parse_header(&header, 0, true).unwrap();
            let reparsed = template.parse_header(&parsed.dump(), 0, true).unwrap();

            prop_assert_eq!(parsed.signature(), (id, field_type, subtype));
            prop_assert_eq!(reparsed.signature(), parsed.signature());
        }
    }
}
