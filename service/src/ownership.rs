//! Study ownership changes
//!
//! A change is written `<accession>=<op><login>[,<login>...]` where `op` is
//! `+` (add), `-` (remove) or `=` (replace every owner), e.g.
//! `MTBLS1=+alice,bob`.

use isatab_core::model::Study;
use isatab_core::{IsaTabError, Result, Store};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use tracing::info;

/// How the listed logins change the owner set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OwnershipOp {
    /// Add the logins
    Add,
    /// Remove the logins
    Remove,
    /// Replace the owner set by the logins
    Replace,
}

impl OwnershipOp {
    fn symbol(self) -> char {
        match self {
            Self::Add => '+',
            Self::Remove => '-',
            Self::Replace => '=',
        }
    }
}

/// One ownership change of one study
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnershipSpec {
    /// Study accession
    pub accession: String,
    /// Operation
    pub op: OwnershipOp,
    /// Logins, in the order given
    pub users: Vec<String>,
}

impl OwnershipSpec {
    /// Parse `<accession>=<op><login>[,<login>...]`
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::InvalidValue` for a missing accession, an
    /// unknown operation or an empty login list (`=` alone clears the
    /// owners and is accepted).
    pub fn parse(text: &str) -> Result<Self> {
        let invalid = |message: &str| IsaTabError::invalid_value("ownership", text, message);

        let (accession, change) = text
            .split_once('=')
            .ok_or_else(|| invalid("expected <accession>=<op><login>,..."))?;
        let accession = accession.trim();
        if accession.is_empty() {
            return Err(invalid("missing study accession"));
        }

        let change = change.trim_start();
        let op = match change.chars().next() {
            Some('+') => OwnershipOp::Add,
            Some('-') => OwnershipOp::Remove,
            Some('=') => OwnershipOp::Replace,
            _ => return Err(invalid("operation must be one of '+', '-' or '='")),
        };
        let users = change[1..]
            .split(',')
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>();
        if users.is_empty() && op != OwnershipOp::Replace {
            return Err(invalid("no login given"));
        }

        Ok(Self {
            accession: accession.to_string(),
            op,
            users,
        })
    }

    /// Parse several changes
    ///
    /// # Errors
    ///
    /// Returns the first parse error.
    pub fn parse_all<S: AsRef<str>>(texts: &[S]) -> Result<Vec<Self>> {
        texts.iter().map(|t| Self::parse(t.as_ref())).collect()
    }

    /// Apply the change to the owner set
    pub fn apply_to(&self, owners: &mut BTreeSet<String>) {
        match self.op {
            OwnershipOp::Add => owners.extend(self.users.iter().cloned()),
            OwnershipOp::Remove => {
                for user in &self.users {
                    owners.remove(user);
                }
            }
            OwnershipOp::Replace => *owners = self.users.iter().cloned().collect(),
        }
    }

    /// Apply the change to the study in the store; other studies are left
    /// untouched
    ///
    /// # Errors
    ///
    /// Returns `IsaTabError::MissingValue` if the store holds no such study.
    pub fn apply(&self, store: &mut Store) -> Result<()> {
        let study = store
            .get_type_mut::<Study>(&self.accession)
            .ok_or_else(|| IsaTabError::missing_value("Study Identifier", format!("no study '{}'", self.accession)))?;
        self.apply_to(&mut study.owners);
        info!(study = %self.accession, change = %self, owners = study.owners.len(), "Changed study owners");
        Ok(())
    }
}

impl FromStr for OwnershipSpec {
    type Err = IsaTabError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl fmt::Display for OwnershipSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={}{}", self.accession, self.op.symbol(), self.users.join(","))
    }
}
