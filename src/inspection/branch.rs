//! Per-branch schema entries and type resolution.

use std::fmt;

use serde::Serialize;

use super::table_file::BranchEntry;

/// Where a branch's type name came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BranchType {
    /// The branch declares a class/type name of its own.
    Explicit(String),
    /// Taken from the branch's same-named leaf.
    LeafInferred(String),
    /// No declared type and no matching leaf.
    Unresolved,
}

impl BranchType {
    /// Explicit type wins over the leaf; the leaf wins over nothing.
    pub fn resolve(branch: &BranchEntry) -> Self {
        if !branch.class_name.is_empty() {
            return BranchType::Explicit(branch.class_name.clone());
        }
        match branch.leaf(&branch.name) {
            Some(leaf) => BranchType::LeafInferred(leaf.type_name().into_owned()),
            None => BranchType::Unresolved,
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            BranchType::Explicit(name) | BranchType::LeafInferred(name) => name,
            BranchType::Unresolved => "",
        }
    }
}

/// Schema entry for one branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BranchInfo {
    name: String,
    #[serde(rename = "type")]
    typename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<String>,
}

impl BranchInfo {
    pub fn new(name: impl Into<String>, typename: impl Into<String>, title: Option<String>) -> Self {
        Self {
            name: name.into(),
            typename: typename.into(),
            title,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn typename(&self) -> &str {
        &self.typename
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }
}

impl From<BranchEntry> for BranchInfo {
    fn from(entry: BranchEntry) -> Self {
        let typename = BranchType::resolve(&entry).as_str().to_string();
        Self {
            name: entry.name,
            typename,
            title: entry.title.filter(|t| !t.is_empty()),
        }
    }
}

/// Fixed-width summary row: name in 50 columns, type in 20.
impl fmt::Display for BranchInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:<50} {:<20}", self.name, self.typename)
    }
}
