//! The storage seam: what a table-file backend exposes to the analyser.

use std::borrow::Cow;

use serde::Serialize;
use serde_json::Value;

use super::type_map;
use crate::error::Result;

/// Table-file formats the analyser can open.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileFormat {
    Parquet,
    DuckDb,
}

impl std::fmt::Display for FileFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileFormat::Parquet => write!(f, "Parquet"),
            FileFormat::DuckDb => write!(f, "DuckDB"),
        }
    }
}

/// A validated reference to a table object inside an open file.
///
/// Only [`TableFile::locate`] hands these out; they are meaningless
/// without the file that produced them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRef {
    name: String,
}

impl TreeRef {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// How a leaf describes its element type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafType {
    /// A primitive type code, see [`type_map::TYPE_MAP`].
    Code(char),
    /// A backend-native type name with no code.
    Named(String),
}

/// Lowest-level scalar descriptor of a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafEntry {
    pub name: String,
    pub leaf_type: LeafType,
}

impl LeafEntry {
    pub fn new(name: impl Into<String>, leaf_type: LeafType) -> Self {
        Self {
            name: name.into(),
            leaf_type,
        }
    }

    pub fn type_name(&self) -> Cow<'_, str> {
        match &self.leaf_type {
            LeafType::Code(code) => type_map::type_name(*code),
            LeafType::Named(name) => Cow::Borrowed(name),
        }
    }
}

/// A column as the backend reports it, before type resolution.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BranchEntry {
    pub name: String,
    /// Explicit class/type name; empty when the column is not object-typed.
    pub class_name: String,
    pub title: Option<String>,
    pub leaves: Vec<LeafEntry>,
}

impl BranchEntry {
    /// Find the leaf whose name matches exactly.
    pub fn leaf(&self, name: &str) -> Option<&LeafEntry> {
        self.leaves.iter().find(|leaf| leaf.name == name)
    }
}

/// On-disk size figures for one column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BranchStorage {
    pub total_bytes: u64,
    pub zip_bytes: u64,
    pub baskets: usize,
    /// Largest uncompressed size of any single basket.
    pub basket_bytes: u64,
}

impl BranchStorage {
    pub fn compression(&self) -> f64 {
        if self.zip_bytes > 0 {
            self.total_bytes as f64 / self.zip_bytes as f64
        } else {
            0.0
        }
    }
}

/// An open table file.
///
/// Implementations own their underlying file resource and release it in
/// [`TableFile::close`] or when dropped.
pub trait TableFile {
    fn format(&self) -> FileFormat;

    /// Look up a table-shaped object by name. Returns `None` when no such
    /// object exists or it is not a table.
    fn locate(&self, name: &str) -> Result<Option<TreeRef>>;

    /// Number of records in the table.
    fn entries(&self, tree: &TreeRef) -> Result<u64>;

    /// Columns in their native declaration order.
    fn branches(&self, tree: &TreeRef) -> Result<Vec<BranchEntry>>;

    /// Size figures for one column, when the format records them.
    fn branch_storage(&self, _tree: &TreeRef, _branch: &str) -> Result<Option<BranchStorage>> {
        Ok(None)
    }

    /// Values of one top-level column in entry order, at most `limit` of them.
    fn read_branch(
        &self,
        tree: &TreeRef,
        branch: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Value>>;

    /// Release the underlying resource.
    fn close(self: Box<Self>) -> Result<()>;
}
