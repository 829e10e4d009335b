//! Schema inspection for one named tree inside a table file.

use std::{
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use super::{
    branch::BranchInfo,
    duckdb::DuckDbFile,
    identify::detect_format,
    parquet::ParquetFile,
    table_file::{FileFormat, TableFile, TreeRef},
};
use crate::error::{AnalyserError, Result};

/// Tree name used when none is given.
pub const DEFAULT_TREE_NAME: &str = "tree";

const RULE_WIDTH: usize = 80;

/// The open file together with the tree located in it.
struct OpenTree {
    file: Box<dyn TableFile>,
    tree: TreeRef,
}

/// Owns one open table file and answers schema queries about one tree in it.
///
/// The file is released by [`Analyser::close`] or, failing that, on drop.
/// Once closed, every query fails with [`AnalyserError::InvalidState`].
pub struct Analyser {
    file_path: PathBuf,
    tree_name: String,
    open: Option<OpenTree>,
}

/// Snapshot of a tree's schema.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub file: String,
    pub tree: String,
    pub format: FileFormat,
    pub entries: u64,
    pub branches: Vec<BranchInfo>,
}

impl Summary {
    pub fn render(&self, out: &mut dyn Write) -> io::Result<()> {
        writeln!(out, "File: {}", self.file)?;
        writeln!(out, "Tree: {}", self.tree)?;
        writeln!(out, "Entries: {}", self.entries)?;
        writeln!(out, "Branches: {}", self.branches.len())?;
        writeln!(out, "\nBranch Information:")?;
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(out, "{:<50} {:<20}", "Name", "Type")?;
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
        for branch in &self.branches {
            writeln!(out, "{}", branch)?;
        }
        Ok(())
    }
}

fn release(file: Box<dyn TableFile>) {
    if let Err(e) = file.close() {
        warn!(error = %e, "failed to close table file");
    }
}

impl Analyser {
    /// Open `file_path` and locate `tree_name` in it.
    ///
    /// Fails with [`AnalyserError::FileOpen`] if the file cannot be opened as
    /// a table file, and [`AnalyserError::TableNotFound`] if it holds no such
    /// tree. The file is closed again before either error is returned.
    pub fn open(file_path: impl AsRef<Path>, tree_name: &str) -> Result<Self> {
        let path = file_path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(AnalyserError::file_open(path, "empty file path"));
        }

        let format = detect_format(path)
            .map_err(|e| AnalyserError::file_open(path, e))?
            .ok_or_else(|| AnalyserError::file_open(path, "not a Parquet or DuckDB file"))?;
        debug!(path = %path.display(), %format, "opening table file");

        let file: Box<dyn TableFile> = match format {
            FileFormat::Parquet => {
                Box::new(ParquetFile::open(path).map_err(|e| AnalyserError::file_open(path, e))?)
            }
            FileFormat::DuckDb => {
                Box::new(DuckDbFile::open(path).map_err(|e| AnalyserError::file_open(path, e))?)
            }
        };

        Self::from_table_file(path, tree_name, file)
    }

    /// Open `file_path` and locate the [`DEFAULT_TREE_NAME`] tree.
    pub fn open_default(file_path: impl AsRef<Path>) -> Result<Self> {
        Self::open(file_path, DEFAULT_TREE_NAME)
    }

    /// Wrap an already-open table file, locating `tree_name` in it.
    pub fn from_table_file(
        file_path: impl Into<PathBuf>,
        tree_name: &str,
        file: Box<dyn TableFile>,
    ) -> Result<Self> {
        let file_path = file_path.into();

        let tree = match file.locate(tree_name) {
            Ok(Some(tree)) => tree,
            Ok(None) => {
                release(file);
                return Err(AnalyserError::TableNotFound {
                    tree: tree_name.to_string(),
                    path: file_path,
                });
            }
            Err(e) => {
                release(file);
                return Err(e);
            }
        };
        debug!(tree = tree.name(), "located tree");

        Ok(Self {
            file_path,
            tree_name: tree_name.to_string(),
            open: Some(OpenTree { file, tree }),
        })
    }

    fn state(&self, operation: &'static str) -> Result<&OpenTree> {
        self.open
            .as_ref()
            .ok_or(AnalyserError::InvalidState(operation))
    }

    pub fn file_path(&self) -> &Path {
        &self.file_path
    }

    pub fn tree_name(&self) -> &str {
        &self.tree_name
    }

    pub fn is_open(&self) -> bool {
        self.open.is_some()
    }

    pub fn format(&self) -> Result<FileFormat> {
        Ok(self.state("read format")?.file.format())
    }

    /// Number of entries in the tree.
    pub fn entries(&self) -> Result<u64> {
        let open = self.state("count entries")?;
        open.file.entries(&open.tree)
    }

    /// Branches in the tree's native order.
    ///
    /// Each call reads the schema afresh, so repeated calls on an unchanged
    /// file yield the same sequence.
    pub fn branches(&self) -> Result<Vec<BranchInfo>> {
        let open = self.state("list branches")?;
        let branches: Vec<BranchInfo> = open
            .file
            .branches(&open.tree)?
            .into_iter()
            .map(BranchInfo::from)
            .collect();
        debug!(count = branches.len(), "enumerated branches");
        Ok(branches)
    }

    pub fn branch_names(&self) -> Result<Vec<String>> {
        Ok(self
            .branches()?
            .into_iter()
            .map(|b| b.name().to_string())
            .collect())
    }

    /// Look up one branch by name. Unknown names yield `None`.
    pub fn branch_info(&self, name: &str) -> Result<Option<BranchInfo>> {
        Ok(self.branches()?.into_iter().find(|b| b.name() == name))
    }

    /// Read the values of one branch in entry order, at most `max_entries`
    /// of them. `None` reads every entry.
    pub fn branch_data(&self, name: &str, max_entries: Option<usize>) -> Result<Vec<Value>> {
        let open = self.state("read branch data")?;
        if !open.file.branches(&open.tree)?.iter().any(|b| b.name == name) {
            return Err(AnalyserError::BranchNotFound(name.to_string()));
        }

        let values = open.file.read_branch(&open.tree, name, max_entries)?;
        debug!(branch = name, count = values.len(), "read branch values");
        Ok(values)
    }

    pub fn summary(&self) -> Result<Summary> {
        Ok(Summary {
            file: self.file_path.display().to_string(),
            tree: self.tree_name.clone(),
            format: self.format()?,
            entries: self.entries()?,
            branches: self.branches()?,
        })
    }

    /// Write the summary report. Nothing is written unless the whole
    /// summary could be gathered.
    pub fn render_summary(&self, out: &mut dyn Write) -> Result<()> {
        let summary = self.summary()?;
        summary.render(out)?;
        Ok(())
    }

    pub fn print_summary(&self) -> Result<()> {
        let mut out = io::stdout().lock();
        self.render_summary(&mut out)?;
        out.flush()?;
        Ok(())
    }

    /// Write storage statistics for one branch.
    pub fn render_branch_stats(&self, out: &mut dyn Write, name: &str) -> Result<()> {
        let info = self
            .branch_info(name)?
            .ok_or_else(|| AnalyserError::BranchNotFound(name.to_string()))?;
        let open = self.state("read branch statistics")?;
        let storage = open.file.branch_storage(&open.tree, name)?;
        let entries = self.entries()?;

        writeln!(out, "\nBranch Statistics for '{}':", name)?;
        writeln!(out, "{}", "-".repeat(RULE_WIDTH))?;
        writeln!(out, "{:<16}{}", "Type:", info.typename())?;
        writeln!(out, "{:<16}{}", "Title:", info.title().unwrap_or_default())?;
        writeln!(out, "{:<16}{}", "Entries:", entries)?;
        match storage {
            Some(storage) => {
                writeln!(out, "{:<16}{} bytes", "Total Size:", storage.total_bytes)?;
                writeln!(out, "{:<16}{} bytes", "File Size:", storage.zip_bytes)?;
                writeln!(out, "{:<16}{:.2}", "Compression:", storage.compression())?;
                writeln!(out, "{:<16}{}", "Baskets:", storage.baskets)?;
                writeln!(out, "{:<16}{} bytes", "Basket Size:", storage.basket_bytes)?;
            }
            None => {
                writeln!(
                    out,
                    "{:<16}not available for {} files",
                    "Storage:",
                    open.file.format()
                )?;
            }
        }
        Ok(())
    }

    pub fn print_branch_stats(&self, name: &str) -> Result<()> {
        let mut out = io::stdout().lock();
        self.render_branch_stats(&mut out, name)?;
        out.flush()?;
        Ok(())
    }

    /// Release the file. Closing an already-closed analyser does nothing.
    pub fn close(&mut self) -> Result<()> {
        match self.open.take() {
            Some(open) => {
                debug!(path = %self.file_path.display(), "closing table file");
                open.file.close()
            }
            None => Ok(()),
        }
    }
}

impl Drop for Analyser {
    fn drop(&mut self) {
        if let Some(open) = self.open.take() {
            release(open.file);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::rc::Rc;

    use super::*;
    use crate::{
        inspection::table_file::{BranchEntry, LeafEntry, LeafType},
        utils::test_helpers::FakeTableFile,
    };
    use tempfile::tempdir;

    fn scalar(name: &str, code: char) -> BranchEntry {
        BranchEntry {
            name: name.to_string(),
            leaves: vec![LeafEntry::new(name, LeafType::Code(code))],
            ..Default::default()
        }
    }

    fn fake_tree() -> FakeTableFile {
        let object = BranchEntry {
            name: "track".to_string(),
            class_name: "MyClass".to_string(),
            leaves: vec![LeafEntry::new("track", LeafType::Code('I'))],
            ..Default::default()
        };
        let split = BranchEntry {
            name: "hits".to_string(),
            leaves: vec![LeafEntry::new("hits.n", LeafType::Code('I'))],
            ..Default::default()
        };
        FakeTableFile::new(
            "tree",
            1000,
            vec![scalar("x", 'D'), scalar("flag", 'O'), object, split],
        )
    }

    fn open_fake(fake: FakeTableFile) -> Analyser {
        Analyser::from_table_file("fake.parquet", "tree", Box::new(fake)).unwrap()
    }

    #[test]
    fn test_entries_and_branches() {
        let analyser = open_fake(fake_tree());
        assert_eq!(analyser.entries().unwrap(), 1000);

        let branches = analyser.branches().unwrap();
        let resolved: Vec<(&str, &str)> = branches
            .iter()
            .map(|b| (b.name(), b.typename()))
            .collect();
        assert_eq!(
            resolved,
            [("x", "f64"), ("flag", "bool"), ("track", "MyClass"), ("hits", "")]
        );
    }

    #[test]
    fn test_enumeration_is_restartable() {
        let analyser = open_fake(fake_tree());
        assert_eq!(analyser.branches().unwrap(), analyser.branches().unwrap());
    }

    #[test]
    fn test_branch_lookup() {
        let analyser = open_fake(fake_tree());
        assert_eq!(analyser.branch_names().unwrap(), ["x", "flag", "track", "hits"]);
        assert_eq!(
            analyser.branch_info("flag").unwrap().unwrap().typename(),
            "bool"
        );
        assert!(analyser.branch_info("nope").unwrap().is_none());
    }

    #[test]
    fn test_missing_tree_closes_file() {
        let fake = fake_tree();
        let closes = Rc::clone(&fake.closes);

        let err = Analyser::from_table_file("fake.parquet", "events", Box::new(fake))
            .err()
            .unwrap();
        assert!(matches!(err, AnalyserError::TableNotFound { ref tree, .. } if tree == "events"));
        assert_eq!(*closes.borrow(), 1);
    }

    #[test]
    fn test_close_is_idempotent() {
        let fake = fake_tree();
        let closes = Rc::clone(&fake.closes);
        let mut analyser = open_fake(fake);

        analyser.close().unwrap();
        analyser.close().unwrap();
        assert!(!analyser.is_open());
        drop(analyser);
        assert_eq!(*closes.borrow(), 1);
    }

    #[test]
    fn test_queries_after_close_fail() {
        let mut analyser = open_fake(fake_tree());
        analyser.close().unwrap();

        assert!(matches!(
            analyser.entries(),
            Err(AnalyserError::InvalidState(_))
        ));
        assert!(matches!(
            analyser.branches(),
            Err(AnalyserError::InvalidState(_))
        ));

        let mut out = Vec::new();
        assert!(matches!(
            analyser.render_summary(&mut out),
            Err(AnalyserError::InvalidState(_))
        ));
        assert!(out.is_empty());
    }

    #[test]
    fn test_drop_releases_file() {
        let fake = fake_tree();
        let closes = Rc::clone(&fake.closes);
        {
            let _analyser = open_fake(fake);
            assert_eq!(*closes.borrow(), 0);
        }
        assert_eq!(*closes.borrow(), 1);
    }

    #[test]
    fn test_render_summary() {
        let analyser = open_fake(fake_tree());
        let mut out = Vec::new();
        analyser.render_summary(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();

        assert_eq!(lines[0], "File: fake.parquet");
        assert_eq!(lines[1], "Tree: tree");
        assert_eq!(lines[2], "Entries: 1000");
        assert_eq!(lines[3], "Branches: 4");
        assert_eq!(lines[4], "");
        assert_eq!(lines[5], "Branch Information:");
        assert_eq!(lines[6], "-".repeat(80));
        assert_eq!(lines[7], format!("{:<50} {:<20}", "Name", "Type"));
        assert_eq!(lines[8], "-".repeat(80));
        assert_eq!(lines[9], format!("{:<50} {:<20}", "x", "f64"));
        assert_eq!(lines[10], format!("{:<50} {:<20}", "flag", "bool"));
        assert_eq!(lines[11], format!("{:<50} {:<20}", "track", "MyClass"));
        assert_eq!(lines[12], format!("{:<50} {:<20}", "hits", ""));
        assert_eq!(lines.len(), 13);
    }

    #[test]
    fn test_branch_data() {
        let analyser = open_fake(fake_tree());
        let all = analyser.branch_data("x", None).unwrap();
        assert_eq!(all.len(), 1000);
        assert_eq!(all[999], Value::from(999));

        let first = analyser.branch_data("flag", Some(3)).unwrap();
        assert_eq!(first, [Value::from(0), Value::from(1), Value::from(2)]);

        assert_eq!(analyser.branch_data("x", Some(5000)).unwrap().len(), 1000);
        assert!(analyser.branch_data("x", Some(0)).unwrap().is_empty());
    }

    #[test]
    fn test_branch_data_errors() {
        let mut analyser = open_fake(fake_tree());
        assert!(matches!(
            analyser.branch_data("nope", None),
            Err(AnalyserError::BranchNotFound(ref name)) if name == "nope"
        ));

        analyser.close().unwrap();
        assert!(matches!(
            analyser.branch_data("x", None),
            Err(AnalyserError::InvalidState(_))
        ));
    }

    #[test]
    fn test_branch_stats_without_storage() {
        let analyser = open_fake(fake_tree());
        let mut out = Vec::new();
        analyser.render_branch_stats(&mut out, "x").unwrap();
        let text = String::from_utf8(out).unwrap();

        assert!(text.contains("Branch Statistics for 'x':"));
        assert!(text.contains("Type:           f64"));
        assert!(text.contains("Entries:        1000"));
        assert!(text.contains("not available"));
    }

    #[test]
    fn test_branch_stats_unknown_branch() {
        let analyser = open_fake(fake_tree());
        let mut out = Vec::new();
        let err = analyser.render_branch_stats(&mut out, "nope").unwrap_err();
        assert!(matches!(err, AnalyserError::BranchNotFound(ref name) if name == "nope"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_open_missing_file() {
        let dir = tempdir().unwrap();
        let err = Analyser::open(dir.path().join("absent.parquet"), "tree")
            .err()
            .unwrap();
        assert!(matches!(err, AnalyserError::FileOpen { .. }));
    }

    #[test]
    fn test_open_empty_path() {
        let err = Analyser::open("", "tree").err().unwrap();
        assert!(matches!(err, AnalyserError::FileOpen { .. }));
    }

    #[test]
    fn test_open_unrecognised_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        std::fs::write(&path, "x,flag\n1.0,true\n").unwrap();

        let err = Analyser::open(&path, "tree").err().unwrap();
        assert!(err.to_string().contains("not a Parquet or DuckDB file"));
    }
}
