//! Fixtures shared by unit tests.

use std::{cell::RefCell, fs::File, path::Path, rc::Rc, sync::Arc};

use duckdb::Connection;
use parquet::{
    data_type::{BoolType, DoubleType},
    file::writer::SerializedFileWriter,
    schema::parser::parse_message_type,
};

use serde_json::Value;

use crate::{
    error::{AnalyserError, Result},
    inspection::table_file::{BranchEntry, FileFormat, TableFile, TreeRef},
};

/// Write a parquet file whose root message is `tree` with `x: double` and
/// `flag: boolean` columns.
pub fn write_tree_parquet(path: &Path, rows: usize) {
    let schema = Arc::new(
        parse_message_type(
            "message tree {
                required double x;
                required boolean flag;
            }",
        )
        .unwrap(),
    );
    let xs: Vec<f64> = (0..rows).map(|i| i as f64 * 0.5).collect();
    let flags: Vec<bool> = (0..rows).map(|i| i % 2 == 0).collect();

    let file = File::create(path).unwrap();
    let mut writer = SerializedFileWriter::new(file, schema, Default::default()).unwrap();
    let mut row_group = writer.next_row_group().unwrap();

    let mut col = row_group.next_column().unwrap().unwrap();
    col.typed::<DoubleType>().write_batch(&xs, None, None).unwrap();
    col.close().unwrap();

    let mut col = row_group.next_column().unwrap().unwrap();
    col.typed::<BoolType>().write_batch(&flags, None, None).unwrap();
    col.close().unwrap();

    row_group.close().unwrap();
    writer.close().unwrap();
}

/// Write a DuckDB database with a `tree` table of `x DOUBLE, flag BOOLEAN`.
pub fn write_tree_duckdb(path: &Path, rows: usize) {
    let conn = Connection::open(path).unwrap();
    conn.execute_batch(&format!(
        "CREATE TABLE tree (x DOUBLE, flag BOOLEAN);
         INSERT INTO tree SELECT i * 0.5, i % 2 = 0 FROM range({rows}) t(i);"
    ))
    .unwrap();
    drop(conn);
}

/// In-memory table file with a single table.
pub struct FakeTableFile {
    pub tree: String,
    pub entries: u64,
    pub branches: Vec<BranchEntry>,
    /// Number of times `close` ran.
    pub closes: Rc<RefCell<usize>>,
}

impl FakeTableFile {
    pub fn new(tree: &str, entries: u64, branches: Vec<BranchEntry>) -> Self {
        Self {
            tree: tree.to_string(),
            entries,
            branches,
            closes: Rc::new(RefCell::new(0)),
        }
    }
}

impl TableFile for FakeTableFile {
    fn format(&self) -> FileFormat {
        FileFormat::Parquet
    }

    fn locate(&self, name: &str) -> Result<Option<TreeRef>> {
        Ok((name == self.tree).then(|| TreeRef::new(name)))
    }

    fn entries(&self, _tree: &TreeRef) -> Result<u64> {
        Ok(self.entries)
    }

    fn branches(&self, _tree: &TreeRef) -> Result<Vec<BranchEntry>> {
        Ok(self.branches.clone())
    }

    /// Every branch holds the entry numbers `0..entries`.
    fn read_branch(
        &self,
        _tree: &TreeRef,
        branch: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Value>> {
        if !self.branches.iter().any(|b| b.name == branch) {
            return Err(AnalyserError::BranchNotFound(branch.to_string()));
        }
        let count = limit.map_or(self.entries, |n| self.entries.min(n as u64));
        Ok((0..count).map(Value::from).collect())
    }

    fn close(self: Box<Self>) -> Result<()> {
        *self.closes.borrow_mut() += 1;
        Ok(())
    }
}
