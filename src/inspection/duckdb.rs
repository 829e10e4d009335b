//! DuckDB database files: many named tables per file.

use std::{collections::HashMap, path::Path};

use ::duckdb::{AccessMode, Config, Connection};
use arrow::array::RecordBatch;
use pg_escape::quote_identifier;
use serde_json::Value;
use tracing::debug;

use super::{
    table_file::{BranchEntry, FileFormat, LeafEntry, LeafType, TableFile, TreeRef},
    values::column_values,
};
use crate::error::Result;

/// Temporary tables live in the `temp` catalog, outside the file.
const TABLE_TYPES: [&str; 2] = ["BASE TABLE", "VIEW"];

const LOCATE_SQL: &str = "SELECT table_type FROM information_schema.tables \
     WHERE table_catalog = current_database() \
     AND table_schema = current_schema() \
     AND table_name = ?";

const COLUMNS_SQL: &str = "SELECT column_name, data_type FROM information_schema.columns \
     WHERE table_catalog = current_database() \
     AND table_schema = current_schema() \
     AND table_name = ? \
     ORDER BY ordinal_position";

const COMMENTS_SQL: &str = "SELECT column_name, comment FROM duckdb_columns() \
     WHERE database_name = current_database() \
     AND schema_name = current_schema() \
     AND table_name = ? \
     AND comment IS NOT NULL";

pub struct DuckDbFile {
    conn: Connection,
}

impl DuckDbFile {
    /// Open an existing database read-only. Never creates a file.
    pub fn open(path: &Path) -> Result<Self> {
        let config = Config::default().access_mode(AccessMode::ReadOnly)?;
        let conn = Connection::open_with_flags(path, config)?;
        Ok(Self { conn })
    }

    fn column_comments(&self, tree: &TreeRef) -> Result<HashMap<String, String>> {
        let mut stmt = self.conn.prepare(COMMENTS_SQL)?;
        let comments = stmt
            .query_map([tree.name()], |row| Ok((row.get(0)?, row.get(1)?)))?
            .collect::<std::result::Result<HashMap<String, String>, _>>()?;
        Ok(comments)
    }
}

/// Type code for the SQL types that have one.
fn leaf_code(sql_type: &str) -> Option<char> {
    let code = match sql_type {
        "DOUBLE" => 'D',
        "FLOAT" => 'F',
        "INTEGER" => 'I',
        "UINTEGER" => 'i',
        "BIGINT" => 'L',
        "UBIGINT" => 'l',
        "SMALLINT" => 'S',
        "USMALLINT" => 's',
        "TINYINT" => 'B',
        "UTINYINT" => 'b',
        "BOOLEAN" => 'O',
        _ => return None,
    };
    Some(code)
}

/// Nested and user-shaped types are reported as a class name, not a leaf.
fn is_composite(sql_type: &str) -> bool {
    ["STRUCT(", "MAP(", "UNION(", "ENUM("]
        .iter()
        .any(|prefix| sql_type.starts_with(prefix))
        || sql_type.ends_with(']')
}

fn branch_entry(name: String, sql_type: String, title: Option<String>) -> BranchEntry {
    if is_composite(&sql_type) {
        return BranchEntry {
            name,
            class_name: sql_type,
            title,
            leaves: Vec::new(),
        };
    }

    let leaf_type = match leaf_code(&sql_type) {
        Some(code) => LeafType::Code(code),
        None => LeafType::Named(sql_type),
    };
    BranchEntry {
        leaves: vec![LeafEntry::new(name.clone(), leaf_type)],
        name,
        class_name: String::new(),
        title,
    }
}

impl TableFile for DuckDbFile {
    fn format(&self) -> FileFormat {
        FileFormat::DuckDb
    }

    fn locate(&self, name: &str) -> Result<Option<TreeRef>> {
        let mut stmt = self.conn.prepare(LOCATE_SQL)?;
        let mut rows = stmt.query([name])?;
        let Some(row) = rows.next()? else {
            return Ok(None);
        };

        let table_type: String = row.get(0)?;
        if !TABLE_TYPES.contains(&table_type.as_str()) {
            debug!(name, table_type = %table_type, "object is not table-shaped");
            return Ok(None);
        }
        Ok(Some(TreeRef::new(name)))
    }

    fn entries(&self, tree: &TreeRef) -> Result<u64> {
        let count: i64 = self.conn.query_row(
            &format!("SELECT count(*) FROM {}", quote_identifier(tree.name())),
            [],
            |row| row.get(0),
        )?;
        Ok(u64::try_from(count).unwrap_or(0))
    }

    fn branches(&self, tree: &TreeRef) -> Result<Vec<BranchEntry>> {
        let mut comments = self.column_comments(tree)?;
        let mut stmt = self.conn.prepare(COLUMNS_SQL)?;
        let columns = stmt
            .query_map([tree.name()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(columns
            .into_iter()
            .map(|(name, sql_type)| {
                let title = comments.remove(&name);
                branch_entry(name, sql_type, title)
            })
            .collect())
    }

    fn read_branch(
        &self,
        tree: &TreeRef,
        branch: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Value>> {
        let limit = limit.map(|n| format!(" LIMIT {n}")).unwrap_or_default();
        let sql = format!(
            "SELECT {} FROM {}{limit}",
            quote_identifier(branch),
            quote_identifier(tree.name())
        );
        debug!(%sql, "reading branch values");

        let mut stmt = self.conn.prepare(&sql)?;
        let batches: Vec<RecordBatch> = stmt.query_arrow([])?.collect();
        column_values(&batches, branch)
    }

    fn close(self: Box<Self>) -> Result<()> {
        self.conn.close().map_err(|(_, e)| e)?;
        Ok(())
    }
}
