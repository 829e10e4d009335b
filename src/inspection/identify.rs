//! Format detection for table files.

use std::{fs::File, io::SeekFrom, path::Path};

use anyhow::Result;

use super::{
    magic::{magic_bytes_match, magic_bytes_match_end, magic_bytes_match_start},
    table_file::FileFormat,
};

const PARQUET_MAGIC: &[u8] = b"PAR1";
const DUCKDB_MAGIC: &[u8] = b"DUCK";
/// DuckDB stores an 8-byte checksum ahead of its magic.
const DUCKDB_MAGIC_OFFSET: u64 = 8;

/// Detect the format of a table file from its magic bytes.
///
/// Returns `None` for files that are readable but not a known format.
pub fn detect_format(path: &Path) -> Result<Option<FileFormat>> {
    let mut file = File::open(path)?;

    if magic_bytes_match_start(&mut file, PARQUET_MAGIC)?
        && magic_bytes_match_end(&mut file, PARQUET_MAGIC)?
    {
        return Ok(Some(FileFormat::Parquet));
    }

    if magic_bytes_match(&mut file, SeekFrom::Start(DUCKDB_MAGIC_OFFSET), DUCKDB_MAGIC)? {
        return Ok(Some(FileFormat::DuckDb));
    }

    Ok(None)
}
