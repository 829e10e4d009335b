use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use anyhow::Result;

/// Check for `expected` at `pos`, restoring the read position afterwards.
pub fn magic_bytes_match(file: &mut File, pos: SeekFrom, expected: &[u8]) -> Result<bool> {
    let len = file.metadata()?.len();
    let needed = match pos {
        SeekFrom::Start(offset) => offset.saturating_add(expected.len() as u64),
        _ => expected.len() as u64,
    };
    if len < needed {
        return Ok(false);
    }

    let restore_to = file.stream_position()?;
    let mut buf = vec![0u8; expected.len()];
    file.seek(pos)?;
    file.read_exact(&mut buf)?;
    file.seek(SeekFrom::Start(restore_to))?;

    Ok(buf == expected)
}

pub fn magic_bytes_match_start(file: &mut File, expected: &[u8]) -> Result<bool> {
    magic_bytes_match(file, SeekFrom::Start(0), expected)
}

pub fn magic_bytes_match_end(file: &mut File, expected: &[u8]) -> Result<bool> {
    let expected_len: i64 = expected.len().try_into()?;
    magic_bytes_match(file, SeekFrom::End(-expected_len), expected)
}
