//! Per-entry column values, decoded from Arrow record batches.

use arrow::{array::RecordBatch, json::LineDelimitedWriter};
use serde_json::{Map, Value};

use crate::error::Result;

/// Values of column `name` across `batches`, one per row. A null becomes
/// [`Value::Null`].
pub fn column_values<'a>(
    batches: impl IntoIterator<Item = &'a RecordBatch>,
    name: &str,
) -> Result<Vec<Value>> {
    let mut values = Vec::new();

    for batch in batches {
        if batch.num_rows() == 0 {
            continue;
        }

        let mut buf = Vec::new();
        let mut writer = LineDelimitedWriter::new(&mut buf);
        writer.write(batch)?;
        writer.finish()?;
        drop(writer);

        // the writer leaves null fields out of each row object
        for line in buf.split(|b| *b == b'\n').filter(|line| !line.is_empty()) {
            let mut row: Map<String, Value> = serde_json::from_slice(line)?;
            values.push(row.remove(name).unwrap_or(Value::Null));
        }
    }

    Ok(values)
}
