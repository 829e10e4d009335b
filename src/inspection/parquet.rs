//! Parquet files: a single table named by the schema's root message.

use std::{fs::File, path::Path};

use arrow::datatypes::{DataType, Field, Schema};
use parquet::{
    arrow::{
        ProjectionMask, arrow_reader::ParquetRecordBatchReaderBuilder, parquet_to_arrow_schema,
    },
    basic::{ConvertedType, Type as PhysicalType},
    file::reader::{FileReader, SerializedFileReader},
    schema::types::ColumnDescriptor,
};
use serde_json::Value;
use tracing::debug;

use super::{
    table_file::{BranchEntry, BranchStorage, FileFormat, LeafEntry, LeafType, TableFile, TreeRef},
    values::column_values,
};
use crate::error::{AnalyserError, Result};

const EXTENSION_NAME_KEY: &str = "ARROW:extension:name";

pub struct ParquetFile {
    /// Second handle on the same file for value reads.
    file: File,
    reader: SerializedFileReader<File>,
    /// Arrow view of the schema, if the file converts cleanly.
    arrow_schema: Option<Schema>,
}

impl ParquetFile {
    pub fn open(path: &Path) -> Result<Self> {
        let file = File::open(path)?;
        let reader = SerializedFileReader::new(file.try_clone()?)?;

        let file_metadata = reader.metadata().file_metadata();
        let arrow_schema = match parquet_to_arrow_schema(
            file_metadata.schema_descr(),
            file_metadata.key_value_metadata(),
        ) {
            Ok(schema) => Some(schema),
            Err(e) => {
                debug!(error = %e, "no arrow schema for parquet file");
                None
            }
        };

        Ok(Self {
            file,
            reader,
            arrow_schema,
        })
    }

    fn arrow_field(&self, name: &str) -> Option<&Field> {
        self.arrow_schema
            .as_ref()
            .and_then(|schema| schema.field_with_name(name).ok())
    }

    fn class_name(&self, field: &parquet::schema::types::Type) -> String {
        let arrow_field = self.arrow_field(field.name());

        if let Some(extension) = arrow_field.and_then(|f| f.metadata().get(EXTENSION_NAME_KEY)) {
            return extension.clone();
        }

        if !field.is_group() {
            return String::new();
        }

        match arrow_field {
            Some(f) => format_data_type(f.data_type()),
            None => match field.get_basic_info().converted_type() {
                ConvertedType::LIST => "List".to_string(),
                ConvertedType::MAP | ConvertedType::MAP_KEY_VALUE => "Map".to_string(),
                _ => "Struct".to_string(),
            },
        }
    }
}

/// Map a leaf column to its type code, or to its converted/physical type name.
fn leaf_type(descr: &ColumnDescriptor) -> LeafType {
    use ConvertedType as C;
    use PhysicalType as P;

    let code = match (descr.physical_type(), descr.converted_type()) {
        (P::BOOLEAN, _) => Some('O'),
        (P::FLOAT, _) => Some('F'),
        (P::DOUBLE, _) => Some('D'),
        (P::INT32, C::NONE | C::INT_32) => Some('I'),
        (P::INT32, C::UINT_32) => Some('i'),
        (P::INT32, C::INT_16) => Some('S'),
        (P::INT32, C::UINT_16) => Some('s'),
        (P::INT32, C::INT_8) => Some('B'),
        (P::INT32, C::UINT_8) => Some('b'),
        (P::INT64, C::NONE | C::INT_64) => Some('L'),
        (P::INT64, C::UINT_64) => Some('l'),
        _ => None,
    };

    match code {
        Some(code) => LeafType::Code(code),
        None => match descr.converted_type() {
            C::NONE => LeafType::Named(format!("{:?}", descr.physical_type())),
            converted => LeafType::Named(format!("{converted:?}")),
        },
    }
}

fn format_data_type(data_type: &DataType) -> String {
    match data_type {
        DataType::List(field) => format!("List<{}>", format_data_type(field.data_type())),
        DataType::LargeList(field) => format!("LargeList<{}>", format_data_type(field.data_type())),
        DataType::Struct(fields) => {
            let field_types = fields
                .iter()
                .map(|f| format!("{}: {}", f.name(), format_data_type(f.data_type())))
                .collect::<Vec<_>>()
                .join(", ");
            format!("Struct<{}>", field_types)
        }
        DataType::Map(field, _) => format!("Map<{}>", format_data_type(field.data_type())),
        _ => format!("{:?}", data_type),
    }
}

impl TableFile for ParquetFile {
    fn format(&self) -> FileFormat {
        FileFormat::Parquet
    }

    fn locate(&self, name: &str) -> Result<Option<TreeRef>> {
        let root = self.reader.metadata().file_metadata().schema_descr().name();
        if root == name {
            Ok(Some(TreeRef::new(name)))
        } else {
            debug!(requested = name, root, "parquet root message name differs");
            Ok(None)
        }
    }

    fn entries(&self, _tree: &TreeRef) -> Result<u64> {
        // parquet metadata uses i64 for counts; clamp negatives to 0
        let num_rows = self.reader.metadata().file_metadata().num_rows();
        Ok(u64::try_from(num_rows).unwrap_or(0))
    }

    fn branches(&self, _tree: &TreeRef) -> Result<Vec<BranchEntry>> {
        let schema_descr = self.reader.metadata().file_metadata().schema_descr();

        let branches = schema_descr
            .root_schema()
            .get_fields()
            .iter()
            .map(|field| {
                let leaves = schema_descr
                    .columns()
                    .iter()
                    .filter(|col| {
                        col.path().parts().first().map(String::as_str) == Some(field.name())
                    })
                    .map(|col| LeafEntry::new(col.path().parts().join("."), leaf_type(col)))
                    .collect();

                BranchEntry {
                    name: field.name().to_string(),
                    class_name: self.class_name(field),
                    title: None,
                    leaves,
                }
            })
            .collect();

        Ok(branches)
    }

    fn branch_storage(&self, _tree: &TreeRef, branch: &str) -> Result<Option<BranchStorage>> {
        let metadata = self.reader.metadata();
        let mut storage = BranchStorage {
            total_bytes: 0,
            zip_bytes: 0,
            baskets: metadata.num_row_groups(),
            basket_bytes: 0,
        };
        let mut found = false;

        for rg in metadata.row_groups() {
            let mut rg_bytes = 0;
            for col in rg.columns() {
                if col.column_path().parts().first().map(String::as_str) != Some(branch) {
                    continue;
                }
                found = true;
                let total = u64::try_from(col.uncompressed_size()).unwrap_or(0);
                rg_bytes += total;
                storage.total_bytes += total;
                storage.zip_bytes += u64::try_from(col.compressed_size()).unwrap_or(0);
            }
            storage.basket_bytes = storage.basket_bytes.max(rg_bytes);
        }

        Ok(found.then_some(storage))
    }

    fn read_branch(
        &self,
        _tree: &TreeRef,
        branch: &str,
        limit: Option<usize>,
    ) -> Result<Vec<Value>> {
        let schema_descr = self.reader.metadata().file_metadata().schema_descr();
        let root = schema_descr
            .root_schema()
            .get_fields()
            .iter()
            .position(|field| field.name() == branch)
            .ok_or_else(|| AnalyserError::BranchNotFound(branch.to_string()))?;

        let mut builder = ParquetRecordBatchReaderBuilder::try_new(self.file.try_clone()?)?;
        let mask = ProjectionMask::roots(builder.parquet_schema(), [root]);
        builder = builder.with_projection(mask);
        if let Some(limit) = limit {
            builder = builder.with_limit(limit);
        }

        let batches = builder
            .build()?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        column_values(&batches, branch)
    }

    fn close(self: Box<Self>) -> Result<()> {
        drop(self);
        Ok(())
    }
}
