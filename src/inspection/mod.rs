//! Schema inspection for columnar table files.

pub mod analyser;
pub mod branch;
pub mod duckdb;
pub mod identify;
pub mod magic;
pub mod parquet;
pub mod table_file;
pub mod type_map;
pub mod values;

pub use analyser::{Analyser, DEFAULT_TREE_NAME, Summary};
pub use branch::{BranchInfo, BranchType};
pub use identify::detect_format;
pub use table_file::{FileFormat, TableFile};
