//! Arrow schema for exported records

use std::sync::{Arc, LazyLock};

use arrow::datatypes::{DataType, Field, Schema};

/// Export columns, in the order users see them
pub static RECORDS: LazyLock<Arc<Schema>> = LazyLock::new(|| {
    Arc::new(Schema::new(vec![
        Field::new("QueryKey", DataType::Utf8, false),
        Field::new("Title", DataType::Utf8, false),
        Field::new("Authors", DataType::Utf8, false),
        Field::new("CitationCount", DataType::UInt32, false),
        // Unknown years stay null instead of a placeholder string
        Field::new("Year", DataType::Int32, true),
        Field::new("Link", DataType::Utf8, false),
    ]))
});

pub fn records() -> &'static Schema {
    &RECORDS
}
