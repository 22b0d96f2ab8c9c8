//! Filesystem object store.

use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use arrow::array::{ArrayRef, Float64Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use parquet::arrow::ArrowWriter;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::info;

use fundos_core::{AggregatedRecord, OutputColumns, OutputField, OutputValue};
use fundos_traits::{SinkWriter, TraitError};

/// Serialization format of stored objects.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TargetFormat {
    /// Apache Parquet, one row group per object.
    #[default]
    Parquet,
    /// Comma-delimited with a header row.
    Csv,
    /// `{"columns": [...], "data": {column: [values...]}}`.
    JsonColumns,
}

impl TargetFormat {
    /// File extension, including the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            TargetFormat::Parquet => ".parquet",
            TargetFormat::Csv => ".csv",
            TargetFormat::JsonColumns => ".json",
        }
    }
}

// =============================================================================
// FILE OBJECT STORE
// =============================================================================

/// Stores each object as a file under a root directory.
///
/// Keys are relative paths; missing parent directories are created.
#[derive(Debug, Clone)]
pub struct FileObjectStore {
    root: PathBuf,
    format: TargetFormat,
    columns: OutputColumns,
}

impl FileObjectStore {
    /// Create a store writing `columns` in `format` under `root`.
    pub fn new(root: impl AsRef<Path>, format: TargetFormat, columns: OutputColumns) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
            format,
            columns,
        }
    }

    /// Root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Output format.
    pub fn format(&self) -> TargetFormat {
        self.format
    }

    /// Path an object key resolves to.
    pub fn object_path(&self, key: &str) -> Result<PathBuf, TraitError> {
        let relative = Path::new(key);
        let escapes = relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
        if key.is_empty() || escapes {
            return Err(TraitError::InvalidInput(format!(
                "object key '{key}' must be a relative path inside the store"
            )));
        }
        Ok(self.root.join(relative))
    }
}

impl SinkWriter for FileObjectStore {
    fn write(&self, rows: &[AggregatedRecord], key: &str) -> Result<(), TraitError> {
        let path = self.object_path(key)?;
        let bytes = encode_rows(rows, &self.columns, self.format)?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| TraitError::io(parent.display(), &e))?;
        }
        std::fs::write(&path, &bytes).map_err(|e| TraitError::io(path.display(), &e))?;

        info!(
            key,
            rows = rows.len(),
            bytes = bytes.len(),
            format = ?self.format,
            "stored object"
        );
        Ok(())
    }

    fn extension(&self) -> &str {
        self.format.extension()
    }
}

// =============================================================================
// ENCODING
// =============================================================================

/// Serializes rows with the given column layout.
pub fn encode_rows(
    rows: &[AggregatedRecord],
    columns: &OutputColumns,
    format: TargetFormat,
) -> Result<Vec<u8>, TraitError> {
    match format {
        TargetFormat::Parquet => encode_parquet(rows, columns),
        TargetFormat::Csv => encode_csv(rows, columns),
        TargetFormat::JsonColumns => encode_json_columns(rows, columns),
    }
}

/// Text columns are nullable UTF-8, the percentage is a non-null `f64`.
/// Non-finite percentages are stored as their IEEE 754 values.
fn encode_parquet(
    rows: &[AggregatedRecord],
    columns: &OutputColumns,
) -> Result<Vec<u8>, TraitError> {
    let ser = |e: &dyn std::fmt::Display| TraitError::SerializationError(e.to_string());

    let mut fields = Vec::with_capacity(columns.len());
    let mut arrays: Vec<ArrayRef> = Vec::with_capacity(columns.len());
    for (name, field) in columns.iter() {
        if field == OutputField::Percentage {
            fields.push(Field::new(name, DataType::Float64, false));
            arrays.push(Arc::new(Float64Array::from_iter_values(
                rows.iter().map(|r| r.percentage_of_fund),
            )));
        } else {
            let values: Vec<Option<&str>> = rows
                .iter()
                .map(|r| match r.value(field) {
                    OutputValue::Text(text) => text,
                    OutputValue::Number(_) => None,
                })
                .collect();
            fields.push(Field::new(name, DataType::Utf8, true));
            arrays.push(Arc::new(StringArray::from(values)));
        }
    }

    let schema = Arc::new(Schema::new(fields));
    let batch = RecordBatch::try_new(schema.clone(), arrays).map_err(|e| ser(&e))?;

    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, schema, None).map_err(|e| ser(&e))?;
    writer.write(&batch).map_err(|e| ser(&e))?;
    writer.close().map_err(|e| ser(&e))?;
    Ok(buf)
}

fn encode_csv(rows: &[AggregatedRecord], columns: &OutputColumns) -> Result<Vec<u8>, TraitError> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    let ser = |e: csv::Error| TraitError::SerializationError(e.to_string());

    writer.write_record(columns.names()).map_err(ser)?;
    for row in rows {
        let cells = columns.iter().map(|(_, field)| match row.value(field) {
            OutputValue::Text(text) => text.unwrap_or_default().to_string(),
            // Display already renders NaN, inf and -inf
            OutputValue::Number(n) => n.to_string(),
        });
        writer.write_record(cells).map_err(ser)?;
    }

    writer
        .into_inner()
        .map_err(|e| TraitError::SerializationError(e.to_string()))
}

fn encode_json_columns(
    rows: &[AggregatedRecord],
    columns: &OutputColumns,
) -> Result<Vec<u8>, TraitError> {
    let mut data = Map::new();
    for (name, field) in columns.iter() {
        let values: Vec<Value> = rows
            .iter()
            .map(|row| match row.value(field) {
                OutputValue::Text(text) => text.map_or(Value::Null, |t| Value::String(t.into())),
                OutputValue::Number(n) if n.is_finite() => json!(n),
                OutputValue::Number(_) => Value::Null,
            })
            .collect();
        data.insert(name.to_string(), Value::Array(values));
    }

    let document = json!({
        "columns": columns.names(),
        "data": data,
    });
    serde_json::to_vec(&document).map_err(|e| TraitError::SerializationError(e.to_string()))
}
