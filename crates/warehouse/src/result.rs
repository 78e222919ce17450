use serde_json::Value;

/// A single result row: column name → JSON value, in schema order.
pub type Row = serde_json::Map<String, Value>;

/// Column definition from the result schema.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    /// Column name as declared in the result set.
    pub name: String,
    /// Standard-SQL type name (`INTEGER`, `STRING`, `RECORD`, ...).
    pub data_type: String,
    /// `NULLABLE`, `REQUIRED` or `REPEATED`.
    pub mode: String,
    /// Sub-columns of a `RECORD` / `STRUCT`.
    pub fields: Vec<Column>,
}

impl Column {
    pub fn is_repeated(&self) -> bool {
        self.mode.eq_ignore_ascii_case("REPEATED")
    }
}

/// Execution metadata for a completed query job.
#[derive(Debug, Clone, Default)]
pub struct JobMetadata {
    /// Job ID assigned by the engine (empty for jobless short queries).
    pub job_id: String,
    /// Location the job ran in, if reported.
    pub location: Option<String>,
    /// Total rows in the result as reported by the engine.
    pub total_rows: u64,
    /// Bytes processed (billed) by the job.
    pub bytes_processed: u64,
    /// Whether the result came from the engine's result cache.
    pub cache_hit: bool,
    /// Number of result pages fetched.
    pub pages: u32,
}

/// Structured result of a completed query.
///
/// Row order is the order the engine returned; every row carries the columns in schema order.
#[derive(Debug, Clone, Default)]
pub struct QueryResult {
    pub columns: Vec<Column>,
    pub rows: Vec<Row>,
    pub metadata: JobMetadata,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    /// Consumes the result, keeping only the rows.
    pub fn into_rows(self) -> Vec<Row> {
        self.rows
    }
}
