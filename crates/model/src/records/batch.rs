use crate::records::row::RowData;

/// A chunk of transformed rows bound for a single destination table.
#[derive(Debug, Clone)]
pub struct Batch {
    pub id: String,
    pub seq: usize,
    pub table: String,
    pub rows: Vec<RowData>, // already transformed
    pub ts: chrono::DateTime<chrono::Utc>,
}

impl Batch {
    pub fn new(table: &str, seq: usize, rows: Vec<RowData>) -> Self {
        Batch {
            id: format!("{table}-{seq}"),
            seq,
            table: table.to_string(),
            rows,
            ts: chrono::Utc::now(),
        }
    }

    /// Splits `rows` into consecutive batches of at most `size` rows.
    /// A `size` of zero is treated as one.
    pub fn split(table: &str, rows: Vec<RowData>, size: usize) -> Vec<Batch> {
        let size = size.max(1);
        let mut batches = Vec::with_capacity(rows.len().div_ceil(size));
        let mut rows = rows.into_iter().peekable();
        let mut seq = 0;

        while rows.peek().is_some() {
            seq += 1;
            let chunk: Vec<RowData> = rows.by_ref().take(size).collect();
            batches.push(Batch::new(table, seq, chunk));
        }

        batches
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }
}
