//! Lenient CSV tables.
//!
//! Feed members are parsed into header-addressed string rows without any
//! type validation. Coercion to numbers happens where values are used.

use std::collections::HashMap;

use tracing::debug;

use super::error::FeedError;

/// One parsed feed member: a header row plus string data rows.
#[derive(Debug, Clone, Default)]
pub struct Table {
    columns: HashMap<String, usize>,
    width: usize,
    rows: Vec<Vec<String>>,
}

impl Table {
    /// Parse CSV text.
    ///
    /// - headers are trimmed (and a leading BOM removed)
    /// - a row with fewer fields than headers is skipped
    /// - a row with more fields keeps only the leading ones
    /// - blank lines are ignored
    pub fn parse(name: &str, text: &str) -> Result<Self, FeedError> {
        let mut reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::Headers)
            .from_reader(text.as_bytes());

        let headers = reader.headers().map_err(|e| FeedError::Parse {
            table: name.to_string(),
            message: e.to_string(),
        })?;

        let headers: Vec<String> = headers
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        if headers.iter().all(String::is_empty) {
            return Err(FeedError::Parse {
                table: name.to_string(),
                message: "missing header row".to_string(),
            });
        }

        let width = headers.len();
        let mut columns = HashMap::with_capacity(width);
        for (idx, header) in headers.into_iter().enumerate() {
            // First occurrence wins for duplicated headers
            columns.entry(header).or_insert(idx);
        }

        let mut rows: Vec<Vec<String>> = Vec::new();
        let mut skipped = 0usize;
        for record in reader.records() {
            let record = match record {
                Ok(record) => record,
                Err(_) => {
                    skipped += 1;
                    continue;
                }
            };
            if record.len() < width {
                skipped += 1;
                continue;
            }
            rows.push(record.iter().take(width).map(str::to_string).collect());
        }

        if skipped > 0 {
            debug!(table = name, skipped, "skipped short or unreadable rows");
        }

        Ok(Self {
            columns,
            width,
            rows,
        })
    }

    /// Number of data rows kept.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Number of header columns.
    pub fn width(&self) -> usize {
        self.width
    }

    pub fn has_column(&self, column: &str) -> bool {
        self.columns.contains_key(column)
    }

    pub fn rows(&self) -> impl Iterator<Item = Row<'_>> {
        self.rows.iter().map(move |values| Row {
            columns: &self.columns,
            values,
        })
    }
}

/// A borrowed view of one data row.
#[derive(Debug, Clone, Copy)]
pub struct Row<'a> {
    columns: &'a HashMap<String, usize>,
    values: &'a [String],
}

impl<'a> Row<'a> {
    /// Value of a column, or `None` if the table has no such column.
    pub fn get(&self, column: &str) -> Option<&'a str> {
        let idx = *self.columns.get(column)?;
        self.values.get(idx).map(String::as_str)
    }

    /// Value of a column, empty if the column is absent.
    pub fn str(&self, column: &str) -> &'a str {
        self.get(column).unwrap_or("")
    }

    /// Non-empty value of a column.
    pub fn non_empty(&self, column: &str) -> Option<&'a str> {
        self.get(column).filter(|v| !v.trim().is_empty())
    }

    /// Column parsed as a float; NaN when absent or non-numeric.
    pub fn f64(&self, column: &str) -> f64 {
        self.get(column)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(f64::NAN)
    }
}
