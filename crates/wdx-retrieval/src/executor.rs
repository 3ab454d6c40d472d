//! Structured query execution with row capping and tabular encoding.
//!
//! The query string goes to the backend verbatim; the backend's own row
//! order (including any ORDER BY in the query) is authoritative and is
//! preserved through truncation. Encoding is semicolon-delimited text with
//! a leading row-index column, quoted so that cells containing the
//! delimiter or embedded newlines round-trip through a standard CSV parser.

use tracing::debug;

use wdx_client::SparqlBackend;
use wdx_core::{QueryResultSet, Result, WdxError};

/// Field delimiter of the tabular encoding.
pub const DELIMITER: char = ';';

/// Execute `query` and truncate the result to the first `max_rows` rows.
///
/// # Errors
///
/// A non-positive `max_rows` is a validation error, not a value to clamp.
/// Backend failures keep their taxonomy: `Validation` for queries the
/// service rejected as malformed, `Timeout` for deadline overruns,
/// `Backend` otherwise.
pub async fn execute<B>(backend: &B, query: &str, max_rows: i64) -> Result<QueryResultSet>
where
    B: SparqlBackend + ?Sized,
{
    if max_rows < 1 {
        return Err(WdxError::Validation(format!(
            "row cap must be a positive integer, got {max_rows}"
        )));
    }

    let mut result = backend.run_query(query).await?;
    let cap = usize::try_from(max_rows).unwrap_or(usize::MAX);
    if result.rows.len() > cap {
        debug!(returned = result.rows.len(), cap, "truncating query result");
        result.rows.truncate(cap);
    }
    Ok(result)
}

/// Encode a result set as delimited text: a header row with an unnamed
/// index column, then one numbered row per result row.
#[must_use]
pub fn encode_delimited(result: &QueryResultSet) -> String {
    let mut out = String::new();
    push_row(
        &mut out,
        std::iter::once("").chain(result.columns.iter().map(String::as_str)),
    );
    for (i, row) in result.rows.iter().enumerate() {
        let index = i.to_string();
        push_row(
            &mut out,
            std::iter::once(index.as_str()).chain(row.iter().map(String::as_str)),
        );
    }
    out
}

fn push_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(DELIMITER);
        }
        push_cell(out, cell);
    }
    out.push('\n');
}

fn push_cell(out: &mut String, cell: &str) {
    if cell.contains([DELIMITER, '"', '\n', '\r']) {
        out.push('"');
        out.push_str(&cell.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(cell);
    }
}
