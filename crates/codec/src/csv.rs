//! Line-oriented CSV encode/decode for inventory snapshots.
//!
//! The wire format is fixed by the files already out in the field: a single
//! `id,name,price,quantity` header, one record per line, prices rendered with
//! two decimal places, fields trimmed on read, and **no quoting** — a comma
//! inside `name` cannot survive a round trip. Swapping in a quoting encoder
//! would silently change the on-disk contract, so the limitation stays.

use stockroom_core::Record;
use thiserror::Error;

/// Fixed header line, field names in order.
pub const HEADER: &str = "id,name,price,quantity";

/// Number of fields a data line must yield when split on `,`.
const FIELD_COUNT: usize = 4;

/// Decode failure for a single line.
///
/// Fatal to the enclosing import: the decode stream yields the error and
/// nothing after it. `line` is 1-based and counts the header.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CodecError {
    #[error("line {line}: expected 4 fields, found {found}")]
    FieldCount { line: usize, found: usize },

    #[error("line {line}: invalid {field} {value:?}")]
    InvalidField {
        line: usize,
        field: &'static str,
        value: String,
    },
}

impl CodecError {
    /// 1-based line number of the offending line.
    pub fn line(&self) -> usize {
        match self {
            CodecError::FieldCount { line, .. } => *line,
            CodecError::InvalidField { line, .. } => *line,
        }
    }
}

/// Encode a snapshot to the wire format, ordered by ascending id.
///
/// The input order does not matter; export determinism comes from sorting
/// here, not from the store.
pub fn encode(records: &[Record]) -> String {
    let mut ordered: Vec<&Record> = records.iter().collect();
    ordered.sort_by_key(|r| r.id);

    let mut out = String::with_capacity(HEADER.len() + 1 + records.len() * 32);
    out.push_str(HEADER);
    out.push('\n');
    for record in ordered {
        out.push_str(&format!(
            "{},{},{:.2},{}\n",
            record.id, record.name, record.unit_price, record.quantity
        ));
    }
    out
}

/// Decode a whole document.
///
/// Convenience form of [`records`]; stops at the first malformed line and
/// returns its error.
pub fn decode(input: &str) -> Result<Vec<Record>, CodecError> {
    records(input).collect()
}

/// Streaming per-line decode.
///
/// Skips exactly one header line and ignores blank lines. Import consumes
/// this lazily and applies each record to the store before pulling the next,
/// which is what makes a mid-file failure leave the earlier lines applied
/// (import is not transactional).
pub fn records(input: &str) -> Records<'_> {
    let mut lines = input.lines().enumerate();
    lines.next();
    Records { lines }
}

/// Iterator over decoded records, created by [`records`].
#[derive(Debug, Clone)]
pub struct Records<'a> {
    lines: core::iter::Enumerate<core::str::Lines<'a>>,
}

impl Iterator for Records<'_> {
    type Item = Result<Record, CodecError>;

    fn next(&mut self) -> Option<Self::Item> {
        for (index, raw) in self.lines.by_ref() {
            let line = raw.trim();
            if line.is_empty() {
                continue;
            }
            return Some(parse_line(line, index + 1));
        }
        None
    }
}

fn parse_line(line: &str, number: usize) -> Result<Record, CodecError> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != FIELD_COUNT {
        return Err(CodecError::FieldCount {
            line: number,
            found: fields.len(),
        });
    }

    let invalid = |field: &'static str, value: &str| CodecError::InvalidField {
        line: number,
        field,
        value: value.to_string(),
    };

    let id = fields[0]
        .trim()
        .parse()
        .map_err(|_| invalid("id", fields[0]))?;
    let name = fields[1].trim().to_string();
    let unit_price: f64 = fields[2]
        .trim()
        .parse()
        .map_err(|_| invalid("price", fields[2]))?;
    let quantity: u32 = fields[3]
        .trim()
        .parse()
        .map_err(|_| invalid("quantity", fields[3]))?;

    Ok(Record {
        id,
        name,
        unit_price,
        quantity,
    })
}
