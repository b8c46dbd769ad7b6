//! Minimal CSV reading and writing for contract exports.
//!
//! Handles quoted fields, doubled quotes and CRLF line endings, which is all the
//! procurement exports use.

use std::io::{self, Write};
use std::mem::take;

/// Split CSV text into rows of fields.
///
/// Blank lines are skipped. An unterminated quote runs to the end of the input.
pub fn parse_rows(text: &str) -> Vec<Vec<String>> {
    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    // a quoted field makes the row a record even if it ends up empty
    let mut quoted = false;
    let mut chars = text.chars().peekable();

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    field.push('"');
                } else {
                    in_quotes = false;
                }
            },
            '"' if field.is_empty() => {
                in_quotes = true;
                quoted = true;
            },
            ',' if !in_quotes => row.push(take(&mut field)),
            '\n' | '\r' if !in_quotes => {
                if ch == '\r' && chars.peek() == Some(&'\n') {
                    chars.next();
                }
                row.push(take(&mut field));
                finish_row(&mut rows, &mut row, take(&mut quoted));
            },
            _ => field.push(ch),
        }
    }

    if !field.is_empty() || !row.is_empty() || quoted {
        row.push(field);
        finish_row(&mut rows, &mut row, quoted);
    }

    rows
}

/// Push `row` unless it came from a blank line.
fn finish_row(rows: &mut Vec<Vec<String>>, row: &mut Vec<String>, quoted: bool) {
    if !quoted && row.len() == 1 && row[0].is_empty() {
        row.clear();
    } else {
        rows.push(take(row));
    }
}

fn needs_quotes(field: &str) -> bool {
    field.contains([',', '"', '\n', '\r'])
}

/// Write one row, quoting fields that need it.
///
/// A row holding a single empty field is written as `""` so it does not read back as a
/// blank line.
pub fn write_row<W: Write>(mut w: W, row: &[String]) -> io::Result<()> {
    if let [only] = row
        && only.is_empty()
    {
        return w.write_all(b"\"\"\n");
    }
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            w.write_all(b",")?;
        }
        if needs_quotes(cell) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            w.write_all(cell.as_bytes())?;
        }
    }
    w.write_all(b"\n")
}
