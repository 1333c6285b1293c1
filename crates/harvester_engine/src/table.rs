//! Minimal RFC 4180 tables: what shard files and author lists are made of.
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("unterminated quoted field starting on line {line}")]
    UnterminatedQuote { line: usize },
    #[error("unexpected character after closing quote on line {line}")]
    StrayQuote { line: usize },
    #[error("table has no header row")]
    MissingHeader,
}

/// Append one row to `out`, quoting cells that need it, terminated by `\r\n`.
pub fn write_row<S: AsRef<str>>(out: &mut String, cells: &[S]) {
    for (i, cell) in cells.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        let cell = cell.as_ref();
        if cell.contains([',', '"', '\n', '\r']) {
            out.push('"');
            out.push_str(&cell.replace('"', "\"\""));
            out.push('"');
        } else {
            out.push_str(cell);
        }
    }
    out.push_str("\r\n");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FieldStart,
    Unquoted,
    Quoted,
    QuoteInQuoted,
}

/// Split `text` into rows of cells. Blank lines are skipped; a leading BOM is ignored.
pub fn parse_rows(text: &str) -> Result<Vec<Vec<String>>, TableError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut field = String::new();
    let mut state = State::FieldStart;
    let mut line = 1;
    let mut quote_line = 1;

    for ch in text.chars() {
        match (state, ch) {
            (State::Quoted, '"') => state = State::QuoteInQuoted,
            (State::Quoted, ch) => {
                if ch == '\n' {
                    line += 1;
                }
                field.push(ch);
            }
            (State::QuoteInQuoted, '"') => {
                field.push('"');
                state = State::Quoted;
            }
            (State::FieldStart, '"') => {
                state = State::Quoted;
                quote_line = line;
            }
            (_, ',') => {
                row.push(std::mem::take(&mut field));
                state = State::FieldStart;
            }
            (_, '\n') => {
                row.push(std::mem::take(&mut field));
                end_row(&mut row, &mut rows);
                state = State::FieldStart;
                line += 1;
            }
            (_, '\r') => {}
            (State::QuoteInQuoted, _) => return Err(TableError::StrayQuote { line }),
            (_, ch) => {
                field.push(ch);
                state = State::Unquoted;
            }
        }
    }

    if state == State::Quoted {
        return Err(TableError::UnterminatedQuote { line: quote_line });
    }
    if !(state == State::FieldStart && row.is_empty() && field.is_empty()) {
        row.push(field);
        end_row(&mut row, &mut rows);
    }
    Ok(rows)
}

fn end_row(row: &mut Vec<String>, rows: &mut Vec<Vec<String>>) {
    let row = std::mem::take(row);
    if !(row.len() == 1 && row[0].is_empty()) {
        rows.push(row);
    }
}

/// A parsed table with its header split off.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Table {
    pub header: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl Table {
    pub fn parse(text: &str) -> Result<Self, TableError> {
        let mut rows = parse_rows(text)?.into_iter();
        let header = rows
            .next()
            .ok_or(TableError::MissingHeader)?
            .into_iter()
            .map(|name| name.trim().to_string())
            .collect();
        Ok(Self {
            header,
            rows: rows.collect(),
        })
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.header.iter().position(|column| column == name)
    }

    /// Cells of one column; short rows are skipped.
    pub fn column(&self, index: usize) -> impl Iterator<Item = &str> + '_ {
        self.rows
            .iter()
            .filter_map(move |row| row.get(index).map(String::as_str))
    }
}
