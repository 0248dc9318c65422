//! Delimited-text writing for reports and scraped listings

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::Path;

fn needs_quotes(field: &str, sep: char) -> bool {
    field.contains(sep) || field.contains('"') || field.contains('\n') || field.contains('\r')
}

/// Write a single row to any writer
pub fn write_row<W, S>(mut w: W, row: &[S], sep: char) -> io::Result<()>
where
    W: Write,
    S: AsRef<str>,
{
    for (i, cell) in row.iter().enumerate() {
        if i > 0 {
            write!(w, "{}", sep)?;
        }
        let cell = cell.as_ref();
        if needs_quotes(cell, sep) {
            write!(w, "\"{}\"", cell.replace('"', "\"\""))?;
        } else {
            write!(w, "{}", cell)?;
        }
    }
    writeln!(w)
}

/// Write a header row followed by data rows to a new comma-separated file
pub fn write_table<S: AsRef<str>>(path: &Path, headers: &[S], rows: &[Vec<String>]) -> io::Result<()> {
    let mut w = BufWriter::new(File::create(path)?);
    write_row(&mut w, headers, ',')?;
    for row in rows {
        write_row(&mut w, row, ',')?;
    }
    w.flush()
}
