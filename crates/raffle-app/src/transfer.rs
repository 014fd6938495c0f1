// CSV import of rosters and export of winner history.

use std::io::{Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::warn;

use raffle_core::model::Winner;

#[derive(Debug, thiserror::Error)]
pub enum TransferError {
    #[error("failed to access file {path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("CSV error in {path}: {source}")]
    Csv { path: String, source: csv::Error },

    #[error("{path} has no `name` column")]
    MissingNameColumn { path: String },
}

const EXPORT_HEADER: [&str; 4] = ["order", "name", "prize", "timestamp"];

#[derive(Debug, Serialize)]
struct WinnerRow<'a> {
    order: usize,
    name: &'a str,
    prize: &'a str,
    timestamp: String,
}

#[derive(Debug, Deserialize)]
struct RawRosterRow {
    #[serde(alias = "Name", alias = "NAME")]
    name: String,
}

// ---------------------------------------------------------------------------
// Reader/writer based (testable without temp files)
// ---------------------------------------------------------------------------

/// Write `winners` (most recent first) as CSV in draw order: `order` 1 is
/// the oldest winner.
pub fn write_winners<W: Write>(writer: W, winners: &[Winner]) -> Result<usize, csv::Error> {
    let mut wtr = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(writer);
    wtr.write_record(EXPORT_HEADER)?;
    for (i, w) in winners.iter().rev().enumerate() {
        wtr.serialize(WinnerRow {
            order: i + 1,
            name: &w.name,
            prize: &w.prize_name,
            timestamp: w.timestamp_rfc3339(),
        })?;
    }
    wtr.flush()?;
    Ok(winners.len())
}

/// Whether a header row has a usable name column.
fn has_name_column(headers: &csv::StringRecord) -> bool {
    headers.iter().any(|h| matches!(h.trim(), "name" | "Name" | "NAME"))
}

/// Read participant names from CSV with a `name` column. Extra columns are
/// ignored; malformed and blank rows are skipped.
///
/// Returns `Ok(None)` when there is no name column at all.
pub fn read_roster_names<R: Read>(rdr: R) -> Result<Option<Vec<String>>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    if !has_name_column(reader.headers()?) {
        return Ok(None);
    }

    let mut names = Vec::new();
    for result in reader.deserialize::<RawRosterRow>() {
        match result {
            Ok(row) if row.name.trim().is_empty() => {}
            Ok(row) => names.push(row.name),
            Err(e) => warn!("skipping malformed roster row: {}", e),
        }
    }
    Ok(Some(names))
}

// ---------------------------------------------------------------------------
// Path based
// ---------------------------------------------------------------------------

/// Export winner history to `path`, replacing any existing file.
pub fn export_winners(path: &Path, winners: &[Winner]) -> Result<usize, TransferError> {
    let display = path.display().to_string();
    let file = std::fs::File::create(path).map_err(|e| TransferError::Io {
        path: display.clone(),
        source: e,
    })?;
    write_winners(file, winners).map_err(|e| TransferError::Csv {
        path: display,
        source: e,
    })
}

/// Read participant names from the CSV file at `path`.
pub fn import_roster(path: &Path) -> Result<Vec<String>, TransferError> {
    let display = path.display().to_string();
    let file = std::fs::File::open(path).map_err(|e| TransferError::Io {
        path: display.clone(),
        source: e,
    })?;
    read_roster_names(file)
        .map_err(|e| TransferError::Csv {
            path: display.clone(),
            source: e,
        })?
        .ok_or(TransferError::MissingNameColumn { path: display })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn winner(name: &str, prize: &str, timestamp: i64) -> Winner {
        Winner {
            id: format!("id-{name}"),
            name: name.into(),
            prize_name: prize.into(),
            timestamp,
        }
    }

    fn export_to_string(winners: &[Winner]) -> String {
        let mut buf = Vec::new();
        write_winners(&mut buf, winners).unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn export_lists_oldest_first() {
        let winners = vec![winner("Bob", "Gold", 2_000), winner("Alice", "Silver", 1_000)];
        let text = export_to_string(&winners);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "order,name,prize,timestamp");
        assert_eq!(lines[1], "1,Alice,Silver,1970-01-01T00:00:01.000Z");
        assert_eq!(lines[2], "2,Bob,Gold,1970-01-01T00:00:02.000Z");
    }

    #[test]
    fn export_with_no_winners_has_header_only() {
        assert_eq!(export_to_string(&[]), "order,name,prize,timestamp\n");
    }

    #[test]
    fn export_quotes_names_with_commas() {
        let text = export_to_string(&[winner("Doe, Jane", "Gold", 0)]);
        assert!(text.contains("\"Doe, Jane\""));
    }

    #[test]
    fn roster_import_reads_name_column() {
        let csv = "id,name,table\n1,Alice,3\n2,  Bob  ,4\n3,,5\n";
        let names = read_roster_names(csv.as_bytes()).unwrap().unwrap();
        assert_eq!(names, vec!["Alice", "Bob"]);
    }

    #[test]
    fn roster_import_accepts_capitalized_header() {
        let names = read_roster_names("Name\nCarol\n".as_bytes()).unwrap().unwrap();
        assert_eq!(names, vec!["Carol"]);
    }

    #[test]
    fn roster_import_without_name_column() {
        assert!(read_roster_names("email\na@b.c\n".as_bytes()).unwrap().is_none());
    }

    #[test]
    fn file_round_trip_through_disk() {
        let dir = std::env::temp_dir().join(format!("raffle_transfer_{}", std::process::id()));
        let _ = std::fs::remove_dir_all(&dir);
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("winners.csv");

        let written = export_winners(&path, &[winner("Eve", "Gold", 0)]).unwrap();
        assert_eq!(written, 1);
        // The export has a `name` column, so it doubles as a roster file.
        assert_eq!(import_roster(&path).unwrap(), vec!["Eve"]);

        let missing = import_roster(&dir.join("nope.csv")).unwrap_err();
        assert!(matches!(missing, TransferError::Io { .. }));
        let _ = std::fs::remove_dir_all(&dir);
    }
}
