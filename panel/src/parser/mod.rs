//! Raw snapshot reader with encoding and delimiter auto-detection.
//!
//! A snapshot is the CSV written by [`crate::artifacts::ArtifactWriter::write_raw`]
//! (or any CSV with the same columns). Reading one lets the pipeline run
//! offline against a saved export.

use serde_json::{Map, Value};
use std::path::Path;

use crate::error::{CsvError, CsvResult};
use crate::models::RawRecord;

/// Columns a snapshot cannot do without.
pub const REQUIRED_COLUMNS: &[&str] = &["date", "source"];

/// A parsed snapshot with detection metadata.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub records: Vec<RawRecord>,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
    pub headers: Vec<String>,
}

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Detect the encoding of raw bytes.
///
/// Valid UTF-8 is always UTF-8; chardet only guesses for everything else.
pub fn detect_encoding(bytes: &[u8]) -> String {
    let body = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    if std::str::from_utf8(body).is_ok() {
        return "utf-8".to_string();
    }

    let charset = chardet::detect(bytes).0;

    match charset.to_lowercase().as_str() {
        "ascii" | "utf-8" | "utf8" | "" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string. Unknown encodings fall back to lossy UTF-8.
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8_lossy(bytes).into_owned(),
    }
}

/// Detect the delimiter by counting occurrences in the first line
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let mut best_sep = ',';
    let mut best_count = 0;

    for sep in [',', ';', '\t', '|'] {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

/// Printable delimiter name for logs.
pub fn delimiter_label(d: char) -> &'static str {
    match d {
        ';' => ";",
        ',' => ",",
        '\t' => "TAB",
        '|' => "|",
        _ => "?",
    }
}

/// Parse CSV text into string-valued JSON objects keyed by header.
///
/// Empty lines are skipped; short rows read missing cells as empty.
pub fn csv_to_json(content: &str, delimiter: char) -> CsvResult<(Vec<String>, Vec<Value>)> {
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .trim(csv::Trim::All)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader.headers()?.iter().map(|h| h.to_string()).collect();
    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::EmptyFile);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = result?;
        if record.iter().all(|cell| cell.is_empty()) {
            continue;
        }

        let mut obj = Map::new();
        for (i, header) in headers.iter().enumerate() {
            let cell = record.get(i).unwrap_or("");
            obj.insert(header.clone(), Value::String(cell.to_string()));
        }
        rows.push(Value::Object(obj));
    }

    Ok((headers, rows))
}

/// Parse snapshot bytes with auto-detection of encoding and delimiter.
pub fn parse_snapshot_bytes(bytes: &[u8]) -> CsvResult<Snapshot> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Err(CsvError::EmptyFile);
    }

    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let content = content.trim_start_matches('\u{feff}');
    let delimiter = detect_delimiter(content);

    let (headers, rows) = csv_to_json(content, delimiter)?;

    for column in REQUIRED_COLUMNS {
        let present = headers.iter().any(|h| h == *column)
            || (*column == "source" && headers.iter().any(|h| h == "source_tag"));
        if !present {
            return Err(CsvError::MissingColumn(column.to_string()));
        }
    }

    let records = rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            // +1 for the header, +1 for 1-based lines
            RawRecord::from_json(row).map_err(|e| CsvError::ParseError(format!("row {}: {}", i + 2, e)))
        })
        .collect::<CsvResult<Vec<_>>>()?;

    Ok(Snapshot {
        records,
        encoding,
        delimiter,
        headers,
    })
}

/// Read a snapshot file with detection metadata.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> CsvResult<Snapshot> {
    let bytes = std::fs::read(path.as_ref())?;
    parse_snapshot_bytes(&bytes)
}

/// Read the raw records of a snapshot file.
pub fn read_snapshot<P: AsRef<Path>>(path: P) -> CsvResult<Vec<RawRecord>> {
    Ok(load_snapshot(path)?.records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SNAPSHOT: &str = "date,source,impressions,clicks,spend,event_name,event_count,is_conversion_event,medium,sessions,revenue_amount
2025-01-05,google,1000,20,15.5,,,,,,
2025-01-05,googleanalytics4,0,0,0,purchase,3,true,,,
2025-01-05,googleanalytics4,0,0,0,,,,organic,42,
";

    #[test]
    fn test_parse_snapshot() {
        let snapshot = parse_snapshot_bytes(SNAPSHOT.as_bytes()).unwrap();

        assert_eq!(snapshot.delimiter, ',');
        assert_eq!(snapshot.records.len(), 3);

        let paid = &snapshot.records[0];
        assert_eq!(paid.date, NaiveDate::from_ymd_opt(2025, 1, 5).unwrap());
        assert_eq!(paid.source_tag, "google");
        assert_eq!(paid.spend, 15.5);
        assert_eq!(paid.event_name, None);

        let event = &snapshot.records[1];
        assert_eq!(event.event_name.as_deref(), Some("purchase"));
        assert_eq!(event.is_conversion_event, Some(true));
        assert_eq!(event.event_count, Some(3.0));

        assert_eq!(snapshot.records[2].sessions, Some(42.0));
        assert_eq!(snapshot.records[2].medium.as_deref(), Some("organic"));
    }

    #[test]
    fn test_semicolon_snapshot() {
        let csv = "date;source;spend\n2025-01-05;facebook;3,5\n";
        // "3,5" is not a number: decimal commas are rejected, not guessed.
        let err = parse_snapshot_bytes(csv.as_bytes()).unwrap_err();
        assert!(matches!(err, CsvError::ParseError(ref m) if m.contains("row 2")));

        let csv = "date;source;spend\n2025-01-05;facebook;3.5\n";
        let snapshot = parse_snapshot_bytes(csv.as_bytes()).unwrap();
        assert_eq!(snapshot.delimiter, ';');
        assert_eq!(snapshot.records[0].spend, 3.5);
    }

    #[test]
    fn test_quoted_cells_and_blank_lines() {
        let csv = "date,source,event_name\n\"2025-01-05\",\"googleanalytics4\",\"sign up, newsletter\"\n\n";
        let snapshot = parse_snapshot_bytes(csv.as_bytes()).unwrap();
        assert_eq!(snapshot.records.len(), 1);
        assert_eq!(snapshot.records[0].event_name.as_deref(), Some("sign up, newsletter"));
    }

    #[test]
    fn test_missing_required_column() {
        let err = parse_snapshot_bytes(b"date,spend\n2025-01-05,1\n").unwrap_err();
        assert!(matches!(err, CsvError::MissingColumn(ref c) if c == "source"));
    }

    #[test]
    fn test_empty_file() {
        assert!(matches!(parse_snapshot_bytes(b""), Err(CsvError::EmptyFile)));
        assert!(matches!(parse_snapshot_bytes(b"\n \n"), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_header_only_has_no_records() {
        let snapshot = parse_snapshot_bytes(b"date,source\n").unwrap();
        assert!(snapshot.records.is_empty());
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a\tb\tc\n1\t2\t3"), '\t');
        assert_eq!(detect_delimiter("a|b|c\n1|2|3"), '|');
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_accented_utf8_is_not_taken_for_latin1() {
        let bytes = "date,source,event_name\n2025-01-05,googleanalytics4,café\n".as_bytes();
        assert_eq!(detect_encoding(bytes), "utf-8");

        let mut with_bom = b"\xEF\xBB\xBF".to_vec();
        with_bom.extend_from_slice(bytes);
        let snapshot = parse_snapshot_bytes(&with_bom).unwrap();
        assert_eq!(snapshot.encoding, "utf-8");
        assert_eq!(snapshot.headers[0], "date");
        assert_eq!(snapshot.records[0].event_name.as_deref(), Some("café"));
    }

    #[test]
    fn test_read_snapshot_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("raw_export.csv");
        std::fs::write(&path, SNAPSHOT).unwrap();

        let records = read_snapshot(&path).unwrap();
        assert_eq!(records.len(), 3);
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let result = read_snapshot("/definitely/not/here.csv");
        assert!(matches!(result, Err(CsvError::IoError(_))));
    }
}
