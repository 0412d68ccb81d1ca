use std::borrow::Cow;
use std::fs::File;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder};

use super::{Target, TargetSet};
use crate::error::{Error, Result};

fn field(record: &ByteRecord, index: usize) -> Cow<'_, str> {
    record
        .get(index)
        .map(String::from_utf8_lossy)
        .unwrap_or(Cow::Borrowed(""))
}

fn column_index(headers: &ByteRecord, column: &str, path: &Path) -> Result<usize> {
    headers
        .iter()
        .position(|name| {
            String::from_utf8_lossy(name)
                .trim_start_matches('\u{feff}')
                .trim()
                == column
        })
        .ok_or_else(|| Error::MissingColumn {
            path: path.to_path_buf(),
            column: column.to_string(),
        })
}

/// Load the labeled corpus from a CSV file with a header row.
///
/// Rows with an empty URL are skipped. Invalid UTF-8 is decoded lossily rather than
/// rejected, since URL corpora scraped from the wild routinely contain it.
/// A missing file, a missing column or a corpus without a single usable row are all
/// fatal: a run without targets has nothing to measure.
pub fn load_targets(path: &Path, url_column: &str, label_column: &str) -> Result<TargetSet> {
    let file = File::open(path).map_err(|source| Error::TargetSourceUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let csv_error = |source| Error::TargetSource {
        path: path.to_path_buf(),
        source,
    };

    let mut reader = ReaderBuilder::new().flexible(true).from_reader(file);
    let headers = reader.byte_headers().map_err(csv_error)?.clone();
    let url_index = column_index(&headers, url_column, path)?;
    let label_index = column_index(&headers, label_column, path)?;

    let mut targets = Vec::new();
    for record in reader.byte_records() {
        let record = record.map_err(csv_error)?;
        let url = field(&record, url_index);
        let url = url.trim();
        if url.is_empty() {
            continue;
        }
        targets.push(Target::from_labeled(url, &field(&record, label_index)));
    }

    if targets.is_empty() {
        return Err(Error::NoTargets {
            path: path.to_path_buf(),
        });
    }

    log::info!("Loaded {} URLs from {}", targets.len(), path.display());
    Ok(TargetSet::new(targets))
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;
    use crate::targets::Category;

    fn write_csv(contents: &[u8]) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().expect("temp file");
        file.write_all(contents).expect("write csv");
        file
    }

    #[test]
    fn test_load_targets() {
        let file = write_csv(
            b"original_url,label,extra\n\
              good.example,benign,x\n\
              http://bad.example/path?a=1,Phishing,y\n\
              ,benign,z\n\
              \"quoted.example/a,b\",BENIGN,w\n",
        );

        let targets = load_targets(file.path(), "original_url", "label").expect("targets");
        assert_eq!(targets.len(), 3);
        assert_eq!(targets[0].url, "good.example");
        assert_eq!(targets[0].expected_category, Category::Benign);
        assert_eq!(targets[1].url, "http://bad.example/path?a=1");
        assert_eq!(targets[1].expected_category, Category::Malicious);
        assert_eq!(targets[1].label, "phishing");
        assert_eq!(targets[2].url, "quoted.example/a,b");
        assert_eq!(targets[2].expected_category, Category::Benign);
    }

    #[test]
    fn test_short_rows_and_invalid_utf8() {
        let file = write_csv(b"label,original_url\nbenign\nmalware,bad\xff.example\n");

        let targets = load_targets(file.path(), "original_url", "label").expect("targets");
        assert_eq!(targets.len(), 1);
        assert_eq!(targets[0].url, "bad\u{fffd}.example");
        assert_eq!(targets[0].expected_category, Category::Malicious);
    }

    #[test]
    fn test_missing_file_is_unavailable() {
        let dir = tempfile::tempdir().expect("temp dir");
        let err = load_targets(&dir.path().join("nope.csv"), "original_url", "label")
            .expect_err("missing file");
        assert!(matches!(err, Error::TargetSourceUnavailable { .. }));
    }

    #[test]
    fn test_missing_column() {
        let file = write_csv(b"url,label\ngood.example,benign\n");
        let err = load_targets(file.path(), "original_url", "label").expect_err("no column");
        assert!(matches!(err, Error::MissingColumn { ref column, .. } if column == "original_url"));
    }

    #[test]
    fn test_no_usable_rows() {
        let file = write_csv(b"original_url,label\n  ,benign\n");
        let err = load_targets(file.path(), "original_url", "label").expect_err("empty");
        assert!(matches!(err, Error::NoTargets { .. }));
    }
}
