// Reading the votes out of a zipped CSV export.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use ballot_tally::builder::TableBuilder;
use zip::ZipArchive;

use crate::ballots::*;

/// Opens the archive, finds the named CSV entry in it and reads it as a vote table.
pub fn load_votes(path: &Path, entry_name: &str, names: &ColumnNames) -> BallotResult<VoteTable> {
    let p = path.display().to_string();
    let file = File::open(path).context(MissingArchiveSnafu { path: p.clone() })?;
    let mut archive = ZipArchive::new(file).context(OpeningArchiveSnafu { path: p.clone() })?;
    debug!(
        "load_votes: archive {:?} entries: {:?}",
        p,
        archive.file_names().collect::<Vec<&str>>()
    );
    let entry = archive.by_name(entry_name).context(MissingEntrySnafu {
        entry: entry_name,
        path: p,
    })?;
    read_vote_table(entry, entry_name, names)
}

/// Reads a CSV with a header row. The rows are kept in file order.
///
/// Rows may be shorter than the header, the missing trailing fields are empty.
/// A row that stops before the voter, timestamp or choice column is an error.
pub fn read_vote_table<R: Read>(
    reader: R,
    entry_name: &str,
    names: &ColumnNames,
) -> BallotResult<VoteTable> {
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);
    let headers: Vec<String> = rdr
        .headers()
        .context(CsvReadSnafu { entry: entry_name })?
        .iter()
        // Spreadsheet exports may start with a byte order mark.
        .map(|h| h.trim_start_matches('\u{feff}').to_string())
        .collect();
    debug!("read_vote_table: header: {:?}", headers);

    let mut builder =
        TableBuilder::new(headers.as_slice(), names).context(TableSnafu { entry: entry_name })?;
    for (idx, line_r) in rdr.records().enumerate() {
        let line = line_r.context(CsvReadSnafu { entry: entry_name })?;
        // The header is line 1.
        debug!("read_vote_table: lineno: {:?} row: {:?}", idx + 2, line);
        builder
            .add_row(line.iter().map(|s| s.to_string()).collect())
            .context(TableSnafu { entry: entry_name })?;
    }
    let table = builder.build();
    info!("read_vote_table: {:?} rows read from {:?}", table.rows.len(), entry_name);
    Ok(table)
}

#[cfg(test)]
pub(crate) mod fixtures {
    use std::io::Write;
    use tempfile::NamedTempFile;
    use zip::write::SimpleFileOptions;
    use zip::CompressionMethod;

    /// Writes a zip archive with the given (name, content) entries.
    pub fn write_archive(entries: &[(&str, &str)]) -> NamedTempFile {
        let mut tmp = NamedTempFile::new().unwrap();
        {
            let mut zip = zip::ZipWriter::new(tmp.as_file_mut());
            let options = SimpleFileOptions::default().compression_method(CompressionMethod::Stored);
            for (name, content) in entries.iter() {
                zip.start_file(*name, options).unwrap();
                zip.write_all(content.as_bytes()).unwrap();
            }
            zip.finish().unwrap();
        }
        tmp
    }
}
