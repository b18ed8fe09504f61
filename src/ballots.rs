use log::{debug, info, warn};

use ballot_tally::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::ballots::config_reader::*;
use crate::ballots::report::{Reporter, Severity, TextTable};

pub mod config_reader;
mod io_zip;
pub mod report;

#[derive(Debug, Snafu)]
pub enum BallotError {
    #[snafu(display("Error opening archive {path}"))]
    MissingArchive {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error reading archive {path}"))]
    OpeningArchive {
        source: zip::result::ZipError,
        path: String,
    },
    #[snafu(display("Cannot find entry {entry} in archive {path}"))]
    MissingEntry {
        source: zip::result::ZipError,
        entry: String,
        path: String,
    },
    #[snafu(display("Error reading CSV entry {entry}"))]
    CsvRead { source: csv::Error, entry: String },
    #[snafu(display("Malformed vote table in {entry}: {source}"))]
    Table { source: TallyErrors, entry: String },
    #[snafu(display("Error opening configuration file {path}"))]
    OpeningConfig {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing configuration file {path}"))]
    ParsingConfig {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error opening voter list {path}"))]
    MissingVoterList {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing voter list {path}: a list of voter ids is expected"))]
    ParsingVoterList {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error parsing voter list {path}: a list of voter ids is expected"))]
    ParsingVoterListYaml {
        source: serde_yaml::Error,
        path: String,
    },
    #[snafu(display("Error parsing voter list {path}: a voters = [...] array is expected"))]
    ParsingVoterListToml {
        source: toml::de::Error,
        path: String,
    },
    #[snafu(display("Error opening reference summary {path}"))]
    OpeningReference {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error parsing reference summary {path}"))]
    ParsingReference {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Difference detected between calculated summary and reference summary"))]
    ReferenceMismatch {},
    #[snafu(display("Error writing the report"))]
    WritingReport { source: std::io::Error },
    #[snafu(display("Error serializing the summary"))]
    SerializingSummary { source: serde_json::Error },
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ErrorKind {
    /// The archive or one of its entries cannot be found.
    InputFile,
    Configuration,
    /// Some input exists but is malformed.
    Parse,
    Mismatch,
    Output,
}

impl BallotError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            BallotError::MissingArchive { .. }
            | BallotError::OpeningArchive { .. }
            | BallotError::MissingEntry { .. }
            | BallotError::OpeningReference { .. } => ErrorKind::InputFile,
            BallotError::OpeningConfig { .. } | BallotError::MissingVoterList { .. } => {
                ErrorKind::Configuration
            }
            BallotError::CsvRead { .. }
            | BallotError::Table { .. }
            | BallotError::ParsingConfig { .. }
            | BallotError::ParsingVoterList { .. }
            | BallotError::ParsingVoterListYaml { .. }
            | BallotError::ParsingVoterListToml { .. }
            | BallotError::ParsingReference { .. } => ErrorKind::Parse,
            BallotError::ReferenceMismatch {} => ErrorKind::Mismatch,
            BallotError::WritingReport { .. } | BallotError::SerializingSummary { .. } => {
                ErrorKind::Output
            }
        }
    }

    /// The status the process exits with.
    pub fn exit_code(&self) -> i32 {
        match self.kind() {
            ErrorKind::InputFile => 1,
            ErrorKind::Configuration => 2,
            ErrorKind::Parse => 3,
            ErrorKind::Mismatch => 4,
            ErrorKind::Output => 5,
        }
    }
}

pub type BallotResult<T> = Result<T, BallotError>;

/// What a check found, stage by stage.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CheckOutcome {
    pub loaded: usize,
    pub invalid: usize,
    pub valid: usize,
    pub duplicate_voters: Vec<VoterCount>,
    pub deduplicated: usize,
    pub tally: Vec<TallyRow>,
}

fn emit(
    reporter: &mut dyn Reporter,
    severity: Severity,
    message: &str,
    table: &TextTable,
) -> BallotResult<()> {
    reporter
        .report(severity, message)
        .context(WritingReportSnafu {})?;
    reporter.table(table).context(WritingReportSnafu {})
}

/// Runs the whole check and reports every intermediate result.
///
/// All the inputs are read before anything is reported: a missing or malformed
/// file stops the check without output. Invalid and duplicate votes are
/// reported and filtered, they never stop the check.
pub fn run_check(config: &CheckConfig, reporter: &mut dyn Reporter) -> BallotResult<CheckOutcome> {
    let columns = config.column_names();
    let archive_path = config.archive_path();
    info!(
        "Attempting to read votes from {:?} entry {:?}",
        archive_path, config.entry_name
    );
    let table = io_zip::load_votes(&archive_path, &config.entry_name, &columns)?;
    let votes = normalize(&table, config.timestamp_format.as_deref()).context(TableSnafu {
        entry: config.entry_name.clone(),
    })?;
    let allow_list = read_voter_list(&config.voter_list_path())?;
    let headers = &table.headers;

    let loaded = votes.len();
    emit(
        reporter,
        Severity::Success,
        &format!("{} VOTES LOADED", loaded),
        &TextTable::from_votes(headers, &votes),
    )?;

    let partition = partition_votes(votes, &allow_list);
    emit(
        reporter,
        Severity::Error,
        &format!("{} VOTES BY INVALID VOTERS", partition.invalid.len()),
        &TextTable::from_votes(headers, &partition.invalid),
    )?;
    emit(
        reporter,
        Severity::Success,
        &format!("{} VOTES BY VALID VOTERS", partition.valid.len()),
        &TextTable::from_votes(headers, &partition.valid),
    )?;

    let duplicates = duplicate_voters(&partition.valid);
    emit(
        reporter,
        Severity::Error,
        &format!("{} VOTERS WITH DUPLICATE VOTES", duplicates.len()),
        &TextTable::from_voter_counts(&config.voter_column, &duplicates),
    )?;

    let invalid = partition.invalid.len();
    let valid = partition.valid.len();
    let kept = keep_last_vote(partition.valid);
    emit(
        reporter,
        Severity::Success,
        &format!("{} VOTES AFTER DEDUPLICATING", kept.len()),
        &TextTable::from_votes(headers, &kept),
    )?;

    let results = tally(&kept);
    reporter.separator().context(WritingReportSnafu {})?;
    reporter
        .report(Severity::Plain, "FINAL TALLY")
        .context(WritingReportSnafu {})?;
    reporter
        .table(&TextTable::from_tally(&config.choice_column, &results))
        .context(WritingReportSnafu {})?;

    Ok(CheckOutcome {
        loaded,
        invalid,
        valid,
        duplicate_voters: duplicates,
        deduplicated: kept.len(),
        tally: results,
    })
}

fn build_summary_js(config: &CheckConfig, outcome: &CheckOutcome) -> JSValue {
    let results: Vec<JSValue> = outcome
        .tally
        .iter()
        .map(|r| json!({"rank": r.rank, "choice": r.choice, "totalVotes": r.total_votes}))
        .collect();
    json!({
        "config": {
            "entryName": config.entry_name,
            "choiceColumn": config.choice_column,
        },
        "counts": {
            "loaded": outcome.loaded,
            "invalid": outcome.invalid,
            "valid": outcome.valid,
            "duplicateVoters": outcome.duplicate_voters.len(),
            "deduplicated": outcome.deduplicated,
        },
        "results": results
    })
}

/// Runs the check, then optionally prints the JSON summary and compares it
/// with a reference summary.
pub fn run_ballot_check(
    config: &CheckConfig,
    check_summary_path: Option<String>,
    print_summary: bool,
    reporter: &mut dyn Reporter,
) -> BallotResult<CheckOutcome> {
    let outcome = run_check(config, reporter)?;
    debug!("run_ballot_check: outcome: {:?}", outcome);

    let result_js = build_summary_js(config, &outcome);
    let pretty_js_stats =
        serde_json::to_string_pretty(&result_js).context(SerializingSummarySnafu {})?;
    if print_summary {
        reporter
            .report(Severity::Plain, &format!("summary:{}", pretty_js_stats))
            .context(WritingReportSnafu {})?;
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = check_summary_path {
        let summary_ref = read_reference(&summary_p)?;
        info!("reference summary: {:?}", summary_ref);
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(SerializingSummarySnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary");
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            return ReferenceMismatchSnafu {}.fail();
        }
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::io_zip::fixtures::write_archive;
    use super::report::RecordingReporter;
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const VOTES: &str = "Timestamp,Voter ID,I'm voting for
2024/02/13 9:00:00 AM GMT-5,a,Team X
2024/02/13 9:05:00 AM GMT-5,B,Team Y
2024/02/13 9:07:00 AM GMT-5,c,Team X
2024/02/13 9:10:00 AM GMT-5,A,Team Z
";

    struct Fixture {
        _archive: NamedTempFile,
        _voters: NamedTempFile,
        config: CheckConfig,
    }

    fn fixture(votes: &str, voters: &str) -> Fixture {
        let archive = write_archive(&[("Vote.csv", votes)]);
        let mut voter_file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(voter_file, "{}", voters).unwrap();
        let config = CheckConfig {
            archive_path: archive.path().display().to_string(),
            voter_list_path: voter_file.path().display().to_string(),
            ..CheckConfig::default()
        };
        Fixture {
            _archive: archive,
            _voters: voter_file,
            config,
        }
    }

    fn severities(reporter: &RecordingReporter) -> Vec<(Severity, &str)> {
        reporter
            .messages
            .iter()
            .filter(|(s, _)| *s != Severity::Info)
            .map(|(s, m)| (*s, m.as_str()))
            .collect()
    }

    #[test]
    fn full_check() {
        let f = fixture(VOTES, r#"["A", "b"]"#);
        let mut reporter = RecordingReporter::default();
        let outcome = run_check(&f.config, &mut reporter).unwrap();

        assert_eq!(outcome.loaded, 4);
        assert_eq!(outcome.invalid, 1);
        assert_eq!(outcome.valid, 3);
        assert_eq!(outcome.invalid + outcome.valid, outcome.loaded);
        assert_eq!(
            outcome.duplicate_voters,
            vec![VoterCount {
                voter_id: "A".to_string(),
                count: 2
            }]
        );
        assert_eq!(outcome.deduplicated, 2);
        let tally: Vec<(&str, u64, u32)> = outcome
            .tally
            .iter()
            .map(|r| (r.choice.as_str(), r.total_votes, r.rank))
            .collect();
        assert_eq!(tally, vec![("Team Y", 1, 1), ("Team Z", 1, 2)]);

        let separator = "-".repeat(report::SEPARATOR_WIDTH);
        assert_eq!(
            severities(&reporter),
            vec![
                (Severity::Success, "4 VOTES LOADED"),
                (Severity::Error, "1 VOTES BY INVALID VOTERS"),
                (Severity::Success, "3 VOTES BY VALID VOTERS"),
                (Severity::Error, "1 VOTERS WITH DUPLICATE VOTES"),
                (Severity::Success, "2 VOTES AFTER DEDUPLICATING"),
                (Severity::Plain, separator.as_str()),
                (Severity::Plain, "FINAL TALLY"),
            ]
        );
        // The invalid voter only shows up in the invalid votes.
        let dumps: Vec<&str> = reporter
            .messages
            .iter()
            .filter(|(s, _)| *s == Severity::Info)
            .map(|(_, m)| m.as_str())
            .collect();
        assert_eq!(dumps.len(), 6);
        assert!(dumps[1].contains(" C "));
        assert!(dumps[1].contains("09:07:00"));
        assert!(dumps.iter().skip(2).all(|d| !d.contains(" C ")));
    }

    #[test]
    fn empty_table_reports_empty_results() {
        let f = fixture("Timestamp,Voter ID,I'm voting for\n", r#"["A"]"#);
        let mut reporter = RecordingReporter::default();
        let outcome = run_check(&f.config, &mut reporter).unwrap();
        assert_eq!(outcome.loaded, 0);
        assert_eq!(outcome.invalid, 0);
        assert_eq!(outcome.valid, 0);
        assert!(outcome.duplicate_voters.is_empty());
        assert!(outcome.tally.is_empty());
    }

    #[test]
    fn check_is_idempotent() {
        let f = fixture(VOTES, r#"["A", "b", "C"]"#);
        let first = run_check(&f.config, &mut RecordingReporter::default()).unwrap();
        let second = run_check(&f.config, &mut RecordingReporter::default()).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn bad_inputs_stop_before_any_output() {
        let f = fixture(
            "Timestamp,Voter ID,I'm voting for\nsoon,A,Team X\n",
            r#"["A"]"#,
        );
        let mut reporter = RecordingReporter::default();
        let err = run_check(&f.config, &mut reporter).unwrap_err();
        assert!(matches!(err, BallotError::Table { .. }));
        assert_eq!(err.exit_code(), 3);
        assert!(reporter.messages.is_empty());

        let mut f = fixture(VOTES, r#"["A"]"#);
        f.config.voter_list_path = "/nonexistent/voters.json".to_string();
        let err = run_check(&f.config, &mut reporter).unwrap_err();
        assert_eq!(err.exit_code(), 2);
        assert!(reporter.messages.is_empty());
    }

    #[test]
    fn reference_summary() {
        let f = fixture(VOTES, r#"["A", "b"]"#);
        let outcome = run_check(&f.config, &mut RecordingReporter::default()).unwrap();
        let summary = build_summary_js(&f.config, &outcome);

        let mut good = NamedTempFile::new().unwrap();
        write!(good, "{}", summary).unwrap();
        let mut reporter = RecordingReporter::default();
        let res = run_ballot_check(
            &f.config,
            Some(good.path().display().to_string()),
            true,
            &mut reporter,
        );
        assert!(res.is_ok());
        assert!(reporter
            .messages
            .iter()
            .any(|(_, m)| m.starts_with("summary:") && m.contains("\"totalVotes\": 1")));

        let mut bad_summary = summary.clone();
        bad_summary["results"][0]["totalVotes"] = json!(7);
        let mut bad = NamedTempFile::new().unwrap();
        write!(bad, "{}", bad_summary).unwrap();
        let err = run_ballot_check(
            &f.config,
            Some(bad.path().display().to_string()),
            false,
            &mut RecordingReporter::default(),
        )
        .unwrap_err();
        assert!(matches!(err, BallotError::ReferenceMismatch {}));
        assert_eq!(err.exit_code(), 4);
    }
}
