// ********* Input data structures ***********

use std::collections::HashSet;
use std::error::Error;
use std::fmt::Display;

use chrono::NaiveTime;

/// The header names of the columns the tally depends on.
///
/// Names must match the header row of the source file exactly.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ColumnNames {
    pub voter: String,
    pub timestamp: String,
    pub choice: String,
}

impl ColumnNames {
    pub fn new(voter: &str, timestamp: &str, choice: &str) -> ColumnNames {
        ColumnNames {
            voter: voter.to_string(),
            timestamp: timestamp.to_string(),
            choice: choice.to_string(),
        }
    }
}

/// Positions of the voter, timestamp and choice columns in a header row.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct Columns {
    pub voter: usize,
    pub timestamp: usize,
    pub choice: usize,
}

impl Columns {
    /// Finds each named column in the header. The first matching header wins.
    pub fn locate(names: &ColumnNames, headers: &[String]) -> Result<Columns, TallyErrors> {
        let find = |name: &String| {
            headers
                .iter()
                .position(|h| h == name)
                .ok_or_else(|| TallyErrors::MissingColumn { name: name.clone() })
        };
        Ok(Columns {
            voter: find(&names.voter)?,
            timestamp: find(&names.timestamp)?,
            choice: find(&names.choice)?,
        })
    }

    /// The minimum number of fields a row needs to carry all three columns.
    pub fn width(&self) -> usize {
        self.voter.max(self.timestamp).max(self.choice) + 1
    }
}

/// A row as read from the file, before any normalization.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawVote {
    /// 0-based position among the data rows of the file.
    pub row: usize,
    pub fields: Vec<String>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteTable {
    pub headers: Vec<String>,
    pub columns: Columns,
    pub rows: Vec<RawVote>,
}

/// A normalized vote.
///
/// `fields` still holds every column of the source row, with the voter and
/// timestamp columns replaced by their normalized renderings.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoteRecord {
    pub row: usize,
    pub voter_id: String,
    pub time: NaiveTime,
    pub choice: String,
    pub fields: Vec<String>,
}

/// The set of voters allowed to cast a vote.
///
/// Identifiers are compared case-insensitively: both the registered ids and
/// the looked-up ids are uppercased.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct AllowList {
    voters: HashSet<String>,
}

impl AllowList {
    pub fn new<I, S>(voter_ids: I) -> AllowList
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        AllowList {
            voters: voter_ids
                .into_iter()
                .map(|s| s.as_ref().to_uppercase())
                .collect(),
        }
    }

    pub fn contains(&self, voter_id: &str) -> bool {
        self.voters.contains(&voter_id.to_uppercase())
    }

    pub fn len(&self) -> usize {
        self.voters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.voters.is_empty()
    }
}

// ******** Output data structures *********

/// Votes split on allow-list membership. Both sides keep the input order.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct ValidationPartition {
    pub valid: Vec<VoteRecord>,
    pub invalid: Vec<VoteRecord>,
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct VoterCount {
    pub voter_id: String,
    pub count: u64,
}

/// Final count for one choice.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TallyRow {
    pub choice: String,
    pub total_votes: u64,
    /// 1-based position in the sorted tally.
    pub rank: u32,
}

/// Errors that prevent a vote table from being built or normalized.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TallyErrors {
    MissingColumn { name: String },
    RowTooShort { row: usize, len: usize, expected: usize },
    UnparseableTimestamp { row: usize, value: String },
}

impl Error for TallyErrors {}

impl Display for TallyErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyErrors::MissingColumn { name } => {
                write!(f, "column {:?} not found in the header", name)
            }
            TallyErrors::RowTooShort { row, len, expected } => write!(
                f,
                "row {} has {} fields, at least {} expected",
                row, len, expected
            ),
            TallyErrors::UnparseableTimestamp { row, value } => {
                write!(f, "row {}: cannot parse timestamp {:?}", row, value)
            }
        }
    }
}
