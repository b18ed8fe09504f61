mod config;
mod timestamp;
pub mod builder;
use log::{debug, info};

use std::collections::{BTreeMap, HashMap};

pub use crate::config::*;
pub use crate::timestamp::TIME_FORMAT;

/// Normalizes every row of the table.
///
/// Voter ids are uppercased so that comparisons are case-insensitive, and the
/// timestamps are reduced to their time of day. No row is dropped: the output has
/// the same length and order as the table.
///
/// Arguments:
/// * `table` the table as loaded from the file
/// * `timestamp_format` an optional chrono format tried before the built-in ones
pub fn normalize(
    table: &VoteTable,
    timestamp_format: Option<&str>,
) -> Result<Vec<VoteRecord>, TallyErrors> {
    info!(
        "Normalizing {:?} rows, columns: {:?}, timestamp format: {:?}",
        table.rows.len(),
        table.columns,
        timestamp_format
    );
    let cols = table.columns;
    let mut res: Vec<VoteRecord> = Vec::with_capacity(table.rows.len());
    for raw in table.rows.iter() {
        let field = |idx: usize| {
            raw.fields
                .get(idx)
                .cloned()
                .ok_or(TallyErrors::RowTooShort {
                    row: raw.row,
                    len: raw.fields.len(),
                    expected: cols.width(),
                })
        };
        let voter_id = field(cols.voter)?.to_uppercase();
        let stamp = field(cols.timestamp)?;
        let choice = field(cols.choice)?;
        let time = timestamp::parse_time_of_day(&stamp, timestamp_format).ok_or_else(|| {
            TallyErrors::UnparseableTimestamp {
                row: raw.row,
                value: stamp.clone(),
            }
        })?;

        let mut fields = raw.fields.clone();
        fields[cols.voter] = voter_id.clone();
        fields[cols.timestamp] = time.format(TIME_FORMAT).to_string();
        debug!("normalize: row {:?}: {:?} -> {:?}", raw.row, stamp, time);
        res.push(VoteRecord {
            row: raw.row,
            voter_id,
            time,
            choice,
            fields,
        });
    }
    Ok(res)
}

/// Splits the votes on allow-list membership.
pub fn partition_votes(votes: Vec<VoteRecord>, allow_list: &AllowList) -> ValidationPartition {
    let (valid, invalid): (Vec<VoteRecord>, Vec<VoteRecord>) = votes
        .into_iter()
        .partition(|v| allow_list.contains(&v.voter_id));
    debug!(
        "partition_votes: {:?} valid, {:?} invalid, allow list size: {:?}",
        valid.len(),
        invalid.len(),
        allow_list.len()
    );
    ValidationPartition { valid, invalid }
}

/// Number of votes cast by each voter, ordered by voter id.
pub fn count_votes_per_voter(votes: &[VoteRecord]) -> Vec<VoterCount> {
    let mut counts: BTreeMap<&str, u64> = BTreeMap::new();
    for v in votes.iter() {
        *counts.entry(v.voter_id.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .map(|(voter_id, count)| VoterCount {
            voter_id: voter_id.to_string(),
            count,
        })
        .collect()
}

/// The voters that cast more than one vote.
pub fn duplicate_voters(votes: &[VoteRecord]) -> Vec<VoterCount> {
    count_votes_per_voter(votes)
        .into_iter()
        .filter(|vc| vc.count > 1)
        .collect()
}

/// Keeps only the last vote of each voter.
///
/// File order stands for submission order, so the last occurrence is the most
/// recent one. Survivors keep the position of that last occurrence.
pub fn keep_last_vote(votes: Vec<VoteRecord>) -> Vec<VoteRecord> {
    let last_seen: HashMap<String, usize> = votes
        .iter()
        .enumerate()
        .map(|(idx, v)| (v.voter_id.clone(), idx))
        .collect();
    let res: Vec<VoteRecord> = votes
        .into_iter()
        .enumerate()
        .filter(|(idx, v)| last_seen.get(&v.voter_id) == Some(idx))
        .map(|(_, v)| v)
        .collect();
    debug!("keep_last_vote: {:?} votes kept", res.len());
    res
}

/// Counts the votes for each choice.
///
/// Choices are sorted by decreasing number of votes. Equal counts keep the order
/// in which the choices first appear in the votes. The rank is the 1-based
/// position in that order.
pub fn tally(votes: &[VoteRecord]) -> Vec<TallyRow> {
    let mut groups: Vec<(String, u64)> = Vec::new();
    let mut positions: HashMap<&str, usize> = HashMap::new();
    for v in votes.iter() {
        match positions.get(v.choice.as_str()) {
            Some(&idx) => groups[idx].1 += 1,
            None => {
                positions.insert(v.choice.as_str(), groups.len());
                groups.push((v.choice.clone(), 1));
            }
        }
    }
    // Stable: ties stay in first-seen order.
    groups.sort_by(|a, b| b.1.cmp(&a.1));
    let res: Vec<TallyRow> = groups
        .into_iter()
        .enumerate()
        .map(|(idx, (choice, total_votes))| TallyRow {
            choice,
            total_votes,
            rank: (idx + 1) as u32,
        })
        .collect();
    info!("tally: {:?}", res);
    res
}
