// Console rendering of the intermediate result sets.

use std::io::{self, Write};

use ballot_tally::{TallyRow, VoteRecord, VoterCount};

pub const SEPARATOR_WIDTH: usize = 88;

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Severity {
    /// A good outcome: votes loaded, valid, kept.
    Success,
    /// A bad outcome that does not stop the run: invalid or duplicate votes.
    Error,
    /// Raw data dumps.
    Info,
    Plain,
}

/// The sink of everything the check has to say about the votes.
///
/// One reporter lives for the duration of a run and is handed to it.
pub trait Reporter {
    fn report(&mut self, severity: Severity, message: &str) -> io::Result<()>;

    fn table(&mut self, table: &TextTable) -> io::Result<()> {
        self.report(Severity::Info, &table.render())
    }

    fn separator(&mut self) -> io::Result<()> {
        self.report(Severity::Plain, &"-".repeat(SEPARATOR_WIDTH))
    }
}

pub struct ConsoleReporter<W: Write> {
    out: W,
    color: bool,
}

impl<W: Write> ConsoleReporter<W> {
    pub fn new(out: W, color: bool) -> ConsoleReporter<W> {
        ConsoleReporter { out, color }
    }
}

impl<W: Write> Reporter for ConsoleReporter<W> {
    fn report(&mut self, severity: Severity, message: &str) -> io::Result<()> {
        for line in message.lines() {
            if self.color {
                match severity {
                    Severity::Success => writeln!(self.out, "\x1b[32m{}\x1b[0m", line)?,
                    Severity::Error => writeln!(self.out, "\x1b[31m{}\x1b[0m", line)?,
                    Severity::Plain => writeln!(self.out, "\x1b[34m{}\x1b[0m", line)?,
                    Severity::Info => writeln!(self.out, "{}", line)?,
                }
            } else {
                match severity {
                    Severity::Success => writeln!(self.out, "SUCCESS | {}", line)?,
                    Severity::Error => writeln!(self.out, "ERROR   | {}", line)?,
                    Severity::Info => writeln!(self.out, "INFO    | {}", line)?,
                    Severity::Plain => writeln!(self.out, "{}", line)?,
                }
            }
        }
        self.out.flush()
    }
}

/// A table of strings with a leading index column.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct TextTable {
    pub headers: Vec<String>,
    pub rows: Vec<(String, Vec<String>)>,
}

impl TextTable {
    pub fn new(headers: Vec<String>) -> TextTable {
        TextTable {
            headers,
            rows: Vec::new(),
        }
    }

    pub fn push(&mut self, index: impl ToString, cells: Vec<String>) {
        self.rows.push((index.to_string(), cells));
    }

    /// Votes, indexed by their row in the source file.
    pub fn from_votes(headers: &[String], votes: &[VoteRecord]) -> TextTable {
        let mut t = TextTable::new(headers.to_vec());
        for v in votes.iter() {
            t.push(v.row, v.fields.clone());
        }
        t
    }

    pub fn from_voter_counts(voter_column: &str, counts: &[VoterCount]) -> TextTable {
        let mut t = TextTable::new(vec![voter_column.to_string(), "Vote count".to_string()]);
        for (idx, vc) in counts.iter().enumerate() {
            t.push(idx, vec![vc.voter_id.clone(), vc.count.to_string()]);
        }
        t
    }

    /// The tally, indexed by rank.
    pub fn from_tally(choice_column: &str, tally: &[TallyRow]) -> TextTable {
        let mut t = TextTable::new(vec![choice_column.to_string(), "Total votes".to_string()]);
        for r in tally.iter() {
            t.push(r.rank, vec![r.choice.clone(), r.total_votes.to_string()]);
        }
        t
    }

    /// Renders the cells right-aligned in columns, separated by two spaces.
    pub fn render(&self) -> String {
        if self.rows.is_empty() {
            return format!("Empty table\nColumns: [{}]", self.headers.join(", "));
        }
        let width = |s: &str| s.chars().count();
        let index_width = self.rows.iter().map(|(idx, _)| width(idx.as_str())).max().unwrap_or(0);
        let mut widths: Vec<usize> = self.headers.iter().map(|h| width(h.as_str())).collect();
        for (_, cells) in self.rows.iter() {
            for (i, c) in cells.iter().enumerate() {
                match widths.get_mut(i) {
                    Some(w) => *w = (*w).max(width(c.as_str())),
                    None => widths.push(width(c.as_str())),
                }
            }
        }

        let line = |index: &str, cells: &[String]| {
            let mut s = format!("{:<w$}", index, w = index_width);
            for (i, w) in widths.iter().enumerate() {
                let c = cells.get(i).map(|c| c.as_str()).unwrap_or("");
                s.push_str(&format!("  {:>w$}", c, w = *w));
            }
            s.trim_end().to_string()
        };

        let mut lines: Vec<String> = vec![line("", self.headers.as_slice())];
        for (idx, cells) in self.rows.iter() {
            lines.push(line(idx.as_str(), cells.as_slice()));
        }
        lines.join("\n")
    }
}

/// Keeps every message in memory.
#[cfg(test)]
#[derive(Default)]
pub(crate) struct RecordingReporter {
    pub messages: Vec<(Severity, String)>,
}

#[cfg(test)]
impl Reporter for RecordingReporter {
    fn report(&mut self, severity: Severity, message: &str) -> io::Result<()> {
        self.messages.push((severity, message.to_string()));
        Ok(())
    }
}
