pub use crate::config::*;

/// A builder for assembling a vote table row by row.
///
/// Readers feed it the header row first, then every data row in file order.
///
/// ```
/// pub use ballot_tally::builder::TableBuilder;
/// pub use ballot_tally::ColumnNames;
/// # use ballot_tally::TallyErrors;
///
/// let names = ColumnNames::new("Voter ID", "Timestamp", "I'm voting for");
/// let headers = ["Timestamp", "Voter ID", "I'm voting for"];
/// let mut builder = TableBuilder::new(&headers, &names)?;
///
/// builder.add_row_simple(&["2024/02/13 9:03:12 AM", "ab12", "Team Red"])?;
///
/// let table = builder.build();
/// assert_eq!(table.rows.len(), 1);
/// # Ok::<(), TallyErrors>(())
/// ```
pub struct TableBuilder {
    pub(crate) _headers: Vec<String>,
    pub(crate) _columns: Columns,
    pub(crate) _rows: Vec<RawVote>,
}

impl TableBuilder {
    pub fn new<S: AsRef<str>>(headers: &[S], names: &ColumnNames) -> Result<TableBuilder, TallyErrors> {
        let headers: Vec<String> = headers.iter().map(|s| s.as_ref().to_string()).collect();
        let columns = Columns::locate(names, &headers)?;
        Ok(TableBuilder {
            _headers: headers,
            _columns: columns,
            _rows: Vec::new(),
        })
    }

    pub fn add_row_simple(&mut self, fields: &[&str]) -> Result<(), TallyErrors> {
        self.add_row(fields.iter().map(|s| s.to_string()).collect())
    }

    /// Adds a row. Rows shorter than the header are padded with empty fields,
    /// as long as they reach the voter, timestamp and choice columns.
    pub fn add_row(&mut self, mut fields: Vec<String>) -> Result<(), TallyErrors> {
        let row = self._rows.len();
        let expected = self._columns.width();
        if fields.len() < expected {
            return Err(TallyErrors::RowTooShort {
                row,
                len: fields.len(),
                expected,
            });
        }
        if fields.len() < self._headers.len() {
            fields.resize(self._headers.len(), String::new());
        }
        self._rows.push(RawVote { row, fields });
        Ok(())
    }

    pub fn build(self) -> VoteTable {
        VoteTable {
            headers: self._headers,
            columns: self._columns,
            rows: self._rows,
        }
    }
}
