//! CSV directory holdings source.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use fundos_core::HoldingTable;
use fundos_traits::{ReportingPeriod, SourceReader, TraitError};

/// Member indices read when none are configured.
pub const DEFAULT_MEMBER_INDICES: [u32; 2] = [1, 2];

/// Field delimiter of the CVM disclosure files.
pub const DEFAULT_DELIMITER: u8 = b';';

// =============================================================================
// CSV HOLDING SOURCE
// =============================================================================

/// Reads the extracted members of one disclosure batch from a directory.
///
/// Member `i` of period `YYYYMM` is the file `<dir>/<prefix><i>_<YYYYMM>.csv`.
/// Files are ISO-8859-1 encoded and carry a header row. All members are
/// concatenated into one table whose header is the union of theirs.
#[derive(Debug, Clone)]
pub struct CsvHoldingSource {
    dir: PathBuf,
    prefix: String,
    member_indices: Vec<u32>,
    delimiter: u8,
}

impl CsvHoldingSource {
    /// Create a source over `dir` with the default members and delimiter.
    pub fn new(dir: impl AsRef<Path>, prefix: impl Into<String>) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            prefix: prefix.into(),
            member_indices: DEFAULT_MEMBER_INDICES.to_vec(),
            delimiter: DEFAULT_DELIMITER,
        }
    }

    /// Set which numbered members make up a batch.
    #[must_use]
    pub fn with_member_indices(mut self, indices: Vec<u32>) -> Self {
        self.member_indices = indices;
        self
    }

    /// Set the field delimiter.
    #[must_use]
    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Path of one member file.
    pub fn member_path(&self, period: ReportingPeriod, index: u32) -> PathBuf {
        self.dir.join(member_name(&self.prefix, period, index))
    }
}

impl SourceReader for CsvHoldingSource {
    fn fetch(&self, period: ReportingPeriod) -> Result<HoldingTable, TraitError> {
        let table = union_members(&self.member_indices, |index| {
            let path = self.member_path(period, index);
            let bytes = std::fs::read(&path)
                .map_err(|e| TraitError::io(format!("member file {}", path.display()), &e))?;
            let member = parse_member(&bytes, &path.display().to_string(), self.delimiter)?;
            debug!(
                path = %path.display(),
                rows = member.len(),
                columns = member.columns().len(),
                "read member file"
            );
            Ok(member)
        })?;

        info!(
            period = %period,
            members = self.member_indices.len(),
            rows = table.len(),
            "fetched holdings"
        );
        Ok(table)
    }

    fn name(&self) -> &str {
        "csv-directory"
    }
}

// =============================================================================
// MEMBER PARSING
// =============================================================================

/// File name of member `index` of a batch: `<prefix><index>_<YYYYMM>.csv`.
pub fn member_name(prefix: &str, period: ReportingPeriod, index: u32) -> String {
    format!("{}{}_{}.csv", prefix, index, period.yyyymm())
}

/// Reads each numbered member and concatenates them under a header union.
pub(crate) fn union_members<F>(indices: &[u32], mut read: F) -> Result<HoldingTable, TraitError>
where
    F: FnMut(u32) -> Result<HoldingTable, TraitError>,
{
    if indices.is_empty() {
        return Err(TraitError::InvalidInput(
            "no member files configured for the batch".into(),
        ));
    }

    let mut combined: Option<HoldingTable> = None;
    for &index in indices {
        let member = read(index)?;
        match combined.as_mut() {
            Some(table) => table.append(member),
            None => combined = Some(member),
        }
    }
    Ok(combined.unwrap_or_default())
}

/// Parses one ISO-8859-1 member with a header row. `label` names the member
/// in errors.
pub(crate) fn parse_member(
    bytes: &[u8],
    label: &str,
    delimiter: u8,
) -> Result<HoldingTable, TraitError> {
    let text = decode_latin1(bytes);

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter)
        .has_headers(true)
        .from_reader(text.as_bytes());

    let parse_error = |e: csv::Error| TraitError::ParseError(format!("{label}: {e}"));

    let columns: Vec<String> = reader
        .headers()
        .map_err(parse_error)?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    if columns.iter().all(String::is_empty) {
        return Err(TraitError::ParseError(format!(
            "{label}: missing header row"
        )));
    }

    let mut table = HoldingTable::new(columns);
    for result in reader.records() {
        let record = result.map_err(parse_error)?;
        table
            .push_row(record.iter().map(|cell| Some(cell.to_string())).collect())
            .map_err(|e| TraitError::ParseError(format!("{label}: {e}")))?;
    }

    Ok(table)
}

/// Decodes ISO-8859-1 bytes. Every byte maps to the code point of the same
/// value, so decoding never fails.
pub fn decode_latin1(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| char::from(b)).collect()
}
