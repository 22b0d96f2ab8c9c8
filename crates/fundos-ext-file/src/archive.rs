//! ZIP archive holdings source.
//!
//! The monthly disclosure is published as one archive per period holding the
//! numbered members. The archive is either read from a directory or
//! downloaded from `<base_url><YYYYMM><extension>`.

use std::io::{Cursor, Read};
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{debug, info};

use fundos_core::HoldingTable;
use fundos_traits::{ReportingPeriod, SourceReader, TraitError};

use crate::source::{
    member_name, parse_member, union_members, DEFAULT_DELIMITER, DEFAULT_MEMBER_INDICES,
};

/// Extension of the published archives.
pub const DEFAULT_ARCHIVE_EXTENSION: &str = ".zip";

/// How long a download may take before the source gives up.
pub const DEFAULT_DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(300);

/// Where the archive of a period comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveLocation {
    /// `<dir>/<prefix><YYYYMM><extension>` on the local filesystem.
    Directory {
        /// Directory holding the archives.
        dir: PathBuf,
        /// File name prefix of each archive.
        prefix: String,
    },
    /// `<base_url><YYYYMM><extension>` over HTTP.
    Url {
        /// Everything before the period in the archive URL.
        base_url: String,
    },
}

// =============================================================================
// ZIP HOLDING SOURCE
// =============================================================================

/// Reads the members of one disclosure batch out of its ZIP archive.
///
/// Member `i` of period `YYYYMM` is the entry `<member_prefix><i>_<YYYYMM>.csv`.
#[derive(Debug, Clone)]
pub struct ZipHoldingSource {
    location: ArchiveLocation,
    extension: String,
    member_prefix: String,
    member_indices: Vec<u32>,
    delimiter: u8,
    timeout: Duration,
}

impl ZipHoldingSource {
    /// Source reading archives from a local directory.
    pub fn from_dir(
        dir: impl AsRef<Path>,
        archive_prefix: impl Into<String>,
        member_prefix: impl Into<String>,
    ) -> Self {
        Self::new(
            ArchiveLocation::Directory {
                dir: dir.as_ref().to_path_buf(),
                prefix: archive_prefix.into(),
            },
            member_prefix,
        )
    }

    /// Source downloading archives from `base_url`.
    pub fn from_url(base_url: impl Into<String>, member_prefix: impl Into<String>) -> Self {
        Self::new(
            ArchiveLocation::Url {
                base_url: base_url.into(),
            },
            member_prefix,
        )
    }

    fn new(location: ArchiveLocation, member_prefix: impl Into<String>) -> Self {
        Self {
            location,
            extension: DEFAULT_ARCHIVE_EXTENSION.to_string(),
            member_prefix: member_prefix.into(),
            member_indices: DEFAULT_MEMBER_INDICES.to_vec(),
            delimiter: DEFAULT_DELIMITER,
            timeout: DEFAULT_DOWNLOAD_TIMEOUT,
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

    /// Set the archive extension, including the dot.
    #[must_use]
    pub fn with_extension(mut self, extension: impl Into<String>) -> Self {
        self.extension = extension.into();
        self
    }

    /// Set the download timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Where the archive comes from.
    pub fn location(&self) -> &ArchiveLocation {
        &self.location
    }

    /// Path or URL of the archive of a period.
    pub fn archive_location(&self, period: ReportingPeriod) -> String {
        match &self.location {
            ArchiveLocation::Directory { dir, prefix } => dir
                .join(format!("{}{}{}", prefix, period.yyyymm(), self.extension))
                .display()
                .to_string(),
            ArchiveLocation::Url { base_url } => {
                format!("{}{}{}", base_url, period.yyyymm(), self.extension)
            }
        }
    }

    fn archive_bytes(&self, location: &str) -> Result<Vec<u8>, TraitError> {
        match &self.location {
            ArchiveLocation::Directory { .. } => std::fs::read(location)
                .map_err(|e| TraitError::io(format!("archive {location}"), &e)),
            ArchiveLocation::Url { .. } => download(location, self.timeout),
        }
    }
}

impl SourceReader for ZipHoldingSource {
    fn fetch(&self, period: ReportingPeriod) -> Result<HoldingTable, TraitError> {
        let location = self.archive_location(period);
        let bytes = self.archive_bytes(&location)?;
        debug!(archive = %location, bytes = bytes.len(), "loaded archive");

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes))
            .map_err(|e| TraitError::ParseError(format!("{location}: {e}")))?;

        let table = union_members(&self.member_indices, |index| {
            let name = member_name(&self.member_prefix, period, index);
            let mut entry = archive.by_name(&name).map_err(|e| match e {
                zip::result::ZipError::FileNotFound => {
                    TraitError::NotFound(format!("member {name} in {location}"))
                }
                other => TraitError::ParseError(format!("{location}: {name}: {other}")),
            })?;

            let mut buf = Vec::with_capacity(usize::try_from(entry.size()).unwrap_or_default());
            entry
                .read_to_end(&mut buf)
                .map_err(|e| TraitError::ParseError(format!("{location}: {name}: {e}")))?;

            let member = parse_member(&buf, &name, self.delimiter)?;
            debug!(
                member = %name,
                rows = member.len(),
                columns = member.columns().len(),
                "read archive member"
            );
            Ok(member)
        })?;

        info!(
            period = %period,
            archive = %location,
            members = self.member_indices.len(),
            rows = table.len(),
            "fetched holdings"
        );
        Ok(table)
    }

    fn name(&self) -> &str {
        match self.location {
            ArchiveLocation::Directory { .. } => "zip-directory",
            ArchiveLocation::Url { .. } => "zip-http",
        }
    }
}

/// Downloads an archive. A 404 is [`TraitError::NotFound`]; transport
/// failures and other non-success statuses are
/// [`TraitError::SourceNotAvailable`].
fn download(url: &str, timeout: Duration) -> Result<Vec<u8>, TraitError> {
    let unavailable = |e: reqwest::Error| TraitError::SourceNotAvailable(format!("{url}: {e}"));

    let client = reqwest::blocking::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(unavailable)?;
    let response = client.get(url).send().map_err(unavailable)?;

    let status = response.status();
    if status == reqwest::StatusCode::NOT_FOUND {
        return Err(TraitError::NotFound(format!("archive {url}")));
    }
    if !status.is_success() {
        return Err(TraitError::SourceNotAvailable(format!(
            "{url}: HTTP {status}"
        )));
    }

    let bytes = response.bytes().map_err(unavailable)?;
    info!(url, bytes = bytes.len(), "downloaded archive");
    Ok(bytes.to_vec())
}
