use log::{debug, info};
use std::{
    fs,
    io::{self, ErrorKind},
    path::Path,
};
use thiserror::Error;

/// The suffix of the files containing the checksum of a tracked configuration.
pub const CHECKSUM_SUFFIX: &str = ".md5sum";
/// The suffix appended to the checksum file name for the updated checksum.
pub const UPDATED_SUFFIX: &str = ".updated";

/// A tracked configuration file with its original and updated checksums.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigChange {
    /// The checksum file name with the checksum suffix stripped.
    pub name: String,
    pub original_checksum: String,
    pub updated_checksum: String,
}

impl ConfigChange {
    /// The configuration changed if the checksums are not exactly the same.
    pub fn is_changed(&self) -> bool {
        self.original_checksum != self.updated_checksum
    }
}

/// A custom error describing the error cases for comparing checksums.
#[derive(Debug, Error)]
pub enum ChecksumError {
    /// The checksum directory doesn't exist or cannot be listed.
    #[error("cannot read checksum directory {0}: {1}")]
    UnreadableDirectory(String, io::Error),
    /// One of the checksum files cannot be read.
    #[error("cannot read checksum file {0}: {1}")]
    UnreadableFile(String, io::Error),
}

fn read_checksum(path: &Path) -> Result<String, ChecksumError> {
    fs::read_to_string(path)
        .map_err(|err| ChecksumError::UnreadableFile(path.to_string_lossy().to_string(), err))
}

fn read_updated_checksum(path: &Path) -> Result<String, ChecksumError> {
    match fs::read_to_string(path) {
        Ok(checksum) => Ok(checksum),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(err) => Err(ChecksumError::UnreadableFile(
            path.to_string_lossy().to_string(),
            err,
        )),
    }
}

/// Read every checksum pair in the directory, sorted by file name.
///
/// A missing updated checksum file is read as an empty checksum.
pub fn read_snapshots(config_dir: &str) -> Result<Vec<ConfigChange>, ChecksumError> {
    let entries = fs::read_dir(config_dir)
        .map_err(|err| ChecksumError::UnreadableDirectory(config_dir.to_string(), err))?;

    let mut file_names = vec![];
    for entry in entries {
        let entry =
            entry.map_err(|err| ChecksumError::UnreadableDirectory(config_dir.to_string(), err))?;
        let file_name = entry.file_name();
        if file_name.to_string_lossy().ends_with(CHECKSUM_SUFFIX) && entry.path().is_file() {
            file_names.push(file_name);
        }
    }
    file_names.sort();

    let directory = Path::new(config_dir);
    let mut snapshots = Vec::with_capacity(file_names.len());
    for file_name in file_names {
        let original_checksum = read_checksum(&directory.join(&file_name))?;

        let mut updated_name = file_name.clone();
        updated_name.push(UPDATED_SUFFIX);
        let updated_checksum = read_updated_checksum(&directory.join(updated_name))?;

        let lossy_name = file_name.to_string_lossy();
        let name = lossy_name
            .strip_suffix(CHECKSUM_SUFFIX)
            .unwrap_or(&lossy_name)
            .to_string();

        snapshots.push(ConfigChange {
            name,
            original_checksum,
            updated_checksum,
        });
    }

    Ok(snapshots)
}

/// Find the tracked configuration files, where the original checksum differs from the updated one.
pub fn changed_configs(config_dir: &str) -> Result<Vec<ConfigChange>, ChecksumError> {
    let snapshots = read_snapshots(config_dir)?;
    debug!(
        "Found {} checksum files in {config_dir}.",
        snapshots.len()
    );

    let changes: Vec<ConfigChange> = snapshots
        .into_iter()
        .filter(|snapshot| {
            if snapshot.is_changed() {
                info!("Config file changed: {}{CHECKSUM_SUFFIX}", snapshot.name);
                true
            } else {
                false
            }
        })
        .collect();

    Ok(changes)
}
