//! Physical storage for uploaded documents.
//!
//! Files live in one directory per owner:
//! ```text
//! {root}/
//! ├── owner_1/
//! │   ├── report_20240305_140709.pdf
//! │   └── report_20240305_140709_2.pdf
//! └── owner_7/
//!     └── budget_20240306_091500.xlsx
//! ```
//!
//! Bytes are first written to a hidden staging file in the owner directory
//! and then linked under their final name. The link fails instead of
//! replacing an existing file, so a name that is taken gets a numeric suffix
//! rather than being overwritten. A failed write never leaves a file under a
//! final name.

use std::fs::{self, OpenOptions};
use std::io::{self, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

use super::naming::disambiguate;

/// Prefix of in-progress staging files.
pub const STAGING_PREFIX: &str = ".staging-";

/// Suffix of in-progress staging files.
pub const STAGING_SUFFIX: &str = ".part";

/// How many names (the requested one plus numbered variants) are tried before giving up.
pub const MAX_NAME_ATTEMPTS: u32 = 100;

/// A file that has been written under its final name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredFile {
    /// Name actually used on disk; differs from the requested name after a collision.
    pub stored_name: String,
    /// Full path of the stored file.
    pub path: PathBuf,
    /// Number of bytes written.
    pub size: u64,
}

/// Storage operations the ingestion pipeline relies on.
pub trait FileStore {
    /// Directory that holds the given owner's files. Pure path derivation.
    fn owner_dir(&self, owner_id: i64) -> PathBuf;

    /// Create `dir` and any missing parents.
    fn ensure_directory(&self, dir: &Path) -> io::Result<()>;

    /// Write all of `source` to `dir/stored_name` without replacing existing files.
    fn write_file(
        &self,
        dir: &Path,
        stored_name: &str,
        source: &mut dyn Read,
    ) -> io::Result<StoredFile>;

    /// Read a stored file back.
    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Remove a stored file.
    ///
    /// Returns `false` if there was nothing to remove.
    fn delete_file(&self, path: &Path) -> io::Result<bool>;
}

/// Local filesystem implementation of [`FileStore`].
#[derive(Debug, Clone)]
pub struct LocalFileStore {
    root: PathBuf,
}

impl LocalFileStore {
    /// Create a store rooted at `root`, creating the directory if needed.
    pub fn new(root: impl Into<PathBuf>) -> io::Result<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    /// Get the storage root.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn is_staging_name(name: &str) -> bool {
        name.starts_with(STAGING_PREFIX) && name.ends_with(STAGING_SUFFIX)
    }

    /// Remove staging files left behind by interrupted writes.
    ///
    /// Meant to run at startup, before uploads are accepted. Returns the
    /// number of files removed.
    pub fn purge_staging(&self) -> io::Result<usize> {
        let mut removed = 0;

        for owner_entry in fs::read_dir(&self.root)? {
            let owner_entry = owner_entry?;
            if !owner_entry.file_type()?.is_dir() {
                continue;
            }

            for entry in fs::read_dir(owner_entry.path())? {
                let entry = entry?;
                let name = entry.file_name();
                let is_staging = name.to_str().is_some_and(Self::is_staging_name);
                if is_staging && entry.file_type()?.is_file() {
                    match fs::remove_file(entry.path()) {
                        Ok(()) => removed += 1,
                        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                        Err(e) => return Err(e),
                    }
                }
            }
        }

        if removed > 0 {
            warn!("Removed {} abandoned staging file(s)", removed);
        }
        Ok(removed)
    }

    fn stage(path: &Path, source: &mut dyn Read) -> io::Result<u64> {
        let mut file = OpenOptions::new().write(true).create_new(true).open(path)?;
        let size = io::copy(source, &mut file)?;
        file.sync_all()?;
        Ok(size)
    }

    fn publish(staging: &Path, dir: &Path, stored_name: &str, size: u64) -> io::Result<StoredFile> {
        for attempt in 1..=MAX_NAME_ATTEMPTS {
            let candidate = if attempt == 1 {
                stored_name.to_string()
            } else {
                disambiguate(stored_name, attempt)
            };
            let path = dir.join(&candidate);

            match fs::hard_link(staging, &path) {
                Ok(()) => {
                    if let Err(e) = fs::remove_file(staging) {
                        warn!("Failed to remove staging file {:?}: {}", staging, e);
                    }
                    return Ok(StoredFile {
                        stored_name: candidate,
                        path,
                        size,
                    });
                }
                Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                    debug!("Stored name {} is taken, trying next", candidate);
                }
                Err(e) => return Err(e),
            }
        }

        Err(io::Error::new(
            io::ErrorKind::AlreadyExists,
            format!("no free name for {stored_name} after {MAX_NAME_ATTEMPTS} attempts"),
        ))
    }
}

/// Reject names that would not stay a single component inside the owner directory.
fn check_component(stored_name: &str) -> io::Result<()> {
    let unsafe_name = stored_name.is_empty()
        || stored_name == "."
        || stored_name == ".."
        || stored_name.contains(['/', '\\']);
    if unsafe_name {
        return Err(io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("invalid stored name: {stored_name:?}"),
        ));
    }
    Ok(())
}

impl FileStore for LocalFileStore {
    fn owner_dir(&self, owner_id: i64) -> PathBuf {
        self.root.join(format!("owner_{owner_id}"))
    }

    fn ensure_directory(&self, dir: &Path) -> io::Result<()> {
        fs::create_dir_all(dir)
    }

    fn write_file(
        &self,
        dir: &Path,
        stored_name: &str,
        source: &mut dyn Read,
    ) -> io::Result<StoredFile> {
        check_component(stored_name)?;

        let staging = dir.join(format!("{STAGING_PREFIX}{}{STAGING_SUFFIX}", Uuid::new_v4()));
        let result = Self::stage(&staging, source)
            .and_then(|size| Self::publish(&staging, dir, stored_name, size));

        if result.is_err() {
            if let Err(e) = fs::remove_file(&staging) {
                if e.kind() != io::ErrorKind::NotFound {
                    warn!("Failed to remove staging file {:?}: {}", staging, e);
                }
            }
        }

        result
    }

    fn read_file(&self, path: &Path) -> io::Result<Vec<u8>> {
        fs::read(path)
    }

    fn delete_file(&self, path: &Path) -> io::Result<bool> {
        match fs::remove_file(path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e),
        }
    }
}
