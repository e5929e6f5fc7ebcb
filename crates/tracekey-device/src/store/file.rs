//! File-backed identity store.
//!
//! One CBOR record per file. Writes go to a sibling temporary file that is
//! synced and then renamed over the record, so a crash leaves either the old
//! or the new identity on disk.

use std::{
    fs::{self, File, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracekey_crypto::{SECRET_KEY_LEN, SecretKey};
use tracekey_entropy::EntropyKind;
use zeroize::Zeroize;

use super::{SecretKeyStore, StoreError, StoredIdentity};

/// Record format written by this build
const RECORD_VERSION: u32 = 1;

/// On-disk record.
///
/// Key bytes are wiped when the record is dropped.
#[derive(Serialize, Deserialize)]
struct Record {
    version: u32,
    secret_key: Vec<u8>,
    created_at_secs: i64,
    entropy_kind: String,
}

impl Drop for Record {
    fn drop(&mut self) {
        self.secret_key.zeroize();
    }
}

/// Just the version, decoded first so a newer record with a different layout
/// reports `UnsupportedVersion` rather than `Corrupt`.
#[derive(Deserialize)]
struct VersionProbe {
    version: u32,
}

/// Identity store backed by a single file.
///
/// On Unix the file is created with mode `0600`.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Store at `path`. The file is created on first save; the parent
    /// directory must exist.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self { path: path.as_ref().to_path_buf() }
    }

    /// Location of the record.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self.path.file_name().map(ToOwned::to_owned).unwrap_or_default();
        name.push(".tmp");
        self.path.with_file_name(name)
    }

    fn decode(bytes: &[u8]) -> Result<StoredIdentity, StoreError> {
        let probe: VersionProbe = ciborium::from_reader(bytes)
            .map_err(|e| StoreError::Corrupt { reason: e.to_string() })?;
        if probe.version != RECORD_VERSION {
            return Err(StoreError::UnsupportedVersion {
                found: probe.version,
                supported: RECORD_VERSION,
            });
        }

        let mut record: Record = ciborium::from_reader(bytes)
            .map_err(|e| StoreError::Corrupt { reason: e.to_string() })?;
        if record.secret_key.len() != SECRET_KEY_LEN {
            return Err(StoreError::Corrupt {
                reason: format!(
                    "secret key is {} bytes, expected {SECRET_KEY_LEN}",
                    record.secret_key.len()
                ),
            });
        }
        let entropy_kind: EntropyKind = record
            .entropy_kind
            .parse()
            .map_err(|e: tracekey_entropy::EntropyError| StoreError::Corrupt {
                reason: e.to_string(),
            })?;

        Ok(StoredIdentity {
            secret_key: SecretKey::from_bytes(std::mem::take(&mut record.secret_key)),
            created_at_secs: record.created_at_secs,
            entropy_kind,
        })
    }

    fn encode(identity: &StoredIdentity) -> Result<Vec<u8>, StoreError> {
        let record = Record {
            version: RECORD_VERSION,
            secret_key: identity.secret_key.as_bytes().to_vec(),
            created_at_secs: identity.created_at_secs,
            entropy_kind: identity.entropy_kind.as_str().to_owned(),
        };

        let mut bytes = Vec::new();
        ciborium::into_writer(&record, &mut bytes)
            .map_err(|e| StoreError::Corrupt { reason: e.to_string() })?;
        Ok(bytes)
    }
}

fn create_private(path: &Path) -> io::Result<File> {
    let mut options = OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }
    options.open(path)
}

impl SecretKeyStore for FileStore {
    fn load(&self) -> Result<Option<StoredIdentity>, StoreError> {
        let mut bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let identity = Self::decode(&bytes);
        bytes.zeroize();
        identity.map(Some)
    }

    fn save(&self, identity: &StoredIdentity) -> Result<(), StoreError> {
        let mut bytes = Self::encode(identity)?;
        let temp = self.temp_path();

        let written = create_private(&temp).and_then(|mut file| {
            file.write_all(&bytes)?;
            file.sync_all()
        });
        bytes.zeroize();

        if let Err(e) = written.and_then(|()| fs::rename(&temp, &self.path)) {
            let _ = fs::remove_file(&temp);
            return Err(e.into());
        }

        tracing::debug!(path = %self.path.display(), "Saved identity record");
        Ok(())
    }

    fn clear(&self) -> Result<(), StoreError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }
}
