//! File-backed catalog shared by every process pointed at the same file.

use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use chrono::Utc;
use sharecycle_core::{CatalogSnapshot, Donation, NewDonation, NewRequest, Request};
use tempfile::NamedTempFile;
use tracing::{debug, info};

use crate::{Catalog, CatalogRepository, StoreError, seed};

const DEFAULT_LOCK_WAIT: Duration = Duration::from_secs(5);
const LOCK_POLL: Duration = Duration::from_millis(20);

/// Catalog persisted as one JSON document.
///
/// Nothing is cached: reads load the file as it is now, so the revision a
/// pass re-checks reflects writes made by other handles or processes.
/// Writes hold `<path>.lock` while they re-read, apply and replace the file
/// (temp file in the same directory, then rename), so concurrent writers
/// never overwrite each other and a crash never leaves a torn file.
pub struct JsonStore {
    path: PathBuf,
    lock_path: PathBuf,
    lock_wait: Duration,
}

impl JsonStore {
    /// Open the catalog at `path`. A missing file reads as an empty catalog
    /// and is created on the first write.
    pub fn open_persistent(path: &Path) -> Result<Self, StoreError> {
        let mut lock_path = path.as_os_str().to_owned();
        lock_path.push(".lock");
        let store = Self {
            path: path.to_path_buf(),
            lock_path: PathBuf::from(lock_path),
            lock_wait: DEFAULT_LOCK_WAIT,
        };

        let catalog = store.load()?;
        info!(
            path = %path.display(),
            donations = catalog.donations.len(),
            requests = catalog.requests.len(),
            revision = catalog.revision,
            "opened catalog file"
        );
        Ok(store)
    }

    /// How long a write waits for another writer's lock before giving up.
    pub fn with_lock_wait(mut self, wait: Duration) -> Self {
        self.lock_wait = wait;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the demo catalog if the file holds no records. Returns whether it did.
    pub fn seed_if_empty(&self) -> Result<bool, StoreError> {
        let _lock = self.lock()?;
        let current = self.load()?;
        if !current.is_empty() {
            return Ok(false);
        }
        let mut seeded = seed::catalog();
        seeded.revision = current.revision + 1;
        self.persist(&seeded)?;
        info!(path = %self.path.display(), "seeded demo catalog");
        Ok(true)
    }

    fn load(&self) -> Result<Catalog, StoreError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Catalog::default()),
            Err(e) => return Err(e.into()),
        };
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Catalog::default());
        }
        Ok(serde_json::from_slice(&bytes)?)
    }

    fn dir(&self) -> &Path {
        match self.path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        }
    }

    fn lock(&self) -> Result<LockFile, StoreError> {
        std::fs::create_dir_all(self.dir())?;
        LockFile::acquire(&self.lock_path, self.lock_wait)
    }

    fn persist(&self, catalog: &Catalog) -> Result<(), StoreError> {
        let mut tmp = NamedTempFile::new_in(self.dir())?;
        serde_json::to_writer_pretty(&mut tmp, catalog)?;
        tmp.write_all(b"\n")?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(())
    }

    /// Apply `f` to the catalog as currently on disk and write it back, all
    /// under the writer lock. A rejected change leaves the file untouched.
    fn mutate<T>(
        &self,
        f: impl FnOnce(&mut Catalog) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let _lock = self.lock()?;
        let mut catalog = self.load()?;
        let out = f(&mut catalog)?;
        self.persist(&catalog)?;
        debug!(path = %self.path.display(), revision = catalog.revision, "catalog written");
        Ok(out)
    }
}

/// Exclusive writer lock: a file created with `create_new`, removed on drop.
struct LockFile {
    path: PathBuf,
}

impl LockFile {
    fn acquire(path: &Path, wait: Duration) -> Result<Self, StoreError> {
        let deadline = Instant::now() + wait;
        loop {
            match OpenOptions::new().write(true).create_new(true).open(path) {
                Ok(_) => {
                    return Ok(Self {
                        path: path.to_path_buf(),
                    });
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    if Instant::now() >= deadline {
                        return Err(StoreError::Locked(path.to_path_buf()));
                    }
                    std::thread::sleep(LOCK_POLL);
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl Drop for LockFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

impl CatalogRepository for JsonStore {
    fn list_donations(&self) -> Result<Vec<Donation>, StoreError> {
        Ok(self.load()?.donations_newest_first())
    }

    fn list_requests(&self) -> Result<Vec<Request>, StoreError> {
        Ok(self.load()?.requests_newest_first())
    }

    fn add_donation(&self, draft: NewDonation) -> Result<Donation, StoreError> {
        let donation = self.mutate(|c| c.insert_donation(draft, Utc::now()))?;
        info!(id = %donation.id, path = %self.path.display(), "donation saved");
        Ok(donation)
    }

    fn add_request(&self, draft: NewRequest) -> Result<Request, StoreError> {
        let request = self.mutate(|c| c.insert_request(draft, Utc::now()))?;
        info!(id = %request.id, path = %self.path.display(), "request saved");
        Ok(request)
    }

    fn revision(&self) -> Result<u64, StoreError> {
        Ok(self.load()?.revision)
    }

    fn snapshot(&self) -> Result<CatalogSnapshot, StoreError> {
        Ok(self.load()?.snapshot())
    }
}
