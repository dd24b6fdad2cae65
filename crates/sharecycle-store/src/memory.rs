use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use chrono::Utc;
use sharecycle_core::{CatalogSnapshot, Donation, NewDonation, NewRequest, Request};
use tracing::info;

use crate::{Catalog, CatalogRepository, StoreError, seed};

/// Process-local catalog. Contents are lost when the store is dropped.
#[derive(Debug, Default)]
pub struct MemoryStore {
    catalog: RwLock<Catalog>,
}

impl MemoryStore {
    /// An empty store.
    pub fn open() -> Self {
        Self::default()
    }

    /// A store preloaded with the demo catalog.
    pub fn seeded() -> Self {
        Self::from_catalog(seed::catalog())
    }

    pub fn from_catalog(catalog: Catalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
        }
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Catalog>, StoreError> {
        self.catalog
            .read()
            .map_err(|e| StoreError::Other(format!("catalog lock poisoned: {e}")))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Catalog>, StoreError> {
        self.catalog
            .write()
            .map_err(|e| StoreError::Other(format!("catalog lock poisoned: {e}")))
    }
}

impl CatalogRepository for MemoryStore {
    fn list_donations(&self) -> Result<Vec<Donation>, StoreError> {
        Ok(self.read()?.donations_newest_first())
    }

    fn list_requests(&self) -> Result<Vec<Request>, StoreError> {
        Ok(self.read()?.requests_newest_first())
    }

    fn add_donation(&self, draft: NewDonation) -> Result<Donation, StoreError> {
        let donation = self.write()?.insert_donation(draft, Utc::now())?;
        info!(id = %donation.id, category = %donation.category, "donation added");
        Ok(donation)
    }

    fn add_request(&self, draft: NewRequest) -> Result<Request, StoreError> {
        let request = self.write()?.insert_request(draft, Utc::now())?;
        info!(id = %request.id, category = %request.category, "request added");
        Ok(request)
    }

    fn revision(&self) -> Result<u64, StoreError> {
        Ok(self.read()?.revision)
    }

    fn snapshot(&self) -> Result<CatalogSnapshot, StoreError> {
        Ok(self.read()?.snapshot())
    }
}
