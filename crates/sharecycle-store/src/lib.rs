//! Storage layer: the catalog repository seam plus in-memory and JSON-file stores.

mod catalog;
mod error;
mod json;
mod memory;
pub mod seed;

pub use catalog::{Catalog, CatalogRepository, DonationFilter, MAX_PHOTO_BYTES};
pub use error::StoreError;
pub use json::JsonStore;
pub use memory::MemoryStore;
