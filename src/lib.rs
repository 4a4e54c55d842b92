//! # listings-etl - Listing Dataset Loader
//!
//! Cleans raw listing records from a public dataset API and loads them into a
//! star schema: room type, availability, country, city and coordinates
//! dimensions around a `Listings` fact table.
//!
//! ## Modules
//!
//! - **normalize**: per-record field cleaning
//! - **dataset**: cleaning a whole batch and dropping incomplete records
//! - **dimensions**: distinct dimension values of a dataset
//! - **loader**: idempotent writes, dimensions before facts
//! - **store**: the storage seam, with in-memory and PostgreSQL backends
//! - **source**: decoding raw records from API pages or NDJSON
//! - **pipeline**: running transform and load as one batch
//!
//! ## Quick Start
//!
//! ```rust
//! use listings_etl::{load, transform, MemoryStore, RawRecord};
//! use serde_json::json;
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> anyhow::Result<()> {
//! let raw: RawRecord = serde_json::from_value(json!({
//!     "id": "1",
//!     "host_id": "10",
//!     "room_type": "Private room",
//!     "column_10": "$1,200",
//!     "minimum_nights": 0,
//!     "number_of_reviews": 3,
//!     "last_review": "2023-04-01",
//!     "calculated_host_listings_count": 1,
//!     "availability_365": 0,
//!     "column_19": "United States",
//!     "city": "Austin",
//!     "coordinates": {"lat": 30.27, "lon": -97.74}
//! }))?;
//!
//! let dataset = transform(vec![raw])?;
//! let store = MemoryStore::new();
//! let report = load(&store, &dataset.records).await?;
//! assert_eq!(report.listings.inserted, 1);
//! # Ok(())
//! # }
//! ```

pub mod dataset;
pub mod dimensions;
pub mod error;
pub mod loader;
pub mod normalize;
pub mod pipeline;
pub mod source;
pub mod store;
pub mod types;

pub use dataset::{build_dataset, Dataset, TransformStats};
pub use dimensions::DimensionSets;
pub use error::{LoadError, StoreError, Table, TransformError};
pub use loader::{load, LoadReport, Loader, TableCounts};
pub use normalize::Normalizer;
pub use pipeline::{PipelineError, PipelineReport, Stage};
pub use store::{ListingRow, MemoryStore, Store};
#[cfg(feature = "postgres")]
pub use store::{PgStore, StoreConfig};
pub use types::{Availability, CleanRecord, Coordinates, NormalizeConfig, RawRecord, RoomType};

/// Clean a batch of raw records with the default normalization rules
pub fn transform(raw: Vec<RawRecord>) -> Result<Dataset, TransformError> {
    build_dataset(raw, &Normalizer::default())
}
