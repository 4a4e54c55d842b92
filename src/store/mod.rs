//! Relational storage for the listing star schema.
//!
//! Every insert is insert-if-absent by the table's unique key and reports
//! whether a new row was written. Lookups resolve the surrogate keys the
//! fact table references.

pub mod memory;
#[cfg(feature = "postgres")]
pub mod postgres;

use crate::error::StoreError;
use crate::types::Coordinates;
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use chrono::NaiveDate;

pub use memory::MemoryStore;
#[cfg(feature = "postgres")]
pub use postgres::{PgStore, StoreConfig};

pub type StoreResult<T> = std::result::Result<T, StoreError>;

/// One row of the `Listings` fact table with its foreign keys resolved
#[derive(Debug, Clone, PartialEq)]
pub struct ListingRow {
    pub room_id: String,
    pub host_id: String,
    pub room_type_id: i32,
    pub price: BigDecimal,
    pub minimum_nights: i32,
    pub number_of_reviews: i64,
    pub reviews_per_month: i64,
    pub host_listings_count: i64,
    pub availability_id: i32,
    pub review_date: NaiveDate,
    pub country_id: i64,
    pub city_id: i64,
    pub coordinates_id: i64,
}

#[async_trait]
pub trait Store: Send + Sync {
    async fn insert_room_type(&self, code: i32, label: &str) -> StoreResult<bool>;

    async fn insert_availability(&self, code: i32, label: &str) -> StoreResult<bool>;

    async fn insert_country(&self, country: &str) -> StoreResult<bool>;

    async fn insert_city(&self, city: &str) -> StoreResult<bool>;

    async fn insert_coordinates(&self, coordinates: Coordinates) -> StoreResult<bool>;

    /// Insert a fact row; an existing `Room_ID` is left untouched
    async fn insert_listing(&self, row: &ListingRow) -> StoreResult<bool>;

    async fn room_type_id(&self, label: &str) -> StoreResult<Option<i32>>;

    async fn availability_id(&self, label: &str) -> StoreResult<Option<i32>>;

    async fn country_id(&self, country: &str) -> StoreResult<Option<i64>>;

    async fn city_id(&self, city: &str) -> StoreResult<Option<i64>>;

    async fn coordinates_id(&self, coordinates: Coordinates) -> StoreResult<Option<i64>>;
}
