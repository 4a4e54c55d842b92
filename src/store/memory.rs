use crate::error::StoreError;
use crate::store::{ListingRow, Store, StoreResult};
use crate::types::Coordinates;
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

/// Contents of every table, keyed the way the relational schema keys them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Tables {
    /// `Room_typeID -> Room_type`
    pub room_types: BTreeMap<i32, String>,
    /// `AvailibilityID -> Availibility`
    pub availability: BTreeMap<i32, String>,
    /// `Country -> CountryID`
    pub countries: BTreeMap<String, i64>,
    /// `City -> CityID`
    pub cities: BTreeMap<String, i64>,
    /// `(Latitude, Longitude) -> CoordinatesID`
    pub coordinates: BTreeMap<Coordinates, i64>,
    /// `Room_ID -> row`
    pub listings: BTreeMap<String, ListingRow>,
}

/// An in-process store with the same insert-if-absent semantics as the
/// relational backend. Used for dry runs and tests.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the current table contents
    pub fn snapshot(&self) -> StoreResult<Tables> {
        Ok(self.lock()?.clone())
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Tables>> {
        self.tables
            .lock()
            .map_err(|_| StoreError::Backend("memory store lock poisoned".to_string()))
    }
}

// Rows are never removed, so surrogate ids are dense: 1..=len, like a SERIAL column.

fn next_id<K>(table: &BTreeMap<K, i64>) -> i64 {
    table.len() as i64 + 1
}

fn has_id<K>(table: &BTreeMap<K, i64>, id: i64) -> bool {
    (1..=table.len() as i64).contains(&id)
}

fn has_label<K>(table: &BTreeMap<K, String>, label: &str) -> bool {
    table.values().any(|l| l == label)
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_room_type(&self, code: i32, label: &str) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        if tables.room_types.contains_key(&code) || has_label(&tables.room_types, label) {
            return Ok(false);
        }
        tables.room_types.insert(code, label.to_string());
        Ok(true)
    }

    async fn insert_availability(&self, code: i32, label: &str) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        if tables.availability.contains_key(&code) || has_label(&tables.availability, label) {
            return Ok(false);
        }
        tables.availability.insert(code, label.to_string());
        Ok(true)
    }

    async fn insert_country(&self, country: &str) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        if tables.countries.contains_key(country) {
            return Ok(false);
        }
        let id = next_id(&tables.countries);
        tables.countries.insert(country.to_string(), id);
        Ok(true)
    }

    async fn insert_city(&self, city: &str) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        if tables.cities.contains_key(city) {
            return Ok(false);
        }
        let id = next_id(&tables.cities);
        tables.cities.insert(city.to_string(), id);
        Ok(true)
    }

    async fn insert_coordinates(&self, coordinates: Coordinates) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        if tables.coordinates.contains_key(&coordinates) {
            return Ok(false);
        }
        let id = next_id(&tables.coordinates);
        tables.coordinates.insert(coordinates, id);
        Ok(true)
    }

    async fn insert_listing(&self, row: &ListingRow) -> StoreResult<bool> {
        let mut tables = self.lock()?;
        if tables.listings.contains_key(&row.room_id) {
            return Ok(false);
        }

        let references_exist = tables.room_types.contains_key(&row.room_type_id)
            && tables.availability.contains_key(&row.availability_id)
            && has_id(&tables.countries, row.country_id)
            && has_id(&tables.cities, row.city_id)
            && has_id(&tables.coordinates, row.coordinates_id);
        if !references_exist {
            return Err(StoreError::Backend(format!(
                "foreign key violation for listing {}",
                row.room_id
            )));
        }

        tables.listings.insert(row.room_id.clone(), row.clone());
        Ok(true)
    }

    async fn room_type_id(&self, label: &str) -> StoreResult<Option<i32>> {
        let tables = self.lock()?;
        Ok(tables
            .room_types
            .iter()
            .find(|(_, l)| l.as_str() == label)
            .map(|(&code, _)| code))
    }

    async fn availability_id(&self, label: &str) -> StoreResult<Option<i32>> {
        let tables = self.lock()?;
        Ok(tables
            .availability
            .iter()
            .find(|(_, l)| l.as_str() == label)
            .map(|(&code, _)| code))
    }

    async fn country_id(&self, country: &str) -> StoreResult<Option<i64>> {
        Ok(self.lock()?.countries.get(country).copied())
    }

    async fn city_id(&self, city: &str) -> StoreResult<Option<i64>> {
        Ok(self.lock()?.cities.get(city).copied())
    }

    async fn coordinates_id(&self, coordinates: Coordinates) -> StoreResult<Option<i64>> {
        Ok(self.lock()?.coordinates.get(&coordinates).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn listing_row() -> ListingRow {
        ListingRow {
            room_id: "1".to_string(),
            host_id: "h".to_string(),
            room_type_id: 1,
            price: bigdecimal::BigDecimal::from(10),
            minimum_nights: 1,
            number_of_reviews: 0,
            reviews_per_month: 0,
            host_listings_count: 1,
            availability_id: 1,
            review_date: chrono::NaiveDate::from_ymd_opt(2023, 1, 1).unwrap(),
            country_id: 1,
            city_id: 1,
            coordinates_id: 1,
        }
    }

    #[tokio::test]
    async fn test_insert_if_absent() {
        let store = MemoryStore::new();

        assert!(store.insert_country("Canada").await.unwrap());
        assert!(!store.insert_country("Canada").await.unwrap());
        assert!(store.insert_country("Mexico").await.unwrap());

        assert_eq!(store.country_id("Canada").await.unwrap(), Some(1));
        assert_eq!(store.country_id("Mexico").await.unwrap(), Some(2));
        assert_eq!(store.country_id("Peru").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_static_rows_conflict_on_code_or_label() {
        let store = MemoryStore::new();

        assert!(store.insert_room_type(2, "Private room").await.unwrap());
        assert!(!store.insert_room_type(2, "Something else").await.unwrap());
        assert!(!store.insert_room_type(9, "Private room").await.unwrap());
        assert_eq!(store.room_type_id("Private room").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_ids_stay_sequential_for_large_batches() {
        let store = MemoryStore::new();
        for i in 0..5_000 {
            assert!(store.insert_city(&format!("city-{}", i)).await.unwrap());
        }
        assert!(!store.insert_city("city-42").await.unwrap());

        assert_eq!(store.city_id("city-0").await.unwrap(), Some(1));
        assert_eq!(store.city_id("city-4999").await.unwrap(), Some(5_000));
        assert_eq!(store.snapshot().unwrap().cities.len(), 5_000);
    }

    #[tokio::test]
    async fn test_listing_rejects_unissued_ids() {
        let store = MemoryStore::new();
        store.insert_room_type(1, "Entire home/apt").await.unwrap();
        store.insert_availability(1, "Yes").await.unwrap();
        store.insert_country("US").await.unwrap();
        store.insert_city("Boston").await.unwrap();
        store.insert_coordinates(Coordinates::new(42.36, -71.05)).await.unwrap();

        let mut row = listing_row();
        assert!(store.insert_listing(&row).await.unwrap());

        row.room_id = "2".to_string();
        row.city_id = 2;
        assert!(store.insert_listing(&row).await.is_err());
        row.city_id = 0;
        assert!(store.insert_listing(&row).await.is_err());
        assert_eq!(store.snapshot().unwrap().listings.len(), 1);
    }

    #[tokio::test]
    async fn test_listing_requires_existing_references() {
        let store = MemoryStore::new();
        let row = listing_row();

        assert!(store.insert_listing(&row).await.is_err());
        assert!(store.snapshot().unwrap().listings.is_empty());
    }
}
