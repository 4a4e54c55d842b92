use crate::dimensions::DimensionSets;
use crate::error::{LoadError, StoreError, Table};
use crate::store::{ListingRow, Store};
use crate::types::CleanRecord;
use tracing::{debug, info};

/// Rows written vs. already present for one table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TableCounts {
    pub inserted: usize,
    pub skipped: usize,
}

impl TableCounts {
    fn record(&mut self, inserted: bool) {
        if inserted {
            self.inserted += 1;
        } else {
            self.skipped += 1;
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub room_types: TableCounts,
    pub availability: TableCounts,
    pub countries: TableCounts,
    pub cities: TableCounts,
    pub coordinates: TableCounts,
    pub listings: TableCounts,
}

/// Writes a cleaned dataset into a [`Store`]: dimensions first, then facts.
///
/// Writes are issued one at a time. Each is insert-if-absent, so a failed run
/// can be retried in full.
pub struct Loader<'a, S: Store + ?Sized> {
    store: &'a S,
}

impl<'a, S: Store + ?Sized> Loader<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Loader { store }
    }

    pub async fn load(&self, records: &[CleanRecord]) -> Result<LoadReport, LoadError> {
        let dimensions = self.load_dimensions(records).await?;
        self.load_facts(records, dimensions).await
    }

    /// Write every dimension row the dataset needs
    pub async fn load_dimensions(&self, records: &[CleanRecord]) -> Result<LoadReport, LoadError> {
        if records.is_empty() {
            return Err(LoadError::EmptyDataset);
        }

        self.write_dimensions(&DimensionSets::resolve(records)).await
    }

    /// Write the static room type and availability rows plus the derived sets
    pub async fn write_dimensions(&self, sets: &DimensionSets) -> Result<LoadReport, LoadError> {
        let mut report = LoadReport::default();

        for (code, label) in sets.room_types() {
            let inserted = write(Table::RoomType, self.store.insert_room_type(code, label).await)?;
            report.room_types.record(inserted);
        }
        for (code, label) in sets.availability() {
            let inserted =
                write(Table::Availability, self.store.insert_availability(code, label).await)?;
            report.availability.record(inserted);
        }
        for country in &sets.countries {
            let inserted = write(Table::Country, self.store.insert_country(country).await)?;
            report.countries.record(inserted);
        }
        for city in &sets.cities {
            let inserted = write(Table::City, self.store.insert_city(city).await)?;
            report.cities.record(inserted);
        }
        for &coordinates in &sets.coordinates {
            let inserted =
                write(Table::Coordinates, self.store.insert_coordinates(coordinates).await)?;
            report.coordinates.record(inserted);
        }

        info!(
            countries = sets.countries.len(),
            cities = sets.cities.len(),
            coordinates = sets.coordinates.len(),
            "dimensions loaded"
        );
        Ok(report)
    }

    /// Write one fact row per record, continuing a report from `load_dimensions`
    pub async fn load_facts(
        &self,
        records: &[CleanRecord],
        mut report: LoadReport,
    ) -> Result<LoadReport, LoadError> {
        if records.is_empty() {
            return Err(LoadError::EmptyDataset);
        }

        for record in records {
            let row = self.resolve(record).await?;
            let inserted = write(Table::Listings, self.store.insert_listing(&row).await)?;
            if !inserted {
                debug!(room_id = %record.room_id, "listing already present");
            }
            report.listings.record(inserted);
        }

        info!(
            inserted = report.listings.inserted,
            skipped = report.listings.skipped,
            "listings loaded"
        );
        Ok(report)
    }

    /// Look up every foreign key a record's fact row needs
    async fn resolve(&self, record: &CleanRecord) -> Result<ListingRow, LoadError> {
        let room_id = record.room_id.as_str();

        let room_type_id = required(
            Table::RoomType,
            room_id,
            self.store.room_type_id(record.room_type.label()).await,
        )?;
        let availability_id = required(
            Table::Availability,
            room_id,
            self.store.availability_id(record.availability().label()).await,
        )?;
        let country_id = required(
            Table::Country,
            room_id,
            self.store.country_id(&record.country).await,
        )?;
        let city_id = required(Table::City, room_id, self.store.city_id(&record.city).await)?;
        let coordinates_id = required(
            Table::Coordinates,
            room_id,
            self.store.coordinates_id(record.coordinates()).await,
        )?;

        Ok(ListingRow {
            room_id: record.room_id.clone(),
            host_id: record.host_id.clone(),
            room_type_id,
            price: record.price.clone(),
            minimum_nights: record.minimum_nights,
            number_of_reviews: record.number_of_reviews,
            reviews_per_month: record.reviews_per_month,
            host_listings_count: record.host_listings_count,
            availability_id,
            review_date: record.review_date,
            country_id,
            city_id,
            coordinates_id,
        })
    }
}

/// Load `records` into `store`
pub async fn load<S: Store + ?Sized>(
    store: &S,
    records: &[CleanRecord],
) -> Result<LoadReport, LoadError> {
    Loader::new(store).load(records).await
}

fn write(table: Table, result: Result<bool, StoreError>) -> Result<bool, LoadError> {
    result.map_err(|source| LoadError::Write { table, source })
}

fn required<T>(
    table: Table,
    room_id: &str,
    result: Result<Option<T>, StoreError>,
) -> Result<T, LoadError> {
    result
        .map_err(|source| LoadError::Lookup { table, source })?
        .ok_or_else(|| LoadError::UnresolvedReference {
            table,
            room_id: room_id.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::Tables;
    use crate::store::{MemoryStore, StoreResult};
    use crate::types::{Coordinates, RoomType};
    use async_trait::async_trait;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn record(id: &str, country: &str, city: &str, lat: f64, lon: f64) -> CleanRecord {
        CleanRecord {
            room_id: id.to_string(),
            host_id: format!("host-{}", id),
            room_type: RoomType::EntireHome,
            price: BigDecimal::from(150),
            minimum_nights: 2,
            number_of_reviews: 10,
            review_date: NaiveDate::from_ymd_opt(2023, 6, 1).unwrap(),
            reviews_per_month: 1,
            host_listings_count: 2,
            is_available: true,
            country: country.to_string(),
            city: city.to_string(),
            latitude: lat,
            longitude: lon,
        }
    }

    #[tokio::test]
    async fn test_shared_country_and_city() {
        let store = MemoryStore::new();
        let records = vec![
            record("1", "United States", "Boston", 42.36, -71.05),
            record("2", "United States", "Boston", 42.35, -71.06),
        ];

        load(&store, &records).await.unwrap();
        let tables = store.snapshot().unwrap();

        assert_eq!(tables.countries.len(), 1);
        assert_eq!(tables.cities.len(), 1);
        assert_eq!(tables.coordinates.len(), 2);
        let country_id = tables.countries["United States"];
        let city_id = tables.cities["Boston"];
        for row in tables.listings.values() {
            assert_eq!(row.country_id, country_id);
            assert_eq!(row.city_id, city_id);
        }
    }

    #[tokio::test]
    async fn test_static_dimensions_written_even_if_unused() {
        let store = MemoryStore::new();
        load(&store, &[record("1", "US", "Denver", 39.7, -104.9)]).await.unwrap();
        let tables = store.snapshot().unwrap();

        assert_eq!(tables.room_types.len(), 4);
        assert_eq!(tables.availability.len(), 2);
        assert_eq!(tables.room_types[&4], "Shared room");
        assert_eq!(tables.availability[&2], "No");
    }

    #[tokio::test]
    async fn test_load_twice_is_idempotent() {
        let store = MemoryStore::new();
        let records = vec![
            record("1", "United States", "Boston", 42.36, -71.05),
            record("2", "United States", "Chicago", 41.88, -87.63),
        ];

        let first = load(&store, &records).await.unwrap();
        let after_first = store.snapshot().unwrap();
        let second = load(&store, &records).await.unwrap();
        let after_second = store.snapshot().unwrap();

        assert_eq!(after_first, after_second);
        assert_eq!(first.listings.inserted, 2);
        assert_eq!(second.listings, TableCounts { inserted: 0, skipped: 2 });
        assert_eq!(second.countries, TableCounts { inserted: 0, skipped: 1 });
    }

    #[tokio::test]
    async fn test_existing_listing_is_not_altered() {
        let store = MemoryStore::new();
        load(&store, &[record("1", "US", "Boston", 42.36, -71.05)]).await.unwrap();

        let mut changed = record("1", "US", "Boston", 42.36, -71.05);
        changed.price = BigDecimal::from(999);
        load(&store, &[changed]).await.unwrap();

        let tables = store.snapshot().unwrap();
        assert_eq!(tables.listings["1"].price, BigDecimal::from(150));
    }

    #[tokio::test]
    async fn test_foreign_keys_resolve() {
        let store = MemoryStore::new();
        let mut unavailable = record("2", "Canada", "Toronto", 43.65, -79.38);
        unavailable.is_available = false;
        unavailable.room_type = RoomType::SharedRoom;
        let records = vec![record("1", "United States", "Boston", 42.36, -71.05), unavailable];

        load(&store, &records).await.unwrap();
        let tables = store.snapshot().unwrap();

        for row in tables.listings.values() {
            assert!(tables.room_types.contains_key(&row.room_type_id));
            assert!(tables.availability.contains_key(&row.availability_id));
            assert!(tables.countries.values().any(|&id| id == row.country_id));
            assert!(tables.cities.values().any(|&id| id == row.city_id));
            assert!(tables.coordinates.values().any(|&id| id == row.coordinates_id));
        }
        assert_eq!(tables.listings["2"].room_type_id, 4);
        assert_eq!(tables.listings["2"].availability_id, 2);
        assert_eq!(
            tables.listings["2"].coordinates_id,
            tables.coordinates[&Coordinates::new(43.65, -79.38)]
        );
    }

    #[tokio::test]
    async fn test_empty_dataset_writes_nothing() {
        let store = MemoryStore::new();
        let err = load(&store, &[]).await.unwrap_err();

        assert!(matches!(err, LoadError::EmptyDataset));
        assert_eq!(store.snapshot().unwrap(), Tables::default());
    }

    /// Accepts dimension writes but refuses every city insert
    struct CityOutage(MemoryStore);

    #[async_trait]
    impl Store for CityOutage {
        async fn insert_room_type(&self, code: i32, label: &str) -> StoreResult<bool> {
            self.0.insert_room_type(code, label).await
        }
        async fn insert_availability(&self, code: i32, label: &str) -> StoreResult<bool> {
            self.0.insert_availability(code, label).await
        }
        async fn insert_country(&self, country: &str) -> StoreResult<bool> {
            self.0.insert_country(country).await
        }
        async fn insert_city(&self, _city: &str) -> StoreResult<bool> {
            Err(StoreError::Backend("connection reset".to_string()))
        }
        async fn insert_coordinates(&self, coordinates: Coordinates) -> StoreResult<bool> {
            self.0.insert_coordinates(coordinates).await
        }
        async fn insert_listing(&self, row: &ListingRow) -> StoreResult<bool> {
            self.0.insert_listing(row).await
        }
        async fn room_type_id(&self, label: &str) -> StoreResult<Option<i32>> {
            self.0.room_type_id(label).await
        }
        async fn availability_id(&self, label: &str) -> StoreResult<Option<i32>> {
            self.0.availability_id(label).await
        }
        async fn country_id(&self, country: &str) -> StoreResult<Option<i64>> {
            self.0.country_id(country).await
        }
        async fn city_id(&self, city: &str) -> StoreResult<Option<i64>> {
            self.0.city_id(city).await
        }
        async fn coordinates_id(&self, coordinates: Coordinates) -> StoreResult<Option<i64>> {
            self.0.coordinates_id(coordinates).await
        }
    }

    #[tokio::test]
    async fn test_write_failure_aborts_before_facts() {
        let store = CityOutage(MemoryStore::new());
        let err = load(&store, &[record("1", "US", "Boston", 42.36, -71.05)])
            .await
            .unwrap_err();

        assert!(matches!(err, LoadError::Write { table: Table::City, .. }));
        let tables = store.0.snapshot().unwrap();
        assert_eq!(tables.countries.len(), 1);
        assert!(tables.listings.is_empty());
    }

    #[tokio::test]
    async fn test_missing_dimension_is_unresolved_reference() {
        let store = MemoryStore::new();
        let records = vec![record("1", "US", "Boston", 42.36, -71.05)];
        let report = LoadReport::default();

        let err = Loader::new(&store).load_facts(&records, report).await.unwrap_err();
        assert!(matches!(
            err,
            LoadError::UnresolvedReference { table: Table::RoomType, .. }
        ));
    }
}
