use crate::store::{ListingRow, Store, StoreResult};
use crate::types::Coordinates;
use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

#[derive(Debug, Clone)]
pub struct StoreConfig {
    pub database_url: String,
    pub max_connections: u32,
}

impl StoreConfig {
    pub fn new(database_url: impl Into<String>) -> Self {
        StoreConfig {
            database_url: database_url.into(),
            max_connections: 1,
        }
    }
}

/// PostgreSQL backend. Tables must already exist (see `sql/schema.sql`).
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub async fn connect(config: &StoreConfig) -> StoreResult<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections.max(1))
            .connect(&config.database_url)
            .await?;
        info!(max_connections = config.max_connections, "connected to postgres");
        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    async fn insert_room_type(&self, code: i32, label: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO Roomtype (Room_typeID, Room_type) VALUES ($1, $2) ON CONFLICT DO NOTHING",
        )
        .bind(code)
        .bind(label)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_availability(&self, code: i32, label: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO Availability (AvailibilityID, Availibility) VALUES ($1, $2)
             ON CONFLICT DO NOTHING",
        )
        .bind(code)
        .bind(label)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_country(&self, country: &str) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO Country (Country) VALUES ($1) ON CONFLICT (Country) DO NOTHING",
        )
        .bind(country)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_city(&self, city: &str) -> StoreResult<bool> {
        let result =
            sqlx::query("INSERT INTO City (City) VALUES ($1) ON CONFLICT (City) DO NOTHING")
                .bind(city)
                .execute(&self.pool)
                .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_coordinates(&self, coordinates: Coordinates) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO Coordinates (Latitude, Longitude) VALUES ($1, $2)
             ON CONFLICT (Latitude, Longitude) DO NOTHING",
        )
        .bind(coordinates.latitude)
        .bind(coordinates.longitude)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn insert_listing(&self, row: &ListingRow) -> StoreResult<bool> {
        let result = sqlx::query(
            "INSERT INTO Listings (
                Room_ID, Host_ID, Room_typeID, Room_Price, Minimum_nights,
                Number_of_reviews, Reviews_per_month, Number_of_rentals_by_host,
                AvailibilityID, Review_Date, CountryID, CityID, CoordinatesID
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13)
             ON CONFLICT (Room_ID) DO NOTHING",
        )
        .bind(&row.room_id)
        .bind(&row.host_id)
        .bind(row.room_type_id)
        .bind(&row.price)
        .bind(row.minimum_nights)
        .bind(row.number_of_reviews)
        .bind(row.reviews_per_month)
        .bind(row.host_listings_count)
        .bind(row.availability_id)
        .bind(row.review_date)
        .bind(row.country_id)
        .bind(row.city_id)
        .bind(row.coordinates_id)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn room_type_id(&self, label: &str) -> StoreResult<Option<i32>> {
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT Room_typeID FROM Roomtype WHERE Room_type = $1")
                .bind(label)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(id,)| id))
    }

    async fn availability_id(&self, label: &str) -> StoreResult<Option<i32>> {
        let row: Option<(i32,)> =
            sqlx::query_as("SELECT AvailibilityID FROM Availability WHERE Availibility = $1")
                .bind(label)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(|(id,)| id))
    }

    async fn country_id(&self, country: &str) -> StoreResult<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT CountryID FROM Country WHERE Country = $1")
            .bind(country)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(id,)| id))
    }

    async fn city_id(&self, city: &str) -> StoreResult<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as("SELECT CityID FROM City WHERE City = $1")
            .bind(city)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(|(id,)| id))
    }

    async fn coordinates_id(&self, coordinates: Coordinates) -> StoreResult<Option<i64>> {
        let row: Option<(i64,)> = sqlx::query_as(
            "SELECT CoordinatesID FROM Coordinates WHERE Latitude = $1 AND Longitude = $2",
        )
        .bind(coordinates.latitude)
        .bind(coordinates.longitude)
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|(id,)| id))
    }
}
