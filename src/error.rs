use std::fmt;
use thiserror::Error;

/// Tables written by the loader, named as they appear in the store
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    RoomType,
    Availability,
    Country,
    City,
    Coordinates,
    Listings,
}

impl Table {
    pub fn name(self) -> &'static str {
        match self {
            Table::RoomType => "Roomtype",
            Table::Availability => "Availability",
            Table::Country => "Country",
            Table::City => "City",
            Table::Coordinates => "Coordinates",
            Table::Listings => "Listings",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Error)]
pub enum TransformError {
    #[error("no valid records survived cleaning ({received} raw records received)")]
    EmptyDataset { received: usize },
}

/// Failure reported by a storage backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("{0}")]
    Backend(String),
}

#[cfg(feature = "postgres")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(Box::new(err))
    }
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("no data to load")]
    EmptyDataset,

    #[error("failed to write {table} row: {source}")]
    Write {
        table: Table,
        #[source]
        source: StoreError,
    },

    #[error("failed to look up {table} row: {source}")]
    Lookup {
        table: Table,
        #[source]
        source: StoreError,
    },

    #[error("listing {room_id} references a missing {table} row")]
    UnresolvedReference { table: Table, room_id: String },
}
