//! Distinct dimension values derived from a cleaned dataset.
//!
//! Room types and availability are fixed enumerations and are always emitted
//! in full, so their dimension rows exist even when a run contains none of
//! them. Countries, cities and coordinates come from the data and are kept in
//! ordered sets, which gives a stable insertion order within a run.

use crate::types::{Availability, CleanRecord, Coordinates, RoomType};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DimensionSets {
    pub countries: BTreeSet<String>,
    pub cities: BTreeSet<String>,
    pub coordinates: BTreeSet<Coordinates>,
}

impl DimensionSets {
    pub fn resolve(records: &[CleanRecord]) -> Self {
        let mut sets = DimensionSets::default();
        for record in records {
            if !sets.countries.contains(&record.country) {
                sets.countries.insert(record.country.clone());
            }
            if !sets.cities.contains(&record.city) {
                sets.cities.insert(record.city.clone());
            }
            sets.coordinates.insert(record.coordinates());
        }
        sets
    }

    /// `(code, label)` rows of the room type dimension
    pub fn room_types(&self) -> impl Iterator<Item = (i32, &'static str)> {
        RoomType::ALL.into_iter().map(|rt| (rt.code(), rt.label()))
    }

    /// `(code, label)` rows of the availability dimension
    pub fn availability(&self) -> impl Iterator<Item = (i32, &'static str)> {
        Availability::ALL.into_iter().map(|a| (a.code(), a.label()))
    }
}
