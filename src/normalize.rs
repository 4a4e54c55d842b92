use crate::types::{CleanRecord, NormalizeConfig, RawRecord, RoomType};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use std::str::FromStr;

static PRICE_NOISE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[$,]").unwrap());

/// Maps raw API records onto cleaned, typed listings
pub struct Normalizer {
    config: NormalizeConfig,
}

impl Normalizer {
    pub fn new(config: NormalizeConfig) -> Self {
        Normalizer { config }
    }

    /// Normalize one raw record.
    ///
    /// Returns `None` when any field is still missing after cleaning; the
    /// dataset builder drops such records.
    pub fn normalize(&self, raw: &RawRecord) -> Option<CleanRecord> {
        let coordinates = raw.coordinates.as_ref()?;

        Some(CleanRecord {
            room_id: raw.id.clone()?,
            host_id: raw.host_id.clone()?,
            room_type: RoomType::from_label(raw.room_type.as_deref()?)?,
            price: parse_price(raw.column_10.as_deref()?)?,
            minimum_nights: self.clamp_nights(raw.minimum_nights?),
            number_of_reviews: raw.number_of_reviews? as i64,
            review_date: review_date(raw)?,
            reviews_per_month: floor_reviews_per_month(raw.reviews_per_month),
            host_listings_count: raw.calculated_host_listings_count? as i64,
            is_available: is_available(raw.availability_365),
            country: raw.column_19.clone()?,
            city: raw.city.clone()?,
            latitude: coordinates.lat?,
            longitude: coordinates.lon?,
        })
    }

    /// Clamp into the configured range; out-of-range stays are bounded, never dropped
    pub fn clamp_nights(&self, nights: f64) -> i32 {
        let floor = self.config.min_nights_floor;
        let cap = self.config.min_nights_cap.max(floor);
        (nights as i32).clamp(floor, cap)
    }
}

impl Default for Normalizer {
    fn default() -> Self {
        Normalizer::new(NormalizeConfig::default())
    }
}

/// Strip `$` and `,` from a price string. Empty or non-numeric leftovers are missing.
pub fn parse_price(raw: &str) -> Option<BigDecimal> {
    let cleaned = PRICE_NOISE.replace_all(raw, "");
    let cleaned = cleaned.trim();
    if cleaned.is_empty() {
        return None;
    }
    BigDecimal::from_str(cleaned).ok()
}

pub fn is_available(availability_365: Option<f64>) -> bool {
    availability_365.is_some_and(|count| count > 0.0)
}

/// Absent counts as zero; fractional months round down
pub fn floor_reviews_per_month(reviews_per_month: Option<f64>) -> i64 {
    reviews_per_month.unwrap_or(0.0).floor().max(0.0) as i64
}

/// Last review date, falling back to the last update date
pub fn review_date(raw: &RawRecord) -> Option<NaiveDate> {
    raw.last_review
        .as_deref()
        .and_then(parse_date)
        .or_else(|| raw.updated_date.as_deref().and_then(parse_date))
}

fn parse_date(value: &str) -> Option<NaiveDate> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(value).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|dt| dt.date())
        })
}
