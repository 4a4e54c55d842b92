use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::cmp::Ordering;
use std::fmt;

/// One listing as delivered by the dataset API (`record.fields`).
///
/// Every field is optional. Values of an unexpected shape decode as `None`
/// so a single malformed record is dropped instead of failing the batch.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawRecord {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<String>,

    #[serde(default, deserialize_with = "lenient_id")]
    pub host_id: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub room_type: Option<String>,

    /// Price as text, e.g. `"$1,200"`
    #[serde(default, deserialize_with = "lenient_string")]
    pub column_10: Option<String>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub minimum_nights: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub number_of_reviews: Option<f64>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub last_review: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub updated_date: Option<String>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub reviews_per_month: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub calculated_host_listings_count: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub availability_365: Option<f64>,

    /// Country
    #[serde(default, deserialize_with = "lenient_string")]
    pub column_19: Option<String>,

    #[serde(default, deserialize_with = "lenient_string")]
    pub city: Option<String>,

    #[serde(default, deserialize_with = "lenient_coordinates")]
    pub coordinates: Option<RawCoordinates>,
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct RawCoordinates {
    #[serde(default, deserialize_with = "lenient_f64")]
    pub lat: Option<f64>,

    #[serde(default, deserialize_with = "lenient_f64")]
    pub lon: Option<f64>,
}

fn lenient_id<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.is_u64() || n.is_i64() => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    })
}

fn lenient_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let number = match Value::deserialize(deserializer)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    Ok(number.filter(|v| v.is_finite()))
}

fn lenient_coordinates<'de, D>(deserializer: D) -> Result<Option<RawCoordinates>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    if !value.is_object() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

/// The four room types listings are classified into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RoomType {
    EntireHome,
    PrivateRoom,
    HotelRoom,
    SharedRoom,
}

impl RoomType {
    pub const ALL: [RoomType; 4] = [
        RoomType::EntireHome,
        RoomType::PrivateRoom,
        RoomType::HotelRoom,
        RoomType::SharedRoom,
    ];

    /// Label stored in the `Roomtype` dimension and used by the source API
    pub fn label(self) -> &'static str {
        match self {
            RoomType::EntireHome => "Entire home/apt",
            RoomType::PrivateRoom => "Private room",
            RoomType::HotelRoom => "Hotel room",
            RoomType::SharedRoom => "Shared room",
        }
    }

    /// Fixed primary key of the `Roomtype` dimension row
    pub fn code(self) -> i32 {
        match self {
            RoomType::EntireHome => 1,
            RoomType::PrivateRoom => 2,
            RoomType::HotelRoom => 3,
            RoomType::SharedRoom => 4,
        }
    }

    /// Parse a source label, ignoring case and surrounding whitespace
    pub fn from_label(label: &str) -> Option<Self> {
        let label = label.trim();
        RoomType::ALL
            .into_iter()
            .find(|rt| rt.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Availability dimension values, keyed on the cleaned boolean
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Availability(pub bool);

impl Availability {
    pub const ALL: [Availability; 2] = [Availability(true), Availability(false)];

    pub fn label(self) -> &'static str {
        if self.0 {
            "Yes"
        } else {
            "No"
        }
    }

    pub fn code(self) -> i32 {
        if self.0 {
            1
        } else {
            2
        }
    }
}

/// A latitude/longitude pair, compared by exact bit-level float ordering
#[derive(Debug, Clone, Copy)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Coordinates { latitude, longitude }
    }
}

impl PartialEq for Coordinates {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Coordinates {}

impl PartialOrd for Coordinates {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Coordinates {
    fn cmp(&self, other: &Self) -> Ordering {
        self.latitude
            .total_cmp(&other.latitude)
            .then_with(|| self.longitude.total_cmp(&other.longitude))
    }
}

/// A fully normalized listing, ready to be loaded
#[derive(Debug, Clone, PartialEq)]
pub struct CleanRecord {
    pub room_id: String,
    pub host_id: String,
    pub room_type: RoomType,
    pub price: BigDecimal,
    pub minimum_nights: i32,
    pub number_of_reviews: i64,
    pub review_date: NaiveDate,
    pub reviews_per_month: i64,
    pub host_listings_count: i64,
    pub is_available: bool,
    pub country: String,
    pub city: String,
    pub latitude: f64,
    pub longitude: f64,
}

impl CleanRecord {
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.latitude, self.longitude)
    }

    pub fn availability(&self) -> Availability {
        Availability(self.is_available)
    }
}

/// Configuration for field normalization
#[derive(Debug, Clone)]
pub struct NormalizeConfig {
    /// Lower bound minimum nights are raised to
    pub min_nights_floor: i32,

    /// Upper bound minimum nights are lowered to
    pub min_nights_cap: i32,
}

impl Default for NormalizeConfig {
    fn default() -> Self {
        NormalizeConfig {
            min_nights_floor: 1,
            min_nights_cap: 7,
        }
    }
}
