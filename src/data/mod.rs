//! Models of the bike share data: the station catalog and individual trips.

use std::fmt;
use std::rc::Rc;
use std::sync::Arc;

use chrono::NaiveDateTime;
use serde::{de, Deserialize, Deserializer};

use crate::time::MinuteOfDay;

pub mod db;

/// Short identifier of a station, eg. `A32000`. Trips refer to stations by this.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct StationId(Arc<str>);

impl StationId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for StationId {
    fn from(id: &str) -> StationId {
        StationId(id.into())
    }
}

impl From<String> for StationId {
    fn from(id: String) -> StationId {
        StationId(id.into())
    }
}

impl fmt::Display for StationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Some catalogs carry numeric station ids, these are kept as their decimal text
impl<'de> Deserialize<'de> for StationId {
    fn deserialize<D>(deserializer: D) -> Result<StationId, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct StringOrInt;

        impl<'de> de::Visitor<'de> for StringOrInt {
            type Value = StationId;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("string or int")
            }

            fn visit_str<E>(self, string: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(StationId::from(string))
            }

            fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(StationId::from(v.to_string()))
            }

            fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(StationId::from(v.to_string()))
            }
        }

        deserializer.deserialize_any(StringOrInt)
    }
}

/// Coordinates come as JSON numbers in some catalog versions and as numeric strings in others
fn number_or_numeric_string<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    struct NumberOrString;

    impl<'de> de::Visitor<'de> for NumberOrString {
        type Value = f64;

        fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
            formatter.write_str("a number, possibly inside a string")
        }

        fn visit_f64<E>(self, v: f64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v)
        }

        fn visit_u64<E>(self, v: u64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v as f64)
        }

        fn visit_i64<E>(self, v: i64) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            Ok(v as f64)
        }

        fn visit_str<E>(self, string: &str) -> Result<Self::Value, E>
        where
            E: de::Error,
        {
            string
                .trim()
                .parse()
                .map_err(|_| de::Error::invalid_value(de::Unexpected::Str(string), &self))
        }
    }

    deserializer.deserialize_any(NumberOrString)
}

/// A station as it appears in the catalog, unknown fields are ignored
#[derive(Debug, Deserialize)]
struct StationRecord {
    short_name: StationId,
    name: Option<String>,
    capacity: Option<u32>,
    #[serde(deserialize_with = "number_or_numeric_string")]
    lat: f64,
    #[serde(deserialize_with = "number_or_numeric_string")]
    lon: f64,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(from = "StationRecord")]
pub struct Station {
    pub id: StationId,
    pub name: Option<String>,
    pub capacity: Option<u32>,
    location: geo::Point<f64>,
}

impl From<StationRecord> for Station {
    fn from(record: StationRecord) -> Station {
        Station::new(record.short_name, record.lat, record.lon)
            .with_name(record.name)
            .with_capacity(record.capacity)
    }
}

impl Station {
    pub fn new(id: impl Into<StationId>, lat: f64, lon: f64) -> Station {
        Station {
            id: id.into(),
            name: None,
            capacity: None,
            location: geo::Point::new(lon, lat),
        }
    }

    fn with_name(mut self, name: Option<String>) -> Station {
        self.name = name;
        self
    }

    fn with_capacity(mut self, capacity: Option<u32>) -> Station {
        self.capacity = capacity;
        self
    }

    /// x is longitude and y is latitude
    pub fn position(&self) -> geo::Point<f64> {
        self.location
    }

    pub fn lat(&self) -> f64 {
        self.location.y()
    }

    pub fn lon(&self) -> f64 {
        self.location.x()
    }
}

/// A single bike trip, timestamps are local wall-clock time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trip {
    pub start_station_id: StationId,
    pub end_station_id: StationId,
    pub started_at: NaiveDateTime,
    pub ended_at: NaiveDateTime,
}

impl Trip {
    pub fn start_minute(&self) -> MinuteOfDay {
        MinuteOfDay::of(&self.started_at)
    }

    pub fn end_minute(&self) -> MinuteOfDay {
        MinuteOfDay::of(&self.ended_at)
    }
}

/// The loaded station catalog and trips, neither changes after loading
#[derive(Debug, Clone)]
pub struct Store {
    stations: Rc<[Station]>,
    trips: Rc<[Trip]>,
}

impl Store {
    pub fn new(stations: Rc<[Station]>, trips: Rc<[Trip]>) -> Store {
        Store { stations, trips }
    }

    pub fn stations(&self) -> &[Station] {
        &self.stations
    }

    pub fn trips(&self) -> &[Trip] {
        &self.trips
    }
}
