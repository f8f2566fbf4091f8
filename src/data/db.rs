use std::fs::File;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use chrono::{DateTime, NaiveDateTime};
use chrono_tz::Tz;
use serde::Deserialize;

use crate::data::{Station, Trip};
use crate::error::{LoadError, TimestampError};
use crate::events::{Dataset, Event, EventBus, Loaded};

/// Formats of timestamps without an offset, read as wall-clock time. `%.f` also matches no fraction.
const LOCAL_FORMATS: &[&str] = &["%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M:%S%.f"];

#[derive(Deserialize)]
struct Catalog {
    data: CatalogData,
}

#[derive(Deserialize)]
struct CatalogData {
    stations: Vec<Station>,
}

/// A row of the trip table, other columns such as `ride_id` and `rideable_type` are ignored
#[derive(Debug, Deserialize)]
struct TripRecord {
    start_station_id: String,
    end_station_id: String,
    started_at: String,
    ended_at: String,
}

/// Parse a trip timestamp. Timestamps with an offset are converted into `timezone`.
pub fn parse_timestamp(text: &str, timezone: Tz) -> Result<NaiveDateTime, TimestampError> {
    let text = text.trim();
    if let Ok(date_time) = DateTime::parse_from_rfc3339(text) {
        return Ok(date_time.with_timezone(&timezone).naive_local());
    }
    LOCAL_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(text, format).ok())
        .ok_or_else(|| TimestampError::InvalidFormat(text.to_owned()))
}

impl TripRecord {
    fn into_trip(self, timezone: Tz) -> Result<Trip, TimestampError> {
        Ok(Trip {
            started_at: parse_timestamp(&self.started_at, timezone)?,
            ended_at: parse_timestamp(&self.ended_at, timezone)?,
            start_station_id: self.start_station_id.into(),
            end_station_id: self.end_station_id.into(),
        })
    }
}

/// Read the station catalog document, `{"data": {"stations": [...]}}`
pub fn read_stations<R: Read>(reader: R) -> Result<Vec<Station>, LoadError> {
    let catalog: Catalog = serde_json::from_reader(reader)?;
    Ok(catalog.data.stations)
}

#[derive(Debug)]
pub struct TripLoad {
    pub trips: Vec<Trip>,
    /// rows dropped because a timestamp could not be read
    pub skipped: usize,
}

/// Read the trip table. Rows with unreadable timestamps are skipped, malformed csv fails the load.
pub fn read_trips<R: Read>(reader: R, timezone: Tz) -> Result<TripLoad, LoadError> {
    let mut rdr = csv::Reader::from_reader(reader);
    let mut load = TripLoad {
        trips: Vec::new(),
        skipped: 0,
    };
    for result in rdr.deserialize() {
        let record: TripRecord = result?;
        match record.into_trip(timezone) {
            Ok(trip) => load.trips.push(trip),
            Err(err) => {
                if load.skipped == 0 {
                    tracing::warn!(%err, "skipping trip with unreadable timestamp");
                }
                load.skipped += 1;
            }
        }
    }
    if load.skipped > 0 {
        tracing::warn!(skipped = load.skipped, "trips skipped for unreadable timestamps");
    }
    Ok(load)
}

/// Where the two datasets are read from. Trips are only read once the catalog has loaded.
pub struct DataSource {
    stations_path: PathBuf,
    trips_path: PathBuf,
    timezone: Tz,
}

impl DataSource {
    pub fn new(stations_path: &Path, trips_path: &Path, timezone: Tz) -> DataSource {
        DataSource {
            stations_path: stations_path.to_owned(),
            trips_path: trips_path.to_owned(),
            timezone,
        }
    }

    fn open(&self, path: &Path) -> Result<File, LoadError> {
        tracing::info!(path = %path.display(), "opening");
        File::open(path).map_err(|source| LoadError::Open {
            path: path.to_owned(),
            source,
        })
    }

    pub fn load_stations(&self) -> Result<Vec<Station>, LoadError> {
        let stations = read_stations(BufReader::new(self.open(&self.stations_path)?))?;
        tracing::info!(count = stations.len(), "loaded stations");
        Ok(stations)
    }

    pub fn load_trips(&self) -> Result<Vec<Trip>, LoadError> {
        let load = read_trips(self.open(&self.trips_path)?, self.timezone)?;
        tracing::info!(count = load.trips.len(), skipped = load.skipped, "loaded trips");
        Ok(load.trips)
    }

    /// Load the catalog then the trips, publishing each outcome. Stops at the first failure.
    /// Returns whether both datasets loaded.
    pub fn publish_to(&self, bus: &mut EventBus) -> bool {
        let stations = match self.load_stations() {
            Ok(stations) => stations,
            Err(err) => {
                bus.publish(&Event::DataLoaded(Loaded::Failed(Dataset::Stations, Rc::new(err))));
                return false;
            }
        };
        bus.publish(&Event::DataLoaded(Loaded::Stations(stations.into())));

        match self.load_trips() {
            Ok(trips) => {
                bus.publish(&Event::DataLoaded(Loaded::Trips(trips.into())));
                true
            }
            Err(err) => {
                bus.publish(&Event::DataLoaded(Loaded::Failed(Dataset::Trips, Rc::new(err))));
                false
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::{parse_timestamp, read_stations, read_trips, DataSource};
    use crate::error::{LoadError, TimestampError};
    use crate::events::{Event, EventBus, Loaded, Topic};
    use chrono::NaiveDate;
    use chrono_tz::America::New_York;
    use std::cell::RefCell;
    use std::path::Path;
    use std::rc::Rc;

    const CATALOG: &str = r#"{
        "last_updated": 1709251200,
        "data": {"stations": [
            {"short_name": "A32000", "name": "Fan Pier", "lat": 42.353, "lon": -71.044},
            {"short_name": "B32006", "name": "Boylston St", "lat": "42.349", "lon": "-71.080"}
        ]}
    }"#;

    const TRIPS: &str = "\
ride_id,rideable_type,started_at,ended_at,start_station_name,start_station_id,end_station_name,end_station_id,is_member
F1,classic_bike,2024-03-01 00:10:00.000,2024-03-01 00:40:12.500,Fan Pier,A32000,Boylston St,B32006,1
F2,electric_bike,2024-03-01 23:50:00,2024-03-01 23:55:00,Fan Pier,A32000,Fan Pier,A32000,0
";

    #[test]
    fn stations_from_catalog() {
        let stations = read_stations(CATALOG.as_bytes()).unwrap();
        assert_eq!(stations.len(), 2);
        assert_eq!(stations[0].id.as_str(), "A32000");
        assert_eq!(stations[1].lat(), 42.349);
    }

    #[test]
    fn malformed_catalog() {
        let result = read_stations(r#"{"data": {}}"#.as_bytes());
        assert!(matches!(result, Err(LoadError::Catalog(_))));
    }

    #[test]
    fn trips_from_csv() {
        let load = read_trips(TRIPS.as_bytes(), New_York).unwrap();
        assert_eq!(load.skipped, 0);
        assert_eq!(load.trips.len(), 2);
        let trip = &load.trips[0];
        assert_eq!(trip.start_station_id.as_str(), "A32000");
        assert_eq!(trip.end_station_id.as_str(), "B32006");
        assert_eq!(trip.start_minute().minutes(), 10);
        assert_eq!(trip.end_minute().minutes(), 40);
        assert_eq!(load.trips[1].start_minute().minutes(), 23 * 60 + 50);
    }

    #[test]
    fn unreadable_timestamps_are_skipped() {
        let trips = "started_at,ended_at,start_station_id,end_station_id\n\
                     yesterday,2024-03-01 00:40:00,A,B\n\
                     2024-03-01 00:10:00,2024-03-01 00:40:00,A,B\n";
        let load = read_trips(trips.as_bytes(), New_York).unwrap();
        assert_eq!(load.skipped, 1);
        assert_eq!(load.trips.len(), 1);
    }

    #[test]
    fn missing_columns_fail_the_load() {
        let trips = "started_at,ended_at\n2024-03-01 00:10:00,2024-03-01 00:40:00\n";
        assert!(matches!(read_trips(trips.as_bytes(), New_York), Err(LoadError::Trips(_))));
    }

    #[test]
    fn timestamp_formats() {
        let expected = NaiveDate::from_ymd(2024, 3, 1).and_hms(0, 10, 0);
        assert_eq!(parse_timestamp("2024-03-01 00:10:00", New_York), Ok(expected));
        assert_eq!(parse_timestamp("2024-03-01T00:10:00", New_York), Ok(expected));
        assert_eq!(parse_timestamp(" 2024-03-01 00:10:00.000 ", New_York), Ok(expected));
        // 05:10 UTC is 00:10 in Boston in March before daylight saving
        assert_eq!(parse_timestamp("2024-03-01T05:10:00Z", New_York), Ok(expected));
        assert_eq!(parse_timestamp("2024-03-01T00:10:00-05:00", New_York), Ok(expected));
        assert_eq!(
            parse_timestamp("03/01/2024", New_York),
            Err(TimestampError::InvalidFormat("03/01/2024".to_owned()))
        );
    }

    #[test]
    fn missing_catalog_publishes_failure_and_skips_trips() {
        let source = DataSource::new(
            Path::new("/nonexistent/stations.json"),
            Path::new("/nonexistent/trips.csv"),
            New_York,
        );
        let mut bus = EventBus::new();
        let seen = Rc::new(RefCell::new(vec![]));
        let log = seen.clone();
        bus.subscribe(Topic::Data, move |event| {
            if let Event::DataLoaded(loaded) = event {
                log.borrow_mut().push(match loaded {
                    Loaded::Stations(_) => "stations",
                    Loaded::Trips(_) => "trips",
                    Loaded::Failed(_, err) => {
                        assert!(matches!(**err, LoadError::Open { .. }));
                        "failed"
                    }
                });
            }
        });
        assert!(!source.publish_to(&mut bus));
        assert_eq!(*seen.borrow(), vec!["failed"]);
    }
}
