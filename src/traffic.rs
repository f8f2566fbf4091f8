//! Per-station traffic derived from the trips which pass a time filter.

use std::collections::HashMap;

use crate::data::{Station, StationId, Trip};
use crate::time::TimeFilter;

/// A station with the arrivals and departures of one aggregation pass
#[derive(Debug, Clone, PartialEq)]
pub struct StationTraffic {
    pub station: Station,
    pub arrivals: u32,
    pub departures: u32,
    pub total_traffic: u32,
}

impl StationTraffic {
    fn new(station: &Station, arrivals: u32, departures: u32) -> StationTraffic {
        StationTraffic {
            station: station.clone(),
            arrivals,
            departures,
            total_traffic: arrivals + departures,
        }
    }

    pub fn id(&self) -> &StationId {
        &self.station.id
    }

    /// Share of the traffic which departs from here, `None` when there is no traffic
    pub fn departure_ratio(&self) -> Option<f64> {
        if self.total_traffic == 0 {
            None
        } else {
            Some(f64::from(self.departures) / f64::from(self.total_traffic))
        }
    }

    pub fn tooltip(&self) -> String {
        format!(
            "{} trips ({} departures, {} arrivals)",
            self.total_traffic, self.departures, self.arrivals
        )
    }
}

/// Trip counts by station, departures keyed by start station and arrivals by end station
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TrafficCounts<'t> {
    pub arrivals: HashMap<&'t StationId, u32>,
    pub departures: HashMap<&'t StationId, u32>,
}

impl<'t> TrafficCounts<'t> {
    pub fn rollup<I>(trips: I) -> TrafficCounts<'t>
    where
        I: IntoIterator<Item = &'t Trip>,
    {
        let mut counts = TrafficCounts::default();
        for trip in trips {
            *counts.departures.entry(&trip.start_station_id).or_insert(0) += 1;
            *counts.arrivals.entry(&trip.end_station_id).or_insert(0) += 1;
        }
        counts
    }

    pub fn arrivals_at(&self, id: &StationId) -> u32 {
        self.arrivals.get(id).copied().unwrap_or(0)
    }

    pub fn departures_from(&self, id: &StationId) -> u32 {
        self.departures.get(id).copied().unwrap_or(0)
    }
}

/// The trips taking part under `filter`, all of them when it is `Any`
pub fn active_trips(trips: &[Trip], filter: TimeFilter) -> impl Iterator<Item = &Trip> {
    trips
        .iter()
        .filter(move |trip| filter.matches(trip.start_minute(), trip.end_minute()))
}

/// One entry per station in catalog order, including stations without traffic.
/// Trips to or from stations missing from the catalog are not counted anywhere.
pub fn aggregate(stations: &[Station], trips: &[Trip], filter: TimeFilter) -> Vec<StationTraffic> {
    let counts = TrafficCounts::rollup(active_trips(trips, filter));
    let traffic: Vec<_> = stations
        .iter()
        .map(|station| {
            StationTraffic::new(
                station,
                counts.arrivals_at(&station.id),
                counts.departures_from(&station.id),
            )
        })
        .collect();
    tracing::debug!(
        %filter,
        stations = traffic.len(),
        trips = counts.departures.values().sum::<u32>(),
        "aggregated station traffic"
    );
    traffic
}

/// The largest total traffic of any station, 0 when there are none
pub fn max_traffic(traffic: &[StationTraffic]) -> u32 {
    traffic.iter().map(|s| s.total_traffic).max().unwrap_or(0)
}

#[cfg(test)]
mod test {
    use super::{active_trips, aggregate, max_traffic, TrafficCounts};
    use crate::data::{Station, StationId, Trip};
    use crate::time::TimeFilter;
    use chrono::{NaiveDate, NaiveDateTime};

    fn at(hours: u32, minutes: u32) -> NaiveDateTime {
        NaiveDate::from_ymd(2024, 3, 1).and_hms(hours, minutes, 0)
    }

    fn trip(from: &str, to: &str, started_at: NaiveDateTime, ended_at: NaiveDateTime) -> Trip {
        Trip {
            start_station_id: from.into(),
            end_station_id: to.into(),
            started_at,
            ended_at,
        }
    }

    fn catalog() -> Vec<Station> {
        vec![Station::new("A", 0., 0.), Station::new("B", 1., 1.)]
    }

    fn trips() -> Vec<Trip> {
        vec![
            trip("A", "B", at(0, 10), at(0, 40)),
            trip("A", "A", at(23, 50), at(23, 55)),
        ]
    }

    fn counts(traffic: &[super::StationTraffic]) -> Vec<(&str, u32, u32, u32)> {
        traffic
            .iter()
            .map(|s| (s.id().as_str(), s.departures, s.arrivals, s.total_traffic))
            .collect()
    }

    #[test]
    fn unfiltered() {
        let traffic = aggregate(&catalog(), &trips(), TimeFilter::Any);
        assert_eq!(counts(&traffic), vec![("A", 2, 1, 3), ("B", 0, 1, 1)]);
    }

    #[test]
    fn filtered_at_half_past_midnight() {
        let traffic = aggregate(&catalog(), &trips(), TimeFilter::from_slider_value(30));
        assert_eq!(counts(&traffic), vec![("A", 1, 0, 1), ("B", 0, 1, 1)]);
    }

    #[test]
    fn unfiltered_keeps_every_trip() {
        let trips = trips();
        assert_eq!(active_trips(&trips, TimeFilter::Any).count(), trips.len());
    }

    #[test]
    fn window_is_inclusive_at_sixty_minutes() {
        let trips = vec![
            trip("A", "B", at(8, 0), at(8, 5)),
            trip("B", "A", at(6, 59), at(7, 0)),
            trip("B", "A", at(6, 58), at(6, 59)),
        ];
        let filter = TimeFilter::from_slider_value(8 * 60);
        let included: Vec<_> = active_trips(&trips, filter).collect();
        assert_eq!(included, vec![&trips[0], &trips[1]]);
    }

    #[test]
    fn empty_trips_give_zero_traffic_everywhere() {
        let traffic = aggregate(&catalog(), &[], TimeFilter::Any);
        assert_eq!(counts(&traffic), vec![("A", 0, 0, 0), ("B", 0, 0, 0)]);
        assert_eq!(max_traffic(&traffic), 0);
        assert_eq!(traffic[0].departure_ratio(), None);
    }

    #[test]
    fn unknown_stations_are_not_counted() {
        let trips = vec![trip("Z", "B", at(9, 0), at(9, 10)), trip("A", "Y", at(9, 0), at(9, 10))];
        let traffic = aggregate(&catalog(), &trips, TimeFilter::Any);
        assert_eq!(counts(&traffic), vec![("A", 1, 0, 1), ("B", 0, 1, 1)]);
        let rollup = TrafficCounts::rollup(&trips);
        assert_eq!(rollup.departures_from(&StationId::from("Z")), 1);
    }

    #[test]
    fn totals_add_up_and_passes_are_repeatable() {
        let stations = catalog();
        let trips = trips();
        for raw in &[-1, 0, 30, 700, 1430, 1439] {
            let filter = TimeFilter::from_slider_value(*raw);
            let first = aggregate(&stations, &trips, filter);
            for station in &first {
                assert_eq!(station.total_traffic, station.arrivals + station.departures);
            }
            assert_eq!(first, aggregate(&stations, &trips, filter));
        }
    }

    #[test]
    fn tooltip_and_ratio() {
        let traffic = aggregate(&catalog(), &trips(), TimeFilter::Any);
        assert_eq!(traffic[0].tooltip(), "3 trips (2 departures, 1 arrivals)");
        assert_eq!(traffic[1].departure_ratio(), Some(0.));
        assert_eq!(max_traffic(&traffic), 3);
    }
}
