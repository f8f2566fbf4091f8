//! Station markers drawn over the map: sized by traffic, colored by the direction of the flow and
//! positioned with the map's current projection.

use std::collections::HashMap;
use std::io;

use crate::data::StationId;
use crate::time::TimeFilter;
use crate::traffic::{max_traffic, StationTraffic};
use crate::write_xml;

use super::geometry::{MapView, Pixels, ScreenPoint};
use super::scale::{QuantizeScale, SqrtScale};

/// Radius range with no filter
pub const UNFILTERED_RADIUS: (f64, f64) = (0., 25.);
/// Filtered views have fewer trips, a minimum radius keeps quiet stations visible
pub const FILTERED_RADIUS: (f64, f64) = (3., 50.);

const OVERLAY_STYLE: &str =
    "position: absolute; top: 0; left: 0; width: 100%; height: 100%; pointer-events: none; z-index: 1";

/// Which way the traffic at a station mostly goes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Flow {
    /// mostly arrivals
    Arrivals,
    Balanced,
    /// mostly departures
    Departures,
    /// no traffic at all
    Idle,
}

impl Flow {
    pub fn css_color(self) -> &'static str {
        match self {
            Flow::Arrivals => "darkorange",
            Flow::Balanced => "gray",
            Flow::Departures => "steelblue",
            Flow::Idle => "lightgray",
        }
    }
}

/// Departure ratio from 0 (only arrivals) to 1 (only departures) in three buckets
pub fn flow_scale() -> QuantizeScale<Flow> {
    QuantizeScale::new((0., 1.), vec![Flow::Arrivals, Flow::Balanced, Flow::Departures])
}

pub fn flow_of(station: &StationTraffic, scale: &QuantizeScale<Flow>) -> Flow {
    match station.departure_ratio() {
        Some(ratio) => scale.apply(ratio),
        None => Flow::Idle,
    }
}

pub fn radius_scale(traffic: &[StationTraffic], filter: TimeFilter) -> SqrtScale {
    let range = if filter.is_active() {
        FILTERED_RADIUS
    } else {
        UNFILTERED_RADIUS
    };
    SqrtScale::new(max_traffic(traffic).into(), range)
}

/// Identity of a marker, kept while its station stays in the data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Ord, PartialOrd)]
pub struct MarkerId(u64);

#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub id: MarkerId,
    pub station_id: StationId,
    location: geo::Point<f64>,
    pub center: ScreenPoint,
    pub radius: Pixels,
    pub flow: Flow,
    pub tooltip: String,
}

impl Marker {
    fn restyle(&mut self, station: &StationTraffic, radius: &SqrtScale, flow: &QuantizeScale<Flow>) {
        self.location = station.station.position();
        self.radius = Pixels::new(radius.apply(station.total_traffic.into()));
        self.flow = flow_of(station, flow);
        self.tooltip = station.tooltip();
    }

    fn reposition<M: MapView + ?Sized>(&mut self, map: &M) {
        self.center = map.project(self.location);
    }

    pub fn location(&self) -> geo::Point<f64> {
        self.location
    }

    fn write_svg_fragment_to(&self, w: &mut dyn io::Write) -> io::Result<()> {
        write_xml!(w,
            <circle cx={self.center.x} cy={self.center.y} r={self.radius}
                fill={self.flow.css_color()} stroke="white" stroke-width="1" opacity="0.6"
                pointer-events="auto"><title>{self.tooltip}</title></circle>
        )
    }
}

/// How a render matched markers to stations
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct JoinSummary {
    pub entered: usize,
    pub updated: usize,
    pub exited: usize,
}

/// The markers currently on the map, one for each station of the last render
#[derive(Debug, Default)]
pub struct MarkerLayer {
    markers: Vec<Marker>,
    next_id: u64,
}

impl MarkerLayer {
    pub fn new() -> MarkerLayer {
        Self::default()
    }

    pub fn markers(&self) -> &[Marker] {
        &self.markers
    }

    pub fn get(&self, station_id: &StationId) -> Option<&Marker> {
        self.markers.iter().find(|marker| &marker.station_id == station_id)
    }

    /// Join the markers to `traffic` by station id, then restyle and reposition all of them.
    /// A station id seen again keeps its marker, repeated ids in `traffic` get a new marker each.
    pub fn render<M: MapView + ?Sized>(
        &mut self,
        traffic: &[StationTraffic],
        filter: TimeFilter,
        map: &M,
    ) -> JoinSummary {
        let radius = radius_scale(traffic, filter);
        let flow = flow_scale();
        let mut summary = JoinSummary::default();

        let mut existing: HashMap<StationId, Marker> = HashMap::with_capacity(self.markers.len());
        for marker in self.markers.drain(..) {
            if existing.contains_key(&marker.station_id) {
                summary.exited += 1;
            } else {
                existing.insert(marker.station_id.clone(), marker);
            }
        }

        let mut markers = Vec::with_capacity(traffic.len());
        for station in traffic {
            let mut marker = match existing.remove(station.id()) {
                Some(marker) => {
                    summary.updated += 1;
                    marker
                }
                None => {
                    summary.entered += 1;
                    self.enter(station.id())
                }
            };
            marker.restyle(station, &radius, &flow);
            marker.reposition(map);
            markers.push(marker);
        }
        summary.exited += existing.len();
        self.markers = markers;

        tracing::debug!(
            entered = summary.entered,
            updated = summary.updated,
            exited = summary.exited,
            max_radius = radius.range().1,
            "rendered markers"
        );
        summary
    }

    fn enter(&mut self, station_id: &StationId) -> Marker {
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        Marker {
            id,
            station_id: station_id.clone(),
            location: geo::Point::new(0., 0.),
            center: ScreenPoint::default(),
            radius: Pixels::default(),
            flow: Flow::Idle,
            tooltip: String::new(),
        }
    }

    /// Project every marker again with the map's current viewport, leaving size and color
    pub fn reposition<M: MapView + ?Sized>(&mut self, map: &M) {
        for marker in &mut self.markers {
            marker.reposition(map);
        }
    }

    /// An svg element covering the map with a circle for each marker. The overlay lets pointer
    /// events through to the map, except on the markers so their tooltips show.
    pub fn write_svg_to(&self, w: &mut dyn io::Write, (width, height): (Pixels, Pixels)) -> io::Result<()> {
        write_xml!(w,
            <svg xmlns="http://www.w3.org/2000/svg" width={width} height={height} style={OVERLAY_STYLE}>)?;
        for marker in &self.markers {
            marker.write_svg_fragment_to(w)?;
        }
        write_xml!(w, </svg>)
    }
}

#[cfg(test)]
mod test {
    use super::{Flow, MarkerLayer, FILTERED_RADIUS, UNFILTERED_RADIUS};
    use crate::data::{Station, Trip};
    use crate::draw::geometry::{MapView, Viewport, WebMercator};
    use crate::time::TimeFilter;
    use crate::traffic::{aggregate, StationTraffic};
    use chrono::NaiveDate;

    fn trip(from: &str, to: &str, hour: u32) -> Trip {
        let day = NaiveDate::from_ymd(2024, 3, 1);
        Trip {
            start_station_id: from.into(),
            end_station_id: to.into(),
            started_at: day.and_hms(hour, 0, 0),
            ended_at: day.and_hms(hour, 20, 0),
        }
    }

    fn stations() -> Vec<Station> {
        vec![
            Station::new("A", 42.36, -71.09),
            Station::new("B", 42.35, -71.06),
            Station::new("C", 42.37, -71.10),
            Station::new("D", 42.34, -71.08),
        ]
    }

    fn traffic(filter: TimeFilter) -> Vec<StationTraffic> {
        let trips = vec![
            trip("A", "B", 8),
            trip("A", "B", 8),
            trip("A", "C", 9),
            trip("B", "C", 17),
            trip("C", "A", 17),
        ];
        aggregate(&stations(), &trips, filter)
    }

    fn map() -> WebMercator {
        WebMercator::new(Viewport::boston(800., 600.))
    }

    #[test]
    fn colors_follow_departure_ratio() {
        let map = map();
        let mut layer = MarkerLayer::new();
        layer.render(&traffic(TimeFilter::Any), TimeFilter::Any, &map);
        let flows: Vec<_> = layer.markers().iter().map(|m| m.flow).collect();
        // A: 3 out 1 in, B: 1 out 2 in, C: 1 out 2 in, D: nothing
        assert_eq!(flows, vec![Flow::Departures, Flow::Balanced, Flow::Balanced, Flow::Idle]);
        assert_eq!(layer.markers()[3].flow.css_color(), "lightgray");
    }

    #[test]
    fn radius_ranges_depend_on_the_filter() {
        let map = map();
        let mut layer = MarkerLayer::new();
        layer.render(&traffic(TimeFilter::Any), TimeFilter::Any, &map);
        let a = layer.markers()[0].radius;
        assert_eq!(*a, UNFILTERED_RADIUS.1);
        assert_eq!(*layer.markers()[3].radius, UNFILTERED_RADIUS.0);

        let filter = TimeFilter::from_slider_value(17 * 60);
        layer.render(&traffic(filter), filter, &map);
        // D has no traffic at 17:00 and gets the minimum radius
        assert_eq!(*layer.markers()[3].radius, FILTERED_RADIUS.0);
        assert!(layer.markers().iter().all(|m| *m.radius <= FILTERED_RADIUS.1));
    }

    #[test]
    fn zero_traffic_everywhere() {
        let map = map();
        let mut layer = MarkerLayer::new();
        let filter = TimeFilter::from_slider_value(3 * 60);
        let quiet = aggregate(&stations(), &[], filter);
        layer.render(&quiet, filter, &map);
        for marker in layer.markers() {
            assert_eq!(*marker.radius, FILTERED_RADIUS.0);
            assert_eq!(marker.flow, Flow::Idle);
            assert_eq!(marker.tooltip, "0 trips (0 departures, 0 arrivals)");
        }
    }

    #[test]
    fn join_keeps_marker_identity() {
        let map = map();
        let mut layer = MarkerLayer::new();
        let summary = layer.render(&traffic(TimeFilter::Any), TimeFilter::Any, &map);
        assert_eq!((summary.entered, summary.updated, summary.exited), (4, 0, 0));
        let ids: Vec<_> = layer.markers().iter().map(|m| m.id).collect();

        let filter = TimeFilter::from_slider_value(8 * 60);
        let summary = layer.render(&traffic(filter), filter, &map);
        assert_eq!((summary.entered, summary.updated, summary.exited), (0, 4, 0));
        assert_eq!(ids, layer.markers().iter().map(|m| m.id).collect::<Vec<_>>());
        assert_eq!(layer.get(&"B".into()).unwrap().tooltip, "2 trips (0 departures, 2 arrivals)");

        let fewer: Vec<_> = traffic(TimeFilter::Any).into_iter().skip(1).collect();
        let summary = layer.render(&fewer, TimeFilter::Any, &map);
        assert_eq!((summary.entered, summary.updated, summary.exited), (0, 3, 1));
        assert!(layer.get(&"A".into()).is_none());
        assert_eq!(layer.markers()[0].id, ids[1]);
    }

    #[test]
    fn repeated_station_ids_enter_separately() {
        let map = map();
        let mut layer = MarkerLayer::new();
        let mut doubled = traffic(TimeFilter::Any);
        doubled.push(doubled[0].clone());
        let summary = layer.render(&doubled, TimeFilter::Any, &map);
        assert_eq!(summary.entered, 5);
        let summary = layer.render(&doubled, TimeFilter::Any, &map);
        assert_eq!((summary.entered, summary.updated, summary.exited), (1, 4, 1));
    }

    #[test]
    fn reposition_follows_the_viewport() {
        let map = map();
        let mut layer = MarkerLayer::new();
        layer.render(&traffic(TimeFilter::Any), TimeFilter::Any, &map);
        let before = layer.markers()[1].clone();
        map.pan_by(40., 0.);
        layer.reposition(&map);
        let after = &layer.markers()[1];
        assert!((*after.center.x - (*before.center.x - 40.)).abs() < 1e-6);
        assert_eq!(after.radius, before.radius);
        assert_eq!(after.tooltip, before.tooltip);
    }

    #[test]
    fn render_is_repeatable() {
        let map = map();
        let mut layer = MarkerLayer::new();
        let filter = TimeFilter::from_slider_value(9 * 60);
        layer.render(&traffic(filter), filter, &map);
        let first = layer.markers().to_vec();
        layer.render(&traffic(filter), filter, &map);
        assert_eq!(first, layer.markers());
    }

    #[test]
    fn svg_overlay() {
        let map = map();
        let mut layer = MarkerLayer::new();
        layer.render(&traffic(TimeFilter::Any)[..1], TimeFilter::Any, &map);
        let mut svg = Vec::new();
        layer.write_svg_to(&mut svg, map.size()).unwrap();
        let svg = String::from_utf8(svg).unwrap();
        assert!(svg.starts_with("<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"800.0\" height=\"600.0\""));
        assert!(svg.contains("pointer-events: none"));
        assert!(svg.contains("fill=\"steelblue\" stroke=\"white\" stroke-width=\"1\" opacity=\"0.6\" pointer-events=\"auto\""));
        assert!(svg.contains("r=\"25.0\""));
        assert!(svg.contains("<title>4 trips (3 departures, 1 arrivals)</title></circle>"));
        assert!(svg.trim_end().ends_with("</svg>"));
    }
}
