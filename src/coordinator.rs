//! Application state between the events and the markers: which datasets have loaded, the active
//! time filter, the traffic derived from it and the markers drawn for that traffic.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;

use crate::data::{Station, Store};
use crate::draw::geometry::MapView;
use crate::draw::layers::bike_lane_layers;
use crate::draw::markers::MarkerLayer;
use crate::events::{Event, EventBus, Loaded, SubscriptionId, Topic, ViewportChange};
use crate::time::{FilterLabel, TimeFilter};
use crate::traffic::{aggregate, StationTraffic};

/// Stations load first, then trips. Nothing is aggregated or drawn before `Ready`.
#[derive(Debug, Clone)]
pub enum LoadState {
    Uninitialized,
    StationsLoaded(Rc<[Station]>),
    Ready(Store),
    /// A dataset failed to load, there is no retry
    Failed,
}

/// What an event caused to be redrawn
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refresh {
    None,
    /// aggregated again, then restyled and repositioned every marker
    Full,
    /// only moved the markers
    Positions,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct RefreshStats {
    pub aggregations: usize,
    pub full_renders: usize,
    pub position_renders: usize,
}

pub struct Coordinator<M> {
    map: M,
    state: LoadState,
    filter: TimeFilter,
    traffic: Vec<StationTraffic>,
    layer: MarkerLayer,
    stats: RefreshStats,
}

impl<M: MapView> Coordinator<M> {
    pub fn new(map: M) -> Coordinator<M> {
        Coordinator {
            map,
            state: LoadState::Uninitialized,
            filter: TimeFilter::default(),
            traffic: vec![],
            layer: MarkerLayer::new(),
            stats: RefreshStats::default(),
        }
    }

    /// Add the bike lanes to the map and subscribe to every topic on `bus`
    pub fn attach(coordinator: &Rc<RefCell<Self>>, bus: &mut EventBus) -> Vec<SubscriptionId>
    where
        M: 'static,
    {
        for layer in bike_lane_layers() {
            coordinator.borrow().map.add_line_layer(&layer);
        }
        [Topic::Data, Topic::Filter, Topic::Viewport]
            .iter()
            .map(|&topic| {
                let coordinator = Rc::clone(coordinator);
                bus.subscribe(topic, move |event| {
                    coordinator.borrow_mut().handle(event);
                })
            })
            .collect()
    }

    pub fn handle(&mut self, event: &Event) -> Refresh {
        match event {
            Event::DataLoaded(loaded) => self.loaded(loaded),
            Event::FilterChanged(filter) => {
                self.filter = *filter;
                if self.is_ready() {
                    self.refresh_traffic()
                } else {
                    tracing::debug!(filter = %filter, "data not ready, filter kept for later");
                    Refresh::None
                }
            }
            Event::ViewportChanged(change) => self.viewport_changed(*change),
        }
    }

    fn loaded(&mut self, loaded: &Loaded) -> Refresh {
        if let LoadState::Failed = self.state {
            tracing::warn!("ignoring data after a failed load");
            return Refresh::None;
        }
        match loaded {
            Loaded::Failed(dataset, err) if self.is_ready() => {
                tracing::warn!(?dataset, error = %err, "data was already loaded, ignoring failure");
                Refresh::None
            }
            Loaded::Failed(dataset, err) => {
                tracing::error!(?dataset, error = %err, "failed to load data");
                self.state = LoadState::Failed;
                Refresh::None
            }
            Loaded::Stations(stations) => match self.state {
                LoadState::Uninitialized => {
                    tracing::info!(stations = stations.len(), "stations loaded");
                    self.state = LoadState::StationsLoaded(Rc::clone(stations));
                    Refresh::None
                }
                _ => {
                    tracing::warn!("stations were already loaded, ignoring");
                    Refresh::None
                }
            },
            Loaded::Trips(trips) => match &self.state {
                LoadState::StationsLoaded(stations) => {
                    tracing::info!(trips = trips.len(), "trips loaded");
                    self.state = LoadState::Ready(Store::new(Rc::clone(stations), Rc::clone(trips)));
                    self.refresh_traffic()
                }
                LoadState::Uninitialized => {
                    tracing::warn!("trips arrived before stations, ignoring");
                    Refresh::None
                }
                _ => {
                    tracing::warn!("trips were already loaded, ignoring");
                    Refresh::None
                }
            },
        }
    }

    fn viewport_changed(&mut self, change: ViewportChange) -> Refresh {
        if !self.is_ready() {
            return Refresh::None;
        }
        tracing::trace!(?change, "repositioning markers");
        self.layer.reposition(&self.map);
        self.stats.position_renders += 1;
        Refresh::Positions
    }

    fn refresh_traffic(&mut self) -> Refresh {
        let store = match &self.state {
            LoadState::Ready(store) => store,
            _ => return Refresh::None,
        };
        self.traffic = aggregate(store.stations(), store.trips(), self.filter);
        self.stats.aggregations += 1;
        self.layer.render(&self.traffic, self.filter, &self.map);
        self.stats.full_renders += 1;
        Refresh::Full
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.state, LoadState::Ready(_))
    }

    pub fn filter(&self) -> TimeFilter {
        self.filter
    }

    pub fn label(&self) -> FilterLabel {
        self.filter.label()
    }

    /// Traffic of the last aggregation, empty before the data is ready
    pub fn traffic(&self) -> &[StationTraffic] {
        &self.traffic
    }

    pub fn markers(&self) -> &MarkerLayer {
        &self.layer
    }

    pub fn stats(&self) -> RefreshStats {
        self.stats
    }

    pub fn map(&self) -> &M {
        &self.map
    }

    /// The marker overlay, sized to the map
    pub fn write_svg_to(&self, w: &mut dyn io::Write) -> io::Result<()> {
        self.layer.write_svg_to(w, self.map.size())
    }
}
