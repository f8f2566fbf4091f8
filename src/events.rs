//! Publish/subscribe between the event sources (data loads, the time slider and the map viewport)
//! and the coordinator. Everything runs on one thread, handlers are called synchronously in
//! subscription order.

use std::rc::Rc;

use crate::data::{Station, Trip};
use crate::error::LoadError;
use crate::time::TimeFilter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dataset {
    Stations,
    Trips,
}

#[derive(Debug, Clone)]
pub enum Loaded {
    Stations(Rc<[Station]>),
    Trips(Rc<[Trip]>),
    Failed(Dataset, Rc<LoadError>),
}

/// The ways the map's viewport can change, all of them move markers on screen
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewportChange {
    Move,
    Zoom,
    Resize,
    MoveEnd,
}

#[derive(Debug, Clone)]
pub enum Event {
    DataLoaded(Loaded),
    FilterChanged(TimeFilter),
    ViewportChanged(ViewportChange),
}

impl Event {
    /// The event for an input on the time slider
    pub fn slider_input(raw: i64) -> Event {
        Event::FilterChanged(TimeFilter::from_slider_value(raw))
    }

    pub fn topic(&self) -> Topic {
        match self {
            Event::DataLoaded(_) => Topic::Data,
            Event::FilterChanged(_) => Topic::Filter,
            Event::ViewportChanged(_) => Topic::Viewport,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    Data,
    Filter,
    Viewport,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

struct Subscriber {
    id: SubscriptionId,
    topic: Topic,
    handler: Box<dyn FnMut(&Event)>,
}

pub struct EventBus {
    subscribers: Vec<Subscriber>,
    next_id: u64,
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

impl EventBus {
    pub fn new() -> EventBus {
        EventBus {
            subscribers: vec![],
            next_id: 0,
        }
    }

    pub fn subscribe<F>(&mut self, topic: Topic, handler: F) -> SubscriptionId
    where
        F: FnMut(&Event) + 'static,
    {
        let id = SubscriptionId(self.next_id);
        self.next_id += 1;
        self.subscribers.push(Subscriber {
            id,
            topic,
            handler: Box::new(handler),
        });
        id
    }

    /// Returns whether the subscription existed
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.subscribers.len();
        self.subscribers.retain(|subscriber| subscriber.id != id);
        self.subscribers.len() != before
    }

    /// Deliver to every subscriber of the event's topic, returns how many received it
    pub fn publish(&mut self, event: &Event) -> usize {
        let topic = event.topic();
        tracing::trace!(?topic, "publish");
        let mut delivered = 0;
        for subscriber in self.subscribers.iter_mut().filter(|s| s.topic == topic) {
            (subscriber.handler)(event);
            delivered += 1;
        }
        delivered
    }
}
