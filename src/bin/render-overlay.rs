use std::cell::RefCell;
use std::error::Error;
use std::io::Write;
use std::rc::Rc;

use tracing_subscriber::EnvFilter;

use bikeflow::config::Config;
use bikeflow::data::db::DataSource;
use bikeflow::draw::geometry::{Viewport, WebMercator};
use bikeflow::{Coordinator, Event, EventBus};

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    if let Err(err) = run() {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

/// Load the datasets, apply the configured time filter and write the marker overlay to stdout
fn run() -> Result<(), Box<dyn Error>> {
    let config = Config::from_env()?;

    let mut viewport = Viewport::boston(config.view_width, config.view_height);
    viewport.zoom = config.zoom;
    let map = WebMercator::new(viewport);

    let mut bus = EventBus::new();
    let coordinator = Rc::new(RefCell::new(Coordinator::new(map)));
    Coordinator::attach(&coordinator, &mut bus);

    let source = DataSource::new(&config.stations_path, &config.trips_path, config.timezone);
    if !source.publish_to(&mut bus) {
        return Err("the station or trip data could not be loaded".into());
    }
    bus.publish(&Event::FilterChanged(config.time_filter));

    let coordinator = coordinator.borrow();
    let label = coordinator.label();
    if label.any_time_visible {
        tracing::info!(stations = coordinator.traffic().len(), "showing trips at any time");
    } else {
        tracing::info!(stations = coordinator.traffic().len(), time = %label.selected_time, "showing trips around");
    }

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    coordinator.write_svg_to(&mut out)?;
    out.flush()?;
    Ok(())
}
