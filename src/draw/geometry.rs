use std::cell::{Cell, RefCell};
use std::f64::consts::PI;
use std::rc::Rc;
use std::{fmt, ops};

use super::layers::LineLayer;

/// Size of a map tile at zoom 0
const TILE_SIZE: f64 = 512.;
/// Latitudes beyond this are not representable in web mercator
const MAX_LATITUDE: f64 = 85.051_128_78;

#[derive(Debug, Default, Clone, Copy, PartialEq, PartialOrd)]
pub struct Pixels(f64);

impl Pixels {
    pub const fn new(val: f64) -> Self {
        Self(val)
    }
}

impl ops::Deref for Pixels {
    type Target = f64;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl fmt::Display for Pixels {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:.1}", self.0)
    }
}

/// A position on screen relative to the top left of the map container
#[derive(Debug, Default, Clone, Copy, PartialEq)]
pub struct ScreenPoint {
    pub x: Pixels,
    pub y: Pixels,
}

impl ScreenPoint {
    pub fn new(x: f64, y: f64) -> ScreenPoint {
        ScreenPoint {
            x: Pixels(x),
            y: Pixels(y),
        }
    }
}

/// The base map which markers are drawn over. Implementations are handles to a live map, the
/// projection reflects the viewport at the time of the call.
pub trait MapView {
    /// Screen position of a geographic point, x is longitude and y is latitude
    fn project(&self, position: geo::Point<f64>) -> ScreenPoint;

    /// Width and height of the map container
    fn size(&self) -> (Pixels, Pixels);

    /// Draw line data, such as bike lanes, underneath the markers
    fn add_line_layer(&self, layer: &LineLayer);
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub center: geo::Point<f64>,
    pub zoom: f64,
    pub width: f64,
    pub height: f64,
}

impl Viewport {
    /// Greater Boston, where the Bluebikes stations are
    pub fn boston(width: f64, height: f64) -> Viewport {
        Viewport {
            center: geo::Point::new(-71.09415, 42.36027),
            zoom: 12.,
            width,
            height,
        }
    }

    fn world_size(&self) -> f64 {
        TILE_SIZE * self.zoom.exp2()
    }

    /// Position in the world map at the current zoom, in pixels from the north west corner
    fn to_world(&self, position: geo::Point<f64>) -> (f64, f64) {
        let size = self.world_size();
        let lat = position.y().max(-MAX_LATITUDE).min(MAX_LATITUDE).to_radians();
        let x = (position.x() + 180.) / 360. * size;
        let y = (1. - (PI / 4. + lat / 2.).tan().ln() / PI) / 2. * size;
        (x, y)
    }

    fn to_geographic(&self, (x, y): (f64, f64)) -> geo::Point<f64> {
        let size = self.world_size();
        let lon = x / size * 360. - 180.;
        let lat = (PI * (1. - 2. * y / size)).sinh().atan().to_degrees();
        geo::Point::new(lon, lat)
    }

    pub fn project(&self, position: geo::Point<f64>) -> ScreenPoint {
        let (x, y) = self.to_world(position);
        let (cx, cy) = self.to_world(self.center);
        ScreenPoint::new(x - cx + self.width / 2., y - cy + self.height / 2.)
    }
}

struct MapState {
    viewport: Cell<Viewport>,
    layers: RefCell<Vec<LineLayer>>,
}

/// A web mercator map with 512px tiles. Clones share the same viewport, like handles to one map.
#[derive(Clone)]
pub struct WebMercator {
    state: Rc<MapState>,
}

impl WebMercator {
    pub const MIN_ZOOM: f64 = 5.;
    pub const MAX_ZOOM: f64 = 18.;

    pub fn new(viewport: Viewport) -> WebMercator {
        let map = WebMercator {
            state: Rc::new(MapState {
                viewport: Cell::new(viewport),
                layers: RefCell::new(vec![]),
            }),
        };
        map.zoom_to(viewport.zoom);
        map
    }

    pub fn viewport(&self) -> Viewport {
        self.state.viewport.get()
    }

    fn update(&self, f: impl FnOnce(&mut Viewport)) {
        let mut viewport = self.state.viewport.get();
        f(&mut viewport);
        self.state.viewport.set(viewport);
    }

    /// Move the map so the point `(dx, dy)` pixels from the center becomes the center
    pub fn pan_by(&self, dx: f64, dy: f64) {
        self.update(|viewport| {
            let (cx, cy) = viewport.to_world(viewport.center);
            viewport.center = viewport.to_geographic((cx + dx, cy + dy));
        });
    }

    /// Zoom around the center, clamped to the map's zoom range
    pub fn zoom_to(&self, zoom: f64) {
        let zoom = zoom.max(Self::MIN_ZOOM).min(Self::MAX_ZOOM);
        self.update(|viewport| viewport.zoom = zoom);
    }

    pub fn resize(&self, width: f64, height: f64) {
        self.update(|viewport| {
            viewport.width = width;
            viewport.height = height;
        });
    }

    pub fn jump_to(&self, center: geo::Point<f64>) {
        self.update(|viewport| viewport.center = center);
    }

    pub fn layer_ids(&self) -> Vec<String> {
        self.state.layers.borrow().iter().map(|layer| layer.id.clone()).collect()
    }
}

impl MapView for WebMercator {
    fn project(&self, position: geo::Point<f64>) -> ScreenPoint {
        self.viewport().project(position)
    }

    fn size(&self) -> (Pixels, Pixels) {
        let viewport = self.viewport();
        (Pixels(viewport.width), Pixels(viewport.height))
    }

    fn add_line_layer(&self, layer: &LineLayer) {
        let mut layers = self.state.layers.borrow_mut();
        if layers.iter().all(|existing| existing.id != layer.id) {
            layers.push(layer.clone());
        }
    }
}
