/// A GeoJSON line source drawn by the base map
#[derive(Debug, Clone, PartialEq)]
pub struct LineLayer {
    pub id: String,
    pub source_url: String,
    pub color: &'static str,
    pub width: f64,
    pub opacity: f64,
}

const BIKE_LANE_COLOR: &str = "#32D400";
const BIKE_LANE_WIDTH: f64 = 3.;
const BIKE_LANE_OPACITY: f64 = 0.6;

const BOSTON_BIKE_NETWORK: &str =
    "https://bostonopendata-boston.opendata.arcgis.com/datasets/boston::existing-bike-network-2022.geojson";
const CAMBRIDGE_BIKE_FACILITIES: &str =
    "https://raw.githubusercontent.com/cambridgegis/cambridgegis_data/main/Recreation/Bike_Facilities/RECREATION_BikeFacilities.geojson";

impl LineLayer {
    fn bike_lanes(id: &str, source_url: &str) -> LineLayer {
        LineLayer {
            id: id.to_owned(),
            source_url: source_url.to_owned(),
            color: BIKE_LANE_COLOR,
            width: BIKE_LANE_WIDTH,
            opacity: BIKE_LANE_OPACITY,
        }
    }
}

/// Boston and Cambridge bike lanes, all drawn in the same style
pub fn bike_lane_layers() -> Vec<LineLayer> {
    vec![
        LineLayer::bike_lanes("boston-bike-lanes", BOSTON_BIKE_NETWORK),
        LineLayer::bike_lanes("cambridge-bike-lanes", CAMBRIDGE_BIKE_FACILITIES),
    ]
}
