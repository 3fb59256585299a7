use serde::{Deserialize, Serialize};

/// USGS GeoJSON summary feed: all earthquakes from the past week.
pub const FEED_URL: &str =
    "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/all_week.geojson";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCollection {
    pub features: Vec<Feature>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Feature {
    pub geometry: Geometry,
    pub properties: Properties,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Geometry {
    /// `[lon, lat, depth_km]` per the GeoJSON point convention.
    pub coordinates: Vec<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Properties {
    pub mag: f64,
    pub place: String,
    /// Epoch milliseconds.
    pub time: i64,
}

/// One earthquake event, projected out of the feed. Read-only after the
/// fetch completes.
#[derive(Debug, Clone, PartialEq)]
pub struct EventRecord {
    pub lat: f64,
    pub lon: f64,
    pub depth_km: f64,
    pub magnitude: f64,
    pub place: String,
    pub time_ms: i64,
}

impl Feature {
    /// `None` when the coordinate array is too short to carry a depth.
    pub fn to_record(&self) -> Option<EventRecord> {
        let &[lon, lat, depth_km] = self.geometry.coordinates.first_chunk::<3>()?;
        Some(EventRecord {
            lat,
            lon,
            depth_km,
            magnitude: self.properties.mag,
            place: self.properties.place.clone(),
            time_ms: self.properties.time,
        })
    }
}

/// Convert a fetched collection into event records, dropping features
/// without a full `[lon, lat, depth]` triple. Returns the records and
/// how many features were dropped.
pub fn collect_records(collection: &FeatureCollection) -> (Vec<EventRecord>, usize) {
    let records: Vec<EventRecord> = collection
        .features
        .iter()
        .filter_map(Feature::to_record)
        .collect();
    let skipped = collection.features.len() - records.len();
    (records, skipped)
}
