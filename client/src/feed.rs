use leptos::prelude::*;
use wasm_bindgen_futures::spawn_local;

use quakemap_shared::{EventRecord, FEED_URL, FeatureCollection, collect_records};

use crate::marker::{QuakeMarker, from_records};

/// Fetch the weekly earthquake feed. One shot: no retry, no timeout.
pub async fn fetch_earthquakes(url: &str) -> Result<Vec<EventRecord>, String> {
    let resp = gloo_net::http::Request::get(url)
        .send()
        .await
        .map_err(|e| format!("fetch error: {e}"))?;

    if !resp.ok() {
        return Err(format!("HTTP {}", resp.status()));
    }

    let collection = resp
        .json::<FeatureCollection>()
        .await
        .map_err(|e| format!("parse error: {e}"))?;

    let (records, skipped) = collect_records(&collection);
    if skipped > 0 {
        web_sys::console::warn_1(
            &format!("skipped {skipped} features without a [lon, lat, depth] triple").into(),
        );
    }
    Ok(records)
}

/// One-shot feed load on mount. Rendering never starts on partial data:
/// the marker signal is set in a single batch after the fetch resolves.
/// On failure the overlay stays empty; the base map still renders.
pub fn load_once(markers: RwSignal<Vec<QuakeMarker>>) {
    spawn_local(async move {
        match fetch_earthquakes(FEED_URL).await {
            Ok(records) => markers.set(from_records(records)),
            Err(e) => {
                web_sys::console::warn_1(&format!("Earthquake feed fetch failed: {e}").into());
            }
        }
    });
}
