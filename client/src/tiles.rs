#![cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};

use js_sys::Reflect;
use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::JsValue;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::HtmlImageElement;

use quakemap_shared::mercator::WORLD_SIZE;

use crate::viewport::Viewport;

const LOAD_CONCURRENCY: usize = 6;
/// Loaded tiles kept across both layers before distant ones are evicted.
const CACHE_TILE_BUDGET: usize = 256;
/// Cached tiles this many zoom levels away from the view are eviction fodder.
const KEEP_ZOOM_SPREAD: u32 = 2;
const ONLOAD_HANDLE_KEY: &str = "__quakemapTileOnload";
const ONERROR_HANDLE_KEY: &str = "__quakemapTileOnerror";

/// Base tile layers. Exactly one is drawn at a time; the overlay sits
/// on top of whichever is active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum BaseLayer {
    Street,
    Topographic,
}

impl BaseLayer {
    pub const ALL: [BaseLayer; 2] = [BaseLayer::Street, BaseLayer::Topographic];

    pub fn label(self) -> &'static str {
        match self {
            BaseLayer::Street => "Street Map",
            BaseLayer::Topographic => "Topographic Map",
        }
    }

    pub fn next(self) -> BaseLayer {
        match self {
            BaseLayer::Street => BaseLayer::Topographic,
            BaseLayer::Topographic => BaseLayer::Street,
        }
    }

    fn tile_url(self, coord: TileCoord) -> String {
        match self {
            BaseLayer::Street => format!(
                "https://tiles.stadiamaps.com/tiles/alidade_smooth/{}/{}/{}.png",
                coord.z, coord.x, coord.y
            ),
            BaseLayer::Topographic => format!(
                "https://a.tile.opentopomap.org/{}/{}/{}.png",
                coord.z, coord.x, coord.y
            ),
        }
    }
}

/// Slippy tile address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TileCoord {
    pub z: u32,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    /// World-space square covered by this tile: `(x0, y0, edge)`.
    pub fn world_rect(self) -> (f64, f64, f64) {
        let edge = WORLD_SIZE / (1u64 << self.z) as f64;
        (self.x as f64 * edge, self.y as f64 * edge, edge)
    }
}

/// Loaded tile images for both base layers, keyed by layer and address.
/// An entry is never replaced once present (same key means same image).
#[derive(Clone, Default)]
pub struct TileStore {
    tiles: HashMap<(BaseLayer, TileCoord), HtmlImageElement>,
}

impl TileStore {
    pub fn get(&self, layer: BaseLayer, coord: TileCoord) -> Option<&HtmlImageElement> {
        self.tiles.get(&(layer, coord))
    }

    pub fn contains(&self, layer: BaseLayer, coord: TileCoord) -> bool {
        self.tiles.contains_key(&(layer, coord))
    }

    pub fn len(&self) -> usize {
        self.tiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tiles.is_empty()
    }

    /// Cached tiles of one layer drawable under the current view,
    /// shallower zooms first so crisper tiles paint over stale ones.
    pub fn drawable(
        &self,
        layer: BaseLayer,
        zoom: u32,
        view_rect: (f64, f64, f64, f64),
    ) -> Vec<(TileCoord, HtmlImageElement)> {
        let mut out: Vec<(TileCoord, HtmlImageElement)> = self
            .tiles
            .iter()
            .filter(|&(&(l, coord), _)| {
                l == layer
                    && coord.z <= zoom
                    && coord.z + KEEP_ZOOM_SPREAD >= zoom
                    && rects_intersect(coord.world_rect(), view_rect)
            })
            .map(|(&(_, coord), image)| (coord, image.clone()))
            .collect();
        out.sort_by_key(|&(coord, _)| coord);
        out
    }
}

fn rects_intersect(tile: (f64, f64, f64), view: (f64, f64, f64, f64)) -> bool {
    let (tx, ty, edge) = tile;
    let (vx0, vy0, vx1, vy1) = view;
    tx < vx1 && tx + edge > vx0 && ty < vy1 && ty + edge > vy0
}

/// Tile addresses covering the screen at `zoom`, ordered near-to-far
/// from the view center so the middle of the map fills in first.
pub fn visible_tiles(vp: &Viewport, canvas_w: f64, canvas_h: f64, zoom: u32) -> Vec<TileCoord> {
    let n = 1u64 << zoom;
    let edge = WORLD_SIZE / n as f64;
    let max_index = (n - 1) as f64;

    let (wx0, wy0) = vp.screen_to_world(0.0, 0.0);
    let (wx1, wy1) = vp.screen_to_world(canvas_w, canvas_h);

    let x_lo = (wx0 / edge).floor().clamp(0.0, max_index) as u32;
    let x_hi = (wx1 / edge).floor().clamp(0.0, max_index) as u32;
    let y_lo = (wy0 / edge).floor().clamp(0.0, max_index) as u32;
    let y_hi = (wy1 / edge).floor().clamp(0.0, max_index) as u32;

    let (cwx, cwy) = vp.screen_to_world(canvas_w / 2.0, canvas_h / 2.0);
    let mut coords = Vec::with_capacity(((x_hi - x_lo + 1) * (y_hi - y_lo + 1)) as usize);
    for y in y_lo..=y_hi {
        for x in x_lo..=x_hi {
            coords.push(TileCoord { z: zoom, x, y });
        }
    }
    coords.sort_by(|a, b| {
        distance_sq_to(*a, cwx, cwy)
            .total_cmp(&distance_sq_to(*b, cwx, cwy))
            .then_with(|| a.cmp(b))
    });
    coords
}

fn distance_sq_to(coord: TileCoord, wx: f64, wy: f64) -> f64 {
    let (x0, y0, edge) = coord.world_rect();
    let dx = x0 + edge * 0.5 - wx;
    let dy = y0 + edge * 0.5 - wy;
    dx * dx + dy * dy
}

/// Whether a cached tile is worth keeping once the cache is over budget:
/// near the current zoom and still under (an inflated copy of) the view.
fn worth_keeping(coord: TileCoord, zoom: u32, view_rect: (f64, f64, f64, f64)) -> bool {
    if coord.z > zoom + KEEP_ZOOM_SPREAD || coord.z + KEEP_ZOOM_SPREAD < zoom {
        return false;
    }
    let (vx0, vy0, vx1, vy1) = view_rect;
    let pad_x = (vx1 - vx0) * 0.5;
    let pad_y = (vy1 - vy0) * 0.5;
    rects_intersect(
        coord.world_rect(),
        (vx0 - pad_x, vy0 - pad_y, vx1 + pad_x, vy1 + pad_y),
    )
}

/// Drop distant tiles once the cache is over budget. Tiles of the
/// inactive layer go first (switching back reloads them on demand).
pub fn evict_distant(
    store: RwSignal<TileStore>,
    active: BaseLayer,
    zoom: u32,
    view_rect: (f64, f64, f64, f64),
) {
    let over_budget = store.with_untracked(|s| s.len() > CACHE_TILE_BUDGET);
    if !over_budget {
        return;
    }
    store.update(|s| {
        s.tiles
            .retain(|&(layer, coord), _| layer == active && worth_keeping(coord, zoom, view_rect));
    });
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct LoadJob {
    layer: BaseLayer,
    coord: TileCoord,
}

thread_local! {
    static QUEUE: RefCell<VecDeque<LoadJob>> = const { RefCell::new(VecDeque::new()) };
    static PENDING: RefCell<HashSet<LoadJob>> = RefCell::new(HashSet::new());
    static IN_FLIGHT: Cell<usize> = const { Cell::new(0) };
}

/// Queue loads for every listed tile not already cached or in flight.
/// Only the active layer's tiles are ever requested.
pub fn request_tiles(store: RwSignal<TileStore>, layer: BaseLayer, coords: &[TileCoord]) {
    let mut queued = false;
    store.with_untracked(|s| {
        QUEUE.with(|queue| {
            PENDING.with(|pending| {
                let mut queue = queue.borrow_mut();
                let mut pending = pending.borrow_mut();
                for &coord in coords {
                    let job = LoadJob { layer, coord };
                    if s.contains(layer, coord) || pending.contains(&job) {
                        continue;
                    }
                    pending.insert(job);
                    queue.push_back(job);
                    queued = true;
                }
            });
        });
    });
    if queued {
        pump_queue(store);
    }
}

fn pump_queue(store: RwSignal<TileStore>) {
    while IN_FLIGHT.with(Cell::get) < LOAD_CONCURRENCY {
        let Some(job) = QUEUE.with(|queue| queue.borrow_mut().pop_front()) else {
            break;
        };
        if store.with_untracked(|s| s.contains(job.layer, job.coord)) {
            PENDING.with(|pending| pending.borrow_mut().remove(&job));
            continue;
        }
        IN_FLIGHT.with(|n| n.set(n.get() + 1));
        load_tile_job(store, job);
    }
}

fn finish_job(store: RwSignal<TileStore>, job: LoadJob) {
    IN_FLIGHT.with(|n| n.set(n.get().saturating_sub(1)));
    PENDING.with(|pending| pending.borrow_mut().remove(&job));
    pump_queue(store);
}

fn load_tile_job(store: RwSignal<TileStore>, job: LoadJob) {
    let img = match HtmlImageElement::new() {
        Ok(img) => img,
        Err(_) => {
            finish_job(store, job);
            return;
        }
    };

    let img_for_load = img.clone();
    let onload = Closure::<dyn FnMut()>::new(move || {
        clear_image_handlers(&img_for_load);

        let img_for_decode = img_for_load.clone();
        wasm_bindgen_futures::spawn_local(async move {
            let _ = JsFuture::from(img_for_decode.decode()).await;
            store.update(|s| {
                s.tiles
                    .entry((job.layer, job.coord))
                    .or_insert(img_for_decode);
            });
            finish_job(store, job);
        });
    });

    let img_for_error = img.clone();
    let onerror = Closure::<dyn FnMut()>::new(move || {
        clear_image_handlers(&img_for_error);
        finish_job(store, job);
    });

    let onload_js = onload.into_js_value();
    let onerror_js = onerror.into_js_value();
    img.set_onload(Some(onload_js.unchecked_ref()));
    img.set_onerror(Some(onerror_js.unchecked_ref()));
    let _ = Reflect::set(
        img.as_ref(),
        &JsValue::from_str(ONLOAD_HANDLE_KEY),
        &onload_js,
    );
    let _ = Reflect::set(
        img.as_ref(),
        &JsValue::from_str(ONERROR_HANDLE_KEY),
        &onerror_js,
    );
    img.set_src(&job.layer.tile_url(job.coord));
}

fn clear_image_handlers(img: &HtmlImageElement) {
    img.set_onload(None);
    img.set_onerror(None);
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONLOAD_HANDLE_KEY));
    let _ = Reflect::delete_property(img.as_ref(), &JsValue::from_str(ONERROR_HANDLE_KEY));
}

#[cfg(test)]
mod tests {
    use super::*;

    fn viewport_at(offset_x: f64, offset_y: f64, scale: f64) -> Viewport {
        Viewport {
            offset_x,
            offset_y,
            scale,
        }
    }

    #[test]
    fn tile_world_rect_halves_per_zoom() {
        let (x0, y0, edge) = TileCoord { z: 1, x: 1, y: 0 }.world_rect();
        assert_eq!((x0, y0, edge), (128.0, 0.0, 128.0));
        let (_, _, edge) = TileCoord { z: 5, x: 0, y: 0 }.world_rect();
        assert_eq!(edge, 8.0);
    }

    #[test]
    fn visible_tiles_cover_the_viewport() {
        // Whole world on a 512x512 canvas at zoom 1: all four tiles.
        let vp = viewport_at(0.0, 0.0, 2.0);
        let coords = visible_tiles(&vp, 512.0, 512.0, 1);
        assert_eq!(coords.len(), 4);
        for coord in &coords {
            assert_eq!(coord.z, 1);
        }
    }

    #[test]
    fn visible_tiles_clamp_at_world_edges() {
        // Viewport hanging off the top-left of the world.
        let vp = viewport_at(200.0, 200.0, 2.0);
        let coords = visible_tiles(&vp, 256.0, 256.0, 1);
        assert!(coords.contains(&TileCoord { z: 1, x: 0, y: 0 }));
        for coord in &coords {
            assert!(coord.x <= 1 && coord.y <= 1);
        }
    }

    #[test]
    fn visible_tiles_are_center_ordered() {
        let mut vp = viewport_at(0.0, 0.0, 8.0);
        vp.center_on(128.0, 128.0, 600.0, 400.0);
        let coords = visible_tiles(&vp, 600.0, 400.0, 3);
        let first = coords[0];
        let (x0, y0, edge) = first.world_rect();
        // The first tile's center should be the closest to the view center.
        let d_first = (x0 + edge / 2.0 - 128.0).powi(2) + (y0 + edge / 2.0 - 128.0).powi(2);
        for coord in &coords[1..] {
            let (cx, cy, ce) = coord.world_rect();
            let d = (cx + ce / 2.0 - 128.0).powi(2) + (cy + ce / 2.0 - 128.0).powi(2);
            assert!(d >= d_first);
        }
    }

    #[test]
    fn keeps_tiles_near_zoom_and_view() {
        let view = (0.0, 0.0, 64.0, 64.0);
        assert!(worth_keeping(TileCoord { z: 5, x: 0, y: 0 }, 5, view));
        assert!(worth_keeping(TileCoord { z: 3, x: 0, y: 0 }, 5, view));
        assert!(!worth_keeping(TileCoord { z: 2, x: 0, y: 0 }, 5, view));
        assert!(!worth_keeping(TileCoord { z: 8, x: 0, y: 0 }, 5, view));
        // In zoom range but far outside the inflated view.
        assert!(!worth_keeping(TileCoord { z: 5, x: 31, y: 31 }, 5, view));
    }

    #[test]
    fn layer_cycle_alternates() {
        assert_eq!(BaseLayer::Street.next(), BaseLayer::Topographic);
        assert_eq!(BaseLayer::Topographic.next(), BaseLayer::Street);
    }

    #[test]
    fn tile_urls_follow_provider_templates() {
        let coord = TileCoord { z: 5, x: 6, y: 12 };
        assert_eq!(
            BaseLayer::Street.tile_url(coord),
            "https://tiles.stadiamaps.com/tiles/alidade_smooth/5/6/12.png"
        );
        assert_eq!(
            BaseLayer::Topographic.tile_url(coord),
            "https://a.tile.opentopomap.org/5/6/12.png"
        );
    }
}
