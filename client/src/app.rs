use std::cell::RefCell;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use wasm_bindgen::closure::Closure;

use gloo_storage::Storage;

use crate::canvas::MapCanvas;
use crate::colors::rgba_css;
use crate::controls::{LayerControl, Legend};
use crate::feed;
use crate::marker::QuakeMarker;
use crate::tiles::{BaseLayer, TileStore};
use crate::viewport::Viewport;

pub(crate) fn canvas_dimensions() -> (f64, f64) {
    let Some(window) = web_sys::window() else {
        return (1200.0, 800.0);
    };
    let w = window
        .inner_width()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(1200.0);
    let h = window
        .inner_height()
        .ok()
        .and_then(|v| v.as_f64())
        .unwrap_or(800.0);
    (w, h)
}

/// Newtype wrappers so same-shaped signals stay distinct in Leptos
/// context (two bare `RwSignal<Option<usize>>`s would overwrite each
/// other in `provide_context`).
#[derive(Clone, Copy)]
pub(crate) struct Hovered(pub RwSignal<Option<usize>>);
#[derive(Clone, Copy)]
pub(crate) struct Pinned(pub RwSignal<Option<usize>>);
#[derive(Clone, Copy)]
pub(crate) struct ActiveBaseLayer(pub RwSignal<BaseLayer>);
#[derive(Clone, Copy)]
pub(crate) struct OverlayVisible(pub RwSignal<bool>);
#[derive(Clone, Copy)]
pub(crate) struct CanvasSize(pub RwSignal<(f64, f64)>);

struct KeydownBinding {
    window: web_sys::Window,
    _handler: Closure<dyn Fn(web_sys::KeyboardEvent)>,
}

struct ResizeBinding {
    window: web_sys::Window,
    _handler: Closure<dyn Fn()>,
}

thread_local! {
    static KEYDOWN_BINDING: RefCell<Option<KeydownBinding>> = const { RefCell::new(None) };
    static RESIZE_BINDING: RefCell<Option<ResizeBinding>> = const { RefCell::new(None) };
}

#[derive(serde::Serialize, serde::Deserialize)]
#[serde(default)]
struct Settings {
    base_layer: BaseLayer,
    show_earthquakes: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            base_layer: BaseLayer::Street,
            show_earthquakes: true,
        }
    }
}

/// Root application component. Provides global reactive signals via
/// context, fetches the feed once, and wires window-level listeners.
#[component]
pub fn App() -> impl IntoView {
    let markers: RwSignal<Vec<QuakeMarker>> = RwSignal::new(Vec::new());
    let viewport: RwSignal<Viewport> = RwSignal::new(Viewport::default());
    let tile_store: RwSignal<TileStore> = RwSignal::new(TileStore::default());
    let mouse_pos: RwSignal<(f64, f64)> = RwSignal::new((0.0, 0.0));
    let canvas_size: RwSignal<(f64, f64)> = RwSignal::new(canvas_dimensions());
    let hovered: RwSignal<Option<usize>> = RwSignal::new(None);
    let pinned: RwSignal<Option<usize>> = RwSignal::new(None);

    let saved: Settings = gloo_storage::LocalStorage::get("quakemap_settings").unwrap_or_default();
    let base_layer: RwSignal<BaseLayer> = RwSignal::new(saved.base_layer);
    let show_earthquakes: RwSignal<bool> = RwSignal::new(saved.show_earthquakes);

    provide_context(markers);
    provide_context(viewport);
    provide_context(tile_store);
    provide_context(mouse_pos);
    provide_context(Hovered(hovered));
    provide_context(Pinned(pinned));
    provide_context(ActiveBaseLayer(base_layer));
    provide_context(OverlayVisible(show_earthquakes));
    provide_context(CanvasSize(canvas_size));

    // Persist layer choices to localStorage on any change
    Effect::new(move || {
        let settings = Settings {
            base_layer: base_layer.get(),
            show_earthquakes: show_earthquakes.get(),
        };
        let _ = gloo_storage::LocalStorage::set("quakemap_settings", &settings);
    });

    // The single feed fetch of the page load
    Effect::new(move || {
        feed::load_once(markers);
    });

    // Track window size for the canvas
    Effect::new(move || {
        let Some(window) = web_sys::window() else {
            return;
        };

        RESIZE_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "resize",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });

        let handler = Closure::<dyn Fn()>::new(move || {
            canvas_size.set(canvas_dimensions());
        });
        if window
            .add_event_listener_with_callback("resize", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            RESIZE_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(ResizeBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    // Global keyboard shortcuts
    Effect::new(move || {
        let Some(window) = web_sys::window() else {
            return;
        };

        KEYDOWN_BINDING.with(|slot| {
            if let Some(old) = slot.borrow_mut().take() {
                let _ = old.window.remove_event_listener_with_callback(
                    "keydown",
                    old._handler.as_ref().unchecked_ref(),
                );
            }
        });

        let handler =
            Closure::<dyn Fn(web_sys::KeyboardEvent)>::new(move |e: web_sys::KeyboardEvent| {
                match e.key().as_str() {
                    "Escape" => {
                        pinned.set(None);
                        hovered.set(None);
                    }
                    "+" | "=" => {
                        e.prevent_default();
                        let (cw, ch) = canvas_size.get_untracked();
                        viewport.update(|vp| vp.zoom_at(-120.0, cw / 2.0, ch / 2.0));
                    }
                    "-" => {
                        e.prevent_default();
                        let (cw, ch) = canvas_size.get_untracked();
                        viewport.update(|vp| vp.zoom_at(120.0, cw / 2.0, ch / 2.0));
                    }
                    "ArrowLeft" => {
                        e.prevent_default();
                        viewport.update(|vp| vp.pan(60.0, 0.0));
                    }
                    "ArrowRight" => {
                        e.prevent_default();
                        viewport.update(|vp| vp.pan(-60.0, 0.0));
                    }
                    "ArrowUp" => {
                        e.prevent_default();
                        viewport.update(|vp| vp.pan(0.0, 60.0));
                    }
                    "ArrowDown" => {
                        e.prevent_default();
                        viewport.update(|vp| vp.pan(0.0, -60.0));
                    }
                    "r" | "0" => {
                        let (cw, ch) = canvas_size.get_untracked();
                        viewport.update(|vp| vp.reset(cw, ch));
                    }
                    "b" => {
                        base_layer.update(|layer| *layer = layer.next());
                    }
                    "e" => {
                        show_earthquakes.update(|v| *v = !*v);
                    }
                    _ => {}
                }
            });

        if window
            .add_event_listener_with_callback("keydown", handler.as_ref().unchecked_ref())
            .is_ok()
        {
            KEYDOWN_BINDING.with(|slot| {
                *slot.borrow_mut() = Some(KeydownBinding {
                    window: window.clone(),
                    _handler: handler,
                });
            });
        }
    });

    view! {
        <div style="width: 100%; height: 100%; position: relative; overflow: hidden; background: #0c0e17;">
            <MapCanvas />
            <LayerControl />
            <Legend />
        </div>
        <Popup />
    }
}

/// Popup describing one event. Follows the cursor while hovering;
/// clicking a marker pins it in place until Escape or a click elsewhere.
#[component]
fn Popup() -> impl IntoView {
    let markers: RwSignal<Vec<QuakeMarker>> = expect_context();
    let viewport: RwSignal<Viewport> = expect_context();
    let mouse_pos: RwSignal<(f64, f64)> = expect_context();
    let Hovered(hovered) = expect_context();
    let Pinned(pinned) = expect_context();

    let popup_info = Memo::new(move |_| {
        let pinned_idx = pinned.get();
        let idx = pinned_idx.or(hovered.get())?;
        let marker = markers.with(|ms| ms.get(idx).cloned())?;
        let (x, y) = if pinned_idx.is_some() {
            // Anchor above the marker; the canvas fills the window, so
            // its screen coordinates are client coordinates.
            let vp = viewport.get();
            let (sx, sy) = vp.world_to_screen(marker.world_x, marker.world_y);
            (sx + 12.0, sy - marker.radius.max(0.0) - 10.0)
        } else {
            let (mx, my) = mouse_pos.get();
            (mx + 16.0, my - 8.0)
        };
        Some((marker, x, y))
    });

    view! {
        {move || {
            let Some((marker, x, y)) = popup_info.get() else {
                return view! { <div style="display:none;" /> }.into_any();
            };
            let (r, g, b) = marker.fill_rgb;
            let [place, magnitude, depth, time] = marker.popup.clone();
            view! {
                <div
                    style:left=format!("{x}px")
                    style:top=format!("{y}px")
                    style="position: fixed; pointer-events: none; z-index: 100; background: #161921; border: 1px solid #282c3e; border-radius: 6px; overflow: hidden; box-shadow: 0 4px 16px rgba(0,0,0,0.5); max-width: 240px; display: flex; flex-direction: row;"
                >
                    <div style=format!("width: 3px; flex-shrink: 0; background: {};", rgba_css(r, g, b, 0.85)) />
                    <div style="padding: 8px 10px; flex: 1;">
                        <div style="font-size: 0.82rem; font-weight: 700; color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif; line-height: 1.3;">
                            {place}
                        </div>
                        <div style="font-size: 0.72rem; color: #e2e0d8; font-family: 'JetBrains Mono', monospace; margin-top: 4px; padding-top: 4px; border-top: 1px solid rgba(40,44,62,0.5); display: flex; justify-content: space-between; gap: 8px;">
                            <span>{magnitude}</span>
                            <span style="color: #9a9590;">{depth}</span>
                        </div>
                        <div style="font-size: 0.65rem; color: #9a9590; font-family: 'JetBrains Mono', monospace; margin-top: 3px;">
                            {time}
                        </div>
                    </div>
                </div>
            }.into_any()
        }}
    }
}
