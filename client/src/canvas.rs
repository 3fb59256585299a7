use std::cell::{Cell, RefCell};
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::JsCast;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, PointerEvent, TouchEvent, WheelEvent};

use crate::app::{ActiveBaseLayer, CanvasSize, Hovered, OverlayVisible, Pinned};
use crate::marker::{self, QuakeMarker};
use crate::spatial::SpatialGrid;
use crate::tiles::{self, BaseLayer, TileStore};
use crate::viewport::Viewport;

/// Pointer travel under this many pixels between down and up counts as a click.
const CLICK_SLOP_PX: f64 = 5.0;
/// Wash behind tiles that have not arrived yet.
const BACKDROP_CSS: &str = "#d8d4cc";

/// Canvas 2D map: active base-layer tiles below, earthquake markers on top.
#[component]
pub fn MapCanvas() -> impl IntoView {
    let markers: RwSignal<Vec<QuakeMarker>> = expect_context();
    let viewport: RwSignal<Viewport> = expect_context();
    let tile_store: RwSignal<TileStore> = expect_context();
    let mouse_pos: RwSignal<(f64, f64)> = expect_context();
    let Hovered(hovered) = expect_context();
    let Pinned(pinned) = expect_context();
    let ActiveBaseLayer(base_layer) = expect_context();
    let OverlayVisible(overlay_visible) = expect_context();
    let CanvasSize(canvas_size) = expect_context();

    let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
    let cached_ctx: Rc<RefCell<Option<CanvasRenderingContext2d>>> = Rc::new(RefCell::new(None));

    // Drag / pinch state
    let is_dragging = Rc::new(Cell::new(false));
    let drag_start = Rc::new(Cell::new((0.0f64, 0.0f64)));
    let last_pos = Rc::new(Cell::new((0.0f64, 0.0f64)));
    let pinch_dist = Rc::new(Cell::new(0.0f64));

    // Spatial grid for marker hit-testing
    let spatial_grid: Rc<RefCell<SpatialGrid>> = Rc::new(RefCell::new(SpatialGrid::build(&[])));
    let grid_for_move = spatial_grid.clone();
    let grid_for_click = spatial_grid.clone();

    // Rebuild the grid when the marker set changes (once per page load in
    // practice); indices shift, so any hover/pin is stale.
    Effect::new({
        let grid = spatial_grid.clone();
        move || {
            markers.with(|m| {
                *grid.borrow_mut() = SpatialGrid::build(m);
            });
            hovered.set(None);
            pinned.set(None);
        }
    });

    // Center the fixed initial view once the canvas has a size.
    let vp_initialized = Rc::new(Cell::new(false));
    Effect::new({
        let vp_initialized = vp_initialized.clone();
        move || {
            let (w, h) = canvas_size.get();
            if w <= 0.0 || h <= 0.0 || vp_initialized.get() {
                return;
            }
            vp_initialized.set(true);
            viewport.update(|vp| vp.reset(w, h));
        }
    });

    // Keep the active layer's visible tiles requested; trim the cache when
    // it outgrows its budget.
    Effect::new(move || {
        let (w, h) = canvas_size.get();
        let layer = base_layer.get();
        let vp = viewport.get();
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let zoom = vp.tile_zoom();
        let wanted = tiles::visible_tiles(&vp, w, h, zoom);
        tiles::request_tiles(tile_store, layer, &wanted);

        let (vx0, vy0) = vp.screen_to_world(0.0, 0.0);
        let (vx1, vy1) = vp.screen_to_world(w, h);
        tiles::evict_distant(tile_store, layer, zoom, (vx0, vy0, vx1, vy1));
    });

    // Redraw whenever any render input changes.
    Effect::new({
        let cached_ctx = cached_ctx.clone();
        move || {
            let (w, h) = canvas_size.get();
            let vp = viewport.get();
            let layer = base_layer.get();
            let overlay_on = overlay_visible.get();
            let hov = hovered.get();
            let pin = pinned.get();
            let Some(canvas) = canvas_ref.get() else {
                return;
            };
            tile_store.with(|store| {
                markers.with(|markers| {
                    draw_map(DrawInput {
                        canvas: &canvas,
                        cached_ctx: &cached_ctx,
                        vp: &vp,
                        store,
                        layer,
                        markers,
                        overlay_on,
                        hovered: hov,
                        pinned: pin,
                        css_w: w,
                        css_h: h,
                    });
                });
            });
        }
    });

    let on_pointer_down = {
        let is_dragging = is_dragging.clone();
        let drag_start = drag_start.clone();
        let last_pos = last_pos.clone();
        move |e: PointerEvent| {
            let pos = (e.offset_x() as f64, e.offset_y() as f64);
            is_dragging.set(true);
            drag_start.set(pos);
            last_pos.set(pos);
            if let Some(target) = e
                .target()
                .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
            {
                target.set_pointer_capture(e.pointer_id()).ok();
            }
        }
    };

    let on_pointer_move = {
        let is_dragging = is_dragging.clone();
        let last_pos = last_pos.clone();
        move |e: PointerEvent| {
            let pos = (e.offset_x() as f64, e.offset_y() as f64);
            mouse_pos.set((e.client_x() as f64, e.client_y() as f64));

            if is_dragging.get() {
                let (lx, ly) = last_pos.get();
                last_pos.set(pos);
                viewport.update(|vp| vp.pan(pos.0 - lx, pos.1 - ly));
                return;
            }

            let vp = viewport.get_untracked();
            let (wx, wy) = vp.screen_to_world(pos.0, pos.1);
            let hit = grid_for_move.borrow().find_at(wx, wy, vp.scale);
            if hovered.get_untracked() != hit {
                hovered.set(hit);
            }
        }
    };

    let on_pointer_up = {
        let is_dragging = is_dragging.clone();
        let drag_start = drag_start.clone();
        move |e: PointerEvent| {
            if !is_dragging.get() {
                return;
            }
            is_dragging.set(false);
            if let Some(target) = e
                .target()
                .and_then(|t| t.dyn_into::<web_sys::Element>().ok())
            {
                target.release_pointer_capture(e.pointer_id()).ok();
            }

            let pos = (e.offset_x() as f64, e.offset_y() as f64);
            let (sx, sy) = drag_start.get();
            let moved = ((pos.0 - sx).powi(2) + (pos.1 - sy).powi(2)).sqrt();
            if moved < CLICK_SLOP_PX {
                let vp = viewport.get_untracked();
                let (wx, wy) = vp.screen_to_world(pos.0, pos.1);
                let hit = grid_for_click.borrow().find_at(wx, wy, vp.scale);
                pinned.set(hit);
            }
        }
    };

    let on_pointer_leave = {
        let is_dragging = is_dragging.clone();
        move |_e: PointerEvent| {
            is_dragging.set(false);
            if hovered.get_untracked().is_some() {
                hovered.set(None);
            }
        }
    };

    let on_wheel = move |e: WheelEvent| {
        e.prevent_default();
        viewport.update(|vp| {
            vp.zoom_at(e.delta_y(), e.offset_x() as f64, e.offset_y() as f64);
        });
    };

    let on_touch_start = {
        let pinch_dist = pinch_dist.clone();
        let is_dragging = is_dragging.clone();
        move |e: TouchEvent| {
            if let Some(dist) = pinch_distance(&e) {
                is_dragging.set(false);
                pinch_dist.set(dist);
            }
        }
    };

    let on_touch_move = {
        let pinch_dist = pinch_dist.clone();
        move |e: TouchEvent| {
            let Some(dist) = pinch_distance(&e) else {
                return;
            };
            e.prevent_default();
            let prev = pinch_dist.get();
            pinch_dist.set(dist);
            if prev <= 0.0 {
                return;
            }
            let Some((mx, my)) = pinch_midpoint(&e, canvas_ref) else {
                return;
            };
            viewport.update(|vp| vp.zoom_by_ratio(dist / prev, mx, my));
        }
    };

    let on_touch_end = {
        let pinch_dist = pinch_dist.clone();
        move |_e: TouchEvent| {
            pinch_dist.set(0.0);
        }
    };

    view! {
        <canvas
            node_ref=canvas_ref
            on:pointerdown=on_pointer_down
            on:pointermove=on_pointer_move
            on:pointerup=on_pointer_up
            on:pointerleave=on_pointer_leave
            on:wheel=on_wheel
            on:touchstart=on_touch_start
            on:touchmove=on_touch_move
            on:touchend=on_touch_end
            style="position: absolute; inset: 0; width: 100%; height: 100%; display: block; cursor: grab; touch-action: none;"
        />
    }
}

fn pinch_distance(e: &TouchEvent) -> Option<f64> {
    let touches = e.touches();
    if touches.length() != 2 {
        return None;
    }
    let a = touches.get(0)?;
    let b = touches.get(1)?;
    let dx = (a.client_x() - b.client_x()) as f64;
    let dy = (a.client_y() - b.client_y()) as f64;
    Some((dx * dx + dy * dy).sqrt())
}

fn pinch_midpoint(e: &TouchEvent, canvas_ref: NodeRef<leptos::html::Canvas>) -> Option<(f64, f64)> {
    let touches = e.touches();
    let a = touches.get(0)?;
    let b = touches.get(1)?;
    let canvas = canvas_ref.get_untracked()?;
    let rect = canvas.get_bounding_client_rect();
    let mx = (a.client_x() + b.client_x()) as f64 / 2.0 - rect.left();
    let my = (a.client_y() + b.client_y()) as f64 / 2.0 - rect.top();
    Some((mx, my))
}

struct DrawInput<'a> {
    canvas: &'a HtmlCanvasElement,
    cached_ctx: &'a RefCell<Option<CanvasRenderingContext2d>>,
    vp: &'a Viewport,
    store: &'a TileStore,
    layer: BaseLayer,
    markers: &'a [QuakeMarker],
    overlay_on: bool,
    hovered: Option<usize>,
    pinned: Option<usize>,
    css_w: f64,
    css_h: f64,
}

fn draw_map(input: DrawInput<'_>) {
    let DrawInput {
        canvas,
        cached_ctx,
        vp,
        store,
        layer,
        markers,
        overlay_on,
        hovered,
        pinned,
        css_w,
        css_h,
    } = input;

    let dpr = web_sys::window()
        .map(|w| w.device_pixel_ratio())
        .unwrap_or(1.0)
        .max(1.0);
    let px_w = (css_w * dpr) as u32;
    let px_h = (css_h * dpr) as u32;
    if canvas.width() != px_w || canvas.height() != px_h {
        canvas.set_width(px_w);
        canvas.set_height(px_h);
        *cached_ctx.borrow_mut() = None;
    }

    let ctx = {
        let mut cache = cached_ctx.borrow_mut();
        if cache.is_none() {
            let Some(ctx) = canvas
                .get_context("2d")
                .ok()
                .flatten()
                .and_then(|ctx| ctx.dyn_into::<CanvasRenderingContext2d>().ok())
            else {
                return;
            };
            *cache = Some(ctx);
        }
        let Some(ctx) = cache.clone() else {
            return;
        };
        ctx
    };
    ctx.set_transform(dpr, 0.0, 0.0, dpr, 0.0, 0.0).ok();

    ctx.set_fill_style_str(BACKDROP_CSS);
    ctx.fill_rect(0.0, 0.0, css_w, css_h);

    // Base layer: every cached tile near the current zoom that overlaps
    // the view, shallow zooms first so crisp tiles land on top.
    let zoom = vp.tile_zoom();
    let (vx0, vy0) = vp.screen_to_world(0.0, 0.0);
    let (vx1, vy1) = vp.screen_to_world(css_w, css_h);
    for (coord, image) in store.drawable(layer, zoom, (vx0, vy0, vx1, vy1)) {
        let (x0, y0, edge) = coord.world_rect();
        let (sx, sy) = vp.world_to_screen(x0, y0);
        let size = edge * vp.scale;
        ctx.draw_image_with_html_image_element_and_dw_and_dh(&image, sx, sy, size, size)
            .ok();
    }

    if !overlay_on {
        return;
    }

    // Earthquake overlay, insertion order: later events draw on top.
    ctx.set_line_width(marker::STROKE_WIDTH);
    for (idx, m) in markers.iter().enumerate() {
        let (sx, sy) = vp.world_to_screen(m.world_x, m.world_y);
        // arc() rejects negative radii; negative-magnitude events draw as points.
        let radius = m.radius.max(0.0);
        if sx + radius < 0.0 || sy + radius < 0.0 || sx - radius > css_w || sy - radius > css_h {
            continue;
        }

        let active = hovered == Some(idx) || pinned == Some(idx);
        ctx.begin_path();
        ctx.arc(sx, sy, radius, 0.0, std::f64::consts::TAU).ok();
        ctx.set_fill_style_str(if active {
            &m.cached.fill_active
        } else {
            &m.cached.fill
        });
        ctx.fill();
        ctx.set_stroke_style_str(marker::STROKE_CSS);
        ctx.stroke();
    }
}
