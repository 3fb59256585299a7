use leptos::prelude::*;

use quakemap_shared::depth::LEGEND;

use crate::app::{ActiveBaseLayer, OverlayVisible};
use crate::colors::rgba_css;
use crate::tiles::BaseLayer;

/// Always-expanded layer switcher, top right: a radio row per base layer
/// (exactly one active) and a checkbox row for the earthquake overlay.
#[component]
pub fn LayerControl() -> impl IntoView {
    view! {
        <div style="position: absolute; top: 16px; right: 16px; z-index: 10; min-width: 180px; background: #13161f; border: 1px solid #282c3e; border-radius: 6px; box-shadow: 0 4px 16px rgba(0,0,0,0.5); overflow: hidden;">
            <div style="padding: 8px 12px 4px; font-size: 0.68rem; text-transform: uppercase; letter-spacing: 0.12em; color: #5a5860; font-family: 'Inter', system-ui, sans-serif;">"Layers"</div>
            <div style="padding: 0 6px 4px;">
                {BaseLayer::ALL
                    .iter()
                    .map(|&layer| view! { <BaseLayerRow layer=layer /> })
                    .collect_view()}
            </div>
            <div style="border-top: 1px solid rgba(40,44,62,0.5); padding: 4px 6px 6px;">
                <OverlayRow />
            </div>
        </div>
    }
}

#[component]
fn BaseLayerRow(layer: BaseLayer) -> impl IntoView {
    let ActiveBaseLayer(active) = expect_context();

    view! {
        <div
            style="display: flex; align-items: center; gap: 8px; padding: 7px 8px; border-radius: 4px; cursor: pointer;"
            on:click=move |_| active.set(layer)
        >
            <span style=move || {
                let selected = active.get() == layer;
                format!(
                    "width: 12px; height: 12px; border-radius: 50%; flex-shrink: 0; border: 2px solid {}; background: {}; transition: border-color 0.15s, background 0.15s;",
                    if selected { "#f5c542" } else { "#2a2e40" },
                    if selected { "#f5c542" } else { "transparent" },
                )
            } />
            <span style="font-size: 0.85rem; color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif;">
                {layer.label()}
            </span>
        </div>
    }
}

#[component]
fn OverlayRow() -> impl IntoView {
    let OverlayVisible(visible) = expect_context();

    view! {
        <div
            style="display: flex; align-items: center; gap: 8px; padding: 7px 8px; border-radius: 4px; cursor: pointer;"
            on:click=move |_| visible.update(|v| *v = !*v)
        >
            <span style=move || {
                let on = visible.get();
                format!(
                    "display: flex; align-items: center; justify-content: center; width: 12px; height: 12px; border-radius: 3px; flex-shrink: 0; font-size: 10px; line-height: 1; color: #0c0e17; border: 2px solid {}; background: {}; transition: border-color 0.15s, background 0.15s;",
                    if on { "#f5c542" } else { "#2a2e40" },
                    if on { "#f5c542" } else { "transparent" },
                )
            }>
                {move || if visible.get() { "\u{2713}" } else { "" }}
            </span>
            <span style="font-size: 0.85rem; color: #e2e0d8; font-family: 'Inter', system-ui, sans-serif;">
                "Earthquakes"
            </span>
        </div>
    }
}

/// Fixed depth legend, bottom right: the six bucket rows, shallowest
/// first, straight from `LEGEND`.
#[component]
pub fn Legend() -> impl IntoView {
    view! {
        <div style="position: absolute; bottom: 16px; right: 16px; z-index: 10; background: #13161f; border: 1px solid #282c3e; border-radius: 6px; box-shadow: 0 4px 16px rgba(0,0,0,0.5); padding: 10px 12px;">
            <div style="font-size: 0.68rem; text-transform: uppercase; letter-spacing: 0.12em; color: #5a5860; margin-bottom: 6px; font-family: 'Inter', system-ui, sans-serif;">
                "Depth (km)"
            </div>
            {LEGEND
                .iter()
                .map(|&(label, (r, g, b))| view! {
                    <div style="display: flex; align-items: center; gap: 8px; padding: 2px 0;">
                        <span style=format!(
                            "width: 14px; height: 14px; border-radius: 3px; flex-shrink: 0; border: 1px solid rgba(0,0,0,0.4); background: {};",
                            rgba_css(r, g, b, 1.0)
                        ) />
                        <span style="font-size: 0.78rem; color: #e2e0d8; font-family: 'JetBrains Mono', monospace;">
                            {label}
                        </span>
                    </div>
                })
                .collect_view()}
        </div>
    }
}
