//! HTML composition of the explorer page.
//!
//! The page is a plain `GET` form: every control change resubmits it and
//! the server renders the whole page again. Everything taken from the
//! data is escaped before it is written.

use std::fmt::Write as _;

use cluster_map_data::{DataError, GENERATION_HINT};
use cluster_map_explorer::hierarchy::HierarchyTree;
use cluster_map_explorer::presenter::{ClusterCard, ClusterStats, SummaryMetrics};
use cluster_map_explorer::sidebar::{RADIUS_MAX_KM, RADIUS_MIN_KM, RADIUS_STEP_KM};
use cluster_map_explorer::{ExplorerView, LocationPreset, SidebarState};
use cluster_map_place_models::{ClusterLevel, NOT_AVAILABLE, VisualizationMode};
use cluster_map_render::format::{
    format_fixed, format_km, format_len, format_percent, group_thousands,
};
use cluster_map_render::leaflet::{HEAD_ASSETS, MAP_SCRIPT, map_embed};
use cluster_map_render::palette::cluster_color;
use html_escape::{encode_double_quoted_attribute as attr, encode_text as text};

const TITLE: &str = "Explorador de Clusters Jerárquicos";
const SUBTITLE: &str = "Análisis espacial y comportamental de lugares - San Salvador, El Salvador";
const MAP_ELEMENT_ID: &str = "cluster-map";
const MAP_HEIGHT_PX: u32 = 600;

const STYLE: &str = r"
body { margin: 0; font-family: Arial, Helvetica, sans-serif; color: #222; }
header { padding: 16px 24px 0; }
header h1 { margin: 0 0 4px; }
.layout { display: flex; align-items: flex-start; }
.sidebar { width: 320px; padding: 16px; background: #f7f8fa; box-sizing: border-box; }
.sidebar fieldset { border: none; padding: 0; margin: 0 0 12px; }
.sidebar legend { font-weight: bold; margin-bottom: 4px; }
.main { flex: 1; display: flex; gap: 16px; padding: 16px; }
.map-panel { flex: 2; min-width: 0; }
.info-panel { flex: 1; min-width: 0; }
.metrics { display: flex; gap: 12px; margin-bottom: 12px; }
.metric { flex: 1; }
.metric-label { display: block; font-size: 12px; color: #666; }
.metric-value { display: block; font-size: 24px; }
.cluster-info { background-color: #f0f2f6; padding: 15px; border-radius: 10px; margin: 10px 0; }
.notice { padding: 8px 12px; border-radius: 6px; margin: 8px 0; }
.notice.info { background: #e8f1fb; }
.notice.success { background: #e6f5ea; }
.notice.warning { background: #fff4e0; }
.notice.error { background: #fdecea; }
.tree ul { margin: 4px 0 8px; padding-left: 18px; }
footer { text-align: center; color: #888; border-top: 1px solid #ddd; margin-top: 16px; }
";

/// The full explorer page for one interaction.
///
/// # Panics
///
/// Panics if writing to the page buffer fails.
#[must_use]
pub fn explorer_page(view: &ExplorerView) -> String {
    let mut html = String::with_capacity(64 * 1024);
    open_document(&mut html);

    html.push_str(r#"<div class="layout">"#);
    write_sidebar(&mut html, &view.sidebar);
    html.push_str(r#"<main class="main"><section class="map-panel">"#);
    write_map_panel(&mut html, view);
    html.push_str(r#"</section><section class="info-panel">"#);
    write_info_panel(&mut html, &view.clusters);
    html.push_str("</section></main></div>");

    close_document(&mut html);
    html
}

/// The page shown while the clustering artifacts cannot be loaded.
///
/// # Panics
///
/// Panics if writing to the page buffer fails.
#[must_use]
pub fn unavailable_page(error: &DataError) -> String {
    let mut html = String::with_capacity(4 * 1024);
    open_document(&mut html);

    html.push_str(r#"<main class="main"><section class="map-panel">"#);
    write!(
        html,
        r#"<div class="notice error"><b>Error cargando datos:</b> {}</div>"#,
        text(&error.to_string())
    )
    .unwrap();
    write!(
        html,
        "<p><b>Archivo:</b> <code>{}</code></p>",
        text(&error.path().display().to_string())
    )
    .unwrap();
    write!(
        html,
        r#"<div class="notice info">{}</div>"#,
        text(GENERATION_HINT)
    )
    .unwrap();
    html.push_str("</section></main>");

    close_document(&mut html);
    html
}

fn open_document(html: &mut String) {
    write!(
        html,
        "<!DOCTYPE html>\n<html lang=\"es\">\n<head>\n<meta charset=\"utf-8\">\n\
         <meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n\
         <title>{TITLE}</title>\n{HEAD_ASSETS}\n<style>{STYLE}</style>\n{MAP_SCRIPT}\n\
         </head>\n<body>\n<header><h1>{TITLE}</h1><p><b>{SUBTITLE}</b></p></header>\n"
    )
    .unwrap();
}

fn close_document(html: &mut String) {
    html.push_str(
        "<footer>\
         <p>Explorador de Clusters Jerárquicos | Análisis de Movilidad Urbana</p>\
         <p>Datos: San Salvador, El Salvador | Clustering: Jerarquico Aglomerativo (Ward)</p>\
         </footer>\n</body>\n</html>\n",
    );
}

const fn checked(on: bool) -> &'static str {
    if on { " checked" } else { "" }
}

fn write_sidebar(html: &mut String, state: &SidebarState) {
    html.push_str(
        r#"<aside class="sidebar"><form method="get" action="/" onchange="this.submit()">"#,
    );
    html.push_str("<h2>Configuración</h2>");

    html.push_str("<fieldset><legend>Nivel de clustering:</legend>");
    for level in ClusterLevel::all() {
        write!(
            html,
            r#"<label><input type="radio" name="level" value="{level}"{}> {}</label><br>"#,
            checked(*level == state.level),
            level.label()
        )
        .unwrap();
    }
    html.push_str("</fieldset>");

    html.push_str("<fieldset><legend>Modo de visualización:</legend>");
    for mode in VisualizationMode::all() {
        write!(
            html,
            r#"<label><input type="radio" name="mode" value="{mode}"{}> {}</label><br>"#,
            checked(*mode == state.mode),
            mode.label()
        )
        .unwrap();
    }
    html.push_str("</fieldset><hr>");

    write_geo_controls(html, state);
    html.push_str("<hr>");
    write_selection_controls(html, state);

    html.push_str(r#"<noscript><button type="submit">Aplicar</button></noscript>"#);
    html.push_str("</form><hr>");
    write_hierarchy(html, &state.hierarchy);
    html.push_str("</aside>");
}

fn write_geo_controls(html: &mut String, state: &SidebarState) {
    html.push_str("<h3>Filtro Geográfico</h3>");
    write!(
        html,
        r#"<label title="Filtra lugares dentro de un radio específico para mejorar rendimiento"><input type="checkbox" name="geo" value="1"{}> Activar filtro por área</label>"#,
        checked(state.geo_enabled)
    )
    .unwrap();

    if !state.geo_enabled {
        write!(
            html,
            r#"<div class="notice info">{}</div>"#,
            text(&state.status_text())
        )
        .unwrap();
        return;
    }

    html.push_str(r#"<fieldset><legend>Ubicación:</legend><select name="preset">"#);
    for preset in LocationPreset::all() {
        write!(
            html,
            r#"<option value="{preset}"{}>{}</option>"#,
            if *preset == state.preset { " selected" } else { "" },
            text(preset.label())
        )
        .unwrap();
    }
    html.push_str("</select></fieldset>");

    match state.location_text() {
        Some(location) => {
            write!(html, r#"<div class="notice info">{}</div>"#, text(&location)).unwrap();
        }
        None => {
            write!(
                html,
                r#"<label>Latitud: <input type="number" name="lat" step="0.000001" value="{:.6}"></label><br>"#,
                state.center[0]
            )
            .unwrap();
            write!(
                html,
                r#"<label>Longitud: <input type="number" name="lon" step="0.000001" value="{:.6}"></label>"#,
                state.center[1]
            )
            .unwrap();
        }
    }

    write!(
        html,
        r#"<fieldset><legend>Radio (km): <output>{radius}</output></legend><input type="range" name="radius" min="{}" max="{}" step="{}" value="{radius}" oninput="this.previousElementSibling.firstElementChild.value = this.value"></fieldset>"#,
        format_km(RADIUS_MIN_KM),
        format_km(RADIUS_MAX_KM),
        format_km(RADIUS_STEP_KM),
        radius = format_km(state.radius_km),
    )
    .unwrap();

    write!(
        html,
        r#"<div class="notice success">{}</div>"#,
        text(&state.status_text())
    )
    .unwrap();
}

fn write_selection_controls(html: &mut String, state: &SidebarState) {
    write!(
        html,
        r#"<input type="hidden" name="filtered" value="1"><input type="hidden" name="cluster_level" value="{}">"#,
        state.level
    )
    .unwrap();
    html.push_str(r#"<input type="hidden" name="options" value="1">"#);
    for id in &state.available_clusters {
        write!(html, r#"<input type="hidden" name="cluster_option" value="{id}">"#).unwrap();
    }
    for place_type in &state.available_types {
        write!(
            html,
            r#"<input type="hidden" name="type_option" value="{}">"#,
            attr(place_type)
        )
        .unwrap();
    }

    let level_name = match state.level {
        ClusterLevel::K3 => "K=3",
        ClusterLevel::K6 => "K=6",
    };
    write!(
        html,
        "<fieldset><legend>Filtrar por {level_name} Clusters:</legend>"
    )
    .unwrap();
    for id in &state.available_clusters {
        write!(
            html,
            r#"<label><input type="checkbox" name="cluster" value="{id}"{}> <span style="color: {};">&#9679;</span> {id}</label><br>"#,
            checked(state.is_cluster_selected(*id)),
            cluster_color(state.level, *id)
        )
        .unwrap();
    }
    html.push_str("</fieldset><hr>");

    html.push_str("<fieldset><legend>Filtrar por tipo de lugar:</legend>");
    for place_type in &state.available_types {
        write!(
            html,
            r#"<label><input type="checkbox" name="type" value="{}"{}> {}</label><br>"#,
            attr(place_type),
            checked(state.is_type_selected(place_type)),
            text(place_type)
        )
        .unwrap();
    }
    html.push_str("</fieldset>");
}

fn write_hierarchy(html: &mut String, tree: &HierarchyTree) {
    html.push_str(r#"<div class="tree"><h3>Estructura Jerárquica</h3>"#);
    for branch in &tree.branches {
        let parent = &branch.cluster;
        write!(
            html,
            "<details><summary>K=3 Cluster {}: {}</summary>",
            parent.id,
            text(&parent.name)
        )
        .unwrap();
        write!(
            html,
            "<p><b>Tamaño:</b> {} lugares<br><b>Porcentaje:</b> {}%</p>",
            group_u64(parent.size),
            format_fixed(parent.pct_of_total, 1)
        )
        .unwrap();
        html.push_str("<b>Subdivisiones en K=6:</b><ul>");
        for child in &branch.children {
            write!(
                html,
                "<li><b>Cluster {}:</b> {}<br><i>{} lugares ({}%)</i></li>",
                child.id,
                text(&child.name),
                group_u64(child.size),
                format_fixed(child.pct_of_total, 1)
            )
            .unwrap();
        }
        html.push_str("</ul></details>");
    }
    html.push_str("</div>");
}

fn write_metric(html: &mut String, label: &str, value: &str) {
    write!(
        html,
        r#"<div class="metric"><span class="metric-label">{label}</span><span class="metric-value">{value}</span></div>"#
    )
    .unwrap();
}

fn write_summary(html: &mut String, metrics: &SummaryMetrics) {
    html.push_str(r#"<div class="metrics">"#);
    write_metric(html, "Total lugares", &format_len(metrics.total_places));
    write_metric(html, "Clusters visibles", &metrics.visible_clusters.to_string());
    write_metric(
        html,
        "Dispositivos promedio",
        &fixed_or_na(metrics.mean_unique_devices, 0),
    );
    write_metric(
        html,
        "Estadía promedio (min)",
        &fixed_or_na(metrics.mean_dwell_time, 0),
    );
    html.push_str("</div>");
}

fn write_map_panel(html: &mut String, view: &ExplorerView) {
    html.push_str("<h2>Mapa Interactivo</h2>");
    write_summary(html, &view.metrics);

    if let Some(warning) = &view.warning {
        write!(html, r#"<div class="notice warning">{}</div>"#, text(warning)).unwrap();
    }

    html.push_str(&map_embed(&view.map.map, MAP_ELEMENT_ID, MAP_HEIGHT_PX));

    if let Some(hint) = &view.hint {
        write!(html, r#"<div class="notice info">{}</div>"#, text(hint)).unwrap();
    }
}

fn write_info_panel(html: &mut String, cards: &[ClusterCard]) {
    html.push_str("<h2>Información de Clusters</h2>");
    for card in cards {
        write_characteristics(html, card);
    }

    html.push_str("<hr><h2>Estadísticas</h2>");
    for card in cards {
        if let Some(stats) = &card.stats {
            write_stats(html, card.id, stats);
        }
    }
}

fn write_characteristics(html: &mut String, card: &ClusterCard) {
    let Some(c) = &card.characteristics else {
        return;
    };

    write!(
        html,
        r#"<div class="cluster-info"><h3 style="margin-top: 0; color: {};">{}</h3>"#,
        card.color,
        card.title()
    )
    .unwrap();
    write!(html, "<p><b>Nombre:</b> {}</p>", text(c.name())).unwrap();
    if let Some(parent) = &card.parent {
        write!(
            html,
            "<p><b>Pertenece a:</b> K=3 Cluster {}: {}</p>",
            parent.id,
            text(&parent.name)
        )
        .unwrap();
    }
    write!(
        html,
        "<p><b>Tamaño:</b> {} lugares ({}%)</p>",
        group_u64(c.size()),
        format_fixed(c.pct_of_total(), 1)
    )
    .unwrap();
    write!(
        html,
        "<p><b>Tipo dominante:</b> {}</p>",
        text(&c.dominant_type_title())
    )
    .unwrap();
    write!(
        html,
        "<p><b>Nivel de actividad:</b> {}</p>",
        text(c.activity_level())
    )
    .unwrap();
    write!(
        html,
        "<p><b>Patrón de visita:</b> {}</p>",
        text(c.visit_pattern())
    )
    .unwrap();
    write!(
        html,
        "<p><b>Categoría de estadía:</b> {}</p>",
        text(c.dwell_category())
    )
    .unwrap();
    html.push_str(r#"<div class="metrics">"#);
    write_metric(html, "Visitantes promedio", &format_fixed(c.avg_visitors(), 0));
    write_metric(html, "Estadía (min)", &format_fixed(c.avg_dwell_time(), 0));
    html.push_str("</div></div>");
}

fn write_stats(html: &mut String, id: u32, stats: &ClusterStats) {
    write!(
        html,
        "<details><summary>Cluster {id} - Estadísticas detalladas</summary>"
    )
    .unwrap();
    write!(html, "<p><b>Lugares:</b> {}</p>", format_len(stats.places)).unwrap();
    write!(
        html,
        "<p><b>Dispositivos únicos (promedio):</b> {}</p>",
        fixed_or_na(stats.mean_unique_devices, 0)
    )
    .unwrap();
    write!(
        html,
        "<p><b>Footfall/día (promedio):</b> {}</p>",
        fixed_or_na(stats.mean_footfall, 1)
    )
    .unwrap();
    write!(
        html,
        "<p><b>Recurrencia (promedio):</b> {}</p>",
        stats
            .mean_recurrence
            .map_or_else(|| NOT_AVAILABLE.to_string(), format_percent)
    )
    .unwrap();
    write!(
        html,
        "<p><b>Tiempo de estadía (promedio):</b> {} min</p>",
        fixed_or_na(stats.mean_dwell_time, 1)
    )
    .unwrap();
    html.push_str("<p><b>Top 5 tipos de lugares:</b></p><ul>");
    for share in &stats.top_types {
        write!(
            html,
            "<li>{}: {} ({}%)</li>",
            text(&share.place_type),
            share.count,
            format_fixed(share.pct, 1)
        )
        .unwrap();
    }
    html.push_str("</ul></details>");
}

fn fixed_or_na(value: Option<f64>, decimals: usize) -> String {
    value.map_or_else(
        || NOT_AVAILABLE.to_string(),
        |v| format_fixed(v, decimals),
    )
}

fn group_u64(value: u64) -> String {
    group_thousands(i64::try_from(value).unwrap_or(i64::MAX))
}
