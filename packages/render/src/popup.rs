//! Popup markup for a single place marker.

use std::fmt::Write as _;

use cluster_map_place_models::{ClusterLevel, Place};
use html_escape::encode_text;

use crate::format::{format_count, format_fixed, format_peak_hour, format_percent};
use crate::palette::cluster_color;

/// Maximum popup width in pixels.
pub const POPUP_MAX_WIDTH: u32 = 300;

/// Builds the popup HTML for a place at the given cluster level.
///
/// Every value taken from the data is HTML-escaped. Missing metrics show
/// as zero and missing peak hours as `N/A`.
///
/// # Panics
///
/// Panics if writing to the popup buffer fails.
#[must_use]
pub fn place_popup_html(place: &Place, level: ClusterLevel) -> String {
    let cluster_id = place.cluster_id(level);
    let color = cluster_color(level, cluster_id);
    let metrics = &place.metrics;

    let mut html = String::with_capacity(1024);
    html.push_str(r#"<div style="font-family: Arial; font-size: 12px; width: 280px;">"#);
    write!(
        html,
        r#"<h4 style="margin: 0 0 10px 0; color: {color};">{}</h4>"#,
        encode_text(&place.display_name())
    )
    .unwrap();
    html.push_str(r#"<hr style="margin: 5px 0;">"#);
    write!(html, "<b>Cluster:</b> {} - {cluster_id}<br>", level.tag()).unwrap();
    write!(html, "<b>Tipo:</b> {}<br>", encode_text(&place.place_type)).unwrap();
    write!(html, "<b>OSM ID:</b> {}<br>", encode_text(&place.osm_id)).unwrap();
    html.push_str(r#"<hr style="margin: 5px 0;">"#);
    html.push_str("<b>Métricas Principales:</b><br>");
    write!(
        html,
        "<b>• Dispositivos únicos:</b> {}<br>",
        format_count(metrics.unique_devices_count.unwrap_or(0.0))
    )
    .unwrap();
    write!(
        html,
        "<b>• Footfall promedio/día:</b> {}<br>",
        format_fixed(metrics.footfall_avg_per_day.unwrap_or(0.0), 1)
    )
    .unwrap();
    write!(
        html,
        "<b>• Tasa de recurrencia:</b> {}<br>",
        format_percent(metrics.recurrence_rate.unwrap_or(0.0))
    )
    .unwrap();
    write!(
        html,
        "<b>• Tiempo de estadía (min):</b> {}<br>",
        format_fixed(metrics.dwell_time_mean.unwrap_or(0.0), 1)
    )
    .unwrap();
    html.push_str(r#"<hr style="margin: 5px 0;">"#);
    html.push_str("<b>Patrones Temporales:</b><br>");
    write!(
        html,
        "<b>• Hora pico (semana):</b> {}<br>",
        format_peak_hour(metrics.peak_hour_weekday)
    )
    .unwrap();
    write!(
        html,
        "<b>• Hora pico (fin de semana):</b> {}<br>",
        format_peak_hour(metrics.peak_hour_weekend)
    )
    .unwrap();
    write!(
        html,
        "<b>• Ratio mañana/noche:</b> {}<br>",
        format_fixed(metrics.morning_to_evening_ratio.unwrap_or(0.0), 2)
    )
    .unwrap();
    html.push_str("</div>");

    html
}
