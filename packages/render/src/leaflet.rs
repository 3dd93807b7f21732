//! Browser-side drawing of a [`ClusterMap`] with Leaflet.
//!
//! The page loads Leaflet, `leaflet.markercluster`, and `leaflet.heat`
//! from a CDN ([`HEAD_ASSETS`]), defines `renderClusterMap` once
//! ([`MAP_SCRIPT`]), and calls it with the serialized map
//! ([`map_embed`]).

use crate::ClusterMap;

/// `<head>` tags for Leaflet and its plugins.
pub const HEAD_ASSETS: &str = r#"<link rel="stylesheet" href="https://unpkg.com/leaflet@1.9.4/dist/leaflet.css" />
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.css" />
<link rel="stylesheet" href="https://unpkg.com/leaflet.markercluster@1.5.3/dist/MarkerCluster.Default.css" />
<script src="https://unpkg.com/leaflet@1.9.4/dist/leaflet.js"></script>
<script src="https://unpkg.com/leaflet.markercluster@1.5.3/dist/leaflet.markercluster.js"></script>
<script src="https://cdnjs.cloudflare.com/ajax/libs/leaflet.heat/0.2.0/leaflet-heat.js"></script>"#;

/// Defines `renderClusterMap(elementId, config)`.
pub const MAP_SCRIPT: &str = r#"<script>
function renderClusterMap(elementId, config) {
  const map = L.map(elementId).setView(config.center, config.zoom);
  L.tileLayer(config.tileUrl, { attribution: config.tileAttribution, maxZoom: 19 }).addTo(map);

  if (config.searchArea) {
    const area = config.searchArea;
    L.circle(area.center, {
      radius: area.radiusM,
      color: area.color,
      fill: true,
      fillColor: area.color,
      fillOpacity: area.fillOpacity,
      weight: area.weight
    }).bindPopup(area.popup).addTo(map);
    L.marker(area.center).bindPopup(area.centerPopup).addTo(map);
  }

  const layer = config.layer;
  if (layer.kind === "heatmap") {
    L.heatLayer(layer.points, { radius: layer.radius, blur: layer.blur, maxZoom: layer.maxZoom }).addTo(map);
  } else {
    const cluster = L.markerClusterGroup();
    for (const m of layer.markers) {
      L.circleMarker(m.position, {
        radius: m.radius,
        color: m.color,
        fill: true,
        fillColor: m.color,
        fillOpacity: m.fillOpacity,
        weight: m.weight
      }).bindPopup(m.popupHtml, { maxWidth: m.popupMaxWidth }).addTo(cluster);
    }
    cluster.addTo(map);
  }
  return map;
}
</script>"#;

/// Serializes a map for inline `<script>` use.
///
/// `</` is escaped so popup markup can never close the script element.
#[must_use]
pub fn map_json(map: &ClusterMap) -> String {
    serde_json::to_string(map)
        .unwrap_or_else(|e| {
            log::error!("Failed to serialize map: {e}");
            "null".to_string()
        })
        .replace("</", "<\\/")
}

/// The map container plus the call that draws `map` into it.
#[must_use]
pub fn map_embed(map: &ClusterMap, element_id: &str, height_px: u32) -> String {
    let id = html_escape::encode_double_quoted_attribute(element_id);
    format!(
        "<div id=\"{id}\" class=\"cluster-map\" style=\"height: {height_px}px;\"></div>\n\
         <script>renderClusterMap(\"{id}\", {});</script>",
        map_json(map)
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{RenderOptions, render};
    use cluster_map_place_models::{ClusterLevel, Place, PlaceMetrics, VisualizationMode};

    fn place() -> Place {
        Place {
            osm_id: "1".to_string(),
            name: Some("</script><script>alert(1)</script>".to_string()),
            place_type: "bar".to_string(),
            latitude: 13.7,
            longitude: -89.2,
            cluster_k6: 1,
            cluster_k3: 0,
            metrics: PlaceMetrics::default(),
            distance_km: None,
        }
    }

    #[test]
    fn embedded_json_cannot_close_script() {
        let rendered = render(
            &[place()],
            &RenderOptions {
                level: ClusterLevel::K6,
                mode: VisualizationMode::Markers,
                geo_filter: None,
            },
        );
        let json = map_json(&rendered.map);
        assert!(!json.contains("</"));
        assert!(json.contains("\"kind\":\"markerCluster\""));

        let embed = map_embed(&rendered.map, "map", 600);
        assert!(embed.starts_with("<div id=\"map\" class=\"cluster-map\" style=\"height: 600px;\">"));
        assert_eq!(embed.matches("</script>").count(), 1);
    }
}
