//! Cluster colors.

use cluster_map_place_models::ClusterLevel;

/// Colors for the three K=3 macro-segments.
pub const K3_PALETTE: [&str; 3] = ["#e74c3c", "#3498db", "#2ecc71"];

/// Colors for the six K=6 micro-segments.
pub const K6_PALETTE: [&str; 6] = [
    "#e74c3c", "#f39c12", "#f1c40f", "#2ecc71", "#3498db", "#9b59b6",
];

/// Color of the geographic filter overlay.
pub const SEARCH_AREA_COLOR: &str = "#3498db";

#[must_use]
pub const fn palette(level: ClusterLevel) -> &'static [&'static str] {
    match level {
        ClusterLevel::K3 => &K3_PALETTE,
        ClusterLevel::K6 => &K6_PALETTE,
    }
}

/// Color for a cluster id; ids beyond the palette wrap around.
#[must_use]
pub const fn cluster_color(level: ClusterLevel, cluster_id: u32) -> &'static str {
    let colors = palette(level);
    colors[cluster_id as usize % colors.len()]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn colors_wrap_by_level() {
        assert_eq!(cluster_color(ClusterLevel::K3, 1), "#3498db");
        assert_eq!(cluster_color(ClusterLevel::K3, 4), "#3498db");
        assert_eq!(cluster_color(ClusterLevel::K6, 5), "#9b59b6");
        assert_eq!(cluster_color(ClusterLevel::K6, 6), "#e74c3c");
    }
}
