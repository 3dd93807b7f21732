#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Interaction logic of the cluster explorer.
//!
//! Each request carries the sidebar controls ([`SidebarParams`]). They
//! are resolved against the loaded dataset ([`SidebarState`]), the
//! geographic, cluster, and type filters narrow the places, and
//! [`ExplorerView`] gathers the metrics, map, and per-cluster breakdowns
//! the page displays.

pub mod hierarchy;
pub mod presenter;
pub mod presets;
pub mod sidebar;

pub use hierarchy::HierarchyTree;
pub use presenter::ExplorerView;
pub use presets::LocationPreset;
pub use sidebar::{SidebarParams, SidebarState};
