//! vitalboard core library - care-facility health dashboard rendering

#![deny(warnings)]

// Global invariants enforced in this crate:
// - Datasets are loaded once per render into a DataStore; no global state
// - Every record is schema-checked when its file is read
// - Transforms are pure functions over in-memory rows
// - Identical input yields byte-for-byte identical output

pub mod chart;
pub mod config;
pub mod dataset;
pub mod error;
pub mod figures;
pub mod html;
pub mod page;
pub mod records;
pub mod store;
pub mod transform;

pub use chart::Figure;
pub use config::ResolvedConfig;
pub use dataset::{Dataset, DatasetFiles};
pub use error::{DashboardError, Result};
pub use figures::FigureKind;
pub use page::{render_page, Page};
pub use store::DataStore;
