pub mod aggregation;
pub mod builder;
pub mod catalog_registry;
pub mod date_presets;
pub mod filter_evaluator;
pub mod render_payload;
pub mod shaping;

pub use builder::*;
pub use catalog_registry::{available_fields, list_softwares};
pub use filter_evaluator::{apply_filter, apply_filters};
pub use render_payload::render_payload;
pub use shaping::{shape, shape_at};
