//! HTTP handlers for the floor-plan service.

pub mod analysis;
pub mod app;
pub mod history;

pub use analysis::{analyze_floorplan, generate_plan, test_api};
pub use app::{endpoint_not_found, health_check, index};
pub use history::{download_record, list_history};
