/// CSV telemetry, JSON, and Markdown report writers.
pub mod export;

pub use export::{export_telemetry_csv, write_json, write_telemetry_csv, write_text};
