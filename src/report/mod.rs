//! Report rendering: markdown document, text charts and the SVG badge.

pub mod badge;
pub mod charts;
pub mod generator;

pub use badge::Badge;
pub use generator::{generate_json_report, generate_markdown_report};
