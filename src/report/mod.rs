//! Report composition and output.

pub mod generator;
pub mod health;
pub mod writer;

pub use generator::generate_markdown_report;
pub use health::compose;
pub use writer::{write_json_atomic, write_text_atomic};
