//! Daily fact rotation.
//!
//! The rotation cursor is the only state carried between runs. Each run
//! reads the prior cursor through a [`rotation::RotationStore`], moves it one step
//! along the category cycle, and publishes a fact from that category.

pub mod catalog;
pub mod publisher;
pub mod rotation;

pub use publisher::publish;
pub use rotation::FileRotationStore;
