//! Read-side queries for the record tables

pub mod flashlights;
pub mod references;
pub mod stats;

pub use flashlights::{list_flashlights, load_flashlight};
pub use references::list_references;
pub use stats::{collection_stats, CollectionStats};
