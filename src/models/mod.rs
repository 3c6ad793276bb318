//! Data models for Shelfscan

pub mod book;
pub mod capture;
pub mod inventory;
pub mod view;

// Re-export commonly used types
pub use book::{parse_book, BookRecord, CatalogDoc, Isbn};
pub use capture::{BarcodeFormat, DetectedBarcode, Frame};
pub use inventory::{update_book, Inventory, UpdateOutcome};
pub use view::ViewState;
