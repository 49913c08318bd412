pub mod dxf_reader;
pub mod schema;

// Re-export for convenience
pub use dxf_reader::{entity_type_name, DxfParseError, DxfParser};
pub use schema::*;
