//! Schema model types for odata-mcp.
//!
//! This crate defines the passive structures produced by the metadata parser
//! and consumed by tool generation: entity, complex and enum types, containers,
//! entity sets and operations, all addressed by qualified name.

pub mod models;
pub mod schema;

pub use models::*;
pub use schema::{PrimitiveFamily, PrimitiveType};
