//! Core services for odata-mcp.
//!
//! This crate parses service metadata documents into a schema model, derives
//! callable tool definitions from that model, routes request paths to
//! registered namespaces, and caches generated tool batches per namespace.

pub mod generator;
pub mod parsers;
pub mod routing;
pub mod services;
