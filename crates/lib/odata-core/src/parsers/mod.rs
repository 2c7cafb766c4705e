//! Parsers for service metadata inputs.
//!
//! Each parser normalizes an external schema description into the canonical
//! [`odata_model::SchemaModel`].

pub mod csdl_xml;

pub use csdl_xml::{CsdlXmlParser, MetadataError};
