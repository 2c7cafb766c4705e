//! Request routing: registry of namespaces, zero-copy path parsing and a
//! snapshot matcher.

pub mod matcher;
pub mod parser;
pub mod registry;

pub use matcher::{RouteMatch, RouteMatcher, RouteTable};
pub use parser::{McpCommand, ParsedRoute, parse_route};
pub use registry::{HostRoute, RouteConflict, RouteEntry, RouteRegistry, build_url};
