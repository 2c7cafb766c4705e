//! Zero-copy request path parsing.
//!
//! Paths have the shape `/<namespace>/mcp/<command>` or `/mcp/<command>` for
//! the root namespace. Every returned slice borrows from the input.

pub const MCP_SEGMENT: &str = "mcp";

const INFO_COMMAND: &str = "info";
const TOOLS_COMMAND: &str = "tools";
const EXECUTE_COMMAND: &str = "execute";

/// Namespace and command slices of a request path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParsedRoute<'a> {
    /// Prefix before the `mcp` segment; empty for the root namespace.
    pub namespace: &'a str,
    /// Remainder after the `mcp` segment, without surrounding separators.
    pub command: &'a str,
}

impl<'a> ParsedRoute<'a> {
    #[must_use]
    pub fn classify(&self) -> McpCommand<'a> {
        McpCommand::classify(self.command)
    }

    #[must_use]
    pub const fn is_root(&self) -> bool {
        self.namespace.is_empty()
    }
}

/// Fixed set of commands served under an `mcp` mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum McpCommand<'a> {
    Info,
    Tools,
    ToolInfo(&'a str),
    ToolsExecute,
    Unknown(&'a str),
}

impl<'a> McpCommand<'a> {
    /// Classifies an already extracted command slice. Keywords match ASCII
    /// case-insensitively; tool names keep their case.
    #[must_use]
    pub fn classify(command: &'a str) -> Self {
        let command = command.trim_matches('/');
        if command.is_empty() || command.eq_ignore_ascii_case(INFO_COMMAND) {
            return Self::Info;
        }
        if command.eq_ignore_ascii_case(TOOLS_COMMAND) {
            return Self::Tools;
        }

        let Some(tool) = strip_prefix_ignore_case(command, TOOLS_COMMAND)
            .and_then(|rest| rest.strip_prefix('/'))
            .map(|rest| rest.trim_start_matches('/'))
        else {
            return Self::Unknown(command);
        };
        if tool.eq_ignore_ascii_case(EXECUTE_COMMAND) {
            Self::ToolsExecute
        } else if tool.contains('/') {
            Self::Unknown(command)
        } else {
            Self::ToolInfo(tool)
        }
    }
}

/// Splits `path` at its first path component equal to `mcp`.
///
/// Trailing separators and a query string are ignored. Returns `None` when no
/// component is exactly `mcp`, so `/mcpx` and `/api/mcpfoo` never match.
#[must_use]
pub fn parse_route(path: &str) -> Option<ParsedRoute<'_>> {
    let path = path.split_once('?').map_or(path, |(path, _)| path);
    let trimmed = path.trim_matches('/');

    let mut start = 0;
    loop {
        let end = trimmed[start..]
            .find('/')
            .map_or(trimmed.len(), |offset| start + offset);
        if trimmed[start..end].eq_ignore_ascii_case(MCP_SEGMENT) {
            let namespace = trimmed[..start].trim_end_matches('/');
            let command = trimmed.get(end + 1..).unwrap_or_default();
            return Some(ParsedRoute {
                namespace,
                command: command.trim_start_matches('/'),
            });
        }
        if end >= trimmed.len() {
            return None;
        }
        start = end + 1;
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    let head = value.get(..prefix.len())?;
    head.eq_ignore_ascii_case(prefix)
        .then(|| &value[prefix.len()..])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_namespace_and_command() {
        let route = parse_route("/api/v1/mcp/tools").expect("route");
        assert_eq!(route.namespace, "api/v1");
        assert_eq!(route.command, "tools");
        assert_eq!(route.classify(), McpCommand::Tools);
    }

    #[test]
    fn root_namespace_is_empty() {
        let route = parse_route("/mcp").expect("root route");
        assert!(route.is_root());
        assert_eq!(route.classify(), McpCommand::Info);

        let route = parse_route("/MCP/info/").expect("root info");
        assert!(route.is_root());
        assert_eq!(route.classify(), McpCommand::Info);
    }

    #[test]
    fn trailing_separators_and_queries_are_ignored() {
        assert_eq!(parse_route("/sales/mcp/"), parse_route("/sales/mcp"));
        assert_eq!(parse_route("/sales/mcp/tools//"), parse_route("/sales/mcp/tools"));
        assert_eq!(
            parse_route("/sales/mcp/tools?cursor=2"),
            parse_route("/sales/mcp/tools")
        );
    }

    #[test]
    fn requires_whole_mcp_segment() {
        assert_eq!(parse_route("/mcpx/tools"), None);
        assert_eq!(parse_route("/api/mcpfoo"), None);
        assert_eq!(parse_route("/api/xmcp/tools"), None);
        assert_eq!(parse_route("/"), None);
        assert_eq!(parse_route(""), None);
    }

    #[test]
    fn slices_borrow_from_input() {
        let path = String::from("/sales/mcp/tools/Orders_get");
        let route = parse_route(&path).expect("route");
        let base = path.as_ptr() as usize;
        let namespace = route.namespace.as_ptr() as usize;
        assert!(namespace >= base && namespace < base + path.len());
    }

    #[test]
    fn classifies_commands() {
        assert_eq!(McpCommand::classify(""), McpCommand::Info);
        assert_eq!(McpCommand::classify("INFO"), McpCommand::Info);
        assert_eq!(McpCommand::classify("Tools"), McpCommand::Tools);
        assert_eq!(
            McpCommand::classify("tools/Orders_get"),
            McpCommand::ToolInfo("Orders_get")
        );
        assert_eq!(McpCommand::classify("tools/execute"), McpCommand::ToolsExecute);
        assert_eq!(McpCommand::classify("TOOLS/Execute"), McpCommand::ToolsExecute);
        assert_eq!(McpCommand::classify("toolsx"), McpCommand::Unknown("toolsx"));
        assert_eq!(
            McpCommand::classify("tools/a/b"),
            McpCommand::Unknown("tools/a/b")
        );
        assert_eq!(McpCommand::classify("prompts"), McpCommand::Unknown("prompts"));
    }
}
