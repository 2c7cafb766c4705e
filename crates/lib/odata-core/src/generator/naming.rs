use std::{error::Error, fmt};

pub const DEFAULT_NAMING_PATTERN: &str = "{entity}_{operation}";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    Namespace,
    Container,
    Entity,
    Type,
    Operation,
}

impl Placeholder {
    fn parse(value: &str) -> Option<Self> {
        match value {
            "namespace" => Some(Self::Namespace),
            "container" => Some(Self::Container),
            "entity" => Some(Self::Entity),
            "type" => Some(Self::Type),
            "operation" => Some(Self::Operation),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Segment {
    Literal(String),
    Placeholder(Placeholder),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatternError {
    UnknownPlaceholder(String),
    Unterminated,
    MissingOperation,
}

impl fmt::Display for PatternError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownPlaceholder(name) => write!(f, "unknown naming placeholder {{{name}}}"),
            Self::Unterminated => write!(f, "naming pattern has an unterminated placeholder"),
            Self::MissingOperation => {
                write!(f, "naming pattern must contain the {{operation}} placeholder")
            }
        }
    }
}

impl Error for PatternError {}

/// Values substituted into a naming pattern for one tool.
#[derive(Debug, Clone, Copy, Default)]
pub struct NameParts<'a> {
    pub namespace: &'a str,
    pub container: &'a str,
    pub entity: &'a str,
    pub type_name: &'a str,
    pub operation: &'a str,
}

/// Compiled tool-name template with `{namespace}`, `{container}`, `{entity}`,
/// `{type}` and `{operation}` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamingPattern {
    template: String,
    segments: Vec<Segment>,
}

impl NamingPattern {
    /// Compiles a naming template.
    ///
    /// # Errors
    /// Returns `PatternError` for unknown or unterminated placeholders, or when
    /// `{operation}` is absent (names would collide for every entity set).
    pub fn new(template: impl Into<String>) -> Result<Self, PatternError> {
        let template = template.into();
        let mut segments = Vec::new();
        let mut rest = template.as_str();
        while let Some(start) = rest.find('{') {
            if start > 0 {
                segments.push(Segment::Literal(rest[..start].to_string()));
            }
            let after = &rest[start + 1..];
            let end = after.find('}').ok_or(PatternError::Unterminated)?;
            let name = &after[..end];
            let placeholder = Placeholder::parse(name)
                .ok_or_else(|| PatternError::UnknownPlaceholder(name.to_string()))?;
            segments.push(Segment::Placeholder(placeholder));
            rest = &after[end + 1..];
        }
        if !rest.is_empty() {
            segments.push(Segment::Literal(rest.to_string()));
        }
        if !segments.contains(&Segment::Placeholder(Placeholder::Operation)) {
            return Err(PatternError::MissingOperation);
        }
        Ok(Self { template, segments })
    }

    #[must_use]
    pub fn template(&self) -> &str {
        &self.template
    }

    #[must_use]
    pub fn render(&self, parts: &NameParts<'_>) -> String {
        let mut name = String::with_capacity(self.template.len() + 32);
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => name.push_str(text),
                Segment::Placeholder(placeholder) => name.push_str(match placeholder {
                    Placeholder::Namespace => parts.namespace,
                    Placeholder::Container => parts.container,
                    Placeholder::Entity => parts.entity,
                    Placeholder::Type => parts.type_name,
                    Placeholder::Operation => parts.operation,
                }),
            }
        }
        name
    }
}

impl Default for NamingPattern {
    fn default() -> Self {
        Self {
            template: DEFAULT_NAMING_PATTERN.to_string(),
            segments: vec![
                Segment::Placeholder(Placeholder::Entity),
                Segment::Literal("_".to_string()),
                Segment::Placeholder(Placeholder::Operation),
            ],
        }
    }
}

impl fmt::Display for NamingPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.template)
    }
}
