use serde::{Deserialize, Serialize};

pub const EDM_NAMESPACE: &str = "Edm";
pub const COLLECTION_PREFIX: &str = "Collection(";

pub const ELEMENT_SCHEMA: &str = "Schema";
pub const ELEMENT_ENTITY_TYPE: &str = "EntityType";
pub const ELEMENT_COMPLEX_TYPE: &str = "ComplexType";
pub const ELEMENT_ENUM_TYPE: &str = "EnumType";
pub const ELEMENT_TYPE_DEFINITION: &str = "TypeDefinition";
pub const ELEMENT_ASSOCIATION: &str = "Association";
pub const ELEMENT_ENTITY_CONTAINER: &str = "EntityContainer";
pub const ELEMENT_ENTITY_SET: &str = "EntitySet";
pub const ELEMENT_ACTION: &str = "Action";
pub const ELEMENT_FUNCTION: &str = "Function";
pub const ELEMENT_ACTION_IMPORT: &str = "ActionImport";
pub const ELEMENT_FUNCTION_IMPORT: &str = "FunctionImport";

/// Coarse grouping of primitive types used when deriving input contracts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveFamily {
    String,
    Integer,
    Decimal,
    Boolean,
    Temporal,
    Binary,
    Spatial,
}

/// Primitive types of the EDM vocabulary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum PrimitiveType {
    String,
    Guid,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Decimal,
    Double,
    Single,
    Boolean,
    Date,
    DateTime,
    DateTimeOffset,
    TimeOfDay,
    Time,
    Duration,
    Binary,
    Stream,
    Geography,
    Geometry,
}

impl PrimitiveType {
    /// Maps an `Edm.*` type name onto the primitive vocabulary.
    ///
    /// Spatial subtypes (`Edm.GeographyPoint`, `Edm.GeometryPolygon`, ...) fold
    /// into their family root.
    #[must_use]
    pub fn from_edm_name(value: &str) -> Option<Self> {
        let local = value.strip_prefix("Edm.")?;
        let primitive = match local {
            "String" => Self::String,
            "Guid" => Self::Guid,
            "Byte" => Self::Byte,
            "SByte" => Self::SByte,
            "Int16" => Self::Int16,
            "Int32" => Self::Int32,
            "Int64" => Self::Int64,
            "Decimal" => Self::Decimal,
            "Double" => Self::Double,
            "Single" => Self::Single,
            "Boolean" => Self::Boolean,
            "Date" => Self::Date,
            "DateTime" => Self::DateTime,
            "DateTimeOffset" => Self::DateTimeOffset,
            "TimeOfDay" => Self::TimeOfDay,
            "Time" => Self::Time,
            "Duration" => Self::Duration,
            "Binary" => Self::Binary,
            "Stream" => Self::Stream,
            other if other.starts_with("Geography") => Self::Geography,
            other if other.starts_with("Geometry") => Self::Geometry,
            _ => return None,
        };
        Some(primitive)
    }

    #[must_use]
    pub const fn edm_name(self) -> &'static str {
        match self {
            Self::String => "Edm.String",
            Self::Guid => "Edm.Guid",
            Self::Byte => "Edm.Byte",
            Self::SByte => "Edm.SByte",
            Self::Int16 => "Edm.Int16",
            Self::Int32 => "Edm.Int32",
            Self::Int64 => "Edm.Int64",
            Self::Decimal => "Edm.Decimal",
            Self::Double => "Edm.Double",
            Self::Single => "Edm.Single",
            Self::Boolean => "Edm.Boolean",
            Self::Date => "Edm.Date",
            Self::DateTime => "Edm.DateTime",
            Self::DateTimeOffset => "Edm.DateTimeOffset",
            Self::TimeOfDay => "Edm.TimeOfDay",
            Self::Time => "Edm.Time",
            Self::Duration => "Edm.Duration",
            Self::Binary => "Edm.Binary",
            Self::Stream => "Edm.Stream",
            Self::Geography => "Edm.Geography",
            Self::Geometry => "Edm.Geometry",
        }
    }

    #[must_use]
    pub const fn family(self) -> PrimitiveFamily {
        match self {
            Self::String | Self::Guid => PrimitiveFamily::String,
            Self::Byte | Self::SByte | Self::Int16 | Self::Int32 | Self::Int64 => {
                PrimitiveFamily::Integer
            }
            Self::Decimal | Self::Double | Self::Single => PrimitiveFamily::Decimal,
            Self::Boolean => PrimitiveFamily::Boolean,
            Self::Date
            | Self::DateTime
            | Self::DateTimeOffset
            | Self::TimeOfDay
            | Self::Time
            | Self::Duration => PrimitiveFamily::Temporal,
            Self::Binary | Self::Stream => PrimitiveFamily::Binary,
            Self::Geography | Self::Geometry => PrimitiveFamily::Spatial,
        }
    }

    /// JSON Schema `format` hint, when one exists.
    #[must_use]
    pub const fn json_format(self) -> Option<&'static str> {
        match self {
            Self::Guid => Some("uuid"),
            Self::Date => Some("date"),
            Self::DateTime | Self::DateTimeOffset => Some("date-time"),
            Self::TimeOfDay | Self::Time => Some("time"),
            Self::Duration => Some("duration"),
            Self::Binary | Self::Stream => Some("byte"),
            _ => None,
        }
    }
}

/// Strips a `Collection(...)` wrapper, reporting whether one was present.
#[must_use]
pub fn split_collection(value: &str) -> (&str, bool) {
    let trimmed = value.trim();
    trimmed
        .strip_prefix(COLLECTION_PREFIX)
        .and_then(|inner| inner.strip_suffix(')'))
        .map_or((trimmed, false), |inner| (inner.trim(), true))
}
