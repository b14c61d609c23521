use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt::{Display, Formatter};
use uuid::Uuid;

/// Describes an enumeration attribute: its type name and the variant names an
/// argument may take.
///
/// # Usage
/// ```text
/// let status = EnumType::new("Status", &["Active", "Pending", "Closed"]);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct EnumType {
    name: String,
    variants: Vec<String>,
}

impl EnumType {
    pub fn new(name: &str, variants: &[&str]) -> Self {
        EnumType {
            name: name.to_string(),
            variants: variants.iter().map(|v| v.to_string()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn variants(&self) -> &[String] {
        &self.variants
    }

    /// Finds the variant matching `name`, exactly first and then ignoring case.
    pub fn variant(&self, name: &str) -> Option<&str> {
        self.variants
            .iter()
            .find(|v| v.as_str() == name)
            .or_else(|| self.variants.iter().find(|v| v.eq_ignore_ascii_case(name)))
            .map(|v| v.as_str())
    }
}

/// The resolved type of an attribute, and therefore the type every argument
/// compared against it is converted to.
///
/// # Variants
/// - Scalar types mirror the Rust primitives (`Bool`, `I8`..`U64`, `F32`, `F64`, `Char`, `String`)
/// - `Uuid` and the chrono date/time types
/// - `Enum` carries its variant names so conversion can match by name
/// - `Entity` names the target entity of an embedded or associated attribute
/// - `Custom` names an application type that needs a registered converter
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ValueType {
    Bool,
    I8,
    I16,
    I32,
    I64,
    U8,
    U16,
    U32,
    U64,
    F32,
    F64,
    Char,
    String,
    Uuid,
    /// A calendar date (`NaiveDate`).
    Date,
    /// A time of day (`NaiveTime`).
    Time,
    /// A local date-time without offset (`NaiveDateTime`).
    DateTime,
    /// A date-time with a fixed offset (`DateTime<FixedOffset>`).
    OffsetDateTime,
    Enum(EnumType),
    Entity(String),
    Custom(String),
}

impl ValueType {
    /// Returns a short, human readable name of the type.
    pub fn type_name(&self) -> &str {
        match self {
            ValueType::Bool => "bool",
            ValueType::I8 => "i8",
            ValueType::I16 => "i16",
            ValueType::I32 => "i32",
            ValueType::I64 => "i64",
            ValueType::U8 => "u8",
            ValueType::U16 => "u16",
            ValueType::U32 => "u32",
            ValueType::U64 => "u64",
            ValueType::F32 => "f32",
            ValueType::F64 => "f64",
            ValueType::Char => "char",
            ValueType::String => "String",
            ValueType::Uuid => "Uuid",
            ValueType::Date => "NaiveDate",
            ValueType::Time => "NaiveTime",
            ValueType::DateTime => "NaiveDateTime",
            ValueType::OffsetDateTime => "DateTime",
            ValueType::Enum(enum_type) => enum_type.name(),
            ValueType::Entity(name) => name,
            ValueType::Custom(name) => name,
        }
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// A typed argument, produced by converting a raw RSQL argument string to the
/// resolved attribute type.
///
/// `Null` stands for an argument that could not be converted and is only handed
/// to a predicate builder when the conversion failure policy allows it.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    U8(u8),
    U16(u16),
    U32(u32),
    U64(u64),
    F32(f32),
    F64(f64),
    Char(char),
    String(String),
    Uuid(Uuid),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    OffsetDateTime(DateTime<FixedOffset>),
    /// An enumeration variant, matched by name.
    Enum { type_name: String, variant: String },
    /// An application value produced by a registered converter.
    Custom { type_name: String, value: String },
}

impl Value {
    /// Returns the value type of this value, or `None` for [Value::Null].
    ///
    /// Enum values only know their type name, so the returned [EnumType] carries
    /// the single variant held by the value.
    pub fn value_type(&self) -> Option<ValueType> {
        let value_type = match self {
            Value::Null => return None,
            Value::Bool(_) => ValueType::Bool,
            Value::I8(_) => ValueType::I8,
            Value::I16(_) => ValueType::I16,
            Value::I32(_) => ValueType::I32,
            Value::I64(_) => ValueType::I64,
            Value::U8(_) => ValueType::U8,
            Value::U16(_) => ValueType::U16,
            Value::U32(_) => ValueType::U32,
            Value::U64(_) => ValueType::U64,
            Value::F32(_) => ValueType::F32,
            Value::F64(_) => ValueType::F64,
            Value::Char(_) => ValueType::Char,
            Value::String(_) => ValueType::String,
            Value::Uuid(_) => ValueType::Uuid,
            Value::Date(_) => ValueType::Date,
            Value::Time(_) => ValueType::Time,
            Value::DateTime(_) => ValueType::DateTime,
            Value::OffsetDateTime(_) => ValueType::OffsetDateTime,
            Value::Enum { type_name, variant } => {
                ValueType::Enum(EnumType::new(type_name, &[variant.as_str()]))
            }
            Value::Custom { type_name, .. } => ValueType::Custom(type_name.clone()),
        };
        Some(value_type)
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the value as an `i64` if it is any integer that fits.
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I8(v) => Some(*v as i64),
            Value::I16(v) => Some(*v as i64),
            Value::I32(v) => Some(*v as i64),
            Value::I64(v) => Some(*v),
            Value::U8(v) => Some(*v as i64),
            Value::U16(v) => Some(*v as i64),
            Value::U32(v) => Some(*v as i64),
            Value::U64(v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    /// Returns the value as an `f64` if it is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::F32(v) => Some(*v as f64),
            Value::F64(v) => Some(*v),
            Value::U64(v) => Some(*v as f64),
            other => other.as_i64().map(|v| v as f64),
        }
    }

    pub fn as_uuid(&self) -> Option<&Uuid> {
        match self {
            Value::Uuid(uuid) => Some(uuid),
            _ => None,
        }
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(v) => write!(f, "{}", v),
            Value::I8(v) => write!(f, "{}", v),
            Value::I16(v) => write!(f, "{}", v),
            Value::I32(v) => write!(f, "{}", v),
            Value::I64(v) => write!(f, "{}", v),
            Value::U8(v) => write!(f, "{}", v),
            Value::U16(v) => write!(f, "{}", v),
            Value::U32(v) => write!(f, "{}", v),
            Value::U64(v) => write!(f, "{}", v),
            Value::F32(v) => write!(f, "{}", v),
            Value::F64(v) => write!(f, "{}", v),
            Value::Char(v) => write!(f, "'{}'", v),
            Value::String(v) => write!(f, "\"{}\"", v),
            Value::Uuid(v) => write!(f, "{}", v),
            Value::Date(v) => write!(f, "{}", v),
            Value::Time(v) => write!(f, "{}", v),
            Value::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%dT%H:%M:%S%.f")),
            Value::OffsetDateTime(v) => write!(f, "{}", v.to_rfc3339()),
            Value::Enum { type_name, variant } => write!(f, "{}::{}", type_name, variant),
            Value::Custom { type_name, value } => write!(f, "{}({})", type_name, value),
        }
    }
}

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Value::$variant(value)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    f32 => F32,
    f64 => F64,
    char => Char,
    String => String,
    Uuid => Uuid,
    NaiveDate => Date,
    NaiveTime => Time,
    NaiveDateTime => DateTime,
    DateTime<FixedOffset> => OffsetDateTime,
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}
