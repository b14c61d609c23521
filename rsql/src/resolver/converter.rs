use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use dashmap::DashMap;
use std::str::FromStr;
use std::sync::Arc;
use uuid::Uuid;

use crate::common::{EnumType, Value, ValueType};

/// Converts a raw argument into a [Value] of a specific type.
pub type Converter = Arc<dyn Fn(&str) -> anyhow::Result<Value> + Send + Sync>;

/// Converts raw RSQL arguments into typed values.
///
/// Converters registered for a [ValueType] take precedence over the built-in
/// conversions, which cover strings, UUIDs, ISO-8601 dates and times, numbers,
/// booleans, enum variants and single characters.
///
/// Cloning shares the registered converters.
///
/// # Examples
///
/// ```rust
/// use rsql::common::{Value, ValueType};
/// use rsql::resolver::ValueConverter;
///
/// let converter = ValueConverter::new();
/// assert_eq!(converter.convert("30", &ValueType::I32), Some(Value::I32(30)));
/// assert_eq!(converter.convert("maybe", &ValueType::Bool), None);
/// ```
#[derive(Clone, Default)]
pub struct ValueConverter {
    converters: Arc<DashMap<ValueType, Converter>>,
}

impl ValueConverter {
    pub fn new() -> Self {
        ValueConverter::default()
    }

    /// Registers `converter` for `value_type`, replacing any previous one.
    pub fn register<F>(&self, value_type: ValueType, converter: F)
    where
        F: Fn(&str) -> anyhow::Result<Value> + Send + Sync + 'static,
    {
        log::debug!("Registering converter for {}", value_type);
        self.converters.insert(value_type, Arc::new(converter));
    }

    pub fn unregister(&self, value_type: &ValueType) -> bool {
        self.converters.remove(value_type).is_some()
    }

    pub fn has_converter(&self, value_type: &ValueType) -> bool {
        self.converters.contains_key(value_type)
    }

    /// Converts `raw` to `value_type`.
    ///
    /// A registered converter is tried first; when it is missing or rejects
    /// `raw`, the built-in chain is used. Returns `None` when neither succeeds,
    /// logging every failure at `warn` level.
    pub fn convert(&self, raw: &str, value_type: &ValueType) -> Option<Value> {
        // clone out so the converter never runs under the map's shard lock
        let registered = self.converters.get(value_type).map(|c| c.value().clone());
        if let Some(converter) = registered {
            match converter(raw) {
                Ok(value) => return Some(value),
                Err(err) => {
                    log::warn!("Converter for {} rejected '{}': {}", value_type, raw, err);
                }
            }
        }

        let value = convert_builtin(raw, value_type);
        if value.is_none() {
            log::warn!("Cannot convert '{}' to {}", raw, value_type);
        }
        value
    }
}

/// The built-in conversion chain, without registered converters.
pub fn convert_builtin(raw: &str, value_type: &ValueType) -> Option<Value> {
    match value_type {
        ValueType::String => Some(Value::String(raw.to_string())),
        ValueType::Uuid => Uuid::parse_str(raw).ok().map(Value::Uuid),
        ValueType::Date => parse_date(raw).map(Value::Date),
        ValueType::Time => parse_time(raw).map(Value::Time),
        ValueType::DateTime => parse_date_time(raw).map(Value::DateTime),
        ValueType::OffsetDateTime => DateTime::parse_from_rfc3339(raw)
            .ok()
            .map(Value::OffsetDateTime),
        ValueType::I8 => parse_number(raw).map(Value::I8),
        ValueType::I16 => parse_number(raw).map(Value::I16),
        ValueType::I32 => parse_number(raw).map(Value::I32),
        ValueType::I64 => parse_number(raw).map(Value::I64),
        ValueType::U8 => parse_number(raw).map(Value::U8),
        ValueType::U16 => parse_number(raw).map(Value::U16),
        ValueType::U32 => parse_number(raw).map(Value::U32),
        ValueType::U64 => parse_number(raw).map(Value::U64),
        ValueType::F32 => parse_number(raw).map(Value::F32),
        ValueType::F64 => parse_number(raw).map(Value::F64),
        ValueType::Bool => parse_bool(raw).map(Value::Bool),
        ValueType::Enum(enum_type) => parse_enum(raw, enum_type),
        ValueType::Char => parse_char(raw).map(Value::Char),
        ValueType::Entity(_) | ValueType::Custom(_) => None,
    }
}

fn parse_number<T: FromStr>(raw: &str) -> Option<T> {
    raw.parse::<T>().ok()
}

fn parse_bool(raw: &str) -> Option<bool> {
    if raw.eq_ignore_ascii_case("true") || raw == "1" {
        Some(true)
    } else if raw.eq_ignore_ascii_case("false") || raw == "0" {
        Some(false)
    } else {
        None
    }
}

fn parse_char(raw: &str) -> Option<char> {
    let mut chars = raw.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(c),
        _ => None,
    }
}

fn parse_enum(raw: &str, enum_type: &EnumType) -> Option<Value> {
    enum_type.variant(raw).map(|variant| Value::Enum {
        type_name: enum_type.name().to_string(),
        variant: variant.to_string(),
    })
}

// plain date, or the date part of a local or offset date-time
fn parse_date(raw: &str) -> Option<NaiveDate> {
    NaiveDate::from_str(raw)
        .ok()
        .or_else(|| NaiveDateTime::from_str(raw).ok().map(|dt| dt.date()))
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.date_naive()))
}

fn parse_time(raw: &str) -> Option<NaiveTime> {
    NaiveTime::from_str(raw)
        .ok()
        .or_else(|| NaiveTime::parse_from_str(raw, "%H:%M").ok())
}

// local date-time; an RFC 3339 value is normalized to UTC, a bare date to midnight
fn parse_date_time(raw: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::from_str(raw)
        .ok()
        .or_else(|| {
            DateTime::parse_from_rfc3339(raw)
                .ok()
                .map(|dt| dt.with_timezone(&Utc).naive_utc())
        })
        .or_else(|| {
            NaiveDate::from_str(raw)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}
