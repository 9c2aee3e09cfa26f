//! Deserializadores tolerantes para los registros del back-office.
//!
//! Los registros llegan de formularios y de columnas SQL; un campo mal
//! formado nunca debe invalidar el registro completo.

use crate::queries::_structs::Stop;
use crate::queries::served_stations::normalize_served_stations;
use crate::utils::time::ClockTime;
use serde::de::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

/// Hora opcional: vacía, nula o ilegible se lee como ausente.
pub fn deserialize_lenient_time<'de, D>(deserializer: D) -> Result<Option<ClockTime>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(time_from_value))
}

pub(crate) fn time_from_value(value: &Value) -> Option<ClockTime> {
    match value {
        Value::String(s) if s.trim().is_empty() => None,
        Value::String(s) => match s.parse() {
            Ok(time) => Some(time),
            Err(e) => {
                warn!("Ignoring time: {}", e);
                None
            }
        },
        _ => None,
    }
}

/// Texto opcional; los números (p. ej. números de tren) se convierten a texto.
pub fn deserialize_opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(s)) if !s.trim().is_empty() => Some(s),
        Some(Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}

/// Identificador numérico o textual.
pub fn deserialize_id<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_opt_string(deserializer)?.unwrap_or_default())
}

pub fn deserialize_delay<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Number(n)) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Some(Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Booleano que también acepta `0`/`1` (TINYINT) y sus formas textuales.
pub fn deserialize_flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::Bool(b)) => b,
        Some(Value::Number(n)) => n.as_i64().map(|n| n != 0).unwrap_or(false),
        Some(Value::String(s)) => matches!(s.trim(), "1" | "true"),
        _ => false,
    })
}

/// Días de circulación: lista o lista codificada en JSON. Si no se puede leer,
/// el tren circula todos los días.
pub fn deserialize_days<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let parsed = match value {
        Some(Value::String(s)) if s.trim().is_empty() => return Ok(Vec::new()),
        Some(Value::String(s)) => match serde_json::from_str::<Value>(&s) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!("Failed to parse days of circulation: {}", e);
                return Ok(Vec::new());
            }
        },
        Some(other) => other,
        None => return Ok(Vec::new()),
    };

    Ok(match parsed {
        Value::Array(days) => days
            .into_iter()
            .filter_map(|day| match day {
                Value::String(day) => Some(day),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

pub fn deserialize_served_stations<'de, D>(deserializer: D) -> Result<Vec<Stop>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.map(|v| normalize_served_stations(&v)).unwrap_or_default())
}
