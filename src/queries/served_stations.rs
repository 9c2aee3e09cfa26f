use crate::queries::_structs::Stop;
use crate::utils::serde_helpers::time_from_value;
use serde_json::Value;
use tracing::{error, warn};

/// Normaliza las gares desservies a una lista ordenada de paradas.
///
/// Acepta `null`, una cadena con JSON o una lista ya decodificada. Cada
/// elemento puede ser un nombre suelto o una parada estructurada; los que no
/// tienen nombre se descartan. El orden de entrada es el orden físico del
/// recorrido y se conserva.
pub fn normalize_served_stations(value: &Value) -> Vec<Stop> {
    match value {
        Value::Null => Vec::new(),
        Value::String(raw) => parse_served_stations(raw),
        Value::Array(entries) => entries.iter().filter_map(stop_from_entry).collect(),
        _ => {
            warn!("Served stations are neither a list nor JSON text");
            Vec::new()
        }
    }
}

/// Variante para el texto tal como sale de la columna `served_stations`.
pub fn parse_served_stations(raw: &str) -> Vec<Stop> {
    if raw.trim().is_empty() {
        return Vec::new();
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Array(entries)) => entries.iter().filter_map(stop_from_entry).collect(),
        Ok(_) => Vec::new(),
        Err(e) => {
            error!("Failed to parse servedStations: {}", e);
            Vec::new()
        }
    }
}

fn stop_from_entry(entry: &Value) -> Option<Stop> {
    match entry {
        Value::String(name) if !name.trim().is_empty() => Some(Stop::named(name.clone())),
        Value::Object(fields) => {
            let name = fields.get("name").and_then(Value::as_str)?;
            if name.trim().is_empty() {
                return None;
            }
            Some(Stop {
                name: name.to_owned(),
                arrival_time: fields.get("arrivalTime").and_then(time_from_value),
                departure_time: fields.get("departureTime").and_then(time_from_value),
            })
        }
        _ => None,
    }
}

pub fn position_of(stops: &[Stop], station: &str) -> Option<usize> {
    stops.iter().position(|s| s.name == station)
}
