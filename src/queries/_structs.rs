use crate::utils::serde_helpers::*;
use crate::utils::time::ClockTime;
use serde::de::Deserializer;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::Value;
use std::collections::HashMap;
use tracing::warn;

/// Una parada del recorrido de un tren.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stop {
    pub name: String,
    pub arrival_time: Option<ClockTime>,
    pub departure_time: Option<ClockTime>,
}

impl Stop {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            arrival_time: None,
            departure_time: None,
        }
    }
}

/// Un recorrido de tren tal como lo publica el back-office.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    #[serde(default, deserialize_with = "deserialize_id")]
    pub id: String,
    #[serde(default, deserialize_with = "deserialize_opt_string")]
    pub train_number: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_string")]
    pub train_type: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_string")]
    pub departure_station: Option<String>,
    #[serde(default, deserialize_with = "deserialize_opt_string")]
    pub arrival_station: Option<String>,
    #[serde(default, deserialize_with = "deserialize_lenient_time")]
    pub departure_time: Option<ClockTime>,
    #[serde(default, deserialize_with = "deserialize_lenient_time")]
    pub arrival_time: Option<ClockTime>,
    #[serde(default, deserialize_with = "deserialize_served_stations")]
    pub served_stations: Vec<Stop>,
    #[serde(
        default,
        rename = "joursCirculation",
        alias = "daysOfCirculation",
        deserialize_with = "deserialize_days"
    )]
    pub days_of_circulation: Vec<String>,
    #[serde(default, deserialize_with = "deserialize_delay")]
    pub delay_minutes: Option<i64>,
    #[serde(default, deserialize_with = "deserialize_flag")]
    pub is_cancelled: bool,
    #[serde(default, deserialize_with = "deserialize_opt_string")]
    pub cause: Option<String>,
    #[serde(default, alias = "quai", deserialize_with = "deserialize_opt_string")]
    pub track: Option<String>,
}

impl Schedule {
    /// Retraso efectivo: sólo cuenta si es positivo.
    pub fn positive_delay(&self) -> Option<i64> {
        self.delay_minutes.filter(|d| *d > 0)
    }
}

/// Tipo de tablero: salidas o llegadas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Departures,
    Arrivals,
}

impl Mode {
    pub fn label(&self) -> &'static str {
        match self {
            Mode::Departures => "departures",
            Mode::Arrivals => "arrivals",
        }
    }

    /// Acepta la forma plural de la URL y la singular de la API.
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim() {
            "departures" | "departure" => Some(Mode::Departures),
            "arrivals" | "arrival" => Some(Mode::Arrivals),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StationCategory {
    Ter,
    Tgv,
    Intercites,
    Fret,
    Autres,
}

impl StationCategory {
    pub const ALL: [StationCategory; 5] = [
        StationCategory::Ter,
        StationCategory::Tgv,
        StationCategory::Intercites,
        StationCategory::Fret,
        StationCategory::Autres,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StationCategory::Ter => "TER",
            StationCategory::Tgv => "TGV",
            StationCategory::Intercites => "Intercités",
            StationCategory::Fret => "FRET",
            StationCategory::Autres => "Autres",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|c| c.label() == label)
    }
}

impl Serialize for StationCategory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// Tipo de ubicación de la estación; decide con cuánta antelación se muestra la vía.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LocationType {
    #[default]
    Urban,
    Interurban,
}

impl LocationType {
    pub fn label(&self) -> &'static str {
        match self {
            LocationType::Urban => "Ville",
            LocationType::Interurban => "Interurbain",
        }
    }

    /// Minutos antes de la salida a partir de los cuales se muestra la vía.
    pub fn platform_lead_minutes(&self) -> i64 {
        match self {
            LocationType::Urban => 20,
            LocationType::Interurban => 720,
        }
    }
}

impl Serialize for LocationType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

impl<'de> Deserialize<'de> for LocationType {
    // Todo lo que no sea "Ville" cuenta como interurbano; sin valor, urbano.
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            None => LocationType::Urban,
            Some(s) if s.is_empty() || s == "Ville" => LocationType::Urban,
            Some(_) => LocationType::Interurban,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Station {
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_categories")]
    pub categories: Vec<StationCategory>,
    #[serde(default)]
    pub location_type: LocationType,
    #[serde(default, deserialize_with = "deserialize_opt_string")]
    pub message: Option<String>,
}

fn deserialize_categories<'de, D>(deserializer: D) -> Result<Vec<StationCategory>, D::Error>
where
    D: Deserializer<'de>,
{
    let labels = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(labels
        .iter()
        .filter_map(|label| label.as_str().and_then(StationCategory::from_label))
        .collect())
}

/// Vías asignadas: id de recorrido → estación → vía.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackAssignments(pub HashMap<String, HashMap<String, String>>);

impl TrackAssignments {
    pub fn platform(&self, schedule_id: &str, station: &str) -> Option<&str> {
        self.0
            .get(schedule_id)
            .and_then(|by_station| by_station.get(station))
            .map(String::as_str)
            .filter(|p| !p.is_empty())
    }

    pub fn assign(&mut self, schedule_id: &str, station: &str, platform: &str) {
        self.0
            .entry(schedule_id.to_owned())
            .or_default()
            .insert(station.to_owned(), platform.to_owned());
    }
}

/// Foto de los datos de referencia que entrega el colaborador externo.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    #[serde(default, deserialize_with = "deserialize_schedules")]
    pub schedules: Vec<Schedule>,
    #[serde(default)]
    pub stations: Vec<Station>,
    #[serde(default)]
    pub track_assignments: TrackAssignments,
    #[serde(default)]
    pub train_type_logos: HashMap<String, String>,
}

impl Snapshot {
    pub fn station(&self, name: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.name == name)
    }
}

/// Un recorrido ilegible se descarta sin afectar a los demás.
fn deserialize_schedules<'de, D>(deserializer: D) -> Result<Vec<Schedule>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(raw
        .into_iter()
        .filter_map(|value| match serde_json::from_value::<Schedule>(value) {
            Ok(schedule) => Some(schedule),
            Err(e) => {
                warn!("Skipping unreadable schedule: {}", e);
                None
            }
        })
        .collect())
}
