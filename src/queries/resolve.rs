use crate::queries::_structs::{Mode, Schedule};
use crate::queries::served_stations::position_of;
use crate::utils::time::{add_delay, ClockTime};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum TrainStatus {
    Cancelled,
    Delayed {
        minutes: i64,
        delayed_departure: Option<ClockTime>,
    },
    #[serde(rename = "ontime")]
    OnTime,
}

impl TrainStatus {
    pub fn code(&self) -> &'static str {
        match self {
            TrainStatus::Cancelled => "cancelled",
            TrainStatus::Delayed { .. } => "delayed",
            TrainStatus::OnTime => "ontime",
        }
    }

    pub fn label(&self) -> String {
        match self {
            TrainStatus::Cancelled => "Train supprimé".to_owned(),
            TrainStatus::Delayed { minutes, .. } => format!("Retard {} min", minutes),
            TrainStatus::OnTime => "À l'heure".to_owned(),
        }
    }

    /// Texto corto de los tableros de andén.
    pub fn board_label(&self) -> &'static str {
        match self {
            TrainStatus::Cancelled => "Supprimé",
            TrainStatus::Delayed { .. } => "Retardé",
            TrainStatus::OnTime => "à l'heure",
        }
    }
}

/// Estado operativo: la supresión gana al retraso; un retraso de 0 no cuenta.
pub fn status(schedule: &Schedule) -> TrainStatus {
    if schedule.is_cancelled {
        return TrainStatus::Cancelled;
    }
    match schedule.positive_delay() {
        Some(minutes) => TrainStatus::Delayed {
            minutes,
            delayed_departure: schedule
                .departure_time
                .map(|t| add_delay(t, Some(minutes))),
        },
        None => TrainStatus::OnTime,
    }
}

/// Hora de paso en `station`, desplazada por el retraso si `apply_delay`.
///
/// Un tren suprimido conserva su hora teórica. Devuelve `None` si la estación
/// no forma parte del recorrido o si la parada no tiene la hora pedida.
pub fn effective_time(
    schedule: &Schedule,
    station: &str,
    mode: Mode,
    apply_delay: bool,
) -> Option<ClockTime> {
    let (endpoint, endpoint_time) = match mode {
        Mode::Departures => (&schedule.departure_station, schedule.departure_time),
        Mode::Arrivals => (&schedule.arrival_station, schedule.arrival_time),
    };

    let time = if endpoint.as_deref() == Some(station) {
        endpoint_time?
    } else {
        let stop = schedule.served_stations.iter().find(|s| s.name == station)?;
        match mode {
            Mode::Departures => stop.departure_time?,
            Mode::Arrivals => stop.arrival_time?,
        }
    };

    if apply_delay && !schedule.is_cancelled {
        Some(add_delay(time, schedule.positive_delay()))
    } else {
        Some(time)
    }
}

/// Próxima parada (salidas) o parada anterior (llegadas) respecto a `station`.
pub fn destination_or_origin(schedule: &Schedule, station: &str, mode: Mode) -> String {
    let stops = &schedule.served_stations;
    let index = position_of(stops, station);

    let adjacent = match mode {
        Mode::Departures => {
            if schedule.departure_station.as_deref() == Some(station) {
                None
            } else {
                index.filter(|i| i + 1 < stops.len()).map(|i| &stops[i + 1])
            }
        }
        Mode::Arrivals => {
            if schedule.arrival_station.as_deref() == Some(station) {
                None
            } else {
                index.filter(|i| *i > 0).map(|i| &stops[i - 1])
            }
        }
    };

    match (adjacent, mode) {
        (Some(stop), _) => stop.name.clone(),
        (None, Mode::Departures) => schedule.arrival_station.clone().unwrap_or_default(),
        (None, Mode::Arrivals) => schedule.departure_station.clone().unwrap_or_default(),
    }
}

/// Días de circulación abreviados ("Lun, Mer") o "Tous les jours".
pub fn format_operating_days(schedule: &Schedule) -> String {
    if schedule.days_of_circulation.is_empty() {
        return "Tous les jours".to_owned();
    }

    schedule
        .days_of_circulation
        .iter()
        .map(|day| match day.as_str() {
            "Monday" => "Lun",
            "Tuesday" => "Mar",
            "Wednesday" => "Mer",
            "Thursday" => "Jeu",
            "Friday" => "Ven",
            "Saturday" => "Sam",
            "Sunday" => "Dim",
            other => other,
        })
        .collect::<Vec<_>>()
        .join(", ")
}
