use crate::queries::_structs::{Mode, Schedule};

/// Un recorrido sin número, extremos u horas no aparece en ningún tablero.
pub fn is_valid(schedule: &Schedule) -> bool {
    schedule.train_number.is_some()
        && schedule.departure_station.is_some()
        && schedule.arrival_station.is_some()
        && schedule.departure_time.is_some()
        && schedule.arrival_time.is_some()
}

/// ¿Cuenta el recorrido como salida (o llegada) en `station`?
pub fn classify(schedule: &Schedule, station: &str, mode: Mode) -> bool {
    if !is_valid(schedule) {
        return false;
    }

    match mode {
        Mode::Departures => {
            schedule.departure_station.as_deref() == Some(station)
                || schedule
                    .served_stations
                    .iter()
                    .any(|stop| stop.name == station && stop.departure_time.is_some())
        }
        Mode::Arrivals => {
            schedule.arrival_station.as_deref() == Some(station)
                || schedule
                    .served_stations
                    .iter()
                    .any(|stop| stop.name == station && stop.arrival_time.is_some())
        }
    }
}

/// Sin días de circulación el tren circula todos los días.
pub fn operates_on(schedule: &Schedule, weekday: &str) -> bool {
    schedule.days_of_circulation.is_empty()
        || schedule.days_of_circulation.iter().any(|d| d == weekday)
}

/// Recorridos válidos que pasan por la estación, sin distinguir mayúsculas.
pub fn serves_station(schedule: &Schedule, station: &str) -> bool {
    if !is_valid(schedule) {
        return false;
    }
    let wanted = station.to_lowercase();
    let matches = |name: &str| name.to_lowercase() == wanted;

    schedule.departure_station.as_deref().map_or(false, matches)
        || schedule.arrival_station.as_deref().map_or(false, matches)
        || schedule.served_stations.iter().any(|stop| matches(&stop.name))
}

pub fn filter_by_type<'a>(schedules: &'a [Schedule], station: &str, mode: Mode) -> Vec<&'a Schedule> {
    schedules
        .iter()
        .filter(|s| classify(s, station, mode))
        .collect()
}

pub fn filter_by_day<'a>(schedules: &[&'a Schedule], weekday: &str) -> Vec<&'a Schedule> {
    schedules
        .iter()
        .copied()
        .filter(|s| operates_on(s, weekday))
        .collect()
}
