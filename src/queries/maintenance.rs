//! Limpieza de retrasos y supresiones caducados.
//!
//! El motor no escribe nunca: estas funciones devuelven copias nuevas que el
//! colaborador externo puede persistir.

use crate::queries::_structs::Schedule;
use crate::utils::time::ClockTime;
use tracing::debug;

/// Margen tras la llegada (con retraso) antes de limpiar el recorrido.
pub const RESET_GRACE_MINUTES: i64 = 15;

/// Hora de llegada usada para la caducidad: la del recorrido o, si falta, la
/// de llegada de la última parada.
fn reference_arrival(schedule: &Schedule) -> Option<ClockTime> {
    schedule
        .arrival_time
        .or_else(|| schedule.served_stations.last().and_then(|s| s.arrival_time))
}

pub fn is_expired(schedule: &Schedule, reference: ClockTime) -> bool {
    match reference_arrival(schedule) {
        Some(arrival) => {
            let arrival = (arrival.minutes_since_midnight() as i64)
                .saturating_add(schedule.delay_minutes.unwrap_or(0));
            arrival.saturating_add(RESET_GRACE_MINUTES) < reference.minutes_since_midnight() as i64
        }
        None => false,
    }
}

fn cleared(schedule: &Schedule) -> Schedule {
    Schedule {
        delay_minutes: Some(0),
        is_cancelled: false,
        cause: None,
        ..schedule.clone()
    }
}

/// Limpia retraso, supresión y causa de los recorridos caducados.
pub fn reset_expired(schedules: &[Schedule], reference: ClockTime) -> Vec<Schedule> {
    schedules
        .iter()
        .map(|schedule| {
            if is_expired(schedule, reference) {
                debug!("Resetting expired overlay on schedule {}", schedule.id);
                cleared(schedule)
            } else {
                schedule.clone()
            }
        })
        .collect()
}

/// Limpia retraso y supresión de todos los recorridos.
pub fn reset_all(schedules: &[Schedule]) -> Vec<Schedule> {
    schedules
        .iter()
        .map(|schedule| Schedule {
            delay_minutes: Some(0),
            is_cancelled: false,
            ..schedule.clone()
        })
        .collect()
}
