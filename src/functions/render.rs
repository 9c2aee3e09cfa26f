//! Paso de un `Board` a las filas que pinta el tablero físico.

use crate::functions::board::Board;
use crate::queries::_structs::{LocationType, Mode, Schedule, TrackAssignments};
use crate::queries::resolve::{destination_or_origin, effective_time, status};
use crate::queries::served_stations::position_of;
use crate::utils::time::{minutes_until, ClockTime};
use lazy_static::lazy_static;
use serde::Serialize;
use std::collections::HashSet;

pub const DEFAULT_TRAIN_TYPE: &str = "MOBIGO";
pub const DEFAULT_LOGO: &str = "/images/sncf-logo.png";
pub const PLATFORM_PLACEHOLDER: &str = "-";

/// Ventana (en minutos) antes de la hora en la que el tren ya no se anuncia.
const BOARDING_WINDOW_MINUTES: i64 = 2;

lazy_static! {
    static ref KNOWN_TRAIN_TYPES: HashSet<&'static str> = [
        "TER",
        "TGV InOui",
        "TGV Lyria",
        "TGV Ouigo",
        "OUIGO Trains Classiques",
        "Intercités",
        "MOBIGO",
        "Car TER",
    ]
    .into_iter()
    .collect();
}

/// Clave de marca del tipo de tren; los tipos desconocidos se muestran como MOBIGO.
pub fn train_type_key(raw: Option<&str>) -> &'static str {
    raw.and_then(|t| KNOWN_TRAIN_TYPES.get(t).copied())
        .unwrap_or(DEFAULT_TRAIN_TYPE)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardRow {
    pub id: String,
    pub logo: String,
    pub train_type: String,
    pub train_number: String,
    pub status: String,
    pub status_label: String,
    pub display_time: String,
    pub scheduled_time: String,
    pub destination: String,
    pub adjacent_stop: String,
    pub served_stations: Vec<String>,
    pub platform: String,
    pub hidden: bool,
    pub show_platform: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedPage {
    pub station: String,
    pub mode: Mode,
    pub page: usize,
    pub page_count: usize,
    pub reference_time: ClockTime,
    pub message: Option<String>,
    pub rows: Vec<BoardRow>,
    pub show_next_day: bool,
    pub next_day: Vec<BoardRow>,
}

impl RenderedPage {
    pub fn visible_rows(&self) -> impl Iterator<Item = &BoardRow> {
        self.rows.iter().filter(|r| !r.hidden)
    }
}

pub fn page_count(len: usize, per_page: usize) -> usize {
    if per_page == 0 {
        return 0;
    }
    (len + per_page - 1) / per_page
}

pub fn page_slice<T>(entries: &[T], page: usize, per_page: usize) -> &[T] {
    let start = page.saturating_mul(per_page).min(entries.len());
    let end = start.saturating_add(per_page).min(entries.len());
    &entries[start..end]
}

/// Una fila se oculta si su hora ya pasó o llega en menos de dos minutos,
/// salvo que sea la última del día.
pub fn is_suppressed(time: Option<ClockTime>, last_of_day: Option<ClockTime>, reference: ClockTime) -> bool {
    let Some(time) = time else {
        return false;
    };
    if Some(time) == last_of_day {
        return false;
    }
    minutes_until(time, reference) < BOARDING_WINDOW_MINUTES
}

pub fn platform_visible(time: Option<ClockTime>, reference: ClockTime, location: LocationType) -> bool {
    match time {
        Some(time) => {
            let diff = minutes_until(time, reference);
            diff >= 0 && diff <= location.platform_lead_minutes()
        }
        None => false,
    }
}

/// Vía asignada, si no la vía del recorrido, si no un guion.
pub fn platform_label(schedule: &Schedule, station: &str, assignments: &TrackAssignments) -> String {
    assignments
        .platform(&schedule.id, station)
        .or(schedule.track.as_deref())
        .unwrap_or(PLATFORM_PLACEHOLDER)
        .to_owned()
}

/// Paradas a anunciar: las posteriores (salidas) o anteriores (llegadas) a la estación.
pub fn route_segment(schedule: &Schedule, station: &str, mode: Mode) -> Vec<String> {
    let stops = &schedule.served_stations;
    let segment = match (position_of(stops, station), mode) {
        (Some(i), Mode::Departures) => &stops[i + 1..],
        (Some(i), Mode::Arrivals) => &stops[..i],
        (None, _) => &stops[..],
    };
    segment.iter().map(|s| s.name.clone()).collect()
}

fn base_row(board: &Board, schedule: &Schedule) -> BoardRow {
    let station = board.station.as_str();
    let mode = board.mode;
    let train_type = train_type_key(schedule.train_type.as_deref());
    let status = status(schedule);
    let display_time = effective_time(schedule, station, mode, true);
    let scheduled_time = effective_time(schedule, station, mode, false);
    let destination = match mode {
        Mode::Departures => schedule.arrival_station.clone(),
        Mode::Arrivals => schedule.departure_station.clone(),
    };

    BoardRow {
        id: schedule.id.clone(),
        logo: board
            .train_type_logos
            .get(train_type)
            .cloned()
            .unwrap_or_else(|| DEFAULT_LOGO.to_owned()),
        train_type: train_type.to_owned(),
        train_number: schedule.train_number.clone().unwrap_or_default(),
        status: status.code().to_owned(),
        status_label: status.board_label().to_owned(),
        display_time: display_time.map(|t| t.to_string()).unwrap_or_default(),
        scheduled_time: scheduled_time.map(|t| t.to_string()).unwrap_or_default(),
        destination: destination.unwrap_or_default(),
        adjacent_stop: destination_or_origin(schedule, station, mode),
        served_stations: route_segment(schedule, station, mode),
        platform: String::new(),
        hidden: false,
        show_platform: false,
    }
}

/// Pinta la página `page` del tablero a la hora `reference`.
pub fn render_page(board: &Board, page: usize, reference: ClockTime, per_page: usize) -> RenderedPage {
    let station = board.station.as_str();
    let location = board
        .station_info
        .as_ref()
        .map(|s| s.location_type)
        .unwrap_or_default();
    let pages = page_count(board.entries.len(), per_page);
    let page = if page < pages { page } else { 0 };
    let last_of_day = board
        .entries
        .last()
        .and_then(|s| effective_time(s, station, board.mode, true));

    let rows = page_slice(&board.entries, page, per_page)
        .iter()
        .map(|schedule| {
            let time = effective_time(schedule, station, board.mode, true);
            let show_platform = platform_visible(time, reference, location);
            BoardRow {
                hidden: is_suppressed(time, last_of_day, reference),
                show_platform,
                platform: if show_platform {
                    platform_label(schedule, station, &board.track_assignments)
                } else {
                    String::new()
                },
                ..base_row(board, schedule)
            }
        })
        .collect();

    // La sección del día siguiente no se oculta y siempre muestra la vía.
    let next_day: Vec<BoardRow> = board
        .next_day
        .iter()
        .take(per_page)
        .map(|schedule| BoardRow {
            show_platform: true,
            platform: platform_label(schedule, station, &board.track_assignments),
            ..base_row(board, schedule)
        })
        .collect();

    RenderedPage {
        station: board.station.clone(),
        mode: board.mode,
        page,
        page_count: pages,
        reference_time: reference,
        message: board.station_info.as_ref().and_then(|s| s.message.clone()),
        rows,
        show_next_day: page == 0 && !next_day.is_empty(),
        next_day,
    }
}
