use crate::queries::_structs::{Mode, Schedule, Snapshot, Station, TrackAssignments};
use crate::queries::classify::{filter_by_day, filter_by_type};
use crate::queries::resolve::effective_time;
use crate::utils::time::next_weekday;
use std::collections::HashMap;
use tracing::debug;

/// Líneas por página del tablero.
pub const LINES_PER_PAGE: usize = 10;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum QueryError {
    #[error("Station or Gare parameter is required")]
    MissingStation,
    #[error("Type parameter is required")]
    MissingMode,
    #[error("Invalid type '{0}', use 'departures' or 'arrivals'")]
    InvalidMode(String),
}

/// Qué tablero se pide: estación y tipo.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoardQuery {
    pub station: String,
    pub mode: Mode,
}

impl BoardQuery {
    pub fn new(station: impl Into<String>, mode: Mode) -> Self {
        Self {
            station: station.into(),
            mode,
        }
    }

    pub fn parse(station: Option<&str>, mode: Option<&str>) -> Result<Self, QueryError> {
        let station = station
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(QueryError::MissingStation)?;
        let raw_mode = mode
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .ok_or(QueryError::MissingMode)?;
        let mode = Mode::parse(raw_mode).ok_or_else(|| QueryError::InvalidMode(raw_mode.to_owned()))?;
        Ok(Self::new(station, mode))
    }

    /// Lee los parámetros de una URL (`station` o `gare`, `type` o `mode`).
    pub fn from_params<'a, I>(params: I) -> Result<Self, QueryError>
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let params: HashMap<&str, &str> = params.into_iter().collect();
        let station = params.get("station").or_else(|| params.get("gare")).copied();
        let mode = params.get("type").or_else(|| params.get("mode")).copied();
        Self::parse(station, mode)
    }
}

/// Orden estable por hora efectiva; los recorridos sin hora van primero.
pub fn sort_by_effective_time<'a>(
    schedules: &[&'a Schedule],
    station: &str,
    mode: Mode,
) -> Vec<&'a Schedule> {
    let mut sorted = schedules.to_vec();
    sorted.sort_by_key(|s| effective_time(s, station, mode, true));
    sorted
}

/// Tablero calculado a partir de una foto; inmutable una vez construido.
#[derive(Debug, Clone, PartialEq)]
pub struct Board {
    pub station: String,
    pub mode: Mode,
    pub weekday: String,
    pub station_info: Option<Station>,
    pub entries: Vec<Schedule>,
    pub next_day: Vec<Schedule>,
    pub track_assignments: TrackAssignments,
    pub train_type_logos: HashMap<String, String>,
}

impl Board {
    /// Tablero vacío para una consulta que aún no tiene datos.
    pub fn empty(query: &BoardQuery) -> Self {
        Self {
            station: query.station.clone(),
            mode: query.mode,
            weekday: String::new(),
            station_info: None,
            entries: Vec::new(),
            next_day: Vec::new(),
            track_assignments: TrackAssignments::default(),
            train_type_logos: HashMap::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Filtra, separa por día y ordena los recorridos de la estación.
pub fn build_board(snapshot: &Snapshot, query: &BoardQuery, weekday: &str) -> Board {
    let station = query.station.as_str();
    let by_type = filter_by_type(&snapshot.schedules, station, query.mode);

    let today = filter_by_day(&by_type, weekday);
    let entries = sort_by_effective_time(&today, station, query.mode);

    let next_day = match next_weekday(weekday) {
        Some(tomorrow) => {
            let tomorrow = filter_by_day(&by_type, tomorrow);
            sort_by_effective_time(&tomorrow, station, query.mode)
        }
        None => Vec::new(),
    };

    debug!(
        "Board for {} ({}): {} today, {} next day",
        station,
        query.mode.label(),
        entries.len(),
        next_day.len()
    );

    Board {
        station: station.to_owned(),
        mode: query.mode,
        weekday: weekday.to_owned(),
        station_info: snapshot.station(station).cloned(),
        entries: entries.into_iter().cloned().collect(),
        next_day: next_day.into_iter().cloned().collect(),
        track_assignments: snapshot.track_assignments.clone(),
        train_type_logos: snapshot.train_type_logos.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::classify::fixtures::*;

    fn departing(id: &str, at: &str) -> Schedule {
        let mut schedule = dijon_lyon(id);
        schedule.departure_time = time(at);
        schedule
    }

    #[test]
    fn test_query_parsing() {
        assert_eq!(
            BoardQuery::parse(Some("Dijon"), Some("departures")),
            Ok(BoardQuery::new("Dijon", Mode::Departures))
        );
        assert_eq!(BoardQuery::parse(None, Some("arrivals")), Err(QueryError::MissingStation));
        assert_eq!(BoardQuery::parse(Some("  "), Some("arrivals")), Err(QueryError::MissingStation));
        assert_eq!(BoardQuery::parse(Some("Dijon"), None), Err(QueryError::MissingMode));
        assert_eq!(
            BoardQuery::parse(Some("Dijon"), Some("both")),
            Err(QueryError::InvalidMode("both".to_owned()))
        );
        assert_eq!(
            BoardQuery::from_params(vec![("gare", "Beaune"), ("type", "arrivals")]),
            Ok(BoardQuery::new("Beaune", Mode::Arrivals))
        );
    }

    #[test]
    fn test_sort_is_stable_with_missing_times_first() {
        let a = departing("1", "09:00");
        let b = departing("2", "07:30");
        let c = departing("3", "09:00");
        let mut d = departing("4", "06:00");
        // sin hora en Beaune
        d.served_stations[0].departure_time = None;

        let all = vec![&a, &b, &c];
        let sorted = sort_by_effective_time(&all, "Dijon", Mode::Departures);
        let ids: Vec<&str> = sorted.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);

        let all = vec![&a, &d];
        let sorted = sort_by_effective_time(&all, "Beaune", Mode::Departures);
        assert_eq!(sorted[0].id, "4");
    }

    #[test]
    fn test_sort_uses_delayed_time() {
        let mut late = departing("1", "08:00");
        late.delay_minutes = Some(45);
        let punctual = departing("2", "08:30");
        let all = vec![&late, &punctual];
        let sorted = sort_by_effective_time(&all, "Dijon", Mode::Departures);
        assert_eq!(sorted[0].id, "2");
    }

    #[test]
    fn test_build_board_splits_days() {
        let mut sunday_only = departing("1", "07:00");
        sunday_only.days_of_circulation = vec!["Sunday".to_owned()];
        let daily = departing("2", "09:00");
        let mut invalid = departing("3", "08:00");
        invalid.train_number = None;

        let snapshot = Snapshot {
            schedules: vec![daily, sunday_only, invalid],
            ..Default::default()
        };
        let query = BoardQuery::new("Dijon", Mode::Departures);

        let board = build_board(&snapshot, &query, "Saturday");
        let today: Vec<&str> = board.entries.iter().map(|s| s.id.as_str()).collect();
        let tomorrow: Vec<&str> = board.next_day.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(today, vec!["2"]);
        assert_eq!(tomorrow, vec!["1", "2"]);
    }

    #[test]
    fn test_unknown_weekday_has_no_next_day() {
        let snapshot = Snapshot {
            schedules: vec![departing("1", "07:00")],
            ..Default::default()
        };
        let board = build_board(&snapshot, &BoardQuery::new("Dijon", Mode::Departures), "Samedi");
        // sin días de circulación circula "todos los días", incluso uno desconocido
        assert_eq!(board.entries.len(), 1);
        assert!(board.next_day.is_empty());
    }
}
