//! Refresco periódico y rotación de páginas.
//!
//! Dos tareas independientes: la de refresco publica el último `Board` en un
//! canal `watch`; la de rotación sólo lee de ese canal, de modo que una
//! consulta lenta nunca retrasa el cambio de página.

use crate::config::BoardConfig;
use crate::functions::board::{build_board, Board, BoardQuery};
use crate::functions::render::{render_page, RenderedPage};
use crate::functions::rotation::PageCursor;
use crate::queries::_structs::Snapshot;
use crate::queries::maintenance::reset_expired;
use crate::snapshot::{SnapshotSource, SourceError};
use crate::utils::time::{weekday_name, ClockTime};
use chrono::{Datelike, Local, NaiveDateTime};
use futures::future::join_all;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{interval, interval_at, Instant, MissedTickBehavior};
use tracing::{debug, error, info};

/// Reloj de pared: día de la semana y hora local leídos del mismo instante.
pub trait Clock: Send + Sync {
    fn now(&self) -> (&'static str, ClockTime);

    fn time(&self) -> ClockTime {
        self.now().1
    }
}

/// Día y hora de un único instante local.
pub fn wall_clock(instant: NaiveDateTime) -> (&'static str, ClockTime) {
    (weekday_name(instant.weekday()), instant.time().into())
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> (&'static str, ClockTime) {
        wall_clock(Local::now().naive_local())
    }
}

/// Reloj parado en un día y una hora.
pub struct FixedClock {
    weekday: &'static str,
    time: ClockTime,
}

impl FixedClock {
    pub fn new(weekday: &'static str, time: ClockTime) -> Self {
        Self { weekday, time }
    }
}

impl Clock for FixedClock {
    fn now(&self) -> (&'static str, ClockTime) {
        (self.weekday, self.time)
    }
}

/// Superficie de pintado que recibe cada página renderizada.
pub trait BoardSink: Send + Sync {
    fn show(&self, page: &RenderedPage);
}

impl BoardSink for mpsc::UnboundedSender<RenderedPage> {
    fn show(&self, page: &RenderedPage) {
        if self.send(page.clone()).is_err() {
            debug!("Board sink closed, dropping page {}", page.page);
        }
    }
}

#[derive(Debug, Clone)]
pub struct ServiceSettings {
    pub poll_interval: Duration,
    pub rotation_interval: Duration,
    pub lines_per_page: usize,
    pub reset_expired: bool,
}

impl From<&BoardConfig> for ServiceSettings {
    fn from(config: &BoardConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            rotation_interval: config.rotation_interval(),
            lines_per_page: config.lines_per_page(),
            reset_expired: config.reset_expired_on_poll,
        }
    }
}

/// Calcula el tablero de una foto ya obtenida.
pub fn derive_board(
    mut snapshot: Snapshot,
    query: &BoardQuery,
    weekday: &str,
    reference: ClockTime,
    reset: bool,
) -> Board {
    if reset {
        snapshot.schedules = reset_expired(&snapshot.schedules, reference);
    }
    build_board(&snapshot, query, weekday)
}

async fn refresh(
    query: &BoardQuery,
    source: Arc<dyn SnapshotSource>,
    clock: &dyn Clock,
    reset: bool,
) -> Result<Board, SourceError> {
    let station = query.station.clone();
    let snapshot = tokio::task::spawn_blocking(move || source.fetch(&station))
        .await
        .map_err(|e| SourceError::Unavailable(e.to_string()))??;
    let (weekday, reference) = clock.now();
    Ok(derive_board(snapshot, query, weekday, reference, reset))
}

async fn poll_loop(
    query: BoardQuery,
    source: Arc<dyn SnapshotSource>,
    clock: Arc<dyn Clock>,
    settings: ServiceSettings,
    board_tx: watch::Sender<Arc<Board>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let mut ticker = interval(settings.poll_interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => {}
            _ = shutdown.changed() => break,
        }

        let result = tokio::select! {
            result = refresh(&query, source.clone(), clock.as_ref(), settings.reset_expired) => result,
            _ = shutdown.changed() => break,
        };

        match result {
            Ok(board) => {
                debug!("Refreshed board for {}: {} entries", query.station, board.entries.len());
                board_tx.send_replace(Arc::new(board));
            }
            Err(e) => {
                error!("Failed to fetch schedules for {}: {}", query.station, e);
                board_tx.send_replace(Arc::new(Board::empty(&query)));
            }
        }
    }
    debug!("Poll task for {} stopped", query.station);
}

async fn rotation_loop(
    clock: Arc<dyn Clock>,
    sink: Arc<dyn BoardSink>,
    settings: ServiceSettings,
    mut board_rx: watch::Receiver<Arc<Board>>,
    mut shutdown: watch::Receiver<bool>,
) {
    let per_page = settings.lines_per_page;
    let mut cursor = PageCursor::new();
    let mut ticker = interval_at(
        Instant::now() + settings.rotation_interval,
        settings.rotation_interval,
    );
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    let mut board = board_rx.borrow_and_update().clone();
    sink.show(&render_page(&board, cursor.current(), clock.time(), per_page));

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                cursor.advance(board.entries.len(), per_page);
            }
            changed = board_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                board = board_rx.borrow_and_update().clone();
                cursor.clamp(board.entries.len(), per_page);
            }
            _ = shutdown.changed() => break,
        }
        sink.show(&render_page(&board, cursor.current(), clock.time(), per_page));
    }
    debug!("Rotation task stopped");
}

/// Tablero en marcha: tareas de refresco y rotación de una estación.
pub struct BoardService {
    board_rx: watch::Receiver<Arc<Board>>,
    shutdown_tx: watch::Sender<bool>,
    handles: Vec<JoinHandle<()>>,
}

impl BoardService {
    pub fn spawn(
        query: BoardQuery,
        settings: ServiceSettings,
        source: Arc<dyn SnapshotSource>,
        clock: Arc<dyn Clock>,
        sink: Arc<dyn BoardSink>,
    ) -> Self {
        info!(
            "Starting {} board for {} (poll {:?}, rotation {:?})",
            query.mode.label(),
            query.station,
            settings.poll_interval,
            settings.rotation_interval
        );

        let (board_tx, board_rx) = watch::channel(Arc::new(Board::empty(&query)));
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let poll = tokio::spawn(poll_loop(
            query,
            source,
            clock.clone(),
            settings.clone(),
            board_tx,
            shutdown_rx.clone(),
        ));
        let rotation = tokio::spawn(rotation_loop(
            clock,
            sink,
            settings,
            board_rx.clone(),
            shutdown_rx,
        ));

        Self {
            board_rx,
            shutdown_tx,
            handles: vec![poll, rotation],
        }
    }

    /// Último tablero calculado.
    pub fn latest(&self) -> Arc<Board> {
        self.board_rx.borrow().clone()
    }

    /// Detiene ambos temporizadores y espera a que terminen.
    pub async fn shutdown(mut self) {
        let _ = self.shutdown_tx.send(true);
        for result in join_all(std::mem::take(&mut self.handles)).await {
            if let Err(e) = result {
                error!("Board task failed: {}", e);
            }
        }
        info!("Board service stopped");
    }
}

impl Drop for BoardService {
    fn drop(&mut self) {
        let _ = self.shutdown_tx.send(true);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::queries::_structs::{Mode, Schedule};
    use crate::queries::classify::fixtures::*;
    use crate::snapshot::InMemorySource;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Mutex;
    use tokio::time::sleep;

    struct FailingSource;

    impl SnapshotSource for FailingSource {
        fn fetch(&self, _station: &str) -> Result<Snapshot, SourceError> {
            Err(SourceError::Unavailable("database down".to_owned()))
        }
    }

    fn settings() -> ServiceSettings {
        ServiceSettings {
            poll_interval: Duration::from_secs(10),
            rotation_interval: Duration::from_secs(10),
            lines_per_page: 10,
            reset_expired: true,
        }
    }

    fn twelve_departures() -> Snapshot {
        let schedules: Vec<Schedule> = (0..12)
            .map(|i| {
                let mut s = dijon_lyon(&i.to_string());
                s.departure_time = time(&format!("{:02}:00", 10 + i));
                s
            })
            .collect();
        Snapshot {
            schedules,
            ..Default::default()
        }
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<RenderedPage>) -> Vec<RenderedPage> {
        let mut pages = Vec::new();
        while let Ok(page) = rx.try_recv() {
            pages.push(page);
        }
        pages
    }

    #[test]
    fn test_wall_clock_reads_one_instant() {
        let day = chrono::NaiveDate::from_ymd_opt(2026, 10, 18).unwrap();
        let before = day.and_hms_opt(23, 59, 59).unwrap();
        assert_eq!(wall_clock(before), ("Sunday", "23:59".parse().unwrap()));

        let after = day.succ_opt().unwrap().and_hms_opt(0, 0, 0).unwrap();
        assert_eq!(wall_clock(after), ("Monday", "00:00".parse().unwrap()));
    }

    #[test]
    fn test_derive_board_resets_expired_overlays() {
        let mut late = dijon_lyon("1");
        late.delay_minutes = Some(10);
        let snapshot = Snapshot {
            schedules: vec![late],
            ..Default::default()
        };
        let query = BoardQuery::new("Dijon", Mode::Departures);

        let board = derive_board(snapshot.clone(), &query, "Monday", "12:00".parse().unwrap(), true);
        assert_eq!(board.entries[0].delay_minutes, Some(0));

        let board = derive_board(snapshot, &query, "Monday", "12:00".parse().unwrap(), false);
        assert_eq!(board.entries[0].delay_minutes, Some(10));
    }

    #[tokio::test(start_paused = true)]
    async fn test_rotation_cycles_pages() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = BoardService::spawn(
            BoardQuery::new("Dijon", Mode::Departures),
            settings(),
            Arc::new(InMemorySource::new(twelve_departures())),
            Arc::new(FixedClock::new("Monday", "05:00".parse().unwrap())),
            Arc::new(tx),
        );

        sleep(Duration::from_secs(1)).await;
        assert_eq!(service.latest().entries.len(), 12);
        let pages = drain(&mut rx);
        let last = pages.last().unwrap();
        assert_eq!(last.page, 0);
        assert_eq!(last.rows.len(), 10);

        sleep(Duration::from_secs(10)).await;
        let pages = drain(&mut rx);
        assert_eq!(pages.last().unwrap().page, 1);
        assert_eq!(pages.last().unwrap().rows.len(), 2);

        sleep(Duration::from_secs(10)).await;
        assert_eq!(drain(&mut rx).last().unwrap().page, 0);

        service.shutdown().await;
        drain(&mut rx);
        assert!(rx.recv().await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_fetch_publishes_empty_board() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let service = BoardService::spawn(
            BoardQuery::new("Dijon", Mode::Arrivals),
            settings(),
            Arc::new(FailingSource),
            Arc::new(FixedClock::new("Monday", "05:00".parse().unwrap())),
            Arc::new(tx),
        );

        sleep(Duration::from_secs(1)).await;
        assert!(service.latest().is_empty());
        let pages = drain(&mut rx);
        assert!(!pages.is_empty());
        assert!(pages.iter().all(|p| p.rows.is_empty() && p.page == 0));

        service.shutdown().await;
    }

    /// Fuente que bloquea su hilo durante cada consulta.
    struct SlowSource {
        inner: InMemorySource,
        delay: Duration,
        busy: Arc<AtomicBool>,
    }

    impl SnapshotSource for SlowSource {
        fn fetch(&self, station: &str) -> Result<Snapshot, SourceError> {
            self.busy.store(true, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            let result = self.inner.fetch(station);
            self.busy.store(false, Ordering::SeqCst);
            result
        }
    }

    /// Anota cada página junto con si había una consulta en curso.
    struct RecordingSink {
        busy: Arc<AtomicBool>,
        shown: Mutex<Vec<(usize, bool)>>,
    }

    impl BoardSink for RecordingSink {
        fn show(&self, page: &RenderedPage) {
            let busy = self.busy.load(Ordering::SeqCst);
            self.shown.lock().unwrap().push((page.page, busy));
        }
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_slow_fetch_does_not_hold_rotation() {
        let busy = Arc::new(AtomicBool::new(false));
        let sink = Arc::new(RecordingSink {
            busy: busy.clone(),
            shown: Mutex::new(Vec::new()),
        });
        let service = BoardService::spawn(
            BoardQuery::new("Dijon", Mode::Departures),
            ServiceSettings {
                poll_interval: Duration::from_millis(300),
                rotation_interval: Duration::from_millis(40),
                ..settings()
            },
            Arc::new(SlowSource {
                inner: InMemorySource::new(twelve_departures()),
                delay: Duration::from_millis(250),
                busy: busy.clone(),
            }),
            Arc::new(FixedClock::new("Monday", "05:00".parse().unwrap())),
            sink.clone(),
        );

        sleep(Duration::from_millis(1_200)).await;
        service.shutdown().await;

        let shown = sink.shown.lock().unwrap().clone();
        let during_fetch: Vec<usize> = shown
            .iter()
            .filter(|(_, busy)| *busy)
            .map(|(page, _)| *page)
            .collect();
        // la primera consulta entrega el tablero; las siguientes bloquean su hilo
        assert!(during_fetch.len() >= 5, "{:?}", shown);
        assert!(during_fetch.contains(&0), "{:?}", shown);
        assert!(during_fetch.contains(&1), "{:?}", shown);
    }

    #[tokio::test(start_paused = true)]
    async fn test_new_snapshot_clamps_cursor() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let source = Arc::new(InMemorySource::new(twelve_departures()));
        let service = BoardService::spawn(
            BoardQuery::new("Dijon", Mode::Departures),
            ServiceSettings {
                poll_interval: Duration::from_secs(15),
                ..settings()
            },
            source.clone(),
            Arc::new(FixedClock::new("Monday", "05:00".parse().unwrap())),
            Arc::new(tx),
        );

        // t=10s: página 1
        sleep(Duration::from_millis(10_500)).await;
        assert_eq!(drain(&mut rx).last().unwrap().page, 1);

        // t=15s: la nueva foto sólo tiene una página
        source.replace(Snapshot {
            schedules: vec![dijon_lyon("solo")],
            ..Default::default()
        });
        sleep(Duration::from_secs(5)).await;
        let last = drain(&mut rx).pop().unwrap();
        assert_eq!(last.page, 0);
        assert_eq!(last.rows.len(), 1);

        service.shutdown().await;
    }
}
