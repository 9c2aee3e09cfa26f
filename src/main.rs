use station_board::config::BoardConfig;
use station_board::render::RenderedPage;
use station_board::service::{BoardService, BoardSink, ServiceSettings, SystemClock};
use station_board::snapshot::FileSource;
use std::sync::Arc;
use tracing::{error, info};

/// Pinta cada página en la consola.
struct ConsoleSink;

impl BoardSink for ConsoleSink {
    fn show(&self, page: &RenderedPage) {
        println!(
            "== {} ({}) {} | página {}/{}",
            page.station,
            page.mode.label(),
            page.reference_time,
            page.page + 1,
            page.page_count.max(1)
        );
        if let Some(message) = &page.message {
            println!("   {}", message);
        }

        let mut visible = 0;
        for row in page.visible_rows() {
            visible += 1;
            println!(
                "{:>5}  {:<24} {:<8} {:<10} {:<24} {:>3}",
                row.display_time,
                row.train_type,
                row.train_number,
                row.status_label,
                row.destination,
                row.platform
            );
            if !row.served_stations.is_empty() {
                println!("       via {}", row.served_stations.join(" • "));
            }
        }
        if visible == 0 {
            println!("Aucun horaire trouvé pour cette gare.");
        }

        if page.show_next_day {
            println!("Les prochains {} auront lieu demain.", page.mode.label());
            for row in &page.next_day {
                println!(
                    "{:>5}  {:<24} {:<8} {:<24} {:>3}",
                    row.display_time, row.train_type, row.train_number, row.destination, row.platform
                );
            }
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt::init();

    let config = match BoardConfig::load() {
        Ok(config) => config,
        Err(e) => {
            error!("Error loading configuration: {}", e);
            return;
        }
    };

    let query = match config.query() {
        Ok(query) => query,
        Err(e) => {
            error!("{}", e);
            return;
        }
    };

    let service = BoardService::spawn(
        query,
        ServiceSettings::from(&config),
        Arc::new(FileSource::new(&config.snapshot_path)),
        Arc::new(SystemClock),
        Arc::new(ConsoleSink),
    );

    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutting down");
    service.shutdown().await;
}
