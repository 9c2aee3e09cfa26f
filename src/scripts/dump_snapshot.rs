use serde_json::to_string_pretty;
use station_board::snapshot::load_snapshot;
use std::process::ExitCode;
use tracing::error;

/// Vuelca una foto (JSON o MessagePack) como JSON legible.
fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let file_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/snapshot.bin".to_owned());

    let snapshot = match load_snapshot(&file_path) {
        Ok(snapshot) => snapshot,
        Err(e) => {
            error!("No se pudo leer {}: {}", file_path, e);
            return ExitCode::FAILURE;
        }
    };

    match to_string_pretty(&snapshot) {
        Ok(json_string) => {
            println!("{}", json_string);
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!("Error al convertir a JSON: {}", e);
            ExitCode::FAILURE
        }
    }
}
