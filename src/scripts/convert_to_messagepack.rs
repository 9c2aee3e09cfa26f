use rayon::prelude::*;
use serde::Deserialize;
use station_board::classify::is_valid;
use station_board::snapshot::{load_snapshot, write_messagepack, SourceError};
use station_board::Snapshot;
use tracing::{error, info, instrument, warn};

// Configuración
#[derive(Debug, Deserialize)]
struct FileConfig {
    input_path: String,
    output_path: String,
}

#[derive(Debug, Deserialize)]
struct Config {
    files: Vec<FileConfig>,
}

// Manejo de errores personalizado
#[derive(Debug, thiserror::Error)]
enum ConversionError {
    #[error("Snapshot error: {0}")]
    Source(#[from] SourceError),
    #[error("No hay horarios en el archivo")]
    NoSchedules,
    #[error("Error de validación: {0}")]
    Validation(String),
}

/// Comprueba la foto antes de escribirla.
fn validate(snapshot: &Snapshot) -> Result<(), ConversionError> {
    if snapshot.schedules.is_empty() {
        return Err(ConversionError::NoSchedules);
    }

    let invalid = snapshot.schedules.iter().filter(|s| !is_valid(s)).count();
    if invalid == snapshot.schedules.len() {
        return Err(ConversionError::Validation(
            "ningún horario tiene número, extremos y horas".into(),
        ));
    }
    if invalid > 0 {
        warn!("{} horarios incompletos no aparecerán en los tableros", invalid);
    }

    let mut names: Vec<&str> = snapshot.stations.iter().map(|s| s.name.as_str()).collect();
    names.sort_unstable();
    if let Some(pair) = names.windows(2).find(|pair| pair[0] == pair[1]) {
        return Err(ConversionError::Validation(format!(
            "estación duplicada: {}",
            pair[0]
        )));
    }
    Ok(())
}

#[instrument]
fn convert_snapshot(input_path: &str, output_path: &str) -> Result<usize, ConversionError> {
    info!("Iniciando conversión de {}", input_path);

    let snapshot = load_snapshot(input_path)?;
    validate(&snapshot)?;
    write_messagepack(&snapshot, output_path)?;

    info!("Conversión completada exitosamente: {}", output_path);
    Ok(snapshot.schedules.len())
}

fn main() {
    // Inicializar el sistema de logging
    tracing_subscriber::fmt::init();

    // Cargar configuración
    let config: Config = match toml::from_str(include_str!("convert.toml")) {
        Ok(config) => config,
        Err(e) => {
            error!("Error al cargar la configuración: {}", e);
            return;
        }
    };

    // Procesar archivos en paralelo
    let results: Vec<Result<usize, ConversionError>> = config
        .files
        .par_iter()
        .map(|file| convert_snapshot(&file.input_path, &file.output_path))
        .collect();

    let mut success_count = 0;
    let mut error_count = 0;

    for (file, result) in config.files.iter().zip(results.iter()) {
        match result {
            Ok(schedules) => {
                success_count += 1;
                info!("Archivo {} procesado: {} horarios", file.input_path, schedules);
            }
            Err(e) => {
                error_count += 1;
                error!("Error al procesar {}: {}", file.input_path, e);
            }
        }
    }

    info!(
        "Proceso completado. Éxitos: {}, Errores: {}",
        success_count, error_count
    );
}
