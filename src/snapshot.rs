//! Origen de las fotos de datos que alimentan el motor.

use crate::queries::_structs::Snapshot;
use crate::queries::classify::serves_station;
use log::{debug, error, info};
use serde::Serialize;
use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use std::sync::RwLock;

#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("MessagePack decoding error: {0}")]
    MessagePackDecode(#[from] rmp_serde::decode::Error),
    #[error("MessagePack encoding error: {0}")]
    MessagePackEncode(#[from] rmp_serde::encode::Error),
    #[error("Source unavailable: {0}")]
    Unavailable(String),
}

/// Colaborador externo que entrega los recorridos de una estación.
pub trait SnapshotSource: Send + Sync {
    fn fetch(&self, station: &str) -> Result<Snapshot, SourceError>;
}

/// Deja sólo los recorridos que pasan por la estación.
pub fn for_station(mut snapshot: Snapshot, station: &str) -> Snapshot {
    snapshot.schedules.retain(|s| serves_station(s, station));
    snapshot
}

fn is_messagepack(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("bin") | Some("msgpack")
    )
}

/// Carga una foto en JSON o, según la extensión, en MessagePack.
pub fn load_snapshot<P: AsRef<Path>>(path: P) -> Result<Snapshot, SourceError> {
    let path = path.as_ref();
    info!("Loading snapshot {}", path.display());
    let reader = BufReader::new(File::open(path)?);

    let snapshot: Snapshot = if is_messagepack(path) {
        rmp_serde::from_read(reader).map_err(|e| {
            error!("Failed to decode MessagePack from {}: {}", path.display(), e);
            SourceError::MessagePackDecode(e)
        })?
    } else {
        serde_json::from_reader(reader).map_err(|e| {
            error!("Failed to parse JSON from {}: {}", path.display(), e);
            SourceError::Json(e)
        })?
    };

    debug!(
        "Found {} schedules and {} stations in {}",
        snapshot.schedules.len(),
        snapshot.stations.len(),
        path.display()
    );
    Ok(snapshot)
}

/// Escribe la foto en MessagePack con campos nombrados.
pub fn write_messagepack<P: AsRef<Path>>(snapshot: &Snapshot, path: P) -> Result<(), SourceError> {
    let path = path.as_ref();
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let writer = BufWriter::new(File::create(path)?);
    let mut encoder = rmp_serde::encode::Serializer::new(writer).with_struct_map();
    snapshot.serialize(&mut encoder)?;
    Ok(())
}

/// Fichero de foto releído en cada consulta.
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotSource for FileSource {
    fn fetch(&self, station: &str) -> Result<Snapshot, SourceError> {
        Ok(for_station(load_snapshot(&self.path)?, station))
    }
}

/// Foto en memoria que otro componente puede reemplazar.
#[derive(Default)]
pub struct InMemorySource {
    snapshot: RwLock<Snapshot>,
}

impl InMemorySource {
    pub fn new(snapshot: Snapshot) -> Self {
        Self {
            snapshot: RwLock::new(snapshot),
        }
    }

    pub fn replace(&self, snapshot: Snapshot) {
        if let Ok(mut current) = self.snapshot.write() {
            *current = snapshot;
        }
    }
}

impl SnapshotSource for InMemorySource {
    fn fetch(&self, station: &str) -> Result<Snapshot, SourceError> {
        let snapshot = self
            .snapshot
            .read()
            .map_err(|e| SourceError::Unavailable(e.to_string()))?
            .clone();
        Ok(for_station(snapshot, station))
    }
}
