// crates/geobank-core/src/store/snapshot.rs
use super::MemoryStore;
use crate::error::{GeoError, Result};
use bincode::Options;
use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

#[cfg(feature = "compact")]
use flate2::{read::GzDecoder, write::GzEncoder, Compression};

/// Upper bound for a decoded snapshot, guards against corrupt length prefixes.
const SNAPSHOT_LIMIT: u64 = 1024 * 1024 * 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompressionMode {
    Gzip,
    None,
}

impl Default for CompressionMode {
    fn default() -> Self {
        #[cfg(feature = "compact")]
        {
            CompressionMode::Gzip
        }
        #[cfg(not(feature = "compact"))]
        {
            CompressionMode::None
        }
    }
}

impl MemoryStore {
    /// Writes the whole store as a bincode snapshot.
    pub fn save_snapshot(&self, path: impl AsRef<Path>, compression: CompressionMode) -> Result<()> {
        let file = File::create(path.as_ref())?;
        let mut writer = BufWriter::new(file);

        match compression {
            CompressionMode::Gzip => {
                #[cfg(feature = "compact")]
                {
                    let mut encoder = GzEncoder::new(writer, Compression::default());
                    bincode::serialize_into(&mut encoder, self)?;
                    encoder.finish()?.flush()?;
                }
                #[cfg(not(feature = "compact"))]
                {
                    return Err(GeoError::InvalidData(
                        "Gzip requested but 'compact' disabled".into(),
                    ));
                }
            }
            CompressionMode::None => {
                bincode::serialize_into(&mut writer, self)?;
                writer.flush()?;
            }
        }
        Ok(())
    }

    /// Reads a snapshot written by [`MemoryStore::save_snapshot`].
    pub fn load_snapshot(path: impl AsRef<Path>, compression: CompressionMode) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| {
            GeoError::NotFound(format!("Snapshot not found at {}: {}", path.display(), e))
        })?;
        let reader = BufReader::new(file);

        let stream: Box<dyn Read> = match compression {
            CompressionMode::Gzip => {
                #[cfg(feature = "compact")]
                {
                    Box::new(GzDecoder::new(reader))
                }
                #[cfg(not(feature = "compact"))]
                {
                    return Err(GeoError::InvalidData(
                        "Gzip requested but 'compact' disabled".into(),
                    ));
                }
            }
            CompressionMode::None => Box::new(reader),
        };

        let store = bincode::DefaultOptions::new()
            .with_fixint_encoding()
            .with_limit(SNAPSHOT_LIMIT)
            .allow_trailing_bytes()
            .deserialize_from(stream)?;
        Ok(store)
    }
}
