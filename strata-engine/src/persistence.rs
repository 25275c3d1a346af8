//! # Persistence Port
//!
//! The storage seam between the core and whatever durable store the host
//! wires in. Records cross this boundary through the explicit codec in
//! `strata_core::codec`; nothing inside the core performs blocking I/O.
//!
//! Two reference implementations ship with the engine: `MemoryStore`
//! (encoded frames in memory, the default for tests) and `FileStore`
//! (append-only per-collection log with CRC-checked frames).

use std::collections::HashMap;
use std::fs::OpenOptions;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use parking_lot::RwLock;

use strata_core::codec::{decode_record, encode_record};
use strata_core::error::{Error, Result};
use strata_core::metrics::Timer;
use strata_core::types::{OperationCost, VectorRecord};

/// Abstract durable store for vector records. Supplied by the host in
/// production; `save` returns the store's own charge for the write.
pub trait PersistencePort: Send + Sync {
    fn save(&self, collection: &str, record: &VectorRecord) -> Result<OperationCost>;

    fn load_all(&self, collection: &str) -> Result<Vec<VectorRecord>>;
}

/// Abstract charge for one write in the reference stores.
const WRITE_UNIT_COST: f64 = 5.0;

/// In-memory store holding encoded frames, keyed by record id so saves
/// are upserts.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<String, Vec<(String, Vec<u8>)>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PersistencePort for MemoryStore {
    fn save(&self, collection: &str, record: &VectorRecord) -> Result<OperationCost> {
        let timer = Timer::start("memory_store_save");
        let frame = encode_record(record);
        let mut collections = self.collections.write();
        let frames = collections.entry(collection.to_string()).or_default();
        match frames.iter().position(|(id, _)| id == &record.id) {
            Some(i) => frames[i].1 = frame,
            None => frames.push((record.id.clone(), frame)),
        }
        Ok(OperationCost::new(WRITE_UNIT_COST, timer.elapsed_ms()))
    }

    fn load_all(&self, collection: &str) -> Result<Vec<VectorRecord>> {
        let collections = self.collections.read();
        let Some(frames) = collections.get(collection) else {
            return Ok(Vec::new());
        };
        frames
            .iter()
            .map(|(_, frame)| decode_record(frame))
            .collect()
    }
}

/// Append-only file store: one log per collection, each record framed as
/// `u32 length + u32 crc32 + payload`. Replaying a log keeps the last
/// frame per record id, matching upsert semantics.
pub struct FileStore {
    root: PathBuf,
}

impl FileStore {
    pub fn open(root: impl AsRef<Path>) -> Result<Self> {
        let root = root.as_ref().to_path_buf();
        std::fs::create_dir_all(&root)?;
        Ok(Self { root })
    }

    fn log_path(&self, collection: &str) -> Result<PathBuf> {
        if collection.is_empty()
            || collection
                .chars()
                .any(|c| !(c.is_ascii_alphanumeric() || c == '-' || c == '_' || c == '.'))
        {
            return Err(Error::invalid_argument(format!(
                "collection name not storable: {collection:?}"
            )));
        }
        Ok(self.root.join(format!("{collection}.log")))
    }
}

impl PersistencePort for FileStore {
    fn save(&self, collection: &str, record: &VectorRecord) -> Result<OperationCost> {
        let timer = Timer::start("file_store_save");
        let frame = encode_record(record);
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(collection)?)?;
        file.write_u32::<LittleEndian>(frame.len() as u32)?;
        file.write_u32::<LittleEndian>(crc32fast::hash(&frame))?;
        file.write_all(&frame)?;
        file.flush()?;
        Ok(OperationCost::new(WRITE_UNIT_COST, timer.elapsed_ms()))
    }

    fn load_all(&self, collection: &str) -> Result<Vec<VectorRecord>> {
        let path = self.log_path(collection)?;
        if !path.exists() {
            return Ok(Vec::new());
        }
        let mut file = std::fs::File::open(&path)?;

        // Replay: last frame per id wins.
        let mut by_id: HashMap<String, usize> = HashMap::new();
        let mut records: Vec<VectorRecord> = Vec::new();
        loop {
            let len = match file.read_u32::<LittleEndian>() {
                Ok(len) => len as usize,
                Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => break,
                Err(e) => return Err(e.into()),
            };
            let expected_crc = file.read_u32::<LittleEndian>()?;
            let mut frame = vec![0u8; len];
            file.read_exact(&mut frame)?;
            if crc32fast::hash(&frame) != expected_crc {
                return Err(Error::persistence_msg(format!(
                    "checksum mismatch in {}",
                    path.display()
                )));
            }
            let record = decode_record(&frame)?;
            match by_id.get(&record.id).copied() {
                Some(i) => records[i] = record,
                None => {
                    by_id.insert(record.id.clone(), records.len());
                    records.push(record);
                }
            }
        }
        Ok(records)
    }
}
