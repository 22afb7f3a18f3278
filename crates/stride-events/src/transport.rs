// transport.rs — Broker transport abstraction and built-in transports.
//
// The message broker is an external collaborator; EventTransport is the
// seam where a real client plugs in. The contract is the same for every
// implementation: a send either yields a Receipt naming the partition and
// offset the event landed on, or fails.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::EventError;

/// Where the broker placed a published event. Observability only — the
/// command path never waits on a receipt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Receipt {
    pub partition: u32,
    pub offset: u64,
}

/// Asynchronous send interface to the message broker.
#[async_trait]
pub trait EventTransport: Send + Sync {
    /// Deliver one serialized event under an ordering key.
    async fn send(&self, topic: &str, key: &str, payload: &str) -> Result<Receipt, EventError>;
}

/// Derive a stable partition from an ordering key.
///
/// Keys are hashed with SHA-256 and reduced modulo the partition count,
/// so equal keys always land on the same partition.
pub fn partition_for(key: &str, partitions: u32) -> u32 {
    let digest = Sha256::digest(key.as_bytes());
    let n = u32::from_be_bytes([digest[0], digest[1], digest[2], digest[3]]);
    n % partitions.max(1)
}

/// One record in a topic file: the payload plus its bus coordinates.
#[derive(Debug, Serialize, Deserialize)]
struct TopicRecord {
    partition: u32,
    offset: u64,
    key: String,
    payload: serde_json::Value,
}

/// Append-only per-topic JSONL files standing in for a broker.
///
/// Each topic gets `<dir>/<topic>.jsonl`; offsets count lines per topic.
/// The format is easy to tail, grep, and replay with standard tools.
pub struct JsonlTransport {
    dir: PathBuf,
    partitions: u32,
    /// Next offset per topic. Lazily recovered from existing files so a
    /// restarted process continues the sequence instead of resetting it.
    offsets: Mutex<HashMap<String, u64>>,
}

impl JsonlTransport {
    /// Create a transport rooted at `dir` with the given partition count.
    /// Creates the directory if it doesn't exist.
    pub fn new(dir: impl AsRef<Path>, partitions: u32) -> Result<Self, EventError> {
        let dir = dir.as_ref().to_path_buf();
        std::fs::create_dir_all(&dir).map_err(|source| EventError::Io {
            path: dir.display().to_string(),
            source,
        })?;
        Ok(Self {
            dir,
            partitions,
            offsets: Mutex::new(HashMap::new()),
        })
    }

    fn topic_file(&self, topic: &str) -> PathBuf {
        self.dir.join(format!("{}.jsonl", topic))
    }

    /// Count the lines already in a topic file.
    fn recover_offset(path: &Path) -> Result<u64, EventError> {
        if !path.exists() {
            return Ok(0);
        }
        let file = File::open(path).map_err(|source| EventError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let reader = BufReader::new(file);
        let mut count = 0;
        for line in reader.lines() {
            line.map_err(|source| EventError::Io {
                path: path.display().to_string(),
                source,
            })?;
            count += 1;
        }
        Ok(count)
    }
}

#[async_trait]
impl EventTransport for JsonlTransport {
    async fn send(&self, topic: &str, key: &str, payload: &str) -> Result<Receipt, EventError> {
        let path = self.topic_file(topic);
        let partition = partition_for(key, self.partitions);

        let mut offsets = self.offsets.lock().unwrap_or_else(PoisonError::into_inner);
        let offset = match offsets.get(topic) {
            Some(next) => *next,
            None => Self::recover_offset(&path)?,
        };

        let record = TopicRecord {
            partition,
            offset,
            key: key.to_string(),
            payload: serde_json::from_str(payload)?,
        };
        let line = serde_json::to_string(&record)?;

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .map_err(|source| EventError::Io {
                path: path.display().to_string(),
                source,
            })?;
        writeln!(file, "{}", line).map_err(|source| EventError::Io {
            path: path.display().to_string(),
            source,
        })?;

        offsets.insert(topic.to_string(), offset + 1);
        Ok(Receipt { partition, offset })
    }
}

/// A record captured by [`MemoryTransport`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentRecord {
    pub topic: String,
    pub key: String,
    pub payload: String,
    pub receipt: Receipt,
}

/// In-memory transport for tests and in-process consumers.
pub struct MemoryTransport {
    partitions: u32,
    sent: Mutex<Vec<SentRecord>>,
}

impl MemoryTransport {
    pub fn new(partitions: u32) -> Self {
        Self {
            partitions,
            sent: Mutex::new(Vec::new()),
        }
    }

    /// Snapshot of everything sent so far, in send order.
    pub fn sent(&self) -> Vec<SentRecord> {
        self.sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Everything sent to one topic, in send order.
    pub fn sent_to(&self, topic: &str) -> Vec<SentRecord> {
        self.sent()
            .into_iter()
            .filter(|r| r.topic == topic)
            .collect()
    }
}

impl Default for MemoryTransport {
    fn default() -> Self {
        Self::new(4)
    }
}

#[async_trait]
impl EventTransport for MemoryTransport {
    async fn send(&self, topic: &str, key: &str, payload: &str) -> Result<Receipt, EventError> {
        let mut sent = self.sent.lock().unwrap_or_else(PoisonError::into_inner);
        let offset = sent.iter().filter(|r| r.topic == topic).count() as u64;
        let receipt = Receipt {
            partition: partition_for(key, self.partitions),
            offset,
        };
        sent.push(SentRecord {
            topic: topic.to_string(),
            key: key.to_string(),
            payload: payload.to_string(),
            receipt,
        });
        Ok(receipt)
    }
}
