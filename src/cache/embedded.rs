//! Embedded Store Adapter
//!
//! Cache backed by a local sled database: a persistent, sorted, log-structured
//! key-value engine supporting prefix iteration.
//!
//! Each record is the entry envelope preceded by an 8-byte big-endian expiry
//! timestamp (unix milliseconds, `0` = never). Expired records are invisible to
//! reads and are physically removed by [`EmbeddedCache::sweep_expired`].

use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};
use sled::{Batch, Db, IVec};
use tracing::debug;

use crate::cache::entry;
use crate::cache::{Cache, MAX_TTL_SECONDS};
use crate::error::{CacheError, CodecError, Result};

// == Public Constants ==
/// Keys collected per committed delete batch
pub const DELETE_BATCH_SIZE: usize = 100_000;

/// Length of the expiry header in front of every record
const EXPIRY_LEN: usize = 8;

// == Purge Report ==
/// Outcome of a batched bulk deletion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PurgeReport {
    /// Records removed
    pub removed: usize,
    /// Batches committed
    pub batches: usize,
    /// Size of the largest committed batch
    pub largest_batch: usize,
}

// == Embedded Cache ==
/// Cache adapter over a sled database. Cloning shares the same database.
#[derive(Clone, Debug)]
pub struct EmbeddedCache {
    db: Db,
}

impl EmbeddedCache {
    // == Constructors ==
    /// Opens (or creates) the database directory at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let db = sled::Config::new().path(path.as_ref()).open()?;
        debug!("Opened embedded store at {}", path.as_ref().display());
        Ok(Self { db })
    }

    /// Opens a throwaway database removed when the last handle drops.
    pub fn temporary() -> Result<Self> {
        let db = sled::Config::new().temporary(true).open()?;
        Ok(Self { db })
    }

    // == Purge Prefix ==
    /// Deletes every record whose key starts with `prefix`, committing at most
    /// `capacity` keys per batch.
    ///
    /// Iteration is key-only. A failed batch stops the purge; earlier batches
    /// remain deleted.
    pub fn purge_prefix(&self, prefix: &str, capacity: usize) -> Result<PurgeReport> {
        let keys = self.db.scan_prefix(prefix.as_bytes()).keys();
        self.delete_in_batches(keys, capacity)
    }

    // == Sweep Expired ==
    /// Physically removes records whose TTL has elapsed.
    ///
    /// A record is only removed if it still holds the bytes seen during the
    /// scan, so a key rewritten mid-sweep keeps its new value. Returns the
    /// number of records removed.
    pub fn sweep_expired(&self) -> Result<usize> {
        let mut removed = 0;
        let mut pending: Vec<(IVec, IVec)> = Vec::new();

        for item in self.expired_records(now_ms()) {
            pending.push(item?);
            if pending.len() == DELETE_BATCH_SIZE {
                removed += self.remove_unchanged(&mut pending)?;
            }
        }
        if !pending.is_empty() {
            removed += self.remove_unchanged(&mut pending)?;
        }

        Ok(removed)
    }

    /// Persists buffered writes to disk, returning bytes flushed.
    pub fn flush(&self) -> Result<usize> {
        Ok(self.db.flush()?)
    }

    /// Number of stored records, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.db.len()
    }

    /// Returns true if no records are stored.
    pub fn is_empty(&self) -> bool {
        self.db.is_empty()
    }

    // == Batched Delete ==
    /// Collects keys into batches of `capacity` and commits each batch
    /// separately so memory stays bounded on large key spaces.
    fn delete_in_batches<I>(&self, keys: I, capacity: usize) -> Result<PurgeReport>
    where
        I: Iterator<Item = sled::Result<IVec>>,
    {
        let capacity = capacity.max(1);
        let mut report = PurgeReport::default();
        let mut pending: Vec<IVec> = Vec::with_capacity(capacity.min(DELETE_BATCH_SIZE));

        for key in keys {
            pending.push(key?);
            if pending.len() == capacity {
                self.commit_deletes(&mut pending, &mut report)?;
            }
        }
        if !pending.is_empty() {
            self.commit_deletes(&mut pending, &mut report)?;
        }

        Ok(report)
    }

    fn commit_deletes(&self, pending: &mut Vec<IVec>, report: &mut PurgeReport) -> Result<()> {
        let count = pending.len();
        let mut batch = Batch::default();
        for key in pending.drain(..) {
            batch.remove(key);
        }
        self.db.apply_batch(batch)?;

        report.removed += count;
        report.batches += 1;
        report.largest_batch = report.largest_batch.max(count);
        debug!("Committed delete batch of {} keys", count);
        Ok(())
    }

    /// Records whose expiry is at or before `now`, with the bytes observed.
    fn expired_records(&self, now: u64) -> impl Iterator<Item = sled::Result<(IVec, IVec)>> + '_ {
        self.db.iter().filter(move |item| match item {
            Ok((_, record)) => {
                matches!(split_record(record), Ok((expires_at, _)) if !is_live(expires_at, now))
            }
            Err(_) => true,
        })
    }

    /// Deletes each pending record that has not changed since it was read.
    fn remove_unchanged(&self, pending: &mut Vec<(IVec, IVec)>) -> Result<usize> {
        let scanned = pending.len();
        let mut removed = 0;
        for (key, record) in pending.drain(..) {
            let swapped = self
                .db
                .compare_and_swap(&key, Some(&record), None as Option<&[u8]>)?;
            if swapped.is_ok() {
                removed += 1;
            }
        }

        debug!("Swept {} of {} expired records", removed, scanned);
        Ok(removed)
    }

    /// Loads the live record for `key`, if any.
    fn live_record(&self, key: &str) -> Result<Option<IVec>> {
        let Some(record) = self.db.get(key.as_bytes())? else {
            return Ok(None);
        };
        let (expires_at, _) = split_record(&record)?;
        Ok(is_live(expires_at, now_ms()).then_some(record))
    }
}

impl Cache for EmbeddedCache {
    fn has(&self, key: &str) -> bool {
        match self.live_record(key) {
            Ok(record) => record.is_some(),
            Err(err) => {
                debug!("Existence check for '{}' failed: {}", key, err);
                false
            }
        }
    }

    fn get<V: DeserializeOwned>(&self, key: &str) -> Result<V> {
        let record = self
            .live_record(key)?
            .ok_or_else(|| CacheError::NotFound(key.to_string()))?;
        let (_, envelope) = split_record(&record)?;
        Ok(entry::decode(key, envelope)?)
    }

    fn set<V: Serialize + ?Sized>(
        &self,
        key: &str,
        value: &V,
        ttl_seconds: Option<u64>,
    ) -> Result<()> {
        let envelope = entry::encode(key, value)?;

        let expires_at = match ttl_seconds {
            Some(0) => return self.forget(key),
            Some(ttl) => now_ms().saturating_add(ttl.min(MAX_TTL_SECONDS) * 1000),
            None => 0,
        };

        let mut record = Vec::with_capacity(EXPIRY_LEN + envelope.len());
        record.extend_from_slice(&expires_at.to_be_bytes());
        record.extend_from_slice(&envelope);
        self.db.insert(key.as_bytes(), record)?;
        Ok(())
    }

    fn forget(&self, key: &str) -> Result<()> {
        self.db.remove(key.as_bytes())?;
        Ok(())
    }

    fn empty_by_match(&self, pattern: &str) -> Result<()> {
        let report = self.purge_prefix(pattern, DELETE_BATCH_SIZE)?;
        debug!(
            "Removed {} keys matching '{}' in {} batches",
            report.removed, pattern, report.batches
        );
        Ok(())
    }
}

// == Record Helpers ==
/// Splits a stored record into its expiry and envelope.
fn split_record(record: &[u8]) -> std::result::Result<(u64, &[u8]), CodecError> {
    if record.len() < EXPIRY_LEN {
        return Err(CodecError::Truncated {
            needed: EXPIRY_LEN,
            actual: record.len(),
        });
    }
    let (header, envelope) = record.split_at(EXPIRY_LEN);
    let mut expiry = [0u8; EXPIRY_LEN];
    expiry.copy_from_slice(header);
    Ok((u64::from_be_bytes(expiry), envelope))
}

fn is_live(expires_at: u64, now: u64) -> bool {
    expires_at == 0 || now < expires_at
}

/// Current unix time in milliseconds.
fn now_ms() -> u64 {
    chrono::Utc::now().timestamp_millis().max(0) as u64
}
