// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Write-ahead log of domain mutations, in the style of the core crate's
//! event-sourcing discipline: every mutating store call appends one or more
//! [`StoreEvent`]s here before the in-memory maps are updated, under the
//! same write lock, so a crash between "decided" and "applied" cannot
//! happen. One JSON object per line; `flush()` fsyncs the buffered writes.

use fleet_core::{
    Account, Action, Instance, Node, Operation, Proxy, Run, RunEvent, Task, TerminalSession,
};
use serde::{Deserialize, Serialize};
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::error::StoreError;

/// A single domain mutation. Most variants carry the already-mutated record
/// in full rather than a delta: replay is then just "upsert this value",
/// which keeps `apply` trivially idempotent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum StoreEvent {
    TaskPut(Task),
    TaskDeleted { task_id: String },
    RunPut(Run),
    RunEventsAppended { run_id: String, events: Vec<RunEvent> },
    OperationPut(Operation),
    ActionPut(Action),
    AccountPut(Account),
    InstancePut(Instance),
    TerminalSessionPut(TerminalSession),
    NodePut(Node),
    ProxyPut(Proxy),
    ProxyDeleted { proxy_id: String },
}

/// One WAL record: a monotonic sequence number plus the event it decided.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalEntry {
    pub seq: u64,
    pub event: StoreEvent,
}

/// Flush after this many buffered, un-flushed appends even if `flush()`
/// hasn't been called explicitly — bounds how much is lost on an unclean exit.
const FLUSH_THRESHOLD: usize = 100;

/// Append-only JSON-lines log with crash-safe sequencing.
pub struct Wal {
    path: PathBuf,
    writer: BufWriter<File>,
    write_seq: u64,
    processed_seq: u64,
    pending_since_flush: usize,
}

impl Wal {
    /// Open (creating if absent) the log at `path`. `processed_seq` is the
    /// sequence number up to and including which the caller has already
    /// applied entries (e.g. from a prior run) — [`Self::next_unprocessed`]
    /// and [`Self::entries_after`] skip up to it.
    pub fn open(path: impl AsRef<Path>, processed_seq: u64) -> Result<Self, StoreError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).read(true).open(&path)?;
        let write_seq = Self::count_entries(&path)? as u64;
        Ok(Self {
            writer: BufWriter::new(file),
            path,
            write_seq,
            processed_seq,
            pending_since_flush: 0,
        })
    }

    fn count_entries(path: &Path) -> Result<usize, StoreError> {
        let file = File::open(path)?;
        Ok(BufReader::new(file).lines().filter(|l| l.as_ref().map(|s| !s.is_empty()).unwrap_or(false)).count())
    }

    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    pub fn processed_seq(&self) -> u64 {
        self.processed_seq
    }

    pub fn needs_flush(&self) -> bool {
        self.pending_since_flush >= FLUSH_THRESHOLD
    }

    /// Append one event, returning its assigned sequence number.
    pub fn append(&mut self, event: &StoreEvent) -> Result<u64, StoreError> {
        self.write_seq += 1;
        let entry = WalEntry { seq: self.write_seq, event: event.clone() };
        let line = serde_json::to_string(&entry)?;
        writeln!(self.writer, "{line}")?;
        self.pending_since_flush += 1;
        if self.needs_flush() {
            self.flush()?;
        }
        Ok(entry.seq)
    }

    pub fn flush(&mut self) -> Result<(), StoreError> {
        self.writer.flush()?;
        self.pending_since_flush = 0;
        Ok(())
    }

    /// All entries with `seq > after`, in ascending order.
    pub fn entries_after(&self, after: u64) -> Result<Vec<WalEntry>, StoreError> {
        let file = File::open(&self.path)?;
        let mut out = Vec::new();
        for line in BufReader::new(file).lines() {
            let line = line?;
            if line.is_empty() {
                continue;
            }
            let entry: WalEntry = serde_json::from_str(&line)
                .map_err(|e| StoreError::Corrupt { seq: 0, reason: e.to_string() })?;
            if entry.seq > after {
                out.push(entry);
            }
        }
        Ok(out)
    }

    /// The next entry the caller has not yet applied, advancing an internal
    /// read cursor. Returns `None` once caught up.
    pub fn next_unprocessed(&mut self) -> Result<Option<WalEntry>, StoreError> {
        let mut entries = self.entries_after(self.processed_seq)?;
        if entries.is_empty() {
            return Ok(None);
        }
        entries.truncate(1);
        Ok(entries.into_iter().next())
    }

    pub fn mark_processed(&mut self, seq: u64) {
        self.processed_seq = self.processed_seq.max(seq);
    }

    /// Replay every entry past `processed_seq` into `apply`, used at store
    /// start-up to rebuild [`crate::state::MaterializedState`] from disk.
    pub fn replay(&mut self, mut apply: impl FnMut(&StoreEvent)) -> Result<(), StoreError> {
        let entries = self.entries_after(self.processed_seq)?;
        for entry in &entries {
            apply(&entry.event);
            self.processed_seq = entry.seq;
        }
        Ok(())
    }
}
