//! Result sinks: in-memory collection and streamed JSON lines.

use std::collections::HashSet;
use std::io::{self, BufWriter, Write};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use dashmap::DashSet;

use treesum_core::ChecksumRecord;

/// Destination for records produced by concurrent workers.
pub trait RecordSink: Sync {
    /// Take ownership of one finished record.
    fn accept(&self, record: ChecksumRecord);
}

/// Collects records into a concurrent set; duplicates collapse.
#[derive(Debug, Default)]
pub struct CollectSink {
    records: DashSet<ChecksumRecord>,
}

impl CollectSink {
    /// Create an empty sink.
    pub fn new() -> Self {
        Self {
            records: DashSet::new(),
        }
    }

    /// Number of distinct records collected.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Check if nothing was collected.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Consume the sink into a plain set.
    pub fn into_records(self) -> HashSet<ChecksumRecord> {
        self.records.into_iter().collect()
    }
}

impl RecordSink for CollectSink {
    fn accept(&self, record: ChecksumRecord) {
        self.records.insert(record);
    }
}

/// Hands records to another thread over a channel.
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<ChecksumRecord>,
}

impl ChannelSink {
    /// Wrap a channel sender.
    pub fn new(tx: Sender<ChecksumRecord>) -> Self {
        Self { tx }
    }
}

impl RecordSink for ChannelSink {
    fn accept(&self, record: ChecksumRecord) {
        // The receiver only goes away once the writer failed, and the scan
        // is cancelled in that case.
        let _ = self.tx.send(record);
    }
}

/// Writes one JSON object per line.
pub struct JsonLinesWriter<W: Write> {
    out: BufWriter<W>,
    written: u64,
}

impl<W: Write> JsonLinesWriter<W> {
    /// Wrap a writer.
    pub fn new(out: W) -> Self {
        Self {
            out: BufWriter::new(out),
            written: 0,
        }
    }

    /// Append one record.
    pub fn write_record(&mut self, record: &ChecksumRecord) -> io::Result<()> {
        serde_json::to_writer(&mut self.out, record)?;
        self.out.write_all(b"\n")?;
        self.written += 1;
        Ok(())
    }

    /// Flush buffered lines.
    pub fn flush(&mut self) -> io::Result<()> {
        self.out.flush()
    }

    /// Records written so far.
    pub fn written(&self) -> u64 {
        self.written
    }
}

/// Drain `rx` into `out` until every sender is gone.
///
/// Waits at most `interval` per receive and flushes whenever the channel
/// is idle, so readers of the destination see steady progress.
pub(crate) fn drain<W: Write>(
    rx: Receiver<ChecksumRecord>,
    out: W,
    interval: Duration,
) -> io::Result<u64> {
    let mut writer = JsonLinesWriter::new(out);
    loop {
        match rx.recv_timeout(interval) {
            Ok(record) => writer.write_record(&record)?,
            Err(RecvTimeoutError::Timeout) => writer.flush()?,
            Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    writer.flush()?;
    Ok(writer.written())
}
