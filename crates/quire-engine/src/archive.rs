// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Streaming zip producer.
//
// Producers append entries through a bounded channel; one blocking task
// consumes them and feeds the zip encoder in arrival order. The bound gives
// backpressure: a producer that outruns the encoder parks on `append`
// instead of buffering entries without limit. If the encoder dies, the
// channel closes and the next `append` fails, which stops the producer.

use std::io::{Cursor, Write};
use std::path::PathBuf;

use quire_core::error::{QuireError, Result};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{debug, instrument};
use zip::write::{SimpleFileOptions, ZipWriter};

/// One named entry in the archive.
#[derive(Debug)]
pub struct ArchiveEntry {
    pub name: String,
    pub source: EntrySource,
}

/// Where an entry's bytes come from.
#[derive(Debug)]
pub enum EntrySource {
    Buffer(Vec<u8>),
    File(PathBuf),
}

impl ArchiveEntry {
    pub fn from_bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            source: EntrySource::Buffer(bytes),
        }
    }

    pub fn from_file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            source: EntrySource::File(path.into()),
        }
    }
}

/// Handle for feeding entries to the running encoder.
pub struct ArchiveProducer {
    tx: mpsc::Sender<ArchiveEntry>,
    task: JoinHandle<Result<Vec<u8>>>,
}

impl ArchiveProducer {
    /// Start the encoder with the given channel capacity.
    pub fn new(capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        let task = tokio::task::spawn_blocking(move || encode(rx));
        Self { tx, task }
    }

    /// Queue one entry. Blocks (asynchronously) while the channel is full;
    /// fails if the encoder has stopped.
    pub async fn append(&self, entry: ArchiveEntry) -> Result<()> {
        self.tx.send(entry).await.map_err(|_| {
            QuireError::Io(std::io::Error::other("archive encoder stopped"))
        })
    }

    /// Close the channel and wait for the finished archive bytes.
    #[instrument(skip_all)]
    pub async fn finish(self) -> Result<Vec<u8>> {
        drop(self.tx);
        self.task
            .await
            .map_err(|err| QuireError::Io(std::io::Error::other(err)))?
    }
}

/// Blocking consumer: drains the channel into the zip encoder.
fn encode(mut rx: mpsc::Receiver<ArchiveEntry>) -> Result<Vec<u8>> {
    let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
    let options = SimpleFileOptions::default();

    let mut count = 0usize;
    while let Some(entry) = rx.blocking_recv() {
        zip.start_file(entry.name.as_str(), options)
            .map_err(|err| QuireError::Io(std::io::Error::other(err)))?;
        match entry.source {
            EntrySource::Buffer(bytes) => zip.write_all(&bytes)?,
            EntrySource::File(path) => {
                let bytes = std::fs::read(&path)?;
                zip.write_all(&bytes)?;
            }
        }
        count += 1;
    }

    let cursor = zip
        .finish()
        .map_err(|err| QuireError::Io(std::io::Error::other(err)))?;
    debug!(entries = count, bytes = cursor.get_ref().len(), "archive finished");
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry_names(bytes: &[u8]) -> Vec<String> {
        let reader = Cursor::new(bytes);
        let archive = zip::ZipArchive::new(reader).unwrap();
        archive.file_names().map(String::from).collect()
    }

    #[tokio::test]
    async fn entries_arrive_in_append_order() {
        let producer = ArchiveProducer::new(2);
        for i in 1..=5 {
            producer
                .append(ArchiveEntry::from_bytes(format!("part_{i}.txt"), vec![i]))
                .await
                .unwrap();
        }
        let bytes = producer.finish().await.unwrap();

        let mut names = entry_names(&bytes);
        names.sort();
        assert_eq!(
            names,
            ["part_1.txt", "part_2.txt", "part_3.txt", "part_4.txt", "part_5.txt"]
        );
    }

    #[tokio::test]
    async fn file_sourced_entries_are_read_lazily() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("page.png");
        std::fs::write(&path, b"pixels").unwrap();

        let producer = ArchiveProducer::new(1);
        producer
            .append(ArchiveEntry::from_file("images/page.png", &path))
            .await
            .unwrap();
        let bytes = producer.finish().await.unwrap();

        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.as_slice())).unwrap();
        let mut file = archive.by_name("images/page.png").unwrap();
        let mut content = Vec::new();
        std::io::Read::read_to_end(&mut file, &mut content).unwrap();
        assert_eq!(content, b"pixels");
    }

    #[tokio::test]
    async fn missing_file_entry_fails_the_archive() {
        let producer = ArchiveProducer::new(1);
        producer
            .append(ArchiveEntry::from_file("gone.bin", "/nonexistent/gone.bin"))
            .await
            .unwrap();
        assert!(producer.finish().await.is_err());
    }

    #[tokio::test]
    async fn empty_archive_is_still_valid() {
        let producer = ArchiveProducer::new(1);
        let bytes = producer.finish().await.unwrap();
        assert!(entry_names(&bytes).is_empty());
    }
}
