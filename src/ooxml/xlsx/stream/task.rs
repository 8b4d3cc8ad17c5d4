//! Running a session off the async executor.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::common::error::{Error, Result};

use super::entry::ReadInput;
use super::event::ReadEvent;
use super::workbook_reader::WorkbookReader;

/// A session running on tokio's blocking pool.
///
/// Events arrive through a bounded channel, so a slow consumer holds back
/// decompression instead of letting events pile up. Dropping the task (or
/// its receiver) cancels the session: the producer sees
/// [`Error::Cancelled`] on its next event and stops.
#[derive(Debug)]
pub struct ReadTask {
    events: mpsc::Receiver<ReadEvent>,
    handle: JoinHandle<Result<WorkbookReader>>,
}

impl WorkbookReader {
    /// Start reading `input` on the blocking pool.
    ///
    /// `capacity` bounds the number of undelivered events (at least 1).
    /// Must be called from within a tokio runtime.
    pub fn spawn(mut self, input: impl Into<ReadInput>, capacity: usize) -> ReadTask {
        let input = input.into();
        let (tx, events) = mpsc::channel(capacity.max(1));
        let handle = tokio::task::spawn_blocking(move || {
            let mut tx = tx;
            self.read(input, &mut tx)?;
            Ok(self)
        });
        ReadTask { events, handle }
    }
}

impl ReadTask {
    /// Next event, or `None` once the session has stopped producing.
    pub async fn next_event(&mut self) -> Option<ReadEvent> {
        self.events.recv().await
    }

    /// Receive every remaining event, then wait for the session.
    pub async fn collect(mut self) -> Result<(Vec<ReadEvent>, WorkbookReader)> {
        let mut events: Vec<ReadEvent> = Vec::new();
        while let Some(event) = self.events.recv().await {
            events.push(event);
        }
        let reader = self.join().await?;
        Ok((events, reader))
    }

    /// Stop receiving and wait for the session to end.
    ///
    /// Events not yet received are discarded; a session that still had
    /// events to deliver ends with [`Error::Cancelled`].
    pub async fn join(self) -> Result<WorkbookReader> {
        let ReadTask { events, handle } = self;
        drop(events);
        handle
            .await
            .map_err(|e| Error::Other(format!("read task failed: {}", e)))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ooxml::xlsx::stream::options::ReadOptions;
    use std::io::{Cursor, Write};
    use zip::write::SimpleFileOptions;

    fn package() -> Vec<u8> {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer.start_file("xl/sharedStrings.xml", SimpleFileOptions::default()).unwrap();
        writer.write_all(b"<sst><si><t>one</t></si><si><t>two</t></si></sst>").unwrap();
        writer.start_file("xl/worksheets/sheet1.xml", SimpleFileOptions::default()).unwrap();
        writer
            .write_all(b"<worksheet><sheetData><row r=\"1\"><c r=\"A1\" t=\"s\"><v>1</v></c></row></sheetData></worksheet>")
            .unwrap();
        writer.finish().unwrap().into_inner()
    }

    #[tokio::test]
    async fn test_spawned_session_delivers_all_events() {
        let task = WorkbookReader::new(ReadOptions::default()).spawn(ReadInput::stream(Cursor::new(package())), 2);
        let (events, reader) = task.collect().await.unwrap();

        assert!(matches!(events.last(), Some(ReadEvent::Finished)));
        assert_eq!(events.iter().filter(|e| matches!(e, ReadEvent::Row { .. })).count(), 1);
        assert_eq!(reader.shared_string(1).as_deref(), Some("two"));
        assert!(reader.is_finished());
    }

    #[tokio::test]
    async fn test_dropping_receiver_cancels() {
        let mut task = WorkbookReader::new(ReadOptions::default()).spawn(ReadInput::stream(Cursor::new(package())), 1);
        let first = task.next_event().await;
        assert!(matches!(first, Some(ReadEvent::Entry(_))));
        let result = task.join().await;
        assert!(matches!(result, Err(Error::Cancelled)));
    }

    #[tokio::test]
    async fn test_unrecognized_input_reported_on_join() {
        let task = WorkbookReader::default().spawn(ReadInput::stream(Cursor::new(b"plain text".to_vec())), 4);
        let result = task.collect().await;
        assert!(matches!(result, Err(Error::UnrecognizedInput(_))));
    }
}
