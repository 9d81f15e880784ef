use std::io::Write;
use tracing::warn;

/// Receiver of replayed records
pub trait SentenceSink {
    /// Deliver one record, without line terminator
    fn emit(&mut self, record: &str);
}

impl<F: FnMut(&str)> SentenceSink for F {
    fn emit(&mut self, record: &str) {
        self(record)
    }
}

/// Writes each record as a CRLF-terminated line
pub struct WriterSink<W: Write> {
    writer: W,
    failed: bool,
}

impl<W: Write> WriterSink<W> {
    pub fn new(writer: W) -> Self {
        Self {
            writer,
            failed: false,
        }
    }

    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> SentenceSink for WriterSink<W> {
    fn emit(&mut self, record: &str) {
        let written = write!(self.writer, "{record}\r\n").and_then(|_| self.writer.flush());
        if let Err(e) = written {
            // Warn once per sink
            if !self.failed {
                warn!("Failed to write replayed record: {}", e);
                self.failed = true;
            }
        }
    }
}
