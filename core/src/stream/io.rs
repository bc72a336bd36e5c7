//! stream/io.rs
//! Output sink normalization.
//!
//! The sink is append-only: frames are written in order and never revisited.

use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

/// Canonical output abstraction
pub enum OutputSink {
    Writer(Box<dyn Write + Send>),
    File(PathBuf),
    /// Capture output in memory; surfaced on the telemetry snapshot.
    Memory,
}

/// Shared capture buffer behind `OutputSink::Memory`.
pub type CaptureBuffer = Arc<Mutex<Vec<u8>>>;

/// Normalize output sink into a boxed writer
pub fn open_output(sink: OutputSink) -> io::Result<(Box<dyn Write + Send>, Option<CaptureBuffer>)> {
    match sink {
        OutputSink::Writer(w) => Ok((w, None)),
        OutputSink::File(p) => Ok((Box::new(BufWriter::new(File::create(p)?)), None)),
        OutputSink::Memory => {
            let buf = Arc::new(Mutex::new(Vec::new()));
            let writer = SharedBufferWriter { buf: buf.clone() };
            Ok((Box::new(writer), Some(buf)))
        }
    }
}

/// Copy out whatever a capture buffer holds.
pub fn captured_bytes(buf: &CaptureBuffer) -> io::Result<Vec<u8>> {
    let guard = buf.lock().map_err(|_| poisoned())?;
    Ok(guard.clone())
}

pub struct SharedBufferWriter {
    buf: CaptureBuffer,
}

impl Write for SharedBufferWriter {
    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut guard = self.buf.lock().map_err(|_| poisoned())?;
        guard.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "capture buffer lock poisoned")
}
