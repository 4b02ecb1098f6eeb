use std::io;
use std::sync::{Arc, Mutex};

use tracing::Level;
use tracing::subscriber::DefaultGuard;
use tracing_subscriber::fmt::MakeWriter;

/// Collects formatted log lines in memory.
///
/// [`LogCapture::install`] sets a plain-text subscriber as the thread's
/// default until the returned guard is dropped. Under the current-thread
/// runtime of `#[tokio::test]` this also covers spawned tasks.
///
/// # Examples
///
/// ```ignore
/// let logs = LogCapture::new();
/// let _guard = logs.install();
///
/// tracing::warn!(code = 7, "something went wrong");
///
/// assert!(logs.contains("something went wrong"));
/// assert!(logs.contains("code=7"));
/// ```
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn install(&self) -> DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(Level::DEBUG)
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.buffer.lock().unwrap()).to_string()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.contents().contains(needle)
    }

    /// The first captured line containing `needle`.
    pub fn line(&self, needle: &str) -> Option<String> {
        self.contents()
            .lines()
            .find(|line| line.contains(needle))
            .map(str::to_string)
    }
}

pub struct CaptureWriter {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl io::Write for CaptureWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.buffer.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = CaptureWriter;

    fn make_writer(&'a self) -> Self::Writer {
        CaptureWriter {
            buffer: self.buffer.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_captures_message_and_fields() {
        let logs = LogCapture::new();
        {
            let _guard = logs.install();
            tracing::warn!(attempt = 3, "gateway down");
        }
        tracing::warn!("not captured");

        let line = logs.line("gateway down").unwrap();
        assert!(line.contains("WARN"));
        assert!(line.contains("attempt=3"));
        assert!(!logs.contains("not captured"));
    }
}
