//! Synchronized terminal output shared by concurrent probe tasks.

use std::io::{self, Stderr, Stdout, Write};
use std::sync::{Arc, Mutex};

use routeprobe_domain::ConsoleWriter;

/// Console writer that serializes every write behind a mutex.
///
/// Each progress line is written with a single call, so lines from
/// concurrent probes never interleave. Generic over the writers to allow
/// capturing output in tests.
#[derive(Debug)]
pub struct StdConsoleWriter<O = Stdout, E = Stderr> {
    stdout: Arc<Mutex<O>>,
    stderr: Arc<Mutex<E>>,
}

impl<O, E> Clone for StdConsoleWriter<O, E> {
    fn clone(&self) -> Self {
        Self { stdout: self.stdout.clone(), stderr: self.stderr.clone() }
    }
}

impl Default for StdConsoleWriter<Stdout, Stderr> {
    fn default() -> Self {
        Self::with_writers(io::stdout(), io::stderr())
    }
}

impl<O, E> StdConsoleWriter<O, E> {
    pub fn with_writers(stdout: O, stderr: E) -> Self {
        Self { stdout: Arc::new(Mutex::new(stdout)), stderr: Arc::new(Mutex::new(stderr)) }
    }
}

impl<O: Write + Send, E: Write + Send> ConsoleWriter for StdConsoleWriter<O, E> {
    fn write(&self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.stdout.lock().unwrap_or_else(|e| e.into_inner());
        guard.write_all(buf)?;
        Ok(buf.len())
    }

    fn write_err(&self, buf: &[u8]) -> io::Result<usize> {
        let mut guard = self.stderr.lock().unwrap_or_else(|e| e.into_inner());
        guard.write_all(buf)?;
        Ok(buf.len())
    }

    fn flush(&self) -> io::Result<()> {
        let mut guard = self.stdout.lock().unwrap_or_else(|e| e.into_inner());
        guard.flush()
    }

    fn flush_err(&self) -> io::Result<()> {
        let mut guard = self.stderr.lock().unwrap_or_else(|e| e.into_inner());
        guard.flush()
    }
}
