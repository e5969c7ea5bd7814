use std::io;

/// Synchronized sink for console output shared by concurrent probe tasks.
///
/// Each call writes one complete buffer so lines from different tasks never
/// interleave.
pub trait ConsoleWriter: Send + Sync {
    /// Writes bytes to primary output.
    fn write(&self, buf: &[u8]) -> io::Result<usize>;
    /// Writes bytes to error output.
    fn write_err(&self, buf: &[u8]) -> io::Result<usize>;
    /// Flushes primary output.
    fn flush(&self) -> io::Result<()>;
    /// Flushes error output.
    fn flush_err(&self) -> io::Result<()>;
}
