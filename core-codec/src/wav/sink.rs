use std::io::{self, Seek, SeekFrom, Write};

/// A destination that can only be appended to.
///
/// Implements [`Seek`] so it can be handed to the decode orchestrator, but
/// every seek fails with [`io::ErrorKind::Unsupported`]. The header of a
/// decoded stream therefore cannot be patched and the call fails after the
/// payload has been written.
#[derive(Debug)]
pub struct AppendOnly<W> {
    inner: W,
}

impl<W: Write> AppendOnly<W> {
    pub fn new(inner: W) -> Self {
        Self { inner }
    }

    pub fn get_ref(&self) -> &W {
        &self.inner
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for AppendOnly<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.inner.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

impl<W> Seek for AppendOnly<W> {
    fn seek(&mut self, _pos: SeekFrom) -> io::Result<u64> {
        Err(io::Error::new(
            io::ErrorKind::Unsupported,
            "destination is append-only",
        ))
    }
}
