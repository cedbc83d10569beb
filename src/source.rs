use serde::Serialize;
use std::io::{self, ErrorKind, Read, Seek, SeekFrom};

/// What the reader needs from the bytes it walks: bounded sequential reads and
/// forward skips. Nothing ever seeks backwards.
///
/// Any `Read + Seek` (a `File`, a `Cursor`, `&mut File`) is a source as is.
/// Wrap plain readers such as stdin in [`ForwardOnly`].
pub trait AtomSource {
    /// Fill as much of `buf` as the source can. Returns the number of bytes
    /// read, which is smaller than `buf.len()` only at end of stream.
    fn read_up_to(&mut self, buf: &mut [u8]) -> io::Result<usize>;

    /// Move forward `n` bytes from the current position.
    fn skip(&mut self, n: u64) -> io::Result<()>;
}

fn fill<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> io::Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        }
    }
    Ok(filled)
}

impl<R: Read + Seek> AtomSource for R {
    fn read_up_to(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        fill(self, buf)
    }

    fn skip(&mut self, n: u64) -> io::Result<()> {
        let delta = i64::try_from(n)
            .map_err(|_| io::Error::new(ErrorKind::InvalidInput, "skip distance overflows i64"))?;
        self.seek(SeekFrom::Current(delta))?;
        Ok(())
    }
}

/// Adapter for readers that cannot seek: skipping reads and discards.
#[derive(Debug)]
pub struct ForwardOnly<R> {
    inner: R,
}

impl<R: Read> ForwardOnly<R> {
    pub fn new(inner: R) -> Self {
        ForwardOnly { inner }
    }

    pub fn into_inner(self) -> R {
        self.inner
    }
}

impl<R: Read> AtomSource for ForwardOnly<R> {
    fn read_up_to(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        fill(&mut self.inner, buf)
    }

    fn skip(&mut self, n: u64) -> io::Result<()> {
        // Running out early is fine; the next header read reports end of stream.
        io::copy(&mut (&mut self.inner).take(n), &mut io::sink())?;
        Ok(())
    }
}

/// Traffic seen by a [`Counted`] source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SourceStats {
    pub reads: u64,
    pub bytes_read: u64,
    pub skips: u64,
    pub bytes_skipped: u64,
}

/// Wraps a source and counts every read and skip that goes through it.
///
/// Handy for checking how much of a file a search actually touched.
#[derive(Debug)]
pub struct Counted<S> {
    inner: S,
    stats: SourceStats,
}

impl<S: AtomSource> Counted<S> {
    pub fn new(inner: S) -> Self {
        Counted { inner, stats: SourceStats::default() }
    }

    pub fn stats(&self) -> SourceStats {
        self.stats
    }

    pub fn get_ref(&self) -> &S {
        &self.inner
    }

    pub fn into_inner(self) -> S {
        self.inner
    }
}

impl<S: AtomSource> AtomSource for Counted<S> {
    fn read_up_to(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read_up_to(buf)?;
        self.stats.reads += 1;
        self.stats.bytes_read += n as u64;
        Ok(n)
    }

    fn skip(&mut self, n: u64) -> io::Result<()> {
        self.inner.skip(n)?;
        self.stats.skips += 1;
        self.stats.bytes_skipped += n;
        Ok(())
    }
}
