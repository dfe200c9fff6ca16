//! A buffered, seekable stream over any `Read + Write + Seek` handle.
//!
//! [`BufferedStream`] keeps separate read and write buffers, each of the same capacity, and keeps
//! them consistent with the position of the underlying handle:
//! - Reading flushes any pending writes first.
//! - Writing rewinds the handle over unread read-ahead and discards it.
//! - Seeking flushes pending writes and discards read-ahead, except for `SeekFrom::Current`
//!   offsets that stay within the read-ahead.

use std::fmt::{self, Debug, Formatter};
use std::io::{self, BufRead, ErrorKind, Read, Seek, SeekFrom, Write};

pub const DEFAULT_BUFFER_SIZE: usize = 4096;

pub struct BufferedStream<T: Write> {
    inner: T,
    read_buf: Box<[u8]>,
    pos: usize,
    filled: usize,
    write_buf: Vec<u8>,
}

impl<T: Write> BufferedStream<T> {
    pub fn new(inner: T) -> BufferedStream<T> {
        BufferedStream::with_capacity(DEFAULT_BUFFER_SIZE, inner)
    }

    /// Creates a stream whose read and write buffers each hold `capacity` bytes. A capacity of
    /// zero is raised to one.
    pub fn with_capacity(capacity: usize, inner: T) -> BufferedStream<T> {
        let capacity = capacity.max(1);
        BufferedStream {
            inner,
            read_buf: vec![0; capacity].into_boxed_slice(),
            pos: 0,
            filled: 0,
            write_buf: Vec::with_capacity(capacity),
        }
    }

    pub fn get_ref(&self) -> &T {
        &self.inner
    }

    pub fn capacity(&self) -> usize {
        self.read_buf.len()
    }

    /// The number of bytes read ahead from the handle but not yet consumed.
    pub fn buffered_read(&self) -> usize {
        self.filled - self.pos
    }

    /// The number of bytes written to the stream but not yet passed on to the handle.
    pub fn buffered_write(&self) -> usize {
        self.write_buf.len()
    }

    fn flush_write_buf(&mut self) -> io::Result<()> {
        let mut written = 0;
        let result = loop {
            if written >= self.write_buf.len() {
                break Ok(());
            }
            match self.inner.write(&self.write_buf[written..]) {
                Ok(0) => break Err(io::Error::new(ErrorKind::WriteZero, "failed to write the buffered data")),
                Ok(count) => written += count,
                Err(e) if e.kind() == ErrorKind::Interrupted => (),
                Err(e) => break Err(e),
            }
        };
        // Keep whatever wasn't written, so that a retry doesn't duplicate data.
        self.write_buf.drain(..written);
        result
    }
}

impl<T: Write + Seek> BufferedStream<T> {
    fn discard_read_ahead(&mut self) -> io::Result<()> {
        let remaining = self.buffered_read();
        if remaining > 0 {
            self.inner.seek(SeekFrom::Current(-offset(remaining)?))?;
        }
        self.pos = 0;
        self.filled = 0;
        Ok(())
    }

    fn logical_position(&mut self) -> io::Result<u64> {
        let remaining = self.buffered_read() as u64;
        Ok(self.inner.stream_position()? + self.write_buf.len() as u64 - remaining)
    }
}

fn offset(count: usize) -> io::Result<i64> {
    i64::try_from(count).map_err(|_| io::Error::new(ErrorKind::InvalidInput, "offset overflow"))
}

impl<T: Read + Write + Seek> Read for BufferedStream<T> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // Bypass the buffer entirely for large reads.
        if self.pos == self.filled && buf.len() >= self.capacity() {
            self.flush_write_buf()?;
            return self.inner.read(buf);
        }
        let available = self.fill_buf()?;
        let count = available.len().min(buf.len());
        buf[..count].copy_from_slice(&available[..count]);
        self.consume(count);
        Ok(count)
    }
}

impl<T: Read + Write + Seek> BufRead for BufferedStream<T> {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        self.flush_write_buf()?;
        if self.pos >= self.filled {
            self.filled = self.inner.read(&mut self.read_buf)?;
            self.pos = 0;
        }
        Ok(&self.read_buf[self.pos..self.filled])
    }

    fn consume(&mut self, amount: usize) {
        self.pos = (self.pos + amount).min(self.filled);
    }
}

impl<T: Write + Seek> Write for BufferedStream<T> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.discard_read_ahead()?;
        if self.write_buf.len() + buf.len() > self.capacity() {
            self.flush_write_buf()?;
        }
        if buf.len() >= self.capacity() {
            self.inner.write(buf)
        } else {
            self.write_buf.extend_from_slice(buf);
            Ok(buf.len())
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.flush_write_buf()?;
        self.inner.flush()
    }
}

impl<T: Write + Seek> Seek for BufferedStream<T> {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let remaining = offset(self.buffered_read())?;
        match pos {
            SeekFrom::Current(0) => return self.logical_position(),
            SeekFrom::Current(n) if n > 0 && n <= remaining && self.write_buf.is_empty() => {
                self.pos += n as usize;
                return self.logical_position();
            },
            _ => (),
        }

        self.flush_write_buf()?;
        let target = match pos {
            SeekFrom::Current(n) => SeekFrom::Current(
                n.checked_sub(remaining)
                    .ok_or_else(|| io::Error::new(ErrorKind::InvalidInput, "offset overflow"))?
            ),
            other => other,
        };
        let result = self.inner.seek(target)?;
        self.pos = 0;
        self.filled = 0;
        Ok(result)
    }
}

impl<T: Write> Drop for BufferedStream<T> {
    fn drop(&mut self) {
        if !self.write_buf.is_empty()
            && let Err(error) = self.flush_write_buf()
        {
            tracing::warn!(%error, "error while flushing stream on drop");
        }
    }
}

impl<T: Write + Debug> Debug for BufferedStream<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("BufferedStream")
            .field("inner", &self.inner)
            .field("capacity", &self.capacity())
            .field("buffered_read", &self.buffered_read())
            .field("buffered_write", &self.buffered_write())
            .finish()
    }
}
