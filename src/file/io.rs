use std::io::{self, Read, Seek, SeekFrom, Write};

use libc::{SEEK_CUR, SEEK_END, SEEK_SET, c_int, off_t};

use crate::file::File;

impl Read for &File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let fd = self.raw_fd()?;
        // SAFETY: buf is valid for writes of buf.len() bytes.
        match unsafe { libc::read(fd, buf.as_mut_ptr().cast(), buf.len()) } {
            -1 => Err(io::Error::last_os_error()),
            count => Ok(count as usize),
        }
    }
}

impl Write for &File {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let fd = self.raw_fd()?;
        // SAFETY: buf is valid for reads of buf.len() bytes.
        match unsafe { libc::write(fd, buf.as_ptr().cast(), buf.len()) } {
            -1 => Err(io::Error::last_os_error()),
            count => Ok(count as usize),
        }
    }

    /// Writes aren't buffered at this level, so there is nothing to flush.
    fn flush(&mut self) -> io::Result<()> {
        self.raw_fd()?;
        Ok(())
    }
}

impl Seek for &File {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        let fd = self.raw_fd()?;
        let (offset, whence): (i64, c_int) = match pos {
            SeekFrom::Start(offset) => (
                i64::try_from(offset).map_err(|_| io::Error::from(io::ErrorKind::InvalidInput))?,
                SEEK_SET,
            ),
            SeekFrom::Current(offset) => (offset, SEEK_CUR),
            SeekFrom::End(offset) => (offset, SEEK_END),
        };
        // SAFETY: There is no memory management here and any returned errors are handled.
        match unsafe { libc::lseek(fd, offset as off_t, whence) } {
            -1 => Err(io::Error::last_os_error()),
            position => Ok(position as u64),
        }
    }
}

impl Read for File {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        (&*self).read(buf)
    }
}

impl Write for File {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        (&*self).write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        (&*self).flush()
    }
}

impl Seek for File {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        (&*self).seek(pos)
    }
}
