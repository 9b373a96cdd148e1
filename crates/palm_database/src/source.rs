use std::io::{self, Read, Seek, SeekFrom};

/// Random-access input a database is parsed from.
pub trait ByteSource {
    /// Fills as much of `buf` as the source holds starting at `offset` and
    /// returns the number of bytes written. A short count means the source
    /// ended early; it is not an error at this level.
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize>;

    /// Total addressable length in bytes.
    fn size(&mut self) -> io::Result<u64>;
}

impl<T: Read + Seek> ByteSource for T {
    fn read_at(&mut self, offset: u64, buf: &mut [u8]) -> io::Result<usize> {
        self.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < buf.len() {
            match self.read(&mut buf[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
                Err(e) => return Err(e),
            }
        }
        Ok(filled)
    }

    fn size(&mut self) -> io::Result<u64> {
        let position = self.stream_position()?;
        let end = self.seek(SeekFrom::End(0))?;
        self.seek(SeekFrom::Start(position))?;
        Ok(end)
    }
}
