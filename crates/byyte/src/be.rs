use std::io;
use std::io::Result;

pub trait ByteReader: io::Read {
    fn read_u8(&mut self) -> Result<u8> {
        let mut buf = [0u8; 1];
        self.read_exact(&mut buf)?;
        Ok(buf[0])
    }
    fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }
    fn read_u24(&mut self) -> Result<u32> {
        let [a, b, c] = self.read_array()?;
        Ok(u32::from_be_bytes([0, a, b, c]))
    }
    fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut buf = [0u8; N];
        self.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Reads a fixed-size, NUL-padded text field. Bytes that are not UTF-8
    /// are replaced rather than rejected; Palm names are often Latin-1.
    fn read_cstr(&mut self, length: usize) -> Result<String> {
        let mut buf = vec![0u8; length];
        self.read_exact(&mut buf)?;
        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
    }
}

impl<R: io::Read + ?Sized> ByteReader for R {}

pub trait ByteWriter: io::Write {
    fn write_u8(&mut self, value: u8) -> Result<()> {
        self.write_all(&[value])
    }
    fn write_u16(&mut self, value: u16) -> Result<()> {
        self.write_all(&value.to_be_bytes())
    }
    fn write_u24(&mut self, value: u32) -> Result<()> {
        if value > 0x00FF_FFFF {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "value does not fit in 24 bits",
            ));
        }
        self.write_all(&value.to_be_bytes()[1..])
    }
    fn write_u32(&mut self, value: u32) -> Result<()> {
        self.write_all(&value.to_be_bytes())
    }

    /// Writes `string` into a field of exactly `length` bytes, NUL padded.
    /// At least one NUL is always written.
    fn write_cstr(&mut self, string: &str, length: usize) -> Result<()> {
        let bytes = string.as_bytes();
        if bytes.len() >= length {
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "string does not fit in field",
            ));
        }
        let mut buf = vec![0u8; length];
        buf[..bytes.len()].copy_from_slice(bytes);
        self.write_all(&buf)
    }
}

impl<W: io::Write + ?Sized> ByteWriter for W {}

fn array_at<const N: usize>(data: &[u8], offset: usize) -> Option<[u8; N]> {
    let end = offset.checked_add(N)?;
    data.get(offset..end)?.try_into().ok()
}

pub fn u16_at(data: &[u8], offset: usize) -> Option<u16> {
    array_at(data, offset).map(u16::from_be_bytes)
}

pub fn u32_at(data: &[u8], offset: usize) -> Option<u32> {
    array_at(data, offset).map(u32::from_be_bytes)
}

pub fn u64_at(data: &[u8], offset: usize) -> Option<u64> {
    array_at(data, offset).map(u64::from_be_bytes)
}

/// Four-byte identifier such as `MOBI` or `HUFF`.
pub fn tag_at(data: &[u8], offset: usize) -> Option<[u8; 4]> {
    array_at(data, offset)
}
