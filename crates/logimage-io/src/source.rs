//! Byte source/sink helpers.
//!
//! A handle reads from either a file or an in-memory buffer through the
//! same seekable interface; the [`ReadSeek`]/[`WriteSeek`] aliases cover
//! both. Word-level accessors take the image's `is_msb` flag so endian
//! correction happens exactly once, at the wire.

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};
use logimage_core::{CodecError, Result};
use std::io::{Read, Seek, Write};

/// Combined trait bound for seekable readers.
///
/// Automatically implemented for any `Read + Seek` type, which covers both
/// `BufReader<File>` and `Cursor<Vec<u8>>`.
pub trait ReadSeek: Read + Seek {}
impl<T: Read + Seek> ReadSeek for T {}

/// Combined trait bound for seekable writers.
pub trait WriteSeek: Write + Seek {}
impl<T: Write + Seek> WriteSeek for T {}

/// Maps an end-of-file condition onto [`CodecError::Truncated`]; any other
/// I/O failure passes through.
fn short_read(e: std::io::Error) -> CodecError {
    if e.kind() == std::io::ErrorKind::UnexpectedEof {
        CodecError::Truncated
    } else {
        CodecError::Io(e)
    }
}

/// Reads one byte.
#[inline]
pub fn read_u8<R: Read + ?Sized>(r: &mut R) -> Result<u8> {
    r.read_u8().map_err(short_read)
}

/// Reads a 16-bit word in the file's byte order.
#[inline]
pub fn read_u16<R: Read + ?Sized>(r: &mut R, is_msb: bool) -> Result<u16> {
    if is_msb {
        r.read_u16::<BigEndian>().map_err(short_read)
    } else {
        r.read_u16::<LittleEndian>().map_err(short_read)
    }
}

/// Reads a 32-bit word in the file's byte order.
#[inline]
pub fn read_u32<R: Read + ?Sized>(r: &mut R, is_msb: bool) -> Result<u32> {
    if is_msb {
        r.read_u32::<BigEndian>().map_err(short_read)
    } else {
        r.read_u32::<LittleEndian>().map_err(short_read)
    }
}

/// Reads a 32-bit float in the file's byte order.
#[inline]
pub fn read_f32<R: Read + ?Sized>(r: &mut R, is_msb: bool) -> Result<f32> {
    if is_msb {
        r.read_f32::<BigEndian>().map_err(short_read)
    } else {
        r.read_f32::<LittleEndian>().map_err(short_read)
    }
}

/// Fills `buf` completely or fails with [`CodecError::Truncated`].
#[inline]
pub fn read_bytes<R: Read + ?Sized>(r: &mut R, buf: &mut [u8]) -> Result<()> {
    r.read_exact(buf).map_err(short_read)
}

/// Writes one byte.
#[inline]
pub fn write_u8<W: Write + ?Sized>(w: &mut W, v: u8) -> Result<()> {
    w.write_u8(v)?;
    Ok(())
}

/// Writes a 16-bit word in the file's byte order.
#[inline]
pub fn write_u16<W: Write + ?Sized>(w: &mut W, v: u16, is_msb: bool) -> Result<()> {
    if is_msb {
        w.write_u16::<BigEndian>(v)?;
    } else {
        w.write_u16::<LittleEndian>(v)?;
    }
    Ok(())
}

/// Writes a 32-bit word in the file's byte order.
#[inline]
pub fn write_u32<W: Write + ?Sized>(w: &mut W, v: u32, is_msb: bool) -> Result<()> {
    if is_msb {
        w.write_u32::<BigEndian>(v)?;
    } else {
        w.write_u32::<LittleEndian>(v)?;
    }
    Ok(())
}

/// Writes a 32-bit float in the file's byte order.
#[inline]
pub fn write_f32<W: Write + ?Sized>(w: &mut W, v: f32, is_msb: bool) -> Result<()> {
    if is_msb {
        w.write_f32::<BigEndian>(v)?;
    } else {
        w.write_f32::<LittleEndian>(v)?;
    }
    Ok(())
}

/// Writes a whole buffer.
#[inline]
pub fn write_bytes<W: Write + ?Sized>(w: &mut W, bytes: &[u8]) -> Result<()> {
    w.write_all(bytes)?;
    Ok(())
}

/// Reads a fixed-width NUL-padded string field.
pub fn read_fixed_str<R: Read + ?Sized>(r: &mut R, len: usize) -> Result<String> {
    let mut buf = vec![0u8; len];
    read_bytes(r, &mut buf)?;
    let end = buf.iter().position(|&b| b == 0).unwrap_or(len);
    Ok(String::from_utf8_lossy(&buf[..end]).into_owned())
}

/// Writes a string into a fixed-width NUL-padded field, truncating if
/// needed but always keeping a terminating NUL.
pub fn write_fixed_str<W: Write + ?Sized>(w: &mut W, s: &str, len: usize) -> Result<()> {
    let mut buf = vec![0u8; len];
    let bytes = s.as_bytes();
    let copy = bytes.len().min(len.saturating_sub(1));
    buf[..copy].copy_from_slice(&bytes[..copy]);
    write_bytes(w, &buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn test_word_byte_order() {
        let mut buf = Vec::new();
        write_u32(&mut buf, 0x53445058, true).unwrap();
        assert_eq!(buf, b"SDPX");

        let mut buf = Vec::new();
        write_u32(&mut buf, 0x53445058, false).unwrap();
        assert_eq!(buf, b"XPDS");

        let mut cur = Cursor::new(b"SDPX".to_vec());
        assert_eq!(read_u32(&mut cur, true).unwrap(), 0x53445058);
        let mut cur = Cursor::new(b"SDPX".to_vec());
        assert_eq!(read_u32(&mut cur, false).unwrap(), 0x58504453);
    }

    #[test]
    fn test_truncated_read() {
        let mut cur = Cursor::new(vec![1u8, 2]);
        match read_u32(&mut cur, true) {
            Err(CodecError::Truncated) => {}
            other => panic!("expected Truncated, got {:?}", other.err()),
        }
    }

    #[test]
    fn test_fixed_str_roundtrip() {
        let mut buf = Vec::new();
        write_fixed_str(&mut buf, "logimage", 16).unwrap();
        assert_eq!(buf.len(), 16);
        let mut cur = Cursor::new(buf);
        assert_eq!(read_fixed_str(&mut cur, 16).unwrap(), "logimage");
    }

    #[test]
    fn test_fixed_str_truncates() {
        let mut buf = Vec::new();
        write_fixed_str(&mut buf, "abcdefgh", 4).unwrap();
        assert_eq!(buf, b"abc\0");
    }
}
