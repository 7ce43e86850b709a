//! Endian-aware reader over an in-memory buffer
//!
//! Unity containers mix byte orders: serialized-file headers and bundle
//! tables are big-endian, object data follows the flag stored in the header.

use std::io::{Cursor, Read};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use crate::error::{Error, Result};

/// Cursor that reads primitives in a switchable byte order.
pub struct BinaryReader<'a> {
    cursor: Cursor<&'a [u8]>,
    big_endian: bool,
}

macro_rules! read_endian {
    ($name:ident, $ty:ty, $method:ident, $size:expr) => {
        #[doc = concat!("Read a `", stringify!($ty), "` in the current byte order.")]
        pub fn $name(&mut self) -> Result<$ty> {
            self.ensure($size)?;
            let value = if self.big_endian {
                self.cursor.$method::<BigEndian>()
            } else {
                self.cursor.$method::<LittleEndian>()
            };
            Ok(value?)
        }
    };
}

impl<'a> BinaryReader<'a> {
    /// Create a reader positioned at the start of `data`.
    pub fn new(data: &'a [u8], big_endian: bool) -> Self {
        Self {
            cursor: Cursor::new(data),
            big_endian,
        }
    }

    /// Create a reader positioned at `offset`.
    pub fn at(data: &'a [u8], offset: usize, big_endian: bool) -> Self {
        let mut reader = Self::new(data, big_endian);
        reader.seek(offset);
        reader
    }

    pub fn set_big_endian(&mut self, big_endian: bool) {
        self.big_endian = big_endian;
    }

    pub fn position(&self) -> usize {
        self.cursor.position() as usize
    }

    pub fn seek(&mut self, offset: usize) {
        self.cursor.set_position(offset as u64);
    }

    pub fn len(&self) -> usize {
        self.cursor.get_ref().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cursor.get_ref().is_empty()
    }

    /// Bytes left between the cursor and the end of the buffer.
    pub fn remaining(&self) -> usize {
        self.len().saturating_sub(self.position())
    }

    fn ensure(&self, wanted: usize) -> Result<()> {
        let available = self.remaining();
        if wanted > available {
            return Err(Error::UnexpectedEof {
                offset: self.position(),
                wanted,
                available,
            });
        }
        Ok(())
    }

    /// Skip forward to the next multiple of `alignment`.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        let pos = self.position();
        let padded = pos.div_ceil(alignment) * alignment;
        self.skip(padded - pos)
    }

    pub fn skip(&mut self, count: usize) -> Result<()> {
        self.ensure(count)?;
        self.seek(self.position() + count);
        Ok(())
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        self.ensure(1)?;
        Ok(self.cursor.read_u8()?)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        self.ensure(1)?;
        Ok(self.cursor.read_i8()?)
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    read_endian!(read_u16, u16, read_u16, 2);
    read_endian!(read_i16, i16, read_i16, 2);
    read_endian!(read_u32, u32, read_u32, 4);
    read_endian!(read_i32, i32, read_i32, 4);
    read_endian!(read_u64, u64, read_u64, 8);
    read_endian!(read_i64, i64, read_i64, 8);
    read_endian!(read_f32, f32, read_f32, 4);
    read_endian!(read_f64, f64, read_f64, 8);

    /// Borrow the next `count` bytes and advance past them.
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        self.ensure(count)?;
        let start = self.position();
        let data: &'a [u8] = *self.cursor.get_ref();
        self.seek(start + count);
        Ok(&data[start..start + count])
    }

    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        self.ensure(N)?;
        let mut buf = [0u8; N];
        self.cursor.read_exact(&mut buf)?;
        Ok(buf)
    }

    /// Read a NUL-terminated string (lossy UTF-8).
    pub fn read_cstr(&mut self) -> Result<String> {
        let start = self.position();
        let data: &'a [u8] = *self.cursor.get_ref();
        let rest = data.get(start..).unwrap_or_default();
        let Some(len) = rest.iter().position(|&b| b == 0) else {
            return Err(Error::UnexpectedEof {
                offset: start,
                wanted: rest.len() + 1,
                available: rest.len(),
            });
        };
        let text = String::from_utf8_lossy(&rest[..len]).into_owned();
        self.seek(start + len + 1);
        Ok(text)
    }

    /// Read an `i32` length-prefixed string, then align to 4.
    pub fn read_aligned_string(&mut self) -> Result<String> {
        let len = self.read_len()?;
        let bytes = self.read_bytes(len)?;
        let text = String::from_utf8_lossy(bytes).into_owned();
        self.align(4)?;
        Ok(text)
    }

    /// Read an `i32` element count, rejecting negative values.
    pub fn read_len(&mut self) -> Result<usize> {
        let offset = self.position();
        let len = self.read_i32()?;
        usize::try_from(len).map_err(|_| Error::Corrupt {
            offset,
            message: format!("negative length {len}"),
        })
    }
}
