// Licensed to the Apache Software Foundation (ASF) under one
// or more contributor license agreements.  See the NOTICE file
// distributed with this work for additional information
// regarding copyright ownership.  The ASF licenses this file
// to you under the Apache License, Version 2.0 (the
// "License"); you may not use this file except in compliance
// with the License.  You may obtain a copy of the License at
//
//   http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing,
// software distributed under the License is distributed on an
// "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied.  See the License for the
// specific language governing permissions and limitations
// under the License.

use crate::error::Error;
use byteorder::{ByteOrder, LittleEndian};

#[derive(Default, Debug)]
pub struct Writer {
    pub(crate) bf: Vec<u8>,
}

impl Writer {
    pub fn reset(&mut self) {
        // keep capacity and reset len to 0
        self.bf.clear();
    }

    pub fn dump(&self) -> Vec<u8> {
        self.bf.clone()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bf
    }

    pub fn len(&self) -> usize {
        self.bf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bf.is_empty()
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> usize {
        self.bf.extend_from_slice(v);
        v.len()
    }

    #[inline(always)]
    pub fn write_u8(&mut self, value: u8) {
        self.bf.push(value);
    }

    #[inline(always)]
    pub fn write_i8(&mut self, value: i8) {
        self.bf.push(value as u8);
    }

    #[inline(always)]
    pub fn write_bool(&mut self, value: bool) {
        self.bf.push(value as u8);
    }

    #[inline(always)]
    pub fn write_u16(&mut self, value: u16) {
        let mut b = [0u8; 2];
        LittleEndian::write_u16(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    #[inline(always)]
    pub fn write_i16(&mut self, value: i16) {
        let mut b = [0u8; 2];
        LittleEndian::write_i16(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    #[inline(always)]
    pub fn write_u32(&mut self, value: u32) {
        let mut b = [0u8; 4];
        LittleEndian::write_u32(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    #[inline(always)]
    pub fn write_i32(&mut self, value: i32) {
        let mut b = [0u8; 4];
        LittleEndian::write_i32(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    #[inline(always)]
    pub fn write_u64(&mut self, value: u64) {
        let mut b = [0u8; 8];
        LittleEndian::write_u64(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    #[inline(always)]
    pub fn write_i64(&mut self, value: i64) {
        let mut b = [0u8; 8];
        LittleEndian::write_i64(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    #[inline(always)]
    pub fn write_f32(&mut self, value: f32) {
        let mut b = [0u8; 4];
        LittleEndian::write_f32(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    #[inline(always)]
    pub fn write_f64(&mut self, value: f64) {
        let mut b = [0u8; 8];
        LittleEndian::write_f64(&mut b, value);
        self.bf.extend_from_slice(&b);
    }

    /// Writes a compact length: unsigned base-128, low groups first, at most 5 bytes.
    pub fn write_varuint32(&mut self, value: u32) {
        if value < 0x80 {
            self.write_u8(value as u8);
        } else if value < 0x4000 {
            // 2 bytes
            let u1 = ((value as u8) & 0x7F) | 0x80;
            let u2 = (value >> 7) as u8;
            self.write_u16(((u2 as u16) << 8) | u1 as u16);
        } else {
            let mut rest = value;
            while rest >= 0x80 {
                self.write_u8(((rest as u8) & 0x7F) | 0x80);
                rest >>= 7;
            }
            self.write_u8(rest as u8);
        }
    }

    /// Writes a compact count of UTF-16 code units followed by the units.
    pub fn write_utf16_string(&mut self, s: &str) -> Result<(), Error> {
        let units = s.encode_utf16().count();
        let len = u32::try_from(units).map_err(|_| {
            Error::encode_error(format!("String of {} UTF-16 units is too long", units))
        })?;
        self.write_varuint32(len);
        self.bf.reserve(units * 2);
        for unit in s.encode_utf16() {
            self.write_u16(unit);
        }
        Ok(())
    }
}

impl std::io::Write for Writer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        Ok(self.write_bytes(buf))
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

/// Bounds-checked cursor over an encoded byte slice.
///
/// Every read verifies the remaining length first and reports the offending position,
/// so corrupt or truncated input surfaces as [`Error::BufferOutOfBound`] instead of a
/// panic.
#[derive(Clone, Debug)]
pub struct Reader<'a> {
    bf: &'a [u8],
    cursor: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bf: &'a [u8]) -> Reader<'a> {
        Reader { bf, cursor: 0 }
    }

    #[inline(always)]
    pub fn get_cursor(&self) -> usize {
        self.cursor
    }

    #[inline(always)]
    pub fn remaining(&self) -> usize {
        self.bf.len() - self.cursor
    }

    /// The next byte, without consuming it.
    #[inline(always)]
    pub fn peek_u8(&self) -> Option<u8> {
        self.bf.get(self.cursor).copied()
    }

    #[inline(always)]
    fn check_bound(&self, n: usize) -> Result<(), Error> {
        if n > self.remaining() {
            return Err(Error::buffer_out_of_bound(self.cursor, n, self.bf.len()));
        }
        Ok(())
    }

    #[inline(always)]
    fn take(&mut self, n: usize) -> Result<&'a [u8], Error> {
        self.check_bound(n)?;
        let s = &self.bf[self.cursor..self.cursor + n];
        self.cursor += n;
        Ok(s)
    }

    #[inline(always)]
    pub fn read_u8(&mut self) -> Result<u8, Error> {
        self.check_bound(1)?;
        let result = self.bf[self.cursor];
        self.cursor += 1;
        Ok(result)
    }

    #[inline(always)]
    pub fn read_i8(&mut self) -> Result<i8, Error> {
        Ok(self.read_u8()? as i8)
    }

    #[inline(always)]
    pub fn read_bool(&mut self) -> Result<bool, Error> {
        Ok(self.read_u8()? != 0)
    }

    #[inline(always)]
    pub fn read_u16(&mut self) -> Result<u16, Error> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    #[inline(always)]
    pub fn read_i16(&mut self) -> Result<i16, Error> {
        Ok(LittleEndian::read_i16(self.take(2)?))
    }

    #[inline(always)]
    pub fn read_u32(&mut self) -> Result<u32, Error> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    #[inline(always)]
    pub fn read_i32(&mut self) -> Result<i32, Error> {
        Ok(LittleEndian::read_i32(self.take(4)?))
    }

    #[inline(always)]
    pub fn read_u64(&mut self) -> Result<u64, Error> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    #[inline(always)]
    pub fn read_i64(&mut self) -> Result<i64, Error> {
        Ok(LittleEndian::read_i64(self.take(8)?))
    }

    #[inline(always)]
    pub fn read_f32(&mut self) -> Result<f32, Error> {
        Ok(LittleEndian::read_f32(self.take(4)?))
    }

    #[inline(always)]
    pub fn read_f64(&mut self) -> Result<f64, Error> {
        Ok(LittleEndian::read_f64(self.take(8)?))
    }

    /// Reads a compact length written by [`Writer::write_varuint32`].
    pub fn read_varuint32(&mut self) -> Result<u32, Error> {
        let start = self.cursor;
        let b0 = self.read_u8()? as u32;
        if b0 < 0x80 {
            return Ok(b0);
        }
        let mut encoded = b0 & 0x7F;
        let mut shift = 7;
        loop {
            let b = self.read_u8()? as u32;
            if shift == 28 {
                // the fifth byte only has room for the top 4 bits
                if b > 0x0F {
                    return Err(Error::invalid_data(format!(
                        "Malformed compact length at position {}",
                        start
                    )));
                }
                return Ok(encoded | (b << 28));
            }
            encoded |= (b & 0x7F) << shift;
            if b < 0x80 {
                return Ok(encoded);
            }
            shift += 7;
        }
    }

    /// Reads a compact length and checks it against the remaining input, scaled by the
    /// minimum encoded size of one item.
    pub fn read_length(&mut self, min_item_size: usize) -> Result<usize, Error> {
        let len = self.read_varuint32()? as usize;
        let needed = len.saturating_mul(min_item_size);
        if needed > self.remaining() {
            return Err(Error::buffer_out_of_bound(self.cursor, needed, self.bf.len()));
        }
        Ok(len)
    }

    /// Reads a length-prefixed UTF-16 string into `units`, replacing its contents.
    pub fn read_utf16_units(&mut self, units: &mut Vec<u16>) -> Result<(), Error> {
        let len = self.read_length(2)?;
        units.clear();
        units.reserve(len);
        let bytes = self.take(len * 2)?;
        units.extend(bytes.chunks_exact(2).map(LittleEndian::read_u16));
        Ok(())
    }

    pub fn read_utf16_string(&mut self) -> Result<String, Error> {
        let position = self.cursor;
        let len = self.read_length(2)?;
        let bytes = self.take(len * 2)?;
        let decoded: Result<String, _> =
            char::decode_utf16(bytes.chunks_exact(2).map(LittleEndian::read_u16)).collect();
        decoded.map_err(|e| {
            Error::invalid_data(format!(
                "Unpaired surrogate 0x{:04X} in string at position {}",
                e.unpaired_surrogate(),
                position
            ))
        })
    }

    pub fn skip(&mut self, len: usize) -> Result<(), Error> {
        self.check_bound(len)?;
        self.cursor += len;
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], Error> {
        self.take(len)
    }
}
