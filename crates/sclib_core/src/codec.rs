//! Byte cursors for decoding and encoding.
//!
//! [ByteViewer] consumes a borrowed slice from left to right,
//! [ByteWriter] appends to an owned buffer.
//! Both carry the variable length integer encodings used on the wire:
//! - unsigned values use plain ULEB128
//! - signed values use a LEB128 variant that keeps the sign in bit 6 of the first byte

use crate::err::{Error, ScResult};

/// Width used for length prefixes and element counts.
pub const LENGTH_BITS: u32 = 32;

/// A consuming view into an existing slice of bytes.
///
/// Consumed bytes can never be read again.
/// Decoding of a top-level message must end with [ByteViewer::close].
#[derive(Debug, Clone)]
pub struct ByteViewer<'arr> {
    slice: &'arr [u8],
    offset: usize,
}

impl<'arr> ByteViewer<'arr> {
    /// Create a new viewer on a byte slice
    pub fn from_slice(s: &'arr [u8]) -> Self {
        Self { slice: s, offset: 0 }
    }

    /// Number of bytes not yet consumed
    pub fn remaining(&self) -> usize {
        self.slice.len() - self.offset
    }

    pub fn is_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Peek at the next byte in the slice
    pub fn peek(&self) -> ScResult<u8> {
        self.slice
            .get(self.offset)
            .copied()
            .ok_or(Error::Underflow {
                wanted: 1,
                remaining: 0,
            })
    }

    /// Return the next byte and advance the view
    pub fn byte(&mut self) -> ScResult<u8> {
        let b = self.peek()?;
        self.offset += 1;

        Ok(b)
    }

    /// Returns the next `size` bytes and advances the view.
    pub fn fixed_bytes(&mut self, size: usize) -> ScResult<&'arr [u8]> {
        if self.remaining() < size {
            return Err(Error::Underflow {
                wanted: size,
                remaining: self.remaining(),
            });
        }

        let view = &self.slice[self.offset..self.offset + size];
        self.offset += size;

        Ok(view)
    }

    /// Returns a copy of the next bytes as a fixed-size array.
    pub fn fixed_array<const ARR_SIZE: usize>(&mut self) -> ScResult<[u8; ARR_SIZE]> {
        let mut arr = [0_u8; ARR_SIZE];
        arr.copy_from_slice(self.fixed_bytes(ARR_SIZE)?);
        Ok(arr)
    }

    /// Returns the next length-prefixed slice of bytes.
    pub fn bytes(&mut self) -> ScResult<&'arr [u8]> {
        let len = self.vlu_decode(LENGTH_BITS)?;
        self.fixed_bytes(len as usize)
    }

    /// Finish decoding. Fails if any bytes were not consumed.
    pub fn close(self) -> ScResult<()> {
        match self.remaining() {
            0 => Ok(()),
            left => Err(Error::TrailingData(left)),
        }
    }

    /// Decodes a signed varint of at most `bits` bits.
    ///
    /// The first byte holds 6 data bits and the sign in bit 6,
    /// every following byte holds 7 data bits. Bit 7 is always the continuation bit.
    pub fn vli_decode(&mut self, bits: u32) -> ScResult<i64> {
        let mut b = self.byte()?;
        let negative = b & 0x40 != 0;

        let mut value = (b & 0x3f) as i64;
        let mut shift = 6_u32;

        while b & 0x80 != 0 {
            if shift >= bits {
                return Err(Error::Overflow { bits });
            }

            b = self.byte()?;
            let group = b & 0x7f;

            // a group reaching past bit 62 may only repeat the sign
            if shift + 7 > i64::BITS {
                let high = group >> (i64::BITS - 1 - shift);
                let sign = match negative {
                    true => 0x7f >> (i64::BITS - 1 - shift),
                    false => 0,
                };
                if high != sign {
                    return Err(Error::Overflow { bits });
                }
            }

            value |= (group as i64) << shift;
            shift += 7;
        }

        match negative {
            false => Ok(value),
            // all bits above the last group become 1
            true => Ok(value | (-1_i64).checked_shl(shift).unwrap_or(0)),
        }
    }

    /// Decodes an unsigned ULEB128 varint of at most `bits` bits.
    pub fn vlu_decode(&mut self, bits: u32) -> ScResult<u64> {
        let mut b = self.byte()?;

        let mut value = (b & 0x7f) as u64;
        let mut shift = 7_u32;

        while b & 0x80 != 0 {
            if shift >= bits {
                return Err(Error::Overflow { bits });
            }

            b = self.byte()?;
            let group = b & 0x7f;

            // the last group only has room for bit 63
            if shift + 7 > u64::BITS && group >> (u64::BITS - shift) != 0 {
                return Err(Error::Overflow { bits });
            }

            value |= (group as u64) << shift;
            shift += 7;
        }

        Ok(value)
    }
}

/// Append-only output buffer.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ByteWriter {
    output: Vec<u8>,
}

impl ByteWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the bytes written so far
    pub fn buf(&self) -> &[u8] {
        &self.output
    }

    /// Consume the writer, returning the encoded bytes
    pub fn into_bytes(self) -> Vec<u8> {
        self.output
    }

    pub fn byte(&mut self, value: u8) -> &mut Self {
        self.output.push(value);
        self
    }

    /// Writes the bytes as-is. The reader must know the size up front.
    pub fn fixed_bytes(&mut self, value: &[u8]) -> &mut Self {
        self.output.extend_from_slice(value);
        self
    }

    /// Writes the length of the slice, then the slice.
    pub fn bytes(&mut self, value: &[u8]) -> &mut Self {
        self.vlu_encode(value.len() as u64);
        self.fixed_bytes(value)
    }

    /// Encodes a signed varint, see [ByteViewer::vli_decode]
    pub fn vli_encode(&mut self, mut value: i64) -> &mut Self {
        // first group: 6 data bits, bit 6 is the sign
        let mut b = (value as u8) & 0x3f;
        value >>= 6;

        let mut last = 0_i64;
        if value < 0 {
            b |= 0x40;
            last = -1;
        }

        while value != last {
            self.output.push(b | 0x80);

            b = (value as u8) & 0x7f;
            value >>= 7;
        }

        self.output.push(b);
        self
    }

    /// Encodes an unsigned ULEB128 varint
    pub fn vlu_encode(&mut self, mut value: u64) -> &mut Self {
        let mut b = (value as u8) & 0x7f;
        value >>= 7;

        while value != 0 {
            self.output.push(b | 0x80);

            b = (value as u8) & 0x7f;
            value >>= 7;
        }

        self.output.push(b);
        self
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, RngCore, SeedableRng};

    use super::*;

    fn vli_loop(value: i64) {
        let mut enc = ByteWriter::new();
        enc.vli_encode(value);

        let mut dec = ByteViewer::from_slice(enc.buf());
        assert_eq!(dec.vli_decode(64).unwrap(), value, "bytes: {:?}", enc.buf());
        dec.close().unwrap();
    }

    fn vlu_loop(value: u64) {
        let mut enc = ByteWriter::new();
        enc.vlu_encode(value);

        let mut dec = ByteViewer::from_slice(enc.buf());
        assert_eq!(dec.vlu_decode(64).unwrap(), value, "bytes: {:?}", enc.buf());
        dec.close().unwrap();
    }

    #[test]
    fn test_known_encodings() {
        let mut enc = ByteWriter::new();
        enc.vli_encode(1);
        assert_eq!(enc.buf(), &[0x01]);

        let mut enc = ByteWriter::new();
        enc.vli_encode(-1);
        assert_eq!(enc.buf(), &[0x7f]);

        let mut enc = ByteWriter::new();
        enc.vlu_encode(300);
        assert_eq!(enc.buf(), &[0xac, 0x02]);

        // 64 needs the second byte, the sign lives in bit 6 of the first
        let mut enc = ByteWriter::new();
        enc.vli_encode(64);
        assert_eq!(enc.buf(), &[0x80, 0x01]);

        let mut enc = ByteWriter::new();
        enc.vli_encode(-64);
        assert_eq!(enc.buf(), &[0x40]);
    }

    #[test]
    fn test_vli_boundaries() {
        for value in [i64::MIN, i64::MIN + 1, -1, 0, 1, i64::MAX - 1, i64::MAX] {
            vli_loop(value);
        }

        for value in -70_000..70_000 {
            vli_loop(value);
        }

        for shift in 0..63 {
            vli_loop(1 << shift);
            vli_loop(-(1 << shift));
            vli_loop((1 << shift) - 1);
        }
    }

    #[test]
    fn test_vlu_boundaries() {
        for value in [0, 1, 127, 128, 16_383, 16_384, u64::MAX - 1, u64::MAX] {
            vlu_loop(value);
        }

        for shift in 0..64 {
            vlu_loop(1 << shift);
        }

        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..10_000 {
            vlu_loop(rng.next_u64());
            vli_loop(rng.next_u64() as i64);
        }
    }

    #[test]
    fn test_varint_width_overflow() {
        let mut enc = ByteWriter::new();
        enc.vlu_encode(1 << 30);

        let mut dec = ByteViewer::from_slice(enc.buf());
        assert_eq!(dec.vlu_decode(16), Err(Error::Overflow { bits: 16 }));

        let mut enc = ByteWriter::new();
        enc.vli_encode(i32::MAX as i64 + 1);

        let mut dec = ByteViewer::from_slice(enc.buf());
        assert!(matches!(dec.vli_decode(16), Err(Error::Overflow { .. })));
    }

    #[test]
    fn test_excess_high_bits() {
        let mut max = vec![0xff_u8; 9];
        max.push(0x01);
        assert_eq!(ByteViewer::from_slice(&max).vlu_decode(64).unwrap(), u64::MAX);

        // the last group only has room for bit 63
        for last in [0x02, 0x7f] {
            let mut buf = vec![0xff_u8; 9];
            buf.push(last);
            assert_eq!(
                ByteViewer::from_slice(&buf).vlu_decode(64),
                Err(Error::Overflow { bits: 64 })
            );
        }

        // -2^62 - 1 is the longest negative form
        let mut buf = vec![0xff_u8; 9];
        buf.push(0x7e);
        assert_eq!(
            ByteViewer::from_slice(&buf).vli_decode(64).unwrap(),
            -(1_i64 << 62) - 1
        );

        // positive header, but the last group sets the sign bit
        let mut buf = vec![0xbf_u8];
        buf.extend([0xff_u8; 8]);
        buf.push(0x03);
        assert_eq!(
            ByteViewer::from_slice(&buf).vli_decode(64),
            Err(Error::Overflow { bits: 64 })
        );
        buf[9] = 0x01;
        assert_eq!(ByteViewer::from_slice(&buf).vli_decode(64).unwrap(), i64::MAX);

        // negative header, but the last group clears the sign bit
        let mut buf = vec![0xc0_u8];
        buf.extend([0x80_u8; 8]);
        buf.push(0x3e);
        assert_eq!(
            ByteViewer::from_slice(&buf).vli_decode(64),
            Err(Error::Overflow { bits: 64 })
        );
        buf[9] = 0x7e;
        assert_eq!(ByteViewer::from_slice(&buf).vli_decode(64).unwrap(), i64::MIN);
    }

    #[test]
    fn test_underflow_and_trailing_data() {
        let mut dec = ByteViewer::from_slice(&[1, 2, 3]);
        assert_eq!(dec.byte().unwrap(), 1);
        assert_eq!(
            dec.fixed_bytes(5),
            Err(Error::Underflow {
                wanted: 5,
                remaining: 2
            })
        );
        assert_eq!(dec.clone().close(), Err(Error::TrailingData(2)));

        assert_eq!(dec.fixed_bytes(2).unwrap(), &[2, 3]);
        assert!(dec.byte().is_err());
        dec.close().unwrap();

        // dangling continuation bit
        let mut dec = ByteViewer::from_slice(&[0x80]);
        assert!(matches!(dec.vlu_decode(64), Err(Error::Underflow { .. })));
    }

    #[test]
    fn test_length_prefixed_bytes() {
        let payload = (0..200_u8).collect::<Vec<_>>();

        let mut enc = ByteWriter::new();
        enc.bytes(&payload).bytes(&[]).byte(9);
        let buf = enc.into_bytes();

        // 200 needs two length bytes
        assert_eq!(&buf[..2], &[0xc8, 0x01]);

        let mut dec = ByteViewer::from_slice(&buf);
        assert_eq!(dec.bytes().unwrap(), payload.as_slice());
        assert_eq!(dec.bytes().unwrap(), &[] as &[u8]);
        assert_eq!(dec.byte().unwrap(), 9);
        dec.close().unwrap();
    }
}
