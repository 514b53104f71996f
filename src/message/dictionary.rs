//! Tuple dictionary codec used on the companion link.
//!
//! Layout: one count byte, then per tuple a little-endian `u32` key, a type
//! byte, a little-endian `u16` value length and the value bytes.

use core::str;

use heapless::Vec;

use super::error::DictionaryError;

const TUPLE_HEADER_SIZE: usize = 4 + 1 + 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum TupleType {
    ByteArray = 0,
    CString = 1,
    Uint = 2,
    Int = 3,
}

impl TryFrom<u8> for TupleType {
    type Error = DictionaryError;

    fn try_from(byte: u8) -> Result<Self, Self::Error> {
        match byte {
            0 => Ok(TupleType::ByteArray),
            1 => Ok(TupleType::CString),
            2 => Ok(TupleType::Uint),
            3 => Ok(TupleType::Int),
            other => Err(DictionaryError::UnknownType(other)),
        }
    }
}

/// A decoded tuple borrowing from the payload
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuple<'a> {
    pub key: u32,
    pub value: TupleValue<'a>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TupleValue<'a> {
    Bytes(&'a [u8]),
    CString(&'a str),
    Uint(u32),
    Int(i32),
}

/// A tuple to be encoded
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Tuplet<'a> {
    Bytes { key: u32, value: &'a [u8] },
    CString { key: u32, value: &'a str },
    Uint { key: u32, value: u32 },
    Int { key: u32, value: i32 },
}

impl Tuplet<'_> {
    fn key(&self) -> u32 {
        match *self {
            Tuplet::Bytes { key, .. }
            | Tuplet::CString { key, .. }
            | Tuplet::Uint { key, .. }
            | Tuplet::Int { key, .. } => key,
        }
    }

    fn value_len(&self) -> usize {
        match self {
            Tuplet::Bytes { value, .. } => value.len(),
            // NUL terminator travels with the string
            Tuplet::CString { value, .. } => value.len() + 1,
            Tuplet::Uint { .. } | Tuplet::Int { .. } => 4,
        }
    }

    /// Encoded size of this tuple including its header
    pub fn size(&self) -> usize {
        TUPLE_HEADER_SIZE + self.value_len()
    }
}

/// Lazily decodes the tuples of a payload.
///
/// Iteration ends after the declared count or at the first error. Bytes past
/// the last tuple are ignored.
#[derive(Debug, Clone)]
pub struct DictionaryReader<'a> {
    data: &'a [u8],
    remaining: u8,
}

impl<'a> DictionaryReader<'a> {
    pub fn new(payload: &'a [u8]) -> Result<Self, DictionaryError> {
        let (&count, data) = payload.split_first().ok_or(DictionaryError::Truncated)?;

        Ok(Self {
            data,
            remaining: count,
        })
    }

    fn read_tuple(&mut self) -> Result<Tuple<'a>, DictionaryError> {
        if self.data.len() < TUPLE_HEADER_SIZE {
            return Err(DictionaryError::Truncated);
        }

        let (header, rest) = self.data.split_at(TUPLE_HEADER_SIZE);
        let key = u32::from_le_bytes([header[0], header[1], header[2], header[3]]);
        let tuple_type = TupleType::try_from(header[4])?;
        let length = u16::from_le_bytes([header[5], header[6]]) as usize;

        if rest.len() < length {
            return Err(DictionaryError::Truncated);
        }

        let (raw, rest) = rest.split_at(length);
        let value = decode_value(tuple_type, raw)?;

        self.data = rest;

        Ok(Tuple { key, value })
    }
}

impl<'a> Iterator for DictionaryReader<'a> {
    type Item = Result<Tuple<'a>, DictionaryError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }

        match self.read_tuple() {
            Ok(tuple) => {
                self.remaining -= 1;
                Some(Ok(tuple))
            }
            Err(e) => {
                self.remaining = 0;
                Some(Err(e))
            }
        }
    }
}

fn decode_value(tuple_type: TupleType, raw: &[u8]) -> Result<TupleValue<'_>, DictionaryError> {
    match tuple_type {
        TupleType::ByteArray => Ok(TupleValue::Bytes(raw)),
        TupleType::CString => {
            let end = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
            str::from_utf8(&raw[..end])
                .map(TupleValue::CString)
                .map_err(|_| DictionaryError::InvalidUtf8)
        }
        TupleType::Uint => match raw {
            &[b0] => Ok(TupleValue::Uint(b0 as u32)),
            &[b0, b1] => Ok(TupleValue::Uint(u16::from_le_bytes([b0, b1]) as u32)),
            &[b0, b1, b2, b3] => Ok(TupleValue::Uint(u32::from_le_bytes([b0, b1, b2, b3]))),
            _ => Err(DictionaryError::InvalidLength),
        },
        TupleType::Int => match raw {
            &[b0] => Ok(TupleValue::Int(b0 as i8 as i32)),
            &[b0, b1] => Ok(TupleValue::Int(i16::from_le_bytes([b0, b1]) as i32)),
            &[b0, b1, b2, b3] => Ok(TupleValue::Int(i32::from_le_bytes([b0, b1, b2, b3]))),
            _ => Err(DictionaryError::InvalidLength),
        },
    }
}

/// Encodes tuplets into a buffer of at most `N` bytes
#[derive(Debug)]
pub struct DictionaryWriter<const N: usize> {
    buffer: Vec<u8, N>,
    count: u8,
}

impl<const N: usize> DictionaryWriter<N> {
    pub fn new() -> Result<Self, DictionaryError> {
        let mut buffer = Vec::new();
        buffer
            .push(0)
            .map_err(|_| DictionaryError::BufferOverflow)?;

        Ok(Self { buffer, count: 0 })
    }

    /// Appends one tuple. Leaves the buffer untouched when it does not fit.
    pub fn write(&mut self, tuplet: &Tuplet) -> Result<(), DictionaryError> {
        if self.buffer.len() + tuplet.size() > N || self.count == u8::MAX {
            return Err(DictionaryError::BufferOverflow);
        }

        let key = tuplet.key().to_le_bytes();
        let length = u16::try_from(tuplet.value_len())
            .map_err(|_| DictionaryError::BufferOverflow)?
            .to_le_bytes();

        let int_bytes: [u8; 4];
        let (tuple_type, value): (TupleType, &[u8]) = match tuplet {
            Tuplet::Bytes { value, .. } => (TupleType::ByteArray, *value),
            Tuplet::CString { value, .. } => (TupleType::CString, value.as_bytes()),
            Tuplet::Uint { value, .. } => {
                int_bytes = value.to_le_bytes();
                (TupleType::Uint, &int_bytes)
            }
            Tuplet::Int { value, .. } => {
                int_bytes = value.to_le_bytes();
                (TupleType::Int, &int_bytes)
            }
        };

        let tag = [tuple_type as u8];
        let parts: [&[u8]; 4] = [&key, &tag, &length, value];

        // Capacity was checked above
        for bytes in parts {
            self.buffer
                .extend_from_slice(bytes)
                .map_err(|_| DictionaryError::BufferOverflow)?;
        }

        if tuple_type == TupleType::CString {
            self.buffer
                .push(0)
                .map_err(|_| DictionaryError::BufferOverflow)?;
        }

        self.count += 1;

        Ok(())
    }

    /// Finalizes the count byte and hands out the encoded payload
    pub fn finish(mut self) -> Vec<u8, N> {
        self.buffer[0] = self.count;
        self.buffer
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_cstring_and_integers() {
        let payload = [
            3, // count
            5, 0, 0, 0, 1, 5, 0, b'T', b'Q', b' ', b'3', 0, // cstring "TQ 3"
            2, 0, 0, 0, 3, 4, 0, 0x00, 0x80, 0x01, 0x00, // int 0x18000
            4, 0, 0, 0, 2, 1, 0, 200, // uint8
        ];

        let reader = DictionaryReader::new(&payload).unwrap();
        let tuples: std::vec::Vec<_> = reader.collect::<Result<_, _>>().unwrap();

        assert_eq!(
            tuples,
            [
                Tuple {
                    key: 5,
                    value: TupleValue::CString("TQ 3"),
                },
                Tuple {
                    key: 2,
                    value: TupleValue::Int(0x18000),
                },
                Tuple {
                    key: 4,
                    value: TupleValue::Uint(200),
                },
            ]
        );
    }

    #[test]
    fn test_negative_narrow_int_is_sign_extended() {
        let payload = [1, 3, 0, 0, 0, 3, 2, 0, 0xfe, 0xff];
        let mut reader = DictionaryReader::new(&payload).unwrap();

        assert_eq!(
            reader.next(),
            Some(Ok(Tuple {
                key: 3,
                value: TupleValue::Int(-2),
            }))
        );
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn test_stops_after_first_error() {
        // Second tuple claims more bytes than are present
        let payload = [
            3, //
            0, 0, 0, 0, 1, 2, 0, b'N', 0, //
            1, 0, 0, 0, 1, 40, 0, b'W',
        ];
        let mut reader = DictionaryReader::new(&payload).unwrap();

        assert!(matches!(reader.next(), Some(Ok(_))));
        assert_eq!(reader.next(), Some(Err(DictionaryError::Truncated)));
        assert_eq!(reader.next(), None);
    }

    #[test]
    fn test_rejects_malformed_tuples() {
        assert_eq!(DictionaryReader::new(&[]).err(), Some(DictionaryError::Truncated));

        let unknown_type = [1, 0, 0, 0, 0, 9, 0, 0];
        assert_eq!(
            DictionaryReader::new(&unknown_type).unwrap().next(),
            Some(Err(DictionaryError::UnknownType(9)))
        );

        let odd_width = [1, 0, 0, 0, 0, 2, 3, 0, 1, 2, 3];
        assert_eq!(
            DictionaryReader::new(&odd_width).unwrap().next(),
            Some(Err(DictionaryError::InvalidLength))
        );

        let bad_utf8 = [1, 0, 0, 0, 0, 1, 2, 0, 0xff, 0];
        assert_eq!(
            DictionaryReader::new(&bad_utf8).unwrap().next(),
            Some(Err(DictionaryError::InvalidUtf8))
        );
    }

    #[test]
    fn test_ignores_trailing_padding() {
        let mut payload = [0u8; 32];
        payload[..10].copy_from_slice(&[1, 1, 0, 0, 0, 1, 2, 0, b'E', 0]);

        let tuples: std::vec::Vec<_> = DictionaryReader::new(&payload).unwrap().collect();

        assert_eq!(
            tuples,
            [Ok(Tuple {
                key: 1,
                value: TupleValue::CString("E"),
            })]
        );
    }

    #[test]
    fn test_writer_matches_tuple_sizes() {
        let tuplets = [
            Tuplet::CString {
                key: 0,
                value: "xxx\u{b0}xx'xx\"X",
            },
            Tuplet::Int { key: 6, value: 1 },
            Tuplet::Bytes {
                key: 9,
                value: &[1, 2, 3],
            },
        ];

        let mut writer = DictionaryWriter::<124>::new().unwrap();
        for tuplet in &tuplets {
            writer.write(tuplet).unwrap();
        }
        let encoded = writer.finish();

        let sizes: usize = tuplets.iter().map(Tuplet::size).sum();
        // Count byte plus each tuple
        assert_eq!(encoded.len(), 1 + sizes);
        assert_eq!(encoded[0], 3);

        let decoded: std::vec::Vec<_> = DictionaryReader::new(&encoded).unwrap().collect();
        assert_eq!(
            decoded[1],
            Ok(Tuple {
                key: 6,
                value: TupleValue::Int(1),
            })
        );
        assert_eq!(
            decoded[2],
            Ok(Tuple {
                key: 9,
                value: TupleValue::Bytes(&[1, 2, 3]),
            })
        );
    }

    #[test]
    fn test_writer_refuses_overflow() {
        let mut writer = DictionaryWriter::<12>::new().unwrap();

        writer.write(&Tuplet::Uint { key: 1, value: 7 }).unwrap();
        assert_eq!(
            writer.write(&Tuplet::Uint { key: 2, value: 8 }),
            Err(DictionaryError::BufferOverflow)
        );

        let encoded = writer.finish();
        assert_eq!(encoded.len(), 12);
        assert_eq!(encoded[0], 1);
    }
}
