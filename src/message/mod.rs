use heapless::Vec;

use crate::config::OUTBOUND_CAPACITY;
use dictionary::{DictionaryWriter, Tuple, TupleValue, Tuplet};
pub use error::DictionaryError;

pub mod dictionary;
mod error;

pub type OutboundPayload = Vec<u8, OUTBOUND_CAPACITY>;

/// Tuple keys shared with the companion app
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u32)]
pub enum Key {
    Latitude = 0,
    Longitude = 1,
    Accuracy = 2,
    Heading = 3,
    Speed = 4,
    /// British National Grid reference
    BngReference = 5,
    RequestLocation = 6,
}

impl TryFrom<u32> for Key {
    type Error = DictionaryError;

    fn try_from(key: u32) -> Result<Self, Self::Error> {
        match key {
            0 => Ok(Key::Latitude),
            1 => Ok(Key::Longitude),
            2 => Ok(Key::Accuracy),
            3 => Ok(Key::Heading),
            4 => Ok(Key::Speed),
            5 => Ok(Key::BngReference),
            6 => Ok(Key::RequestLocation),
            other => Err(DictionaryError::UnknownKey(other)),
        }
    }
}

/// One attribute of the location as sent by the companion
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum FieldUpdate<'a> {
    Latitude(&'a str),
    Longitude(&'a str),
    /// Metres, sent as 16.16 fixed point
    Accuracy(f32),
    Heading(i32),
    Speed(i32),
    GridReference(&'a str),
    /// Reserved key whose value is not an `i32`-sized integer
    Reserved(Key),
}

impl<'a> TryFrom<Tuple<'a>> for FieldUpdate<'a> {
    type Error = DictionaryError;

    fn try_from(tuple: Tuple<'a>) -> Result<Self, Self::Error> {
        let key = Key::try_from(tuple.key)?;

        match (key, tuple.value) {
            (Key::Latitude, TupleValue::CString(text)) => Ok(FieldUpdate::Latitude(text)),
            (Key::Longitude, TupleValue::CString(text)) => Ok(FieldUpdate::Longitude(text)),
            (Key::BngReference, TupleValue::CString(text)) => Ok(FieldUpdate::GridReference(text)),
            (Key::Accuracy | Key::Heading | Key::Speed, value) => Ok(reserved(key, value)),
            // Outbound only; the companion never sends it back
            (Key::RequestLocation, _) => Err(DictionaryError::UnknownKey(tuple.key)),
            _ => Err(DictionaryError::TypeMismatch),
        }
    }
}

/// Reserved fields are never consumed, so any encoding is accepted
fn reserved<'a>(key: Key, value: TupleValue) -> FieldUpdate<'a> {
    let raw = match value {
        TupleValue::Int(value) => Some(value),
        TupleValue::Uint(value) => i32::try_from(value).ok(),
        _ => None,
    };

    match (key, raw) {
        (Key::Accuracy, Some(raw)) => FieldUpdate::Accuracy(raw as f32 / (1 << 16) as f32),
        (Key::Heading, Some(raw)) => FieldUpdate::Heading(raw),
        (Key::Speed, Some(raw)) => FieldUpdate::Speed(raw),
        _ => FieldUpdate::Reserved(key),
    }
}

/// The only outbound message: ask the companion for a fresh location
pub fn request_location() -> Result<OutboundPayload, DictionaryError> {
    let mut writer = DictionaryWriter::<OUTBOUND_CAPACITY>::new()?;

    writer.write(&Tuplet::Int {
        key: Key::RequestLocation as u32,
        value: 1,
    })?;

    Ok(writer.finish())
}

#[cfg(test)]
mod tests {
    use super::dictionary::DictionaryReader;
    use super::*;

    #[test]
    fn test_maps_string_fields() {
        let tuple = Tuple {
            key: 5,
            value: TupleValue::CString("TQ 305 844"),
        };

        assert_eq!(
            FieldUpdate::try_from(tuple),
            Ok(FieldUpdate::GridReference("TQ 305 844"))
        );
    }

    #[test]
    fn test_accuracy_is_fixed_point() {
        let tuple = Tuple {
            key: 2,
            value: TupleValue::Int(3 << 15),
        };

        assert_eq!(FieldUpdate::try_from(tuple), Ok(FieldUpdate::Accuracy(1.5)));
    }

    #[test]
    fn test_reserved_keys_accept_any_encoding() {
        let oversized_speed = Tuple {
            key: Key::Speed as u32,
            value: TupleValue::Uint(u32::MAX),
        };
        assert_eq!(
            FieldUpdate::try_from(oversized_speed),
            Ok(FieldUpdate::Reserved(Key::Speed))
        );

        let text_accuracy = Tuple {
            key: Key::Accuracy as u32,
            value: TupleValue::CString("5m"),
        };
        assert_eq!(
            FieldUpdate::try_from(text_accuracy),
            Ok(FieldUpdate::Reserved(Key::Accuracy))
        );

        let raw_heading = Tuple {
            key: Key::Heading as u32,
            value: TupleValue::Bytes(&[1, 2]),
        };
        assert_eq!(
            FieldUpdate::try_from(raw_heading),
            Ok(FieldUpdate::Reserved(Key::Heading))
        );
    }

    #[test]
    fn test_unknown_and_mistyped_tuples() {
        let unknown = Tuple {
            key: 42,
            value: TupleValue::Uint(1),
        };
        assert_eq!(
            FieldUpdate::try_from(unknown),
            Err(DictionaryError::UnknownKey(42))
        );

        let mistyped = Tuple {
            key: 0,
            value: TupleValue::Int(51),
        };
        assert_eq!(
            FieldUpdate::try_from(mistyped),
            Err(DictionaryError::TypeMismatch)
        );

        let echoed_request = Tuple {
            key: 6,
            value: TupleValue::Int(1),
        };
        assert_eq!(
            FieldUpdate::try_from(echoed_request),
            Err(DictionaryError::UnknownKey(6))
        );
    }

    #[test]
    fn test_request_location_payload() {
        let payload = request_location().unwrap();

        assert_eq!(&payload[..], &[1, 6, 0, 0, 0, 3, 4, 0, 1, 0, 0, 0]);

        let mut reader = DictionaryReader::new(&payload).unwrap();
        assert_eq!(
            reader.next(),
            Some(Ok(Tuple {
                key: Key::RequestLocation as u32,
                value: TupleValue::Int(1)
            }))
        );
    }
}
