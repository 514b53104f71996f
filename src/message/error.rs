#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DictionaryError {
    /// Payload ended in the middle of a header or a value
    Truncated,
    UnknownType(u8),
    /// Integer tuple whose width is not 1, 2 or 4 bytes
    InvalidLength,
    InvalidUtf8,
    /// Value type does not match what the key carries
    TypeMismatch,
    UnknownKey(u32),
    BufferOverflow,
}
