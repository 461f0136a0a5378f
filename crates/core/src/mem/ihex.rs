//! Intel HEX record parsing.
//!
//! One record per line: `:LLAAAATT<payload>CC` where `LL` is the payload
//! byte count, `AAAA` the 16-bit address, `TT` the record type and `CC` a
//! two's-complement checksum of every preceding byte. Parsing validates the
//! structure, the declared byte count against both the payload length and
//! the type-specific expectation, and the checksum.

use thiserror::Error;

/// Intel HEX record types.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordKind {
    /// Payload bytes to place at the record address.
    Data,
    /// Terminates the image; carries no payload.
    EndOfFile,
    /// 16-bit segment base, scaled by 16.
    ExtendedSegmentAddress,
    /// Initial CS:IP value; validated but otherwise ignored here.
    StartSegmentAddress,
    /// Upper 16 bits of subsequent data-record addresses.
    ExtendedLinearAddress,
    /// Initial EIP value; validated but otherwise ignored here.
    StartLinearAddress,
}

impl RecordKind {
    fn from_type_byte(byte: u8) -> Option<Self> {
        match byte {
            0x00 => Some(Self::Data),
            0x01 => Some(Self::EndOfFile),
            0x02 => Some(Self::ExtendedSegmentAddress),
            0x03 => Some(Self::StartSegmentAddress),
            0x04 => Some(Self::ExtendedLinearAddress),
            0x05 => Some(Self::StartLinearAddress),
            _ => None,
        }
    }

    /// The byte count this record type requires, if it is fixed.
    const fn expected_count(self) -> Option<u8> {
        match self {
            Self::Data => None,
            Self::EndOfFile => Some(0),
            Self::ExtendedSegmentAddress | Self::ExtendedLinearAddress => Some(2),
            Self::StartSegmentAddress | Self::StartLinearAddress => Some(4),
        }
    }
}

/// A malformed record line.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum RecordError {
    /// The line is shorter than the smallest possible record.
    #[error("line is too short")]
    TooShort,
    /// The line does not start with ':'.
    #[error("line doesn't start with ':'")]
    MissingPrefix,
    /// The line has an odd number of hex digits.
    #[error("line has an odd number of nibbles")]
    OddNibbleCount,
    /// A character is not a hex digit.
    #[error("bad hex digit {0:?}")]
    BadHexDigit(char),
    /// The record type byte is not a known type.
    #[error("bad record type byte {0:#04x}")]
    BadRecordType(u8),
    /// The declared byte count does not match the payload length.
    #[error("declared byte count {declared} but {found} payload bytes")]
    LengthMismatch {
        /// Byte count field from the record.
        declared: u8,
        /// Payload bytes actually present.
        found: usize,
    },
    /// A fixed-size record type carries the wrong byte count.
    #[error("bad byte count {found} for a {kind:?} record (expected {expected})")]
    ByteCountMismatch {
        /// The record type in question.
        kind: RecordKind,
        /// The count the type requires.
        expected: u8,
        /// The count the record declared.
        found: u8,
    },
    /// The record bytes do not sum to zero.
    #[error("checksum mismatch: expected {expected:#04x}, found {found:#04x}")]
    ChecksumMismatch {
        /// Two's complement of the record byte sum.
        expected: u8,
        /// Checksum byte present on the line.
        found: u8,
    },
}

/// A parsed and validated record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Record {
    /// 16-bit address field.
    pub address: u16,
    /// Record type.
    pub kind: RecordKind,
    /// Payload bytes (`byte count` of them).
    pub data: Vec<u8>,
}

impl Record {
    /// Parses one line of an Intel HEX image.
    pub fn parse(line: &str) -> Result<Self, RecordError> {
        let line = line.strip_suffix('\r').unwrap_or(line);

        if line.len() < 11 {
            return Err(RecordError::TooShort);
        }
        let digits = line.strip_prefix(':').ok_or(RecordError::MissingPrefix)?;
        if digits.len() % 2 != 0 {
            return Err(RecordError::OddNibbleCount);
        }

        let mut bytes = Vec::with_capacity(digits.len() / 2);
        let mut chars = digits.chars();
        while let (Some(hi), Some(lo)) = (chars.next(), chars.next()) {
            bytes.push(nibble(hi)? << 4 | nibble(lo)?);
        }

        // count + address (2) + type + checksum
        let declared = bytes[0];
        let payload_len = bytes.len() - 5;
        if usize::from(declared) != payload_len {
            return Err(RecordError::LengthMismatch {
                declared,
                found: payload_len,
            });
        }

        let sum = bytes.iter().fold(0u8, |acc, &b| acc.wrapping_add(b));
        if sum != 0 {
            let found = bytes[bytes.len() - 1];
            return Err(RecordError::ChecksumMismatch {
                expected: found.wrapping_sub(sum),
                found,
            });
        }

        let kind =
            RecordKind::from_type_byte(bytes[3]).ok_or(RecordError::BadRecordType(bytes[3]))?;
        if let Some(expected) = kind.expected_count()
            && expected != declared
        {
            return Err(RecordError::ByteCountMismatch {
                kind,
                expected,
                found: declared,
            });
        }

        Ok(Self {
            address: u16::from(bytes[1]) << 8 | u16::from(bytes[2]),
            kind,
            data: bytes[4..4 + payload_len].to_vec(),
        })
    }

    /// The payload of an extended-address record as a big-endian `u16`.
    ///
    /// Only meaningful for the two-byte extended record types.
    pub fn address_payload(&self) -> u16 {
        u16::from(self.data[0]) << 8 | u16::from(self.data[1])
    }
}

fn nibble(c: char) -> Result<u8, RecordError> {
    c.to_digit(16)
        .map(|d| d as u8)
        .ok_or(RecordError::BadHexDigit(c))
}
