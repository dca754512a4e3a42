use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::encoding::{decode_u64, encode_u32, encode_u64};

/// Length in bytes of every dictionary identifier
pub const ID_LENGTH: usize = 8;

/// Leading byte of identifiers reserved for well-known vocabulary terms
pub const RESERVED_PREFIX: u8 = 0xFF;

/// Fixed-length binary surrogate for an RDF term
///
/// The unbound ("variable") marker is not an `Id` value: patterns carry it as
/// `None` in an `Option<Id>` slot, so it can never collide with `NOT_SET`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id([u8; ID_LENGTH]);

impl Id {
    /// A term that has no identifier assigned yet
    pub const NOT_SET: Id = Id([0; ID_LENGTH]);

    pub const fn from_bytes(bytes: [u8; ID_LENGTH]) -> Self {
        Id(bytes)
    }

    /// Build an id from exactly `ID_LENGTH` bytes
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        let bytes: [u8; ID_LENGTH] = bytes.try_into().ok()?;
        Some(Id(bytes))
    }

    pub fn from_u64(value: u64) -> Self {
        let mut bytes = [0u8; ID_LENGTH];
        encode_u64(&mut bytes, value);
        Id(bytes)
    }

    /// Identifier in the reserved well-known range
    pub fn reserved(sequence: u32) -> Self {
        let mut bytes = [0u8; ID_LENGTH];
        bytes[0] = RESERVED_PREFIX;
        encode_u32(&mut bytes[ID_LENGTH - 4..], sequence);
        Id(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; ID_LENGTH] {
        &self.0
    }

    pub fn as_u64(&self) -> u64 {
        decode_u64(&self.0).unwrap_or_default()
    }

    pub fn is_set(&self) -> bool {
        *self != Id::NOT_SET
    }

    pub fn is_reserved(&self) -> bool {
        self.0[0] == RESERVED_PREFIX
    }
}

impl fmt::Debug for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id({})", self)
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for byte in &self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}

/// Strip the `NOT_SET` sentinel so it is handled like an unbound slot
pub fn bound(id: Option<&Id>) -> Option<&Id> {
    id.filter(|id| id.is_set())
}
