//! Identity and versioning types for textsync.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a client-side text-field endpoint.
///
/// The registry keys duplicate-registration checks on this value.
/// UUID v4 format (16 bytes).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldEndpointId(uuid::Uuid);

impl FieldEndpointId {
    /// Create a new random FieldEndpointId.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4())
    }

    /// Create a FieldEndpointId from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Option<Self> {
        uuid::Uuid::from_slice(bytes).ok().map(Self)
    }

    /// Get the raw bytes of this FieldEndpointId.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl Default for FieldEndpointId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for FieldEndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for FieldEndpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FieldEndpointId({})", &self.to_string()[..8])
    }
}

/// Opaque handle for one registered text field.
///
/// Allocated by the session registry and never reused within a process,
/// so a handle from an evicted session cannot address its replacement.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextFieldHandle(u64);

impl TextFieldHandle {
    /// Create a handle from a raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this handle.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TextFieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for TextFieldHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TextFieldHandle({})", self.0)
    }
}

/// A monotonically increasing version stamp for one text field.
///
/// Advanced exactly once per committed or cancelled transaction or
/// composition. Compared by equality for optimistic concurrency; ordering
/// is only meaningful between revisions of the same field.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default)]
pub struct RevisionId(u64);

impl RevisionId {
    /// Create a RevisionId with the given value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this RevisionId.
    pub fn value(&self) -> u64 {
        self.0
    }

    /// The revision of a freshly registered field.
    pub fn zero() -> Self {
        Self(0)
    }

    /// Increment the revision by one.
    pub fn next(&self) -> Self {
        Self(self.0.saturating_add(1))
    }
}

impl fmt::Display for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Debug for RevisionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RevisionId({})", self.0)
    }
}

/// Token naming one open edit transaction.
///
/// 64 bits of random data. Valid only while its transaction is Active.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TransactionId(u64);

impl TransactionId {
    /// Create a new random TransactionId.
    pub fn random() -> Self {
        let mut bytes = [0u8; 8];
        getrandom::getrandom(&mut bytes).expect("getrandom failed");
        Self(u64::from_le_bytes(bytes))
    }

    /// Create a TransactionId from a raw value.
    pub fn new(value: u64) -> Self {
        Self(value)
    }

    /// Get the numeric value of this TransactionId.
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

impl fmt::Debug for TransactionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TransactionId({:016x})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_id_is_uuid_v4() {
        let id = FieldEndpointId::new();
        assert_eq!(id.as_bytes().len(), 16);
        assert_eq!(id.0.get_version_num(), 4);
    }

    #[test]
    fn endpoint_id_from_invalid_length_fails() {
        assert!(FieldEndpointId::from_bytes(&[0u8; 4]).is_none());
    }

    #[test]
    fn endpoint_ids_differ() {
        assert_ne!(FieldEndpointId::new(), FieldEndpointId::new());
    }

    #[test]
    fn revision_ordering() {
        let r1 = RevisionId::new(3);
        let r2 = RevisionId::new(4);
        assert!(r1 < r2);
        assert_eq!(r1.next(), r2);
    }

    #[test]
    fn revision_zero() {
        assert_eq!(RevisionId::zero().value(), 0);
        assert_eq!(RevisionId::default(), RevisionId::zero());
    }

    #[test]
    fn revision_saturates_instead_of_wrapping() {
        let r = RevisionId::new(u64::MAX);
        assert_eq!(r.next().value(), u64::MAX);
    }

    #[test]
    fn transaction_ids_are_random() {
        // Two draws colliding would take ~2^32 attempts
        assert_ne!(TransactionId::random(), TransactionId::random());
    }

    #[test]
    fn transaction_id_display_is_fixed_width_hex() {
        assert_eq!(TransactionId::new(255).to_string(), "00000000000000ff");
    }
}
