use alloy_primitives::{Bytes, FixedBytes};
use serde::{Deserialize, Serialize};

/// Largest value representable as a Solidity `uint40`.
pub const UINT40_MAX: u64 = (1 << 40) - 1;

/// Field validation errors. Raised before any hashing; values are never
/// silently truncated to fit their on-chain width.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecordError {
    TimestampOutOfRange { field: &'static str, value: u64 },
}

/// The claim being attested: mirrors the on-chain tuple
/// `(bytes initiator, bytes approver, uint40 validAt, uint40 validUntil,
/// bytes4 interfaceId, bytes data)`.
///
/// `initiator`/`approver` hold ERC-7930 interoperable address bytes; if they
/// do not parse, they are carried as opaque bytes. Two records are the same
/// association iff all six fields are byte-identical.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssociationRecord {
    pub initiator: Bytes,
    pub approver: Bytes,
    /// Unix seconds; the association is not valid before this time.
    pub valid_at: u64,
    /// Unix seconds; `0` means no expiry.
    pub valid_until: u64,
    /// Schema tag for `data`; all-zero is untyped.
    pub interface_id: FixedBytes<4>,
    pub data: Bytes,
}

impl AssociationRecord {
    /// Check the uint40-range invariants the struct hash relies on.
    pub fn validate(&self) -> Result<(), RecordError> {
        check_uint40("validAt", self.valid_at)?;
        check_uint40("validUntil", self.valid_until)
    }
}

pub(crate) fn check_uint40(field: &'static str, value: u64) -> Result<(), RecordError> {
    if value > UINT40_MAX {
        return Err(RecordError::TimestampOutOfRange { field, value });
    }
    Ok(())
}

/// Record plus authorization, as stored by the `AssociationsStore` contract.
///
/// Signature format depends on the matching key type: a raw 65-byte K1
/// signature, an ERC-1271 blob, or an encoded SC-DELEGATION proof. Empty
/// bytes mean "not signed yet". Once `revoked_at` is nonzero the record is
/// permanently inert; there is no un-revoke.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignedAssociationRecord {
    /// Unix seconds of revocation; `0` = active.
    pub revoked_at: u64,
    pub initiator_key_type: FixedBytes<2>,
    pub approver_key_type: FixedBytes<2>,
    pub initiator_signature: Bytes,
    pub approver_signature: Bytes,
    pub record: AssociationRecord,
}

impl SignedAssociationRecord {
    pub fn is_revoked(&self) -> bool {
        self.revoked_at != 0
    }

    /// Whether the record's validity window covers `unix_seconds`.
    /// Revocation is not considered here.
    pub fn is_valid_at(&self, unix_seconds: u64) -> bool {
        self.record.valid_at <= unix_seconds
            && (self.record.valid_until == 0 || unix_seconds <= self.record.valid_until)
    }

    pub fn validate(&self) -> Result<(), RecordError> {
        check_uint40("revokedAt", self.revoked_at)?;
        self.record.validate()
    }
}
