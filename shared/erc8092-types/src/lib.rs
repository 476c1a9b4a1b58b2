//! Shared ERC-8092 data model.
//!
//! These types mirror the `AssociationsStore` ABI tuples exactly, so an
//! off-chain producer and the on-chain verifier agree on field order and
//! widths by construction.

pub mod key_type;
pub mod record;

pub use key_type::{
    KeyType, UnknownKeyType, KEY_TYPE_ERC1271, KEY_TYPE_ERC6492, KEY_TYPE_K1,
    KEY_TYPE_SC_DELEGATION,
};
pub use record::{AssociationRecord, RecordError, SignedAssociationRecord, UINT40_MAX};
