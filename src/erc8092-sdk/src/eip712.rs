//! EIP-712 hashing for association records.
//!
//! Both client signers and the `AssociationsStore` contract must reproduce
//! the digest bit-for-bit, so the word layout below matches the contract's
//! `abi.encode` of the struct fields exactly: dynamic fields are hashed
//! first, `uint40` values occupy right-aligned 32-byte words, and `bytes4`
//! is left-aligned in its word.
//!
//! The association domain is deliberately not bound to a chain id or
//! verifying contract; chain binding comes from the ERC-7930 encoding of
//! `initiator`/`approver` inside the record itself.

use alloy_primitives::{b256, keccak256, B256, U256};
use erc8092_types::record::{AssociationRecord, RecordError};

/// keccak256("EIP712Domain(string name,string version)")
pub const DOMAIN_TYPEHASH: B256 =
    b256!("b03948446334eb9b2196d5eb166f69b9d49403eb4a12f36de8d3f9f3cb8e15c3");
/// keccak256("AssociatedAccounts")
pub const NAME_HASH: B256 =
    b256!("0bd68172d5b24effafc0cb7d24753749b70927238df443fd837470c710ad71bb");
/// keccak256("1")
pub const VERSION_HASH: B256 =
    b256!("c89efdaa54c0f20c7adf612882df0950f5a951637e0307cdcb4c672f298b8bc6");
/// keccak256("AssociatedAccountRecord(bytes initiator,bytes approver,uint40 validAt,uint40 validUntil,bytes4 interfaceId,bytes data)")
pub const MESSAGE_TYPEHASH: B256 =
    b256!("07aab2696aa538d853eb10495a76b15f4c75984ad24e4f0b2a6455db9c8d68a9");

/// Domain separator for the `AssociatedAccounts` protocol, version 1.
/// Constant for the lifetime of the protocol version.
pub fn domain_separator() -> B256 {
    let mut buf = Vec::with_capacity(32 * 3);
    buf.extend_from_slice(DOMAIN_TYPEHASH.as_slice());
    buf.extend_from_slice(NAME_HASH.as_slice());
    buf.extend_from_slice(VERSION_HASH.as_slice());
    keccak256(buf)
}

/// EIP-712 struct hash of a record. Field order is fixed by the contract's
/// struct definition; timestamps are range-checked before any hashing.
pub fn struct_hash(record: &AssociationRecord) -> Result<B256, RecordError> {
    record.validate()?;

    let mut buf = Vec::with_capacity(32 * 7);
    buf.extend_from_slice(MESSAGE_TYPEHASH.as_slice());
    buf.extend_from_slice(keccak256(&record.initiator).as_slice());
    buf.extend_from_slice(keccak256(&record.approver).as_slice());
    buf.extend_from_slice(&U256::from(record.valid_at).to_be_bytes::<32>());
    buf.extend_from_slice(&U256::from(record.valid_until).to_be_bytes::<32>());
    let mut interface_word = [0u8; 32];
    interface_word[..4].copy_from_slice(record.interface_id.as_slice());
    buf.extend_from_slice(&interface_word);
    buf.extend_from_slice(keccak256(&record.data).as_slice());
    Ok(keccak256(buf))
}

/// The 32-byte signing digest: keccak256("\x19\x01" || domainSeparator || structHash).
pub fn digest(record: &AssociationRecord) -> Result<B256, RecordError> {
    let hs = struct_hash(record)?;
    let mut buf = Vec::with_capacity(2 + 32 + 32);
    buf.extend_from_slice(b"\x19\x01");
    buf.extend_from_slice(domain_separator().as_slice());
    buf.extend_from_slice(hs.as_slice());
    Ok(keccak256(buf))
}

/// The association identifier is the signing digest itself, so any party can
/// recompute it from the public record fields alone.
pub fn association_id(record: &AssociationRecord) -> Result<B256, RecordError> {
    digest(record)
}
