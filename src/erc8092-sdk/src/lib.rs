//! Off-chain SDK for ERC-8092 associated accounts.
//!
//! The `AssociationsStore` contract recomputes everything this crate
//! produces: the EIP-712 digest of an association record (which doubles as
//! the association identifier), the ERC-7930 encoding of each account, and
//! the SC-DELEGATION proof blob that lets a smart-contract account authorize
//! an association through a session key. Every function here is a pure,
//! deterministic computation over in-memory bytes; all keys, chain ids, and
//! contract addresses come in as explicit parameters.

pub mod agent;
pub mod association;
pub mod delegation;
pub mod eip712;
pub mod erc7930;
pub mod k1;
pub mod proof;

pub use erc8092_types as types;

#[cfg(test)]
mod tests;
