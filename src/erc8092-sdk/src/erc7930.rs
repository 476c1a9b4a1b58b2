//! ERC-7930 interoperable address codec (EVM v1).
//!
//! Layout, all integer fields big-endian:
//! - u16 version (`0x0001`)
//! - u16 chain type (`0x0000`, eip155)
//! - u8 chain reference length
//! - chain reference (minimal big-endian chain id, empty for 0)
//! - u8 address length (20 for EVM)
//! - address

use alloy_primitives::{Address, Bytes};

const VERSION: [u8; 2] = [0x00, 0x01];
const CHAIN_TYPE_EIP155: [u8; 2] = [0x00, 0x00];
const EVM_ADDRESS_LEN: usize = 20;

/// A (chain id, address) pair recovered from interoperable address bytes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InteropAddress {
    pub chain_id: u64,
    pub address: Address,
}

/// Encode a (chain id, address) pair as ERC-7930 EVM v1 bytes.
pub fn format_evm_v1(chain_id: u64, address: Address) -> Bytes {
    let be = chain_id.to_be_bytes();
    let skip = be.iter().take_while(|b| **b == 0).count();
    let chain_ref = &be[skip..];

    let mut buf = Vec::with_capacity(6 + chain_ref.len() + EVM_ADDRESS_LEN);
    buf.extend_from_slice(&VERSION);
    buf.extend_from_slice(&CHAIN_TYPE_EIP155);
    buf.push(chain_ref.len() as u8);
    buf.extend_from_slice(chain_ref);
    buf.push(EVM_ADDRESS_LEN as u8);
    buf.extend_from_slice(address.as_slice());
    buf.into()
}

/// Parse ERC-7930 EVM v1 bytes.
///
/// Returns `None` on any malformation (wrong version or chain type,
/// truncated or trailing bytes, chain reference wider than a u64, non-EVM
/// address length). Callers treat `None` as "keep the raw bytes as an
/// opaque fallback", so this never errors.
pub fn try_parse_evm_v1(bytes: &[u8]) -> Option<InteropAddress> {
    if bytes.len() < 6 || bytes[0..2] != VERSION || bytes[2..4] != CHAIN_TYPE_EIP155 {
        return None;
    }
    let ref_len = bytes[4] as usize;
    if ref_len > 8 {
        return None;
    }
    // Canonical encoding only: no leading zero bytes in the chain
    // reference, so each (chain id, address) pair has exactly one byte form.
    if ref_len > 0 && bytes[5] == 0 {
        return None;
    }
    let addr_start = 6 + ref_len;
    if bytes.len() != addr_start + EVM_ADDRESS_LEN {
        return None;
    }
    if bytes[5 + ref_len] as usize != EVM_ADDRESS_LEN {
        return None;
    }

    let mut chain_id = 0u64;
    for b in &bytes[5..5 + ref_len] {
        chain_id = (chain_id << 8) | u64::from(*b);
    }
    Some(InteropAddress { chain_id, address: Address::from_slice(&bytes[addr_start..]) })
}
