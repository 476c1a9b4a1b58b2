//! Raw-digest secp256k1 signing and recovery (the K1 key type).
//!
//! K1 signatures in this protocol are over the raw 32-byte digest with no
//! EIP-191 message prefix; the verifier recovers the signer directly from
//! the prehash.

use alloy_primitives::{keccak256, Address, B256};
use k256::ecdsa::{RecoveryId, Signature, SigningKey, VerifyingKey};

/// Sign a digest, returning `r || s || v` with v in {27, 28}.
pub fn sign_k1(digest: B256, key: &SigningKey) -> Result<[u8; 65], k256::ecdsa::Error> {
    let (signature, recovery_id) = key.sign_prehash_recoverable(digest.as_slice())?;
    let mut out = [0u8; 65];
    out[..64].copy_from_slice(&signature.to_bytes());
    out[64] = 27 + recovery_id.to_byte();
    Ok(out)
}

/// Recover the signer address from a 65-byte `r || s || v` signature.
///
/// Accepts v in {0, 1, 27, 28}; any other value falls back to trying both
/// parities, matching the verifier contract's tolerance. Returns `None` on
/// malformed length or an unrecoverable point.
pub fn recover_k1(digest: B256, sig: &[u8]) -> Option<Address> {
    if sig.len() != 65 {
        return None;
    }
    let signature = Signature::from_slice(&sig[..64]).ok()?;
    let candidates: Vec<u8> = match sig[64] {
        27 | 28 => vec![sig[64] - 27],
        0 | 1 => vec![sig[64]],
        _ => vec![0, 1],
    };

    for v in candidates {
        let Some(recovery_id) = RecoveryId::from_byte(v) else {
            continue;
        };
        if let Ok(key) = VerifyingKey::recover_from_prehash(digest.as_slice(), &signature, recovery_id)
        {
            return Some(address_of(&key));
        }
    }
    None
}

/// Ethereum address of a verifying key: low 20 bytes of the keccak256 of the
/// uncompressed point (tag byte stripped).
pub fn address_of(key: &VerifyingKey) -> Address {
    let point = key.to_encoded_point(false);
    let hash = keccak256(&point.as_bytes()[1..]);
    Address::from_slice(&hash[12..])
}
