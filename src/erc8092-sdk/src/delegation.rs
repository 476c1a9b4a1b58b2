//! Delegation-framework hashing and encoding.
//!
//! SC-DELEGATION proofs embed delegations understood by the on-chain
//! delegation manager: a delegator grants a session key signing authority,
//! restricted by caveats. In this protocol each delegation carries exactly
//! one caveat whose `terms` is the 32-byte association digest, making the
//! delegation single-use for one record.
//!
//! Unlike the association domain, the delegation domain is bound to the
//! delegation manager's address and chain id.

use alloy_primitives::{b256, keccak256, Address, Bytes, B256, U256};
use alloy_sol_types::{sol, SolValue};
use k256::ecdsa::SigningKey;

use crate::k1;

sol! {
    /// Restriction attached to a delegation. `args` is redemption-time data
    /// and is excluded from the signed payload.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct Caveat {
        address enforcer;
        bytes terms;
        bytes args;
    }

    /// A grant of signing authority from `delegator` to `delegate`, scoped
    /// by `caveats`. `authority` chains to a parent delegation's struct
    /// hash, or to the root sentinel.
    #[derive(Debug, Default, PartialEq, Eq)]
    struct Delegation {
        address delegate;
        address delegator;
        bytes32 authority;
        Caveat[] caveats;
        uint256 salt;
        bytes signature;
    }
}

/// Authority sentinel for a root delegation (no parent).
pub const ROOT_AUTHORITY: B256 =
    b256!("ffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffffff");

/// keccak256("Caveat(address enforcer,bytes terms)")
pub const CAVEAT_TYPEHASH: B256 =
    b256!("80ad7e1b04ee6d994a125f4714ca0720908bd80ed16063ec8aee4b88e9253e2d");
/// keccak256("Delegation(address delegate,address delegator,bytes32 authority,Caveat[] caveats,uint256 salt)Caveat(address enforcer,bytes terms)")
pub const DELEGATION_TYPEHASH: B256 =
    b256!("88c1d2ecf185adf710588203a5f263f0ff61be0d33da39792cde19ba9aa4331e");

/// keccak256("EIP712Domain(string name,string version,uint256 chainId,address verifyingContract)")
const DOMAIN_TYPEHASH: B256 =
    b256!("8b73c3c69bb8fe3d512ecc4cf759cc79239f7b179b0ffacaa9a75d522b39400f");
/// keccak256("DelegationManager")
const DOMAIN_NAME_HASH: B256 =
    b256!("604240e1ed005b9ba256cb7011059bf4ae645812b834bbcb5b22c93e2d1185cc");
/// keccak256("1")
const DOMAIN_VERSION_HASH: B256 =
    b256!("c89efdaa54c0f20c7adf612882df0950f5a951637e0307cdcb4c672f298b8bc6");

fn address_word(address: Address) -> [u8; 32] {
    let mut word = [0u8; 32];
    word[12..].copy_from_slice(address.as_slice());
    word
}

pub fn caveat_hash(caveat: &Caveat) -> B256 {
    let mut buf = Vec::with_capacity(32 * 3);
    buf.extend_from_slice(CAVEAT_TYPEHASH.as_slice());
    buf.extend_from_slice(&address_word(caveat.enforcer));
    buf.extend_from_slice(keccak256(&caveat.terms).as_slice());
    keccak256(buf)
}

pub fn caveats_array_hash(caveats: &[Caveat]) -> B256 {
    let mut buf = Vec::with_capacity(32 * caveats.len());
    for caveat in caveats {
        buf.extend_from_slice(caveat_hash(caveat).as_slice());
    }
    keccak256(buf)
}

/// EIP-712 struct hash of a delegation (`signature` excluded). This is also
/// the value a child delegation's `authority` must carry when re-delegating.
pub fn delegation_struct_hash(delegation: &Delegation) -> B256 {
    let mut buf = Vec::with_capacity(32 * 6);
    buf.extend_from_slice(DELEGATION_TYPEHASH.as_slice());
    buf.extend_from_slice(&address_word(delegation.delegate));
    buf.extend_from_slice(&address_word(delegation.delegator));
    buf.extend_from_slice(delegation.authority.as_slice());
    buf.extend_from_slice(caveats_array_hash(&delegation.caveats).as_slice());
    buf.extend_from_slice(&delegation.salt.to_be_bytes::<32>());
    keccak256(buf)
}

/// Domain separator of a delegation manager deployment.
pub fn delegation_domain_separator(delegation_manager: Address, chain_id: u64) -> B256 {
    let mut buf = Vec::with_capacity(32 * 5);
    buf.extend_from_slice(DOMAIN_TYPEHASH.as_slice());
    buf.extend_from_slice(DOMAIN_NAME_HASH.as_slice());
    buf.extend_from_slice(DOMAIN_VERSION_HASH.as_slice());
    buf.extend_from_slice(&U256::from(chain_id).to_be_bytes::<32>());
    buf.extend_from_slice(&address_word(delegation_manager));
    keccak256(buf)
}

/// The digest a delegator signs to authorize a delegation.
pub fn delegation_typed_digest(
    delegation_manager: Address,
    chain_id: u64,
    struct_hash: B256,
) -> B256 {
    let mut buf = Vec::with_capacity(2 + 32 + 32);
    buf.extend_from_slice(b"\x19\x01");
    buf.extend_from_slice(delegation_domain_separator(delegation_manager, chain_id).as_slice());
    buf.extend_from_slice(struct_hash.as_slice());
    keccak256(buf)
}

/// Build an unsigned root delegation whose single caveat binds it to one
/// association digest, so it cannot be reused for a different record.
pub fn digest_bound_delegation(
    digest: B256,
    delegate: Address,
    delegator: Address,
    enforcer: Address,
    salt: U256,
) -> Delegation {
    Delegation {
        delegate,
        delegator,
        authority: ROOT_AUTHORITY,
        caveats: vec![Caveat {
            enforcer,
            terms: Bytes::copy_from_slice(digest.as_slice()),
            args: Bytes::new(),
        }],
        salt,
        signature: Bytes::new(),
    }
}

/// K1 convenience for EOA delegators. Smart-contract delegators produce the
/// signature through their own authorization mechanism and set it directly.
pub fn sign_delegation_k1(
    delegation: &mut Delegation,
    delegation_manager: Address,
    chain_id: u64,
    key: &SigningKey,
) -> Result<(), k256::ecdsa::Error> {
    let digest =
        delegation_typed_digest(delegation_manager, chain_id, delegation_struct_hash(delegation));
    delegation.signature = k1::sign_k1(digest, key)?.to_vec().into();
    Ok(())
}

/// `abi.encode(Delegation[])`, as the delegation manager decodes it.
pub fn encode_delegations(delegations: &[Delegation]) -> Bytes {
    delegations.to_vec().abi_encode().into()
}

/// Inverse of [`encode_delegations`]; `None` on malformed ABI.
pub fn decode_delegations(bytes: &[u8]) -> Option<Vec<Delegation>> {
    Vec::<Delegation>::abi_decode(bytes, true).ok()
}
