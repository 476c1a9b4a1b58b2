//! SC-DELEGATION proof encoding, decoding, and local verification.
//!
//! The proof blob substitutes for a direct signature when an account's key
//! type is SC-DELEGATION: a session key signs the association digest, and a
//! delegation chain proves the session key was authorized by the account.
//! Wire format is `abi.encode(address delegate, bytes delegateSignature,
//! bytes delegations)`, with `delegations` holding the
//! [`crate::delegation::encode_delegations`] array.

use alloy_primitives::{Address, Bytes, B256};
use alloy_sol_types::{sol, SolValue};
use k256::ecdsa::SigningKey;

use crate::delegation::{self, Delegation};
use crate::k1;

sol! {
    struct RawProof {
        address delegate;
        bytes delegateSignature;
        bytes delegations;
    }
}

/// Failure reasons, kept distinct for diagnostics even though the on-chain
/// verifier collapses them into a single revert.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ProofError {
    /// The blob or its embedded delegation array is not valid ABI.
    InvalidEncoding,
    /// The delegate signature does not recover to the stated delegate.
    InvalidDelegateSignature,
    /// Authority links, the root sentinel, or delegate/delegator wiring is
    /// wrong, or the chain is empty.
    BrokenDelegationChain,
    /// The binding caveat is missing, has the wrong enforcer, or is bound to
    /// a different digest.
    CaveatDigestMismatch,
    /// A 65-byte delegation signature does not recover to its delegator.
    InvalidDelegatorSignature,
}

/// Decoded SC-DELEGATION proof.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ScDelegationProof {
    pub delegate: Address,
    pub delegate_signature: Bytes,
    pub delegations: Vec<Delegation>,
}

/// Everything the verifier needs besides the blob itself.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ProofContext {
    /// The association digest the proof must authorize.
    pub expected_digest: B256,
    /// The account whose key type is SC-DELEGATION (initiator or approver).
    pub authorizer: Address,
    /// The digest-binding caveat enforcer configured on the store.
    pub enforcer: Address,
    pub delegation_manager: Address,
    pub chain_id: u64,
}

pub fn encode_sc_delegation_proof(
    delegate: Address,
    delegate_signature: &[u8],
    delegations: &[u8],
) -> Bytes {
    RawProof {
        delegate,
        delegateSignature: Bytes::copy_from_slice(delegate_signature),
        delegations: Bytes::copy_from_slice(delegations),
    }
    .abi_encode()
    .into()
}

/// Strictly decode a proof blob, including the nested delegation array.
pub fn decode_sc_delegation_proof(blob: &[u8]) -> Result<ScDelegationProof, ProofError> {
    let raw = RawProof::abi_decode(blob, true).map_err(|_| ProofError::InvalidEncoding)?;
    let delegations =
        delegation::decode_delegations(&raw.delegations).ok_or(ProofError::InvalidEncoding)?;
    Ok(ScDelegationProof {
        delegate: raw.delegate,
        delegate_signature: raw.delegateSignature,
        delegations,
    })
}

/// Producer path: the session key signs the raw association digest, and the
/// caller-signed delegations are packaged into the final blob. Delegator
/// signatures must already be set.
pub fn build_sc_delegation_proof(
    digest: B256,
    session_key: &SigningKey,
    delegations: &[Delegation],
) -> Result<Bytes, k256::ecdsa::Error> {
    let delegate = k1::address_of(session_key.verifying_key());
    let delegate_signature = k1::sign_k1(digest, session_key)?;
    Ok(encode_sc_delegation_proof(
        delegate,
        &delegate_signature,
        &delegation::encode_delegations(delegations),
    ))
}

/// Local pre-flight mirror of the on-chain verification. Any failing step
/// invalidates the whole proof; there is no partial credit.
pub fn verify_sc_delegation_proof(blob: &[u8], ctx: &ProofContext) -> Result<(), ProofError> {
    let proof = decode_sc_delegation_proof(blob)?;
    verify_decoded(&proof, ctx)
}

pub fn verify_decoded(proof: &ScDelegationProof, ctx: &ProofContext) -> Result<(), ProofError> {
    // The delegate must have signed the association digest itself.
    let recovered = k1::recover_k1(ctx.expected_digest, &proof.delegate_signature)
        .ok_or(ProofError::InvalidDelegateSignature)?;
    if recovered != proof.delegate {
        return Err(ProofError::InvalidDelegateSignature);
    }

    // Chain structure: the leaf delegates to the session key, every
    // authority points at its parent's struct hash, each delegation is
    // granted by its parent's delegate, and the root carries the sentinel
    // and is granted by the authorizer.
    let Some(leaf) = proof.delegations.first() else {
        return Err(ProofError::BrokenDelegationChain);
    };
    let Some(root) = proof.delegations.last() else {
        return Err(ProofError::BrokenDelegationChain);
    };
    if leaf.delegate != proof.delegate {
        return Err(ProofError::BrokenDelegationChain);
    }
    for pair in proof.delegations.windows(2) {
        if pair[0].authority != delegation::delegation_struct_hash(&pair[1])
            || pair[0].delegator != pair[1].delegate
        {
            return Err(ProofError::BrokenDelegationChain);
        }
    }
    if root.authority != delegation::ROOT_AUTHORITY || root.delegator != ctx.authorizer {
        return Err(ProofError::BrokenDelegationChain);
    }

    // The leaf caveat binds the chain to this digest, so the proof cannot be
    // replayed for a different record.
    let [caveat] = leaf.caveats.as_slice() else {
        return Err(ProofError::CaveatDigestMismatch);
    };
    if caveat.enforcer != ctx.enforcer
        || caveat.terms.as_ref() != ctx.expected_digest.as_slice()
    {
        return Err(ProofError::CaveatDigestMismatch);
    }

    // Non-leaf delegations may carry additional caveats, enforced on chain
    // at redemption; any that use the digest-binding enforcer must agree on
    // the digest.
    for delegation in &proof.delegations[1..] {
        for caveat in &delegation.caveats {
            if caveat.enforcer == ctx.enforcer
                && caveat.terms.as_ref() != ctx.expected_digest.as_slice()
            {
                return Err(ProofError::CaveatDigestMismatch);
            }
        }
    }

    // Delegator signatures. 65-byte signatures are checked by recovery;
    // other lengths are contract-account signatures that only the on-chain
    // ERC-1271 path can validate.
    for delegation in &proof.delegations {
        if delegation.signature.len() != 65 {
            continue;
        }
        let typed = delegation::delegation_typed_digest(
            ctx.delegation_manager,
            ctx.chain_id,
            delegation::delegation_struct_hash(delegation),
        );
        match k1::recover_k1(typed, &delegation.signature) {
            Some(signer) if signer == delegation.delegator => {}
            _ => return Err(ProofError::InvalidDelegatorSignature),
        }
    }

    Ok(())
}
