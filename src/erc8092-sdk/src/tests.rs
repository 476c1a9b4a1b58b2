use alloy_primitives::{address, b256, hex, Bytes, FixedBytes, B256, U256};
use erc8092_types::record::{AssociationRecord, RecordError, UINT40_MAX};
use erc8092_types::{KEY_TYPE_K1, KEY_TYPE_SC_DELEGATION};
use k256::ecdsa::SigningKey;

use crate::association::{build_signed_association, new_association_record, RecordParams};
use crate::delegation::{
    delegation_struct_hash, digest_bound_delegation, encode_delegations, sign_delegation_k1,
};
use crate::proof::{
    build_sc_delegation_proof, decode_sc_delegation_proof, encode_sc_delegation_proof,
    verify_sc_delegation_proof, ProofContext, ProofError,
};
use crate::{eip712, k1};

const SEPOLIA: u64 = 11155111;

/// Regression vector: chain 11155111, initiator 20x`aa`, approver 20x`bb`,
/// validAt 1700000000, no expiry, untyped empty data.
const VECTOR_DIGEST: B256 =
    b256!("01f627675b13d85565181b8a9cbba6116b33c70a5f58b28adc4e2d300232c7f2");
const VECTOR_STRUCT_HASH: B256 =
    b256!("75256e45e238d3af944307d1e843bf92676c34c37b4bf72f62f06e284ef094c3");

fn vector_record() -> AssociationRecord {
    new_association_record(&RecordParams {
        chain_id: SEPOLIA,
        initiator_address: address!("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa"),
        approver_address: address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"),
        valid_at: 1_700_000_000,
        valid_until: 0,
        interface_id: FixedBytes::ZERO,
        data: Bytes::new(),
    })
    .unwrap()
}

fn key(byte: u8) -> SigningKey {
    SigningKey::from_slice(&[byte; 32]).unwrap()
}

#[test]
fn fixture_vector() {
    let record = vector_record();
    assert_eq!(
        record.initiator.as_ref(),
        hex!("0001000003aa36a714aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa")
    );
    assert_eq!(eip712::struct_hash(&record), Ok(VECTOR_STRUCT_HASH));
    assert_eq!(eip712::digest(&record), Ok(VECTOR_DIGEST));
}

#[test]
fn association_id_equals_digest() {
    let record = vector_record();
    assert_eq!(eip712::association_id(&record), eip712::digest(&record));
}

#[test]
fn digest_is_deterministic() {
    let record = vector_record();
    assert_eq!(eip712::digest(&record), eip712::digest(&record.clone()));
}

#[test]
fn digest_is_sensitive_to_every_field() {
    let base = eip712::digest(&vector_record()).unwrap();

    let mutations: Vec<Box<dyn Fn(&mut AssociationRecord)>> = vec![
        Box::new(|r| r.initiator = Bytes::from(vec![0x00])),
        Box::new(|r| r.approver = Bytes::from(vec![0x00])),
        Box::new(|r| r.valid_at += 1),
        Box::new(|r| r.valid_until = 1),
        Box::new(|r| r.interface_id = FixedBytes::from([0, 0, 0, 1])),
        Box::new(|r| r.data = Bytes::from(vec![0x00])),
    ];
    for (i, mutate) in mutations.iter().enumerate() {
        let mut record = vector_record();
        mutate(&mut record);
        assert_ne!(eip712::digest(&record).unwrap(), base, "mutation {i} left digest unchanged");
    }

    // A single flipped byte inside `data` must also move the digest.
    let mut record = vector_record();
    record.data = Bytes::from(vec![0x01, 0x02, 0x03]);
    let with_data = eip712::digest(&record).unwrap();
    record.data = Bytes::from(vec![0x01, 0x02, 0x04]);
    assert_ne!(eip712::digest(&record).unwrap(), with_data);
}

#[test]
fn uint40_boundary_is_enforced_before_hashing() {
    let mut record = vector_record();
    record.valid_at = UINT40_MAX;
    assert!(eip712::digest(&record).is_ok());

    record.valid_at = UINT40_MAX + 1;
    assert_eq!(
        eip712::digest(&record),
        Err(RecordError::TimestampOutOfRange { field: "validAt", value: UINT40_MAX + 1 })
    );
}

#[test]
fn k1_sign_and_recover() {
    let signing_key = key(0x42);
    let signer = k1::address_of(signing_key.verifying_key());
    let digest = VECTOR_DIGEST;

    let mut sig = k1::sign_k1(digest, &signing_key).unwrap();
    assert!(sig[64] == 27 || sig[64] == 28);
    assert_eq!(k1::recover_k1(digest, &sig), Some(signer));

    // The 0/1 parity form is accepted as well.
    sig[64] -= 27;
    assert_eq!(k1::recover_k1(digest, &sig), Some(signer));

    assert_eq!(k1::recover_k1(digest, &sig[..64]), None);
    assert_eq!(k1::recover_k1(B256::repeat_byte(0x99), &[0u8; 65]), None);
}

#[test]
fn sign_if_eoa_signs_matching_side_only() {
    let signing_key = key(0x07);
    let signer = k1::address_of(signing_key.verifying_key());

    let record = new_association_record(&RecordParams {
        chain_id: SEPOLIA,
        initiator_address: signer,
        approver_address: address!("bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb"),
        valid_at: 1_700_000_000,
        valid_until: 0,
        interface_id: FixedBytes::ZERO,
        data: Bytes::new(),
    })
    .unwrap();

    let sar = build_signed_association(
        record.clone(),
        KEY_TYPE_K1,
        KEY_TYPE_SC_DELEGATION,
        Some(&signing_key),
    )
    .unwrap();

    assert_eq!(sar.revoked_at, 0);
    assert!(sar.approver_signature.is_empty());
    let digest = eip712::digest(&record).unwrap();
    assert_eq!(k1::recover_k1(digest, &sar.initiator_signature), Some(signer));
}

// --- SC-DELEGATION proofs ---

struct Fixture {
    ctx: ProofContext,
    session_key: SigningKey,
    delegator_key: SigningKey,
}

fn proof_fixture(expected_digest: B256) -> Fixture {
    let delegator_key = key(0x11);
    Fixture {
        ctx: ProofContext {
            expected_digest,
            authorizer: k1::address_of(delegator_key.verifying_key()),
            enforcer: address!("00000000000000000000000000000000000000e1"),
            delegation_manager: address!("00000000000000000000000000000000000000d1"),
            chain_id: SEPOLIA,
        },
        session_key: key(0x22),
        delegator_key,
    }
}

/// Single root delegation authorizer -> session key, bound to `bound_digest`,
/// with the session key signing `signed_digest`.
fn build_proof(fx: &Fixture, bound_digest: B256, signed_digest: B256) -> Bytes {
    let mut delegation = digest_bound_delegation(
        bound_digest,
        k1::address_of(fx.session_key.verifying_key()),
        fx.ctx.authorizer,
        fx.ctx.enforcer,
        U256::from(1u64),
    );
    sign_delegation_k1(&mut delegation, fx.ctx.delegation_manager, fx.ctx.chain_id, &fx.delegator_key)
        .unwrap();
    build_sc_delegation_proof(signed_digest, &fx.session_key, &[delegation]).unwrap()
}

#[test]
fn proof_round_trip() {
    let fx = proof_fixture(VECTOR_DIGEST);
    let blob = build_proof(&fx, VECTOR_DIGEST, VECTOR_DIGEST);

    let proof = decode_sc_delegation_proof(&blob).unwrap();
    assert_eq!(proof.delegate, k1::address_of(fx.session_key.verifying_key()));
    assert_eq!(proof.delegations.len(), 1);
    assert_eq!(proof.delegations[0].delegator, fx.ctx.authorizer);

    // Re-encoding the decoded parts reproduces the blob byte-for-byte.
    let re_encoded = encode_sc_delegation_proof(
        proof.delegate,
        &proof.delegate_signature,
        &encode_delegations(&proof.delegations),
    );
    assert_eq!(re_encoded, blob);
}

#[test]
fn proof_verifies() {
    let fx = proof_fixture(VECTOR_DIGEST);
    let blob = build_proof(&fx, VECTOR_DIGEST, VECTOR_DIGEST);
    assert_eq!(verify_sc_delegation_proof(&blob, &fx.ctx), Ok(()));
}

#[test]
fn malformed_blob_is_an_encoding_error() {
    let fx = proof_fixture(VECTOR_DIGEST);
    assert_eq!(
        verify_sc_delegation_proof(&[0xde, 0xad, 0xbe, 0xef], &fx.ctx),
        Err(ProofError::InvalidEncoding)
    );

    let blob = build_proof(&fx, VECTOR_DIGEST, VECTOR_DIGEST);
    assert_eq!(
        verify_sc_delegation_proof(&blob[..blob.len() - 1], &fx.ctx),
        Err(ProofError::InvalidEncoding)
    );
}

#[test]
fn proof_for_other_digest_fails() {
    let other = B256::repeat_byte(0xd2);
    let fx = proof_fixture(other);

    // Everything built for the vector digest: the delegate signature is the
    // first check to fail.
    let blob = build_proof(&fx, VECTOR_DIGEST, VECTOR_DIGEST);
    assert_eq!(
        verify_sc_delegation_proof(&blob, &fx.ctx),
        Err(ProofError::InvalidDelegateSignature)
    );

    // Session key signs the expected digest but the delegation stays bound
    // to the old one: the caveat binding is what fails.
    let blob = build_proof(&fx, VECTOR_DIGEST, other);
    assert_eq!(
        verify_sc_delegation_proof(&blob, &fx.ctx),
        Err(ProofError::CaveatDigestMismatch)
    );
}

#[test]
fn wrong_authorizer_breaks_the_chain() {
    let fx = proof_fixture(VECTOR_DIGEST);
    let blob = build_proof(&fx, VECTOR_DIGEST, VECTOR_DIGEST);

    let mut ctx = fx.ctx;
    ctx.authorizer = address!("9999999999999999999999999999999999999999");
    assert_eq!(
        verify_sc_delegation_proof(&blob, &ctx),
        Err(ProofError::BrokenDelegationChain)
    );
}

#[test]
fn empty_delegation_chain_is_broken() {
    let fx = proof_fixture(VECTOR_DIGEST);
    let delegate = k1::address_of(fx.session_key.verifying_key());
    let delegate_signature = k1::sign_k1(VECTOR_DIGEST, &fx.session_key).unwrap();
    let blob =
        encode_sc_delegation_proof(delegate, &delegate_signature, &encode_delegations(&[]));
    assert_eq!(
        verify_sc_delegation_proof(&blob, &fx.ctx),
        Err(ProofError::BrokenDelegationChain)
    );
}

#[test]
fn tampered_delegator_signature_is_detected() {
    let fx = proof_fixture(VECTOR_DIGEST);

    let mut delegation = digest_bound_delegation(
        VECTOR_DIGEST,
        k1::address_of(fx.session_key.verifying_key()),
        fx.ctx.authorizer,
        fx.ctx.enforcer,
        U256::from(1u64),
    );
    // Signed by a key that is not the delegator.
    sign_delegation_k1(&mut delegation, fx.ctx.delegation_manager, fx.ctx.chain_id, &key(0x33))
        .unwrap();
    let blob = build_sc_delegation_proof(VECTOR_DIGEST, &fx.session_key, &[delegation]).unwrap();

    assert_eq!(
        verify_sc_delegation_proof(&blob, &fx.ctx),
        Err(ProofError::InvalidDelegatorSignature)
    );
}

#[test]
fn contract_delegator_signature_is_left_to_the_chain() {
    // Non-65-byte delegation signatures cannot be checked locally; the
    // structural checks still apply and the proof passes pre-flight.
    let fx = proof_fixture(VECTOR_DIGEST);
    let mut delegation = digest_bound_delegation(
        VECTOR_DIGEST,
        k1::address_of(fx.session_key.verifying_key()),
        fx.ctx.authorizer,
        fx.ctx.enforcer,
        U256::from(1u64),
    );
    delegation.signature = Bytes::from(vec![0xab; 96]);
    let blob = build_sc_delegation_proof(VECTOR_DIGEST, &fx.session_key, &[delegation]).unwrap();
    assert_eq!(verify_sc_delegation_proof(&blob, &fx.ctx), Ok(()));
}

#[test]
fn redelegation_requires_delegator_continuity() {
    let fx = proof_fixture(VECTOR_DIGEST);
    let intermediate_key = key(0x55);
    let intermediate = k1::address_of(intermediate_key.verifying_key());
    let outsider_key = key(0x66);
    let outsider = k1::address_of(outsider_key.verifying_key());
    let session = k1::address_of(fx.session_key.verifying_key());

    // Root: authorizer -> intermediate.
    let mut root = digest_bound_delegation(
        VECTOR_DIGEST,
        intermediate,
        fx.ctx.authorizer,
        fx.ctx.enforcer,
        U256::from(1u64),
    );
    sign_delegation_k1(&mut root, fx.ctx.delegation_manager, fx.ctx.chain_id, &fx.delegator_key)
        .unwrap();

    // Leaf issued by a key the root never delegated to. The authority hash
    // and both signatures are otherwise valid.
    let mut leaf = digest_bound_delegation(
        VECTOR_DIGEST,
        session,
        outsider,
        fx.ctx.enforcer,
        U256::from(2u64),
    );
    leaf.authority = delegation_struct_hash(&root);
    sign_delegation_k1(&mut leaf, fx.ctx.delegation_manager, fx.ctx.chain_id, &outsider_key)
        .unwrap();

    let blob = build_sc_delegation_proof(VECTOR_DIGEST, &fx.session_key, &[leaf, root]).unwrap();
    assert_eq!(
        verify_sc_delegation_proof(&blob, &fx.ctx),
        Err(ProofError::BrokenDelegationChain)
    );
}

#[test]
fn non_leaf_digest_caveat_must_match() {
    let fx = proof_fixture(VECTOR_DIGEST);
    let intermediate_key = key(0x55);
    let intermediate = k1::address_of(intermediate_key.verifying_key());
    let session = k1::address_of(fx.session_key.verifying_key());

    // The root's digest-binding caveat disagrees with the leaf's.
    let mut root = digest_bound_delegation(
        B256::repeat_byte(0xd2),
        intermediate,
        fx.ctx.authorizer,
        fx.ctx.enforcer,
        U256::from(1u64),
    );
    sign_delegation_k1(&mut root, fx.ctx.delegation_manager, fx.ctx.chain_id, &fx.delegator_key)
        .unwrap();

    let mut leaf = digest_bound_delegation(
        VECTOR_DIGEST,
        session,
        intermediate,
        fx.ctx.enforcer,
        U256::from(2u64),
    );
    leaf.authority = delegation_struct_hash(&root);
    sign_delegation_k1(&mut leaf, fx.ctx.delegation_manager, fx.ctx.chain_id, &intermediate_key)
        .unwrap();

    let blob = build_sc_delegation_proof(VECTOR_DIGEST, &fx.session_key, &[leaf, root]).unwrap();
    assert_eq!(
        verify_sc_delegation_proof(&blob, &fx.ctx),
        Err(ProofError::CaveatDigestMismatch)
    );
}

#[test]
fn redelegation_chain_verifies_and_breaks() {
    let fx = proof_fixture(VECTOR_DIGEST);
    let intermediate_key = key(0x55);
    let intermediate = k1::address_of(intermediate_key.verifying_key());
    let session = k1::address_of(fx.session_key.verifying_key());

    // Root: authorizer -> intermediate.
    let mut root = digest_bound_delegation(
        VECTOR_DIGEST,
        intermediate,
        fx.ctx.authorizer,
        fx.ctx.enforcer,
        U256::from(1u64),
    );
    sign_delegation_k1(&mut root, fx.ctx.delegation_manager, fx.ctx.chain_id, &fx.delegator_key)
        .unwrap();

    // Leaf: intermediate -> session key, authority = root's struct hash.
    let mut leaf = digest_bound_delegation(
        VECTOR_DIGEST,
        session,
        intermediate,
        fx.ctx.enforcer,
        U256::from(2u64),
    );
    leaf.authority = delegation_struct_hash(&root);
    sign_delegation_k1(&mut leaf, fx.ctx.delegation_manager, fx.ctx.chain_id, &intermediate_key)
        .unwrap();

    let chain = vec![leaf.clone(), root.clone()];
    let blob = build_sc_delegation_proof(VECTOR_DIGEST, &fx.session_key, &chain).unwrap();
    assert_eq!(verify_sc_delegation_proof(&blob, &fx.ctx), Ok(()));

    // Severing the authority link breaks the chain.
    let mut bad_leaf = leaf;
    bad_leaf.authority = B256::repeat_byte(0x77);
    sign_delegation_k1(&mut bad_leaf, fx.ctx.delegation_manager, fx.ctx.chain_id, &intermediate_key)
        .unwrap();
    let blob = build_sc_delegation_proof(VECTOR_DIGEST, &fx.session_key, &[bad_leaf, root]).unwrap();
    assert_eq!(
        verify_sc_delegation_proof(&blob, &fx.ctx),
        Err(ProofError::BrokenDelegationChain)
    );
}
