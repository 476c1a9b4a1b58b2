//! Association record and SAR construction.

use alloy_primitives::{Address, Bytes, FixedBytes};
use erc8092_types::record::{AssociationRecord, RecordError, SignedAssociationRecord};
use k256::ecdsa::SigningKey;

use crate::{eip712, erc7930, k1};

/// Errors building a signed association record.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BuildError {
    Record(RecordError),
    Signing,
}

impl From<RecordError> for BuildError {
    fn from(err: RecordError) -> Self {
        BuildError::Record(err)
    }
}

/// Inputs for a new association record. `valid_until = 0` means no expiry;
/// an all-zero `interface_id` marks `data` as untyped.
#[derive(Clone, Debug)]
pub struct RecordParams {
    pub chain_id: u64,
    pub initiator_address: Address,
    pub approver_address: Address,
    pub valid_at: u64,
    pub valid_until: u64,
    pub interface_id: FixedBytes<4>,
    pub data: Bytes,
}

/// Encode both sides as interoperable addresses and validate field ranges.
pub fn new_association_record(params: &RecordParams) -> Result<AssociationRecord, RecordError> {
    let record = AssociationRecord {
        initiator: erc7930::format_evm_v1(params.chain_id, params.initiator_address),
        approver: erc7930::format_evm_v1(params.chain_id, params.approver_address),
        valid_at: params.valid_at,
        valid_until: params.valid_until,
        interface_id: params.interface_id,
        data: params.data.clone(),
    };
    record.validate()?;
    Ok(record)
}

/// Build a SAR, K1-signing whichever side(s) the signer's address matches.
/// Unsigned sides carry empty signature bytes until the counterparty (or a
/// delegation proof) fills them in.
pub fn build_signed_association(
    record: AssociationRecord,
    initiator_key_type: FixedBytes<2>,
    approver_key_type: FixedBytes<2>,
    signer: Option<&SigningKey>,
) -> Result<SignedAssociationRecord, BuildError> {
    let mut initiator_signature = Bytes::new();
    let mut approver_signature = Bytes::new();

    if let Some(key) = signer {
        let digest = eip712::digest(&record)?;
        let signer_address = k1::address_of(key.verifying_key());
        let side_matches = |bytes: &Bytes| {
            erc7930::try_parse_evm_v1(bytes).is_some_and(|ia| ia.address == signer_address)
        };

        if side_matches(&record.initiator) {
            initiator_signature =
                k1::sign_k1(digest, key).map_err(|_| BuildError::Signing)?.to_vec().into();
        }
        if side_matches(&record.approver) {
            approver_signature =
                k1::sign_k1(digest, key).map_err(|_| BuildError::Signing)?.to_vec().into();
        }
    }

    Ok(SignedAssociationRecord {
        revoked_at: 0,
        initiator_key_type,
        approver_key_type,
        initiator_signature,
        approver_signature,
        record,
    })
}
