use alloy_primitives::{Address, Bytes, FixedBytes, B256, U256};
use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use k256::ecdsa::SigningKey;
use serde_json::json;

use erc8092_sdk::association::{build_signed_association, new_association_record, RecordParams};
use erc8092_sdk::delegation::{digest_bound_delegation, sign_delegation_k1};
use erc8092_sdk::proof::{
    build_sc_delegation_proof, decode_sc_delegation_proof, verify_sc_delegation_proof,
    ProofContext,
};
use erc8092_sdk::{eip712, erc7930, k1};

/// Build, sign, and verify association records and their delegation proofs
/// from the command line. Every subcommand prints machine-readable JSON so
/// the output can feed integration tooling directly.
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

/// Fields of an association record. Both parties are encoded as EVM
/// interoperable addresses on the same chain.
#[derive(Args, Debug)]
struct RecordArgs {
    /// EVM chain id for both interoperable addresses.
    #[arg(long)]
    chain_id: u64,

    /// Initiator account address (0x...).
    #[arg(long)]
    initiator: Address,

    /// Approver account address (0x...).
    #[arg(long)]
    approver: Address,

    /// Unix timestamp (seconds) the association becomes valid at.
    #[arg(long)]
    valid_at: u64,

    /// Unix timestamp (seconds) the association expires at; 0 = no expiry.
    #[arg(long, default_value_t = 0)]
    valid_until: u64,

    /// ERC-165 interface id describing `data`; all-zero = untyped.
    #[arg(long, default_value = "0x00000000")]
    interface_id: FixedBytes<4>,

    /// Application-defined payload, hex encoded.
    #[arg(long, default_value = "0x")]
    data: Bytes,
}

impl RecordArgs {
    fn params(&self) -> RecordParams {
        RecordParams {
            chain_id: self.chain_id,
            initiator_address: self.initiator,
            approver_address: self.approver,
            valid_at: self.valid_at,
            valid_until: self.valid_until,
            interface_id: self.interface_id,
            data: self.data.clone(),
        }
    }
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compute the EIP-712 digest (= association id) of a record.
    Digest(RecordArgs),

    /// K1-sign a record digest and print the 65-byte signature.
    Sign {
        #[command(flatten)]
        record: RecordArgs,

        /// Signer private key (32-byte hex, 0x...).
        #[arg(long, env = "PKEY")]
        private_key: String,
    },

    /// Build a full signed association record as JSON.
    Build {
        #[command(flatten)]
        record: RecordArgs,

        /// Initiator key type tag (2-byte hex).
        #[arg(long, default_value = "0x0001")]
        initiator_key_type: FixedBytes<2>,

        /// Approver key type tag (2-byte hex).
        #[arg(long, default_value = "0x0001")]
        approver_key_type: FixedBytes<2>,

        /// Optional K1 key; signs whichever side(s) its address matches.
        #[arg(long, env = "PKEY")]
        private_key: Option<String>,
    },

    /// Encode an EVM address as ERC-7930 interoperable-address bytes.
    FormatAddress {
        #[arg(long)]
        chain_id: u64,
        #[arg(long)]
        address: Address,
    },

    /// Decode ERC-7930 interoperable-address bytes.
    ParseAddress {
        /// Interoperable address, hex encoded.
        #[arg(long)]
        bytes: Bytes,
    },

    /// Build an SC-DELEGATION proof: a single digest-bound root delegation
    /// from the delegator to a fresh session key.
    BuildProof {
        /// Association digest the proof authorizes.
        #[arg(long)]
        digest: B256,

        /// Session private key (32-byte hex); signs the digest as delegate.
        #[arg(long)]
        session_key: String,

        /// Delegator (authorizer) private key (32-byte hex).
        #[arg(long)]
        delegator_key: String,

        /// Digest-binding caveat enforcer address.
        #[arg(long)]
        enforcer: Address,

        /// Delegation manager the delegation is signed against.
        #[arg(long)]
        delegation_manager: Address,

        #[arg(long)]
        chain_id: u64,

        /// Delegation salt.
        #[arg(long, default_value_t = 0)]
        salt: u64,
    },

    /// Decode a proof blob into its delegate, signature, and delegations.
    DecodeProof {
        /// Proof blob, hex encoded.
        #[arg(long)]
        proof: Bytes,
    },

    /// Run local verification of a proof blob against its expected context.
    VerifyProof {
        /// Proof blob, hex encoded.
        #[arg(long)]
        proof: Bytes,

        /// Association digest the proof must authorize.
        #[arg(long)]
        digest: B256,

        /// Account the root delegation must be granted by.
        #[arg(long)]
        authorizer: Address,

        /// Digest-binding caveat enforcer address.
        #[arg(long)]
        enforcer: Address,

        #[arg(long)]
        delegation_manager: Address,

        #[arg(long)]
        chain_id: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let output = match cli.command {
        Command::Digest(record) => digest_cmd(&record)?,
        Command::Sign { record, private_key } => sign_cmd(&record, &private_key)?,
        Command::Build { record, initiator_key_type, approver_key_type, private_key } => {
            build_cmd(&record, initiator_key_type, approver_key_type, private_key.as_deref())?
        }
        Command::FormatAddress { chain_id, address } => {
            json!({ "bytes": erc7930::format_evm_v1(chain_id, address) })
        }
        Command::ParseAddress { bytes } => parse_address_cmd(&bytes)?,
        Command::BuildProof {
            digest,
            session_key,
            delegator_key,
            enforcer,
            delegation_manager,
            chain_id,
            salt,
        } => build_proof_cmd(
            digest,
            &session_key,
            &delegator_key,
            enforcer,
            delegation_manager,
            chain_id,
            salt,
        )?,
        Command::DecodeProof { proof } => decode_proof_cmd(&proof)?,
        Command::VerifyProof {
            proof,
            digest,
            authorizer,
            enforcer,
            delegation_manager,
            chain_id,
        } => {
            let ctx = ProofContext {
                expected_digest: digest,
                authorizer,
                enforcer,
                delegation_manager,
                chain_id,
            };
            verify_sc_delegation_proof(&proof, &ctx)
                .map_err(|err| anyhow!("proof verification failed: {err:?}"))?;
            json!({ "valid": true })
        }
    };

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn parse_signing_key(hex_key: &str) -> Result<SigningKey> {
    let stripped = hex_key.strip_prefix("0x").unwrap_or(hex_key);
    let raw = hex::decode(stripped).context("private key is not valid hex")?;
    SigningKey::from_slice(&raw).map_err(|_| anyhow!("private key is not a valid secp256k1 scalar"))
}

fn digest_cmd(record: &RecordArgs) -> Result<serde_json::Value> {
    let record = new_association_record(&record.params())
        .map_err(|err| anyhow!("invalid record: {err:?}"))?;
    let digest = eip712::digest(&record).map_err(|err| anyhow!("invalid record: {err:?}"))?;
    Ok(json!({
        "domainSeparator": eip712::domain_separator(),
        "structHash": eip712::struct_hash(&record).map_err(|err| anyhow!("{err:?}"))?,
        "digest": digest,
        "associationId": digest,
    }))
}

fn sign_cmd(record: &RecordArgs, private_key: &str) -> Result<serde_json::Value> {
    let key = parse_signing_key(private_key)?;
    let record = new_association_record(&record.params())
        .map_err(|err| anyhow!("invalid record: {err:?}"))?;
    let digest = eip712::digest(&record).map_err(|err| anyhow!("invalid record: {err:?}"))?;
    let signature = k1::sign_k1(digest, &key).map_err(|_| anyhow!("signing failed"))?;
    Ok(json!({
        "signer": k1::address_of(key.verifying_key()),
        "digest": digest,
        "signature": format!("0x{}", hex::encode(signature)),
    }))
}

fn build_cmd(
    record: &RecordArgs,
    initiator_key_type: FixedBytes<2>,
    approver_key_type: FixedBytes<2>,
    private_key: Option<&str>,
) -> Result<serde_json::Value> {
    let record = new_association_record(&record.params())
        .map_err(|err| anyhow!("invalid record: {err:?}"))?;
    let key = private_key.map(parse_signing_key).transpose()?;
    let sar = build_signed_association(record, initiator_key_type, approver_key_type, key.as_ref())
        .map_err(|err| anyhow!("failed to build record: {err:?}"))?;
    Ok(json!({
        "associationId": eip712::association_id(&sar.record).map_err(|err| anyhow!("{err:?}"))?,
        "signedAssociation": sar,
    }))
}

fn parse_address_cmd(bytes: &Bytes) -> Result<serde_json::Value> {
    let interop = erc7930::try_parse_evm_v1(bytes)
        .ok_or_else(|| anyhow!("not a v1 EVM interoperable address"))?;
    Ok(json!({
        "chainId": interop.chain_id,
        "address": interop.address,
    }))
}

fn build_proof_cmd(
    digest: B256,
    session_key: &str,
    delegator_key: &str,
    enforcer: Address,
    delegation_manager: Address,
    chain_id: u64,
    salt: u64,
) -> Result<serde_json::Value> {
    let session_key = parse_signing_key(session_key)?;
    let delegator_key = parse_signing_key(delegator_key)?;
    let delegate = k1::address_of(session_key.verifying_key());
    let delegator = k1::address_of(delegator_key.verifying_key());

    let mut delegation =
        digest_bound_delegation(digest, delegate, delegator, enforcer, U256::from(salt));
    sign_delegation_k1(&mut delegation, delegation_manager, chain_id, &delegator_key)
        .map_err(|_| anyhow!("signing delegation failed"))?;
    let proof = build_sc_delegation_proof(digest, &session_key, &[delegation])
        .map_err(|_| anyhow!("signing digest failed"))?;

    Ok(json!({
        "delegate": delegate,
        "delegator": delegator,
        "proof": proof,
    }))
}

fn decode_proof_cmd(blob: &Bytes) -> Result<serde_json::Value> {
    let proof = decode_sc_delegation_proof(blob)
        .map_err(|err| anyhow!("failed to decode proof: {err:?}"))?;
    let delegations: Vec<serde_json::Value> = proof
        .delegations
        .iter()
        .map(|delegation| {
            json!({
                "delegate": delegation.delegate,
                "delegator": delegation.delegator,
                "authority": delegation.authority,
                "caveats": delegation
                    .caveats
                    .iter()
                    .map(|caveat| json!({
                        "enforcer": caveat.enforcer,
                        "terms": caveat.terms,
                        "args": caveat.args,
                    }))
                    .collect::<Vec<_>>(),
                "salt": delegation.salt.to_string(),
                "signature": delegation.signature,
            })
        })
        .collect();
    Ok(json!({
        "delegate": proof.delegate,
        "delegateSignature": proof.delegate_signature,
        "delegations": delegations,
    }))
}
