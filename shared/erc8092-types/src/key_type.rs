use alloy_primitives::{fixed_bytes, FixedBytes};

/// Plain secp256k1 key; signs the raw association digest.
pub const KEY_TYPE_K1: FixedBytes<2> = fixed_bytes!("0001");
/// Contract signature validated via ERC-1271 `isValidSignature`.
pub const KEY_TYPE_ERC1271: FixedBytes<2> = fixed_bytes!("8002");
/// Historical counterfactual-contract signature scheme (ERC-6492).
pub const KEY_TYPE_ERC6492: FixedBytes<2> = fixed_bytes!("8003");
/// Session-key signature plus a delegation chain from the account.
pub const KEY_TYPE_SC_DELEGATION: FixedBytes<2> = fixed_bytes!("8004");

/// Verification strategy selected by a signature's 2-byte tag.
///
/// This is a closed, versioned set; adding a tag is a protocol change, so
/// unknown tags are an error rather than a catch-all variant.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum KeyType {
    K1,
    Erc1271,
    Erc6492,
    ScDelegation,
}

/// A 2-byte tag outside the registered set.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct UnknownKeyType(pub FixedBytes<2>);

impl KeyType {
    pub fn tag(self) -> FixedBytes<2> {
        match self {
            KeyType::K1 => KEY_TYPE_K1,
            KeyType::Erc1271 => KEY_TYPE_ERC1271,
            KeyType::Erc6492 => KEY_TYPE_ERC6492,
            KeyType::ScDelegation => KEY_TYPE_SC_DELEGATION,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            KeyType::K1 => "K1 (EOA)",
            KeyType::Erc1271 => "ERC-1271 (Smart Account)",
            KeyType::Erc6492 => "ERC-6492",
            KeyType::ScDelegation => "SC-DELEGATION",
        }
    }
}

impl TryFrom<FixedBytes<2>> for KeyType {
    type Error = UnknownKeyType;

    fn try_from(tag: FixedBytes<2>) -> Result<Self, Self::Error> {
        match tag {
            KEY_TYPE_K1 => Ok(KeyType::K1),
            KEY_TYPE_ERC1271 => Ok(KeyType::Erc1271),
            KEY_TYPE_ERC6492 => Ok(KeyType::Erc6492),
            KEY_TYPE_SC_DELEGATION => Ok(KeyType::ScDelegation),
            other => Err(UnknownKeyType(other)),
        }
    }
}
