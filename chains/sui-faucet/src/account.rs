//! Account Factory - fresh Sui identities per cycle
//!
//! A 12-word BIP-39 phrase is drawn from OS entropy, the Ed25519 key is
//! derived with SLIP-0010 at `m/44'/784'/0'/0'/0'` and the address is
//! `blake2b-256(flag || public_key)`.

use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use bip39::Mnemonic;
use blake2::{digest::consts::U32, Blake2b, Digest};
use core_logic::WalletError;
use ed25519_dalek::{Signer, SigningKey};
use hmac::{Hmac, Mac};
use rand::RngCore;
use sha2::Sha512;
use std::fmt;
use zeroize::Zeroizing;

type Blake2b256 = Blake2b<U32>;
type HmacSha512 = Hmac<Sha512>;

pub const SUI_DERIVATION_PATH: &str = "m/44'/784'/0'/0'/0'";
const SUI_PATH_INDICES: [u32; 5] = [44, 784, 0, 0, 0];
const HARDENED_OFFSET: u32 = 0x8000_0000;
const ED25519_FLAG: u8 = 0x00;
/// Intent prefix for a transaction: scope, version, app id
const TRANSACTION_INTENT: [u8; 3] = [0, 0, 0];

/// A generated account: seed phrase, address and the signing key.
///
/// Key material is zeroized on drop and never shows up in `Debug`.
pub struct AccountIdentity {
    mnemonic: Zeroizing<String>,
    address: String,
    signing_key: SigningKey,
}

impl fmt::Debug for AccountIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountIdentity")
            .field("address", &self.address)
            .field("mnemonic", &"***REDACTED***")
            .finish()
    }
}

impl AccountIdentity {
    pub fn mnemonic(&self) -> &str {
        &self.mnemonic
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    /// Last four address characters, used to tag log lines of one cycle.
    pub fn short_tag(&self) -> &str {
        let start = self.address.len().saturating_sub(4);
        &self.address[start..]
    }

    pub fn public_key_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Signs transaction bytes under the transaction intent.
    ///
    /// Returns the base64 `flag || signature || public_key` form the RPC expects.
    pub fn sign_transaction(&self, tx_bytes: &[u8]) -> String {
        let mut hasher = Blake2b256::new();
        hasher.update(TRANSACTION_INTENT);
        hasher.update(tx_bytes);
        let digest = hasher.finalize();

        let signature = self.signing_key.sign(&digest);

        let mut serialized = Vec::with_capacity(1 + 64 + 32);
        serialized.push(ED25519_FLAG);
        serialized.extend_from_slice(&signature.to_bytes());
        serialized.extend_from_slice(&self.public_key_bytes());
        BASE64.encode(serialized)
    }
}

/// Generates identities. Pure: no I/O, no retained state.
#[derive(Debug, Clone, Copy)]
pub struct AccountFactory {
    word_count: usize,
}

impl Default for AccountFactory {
    fn default() -> Self {
        Self { word_count: 12 }
    }
}

impl AccountFactory {
    /// 12 or 24 words
    pub fn with_word_count(word_count: usize) -> Result<Self, WalletError> {
        match word_count {
            12 | 24 => Ok(Self { word_count }),
            other => Err(WalletError::InvalidMnemonic {
                reason: format!("unsupported word count {}", other),
            }),
        }
    }

    pub fn create(&self) -> Result<AccountIdentity, WalletError> {
        // 4 bytes of entropy per 3 words
        let mut entropy = Zeroizing::new(vec![0u8; self.word_count / 3 * 4]);
        rand::rngs::OsRng.fill_bytes(&mut entropy);

        let mnemonic = Mnemonic::from_entropy(&entropy).map_err(|e| WalletError::InvalidMnemonic {
            reason: e.to_string(),
        })?;

        Self::identity_from(&mnemonic)
    }

    /// Deterministic half of `create`.
    pub fn from_mnemonic(&self, phrase: &str) -> Result<AccountIdentity, WalletError> {
        let mnemonic = Mnemonic::parse(phrase.trim()).map_err(|e| WalletError::InvalidMnemonic {
            reason: e.to_string(),
        })?;

        Self::identity_from(&mnemonic)
    }

    fn identity_from(mnemonic: &Mnemonic) -> Result<AccountIdentity, WalletError> {
        let seed = Zeroizing::new(mnemonic.to_seed(""));
        let secret = derive_ed25519_key(&seed[..], &SUI_PATH_INDICES)?;

        let signing_key = SigningKey::from_bytes(&secret);
        let address = sui_address(&signing_key.verifying_key().to_bytes());

        Ok(AccountIdentity {
            mnemonic: Zeroizing::new(mnemonic.to_string()),
            address,
            signing_key,
        })
    }
}

/// SLIP-0010 Ed25519 derivation, hardened steps only.
fn derive_ed25519_key(seed: &[u8], path: &[u32]) -> Result<Zeroizing<[u8; 32]>, WalletError> {
    let derivation_error = |reason: String| WalletError::DerivationFailed {
        path: SUI_DERIVATION_PATH.to_string(),
        reason,
    };

    let mut mac = HmacSha512::new_from_slice(b"ed25519 seed")
        .map_err(|e| derivation_error(e.to_string()))?;
    mac.update(seed);
    let master = mac.finalize().into_bytes();

    let mut key = Zeroizing::new([0u8; 32]);
    let mut chain_code = Zeroizing::new([0u8; 32]);
    key.copy_from_slice(&master[..32]);
    chain_code.copy_from_slice(&master[32..]);

    for index in path {
        let mut mac = HmacSha512::new_from_slice(&chain_code[..])
            .map_err(|e| derivation_error(e.to_string()))?;
        mac.update(&[0u8]);
        mac.update(&key[..]);
        mac.update(&(index | HARDENED_OFFSET).to_be_bytes());
        let child = mac.finalize().into_bytes();

        key.copy_from_slice(&child[..32]);
        chain_code.copy_from_slice(&child[32..]);
    }

    Ok(key)
}

fn sui_address(public_key: &[u8; 32]) -> String {
    let mut hasher = Blake2b256::new();
    hasher.update([ED25519_FLAG]);
    hasher.update(public_key);
    format!("0x{}", hex::encode(hasher.finalize()))
}
