//! Secret sealing: ChaCha20-Poly1305 under a per-service key derived from the gate's key.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use chacha20poly1305::aead::{Aead, KeyInit, Payload};
use chacha20poly1305::{ChaCha20Poly1305, Key, Nonce};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::fmt;
use zeroize::Zeroizing;

use super::{SecretRecord, VaultError, VaultResult};

const KEY_CONTEXT: &str = "marlin-bridge vault sealing key v1";
const AAD_PREFIX: &[u8] = b"marlin-vault:";
const NONCE_LEN: usize = 12;

/// 256-bit key released by a passed authentication challenge.
#[derive(Clone)]
pub struct VaultKey(Zeroizing<[u8; 32]>);

impl VaultKey {
    pub fn new(bytes: [u8; 32]) -> Self { Self(Zeroizing::new(bytes)) }

    pub fn generate() -> Self {
        let mut bytes = [0u8; 32];
        OsRng.fill_bytes(&mut bytes);
        Self::new(bytes)
    }

    /// Sub-key bound to one service identifier.
    fn for_service(&self, service: &str) -> Zeroizing<[u8; 32]> {
        let mut material = Zeroizing::new(Vec::with_capacity(32 + service.len()));
        material.extend_from_slice(&self.0[..]);
        material.extend_from_slice(service.as_bytes());
        Zeroizing::new(blake3::derive_key(KEY_CONTEXT, &material))
    }
}

impl fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("VaultKey(<redacted>)")
    }
}

/// A secret as persisted: nonce, ciphertext with tag, and a key verifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SealedSecret {
    pub nonce: String,
    pub ciphertext: String,
    /// blake3 of the sealing key. Tells a wrong key apart from a damaged entry.
    pub verifier: String,
}

impl SealedSecret {
    pub fn seal(key: &VaultKey, service: &str, secret: &SecretRecord) -> VaultResult<Self> {
        let sealing = key.for_service(service);
        let cipher = ChaCha20Poly1305::new(Key::from_slice(&sealing[..]));
        let mut nonce = [0u8; NONCE_LEN];
        OsRng.fill_bytes(&mut nonce);
        let aad = aad(service);
        let ciphertext = cipher
            .encrypt(Nonce::from_slice(&nonce), Payload { msg: secret.as_bytes(), aad: &aad })
            .map_err(|e| VaultError::Unavailable(format!("seal: {e}")))?;

        Ok(Self {
            nonce: STANDARD.encode(nonce),
            ciphertext: STANDARD.encode(ciphertext),
            verifier: verifier(&sealing),
        })
    }

    pub fn open(&self, key: &VaultKey, service: &str) -> VaultResult<SecretRecord> {
        let sealing = key.for_service(service);
        if verifier(&sealing) != self.verifier {
            return Err(VaultError::WrongKey);
        }
        let nonce = STANDARD
            .decode(&self.nonce)
            .map_err(|e| VaultError::Corrupt(format!("nonce base64: {e}")))?;
        if nonce.len() != NONCE_LEN {
            return Err(VaultError::Corrupt("invalid nonce length".into()));
        }
        let ciphertext = STANDARD
            .decode(&self.ciphertext)
            .map_err(|e| VaultError::Corrupt(format!("ciphertext base64: {e}")))?;

        let cipher = ChaCha20Poly1305::new(Key::from_slice(&sealing[..]));
        let aad = aad(service);
        let plaintext = cipher
            .decrypt(Nonce::from_slice(&nonce), Payload { msg: &ciphertext, aad: &aad })
            .map_err(|_| VaultError::Corrupt("authentication tag mismatch".into()))?;
        Ok(SecretRecord::new(plaintext))
    }
}

fn aad(service: &str) -> Vec<u8> {
    [AAD_PREFIX, service.as_bytes()].concat()
}

fn verifier(sealing: &[u8; 32]) -> String {
    blake3::hash(sealing).to_hex().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opens_with_the_same_key_only() {
        let key = VaultKey::generate();
        let sealed = SealedSecret::seal(&key, "eCashWallet", &SecretRecord::from("legal winner")).expect("seal");

        let opened = sealed.open(&key, "eCashWallet").expect("open");
        assert_eq!(opened.as_str(), Some("legal winner"));
        assert!(matches!(sealed.open(&VaultKey::generate(), "eCashWallet"), Err(VaultError::WrongKey)));
    }

    #[test]
    fn bound_to_service() {
        let key = VaultKey::generate();
        let sealed = SealedSecret::seal(&key, "eCashWallet", &SecretRecord::from("seed")).expect("seal");
        assert!(sealed.open(&key, "otherWallet").is_err());
    }

    #[test]
    fn ciphertext_is_not_an_encoding_of_the_secret() {
        let key = VaultKey::new([7u8; 32]);
        let sealed = SealedSecret::seal(&key, "eCashWallet", &SecretRecord::from("legal winner")).expect("seal");
        let raw = STANDARD.decode(&sealed.ciphertext).expect("base64");
        assert!(!raw.windows(b"legal".len()).any(|w| w == b"legal"));
        assert_eq!(raw.len(), "legal winner".len() + 16);
    }

    #[test]
    fn tampered_ciphertext_is_corrupt() {
        let key = VaultKey::generate();
        let mut sealed = SealedSecret::seal(&key, "eCashWallet", &SecretRecord::from("seed")).expect("seal");
        let mut raw = STANDARD.decode(&sealed.ciphertext).expect("base64");
        raw[0] ^= 0x01;
        sealed.ciphertext = STANDARD.encode(raw);
        assert!(matches!(sealed.open(&key, "eCashWallet"), Err(VaultError::Corrupt(_))));
    }

    #[test]
    fn debug_hides_key() {
        assert_eq!(format!("{:?}", VaultKey::new([1u8; 32])), "VaultKey(<redacted>)");
    }
}
