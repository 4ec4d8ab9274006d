#![doc = include_str!("../README.md")]
#![forbid(unsafe_code)]
#![warn(
    clippy::panic,
    clippy::panic_in_result_fn,
    clippy::unwrap_used,
    missing_docs,
    rust_2018_idioms,
    unused_lifetimes,
    unused_qualifications
)]

mod content;
mod ecdh;
mod sign;
mod wrap;

use jose_jwa::{EncAlg, JweAlg, JwsAlg};
use jose_jwk::Jwk;
use rand_core::{CryptoRng, RngCore};

/// Errors a [`CryptoBackend`] operation can fail with.
///
/// Deliberately coarse: signature/tag/key failures collapse into a single
/// opaque outcome at the object layer so callers cannot distinguish "wrong
/// key" from "corrupted ciphertext" from timing side channels.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CryptoError {
    /// The key's type or size does not match what the algorithm requires
    /// (e.g. an EC key presented for `alg: "HS256"`, or a P-256 key for
    /// `alg: "ES384"`).
    #[error("key is not valid for this algorithm")]
    KeyMismatch,
    /// A signature, MAC, or authentication tag failed to verify.
    #[error("integrity check failed")]
    IntegrityFailure,
    /// A lower-level cryptographic operation rejected its input (bad
    /// padding, invalid point, wrong length, RNG failure, ...).
    #[error("cryptographic operation failed")]
    OperationFailed,
    /// This algorithm is not implemented by this backend.
    #[error("algorithm not supported: {0}")]
    Unsupported(alloc::string::String),
}

extern crate alloc;

/// The additional per-message parameters a key-wrap/agreement algorithm
/// reads from and writes to the JWE header.
///
/// This mirrors the relevant subset of a JWE header without depending on
/// `jose-header`, keeping the dependency graph from this crate to the
/// object crates one-directional. `jose-jwe` translates between its
/// `JweHeader` and this struct at the call boundary.
#[derive(Clone, Debug, Default)]
pub struct WrapParams {
    /// Ephemeral public key (ECDH-ES), present on both wrap and unwrap.
    pub epk: Option<Jwk>,
    /// Agreement PartyUInfo (ECDH-ES).
    pub apu: Option<alloc::vec::Vec<u8>>,
    /// Agreement PartyVInfo (ECDH-ES).
    pub apv: Option<alloc::vec::Vec<u8>>,
    /// PBES2 salt input; combined with `alg` to form the full salt.
    pub p2s: Option<alloc::vec::Vec<u8>>,
    /// PBES2 iteration count.
    pub p2c: Option<u64>,
    /// AES-GCM key wrap initialization vector.
    pub iv: Option<alloc::vec::Vec<u8>>,
    /// AES-GCM key wrap authentication tag.
    pub tag: Option<alloc::vec::Vec<u8>>,
    /// The CEK as derived directly by key agreement, for `alg: "ECDH-ES"`
    /// (RFC7518 §4.6.1). Unlike every other algorithm, direct ECDH-ES
    /// doesn't wrap a caller-supplied CEK: the agreed key *is* the CEK, so
    /// [`CryptoBackend::wrap_key`] has nothing to put in its `Vec<u8>`
    /// return value (which stays empty) and instead reports the derived
    /// key here for the caller to use in place of a generated one.
    pub derived_cek: Option<alloc::vec::Vec<u8>>,
}

/// The single seam between the JOSE object model and real cryptography.
///
/// Every method takes the algorithm and key explicitly rather than
/// assuming a single global provider, so a caller can swap in a
/// hardware-backed or audited implementation without touching
/// `jose-jws`/`jose-jwe`.
pub trait CryptoBackend {
    /// Compute a signature/MAC over `signing_input` for the JWS algorithm
    /// `alg`, using `key`. Returns [`CryptoError::Unsupported`] for `alg:
    /// "none"`; callers must special-case the unsecured JWS themselves.
    fn sign(&self, alg: &JwsAlg, key: &Jwk, signing_input: &[u8]) -> Result<alloc::vec::Vec<u8>, CryptoError>;

    /// Verify a signature/MAC computed by [`Self::sign`].
    fn verify(
        &self,
        alg: &JwsAlg,
        key: &Jwk,
        signing_input: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError>;

    /// Generate a fresh Content Encryption Key of the length `enc`
    /// requires.
    fn generate_cek(&self, enc: &EncAlg) -> alloc::vec::Vec<u8>;

    /// Generate a fresh IV/nonce of the length `enc` requires.
    fn generate_iv(&self, enc: &EncAlg) -> alloc::vec::Vec<u8>;

    /// Encrypt `plaintext` under `cek` with content encryption algorithm
    /// `enc`, returning `(ciphertext, authentication_tag)`.
    fn encrypt_content(
        &self,
        enc: &EncAlg,
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<(alloc::vec::Vec<u8>, alloc::vec::Vec<u8>), CryptoError>;

    /// Decrypt and verify ciphertext produced by [`Self::encrypt_content`].
    fn decrypt_content(
        &self,
        enc: &EncAlg,
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<alloc::vec::Vec<u8>, CryptoError>;

    /// Wrap/derive the CEK for JWE key management algorithm `alg`,
    /// writing any per-message parameters the algorithm needs (`epk`,
    /// `apu`/`apv`, `p2s`/`p2c`, GCM `iv`/`tag`) into `params`. Returns the
    /// JWE Encrypted Key (empty for `alg: "dir"` and the `ECDH-ES` direct
    /// variant).
    fn wrap_key(
        &self,
        alg: &JweAlg,
        enc: &EncAlg,
        key: &Jwk,
        cek: &[u8],
        params: &mut WrapParams,
    ) -> Result<alloc::vec::Vec<u8>, CryptoError>;

    /// Recover the CEK from a JWE Encrypted Key produced by
    /// [`Self::wrap_key`], reading whatever per-message parameters that
    /// algorithm needs out of `params`.
    fn unwrap_key(
        &self,
        alg: &JweAlg,
        enc: &EncAlg,
        key: &Jwk,
        encrypted_key: &[u8],
        params: &WrapParams,
    ) -> Result<alloc::vec::Vec<u8>, CryptoError>;
}

/// The default [`CryptoBackend`], implemented on the RustCrypto crates.
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultBackend;

impl CryptoBackend for DefaultBackend {
    fn sign(&self, alg: &JwsAlg, key: &Jwk, signing_input: &[u8]) -> Result<alloc::vec::Vec<u8>, CryptoError> {
        sign::sign(alg, key, signing_input)
    }

    fn verify(
        &self,
        alg: &JwsAlg,
        key: &Jwk,
        signing_input: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        sign::verify(alg, key, signing_input, signature)
    }

    fn generate_cek(&self, enc: &EncAlg) -> alloc::vec::Vec<u8> {
        content::generate_random(enc.cek_len().unwrap_or(32), &mut rand::thread_rng())
    }

    fn generate_iv(&self, enc: &EncAlg) -> alloc::vec::Vec<u8> {
        content::generate_random(enc.iv_len().unwrap_or(12), &mut rand::thread_rng())
    }

    fn encrypt_content(
        &self,
        enc: &EncAlg,
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<(alloc::vec::Vec<u8>, alloc::vec::Vec<u8>), CryptoError> {
        content::encrypt(enc, cek, iv, aad, plaintext)
    }

    fn decrypt_content(
        &self,
        enc: &EncAlg,
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<alloc::vec::Vec<u8>, CryptoError> {
        content::decrypt(enc, cek, iv, aad, ciphertext, tag)
    }

    fn wrap_key(
        &self,
        alg: &JweAlg,
        enc: &EncAlg,
        key: &Jwk,
        cek: &[u8],
        params: &mut WrapParams,
    ) -> Result<alloc::vec::Vec<u8>, CryptoError> {
        wrap::wrap(alg, enc, key, cek, params, &mut rand::thread_rng())
    }

    fn unwrap_key(
        &self,
        alg: &JweAlg,
        enc: &EncAlg,
        key: &Jwk,
        encrypted_key: &[u8],
        params: &WrapParams,
    ) -> Result<alloc::vec::Vec<u8>, CryptoError> {
        wrap::unwrap(alg, enc, key, encrypted_key, params)
    }
}

/// Wraps another [`CryptoBackend`] and replaces its randomness with a
/// fixed byte stream, so deterministic test vectors (a pinned CEK, IV, or
/// ephemeral key) can be reproduced exactly.
///
/// Once the fixed bytes are exhausted, further reads panic: this backend
/// is for tests, not general use.
pub struct FixedRngBackend<B> {
    inner: B,
    rng: core::cell::RefCell<FixedRng>,
}

impl<B> FixedRngBackend<B> {
    /// Wrap `inner`, serving `bytes` (cycled as needed per call, never
    /// reused within a single generation) as randomness.
    pub fn new(inner: B, bytes: alloc::vec::Vec<u8>) -> Self {
        Self {
            inner,
            rng: core::cell::RefCell::new(FixedRng { bytes, pos: 0 }),
        }
    }
}

struct FixedRng {
    bytes: alloc::vec::Vec<u8>,
    pos: usize,
}

impl RngCore for FixedRng {
    fn next_u32(&mut self) -> u32 {
        let mut buf = [0u8; 4];
        self.fill_bytes(&mut buf);
        u32::from_le_bytes(buf)
    }

    fn next_u64(&mut self) -> u64 {
        let mut buf = [0u8; 8];
        self.fill_bytes(&mut buf);
        u64::from_le_bytes(buf)
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        for byte in dest {
            *byte = self.bytes[self.pos % self.bytes.len()];
            self.pos += 1;
        }
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand_core::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

impl CryptoRng for FixedRng {}

impl<B: CryptoBackend> CryptoBackend for FixedRngBackend<B> {
    fn sign(&self, alg: &JwsAlg, key: &Jwk, signing_input: &[u8]) -> Result<alloc::vec::Vec<u8>, CryptoError> {
        self.inner.sign(alg, key, signing_input)
    }

    fn verify(
        &self,
        alg: &JwsAlg,
        key: &Jwk,
        signing_input: &[u8],
        signature: &[u8],
    ) -> Result<(), CryptoError> {
        self.inner.verify(alg, key, signing_input, signature)
    }

    fn generate_cek(&self, enc: &EncAlg) -> alloc::vec::Vec<u8> {
        content::generate_random(enc.cek_len().unwrap_or(32), &mut *self.rng.borrow_mut())
    }

    fn generate_iv(&self, enc: &EncAlg) -> alloc::vec::Vec<u8> {
        content::generate_random(enc.iv_len().unwrap_or(12), &mut *self.rng.borrow_mut())
    }

    fn encrypt_content(
        &self,
        enc: &EncAlg,
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
        plaintext: &[u8],
    ) -> Result<(alloc::vec::Vec<u8>, alloc::vec::Vec<u8>), CryptoError> {
        self.inner.encrypt_content(enc, cek, iv, aad, plaintext)
    }

    fn decrypt_content(
        &self,
        enc: &EncAlg,
        cek: &[u8],
        iv: &[u8],
        aad: &[u8],
        ciphertext: &[u8],
        tag: &[u8],
    ) -> Result<alloc::vec::Vec<u8>, CryptoError> {
        self.inner.decrypt_content(enc, cek, iv, aad, ciphertext, tag)
    }

    fn wrap_key(
        &self,
        alg: &JweAlg,
        enc: &EncAlg,
        key: &Jwk,
        cek: &[u8],
        params: &mut WrapParams,
    ) -> Result<alloc::vec::Vec<u8>, CryptoError> {
        wrap::wrap(alg, enc, key, cek, params, &mut *self.rng.borrow_mut())
    }

    fn unwrap_key(
        &self,
        alg: &JweAlg,
        enc: &EncAlg,
        key: &Jwk,
        encrypted_key: &[u8],
        params: &WrapParams,
    ) -> Result<alloc::vec::Vec<u8>, CryptoError> {
        self.inner.unwrap_key(alg, enc, key, encrypted_key, params)
    }
}
