use alloc::vec::Vec;

use jose_jwa::{EcCurve, OkpCurve};
use jose_jwk::{Ec, Key, Okp};
use sha2::{Digest, Sha256};

use crate::CryptoError;

/// NIST SP800-56A §5.8.1 Concat KDF, fixed to SHA-256 per RFC7518 §4.6.
///
/// `other_info` is the caller-assembled `AlgorithmID || PartyUInfo ||
/// PartyVInfo || SuppPubInfo` (RFC7518 §4.6.2); `key_data_len` is the
/// number of output bytes to produce.
pub(crate) fn concat_kdf(shared_secret: &[u8], other_info: &[u8], key_data_len: usize) -> Vec<u8> {
    let mut output = Vec::with_capacity(key_data_len);
    let mut counter: u32 = 1;
    while output.len() < key_data_len {
        let mut hasher = Sha256::new();
        hasher.update(counter.to_be_bytes());
        hasher.update(shared_secret);
        hasher.update(other_info);
        output.extend_from_slice(&hasher.finalize());
        counter += 1;
    }
    output.truncate(key_data_len);
    output
}

/// Assemble the `OtherInfo` Concat KDF input per RFC7518 §4.6.2.
pub(crate) fn other_info(alg_id: &str, apu: &[u8], apv: &[u8], key_data_len_bits: u32) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(&(alg_id.len() as u32).to_be_bytes());
    out.extend_from_slice(alg_id.as_bytes());
    out.extend_from_slice(&(apu.len() as u32).to_be_bytes());
    out.extend_from_slice(apu);
    out.extend_from_slice(&(apv.len() as u32).to_be_bytes());
    out.extend_from_slice(apv);
    out.extend_from_slice(&key_data_len_bits.to_be_bytes());
    out
}

/// Compute the ECDH shared secret (the raw agreed `Z` value, before
/// Concat KDF) between a local private key and a remote public key. Both
/// must be the same key type and curve.
pub(crate) fn shared_secret(local_private: &Key, remote_public: &Key) -> Result<Vec<u8>, CryptoError> {
    match (local_private, remote_public) {
        (Key::Ec(local), Key::Ec(remote)) if local.crv == remote.crv => match local.crv {
            EcCurve::P256 => ec_dh_p256(local, remote),
            EcCurve::P384 => ec_dh_p384(local, remote),
            EcCurve::P521 => ec_dh_p521(local, remote),
            EcCurve::Secp256K1 => ec_dh_k256(local, remote),
        },
        (Key::Okp(local), Key::Okp(remote))
            if local.crv == OkpCurve::X25519 && remote.crv == OkpCurve::X25519 =>
        {
            x25519_dh(local, remote)
        }
        _ => Err(CryptoError::KeyMismatch),
    }
}

macro_rules! ec_dh_impl {
    ($name:ident, $curve:ty) => {
        fn $name(local: &Ec, remote: &Ec) -> Result<Vec<u8>, CryptoError> {
            let d = local.d.as_ref().ok_or(CryptoError::KeyMismatch)?;
            let secret_scalar = elliptic_curve::NonZeroScalar::<$curve>::try_from(d.as_ref())
                .map_err(|_| CryptoError::KeyMismatch)?;
            let point = elliptic_curve::sec1::EncodedPoint::<$curve>::from_affine_coordinates(
                remote.x.as_ref().into(),
                remote.y.as_ref().into(),
                false,
            );
            let public = elliptic_curve::PublicKey::<$curve>::from_encoded_point(&point)
                .into_option()
                .ok_or(CryptoError::KeyMismatch)?;
            let shared = <$curve>::diffie_hellman(&secret_scalar, public.as_affine());
            Ok(shared.raw_secret_bytes().to_vec())
        }
    };
}

trait DiffieHellman {
    fn diffie_hellman(
        secret: &elliptic_curve::NonZeroScalar<Self>,
        public: &elliptic_curve::AffinePoint<Self>,
    ) -> elliptic_curve::ecdh::SharedSecret<Self>
    where
        Self: elliptic_curve::CurveArithmetic;
}

impl DiffieHellman for p256::NistP256 {
    fn diffie_hellman(
        secret: &elliptic_curve::NonZeroScalar<Self>,
        public: &elliptic_curve::AffinePoint<Self>,
    ) -> elliptic_curve::ecdh::SharedSecret<Self> {
        p256::ecdh::diffie_hellman(secret, public)
    }
}

impl DiffieHellman for p384::NistP384 {
    fn diffie_hellman(
        secret: &elliptic_curve::NonZeroScalar<Self>,
        public: &elliptic_curve::AffinePoint<Self>,
    ) -> elliptic_curve::ecdh::SharedSecret<Self> {
        p384::ecdh::diffie_hellman(secret, public)
    }
}

impl DiffieHellman for k256::Secp256k1 {
    fn diffie_hellman(
        secret: &elliptic_curve::NonZeroScalar<Self>,
        public: &elliptic_curve::AffinePoint<Self>,
    ) -> elliptic_curve::ecdh::SharedSecret<Self> {
        k256::ecdh::diffie_hellman(secret, public)
    }
}

impl DiffieHellman for p521::NistP521 {
    fn diffie_hellman(
        secret: &elliptic_curve::NonZeroScalar<Self>,
        public: &elliptic_curve::AffinePoint<Self>,
    ) -> elliptic_curve::ecdh::SharedSecret<Self> {
        p521::ecdh::diffie_hellman(secret, public)
    }
}

ec_dh_impl!(ec_dh_p256, p256::NistP256);
ec_dh_impl!(ec_dh_p384, p384::NistP384);
ec_dh_impl!(ec_dh_p521, p521::NistP521);
ec_dh_impl!(ec_dh_k256, k256::Secp256k1);

fn x25519_dh(local: &Okp, remote: &Okp) -> Result<Vec<u8>, CryptoError> {
    let d = local.d.as_ref().ok_or(CryptoError::KeyMismatch)?;
    let d_bytes: [u8; 32] = d.as_ref().try_into().map_err(|_| CryptoError::KeyMismatch)?;
    let x_bytes: [u8; 32] = remote
        .x
        .as_ref()
        .try_into()
        .map_err(|_| CryptoError::KeyMismatch)?;
    let secret = x25519_dalek::StaticSecret::from(d_bytes);
    let public = x25519_dalek::PublicKey::from(x_bytes);
    Ok(secret.diffie_hellman(&public).to_bytes().to_vec())
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn concat_kdf_is_deterministic() {
        let z = b"shared-secret-material";
        let info = other_info("A128GCM", b"Alice", b"Bob", 128);
        let a = concat_kdf(z, &info, 16);
        let b = concat_kdf(z, &info, 16);
        assert_eq!(a, b);
        assert_eq!(a.len(), 16);
    }

    #[test]
    fn concat_kdf_differs_by_length() {
        let z = b"shared-secret-material";
        let info = other_info("dir", b"", b"", 256);
        let short = concat_kdf(z, &info, 16);
        let long = concat_kdf(z, &info, 32);
        assert_eq!(&long[..16], &short[..]);
    }
}
