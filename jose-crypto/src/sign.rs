use alloc::string::ToString;
use alloc::vec::Vec;

use ecdsa::signature::{Signer, Verifier};
use hmac::{digest::KeyInit, Hmac, Mac};
use jose_jwa::{EcCurve, JwsAlg, OkpCurve};
use jose_jwk::{Jwk, Key, Rsa};
use rsa::{pkcs1v15, pss, BigUint, RsaPrivateKey, RsaPublicKey};
use sha2::{Sha256, Sha384, Sha512};

use crate::CryptoError;

pub(crate) fn sign(alg: &JwsAlg, jwk: &Jwk, input: &[u8]) -> Result<Vec<u8>, CryptoError> {
    match alg {
        JwsAlg::Hs256 => hmac_sign::<Hmac<Sha256>>(&jwk.key, input),
        JwsAlg::Hs384 => hmac_sign::<Hmac<Sha384>>(&jwk.key, input),
        JwsAlg::Hs512 => hmac_sign::<Hmac<Sha512>>(&jwk.key, input),
        JwsAlg::Rs256 => rsa_pkcs1_sign::<Sha256>(&jwk.key, input),
        JwsAlg::Rs384 => rsa_pkcs1_sign::<Sha384>(&jwk.key, input),
        JwsAlg::Rs512 => rsa_pkcs1_sign::<Sha512>(&jwk.key, input),
        JwsAlg::Ps256 => rsa_pss_sign::<Sha256>(&jwk.key, input),
        JwsAlg::Ps384 => rsa_pss_sign::<Sha384>(&jwk.key, input),
        JwsAlg::Ps512 => rsa_pss_sign::<Sha512>(&jwk.key, input),
        JwsAlg::Es256 => ec_sign_p256(&jwk.key, input),
        JwsAlg::Es256K => ec_sign_k256(&jwk.key, input),
        JwsAlg::Es384 => ec_sign_p384(&jwk.key, input),
        JwsAlg::Es512 => ec_sign_p521(&jwk.key, input),
        JwsAlg::EdDsa => eddsa_sign(&jwk.key, input),
        JwsAlg::None | JwsAlg::Other(_) => Err(CryptoError::Unsupported(alg.to_string())),
    }
}

pub(crate) fn verify(
    alg: &JwsAlg,
    jwk: &Jwk,
    input: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError> {
    match alg {
        JwsAlg::Hs256 => hmac_verify::<Hmac<Sha256>>(&jwk.key, input, signature),
        JwsAlg::Hs384 => hmac_verify::<Hmac<Sha384>>(&jwk.key, input, signature),
        JwsAlg::Hs512 => hmac_verify::<Hmac<Sha512>>(&jwk.key, input, signature),
        JwsAlg::Rs256 => rsa_pkcs1_verify::<Sha256>(&jwk.key, input, signature),
        JwsAlg::Rs384 => rsa_pkcs1_verify::<Sha384>(&jwk.key, input, signature),
        JwsAlg::Rs512 => rsa_pkcs1_verify::<Sha512>(&jwk.key, input, signature),
        JwsAlg::Ps256 => rsa_pss_verify::<Sha256>(&jwk.key, input, signature),
        JwsAlg::Ps384 => rsa_pss_verify::<Sha384>(&jwk.key, input, signature),
        JwsAlg::Ps512 => rsa_pss_verify::<Sha512>(&jwk.key, input, signature),
        JwsAlg::Es256 => ec_verify_p256(&jwk.key, input, signature),
        JwsAlg::Es256K => ec_verify_k256(&jwk.key, input, signature),
        JwsAlg::Es384 => ec_verify_p384(&jwk.key, input, signature),
        JwsAlg::Es512 => ec_verify_p521(&jwk.key, input, signature),
        JwsAlg::EdDsa => eddsa_verify(&jwk.key, input, signature),
        JwsAlg::None | JwsAlg::Other(_) => Err(CryptoError::Unsupported(alg.to_string())),
    }
}

fn oct_bytes(key: &Key) -> Result<&[u8], CryptoError> {
    match key {
        Key::Oct(oct) => Ok(oct.k.as_ref()),
        _ => Err(CryptoError::KeyMismatch),
    }
}

fn hmac_sign<M: Mac + KeyInit>(key: &Key, input: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let secret = oct_bytes(key)?;
    let mut mac = M::new_from_slice(secret).map_err(|_| CryptoError::KeyMismatch)?;
    mac.update(input);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn hmac_verify<M: Mac + KeyInit>(
    key: &Key,
    input: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError> {
    let secret = oct_bytes(key)?;
    let mut mac = M::new_from_slice(secret).map_err(|_| CryptoError::KeyMismatch)?;
    mac.update(input);
    mac.verify_slice(signature)
        .map_err(|_| CryptoError::IntegrityFailure)
}

fn rsa_private_key(key: &Key) -> Result<RsaPrivateKey, CryptoError> {
    let Key::Rsa(Rsa {
        n,
        e,
        d: Some(d),
        p,
        q,
        ..
    }) = key
    else {
        return Err(CryptoError::KeyMismatch);
    };
    let n = BigUint::from_bytes_be(n.as_ref());
    let e = BigUint::from_bytes_be(e.as_ref());
    let d = BigUint::from_bytes_be(d.as_ref());
    let mut primes = Vec::new();
    if let Some(p) = p {
        primes.push(BigUint::from_bytes_be(p.as_ref()));
    }
    if let Some(q) = q {
        primes.push(BigUint::from_bytes_be(q.as_ref()));
    }
    RsaPrivateKey::from_components(n, e, d, primes).map_err(|_| CryptoError::KeyMismatch)
}

fn rsa_public_key(key: &Key) -> Result<RsaPublicKey, CryptoError> {
    let Key::Rsa(Rsa { n, e, .. }) = key else {
        return Err(CryptoError::KeyMismatch);
    };
    let n = BigUint::from_bytes_be(n.as_ref());
    let e = BigUint::from_bytes_be(e.as_ref());
    RsaPublicKey::new(n, e).map_err(|_| CryptoError::KeyMismatch)
}

fn rsa_pkcs1_sign<D: sha2::Digest>(key: &Key, input: &[u8]) -> Result<Vec<u8>, CryptoError>
where
    pkcs1v15::SigningKey<D>: Signer<pkcs1v15::Signature>,
{
    let private = rsa_private_key(key)?;
    let signing_key = pkcs1v15::SigningKey::<D>::new(private);
    let sig = signing_key
        .try_sign(input)
        .map_err(|_| CryptoError::OperationFailed)?;
    Ok(sig.into())
}

fn rsa_pkcs1_verify<D: sha2::Digest>(
    key: &Key,
    input: &[u8],
    signature: &[u8],
) -> Result<(), CryptoError>
where
    pkcs1v15::VerifyingKey<D>: Verifier<pkcs1v15::Signature>,
{
    let public = rsa_public_key(key)?;
    let verifying_key = pkcs1v15::VerifyingKey::<D>::new(public);
    let sig =
        pkcs1v15::Signature::try_from(signature).map_err(|_| CryptoError::IntegrityFailure)?;
    verifying_key
        .verify(input, &sig)
        .map_err(|_| CryptoError::IntegrityFailure)
}

fn rsa_pss_sign<D>(key: &Key, input: &[u8]) -> Result<Vec<u8>, CryptoError>
where
    D: sha2::Digest + sha2::digest::FixedOutputReset,
    pss::SigningKey<D>: Signer<pss::Signature>,
{
    let private = rsa_private_key(key)?;
    let signing_key = pss::SigningKey::<D>::new(private);
    let sig = signing_key
        .try_sign(input)
        .map_err(|_| CryptoError::OperationFailed)?;
    Ok(sig.into())
}

fn rsa_pss_verify<D>(key: &Key, input: &[u8], signature: &[u8]) -> Result<(), CryptoError>
where
    D: sha2::Digest + sha2::digest::FixedOutputReset,
    pss::VerifyingKey<D>: Verifier<pss::Signature>,
{
    let public = rsa_public_key(key)?;
    let verifying_key = pss::VerifyingKey::<D>::new(public);
    let sig = pss::Signature::try_from(signature).map_err(|_| CryptoError::IntegrityFailure)?;
    verifying_key
        .verify(input, &sig)
        .map_err(|_| CryptoError::IntegrityFailure)
}

macro_rules! ec_impl {
    ($sign_fn:ident, $verify_fn:ident, $curve:ty, $crv:expr) => {
        fn $sign_fn(key: &Key, input: &[u8]) -> Result<Vec<u8>, CryptoError> {
            let Key::Ec(ec) = key else {
                return Err(CryptoError::KeyMismatch);
            };
            if ec.crv != $crv {
                return Err(CryptoError::KeyMismatch);
            }
            let d = ec.d.as_ref().ok_or(CryptoError::KeyMismatch)?;
            let signing_key = ecdsa::SigningKey::<$curve>::from_bytes(d.as_ref().into())
                .map_err(|_| CryptoError::KeyMismatch)?;
            let sig: ecdsa::Signature<$curve> =
                signing_key.try_sign(input).map_err(|_| CryptoError::OperationFailed)?;
            Ok(sig.to_bytes().to_vec())
        }

        fn $verify_fn(key: &Key, input: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
            let Key::Ec(ec) = key else {
                return Err(CryptoError::KeyMismatch);
            };
            if ec.crv != $crv {
                return Err(CryptoError::KeyMismatch);
            }
            let point = elliptic_curve::sec1::EncodedPoint::<$curve>::from_affine_coordinates(
                ec.x.as_ref().into(),
                ec.y.as_ref().into(),
                false,
            );
            let verifying_key = ecdsa::VerifyingKey::<$curve>::from_encoded_point(&point)
                .map_err(|_| CryptoError::KeyMismatch)?;
            let sig = ecdsa::Signature::<$curve>::from_slice(signature)
                .map_err(|_| CryptoError::IntegrityFailure)?;
            verifying_key
                .verify(input, &sig)
                .map_err(|_| CryptoError::IntegrityFailure)
        }
    };
}

ec_impl!(ec_sign_p256, ec_verify_p256, p256::NistP256, EcCurve::P256);
ec_impl!(ec_sign_p384, ec_verify_p384, p384::NistP384, EcCurve::P384);
ec_impl!(ec_sign_p521, ec_verify_p521, p521::NistP521, EcCurve::P521);
ec_impl!(ec_sign_k256, ec_verify_k256, k256::Secp256k1, EcCurve::Secp256K1);

fn eddsa_sign(key: &Key, input: &[u8]) -> Result<Vec<u8>, CryptoError> {
    let Key::Okp(okp) = key else {
        return Err(CryptoError::KeyMismatch);
    };
    if okp.crv != OkpCurve::Ed25519 {
        return Err(CryptoError::Unsupported("Ed448".into()));
    }
    let d = okp.d.as_ref().ok_or(CryptoError::KeyMismatch)?;
    let bytes: [u8; 32] = d.as_ref().try_into().map_err(|_| CryptoError::KeyMismatch)?;
    let signing_key = ed25519_dalek::SigningKey::from_bytes(&bytes);
    Ok(signing_key.sign(input).to_bytes().to_vec())
}

fn eddsa_verify(key: &Key, input: &[u8], signature: &[u8]) -> Result<(), CryptoError> {
    let Key::Okp(okp) = key else {
        return Err(CryptoError::KeyMismatch);
    };
    if okp.crv != OkpCurve::Ed25519 {
        return Err(CryptoError::Unsupported("Ed448".into()));
    }
    let x: [u8; 32] = okp.x.as_ref().try_into().map_err(|_| CryptoError::KeyMismatch)?;
    let verifying_key =
        ed25519_dalek::VerifyingKey::from_bytes(&x).map_err(|_| CryptoError::KeyMismatch)?;
    let sig_bytes: [u8; 64] = signature
        .try_into()
        .map_err(|_| CryptoError::IntegrityFailure)?;
    let sig = ed25519_dalek::Signature::from_bytes(&sig_bytes);
    verifying_key
        .verify(input, &sig)
        .map_err(|_| CryptoError::IntegrityFailure)
}
