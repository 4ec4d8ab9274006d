use alloc::vec::Vec;

use aes_gcm::aead::{Aead, AeadInPlace, KeyInit, Payload};
use aes_gcm::{aead::consts::U12, Aes128Gcm, AesGcm, Nonce};

type Aes192Gcm = AesGcm<aes::Aes192, U12>;
type Aes256Gcm = aes_gcm::Aes256Gcm;
use cbc::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use hmac::{Hmac, Mac};
use jose_jwa::EncAlg;
use rand_core::RngCore;
use sha2::{Sha256, Sha384, Sha512};

use crate::CryptoError;

pub(crate) fn generate_random(len: usize, rng: &mut impl RngCore) -> Vec<u8> {
    let mut buf = alloc::vec![0u8; len];
    rng.fill_bytes(&mut buf);
    buf
}

pub(crate) fn encrypt(
    enc: &EncAlg,
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
    match enc {
        EncAlg::A128Gcm => gcm_encrypt::<Aes128Gcm>(cek, iv, aad, plaintext),
        EncAlg::A192Gcm => gcm_encrypt::<Aes192Gcm>(cek, iv, aad, plaintext),
        EncAlg::A256Gcm => gcm_encrypt::<Aes256Gcm>(cek, iv, aad, plaintext),
        EncAlg::A128CbcHs256 => cbc_hmac_encrypt::<Sha256, 16>(cek, iv, aad, plaintext),
        EncAlg::A192CbcHs384 => cbc_hmac_encrypt::<Sha384, 24>(cek, iv, aad, plaintext),
        EncAlg::A256CbcHs512 => cbc_hmac_encrypt::<Sha512, 32>(cek, iv, aad, plaintext),
        EncAlg::Other(name) => Err(CryptoError::Unsupported(name.clone())),
    }
}

pub(crate) fn decrypt(
    enc: &EncAlg,
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    match enc {
        EncAlg::A128Gcm => gcm_decrypt::<Aes128Gcm>(cek, iv, aad, ciphertext, tag),
        EncAlg::A192Gcm => gcm_decrypt::<Aes192Gcm>(cek, iv, aad, ciphertext, tag),
        EncAlg::A256Gcm => gcm_decrypt::<Aes256Gcm>(cek, iv, aad, ciphertext, tag),
        EncAlg::A128CbcHs256 => cbc_hmac_decrypt::<Sha256, 16>(cek, iv, aad, ciphertext, tag),
        EncAlg::A192CbcHs384 => cbc_hmac_decrypt::<Sha384, 24>(cek, iv, aad, ciphertext, tag),
        EncAlg::A256CbcHs512 => cbc_hmac_decrypt::<Sha512, 32>(cek, iv, aad, ciphertext, tag),
        EncAlg::Other(name) => Err(CryptoError::Unsupported(name.clone())),
    }
}

fn gcm_encrypt<C: KeyInit + Aead>(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), CryptoError> {
    let cipher = C::new_from_slice(key).map_err(|_| CryptoError::KeyMismatch)?;
    let nonce = Nonce::<_>::from_slice(iv);
    let mut out = cipher
        .encrypt(nonce, Payload { msg: plaintext, aad })
        .map_err(|_| CryptoError::OperationFailed)?;
    let tag = out.split_off(out.len() - 16);
    Ok((out, tag))
}

fn gcm_decrypt<C: KeyInit + Aead>(
    key: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, CryptoError> {
    let cipher = C::new_from_slice(key).map_err(|_| CryptoError::KeyMismatch)?;
    let nonce = Nonce::<_>::from_slice(iv);
    let mut combined = Vec::with_capacity(ciphertext.len() + tag.len());
    combined.extend_from_slice(ciphertext);
    combined.extend_from_slice(tag);
    cipher
        .decrypt(nonce, Payload { msg: &combined, aad })
        .map_err(|_| CryptoError::IntegrityFailure)
}

/// `AES_CBC_HMAC_SHA2` per RFC7518 §5.2: the CEK splits into a MAC key
/// (the first half) and an encryption key (the second half); the
/// authentication tag is the leftmost `MAC_KEY_LEN` bytes of
/// `HMAC(mac_key, AAD || IV || ciphertext || AAD_LENGTH_BITS_BE64)`.
fn cbc_hmac_encrypt<D, const KEY_HALF: usize>(
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    plaintext: &[u8],
) -> Result<(Vec<u8>, Vec<u8>), CryptoError>
where
    D: sha2::Digest + hmac::digest::core_api::BlockSizeUser + hmac::digest::OutputSizeUser,
    Hmac<D>: Mac,
{
    if cek.len() != KEY_HALF * 2 {
        return Err(CryptoError::KeyMismatch);
    }
    let (mac_key, enc_key) = cek.split_at(KEY_HALF);

    let ciphertext = match KEY_HALF {
        16 => cbc::Encryptor::<aes::Aes128>::new(enc_key.into(), iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        24 => cbc::Encryptor::<aes::Aes192>::new(enc_key.into(), iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        32 => cbc::Encryptor::<aes::Aes256>::new(enc_key.into(), iv.into())
            .encrypt_padded_vec_mut::<Pkcs7>(plaintext),
        _ => return Err(CryptoError::KeyMismatch),
    };

    let tag = cbc_hmac_tag::<D>(mac_key, aad, iv, &ciphertext, KEY_HALF)?;
    Ok((ciphertext, tag))
}

fn cbc_hmac_decrypt<D, const KEY_HALF: usize>(
    cek: &[u8],
    iv: &[u8],
    aad: &[u8],
    ciphertext: &[u8],
    tag: &[u8],
) -> Result<Vec<u8>, CryptoError>
where
    D: sha2::Digest + hmac::digest::core_api::BlockSizeUser + hmac::digest::OutputSizeUser,
    Hmac<D>: Mac,
{
    if cek.len() != KEY_HALF * 2 {
        return Err(CryptoError::KeyMismatch);
    }
    let (mac_key, enc_key) = cek.split_at(KEY_HALF);

    let expected_tag = cbc_hmac_tag::<D>(mac_key, aad, iv, ciphertext, KEY_HALF)?;
    if !jose_b64::ct_eq(&expected_tag, tag) {
        return Err(CryptoError::IntegrityFailure);
    }

    let plaintext = match KEY_HALF {
        16 => cbc::Decryptor::<aes::Aes128>::new(enc_key.into(), iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        24 => cbc::Decryptor::<aes::Aes192>::new(enc_key.into(), iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        32 => cbc::Decryptor::<aes::Aes256>::new(enc_key.into(), iv.into())
            .decrypt_padded_vec_mut::<Pkcs7>(ciphertext),
        _ => return Err(CryptoError::KeyMismatch),
    }
    .map_err(|_| CryptoError::IntegrityFailure)?;
    Ok(plaintext)
}

fn cbc_hmac_tag<D>(
    mac_key: &[u8],
    aad: &[u8],
    iv: &[u8],
    ciphertext: &[u8],
    key_half: usize,
) -> Result<Vec<u8>, CryptoError>
where
    D: sha2::Digest + hmac::digest::core_api::BlockSizeUser + hmac::digest::OutputSizeUser,
    Hmac<D>: Mac,
{
    let al = (aad.len() as u64) * 8;
    let mut mac = Hmac::<D>::new_from_slice(mac_key).map_err(|_| CryptoError::KeyMismatch)?;
    mac.update(aad);
    mac.update(iv);
    mac.update(ciphertext);
    mac.update(&al.to_be_bytes());
    let full = mac.finalize().into_bytes();
    Ok(full[..key_half].to_vec())
}
