#![no_std]
#![cfg_attr(docsrs, feature(doc_auto_cfg))]
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

extern crate alloc;

pub use base64ct;

use alloc::boxed::Box;
use alloc::string::{String, ToString};
use alloc::vec::Vec;
use base64ct::{Base64UrlUnpadded, Encoding};
use core::fmt;
use core::marker::PhantomData;

#[cfg(feature = "serde")]
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

/// Errors produced while decoding base64url or the JSON it carries.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// The input contained a byte outside the base64url alphabet, or a line
    /// break.
    #[error("invalid base64url encoding")]
    InvalidEncoding,
    /// The decoded bytes did not have the length the target type requires.
    #[error("decoded value has the wrong length")]
    WrongLength,
    /// The decoded bytes were not valid JSON for the requested type.
    #[cfg(feature = "json")]
    #[error("invalid JSON: {0}")]
    Json(alloc::string::String),
}

/// Decode a base64url segment (RFC 4648 §5). Padding (`=`) is tolerated and
/// stripped; embedded line breaks or other non-alphabet bytes are rejected.
pub fn decode(input: &str) -> Result<Vec<u8>, Error> {
    let trimmed = input.trim_end_matches('=');
    if trimmed.bytes().any(|b| b == b'\n' || b == b'\r') {
        return Err(Error::InvalidEncoding);
    }
    Base64UrlUnpadded::decode_vec(trimmed).map_err(|_| Error::InvalidEncoding)
}

/// Encode bytes as unpadded base64url.
pub fn encode(input: impl AsRef<[u8]>) -> String {
    Base64UrlUnpadded::encode_string(input.as_ref())
}

/// Constant-time byte equality.
///
/// Unlike a naive `a == b`, this never takes a length-dependent shortcut: it
/// always walks `max(a.len(), b.len())` bytes against a zero-padded copy of
/// each input before folding in the length comparison, so a MAC/tag
/// comparison over attacker-controlled input does not leak timing
/// information about where (or whether) the inputs diverge.
pub fn ct_eq(a: &[u8], b: &[u8]) -> bool {
    use subtle::ConstantTimeEq;

    let n = a.len().max(b.len());
    let mut abuf = alloc::vec![0u8; n];
    let mut bbuf = alloc::vec![0u8; n];
    abuf[..a.len()].copy_from_slice(a);
    bbuf[..b.len()].copy_from_slice(b);

    let len_eq = (a.len() == b.len()) as u8;
    let content_eq = abuf.ct_eq(&bbuf).unwrap_u8();
    (len_eq & content_eq) == 1
}

/// A byte buffer that serializes as base64, parameterized over the
/// container `T` and the [`base64ct::Encoding`] `E` (default: unpadded
/// base64url, the JOSE wire format; `E = base64ct::Base64` is used for
/// fields like `x5c` that are specified as padded standard base64).
#[derive(Clone, Copy, Default)]
pub struct B64Bytes<T = Vec<u8>, E = Base64UrlUnpadded>(T, PhantomData<E>);

impl<T, E> B64Bytes<T, E> {
    /// Wrap a value that is already decoded.
    pub fn new(value: T) -> Self {
        Self(value, PhantomData)
    }

    /// Consume the wrapper, returning the inner value.
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T, E> core::ops::Deref for B64Bytes<T, E> {
    type Target = T;
    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: AsRef<[u8]>, E> AsRef<[u8]> for B64Bytes<T, E> {
    fn as_ref(&self) -> &[u8] {
        self.0.as_ref()
    }
}

impl<T: fmt::Debug, E> fmt::Debug for B64Bytes<T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("B64Bytes").field(&self.0).finish()
    }
}

impl<T: PartialEq, E> PartialEq for B64Bytes<T, E> {
    fn eq(&self, other: &Self) -> bool {
        self.0 == other.0
    }
}
impl<T: Eq, E> Eq for B64Bytes<T, E> {}

impl<T: From<Vec<u8>>> From<Vec<u8>> for B64Bytes<T> {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(T::from(bytes))
    }
}

#[cfg(feature = "serde")]
impl<T: AsRef<[u8]>, E: Encoding> Serialize for B64Bytes<T, E> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&E::encode_string(self.0.as_ref()))
    }
}

#[cfg(feature = "serde")]
impl<'de, T, E> Deserialize<'de> for B64Bytes<T, E>
where
    T: TryFrom<Vec<u8>>,
    E: Encoding,
{
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = alloc::string::String::deserialize(deserializer)?;
        let trimmed = s.trim_end_matches('=');
        let bytes = E::decode_vec(trimmed).map_err(|_| D::Error::custom("invalid base64"))?;
        let value = T::try_from(bytes).map_err(|_| D::Error::custom("wrong length"))?;
        Ok(Self::new(value))
    }
}

/// A byte buffer with the same wire representation as [`B64Bytes`], but
/// zeroized on drop and compared in constant time. Used for private/secret
/// JWK members (`d`, `p`, `q`, `k`, ...).
#[derive(Clone)]
pub struct B64Secret(Vec<u8>);

impl B64Secret {
    /// Wrap already-decoded secret bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Consume the wrapper, returning the inner bytes. The caller takes over
    /// responsibility for zeroizing them.
    pub fn into_inner(self) -> Vec<u8> {
        self.0.clone()
    }
}

impl AsRef<[u8]> for B64Secret {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for B64Secret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("B64Secret(..)")
    }
}

impl PartialEq for B64Secret {
    fn eq(&self, other: &Self) -> bool {
        ct_eq(&self.0, &other.0)
    }
}
impl Eq for B64Secret {}

#[cfg(feature = "secret")]
impl Drop for B64Secret {
    fn drop(&mut self) {
        use zeroize::Zeroize;
        self.0.zeroize();
    }
}

#[cfg(feature = "serde")]
impl Serialize for B64Secret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(&self.0))
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for B64Secret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = alloc::string::String::deserialize(deserializer)?;
        let bytes = decode(&s).map_err(|_| D::Error::custom("invalid base64"))?;
        Ok(Self::new(bytes))
    }
}

/// Raw (non-JSON) bytes, carried as the JWS payload when `b64=false`
/// (RFC 7797) or as a JWE segment. Serializes as unpadded base64url when
/// embedded in a JSON structure, but the compact-serialization encoders in
/// `jose-jws`/`jose-jwe` read/write the raw bytes directly.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Bytes(Vec<u8>);

impl Bytes {
    /// Wrap raw bytes.
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl AsRef<[u8]> for Bytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl From<Vec<u8>> for Bytes {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl fmt::Debug for Bytes {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Bytes").field(&encode(&self.0)).finish()
    }
}

#[cfg(feature = "serde")]
impl Serialize for Bytes {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&encode(&self.0))
    }
}

#[cfg(feature = "serde")]
impl<'de> Deserialize<'de> for Bytes {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = alloc::string::String::deserialize(deserializer)?;
        decode(&s).map(Self).map_err(|_| D::Error::custom("invalid base64"))
    }
}

/// A `T` that remembers the exact base64url bytes it was parsed from.
///
/// JOSE signature verification is defined over the *original* base64url
/// encoding of the header, not over a value re-serialized from the parsed
/// representation (key order, whitespace, and even non-canonical JSON
/// number formatting must survive a round trip). `Json::parse` captures the
/// raw segment text; `Json::serialize_str` returns it verbatim. Only a
/// value built fresh with [`Json::new`], or one explicitly mutated with
/// [`Json::update`], recomputes its encoding.
#[cfg(feature = "json")]
#[derive(Clone)]
pub struct Json<T> {
    value: T,
    raw: Option<Box<str>>,
}

#[cfg(feature = "json")]
impl<T> Json<T> {
    /// Wrap a freshly constructed value; it has no original wire bytes yet.
    pub fn new(value: T) -> Result<Self, Error>
    where
        T: Serialize,
    {
        Ok(Self { value, raw: None })
    }

    /// Parse a base64url segment as JSON, remembering the original text.
    pub fn parse(raw: &str) -> Result<Self, Error>
    where
        T: serde::de::DeserializeOwned,
    {
        let bytes = decode(raw)?;
        let value: T = serde_json::from_slice(&bytes).map_err(|e| Error::Json(e.to_string()))?;
        Ok(Self {
            value,
            raw: Some(raw.into()),
        })
    }

    /// The original base64url text, if this value came from [`Json::parse`]
    /// and has not been mutated since.
    pub fn as_raw(&self) -> Option<&str> {
        self.raw.as_deref()
    }

    /// Borrow the parsed value.
    pub fn get(&self) -> &T {
        &self.value
    }

    /// Mutate the parsed value in place. This discards any remembered raw
    /// bytes: the next serialization recomputes them from `T`.
    pub fn update(&mut self, f: impl FnOnce(&mut T)) {
        f(&mut self.value);
        self.raw = None;
    }

    /// Render this value to its base64url segment text, reusing the
    /// original bytes when available.
    pub fn to_base64url(&self) -> Result<String, Error>
    where
        T: Serialize,
    {
        if let Some(raw) = &self.raw {
            return Ok(raw.to_string());
        }
        let bytes = serde_json::to_vec(&self.value).map_err(|e| Error::Json(e.to_string()))?;
        Ok(encode(bytes))
    }
}

#[cfg(feature = "json")]
impl<T: Serialize> Serialize for Json<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let s = self
            .to_base64url()
            .map_err(|e| serde::ser::Error::custom(e.to_string()))?;
        serializer.serialize_str(&s)
    }
}

#[cfg(feature = "json")]
impl<'de, T: serde::de::DeserializeOwned> Deserialize<'de> for Json<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = alloc::string::String::deserialize(deserializer)?;
        Self::parse(&raw).map_err(|e| D::Error::custom(e.to_string()))
    }
}

#[cfg(feature = "json")]
impl<T: fmt::Debug> fmt::Debug for Json<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Json")
            .field("value", &self.value)
            .field("raw", &self.raw)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn decode_accepts_padding() {
        assert_eq!(decode("Zm9v").unwrap(), b"foo");
        assert_eq!(decode("Zm9v==").unwrap(), b"foo");
    }

    #[test]
    fn decode_rejects_line_breaks() {
        assert!(decode("Zm9v\n").is_err());
    }

    #[test]
    fn ct_eq_handles_length_mismatch() {
        assert!(!ct_eq(b"abc", b"abcd"));
        assert!(ct_eq(b"abc", b"abc"));
        assert!(!ct_eq(b"", b"a"));
        assert!(ct_eq(b"", b""));
    }

    #[test]
    fn json_roundtrips_raw_bytes() {
        let raw = encode(br#"{"b":2,"a":1}"#);
        let parsed: Json<serde_json::Value> = Json::parse(&raw).unwrap();
        assert_eq!(parsed.to_base64url().unwrap(), raw);
    }

    #[test]
    fn json_update_drops_raw() {
        let raw = encode(br#"{"a":1}"#);
        let mut parsed: Json<serde_json::Value> = Json::parse(&raw).unwrap();
        parsed.update(|v| v["a"] = serde_json::json!(2));
        assert!(parsed.as_raw().is_none());
        assert_eq!(parsed.to_base64url().unwrap(), encode(br#"{"a":2}"#));
    }
}
