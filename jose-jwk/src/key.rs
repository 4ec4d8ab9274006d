use alloc::vec::Vec;
use serde::{Deserialize, Serialize};

use jose_b64::{B64Bytes, B64Secret};
use jose_jwa::{EcCurve, OkpCurve};

/// A key type suitable for use in a JWK.
///
/// Each variant carries its public members unconditionally and its private
/// members as `Option`s: the same type represents a public key (as
/// published in a `JwkSet`) and a private key (as held by a signer), with
/// the private fields simply absent in the former.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE", tag = "kty")]
pub enum Key {
    /// An elliptic curve key (RFC7518 §6.2).
    Ec(Ec),
    /// An RSA key (RFC7518 §6.3).
    Rsa(Rsa),
    /// An octet key pair, RFC8037 (Ed25519/Ed448/X25519/X448).
    Okp(Okp),
    /// A symmetric key (RFC7518 §6.4).
    #[serde(rename = "oct")]
    Oct(Oct),
}

impl Key {
    /// `true` if this key carries private material.
    pub fn is_private(&self) -> bool {
        match self {
            Key::Ec(k) => k.d.is_some(),
            Key::Rsa(k) => k.d.is_some(),
            Key::Okp(k) => k.d.is_some(),
            Key::Oct(_) => true,
        }
    }
}

/// An elliptic curve key.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ec {
    /// The curve this key is defined over.
    pub crv: EcCurve,

    /// X coordinate of the curve point.
    pub x: B64Bytes,

    /// Y coordinate of the curve point.
    pub y: B64Bytes,

    /// Private key value, present only for a private key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub d: Option<B64Secret>,
}

impl Ec {
    /// Build an EC key from its coordinates, optionally including the
    /// private value `d`.
    pub fn new(crv: EcCurve, x: B64Bytes, y: B64Bytes, d: Option<B64Secret>) -> Self {
        Self { crv, x, y, d }
    }
}

/// An RSA key.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rsa {
    /// RSA modulus.
    pub n: B64Bytes,

    /// RSA public exponent.
    pub e: B64Bytes,

    /// Private exponent, present only for a private key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub d: Option<B64Secret>,

    /// First prime factor.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub p: Option<B64Secret>,

    /// Second prime factor.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub q: Option<B64Secret>,

    /// First factor CRT exponent.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dp: Option<B64Secret>,

    /// Second factor CRT exponent.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub dq: Option<B64Secret>,

    /// First CRT coefficient.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub qi: Option<B64Secret>,

    /// Additional RSA private primes, for keys with more than two.
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub oth: Vec<RsaOtherPrimes>,
}

/// An additional RSA private prime, beyond the first two.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RsaOtherPrimes {
    /// Prime factor.
    pub r: B64Secret,

    /// Factor CRT exponent.
    pub d: B64Secret,

    /// Factor CRT coefficient.
    pub t: B64Secret,
}

/// An octet key pair, RFC8037.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Okp {
    /// The curve this key is defined over.
    pub crv: OkpCurve,

    /// Public key bytes.
    pub x: B64Bytes,

    /// Private key bytes, present only for a private key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub d: Option<B64Secret>,
}

impl Okp {
    /// Build an OKP key from its public bytes, optionally including the
    /// private value `d`.
    pub fn new(crv: OkpCurve, x: B64Bytes, d: Option<B64Secret>) -> Self {
        Self { crv, x, d }
    }
}

/// A symmetric octet-sequence key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Oct {
    /// The symmetric key value. There is no public/private distinction for
    /// a symmetric key, so this is always present.
    pub k: B64Secret,
}

impl From<Ec> for Key {
    fn from(key: Ec) -> Self {
        Self::Ec(key)
    }
}

impl From<Rsa> for Key {
    fn from(key: Rsa) -> Self {
        Self::Rsa(key)
    }
}

impl From<Okp> for Key {
    fn from(key: Okp) -> Self {
        Self::Okp(key)
    }
}

impl From<Oct> for Key {
    fn from(key: Oct) -> Self {
        Self::Oct(key)
    }
}
