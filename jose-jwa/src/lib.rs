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

use alloc::string::{String, ToString};
use core::fmt;

#[cfg(feature = "serde")]
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};

/// How strongly RFC7518 recommends an algorithm be implemented. Informative
/// only; nothing in this crate enforces it.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// MUST be implemented.
    Required,
    /// SHOULD be implemented.
    Recommended,
    /// MAY be implemented.
    Optional,
    /// Not defined by RFC7518 (an application-defined extension).
    Unknown,
}

/// Common behavior of every algorithm identifier in this crate.
pub trait Algorithm: fmt::Display {
    /// The registered name, exactly as it appears on the wire.
    fn name(&self) -> &str;

    /// RFC7518's requirement level for this algorithm.
    fn requirement(&self) -> Requirement {
        Requirement::Unknown
    }
}

macro_rules! closed_string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[non_exhaustive]
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )+
        }

        impl $name {
            /// All closed (non-`Other`) variants, for iteration in tests and UIs.
            pub const ALL: &'static [$name] = &[ $( $name::$variant, )+ ];

            /// Parse a registered wire name.
            pub fn from_name(s: &str) -> Option<Self> {
                match s {
                    $( $wire => Some($name::$variant), )+
                    _ => None,
                }
            }

            /// The registered wire name.
            pub fn name(&self) -> &'static str {
                match self {
                    $( $name::$variant => $wire, )+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        #[cfg(feature = "serde")]
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(self.name())
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let s = String::deserialize(d)?;
                $name::from_name(&s).ok_or_else(|| D::Error::custom(alloc::format!("unrecognized {}: {s}", stringify!($name))))
            }
        }
    };
}

/// An algorithm identifier that is either one of the names the relevant RFC
/// registers, or an application-defined extension (RFC7518 §8 permits a
/// private/unregistered `alg`, `enc`, or `zip` value by agreement between
/// parties).
macro_rules! open_string_enum {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $( $(#[$vmeta:meta])* $variant:ident => $wire:literal, $req:expr ),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[non_exhaustive]
        #[derive(Clone, Debug, PartialEq, Eq, Hash)]
        $vis enum $name {
            $( $(#[$vmeta])* $variant, )+
            /// An algorithm name not in the registered table above.
            Other(String),
        }

        impl $name {
            /// Parse a wire name, falling back to [`Self::Other`].
            pub fn from_name(s: &str) -> Self {
                match s {
                    $( $wire => $name::$variant, )+
                    other => $name::Other(other.to_string()),
                }
            }
        }

        impl Algorithm for $name {
            fn name(&self) -> &str {
                match self {
                    $( $name::$variant => $wire, )+
                    $name::Other(s) => s.as_str(),
                }
            }

            fn requirement(&self) -> Requirement {
                match self {
                    $( $name::$variant => $req, )+
                    $name::Other(_) => Requirement::Unknown,
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.name())
            }
        }

        #[cfg(feature = "serde")]
        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
                s.serialize_str(self.name())
            }
        }

        #[cfg(feature = "serde")]
        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
                let s = String::deserialize(d)?;
                Ok($name::from_name(&s))
            }
        }
    };
}

open_string_enum! {
    /// JWS `alg` values, RFC7518 §3.1.
    pub enum JwsAlg {
        /// HMAC using SHA-256
        Hs256 => "HS256", Requirement::Required,
        /// HMAC using SHA-384
        Hs384 => "HS384", Requirement::Optional,
        /// HMAC using SHA-512
        Hs512 => "HS512", Requirement::Optional,
        /// RSASSA-PKCS1-v1_5 using SHA-256
        Rs256 => "RS256", Requirement::Recommended,
        /// RSASSA-PKCS1-v1_5 using SHA-384
        Rs384 => "RS384", Requirement::Optional,
        /// RSASSA-PKCS1-v1_5 using SHA-512
        Rs512 => "RS512", Requirement::Optional,
        /// ECDSA using P-256 and SHA-256
        Es256 => "ES256", Requirement::Recommended,
        /// ECDSA using secp256k1 and SHA-256
        Es256K => "ES256K", Requirement::Optional,
        /// ECDSA using P-384 and SHA-384
        Es384 => "ES384", Requirement::Optional,
        /// ECDSA using P-521 and SHA-512
        Es512 => "ES512", Requirement::Optional,
        /// RSASSA-PSS using SHA-256 and MGF1 with SHA-256
        Ps256 => "PS256", Requirement::Optional,
        /// RSASSA-PSS using SHA-384 and MGF1 with SHA-384
        Ps384 => "PS384", Requirement::Optional,
        /// RSASSA-PSS using SHA-512 and MGF1 with SHA-512
        Ps512 => "PS512", Requirement::Optional,
        /// EdDSA (Ed25519 or Ed448)
        EdDsa => "EdDSA", Requirement::Optional,
        /// No digital signature or MAC. Forbidden wherever a real
        /// signing/encryption operation is required; see `jose-header`'s
        /// header invariant.
        None => "none", Requirement::Optional,
    }
}

open_string_enum! {
    /// JWE `alg` (key management) values, RFC7518 §4.1.
    pub enum JweAlg {
        /// RSAES-PKCS1-v1_5
        Rsa1_5 => "RSA1_5", Requirement::Recommended,
        /// RSAES OAEP using default parameters (SHA-1, MGF1-SHA1)
        RsaOaep => "RSA-OAEP", Requirement::Optional,
        /// RSAES OAEP using SHA-256 and MGF1 with SHA-256
        RsaOaep256 => "RSA-OAEP-256", Requirement::Optional,
        /// AES Key Wrap with a 128-bit key
        A128Kw => "A128KW", Requirement::Recommended,
        /// AES Key Wrap with a 192-bit key
        A192Kw => "A192KW", Requirement::Optional,
        /// AES Key Wrap with a 256-bit key
        A256Kw => "A256KW", Requirement::Recommended,
        /// Direct use of a shared symmetric key as the CEK
        Dir => "dir", Requirement::Recommended,
        /// ECDH-ES using Concat KDF, direct key agreement
        EcdhEs => "ECDH-ES", Requirement::Recommended,
        /// ECDH-ES using Concat KDF, CEK wrapped with A128KW
        EcdhEsA128Kw => "ECDH-ES+A128KW", Requirement::Recommended,
        /// ECDH-ES using Concat KDF, CEK wrapped with A192KW
        EcdhEsA192Kw => "ECDH-ES+A192KW", Requirement::Optional,
        /// ECDH-ES using Concat KDF, CEK wrapped with A256KW
        EcdhEsA256Kw => "ECDH-ES+A256KW", Requirement::Recommended,
        /// Key wrapping with AES GCM using a 128-bit key
        A128GcmKw => "A128GCMKW", Requirement::Optional,
        /// Key wrapping with AES GCM using a 192-bit key
        A192GcmKw => "A192GCMKW", Requirement::Optional,
        /// Key wrapping with AES GCM using a 256-bit key
        A256GcmKw => "A256GCMKW", Requirement::Optional,
        /// PBES2 with HMAC SHA-256 and A128KW wrapping
        Pbes2Hs256A128Kw => "PBES2-HS256+A128KW", Requirement::Optional,
        /// PBES2 with HMAC SHA-384 and A192KW wrapping
        Pbes2Hs384A192Kw => "PBES2-HS384+A192KW", Requirement::Optional,
        /// PBES2 with HMAC SHA-512 and A256KW wrapping
        Pbes2Hs512A256Kw => "PBES2-HS512+A256KW", Requirement::Optional,
    }
}

open_string_enum! {
    /// JWE `enc` (content encryption) values, RFC7518 §5.1.
    pub enum EncAlg {
        /// AES_128_CBC_HMAC_SHA_256
        A128CbcHs256 => "A128CBC-HS256", Requirement::Required,
        /// AES_192_CBC_HMAC_SHA_384
        A192CbcHs384 => "A192CBC-HS384", Requirement::Optional,
        /// AES_256_CBC_HMAC_SHA_512
        A256CbcHs512 => "A256CBC-HS512", Requirement::Required,
        /// AES-GCM with a 128-bit key
        A128Gcm => "A128GCM", Requirement::Recommended,
        /// AES-GCM with a 192-bit key
        A192Gcm => "A192GCM", Requirement::Optional,
        /// AES-GCM with a 256-bit key
        A256Gcm => "A256GCM", Requirement::Recommended,
    }
}

impl EncAlg {
    /// Length in bytes of the Content Encryption Key this `enc` requires.
    pub fn cek_len(&self) -> Option<usize> {
        match self {
            EncAlg::A128CbcHs256 => Some(32),
            EncAlg::A192CbcHs384 => Some(48),
            EncAlg::A256CbcHs512 => Some(64),
            EncAlg::A128Gcm => Some(16),
            EncAlg::A192Gcm => Some(24),
            EncAlg::A256Gcm => Some(32),
            EncAlg::Other(_) => None,
        }
    }

    /// Length in bytes of the IV/nonce this `enc` requires.
    pub fn iv_len(&self) -> Option<usize> {
        match self {
            EncAlg::A128CbcHs256 | EncAlg::A192CbcHs384 | EncAlg::A256CbcHs512 => Some(16),
            EncAlg::A128Gcm | EncAlg::A192Gcm | EncAlg::A256Gcm => Some(12),
            EncAlg::Other(_) => None,
        }
    }

    /// `true` if this is one of the AES-CBC-HMAC composite algorithms
    /// (as opposed to an AEAD construction like AES-GCM).
    pub fn is_cbc_hmac(&self) -> bool {
        matches!(
            self,
            EncAlg::A128CbcHs256 | EncAlg::A192CbcHs384 | EncAlg::A256CbcHs512
        )
    }
}

closed_string_enum! {
    /// JWE `zip` (compression) values, RFC7518 §4.1.1.
    pub enum Zip {
        /// DEFLATE, RFC1951.
        Deflate => "DEF",
    }
}

closed_string_enum! {
    /// JWK `kty` values, RFC7518 §6.1.
    pub enum KeyType {
        /// Elliptic Curve.
        Ec => "EC",
        /// RSA.
        Rsa => "RSA",
        /// Octet key pair (Ed25519/Ed448/X25519/X448), RFC8037.
        Okp => "OKP",
        /// Octet sequence (symmetric key).
        Oct => "oct",
    }
}

closed_string_enum! {
    /// JWK `use` values, RFC7517 §4.2.
    pub enum KeyUse {
        /// The key is used for signing or verifying signatures.
        Sig => "sig",
        /// The key is used for encrypting or decrypting content/keys.
        Enc => "enc",
    }
}

closed_string_enum! {
    /// JWK `key_ops` values, RFC7517 §4.3.
    pub enum KeyOps {
        /// Compute digital signature or MAC.
        Sign => "sign",
        /// Verify digital signature or MAC.
        Verify => "verify",
        /// Encrypt content.
        Encrypt => "encrypt",
        /// Decrypt content and validate decryption, if applicable.
        Decrypt => "decrypt",
        /// Encrypt key.
        WrapKey => "wrapKey",
        /// Decrypt key and validate decryption, if applicable.
        UnwrapKey => "unwrapKey",
        /// Derive key.
        DeriveKey => "deriveKey",
        /// Derive bits not to be used as a key.
        DeriveBits => "deriveBits",
    }
}

closed_string_enum! {
    /// EC `crv` values, RFC7518 §6.2.1.1.
    pub enum EcCurve {
        /// NIST P-256.
        P256 => "P-256",
        /// NIST P-384.
        P384 => "P-384",
        /// NIST P-521.
        P521 => "P-521",
        /// SECG secp256k1.
        Secp256K1 => "secp256k1",
    }
}

impl EcCurve {
    /// Length in bytes of the `x`/`y`/`d` coordinates for this curve.
    pub fn coordinate_len(&self) -> usize {
        match self {
            EcCurve::P256 | EcCurve::Secp256K1 => 32,
            EcCurve::P384 => 48,
            EcCurve::P521 => 66,
        }
    }
}

closed_string_enum! {
    /// OKP `crv` values, RFC8037 §3.1.
    pub enum OkpCurve {
        /// Ed25519 signature scheme.
        Ed25519 => "Ed25519",
        /// Ed448 signature scheme.
        Ed448 => "Ed448",
        /// X25519 key agreement.
        X25519 => "X25519",
        /// X448 key agreement.
        X448 => "X448",
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn jws_alg_roundtrips() {
        for alg in [JwsAlg::Hs256, JwsAlg::Es256K, JwsAlg::EdDsa, JwsAlg::None] {
            let json = serde_json::to_string(&alg).unwrap();
            let back: JwsAlg = serde_json::from_str(&json).unwrap();
            assert_eq!(alg, back);
        }
    }

    #[test]
    fn jws_alg_extension() {
        let alg = JwsAlg::from_name("Acme-Custom");
        assert_eq!(alg, JwsAlg::Other("Acme-Custom".into()));
        assert_eq!(alg.requirement(), Requirement::Unknown);
    }

    #[test]
    fn key_type_rejects_unknown() {
        let err = serde_json::from_str::<KeyType>(r#""bogus""#);
        assert!(err.is_err());
    }

    #[test]
    fn enc_alg_lengths() {
        assert_eq!(EncAlg::A256Gcm.cek_len(), Some(32));
        assert_eq!(EncAlg::A256Gcm.iv_len(), Some(12));
        assert_eq!(EncAlg::A128CbcHs256.cek_len(), Some(32));
        assert!(EncAlg::A128CbcHs256.is_cbc_hmac());
        assert!(!EncAlg::A256Gcm.is_cbc_hmac());
    }
}
