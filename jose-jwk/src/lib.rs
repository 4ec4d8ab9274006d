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

mod key;
mod matcher;
mod thumbprint;

use alloc::{boxed::Box, string::String, vec::Vec};
use jose_b64::{base64ct::Base64, B64Bytes};
use jose_jwa::{KeyOps, KeyUse};
use serde::{Deserialize, Serialize};

pub use jose_jwa::KeyType;
pub use key::{Ec, Key, Oct, Okp, Rsa, RsaOtherPrimes};
pub use matcher::JwkMatcher;

/// A strongly typed JSON Web Key, RFC7517.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Jwk {
    /// The key material itself; all fields specific to a key's `kty` live
    /// here.
    #[serde(flatten)]
    pub key: Key,

    /// Metadata common to every key type.
    #[serde(flatten)]
    pub params: Parameters,
}

impl Jwk {
    /// Create a new JWK from a key, with no metadata set.
    pub fn new(key: Key) -> Self {
        Self {
            key,
            params: Default::default(),
        }
    }
}

/// Metadata common to every JWK, regardless of key type (RFC7517 §4).
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Parameters {
    /// The algorithm intended for use with this key. RFC7517 defines this
    /// as a bare string drawn from the shared JWA algorithm name registry
    /// rather than a type distinguishing JWS from JWE algorithms, since a
    /// JWK does not by itself say which it will be used for.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub alg: Option<String>,

    /// A hint identifying this key among a set, e.g. to match against a
    /// JOSE header's `kid`.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kid: Option<String>,

    /// The intended use of this key (named `use` in the RFC).
    #[serde(rename = "use")]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub use_for: Option<KeyUse>,

    /// The intended operations for this key.
    #[serde(skip_serializing_if = "alloc::collections::BTreeSet::is_empty", default)]
    pub key_ops: alloc::collections::BTreeSet<KeyOps>,

    /// X.509 certificate metadata associated with this key.
    #[serde(flatten)]
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub x509: Option<Box<X509>>,
}

/// X.509 certificate metadata for a JWK (RFC7517 §4.6-4.9).
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct X509 {
    /// A URL for the X.509 certificate associated with this key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub x5u: Option<String>,

    /// The X.509 certificate chain associated with this key. Entries are
    /// standard (padded) base64, not base64url, per RFC7517 §4.7.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub x5c: Option<Vec<B64Bytes<Box<[u8]>, Base64>>>,

    /// A SHA-1 X.509 certificate thumbprint.
    #[serde(skip_serializing_if = "Option::is_none", rename = "x5t", default)]
    pub x5t: Option<B64Bytes<[u8; 20]>>,

    /// A SHA-256 X.509 certificate thumbprint.
    #[serde(skip_serializing_if = "Option::is_none", rename = "x5t#S256", default)]
    pub x5t_s256: Option<B64Bytes<[u8; 32]>>,
}

/// A set of JSON Web Keys (RFC7517 §5).
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct JwkSet {
    /// The keys in the set.
    pub keys: Vec<Jwk>,
}

impl JwkSet {
    /// Find the first key in the set whose `kid` equals `kid`.
    ///
    /// A JOSE header's `kid` is only a hint (RFC7515 §4.1.4 / RFC7516
    /// §4.1.6): it is not guaranteed unique, and a matching key is not
    /// guaranteed to be usable for the operation at hand. Callers that need
    /// those further checks should use [`JwkMatcher`] instead or as well.
    pub fn find_by_kid(&self, kid: &str) -> Option<&Jwk> {
        self.keys.iter().find(|jwk| jwk.params.kid.as_deref() == Some(kid))
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use key::Oct;
    use jose_b64::B64Secret;
    use pretty_assertions::assert_eq;

    #[test]
    fn jwk_set_round_trips_through_json() {
        let mut jwk = Jwk::new(Key::Oct(Oct {
            k: B64Secret::new(b"0123456789abcdef".to_vec()),
        }));
        jwk.params.kid = Some("k1".into());
        jwk.params.use_for = Some(KeyUse::Sig);
        let set = JwkSet { keys: alloc::vec![jwk] };

        let json = serde_json::to_string(&set).unwrap();
        let back: JwkSet = serde_json::from_str(&json).unwrap();
        assert_eq!(set, back);
        assert!(back.find_by_kid("k1").is_some());
        assert!(back.find_by_kid("nope").is_none());
    }

    #[test]
    fn unknown_kty_fails_to_parse() {
        let err = serde_json::from_str::<Jwk>(r#"{"kty":"bogus"}"#);
        assert!(err.is_err());
    }
}
