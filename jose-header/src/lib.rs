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

use alloc::borrow::ToOwned;
use alloc::string::String;
use alloc::vec::Vec;

use jose_b64::B64Bytes;
use jose_jwa::{EncAlg, JweAlg, JwsAlg, Zip};
use jose_jwk::Jwk;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Errors validating a parsed header.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum HeaderError {
    /// `crit` (RFC7515 §4.1.11 / RFC7516 §4.1.13) named a parameter the
    /// header itself does not carry.
    #[error("crit names parameter {0:?}, which is not present in the header")]
    CritParameterMissing(String),
    /// `crit` named one of the parameters the relevant RFC already
    /// registers, which RFC7515/RFC7516 both forbid (those are always
    /// understood, so listing them as critical is meaningless).
    #[error("crit names registered parameter {0:?}, which must not be listed")]
    CritNamesRegistered(String),
    /// `crit` named an extension this application does not implement.
    #[error("crit names unsupported extension {0:?}")]
    CritUnsupported(String),
    /// `crit` was present but empty, which RFC7515/RFC7516 forbid.
    #[error("crit must not be an empty array")]
    CritEmpty,
}

/// Parameters common to JWS and JWE headers (RFC7515 §4.1, RFC7516 §4.1).
#[non_exhaustive]
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PlainHeader {
    /// Media type of the complete JOSE object (RFC7515 §4.1.9 / RFC7516
    /// §4.1.11), conventionally omitting the `application/` prefix.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub typ: Option<String>,

    /// Media type of the payload/plaintext.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub cty: Option<String>,

    /// URL pointing to a JWK Set containing the signing/encryption key.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub jku: Option<String>,

    /// The signing/encryption key itself, embedded inline.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub jwk: Option<Jwk>,

    /// A hint indicating which key was used.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub kid: Option<String>,

    /// URL referencing an X.509 public key certificate or chain.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub x5u: Option<String>,

    /// X.509 public key certificate or chain, standard (padded) base64.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub x5c: Option<Vec<String>>,

    /// X.509 SHA-1 certificate thumbprint.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub x5t: Option<String>,

    /// X.509 SHA-256 certificate thumbprint.
    #[serde(skip_serializing_if = "Option::is_none", rename = "x5t#S256", default)]
    pub x5t_s256: Option<String>,

    /// Names of extension parameters that MUST be understood and processed.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub crit: Option<Vec<String>>,

    /// Any parameter not named above: either a private/public extension,
    /// or one this crate doesn't give first-class representation to.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

const PLAIN_REGISTERED: &[&str] = &[
    "typ", "cty", "jku", "jwk", "kid", "x5u", "x5c", "x5t", "x5t#S256", "crit",
];

fn check_crit(
    crit: Option<&[String]>,
    registered: &[&str],
    extra: &Map<String, Value>,
    supported: &[&str],
) -> Result<(), HeaderError> {
    let Some(crit) = crit else {
        return Ok(());
    };
    if crit.is_empty() {
        return Err(HeaderError::CritEmpty);
    }
    for name in crit {
        if registered.contains(&name.as_str()) {
            return Err(HeaderError::CritNamesRegistered(name.to_owned()));
        }
        if !extra.contains_key(name.as_str()) {
            return Err(HeaderError::CritParameterMissing(name.to_owned()));
        }
        if !supported.contains(&name.as_str()) {
            return Err(HeaderError::CritUnsupported(name.to_owned()));
        }
    }
    Ok(())
}

/// A JWS header: RFC7515 §4 registered parameters plus the RFC7797
/// extension.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JwsHeader {
    /// The signing algorithm, or `none` for an unsecured JWS.
    pub alg: JwsAlg,

    /// Whether the payload is base64url-encoded in the signing input and
    /// compact serialization (RFC7797). Absent is equivalent to `true`;
    /// `crit` MUST list `b64` whenever it is present, per RFC7797 §3.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub b64: Option<bool>,

    /// Parameters shared with JWE headers.
    #[serde(flatten)]
    pub plain: PlainHeader,
}

impl JwsHeader {
    /// Start building a header for the given algorithm.
    pub fn new(alg: JwsAlg) -> Self {
        Self {
            alg,
            b64: None,
            plain: PlainHeader::default(),
        }
    }

    /// Whether the payload participates in base64url encoding (RFC7797).
    /// Defaults to `true` when `b64` is absent.
    pub fn b64(&self) -> bool {
        self.b64.unwrap_or(true)
    }

    /// Validate `crit` against the registered parameter names and the
    /// application's set of understood extensions.
    ///
    /// `b64` is always implicitly supported, since every conformant JWS
    /// implementation understands RFC7797.
    pub fn validate_crit(&self, supported: &[&str]) -> Result<(), HeaderError> {
        let mut registered: Vec<&str> = PLAIN_REGISTERED.to_vec();
        registered.push("alg");
        let mut all_supported: Vec<&str> = supported.to_vec();
        all_supported.push("b64");
        check_crit(
            self.plain.crit.as_deref(),
            &registered,
            &self.plain.extra,
            &all_supported,
        )
    }
}

/// A builder for [`JwsHeader`].
#[derive(Clone, Debug, Default)]
pub struct JwsHeaderBuilder {
    header: Option<JwsHeader>,
}

impl JwsHeaderBuilder {
    /// Start building a header for the given algorithm.
    pub fn new(alg: JwsAlg) -> Self {
        Self {
            header: Some(JwsHeader::new(alg)),
        }
    }

    fn header_mut(&mut self) -> &mut JwsHeader {
        self.header.as_mut().expect("builder used after build()")
    }

    /// Set `kid`.
    pub fn kid(mut self, kid: impl Into<String>) -> Self {
        self.header_mut().plain.kid = Some(kid.into());
        self
    }

    /// Set `typ`.
    pub fn typ(mut self, typ: impl Into<String>) -> Self {
        self.header_mut().plain.typ = Some(typ.into());
        self
    }

    /// Set `cty`.
    pub fn cty(mut self, cty: impl Into<String>) -> Self {
        self.header_mut().plain.cty = Some(cty.into());
        self
    }

    /// Set `b64` (RFC7797), automatically adding it to `crit`.
    pub fn b64(mut self, b64: bool) -> Self {
        {
            let header = self.header_mut();
            header.b64 = Some(b64);
            let crit = header.plain.crit.get_or_insert_with(Vec::new);
            if !crit.iter().any(|n| n == "b64") {
                crit.push("b64".into());
            }
        }
        self
    }

    /// Finish building the header.
    pub fn build(mut self) -> JwsHeader {
        self.header.take().expect("builder used after build()")
    }
}

/// A JWE header: RFC7515 shared parameters plus the RFC7516 §4.1 and
/// RFC7518 §4/§5 key-management and content-encryption parameters.
#[non_exhaustive]
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct JweHeader {
    /// The key management algorithm.
    pub alg: JweAlg,

    /// The content encryption algorithm.
    pub enc: EncAlg,

    /// Compression algorithm applied to the plaintext before encryption.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub zip: Option<Zip>,

    /// Ephemeral public key, for ECDH-ES key agreement.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub epk: Option<Jwk>,

    /// Agreement PartyUInfo, for ECDH-ES Concat KDF.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub apu: Option<B64Bytes>,

    /// Agreement PartyVInfo, for ECDH-ES Concat KDF.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub apv: Option<B64Bytes>,

    /// PBES2 salt input.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub p2s: Option<B64Bytes>,

    /// PBES2 iteration count.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub p2c: Option<u64>,

    /// Initialization vector, for AES-GCM key wrapping.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub iv: Option<B64Bytes>,

    /// Authentication tag, for AES-GCM key wrapping.
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub tag: Option<B64Bytes>,

    /// Parameters shared with JWS headers.
    #[serde(flatten)]
    pub plain: PlainHeader,
}

impl JweHeader {
    /// Start building a header for the given key-management/content
    /// algorithm pair.
    pub fn new(alg: JweAlg, enc: EncAlg) -> Self {
        Self {
            alg,
            enc,
            zip: None,
            epk: None,
            apu: None,
            apv: None,
            p2s: None,
            p2c: None,
            iv: None,
            tag: None,
            plain: PlainHeader::default(),
        }
    }

    /// Validate `crit` against the registered parameter names and the
    /// application's set of understood extensions.
    pub fn validate_crit(&self, supported: &[&str]) -> Result<(), HeaderError> {
        let mut registered: Vec<&str> = PLAIN_REGISTERED.to_vec();
        registered.extend_from_slice(&[
            "alg", "enc", "zip", "epk", "apu", "apv", "p2s", "p2c", "iv", "tag",
        ]);
        check_crit(
            self.plain.crit.as_deref(),
            &registered,
            &self.plain.extra,
            supported,
        )
    }
}

/// A builder for [`JweHeader`].
#[derive(Clone, Debug)]
pub struct JweHeaderBuilder {
    header: JweHeader,
}

impl JweHeaderBuilder {
    /// Start building a header for the given key-management/content
    /// algorithm pair.
    pub fn new(alg: JweAlg, enc: EncAlg) -> Self {
        Self {
            header: JweHeader::new(alg, enc),
        }
    }

    /// Set `kid`.
    pub fn kid(mut self, kid: impl Into<String>) -> Self {
        self.header.plain.kid = Some(kid.into());
        self
    }

    /// Set `zip`.
    pub fn zip(mut self, zip: Zip) -> Self {
        self.header.zip = Some(zip);
        self
    }

    /// Finish building the header.
    pub fn build(self) -> JweHeader {
        self.header
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn jws_header_round_trips() {
        let header = JwsHeaderBuilder::new(JwsAlg::Hs256).kid("k1").build();
        let json = serde_json::to_string(&header).unwrap();
        let back: JwsHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(header, back);
        assert_eq!(back.plain.kid.as_deref(), Some("k1"));
    }

    #[test]
    fn crit_rejects_registered_name() {
        let mut header = JwsHeader::new(JwsAlg::Hs256);
        header.plain.crit = Some(alloc::vec!["kid".into()]);
        header.plain.extra.insert("kid".into(), Value::from("x"));
        assert!(matches!(
            header.validate_crit(&[]),
            Err(HeaderError::CritNamesRegistered(_))
        ));
    }

    #[test]
    fn crit_rejects_unsupported_extension() {
        let mut header = JwsHeader::new(JwsAlg::Hs256);
        header.plain.crit = Some(alloc::vec!["x-custom".into()]);
        header
            .plain
            .extra
            .insert("x-custom".into(), Value::from(true));
        assert!(matches!(
            header.validate_crit(&[]),
            Err(HeaderError::CritUnsupported(_))
        ));
        assert!(header.validate_crit(&["x-custom"]).is_ok());
    }

    #[test]
    fn crit_rejects_missing_parameter() {
        let mut header = JwsHeader::new(JwsAlg::Hs256);
        header.plain.crit = Some(alloc::vec!["x-custom".into()]);
        assert!(matches!(
            header.validate_crit(&["x-custom"]),
            Err(HeaderError::CritParameterMissing(_))
        ));
    }

    #[test]
    fn b64_builder_adds_to_crit() {
        let header = JwsHeaderBuilder::new(JwsAlg::Hs256).b64(false).build();
        assert_eq!(header.b64(), false);
        assert_eq!(header.plain.crit.as_deref(), Some(&["b64".to_owned()][..]));
    }

    #[test]
    fn jwe_header_round_trips() {
        let header = JweHeaderBuilder::new(JweAlg::Dir, EncAlg::A256Gcm)
            .kid("k1")
            .build();
        let json = serde_json::to_string(&header).unwrap();
        let back: JweHeader = serde_json::from_str(&json).unwrap();
        assert_eq!(header, back);
    }
}
