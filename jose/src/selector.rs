use jose_header::{JweHeader, JwsHeader};
use jose_jwa::{Algorithm, JweAlg, JwsAlg, KeyOps, KeyType, KeyUse};
use jose_jwk::JwkMatcher;

/// Build the [`JwkMatcher`] a JWS header implies: `kty` derived from the
/// algorithm family, usable for `sig` (via `use` or `key_ops`, per spec
/// §4.H's `use=sig (or sig∈key_ops)` alternative), and `alg`/`kid` pinned
/// when the header carries them.
///
/// `alg: "none"` and an unrecognized extension algorithm impose no `kty`
/// constraint (there is no key to select for `none`, and an extension
/// algorithm's key shape isn't known to this crate).
pub fn jws_matcher(header: &JwsHeader) -> JwkMatcher {
    let mut matcher = JwkMatcher::new()
        .usable_as(KeyUse::Sig, KeyOps::Verify)
        .alg(header.alg.name());
    if let Some(kty) = jws_key_type(&header.alg) {
        matcher = matcher.kty(kty);
    }
    if let Some(kid) = &header.plain.kid {
        matcher = matcher.kid(kid.clone());
    }
    matcher
}

/// Build the [`JwkMatcher`] a JWE header implies: `kty` derived from the
/// key-management algorithm family, usable for `enc` (via `use` or
/// `key_ops`), and `alg`/`kid` pinned when present.
///
/// `ECDH-ES` and its key-wrapping variants impose no `kty` constraint: the
/// agreement key may be EC or OKP (X25519/X448), and the matcher has no way
/// to express "either of these two", so the candidate's actual key type is
/// left for the crypto backend to reject via `KeyMismatch` during trial.
pub fn jwe_matcher(header: &JweHeader) -> JwkMatcher {
    let mut matcher = JwkMatcher::new()
        .usable_as(KeyUse::Enc, KeyOps::Decrypt)
        .alg(header.alg.name());
    if let Some(kty) = jwe_key_type(&header.alg) {
        matcher = matcher.kty(kty);
    }
    if let Some(kid) = &header.plain.kid {
        matcher = matcher.kid(kid.clone());
    }
    matcher
}

fn jws_key_type(alg: &JwsAlg) -> Option<KeyType> {
    match alg {
        JwsAlg::Hs256 | JwsAlg::Hs384 | JwsAlg::Hs512 => Some(KeyType::Oct),
        JwsAlg::Rs256
        | JwsAlg::Rs384
        | JwsAlg::Rs512
        | JwsAlg::Ps256
        | JwsAlg::Ps384
        | JwsAlg::Ps512 => Some(KeyType::Rsa),
        JwsAlg::Es256 | JwsAlg::Es256K | JwsAlg::Es384 | JwsAlg::Es512 => Some(KeyType::Ec),
        JwsAlg::EdDsa => Some(KeyType::Okp),
        JwsAlg::None | JwsAlg::Other(_) => None,
    }
}

fn jwe_key_type(alg: &JweAlg) -> Option<KeyType> {
    match alg {
        JweAlg::Rsa1_5 | JweAlg::RsaOaep | JweAlg::RsaOaep256 => Some(KeyType::Rsa),
        JweAlg::A128Kw
        | JweAlg::A192Kw
        | JweAlg::A256Kw
        | JweAlg::A128GcmKw
        | JweAlg::A192GcmKw
        | JweAlg::A256GcmKw
        | JweAlg::Dir
        | JweAlg::Pbes2Hs256A128Kw
        | JweAlg::Pbes2Hs384A192Kw
        | JweAlg::Pbes2Hs512A256Kw => Some(KeyType::Oct),
        JweAlg::EcdhEs
        | JweAlg::EcdhEsA128Kw
        | JweAlg::EcdhEsA192Kw
        | JweAlg::EcdhEsA256Kw
        | JweAlg::Other(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jose_jwa::EncAlg;
    use jose_jwk::{Jwk, Key, Oct, Rsa};
    use pretty_assertions::assert_eq;

    #[test]
    fn hs256_matcher_requires_oct_and_sig() {
        let header = JwsHeader::new(JwsAlg::Hs256);
        let matcher = jws_matcher(&header);

        let oct = Jwk::new(Key::Oct(Oct {
            k: jose_b64::B64Secret::new(b"secret".to_vec()),
        }));
        let mut oct = oct;
        oct.params.use_for = Some(KeyUse::Sig);
        oct.params.alg = Some("HS256".into());
        assert!(matcher.matches(&oct));

        let rsa = Jwk::new(Key::Rsa(Rsa {
            n: jose_b64::B64Bytes::new(vec![1; 32]),
            e: jose_b64::B64Bytes::new(vec![1, 0, 1]),
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
            oth: Default::default(),
        }));
        assert!(!matcher.matches(&rsa));
    }

    #[test]
    fn jws_matcher_accepts_key_ops_verify_with_no_use_member() {
        let header = JwsHeader::new(JwsAlg::Hs256);
        let matcher = jws_matcher(&header);

        let mut oct = Jwk::new(Key::Oct(Oct {
            k: jose_b64::B64Secret::new(b"secret".to_vec()),
        }));
        oct.params.alg = Some("HS256".into());
        oct.params.key_ops = [KeyOps::Verify].into_iter().collect();
        assert!(matcher.matches(&oct));
    }

    #[test]
    fn jws_matcher_rejects_key_scoped_to_encrypt_only() {
        let header = JwsHeader::new(JwsAlg::Hs256);
        let matcher = jws_matcher(&header);

        let mut oct = Jwk::new(Key::Oct(Oct {
            k: jose_b64::B64Secret::new(b"secret".to_vec()),
        }));
        oct.params.alg = Some("HS256".into());
        oct.params.key_ops = [KeyOps::Encrypt, KeyOps::Decrypt].into_iter().collect();
        assert!(!matcher.matches(&oct));
    }

    #[test]
    fn dir_matcher_requires_oct_and_enc() {
        let header = JweHeader::new(JweAlg::Dir, EncAlg::A128Gcm);
        let matcher = jwe_matcher(&header);
        let mut oct = Jwk::new(Key::Oct(Oct {
            k: jose_b64::B64Secret::new(vec![0u8; 16]),
        }));
        oct.params.use_for = Some(KeyUse::Enc);
        oct.params.alg = Some("dir".into());
        assert!(matcher.matches(&oct));
    }

    #[test]
    fn ecdh_es_matcher_imposes_no_kty() {
        let header = JweHeader::new(JweAlg::EcdhEs, EncAlg::A128Gcm);
        let matcher = jwe_matcher(&header);
        let mut oct = Jwk::new(Key::Oct(Oct {
            k: jose_b64::B64Secret::new(vec![0u8; 16]),
        }));
        oct.params.use_for = Some(KeyUse::Enc);
        oct.params.alg = Some("ECDH-ES".into());
        assert!(matcher.matches(&oct));
    }
}
