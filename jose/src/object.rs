use jose_jwa::JwsAlg;
use jose_jwe::JweObject;
use jose_jws::JwsObject;

use crate::{JoseError, PlainObject};

/// Any JOSE compact serialization, before it is known which kind it is.
///
/// [`Self::parse`] dispatches purely on segment count and, for the
/// three-segment case, on whether `alg` is `"none"`: five segments is
/// always a JWE, three segments with `alg: "none"` is a Plain object,
/// three segments otherwise is a JWS. This is the generic front door;
/// applications that need `crit` policy, algorithm-confusion defense, or
/// multi-key trial should drive a [`crate::Processor`] instead, since this
/// type applies no policy of its own beyond what `jose-jws`/`jose-jwe`
/// enforce on every object regardless of caller intent.
#[derive(Clone, Debug)]
pub enum JoseObject {
    /// An unsecured object (`alg: "none"`).
    Plain(PlainObject),
    /// A JSON Web Signature.
    Jws(JwsObject),
    /// A JSON Web Encryption.
    Jwe(JweObject),
}

impl JoseObject {
    /// Parse any compact serialization, determining its kind from shape.
    pub fn parse(input: &str) -> Result<Self, JoseError> {
        let segment_count = input.matches('.').count() + 1;
        match segment_count {
            5 => Ok(JoseObject::Jwe(JweObject::from_compact(input)?)),
            3 => {
                if is_plain(input) {
                    Ok(JoseObject::Plain(PlainObject::from_compact(input)?))
                } else {
                    Ok(JoseObject::Jws(JwsObject::from_compact(input)?))
                }
            }
            _ => Err(JoseError::Malformed),
        }
    }

    /// Render this object back to its compact serialization.
    pub fn to_compact(&self) -> Result<String, JoseError> {
        match self {
            JoseObject::Plain(p) => p.to_compact(),
            JoseObject::Jws(j) => Ok(j.to_compact()?),
            JoseObject::Jwe(j) => Ok(j.to_compact()?),
        }
    }
}

/// Peek the first segment's `alg` member without committing to a full
/// header parse, to decide between [`JoseObject::Plain`] and
/// [`JoseObject::Jws`].
pub(crate) fn is_plain(input: &str) -> bool {
    #[derive(serde::Deserialize)]
    struct AlgOnly {
        alg: String,
    }

    let Some(header_part) = input.split('.').next() else {
        return false;
    };
    let Ok(bytes) = jose_b64::decode(header_part) else {
        return false;
    };
    match serde_json::from_slice::<AlgOnly>(&bytes) {
        Ok(peek) => JwsAlg::from_name(&peek.alg) == JwsAlg::None,
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jose_crypto::DefaultBackend;
    use jose_header::{JweHeader, JwsHeader};
    use jose_jwa::EncAlg;
    use jose_jwk::{Jwk, Key, Oct};
    use pretty_assertions::assert_eq;

    fn oct_key(bytes: &[u8]) -> Jwk {
        Jwk::new(Key::Oct(Oct {
            k: jose_b64::B64Secret::new(bytes.to_vec()),
        }))
    }

    #[test]
    fn dispatches_plain_by_alg_none() {
        let header = JwsHeader::new(JwsAlg::None);
        let plain = PlainObject::new(header, b"x".to_vec()).unwrap();
        let compact = plain.to_compact().unwrap();
        assert!(matches!(
            JoseObject::parse(&compact).unwrap(),
            JoseObject::Plain(_)
        ));
    }

    #[test]
    fn dispatches_jws_by_three_segments_non_none() {
        let header = JwsHeader::new(JwsAlg::Hs256);
        let key = oct_key(b"0123456789abcdef0123456789abcdef");
        let mut jws = JwsObject::new(header, b"hi".to_vec()).unwrap();
        jws.sign(&DefaultBackend, &key).unwrap();
        let compact = jws.to_compact().unwrap();
        assert!(matches!(
            JoseObject::parse(&compact).unwrap(),
            JoseObject::Jws(_)
        ));
    }

    #[test]
    fn dispatches_jwe_by_five_segments() {
        let header = JweHeader::new(jose_jwa::JweAlg::Dir, EncAlg::A128Gcm);
        let key = oct_key(&[0x11; 16]);
        let mut jwe = JweObject::new(header, b"hi".to_vec()).unwrap();
        jwe.encrypt(&DefaultBackend, &key).unwrap();
        let compact = jwe.to_compact().unwrap();
        assert!(matches!(
            JoseObject::parse(&compact).unwrap(),
            JoseObject::Jwe(_)
        ));
    }

    #[test]
    fn malformed_segment_count_rejected() {
        assert!(JoseObject::parse("a.b.c.d").is_err());
    }
}
