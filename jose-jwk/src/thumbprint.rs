use alloc::format;
use alloc::string::String;

use sha2::{Digest, Sha256};

use jose_b64::encode;

use crate::Key;

impl Key {
    /// The RFC7638 JWK thumbprint of this key, as a raw SHA-256 digest.
    ///
    /// The digest is computed over the canonical JSON representation:
    /// only the members RFC7638 names as "required" for the key's `kty`,
    /// with keys in lexicographic order and no insignificant whitespace.
    /// Any `kid`, `use`, `key_ops`, or other optional member is excluded,
    /// so two differently-labeled JWKs for the same underlying key produce
    /// the same thumbprint.
    pub fn thumbprint_sha256(&self) -> [u8; 32] {
        Sha256::digest(self.thumbprint_canonical_json().as_bytes()).into()
    }

    /// The RFC7638 JWK thumbprint of this key, base64url-encoded.
    pub fn thumbprint_base64url(&self) -> String {
        encode(self.thumbprint_sha256())
    }

    fn thumbprint_canonical_json(&self) -> String {
        match self {
            Key::Ec(k) => format!(
                r#"{{"crv":"{}","kty":"EC","x":"{}","y":"{}"}}"#,
                k.crv.name(),
                encode(k.x.as_ref()),
                encode(k.y.as_ref()),
            ),
            Key::Rsa(k) => format!(
                r#"{{"e":"{}","kty":"RSA","n":"{}"}}"#,
                encode(k.e.as_ref()),
                encode(k.n.as_ref()),
            ),
            Key::Okp(k) => format!(
                r#"{{"crv":"{}","kty":"OKP","x":"{}"}}"#,
                k.crv.name(),
                encode(k.x.as_ref()),
            ),
            Key::Oct(k) => format!(r#"{{"k":"{}","kty":"oct"}}"#, encode(k.k.as_ref())),
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::Rsa;
    use jose_b64::B64Bytes;
    use pretty_assertions::assert_eq;

    // RFC7638 §3.1 example JWK and expected thumbprint.
    #[test]
    fn rfc7638_example_rsa_thumbprint() {
        let n = jose_b64::decode(
            "0vx7agoebGcQSuuPiLJXZptN9nndrQmbXEps2aiAFbWhM78LhWx4cbbfAAtVT86zwu1RK7aPFFxuhDR1L6tSoc_BJECPebWKRXjBZCiFV4n3oknjhMstn64tZ_2W-5JsGY4Hc5n9yBXArwl93lqt7_RN5w6Cf0h4QyQ5v-65YGjQR0_FDW2QvzqY368QQMicAtaSqzs8KJZgnYb9c7d0zgdAZHzu6qMQvRL5hajrn1n91CbOpbISD08qNLyrdkt-bFTWhAI4vMQFh6WeZu0fM4lFd2NcRwr3XPksINHaQ-G_xBniIqbw0Ls1jF44-csFCur-kEgU8awapJzKnqDKgw",
        )
        .unwrap();
        let e = jose_b64::decode("AQAB").unwrap();
        let key = Key::Rsa(Rsa {
            n: B64Bytes::new(n),
            e: B64Bytes::new(e),
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
            oth: Default::default(),
        });
        assert_eq!(
            key.thumbprint_base64url(),
            "NzbLsXh8uDCcd-6MNwXF4W_7noWXFZAfHkxZsRGC9Xs"
        );
    }

    #[test]
    fn thumbprint_ignores_labels() {
        let n = jose_b64::decode("AQAB").unwrap();
        let key = Key::Rsa(Rsa {
            n: B64Bytes::new(n.clone()),
            e: B64Bytes::new(n),
            d: None,
            p: None,
            q: None,
            dp: None,
            dq: None,
            qi: None,
            oth: Default::default(),
        });
        let mut jwk = crate::Jwk::new(key.clone());
        jwk.params.kid = Some("whatever".into());
        assert_eq!(jwk.key.thumbprint_base64url(), key.thumbprint_base64url());
    }
}
