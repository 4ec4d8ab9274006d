use alloc::string::String;

use jose_jwa::{KeyOps, KeyType, KeyUse};

use crate::{Jwk, Key};

/// A predicate over a JWK's metadata, used to select a usable key out of a
/// `JwkSet` for a given operation.
///
/// Every predicate set on the matcher must hold for a key to match; an
/// unset predicate imposes no constraint. Constructed with the builder
/// methods and applied with [`JwkMatcher::matches`] or
/// [`JwkMatcher::select`].
#[derive(Clone, Debug, Default)]
pub struct JwkMatcher {
    kty: Option<KeyType>,
    use_for: Option<KeyUse>,
    key_ops: Option<KeyOps>,
    usable_as: Option<(KeyUse, KeyOps)>,
    alg: Option<String>,
    kid: Option<String>,
    curve: Option<String>,
    min_key_bits: Option<u32>,
    max_key_bits: Option<u32>,
    x5t: Option<[u8; 20]>,
    x5t_s256: Option<[u8; 32]>,
}

impl JwkMatcher {
    /// A matcher with no constraints; matches every key.
    pub fn new() -> Self {
        Self::default()
    }

    /// Require a specific key type.
    pub fn kty(mut self, kty: KeyType) -> Self {
        self.kty = Some(kty);
        self
    }

    /// Require the key's `use` to be this value. A key with no `use`
    /// member at all does not match: every predicate on this matcher is
    /// "null field in JWK with a constrained predicate → no match", not an
    /// absent-means-wildcard rule. A key usable for multiple purposes must
    /// say so via `key_ops` (see [`Self::key_ops`]) or by omitting `use`
    /// and being selected through an unconstrained matcher instead.
    pub fn use_for(mut self, use_for: KeyUse) -> Self {
        self.use_for = Some(use_for);
        self
    }

    /// Require the key's `key_ops` to contain this operation. A key with
    /// no `key_ops` member at all (or an empty one) does not match, for
    /// the same reason as [`Self::use_for`].
    pub fn key_ops(mut self, op: KeyOps) -> Self {
        self.key_ops = Some(op);
        self
    }

    /// Require the key to be usable for `use_for` either directly
    /// (`use` equals `use_for`) or via `key_ops` (`key_ops` contains
    /// `op`) — the `use=sig (or sig∈key_ops)` alternative RFC7517 §4.3
    /// allows a key to declare through either member. Unlike
    /// [`Self::use_for`]/[`Self::key_ops`], this predicate only requires
    /// *one* of the two JWK fields to be present and matching, not both.
    pub fn usable_as(mut self, use_for: KeyUse, op: KeyOps) -> Self {
        self.usable_as = Some((use_for, op));
        self
    }

    /// Require a specific `alg` member. A key with no `alg` member at all
    /// does not match.
    pub fn alg(mut self, alg: impl Into<String>) -> Self {
        self.alg = Some(alg.into());
        self
    }

    /// Require a specific `kid` member.
    pub fn kid(mut self, kid: impl Into<String>) -> Self {
        self.kid = Some(kid.into());
        self
    }

    /// Require a specific curve name (`crv`), for EC or OKP keys.
    pub fn curve(mut self, crv: impl Into<String>) -> Self {
        self.curve = Some(crv.into());
        self
    }

    /// Require the key's size, in bits, to be at least this value.
    pub fn min_key_bits(mut self, bits: u32) -> Self {
        self.min_key_bits = Some(bits);
        self
    }

    /// Require the key's size, in bits, to be at most this value.
    pub fn max_key_bits(mut self, bits: u32) -> Self {
        self.max_key_bits = Some(bits);
        self
    }

    /// Require a specific X.509 SHA-1 thumbprint (`x5t`).
    pub fn x5t(mut self, thumbprint: [u8; 20]) -> Self {
        self.x5t = Some(thumbprint);
        self
    }

    /// Require a specific X.509 SHA-256 thumbprint (`x5t#S256`).
    pub fn x5t_s256(mut self, thumbprint: [u8; 32]) -> Self {
        self.x5t_s256 = Some(thumbprint);
        self
    }

    /// Test whether `jwk` satisfies every constraint set on this matcher.
    pub fn matches(&self, jwk: &Jwk) -> bool {
        if let Some(kty) = self.kty {
            if key_type(&jwk.key) != kty {
                return false;
            }
        }
        if let Some(want) = self.use_for {
            match jwk.params.use_for {
                Some(have) if have == want => {}
                _ => return false,
            }
        }
        if let Some(want) = self.key_ops {
            if !jwk.params.key_ops.contains(&want) {
                return false;
            }
        }
        if let Some((want_use, want_op)) = self.usable_as {
            let via_use = jwk.params.use_for == Some(want_use);
            let via_ops = jwk.params.key_ops.contains(&want_op);
            if !via_use && !via_ops {
                return false;
            }
        }
        if let Some(want) = &self.alg {
            match &jwk.params.alg {
                Some(have) if have == want => {}
                _ => return false,
            }
        }
        if let Some(want) = &self.kid {
            match &jwk.params.kid {
                Some(have) if have == want => {}
                _ => return false,
            }
        }
        if let Some(want) = &self.curve {
            match curve_name(&jwk.key) {
                Some(have) if &have == want => {}
                _ => return false,
            }
        }
        if let Some(min) = self.min_key_bits {
            if key_bits(&jwk.key) < min {
                return false;
            }
        }
        if let Some(max) = self.max_key_bits {
            if key_bits(&jwk.key) > max {
                return false;
            }
        }
        if let Some(want) = self.x5t {
            match jwk.params.x509.as_deref().and_then(|x| x.x5t.as_ref()) {
                Some(have) if have.as_ref() == &want[..] => {}
                _ => return false,
            }
        }
        if let Some(want) = self.x5t_s256 {
            match jwk
                .params
                .x509
                .as_deref()
                .and_then(|x| x.x5t_s256.as_ref())
            {
                Some(have) if have.as_ref() == &want[..] => {}
                _ => return false,
            }
        }
        true
    }

    /// Return the first key in `keys` that satisfies this matcher.
    pub fn select<'a>(&self, keys: impl IntoIterator<Item = &'a Jwk>) -> Option<&'a Jwk> {
        keys.into_iter().find(|jwk| self.matches(jwk))
    }

    /// Return every key in `keys` that satisfies this matcher.
    pub fn select_all<'a>(
        &self,
        keys: impl IntoIterator<Item = &'a Jwk>,
    ) -> impl Iterator<Item = &'a Jwk> {
        keys.into_iter().filter(move |jwk| self.matches(jwk))
    }
}

fn key_type(key: &Key) -> KeyType {
    match key {
        Key::Ec(_) => KeyType::Ec,
        Key::Rsa(_) => KeyType::Rsa,
        Key::Okp(_) => KeyType::Okp,
        Key::Oct(_) => KeyType::Oct,
    }
}

fn curve_name(key: &Key) -> Option<String> {
    match key {
        Key::Ec(k) => Some(k.crv.name().into()),
        Key::Okp(k) => Some(k.crv.name().into()),
        Key::Rsa(_) | Key::Oct(_) => None,
    }
}

/// An approximation of the key's strength in bits, used for
/// [`JwkMatcher::min_key_bits`]/[`JwkMatcher::max_key_bits`]. For RSA this is
/// the modulus bit length; for EC/OKP it is the curve's nominal size; for a
/// symmetric key it is the literal key length.
fn key_bits(key: &Key) -> u32 {
    match key {
        Key::Ec(k) => k.crv.coordinate_len() as u32 * 8,
        Key::Rsa(k) => {
            let n = k.n.as_ref();
            let leading_zero_bits = n
                .first()
                .map(|b| b.leading_zeros())
                .filter(|_| !n.is_empty())
                .unwrap_or(0);
            (n.len() as u32 * 8).saturating_sub(leading_zero_bits)
        }
        Key::Okp(k) => match k.crv {
            jose_jwa::OkpCurve::Ed25519 | jose_jwa::OkpCurve::X25519 => 256,
            jose_jwa::OkpCurve::Ed448 | jose_jwa::OkpCurve::X448 => 448,
        },
        Key::Oct(k) => k.k.as_ref().len() as u32 * 8,
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use crate::key::Oct;
    use jose_b64::B64Secret;
    use pretty_assertions::assert_eq;

    fn oct_jwk(kid: &str, bytes: &[u8]) -> Jwk {
        let mut jwk = Jwk::new(Key::Oct(Oct {
            k: B64Secret::new(bytes.into()),
        }));
        jwk.params.kid = Some(kid.into());
        jwk
    }

    #[test]
    fn selects_by_kid() {
        let keys = [oct_jwk("a", b"12345678"), oct_jwk("b", b"abcdefgh")];
        let found = JwkMatcher::new().kid("b").select(&keys).unwrap();
        assert_eq!(found.params.kid.as_deref(), Some("b"));
    }

    #[test]
    fn min_key_bits_excludes_short_keys() {
        let keys = [oct_jwk("short", b"1234"), oct_jwk("long", &[0u8; 32])];
        let found = JwkMatcher::new().min_key_bits(256).select(&keys).unwrap();
        assert_eq!(found.params.kid.as_deref(), Some("long"));
    }

    #[test]
    fn kty_mismatch_excludes() {
        let keys = [oct_jwk("only", b"12345678")];
        assert!(JwkMatcher::new().kty(KeyType::Rsa).select(&keys).is_none());
    }
}
