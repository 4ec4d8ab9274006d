use core::cell::OnceCell;
use core::fmt;

use jose_jws::JwsObject;

use crate::JoseError;

/// The content carried by a JOSE object, once signature verification or
/// decryption has released it.
///
/// The canonical form is the raw byte sequence; every other view (JSON,
/// UTF-8 text, base64url, a nested JWS for signed-then-encrypted content)
/// is computed from it on first access and cached. Equality is defined on
/// the byte sequence alone — two payloads with the same bytes are equal
/// regardless of which views have been materialized.
pub struct Payload {
    bytes: Vec<u8>,
    json: OnceCell<serde_json::Value>,
    utf8: OnceCell<String>,
    base64url: OnceCell<String>,
    nested_jws: OnceCell<Option<JwsObject>>,
}

impl Payload {
    /// Wrap a raw byte sequence.
    pub fn from_bytes(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            json: OnceCell::new(),
            utf8: OnceCell::new(),
            base64url: OnceCell::new(),
            nested_jws: OnceCell::new(),
        }
    }

    /// Serialize `value` to JSON and wrap the result.
    pub fn from_json(value: &impl serde::Serialize) -> Result<Self, JoseError> {
        let bytes = serde_json::to_vec(value).map_err(|_| JoseError::Malformed)?;
        Ok(Self::from_bytes(bytes))
    }

    /// The canonical byte sequence.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Consume the payload, returning its canonical byte sequence.
    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// The payload decoded as a UTF-8 string, cached after the first call.
    pub fn as_str(&self) -> Result<&str, JoseError> {
        if let Some(s) = self.utf8.get() {
            return Ok(s);
        }
        let s = String::from_utf8(self.bytes.clone()).map_err(|_| JoseError::Malformed)?;
        // `get_or_init` isn't usable here since encoding is fallible; a
        // concurrent `set` losing this race just means the next caller
        // redoes the work, not a correctness issue for a type that isn't
        // `Sync`.
        let _ = self.utf8.set(s);
        Ok(self.utf8.get().expect("just set"))
    }

    /// The payload parsed as a JSON value, cached after the first call.
    pub fn as_json(&self) -> Result<&serde_json::Value, JoseError> {
        if let Some(v) = self.json.get() {
            return Ok(v);
        }
        let value: serde_json::Value =
            serde_json::from_slice(&self.bytes).map_err(|_| JoseError::Malformed)?;
        let _ = self.json.set(value);
        Ok(self.json.get().expect("just set"))
    }

    /// The payload's unpadded base64url encoding, cached after the first
    /// call. Always succeeds.
    pub fn to_base64url(&self) -> &str {
        self.base64url
            .get_or_init(|| jose_b64::encode(&self.bytes))
    }

    /// The payload parsed as a nested JWS compact serialization (RFC7519
    /// §5.3's "nested JWT" pattern, generalized beyond claims payloads).
    /// `None` if the bytes are not valid UTF-8 or not a parseable JWS.
    pub fn as_nested_jws(&self) -> Option<&JwsObject> {
        self.nested_jws
            .get_or_init(|| {
                core::str::from_utf8(&self.bytes)
                    .ok()
                    .and_then(|s| JwsObject::from_compact(s).ok())
            })
            .as_ref()
    }
}

impl Clone for Payload {
    /// Clones the canonical bytes only; cached views are recomputed lazily
    /// in the new value rather than copied.
    fn clone(&self) -> Self {
        Self::from_bytes(self.bytes.clone())
    }
}

impl PartialEq for Payload {
    fn eq(&self, other: &Self) -> bool {
        self.bytes == other.bytes
    }
}
impl Eq for Payload {}

impl fmt::Debug for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("Payload");
        match core::str::from_utf8(&self.bytes) {
            Ok(text) => s.field("utf8", &text),
            Err(_) => s.field("bytes", &self.bytes.len()),
        };
        s.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn equality_ignores_cached_views() {
        let a = Payload::from_bytes(b"hello".to_vec());
        let b = Payload::from_bytes(b"hello".to_vec());
        let _ = a.as_str();
        assert_eq!(a, b);
    }

    #[test]
    fn json_view_is_cached_and_correct() {
        let payload = Payload::from_bytes(br#"{"iss":"joe"}"#.to_vec());
        assert_eq!(payload.as_json().unwrap()["iss"], "joe");
        assert_eq!(payload.as_json().unwrap()["iss"], "joe");
    }

    #[test]
    fn non_utf8_bytes_reject_str_view() {
        let payload = Payload::from_bytes(vec![0xff, 0xfe]);
        assert!(payload.as_str().is_err());
    }

    #[test]
    fn base64url_view_round_trips() {
        let payload = Payload::from_bytes(b"attack at dawn".to_vec());
        assert_eq!(
            jose_b64::decode(payload.to_base64url()).unwrap(),
            b"attack at dawn"
        );
    }

    #[test]
    fn clone_drops_but_recomputes_views() {
        let original = Payload::from_bytes(b"hello world".to_vec());
        let _ = original.as_str();
        let cloned = original.clone();
        assert_eq!(cloned.as_str().unwrap(), "hello world");
    }
}
