use jose_b64::Json;
use jose_header::JwsHeader;
use jose_jwa::JwsAlg;

use crate::JoseError;

/// An unsecured JOSE object (RFC7515 §5 "Plain" form, `alg: "none"`).
///
/// Carries a header and a payload with no integrity protection whatsoever.
/// Reuses [`JwsHeader`]'s shape (it is, after all, the same set of
/// registered parameters) rather than a fourth bespoke header type; the
/// invariant enforced everywhere this type is constructed or parsed is that
/// `header.alg == JwsAlg::None`.
///
/// [`crate::Processor`] rejects this variant by default; an application
/// that wants to accept unsecured objects must opt in with
/// [`crate::ProcessorConfig::allow_plain`].
#[derive(Clone, Debug)]
pub struct PlainObject {
    header: Json<JwsHeader>,
    payload: Vec<u8>,
    payload_segment: Option<String>,
}

impl PlainObject {
    /// Construct a Plain object, forcing `header.alg` to [`JwsAlg::None`]
    /// regardless of what was passed in.
    pub fn new(mut header: JwsHeader, payload: impl Into<Vec<u8>>) -> Result<Self, JoseError> {
        header.alg = JwsAlg::None;
        header.validate_crit(&[])?;
        let header = Json::new(header).map_err(|_| JoseError::Malformed)?;
        Ok(Self {
            header,
            payload: payload.into(),
            payload_segment: None,
        })
    }

    /// The header of this object. `header.alg` is always [`JwsAlg::None`].
    pub fn header(&self) -> &JwsHeader {
        self.header.get()
    }

    /// The payload bytes.
    pub fn payload(&self) -> &[u8] {
        &self.payload
    }

    /// Render to the three-segment compact form `header.payload.` (RFC7515
    /// §5 Plain/unsecured JWS), with an always-empty trailing segment.
    pub fn to_compact(&self) -> Result<String, JoseError> {
        let header_b64 = self
            .header
            .to_base64url()
            .map_err(|_| JoseError::Malformed)?;
        let payload_b64 = match &self.payload_segment {
            Some(s) => s.clone(),
            None => jose_b64::encode(&self.payload),
        };
        Ok(format!("{header_b64}.{payload_b64}."))
    }

    /// Parse `header.payload.` where `header.alg == "none"` and the
    /// trailing segment is empty.
    pub fn from_compact(input: &str) -> Result<Self, JoseError> {
        let mut parts = input.split('.');
        let (Some(header_part), Some(payload_part), Some(""), None) = (
            parts.next(),
            parts.next(),
            parts.next(),
            parts.next(),
        ) else {
            return Err(JoseError::Malformed);
        };

        let header: Json<JwsHeader> =
            Json::parse(header_part).map_err(|_| JoseError::Malformed)?;
        if header.get().alg != JwsAlg::None {
            return Err(JoseError::Malformed);
        }
        header.get().validate_crit(&[])?;

        let payload = jose_b64::decode(payload_part).map_err(|_| JoseError::Malformed)?;
        Ok(Self {
            header,
            payload,
            payload_segment: Some(payload_part.to_string()),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn round_trips_through_compact() {
        let header = JwsHeader::new(JwsAlg::None);
        let plain = PlainObject::new(header, b"hello".to_vec()).unwrap();
        let compact = plain.to_compact().unwrap();
        assert!(compact.ends_with('.'));

        let parsed = PlainObject::from_compact(&compact).unwrap();
        assert_eq!(parsed.payload(), b"hello");
        assert_eq!(parsed.header().alg, JwsAlg::None);
    }

    #[test]
    fn construction_forces_alg_none() {
        let header = JwsHeader::new(JwsAlg::Hs256);
        let plain = PlainObject::new(header, b"x".to_vec()).unwrap();
        assert_eq!(plain.header().alg, JwsAlg::None);
    }

    #[test]
    fn rejects_non_empty_trailing_segment() {
        let header = JwsHeader::new(JwsAlg::None);
        let plain = PlainObject::new(header, b"x".to_vec()).unwrap();
        let mut compact = plain.to_compact().unwrap();
        compact.push('x');
        assert!(PlainObject::from_compact(&compact).is_err());
    }
}
