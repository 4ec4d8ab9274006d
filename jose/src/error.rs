use jose_header::HeaderError;
use jose_jwe::JweError;
use jose_jws::JwsError;

/// The stable error taxonomy surfaced by every operation in this crate.
///
/// Low-level cryptographic failures are deliberately coarse:
/// [`Self::SignatureInvalid`] and [`Self::IntegrityFailure`] never carry
/// which candidate key almost worked or why a MAC mismatched, since that
/// detail is exactly what an oracle attack would exploit. Defects that
/// precede any cryptographic operation ([`Self::Malformed`],
/// [`Self::HeaderInvalid`], [`Self::CriticalHeaderNotProcessed`]) are
/// surfaced verbatim, since nothing secret is in play yet.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum JoseError {
    /// Syntactic defect: wrong segment count, invalid base64url, invalid
    /// JSON, or a required header parameter absent.
    #[error("malformed JOSE object")]
    Malformed,
    /// Structural defect: `crit` names a registered parameter, or
    /// `alg: "none"` appears where a real operation is required.
    #[error("invalid header")]
    HeaderInvalid,
    /// The algorithm is recognized but this build has no primitive for it.
    #[error("algorithm unsupported: {0}")]
    AlgorithmUnsupported(String),
    /// `header.alg` is not in the [`crate::ProcessorConfig`]'s expected set.
    #[error("algorithm not in the configured expected set")]
    AlgorithmMismatch,
    /// The JWK's type does not fit the class the algorithm requires.
    #[error("key type does not match algorithm")]
    KeyTypeMismatch,
    /// The key's length does not match what `enc`/`alg` requires.
    #[error("key length does not match algorithm requirement")]
    KeyLengthMismatch,
    /// Key selection produced no candidates.
    #[error("no candidate key found for this header")]
    AlgorithmOrKeyNotFound,
    /// `crit` names a parameter neither built in nor application-deferred.
    #[error("critical header parameter not processed")]
    CriticalHeaderNotProcessed,
    /// An unsecured (`alg: "none"`) object was presented and
    /// [`crate::ProcessorConfig::allow_plain`] is not set.
    #[error("unsecured (alg=none) object rejected by policy")]
    PlainObjectRejected,
    /// A JWS signature or MAC did not verify, for any candidate key.
    #[error("signature invalid")]
    SignatureInvalid,
    /// A JWE authentication tag or key unwrap failed, for any candidate
    /// key.
    #[error("integrity check failed")]
    IntegrityFailure,
    /// An operation was attempted in a state that forbids it.
    #[error("operation not valid in current state")]
    InvalidState,
    /// A cryptographic backend failed for a reason other than a mismatched
    /// key or a failed integrity check.
    #[error("cryptographic backend error")]
    BackendError,
}

impl From<HeaderError> for JoseError {
    fn from(err: HeaderError) -> Self {
        match err {
            HeaderError::CritUnsupported(_) => JoseError::CriticalHeaderNotProcessed,
            HeaderError::CritParameterMissing(_)
            | HeaderError::CritNamesRegistered(_)
            | HeaderError::CritEmpty => JoseError::HeaderInvalid,
        }
    }
}

impl From<JwsError> for JoseError {
    fn from(err: JwsError) -> Self {
        match err {
            JwsError::Malformed => JoseError::Malformed,
            JwsError::HeaderInvalid(e) => e.into(),
            JwsError::AlgorithmUnsupported(name) => JoseError::AlgorithmUnsupported(name),
            JwsError::KeyTypeMismatch => JoseError::KeyTypeMismatch,
            JwsError::InvalidState => JoseError::InvalidState,
            JwsError::BackendError => JoseError::BackendError,
        }
    }
}

impl From<JweError> for JoseError {
    fn from(err: JweError) -> Self {
        match err {
            JweError::Malformed => JoseError::Malformed,
            JweError::HeaderInvalid(e) => e.into(),
            JweError::AlgorithmUnsupported(name) => JoseError::AlgorithmUnsupported(name),
            JweError::KeyTypeMismatch => JoseError::KeyTypeMismatch,
            JweError::InvalidState => JoseError::InvalidState,
            JweError::BackendError => JoseError::BackendError,
        }
    }
}
