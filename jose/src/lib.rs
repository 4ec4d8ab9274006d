#![cfg_attr(docsrs, feature(doc_auto_cfg))]
#![doc = include_str!("../README.md")]
#![doc(
    html_logo_url = "https://raw.githubusercontent.com/RustCrypto/media/6ee8e381/logo.svg",
    html_favicon_url = "https://raw.githubusercontent.com/RustCrypto/media/6ee8e381/logo.svg"
)]
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

mod error;
mod object;
mod payload;
mod plain;
mod processor;
mod selector;

pub use error::JoseError;
pub use object::JoseObject;
pub use payload::Payload;
pub use plain::PlainObject;
pub use processor::{Processor, ProcessorConfig};

pub use jose_crypto::{CryptoBackend, DefaultBackend, FixedRngBackend};
pub use jose_header::{JweHeader, JweHeaderBuilder, JwsHeader, JwsHeaderBuilder};
pub use jose_jwa::{Algorithm, EncAlg, JweAlg, JwsAlg};
pub use jose_jwe::{JweError, JweObject, JweState};
pub use jose_jwk::{Jwk, JwkSet, KeyType};
pub use jose_jws::{JwsError, JwsObject, JwsState};
