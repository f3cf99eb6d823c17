//! Error provenance: annotate errors with the call site that raised them,
//! carried inside the message text until the response middleware strips it.

pub mod caller;
pub mod codec;

pub use caller::{resolve, CallSite};
pub use codec::{decode, encode, Decoded};

use std::error::Error as StdError;

use thiserror::Error;

/// An error whose `Display` output is a provenance-encoded message.
///
/// When call-site resolution fails the message stays plain; everything
/// downstream (response bodies, the decode pass in the middleware) degrades
/// gracefully with it.
#[derive(Debug, Error)]
#[error("{encoded}")]
pub struct Annotated {
    encoded: String,
    source: Option<Box<dyn StdError + Send + Sync + 'static>>,
}

impl Annotated {
    /// The encoded message as it travels in a response body.
    pub fn as_str(&self) -> &str {
        &self.encoded
    }
}

/// Annotated error from a plain message, attributed to the caller.
#[inline(never)]
pub fn message<S: Into<String>>(text: S) -> Annotated {
    let plain = text.into();
    Annotated {
        encoded: encode(&plain, resolve(1).as_ref()),
        source: None,
    }
}

/// Wrap an error, attributing it to the immediate caller. The wrapped
/// error stays reachable through `std::error::Error::source`.
#[inline(never)]
pub fn annotate<E>(err: E) -> Annotated
where
    E: StdError + Send + Sync + 'static,
{
    let plain = err.to_string();
    Annotated {
        encoded: encode(&plain, resolve(1).as_ref()),
        source: Some(Box::new(err)),
    }
}

/// Wrap an error, attributing it `skip` frames above the caller. Shared
/// helpers pass the extra hops so provenance lands on the code that is
/// actually responsible, not on the helper.
#[inline(never)]
pub fn annotate_skip<E>(err: E, skip: usize) -> Annotated
where
    E: StdError + Send + Sync + 'static,
{
    let plain = err.to_string();
    Annotated {
        encoded: encode(&plain, resolve(skip.saturating_add(1)).as_ref()),
        source: Some(Box::new(err)),
    }
}
