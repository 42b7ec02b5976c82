// Two error enums split the way spec section 10.2 asks: one for failures
// that only happen once, at startup, and one for the per-request failures
// the dispatcher's central error -> rcode table (spec section 4.6) has to
// cover. This mirrors `ndns.DnsError`, which carried an optional rcode
// alongside its message.

use std::net::AddrParseError;
use std::path::PathBuf;

use thiserror::Error;

use crate::dns::{DnsFormatError, DnsRCode};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    Parse(PathBuf, #[source] toml::de::Error),

    #[error("zone file {0} for origin {1} could not be read: {2}")]
    ZoneFileRead(PathBuf, String, std::io::Error),

    #[error("zone file {0} for origin {1} could not be parsed: {2}")]
    ZoneFileParse(PathBuf, String, String),

    #[error("invalid domain name {0:?}: {1}")]
    InvalidName(String, DnsFormatError),

    #[error("invalid listen address {0:?}: {1}")]
    InvalidListenAddr(String, AddrParseError),

    #[error("invalid glue address {0:?} for nameserver {1}: {2}")]
    InvalidGlueAddr(String, String, std::net::AddrParseError),

    #[error("invalid IPv6 prefix {0:?}: {1}")]
    InvalidV6Prefix(String, String),

    #[error("provider has two delegation filters registered for zone {0}")]
    DuplicateDelegationZone(String),

    #[error("config declares no providers; the dispatcher would answer nothing")]
    NoProviders,
}

// Raised by the wire codec, a provider, or a filter while answering one
// request. The dispatcher's top-level match on this is the one place
// spec 4.6's table lives: every variant here carries (or implies) the
// wire rcode that should go back to the client.
#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("malformed dns message: {0}")]
    Malformed(#[from] DnsFormatError),

    #[error("unsupported opcode")]
    UnsupportedOpcode,

    #[error("non-IN query class")]
    UnsupportedClass,

    #[error("empty or multi-question message")]
    BadQuestionCount,

    #[error("no provider claims this name")]
    NoMatchingZone,

    #[error("internal error answering query: {0}")]
    Internal(String),
}

impl DispatchError {
    // The wire rcode this error maps to, per spec section 4.6. `Malformed`
    // has no single rcode here because its FormError response (when one
    // can be built at all) comes from `DnsFormatError::get_error_response`,
    // which needs the partially-decoded header; the dispatcher handles
    // that case before consulting this table.
    pub fn rcode(&self) -> DnsRCode {
        match self {
            DispatchError::Malformed(_) => DnsRCode::FormError,
            DispatchError::UnsupportedOpcode => DnsRCode::NotImp,
            DispatchError::UnsupportedClass => DnsRCode::Refused,
            DispatchError::BadQuestionCount => DnsRCode::FormError,
            DispatchError::NoMatchingZone => DnsRCode::NXDomain,
            DispatchError::Internal(_) => DnsRCode::ServFail,
        }
    }
}
