use thiserror::Error;

use super::{DnsFlags, DnsPacket, DnsRCode};

// A wire-level decode failure. `partial` carries whatever header we'd
// already decoded (the transaction id and flags) at the point things went
// wrong: RFC 1035 nameservers are expected to echo the query id in a
// FORMERR reply whenever that much could be recovered. If we never got that
// far (e.g. the message is shorter than the 12 byte header), there's
// nothing to echo and the caller should drop the packet instead of
// replying (see spec section 7; can't find an RFC reference for this but
// in practice nameservers don't reply to requests too short to have an id).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("dns packet had format error: {message}")]
pub struct DnsFormatError {
    message: String,
    partial: Option<PartialHeader>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct PartialHeader {
    id: u16,
    flags: DnsFlags,
}

impl DnsFormatError {
    pub fn make_error(message: String) -> DnsFormatError {
        DnsFormatError {
            message,
            partial: None,
        }
    }

    pub fn get_message(&self) -> &str {
        &self.message
    }

    // Only the first call sticks: once the header is known it doesn't
    // change as the error propagates back up through name/RR decoding.
    pub(super) fn with_header(mut self, id: u16, flags: DnsFlags) -> DnsFormatError {
        if self.partial.is_none() {
            self.partial = Some(PartialHeader { id, flags });
        }
        self
    }

    // Return a FormError response based on whatever header we decoded
    // before the failure. If we didn't get far enough to have one, we
    // return nothing instead; the caller drops the datagram/connection.
    pub fn get_error_response(&self) -> Option<DnsPacket> {
        let partial = self.partial.as_ref()?;
        let flags = DnsFlags {
            // Set QR bit, this is a reply
            qr_bit: true,
            // Clear AA, TC, RA, and AD bits even if set by client
            aa_bit: false,
            tc_bit: false,
            ra_bit: false,
            ad_bit: false,
            // This is a FormError
            rcode: DnsRCode::FormError,
            // Copy the remaining flags given to us by the client
            ..partial.flags
        };
        Some(DnsPacket {
            id: partial.id,
            flags,
            // Don't return any questions/answers/etc
            questions: Vec::new(),
            answers: Vec::new(),
            nameservers: Vec::new(),
            addl_recs: Vec::new(),
        })
    }
}
