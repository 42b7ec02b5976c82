// RFC1035 message format, plus the handful of later RFCs every resolver
// ends up needing (2535/4035 DNSSEC flag bits, 3596 AAAA, 2782-adjacent
// record types). See https://www.iana.org/assignments/dns-parameters for
// the numeric assignments used throughout this module.

mod bigendians;
mod class;
mod errors;
mod flags;
mod names;
mod opcode;
mod packet;
mod question;
mod rcode;
mod rdata;
mod rr;
mod rrtype;
pub mod tcp;

pub use class::DnsClass;
pub use errors::DnsFormatError;
pub use flags::DnsFlags;
pub use names::{DomainName, NameRelation};
pub use opcode::DnsOpcode;
pub use packet::DnsPacket;
pub use question::DnsQuestion;
pub use rcode::DnsRCode;
pub use rdata::DnsRecordData;
pub use rr::DnsResourceRecord;
pub use rrtype::DnsRRType;
