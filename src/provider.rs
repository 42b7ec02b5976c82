// The pluggable provider/filter contract (spec section 3 and 4.2/4.5).
// Expressed as traits rather than ndns's duck-typed Python objects, per
// the "interface-dispatch" option spec section 9 leaves open.

use std::net::SocketAddr;

use crate::dns::{DnsPacket, DomainName};

// One or more zones' worth of answers. Constructed at startup, immutable
// thereafter (spec section 3: "Lifecycle: constructed at startup from
// configuration, immutable thereafter, destroyed at shutdown").
pub trait Provider: Send + Sync {
    // The zones this provider claims, scoped by the querying client's
    // address. Every concrete provider in this crate ignores `client_addr`
    // and returns a fixed list; the parameter exists because spec section 4.2
    // threads it through `get_zones` for providers that might split
    // authority by requester (split-horizon DNS, views).
    fn zones(&self, client_addr: SocketAddr) -> &[DomainName];

    // Answers `request` (already matched to this provider by the
    // dispatcher's zone-matching algorithm) or returns `None` if the
    // provider has no data at all for the name, in which case the
    // dispatcher falls through to NXDOMAIN (spec section 4.2).
    fn get_response(&self, request: &DnsPacket, client_addr: SocketAddr) -> Option<DnsPacket>;

    // Filters registered on this provider, applied in registration order
    // after `get_response` returns (spec section 4.2/4.5).
    fn filters(&self) -> &[Box<dyn Filter>];
}

// A response post-processor scoped to a provider (spec section 3/4.5).
// Stateful only for its own configuration; `filter` must be idempotent on
// responses that don't match its zone (spec section 3, "Filter" entity).
pub trait Filter: Send + Sync {
    fn filter(&self, request: &DnsPacket, response: DnsPacket) -> DnsPacket;
}
