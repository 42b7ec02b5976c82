// ZoneFileProvider: an in-memory zone served from a parsed master file,
// with wildcard resolution (spec section 4.3). Grounded on `ndns`'s
// `providers/file.py`, generalized from dnspython's zone object onto this
// crate's own wire types via `crate::zonefile`.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::path::Path;

use crate::dns::{
    DnsClass, DnsFlags, DnsOpcode, DnsPacket, DnsRCode, DnsRRType, DnsRecordData,
    DnsResourceRecord, DomainName,
};
use crate::error::ConfigError;
use crate::provider::{Filter, Provider};
use crate::zonefile;

pub struct ZoneFileProvider {
    apex: DomainName,
    zones: Vec<DomainName>,
    // owner name -> rrtype -> rrset. Invariant (spec section 3): every key
    // here is a subdomain of or equal to `apex`.
    records: HashMap<DomainName, HashMap<DnsRRType, Vec<DnsResourceRecord>>>,
    filters: Vec<Box<dyn Filter>>,
}

impl ZoneFileProvider {
    pub fn load(
        path: &Path,
        origin: &str,
        filters: Vec<Box<dyn Filter>>,
    ) -> Result<ZoneFileProvider, ConfigError> {
        let apex = DomainName::from_text(origin)
            .map_err(|e| ConfigError::InvalidName(origin.to_string(), e))?;
        let parsed = zonefile::load_zone_file(path, origin)?;
        Self::from_records(apex, parsed, filters)
    }

    pub fn from_records(
        apex: DomainName,
        records: Vec<DnsResourceRecord>,
        filters: Vec<Box<dyn Filter>>,
    ) -> Result<ZoneFileProvider, ConfigError> {
        let mut by_name: HashMap<DomainName, HashMap<DnsRRType, Vec<DnsResourceRecord>>> =
            HashMap::new();
        for rr in records {
            if !rr.name.is_subdomain(&apex) {
                return Err(ConfigError::ZoneFileParse(
                    std::path::PathBuf::new(),
                    apex.to_text(),
                    format!("record {} is not within the zone's apex", rr.name),
                ));
            }
            by_name
                .entry(rr.name.clone())
                .or_default()
                .entry(rr.rr_type())
                .or_default()
                .push(rr);
        }

        Ok(ZoneFileProvider {
            zones: vec![apex.clone()],
            apex,
            records: by_name,
            filters,
        })
    }

    // Direct (non-wildcard) lookup of `qtype` RRs at exactly `name`.
    fn lookup_direct(&self, name: &DomainName, qtype: DnsRRType) -> Option<Vec<DnsResourceRecord>> {
        let by_type = self.records.get(name)?;
        if qtype == DnsRRType::ANY {
            let all: Vec<DnsResourceRecord> =
                by_type.values().flat_map(|rrs| rrs.iter().cloned()).collect();
            (!all.is_empty()).then_some(all)
        } else {
            by_type.get(&qtype).cloned()
        }
    }

    // Wildcard recursion (spec section 4.3): starting at `name`'s parent,
    // try `*.P`, ascending one label at a time until `P` is the apex.
    fn lookup_wildcard(&self, name: &DomainName, qtype: DnsRRType) -> Option<Vec<DnsResourceRecord>> {
        let mut parent = name.parent()?;
        loop {
            if let Some(found) = self.lookup_direct(&parent.with_wildcard_prefix(), qtype) {
                return Some(found);
            }
            if parent == self.apex {
                return None;
            }
            parent = parent.parent()?;
        }
    }

    // Whether `name` resolves to anything at all (direct or wildcard,
    // any type). Used to distinguish NODATA (name exists, wrong type)
    // from NXDOMAIN (name doesn't exist even via a wildcard).
    fn name_exists(&self, name: &DomainName) -> bool {
        self.lookup_direct(name, DnsRRType::ANY).is_some()
            || self.lookup_wildcard(name, DnsRRType::ANY).is_some()
    }

    fn apex_soa(&self) -> Option<&DnsResourceRecord> {
        self.records
            .get(&self.apex)
            .and_then(|by_type| by_type.get(&DnsRRType::SOA))
            .and_then(|rrs| rrs.first())
    }
}

impl Provider for ZoneFileProvider {
    fn zones(&self, _client_addr: SocketAddr) -> &[DomainName] {
        &self.zones
    }

    fn get_response(&self, request: &DnsPacket, _client_addr: SocketAddr) -> Option<DnsPacket> {
        let question = request.questions.first()?;

        let mut response = DnsPacket {
            id: request.id,
            flags: DnsFlags {
                qr_bit: true,
                opcode: DnsOpcode::Query,
                aa_bit: true,
                tc_bit: false,
                rd_bit: request.flags.rd_bit,
                ra_bit: false,
                ad_bit: false,
                cd_bit: false,
                rcode: DnsRCode::NoError,
            },
            questions: request.questions.clone(),
            answers: Vec::new(),
            nameservers: Vec::new(),
            addl_recs: Vec::new(),
        };

        let found = self
            .lookup_direct(&question.qname, question.qtype)
            .or_else(|| self.lookup_wildcard(&question.qname, question.qtype));

        match found {
            Some(rrs) if !rrs.is_empty() => {
                // The wildcard owner is hidden from the client: every answer
                // is emitted under the queried name (spec section 4.3).
                response.answers = rrs
                    .into_iter()
                    .map(|rr| DnsResourceRecord::new(question.qname.clone(), rr.class, rr.ttl, rr.rdata))
                    .collect();
            }
            _ => {
                response.flags.rcode = if self.name_exists(&question.qname) {
                    DnsRCode::NoError
                } else {
                    DnsRCode::NXDomain
                };
                if let Some(soa) = self.apex_soa() {
                    if let DnsRecordData::SOA { minimum, .. } = &soa.rdata {
                        response.nameservers.push(DnsResourceRecord::new(
                            self.apex.clone(),
                            DnsClass::IN,
                            *minimum,
                            soa.rdata.clone(),
                        ));
                    }
                }
            }
        }

        Some(response)
    }

    fn filters(&self) -> &[Box<dyn Filter>] {
        &self.filters
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    fn apex() -> DomainName {
        DomainName::from_text("example.").unwrap()
    }

    fn rr(name: &str, ttl: u32, rdata: DnsRecordData) -> DnsResourceRecord {
        DnsResourceRecord::new(DomainName::from_text(name).unwrap(), DnsClass::IN, ttl, rdata)
    }

    fn soa_rr() -> DnsResourceRecord {
        rr(
            "example.",
            3600,
            DnsRecordData::SOA {
                mname: DomainName::from_text("ns1.example.").unwrap(),
                rname: DomainName::from_text("hostmaster.example.").unwrap(),
                serial: 2024010100,
                refresh: 3600,
                retry: 600,
                expire: 604800,
                minimum: 300,
            },
        )
    }

    fn provider() -> ZoneFileProvider {
        let records = vec![
            soa_rr(),
            rr("www.example.", 3600, DnsRecordData::A(Ipv4Addr::new(10, 0, 0, 1))),
            rr(
                "*.wild.example.",
                3600,
                DnsRecordData::A(Ipv4Addr::new(10, 0, 0, 9)),
            ),
        ];
        ZoneFileProvider::from_records(apex(), records, Vec::new()).unwrap()
    }

    fn query(name: &str, qtype: DnsRRType) -> DnsPacket {
        DnsPacket {
            id: 1,
            flags: DnsFlags {
                qr_bit: false,
                opcode: DnsOpcode::Query,
                aa_bit: false,
                tc_bit: false,
                rd_bit: true,
                ra_bit: false,
                ad_bit: false,
                cd_bit: false,
                rcode: DnsRCode::NoError,
            },
            questions: vec![crate::dns::DnsQuestion::new(
                DomainName::from_text(name).unwrap(),
                qtype,
                DnsClass::IN,
            )],
            answers: Vec::new(),
            nameservers: Vec::new(),
            addl_recs: Vec::new(),
        }
    }

    #[test]
    fn direct_hit_returns_noerror() {
        let p = provider();
        let client: SocketAddr = "127.0.0.1:5353".parse().unwrap();
        let response = p
            .get_response(&query("www.example.", DnsRRType::A), client)
            .unwrap();
        assert_eq!(response.flags.rcode, DnsRCode::NoError);
        assert_eq!(response.answers.len(), 1);
    }

    #[test]
    fn missing_name_is_nxdomain_with_soa_authority() {
        let p = provider();
        let client: SocketAddr = "127.0.0.1:5353".parse().unwrap();
        let response = p
            .get_response(&query("missing.example.", DnsRRType::A), client)
            .unwrap();
        assert_eq!(response.flags.rcode, DnsRCode::NXDomain);
        assert_eq!(response.nameservers.len(), 1);
        assert_eq!(response.nameservers[0].name, apex());
    }

    #[test]
    fn existing_name_wrong_type_is_nodata_not_nxdomain() {
        let p = provider();
        let client: SocketAddr = "127.0.0.1:5353".parse().unwrap();
        let response = p
            .get_response(&query("www.example.", DnsRRType::MX), client)
            .unwrap();
        assert_eq!(response.flags.rcode, DnsRCode::NoError);
        assert!(response.answers.is_empty());
        assert_eq!(response.nameservers.len(), 1);
    }

    #[test]
    fn wildcard_resolves_and_hides_its_owner() {
        let p = provider();
        let client: SocketAddr = "127.0.0.1:5353".parse().unwrap();
        let response = p
            .get_response(&query("anything.wild.example.", DnsRRType::A), client)
            .unwrap();
        assert_eq!(response.flags.rcode, DnsRCode::NoError);
        assert_eq!(response.answers.len(), 1);
        assert_eq!(
            response.answers[0].name,
            DomainName::from_text("anything.wild.example.").unwrap()
        );
    }

    #[test]
    fn apex_soa_query_is_served_from_answer_section() {
        let p = provider();
        let client: SocketAddr = "127.0.0.1:5353".parse().unwrap();
        let response = p
            .get_response(&query("example.", DnsRRType::SOA), client)
            .unwrap();
        assert_eq!(response.flags.rcode, DnsRCode::NoError);
        assert_eq!(response.answers.len(), 1);
    }
}
