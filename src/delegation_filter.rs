// DelegationFilter: rewrites an authoritative response into an NS referral
// with glue when the queried name falls under a delegated sub-zone (spec
// section 4.5). Grounded on `ndns`'s `filters/delegation.py`.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::net::IpAddr;

use crate::dns::{DnsClass, DnsFlags, DnsOpcode, DnsPacket, DnsRCode, DnsRecordData, DnsResourceRecord, DomainName};
use crate::error::ConfigError;
use crate::provider::Filter;

pub struct DelegationFilter {
    zone: DomainName,
    nameservers: Vec<DomainName>,
    glue: HashMap<DomainName, Vec<IpAddr>>,
    ttl: u32,
}

impl DelegationFilter {
    // `glue` is iterated in the caller-supplied order exactly once (spec
    // section 9, open question 4: replaces the source's non-deterministic
    // mutation of a shared map during initialization).
    pub fn new(
        zone: &str,
        nameservers: &[String],
        ttl: u32,
        glue: Vec<(String, Vec<String>)>,
    ) -> Result<DelegationFilter, ConfigError> {
        let zone = DomainName::from_text(zone).map_err(|e| ConfigError::InvalidName(zone.to_string(), e))?;

        let nameservers = nameservers
            .iter()
            .map(|ns| DomainName::from_text(ns).map_err(|e| ConfigError::InvalidName(ns.clone(), e)))
            .collect::<Result<Vec<_>, _>>()?;

        let mut glue_map = HashMap::new();
        for (name, addresses) in glue {
            let owner = DomainName::from_text(&name).map_err(|e| ConfigError::InvalidName(name.clone(), e))?;
            let parsed = addresses
                .iter()
                .map(|addr| {
                    addr.parse::<IpAddr>()
                        .map_err(|e| ConfigError::InvalidGlueAddr(addr.clone(), name.clone(), e))
                })
                .collect::<Result<Vec<_>, _>>()?;
            glue_map.insert(owner, parsed);
        }

        Ok(DelegationFilter {
            zone,
            nameservers,
            glue: glue_map,
            ttl,
        })
    }

    pub fn zone(&self) -> &DomainName {
        &self.zone
    }
}

impl Filter for DelegationFilter {
    fn filter(&self, request: &DnsPacket, response: DnsPacket) -> DnsPacket {
        let Some(question) = request.questions.first() else {
            return response;
        };
        if !question.qname.is_subdomain(&self.zone) {
            return response;
        }

        let mut referral = DnsPacket {
            id: request.id,
            flags: DnsFlags {
                qr_bit: true,
                opcode: DnsOpcode::Query,
                // This is a referral, not an authoritative answer (spec
                // section 4.5): AA stays clear even though the provider's
                // own response (now discarded) may have set it.
                aa_bit: false,
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

        for ns in &self.nameservers {
            referral.answers.push(DnsResourceRecord::new(
                self.zone.clone(),
                DnsClass::IN,
                self.ttl,
                DnsRecordData::NS(ns.clone()),
            ));
        }

        for ns in &self.nameservers {
            let Some(addresses) = self.glue.get(ns) else {
                continue;
            };
            for addr in addresses {
                let rdata = match addr {
                    IpAddr::V4(v4) => DnsRecordData::A(*v4),
                    IpAddr::V6(v6) => DnsRecordData::AAAA(*v6),
                };
                referral
                    .addl_recs
                    .push(DnsResourceRecord::new(ns.clone(), DnsClass::IN, self.ttl, rdata));
            }
        }

        referral
    }
}

impl PartialEq for DelegationFilter {
    fn eq(&self, other: &Self) -> bool {
        self.zone == other.zone
    }
}
impl Eq for DelegationFilter {}

impl PartialOrd for DelegationFilter {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for DelegationFilter {
    fn cmp(&self, other: &Self) -> Ordering {
        self.zone.cmp(&other.zone)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dns::{DnsQuestion, DnsRRType};

    fn filter() -> DelegationFilter {
        DelegationFilter::new(
            "sub.example.",
            &["ns1.sub.example.".to_string()],
            7200,
            vec![("ns1.sub.example.".to_string(), vec!["192.0.2.1".to_string()])],
        )
        .unwrap()
    }

    fn request(name: &str) -> DnsPacket {
        DnsPacket {
            id: 42,
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
            questions: vec![DnsQuestion::new(
                DomainName::from_text(name).unwrap(),
                DnsRRType::A,
                DnsClass::IN,
            )],
            answers: Vec::new(),
            nameservers: Vec::new(),
            addl_recs: Vec::new(),
        }
    }

    fn noerror_response(req: &DnsPacket) -> DnsPacket {
        DnsPacket {
            id: req.id,
            flags: DnsFlags {
                qr_bit: true,
                opcode: DnsOpcode::Query,
                aa_bit: true,
                tc_bit: false,
                rd_bit: req.flags.rd_bit,
                ra_bit: false,
                ad_bit: false,
                cd_bit: false,
                rcode: DnsRCode::NXDomain,
            },
            questions: req.questions.clone(),
            answers: Vec::new(),
            nameservers: Vec::new(),
            addl_recs: Vec::new(),
        }
    }

    #[test]
    fn delegates_subdomain_with_glue() {
        let f = filter();
        let req = request("x.sub.example.");
        let response = f.filter(&req, noerror_response(&req));
        assert_eq!(response.flags.aa_bit, false);
        assert_eq!(response.flags.rcode, DnsRCode::NoError);
        assert_eq!(response.answers.len(), 1);
        assert_eq!(response.answers[0].name, DomainName::from_text("sub.example.").unwrap());
        assert_eq!(response.addl_recs.len(), 1);
        assert_eq!(
            response.addl_recs[0].rdata,
            DnsRecordData::A("192.0.2.1".parse().unwrap())
        );
    }

    #[test]
    fn leaves_unrelated_names_untouched() {
        let f = filter();
        let req = request("other.example.");
        let original = noerror_response(&req);
        let response = f.filter(&req, noerror_response(&req));
        assert_eq!(response.flags, original.flags);
        assert_eq!(response.answers, original.answers);
    }

    #[test]
    fn idempotent_when_applied_twice() {
        let f = filter();
        let req = request("x.sub.example.");
        let once = f.filter(&req, noerror_response(&req));
        let twice = f.filter(&req, once.clone());
        assert_eq!(once, twice);
    }

    #[test]
    fn rejects_malformed_glue_address() {
        let result = DelegationFilter::new(
            "sub.example.",
            &["ns1.sub.example.".to_string()],
            7200,
            vec![("ns1.sub.example.".to_string(), vec!["not-an-ip".to_string()])],
        );
        assert!(result.is_err());
    }
}
