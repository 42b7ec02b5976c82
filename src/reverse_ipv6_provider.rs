// ReverseIPv6Provider: synthesizes AAAA/PTR answers for an IPv6 /n prefix
// from its textual form instead of storing a record per address (spec
// section 4.4). Grounded on `ndns`'s `providers/reverseipv6.py`
// (itself adapted from Robert Mibus's pymds auto-reverse filter).

use std::net::{Ipv6Addr, SocketAddr};

use chrono::Utc;

use crate::dns::{
    DnsClass, DnsFlags, DnsOpcode, DnsPacket, DnsRCode, DnsRRType, DnsRecordData,
    DnsResourceRecord, DomainName,
};
use crate::error::ConfigError;
use crate::provider::{Filter, Provider};

pub struct SoaConfig {
    pub mname: String,
    pub rname: String,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
    pub ttl: u32,
}

pub struct ReverseIPv6Provider {
    forward_zone: DomainName,
    reverse_zone: DomainName,
    prefix_groups: Vec<String>,
    nameservers: Vec<DomainName>,
    soa: (DomainName, DomainName, u32, u32, u32, u32, u32), // mname, rname, serial, refresh, retry, expire, minimum
    soa_ttl: u32,
    zones: Vec<DomainName>,
    filters: Vec<Box<dyn Filter>>,
}

impl ReverseIPv6Provider {
    pub fn new(
        forward_zone: &str,
        v6_prefix: &str,
        nameservers: &[String],
        soa: SoaConfig,
        filters: Vec<Box<dyn Filter>>,
    ) -> Result<ReverseIPv6Provider, ConfigError> {
        let forward_zone = DomainName::from_text(forward_zone)
            .map_err(|e| ConfigError::InvalidName(forward_zone.to_string(), e))?;

        let prefix_groups = parse_prefix_groups(v6_prefix)?;
        let reverse_zone = reverse_zone_from_groups(&prefix_groups);

        let ns_names = nameservers
            .iter()
            .map(|ns| DomainName::from_text(ns).map_err(|e| ConfigError::InvalidName(ns.clone(), e)))
            .collect::<Result<Vec<_>, _>>()?;

        let soa_mname = DomainName::from_text(&soa.mname)
            .map_err(|e| ConfigError::InvalidName(soa.mname.clone(), e))?;
        let soa_rname = DomainName::from_text(&soa.rname)
            .map_err(|e| ConfigError::InvalidName(soa.rname.clone(), e))?;
        // Serial = YYYYMMDD00 at boot time, per spec section 4.4.
        let serial: u32 = format!("{}00", Utc::now().format("%Y%m%d"))
            .parse()
            .expect("YYYYMMDD00 always fits in a u32");

        Ok(ReverseIPv6Provider {
            zones: vec![reverse_zone.clone(), forward_zone.clone()],
            forward_zone,
            reverse_zone,
            prefix_groups,
            nameservers: ns_names,
            soa: (
                soa_mname,
                soa_rname,
                serial,
                soa.refresh,
                soa.retry,
                soa.expire,
                soa.minimum,
            ),
            soa_ttl: soa.ttl,
            filters,
        })
    }

    fn decode_forward(&self, name: &DomainName) -> Option<Ipv6Addr> {
        let leftmost = name.labels().first()?;
        let groups: Vec<&str> = leftmost.split('-').collect();
        if groups.len() != 8 || groups.iter().any(|g| g.len() != 4) {
            return None;
        }
        for (group, expected) in groups.iter().zip(self.prefix_groups.iter()) {
            if !group.eq_ignore_ascii_case(expected) {
                return None;
            }
        }
        let mut segments = [0u16; 8];
        for (i, group) in groups.iter().enumerate() {
            segments[i] = u16::from_str_radix(group, 16).ok()?;
        }
        Some(Ipv6Addr::new(
            segments[0],
            segments[1],
            segments[2],
            segments[3],
            segments[4],
            segments[5],
            segments[6],
            segments[7],
        ))
    }

    fn decode_reverse(&self, name: &DomainName) -> Option<DomainName> {
        let labels = name.labels();
        if labels.len() < 2 {
            return None;
        }
        let nibble_labels = &labels[..labels.len() - 2];
        if nibble_labels.len() != 32 || !nibble_labels.iter().all(|l| is_hex_nibble(l)) {
            return None;
        }
        let mut nibbles: Vec<&str> = nibble_labels.iter().map(String::as_str).collect();
        nibbles.reverse();
        let hex: String = nibbles.concat();
        let group_label = hex
            .as_bytes()
            .chunks(4)
            .map(|c| std::str::from_utf8(c).unwrap())
            .collect::<Vec<_>>()
            .join("-");

        let mut target_labels = vec![group_label];
        target_labels.extend(self.forward_zone.labels().iter().cloned());
        DomainName::from_labels(target_labels).ok()
    }

    fn soa_rdata(&self) -> DnsRecordData {
        let (mname, rname, serial, refresh, retry, expire, minimum) = &self.soa;
        DnsRecordData::SOA {
            mname: mname.clone(),
            rname: rname.clone(),
            serial: *serial,
            refresh: *refresh,
            retry: *retry,
            expire: *expire,
            minimum: *minimum,
        }
    }
}

fn parse_prefix_groups(v6_prefix: &str) -> Result<Vec<String>, ConfigError> {
    let trimmed = v6_prefix.trim_matches(':');
    if trimmed.is_empty() {
        return Err(ConfigError::InvalidV6Prefix(
            v6_prefix.to_string(),
            "prefix has no hex groups".to_string(),
        ));
    }
    trimmed
        .split(':')
        .map(|group| {
            if group.len() > 4 || !group.chars().all(|c| c.is_ascii_hexdigit()) {
                return Err(ConfigError::InvalidV6Prefix(
                    v6_prefix.to_string(),
                    format!("{:?} is not a valid 16-bit hex group", group),
                ));
            }
            Ok(format!("{:0>4}", group.to_ascii_lowercase()))
        })
        .collect()
}

fn reverse_zone_from_groups(groups: &[String]) -> DomainName {
    let joined: String = groups.concat();
    let mut labels: Vec<String> = joined.chars().rev().map(|c| c.to_string()).collect();
    labels.push("ip6".to_string());
    labels.push("arpa".to_string());
    DomainName::from_labels(labels).expect("nibble labels are always well formed")
}

fn is_hex_nibble(label: &str) -> bool {
    label.len() == 1 && label.chars().next().is_some_and(|c| c.is_ascii_hexdigit())
}

impl Provider for ReverseIPv6Provider {
    fn zones(&self, _client_addr: SocketAddr) -> &[DomainName] {
        &self.zones
    }

    fn get_response(&self, request: &DnsPacket, _client_addr: SocketAddr) -> Option<DnsPacket> {
        let question = request.questions.first()?;
        let in_reverse = question.qname.is_subdomain(&self.reverse_zone);

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

        match question.qtype {
            DnsRRType::AAAA | DnsRRType::ANY if !in_reverse => match self.decode_forward(&question.qname) {
                Some(addr) => response.answers.push(DnsResourceRecord::new(
                    question.qname.clone(),
                    DnsClass::IN,
                    self.soa_ttl,
                    DnsRecordData::AAAA(addr),
                )),
                None => response.flags.rcode = DnsRCode::NXDomain,
            },
            DnsRRType::PTR | DnsRRType::ANY if in_reverse => match self.decode_reverse(&question.qname) {
                Some(target) => {
                    response.answers.push(DnsResourceRecord::new(
                        question.qname.clone(),
                        DnsClass::IN,
                        self.soa_ttl,
                        DnsRecordData::PTR(target),
                    ));
                    for ns in &self.nameservers {
                        response.nameservers.push(DnsResourceRecord::new(
                            self.reverse_zone.clone(),
                            DnsClass::IN,
                            self.soa_ttl,
                            DnsRecordData::NS(ns.clone()),
                        ));
                    }
                }
                None => response.flags.rcode = DnsRCode::NXDomain,
            },
            DnsRRType::NS => {
                let zone = if in_reverse { &self.reverse_zone } else { &self.forward_zone };
                for ns in &self.nameservers {
                    response.answers.push(DnsResourceRecord::new(
                        zone.clone(),
                        DnsClass::IN,
                        self.soa_ttl,
                        DnsRecordData::NS(ns.clone()),
                    ));
                }
            }
            DnsRRType::SOA => {
                let zone = if in_reverse { &self.reverse_zone } else { &self.forward_zone };
                response.answers.push(DnsResourceRecord::new(
                    zone.clone(),
                    DnsClass::IN,
                    self.soa_ttl,
                    self.soa_rdata(),
                ));
            }
            _ => {
                let zone = if in_reverse { &self.reverse_zone } else { &self.forward_zone };
                response.nameservers.push(DnsResourceRecord::new(
                    zone.clone(),
                    DnsClass::IN,
                    self.soa_ttl,
                    self.soa_rdata(),
                ));
                response.flags.rcode = DnsRCode::NotImp;
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
    use crate::dns::DnsQuestion;

    fn provider() -> ReverseIPv6Provider {
        ReverseIPv6Provider::new(
            "v6.example.",
            "2001:db8::",
            &["ns1.example.".to_string()],
            SoaConfig {
                mname: "ns1.example.".to_string(),
                rname: "hostmaster.example.".to_string(),
                refresh: 3600,
                retry: 600,
                expire: 604800,
                minimum: 300,
                ttl: 3600,
            },
            Vec::new(),
        )
        .unwrap()
    }

    fn query(name: &str, qtype: DnsRRType) -> DnsPacket {
        DnsPacket {
            id: 7,
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
                qtype,
                DnsClass::IN,
            )],
            answers: Vec::new(),
            nameservers: Vec::new(),
            addl_recs: Vec::new(),
        }
    }

    #[test]
    fn reverse_zone_is_derived_from_prefix() {
        let p = provider();
        assert_eq!(p.reverse_zone.to_text(), "8.b.d.0.1.0.0.2.ip6.arpa.");
    }

    #[test]
    fn forward_query_synthesizes_aaaa() {
        let p = provider();
        let client: SocketAddr = "127.0.0.1:5353".parse().unwrap();
        let response = p
            .get_response(
                &query("2001-0db8-0000-0000-0000-0000-0000-0001.v6.example.", DnsRRType::AAAA),
                client,
            )
            .unwrap();
        assert_eq!(response.flags.rcode, DnsRCode::NoError);
        assert_eq!(
            response.answers[0].rdata,
            DnsRecordData::AAAA("2001:db8::1".parse().unwrap())
        );
    }

    #[test]
    fn forward_query_prefix_mismatch_is_nxdomain() {
        let p = provider();
        let client: SocketAddr = "127.0.0.1:5353".parse().unwrap();
        let response = p
            .get_response(
                &query("2002-0db8-0000-0000-0000-0000-0000-0001.v6.example.", DnsRRType::AAAA),
                client,
            )
            .unwrap();
        assert_eq!(response.flags.rcode, DnsRCode::NXDomain);
    }

    #[test]
    fn reverse_query_synthesizes_ptr_target_matching_forward() {
        let p = provider();
        let client: SocketAddr = "127.0.0.1:5353".parse().unwrap();
        let ptr_name =
            "1.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.8.b.d.0.1.0.0.2.ip6.arpa.";
        let response = p.get_response(&query(ptr_name, DnsRRType::PTR), client).unwrap();
        assert_eq!(response.flags.rcode, DnsRCode::NoError);
        let DnsRecordData::PTR(target) = &response.answers[0].rdata else {
            panic!("expected PTR rdata");
        };
        assert_eq!(target.to_text(), "2001-0db8-0000-0000-0000-0000-0000-0001.v6.example.");

        // reverse roundtrip (spec section 8): AAAA on that target returns the
        // original address.
        let aaaa_response = p
            .get_response(&query(&target.to_text(), DnsRRType::AAAA), client)
            .unwrap();
        assert_eq!(
            aaaa_response.answers[0].rdata,
            DnsRecordData::AAAA("2001:db8::1".parse().unwrap())
        );
    }

    #[test]
    fn unsupported_type_is_notimp_with_soa_authority() {
        let p = provider();
        let client: SocketAddr = "127.0.0.1:5353".parse().unwrap();
        let response = p
            .get_response(&query("v6.example.", DnsRRType::TXT), client)
            .unwrap();
        assert_eq!(response.flags.rcode, DnsRCode::NotImp);
        assert_eq!(response.nameservers.len(), 1);
    }

    #[test]
    fn non_apex_ns_query_is_owned_by_the_zone_apex() {
        let p = provider();
        let client: SocketAddr = "127.0.0.1:5353".parse().unwrap();
        let response = p
            .get_response(
                &query("2001-0db8-0000-0000-0000-0000-0000-0001.v6.example.", DnsRRType::NS),
                client,
            )
            .unwrap();
        assert_eq!(response.answers[0].name.to_text(), "v6.example.");
    }

    #[test]
    fn non_apex_soa_query_in_reverse_zone_is_owned_by_the_zone_apex() {
        let p = provider();
        let client: SocketAddr = "127.0.0.1:5353".parse().unwrap();
        let non_apex_ptr_name =
            "1.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.0.8.b.d.0.1.0.0.2.ip6.arpa.";
        let response = p
            .get_response(&query(non_apex_ptr_name, DnsRRType::SOA), client)
            .unwrap();
        assert_eq!(response.answers[0].name.to_text(), "8.b.d.0.1.0.0.2.ip6.arpa.");
    }
}
