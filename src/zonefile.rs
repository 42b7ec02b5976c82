// Zone-file lexing/parsing is an external collaborator per spec section 1
// ("assumed available as a library") and section 6 ("Assumed to be parsed
// by an external library"). `hickory-proto`'s master-file parser
// (`serialize::txt`) plays that role here, the same way `ndns`'s
// `providers/file.py` leans on the Python `dns` package's `dns.zone.from_file`.
// This module's only job is converting what that parser hands back into
// this crate's own wire types (`dns::DnsResourceRecord` et al.), so the
// rest of the codebase never has to know hickory's record types exist.

use std::path::{Path, PathBuf};

use hickory_proto::rr::rdata as hickory_rdata;
use hickory_proto::rr::{DNSClass as HickoryClass, RData as HickoryRData};
use hickory_proto::serialize::txt::Parser;

use crate::dns::{DnsClass, DnsRecordData, DnsResourceRecord, DomainName};
use crate::error::ConfigError;

// Parses `path` as an RFC1035 master file under `origin`, returning every
// record it contains translated into this crate's RR representation.
// Records of a type this crate's wire codec doesn't model are skipped with
// a warning rather than rejected outright, matching the "forward an
// unknown record as an opaque blob" spirit of `DnsRecordData::Other` (that
// path only applies to records we've already decoded off the wire; records
// straight out of a zone file that we don't understand at all are simply
// not useful to serve, since we can't re-derive their rdata bytes from the
// parsed, name-aware representation hickory hands back).
pub fn load_zone_file(
    path: &Path,
    origin: &str,
) -> Result<Vec<DnsResourceRecord>, ConfigError> {
    let text = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::ZoneFileRead(path.to_path_buf(), origin.to_string(), e))?;

    let origin_name = hickory_proto::rr::Name::parse(origin, None).map_err(|e| {
        ConfigError::ZoneFileParse(path.to_path_buf(), origin.to_string(), e.to_string())
    })?;

    let (_zone_name, rrset_map) = Parser::new()
        .parse(&text, Some(origin_name), HickoryClass::IN)
        .map_err(|e| {
            ConfigError::ZoneFileParse(path.to_path_buf(), origin.to_string(), e.to_string())
        })?;

    let mut records = Vec::new();
    for record_set in rrset_map.values() {
        let owner = to_domain_name(path, origin, &record_set.name().to_string())?;
        for record in record_set.records_without_rrsigs() {
            let ttl = record.ttl();
            let Some(rdata) = record.data() else {
                continue;
            };
            match convert_rdata(rdata) {
                Some(rdata) => records.push(DnsResourceRecord::new(
                    owner.clone(),
                    DnsClass::IN,
                    ttl,
                    rdata,
                )),
                None => tracing::warn!(
                    owner = %owner,
                    rr_type = ?record.record_type(),
                    "skipping zone file record of unsupported type"
                ),
            }
        }
    }

    Ok(records)
}

fn to_domain_name(path: &Path, origin: &str, text: &str) -> Result<DomainName, ConfigError> {
    DomainName::from_text(text)
        .map_err(|e| ConfigError::ZoneFileParse(PathBuf::from(path), origin.to_string(), e.to_string()))
}

fn convert_rdata(rdata: &HickoryRData) -> Option<DnsRecordData> {
    match rdata {
        HickoryRData::A(a) => Some(DnsRecordData::A(std::net::Ipv4Addr::from(*a))),
        HickoryRData::AAAA(aaaa) => Some(DnsRecordData::AAAA(std::net::Ipv6Addr::from(*aaaa))),
        HickoryRData::NS(ns) => {
            DomainName::from_text(&ns.0.to_string()).ok().map(DnsRecordData::NS)
        }
        HickoryRData::CNAME(cname) => DomainName::from_text(&cname.0.to_string())
            .ok()
            .map(DnsRecordData::CNAME),
        HickoryRData::PTR(ptr) => {
            DomainName::from_text(&ptr.0.to_string()).ok().map(DnsRecordData::PTR)
        }
        HickoryRData::SOA(soa) => Some(convert_soa(soa)),
        HickoryRData::MX(mx) => Some(DnsRecordData::MX {
            preference: mx.preference(),
            exchange: DomainName::from_text(&mx.exchange().to_string()).ok()?,
        }),
        HickoryRData::TXT(txt) => Some(DnsRecordData::TXT(
            txt.txt_data().iter().map(|s| s.to_vec()).collect(),
        )),
        // Anything else (DNSSEC records, SRV, CAA, ...) is outside the
        // minimum type set spec section 6 asks this provider to serve; see
        // the module doc for why these are dropped rather than forwarded.
        _ => None,
    }
}

fn convert_soa(soa: &hickory_rdata::SOA) -> DnsRecordData {
    DnsRecordData::SOA {
        mname: DomainName::from_text(&soa.mname().to_string()).unwrap_or_else(|_| DomainName::root()),
        rname: DomainName::from_text(&soa.rname().to_string()).unwrap_or_else(|_| DomainName::root()),
        serial: soa.serial(),
        refresh: soa.refresh() as u32,
        retry: soa.retry() as u32,
        expire: soa.expire() as u32,
        minimum: soa.minimum(),
    }
}

