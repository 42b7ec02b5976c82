use std::net::{Ipv4Addr, Ipv6Addr};

use super::{bigendians, names, DnsFormatError, DnsRRType};
use names::DomainName;

// Record data, interpreted according to the owning record's RRType. Variants
// cover the record types a zone file or synthesized answer actually needs;
// anything else round-trips as an opaque blob via `Other`, which is enough
// to forward a record we don't understand without corrupting it.
#[derive(Clone, PartialEq, Debug)]
pub enum DnsRecordData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    NS(DomainName),
    CNAME(DomainName),
    PTR(DomainName),
    SOA {
        mname: DomainName,
        rname: DomainName,
        serial: u32,
        refresh: u32,
        retry: u32,
        expire: u32,
        minimum: u32,
    },
    MX {
        preference: u16,
        exchange: DomainName,
    },
    TXT(Vec<Vec<u8>>),
    Other { rr_type: DnsRRType, bytes: Vec<u8> },
}

impl DnsRecordData {
    pub fn from_bytes(
        packet_bytes: &[u8],
        pos: usize,
        rr_type: DnsRRType,
        rd_length: u16,
    ) -> Result<DnsRecordData, DnsFormatError> {
        let end = pos + rd_length as usize;
        if end > packet_bytes.len() {
            return Err(DnsFormatError::make_error(
                "record data length extends beyond end of packet".to_string(),
            ));
        }
        let record_bytes = &packet_bytes[pos..end];

        let record = match rr_type {
            DnsRRType::A => {
                if record_bytes.len() != 4 {
                    return Err(DnsFormatError::make_error(
                        "A record data was not 4 octets".to_string(),
                    ));
                }
                DnsRecordData::A(Ipv4Addr::new(
                    record_bytes[0],
                    record_bytes[1],
                    record_bytes[2],
                    record_bytes[3],
                ))
            }
            DnsRRType::AAAA => {
                if record_bytes.len() != 16 {
                    return Err(DnsFormatError::make_error(
                        "AAAA record data was not 16 octets".to_string(),
                    ));
                }
                DnsRecordData::AAAA(Ipv6Addr::new(
                    bigendians::to_u16(&record_bytes[0..2]),
                    bigendians::to_u16(&record_bytes[2..4]),
                    bigendians::to_u16(&record_bytes[4..6]),
                    bigendians::to_u16(&record_bytes[6..8]),
                    bigendians::to_u16(&record_bytes[8..10]),
                    bigendians::to_u16(&record_bytes[10..12]),
                    bigendians::to_u16(&record_bytes[12..14]),
                    bigendians::to_u16(&record_bytes[14..16]),
                ))
            }
            DnsRRType::NS => {
                let (labels, _) = names::deserialize_name(packet_bytes, pos)?;
                DnsRecordData::NS(DomainName::from_labels(labels)?)
            }
            DnsRRType::CNAME => {
                let (labels, _) = names::deserialize_name(packet_bytes, pos)?;
                DnsRecordData::CNAME(DomainName::from_labels(labels)?)
            }
            DnsRRType::PTR => {
                let (labels, _) = names::deserialize_name(packet_bytes, pos)?;
                DnsRecordData::PTR(DomainName::from_labels(labels)?)
            }
            DnsRRType::SOA => {
                let (mname_labels, next) = names::deserialize_name(packet_bytes, pos)?;
                let (rname_labels, next) = names::deserialize_name(packet_bytes, next)?;
                if next + 20 > packet_bytes.len() {
                    return Err(DnsFormatError::make_error(
                        "SOA record data truncated".to_string(),
                    ));
                }
                DnsRecordData::SOA {
                    mname: DomainName::from_labels(mname_labels)?,
                    rname: DomainName::from_labels(rname_labels)?,
                    serial: bigendians::to_u32(&packet_bytes[next..next + 4]),
                    refresh: bigendians::to_u32(&packet_bytes[next + 4..next + 8]),
                    retry: bigendians::to_u32(&packet_bytes[next + 8..next + 12]),
                    expire: bigendians::to_u32(&packet_bytes[next + 12..next + 16]),
                    minimum: bigendians::to_u32(&packet_bytes[next + 16..next + 20]),
                }
            }
            DnsRRType::MX => {
                if record_bytes.len() < 2 {
                    return Err(DnsFormatError::make_error(
                        "MX record data truncated".to_string(),
                    ));
                }
                let preference = bigendians::to_u16(&record_bytes[0..2]);
                let (exchange_labels, _) = names::deserialize_name(packet_bytes, pos + 2)?;
                DnsRecordData::MX {
                    preference,
                    exchange: DomainName::from_labels(exchange_labels)?,
                }
            }
            DnsRRType::TXT => {
                let mut strings = Vec::new();
                let mut idx = 0;
                while idx < record_bytes.len() {
                    let len = record_bytes[idx] as usize;
                    idx += 1;
                    if idx + len > record_bytes.len() {
                        return Err(DnsFormatError::make_error(
                            "TXT character-string length exceeds record data".to_string(),
                        ));
                    }
                    strings.push(record_bytes[idx..idx + len].to_vec());
                    idx += len;
                }
                DnsRecordData::TXT(strings)
            }
            other => DnsRecordData::Other {
                rr_type: other,
                bytes: record_bytes.to_vec(),
            },
        };

        Ok(record)
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            DnsRecordData::A(ip) => ip.octets().to_vec(),
            DnsRecordData::AAAA(ip) => ip.octets().to_vec(),
            DnsRecordData::NS(name) => names::serialize_name(name.labels()),
            DnsRecordData::CNAME(name) => names::serialize_name(name.labels()),
            DnsRecordData::PTR(name) => names::serialize_name(name.labels()),
            DnsRecordData::SOA {
                mname,
                rname,
                serial,
                refresh,
                retry,
                expire,
                minimum,
            } => {
                let mut bytes = Vec::new();
                bytes.extend_from_slice(&names::serialize_name(mname.labels()));
                bytes.extend_from_slice(&names::serialize_name(rname.labels()));
                bytes.extend_from_slice(&bigendians::from_u32(*serial));
                bytes.extend_from_slice(&bigendians::from_u32(*refresh));
                bytes.extend_from_slice(&bigendians::from_u32(*retry));
                bytes.extend_from_slice(&bigendians::from_u32(*expire));
                bytes.extend_from_slice(&bigendians::from_u32(*minimum));
                bytes
            }
            DnsRecordData::MX {
                preference,
                exchange,
            } => {
                let mut bytes = Vec::new();
                bytes.extend_from_slice(&bigendians::from_u16(*preference));
                bytes.extend_from_slice(&names::serialize_name(exchange.labels()));
                bytes
            }
            DnsRecordData::TXT(strings) => {
                let mut bytes = Vec::new();
                for s in strings {
                    bytes.push(s.len() as u8);
                    bytes.extend_from_slice(s);
                }
                bytes
            }
            DnsRecordData::Other { bytes, .. } => bytes.clone(),
        }
    }

    // The RRType this record data would be written with on the wire; needed
    // since `Other` carries its own type rather than relying on the owning
    // record (kept in sync by `DnsResourceRecord::to_bytes`).
    pub fn rr_type(&self) -> DnsRRType {
        match self {
            DnsRecordData::A(_) => DnsRRType::A,
            DnsRecordData::AAAA(_) => DnsRRType::AAAA,
            DnsRecordData::NS(_) => DnsRRType::NS,
            DnsRecordData::CNAME(_) => DnsRRType::CNAME,
            DnsRecordData::PTR(_) => DnsRRType::PTR,
            DnsRecordData::SOA { .. } => DnsRRType::SOA,
            DnsRecordData::MX { .. } => DnsRRType::MX,
            DnsRecordData::TXT(_) => DnsRRType::TXT,
            DnsRecordData::Other { rr_type, .. } => *rr_type,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roundtrip(rr_type: DnsRRType, data: &DnsRecordData) -> DnsRecordData {
        let bytes = data.to_bytes();
        // Record data referencing names (NS/CNAME/PTR/SOA/MX) needs to be
        // embedded in a full message for name compression pointers to
        // resolve, but none of these test fixtures use pointers, so a bare
        // buffer containing just the rdata is enough.
        DnsRecordData::from_bytes(&bytes, 0, rr_type, bytes.len() as u16).unwrap()
    }

    #[test]
    fn a_record_roundtrips() {
        let data = DnsRecordData::A(Ipv4Addr::new(192, 0, 2, 1));
        assert_eq!(roundtrip(DnsRRType::A, &data), data);
    }

    #[test]
    fn aaaa_record_roundtrips() {
        let data = DnsRecordData::AAAA(Ipv6Addr::new(0x2001, 0xdb8, 0, 0, 0, 0, 0, 1));
        assert_eq!(roundtrip(DnsRRType::AAAA, &data), data);
    }

    #[test]
    fn soa_record_roundtrips() {
        let data = DnsRecordData::SOA {
            mname: DomainName::from_text("ns1.example.com").unwrap(),
            rname: DomainName::from_text("hostmaster.example.com").unwrap(),
            serial: 2024010100,
            refresh: 3600,
            retry: 600,
            expire: 604800,
            minimum: 300,
        };
        assert_eq!(roundtrip(DnsRRType::SOA, &data), data);
    }

    #[test]
    fn txt_record_roundtrips() {
        let data = DnsRecordData::TXT(vec![b"hello".to_vec(), b"world".to_vec()]);
        assert_eq!(roundtrip(DnsRRType::TXT, &data), data);
    }

    #[test]
    fn mx_record_roundtrips() {
        let data = DnsRecordData::MX {
            preference: 10,
            exchange: DomainName::from_text("mail.example.com").unwrap(),
        };
        assert_eq!(roundtrip(DnsRRType::MX, &data), data);
    }
}
