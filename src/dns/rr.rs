use super::names::DomainName;
use super::{bigendians, names, DnsClass, DnsFormatError, DnsRRType, DnsRecordData};

#[derive(Clone, PartialEq, Debug)]
pub struct DnsResourceRecord {
    pub name: DomainName,
    pub class: DnsClass,
    // Unsigned 32 bit integer signifying the amount of time the client can
    // cache this answer for. 0 means not to cache. Note that RFC 1035 states
    // this is signed in some sections, this is corrected in errata.
    pub ttl: u32,
    pub rdata: DnsRecordData,
}

impl DnsResourceRecord {
    pub fn new(name: DomainName, class: DnsClass, ttl: u32, rdata: DnsRecordData) -> Self {
        DnsResourceRecord {
            name,
            class,
            ttl,
            rdata,
        }
    }

    pub fn rr_type(&self) -> DnsRRType {
        self.rdata.rr_type()
    }

    // EDNS OPT records (RFC6891) repurpose the class and ttl fields entirely;
    // they never appear in zone data this codebase serves and are rejected
    // as an unsupported rrtype further up in dispatch, so they aren't
    // special-cased here.
    pub fn from_bytes(
        packet_bytes: &[u8],
        pos: usize,
    ) -> Result<(DnsResourceRecord, usize), DnsFormatError> {
        let (name_labels, new_pos) = names::deserialize_name(packet_bytes, pos)?;
        if new_pos + 10 > packet_bytes.len() {
            return Err(DnsFormatError::make_error(
                "end of packet parsing resource record header".to_string(),
            ));
        }
        let rrtype_num = bigendians::to_u16(&packet_bytes[new_pos..new_pos + 2]);
        let class_num = bigendians::to_u16(&packet_bytes[new_pos + 2..new_pos + 4]);
        let ttl = bigendians::to_u32(&packet_bytes[new_pos + 4..new_pos + 8]);
        let rd_length = bigendians::to_u16(&packet_bytes[new_pos + 8..new_pos + 10]);
        let data_pos = new_pos + 10;

        let rr_type = match num::FromPrimitive::from_u16(rrtype_num) {
            Some(x) => Ok(x),
            None => Err(DnsFormatError::make_error(format!(
                "invalid rrtype value: {:#x}",
                rrtype_num
            ))),
        }?;
        // Like qclass, an RR's class is not a closed set on the wire; any
        // value decodes (see DnsClass::from_u16).
        let class = DnsClass::from_u16(class_num);

        let rdata = DnsRecordData::from_bytes(packet_bytes, data_pos, rr_type, rd_length)?;
        let pos = data_pos + rd_length as usize;

        let rr = DnsResourceRecord {
            name: DomainName::from_labels(name_labels)?,
            class,
            ttl,
            rdata,
        };

        Ok((rr, pos))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();
        let rdata_bytes = self.rdata.to_bytes();

        bytes.extend_from_slice(&names::serialize_name(self.name.labels()));
        bytes.extend_from_slice(&bigendians::from_u16(self.rr_type() as u16));
        bytes.extend_from_slice(&bigendians::from_u16(self.class.to_u16()));
        bytes.extend_from_slice(&bigendians::from_u32(self.ttl));
        bytes.extend_from_slice(&bigendians::from_u16(rdata_bytes.len() as u16));
        bytes.extend_from_slice(&rdata_bytes);

        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[test]
    fn resource_record_roundtrips() {
        let rr = DnsResourceRecord::new(
            DomainName::from_text("example.com").unwrap(),
            DnsClass::IN,
            300,
            DnsRecordData::A(Ipv4Addr::new(192, 0, 2, 5)),
        );
        let bytes = rr.to_bytes();
        let (decoded, pos) = DnsResourceRecord::from_bytes(&bytes, 0).unwrap();
        assert_eq!(decoded, rr);
        assert_eq!(pos, bytes.len());
    }
}
