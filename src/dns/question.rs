use super::names::DomainName;
use super::{bigendians, names, DnsClass, DnsFormatError, DnsRRType};

#[derive(Clone, PartialEq, Debug)]
pub struct DnsQuestion {
    pub qname: DomainName,
    // The type of records desired. This is a superset of DnsRRType in the
    // wire format (ANY and a few meta-types are only valid here), but we
    // reuse the same enum since every value we actually accept overlaps.
    pub qtype: DnsRRType,
    // The class of records desired, which is nearly always IN for internet.
    pub qclass: DnsClass,
}

impl DnsQuestion {
    pub fn new(qname: DomainName, qtype: DnsRRType, qclass: DnsClass) -> Self {
        DnsQuestion {
            qname,
            qtype,
            qclass,
        }
    }

    pub fn from_bytes(
        packet_bytes: &[u8],
        pos: usize,
    ) -> Result<(DnsQuestion, usize), DnsFormatError> {
        let (qname_labels, new_pos) = names::deserialize_name(packet_bytes, pos)?;
        if new_pos + 4 > packet_bytes.len() {
            return Err(DnsFormatError::make_error(
                "end of packet parsing question".to_string(),
            ));
        }
        let qtype_num = bigendians::to_u16(&packet_bytes[new_pos..new_pos + 2]);
        let qclass_num = bigendians::to_u16(&packet_bytes[new_pos + 2..new_pos + 4]);
        let pos = new_pos + 4;

        let qtype = match num::FromPrimitive::from_u16(qtype_num) {
            Some(x) => Ok(x),
            None => Err(DnsFormatError::make_error(format!(
                "invalid qtype value: {:#x}",
                qtype_num
            ))),
        }?;
        // qclass is not a closed set on the wire (spec section 13: only
        // dispatch policy, not the decoder, rejects a non-IN class), so
        // this always succeeds.
        let qclass = DnsClass::from_u16(qclass_num);

        let question = DnsQuestion {
            qname: DomainName::from_labels(qname_labels)?,
            qtype,
            qclass,
        };

        Ok((question, pos))
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::new();

        bytes.extend_from_slice(&names::serialize_name(self.qname.labels()));
        bytes.extend_from_slice(&bigendians::from_u16(self.qtype as u16));
        bytes.extend_from_slice(&bigendians::from_u16(self.qclass.to_u16()));

        bytes
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_roundtrips() {
        let question = DnsQuestion::new(
            DomainName::from_text("example.com").unwrap(),
            DnsRRType::A,
            DnsClass::IN,
        );
        let bytes = question.to_bytes();
        let (decoded, pos) = DnsQuestion::from_bytes(&bytes, 0).unwrap();
        assert_eq!(decoded, question);
        assert_eq!(pos, bytes.len());
    }

    #[test]
    fn unrecognized_class_decodes_instead_of_failing() {
        let question = DnsQuestion::new(
            DomainName::from_text("example.com").unwrap(),
            DnsRRType::A,
            DnsClass::Other(0),
        );
        let bytes = question.to_bytes();
        let (decoded, _) = DnsQuestion::from_bytes(&bytes, 0).unwrap();
        assert_eq!(decoded.qclass, DnsClass::Other(0));
    }
}
