use super::{bigendians, DnsFlags, DnsFormatError, DnsQuestion, DnsRCode, DnsResourceRecord};

#[derive(Clone, PartialEq, Debug)]
pub struct DnsPacket {
    // DNS transaction ID is a 16 bit number. It's arbitrary when transmitted
    // and copied into the reply so the client knows which replies correspond
    // to which requests if it's asking the same DNS server multiple questions.
    pub id: u16,
    pub flags: DnsFlags,
    pub questions: Vec<DnsQuestion>,
    pub answers: Vec<DnsResourceRecord>,
    pub nameservers: Vec<DnsResourceRecord>,
    pub addl_recs: Vec<DnsResourceRecord>,
}

const HEADER_LEN: usize = 12;

impl DnsPacket {
    pub fn from_bytes(bytes: &[u8]) -> Result<DnsPacket, DnsFormatError> {
        if bytes.len() < HEADER_LEN {
            return Err(DnsFormatError::make_error(
                "packet shorter than fixed 12 byte header".to_string(),
            ));
        }

        let id = bigendians::to_u16(&bytes[0..2]);
        let flags = DnsFlags::from_bytes(&bytes[2..4])?;

        // From here on, any decode failure still has an id and flags to
        // echo back in a FormError reply, so every error is tagged with
        // the header we've already recovered.
        let decode_body = || -> Result<DnsPacket, DnsFormatError> {
            let qd_count = bigendians::to_u16(&bytes[4..6]);
            let an_count = bigendians::to_u16(&bytes[6..8]);
            let ns_count = bigendians::to_u16(&bytes[8..10]);
            let ar_count = bigendians::to_u16(&bytes[10..12]);

            let mut questions = Vec::with_capacity(qd_count as usize);
            let mut answers = Vec::with_capacity(an_count as usize);
            let mut nameservers = Vec::with_capacity(ns_count as usize);
            let mut addl_recs = Vec::with_capacity(ar_count as usize);

            let mut pos: usize = HEADER_LEN;
            for _ in 0..qd_count {
                let (question, new_pos) = DnsQuestion::from_bytes(bytes, pos)?;
                pos = new_pos;
                questions.push(question);
            }
            for _ in 0..an_count {
                let (rr, new_pos) = DnsResourceRecord::from_bytes(bytes, pos)?;
                pos = new_pos;
                answers.push(rr);
            }
            for _ in 0..ns_count {
                let (rr, new_pos) = DnsResourceRecord::from_bytes(bytes, pos)?;
                pos = new_pos;
                nameservers.push(rr);
            }
            for _ in 0..ar_count {
                let (rr, new_pos) = DnsResourceRecord::from_bytes(bytes, pos)?;
                pos = new_pos;
                addl_recs.push(rr);
            }

            Ok(DnsPacket {
                id,
                flags,
                questions,
                answers,
                nameservers,
                addl_recs,
            })
        };

        decode_body().map_err(|e| e.with_header(id, flags))
    }

    // Builds a reply to `query` carrying `rcode` and no records, copying the
    // query's id and question section (per RFC1035 4.1.1, a response should
    // echo the question it's answering) and setting QR/clearing RD-adjacent
    // response-only bits appropriately.
    pub fn error_response(query: &DnsPacket, rcode: DnsRCode) -> DnsPacket {
        DnsPacket {
            id: query.id,
            flags: DnsFlags {
                qr_bit: true,
                opcode: query.flags.opcode,
                aa_bit: false,
                tc_bit: false,
                rd_bit: query.flags.rd_bit,
                ra_bit: false,
                ad_bit: false,
                cd_bit: false,
                rcode,
            },
            questions: query.questions.clone(),
            answers: Vec::new(),
            nameservers: Vec::new(),
            addl_recs: Vec::new(),
        }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = Vec::<u8>::new();
        bytes.extend_from_slice(&bigendians::from_u16(self.id));
        bytes.extend_from_slice(&self.flags.to_bytes());
        bytes.extend_from_slice(&bigendians::from_u16(self.questions.len() as u16));
        bytes.extend_from_slice(&bigendians::from_u16(self.answers.len() as u16));
        bytes.extend_from_slice(&bigendians::from_u16(self.nameservers.len() as u16));
        bytes.extend_from_slice(&bigendians::from_u16(self.addl_recs.len() as u16));

        for question in &self.questions {
            bytes.extend_from_slice(&question.to_bytes());
        }
        for answer in &self.answers {
            bytes.extend_from_slice(&answer.to_bytes());
        }
        for nameserver in &self.nameservers {
            bytes.extend_from_slice(&nameserver.to_bytes());
        }
        for addl_rec in &self.addl_recs {
            bytes.extend_from_slice(&addl_rec.to_bytes());
        }

        bytes
    }
}
