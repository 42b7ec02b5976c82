// Like DnsClass, DnsOpcode must parse any 4 bit value the header carries:
// spec section 4.2 requires `opcode != QUERY` to answer NOTIMP from the
// dispatcher, which means the decoder can't reject opcodes 3 and 7-15
// (reserved/unassigned) as a format error -- they're well-formed headers
// asking for an operation this server doesn't implement.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum DnsOpcode {
    // Opcode 0: standard query
    Query,
    // Opcode 1: inverse query (obsoleted by RFC 3425)
    IQuery,
    // Opcode 2: server status request
    Status,
    // 3 reserved for future use
    // Opcode 4: notify of zone change (RFC 1996)
    Zone,
    // Opcode 5: dynamic update to DNS records (RFC 2136)
    Update,
    // Opcode 6: DNS Stateful Operations (RFC 8490)
    DSO,
    // Any other 4 bit value (3, 7-15): reserved/unassigned, kept verbatim.
    Other(u8),
}

impl DnsOpcode {
    pub fn from_u8(value: u8) -> DnsOpcode {
        match value {
            0 => DnsOpcode::Query,
            1 => DnsOpcode::IQuery,
            2 => DnsOpcode::Status,
            4 => DnsOpcode::Zone,
            5 => DnsOpcode::Update,
            6 => DnsOpcode::DSO,
            other => DnsOpcode::Other(other),
        }
    }

    pub fn to_u8(self) -> u8 {
        match self {
            DnsOpcode::Query => 0,
            DnsOpcode::IQuery => 1,
            DnsOpcode::Status => 2,
            DnsOpcode::Zone => 4,
            DnsOpcode::Update => 5,
            DnsOpcode::DSO => 6,
            DnsOpcode::Other(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerated_opcodes_roundtrip() {
        for (value, opcode) in [
            (0u8, DnsOpcode::Query),
            (1, DnsOpcode::IQuery),
            (2, DnsOpcode::Status),
            (4, DnsOpcode::Zone),
            (5, DnsOpcode::Update),
            (6, DnsOpcode::DSO),
        ] {
            assert_eq!(DnsOpcode::from_u8(value), opcode);
            assert_eq!(opcode.to_u8(), value);
        }
    }

    #[test]
    fn reserved_opcode_values_round_trip_as_other() {
        for value in [3u8, 7, 15] {
            let opcode = DnsOpcode::from_u8(value);
            assert_eq!(opcode, DnsOpcode::Other(value));
            assert_eq!(opcode.to_u8(), value);
        }
    }
}
