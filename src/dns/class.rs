// DnsClass is not a closed enum on the wire: RFC1035 leaves class values
// other than the enumerated few undefined, and SPEC_FULL section 13 is
// explicit that the codec must parse whatever class value is present
// rather than fail to decode it -- only the dispatcher, after a successful
// parse, decides what to do with a class it doesn't serve (REFUSED, not
// FORMERR). `Other` carries any value outside the enumerated set so the
// decoder never has to reject a message on this field alone.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum DnsClass {
    // 0: Reserved (RFC 6895)
    // 1: INternet - Basically the only actually used DNS Class
    IN,
    // 2: CSnet - Obsolete when the DNS standard was published and not even
    //    listed by IANA.
    CS,
    // 3: CHaos - IANA has this listed, but they cite a paper, not an RFC.
    CH,
    // 4: HeSiod - Same deal as CHaos.
    HS,
    // 254: NONE - Used to differentiate nonexistant RRsets from empty
    //      (zero-length) ones in Update operations. (RFC 2136)
    NONE,
    // 255: ANY - Only valid in queries, means that the client is asking for any
    //      DNS records regardless of class.
    ANY,
    // Any class value not enumerated above, kept verbatim so the wire
    // codec can round-trip it without having an opinion about it.
    Other(u16),
}

impl DnsClass {
    pub fn from_u16(value: u16) -> DnsClass {
        match value {
            1 => DnsClass::IN,
            2 => DnsClass::CS,
            3 => DnsClass::CH,
            4 => DnsClass::HS,
            254 => DnsClass::NONE,
            255 => DnsClass::ANY,
            other => DnsClass::Other(other),
        }
    }

    pub fn to_u16(self) -> u16 {
        match self {
            DnsClass::IN => 1,
            DnsClass::CS => 2,
            DnsClass::CH => 3,
            DnsClass::HS => 4,
            DnsClass::NONE => 254,
            DnsClass::ANY => 255,
            DnsClass::Other(value) => value,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn enumerated_classes_roundtrip() {
        for (value, class) in [
            (1u16, DnsClass::IN),
            (2, DnsClass::CS),
            (3, DnsClass::CH),
            (4, DnsClass::HS),
            (254, DnsClass::NONE),
            (255, DnsClass::ANY),
        ] {
            assert_eq!(DnsClass::from_u16(value), class);
            assert_eq!(class.to_u16(), value);
        }
    }

    #[test]
    fn unrecognized_class_value_round_trips_as_other() {
        let class = DnsClass::from_u16(0);
        assert_eq!(class, DnsClass::Other(0));
        assert_eq!(class.to_u16(), 0);

        let class = DnsClass::from_u16(10);
        assert_eq!(class, DnsClass::Other(10));
        assert_eq!(class.to_u16(), 10);
    }
}
