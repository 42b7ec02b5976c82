use std::cmp::Ordering;
use std::fmt;

use super::DnsFormatError;

// Maximum length of a single label, per RFC1035 section 3.1: the top two
// bits of the length byte are reserved for pointer tagging, leaving 6 bits
// (0-63) for a length value.
const MAX_LABEL_LEN: usize = 63;
// Maximum length of a name once serialized to wire format (label length
// bytes, label bytes, and the terminating root byte all included).
const MAX_NAME_WIRE_LEN: usize = 255;

// Reads a name out of a full DNS message starting at `start`, following
// compression pointers as needed. `bytes` must be the entire packet, not
// just the record containing the name, since pointers can reference any
// earlier offset in the message.
//
// Returns the decoded labels (most significant label first, i.e. "www",
// "example", "com") and the position immediately after the name as it
// appears at `start` (NOT following any pointer; a pointer is always the
// last two bytes of a name's direct encoding).
pub fn deserialize_name(
    bytes: &[u8],
    start: usize,
) -> Result<(Vec<String>, usize), DnsFormatError> {
    let (labels, end, _) = deserialize_name_inner(bytes, start)?;
    Ok((labels, end))
}

fn deserialize_name_inner(
    bytes: &[u8],
    start: usize,
) -> Result<(Vec<String>, usize, usize), DnsFormatError> {
    let mut labels = Vec::new();
    let mut pos = start;
    let packet_len = bytes.len();
    let mut wire_len = 0usize;
    loop {
        if pos >= packet_len {
            return Err(DnsFormatError::make_error(
                "reached end of packet while parsing label or label pointer jumped beyond packet"
                    .to_string(),
            ));
        }
        let len_byte = bytes[pos];
        match (len_byte >> 6) & 0b11u8 {
            0b11 => {
                if pos + 1 >= packet_len {
                    return Err(DnsFormatError::make_error(
                        "unexpected end of packet at label pointer start".to_string(),
                    ));
                }
                let pointer_start: usize =
                    (((len_byte & 0b0011_1111u8) as usize) << 8) + (bytes[pos + 1] as usize);
                // Compression pointers must always point strictly backwards.
                // This is what RFC1035 intends in practice, and it's what
                // makes the recursion below provably terminating: each
                // pointer we follow strictly decreases the position, so we
                // can't loop forever chasing pointers that point at each
                // other.
                if pointer_start >= pos {
                    return Err(DnsFormatError::make_error(
                        "label pointer does not point backwards, refusing to follow (possible compression loop)".to_string(),
                    ));
                }
                let (mut remainder, _, remainder_wire_len) =
                    deserialize_name_inner(bytes, pointer_start)?;
                labels.append(&mut remainder);
                wire_len += remainder_wire_len;
                pos += 2;
                break;
            }
            0b00 => {
                let length = len_byte as usize;
                pos += 1;
                if length == 0 {
                    wire_len += 1;
                    break;
                }
                if length > MAX_LABEL_LEN {
                    return Err(DnsFormatError::make_error(format!(
                        "label length {} exceeds maximum of {} octets",
                        length, MAX_LABEL_LEN
                    )));
                }
                if pos + length > packet_len {
                    return Err(DnsFormatError::make_error(
                        "label length is longer than remainder of packet".to_string(),
                    ));
                }
                let label = String::from_utf8(bytes[pos..pos + length].to_vec())
                    .map_err(|_| DnsFormatError::make_error("label was not UTF-8".to_string()))?;
                labels.push(label);
                pos += length;
                wire_len += length + 1;
            }
            _ => {
                // RFC6891 proposes another label type using this tag, but
                // no deployed record format actually needs it here.
                return Err(DnsFormatError::make_error(
                    "unsupported or invalid label pointer type".to_string(),
                ));
            }
        }
        if wire_len > MAX_NAME_WIRE_LEN {
            return Err(DnsFormatError::make_error(format!(
                "name exceeds maximum wire length of {} octets",
                MAX_NAME_WIRE_LEN
            )));
        }
    }
    Ok((labels, pos, wire_len))
}

// Serializes a name without compression. Every encoder in this codebase
// writes full names; compression is a nice-to-have for response size but
// isn't required for correctness, and skipping it keeps record writers
// simple (no shared pointer table needs to be threaded through them).
pub fn serialize_name(name: &[String]) -> Vec<u8> {
    let mut bytes = Vec::new();
    for label in name {
        bytes.push(label.len() as u8);
        bytes.extend_from_slice(label.as_bytes());
    }
    bytes.push(0x00);
    bytes
}

// Relation between two names as produced by `DomainName::fullcompare`,
// mirroring the vocabulary RFC1035 zone-matching logic needs: is the
// queried name equal to, below, above, or unrelated to a candidate zone.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum NameRelation {
    Equal,
    // `self` is a subdomain of (strictly below) the other name
    Subdomain,
    // `self` is a superdomain of (strictly above) the other name
    Superdomain,
    // Neither is an ancestor of the other, but they share a common suffix
    // (every pair of absolute names shares at least the implicit root, so
    // two unrelated absolute names still land here, not in `None`)
    CommonAncestor,
    // Reserved for relative names sharing no root; `DomainName` here is
    // always absolute, so `fullcompare` never actually returns this.
    None,
}

// An ordered sequence of DNS labels, compared case-insensitively per
// RFC1035 section 2.3.3 ("insensitive" ASCII comparison for matching, while
// preserving the original casing for anything we serialize back out).
//
// Labels are stored most-significant first: `www.example.com` is stored as
// `["www", "example", "com"]`. The root name is the empty label sequence.
#[derive(Clone, Debug)]
pub struct DomainName {
    labels: Vec<String>,
}

impl DomainName {
    pub fn root() -> DomainName {
        DomainName { labels: Vec::new() }
    }

    pub fn from_labels(labels: Vec<String>) -> Result<DomainName, DnsFormatError> {
        let mut wire_len = 1; // terminating root label
        for label in &labels {
            if label.is_empty() {
                return Err(DnsFormatError::make_error(
                    "domain name contains an empty interior label".to_string(),
                ));
            }
            if label.len() > MAX_LABEL_LEN {
                return Err(DnsFormatError::make_error(format!(
                    "label {:?} exceeds maximum of {} octets",
                    label, MAX_LABEL_LEN
                )));
            }
            wire_len += label.len() + 1;
        }
        if wire_len > MAX_NAME_WIRE_LEN {
            return Err(DnsFormatError::make_error(format!(
                "name exceeds maximum wire length of {} octets",
                MAX_NAME_WIRE_LEN
            )));
        }
        Ok(DomainName { labels })
    }

    // Parses a presentation-format name like `www.example.com.`. A trailing
    // dot is accepted and ignored; one is not required, every name here is
    // implicitly fully qualified.
    pub fn from_text(text: &str) -> Result<DomainName, DnsFormatError> {
        let trimmed = text.strip_suffix('.').unwrap_or(text);
        if trimmed.is_empty() {
            return DomainName::from_labels(Vec::new());
        }
        let labels = trimmed.split('.').map(String::from).collect();
        DomainName::from_labels(labels)
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    pub fn is_root(&self) -> bool {
        self.labels.is_empty()
    }

    // True if the leftmost label is the wildcard label `*`, per RFC1035
    // section 4.3.3.
    pub fn is_wild(&self) -> bool {
        self.labels.first().map(|l| l == "*").unwrap_or(false)
    }

    // Returns this name with `*` prepended as a new leftmost label, used by
    // zone providers to look up a wildcard match for a name with no direct
    // entry.
    pub fn with_wildcard_prefix(&self) -> DomainName {
        let mut labels = Vec::with_capacity(self.labels.len() + 1);
        labels.push("*".to_string());
        labels.extend(self.labels.iter().cloned());
        DomainName { labels }
    }

    // The immediate parent of this name, or `None` if this is already root.
    pub fn parent(&self) -> Option<DomainName> {
        if self.labels.is_empty() {
            None
        } else {
            Some(DomainName {
                labels: self.labels[1..].to_vec(),
            })
        }
    }

    pub fn wire_len(&self) -> usize {
        self.labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1
    }

    // Compares `self` against `other`, returning their relation, an
    // ordering suitable for sorting names (comparing label-by-label from
    // the root end inward), and the count of labels the two share as a
    // common suffix. Zone-matching dispatch uses the common-label count to
    // pick the most specific (longest-suffix-match) zone for a query name.
    pub fn fullcompare(&self, other: &DomainName) -> (NameRelation, Ordering, usize) {
        let self_rev: Vec<&String> = self.labels.iter().rev().collect();
        let other_rev: Vec<&String> = other.labels.iter().rev().collect();

        let mut common = 0;
        for (a, b) in self_rev.iter().zip(other_rev.iter()) {
            if a.eq_ignore_ascii_case(b) {
                common += 1;
            } else {
                break;
            }
        }

        let order = match self_rev.get(common).zip(other_rev.get(common)) {
            Some((a, b)) => cmp_label(a, b),
            None => self_rev.len().cmp(&other_rev.len()),
        };

        let relation = if self_rev.len() == other_rev.len() && common == self_rev.len() {
            NameRelation::Equal
        } else if self.labels.is_empty() {
            // The root is a superdomain of everything (including itself,
            // handled by the Equal case above).
            NameRelation::Superdomain
        } else if other.labels.is_empty() {
            NameRelation::Subdomain
        } else if common == other_rev.len() && self_rev.len() > other_rev.len() {
            NameRelation::Subdomain
        } else if common == self_rev.len() && other_rev.len() > self_rev.len() {
            NameRelation::Superdomain
        } else {
            NameRelation::CommonAncestor
        };

        (relation, order, common)
    }

    // True if `self` is `other` or a descendant of `other`. Used throughout
    // the provider/filter layer to test zone membership.
    pub fn is_subdomain(&self, other: &DomainName) -> bool {
        matches!(
            self.fullcompare(other).0,
            NameRelation::Equal | NameRelation::Subdomain
        )
    }

    pub fn to_text(&self) -> String {
        if self.labels.is_empty() {
            ".".to_string()
        } else {
            let mut s = self.labels.join(".");
            s.push('.');
            s
        }
    }
}

fn cmp_label(a: &str, b: &str) -> Ordering {
    let a_lower: Vec<u8> = a.bytes().map(|b| b.to_ascii_lowercase()).collect();
    let b_lower: Vec<u8> = b.bytes().map(|b| b.to_ascii_lowercase()).collect();
    a_lower.cmp(&b_lower)
}

impl PartialEq for DomainName {
    fn eq(&self, other: &Self) -> bool {
        self.fullcompare(other).0 == NameRelation::Equal
    }
}

impl Eq for DomainName {}

impl std::hash::Hash for DomainName {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        for label in &self.labels {
            for byte in label.bytes() {
                byte.to_ascii_lowercase().hash(state);
            }
            0xffu8.hash(state); // separator, avoids "ab"+"c" colliding with "a"+"bc"
        }
    }
}

impl PartialOrd for DomainName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for DomainName {
    fn cmp(&self, other: &Self) -> Ordering {
        self.fullcompare(other).1
    }
}

impl fmt::Display for DomainName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_text())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn name_read_works() {
        let mut packet = [0x00u8; 93];
        packet[20] = 1;
        packet[21] = b'f';
        packet[22] = 3;
        packet[23] = b'i';
        packet[24] = b's';
        packet[25] = b'i';
        packet[26] = 4;
        packet[27] = b'a';
        packet[28] = b'r';
        packet[29] = b'p';
        packet[30] = b'a';
        packet[31] = 0;

        packet[40] = 3;
        packet[41] = b'f';
        packet[42] = b'o';
        packet[43] = b'o';
        packet[44] = 0b1100_0000;
        packet[45] = 20;

        packet[64] = 0b1100_0000;
        packet[65] = 26;

        packet[92] = 0;

        let (labels, pos) = deserialize_name(&packet, 20).expect("deserialize failed");
        assert_eq!(labels, vec!["f", "isi", "arpa"]);
        assert_eq!(pos, 32);

        let (labels, pos) = deserialize_name(&packet, 40).expect("deserialize failed");
        assert_eq!(labels, vec!["foo", "f", "isi", "arpa"]);
        assert_eq!(pos, 46);

        let (labels, pos) = deserialize_name(&packet, 64).expect("deserialize failed");
        assert_eq!(labels, vec!["arpa"]);
        assert_eq!(pos, 66);

        let (labels, pos) = deserialize_name(&packet, 92).expect("deserialize failed");
        assert_eq!(labels, Vec::<String>::new());
        assert_eq!(pos, 93);
    }

    #[test]
    fn name_pointer_loop_is_rejected() {
        // Byte 0 points at itself: an immediate self-loop.
        let mut packet = [0x00u8; 4];
        packet[0] = 0b1100_0000;
        packet[1] = 0;
        let result = deserialize_name(&packet, 0);
        assert!(result.is_err());
    }

    #[test]
    fn name_forward_pointer_is_rejected() {
        let mut packet = [0x00u8; 8];
        // Label at 0 points forward to offset 4, which hasn't been read yet.
        packet[0] = 0b1100_0000;
        packet[1] = 4;
        packet[4] = 0;
        let result = deserialize_name(&packet, 0);
        assert!(result.is_err());
    }

    #[test]
    fn name_roundtrip() {
        let labels = vec!["www".to_string(), "example".to_string(), "com".to_string()];
        let bytes = serialize_name(&labels);
        let (decoded, pos) = deserialize_name(&bytes, 0).expect("deserialize failed");
        assert_eq!(decoded, labels);
        assert_eq!(pos, bytes.len());
    }

    #[test]
    fn domain_name_case_insensitive_eq() {
        let a = DomainName::from_text("WWW.Example.COM").unwrap();
        let b = DomainName::from_text("www.example.com").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn domain_name_is_subdomain() {
        let sub = DomainName::from_text("www.example.com").unwrap();
        let zone = DomainName::from_text("example.com").unwrap();
        let other = DomainName::from_text("example.net").unwrap();
        assert!(sub.is_subdomain(&zone));
        assert!(zone.is_subdomain(&zone));
        assert!(!other.is_subdomain(&zone));
    }

    #[test]
    fn domain_name_fullcompare_relations() {
        let zone = DomainName::from_text("example.com").unwrap();
        let sub = DomainName::from_text("www.example.com").unwrap();
        let cousin = DomainName::from_text("example.org").unwrap();
        let unrelated = DomainName::from_text("other.net").unwrap();

        let (relation, _, common) = sub.fullcompare(&zone);
        assert_eq!(relation, NameRelation::Subdomain);
        assert_eq!(common, 2);

        let (relation, _, _) = zone.fullcompare(&sub);
        assert_eq!(relation, NameRelation::Superdomain);

        let (relation, _, common) = zone.fullcompare(&cousin);
        assert_eq!(relation, NameRelation::CommonAncestor);
        assert_eq!(common, 0);

        // Two absolute names with nothing but the implicit root in common
        // are still CommonAncestor, not None (see `NameRelation::None`'s
        // doc comment: this crate never compares relative names).
        let (relation, _, _) = zone.fullcompare(&unrelated);
        assert_eq!(relation, NameRelation::CommonAncestor);

        let (relation, _, _) = zone.fullcompare(&zone);
        assert_eq!(relation, NameRelation::Equal);
    }

    #[test]
    fn domain_name_wildcard() {
        let name = DomainName::from_text("foo.example.com").unwrap();
        let wild = name.with_wildcard_prefix();
        assert_eq!(wild.to_text(), "*.foo.example.com.");
        assert!(wild.is_wild());
        assert!(!name.is_wild());
    }

    #[test]
    fn domain_name_rejects_oversized_label() {
        let label = "a".repeat(64);
        let result = DomainName::from_labels(vec![label]);
        assert!(result.is_err());
    }

    #[test]
    fn domain_name_root() {
        let root = DomainName::root();
        assert!(root.is_root());
        assert_eq!(root.to_text(), ".");
    }
}
