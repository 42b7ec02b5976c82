// TCP framing: every DNS message on a TCP connection is prefixed with a
// 2 octet network-order length. `TcpFramer` holds the partial-read state
// for one connection and turns arbitrary chunks of inbound bytes into
// complete message frames, regardless of how the chunks happen to be split
// across recv calls.

use super::bigendians;

#[derive(Default)]
pub struct TcpFramer {
    length_expected: Option<u16>,
    buffer: Vec<u8>,
}

impl TcpFramer {
    pub fn new() -> TcpFramer {
        TcpFramer {
            length_expected: None,
            buffer: Vec::new(),
        }
    }

    // Feeds newly-received bytes into the framer and returns every message
    // that became complete as a result, in order. Bytes belonging to a
    // still-incomplete message are retained internally.
    pub fn push(&mut self, bytes: &[u8]) -> Vec<Vec<u8>> {
        self.buffer.extend_from_slice(bytes);
        let mut frames = Vec::new();

        loop {
            if self.length_expected.is_none() {
                if self.buffer.len() < 2 {
                    break;
                }
                let length = bigendians::to_u16(&self.buffer[0..2]);
                self.buffer.drain(0..2);
                self.length_expected = Some(length);
            }

            let length = self.length_expected.unwrap() as usize;
            if self.buffer.len() < length {
                break;
            }

            let frame = self.buffer.drain(0..length).collect();
            frames.push(frame);
            self.length_expected = None;
        }

        frames
    }
}

// Prefixes a serialized DNS message with its 2 octet network-order length,
// ready to write to a TCP stream.
pub fn frame_message(message: &[u8]) -> Vec<u8> {
    let mut framed = Vec::with_capacity(message.len() + 2);
    framed.extend_from_slice(&bigendians::from_u16(message.len() as u16));
    framed.extend_from_slice(message);
    framed
}
