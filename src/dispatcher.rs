// The query dispatch engine (spec section 4.2): binds the dual-stack UDP
// and TCP listeners, runs the zone-matching algorithm to pick a provider,
// applies that provider's filters, and hands the serialized response back
// out. Grounded on `ndns.py`'s `Ndns`/`DnsRequestHandler` (select-loop +
// one handler thread per request), reimplemented on tokio's task-per-request
// model the way the rest of this crate already leans on tokio.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream, UdpSocket};
use tokio::sync::mpsc;

use crate::dns::tcp::{frame_message, TcpFramer};
use crate::dns::{DnsClass, DnsOpcode, DnsPacket, DnsQuestion, DnsRCode, DomainName};
use crate::error::DispatchError;
use crate::provider::Provider;

// Max UDP datagram size this server reads or writes without truncating
// (spec section 4.1/6): no EDNS0 expansion in the core.
const MAX_UDP_MESSAGE: usize = 512;
const UDP_OUTBOUND_QUEUE_DEPTH: usize = 1024;
const TCP_READ_BUF: usize = 4096;

pub struct Dispatcher {
    providers: Vec<Arc<dyn Provider>>,
    work_deadline: Duration,
}

impl Dispatcher {
    pub fn new(providers: Vec<Arc<dyn Provider>>, work_deadline: Duration) -> Dispatcher {
        Dispatcher {
            providers,
            work_deadline,
        }
    }

    pub async fn run(self: Arc<Self>, listen_addr: SocketAddr, tcp_backlog: i32) -> io::Result<()> {
        let udp_socket = Arc::new(UdpSocket::from_std(bind_udp(listen_addr)?)?);
        let tcp_listener = TcpListener::from_std(bind_tcp(listen_addr, tcp_backlog)?)?;
        tracing::info!(addr = %listen_addr, "listening on udp");
        tracing::info!(addr = %listen_addr, backlog = tcp_backlog, "listening on tcp");

        // One shared outbound queue for UDP (spec section 5): a single
        // writer task drains it against the one UDP socket, so concurrent
        // workers never contend on the send path directly.
        let (udp_tx, mut udp_rx) = mpsc::channel::<(Vec<u8>, SocketAddr)>(UDP_OUTBOUND_QUEUE_DEPTH);
        let writer_socket = udp_socket.clone();
        let udp_writer = tokio::spawn(async move {
            while let Some((bytes, addr)) = udp_rx.recv().await {
                if let Err(e) = writer_socket.send_to(&bytes, addr).await {
                    tracing::warn!(%addr, error = %e, "udp send failed, datagram dropped");
                }
            }
        });

        let udp_reader = {
            let dispatcher = self.clone();
            let socket = udp_socket.clone();
            let tx = udp_tx.clone();
            tokio::spawn(async move {
                let mut buf = [0u8; MAX_UDP_MESSAGE];
                loop {
                    let (len, client_addr) = match socket.recv_from(&mut buf).await {
                        Ok(v) => v,
                        Err(e) => {
                            tracing::warn!(error = %e, "udp recv failed");
                            continue;
                        }
                    };
                    let data = buf[..len].to_vec();
                    let dispatcher = dispatcher.clone();
                    let tx = tx.clone();
                    // One worker task per inbound datagram (spec section 5).
                    tokio::spawn(async move {
                        if let Some(response) = dispatcher.process(&data, client_addr, true).await {
                            let _ = tx.send((response, client_addr)).await;
                        }
                    });
                }
            })
        };

        let tcp_acceptor = {
            let dispatcher = self.clone();
            tokio::spawn(async move {
                loop {
                    match tcp_listener.accept().await {
                        Ok((stream, client_addr)) => {
                            let dispatcher = dispatcher.clone();
                            tokio::spawn(async move {
                                dispatcher.serve_tcp_connection(stream, client_addr).await;
                            });
                        }
                        Err(e) => {
                            tracing::warn!(error = %e, "tcp accept failed");
                        }
                    }
                }
            })
        };

        let _ = tokio::join!(udp_writer, udp_reader, tcp_acceptor);
        Ok(())
    }

    // One TCP connection's whole lifetime (spec section 5 "TCPSession"):
    // reframes inbound bytes regardless of how recv splits them, answers
    // each framed message in turn, and closes on peer hangup, a framing
    // violation, or a worker abandoned past `work_deadline` (spec section 7:
    // both cases "cause connection close").
    async fn serve_tcp_connection(self: Arc<Self>, mut stream: TcpStream, client_addr: SocketAddr) {
        let (mut read_half, mut write_half) = stream.split();
        let mut framer = TcpFramer::new();
        let mut buf = [0u8; TCP_READ_BUF];

        loop {
            let n = match read_half.read(&mut buf).await {
                Ok(0) => return,
                Ok(n) => n,
                Err(_) => return,
            };

            for frame in framer.push(&buf[..n]) {
                let Some(response) = self.process(&frame, client_addr, false).await else {
                    return;
                };
                let framed = frame_message(&response);
                if write_half.write_all(&framed).await.is_err() {
                    return;
                }
            }
        }
    }

    // Parses, validates, answers, and (for UDP) truncates one message.
    // `None` means: drop the datagram, or close the connection -- either
    // because the message couldn't be decoded at all, or because the
    // worker was abandoned past `work_deadline` (spec section 5/7).
    async fn process(&self, raw: &[u8], client_addr: SocketAddr, is_udp: bool) -> Option<Vec<u8>> {
        let raw = raw.to_vec();
        let work = async move { self.answer_wire(&raw, client_addr) };
        match tokio::time::timeout(self.work_deadline, work).await {
            Ok(Some(response)) => {
                let response = if is_udp { truncate_for_udp(response) } else { response };
                Some(response.to_bytes())
            }
            Ok(None) => None,
            Err(_) => {
                tracing::warn!(%client_addr, "worker abandoned past work_deadline");
                None
            }
        }
    }

    // Validates the decoded packet against spec section 4.2's edge policies,
    // mapping each failure through `DispatchError::rcode` (spec section
    // 4.6's error/rcode table) rather than hand-rolling rcodes inline here.
    fn validate(packet: &DnsPacket) -> Result<&DnsQuestion, DispatchError> {
        if packet.questions.len() != 1 {
            return Err(DispatchError::BadQuestionCount);
        }
        let question = &packet.questions[0];
        if packet.flags.opcode != DnsOpcode::Query {
            return Err(DispatchError::UnsupportedOpcode);
        }
        if question.qclass != DnsClass::IN {
            return Err(DispatchError::UnsupportedClass);
        }
        Ok(question)
    }

    fn answer_wire(&self, raw: &[u8], client_addr: SocketAddr) -> Option<DnsPacket> {
        let packet = match DnsPacket::from_bytes(raw) {
            Ok(packet) => packet,
            Err(e) => {
                tracing::debug!(%client_addr, error = %e, "dropping malformed dns message");
                return e.get_error_response();
            }
        };

        let question = match Self::validate(&packet) {
            Ok(question) => question,
            Err(e) => {
                tracing::debug!(%client_addr, error = %e, "rejecting request");
                return Some(DnsPacket::error_response(&packet, e.rcode()));
            }
        };
        tracing::debug!(%client_addr, qname = %question.qname, qtype = ?question.qtype, "accepted request");

        // Spec section 7: an exception thrown inside provider or filter code
        // is caught at the worker boundary, logged with the client address
        // and question, and converted to SERVFAIL -- it must not take the
        // whole worker task down silently.
        match std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| self.answer(&packet, client_addr))) {
            Ok(response) => Some(response),
            Err(panic) => {
                let reason = panic_message(&panic);
                let err = DispatchError::Internal(reason);
                tracing::error!(%client_addr, qname = %question.qname, error = %err, "provider or filter panicked, answering SERVFAIL");
                Some(DnsPacket::error_response(&packet, err.rcode()))
            }
        }
    }

    fn answer(&self, packet: &DnsPacket, client_addr: SocketAddr) -> DnsPacket {
        let qname = &packet.questions[0].qname;
        match self.best_fit(qname, client_addr) {
            Some(provider) => match provider.get_response(packet, client_addr) {
                Some(mut response) => {
                    for filter in provider.filters() {
                        tracing::debug!("running filter");
                        response = filter.filter(packet, response);
                        tracing::debug!(rcode = ?response.flags.rcode, "filter returned");
                    }
                    response
                }
                None => DnsPacket::error_response(packet, DispatchError::NoMatchingZone.rcode()),
            },
            None => DnsPacket::error_response(packet, DispatchError::NoMatchingZone.rcode()),
        }
    }

    // The best-fit zone matching algorithm (spec section 4.2): longest
    // common-suffix wins, exact match short-circuits immediately, ties
    // break on provider registration order.
    fn best_fit(&self, qname: &DomainName, client_addr: SocketAddr) -> Option<&Arc<dyn Provider>> {
        let mut best: Option<(usize, usize)> = None;
        for (idx, provider) in self.providers.iter().enumerate() {
            for zone in provider.zones(client_addr) {
                let (relation, _, common) = qname.fullcompare(zone);
                match relation {
                    crate::dns::NameRelation::Equal => return Some(&self.providers[idx]),
                    crate::dns::NameRelation::Subdomain => {
                        if best.map(|(_, best_common)| common > best_common).unwrap_or(true) {
                            best = Some((idx, common));
                        }
                    }
                    _ => {}
                }
            }
        }
        best.map(|(idx, _)| &self.providers[idx])
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

// Resolves spec section 9's open question: truncate to the answer-section
// boundary and set TC rather than sending an oversized UDP datagram.
fn truncate_for_udp(mut response: DnsPacket) -> DnsPacket {
    if response.to_bytes().len() <= MAX_UDP_MESSAGE {
        return response;
    }
    response.flags.tc_bit = true;
    while response.to_bytes().len() > MAX_UDP_MESSAGE && !response.addl_recs.is_empty() {
        response.addl_recs.pop();
    }
    while response.to_bytes().len() > MAX_UDP_MESSAGE && !response.nameservers.is_empty() {
        response.nameservers.pop();
    }
    while response.to_bytes().len() > MAX_UDP_MESSAGE && !response.answers.is_empty() {
        response.answers.pop();
    }
    response
}

fn bind_udp(addr: SocketAddr) -> io::Result<std::net::UdpSocket> {
    let socket = Socket::new(Domain::for_address(addr), Type::DGRAM, Some(Protocol::UDP))?;
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    Ok(socket.into())
}

fn bind_tcp(addr: SocketAddr, backlog: i32) -> io::Result<std::net::TcpListener> {
    let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
    if addr.is_ipv6() {
        socket.set_only_v6(false)?;
    }
    socket.set_nonblocking(true)?;
    socket.bind(&addr.into())?;
    socket.listen(backlog)?;
    Ok(socket.into())
}
