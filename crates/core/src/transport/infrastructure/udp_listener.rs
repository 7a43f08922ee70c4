use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::shared::gesture::GestureLabel;
use crate::transport::domain::wire_message::{WireError, WireMessage};

/// How often the receive loop wakes to check the deadline and cancel flag.
const POLL_INTERVAL: Duration = Duration::from_millis(100);

const MAX_DATAGRAM: usize = 65_535;

/// One received datagram, decoded if possible.
#[derive(Debug)]
pub struct ReceivedDatagram {
    pub from: SocketAddr,
    pub payload: String,
    pub message: Result<WireMessage, WireError>,
}

/// Totals for a listening session.
#[derive(Debug, Clone, Copy)]
pub struct ListenReport {
    pub packets: usize,
    pub elapsed: Duration,
}

impl ListenReport {
    pub fn packets_per_second(&self) -> f64 {
        let secs = self.elapsed.as_secs_f64();
        if secs > 0.0 {
            self.packets as f64 / secs
        } else {
            0.0
        }
    }
}

/// Debugging receiver for the wire protocol.
pub struct UdpListener {
    socket: UdpSocket,
}

impl UdpListener {
    pub fn bind(host: &str, port: u16) -> io::Result<Self> {
        let socket = UdpSocket::bind((host, port))?;
        socket.set_read_timeout(Some(POLL_INTERVAL))?;
        Ok(Self { socket })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.socket.local_addr()
    }

    /// Receives until `timeout` elapses or `cancelled` is set, passing every
    /// datagram to `on_datagram`.
    pub fn listen(
        &self,
        timeout: Option<Duration>,
        cancelled: &Arc<AtomicBool>,
        mut on_datagram: impl FnMut(&ReceivedDatagram),
    ) -> io::Result<ListenReport> {
        let start = Instant::now();
        let mut packets = 0;
        let mut buf = vec![0u8; MAX_DATAGRAM];

        while !cancelled.load(Ordering::Relaxed) {
            if timeout.is_some_and(|t| start.elapsed() >= t) {
                break;
            }
            let (len, from) = match self.socket.recv_from(&mut buf) {
                Ok(received) => received,
                Err(e)
                    if e.kind() == io::ErrorKind::WouldBlock
                        || e.kind() == io::ErrorKind::TimedOut =>
                {
                    continue;
                }
                Err(e) => return Err(e),
            };
            packets += 1;

            let datagram = match std::str::from_utf8(&buf[..len]) {
                Ok(text) => ReceivedDatagram {
                    from,
                    payload: text.to_string(),
                    message: WireMessage::parse(text),
                },
                Err(_) => ReceivedDatagram {
                    from,
                    payload: format!("<{len} bytes of binary data>"),
                    message: Err(WireError::Unrecognized("binary".into())),
                },
            };
            on_datagram(&datagram);
        }

        Ok(ListenReport {
            packets,
            elapsed: start.elapsed(),
        })
    }
}

/// Passes through only datagrams whose gesture differs from the previous one.
#[derive(Default)]
pub struct GestureChangeFilter {
    last: Option<GestureLabel>,
}

impl GestureChangeFilter {
    pub fn changed<'a>(&mut self, datagram: &'a ReceivedDatagram) -> Option<&'a GestureLabel> {
        let label = datagram.message.as_ref().ok()?.gesture()?;
        if self.last.as_ref() == Some(label) {
            return None;
        }
        self.last = Some(label.clone());
        Some(label)
    }
}
