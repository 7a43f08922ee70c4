use std::io;
use std::net::{SocketAddr, ToSocketAddrs, UdpSocket};

use crate::transport::domain::datagram_sink::DatagramSink;

/// Connectionless UDP sender bound to an ephemeral local port.
///
/// The socket is non-blocking: a send that would block is reported as a
/// lost datagram instead of stalling the frame loop. The socket closes on drop.
pub struct UdpSink {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpSink {
    pub fn connect(host: &str, port: u16) -> io::Result<Self> {
        let target = (host, port).to_socket_addrs()?.next().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::AddrNotAvailable,
                format!("no address for {host}:{port}"),
            )
        })?;
        let bind_addr = if target.is_ipv4() {
            "0.0.0.0:0"
        } else {
            "[::]:0"
        };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.set_nonblocking(true)?;
        Ok(Self { socket, target })
    }

    pub fn target(&self) -> SocketAddr {
        self.target
    }
}

impl DatagramSink for UdpSink {
    fn send(&mut self, payload: &[u8]) -> io::Result<()> {
        self.socket.send_to(payload, self.target).map(|_| ())
    }

    fn destination(&self) -> String {
        self.target.to_string()
    }
}
