use std::{
    io,
    net::{Ipv4Addr, Ipv6Addr, SocketAddr, UdpSocket},
    time::Duration,
};

use tracing::debug;

use super::{resolve, AddressFamily, Transport};

/// Datagram transport.
///
/// Each payload goes out as one unreliable datagram to the resolved address. The socket is
/// "connected" so that send failures (e.g. ICMP port unreachable on loopback) surface as errors
/// the retry policy can see.
pub(crate) struct UdpTransport {
    host: String,
    port: u16,
    family: AddressFamily,
    write_timeout: Option<Duration>,
    max_payload_len: usize,
    socket: Option<UdpSocket>,
}

impl UdpTransport {
    pub(crate) fn new(
        host: String,
        port: u16,
        family: AddressFamily,
        write_timeout: Option<Duration>,
        max_payload_len: usize,
    ) -> Self {
        UdpTransport { host, port, family, write_timeout, max_payload_len, socket: None }
    }
}

impl Transport for UdpTransport {
    fn connect(&mut self) -> io::Result<()> {
        let remote_addr = resolve(&self.host, self.port, self.family)?;

        let bind_addr: SocketAddr = match self.family {
            AddressFamily::V4 => (Ipv4Addr::UNSPECIFIED, 0).into(),
            AddressFamily::V6 => (Ipv6Addr::UNSPECIFIED, 0).into(),
        };
        let socket = UdpSocket::bind(bind_addr)?;
        socket.connect(remote_addr)?;
        socket.set_write_timeout(self.write_timeout)?;

        debug!(%remote_addr, "Connected UDP transport.");
        self.socket = Some(socket);

        Ok(())
    }

    fn close(&mut self) {
        self.socket = None;
    }

    fn is_connected(&self) -> bool {
        self.socket.is_some()
    }

    fn write_framed(&mut self, payload: &[u8]) -> io::Result<()> {
        if self.socket.is_none() {
            self.connect()?;
        }

        match self.socket.as_ref() {
            Some(socket) => {
                let written = socket.send(payload)?;
                if written != payload.len() {
                    return Err(io::Error::new(io::ErrorKind::WriteZero, "short datagram write"));
                }
                Ok(())
            }
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "transport not connected")),
        }
    }

    fn max_payload_len(&self) -> Option<usize> {
        Some(self.max_payload_len)
    }
}

#[cfg(test)]
mod tests {
    use std::net::UdpSocket;

    use super::{AddressFamily, Transport, UdpTransport};

    fn loopback_pair() -> (UdpSocket, UdpTransport) {
        let receiver = UdpSocket::bind("127.0.0.1:0").unwrap();
        let port = receiver.local_addr().unwrap().port();
        let transport =
            UdpTransport::new("127.0.0.1".to_string(), port, AddressFamily::V4, None, 512);
        (receiver, transport)
    }

    #[test]
    fn sends_payload_as_single_datagram() {
        let (receiver, mut transport) = loopback_pair();
        transport.connect().unwrap();

        transport.write_framed(b"a.b:1|c\nc.d:2|c").unwrap();

        let mut buf = [0u8; 1024];
        let received = receiver.recv(&mut buf).unwrap();
        // No trailing delimiter on datagram payloads.
        assert_eq!(&buf[..received], b"a.b:1|c\nc.d:2|c");
    }

    #[test]
    fn auto_connects_on_first_write() {
        let (receiver, mut transport) = loopback_pair();
        assert!(!transport.is_connected());

        transport.write_framed(b"x:1|c").unwrap();
        assert!(transport.is_connected());

        let mut buf = [0u8; 64];
        let received = receiver.recv(&mut buf).unwrap();
        assert_eq!(&buf[..received], b"x:1|c");
    }

    #[test]
    fn close_is_idempotent() {
        let (_receiver, mut transport) = loopback_pair();
        transport.connect().unwrap();
        assert!(transport.is_connected());

        transport.close();
        assert!(!transport.is_connected());
        transport.close();
        assert!(!transport.is_connected());
    }

    #[test]
    fn connect_fails_on_family_mismatch() {
        let mut transport =
            UdpTransport::new("127.0.0.1".to_string(), 8125, AddressFamily::V6, None, 512);
        assert!(transport.connect().is_err());
        assert!(!transport.is_connected());
    }

    #[test]
    fn reports_payload_cap() {
        let (_receiver, transport) = loopback_pair();
        assert_eq!(transport.max_payload_len(), Some(512));
    }
}
