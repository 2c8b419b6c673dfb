use std::{
    fmt,
    io,
    net::{SocketAddr, ToSocketAddrs as _},
};

#[cfg(unix)]
use std::path::PathBuf;

mod stream;
mod udp;

pub(crate) use self::stream::TcpTransport;
#[cfg(unix)]
pub(crate) use self::stream::UnixTransport;
pub(crate) use self::udp::UdpTransport;

/// Address family to use when resolving an IP-based remote address.
///
/// Resolution of a hostname can yield both IPv4 and IPv6 candidates. Rather than guessing, the
/// family is explicit configuration: only candidates of the configured family are considered, and
/// resolving to none of them is a connect error.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum AddressFamily {
    /// IPv4.
    #[default]
    V4,

    /// IPv6.
    V6,
}

impl AddressFamily {
    fn matches(self, addr: &SocketAddr) -> bool {
        match self {
            AddressFamily::V4 => addr.is_ipv4(),
            AddressFamily::V6 => addr.is_ipv6(),
        }
    }
}

impl fmt::Display for AddressFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressFamily::V4 => f.write_str("IPv4"),
            AddressFamily::V6 => f.write_str("IPv6"),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub(crate) enum RemoteAddr {
    Udp { host: String, port: u16 },

    Tcp { host: String, port: u16 },

    #[cfg(unix)]
    Unix(PathBuf),
}

impl<'a> TryFrom<&'a str> for RemoteAddr {
    type Error = String;

    fn try_from(addr: &'a str) -> Result<Self, Self::Error> {
        if let Some((scheme, rest)) = addr.split_once("://") {
            return match scheme {
                "udp" => {
                    let (host, port) = parse_host_port(rest)?;
                    Ok(RemoteAddr::Udp { host, port })
                }
                "tcp" => {
                    let (host, port) = parse_host_port(rest)?;
                    Ok(RemoteAddr::Tcp { host, port })
                }
                #[cfg(unix)]
                "unix" => {
                    if rest.is_empty() {
                        return Err("empty socket path".to_string());
                    }
                    Ok(RemoteAddr::Unix(PathBuf::from(rest)))
                }
                _ => Err(format!("invalid scheme '{scheme}' (expected 'udp', 'tcp', or 'unix')")),
            };
        }

        // A bare `host:port` means UDP.
        let (host, port) = parse_host_port(addr)?;
        Ok(RemoteAddr::Udp { host, port })
    }
}

fn parse_host_port(authority: &str) -> Result<(String, u16), String> {
    let (host, port) = authority
        .rsplit_once(':')
        .ok_or_else(|| format!("invalid address '{authority}' (expected 'host:port')"))?;
    if host.is_empty() {
        return Err(format!("invalid address '{authority}' (empty host)"));
    }

    let port = port
        .parse::<u16>()
        .map_err(|_| format!("invalid port '{port}'"))?;

    // IPv6 literals come bracketed. `ToSocketAddrs` on a (host, port) pair wants them bare.
    let host = host.trim_start_matches('[').trim_end_matches(']').to_string();

    Ok((host, port))
}

/// Resolves `host:port` to a single socket address of the configured family.
///
/// Resolution failures and family mismatches are configuration errors, surfaced synchronously
/// from `connect` rather than retried.
pub(crate) fn resolve(host: &str, port: u16, family: AddressFamily) -> io::Result<SocketAddr> {
    let mut addrs = (host, port).to_socket_addrs()?;
    addrs.find(|addr| family.matches(addr)).ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::AddrNotAvailable,
            format!("no {family} address found for '{host}:{port}'"),
        )
    })
}

/// One underlying network connection to the remote server.
///
/// Implementations own at most one live socket at a time: `connect` replaces it, `close` drops
/// it, and `write_framed` opens it on demand when unset. The retry policy and the pipeline are
/// written against this trait and never branch on the transport kind.
pub(crate) trait Transport {
    /// Resolves the destination and opens the socket, replacing any existing handle.
    fn connect(&mut self) -> io::Result<()>;

    /// Drops the connection handle if present. A no-op when already closed.
    fn close(&mut self);

    /// Returns `true` if a connection handle is currently held.
    fn is_connected(&self) -> bool;

    /// Sends one payload as a single framed write, auto-connecting first if needed.
    ///
    /// Datagram transports send the payload bytes as one datagram. Stream transports append a
    /// trailing newline delimiter and write the framed payload as one buffer. Short writes are
    /// surfaced as errors; recovery is left to the retry policy.
    fn write_framed(&mut self, payload: &[u8]) -> io::Result<()>;

    /// The maximum payload length in bytes, if this transport enforces one.
    ///
    /// Only datagram transports are size-capped. Stream transports return `None` and a flush
    /// coalesces into a single payload regardless of size.
    fn max_payload_len(&self) -> Option<usize> {
        None
    }
}


#[cfg(test)]
mod tests {
    use super::{resolve, AddressFamily, RemoteAddr};

    #[test]
    fn parse_bare_address_is_udp() {
        let addr = RemoteAddr::try_from("127.0.0.1:8125").unwrap();
        assert_eq!(addr, RemoteAddr::Udp { host: "127.0.0.1".to_string(), port: 8125 });
    }

    #[test]
    fn parse_schemes() {
        let addr = RemoteAddr::try_from("udp://statsd.local:8125").unwrap();
        assert_eq!(addr, RemoteAddr::Udp { host: "statsd.local".to_string(), port: 8125 });

        let addr = RemoteAddr::try_from("tcp://statsd.local:8125").unwrap();
        assert_eq!(addr, RemoteAddr::Tcp { host: "statsd.local".to_string(), port: 8125 });

        #[cfg(unix)]
        {
            let addr = RemoteAddr::try_from("unix:///var/run/statsd.sock").unwrap();
            assert_eq!(addr, RemoteAddr::Unix("/var/run/statsd.sock".into()));
        }
    }

    #[test]
    fn parse_bracketed_ipv6_literal() {
        let addr = RemoteAddr::try_from("udp://[::1]:8125").unwrap();
        assert_eq!(addr, RemoteAddr::Udp { host: "::1".to_string(), port: 8125 });
    }

    #[test]
    fn parse_rejects_invalid_input() {
        assert!(RemoteAddr::try_from("gopher://statsd.local:8125").is_err());
        assert!(RemoteAddr::try_from("no-port-here").is_err());
        assert!(RemoteAddr::try_from("host:notaport").is_err());
        assert!(RemoteAddr::try_from(":8125").is_err());
        assert!(RemoteAddr::try_from("host:99999").is_err());
    }

    #[test]
    fn resolve_filters_by_family() {
        let addr = resolve("127.0.0.1", 8125, AddressFamily::V4).unwrap();
        assert!(addr.is_ipv4());

        // A v4 literal can never satisfy a v6-only configuration.
        let err = resolve("127.0.0.1", 8125, AddressFamily::V6).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::AddrNotAvailable);
    }
}
