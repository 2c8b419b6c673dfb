use std::{fmt, io, time::Duration};

use thiserror::Error;

use crate::{
    client::StatsdClient,
    retry::{RetryCallback, RetryPolicy},
    transport::{AddressFamily, RemoteAddr, TcpTransport, Transport, UdpTransport},
};

#[cfg(unix)]
use crate::transport::UnixTransport;

/// Conservative datagram default, chosen to avoid IP fragmentation.
const DEFAULT_MAX_PAYLOAD_LEN: usize = 512;
const DEFAULT_RETRY_INTERVAL: Duration = Duration::from_millis(10);

/// Datagram resends are cheap, so connectionless transports get more attempts by default than
/// connection-oriented ones, where each retry may mean a full reconnect.
const DEFAULT_DATAGRAM_ATTEMPTS: usize = 2;
const DEFAULT_STREAM_ATTEMPTS: usize = 1;

/// Errors that could occur while building a statsd client.
#[derive(Debug, Error)]
pub enum BuildError {
    /// Failed to parse the remote address.
    #[error("invalid remote address: {reason}")]
    InvalidRemoteAddress {
        /// Details about the parsing failure.
        reason: String,
    },

    /// The configured retry count does not allow even a single send attempt.
    #[error("max retries must be at least 1")]
    InvalidRetryCount,

    /// The configured maximum payload length cannot hold any metric.
    #[error("maximum payload length must be greater than zero")]
    InvalidMaxPayloadLength,

    /// Failed to establish the initial connection for an eagerly-connected transport.
    #[error("failed to connect to remote server: {0}")]
    Connect(#[from] io::Error),
}

/// Builder for a [`StatsdClient`].
pub struct StatsdBuilder {
    remote_addr: RemoteAddr,
    addr_family: AddressFamily,
    connect_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    max_payload_len: usize,
    max_retries: Option<usize>,
    retry_interval: Duration,
    reconnect_on_retry: bool,
    before_retry: Option<RetryCallback>,
    on_exhausted: Option<RetryCallback>,
}

impl StatsdBuilder {
    /// Set the remote address to send metrics to.
    ///
    /// For UDP, the address simply needs to be in the format of `<host>:<port>`, or
    /// `udp://<host>:<port>`. For TCP, `tcp://<host>:<port>`. For Unix domain sockets,
    /// `unix://<path>`. IPv6 literals may be bracketed, e.g. `udp://[::1]:8125`.
    ///
    /// Hostname resolution happens at connect time, not here.
    ///
    /// Defaults to sending to `127.0.0.1:8125` over UDP.
    ///
    /// # Errors
    ///
    /// If the given address is not able to be parsed as a valid address, an error will be
    /// returned indicating the reason.
    pub fn with_remote_address<A>(mut self, addr: A) -> Result<Self, BuildError>
    where
        A: AsRef<str>,
    {
        self.remote_addr = RemoteAddr::try_from(addr.as_ref())
            .map_err(|reason| BuildError::InvalidRemoteAddress { reason })?;
        Ok(self)
    }

    /// Set the address family used when resolving an IP-based remote address.
    ///
    /// Only resolution candidates of this family are considered; resolving to none of them is a
    /// connect error. Ignored for Unix domain sockets.
    ///
    /// Defaults to [`AddressFamily::V4`].
    #[must_use]
    pub fn with_address_family(mut self, family: AddressFamily) -> Self {
        self.addr_family = family;
        self
    }

    /// Set the connect timeout for connection-oriented transports.
    ///
    /// Defaults to the operating system's connect timeout.
    #[must_use]
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = Some(timeout);
        self
    }

    /// Set the write timeout for sending payloads.
    ///
    /// When the write timeout is reached, the write fails and is subject to the configured retry
    /// policy like any other write failure.
    ///
    /// Defaults to blocking indefinitely.
    #[must_use]
    pub fn with_write_timeout(mut self, timeout: Duration) -> Self {
        self.write_timeout = Some(timeout);
        self
    }

    /// Set the maximum payload length for datagram transports.
    ///
    /// Pipeline flushes coalesce metric lines into payloads no longer than this. Connection-
    /// oriented transports ignore it and always coalesce a batch into a single payload.
    ///
    /// Defaults to 512 bytes, conservative enough to avoid IP fragmentation.
    #[must_use]
    pub fn with_maximum_payload_length(mut self, max_payload_len: usize) -> Self {
        self.max_payload_len = max_payload_len;
        self
    }

    /// Set the maximum number of send attempts per payload.
    ///
    /// Must be at least 1. Defaults to 2 for datagram transports and 1 for connection-oriented
    /// transports, reflecting the relative cost of a bare resend versus a full reconnect.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: usize) -> Self {
        self.max_retries = Some(max_retries);
        self
    }

    /// Set the delay between send attempts.
    ///
    /// Defaults to 10 milliseconds.
    #[must_use]
    pub fn with_retry_interval(mut self, retry_interval: Duration) -> Self {
        self.retry_interval = retry_interval;
        self
    }

    /// Set whether the connection is torn down and reopened between send attempts.
    ///
    /// When disabled, a retry is a bare resend over the existing connection handle.
    ///
    /// Defaults to `true`.
    #[must_use]
    pub fn with_reconnect_on_retry(mut self, reconnect_on_retry: bool) -> Self {
        self.reconnect_on_retry = reconnect_on_retry;
        self
    }

    /// Set an observer invoked before each retry, with the failed attempt number and its error.
    ///
    /// The observer runs before the retry interval sleep. It is the place to hook logging or
    /// monitoring of transient send failures without changing delivery semantics.
    #[must_use]
    pub fn with_before_retry_callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(usize, &io::Error) + Send + 'static,
    {
        self.before_retry = Some(Box::new(callback));
        self
    }

    /// Set an observer invoked once when a payload is dropped after its final attempt, with the
    /// final attempt number and the last error.
    #[must_use]
    pub fn with_on_exhausted_callback<F>(mut self, callback: F) -> Self
    where
        F: FnMut(usize, &io::Error) + Send + 'static,
    {
        self.on_exhausted = Some(Box::new(callback));
        self
    }

    /// Builds the client.
    ///
    /// Datagram transports connect eagerly here, so a misconfigured endpoint (unresolvable
    /// host, address family mismatch) fails the build rather than silently dropping every
    /// metric later. Connection-oriented transports connect lazily on first send.
    ///
    /// # Errors
    ///
    /// If the configuration is invalid, or the eager connect of a datagram transport fails, an
    /// error will be returned.
    pub fn build(self) -> Result<StatsdClient, BuildError> {
        if self.max_retries == Some(0) {
            return Err(BuildError::InvalidRetryCount);
        }
        if self.max_payload_len == 0 {
            return Err(BuildError::InvalidMaxPayloadLength);
        }

        let (mut transport, default_attempts): (Box<dyn Transport + Send>, usize) =
            match self.remote_addr {
                RemoteAddr::Udp { host, port } => {
                    let transport = UdpTransport::new(
                        host,
                        port,
                        self.addr_family,
                        self.write_timeout,
                        self.max_payload_len,
                    );
                    (Box::new(transport), DEFAULT_DATAGRAM_ATTEMPTS)
                }
                RemoteAddr::Tcp { host, port } => {
                    let transport = TcpTransport::new(
                        host,
                        port,
                        self.addr_family,
                        self.connect_timeout,
                        self.write_timeout,
                    );
                    (Box::new(transport), DEFAULT_STREAM_ATTEMPTS)
                }
                #[cfg(unix)]
                RemoteAddr::Unix(path) => {
                    let transport = UnixTransport::new(path, self.write_timeout);
                    (Box::new(transport), DEFAULT_STREAM_ATTEMPTS)
                }
            };

        if transport.max_payload_len().is_some() {
            transport.connect()?;
        }

        let retry = RetryPolicy::new(
            self.max_retries.unwrap_or(default_attempts),
            self.retry_interval,
            self.reconnect_on_retry,
            self.before_retry,
            self.on_exhausted,
        );

        Ok(StatsdClient::from_parts(transport, retry))
    }
}

impl fmt::Debug for StatsdBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsdBuilder").finish_non_exhaustive()
    }
}

impl Default for StatsdBuilder {
    fn default() -> Self {
        StatsdBuilder {
            remote_addr: RemoteAddr::Udp { host: "127.0.0.1".to_string(), port: 8125 },
            addr_family: AddressFamily::default(),
            connect_timeout: None,
            write_timeout: None,
            max_payload_len: DEFAULT_MAX_PAYLOAD_LEN,
            max_retries: None,
            retry_interval: DEFAULT_RETRY_INTERVAL,
            reconnect_on_retry: true,
            before_retry: None,
            on_exhausted: None,
        }
    }
}
