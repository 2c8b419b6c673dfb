use std::{fmt, io};

use crate::{pipeline::Pipeline, retry::RetryPolicy, transport::Transport};

/// A statsd client.
///
/// Holds one transport connection and the retry policy applied to every delivery. Metric lines
/// are handed in pre-encoded (e.g. `requests.count:1|c`); the client never parses them.
///
/// The client is synchronous and single-threaded: every send blocks the calling thread for the
/// duration of the retry loop, and there is no internal locking. Wrap the client in a mutex if
/// it must be shared across threads.
pub struct StatsdClient {
    pub(crate) transport: Box<dyn Transport + Send>,
    pub(crate) retry: RetryPolicy,
}

impl fmt::Debug for StatsdClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StatsdClient").finish_non_exhaustive()
    }
}

impl StatsdClient {
    pub(crate) fn from_parts(transport: Box<dyn Transport + Send>, retry: RetryPolicy) -> Self {
        StatsdClient { transport, retry }
    }

    /// Sends one metric line immediately.
    ///
    /// Delivery is fire-and-forget: failures are retried per the configured policy and then
    /// dropped, never surfaced here. The retry observers are the only failure signal.
    pub fn send(&mut self, line: &str) {
        let StatsdClient { transport, retry } = self;
        retry.send(transport.as_mut(), line.as_bytes());
    }

    /// Opens a batching scope sharing this client's transport and retry configuration.
    ///
    /// Lines sent to the pipeline are buffered and coalesced into as few network writes as the
    /// transport's payload cap allows. The pipeline flushes when dropped, so buffered metrics
    /// survive early returns and unwinding in the surrounding scope.
    pub fn pipeline(&mut self) -> Pipeline<'_> {
        Pipeline::new(self)
    }

    /// Closes the transport connection, if open.
    ///
    /// Safe to call repeatedly. The next send reopens the connection on demand.
    pub fn close(&mut self) {
        self.transport.close();
    }

    /// Tears down the transport connection and opens a fresh one.
    ///
    /// Unlike sends, this surfaces the connect error so applications managing the connection
    /// explicitly can react to a misconfigured or unreachable endpoint.
    ///
    /// # Errors
    ///
    /// If resolving the remote address or establishing the new connection fails, an error will
    /// be returned and the connection handle is left unset.
    pub fn reconnect(&mut self) -> io::Result<()> {
        self.transport.close();
        self.transport.connect()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::StatsdClient;
    use crate::{
        retry::RetryPolicy,
        transport::testing::{MockTransport, MockTransportPairExt},
    };

    fn client(transport: MockTransport) -> StatsdClient {
        let retry = RetryPolicy::new(1, Duration::ZERO, true, None, None);
        StatsdClient::from_parts(Box::new(transport), retry)
    }

    #[test]
    fn send_delivers_one_line() {
        let (transport, state) = MockTransport::new();
        let mut client = client(transport);

        client.send("requests.count:1|c");

        assert_eq!(state.payloads(), vec![b"requests.count:1|c".to_vec()]);
    }

    #[test]
    fn send_failures_do_not_propagate() {
        let (transport, state) = MockTransport::new().fail_next_writes(usize::MAX);
        let mut client = client(transport);

        client.send("requests.count:1|c");

        assert_eq!(state.writes(), 1);
        assert!(state.payloads().is_empty());
    }

    #[test]
    fn close_is_idempotent() {
        let (transport, state) = MockTransport::new();
        let mut client = client(transport);

        client.close();
        client.close();

        assert_eq!(state.closes(), 2);
    }

    #[test]
    fn reconnect_cycles_the_connection() {
        let (transport, state) = MockTransport::new();
        let mut client = client(transport);

        client.reconnect().unwrap();

        assert_eq!(state.closes(), 1);
        assert_eq!(state.connects(), 1);
    }

    #[test]
    fn reconnect_surfaces_connect_errors() {
        let (transport, _state) = MockTransport::new().fail_connects();
        let mut client = client(transport);

        assert!(client.reconnect().is_err());
    }
}
