use std::{io, thread::sleep, time::Duration};

use tracing::{debug, error, trace};

use crate::transport::Transport;

/// Observer invoked with the attempt number and the error that triggered it.
///
/// Used for both the before-retry and the exhaustion callbacks. Telemetry delivery is
/// fire-and-forget, so these observers are the only place a caller can see send failures.
pub type RetryCallback = Box<dyn FnMut(usize, &io::Error) + Send>;

/// Bounded retry around one logical payload delivery.
///
/// Every write failure is treated as transient and retried up to the attempt limit; a payload
/// that exhausts its attempts is dropped without surfacing an error to the caller.
pub(crate) struct RetryPolicy {
    max_attempts: usize,
    retry_interval: Duration,
    reconnect_on_retry: bool,
    before_retry: Option<RetryCallback>,
    on_exhausted: Option<RetryCallback>,
}

impl RetryPolicy {
    pub(crate) fn new(
        max_attempts: usize,
        retry_interval: Duration,
        reconnect_on_retry: bool,
        before_retry: Option<RetryCallback>,
        on_exhausted: Option<RetryCallback>,
    ) -> Self {
        debug_assert!(max_attempts >= 1);
        RetryPolicy {
            max_attempts,
            retry_interval,
            reconnect_on_retry,
            before_retry,
            on_exhausted,
        }
    }

    /// Delivers one payload through the transport, retrying on failure.
    ///
    /// Between attempts the policy sleeps for the retry interval and, when configured, tears
    /// down and reopens the transport connection. A reconnect failure is swallowed here: the
    /// next attempt's write reconnects on demand and surfaces the failure as a write error.
    pub(crate) fn send(&mut self, transport: &mut dyn Transport, payload: &[u8]) {
        for attempt in 1..=self.max_attempts {
            let error = match transport.write_framed(payload) {
                Ok(()) => {
                    trace!(len = payload.len(), attempt, "Sent payload.");
                    return;
                }
                Err(e) => e,
            };

            if attempt == self.max_attempts {
                error!(error = %error, attempt, "Dropping payload after exhausting send attempts.");
                if let Some(on_exhausted) = self.on_exhausted.as_mut() {
                    on_exhausted(attempt, &error);
                }
                return;
            }

            debug!(error = %error, attempt, "Failed to send payload, will retry.");
            if let Some(before_retry) = self.before_retry.as_mut() {
                before_retry(attempt, &error);
            }

            sleep(self.retry_interval);

            if self.reconnect_on_retry {
                transport.close();
                if let Err(e) = transport.connect() {
                    debug!(error = %e, "Reconnect failed, deferring to next attempt.");
                }
            }
        }
    }
}
