use std::mem;

use crate::client::StatsdClient;

/// A batching scope over a [`StatsdClient`].
///
/// Lines are buffered in submission order and coalesced into payloads on flush. For size-capped
/// transports the coalescing is greedy: consecutive lines are packed into the fewest payloads
/// that stay within the cap, without reordering. Uncapped transports get the whole batch as one
/// payload.
///
/// Dropping the pipeline flushes it, so a scope that exits early (return, `?`, panic) still
/// delivers what it buffered. The mutable borrow on the client keeps direct sends and an open
/// batching scope from interleaving.
pub struct Pipeline<'a> {
    client: &'a mut StatsdClient,
    pending: Vec<String>,
}

impl<'a> Pipeline<'a> {
    pub(crate) fn new(client: &'a mut StatsdClient) -> Self {
        Pipeline { client, pending: Vec::new() }
    }

    /// Buffers one metric line. Performs no I/O.
    pub fn send(&mut self, line: impl Into<String>) {
        self.pending.push(line.into());
    }

    /// Coalesces and delivers everything buffered so far.
    ///
    /// The buffer is taken up front, so it is empty afterward even when every delivery fails;
    /// buffered telemetry is never redelivered. Each payload is retried independently, and one
    /// payload exhausting its attempts does not stop the ones after it.
    pub fn flush(&mut self) {
        let pending = mem::take(&mut self.pending);
        let mut lines = pending.into_iter();

        let Some(first) = lines.next() else {
            return;
        };

        match self.client.transport.max_payload_len() {
            Some(cap) => {
                let mut payload = first;
                for line in lines {
                    if payload.len() + 1 + line.len() > cap {
                        self.submit(&payload);
                        payload = line;
                    } else {
                        payload.push('\n');
                        payload.push_str(&line);
                    }
                }
                self.submit(&payload);
            }
            None => {
                let mut payload = first;
                for line in lines {
                    payload.push('\n');
                    payload.push_str(&line);
                }
                self.submit(&payload);
            }
        }
    }

    fn submit(&mut self, payload: &str) {
        let StatsdClient { transport, retry } = &mut *self.client;
        retry.send(transport.as_mut(), payload.as_bytes());
    }
}

impl Drop for Pipeline<'_> {
    fn drop(&mut self) {
        self.flush();
    }
}
