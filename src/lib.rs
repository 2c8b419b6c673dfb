//! A client for sending application metrics to a [statsd][statsd]-compatible server.
//!
//! [statsd]: https://github.com/statsd/statsd
//!
//! # Usage
//!
//! Metric lines are handed in pre-encoded; this crate handles getting them onto the wire
//! efficiently. Sends are fire-and-forget: delivery failures are retried per a configurable
//! policy and then dropped, and never surface as errors to the instrumented application.
//!
//! ```no_run
//! use statsd_client::StatsdBuilder;
//!
//! // UDP to 127.0.0.1:8125 by default; `tcp://` and `unix://` addresses select the other
//! // transports.
//! let mut client = StatsdBuilder::default()
//!     .with_remote_address("127.0.0.1:8125")
//!     .expect("valid address")
//!     .build()
//!     .expect("failed to build client");
//!
//! // One metric, one network write.
//! client.send("requests.count:1|c");
//!
//! // Batching: lines sent inside the scope are buffered and coalesced into as few writes as
//! // the transport's payload cap allows. The pipeline flushes when it goes out of scope, even
//! // if the scope unwinds.
//! {
//!     let mut pipeline = client.pipeline();
//!     pipeline.send("requests.count:1|c");
//!     pipeline.send("requests.duration:250|ms");
//! }
//! ```
//!
//! # Transports
//!
//! Three interchangeable transports are supported:
//!
//! - UDP: connectionless; each payload is one datagram, capped at a configurable maximum
//!   payload length (512 bytes by default) to avoid IP fragmentation.
//! - TCP: connection-oriented; payloads are newline-delimited on a persistent connection,
//!   with no size cap.
//! - Unix domain sockets (`SOCK_STREAM`, Unix only): like TCP, addressed by filesystem path.
//!
//! The retry policy and the pipeline are written once against the transport abstraction; only
//! framing and connection lifecycle differ per transport.
//!
//! # Delivery semantics
//!
//! Each payload gets a bounded number of send attempts. Between attempts the client sleeps for
//! the retry interval and, by default, tears down and reopens the connection. Observer
//! callbacks expose retries and exhaustion for monitoring; nothing else does. Configuration
//! errors (an unparseable or unresolvable address) are the exception and surface at build or
//! reconnect time, since they indicate misconfiguration rather than a transient network
//! condition.

#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]
#![deny(missing_docs)]

mod builder;
pub use self::builder::{BuildError, StatsdBuilder};

mod client;
pub use self::client::StatsdClient;

mod pipeline;
pub use self::pipeline::Pipeline;

mod retry;
pub use self::retry::RetryCallback;

mod transport;
pub use self::transport::AddressFamily;
