use std::{
    io,
    net::TcpStream,
    time::Duration,
};

#[cfg(unix)]
use std::{os::unix::net::UnixStream, path::PathBuf};

use tracing::debug;

use super::{resolve, AddressFamily, Transport};

/// Writes one payload plus the trailing newline delimiter as a single buffer.
///
/// Stream payloads are framed by the delimiter, so the remote server can split concatenated
/// payloads apart again. Building the framed buffer up front keeps the whole frame in one write.
fn write_delimited<W: io::Write>(stream: &mut W, payload: &[u8]) -> io::Result<()> {
    let mut framed = Vec::with_capacity(payload.len() + 1);
    framed.extend_from_slice(payload);
    framed.push(b'\n');
    stream.write_all(&framed)
}

/// Connection-oriented transport over TCP.
///
/// The connection is opened lazily on the first write and kept for subsequent writes. There is
/// no payload size cap; a flush always coalesces into a single payload.
pub(crate) struct TcpTransport {
    host: String,
    port: u16,
    family: AddressFamily,
    connect_timeout: Option<Duration>,
    write_timeout: Option<Duration>,
    stream: Option<TcpStream>,
}

impl TcpTransport {
    pub(crate) fn new(
        host: String,
        port: u16,
        family: AddressFamily,
        connect_timeout: Option<Duration>,
        write_timeout: Option<Duration>,
    ) -> Self {
        TcpTransport { host, port, family, connect_timeout, write_timeout, stream: None }
    }
}

impl Transport for TcpTransport {
    fn connect(&mut self) -> io::Result<()> {
        let remote_addr = resolve(&self.host, self.port, self.family)?;

        let stream = match self.connect_timeout {
            Some(timeout) => TcpStream::connect_timeout(&remote_addr, timeout)?,
            None => TcpStream::connect(remote_addr)?,
        };
        stream.set_write_timeout(self.write_timeout)?;

        debug!(%remote_addr, "Connected TCP transport.");
        self.stream = Some(stream);

        Ok(())
    }

    fn close(&mut self) {
        self.stream = None;
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn write_framed(&mut self, payload: &[u8]) -> io::Result<()> {
        if self.stream.is_none() {
            self.connect()?;
        }

        match self.stream.as_mut() {
            Some(stream) => write_delimited(stream, payload),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "transport not connected")),
        }
    }
}

/// Connection-oriented transport over a filesystem-addressed local socket.
#[cfg(unix)]
pub(crate) struct UnixTransport {
    path: PathBuf,
    write_timeout: Option<Duration>,
    stream: Option<UnixStream>,
}

#[cfg(unix)]
impl UnixTransport {
    pub(crate) fn new(path: PathBuf, write_timeout: Option<Duration>) -> Self {
        UnixTransport { path, write_timeout, stream: None }
    }
}

#[cfg(unix)]
impl Transport for UnixTransport {
    fn connect(&mut self) -> io::Result<()> {
        let stream = UnixStream::connect(&self.path)?;
        stream.set_write_timeout(self.write_timeout)?;

        debug!(path = %self.path.display(), "Connected Unix domain socket transport.");
        self.stream = Some(stream);

        Ok(())
    }

    fn close(&mut self) {
        self.stream = None;
    }

    fn is_connected(&self) -> bool {
        self.stream.is_some()
    }

    fn write_framed(&mut self, payload: &[u8]) -> io::Result<()> {
        if self.stream.is_none() {
            self.connect()?;
        }

        match self.stream.as_mut() {
            Some(stream) => write_delimited(stream, payload),
            None => Err(io::Error::new(io::ErrorKind::NotConnected, "transport not connected")),
        }
    }
}
