//! TCP transport and the connector used for lazy connection.

use std::io::{self, Read, Write};
use std::net::{Shutdown, TcpStream};

use crate::error::DapError;
use crate::transport::Transport;

/// Opens a transport to a configured address.
pub trait Connector {
    /// Connect to `address`.
    fn connect(&mut self, address: &str) -> Result<Box<dyn Transport>, DapError>;
}

/// A [`Transport`] over a blocking TCP stream.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
}

impl TcpTransport {
    /// Wrap a connected stream.
    pub fn new(stream: TcpStream) -> Self {
        Self { stream }
    }

    /// Connect to `address` (`host:port`).
    pub fn connect(address: &str) -> io::Result<Self> {
        let stream = TcpStream::connect(address)?;
        stream.set_nodelay(true)?;
        Ok(Self::new(stream))
    }
}

impl Transport for TcpTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.stream.read(buf)
    }

    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.stream.write(buf)
    }

    fn peek(&mut self) -> io::Result<usize> {
        let mut probe = [0u8; 1];
        self.stream.set_nonblocking(true)?;
        let result = self.stream.peek(&mut probe);
        self.stream.set_nonblocking(false)?;
        match result {
            // Readable but zero bytes: the peer has shut down.
            Ok(0) => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "debugger connection closed",
            )),
            Ok(n) => Ok(n),
            Err(e) if e.kind() == io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e),
        }
    }

    fn close(&mut self) {
        if let Err(e) = self.stream.shutdown(Shutdown::Both) {
            tracing::debug!("shutdown of debugger socket failed: {e}");
        }
    }
}

/// Connects over TCP.
#[derive(Debug, Default, Clone, Copy)]
pub struct TcpConnector;

impl Connector for TcpConnector {
    fn connect(&mut self, address: &str) -> Result<Box<dyn Transport>, DapError> {
        let transport = TcpTransport::connect(address).map_err(|source| DapError::Connect {
            address: address.to_string(),
            source,
        })?;
        Ok(Box::new(transport))
    }
}
