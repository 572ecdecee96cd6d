use std::io::{self, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use native_tls::{HandshakeError, TlsConnector, TlsStream};

use super::error::ProbeError;

/// Longest reply line accepted before the server is considered broken.
const MAX_LINE: usize = 4096;
/// Upper bound on continuation lines in one reply.
const MAX_REPLY_LINES: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SmtpReply {
    pub code: u16,
    pub lines: Vec<String>,
}

impl SmtpReply {
    pub fn is_positive_completion(&self) -> bool {
        (200..300).contains(&self.code)
    }

    pub fn is_transient_failure(&self) -> bool {
        (400..500).contains(&self.code)
    }

    pub fn is_permanent_failure(&self) -> bool {
        (500..600).contains(&self.code)
    }

    pub fn has_capability(&self, keyword: &str) -> bool {
        self.lines.iter().any(|line| {
            line.split_whitespace()
                .next()
                .is_some_and(|token| token.eq_ignore_ascii_case(keyword))
        })
    }

    pub fn text(&self) -> String {
        self.lines.join(" ")
    }
}

enum Transport {
    Plain(TcpStream),
    Tls(Box<TlsStream<TcpStream>>),
    Closed,
}

impl Read for Transport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.read(buf),
            Self::Tls(stream) => stream.read(buf),
            Self::Closed => Err(io::ErrorKind::NotConnected.into()),
        }
    }
}

impl Write for Transport {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Self::Plain(stream) => stream.write(buf),
            Self::Tls(stream) => stream.write(buf),
            Self::Closed => Err(io::ErrorKind::NotConnected.into()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Self::Plain(stream) => stream.flush(),
            Self::Tls(stream) => stream.flush(),
            Self::Closed => Err(io::ErrorKind::NotConnected.into()),
        }
    }
}

/// One SMTP client connection with a recorded transcript.
pub(crate) struct SmtpSession {
    host: String,
    transport: Transport,
    buffer: Vec<u8>,
    transcript: Vec<String>,
}

impl SmtpSession {
    pub(crate) fn connect(
        host: &str,
        addresses: &[SocketAddr],
        timeout: Duration,
    ) -> Result<Self, ProbeError> {
        let mut last_err = None;
        for addr in addresses {
            match open_stream(addr, timeout) {
                Ok(stream) => {
                    tracing::debug!(host, %addr, "connected");
                    return Ok(Self {
                        host: host.to_string(),
                        transport: Transport::Plain(stream),
                        buffer: Vec::new(),
                        transcript: Vec::new(),
                    });
                }
                Err(err) => {
                    tracing::debug!(host, %addr, error = %err, "connect failed");
                    last_err = Some(err);
                }
            }
        }
        let source = last_err.unwrap_or_else(|| io::ErrorKind::AddrNotAvailable.into());
        if matches!(source.kind(), io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock) {
            return Err(ProbeError::Timeout {
                host: host.to_string(),
            });
        }
        Err(ProbeError::Connect {
            host: host.to_string(),
            source,
        })
    }

    pub(crate) fn read_banner(&mut self) -> Result<SmtpReply, ProbeError> {
        let reply = self.read_reply()?;
        self.record_reply(&reply);
        Ok(reply)
    }

    pub(crate) fn command(&mut self, command: &str) -> Result<SmtpReply, ProbeError> {
        self.record("C", command);
        let line = format!("{command}\r\n");
        self.transport
            .write_all(line.as_bytes())
            .and_then(|()| self.transport.flush())
            .map_err(|err| ProbeError::io(&self.host, err))?;
        let reply = self.read_reply()?;
        self.record_reply(&reply);
        Ok(reply)
    }

    /// Sends STARTTLS and, on a 2xx reply, upgrades the connection. A refusal
    /// is returned as the reply; a failed handshake is an error.
    pub(crate) fn starttls(&mut self, connector: &TlsConnector) -> Result<SmtpReply, ProbeError> {
        let reply = self.command("STARTTLS")?;
        if !reply.is_positive_completion() {
            return Ok(reply);
        }
        let stream = match std::mem::replace(&mut self.transport, Transport::Closed) {
            Transport::Plain(stream) => stream,
            other => {
                self.transport = other;
                return Err(ProbeError::protocol(&self.host, "STARTTLS on a secured session"));
            }
        };
        // RFC 3207: anything buffered before the handshake must be discarded.
        self.buffer.clear();
        let tls = match connector.connect(&self.host, stream) {
            Ok(tls) => tls,
            Err(HandshakeError::Failure(err)) => {
                return Err(ProbeError::Tls {
                    host: self.host.clone(),
                    reason: err.to_string(),
                });
            }
            Err(HandshakeError::WouldBlock(_)) => {
                return Err(ProbeError::Timeout {
                    host: self.host.clone(),
                });
            }
        };
        self.transport = Transport::Tls(Box::new(tls));
        self.record("*", "TLS established");
        Ok(reply)
    }

    pub(crate) fn quit(&mut self) {
        if self.command("QUIT").is_err() {
            tracing::trace!(host = %self.host, "QUIT not acknowledged");
        }
    }

    pub(crate) fn is_tls(&self) -> bool {
        matches!(self.transport, Transport::Tls(_))
    }

    pub(crate) fn take_transcript(&mut self) -> Vec<String> {
        std::mem::take(&mut self.transcript)
    }

    fn read_reply(&mut self) -> Result<SmtpReply, ProbeError> {
        let mut lines = Vec::new();
        let mut code = None;
        loop {
            let line = self.read_line()?;
            let parsed = line
                .get(..3)
                .and_then(|digits| digits.parse::<u16>().ok())
                .filter(|c| (100..600).contains(c))
                .ok_or_else(|| ProbeError::protocol(&self.host, format!("invalid reply: {line}")))?;
            match code {
                Some(existing) if existing != parsed => {
                    return Err(ProbeError::protocol(
                        &self.host,
                        format!("inconsistent reply codes: {existing} vs {parsed}"),
                    ));
                }
                _ => code = Some(parsed),
            }
            let continued = line.as_bytes().get(3) == Some(&b'-');
            lines.push(line.get(4..).unwrap_or_default().to_string());
            if !continued {
                break;
            }
            if lines.len() >= MAX_REPLY_LINES {
                return Err(ProbeError::protocol(&self.host, "reply has too many lines"));
            }
        }
        Ok(SmtpReply {
            code: code.unwrap_or_default(),
            lines,
        })
    }

    fn read_line(&mut self) -> Result<String, ProbeError> {
        loop {
            if let Some(pos) = self.buffer.iter().position(|b| *b == b'\n') {
                let mut line: Vec<u8> = self.buffer.drain(..=pos).collect();
                line.pop();
                if line.last() == Some(&b'\r') {
                    line.pop();
                }
                return Ok(String::from_utf8_lossy(&line).into_owned());
            }
            if self.buffer.len() > MAX_LINE {
                return Err(ProbeError::protocol(&self.host, "reply line too long"));
            }

            let mut chunk = [0u8; 1024];
            let read = self
                .transport
                .read(&mut chunk)
                .map_err(|err| ProbeError::io(&self.host, err))?;
            if read == 0 {
                return Err(ProbeError::io(
                    &self.host,
                    io::Error::new(io::ErrorKind::UnexpectedEof, "connection closed"),
                ));
            }
            self.buffer.extend_from_slice(&chunk[..read]);
        }
    }

    fn record(&mut self, direction: &str, message: &str) {
        self.transcript
            .push(format!("[{}] {direction}: {message}", self.host));
    }

    fn record_reply(&mut self, reply: &SmtpReply) {
        if reply.lines.is_empty() {
            self.record("S", &reply.code.to_string());
        }
        for line in &reply.lines {
            self.record("S", &format!("{} {line}", reply.code));
        }
    }
}

fn open_stream(addr: &SocketAddr, timeout: Duration) -> io::Result<TcpStream> {
    let stream = TcpStream::connect_timeout(addr, timeout)?;
    stream.set_read_timeout(Some(timeout))?;
    stream.set_write_timeout(Some(timeout))?;
    stream.set_nodelay(true)?;
    Ok(stream)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reply(code: u16, lines: &[&str]) -> SmtpReply {
        SmtpReply {
            code,
            lines: lines.iter().map(|l| l.to_string()).collect(),
        }
    }

    #[test]
    fn reply_classes() {
        assert!(reply(250, &["ok"]).is_positive_completion());
        assert!(reply(451, &["later"]).is_transient_failure());
        assert!(reply(550, &["no"]).is_permanent_failure());
    }

    #[test]
    fn capability_lookup_ignores_case_and_params() {
        let ehlo = reply(250, &["mx.example", "SIZE 1000", "starttls", "8BITMIME"]);
        assert!(ehlo.has_capability("STARTTLS"));
        assert!(ehlo.has_capability("size"));
        assert!(!ehlo.has_capability("SMTPUTF8"));
    }
}
