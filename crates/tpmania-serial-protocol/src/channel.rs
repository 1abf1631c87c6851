//! Blocking line channels to the device.

use crate::codec::LineCodec;
use crate::config::{SerialSettings, TransferTiming};
use crate::error::{LinkError, LinkResult};
use log::{debug, trace};
use std::io::{ErrorKind, Read, Write};

/// Size of a single read from the underlying stream.
const READ_CHUNK: usize = 64;

/// A bidirectional, timeout-bound line channel.
///
/// Reads never block indefinitely: an implementation waits at most its
/// configured read timeout and returns `Ok(None)` if nothing arrived.
/// Errors mean the link itself is broken.
pub trait DeviceChannel {
    /// Read one cleaned line, or `None` if the read timed out with no data.
    fn read_line(&mut self) -> LinkResult<Option<String>>;

    /// Write raw bytes.
    fn write_all(&mut self, data: &[u8]) -> LinkResult<()>;

    /// Write a single-byte opcode.
    fn write_opcode(&mut self, opcode: u8) -> LinkResult<()> {
        trace!("-> opcode '{}'", opcode as char);
        self.write_all(&[opcode])
    }

    /// Write a newline-terminated data line.
    fn write_line(&mut self, text: &str) -> LinkResult<()> {
        trace!("-> {:?}", text);
        self.write_all(&LineCodec::encode_line(text))
    }
}

/// A line channel over any byte stream whose reads time out.
///
/// Stream reads that time out (or return no data) end the current
/// `read_line` call; whatever unterminated bytes were buffered are delivered
/// as a line, matching how the firmware sends the bare `X` sentinel.
pub struct LineChannel<P> {
    port: P,
    codec: LineCodec,
}

/// A line channel over a real serial port.
pub type SerialChannel = LineChannel<Box<dyn serialport::SerialPort>>;

impl<P: Read + Write> LineChannel<P> {
    /// Wrap an open stream.
    pub fn new(port: P) -> Self {
        LineChannel {
            port,
            codec: LineCodec::new(),
        }
    }

    /// Get the underlying stream.
    pub fn get_ref(&self) -> &P {
        &self.port
    }
}

impl<P: Read + Write> DeviceChannel for LineChannel<P> {
    fn read_line(&mut self) -> LinkResult<Option<String>> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            if let Some(line) = self.codec.decode_line() {
                trace!("<- {:?}", line);
                return Ok(Some(line));
            }

            match self.port.read(&mut chunk) {
                Ok(0) => return Ok(self.codec.take_partial()),
                Ok(n) => self.codec.push(&chunk[..n]),
                Err(e) if matches!(e.kind(), ErrorKind::TimedOut | ErrorKind::WouldBlock) => {
                    let partial = self.codec.take_partial();
                    if let Some(line) = &partial {
                        trace!("<- {:?} (unterminated)", line);
                    }
                    return Ok(partial);
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }

    fn write_all(&mut self, data: &[u8]) -> LinkResult<()> {
        self.port.write_all(data)?;
        self.port.flush()?;
        Ok(())
    }
}

/// Open the configured serial port (8N1, no flow control).
pub fn open_serial(settings: &SerialSettings, timing: &TransferTiming) -> LinkResult<SerialChannel> {
    let name = settings.port.as_deref().ok_or(LinkError::NoPortSelected)?;
    let port = serialport::new(name, settings.baud_rate)
        .data_bits(serialport::DataBits::Eight)
        .parity(serialport::Parity::None)
        .stop_bits(serialport::StopBits::One)
        .flow_control(serialport::FlowControl::None)
        .timeout(timing.read_timeout())
        .open()?;
    debug!("Opened {} at {} baud", name, settings.baud_rate);
    Ok(LineChannel::new(port))
}

/// Names of the serial ports present on this machine.
pub fn list_ports() -> LinkResult<Vec<String>> {
    Ok(serialport::available_ports()?
        .into_iter()
        .map(|p| p.port_name)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;
    use std::io;

    /// Stream returning one queued chunk per read, then timing out.
    struct ChunkedStream {
        chunks: VecDeque<Vec<u8>>,
        written: Vec<u8>,
    }

    impl ChunkedStream {
        fn new(chunks: &[&[u8]]) -> Self {
            ChunkedStream {
                chunks: chunks.iter().map(|c| c.to_vec()).collect(),
                written: Vec::new(),
            }
        }
    }

    impl Read for ChunkedStream {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            match self.chunks.pop_front() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => Err(io::Error::new(ErrorKind::TimedOut, "timed out")),
            }
        }
    }

    impl Write for ChunkedStream {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_reads_lines_across_chunks() {
        let mut channel = LineChannel::new(ChunkedStream::new(&[b"R", b"DY\n12", b"50\n"]));
        assert_eq!(channel.read_line().unwrap(), Some("RDY".to_string()));
        assert_eq!(channel.read_line().unwrap(), Some("1250".to_string()));
        assert_eq!(channel.read_line().unwrap(), None);
    }

    #[test]
    fn test_unterminated_sentinel_delivered_on_timeout() {
        let mut channel = LineChannel::new(ChunkedStream::new(&[b"500\n", b"X"]));
        assert_eq!(channel.read_line().unwrap(), Some("500".to_string()));
        assert_eq!(channel.read_line().unwrap(), Some("X".to_string()));
    }

    #[test]
    fn test_writes_opcode_and_line() {
        let mut channel = LineChannel::new(ChunkedStream::new(&[]));
        channel.write_opcode(b'T').unwrap();
        channel.write_line("200").unwrap();
        assert_eq!(channel.get_ref().written, b"T200\n");
    }

    #[test]
    fn test_broken_stream_is_an_error() {
        struct Broken;
        impl Read for Broken {
            fn read(&mut self, _: &mut [u8]) -> io::Result<usize> {
                Err(io::Error::new(ErrorKind::BrokenPipe, "unplugged"))
            }
        }
        impl Write for Broken {
            fn write(&mut self, _: &[u8]) -> io::Result<usize> {
                Err(io::Error::new(ErrorKind::BrokenPipe, "unplugged"))
            }
            fn flush(&mut self) -> io::Result<()> {
                Ok(())
            }
        }

        let mut channel = LineChannel::new(Broken);
        assert!(matches!(channel.read_line(), Err(LinkError::Io(_))));
        assert!(matches!(channel.write_line("1"), Err(LinkError::Io(_))));
    }

    #[test]
    fn test_open_without_port() {
        let result = open_serial(&SerialSettings::default(), &TransferTiming::default());
        assert!(matches!(result, Err(LinkError::NoPortSelected)));
    }
}
