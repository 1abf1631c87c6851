//! In-memory device channel.
//!
//! [`ScriptedChannel`] stands in for a controller: it replays queued reply
//! lines, can react to each write through a responder closure, and records
//! every exchange so transfers can be checked byte for byte.

use crate::channel::DeviceChannel;
use crate::error::{LinkError, LinkResult};
use std::collections::VecDeque;

/// Reacts to bytes written by the host, returning lines the device replies with.
pub type Responder = Box<dyn FnMut(&[u8]) -> Vec<String> + Send>;

/// One recorded exchange on a [`ScriptedChannel`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Exchange {
    /// Host wrote these bytes.
    Write(Vec<u8>),
    /// Host read this line.
    Read(String),
    /// Host read and got nothing.
    Silence,
}

/// A [`DeviceChannel`] driven by a script instead of hardware.
#[derive(Default)]
pub struct ScriptedChannel {
    /// Pending replies; `None` entries produce one empty read.
    incoming: VecDeque<Option<String>>,
    responder: Option<Responder>,
    log: Vec<Exchange>,
    written: Vec<u8>,
    disconnected: bool,
}

impl ScriptedChannel {
    /// Create a channel with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a channel that replies with `lines` in order.
    pub fn with_replies<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut channel = Self::new();
        channel.push_replies(lines);
        channel
    }

    /// Queue reply lines.
    pub fn push_replies<I, S>(&mut self, lines: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.incoming
            .extend(lines.into_iter().map(|l| Some(l.into())));
    }

    /// Queue `count` reads that return nothing.
    pub fn push_silence(&mut self, count: usize) {
        self.incoming.extend(std::iter::repeat(None).take(count));
    }

    /// Install a closure called on every write; its lines are queued as replies.
    pub fn set_responder<F>(&mut self, responder: F)
    where
        F: FnMut(&[u8]) -> Vec<String> + Send + 'static,
    {
        self.responder = Some(Box::new(responder));
    }

    /// Make every following read and write fail as if the cable was pulled.
    pub fn disconnect(&mut self) {
        self.disconnected = true;
    }

    /// All bytes written by the host.
    pub fn written(&self) -> &[u8] {
        &self.written
    }

    /// Written bytes as text.
    pub fn written_text(&self) -> String {
        String::from_utf8_lossy(&self.written).into_owned()
    }

    /// Every read and write in order.
    pub fn log(&self) -> &[Exchange] {
        &self.log
    }

    /// Number of replies not yet read.
    pub fn pending_replies(&self) -> usize {
        self.incoming.len()
    }
}

impl DeviceChannel for ScriptedChannel {
    fn read_line(&mut self) -> LinkResult<Option<String>> {
        if self.disconnected {
            return Err(LinkError::Closed);
        }
        match self.incoming.pop_front().flatten() {
            Some(line) => {
                self.log.push(Exchange::Read(line.clone()));
                Ok(Some(line))
            }
            None => {
                self.log.push(Exchange::Silence);
                Ok(None)
            }
        }
    }

    fn write_all(&mut self, data: &[u8]) -> LinkResult<()> {
        if self.disconnected {
            return Err(LinkError::Closed);
        }
        self.written.extend_from_slice(data);
        self.log.push(Exchange::Write(data.to_vec()));
        if let Some(responder) = self.responder.as_mut() {
            let replies = responder(data);
            self.incoming.extend(replies.into_iter().map(Some));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replays_in_order() {
        let mut channel = ScriptedChannel::with_replies(["RDY", "X"]);
        channel.push_silence(1);
        assert_eq!(channel.read_line().unwrap(), Some("RDY".to_string()));
        assert_eq!(channel.read_line().unwrap(), Some("X".to_string()));
        assert_eq!(channel.read_line().unwrap(), None);
        assert_eq!(channel.read_line().unwrap(), None);
    }

    #[test]
    fn test_responder_queues_replies() {
        let mut channel = ScriptedChannel::new();
        channel.set_responder(|data| {
            if data == b"W" {
                vec!["200".to_string(), "X".to_string()]
            } else {
                Vec::new()
            }
        });
        channel.write_opcode(b'W').unwrap();
        assert_eq!(channel.pending_replies(), 2);
        assert_eq!(channel.written(), b"W");
    }

    #[test]
    fn test_disconnect() {
        let mut channel = ScriptedChannel::with_replies(["RDY"]);
        channel.disconnect();
        assert!(matches!(channel.read_line(), Err(LinkError::Closed)));
        assert!(matches!(channel.write_line("1"), Err(LinkError::Closed)));
    }
}
