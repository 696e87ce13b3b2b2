//! Command channel: the single duplex connection to the session server.
//!
//! Outbound requests leave in the order they are produced. Anything sent
//! before the transport opens is queued and flushed right after the join
//! request. Closing is terminal: there is no reconnect here, a host that
//! wants one builds a fresh editor over a new `Transport`.

use pn_core::SessionRole;
use pn_core::protocol::{Event, Request, decode_event, encode_request};
use std::collections::VecDeque;
use thiserror::Error;

/// Outbound half of a text message stream (a WebSocket in the browser).
pub trait Transport {
    /// Send one text frame.
    ///
    /// # Errors
    /// Returns the transport's message when the frame cannot be sent.
    fn send_text(&mut self, text: &str) -> Result<(), String>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Open,
    /// Terminal.
    Disconnected,
}

#[derive(Debug, Error, PartialEq)]
pub enum ChannelError {
    #[error("connection to the session server is closed")]
    Disconnected,
    #[error("cannot encode request: {0}")]
    Encode(String),
    #[error("transport failed: {0}")]
    Transport(String),
}

pub struct CommandChannel<T: Transport> {
    transport: T,
    state: ConnectionState,
    model_id: String,
    role: SessionRole,
    pending: VecDeque<Request>,
    sent: usize,
}

impl<T: Transport> CommandChannel<T> {
    pub fn new(transport: T, model_id: impl Into<String>, role: SessionRole) -> Self {
        Self {
            transport,
            state: ConnectionState::Connecting,
            model_id: model_id.into(),
            role,
            pending: VecDeque::new(),
            sent: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn is_open(&self) -> bool {
        self.state == ConnectionState::Open
    }

    pub fn model_id(&self) -> &str {
        &self.model_id
    }

    /// Requests written to the transport so far, join included.
    pub fn sent_count(&self) -> usize {
        self.sent
    }

    pub fn queued_count(&self) -> usize {
        self.pending.len()
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The transport opened: join the session, then flush the queue.
    ///
    /// # Errors
    /// Fails if the channel already closed or the transport refuses a frame.
    pub fn on_open(&mut self) -> Result<(), ChannelError> {
        match self.state {
            ConnectionState::Disconnected => return Err(ChannelError::Disconnected),
            ConnectionState::Open => return Ok(()),
            ConnectionState::Connecting => {}
        }
        self.state = ConnectionState::Open;
        let join = match self.role {
            SessionRole::Collaborator => Request::JoinSession {
                model_id: self.model_id.clone(),
            },
            SessionRole::Spectator => Request::WatchSession {
                model_id: self.model_id.clone(),
            },
        };
        log::info!("channel open, joining {} as {:?}", self.model_id, self.role);
        self.write(&join)?;
        while let Some(request) = self.pending.pop_front() {
            self.write(&request)?;
        }
        Ok(())
    }

    /// Send a request, or queue it while still connecting.
    ///
    /// # Errors
    /// `Disconnected` once the channel has closed; `Transport` if the frame
    /// could not be written, which also closes the channel.
    pub fn send(&mut self, request: Request) -> Result<(), ChannelError> {
        match self.state {
            ConnectionState::Disconnected => Err(ChannelError::Disconnected),
            ConnectionState::Connecting => {
                log::debug!("queueing {request:?} until the channel opens");
                self.pending.push_back(request);
                Ok(())
            }
            ConnectionState::Open => self.write(&request),
        }
    }

    fn write(&mut self, request: &Request) -> Result<(), ChannelError> {
        let text = encode_request(request).map_err(ChannelError::Encode)?;
        if let Err(e) = self.transport.send_text(&text) {
            log::warn!("transport send failed: {e}");
            self.state = ConnectionState::Disconnected;
            self.pending.clear();
            return Err(ChannelError::Transport(e));
        }
        log::trace!("sent {text}");
        self.sent += 1;
        Ok(())
    }

    /// Decode one inbound frame. Undecodable frames are logged and dropped,
    /// as is anything arriving after close.
    pub fn on_message(&mut self, text: &str) -> Option<Event> {
        if self.state == ConnectionState::Disconnected {
            log::debug!("ignoring message after close");
            return None;
        }
        match decode_event(text) {
            Ok(event) => {
                log::trace!("received {}", event.name());
                Some(event)
            }
            Err(e) => {
                log::warn!("{e}");
                None
            }
        }
    }

    /// The transport closed. Returns true on the first close only.
    pub fn on_close(&mut self) -> bool {
        if self.state == ConnectionState::Disconnected {
            return false;
        }
        log::info!("channel to {} closed", self.model_id);
        self.state = ConnectionState::Disconnected;
        self.pending.clear();
        true
    }
}
