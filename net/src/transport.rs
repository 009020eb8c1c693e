//! Transport

use crate::NetError;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// A received datagram.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Datagram {
    /// Datagram bytes.
    pub payload: Vec<u8>,

    /// Sender address.
    pub from: SocketAddr,
}

/// An unreliable, unordered datagram channel. Datagrams may be lost or
/// reordered but are never corrupted or truncated.
pub trait Transport {
    /// Returns the address peers use to reach this transport.
    fn local_addr(&self) -> SocketAddr;

    /// Send one datagram. Delivery is not guaranteed.
    ///
    /// * `payload` - Datagram bytes.
    /// * `to`      - Destination address.
    fn send_to(&self, payload: &[u8], to: SocketAddr) -> Result<(), NetError>;

    /// Wait for the next datagram. Returns `None` once `deadline` passes
    /// with nothing received.
    ///
    /// * `deadline` - Latest time to return.
    fn recv_until(&self, deadline: Instant) -> Result<Option<Datagram>, NetError>;

    /// Wait for the next datagram. Returns `None` if nothing arrived within
    /// `timeout`.
    ///
    /// * `timeout` - Maximum time to wait.
    fn recv_timeout(&self, timeout: Duration) -> Result<Option<Datagram>, NetError> {
        self.recv_until(Instant::now() + timeout)
    }
}

/// Result of waiting on a transport and a timer at once.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A datagram arrived before the timer fired.
    Datagram(Datagram),

    /// The timer fired.
    Tick,
}

/// Periodic timer driving the retransmission logic. Only one event is
/// reported per call to `wait()`.
#[derive(Copy, Clone, Debug)]
pub struct Ticker {
    period: Duration,
    next: Instant,
}

impl Ticker {
    /// Create a timer whose first tick is one period from now.
    ///
    /// * `period` - Timer period.
    pub fn new(period: Duration) -> Self {
        Self {
            period,
            next: Instant::now() + period,
        }
    }

    /// Block until a datagram arrives or the timer fires, whichever is
    /// first. An overdue tick wins over queued datagrams. The timer restarts
    /// from the moment it fires.
    ///
    /// * `transport` - The transport to listen on.
    pub fn wait<T: Transport + ?Sized>(&mut self, transport: &T) -> Result<Event, NetError> {
        if Instant::now() < self.next {
            if let Some(datagram) = transport.recv_until(self.next)? {
                return Ok(Event::Datagram(datagram));
            }
        }

        self.next = Instant::now() + self.period;
        Ok(Event::Tick)
    }
}
