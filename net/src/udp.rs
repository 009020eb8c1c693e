//! UDP transport

use crate::{Datagram, NetError, Transport};
use std::cell::RefCell;
use std::io::ErrorKind;
use std::net::SocketAddr;
use std::time::Instant;
use tokio::net::UdpSocket;
use tokio::runtime::{Builder, Runtime};
use tokio::time::sleep_until;

/// Largest payload of a single UDP datagram over IPv4.
pub const MAX_DATAGRAM: usize = 65507;

/// `Transport` over a real UDP socket. The socket is driven by a
/// current-thread runtime owned by the transport, so every call blocks the
/// caller and there is a single flow of control.
pub struct UdpTransport {
    runtime: Runtime,
    socket: UdpSocket,
    local: SocketAddr,
    buf: RefCell<Vec<u8>>,
}

impl UdpTransport {
    /// Bind a UDP socket.
    ///
    /// * `addr` - Local address.
    pub fn bind(addr: SocketAddr) -> Result<Self, NetError> {
        let runtime = Builder::new_current_thread().enable_io().enable_time().build()?;
        let socket = runtime.block_on(UdpSocket::bind(addr))?;
        let local = socket.local_addr()?;
        info!("Listening on udp://{local}");

        Ok(Self {
            runtime,
            socket,
            local,
            buf: RefCell::new(vec![0_u8; MAX_DATAGRAM]),
        })
    }
}

/// Errors that only mean an earlier datagram was not delivered.
fn is_transient(kind: ErrorKind) -> bool {
    matches!(
        kind,
        ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::ConnectionReset | ErrorKind::ConnectionRefused
    )
}

impl Transport for UdpTransport {
    fn local_addr(&self) -> SocketAddr {
        self.local
    }

    fn send_to(&self, payload: &[u8], to: SocketAddr) -> Result<(), NetError> {
        match self.runtime.block_on(self.socket.send_to(payload, to)) {
            Ok(_) => Ok(()),
            Err(e) if is_transient(e.kind()) => {
                debug!("Send to {to} failed: {e}");
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn recv_until(&self, deadline: Instant) -> Result<Option<Datagram>, NetError> {
        let mut buf = self.buf.borrow_mut();

        let received = self.runtime.block_on(async {
            let timer = sleep_until(deadline.into());
            tokio::pin!(timer);

            loop {
                tokio::select! {
                    biased;

                    res = self.socket.recv_from(&mut buf[..]) => match res {
                        Ok(received) => break Ok(Some(received)),
                        Err(e) if is_transient(e.kind()) => debug!("Receive failed: {e}"),
                        Err(e) => break Err(e),
                    },

                    _ = &mut timer => break Ok(None),
                }
            }
        })?;

        Ok(received.map(|(n, from)| Datagram {
            payload: buf[..n].to_vec(),
            from,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    fn loopback() -> UdpTransport {
        UdpTransport::bind("127.0.0.1:0".parse().expect("address")).expect("bind")
    }

    #[test]
    fn send_and_receive() {
        let a = loopback();
        let b = loopback();
        a.send_to(&[], b.local_addr()).expect("send");
        a.send_to(&[9, 8], b.local_addr()).expect("send");

        let first = b.recv_timeout(Duration::from_secs(5)).expect("recv").expect("datagram");
        assert!(first.payload.is_empty());
        assert_eq!(first.from, a.local_addr());

        let second = b.recv_timeout(Duration::from_secs(5)).expect("recv").expect("datagram");
        assert_eq!(second.payload, vec![9, 8]);
    }

    #[test]
    fn timeout_is_none() {
        let a = loopback();
        assert!(a.recv_timeout(Duration::ZERO).expect("recv").is_none());
    }

    #[test]
    fn waits_until_deadline() {
        let a = loopback();
        let start = Instant::now();
        assert!(a.recv_timeout(Duration::from_millis(20)).expect("recv").is_none());
        assert!(start.elapsed() >= Duration::from_millis(20));
    }

    #[test]
    fn largest_datagram_after_small_one() {
        let a = loopback();
        let b = loopback();
        let big = vec![7_u8; 8192];
        a.send_to(&[1], b.local_addr()).expect("send");
        a.send_to(&big, b.local_addr()).expect("send");

        let small = b.recv_timeout(Duration::from_secs(5)).expect("recv").expect("datagram");
        assert_eq!(small.payload, vec![1]);
        let large = b.recv_timeout(Duration::from_secs(5)).expect("recv").expect("datagram");
        assert_eq!(large.payload, big);
    }
}
