//! In-memory network

use crate::{Datagram, NetError, Transport};
use crossbeam_channel::{at, select, unbounded, Receiver, Sender, TryRecvError};
use rayfarm_core::rng::*;
use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

/// First port handed out to endpoints.
const FIRST_PORT: u16 = 40000;

/// Decides whether a datagram is dropped, given its payload, sender and
/// destination. Returns `true` to drop.
pub type DropFilter = Box<dyn FnMut(&[u8], SocketAddr, SocketAddr) -> bool + Send>;

/// How the in-memory network loses datagrams.
pub enum LossModel {
    /// Deliver everything.
    None,

    /// Drop each datagram independently with probability `rate`.
    Random { rate: f64, rng: RNG },

    /// Drop datagrams selected by a filter.
    Filter(DropFilter),
}

impl LossModel {
    /// Returns true if the datagram should be dropped.
    fn drops(&mut self, payload: &[u8], from: SocketAddr, to: SocketAddr) -> bool {
        match self {
            Self::None => false,
            Self::Random { rate, rng } => rng.uniform_float() < *rate,
            Self::Filter(filter) => filter(payload, from, to),
        }
    }
}

struct Routes {
    endpoints: HashMap<SocketAddr, Sender<Datagram>>,
    loss: LossModel,
    next_port: u16,
}

/// A simulated datagram network between endpoints in one process.
/// Cloning yields another handle to the same network.
#[derive(Clone)]
pub struct LocalNetwork {
    routes: Arc<Mutex<Routes>>,
}

impl Default for LocalNetwork {
    fn default() -> Self {
        Self::with_loss_model(LossModel::None)
    }
}

impl LocalNetwork {
    /// Create a lossless network.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a network that drops datagrams at random.
    ///
    /// * `rate` - Probability of dropping each datagram.
    /// * `seed` - Seed for the loss sequence.
    pub fn with_loss(rate: f64, seed: u64) -> Self {
        Self::with_loss_model(LossModel::Random {
            rate,
            rng: RNG::new(seed),
        })
    }

    /// Create a network that drops datagrams selected by a filter.
    ///
    /// * `filter` - Returns true for datagrams to drop.
    pub fn with_filter<F>(filter: F) -> Self
    where
        F: FnMut(&[u8], SocketAddr, SocketAddr) -> bool + Send + 'static,
    {
        Self::with_loss_model(LossModel::Filter(Box::new(filter)))
    }

    /// Create a network with the given loss model.
    ///
    /// * `loss` - Loss model.
    pub fn with_loss_model(loss: LossModel) -> Self {
        Self {
            routes: Arc::new(Mutex::new(Routes {
                endpoints: HashMap::new(),
                loss,
                next_port: FIRST_PORT,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Routes> {
        self.routes.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Attach a new endpoint with a fresh loopback address.
    pub fn endpoint(&self) -> LocalEndpoint {
        let (tx, rx) = unbounded();
        let mut routes = self.lock();
        let addr = SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), routes.next_port);
        routes.next_port = routes.next_port.wrapping_add(1);
        routes.endpoints.insert(addr, tx);

        LocalEndpoint {
            addr,
            rx,
            network: self.clone(),
        }
    }

    /// Detach every endpoint. Pending and future receives fail with
    /// `NetError::Disconnected`.
    pub fn shutdown(&self) {
        let mut routes = self.lock();
        debug!("Shutting down local network with {} endpoints", routes.endpoints.len());
        routes.endpoints.clear();
    }

    fn deliver(&self, payload: &[u8], from: SocketAddr, to: SocketAddr) {
        let mut routes = self.lock();
        if routes.loss.drops(payload, from, to) {
            trace!("Dropped {} byte datagram {from} -> {to}", payload.len());
            return;
        }

        match routes.endpoints.get(&to) {
            Some(tx) => {
                let datagram = Datagram {
                    payload: payload.to_vec(),
                    from,
                };
                if tx.send(datagram).is_err() {
                    trace!("Endpoint {to} is gone");
                }
            }
            None => trace!("No route to {to}"),
        }
    }
}

/// One attached endpoint of a `LocalNetwork`. Dropping it detaches it.
pub struct LocalEndpoint {
    addr: SocketAddr,
    rx: Receiver<Datagram>,
    network: LocalNetwork,
}

impl Transport for LocalEndpoint {
    fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    fn send_to(&self, payload: &[u8], to: SocketAddr) -> Result<(), NetError> {
        self.network.deliver(payload, self.addr, to);
        Ok(())
    }

    fn recv_until(&self, deadline: Instant) -> Result<Option<Datagram>, NetError> {
        match self.rx.try_recv() {
            Ok(datagram) => return Ok(Some(datagram)),
            Err(TryRecvError::Disconnected) => return Err(NetError::Disconnected),
            Err(TryRecvError::Empty) => {}
        }

        select! {
            recv(self.rx) -> msg => msg.map(Some).map_err(|_| NetError::Disconnected),
            recv(at(deadline)) -> _ => Ok(None),
        }
    }
}

impl Drop for LocalEndpoint {
    fn drop(&mut self) {
        self.network.lock().endpoints.remove(&self.addr);
    }
}
