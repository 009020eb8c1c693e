//! Coordinator

use crate::*;
use rayfarm_api::parser::parse_scene;
use rayfarm_core::app::{Granularity, DEFAULT_TICK_MS};
use rayfarm_core::film::*;
use rayfarm_net::*;
use std::collections::HashSet;
use std::net::SocketAddr;
use std::time::{Duration, Instant};

/// Distributes a scene to workers, hands out work units and assembles the
/// image from their results.
pub struct Coordinator<T: Transport> {
    /// Network transport.
    transport: T,

    /// Message codec for this job.
    protocol: Protocol,

    /// Scene fragments.
    scene: SceneSender,

    /// Workers that were sent the scene but have not confirmed.
    unconfirmed: HashSet<SocketAddr>,

    /// Confirmed workers.
    pool: WorkerPool,

    /// Units without a result.
    pending: PendingUnits,

    /// The image.
    pixels: PixelBuffer,

    /// Retransmission timer period.
    tick: Duration,

    /// Time limit for the whole job.
    deadline: Option<Duration>,
}

impl<T: Transport> Coordinator<T> {
    /// Create a coordinator for one job. The scene text is parsed here to
    /// find the image resolution.
    ///
    /// * `transport`   - Network transport.
    /// * `lines`       - Scene text.
    /// * `granularity` - Work granularity.
    /// * `workers`     - Worker addresses.
    pub fn new(
        transport: T,
        lines: &[String],
        granularity: Granularity,
        workers: &[SocketAddr],
    ) -> Result<Self, FarmError> {
        let view = parse_scene(lines.iter().map(String::as_str))?.view;
        let protocol = Protocol::new(granularity, view)?;
        let scene = SceneSender::new(lines, protocol.fragment_view())?;

        Ok(Self {
            transport,
            protocol,
            scene,
            unconfirmed: workers.iter().copied().collect(),
            pool: WorkerPool::new(),
            pending: PendingUnits::new(protocol.units()),
            pixels: PixelBuffer::new(view),
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            deadline: None,
        })
    }

    /// Set the retransmission timer period.
    ///
    /// * `tick` - Timer period.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Set a time limit for the job.
    ///
    /// * `deadline` - Time limit or `None` to wait forever.
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    /// Returns the message codec.
    pub fn protocol(&self) -> &Protocol {
        &self.protocol
    }

    /// Run the job to completion and return the image.
    pub fn run(mut self) -> Result<PixelBuffer, FarmError> {
        let start = Instant::now();
        info!(
            "Rendering {}x{} image in {:?} mode on {} workers",
            self.pixels.width(),
            self.pixels.height(),
            self.protocol.granularity,
            self.unconfirmed.len()
        );

        for worker in self.unconfirmed.iter() {
            self.scene.send_all(&self.transport, *worker)?;
        }

        let mut ticker = Ticker::new(self.tick);
        loop {
            if let Some(deadline) = self.deadline {
                if start.elapsed() >= deadline {
                    error!("Deadline of {deadline:?} exceeded");
                    return Err(FarmError::DeadlineExceeded {
                        pending: self.pending.len(),
                    });
                }
            }

            match ticker.wait(&self.transport)? {
                Event::Datagram(datagram) => self.handle(datagram)?,
                Event::Tick => self.on_tick()?,
            }

            if self.pending.is_empty() {
                break;
            }
            self.assign()?;
        }

        info!("Rendering finished in {:.2?}", start.elapsed());
        Ok(self.pixels)
    }

    /// Handle one inbound datagram.
    ///
    /// * `datagram` - The datagram.
    fn handle(&mut self, datagram: Datagram) -> Result<(), FarmError> {
        let Datagram { payload, from } = datagram;
        match self.protocol.decode_at_coordinator(&payload) {
            Some(Message::MissingLine(index)) => {
                self.scene.resend(&self.transport, from, index)?;
            }
            Some(Message::Confirmation) => {
                self.unconfirmed.remove(&from);
                if self.pool.add(from) {
                    info!("Worker {from} is ready ({} in pool)", self.pool.len());
                } else {
                    trace!("Duplicate confirmation from {from}");
                }
            }
            Some(Message::RenderResult(result)) => self.complete(result, from),
            Some(message) => debug!("Unexpected {message:?} from {from}"),
            None => debug!("Ignoring {} byte datagram from {from}", payload.len()),
        }
        Ok(())
    }

    /// Resend the first scene line to workers that have not confirmed, so a
    /// worker that lost every fragment still starts its transfer.
    fn on_tick(&mut self) -> Result<(), FarmError> {
        for worker in self.unconfirmed.iter() {
            trace!("Worker {worker} has not confirmed");
            self.scene.resend(&self.transport, *worker, 0)?;
        }
        Ok(())
    }

    /// Store a result if its unit is still pending.
    ///
    /// * `result` - The result.
    /// * `from`   - Worker address.
    fn complete(&mut self, result: RenderResult, from: SocketAddr) {
        let unit = result.unit();
        if !self.pending.complete(&unit) {
            trace!("Ignoring result for {unit} from {from}");
            return;
        }

        let written = match result {
            RenderResult::Row { y, pixels } => self.pixels.set_row(y, &pixels),
            RenderResult::Pixel { x, y, rgb } => self.pixels.set_pixel(x, y, rgb),
        };
        if written {
            debug!("Completed {unit} from {from}, {} remaining", self.pending.len());
        } else {
            warn!("Result for {unit} from {from} does not fit the image");
        }
    }

    /// Offer the next pending unit to the next worker in the pool.
    fn assign(&mut self) -> Result<(), FarmError> {
        if let Some(worker) = self.pool.next_worker() {
            if let Some(unit) = self.pending.next_unit() {
                trace!("Assigning {unit} to {worker}");
                self.transport
                    .send_to(&Message::RenderRequest(unit).encode(), worker)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn scene(view: &str) -> Vec<String> {
        vec![view.to_string(), "sphere 0 1 0 1 shiny".to_string()]
    }

    #[test]
    fn view_comes_from_scene() {
        let network = LocalNetwork::new();
        let c = Coordinator::new(network.endpoint(), &scene("view 7 3"), Granularity::Pixel, &[])
            .expect("valid job");
        assert_eq!(c.protocol().view.width, 7);
        assert_eq!(c.protocol().view.height, 3);
        assert_eq!(c.pending.len(), 21);
    }

    #[test]
    fn bad_scene_is_fatal() {
        let network = LocalNetwork::new();
        let lines = vec!["light 1 2".to_string()];
        assert!(matches!(
            Coordinator::new(network.endpoint(), &lines, Granularity::Row, &[]),
            Err(FarmError::Scene(_))
        ));
        let lines = vec!["# a~b".to_string(), "sphere 0 1 0 1 shiny".to_string()];
        assert!(matches!(
            Coordinator::new(network.endpoint(), &lines, Granularity::Row, &[]),
            Err(FarmError::Net(NetError::Malformed(_)))
        ));
    }

    #[test]
    fn deadline_without_workers() {
        let network = LocalNetwork::new();
        let c = Coordinator::new(network.endpoint(), &scene("view 2 2"), Granularity::Row, &[])
            .expect("valid job")
            .with_tick(Duration::from_millis(5))
            .with_deadline(Some(Duration::from_millis(30)));
        assert!(matches!(c.run(), Err(FarmError::DeadlineExceeded { pending: 2 })));
    }

    #[test]
    fn round_robin_over_workers_and_units() {
        let network = LocalNetwork::new();
        let workers: Vec<LocalEndpoint> = (0..3).map(|_| network.endpoint()).collect();
        let addrs: Vec<SocketAddr> = workers.iter().map(|w| w.local_addr()).collect();
        let mut c = Coordinator::new(network.endpoint(), &scene("view 1 7"), Granularity::Row, &addrs)
            .expect("valid job");
        for addr in addrs.iter() {
            c.pool.add(*addr);
        }

        let steps = 7;
        for _ in 0..steps {
            c.assign().expect("send");
        }

        let protocol = *c.protocol();
        let mut counts: HashMap<SocketAddr, usize> = HashMap::new();
        let mut rows = vec![];
        for w in workers.iter() {
            while let Some(d) = w.recv_timeout(Duration::ZERO).expect("recv") {
                match protocol.decode_at_worker(&d.payload) {
                    Some(Message::RenderRequest(WorkUnit::Row(y))) => rows.push(y),
                    other => panic!("unexpected {other:?}"),
                }
                *counts.entry(w.local_addr()).or_default() += 1;
            }
        }

        for addr in addrs.iter() {
            assert!(counts[addr] >= steps / addrs.len());
        }
        rows.sort_unstable();
        assert_eq!(rows, (0..7).collect::<Vec<u32>>());
    }

    #[test]
    fn results_written_once() {
        let network = LocalNetwork::new();
        let worker = network.endpoint();
        let mut c = Coordinator::new(network.endpoint(), &scene("view 2 2"), Granularity::Row, &[])
            .expect("valid job");

        c.complete(
            RenderResult::Row {
                y: 1,
                pixels: vec![1, 2, 3, 4, 5, 6],
            },
            worker.local_addr(),
        );
        c.complete(
            RenderResult::Row {
                y: 1,
                pixels: vec![9; 6],
            },
            worker.local_addr(),
        );
        assert_eq!(c.pixels.row(1), Some(&[1, 2, 3, 4, 5, 6][..]));
        assert_eq!(c.pending.len(), 1);
    }

    #[test]
    fn confirmation_enqueues_once() {
        let network = LocalNetwork::new();
        let worker = network.endpoint();
        let mut c = Coordinator::new(network.endpoint(), &scene("view 2 2"), Granularity::Row, &[worker.local_addr()])
            .expect("valid job");

        let confirmation = Datagram {
            payload: vec![],
            from: worker.local_addr(),
        };
        c.handle(confirmation.clone()).expect("handled");
        c.handle(confirmation).expect("handled");
        assert_eq!(c.pool.len(), 1);
        assert!(c.unconfirmed.is_empty());
    }

    #[test]
    fn answers_missing_line_to_requester() {
        let network = LocalNetwork::new();
        let worker = network.endpoint();
        let mut c = Coordinator::new(network.endpoint(), &scene("view 2 2"), Granularity::Row, &[])
            .expect("valid job");

        c.handle(Datagram {
            payload: Message::MissingLine(1).encode(),
            from: worker.local_addr(),
        })
        .expect("handled");

        let d = worker.recv_timeout(Duration::from_millis(50)).expect("recv").expect("datagram");
        let line = SceneLine::decode(&d.payload).expect("scene line");
        assert_eq!(line.index, 2);
        assert_eq!(line.payload, "sphere 0 1 0 1 shiny");
    }
}
