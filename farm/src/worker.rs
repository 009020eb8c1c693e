//! Worker

use crate::FarmError;
use rayfarm_api::parser::parse_scene;
use rayfarm_core::app::{Granularity, DEFAULT_TICK_MS};
use rayfarm_core::scene::*;
use rayfarm_integrators::WhittedIntegrator;
use rayfarm_net::*;
use std::net::SocketAddr;
use std::time::Duration;

/// Receives a scene from a coordinator and serves its render requests.
pub struct Worker<T: Transport> {
    /// Network transport.
    transport: T,

    /// Retransmission timer period.
    tick: Duration,

    /// Ray tracer.
    integrator: WhittedIntegrator,
}

/// Everything a worker knows about its job once the scene has arrived.
struct Job {
    coordinator: SocketAddr,
    scene: Scene,
    protocol: Protocol,
}

impl<T: Transport> Worker<T> {
    /// Create a worker.
    ///
    /// * `transport` - Network transport.
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            integrator: WhittedIntegrator::default(),
        }
    }

    /// Set the retransmission timer period.
    ///
    /// * `tick` - Timer period.
    pub fn with_tick(mut self, tick: Duration) -> Self {
        self.tick = tick;
        self
    }

    /// Serve one coordinator until the transport shuts down.
    pub fn run(self) -> Result<(), FarmError> {
        match self.receive_job().and_then(|job| self.serve(&job)) {
            Err(FarmError::Net(NetError::Disconnected)) => {
                info!("Transport closed, worker {} stopping", self.transport.local_addr());
                Ok(())
            }
            other => other,
        }
    }

    /// Receive the scene and build the job. Pixel mode is recognized by
    /// fragments that carry the image resolution.
    fn receive_job(&self) -> Result<Job, FarmError> {
        info!("Worker {} waiting for a scene", self.transport.local_addr());
        let received = SceneReceiver::new().receive(&self.transport, self.tick)?;
        let scene = parse_scene(received.lines.iter().map(String::as_str))?;

        let (granularity, view) = match received.view {
            Some(view) => (Granularity::Pixel, view),
            None => (Granularity::Row, scene.view),
        };
        let protocol = Protocol::new(granularity, view)?;
        info!(
            "Received {} line scene from {}, {:?} mode at {}x{}",
            received.lines.len(),
            received.sender,
            granularity,
            view.width,
            view.height
        );

        Ok(Job {
            coordinator: received.sender,
            scene: scene.with_view(view),
            protocol,
        })
    }

    /// Confirm the scene, then answer render requests. The confirmation is
    /// repeated on every idle tick until the first request arrives.
    ///
    /// * `job` - The job.
    fn serve(&self, job: &Job) -> Result<(), FarmError> {
        let coordinator = job.coordinator;
        self.confirm(coordinator)?;

        let mut requested = false;
        let mut ticker = Ticker::new(self.tick);
        loop {
            let Datagram { payload, from } = match ticker.wait(&self.transport)? {
                Event::Datagram(datagram) => datagram,
                Event::Tick => {
                    if !requested {
                        self.confirm(coordinator)?;
                    }
                    continue;
                }
            };

            if from != coordinator {
                debug!("Ignoring datagram from {from}, bound to {coordinator}");
                continue;
            }

            match job.protocol.decode_at_worker(&payload) {
                Some(Message::RenderRequest(unit)) if unit.is_inside(&job.protocol.view) => {
                    requested = true;
                    trace!("Rendering {unit}");
                    let result = render_unit(&self.integrator, &job.scene, unit);
                    self.transport
                        .send_to(&Message::RenderResult(result).encode(), coordinator)?;
                }
                Some(Message::RenderRequest(unit)) => debug!("Ignoring request for {unit} outside the image"),
                Some(Message::SceneLine(_)) => self.confirm(coordinator)?,
                Some(message) => debug!("Unexpected {message:?} from {from}"),
                None => debug!("Ignoring {} byte datagram from {from}", payload.len()),
            }
        }
    }

    /// Tell the coordinator the scene is complete.
    ///
    /// * `coordinator` - Coordinator address.
    fn confirm(&self, coordinator: SocketAddr) -> Result<(), FarmError> {
        trace!("Confirming scene to {coordinator}");
        self.transport.send_to(&Message::Confirmation.encode(), coordinator)?;
        Ok(())
    }
}

/// Render one work unit.
///
/// * `integrator` - Ray tracer.
/// * `scene`      - The scene.
/// * `unit`       - Row or pixel to render.
pub fn render_unit(integrator: &WhittedIntegrator, scene: &Scene, unit: WorkUnit) -> RenderResult {
    match unit {
        WorkUnit::Row(y) => RenderResult::Row {
            y,
            pixels: integrator.render_row(scene, y),
        },
        WorkUnit::Pixel { x, y } => RenderResult::Pixel {
            x,
            y,
            rgb: integrator.render_pixel(scene, x, y),
        },
    }
}
