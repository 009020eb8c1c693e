//! In-process farm

use crate::*;
use rayfarm_core::app::Granularity;
use rayfarm_core::film::PixelBuffer;
use rayfarm_net::*;
use std::net::SocketAddr;
use std::thread;
use std::time::Duration;

/// Settings for a farm run entirely inside this process.
#[derive(Copy, Clone, Debug)]
pub struct LocalFarm {
    /// Number of worker threads.
    pub workers: usize,

    /// Work granularity.
    pub granularity: Granularity,

    /// Retransmission timer period for every participant.
    pub tick: Duration,

    /// Time limit for the job.
    pub deadline: Option<Duration>,
}

impl LocalFarm {
    /// Run a coordinator on the calling thread and the workers on their own
    /// threads, all attached to `network`. The network is shut down when
    /// the coordinator finishes, which stops the workers.
    ///
    /// * `network` - The simulated network.
    /// * `lines`   - Scene text.
    pub fn run(&self, network: &LocalNetwork, lines: &[String]) -> Result<PixelBuffer, FarmError> {
        let endpoints: Vec<LocalEndpoint> = (0..self.workers).map(|_| network.endpoint()).collect();
        let addrs: Vec<SocketAddr> = endpoints.iter().map(|e| e.local_addr()).collect();
        let coordinator = Coordinator::new(network.endpoint(), lines, self.granularity, &addrs);

        let tick = self.tick;
        thread::scope(|scope| {
            let handles: Vec<_> = endpoints
                .into_iter()
                .map(|endpoint| scope.spawn(move || Worker::new(endpoint).with_tick(tick).run()))
                .collect();

            let result = coordinator.and_then(|c| c.with_tick(tick).with_deadline(self.deadline).run());
            network.shutdown();

            for handle in handles {
                match handle.join() {
                    Ok(Ok(())) => (),
                    Ok(Err(e)) => warn!("Worker failed: {e}"),
                    Err(_) => error!("Worker thread panicked"),
                }
            }
            result
        })
    }
}
