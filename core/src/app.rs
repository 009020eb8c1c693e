//! Application related stuff

use clap::{Args, Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use std::thread;
use std::time::Duration;

/// Default period of the retransmission and announcement timers.
pub const DEFAULT_TICK_MS: u64 = 500;

/// System wide options.
#[derive(Parser, Clone, Debug)]
#[clap(author, version, about, long_about = None)]
pub struct Options {
    /// What to run.
    #[clap(subcommand)]
    pub command: Command,
}

/// Process roles.
#[derive(Subcommand, Clone, Debug)]
pub enum Command {
    /// Distribute a scene to remote workers and collect the rendered image.
    Coordinator(CoordinatorOptions),

    /// Serve render requests from a coordinator.
    Worker(WorkerOptions),

    /// Run a coordinator and several workers in this process over a
    /// simulated lossy network.
    Local(LocalOptions),

    /// Render a scene directly without any network.
    Render(RenderOptions),
}

/// Size of the work handed out per request.
#[derive(ValueEnum, Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Granularity {
    /// One image row per request.
    Row,

    /// One pixel per request.
    Pixel,
}

/// Where the scene comes from.
#[derive(Args, Clone, Debug)]
pub struct SceneSource {
    /// Path to the scene file.
    #[clap(
        long = "scene",
        short = 's',
        value_name = "FILE",
        required_unless_present = "demo",
        help = "Scene description file."
    )]
    pub scene_file: Option<String>,

    /// Use the built-in demo scene.
    #[clap(long, conflicts_with = "scene_file", help = "Render the built-in demo scene.")]
    pub demo: bool,
}

/// Timer settings shared by every role.
#[derive(Args, Clone, Debug)]
pub struct TimerOptions {
    /// Retransmission timer period.
    #[clap(
        long = "tick-ms",
        value_name = "MS",
        default_value_t = DEFAULT_TICK_MS,
        help = "Period in milliseconds of the retransmission timer."
    )]
    pub tick_ms: u64,
}

impl TimerOptions {
    /// Returns the timer period.
    pub fn tick(&self) -> Duration {
        if self.tick_ms == 0 {
            warn!("Invalid tick-ms 0, using {DEFAULT_TICK_MS}");
            Duration::from_millis(DEFAULT_TICK_MS)
        } else {
            Duration::from_millis(self.tick_ms)
        }
    }
}

/// Options for the `coordinator` role.
#[derive(Args, Clone, Debug)]
pub struct CoordinatorOptions {
    /// Local address to bind.
    #[clap(long, value_name = "ADDR", default_value = "0.0.0.0:3333", help = "Local UDP address.")]
    pub bind: SocketAddr,

    /// Worker addresses.
    #[clap(
        long = "worker",
        short = 'w',
        value_name = "ADDR",
        required = true,
        help = "Worker UDP address. May be repeated."
    )]
    pub workers: Vec<SocketAddr>,

    #[clap(flatten)]
    pub scene: SceneSource,

    /// Work granularity.
    #[clap(long, value_enum, default_value_t = Granularity::Row, help = "Unit of work per request.")]
    pub mode: Granularity,

    /// Path to the image file.
    #[clap(
        long = "outfile",
        short = 'o',
        value_name = "FILE",
        default_value = "out.ppm",
        help = "Write the final image to the given filename."
    )]
    pub image_file: String,

    /// Give up after this many seconds.
    #[clap(long, value_name = "SECS", help = "Abort the job if it does not finish in time.")]
    pub deadline: Option<u64>,

    #[clap(flatten)]
    pub timer: TimerOptions,
}

/// Options for the `worker` role.
#[derive(Args, Clone, Debug)]
pub struct WorkerOptions {
    /// Local address to bind.
    #[clap(long, value_name = "ADDR", default_value = "0.0.0.0:3334", help = "Local UDP address.")]
    pub bind: SocketAddr,

    #[clap(flatten)]
    pub timer: TimerOptions,
}

/// Options for the `local` role.
#[derive(Args, Clone, Debug)]
pub struct LocalOptions {
    #[clap(flatten)]
    pub scene: SceneSource,

    /// Number of workers.
    #[clap(
        long = "workers",
        short = 'n',
        value_name = "NUM",
        default_value_t = 4,
        help = "Number of in-process workers."
    )]
    n_workers: usize,

    /// Work granularity.
    #[clap(long, value_enum, default_value_t = Granularity::Row, help = "Unit of work per request.")]
    pub mode: Granularity,

    /// Probability of dropping a datagram.
    #[clap(long, value_name = "RATE", default_value_t = 0.0, help = "Fraction of datagrams to drop.")]
    pub loss: f64,

    /// Seed for the loss simulation.
    #[clap(long, value_name = "NUM", default_value_t = 0, help = "Seed for simulated packet loss.")]
    pub seed: u64,

    /// Path to the image file.
    #[clap(
        long = "outfile",
        short = 'o',
        value_name = "FILE",
        default_value = "out.ppm",
        help = "Write the final image to the given filename."
    )]
    pub image_file: String,

    /// Give up after this many seconds.
    #[clap(long, value_name = "SECS", help = "Abort the job if it does not finish in time.")]
    pub deadline: Option<u64>,

    #[clap(flatten)]
    pub timer: TimerOptions,
}

impl LocalOptions {
    /// Returns the number of workers to start.
    pub fn workers(&self) -> usize {
        match self.n_workers {
            0 => {
                warn!("Invalid number of workers 0, using 1");
                1
            }
            n => n,
        }
    }

    /// Returns the loss rate clamped to [0, 1).
    pub fn loss_rate(&self) -> f64 {
        if !(0.0..1.0).contains(&self.loss) {
            warn!("Loss rate {} outside [0, 1), using 0", self.loss);
            0.0
        } else {
            self.loss
        }
    }
}

/// Options for the `render` role.
#[derive(Args, Clone, Debug)]
pub struct RenderOptions {
    #[clap(flatten)]
    pub scene: SceneSource,

    /// Path to the image file.
    #[clap(
        long = "outfile",
        short = 'o',
        value_name = "FILE",
        default_value = "out.ppm",
        help = "Write the final image to the given filename."
    )]
    pub image_file: String,

    /// Number of threads to use for rendering.
    #[clap(
        long = "nthreads",
        short = 't',
        value_name = "NUM",
        default_value_t = 1,
        help = "Use specified number of threads for rendering."
    )]
    n_threads: usize,
}

impl RenderOptions {
    /// Returns the number of threads to use.
    pub fn threads(&self) -> usize {
        let max_threads = thread::available_parallelism().map_or(1, |n| n.get());
        match self.n_threads {
            0 => {
                warn!("Invalid nthreads");
                1
            }
            n if n > max_threads => {
                warn!("Num threads > max logical CPUs {max_threads}");
                max_threads
            }
            n => n,
        }
    }
}
