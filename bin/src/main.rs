#[macro_use]
extern crate log;

use anyhow::{anyhow, Context as _};
use clap::Parser;
use rayfarm_api::parser::*;
use rayfarm_api::*;
use rayfarm_core::app::*;
use rayfarm_core::film::PixelBuffer;
use rayfarm_core::image_io::write_image;
use rayfarm_farm::*;
use rayfarm_integrators::WhittedIntegrator;
use rayfarm_net::*;
use std::time::Duration;

fn main() -> anyhow::Result<()> {
    // Initialize `env_logger`.
    env_logger::init();

    let options = Options::parse();
    let result = match options.command {
        Command::Coordinator(opts) => coordinator(&opts),
        Command::Worker(opts) => worker(&opts),
        Command::Local(opts) => local(&opts),
        Command::Render(opts) => render(&opts),
    };

    if let Err(e) = &result {
        error!("{e:#}");
    }
    result
}

/// Returns the scene lines after checking that they parse.
fn load_scene(source: &SceneSource) -> anyhow::Result<Vec<String>> {
    let lines = match source.scene_file.as_deref() {
        Some(path) if !source.demo => {
            read_scene_lines(path).with_context(|| format!("failed to read scene '{path}'"))?
        }
        _ => demo_scene_lines(),
    };

    // Fail early on a bad scene rather than after distributing it.
    parse_scene(lines.iter().map(String::as_str)).context("invalid scene")?;
    Ok(lines)
}

fn save(path: &str, pixels: &PixelBuffer) -> anyhow::Result<()> {
    write_image(path, pixels).map_err(|e| anyhow!(e))?;
    info!("Wrote {path}");
    Ok(())
}

fn coordinator(opts: &CoordinatorOptions) -> anyhow::Result<()> {
    let lines = load_scene(&opts.scene)?;
    let transport = UdpTransport::bind(opts.bind).with_context(|| format!("failed to bind {}", opts.bind))?;

    let pixels = Coordinator::new(transport, &lines, opts.mode, &opts.workers)?
        .with_tick(opts.timer.tick())
        .with_deadline(opts.deadline.map(Duration::from_secs))
        .run()?;
    save(&opts.image_file, &pixels)
}

fn worker(opts: &WorkerOptions) -> anyhow::Result<()> {
    let transport = UdpTransport::bind(opts.bind).with_context(|| format!("failed to bind {}", opts.bind))?;
    Worker::new(transport).with_tick(opts.timer.tick()).run()?;
    Ok(())
}

fn local(opts: &LocalOptions) -> anyhow::Result<()> {
    let lines = load_scene(&opts.scene)?;
    let network = LocalNetwork::with_loss(opts.loss_rate(), opts.seed);

    let farm = LocalFarm {
        workers: opts.workers(),
        granularity: opts.mode,
        tick: opts.timer.tick(),
        deadline: opts.deadline.map(Duration::from_secs),
    };
    let pixels = farm.run(&network, &lines)?;
    save(&opts.image_file, &pixels)
}

fn render(opts: &RenderOptions) -> anyhow::Result<()> {
    let lines = load_scene(&opts.scene)?;
    let scene = parse_scene(lines.iter().map(String::as_str))?;
    let pixels = WhittedIntegrator::default().render(&scene, opts.threads());
    save(&opts.image_file, &pixels)
}
