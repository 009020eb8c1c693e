use rayfarm_api::parser::parse_scene;
use rayfarm_api::*;
use rayfarm_core::app::Granularity;
use rayfarm_core::film::PixelBuffer;
use rayfarm_farm::*;
use rayfarm_integrators::WhittedIntegrator;
use rayfarm_net::*;
use std::collections::HashSet;
use std::time::Duration;

const TICK: Duration = Duration::from_millis(5);
const DEADLINE: Duration = Duration::from_secs(60);

/// Demo scene text at a small resolution.
fn demo(width: u32, height: u32) -> Vec<String> {
    demo_scene_lines()
        .into_iter()
        .map(|line| {
            if line.starts_with("view ") {
                format!("view {width} {height}")
            } else {
                line
            }
        })
        .collect()
}

/// Renders the scene without any network.
fn reference(lines: &[String]) -> PixelBuffer {
    let scene = parse_scene(lines.iter().map(String::as_str)).expect("valid scene");
    WhittedIntegrator::default().render(&scene, 2)
}

fn farm(workers: usize, granularity: Granularity) -> LocalFarm {
    LocalFarm {
        workers,
        granularity,
        tick: TICK,
        deadline: Some(DEADLINE),
    }
}

#[test]
fn row_mode_lossless() {
    let lines = demo(16, 10);
    let image = farm(3, Granularity::Row)
        .run(&LocalNetwork::new(), &lines)
        .expect("job finished");
    assert_eq!(image, reference(&lines));
}

#[test]
fn row_mode_lossy() {
    let lines = demo(12, 9);
    let image = farm(4, Granularity::Row)
        .run(&LocalNetwork::with_loss(0.25, 3), &lines)
        .expect("job finished");
    assert_eq!(image, reference(&lines));
}

#[test]
fn pixel_mode_lossy() {
    let lines = demo(6, 5);
    let image = farm(3, Granularity::Pixel)
        .run(&LocalNetwork::with_loss(0.2, 17), &lines)
        .expect("job finished");
    assert_eq!(image, reference(&lines));
}

#[test]
fn more_workers_than_rows() {
    let lines = demo(5, 2);
    let image = farm(6, Granularity::Row)
        .run(&LocalNetwork::new(), &lines)
        .expect("job finished");
    assert_eq!(image, reference(&lines));
}

#[test]
fn first_transmission_and_confirmation_lost() {
    // Drop the first copy of every scene line and the first confirmation
    // from each sender.
    let mut seen_lines: HashSet<(Vec<u8>, std::net::SocketAddr)> = HashSet::new();
    let mut confirmed: HashSet<std::net::SocketAddr> = HashSet::new();
    let network = LocalNetwork::with_filter(move |payload, from, to| {
        if payload.is_empty() {
            return confirmed.insert(from);
        }
        if SceneLine::decode(payload).is_ok() && payload.len() > 8 {
            return seen_lines.insert((payload.to_vec(), to));
        }
        false
    });

    let lines = demo(7, 4);
    let image = farm(2, Granularity::Row).run(&network, &lines).expect("job finished");
    assert_eq!(image, reference(&lines));
}

#[test]
fn deadline_when_every_datagram_is_lost() {
    let lines = demo(4, 4);
    let result = LocalFarm {
        workers: 2,
        granularity: Granularity::Row,
        tick: TICK,
        deadline: Some(Duration::from_millis(100)),
    }
    .run(&LocalNetwork::with_filter(|_, _, _| true), &lines);
    assert!(matches!(result, Err(FarmError::DeadlineExceeded { pending: 4 })));
}
