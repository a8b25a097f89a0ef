//! Scripted observer session against the stub server.
//!
//! Drives a full login / topology / playback / logout cycle in-process
//! and prints per-turn train positions, for eyeballing playback without
//! a real game server. Exits nonzero when any frame lands off-script.

use anyhow::Context;
use observer_client::{
    colors::PlayerColorAllocator, playback::PlaybackClock, scene, topology::Topology,
    window::TurnWindow,
};
use observer_shared::net::{self, TcpTransport};
use observer_tests::{bind_ephemeral, StubWorld};

const MAX_TURN: u32 = 10;
const FRAME_DT: f32 = 0.1;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let world = StubWorld::two_point_line(MAX_TURN);
    let (addr, server) = bind_ephemeral(world.clone()).await?;
    println!("Stub server on {addr}");

    let mut transport = TcpTransport::connect(addr).await.context("connect")?;
    net::login(&mut transport, "SessionRunner")
        .await
        .context("login")?;
    let topology = Topology::load(&mut transport)
        .await
        .context("load topology")?;
    println!(
        "Map '{}': {} points, {} lines",
        topology.name,
        topology.points().count(),
        topology.lines().count()
    );

    let mut window = TurnWindow::new(transport);
    let mut clock = PlaybackClock::new(MAX_TURN, 0.5);
    let mut colors = PlayerColorAllocator::new();

    let mut last_turn = u32::MAX;
    let mut bad_frames = 0u32;

    while !clock.is_paused() {
        clock.tick(FRAME_DT);
        window
            .advance_to(clock.turn())
            .await
            .context("advance window")?;

        let current = window.current().context("window has no current turn")?;
        let factor = (clock.turn() - clock.turn().floor()) as f32;
        let frame = scene::compose(&topology, current, window.previous(), factor, &mut colors);

        let expected = world.expected_train_x(clock.turn());
        let got = frame.trains[0].position.x;
        if (got - expected).abs() > 1e-3 {
            println!(
                "MISMATCH at turn {:.2}: train x {got} != {expected}",
                clock.turn()
            );
            bad_frames += 1;
        }

        if frame.turn != last_turn {
            println!(
                "turn {:>3}  train x {:>5.2}  rating {}",
                frame.turn, got, frame.standings[0].rating
            );
            last_turn = frame.turn;
        }
    }

    let stats = window.stats();
    println!(
        "Playback done: {} sync fetches, {} prefetches, {} prefetch failures",
        stats.sync_fetches, stats.prefetch_launches, stats.prefetch_failures
    );

    let transport = window.transport();
    net::logout(&mut *transport.lock().await)
        .await
        .context("logout")?;
    server.abort();

    if bad_frames > 0 {
        println!("{bad_frames} frames off-script");
        std::process::exit(1);
    }
    println!("All frames on script");
    Ok(())
}
