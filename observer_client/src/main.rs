//! Standalone observer binary.
//!
//! Usage:
//!   cargo run -p observer_client -- [--addr 127.0.0.1:2000] [--name Observer]
//!                                   [--max-turn 100] [--secs-per-turn 1.0]
//!
//! Connects to the game server, loads the map, and plays the recorded
//! session back as a smooth timeline, logging one summary per turn.
//! Rendering consumes the composed scene frames; this binary stops at
//! the scene.
//!
//! Console commands:
//!   play / pause        - Resume or halt playback
//!   seek <turn>         - Jump to a turn (fractional allowed)
//!   step / back         - Single-turn step forward or backward
//!   speed <secs>        - Seconds of wall time per simulation turn
//!   status              - Show playback and fetch statistics
//!   quit                - Log out and exit

use std::env;
use std::io::{BufRead, Write};
use std::time::{Duration, Instant};

use anyhow::Context;
use observer_client::{
    colors::PlayerColorAllocator, playback::PlaybackClock, scene, topology::Topology,
    window::TurnWindow,
};
use observer_shared::{
    config::ObserverConfig,
    net::{self, TcpTransport},
};
use tokio::sync::mpsc;
use tracing::{info, warn};

fn parse_args() -> ObserverConfig {
    let mut cfg = ObserverConfig::default();
    let args: Vec<String> = env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--addr" if i + 1 < args.len() => {
                cfg.server_addr = args[i + 1].clone();
                i += 2;
            }
            "--name" if i + 1 < args.len() => {
                cfg.name = args[i + 1].clone();
                i += 2;
            }
            "--max-turn" if i + 1 < args.len() => {
                if let Ok(v) = args[i + 1].parse() {
                    cfg.max_turn = v;
                }
                i += 2;
            }
            "--secs-per-turn" if i + 1 < args.len() => {
                if let Ok(v) = args[i + 1].parse() {
                    cfg.secs_per_turn = v;
                }
                i += 2;
            }
            _ => i += 1,
        }
    }
    cfg
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cfg = parse_args();
    info!(server = %cfg.server_addr, name = %cfg.name, "Starting observer");

    let mut transport = TcpTransport::connect(&cfg.server_addr)
        .await
        .context("connect")?;
    net::login(&mut transport, &cfg.name).await.context("login")?;

    let topology = Topology::load(&mut transport)
        .await
        .context("load topology")?;
    info!(
        map = %topology.name,
        points = topology.points().count(),
        lines = topology.lines().count(),
        "Session ready"
    );

    let mut window = TurnWindow::new(transport);
    let mut clock = PlaybackClock::new(cfg.max_turn, cfg.secs_per_turn);
    let mut colors = PlayerColorAllocator::new();

    // Stdin console on its own thread, same shape as any interactive
    // client loop.
    let (console_tx, mut console_rx) = mpsc::channel::<String>(32);
    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            if stdin.lock().read_line(&mut line).is_err() {
                break;
            }
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    println!("Observer connected. Type 'status' for info, 'quit' to exit.");
    println!();

    let frame_interval = Duration::from_secs_f32(1.0 / cfg.frame_hz as f32);
    let mut last_frame = Instant::now();
    let mut last_logged_turn = u32::MAX;
    let mut running = true;

    while running {
        while let Ok(line) = console_rx.try_recv() {
            let tokens: Vec<&str> = line.split_whitespace().collect();
            match tokens.as_slice() {
                ["play"] => clock.play(),
                ["pause"] => clock.pause(),
                ["step"] => clock.step_forward(),
                ["back"] => clock.step_back(),
                ["seek", turn] => match turn.parse::<f64>() {
                    Ok(t) => clock.seek(t),
                    Err(_) => println!("Usage: seek <turn>"),
                },
                ["speed", secs] => match secs.parse::<f32>() {
                    Ok(s) => clock.set_secs_per_turn(s),
                    Err(_) => println!("Usage: speed <secs-per-turn>"),
                },
                ["status"] => {
                    let stats = window.stats();
                    println!(
                        "Turn: {:.2} / {} ({})",
                        clock.turn(),
                        clock.max_turn(),
                        if clock.is_paused() { "paused" } else { "playing" }
                    );
                    println!(
                        "Fetches: {} sync, {} prefetched, {} failed",
                        stats.sync_fetches, stats.prefetch_launches, stats.prefetch_failures
                    );
                    if let Some(err) = window.last_error() {
                        println!("Pending retry: {err}");
                    }
                }
                ["quit"] | ["exit"] => running = false,
                _ => println!("Unknown command: {line}"),
            }
        }

        let now = Instant::now();
        let dt = (now - last_frame).as_secs_f32();
        last_frame = now;
        clock.tick(dt);

        if let Err(e) = window.advance_to(clock.turn()).await {
            // A blocking fetch failed; hold playback at the last turn the
            // window actually has instead of racing further ahead.
            warn!(error = %e, "advance failed; pausing at last good turn");
            if let Some((prev, _)) = window.bracket_turns() {
                clock.seek(f64::from(prev));
            }
            clock.pause();
        }

        if let Some(current) = window.current() {
            let factor = (clock.turn() - clock.turn().floor()) as f32;
            let frame = scene::compose(&topology, current, window.previous(), factor, &mut colors);
            if frame.turn != last_logged_turn {
                info!(
                    turn = frame.turn,
                    trains = frame.trains.len(),
                    posts = frame.posts.len(),
                    players = frame.standings.len(),
                    "frame"
                );
                last_logged_turn = frame.turn;
            }
        }

        tokio::time::sleep(frame_interval).await;
    }

    let transport = window.transport();
    if let Err(e) = net::logout(&mut *transport.lock().await).await {
        warn!(error = %e, "logout failed");
    }
    info!("Observer stopped");
    Ok(())
}
