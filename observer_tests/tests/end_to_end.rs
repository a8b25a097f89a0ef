//! Full socket-based integration tests: observer session against the
//! stub game server.

use observer_client::{
    colors::PlayerColorAllocator, scene, topology::Topology, window::TurnWindow,
};
use observer_shared::net::{self, TcpTransport};
use observer_tests::{bind_ephemeral, StubWorld};

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn observer_session_full_roundtrip() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();

    let world = StubWorld::two_point_line(20);
    let (addr, server) = bind_ephemeral(world.clone()).await?;

    let mut transport = TcpTransport::connect(addr).await?;
    net::login(&mut transport, "IntegrationObserver").await?;

    let topology = Topology::load(&mut transport).await?;
    assert_eq!(topology.name, "stub");
    assert_eq!(topology.points().count(), 2);
    assert_eq!(topology.lines().count(), 1);

    let mut window = TurnWindow::new(transport);
    let mut colors = PlayerColorAllocator::new();

    // Quarter-turn playback ramp. Every frame must bracket the clock
    // and put the train exactly where the recorded turns place it.
    let mut t = 0.0f64;
    while t <= 5.0 {
        window.advance_to(t).await?;
        assert_eq!(
            window.bracket_turns(),
            Some((t.floor() as u32, t.ceil() as u32)),
            "bracket at {t}"
        );

        let factor = (t - t.floor()) as f32;
        let current = window.current().unwrap();
        let frame = scene::compose(&topology, current, window.previous(), factor, &mut colors);

        assert_eq!(frame.trains.len(), 1);
        let x = frame.trains[0].position.x;
        let expected = world.expected_train_x(t);
        assert!((x - expected).abs() < 1e-4, "train x at {t}: {x} != {expected}");

        assert_eq!(frame.posts.len(), 1);
        assert_eq!(frame.standings[0].name, "Alice");

        t += 0.25;
    }

    // Forward playback rode the prefetched turns; only the bootstrap
    // fetch blocked.
    assert_eq!(window.stats().sync_fetches, 1);

    // Seek far outside the window: both slots refill synchronously.
    window.advance_to(12.5).await?;
    assert_eq!(window.bracket_turns(), Some((12, 13)));
    assert_eq!(window.stats().sync_fetches, 3);

    let transport = window.transport();
    net::logout(&mut *transport.lock().await).await?;
    server.abort();
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn out_of_range_seek_fails_cleanly() -> anyhow::Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("info")
        .with_test_writer()
        .try_init();

    let world = StubWorld::two_point_line(10);
    let (addr, server) = bind_ephemeral(world).await?;

    let mut transport = TcpTransport::connect(addr).await?;
    net::login(&mut transport, "IntegrationObserver").await?;
    let _topology = Topology::load(&mut transport).await?;

    let mut window = TurnWindow::new(transport);

    // Past the end of the recording: the server rejects the turn and the
    // error surfaces without corrupting the window.
    assert!(window.advance_to(999.0).await.is_err());
    assert!(window.current().is_none());

    // The same window still works for valid turns afterwards.
    window.advance_to(3.0).await?;
    assert_eq!(window.bracket_turns(), Some((3, 3)));

    server.abort();
    Ok(())
}
