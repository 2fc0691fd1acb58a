mod common;

use common::{Event, Recorder, closed_port, listener};

use tether::net::{ConnectOutcome, ConnectionState, TcpClient};
use tether::{ClientBuilder, ClientConfig, Error};

use std::io;
use std::time::{Duration, Instant};

#[test]
fn test_connect_nonblocking() {
    let (listener, addr) = listener();

    let mut client = ClientBuilder::new("127.0.0.1", addr.port())
        .connect_timeout(Duration::from_millis(500))
        .build(Recorder::default())
        .expect("Failed to build client");

    let outcome = client.open().expect("Failed to open");
    let (_peer, _) = listener.accept().expect("Failed to accept connection");

    assert_eq!(outcome, ConnectOutcome::Connected);
    assert!(client.is_connected());
    assert_eq!(client.state(), ConnectionState::Connected);
    assert_eq!(client.connection().remote_addr(), Some(addr));
    assert_eq!(
        client.handler().kinds(),
        vec![Event::BeforeConnect, Event::Connect]
    );
}

#[test]
fn test_connect_blocking() {
    let (listener, addr) = listener();

    let mut client = TcpClient::new(
        ClientConfig::new("127.0.0.1", addr.port()),
        Recorder::default(),
    )
    .expect("Failed to build client");

    assert_eq!(client.open().expect("Failed to open"), ConnectOutcome::Connected);
    let (_peer, _) = listener.accept().expect("Failed to accept connection");

    assert_eq!(
        client.handler().kinds(),
        vec![Event::BeforeConnect, Event::Connect]
    );
    assert_eq!(
        client.connection().peer_addr().expect("Failed to get peer address"),
        addr
    );
}

#[test]
fn test_connected_socket_is_nonblocking_after_blocking_connect() {
    let (listener, addr) = listener();

    let mut client = ClientBuilder::new("127.0.0.1", addr.port())
        .build(Recorder::default())
        .expect("Failed to build client");

    client.open().expect("Failed to open");
    let (_peer, _) = listener.accept().expect("Failed to accept connection");

    let mut buffer = [0u8; 16];
    let err = client.read(&mut buffer).expect_err("read should not block");
    assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
}

#[test]
fn test_refused_port_raises_connect_error() {
    let port = closed_port();

    for timeout in [Duration::from_millis(200), Duration::ZERO] {
        let mut client = ClientBuilder::new("127.0.0.1", port)
            .connect_timeout(timeout)
            .build(Recorder::default())
            .expect("Failed to build client");

        let result = client.open();

        match result {
            Err(Error::Connect { addr, source }) => {
                assert_eq!(addr.port(), port);
                assert_eq!(source.kind(), io::ErrorKind::ConnectionRefused);
            }
            other => panic!("expected a connect error, got {other:?}"),
        }

        assert!(!client.is_connected());
        assert_eq!(client.state(), ConnectionState::Idle);
        assert_eq!(client.handler().kinds(), vec![Event::BeforeConnect]);
    }
}

#[test]
fn test_unroutable_address_times_out() {
    let mut client = ClientBuilder::new("10.255.255.1", 81)
        .connect_timeout(Duration::from_millis(50))
        .build(Recorder::default())
        .expect("Failed to build client");

    let start = Instant::now();
    let result = client.open();
    let elapsed = start.elapsed();

    let outcome = match result {
        Ok(outcome) => outcome,
        // Hosts without any route reject the address immediately.
        Err(Error::Connect { source, .. })
            if matches!(
                source.kind(),
                io::ErrorKind::NetworkUnreachable
                    | io::ErrorKind::HostUnreachable
                    | io::ErrorKind::PermissionDenied
            ) =>
        {
            return;
        }
        Err(e) => panic!("unexpected error: {e}"),
    };

    assert_eq!(outcome, ConnectOutcome::TimedOut);
    assert!(
        elapsed >= Duration::from_millis(50),
        "Timeout should not fire early, took {elapsed:?}"
    );
    assert!(
        elapsed < Duration::from_millis(1000),
        "Timeout should fire close to its budget, took {elapsed:?}"
    );
    assert!(!client.is_connected());
    assert_eq!(client.state(), ConnectionState::Idle);
    assert_eq!(
        client.handler().kinds(),
        vec![Event::BeforeConnect, Event::ConnectTimeout]
    );
}

#[test]
fn test_unresolvable_host_raises_resolve_error() {
    let mut client = ClientBuilder::new("no-such-host.invalid", 80)
        .build(Recorder::default())
        .expect("Failed to build client");

    assert!(matches!(client.open(), Err(Error::Resolve { .. })));
    assert!(client.handler().events.is_empty());
}

#[test]
fn test_reopen_after_close() {
    let (listener, addr) = listener();

    let mut client = ClientBuilder::new("127.0.0.1", addr.port())
        .connect_timeout(Duration::from_millis(500))
        .build(Recorder::default())
        .expect("Failed to build client");

    client.open().expect("Failed to open");
    let (_first, _) = listener.accept().expect("Failed to accept connection");
    assert!(client.close());
    assert_eq!(client.state(), ConnectionState::Closed);

    client.open().expect("Failed to reopen");
    let (_second, _) = listener.accept().expect("Failed to accept connection");

    assert!(client.is_connected());
    assert_eq!(
        client.handler().kinds(),
        vec![
            Event::BeforeConnect,
            Event::Connect,
            Event::Disconnect,
            Event::BeforeConnect,
            Event::Connect,
        ]
    );
}

#[test]
fn test_open_while_connected_closes_first() {
    let (listener, addr) = listener();

    let mut client = ClientBuilder::new("127.0.0.1", addr.port())
        .build(Recorder::default())
        .expect("Failed to build client");

    client.open().expect("Failed to open");
    client.open().expect("Failed to reopen");

    let _peers = (listener.accept(), listener.accept());

    assert_eq!(client.handler().count(Event::Disconnect), 1);
    assert_eq!(client.handler().count(Event::Connect), 2);
    assert!(client.is_connected());
}

#[test]
fn test_invalid_config_is_rejected_before_open() {
    let result = ClientBuilder::new("127.0.0.1", 80)
        .read_min_length(0)
        .build(Recorder::default());

    assert!(matches!(result, Err(Error::InvalidConfig(_))));
}
