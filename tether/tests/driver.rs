mod common;

use common::{Event, Recorder, listener};

use tether::{ClientBuilder, Driver, Stop};

use std::io::Write;
use std::thread;
use std::time::{Duration, Instant};

#[test]
fn test_driver_stops_on_condition() {
    let (listener, addr) = listener();

    let mut client = ClientBuilder::new("127.0.0.1", addr.port())
        .build(Recorder::consuming())
        .expect("Failed to build client");

    client.open().expect("Failed to open");
    let (mut peer, _) = listener.accept().expect("Failed to accept connection");

    let writer = thread::spawn(move || {
        thread::sleep(Duration::from_millis(20));
        peer.write_all(b"go").expect("Failed to write to stream");
        peer
    });

    let stop = Driver::new()
        .deadline(Duration::from_secs(2))
        .run(&mut client, |client| client.handler().received == b"go")
        .expect("driver failed");

    assert_eq!(stop, Stop::Condition);
    let _peer = writer.join().expect("Thread panicked");
}

#[test]
fn test_driver_stops_on_disconnect() {
    let (listener, addr) = listener();

    let mut client = ClientBuilder::new("127.0.0.1", addr.port())
        .build(Recorder::default())
        .expect("Failed to build client");

    client.open().expect("Failed to open");
    let (peer, _) = listener.accept().expect("Failed to accept connection");
    drop(peer);

    let stop = Driver::new()
        .interval(Duration::from_millis(2))
        .deadline(Duration::from_secs(2))
        .run(&mut client, |_| false)
        .expect("driver failed");

    assert_eq!(stop, Stop::Disconnected);
    assert_eq!(client.handler().count(Event::Disconnect), 1);
}

#[test]
fn test_driver_stops_on_deadline() {
    let (listener, addr) = listener();

    let mut client = ClientBuilder::new("127.0.0.1", addr.port())
        .read_timeout(Duration::from_millis(20))
        .build(Recorder::default())
        .expect("Failed to build client");

    client.open().expect("Failed to open");
    let (_peer, _) = listener.accept().expect("Failed to accept connection");

    let start = Instant::now();
    let stop = Driver::new()
        .deadline(Duration::from_millis(100))
        .run(&mut client, |_| false)
        .expect("driver failed");

    assert_eq!(stop, Stop::Deadline);
    assert!(start.elapsed() >= Duration::from_millis(100));
    assert!(client.handler().count(Event::ReadTimeout) >= 2);
}

#[test]
fn test_driver_returns_immediately_when_not_connected() {
    let mut client = ClientBuilder::new("127.0.0.1", 9)
        .build(Recorder::default())
        .expect("Failed to build client");

    let stop = Driver::default()
        .run(&mut client, |_| false)
        .expect("driver failed");

    assert_eq!(stop, Stop::Disconnected);
}
