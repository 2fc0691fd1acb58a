//! Demo: fetch the first chunk of an HTTP response with a polled client
//!
//! Usage: cargo run --example http_probe --features subscriber -- [host] [port]

use tether::net::{ClientHandler, Connection};
use tether::{ClientBuilder, Driver, Stop, trace};

use std::env;
use std::time::Duration;

#[derive(Default)]
struct Probe {
    host: String,
    response: Vec<u8>,
    timed_out: bool,
}

impl ClientHandler for Probe {
    fn connect(&mut self, conn: &mut Connection) {
        let request = format!("GET / HTTP/1.1\r\nHost: {}\r\nConnection: close\r\n\r\n", self.host);
        let mut pending = request.as_bytes();

        // The socket is non-blocking; resubmit whatever was not accepted.
        while !pending.is_empty() {
            match conn.write(pending) {
                Ok(n) => pending = &pending[n..],
                Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                    std::thread::sleep(Duration::from_millis(1))
                }
                Err(e) => {
                    eprintln!("write failed: {e}");
                    conn.close();
                    return;
                }
            }
        }
    }

    fn connect_timeout(&mut self, _conn: &mut Connection) {
        self.timed_out = true;
    }

    fn data(&mut self, conn: &mut Connection) {
        let mut buffer = [0u8; 4096];
        if let Ok(n) = conn.read(&mut buffer) {
            self.response.extend_from_slice(&buffer[..n]);
        }
        conn.close();
    }

    fn read_timeout(&mut self, conn: &mut Connection) {
        eprintln!("no data within the read timeout");
        conn.close();
    }

    fn disconnect(&mut self, _conn: &mut Connection) {
        println!("disconnected");
    }
}

fn main() -> tether::Result<()> {
    trace::init_tracing();

    let mut args = env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "example.org".to_string());
    let port = args.next().and_then(|p| p.parse().ok()).unwrap_or(80);

    let probe = Probe {
        host: host.clone(),
        ..Probe::default()
    };

    let mut client = ClientBuilder::new(host, port)
        .connect_timeout(Duration::from_secs(2))
        .read_timeout(Duration::from_secs(5))
        .build(probe)?;

    client.open()?;

    if client.handler().timed_out {
        println!("connect timed out");
        return Ok(());
    }

    let stop = Driver::new()
        .deadline(Duration::from_secs(10))
        .run(&mut client, |client| !client.handler().response.is_empty())?;

    println!("stopped: {stop:?}");
    if stop != Stop::Deadline {
        println!("{}", String::from_utf8_lossy(&client.handler().response));
    }

    Ok(())
}
