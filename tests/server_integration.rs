//! End-to-end TCP round trips against a live server on an ephemeral port.

use std::io::{ErrorKind, Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use graphserve::{build_engine, EngineKind, Server, ServerConfig};

const TRIANGLE: &str = "3 3 0-1 1-2 2-0\n";

struct TestServer {
    addr: SocketAddr,
    shutdown: Arc<AtomicBool>,
    runner: thread::JoinHandle<()>,
}

fn start_server(engine: EngineKind, workers: usize) -> TestServer {
    let config =
        ServerConfig { listen: "127.0.0.1:0".to_string(), workers, engine };
    let shutdown = Arc::new(AtomicBool::new(false));
    let built = build_engine(engine, workers).unwrap();
    let server = Server::bind(&config, built, Arc::clone(&shutdown)).unwrap();
    let addr = server.local_addr().unwrap();
    let runner = thread::spawn(move || server.run().unwrap());
    TestServer { addr, shutdown, runner }
}

impl TestServer {
    fn stop(self) {
        self.shutdown.store(true, Ordering::SeqCst);
        self.runner.join().unwrap();
    }
}

fn connect(addr: SocketAddr) -> TcpStream {
    let stream = TcpStream::connect(addr).unwrap();
    stream.set_read_timeout(Some(Duration::from_millis(100))).unwrap();
    stream
}

/// Read until the server's `> ` prompt arrives.
fn read_until_prompt(stream: &mut TcpStream) -> String {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut collected = String::new();
    let mut buf = [0u8; 1024];

    while Instant::now() < deadline {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                collected.push_str(&String::from_utf8_lossy(&buf[..n]));
                if collected.ends_with("> ") {
                    return collected;
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {}
            Err(e) => panic!("read failed: {}", e),
        }
    }
    panic!("no prompt before deadline; collected so far: {:?}", collected);
}

/// Read until the peer closes the connection.
fn read_until_close(stream: &mut TcpStream) -> String {
    let deadline = Instant::now() + Duration::from_secs(10);
    let mut collected = String::new();
    let mut buf = [0u8; 1024];

    while Instant::now() < deadline {
        match stream.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => collected.push_str(&String::from_utf8_lossy(&buf[..n])),
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {}
            Err(_) => break,
        }
    }
    collected
}

fn round_trip(engine: EngineKind) {
    let server = start_server(engine, 4);
    let mut client = connect(server.addr);

    let banner = read_until_prompt(&mut client);
    assert!(banner.contains("graphserve"));
    assert!(banner.contains("Commands: help, stats, quit"));

    client.write_all(TRIANGLE.as_bytes()).unwrap();
    let response = read_until_prompt(&mut client);
    assert!(response.contains("1. EULER CIRCUIT: YES"), "{}", response);
    assert!(response.contains("2. MAX CLIQUE: Size: 3"), "{}", response);
    assert!(response.contains("3. MST WEIGHT: Weight: 2"), "{}", response);
    assert!(response.contains("4. HAMILTON CIRCUIT: YES"), "{}", response);
    assert!(response.contains("Total execution time:"), "{}", response);

    client.write_all(b"stats\n").unwrap();
    let stats = read_until_prompt(&mut client);
    assert!(stats.contains("=== SERVER STATISTICS ==="), "{}", stats);
    assert!(stats.contains("Connections: 1"), "{}", stats);
    assert!(stats.contains("Submitted: 1"), "{}", stats);

    client.write_all(b"quit\n").unwrap();
    let farewell = read_until_close(&mut client);
    assert!(farewell.contains("Goodbye!"), "{}", farewell);

    server.stop();
}

#[test]
fn leader_follower_server_round_trip() {
    round_trip(EngineKind::LeaderFollower);
}

#[test]
fn pipeline_server_round_trip() {
    round_trip(EngineKind::Pipeline);
}

#[test]
fn malformed_lines_get_error_blocks() {
    let server = start_server(EngineKind::Pipeline, 4);
    let mut client = connect(server.addr);
    read_until_prompt(&mut client);

    client.write_all(b"definitely not a graph\n").unwrap();
    let response = read_until_prompt(&mut client);
    assert!(response.contains("REQUEST ERROR"), "{}", response);
    assert!(response.contains("invalid format"), "{}", response);

    // The connection survives and keeps serving.
    client.write_all(TRIANGLE.as_bytes()).unwrap();
    let response = read_until_prompt(&mut client);
    assert!(response.contains("HAMILTON CIRCUIT: YES"), "{}", response);

    server.stop();
}

#[test]
fn empty_lines_reprompt() {
    let server = start_server(EngineKind::LeaderFollower, 2);
    let mut client = connect(server.addr);
    read_until_prompt(&mut client);

    client.write_all(b"\n").unwrap();
    let response = read_until_prompt(&mut client);
    assert!(response.contains("Enter graph data"), "{}", response);

    server.stop();
}

#[test]
fn help_reprints_the_banner() {
    let server = start_server(EngineKind::LeaderFollower, 2);
    let mut client = connect(server.addr);
    read_until_prompt(&mut client);

    client.write_all(b"help\n").unwrap();
    let response = read_until_prompt(&mut client);
    assert!(response.contains("Format: vertices edges"), "{}", response);

    server.stop();
}

#[test]
fn concurrent_clients_are_served_independently() {
    let server = start_server(EngineKind::LeaderFollower, 4);
    let addr = server.addr;

    let clients: Vec<_> = (0..6)
        .map(|_| {
            thread::spawn(move || {
                let mut client = connect(addr);
                read_until_prompt(&mut client);
                for _ in 0..5 {
                    client.write_all(TRIANGLE.as_bytes()).unwrap();
                    let response = read_until_prompt(&mut client);
                    assert!(response.contains("HAMILTON CIRCUIT: YES"));
                }
            })
        })
        .collect();

    for client in clients {
        client.join().unwrap();
    }
    server.stop();
}

#[test]
fn server_shutdown_joins_cleanly_with_connected_client() {
    let server = start_server(EngineKind::Pipeline, 2);
    let mut client = connect(server.addr);
    read_until_prompt(&mut client);

    client.write_all(TRIANGLE.as_bytes()).unwrap();
    read_until_prompt(&mut client);

    // Client still connected; stop must still return promptly.
    server.stop();
}
