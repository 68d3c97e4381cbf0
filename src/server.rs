//! # TCP Front End
//!
//! Accept loop and per-connection handlers over the line protocol. The
//! server owns no global state: the shutdown flag is injected at
//! construction and polled by the accept loop and every handler, and
//! handler threads are registered and joined at shutdown rather than
//! detached.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use log::{debug, error, info, warn};
use parking_lot::Mutex;

use crate::concurrency::{Engine, OutputSink};
use crate::config::ServerConfig;
use crate::error::{Result, ServerError};
use crate::protocol;

const ACCEPT_POLL: Duration = Duration::from_millis(50);
const READ_POLL: Duration = Duration::from_millis(250);

/// Socket-backed response sink. Responses carry the trailing prompt so
/// the client always knows the server is ready for the next line.
struct TcpSink {
    stream: Mutex<TcpStream>,
}

impl TcpSink {
    fn new(stream: TcpStream) -> Self {
        Self { stream: Mutex::new(stream) }
    }

    // A bare line without the prompt, for farewells.
    fn send_line(&self, text: &str) {
        let mut stream = self.stream.lock();
        if let Err(e) = stream.write_all(text.as_bytes()).and_then(|_| stream.write_all(b"\n")) {
            debug!("write failed: {}", e);
        }
    }
}

impl OutputSink for TcpSink {
    fn deliver(&self, response: &str) {
        let mut stream = self.stream.lock();
        let result = stream
            .write_all(response.as_bytes())
            .and_then(|_| stream.write_all(b"\n> "))
            .and_then(|_| stream.flush());
        if let Err(e) = result {
            debug!("response dropped, peer gone: {}", e);
        }
    }
}

/// Line-protocol TCP server over one execution engine.
pub struct Server {
    listener: TcpListener,
    engine: Arc<dyn Engine>,
    shutdown: Arc<AtomicBool>,
    handlers: Mutex<Vec<JoinHandle<()>>>,
    connections: Arc<AtomicU64>,
}

impl Server {
    /// Bind the listener. The only fatal failure class lives here;
    /// everything after a successful bind is recoverable per request.
    pub fn bind(
        config: &ServerConfig,
        engine: Arc<dyn Engine>,
        shutdown: Arc<AtomicBool>,
    ) -> Result<Self> {
        config.validate()?;
        let listener = TcpListener::bind(&config.listen)
            .map_err(|source| ServerError::Bind { addr: config.listen.clone(), source })?;
        // Non-blocking accept lets the loop poll the shutdown flag.
        listener.set_nonblocking(true)?;

        Ok(Self {
            listener,
            engine,
            shutdown,
            handlers: Mutex::new(Vec::new()),
            connections: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn local_addr(&self) -> Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    pub fn connections(&self) -> u64 {
        self.connections.load(Ordering::Relaxed)
    }

    /// Accept until the shutdown flag flips, then stop the engine, join
    /// every handler and log a final stats snapshot.
    pub fn run(&self) -> Result<()> {
        info!("listening on {}", self.local_addr()?);

        while !self.shutdown.load(Ordering::SeqCst) {
            match self.listener.accept() {
                Ok((stream, peer)) => self.accept_connection(stream, peer),
                Err(e) if e.kind() == ErrorKind::WouldBlock => thread::sleep(ACCEPT_POLL),
                Err(e) => {
                    error!("accept failed: {}", e);
                    thread::sleep(ACCEPT_POLL);
                }
            }
        }

        info!("shutting down");
        self.engine.stop();
        for handle in self.handlers.lock().drain(..) {
            if handle.join().is_err() {
                error!("connection handler terminated abnormally");
            }
        }

        match serde_json::to_string(&self.engine.stats()) {
            Ok(snapshot) => info!("final stats: {}", snapshot),
            Err(e) => warn!("could not render final stats: {}", e),
        }
        Ok(())
    }

    fn accept_connection(&self, stream: TcpStream, peer: SocketAddr) {
        let connection = self.connections.fetch_add(1, Ordering::Relaxed) + 1;
        info!("connection {} accepted from {}", connection, peer);

        let engine = Arc::clone(&self.engine);
        let shutdown = Arc::clone(&self.shutdown);
        let connections = Arc::clone(&self.connections);

        let spawned = thread::Builder::new()
            .name(format!("conn-{}", connection))
            .spawn(move || handle_connection(stream, connection, engine, shutdown, connections));

        match spawned {
            Ok(handle) => self.handlers.lock().push(handle),
            Err(e) => error!("could not spawn handler for connection {}: {}", connection, e),
        }
    }
}

fn handle_connection(
    stream: TcpStream,
    connection: u64,
    engine: Arc<dyn Engine>,
    shutdown: Arc<AtomicBool>,
    connections: Arc<AtomicU64>,
) {
    // A read timeout keeps the handler responsive to the shutdown flag.
    if let Err(e) = stream.set_read_timeout(Some(READ_POLL)) {
        error!("connection {}: cannot set read timeout: {}", connection, e);
        return;
    }
    let writer = match stream.try_clone() {
        Ok(w) => w,
        Err(e) => {
            error!("connection {}: cannot clone stream: {}", connection, e);
            return;
        }
    };

    let sink = Arc::new(TcpSink::new(writer));
    sink.deliver(&protocol::banner());

    let mut reader = BufReader::new(stream);
    let mut line = String::new();

    while !shutdown.load(Ordering::SeqCst) {
        line.clear();
        match reader.read_line(&mut line) {
            Ok(0) => {
                debug!("connection {} disconnected", connection);
                break;
            }
            Ok(_) => {
                let input = line.trim();
                match input {
                    "" => sink.deliver("Enter graph data. Type 'help'."),
                    "quit" | "exit" => {
                        sink.send_line("Goodbye!");
                        break;
                    }
                    "help" => sink.deliver(&protocol::banner()),
                    "stats" => {
                        let block = protocol::format_stats(
                            &engine.stats(),
                            connections.load(Ordering::Relaxed),
                        );
                        sink.deliver(&block);
                    }
                    _ => {
                        let request_sink: Arc<dyn OutputSink> = sink.clone();
                        if !engine.submit(input.to_string(), request_sink) {
                            sink.deliver("Server is shutting down; request rejected.");
                        }
                    }
                }
            }
            Err(e) if e.kind() == ErrorKind::WouldBlock || e.kind() == ErrorKind::TimedOut => {
                // Idle poll tick; loop around and re-check the flag.
            }
            Err(e) => {
                debug!("connection {} read error: {}", connection, e);
                break;
            }
        }
    }
}
