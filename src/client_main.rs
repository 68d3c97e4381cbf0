//! Line-oriented client: forwards stdin to the server and prints
//! everything the server sends back.

use std::io::{self, BufRead, Write};
use std::net::TcpStream;
use std::thread;

use clap::Parser;

#[derive(Parser)]
#[command(name = "graphserve-client")]
#[command(about = "Interactive client for graphserve")]
#[command(version)]
struct Cli {
    /// Server host
    #[arg(default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(default_value_t = 8082)]
    port: u16,
}

fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("graphserve-client: {}", e);
        std::process::exit(1);
    }
}

fn run(cli: &Cli) -> io::Result<()> {
    let stream = TcpStream::connect((cli.host.as_str(), cli.port))?;
    eprintln!("connected to {}:{}", cli.host, cli.port);

    let mut incoming = stream.try_clone()?;
    thread::spawn(move || {
        // Ends when the server closes the connection.
        let _ = io::copy(&mut incoming, &mut io::stdout());
    });

    let mut outgoing = stream;
    for line in io::stdin().lock().lines() {
        let line = line?;
        outgoing.write_all(line.as_bytes())?;
        outgoing.write_all(b"\n")?;
        let trimmed = line.trim();
        if trimmed == "quit" || trimmed == "exit" {
            break;
        }
    }
    Ok(())
}
