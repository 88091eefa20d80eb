//! Print every accepted frame from a demodulator feed, with a running tally
//! of the tracked planes. A debugging companion to `radar`.

use std::net::SocketAddr;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use skywatch::Frame;
use skywatch_common::driver::{Driver, TcpTransport};
use skywatch_common::Planes;

#[derive(Debug, Parser)]
#[clap(
    version,
    name = "dump",
    about = "Print decoded ADS-B frames from a demodulator feed"
)]
struct Opts {
    /// ip address / hostname of ADS-B server / demodulator
    #[clap(long, default_value = "127.0.0.1")]
    host: std::net::Ipv4Addr,

    /// port of ADS-B server / demodulator
    #[clap(long, default_value = "30002")]
    port: u16,

    /// Display the running plane database after every frame
    #[clap(long)]
    planes: bool,
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let addr = SocketAddr::from((opts.host, opts.port));
    let transport = TcpTransport::connect(addr, Duration::from_secs(5)).with_context(|| {
        format!(
            "could not open port to the ADS-B demodulator at {}:{}",
            opts.host, opts.port
        )
    })?;
    let mut driver = Driver::start(transport);
    let mut planes = Planes::new();

    loop {
        while let Some(message) = driver.read_next_message() {
            let hex: String = message.iter().map(|b| format!("{b:02x}")).collect();
            match Frame::from_bytes(&message) {
                Ok(frame) => {
                    println!("*{hex}; {frame:?}");
                    planes.action(&frame, Instant::now());
                }
                Err(e) => println!("*{hex}; dropped: {e}"),
            }
            if opts.planes {
                print!("{planes}");
            }
        }
        planes.prune(Instant::now());
        std::thread::sleep(Duration::from_millis(100));
    }
}
