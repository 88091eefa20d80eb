use std::net::Ipv4Addr;
use std::path::PathBuf;

use clap::Parser;

const AFTER_HELP: &str = r#"Environment Variables:
    RUST_LOG: See "https://docs.rs/tracing-subscriber/latest/tracing_subscriber/fmt/index.html#filtering-events-with-environment-variables"
"#;

#[derive(Debug, Clone, Parser)]
#[clap(
    version,
    name = "radar",
    about = "TUI display of aircraft tracked from an ADS-B demodulator feed",
    after_help = AFTER_HELP
)]
pub struct Opts {
    /// ip address / hostname of ADS-B server / demodulator
    #[clap(long, default_value = "127.0.0.1")]
    pub host: Ipv4Addr,

    /// port of ADS-B server / demodulator
    #[clap(long, default_value = "30002")]
    pub port: u16,

    /// Antenna location latitude, used for relative range and bearing.
    ///
    /// Overwritten when using the `--gpsd` option.
    #[clap(long)]
    pub lat: Option<f64>,

    /// Antenna location longitude
    ///
    /// Overwritten when using the `--gpsd` option.
    #[clap(long)]
    pub long: Option<f64>,

    /// Enable automatic updating of lat/long from gpsd(<https://gpsd.io/>)
    #[clap(long)]
    pub gpsd: bool,

    /// Ip address of gpsd
    #[clap(long, default_value = "localhost")]
    pub gpsd_ip: String,

    /// File remembering the last observer position across runs
    #[clap(long)]
    pub position_hint: Option<PathBuf>,

    /// Directory for log files
    #[clap(long, default_value = ".")]
    pub log_folder: PathBuf,
}
