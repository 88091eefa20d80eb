//! Table display of the aircraft currently tracked by the skywatch engine,
//! fed from a dump1090-style raw demodulator port.

#[path = "radar/cli.rs"]
mod cli;

use std::io::{self, BufReader, BufWriter};
use std::net::{SocketAddr, TcpStream};
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::event::{poll, read, Event, KeyCode};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use gpsd_proto::{get_data, handshake, ResponseData};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;
use tui::backend::CrosstermBackend;
use tui::layout::Constraint;
use tui::style::{Color, Style};
use tui::widgets::{Block, Borders, Row, Table};
use tui::Terminal;

use skywatch_common::driver::{Driver, TcpTransport};
use skywatch_common::geo;
use skywatch_common::manager::Manager;
use skywatch_common::observer::Observer;
use skywatch_common::view::{Freshness, PlaneSnapshot};

use crate::cli::Opts;

/// How long to wait for the demodulator before giving up.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Display refresh period; also the event poll timeout.
const REFRESH: Duration = Duration::from_millis(250);

fn main() -> Result<()> {
    let opts = Opts::parse();

    // log to a rolling file, the terminal belongs to the tui
    let file_appender = tracing_appender::rolling::daily(&opts.log_folder, "radar.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(non_blocking)
        .init();

    let version = env!("CARGO_PKG_VERSION");
    info!("starting radar-v{version} with options: {opts:?}");

    let observer = match &opts.position_hint {
        Some(path) => Arc::new(Observer::load(path)),
        None => Arc::new(Observer::new()),
    };
    if let (Some(lat), Some(long)) = (opts.lat, opts.long) {
        observer.set(lat, long);
    }
    if opts.gpsd {
        let gpsd_ip = opts.gpsd_ip.clone();
        let observer = Arc::clone(&observer);
        std::thread::spawn(move || gpsd_thread(&gpsd_ip, &observer));
    }

    let addr = SocketAddr::from((opts.host, opts.port));
    let transport = TcpTransport::connect(addr, CONNECT_TIMEOUT).with_context(|| {
        format!(
            "could not open port to the ADS-B demodulator at {}:{}",
            opts.host, opts.port
        )
    })?;
    let mut manager = Manager::start(Driver::start(transport), None);
    info!("engine running");

    let mut stdout = io::stdout();
    stdout.execute(EnterAlternateScreen)?;
    enable_raw_mode()?;
    let mut terminal = Terminal::new(CrosstermBackend::new(io::stdout()))?;
    terminal.clear()?;

    loop {
        let snapshot = manager.snapshot(Instant::now());
        let observer_position = observer.get();
        terminal.draw(|f| {
            let header = Row::new(vec![
                "ICAO", "Call", "Lat", "Long", "Alt", "Brng", "VRate", "Dist(km)", "Obs brng",
            ])
            .bottom_margin(1);
            let rows: Vec<Row> = snapshot
                .iter()
                .map(|plane| plane_row(plane, observer_position.as_ref()))
                .collect();
            let title = format!(
                " radar-v{version} | planes: {} | messages: {} ",
                snapshot.len(),
                manager.msg_count()
            );
            let table = Table::new(rows)
                .header(header)
                .block(Block::default().title(title).borders(Borders::ALL))
                .widths(&[
                    Constraint::Length(7),
                    Constraint::Length(9),
                    Constraint::Length(9),
                    Constraint::Length(9),
                    Constraint::Length(6),
                    Constraint::Length(6),
                    Constraint::Length(6),
                    Constraint::Length(9),
                    Constraint::Length(9),
                ]);
            f.render_widget(table, f.size());
        })?;

        if poll(REFRESH)? {
            if let Event::Key(key) = read()? {
                if matches!(key.code, KeyCode::Char('q') | KeyCode::Esc) {
                    break;
                }
            }
        }
    }

    disable_raw_mode()?;
    io::stdout().execute(LeaveAlternateScreen)?;

    manager.stop();
    if let Some(path) = &opts.position_hint {
        observer
            .save(path)
            .with_context(|| format!("could not save position hint to {}", path.display()))?;
    }
    info!("exiting");
    Ok(())
}

fn plane_row<'a>(
    plane: &PlaneSnapshot,
    observer: Option<&skywatch::cpr::Position>,
) -> Row<'a> {
    let empty = String::new();

    let (lat, long) = plane
        .position
        .map_or((empty.clone(), empty.clone()), |p| {
            (format!("{:.3}", p.latitude), format!("{:.3}", p.longitude))
        });
    let (distance, obs_bearing) = match (observer, &plane.position) {
        (Some(observer), Some(position)) => {
            let (metres, bearing) = geo::distance_bearing(observer, position);
            (format!("{:.1}", metres / 1000.0), format!("{bearing:.0}"))
        }
        _ => (empty.clone(), empty.clone()),
    };
    let vrate = plane.vertical_rate.map_or_else(
        || empty.clone(),
        |v| {
            format!(
                "{}{}",
                if v.up { '+' } else { '-' },
                v.ft_min
            )
        },
    );

    let style = match plane.freshness {
        Freshness::FreshPosition => Style::default().fg(Color::Green),
        Freshness::RecentlySeen => Style::default().fg(Color::White),
        Freshness::Stale => Style::default().fg(Color::DarkGray),
    };

    Row::new(vec![
        format!("{}", plane.icao),
        plane.callsign.clone().unwrap_or_else(|| empty.clone()),
        lat,
        long,
        plane.altitude.map_or_else(|| empty.clone(), |a| a.to_string()),
        plane
            .bearing
            .map_or_else(|| empty.clone(), |b| format!("{b:.0}")),
        vrate,
        distance,
        obs_bearing,
    ])
    .style(style)
}

/// Keep the observer position following a gpsd daemon at the usual port.
fn gpsd_thread(gpsd_ip: &str, observer: &Observer) {
    let gpsd_port = 2947;
    match TcpStream::connect((gpsd_ip, gpsd_port)) {
        Ok(stream) => {
            let mut reader = BufReader::new(&stream);
            let mut writer = BufWriter::new(&stream);
            if handshake(&mut reader, &mut writer).is_err() {
                error!("[gpsd] handshake failed");
                return;
            }
            info!("[gpsd] connected");
            loop {
                if let Ok(ResponseData::Tpv(data)) = get_data(&mut reader) {
                    if let (Some(lat), Some(lon)) = (data.lat, data.lon) {
                        info!("[gpsd] lat: {lat}, long: {lon}");
                        observer.set(lat, lon);
                    }
                }
            }
        }
        Err(e) => error!("could not connect to gpsd @ {gpsd_ip}:{gpsd_port}: {e}"),
    }
}
