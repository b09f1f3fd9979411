use clap::Parser;
use lapida_trace::geo::{haversine_m, Coordinates};
use lapida_trace::location::{
    builtin_series, default_export_path, find_series, load_series_file, LocationArbiter,
    NamedSeries, SimulatedFeed, UnavailableRealFeed,
};
use lapida_trace::records::{FileRecordSource, HttpRecordSource, RecordSource};
use lapida_trace::route::{OsrmEngine, RouteCoordinator, RouteError, RoutePath, RoutingEngine};
use lapida_trace::search::{run_search, SearchOutcome, SearchQuery};
use lapida_trace::token;
use lapida_trace::BurialRecord;
use std::path::PathBuf;

/// Lapida Trace v0.3 — Burial Record Locator
///
/// Finds burial records by fuzzy name matching, decodes marker tokens
/// in several formats, and walks a route from the visitor's position to
/// the plot.
///
/// Examples:
///   lapida --records records.json --first Maria --last Santos --birth 1932-04-18 --death 2001-11-02
///   lapida --token '{"lat":15.4945,"lng":120.5551,"plot":"B-14"}'
///   lapida --records records.json --first Jose --last Reyes --birth 1920-01-01 --death 1999-05-05 --simulate entrance-walk --steps 6
///   lapida --serve --port 8787
#[derive(Parser)]
#[command(name = "lapida", version, about, long_about = None)]
struct Cli {
    /// Path to a JSON file of burial records.
    #[arg(long)]
    records: Option<PathBuf>,

    /// URL of the record store endpoint.
    #[arg(long)]
    records_url: Option<String>,

    /// First name to search for.
    #[arg(long)]
    first: Option<String>,

    /// Last name to search for.
    #[arg(long)]
    last: Option<String>,

    /// Birth date (YYYY-MM-DD).
    #[arg(long)]
    birth: Option<String>,

    /// Death date (YYYY-MM-DD).
    #[arg(long)]
    death: Option<String>,

    /// Decode a marker token directly instead of searching.
    #[arg(long)]
    token: Option<String>,

    /// Replay a named simulated series (e.g. entrance-walk).
    #[arg(long)]
    simulate: Option<String>,

    /// Simulated emission interval in milliseconds.
    #[arg(long, default_value_t = 1000)]
    interval: u64,

    /// Number of simulated steps to replay.
    #[arg(long, default_value_t = 10)]
    steps: u32,

    /// Extra simulated series from a JSON file.
    #[arg(long)]
    series_file: Option<PathBuf>,

    /// Grant location consent (attempts to start the device watch).
    #[arg(long)]
    consent: bool,

    /// Export the sample log after the run (default: ~/.lapida/samples.json).
    #[arg(long, value_name = "PATH", num_args = 0..=1, default_missing_value = "")]
    export_samples: Option<String>,

    /// Offline mode: straight-line routing instead of the public engine.
    #[arg(long)]
    offline: bool,

    /// Run the HTTP server instead of a one-shot query.
    #[arg(long)]
    serve: bool,

    /// Server bind host.
    #[arg(long, default_value = "127.0.0.1")]
    host: String,

    /// Server bind port.
    #[arg(long, default_value_t = 8787)]
    port: u16,
}

/// Offline engine: a two-point straight line at walking pace.
struct StraightLineEngine;

impl RoutingEngine for StraightLineEngine {
    fn route(&self, origin: Coordinates, destination: Coordinates) -> Result<RoutePath, RouteError> {
        let distance_m = haversine_m(origin, destination);
        Ok(RoutePath {
            distance_m,
            duration_s: distance_m / 1.4,
            geometry: vec![origin, destination],
        })
    }
}

fn main() {
    let cli = Cli::parse();

    // ── Load records ────────────────────────────────────────────

    let records = load_records(&cli);

    // ── Server mode ─────────────────────────────────────────────

    if cli.serve {
        let arbiter = build_arbiter(&cli);
        let runtime = tokio::runtime::Runtime::new().unwrap_or_else(|e| {
            eprintln!("Error: Cannot start async runtime: {}", e);
            std::process::exit(1);
        });
        runtime.block_on(lapida_trace::server::start(&cli.host, cli.port, records, arbiter));
        return;
    }

    // ── Resolve destination: direct token or record search ──────

    let destination = resolve_destination(&cli, &records);

    // ── Location arbitration ────────────────────────────────────

    let mut arbiter = build_arbiter(&cli);

    if cli.consent {
        if let Err(e) = arbiter.grant_consent() {
            // Degraded path: search and reference-point routing still work.
            eprintln!("  \u{26A0}\u{FE0F}  {}", e);
        }
    }

    // ── Routing ─────────────────────────────────────────────────

    let engine: Box<dyn RoutingEngine> = if cli.offline {
        Box::new(StraightLineEngine)
    } else {
        Box::new(OsrmEngine::new())
    };
    let mut coordinator = RouteCoordinator::new(engine);
    coordinator.set_destination(destination);

    if let Some(ref series_id) = cli.simulate {
        let extra = load_extra_series(&cli);
        let series = find_series(series_id, &extra).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        });
        arbiter.set_sim_interval_ms(cli.interval);
        if let Err(e) = arbiter.select_series(series) {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
        eprintln!("  Replaying series '{}' ({} steps)", series_id, cli.steps);

        for _ in 0..cli.steps {
            arbiter.poll();
            report_step(&arbiter, &mut coordinator);
            std::thread::sleep(std::time::Duration::from_millis(
                arbiter_interval(&cli),
            ));
        }
    } else if destination.is_some() {
        arbiter.poll();
        report_step(&arbiter, &mut coordinator);
    }

    // ── Sample export ───────────────────────────────────────────

    if let Some(ref path_arg) = cli.export_samples {
        let path = if path_arg.is_empty() {
            default_export_path()
        } else {
            PathBuf::from(path_arg)
        };
        match arbiter.export_samples(&path) {
            Ok(()) => eprintln!("  Samples written to {}", path.display()),
            Err(e) => {
                eprintln!("Error: {}", e);
                std::process::exit(1);
            }
        }
    }

    arbiter.shutdown();
}

fn arbiter_interval(cli: &Cli) -> u64 {
    cli.interval.max(lapida_trace::location::MIN_INTERVAL_MS)
}

fn build_arbiter(cli: &Cli) -> LocationArbiter {
    let sim_feed = SimulatedFeed::new(first_builtin(), cli.interval);
    LocationArbiter::new(Box::new(UnavailableRealFeed), sim_feed)
}

fn first_builtin() -> NamedSeries {
    // The built-in set is never empty.
    builtin_series().remove(0)
}

fn load_extra_series(cli: &Cli) -> Vec<NamedSeries> {
    match &cli.series_file {
        Some(path) => load_series_file(path).unwrap_or_else(|e| {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }),
        None => Vec::new(),
    }
}

fn load_records(cli: &Cli) -> Vec<BurialRecord> {
    let source: Box<dyn RecordSource> = if let Some(ref path) = cli.records {
        Box::new(FileRecordSource::new(path))
    } else if let Some(ref url) = cli.records_url {
        Box::new(HttpRecordSource::new(url.clone()))
    } else {
        return Vec::new();
    };
    source.fetch().unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    })
}

fn resolve_destination(cli: &Cli, records: &[BurialRecord]) -> Option<Coordinates> {
    // Priority: --token > record search > none.

    if let Some(ref raw) = cli.token {
        let decoded = token::decode(raw);
        println!("{}", serde_json::to_string_pretty(&decoded).unwrap());
        if let Some(ref payload) = decoded.payload {
            for entry in token::display_entries(payload) {
                eprintln!("  {}: {}", entry.label, entry.value);
            }
        }
        if decoded.coordinates.is_none() {
            eprintln!("  No geocoded data found in this token.");
        }
        return decoded.coordinates;
    }

    let (Some(birth), Some(death)) = (&cli.birth, &cli.death) else {
        if cli.first.is_some() || cli.last.is_some() || cli.birth.is_some() || cli.death.is_some() {
            eprintln!("Error: Please provide both Birth Date and Death Date.");
            std::process::exit(1);
        }
        return None;
    };

    let query = SearchQuery {
        first_name: cli.first.clone().unwrap_or_default(),
        last_name: cli.last.clone().unwrap_or_default(),
        birth_date: birth.clone(),
        death_date: death.clone(),
    };
    let outcome = run_search(records, &query).unwrap_or_else(|e| {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    });

    println!("{}", serde_json::to_string_pretty(&outcome).unwrap());

    match outcome {
        SearchOutcome::Selected(record) => {
            eprintln!("  Selected record #{}: {}", record.id, record.deceased_name);
            let decoded = record.marker_token.as_deref().map(token::decode);
            let coords = decoded.and_then(|d| d.coordinates);
            if coords.is_none() {
                eprintln!("  Record has no geocoded marker; no route will be drawn.");
            }
            coords
        }
        SearchOutcome::Ambiguous { exact, close } => {
            eprintln!(
                "  {} exact and {} close matches; refine the name to route.",
                exact.len(),
                close.len()
            );
            None
        }
        SearchOutcome::NoMatch(reason) => {
            eprintln!("  {}", reason.message());
            None
        }
    }
}

fn report_step(arbiter: &LocationArbiter, coordinator: &mut RouteCoordinator) {
    let origin = arbiter.effective_origin();
    eprintln!(
        "  [{}] origin {}{}",
        arbiter.state(),
        origin.origin,
        if origin.outside_radius { " (outside radius, using entrance)" } else { "" },
    );

    match coordinator.refresh(arbiter) {
        Ok(Some(update)) => {
            eprintln!(
                "    route: {:.0} m, {:.0} s, {} points{}",
                update.path.distance_m,
                update.path.duration_s,
                update.path.geometry.len(),
                if update.outside_radius { " [from entrance]" } else { "" },
            );
        }
        Ok(None) => {}
        Err(e) => eprintln!("    route error: {}", e),
    }
}
