//!  FareScout Flight Agent
//!
//!  Copyright (C) 2026  FareScout contributors
//!
//!  This program is free software: you can redistribute it and/or modify
//!  it under the terms of the GNU Affero General Public License as published by
//!  the Free Software Foundation, either version 3 of the License, or
//!  (at your option) any later version.
//!
//!  This program is distributed in the hope that it will be useful,
//!  but WITHOUT ANY WARRANTY; without even the implied warranty of
//!  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
//!  GNU Affero General Public License for more details.
//!
//!  You should have received a copy of the GNU Affero General Public License
//!  along with this program.  If not, see <http://www.gnu.org/licenses/>.

//! CLI for airfare discovery.

use std::cmp::max;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use farescout_flight_agent::{
    parse_results, BatchConfig, ExploreTable, FlightSearchClient, HttpRenderer, Offer, OfferTable,
    Passenger, PayloadOptions, QueryResults, Seat, SectionMarkers, TripArg, TripQuery,
    DEFAULT_EXPLORE_MAX_STOPS,
};
use farescout_leg_pacing::PacingPolicy;
use term_size;

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "farescout-flights")]
#[command(author, version, about, long_about = None)]
struct CliArgs {
    /// Trip descriptor: airport codes, comma-joined location lists and
    /// YYYY-MM-DD dates, in trip order.
    ///
    /// Examples: `JFK LHR 2026-09-10` (one-way),
    /// `JFK LHR 2026-09-10 2026-09-20` (round-trip),
    /// `JFK,EWR London,Paris 2026-09-10` (explore; city names go in lists)
    #[arg(required = true)]
    trip: Vec<String>,

    /// Cabin class: economy, premium_economy, business, first
    #[arg(short, long, default_value = "economy")]
    cabin: String,

    /// Number of passengers (adults)
    #[arg(short, long, default_value = "1")]
    passengers: u32,

    /// Maximum number of stops for explore-style queries (0 = no filter)
    #[arg(long)]
    max_stops: Option<i32>,

    /// Per-leg render timeout in seconds
    #[arg(long, default_value = "30")]
    timeout: u64,

    /// Inter-leg pacing bounds in seconds, e.g. "2,8" (omitted = no pacing)
    #[arg(long)]
    pace: Option<String>,

    /// Parse a saved visible-text dump (one token per line) instead of
    /// fetching
    #[arg(long)]
    offline: Option<std::path::PathBuf>,

    /// Print the request URLs and exit without fetching
    #[arg(long, default_value = "false")]
    dry_run: bool,

    /// Emit results as JSON
    #[arg(long, default_value = "false")]
    json: bool,

    /// Verbose output
    #[arg(short, long, default_value = "false")]
    verbose: bool,
}

/// Configure logging based on verbosity level
fn setup_logging(verbose: bool) {
    let level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();
}

/// Parse cabin class string to Seat enum
fn parse_cabin(s: &str) -> Result<Seat> {
    match s.to_lowercase().as_str() {
        "economy" | "e" => Ok(Seat::Economy),
        "premium_economy" | "premium" | "pe" => Ok(Seat::PremiumEconomy),
        "business" | "b" => Ok(Seat::Business),
        "first" | "f" => Ok(Seat::First),
        _ => anyhow::bail!(
            "Invalid cabin class: {}. Use: economy, premium_economy, business, first",
            s
        ),
    }
}

/// Parse "min,max" pacing bounds in seconds
fn parse_pace(s: &str) -> Result<PacingPolicy> {
    let (lo, hi) = s
        .split_once(',')
        .context("Pacing bounds must be \"min,max\" in seconds")?;
    let lo: u64 = lo.trim().parse().context("Invalid pacing lower bound")?;
    let hi: u64 = hi.trim().parse().context("Invalid pacing upper bound")?;
    Ok(PacingPolicy::jittered(
        Duration::from_secs(lo),
        Duration::from_secs(hi),
    )?)
}

/// Interpret one positional argument; comma-joined tokens become a
/// location list.
fn parse_trip_arg(raw: &str) -> TripArg {
    if raw.contains(',') {
        TripArg::Codes(
            raw.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
        )
    } else {
        TripArg::parse(raw)
    }
}

/// Get terminal width for responsive tables
fn get_terminal_width() -> usize {
    term_size::dimensions().map(|(w, _)| w).unwrap_or(100)
}

fn dash_bar() -> String {
    "-".repeat(get_terminal_width().min(100))
}

/// Helper: convert Option<String> to display string
fn opt_display(opt: &Option<String>, default: &str) -> String {
    opt.as_deref().unwrap_or(default).to_string()
}

/// Format departure/arrival times.
fn fmt_times(offer: &Offer) -> String {
    let dep = offer
        .time_leave
        .map_or("??:??".to_string(), |t| t.format("%H:%M").to_string());
    let arr = offer
        .time_arrive
        .map_or("??:??".to_string(), |t| t.format("%H:%M").to_string());
    format!("{} → {}", dep, arr)
}

fn fmt_stops(offer: &Offer) -> String {
    match (offer.num_stops, &offer.layover) {
        (Some(0), _) => "direct".to_string(),
        (Some(n), Some(l)) => format!("{} stop(s): {}", n, l),
        (Some(n), None) => format!("{} stop(s)", n),
        (None, _) => "??".to_string(),
    }
}

fn fmt_price(offer: &Offer) -> String {
    match (offer.price, offer.price_eur, offer.price_usd) {
        (Some(p), Some(e), _) if p == e => format!("€{}", p),
        (Some(p), _, Some(u)) if p == u => format!("${}", p),
        (Some(p), _, _) => p.to_string(),
        (None, _, _) => "??".to_string(),
    }
}

/// Render an offer table to stdout
fn render_offers(table: &OfferTable, urls: &[String]) {
    let best_price = table.offers.iter().filter_map(|o| o.price).min();

    println!("{}", dash_bar());
    println!("  📊 Offers found: {}", table.len());
    if let Some(best) = best_price {
        println!("  💰 Best price:   {}", best);
    }
    for url in urls {
        println!("  🔗 {}", url);
    }
    println!("{}\n", dash_bar());

    if table.is_empty() {
        return;
    }

    // Terminal-aware column widths
    let mut tw = 15;
    let mut dw = 10;
    let mut sw = 12;
    let mut aw = 7;
    for offer in &table.offers {
        tw = max(tw, fmt_times(offer).len());
        dw = max(dw, opt_display(&offer.duration, "??").len());
        sw = max(sw, fmt_stops(offer).len());
        aw = max(aw, opt_display(&offer.airline, "??").len());
    }
    let available = get_terminal_width().saturating_sub(25);
    if tw + dw + sw + aw > available && available > 50 {
        let ratio = available as f64 / (tw + dw + sw + aw) as f64;
        tw = max((tw as f64 * ratio).floor() as usize, 10);
        dw = max((dw as f64 * ratio).floor() as usize, 5);
        sw = max((sw as f64 * ratio).floor() as usize, 8);
        aw = max((aw as f64 * ratio).floor() as usize, 4);
    }

    println!(
        "  {:>4}  {:<tw$}  {:<dw$}  {:<sw$}  {:<aw$}   PRICE",
        "#", "DEP → ARR", "DURATION", "STOPS", "AIRLINE"
    );
    println!("{}", dash_bar());
    for (i, offer) in table.offers.iter().enumerate() {
        println!(
            "  {:>4}  {:<tw$}  {:<dw$}  {:<sw$}  {:<aw$}   {}",
            i + 1,
            fmt_times(offer),
            opt_display(&offer.duration, "??"),
            fmt_stops(offer),
            opt_display(&offer.airline, "??"),
            fmt_price(offer),
        );
    }
}

/// Render an explore table to stdout
fn render_explore(table: &ExploreTable, urls: &[String]) {
    println!("{}", dash_bar());
    println!("  🌍 Destinations found: {}", table.len());
    for url in urls {
        println!("  🔗 {}", url);
    }
    println!("{}\n", dash_bar());

    let mut cw = 10;
    for row in &table.rows {
        cw = max(cw, opt_display(&row.city, "??").len());
    }
    println!("  {:<cw$}  {:>8}  {:<12}  DURATION", "CITY", "PRICE", "STOPS");
    println!("{}", dash_bar());
    for row in &table.rows {
        let duration = match row.duration_minutes {
            Some(m) => format!("{}h {:02}m", m / 60, m % 60),
            None => "??".to_string(),
        };
        println!(
            "  {:<cw$}  {:>8}  {:<12}  {}",
            opt_display(&row.city, "??"),
            row.price,
            opt_display(&row.stops, "??"),
            duration,
        );
    }
}

fn render(query: &TripQuery, json: bool) -> Result<()> {
    match query.results() {
        Some(QueryResults::Offers(table)) => {
            if json {
                println!("{}", serde_json::to_string_pretty(table)?);
            } else {
                render_offers(table, query.urls());
            }
        }
        Some(QueryResults::Explore(table)) => {
            if json {
                println!("{}", serde_json::to_string_pretty(table)?);
            } else {
                render_explore(table, query.urls());
            }
        }
        None => println!("{}", query),
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = CliArgs::parse();
    setup_logging(args.verbose);

    tracing::info!("Starting farescout-flights CLI");
    tracing::debug!("Args: {:?}", args);

    let cabin = parse_cabin(&args.cabin)?;
    let pacing = match &args.pace {
        Some(s) => parse_pace(s)?,
        None => PacingPolicy::Disabled,
    };

    let trip_args: Vec<TripArg> = args.trip.iter().map(|s| parse_trip_arg(s)).collect();
    let options = PayloadOptions {
        cabin,
        passengers: vec![(Passenger::Adult, args.passengers)],
        max_stops: Some(args.max_stops.unwrap_or(DEFAULT_EXPLORE_MAX_STOPS)),
    };
    let spec = farescout_flight_agent::TripSpec::classify(&trip_args)?;
    tracing::info!("Classified trip: {} ({})", spec.topology(), spec);
    let mut query = TripQuery::with_options(spec, &options)?;

    if args.dry_run {
        for url in query.urls() {
            println!("{}", url);
        }
        return Ok(());
    }

    if let Some(path) = &args.offline {
        let raw = std::fs::read_to_string(path)
            .context(format!("Failed to read {}", path.display()))?;
        if query.spec().is_explore() {
            // Explore dumps are full documents, not visible-text token lists.
            query.attach_results(QueryResults::Explore(ExploreTable::from_html(&raw)))?;
        } else {
            let tokens: Vec<String> = raw.lines().map(|l| l.to_string()).collect();
            let date = query.spec().legs()[0].date;
            let table = parse_results(&tokens, date, &SectionMarkers::default());
            query.attach_results(QueryResults::Offers(table))?;
        }
        return render(&query, args.json);
    }

    let config = BatchConfig {
        render_timeout: Duration::from_secs(args.timeout),
        pacing,
        ..BatchConfig::default()
    };
    let renderer = HttpRenderer::new(config.render_timeout)?;
    let client = FlightSearchClient::new(renderer, config);

    let report = client.run(&mut query).await.context("Search failed")?;
    tracing::info!(
        "Search completed: {} legs fetched, {} empty, {} skipped",
        report.legs_fetched,
        report.legs_empty,
        report.legs_skipped
    );

    render(&query, args.json)
}
