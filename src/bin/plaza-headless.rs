//! Headless marketplace engine for local driving and E2E testing.
//!
//! Runs the engine on the in-memory store with JSON-over-stdio IPC.
//! Logging goes to stderr; stdout is reserved for the IPC protocol.
//!
//! Usage:
//!   plaza-headless
//!
//! On startup, seeds a small catalog, emits a `Ready` JSON line to stdout,
//! then reads `DriverCommand` JSON lines from stdin and writes
//! `DriverResponse` lines. The rotation worker runs in the background.

use std::io::Write;
use std::sync::Arc;
use std::time::Duration;

use plaza::{
    config, AuctionEngine, Category, CategoryId, CreateListingInput, ListingFilter, ListingId,
    ListingScope, MemoryStore, Region, RegionId, RotationWorker, SystemTimeProvider, TracingSink,
    User, UserId,
};
use serde::{Deserialize, Serialize};
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

// ── IPC types ────────────────────────────────────────────────────────

#[derive(Serialize)]
struct ReadyEvent {
    event: &'static str,
    regions: Vec<Region>,
    categories: Vec<Category>,
    users: Vec<User>,
}

#[derive(Deserialize)]
#[serde(tag = "cmd")]
enum DriverCommand {
    CreateListing {
        owner: u64,
        region: Option<u64>,
        category: u64,
        scope: ListingScope,
        title: String,
        #[serde(default)]
        description: String,
        start_price: u64,
    },
    PlaceBid {
        listing: u64,
        bidder: u64,
        amount: u64,
    },
    ListListings {
        #[serde(default)]
        filter: ListingFilter,
    },
    ListBids {
        listing: u64,
    },
    Tick,
    Shutdown,
}

#[derive(Serialize)]
#[serde(tag = "status")]
enum DriverResponse {
    Ok { data: Option<serde_json::Value> },
    Err { message: String },
}

// ── Helpers ──────────────────────────────────────────────────────────

fn init_logging_stderr() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(false),
        )
        .init();
}

fn emit_json(value: &impl Serialize) {
    let line = serde_json::to_string(value).expect("JSON serialization failed");
    let mut stdout = std::io::stdout().lock();
    writeln!(stdout, "{}", line).expect("stdout write failed");
    stdout.flush().expect("stdout flush failed");
}

fn rotation_interval() -> Duration {
    std::env::var(config::ROTATION_INTERVAL_ENV)
        .ok()
        .and_then(|raw| raw.parse().ok())
        .map_or(
            Duration::from_secs(config::ROTATION_INTERVAL_SECS),
            Duration::from_secs,
        )
}

type Engine = AuctionEngine<MemoryStore, TracingSink, SystemTimeProvider>;

async fn seed_catalog(store: &MemoryStore) -> ReadyEvent {
    let riverton = store.add_region("Riverton", "riverton").await;
    let lakeside = store.add_region("Lakeside", "lakeside").await;

    let categories = vec![
        store.add_category("Cars & Vehicles", "cars", Some(25), 15).await,
        store.add_category("Property / Rentals", "property", None, 10).await,
        store.add_category("Electronics", "electronics", Some(5), 50).await,
        store.add_category("Furniture", "furniture", Some(5), 30).await,
    ];

    let users = vec![
        store.add_user("ada", Some(riverton.id)).await,
        store.add_user("grace", Some(riverton.id)).await,
        store.add_user("edsger", Some(lakeside.id)).await,
    ];

    ReadyEvent {
        event: "Ready",
        regions: vec![riverton, lakeside],
        categories,
        users,
    }
}

async fn handle_command(
    engine: &Engine,
    command: DriverCommand,
) -> Result<Option<serde_json::Value>, String> {
    match command {
        DriverCommand::CreateListing {
            owner,
            region,
            category,
            scope,
            title,
            description,
            start_price,
        } => {
            let listing = engine
                .create_listing(CreateListingInput {
                    owner: UserId(owner),
                    region: region.map(RegionId),
                    category: CategoryId(category),
                    scope,
                    title,
                    description,
                    start_price,
                    images: Vec::new(),
                })
                .await
                .map_err(|e| e.to_string())?;
            Ok(Some(serde_json::to_value(listing).unwrap()))
        }
        DriverCommand::PlaceBid {
            listing,
            bidder,
            amount,
        } => {
            let snapshot = engine
                .place_bid(ListingId(listing), UserId(bidder), amount)
                .await
                .map_err(|e| e.to_string())?;
            Ok(Some(serde_json::to_value(snapshot).unwrap()))
        }
        DriverCommand::ListListings { filter } => {
            let listings = engine
                .active_listings(&filter)
                .await
                .map_err(|e| e.to_string())?;
            Ok(Some(serde_json::to_value(listings).unwrap()))
        }
        DriverCommand::ListBids { listing } => {
            let bids = engine
                .bids_for_listing(ListingId(listing))
                .await
                .map_err(|e| e.to_string())?;
            Ok(Some(serde_json::to_value(bids).unwrap()))
        }
        DriverCommand::Tick => {
            let report = engine.run_rotation_tick().await.map_err(|e| e.to_string())?;
            Ok(Some(serde_json::to_value(report).unwrap()))
        }
        DriverCommand::Shutdown => Ok(None),
    }
}

// ── Main ─────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    init_logging_stderr();

    let store = MemoryStore::new();
    let ready = seed_catalog(&store).await;

    let engine = Arc::new(AuctionEngine::new(
        store,
        TracingSink::new(),
        SystemTimeProvider::new(),
    ));

    let worker = RotationWorker::with_interval(engine.clone(), rotation_interval());
    let shutdown = worker.shutdown_token();
    let worker_handle = worker.start();

    emit_json(&ready);
    info!("plaza-headless ready");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Ok(Some(line)) = lines.next_line().await {
        let line = line.trim().to_string();
        if line.is_empty() {
            continue;
        }

        let command: DriverCommand = match serde_json::from_str(&line) {
            Ok(command) => command,
            Err(err) => {
                warn!(error = %err, "unparseable command line");
                emit_json(&DriverResponse::Err {
                    message: format!("bad command: {err}"),
                });
                continue;
            }
        };

        let is_shutdown = matches!(command, DriverCommand::Shutdown);
        match handle_command(&engine, command).await {
            Ok(data) => emit_json(&DriverResponse::Ok { data }),
            Err(message) => emit_json(&DriverResponse::Err { message }),
        }

        if is_shutdown {
            break;
        }
    }

    info!("shutting down");
    shutdown.cancel();
    let _ = worker_handle.await;
}
