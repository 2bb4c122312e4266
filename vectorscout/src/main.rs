//! vscout - match and pit scouting toolkit
//!
//! Command-line front end for the scouting core: resolve diagram taps, list
//! saved records, export and decode transfer-code payloads, list events, and
//! manage match schedules.
//!
//! Uses XDG Base Directory specification for file locations:
//! - Database: $XDG_DATA_HOME/vectorscout/data.db (~/.local/share/vectorscout/data.db)
//! - Schedules: $XDG_DATA_HOME/vectorscout/schedules/
//! - Event catalog: $XDG_DATA_HOME/vectorscout/events.json
//! - Config: $XDG_CONFIG_HOME/vectorscout/config.toml (~/.config/vectorscout/config.toml)

mod record_format;

use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use vectorscout_core::codec::{self, Payload};
use vectorscout_core::config::GeometryConfig;
use vectorscout_core::schedule::{ScheduleCache, ScheduleFetcher, TbaClient};
use vectorscout_core::{
    Config, Database, DiagramSet, EventCatalog, FieldView, MirrorMode, Point, RecordStore,
    RobotDesignation,
};

#[derive(Parser)]
#[command(name = "vscout")]
#[command(about = "Match and pit scouting toolkit for robotics competitions")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Resolve a tap on a field diagram to a zone label
    Zone {
        /// Diagram: start, load, ferry, shoot, grid, or a custom diagram name
        diagram: String,

        /// Horizontal tap position, 0.0 (left) to 1.0 (right)
        x: f64,

        /// Vertical tap position, 0.0 (top) to 1.0 (bottom)
        y: f64,

        /// Designation of the scouted robot
        #[arg(short, long, default_value = "Red1")]
        designation: String,

        /// Field is drawn with the blue alliance on the right
        #[arg(long)]
        blue_right: bool,

        /// Reflect the right-hand tables instead of using the authored left-hand ones
        #[arg(long)]
        derived: bool,
    },

    /// List saved records, most recent first
    List {
        /// List pit records instead of match records
        #[arg(long)]
        pit: bool,

        /// Only match records without a generated transfer code
        #[arg(long, conflicts_with = "pit")]
        pending: bool,

        /// Maximum number of records
        #[arg(short = 'n', long, default_value_t = 20)]
        limit: usize,
    },

    /// Print the transfer-code payload of a saved record
    Payload {
        /// Record ID (see `vscout list`)
        id: i64,

        /// The ID is a pit record
        #[arg(long)]
        pit: bool,

        /// Also write the payload to `<label>.json` in this directory
        #[arg(short, long)]
        out_dir: Option<PathBuf>,
    },

    /// Decode a scanned payload from a file, or stdin when no file is given
    Decode {
        file: Option<PathBuf>,

        /// Save the decoded record to the database
        #[arg(long)]
        save: bool,
    },

    /// List the events in the event catalog, by date
    Events {
        /// Catalog file (defaults to $XDG_DATA_HOME/vectorscout/events.json)
        #[arg(short, long)]
        file: Option<PathBuf>,
    },

    /// Manage match schedules
    Schedule {
        #[command(subcommand)]
        command: ScheduleCommand,
    },
}

#[derive(Subcommand)]
enum ScheduleCommand {
    /// Load an event's schedule from the cache or The Blue Alliance
    Load {
        /// Event key, e.g. 2026miket
        event_code: String,

        /// Display name of the event
        #[arg(long)]
        name: Option<String>,

        /// Fetch again, replacing the cached copy only on success
        #[arg(long)]
        refresh: bool,
    },

    /// Import a TBA-format matches file for an event
    Import {
        file: PathBuf,

        /// Event key, e.g. 2026miket
        event_code: String,
    },

    /// Show the cached schedule of an event
    Show {
        event_code: String,

        /// Only this qualification match
        #[arg(short, long = "match")]
        match_number: Option<u32>,
    },

    /// List events with a cached schedule
    List,

    /// Delete an event's cached schedule
    Delete { event_code: String },
}

fn main() -> Result<()> {
    let args = Args::parse();

    Config::ensure_xdg_env();

    // Load configuration
    let config = Config::load().context("failed to load configuration")?;

    // Initialize logging
    let _log_guard =
        vectorscout_core::logging::init(&config.logging).context("failed to initialize logging")?;

    tracing::debug!("vscout starting up");

    match args.command {
        Command::Zone {
            diagram,
            x,
            y,
            designation,
            blue_right,
            derived,
        } => cmd_zone(&config, &diagram, Point::new(x, y), &designation, blue_right, derived),
        Command::List {
            pit,
            pending,
            limit,
        } => cmd_list(pit, pending, limit),
        Command::Payload { id, pit, out_dir } => cmd_payload(id, pit, out_dir.as_deref()),
        Command::Decode { file, save } => cmd_decode(file.as_deref(), save),
        Command::Events { file } => cmd_events(file),
        Command::Schedule { command } => cmd_schedule(&config, command),
    }
}

fn open_database() -> Result<Database> {
    let db_path = Config::database_path();
    tracing::info!(path = %db_path.display(), "Opening database");

    let db = Database::open(&db_path).context("failed to open database")?;
    db.migrate().context("failed to run database migrations")?;
    Ok(db)
}

fn cmd_zone(
    config: &Config,
    diagram: &str,
    point: Point,
    designation: &str,
    blue_right: bool,
    derived: bool,
) -> Result<()> {
    let designation: RobotDesignation = designation
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let geometry = GeometryConfig {
        mirror_mode: if derived {
            MirrorMode::Derived
        } else {
            config.geometry.mirror_mode
        },
        diagram_dir: config.geometry.diagram_dir.clone(),
    };
    let diagrams = DiagramSet::from_config(&geometry).context("failed to load diagrams")?;
    let diagram = diagrams
        .find(diagram)
        .with_context(|| format!("unknown diagram '{}'", diagram))?;

    let view = FieldView::new(designation.alliance(), blue_right);
    match diagram.resolve(point, view) {
        Some(label) => println!("{}", label),
        None => println!("no zone"),
    }
    Ok(())
}

fn cmd_list(pit: bool, pending: bool, limit: usize) -> Result<()> {
    let db = open_database()?;

    let rows: Vec<String> = if pit {
        db.list_pit_scouts(limit)?
            .iter()
            .map(record_format::pit_row)
            .collect()
    } else if pending {
        db.pending_transfer()?
            .iter()
            .take(limit)
            .map(record_format::match_row)
            .collect()
    } else {
        db.list_match_scouts(limit)?
            .iter()
            .map(record_format::match_row)
            .collect()
    };

    if rows.is_empty() {
        println!("No records found.");
        return Ok(());
    }
    for row in rows {
        println!("{}", row);
    }
    Ok(())
}

fn cmd_payload(id: i64, pit: bool, out_dir: Option<&Path>) -> Result<()> {
    let db = open_database()?;

    let (label, payload) = if pit {
        let data = db
            .get_pit_scout(id)?
            .with_context(|| format!("no pit record with id {}", id))?;
        (codec::pit_transfer_label(&data), codec::encode_pit(&data)?)
    } else {
        let data = db
            .get_match_scout(id)?
            .with_context(|| format!("no match record with id {}", id))?;
        (codec::match_transfer_label(&data), codec::encode_match(&data)?)
    };

    let fits = codec::fits_transfer_code(&payload);
    if !fits {
        eprintln!(
            "warning: payload is {} bytes, more than a transfer code holds ({} bytes)",
            payload.len(),
            codec::TRANSFER_CODE_CAPACITY
        );
    }

    if let Some(dir) = out_dir {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("failed to create {}", dir.display()))?;
        let path = dir.join(format!("{}.json", label));
        std::fs::write(&path, &payload)
            .with_context(|| format!("failed to write {}", path.display()))?;
        eprintln!("Wrote {}", path.display());
    }

    if !pit && fits {
        db.mark_transfer_generated(id)
            .context("failed to mark record as transferred")?;
    } else if !pit {
        tracing::warn!(id, bytes = payload.len(), "payload too large, record left pending");
        eprintln!("Record {} stays pending until its payload fits a transfer code", id);
    }

    println!("{}", payload);
    Ok(())
}

fn cmd_decode(file: Option<&Path>, save: bool) -> Result<()> {
    let text = match file {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("failed to read stdin")?;
            text
        }
    };

    let decoded = codec::decode(text.trim()).context("failed to decode payload")?;
    for warning in &decoded.warnings {
        eprintln!("warning: {}", warning);
    }

    let lines = match &decoded.value {
        Payload::Match(data) => {
            println!("Match payload");
            record_format::match_detail(data)
        }
        Payload::Pit(data) => {
            println!("Pit payload");
            record_format::pit_detail(data)
        }
    };
    for line in lines {
        println!("  {}", line);
    }

    if save {
        let db = open_database()?;
        let id = match &decoded.value {
            Payload::Match(data) => db.insert_match_scout(data)?,
            Payload::Pit(data) => db.insert_pit_scout(data)?,
        };
        println!("Saved as record {}", id);
    }
    Ok(())
}

fn cmd_events(file: Option<PathBuf>) -> Result<()> {
    let mut catalog = EventCatalog::new(file.unwrap_or_else(Config::events_path));
    let events = catalog
        .events()
        .with_context(|| format!("failed to load {}", catalog.path().display()))?;

    if events.is_empty() {
        println!("No events found.");
    }
    for event in events.iter() {
        println!(
            "{:<10}  {:<12}  {}",
            event.date, event.event_code, event.event_name
        );
    }
    Ok(())
}

fn cmd_schedule(config: &Config, command: ScheduleCommand) -> Result<()> {
    let dir = Config::schedule_cache_dir();

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to create runtime")?;

    match command {
        ScheduleCommand::Load {
            event_code,
            name,
            refresh,
        } => {
            let name = name.unwrap_or_else(|| event_code.clone());
            match TbaClient::new(config.schedule.clone()) {
                Ok(client) => load_schedule(
                    &runtime,
                    ScheduleCache::new(&dir, client),
                    &event_code,
                    &name,
                    refresh,
                ),
                Err(e) => {
                    tracing::info!(error = %e, "Schedule client unavailable, using cache only");
                    load_schedule(
                        &runtime,
                        ScheduleCache::offline(&dir),
                        &event_code,
                        &name,
                        refresh,
                    )
                }
            }
        }
        ScheduleCommand::Import { file, event_code } => {
            let mut cache = ScheduleCache::offline(&dir);
            let outcome = cache
                .import_file(&file, &event_code, &event_code)
                .with_context(|| format!("failed to import {}", file.display()))?;
            println!("{}", outcome.message());
            Ok(())
        }
        ScheduleCommand::Show {
            event_code,
            match_number,
        } => {
            let mut cache = ScheduleCache::offline(&dir);
            runtime
                .block_on(cache.get_or_load(&event_code, &event_code))
                .with_context(|| format!("no cached schedule for {}", event_code))?;
            let Some(schedule) = cache.current() else {
                anyhow::bail!("no cached schedule for {}", event_code);
            };

            let matches: Vec<_> = schedule
                .matches
                .iter()
                .filter(|m| match_number.map_or(true, |n| m.match_number == n))
                .collect();
            if matches.is_empty() {
                anyhow::bail!("no such match in {}", event_code);
            }
            for m in matches {
                println!(
                    "Q{:<4} Red: {:>5} {:>5} {:>5}   Blue: {:>5} {:>5} {:>5}",
                    m.match_number, m.red1, m.red2, m.red3, m.blue1, m.blue2, m.blue3
                );
            }
            Ok(())
        }
        ScheduleCommand::List => {
            let cache = ScheduleCache::offline(&dir);
            let events = cache.cached_events()?;
            if events.is_empty() {
                println!("No cached schedules.");
            }
            for event in events {
                println!("{}", event);
            }
            Ok(())
        }
        ScheduleCommand::Delete { event_code } => {
            let mut cache = ScheduleCache::offline(&dir);
            cache.delete_cached(&event_code)?;
            println!("Deleted cached schedule for {}", event_code);
            Ok(())
        }
    }
}

fn load_schedule<F: ScheduleFetcher>(
    runtime: &tokio::runtime::Runtime,
    mut cache: ScheduleCache<F>,
    event_code: &str,
    event_name: &str,
    refresh: bool,
) -> Result<()> {
    let outcome = if refresh {
        runtime
            .block_on(cache.refresh(event_code, event_name))
            .with_context(|| {
                format!(
                    "failed to refresh schedule for {}, cached copy kept",
                    event_code
                )
            })?
    } else {
        runtime
            .block_on(cache.get_or_load(event_code, event_name))
            .with_context(|| format!("failed to load schedule for {}", event_code))?
    };
    println!("{}", outcome.message());
    Ok(())
}
