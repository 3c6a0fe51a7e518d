//! `airtrack` - CLI for shipment and flight tracking
//!
//! This binary provides the command-line interface for managing shipments,
//! flights, and the live tracking view.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::sync::{Arc, Mutex};

use anyhow::Context;
use chrono::{DateTime, Utc};
use clap::Parser;

use airtrack::cli::{
    Cli, Command, ConfigCommand, FlightCommand, ShipmentCommand, StatusCommand, TrackCommand,
};
use airtrack::flights::{FlightManager, FlightUpdate, NewFlight};
use airtrack::model::{Flight, Shipment};
use airtrack::shipments::{NewShipment, ShipmentManager, ShipmentUpdate};
use airtrack::tracker::{StopReason, Tick, Tracker};
use airtrack::{init_logging, Config, Store};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Initialize logging based on verbosity
    init_logging(cli.verbosity());

    // Load configuration
    let config = Config::load_from(cli.config.clone())?;

    // Config commands don't need the store
    match cli.command {
        Command::Config(config_cmd) => handle_config(&config, config_cmd),
        command => {
            let store = Store::open(config.database_path())?;
            if config.seed.enabled {
                store.seed_if_empty()?;
            }
            let store = Arc::new(Mutex::new(store));
            let shipments = ShipmentManager::new(Arc::clone(&store));
            let flights = FlightManager::new(Arc::clone(&store));

            match command {
                Command::Shipment(cmd) => handle_shipment(&shipments, cmd),
                Command::Flight(cmd) => handle_flight(&shipments, &flights, cmd),
                Command::Track(cmd) => handle_track(&config, shipments, cmd).await,
                Command::Status(cmd) => handle_status(&config, &store, &shipments, &flights, &cmd),
                Command::Config(_) => unreachable!(),
            }
        }
    }
}

fn handle_shipment(manager: &ShipmentManager, cmd: ShipmentCommand) -> anyhow::Result<()> {
    match cmd {
        ShipmentCommand::List {
            search,
            status,
            json,
        } => {
            let results = manager.search(&search, status.map(Into::into))?;
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No shipments found.");
            } else {
                for shipment in &results {
                    print_shipment_line(shipment);
                }
            }
        }
        ShipmentCommand::Show { id, json } => {
            // Accept either an id or a tracking code
            let found = match manager.find_by_id(&id)? {
                Some(shipment) => Some(shipment),
                None => manager.find_by_code(&id)?,
            };
            let Some(shipment) = found else {
                println!("No shipment found for \"{id}\".");
                return Ok(());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&shipment)?);
            } else {
                print_shipment_detail(&shipment);
            }
        }
        ShipmentCommand::Create(cmd) => {
            let created = manager.create(NewShipment {
                sender: cmd.sender,
                recipient: cmd.recipient,
                origin: cmd.origin,
                destination: cmd.destination,
                weight: cmd.weight,
                code: cmd.code,
                status: cmd.status.map(Into::into),
                flight_id: cmd.flight,
            })?;
            println!("Created shipment {} ({})", created.code, created.id);
        }
        ShipmentCommand::Update(cmd) => {
            let updated = manager.update(
                &cmd.id,
                ShipmentUpdate {
                    sender: cmd.sender,
                    recipient: cmd.recipient,
                    origin: cmd.origin,
                    destination: cmd.destination,
                    weight: cmd.weight,
                    code: cmd.code,
                    status: cmd.status.into(),
                    flight_id: cmd.flight,
                },
            )?;
            match updated {
                Some(shipment) => println!("Updated shipment {}", shipment.code),
                None => println!("No shipment with id \"{}\".", cmd.id),
            }
        }
        ShipmentCommand::SetStatus { id, status } => {
            match manager.update_status(&id, status.into())? {
                Some(shipment) => {
                    println!("Shipment {} is now {}", shipment.code, shipment.status);
                }
                None => println!("No shipment with id \"{id}\"."),
            }
        }
        ShipmentCommand::Delete { id } => {
            if manager.delete(&id)? {
                println!("Deleted shipment {id}");
            } else {
                println!("No shipment with id \"{id}\".");
            }
        }
        ShipmentCommand::GenCode => {
            println!("{}", manager.allocate_code()?);
        }
    }
    Ok(())
}

fn handle_flight(
    shipments: &ShipmentManager,
    manager: &FlightManager,
    cmd: FlightCommand,
) -> anyhow::Result<()> {
    match cmd {
        FlightCommand::List { active, json } => {
            let results = if active {
                manager.active(Utc::now())?
            } else {
                manager.list()?
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&results)?);
            } else if results.is_empty() {
                println!("No flights found.");
            } else {
                for flight in &results {
                    print_flight_line(flight);
                }
            }
        }
        FlightCommand::Show { id, json } => {
            let Some(flight) = manager.find_by_id(&id)? else {
                println!("No flight with id \"{id}\".");
                return Ok(());
            };
            if json {
                println!("{}", serde_json::to_string_pretty(&flight)?);
            } else {
                print_flight_detail(&flight, shipments)?;
            }
        }
        FlightCommand::Create(cmd) => {
            let created = manager.create(NewFlight {
                number: cmd.number,
                origin: cmd.origin,
                destination: cmd.destination,
                etd: parse_datetime(&cmd.etd)?,
                eta: parse_datetime(&cmd.eta)?,
            })?;
            println!("Created flight {} ({})", created.number, created.id);
        }
        FlightCommand::Update(cmd) => {
            let updated = manager.update(
                &cmd.id,
                FlightUpdate {
                    number: cmd.number,
                    origin: cmd.origin,
                    destination: cmd.destination,
                    etd: parse_datetime(&cmd.etd)?,
                    eta: parse_datetime(&cmd.eta)?,
                },
            )?;
            match updated {
                Some(flight) => println!("Updated flight {}", flight.number),
                None => println!("No flight with id \"{}\".", cmd.id),
            }
        }
        FlightCommand::Delete { id } => {
            if manager.delete(&id)? {
                println!("Deleted flight {id}");
            } else {
                println!("No flight with id \"{id}\".");
            }
        }
        FlightCommand::Assign { shipment, flight } => {
            if manager.assign(&shipment, &flight)? {
                println!("Assigned shipment {shipment} to flight {flight}");
            } else {
                println!("Unknown shipment or flight id; nothing assigned.");
            }
        }
        FlightCommand::Unassign { shipment, flight } => {
            if manager.unassign(&shipment, &flight)? {
                println!("Removed shipment {shipment} from flight {flight}");
            } else {
                println!("Unknown shipment or flight id; nothing removed.");
            }
        }
    }
    Ok(())
}

async fn handle_track(
    config: &Config,
    shipments: ShipmentManager,
    cmd: TrackCommand,
) -> anyhow::Result<()> {
    let simulate = !cmd.no_simulate && config.tracking.simulate;
    let interval = cmd
        .interval
        .map_or_else(|| config.poll_interval(), std::time::Duration::from_secs);

    let mut tracker = Tracker::new(shipments, simulate);
    let Some(shipment) = tracker.submit(&cmd.code)? else {
        println!("No shipment found for tracking code \"{}\".", cmd.code);
        return Ok(());
    };
    print_shipment_detail(&shipment);

    if !simulate {
        return Ok(());
    }

    println!();
    println!("Simulating status updates every {}s (Ctrl-C to stop)...", interval.as_secs());

    let handle = tracker.handle();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            handle.stop();
        }
    });

    tracker
        .run(interval, |tick| match tick {
            Tick::Advanced(shipment) => {
                println!("[{}] {} -> {}", Utc::now().format("%H:%M:%S"), shipment.code, shipment.status);
            }
            Tick::Stopped(StopReason::Delivered) => {
                println!("Shipment delivered. Tracking stopped.");
            }
            Tick::Stopped(StopReason::Vanished) => {
                println!("Shipment no longer exists. Tracking stopped.");
            }
            Tick::Skipped => {}
        })
        .await?;

    Ok(())
}

fn handle_status(
    config: &Config,
    store: &Arc<Mutex<Store>>,
    shipments: &ShipmentManager,
    flights: &FlightManager,
    cmd: &StatusCommand,
) -> anyhow::Result<()> {
    let stats = store
        .lock()
        .map_err(|_| anyhow::anyhow!("store lock poisoned"))?
        .stats()?;

    let all_shipments = shipments.list()?;
    let count_with = |status: airtrack::ShipmentStatus| {
        all_shipments.iter().filter(|s| s.status == status).count()
    };
    let pending = count_with(airtrack::ShipmentStatus::Pending);
    let in_transit = count_with(airtrack::ShipmentStatus::InTransit);
    let delivered = count_with(airtrack::ShipmentStatus::Delivered);
    let active_flights = flights.active(Utc::now())?.len();

    // The 10 most recent status transitions across all shipments
    let mut events: Vec<(&str, &airtrack::HistoryEntry)> = all_shipments
        .iter()
        .flat_map(|s| s.history.iter().map(move |e| (s.code.as_str(), e)))
        .collect();
    events.sort_by(|a, b| b.1.at.cmp(&a.1.at));
    events.truncate(10);

    if cmd.json {
        let recent: Vec<serde_json::Value> = events
            .iter()
            .map(|(code, entry)| {
                serde_json::json!({
                    "code": code,
                    "status": entry.status,
                    "at": entry.at,
                })
            })
            .collect();
        let status = serde_json::json!({
            "database_path": config.database_path(),
            "shipments": stats.shipments,
            "pending": pending,
            "in_transit": in_transit,
            "delivered": delivered,
            "flights": stats.flights,
            "active_flights": active_flights,
            "db_size_bytes": stats.db_size_bytes,
            "recent_events": recent,
        });
        println!("{}", serde_json::to_string_pretty(&status)?);
    } else {
        println!("airtrack status");
        println!("---------------");
        println!("Database:        {}", config.database_path().display());
        println!("Shipments:       {}", stats.shipments);
        println!("  Pending:       {pending}");
        println!("  In transit:    {in_transit}");
        println!("  Delivered:     {delivered}");
        println!("Flights:         {}", stats.flights);
        println!("  Active now:    {active_flights}");
        println!("DB size:         {} bytes", stats.db_size_bytes);
        if !events.is_empty() {
            println!();
            println!("Recent activity:");
            for (code, entry) in &events {
                println!("  {}  {}  {}", entry.at.format("%Y-%m-%d %H:%M"), code, entry.status);
            }
        }
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: ConfigCommand) -> anyhow::Result<()> {
    match cmd {
        ConfigCommand::Show { json } => {
            if json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                println!("[Storage]");
                println!("  Database path:  {}", config.database_path().display());
                println!();
                println!("[Tracking]");
                println!("  Poll interval:  {}s", config.tracking.poll_interval_secs);
                println!("  Simulate:       {}", config.tracking.simulate);
                println!();
                println!("[Seed]");
                println!("  Enabled:        {}", config.seed.enabled);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}

fn parse_datetime(value: &str) -> anyhow::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .with_context(|| format!("invalid timestamp \"{value}\" (expected RFC 3339)"))
}

fn print_shipment_line(shipment: &Shipment) {
    println!(
        "{}  {:<10}  {} -> {}  {:.1} kg{}",
        shipment.code,
        shipment.status.to_string(),
        shipment.origin,
        shipment.destination,
        shipment.weight,
        shipment
            .flight_id
            .as_deref()
            .map(|id| format!("  [flight {id}]"))
            .unwrap_or_default(),
    );
}

fn print_shipment_detail(shipment: &Shipment) {
    println!("Shipment {}", shipment.code);
    println!("  Id:           {}", shipment.id);
    println!("  Status:       {}", shipment.status);
    println!("  From:         {} ({})", shipment.sender, shipment.origin);
    println!(
        "  To:           {} ({})",
        shipment.recipient, shipment.destination
    );
    println!("  Weight:       {:.1} kg", shipment.weight);
    println!(
        "  Flight:       {}",
        shipment.flight_id.as_deref().unwrap_or("none")
    );
    println!("  Created:      {}", shipment.created_at.to_rfc3339());
    println!("  History:");
    for entry in &shipment.history {
        println!("    {}  {}", entry.at.to_rfc3339(), entry.status);
    }
}

fn print_flight_line(flight: &Flight) {
    println!(
        "{}  {} -> {}  dep {}  arr {}  ({} shipments)",
        flight.number,
        flight.origin,
        flight.destination,
        flight.etd.format("%Y-%m-%d %H:%M"),
        flight.eta.format("%Y-%m-%d %H:%M"),
        flight.assigned_shipment_ids.len(),
    );
}

fn print_flight_detail(flight: &Flight, shipments: &ShipmentManager) -> anyhow::Result<()> {
    println!("Flight {}", flight.number);
    println!("  Id:           {}", flight.id);
    println!("  Route:        {} -> {}", flight.origin, flight.destination);
    println!("  Departure:    {}", flight.etd.to_rfc3339());
    println!("  Arrival:      {}", flight.eta.to_rfc3339());
    if flight.assigned_shipment_ids.is_empty() {
        println!("  Shipments:    none");
    } else {
        println!("  Shipments:");
        for shipment_id in &flight.assigned_shipment_ids {
            match shipments.find_by_id(shipment_id)? {
                Some(shipment) => {
                    println!("    {}  {}  {}", shipment.code, shipment.status, shipment_id);
                }
                None => println!("    (missing)  {shipment_id}"),
            }
        }
    }
    Ok(())
}
