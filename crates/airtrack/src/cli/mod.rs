//! Command-line interface for airtrack.
//!
//! This module provides the CLI structure and command handlers for the
//! `airtrack` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, CreateFlightCommand, CreateShipmentCommand, FlightCommand, ShipmentCommand,
    StatusArg, StatusCommand, TrackCommand, UpdateFlightCommand, UpdateShipmentCommand,
};

/// airtrack - Shipment and flight tracking
///
/// Manages shipment records with full status history, flight schedules with
/// shipment assignments, and a live tracking view that simulates status
/// progression.
#[derive(Debug, Parser)]
#[command(name = "airtrack")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage shipments
    #[command(subcommand)]
    Shipment(ShipmentCommand),

    /// Manage flights and assignments
    #[command(subcommand)]
    Flight(FlightCommand),

    /// Follow a shipment by tracking code
    Track(TrackCommand),

    /// Show store status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_name() {
        let cli = Cli::command();
        assert_eq!(cli.get_name(), "airtrack");
    }

    #[test]
    fn test_cli_verify() {
        // Verify the CLI structure is valid
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_quiet() {
        let cli = Cli {
            config: None,
            verbose: 0,
            quiet: true,
            command: Command::Status(StatusCommand { json: false }),
        };
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Quiet);
    }

    #[test]
    fn test_verbosity_normal() {
        let cli = Cli {
            config: None,
            verbose: 0,
            quiet: false,
            command: Command::Status(StatusCommand { json: false }),
        };
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Normal);
    }

    #[test]
    fn test_verbosity_verbose() {
        let cli = Cli {
            config: None,
            verbose: 1,
            quiet: false,
            command: Command::Status(StatusCommand { json: false }),
        };
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Verbose);
    }

    #[test]
    fn test_verbosity_trace() {
        let cli = Cli {
            config: None,
            verbose: 2,
            quiet: false,
            command: Command::Status(StatusCommand { json: false }),
        };
        assert_eq!(cli.verbosity(), crate::logging::Verbosity::Trace);
    }

    #[test]
    fn test_parse_shipment_list() {
        let args = vec!["airtrack", "shipment", "list"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Shipment(ShipmentCommand::List { .. })
        ));
    }

    #[test]
    fn test_parse_shipment_create() {
        let args = vec![
            "airtrack",
            "shipment",
            "create",
            "--sender",
            "Warehouse",
            "--recipient",
            "Store",
            "--origin",
            "LHR",
            "--destination",
            "JFK",
            "--weight",
            "12.5",
        ];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Shipment(ShipmentCommand::Create(cmd)) = cli.command else {
            panic!("expected shipment create");
        };
        assert_eq!(cmd.sender, "Warehouse");
        assert!((cmd.weight - 12.5).abs() < f64::EPSILON);
        assert!(cmd.code.is_none());
    }

    #[test]
    fn test_parse_shipment_set_status() {
        let args = vec!["airtrack", "shipment", "set-status", "abc", "in-transit"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(matches!(
            cli.command,
            Command::Shipment(ShipmentCommand::SetStatus {
                status: StatusArg::InTransit,
                ..
            })
        ));
    }

    #[test]
    fn test_parse_flight_assign() {
        let args = vec!["airtrack", "flight", "assign", "ship-1", "flight-1"];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Flight(FlightCommand::Assign { shipment, flight }) = cli.command else {
            panic!("expected flight assign");
        };
        assert_eq!(shipment, "ship-1");
        assert_eq!(flight, "flight-1");
    }

    #[test]
    fn test_parse_track() {
        let args = vec!["airtrack", "track", "HM-1A2B3C", "--interval", "2"];
        let cli = Cli::try_parse_from(args).unwrap();
        let Command::Track(cmd) = cli.command else {
            panic!("expected track");
        };
        assert_eq!(cmd.code, "HM-1A2B3C");
        assert_eq!(cmd.interval, Some(2));
        assert!(!cmd.no_simulate);
    }

    #[test]
    fn test_parse_with_config() {
        let args = vec!["airtrack", "-c", "/custom/config.toml", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }

    #[test]
    fn test_parse_with_verbose() {
        let args = vec!["airtrack", "-v", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert_eq!(cli.verbose, 1);
    }

    #[test]
    fn test_parse_with_quiet() {
        let args = vec!["airtrack", "-q", "status"];
        let cli = Cli::try_parse_from(args).unwrap();
        assert!(cli.quiet);
    }
}
