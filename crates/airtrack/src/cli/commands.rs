//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::model::ShipmentStatus;

/// Shipment management commands.
#[derive(Debug, Subcommand)]
pub enum ShipmentCommand {
    /// List shipments
    List {
        /// Filter by search term (matches sender, recipient, code)
        #[arg(short, long, default_value = "")]
        search: String,

        /// Filter by status
        #[arg(long, value_enum)]
        status: Option<StatusArg>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show a single shipment by id or tracking code
    Show {
        /// Shipment id or tracking code
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Create a shipment
    Create(CreateShipmentCommand),

    /// Update all fields of a shipment
    Update(UpdateShipmentCommand),

    /// Move a shipment to a new status
    SetStatus {
        /// Shipment id
        id: String,

        /// The new status
        #[arg(value_enum)]
        status: StatusArg,
    },

    /// Delete a shipment
    Delete {
        /// Shipment id
        id: String,
    },

    /// Generate an unused tracking code
    GenCode,
}

/// Create-shipment arguments.
#[derive(Debug, Args)]
pub struct CreateShipmentCommand {
    /// Sender name
    #[arg(long)]
    pub sender: String,

    /// Recipient name
    #[arg(long)]
    pub recipient: String,

    /// Origin location
    #[arg(long)]
    pub origin: String,

    /// Destination location
    #[arg(long)]
    pub destination: String,

    /// Weight in kilograms
    #[arg(long)]
    pub weight: f64,

    /// Tracking code (generated when omitted)
    #[arg(long)]
    pub code: Option<String>,

    /// Initial status
    #[arg(long, value_enum)]
    pub status: Option<StatusArg>,

    /// Flight id to assign at creation
    #[arg(long)]
    pub flight: Option<String>,
}

/// Update-shipment arguments. Every field is replaced.
#[derive(Debug, Args)]
pub struct UpdateShipmentCommand {
    /// Shipment id
    pub id: String,

    /// Sender name
    #[arg(long)]
    pub sender: String,

    /// Recipient name
    #[arg(long)]
    pub recipient: String,

    /// Origin location
    #[arg(long)]
    pub origin: String,

    /// Destination location
    #[arg(long)]
    pub destination: String,

    /// Weight in kilograms
    #[arg(long)]
    pub weight: f64,

    /// Tracking code
    #[arg(long)]
    pub code: String,

    /// Status
    #[arg(long, value_enum)]
    pub status: StatusArg,

    /// Flight id to link (omit to unlink)
    #[arg(long)]
    pub flight: Option<String>,
}

/// Flight management commands.
#[derive(Debug, Subcommand)]
pub enum FlightCommand {
    /// List flights
    List {
        /// Only flights currently in the air
        #[arg(short, long)]
        active: bool,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show a single flight
    Show {
        /// Flight id
        id: String,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Create a flight
    Create(CreateFlightCommand),

    /// Update a flight's fields
    Update(UpdateFlightCommand),

    /// Delete a flight
    Delete {
        /// Flight id
        id: String,
    },

    /// Put a shipment on a flight
    Assign {
        /// Shipment id
        shipment: String,

        /// Flight id
        flight: String,
    },

    /// Take a shipment off a flight
    Unassign {
        /// Shipment id
        shipment: String,

        /// Flight id
        flight: String,
    },
}

/// Create-flight arguments.
#[derive(Debug, Args)]
pub struct CreateFlightCommand {
    /// Flight number, e.g. HM412
    #[arg(long)]
    pub number: String,

    /// Origin location code
    #[arg(long)]
    pub origin: String,

    /// Destination location code
    #[arg(long)]
    pub destination: String,

    /// Estimated departure (RFC 3339, e.g. 2026-08-24T14:00:00Z)
    #[arg(long)]
    pub etd: String,

    /// Estimated arrival (RFC 3339)
    #[arg(long)]
    pub eta: String,
}

/// Update-flight arguments. Every field is replaced; the assignment set
/// changes only through assign/unassign.
#[derive(Debug, Args)]
pub struct UpdateFlightCommand {
    /// Flight id
    pub id: String,

    /// Flight number
    #[arg(long)]
    pub number: String,

    /// Origin location code
    #[arg(long)]
    pub origin: String,

    /// Destination location code
    #[arg(long)]
    pub destination: String,

    /// Estimated departure (RFC 3339)
    #[arg(long)]
    pub etd: String,

    /// Estimated arrival (RFC 3339)
    #[arg(long)]
    pub eta: String,
}

/// Track command arguments.
#[derive(Debug, Args)]
pub struct TrackCommand {
    /// The tracking code to follow
    pub code: String,

    /// Poll interval in seconds (overrides configuration)
    #[arg(short, long)]
    pub interval: Option<u64>,

    /// Show the current state once without simulating transitions
    #[arg(long)]
    pub no_simulate: bool,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Shipment status argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum StatusArg {
    /// Awaiting assignment or departure
    Pending,
    /// On its way
    InTransit,
    /// Arrived at the recipient
    Delivered,
}

impl From<StatusArg> for ShipmentStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Pending => Self::Pending,
            StatusArg::InTransit => Self::InTransit,
            StatusArg::Delivered => Self::Delivered,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_arg_conversion() {
        assert_eq!(
            ShipmentStatus::from(StatusArg::Pending),
            ShipmentStatus::Pending
        );
        assert_eq!(
            ShipmentStatus::from(StatusArg::InTransit),
            ShipmentStatus::InTransit
        );
        assert_eq!(
            ShipmentStatus::from(StatusArg::Delivered),
            ShipmentStatus::Delivered
        );
    }

    #[test]
    fn test_shipment_command_debug() {
        let cmd = ShipmentCommand::Delete {
            id: "abc".to_string(),
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Delete"));
        assert!(debug_str.contains("abc"));
    }

    #[test]
    fn test_track_command_debug() {
        let cmd = TrackCommand {
            code: "HM-1A2B3C".to_string(),
            interval: Some(2),
            no_simulate: false,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("HM-1A2B3C"));
        assert!(debug_str.contains("interval"));
    }

    #[test]
    fn test_status_command_debug() {
        let cmd = StatusCommand { json: true };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("json"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("Show"));
    }

    #[test]
    fn test_status_arg_clone() {
        let arg = StatusArg::InTransit;
        let cloned = arg;
        assert_eq!(arg, cloned);
    }
}
