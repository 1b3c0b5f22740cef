// Command-line interface definitions for barcodeverify
//
// This module is separate so it can be used by both the binary (main.rs)
// and build.rs for generating man pages.

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "barcodeverify")]
#[command(author, version, about = "USB barcode scanner daemon for shipment verification")]
#[command(long_about = "
BarcodeVerify turns a USB barcode scanner into a shipment-verification
station. The daemon reads the scanner at the kernel level, tells scanner
bursts apart from human typing, and records every scanned barcode against
the selected shipment on the BarcodeVerify server.

SETUP:
  1. Add yourself to the input group: sudo usermod -aG input $USER
  2. Log out and back in
  3. Log in to the server: barcodeverify login -u USERNAME
  4. Pick a shipment: barcodeverify shipment list, then shipment select ID
  5. Run: barcodeverify (to start the daemon)

USAGE:
  Scan labels as usual. Accepted scans beep once; duplicates and rejected
  scans play a warning tone and show a desktop notification.
")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<std::path::PathBuf>,

    /// Increase verbosity (-v = debug, -vv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Quiet mode (errors only)
    #[arg(short, long)]
    pub quiet: bool,

    /// Override the API server URL
    #[arg(long, value_name = "URL")]
    pub api_url: Option<String>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as daemon (default if no command specified)
    Daemon {
        /// Scan into this shipment ID instead of the stored selection
        #[arg(long, value_name = "ID")]
        shipment: Option<i64>,

        /// Also accept barcodes typed on stdin, one per line
        #[arg(long)]
        manual: bool,

        /// Do not contact the server; log accepted scans only
        #[arg(long)]
        offline: bool,

        /// Only treat input devices whose name contains NAME as scanners
        #[arg(long, value_name = "NAME")]
        device: Option<String>,

        /// Grab scanner devices so scans do not reach the focused window
        #[arg(long)]
        grab: bool,
    },

    /// Log in and store the session token
    Login {
        /// Account name
        #[arg(short, long)]
        username: String,
    },

    /// Create an account on the server
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        /// Role: user, admin or scanner
        #[arg(long, default_value = "user")]
        role: String,
    },

    /// Forget the stored session
    Logout,

    /// Show the logged-in user and check the token with the server
    Whoami,

    /// Shipments and the active scanning selection
    Shipment {
        #[command(subcommand)]
        action: ShipmentAction,
    },

    /// Transport companies (carriers)
    Transport {
        #[command(subcommand)]
        action: TransportAction,
    },

    /// User administration (administrators only)
    Users {
        #[command(subcommand)]
        action: UsersAction,
    },

    /// Dashboard statistics (administrators only)
    Stats {
        /// Start of the reporting window (RFC 3339)
        #[arg(long, value_name = "DATE")]
        from: Option<String>,

        /// End of the reporting window (RFC 3339)
        #[arg(long, value_name = "DATE")]
        to: Option<String>,

        /// Print the server's shipment report as JSON instead
        #[arg(long)]
        report: bool,
    },

    /// Show current configuration
    Config {
        /// Write the documented default config.toml if none exists
        #[arg(long)]
        init: bool,
    },

    /// Show daemon status (for Waybar/polybar integration)
    Status {
        /// Continuously output status changes
        #[arg(long)]
        follow: bool,

        /// Output format: "text" (default) or "json" (for Waybar)
        #[arg(long, default_value = "text")]
        format: String,
    },
}

#[derive(Subcommand)]
pub enum ShipmentAction {
    /// List shipments (active ones by default)
    List {
        /// Every shipment regardless of status
        #[arg(long, conflicts_with_all = ["completed", "cancelled"])]
        all: bool,

        /// Completed shipments only
        #[arg(long, conflicts_with = "cancelled")]
        completed: bool,

        /// Cancelled shipments only
        #[arg(long)]
        cancelled: bool,
    },

    /// Show one shipment and its scanned products
    Show {
        /// Shipment ID or shipment number
        shipment: String,
    },

    /// Create a shipment
    Create {
        /// Shipment number printed on the paperwork
        #[arg(long)]
        number: String,

        /// Transport company ID
        #[arg(long, value_name = "ID")]
        transport_company: i64,

        /// Estimated departure (RFC 3339)
        #[arg(long, value_name = "DATE")]
        departure: Option<String>,
    },

    /// Start scanning a shipment (by shipment number)
    Start {
        /// Shipment number
        number: String,
    },

    /// Mark a shipment as completed
    Complete {
        /// Shipment ID
        id: i64,
    },

    /// Set a shipment's status directly
    Status {
        /// Shipment ID
        id: i64,

        /// New status: pending, in-progress, completed, cancelled
        status: String,
    },

    /// Cancel a shipment (administrators only)
    Cancel {
        /// Shipment ID
        id: i64,
    },

    /// List the products scanned into a shipment
    Products {
        /// Shipment ID
        id: i64,

        /// Show counts per category instead
        #[arg(long)]
        categories: bool,
    },

    /// Look up a product by barcode
    Product {
        /// Barcode
        barcode: String,
    },

    /// Select the shipment the daemon scans into
    Select {
        /// Shipment ID
        id: i64,
    },

    /// Clear the shipment selection
    Clear,

    /// Search shipments
    Search {
        /// Status: pending, in-progress, completed, cancelled
        #[arg(long)]
        status: Option<String>,

        /// Shipment number (or part of it)
        #[arg(long)]
        number: Option<String>,

        /// Created on or after (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        from: Option<String>,

        /// Created on or before (RFC 3339 or YYYY-MM-DD)
        #[arg(long, value_name = "DATE")]
        to: Option<String>,
    },

    /// Shipment statistics
    Stats,
}

/// Fields of a transport company
#[derive(Args)]
pub struct TransportFields {
    /// Company name
    #[arg(long)]
    pub name: String,

    /// Driver name
    #[arg(long)]
    pub driver: String,

    /// Vehicle license plate
    #[arg(long)]
    pub plate: String,

    /// Contact phone
    #[arg(long)]
    pub phone: String,
}

#[derive(Subcommand)]
pub enum TransportAction {
    /// List transport companies (active ones by default)
    List {
        /// Include inactive companies
        #[arg(long)]
        all: bool,
    },

    /// Show one transport company
    Show {
        /// Company ID
        id: i64,
    },

    /// Register a transport company
    Create {
        #[command(flatten)]
        fields: TransportFields,

        /// Create as administrator (shared with every user)
        #[arg(long)]
        admin: bool,
    },

    /// Update a transport company
    Update {
        /// Company ID
        id: i64,

        #[command(flatten)]
        fields: TransportFields,
    },

    /// Delete a transport company
    Delete {
        /// Company ID
        id: i64,
    },

    /// Activate or deactivate a transport company
    Toggle {
        /// Company ID
        id: i64,
    },

    /// Find transport companies by license plate
    Search {
        /// License plate (or part of it)
        plate: String,
    },
}

#[derive(Subcommand)]
pub enum UsersAction {
    /// List users
    List,

    /// Create a user
    Create {
        #[arg(long)]
        username: String,

        #[arg(long)]
        email: String,

        /// Role: user, admin or scanner
        #[arg(long, default_value = "user")]
        role: String,
    },

    /// Change a user's role
    Role {
        /// User ID
        id: i64,

        /// Role: user, admin or scanner
        role: String,
    },

    /// Re-enable a user account
    Activate {
        /// User ID
        id: i64,
    },

    /// Disable a user account
    Deactivate {
        /// User ID
        id: i64,
    },
}
