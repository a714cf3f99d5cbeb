//! Command-line interface definitions and parsing

use bleadv_bluez::Backend;
use bleadv_core::AdvertisingType;
use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<String>,
}

impl Cli {
    /// The command to run; advertising when none was given
    pub fn command(&self) -> Commands {
        self.command
            .clone()
            .unwrap_or_else(|| Commands::Advertise(Overrides::default()))
    }
}

#[derive(Subcommand, Clone, Debug)]
pub enum Commands {
    /// Register the advertisement and keep it up until interrupted
    ///
    /// Exits with a non-zero status when the daemon rejects the registration
    /// instead of waiting for a disconnect that cannot come.
    Advertise(Overrides),
    /// List adapters that support LE advertising
    Adapters,
    /// Unregister a previously registered advertisement and exit
    Unregister(Overrides),
    /// Print the advertisement that would be registered
    Show {
        /// Print as JSON
        #[arg(long)]
        json: bool,

        #[command(flatten)]
        overrides: Overrides,
    },
    /// Print an example configuration file
    ExampleConfig,
}

impl Commands {
    pub fn overrides(&self) -> Option<&Overrides> {
        match self {
            Self::Advertise(overrides) | Self::Unregister(overrides) => Some(overrides),
            Self::Show { overrides, .. } => Some(overrides),
            Self::Adapters | Self::ExampleConfig => None,
        }
    }
}

/// Per-invocation overrides of the configuration
#[derive(Args, Clone, Debug, Default)]
pub struct Overrides {
    /// Adapter name (hci0) or object path
    #[arg(short, long)]
    pub adapter: Option<String>,

    /// Object path to export the advertisement at
    #[arg(short, long)]
    pub path: Option<String>,

    /// Local name to advertise
    #[arg(short, long)]
    pub name: Option<String>,

    /// Advertising type: broadcast or peripheral
    #[arg(short = 't', long = "type", value_name = "TYPE")]
    pub advertising_type: Option<AdvertisingType>,

    /// Service UUID to advertise (repeatable, replaces the configured list)
    #[arg(short = 's', long = "service-uuid", value_name = "UUID")]
    pub service_uuids: Vec<String>,

    /// Manufacturer data as COMPANY_ID:HEX, e.g. 0x0123:0102030405 (repeatable)
    #[arg(short = 'm', long = "manufacturer-data", value_name = "ID:HEX")]
    pub manufacturer_data: Vec<String>,

    /// Advertising backend: dbus or bluer
    #[arg(short, long)]
    pub backend: Option<Backend>,

    /// Skip unregistering a stale advertisement before registering
    #[arg(long)]
    pub no_unregister_stale: bool,
}
