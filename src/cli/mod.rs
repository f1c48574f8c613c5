// ============================================================================
// Command-Line Interface
// ============================================================================

mod disable;
mod get;
mod list;
mod set;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use sysproxy::core::Result;
use sysproxy::manager::ProxyManager;
use sysproxy::store::FileStore;

/// Manage per-interface system proxy settings.
#[derive(Parser)]
#[command(
    name = "sysproxy",
    version,
    about = "A command-line tool for managing system proxy settings.",
    long_about = "sysproxy provides commands to view and modify system proxy settings\n\
                  for network interfaces.\n\n\
                  Note: modifying proxy settings may require elevated privileges."
)]
pub struct Cli {
    /// Path to the configuration store state file
    /// (defaults to SYSPROXY_STORE or the system location)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand)]
pub enum Command {
    /// Get current proxy configuration for a network interface
    Get(get::GetArgs),

    /// Set proxy configuration for a network interface
    #[command(subcommand)]
    Set(set::SetCommand),

    /// List all available network interfaces
    List(list::ListArgs),

    /// Disable all proxies for a network interface
    Disable(disable::DisableArgs),
}

impl Cli {
    fn manager(&self) -> ProxyManager<FileStore> {
        let store = match &self.store {
            Some(path) => FileStore::new(path.clone()),
            None => FileStore::at_default_location(),
        };
        ProxyManager::new(store)
    }

    /// Execute the parsed command. Defaults to `list` when no
    /// subcommand is given.
    pub async fn run(self) -> Result<()> {
        let manager = self.manager();
        match self.command {
            Some(Command::Get(args)) => get::run(&manager, args).await,
            Some(Command::Set(command)) => set::run(&manager, command).await,
            Some(Command::Disable(args)) => disable::run(&manager, args).await,
            Some(Command::List(args)) => list::run(&manager, args).await,
            None => list::run(&manager, list::ListArgs::default()).await,
        }
    }
}
