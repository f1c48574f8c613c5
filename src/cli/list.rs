use clap::Args;

use sysproxy::core::Result;
use sysproxy::manager::ProxyManager;
use sysproxy::store::ConfigStore;

#[derive(Args, Default)]
pub struct ListArgs {
    /// Show only enabled interfaces
    #[arg(short, long)]
    pub enabled_only: bool,

    /// Show detailed interface information
    #[arg(short, long)]
    pub verbose: bool,
}

pub async fn run<S: ConfigStore>(manager: &ProxyManager<S>, args: ListArgs) -> Result<()> {
    let interfaces = manager.interfaces_info().await?;
    let filtered: Vec<_> = interfaces
        .into_iter()
        .filter(|info| !args.enabled_only || info.enabled)
        .collect();

    if filtered.is_empty() {
        println!("No network interfaces found.");
        return Ok(());
    }

    if args.verbose {
        println!("Network Interfaces:");
        println!("{}", "-".repeat(60));
        for info in &filtered {
            let status = if info.enabled {
                "\u{2713} Enabled"
            } else {
                "\u{2717} Disabled"
            };
            println!("  {}", info.name);
            println!("    Status: {status}");
            println!("    Interface Type: {}", info.interface_type());
            if let Some(bsd_name) = &info.bsd_name {
                println!("    BSD Name: {bsd_name}");
            }
            println!();
        }
    } else {
        println!("Available Network Interfaces:");
        for info in &filtered {
            let status = if info.enabled { "\u{2713}" } else { "\u{2717}" };
            println!("  {status} {}", info.name);
        }
    }

    println!("\nTotal: {} interface(s)", filtered.len());
    Ok(())
}
