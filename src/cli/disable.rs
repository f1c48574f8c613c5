use clap::Args;

use sysproxy::core::{ProxyError, Result};
use sysproxy::manager::ProxyManager;
use sysproxy::store::ConfigStore;

#[derive(Args)]
pub struct DisableArgs {
    /// Network interface name. Ignored if --all is specified.
    pub interface: Option<String>,

    /// Disable proxies for every enabled network interface
    #[arg(short, long)]
    pub all: bool,
}

pub async fn run<S: ConfigStore>(manager: &ProxyManager<S>, args: DisableArgs) -> Result<()> {
    match (&args.interface, args.all) {
        (_, true) => disable_all(manager).await,
        (Some(interface), false) => {
            manager.disable_all_proxies(interface).await?;
            println!("\u{2713} All proxies disabled for '{interface}'");
            Ok(())
        }
        (None, false) => Err(ProxyError::InvalidConfiguration(
            "please specify an interface name or use --all".to_string(),
        )),
    }
}

/// Best-effort sweep over every enabled interface; each failure is
/// reported and counted, never fatal for the rest.
async fn disable_all<S: ConfigStore>(manager: &ProxyManager<S>) -> Result<()> {
    let interfaces = manager.interfaces_info().await?;
    let enabled: Vec<_> = interfaces.into_iter().filter(|info| info.enabled).collect();

    if enabled.is_empty() {
        println!("No enabled network interfaces found.");
        return Ok(());
    }

    let mut success_count = 0usize;
    let mut failure_count = 0usize;

    for info in &enabled {
        match manager.disable_all_proxies(&info.name).await {
            Ok(()) => {
                success_count += 1;
                println!("\u{2713} Disabled proxies for '{}'", info.name);
            }
            Err(err) => {
                failure_count += 1;
                println!("\u{2717} Failed to disable proxies for '{}': {err}", info.name);
            }
        }
    }

    println!();
    if failure_count == 0 {
        println!("Successfully disabled proxies for all {success_count} enabled interface(s).");
    } else {
        println!("Completed: {success_count} succeeded, {failure_count} failed.");
    }
    Ok(())
}
