use clap::Args;

use sysproxy::core::{ProxyError, Result};
use sysproxy::manager::ProxyManager;
use sysproxy::model::{ProxyConfiguration, ProxyServer};
use sysproxy::store::ConfigStore;

#[derive(Args)]
pub struct GetArgs {
    /// Network interface name (e.g. 'Wi-Fi', 'Ethernet')
    pub interface: String,

    /// Output in JSON format
    #[arg(short, long)]
    pub json: bool,
}

pub async fn run<S: ConfigStore>(manager: &ProxyManager<S>, args: GetArgs) -> Result<()> {
    let config = manager.get_configuration(&args.interface).await?;

    if args.json {
        let rendered = serde_json::to_string_pretty(&config)
            .map_err(|err| ProxyError::Unknown(err.to_string()))?;
        println!("{rendered}");
    } else {
        print_human_readable(&args.interface, &config);
    }
    Ok(())
}

fn print_server_section(title: &str, server: Option<&ProxyServer>) {
    println!("\n[{title}]");
    match server {
        Some(server) if server.enabled => {
            println!("  Status: Enabled");
            println!("  Server: {}:{}", server.host, server.port);
            if let Some(username) = &server.username {
                println!("  Username: {username}");
            }
        }
        _ => println!("  Status: Disabled"),
    }
}

fn print_human_readable(interface: &str, config: &ProxyConfiguration) {
    println!("Proxy Configuration for '{interface}':");
    println!("{}", "-".repeat(50));

    println!("\n[Auto Discovery]");
    println!(
        "  Auto Proxy Discovery (WPAD): {}",
        if config.auto_discovery_enabled {
            "Enabled"
        } else {
            "Disabled"
        }
    );

    println!("\n[Automatic Proxy Configuration (PAC)]");
    match &config.auto_config_url {
        Some(pac) if pac.enabled => {
            println!("  Status: Enabled");
            println!("  URL: {}", pac.url);
        }
        _ => println!("  Status: Disabled"),
    }

    print_server_section("HTTP Proxy", config.http_proxy.as_ref());
    print_server_section("HTTPS Proxy", config.https_proxy.as_ref());
    print_server_section("SOCKS Proxy", config.socks_proxy.as_ref());

    println!("\n[Bypass Settings]");
    println!(
        "  Exclude Simple Hostnames: {}",
        if config.exclude_simple_hostnames {
            "Yes"
        } else {
            "No"
        }
    );
    if config.exception_list.is_empty() {
        println!("  Exception List: (none)");
    } else {
        println!("  Exception List:");
        for exception in &config.exception_list {
            println!("    - {exception}");
        }
    }
}
