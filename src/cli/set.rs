use clap::{Args, Subcommand};
use url::Url;

use sysproxy::core::{ProxyError, Result};
use sysproxy::manager::ProxyManager;
use sysproxy::model::{PacConfiguration, ProxyServer};
use sysproxy::store::ConfigStore;

#[derive(Subcommand)]
pub enum SetCommand {
    /// Set the HTTP proxy
    Http(HttpArgs),

    /// Set the HTTPS proxy
    Https(ManualProxyArgs),

    /// Set the SOCKS proxy
    Socks(ManualProxyArgs),

    /// Set the PAC (Proxy Auto-Configuration) URL
    Pac(PacArgs),
}

#[derive(Args)]
pub struct ManualProxyArgs {
    /// Proxy server host
    #[arg(short = 'H', long)]
    pub host: String,

    /// Proxy server port
    #[arg(short, long)]
    pub port: u16,

    /// Network interface name
    #[arg(short, long)]
    pub interface: String,

    /// Proxy authentication username
    #[arg(long)]
    pub username: Option<String>,

    /// Proxy authentication password
    #[arg(long)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct HttpArgs {
    #[command(flatten)]
    pub proxy: ManualProxyArgs,

    /// Also set the HTTPS proxy with the same settings
    #[arg(long)]
    pub with_https: bool,
}

#[derive(Args)]
pub struct PacArgs {
    /// PAC script URL
    #[arg(short, long)]
    pub url: String,

    /// Network interface name
    #[arg(short, long)]
    pub interface: String,
}

impl ManualProxyArgs {
    fn proxy(&self) -> ProxyServer {
        let mut proxy = ProxyServer::new(&self.host, self.port);
        if let (Some(username), Some(password)) = (&self.username, &self.password) {
            proxy = proxy.with_credentials(username, password);
        }
        proxy
    }
}

pub async fn run<S: ConfigStore>(manager: &ProxyManager<S>, command: SetCommand) -> Result<()> {
    match command {
        SetCommand::Http(args) => {
            let mut config = manager.get_configuration(&args.proxy.interface).await?;
            let proxy = args.proxy.proxy();
            config.http_proxy = Some(proxy.clone());
            if args.with_https {
                config.https_proxy = Some(proxy);
            }
            manager.set_proxy(&args.proxy.interface, &config).await?;

            println!(
                "\u{2713} HTTP proxy set to {}:{} for '{}'",
                args.proxy.host, args.proxy.port, args.proxy.interface
            );
            if args.with_https {
                println!(
                    "\u{2713} HTTPS proxy also set to {}:{}",
                    args.proxy.host, args.proxy.port
                );
            }
        }
        SetCommand::Https(args) => {
            let mut config = manager.get_configuration(&args.interface).await?;
            config.https_proxy = Some(args.proxy());
            manager.set_proxy(&args.interface, &config).await?;

            println!(
                "\u{2713} HTTPS proxy set to {}:{} for '{}'",
                args.host, args.port, args.interface
            );
        }
        SetCommand::Socks(args) => {
            let mut config = manager.get_configuration(&args.interface).await?;
            config.socks_proxy = Some(args.proxy());
            manager.set_proxy(&args.interface, &config).await?;

            println!(
                "\u{2713} SOCKS proxy set to {}:{} for '{}'",
                args.host, args.port, args.interface
            );
        }
        SetCommand::Pac(args) => {
            let url = Url::parse(&args.url)
                .map_err(|_| ProxyError::InvalidConfiguration(format!("invalid URL: {}", args.url)))?;

            let mut config = manager.get_configuration(&args.interface).await?;
            config.auto_config_url = Some(PacConfiguration::new(url));
            manager.set_proxy(&args.interface, &config).await?;

            println!("\u{2713} PAC proxy set to {} for '{}'", args.url, args.interface);
        }
    }
    Ok(())
}
