//! nginx-sites - Main entry point
//!
//! Interactive manager for nginx reverse-proxy site configurations

use anyhow::Result;
use clap::Parser;
use nginx_sites::{menu, Console, SiteConfig, SiteManager, SystemExecutor, Terminal};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// nginx-sites - Manage nginx reverse-proxy sites from an interactive menu
#[derive(Parser, Debug)]
#[command(name = "nginx-sites")]
#[command(author = "nginx-sites Contributors")]
#[command(version = "1.0.0")]
#[command(about = "Manage nginx reverse-proxy sites from an interactive menu")]
struct Args {
    /// Directory holding every site configuration
    #[arg(long, env = "NGINX_SITES_AVAILABLE", default_value = "/etc/nginx/sites-available")]
    sites_available: PathBuf,

    /// Directory of symlinks nginx actually loads
    #[arg(long, env = "NGINX_SITES_ENABLED", default_value = "/etc/nginx/sites-enabled")]
    sites_enabled: PathBuf,

    /// Directory for per-site access and error logs
    #[arg(long, env = "NGINX_LOG_DIR", default_value = "/var/log/nginx")]
    log_dir: PathBuf,

    /// Privilege elevation program (empty to run commands directly)
    #[arg(long, env = "SITES_ELEVATE", default_value = "sudo")]
    elevate: String,

    /// nginx binary used for `-t`
    #[arg(long, env = "NGINX_BIN", default_value = "nginx")]
    nginx_bin: String,

    /// systemctl binary used for reloads
    #[arg(long, env = "SYSTEMCTL_BIN", default_value = "systemctl")]
    systemctl_bin: String,

    /// Service unit to reload
    #[arg(long, env = "NGINX_SERVICE", default_value = "nginx")]
    service: String,

    /// Certificate tool shown in the manual HTTPS step
    #[arg(long, env = "CERTBOT_BIN", default_value = "certbot")]
    certbot_bin: String,

    /// Log level
    #[arg(long, env = "LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

impl Args {
    fn site_config(&self) -> SiteConfig {
        let elevate = self.elevate.trim();
        SiteConfig {
            available_dir: self.sites_available.clone(),
            enabled_dir: self.sites_enabled.clone(),
            log_dir: self.log_dir.clone(),
            elevate: (!elevate.is_empty()).then(|| elevate.to_string()),
            nginx_bin: self.nginx_bin.clone(),
            systemctl_bin: self.systemctl_bin.clone(),
            service: self.service.clone(),
            certbot_bin: self.certbot_bin.clone(),
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let log_level = match args.log_level.to_lowercase().as_str() {
        "trace" => LevelFilter::TRACE,
        "debug" => LevelFilter::DEBUG,
        "info" => LevelFilter::INFO,
        "warn" => LevelFilter::WARN,
        "error" => LevelFilter::ERROR,
        "off" => LevelFilter::OFF,
        _ => LevelFilter::WARN,
    };

    FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(log_level.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .compact()
        .init();

    let config = args.site_config().absolutized()?;
    info!("Available: {}", config.available_dir.display());
    info!("Enabled: {}", config.enabled_dir.display());

    let manager = SiteManager::new(config, SystemExecutor);

    if let Err(e) = manager.runner().check_privileges() {
        error!("Privilege check failed: {}", e);
        let elevate = manager.config().elevate.as_deref().unwrap_or_default();
        eprintln!("Error: This tool requires {}. Please configure your {} permissions.", elevate, elevate);
        eprintln!("{}", e);
        std::process::exit(1);
    }

    let mut terminal = Terminal::stdio();
    if let Some(elevate) = &manager.config().elevate {
        terminal.say(&format!("{} privileges seem to be available.", elevate));
    }

    match terminal.pause("\nPress Enter to start nginx-sites...") {
        Err(e) if e.kind() == std::io::ErrorKind::UnexpectedEof => return Ok(()),
        other => other?,
    }
    menu::run(&manager, &mut terminal)?;

    Ok(())
}
