//! nginx-sites - Interactive manager for nginx reverse-proxy sites
//!
//! Drives the external tools that actually do the work:
//! - Server block creation from a fixed reverse-proxy template
//! - Enabling sites by symlink, with rollback when `nginx -t` fails
//! - Deleting sites, then validating and reloading nginx
//! - Handing certificate issuance to the operator as a certbot command

pub mod config;
pub mod console;
pub mod error;
pub mod inventory;
pub mod manager;
pub mod menu;
pub mod runner;
pub mod template;

pub use config::SiteConfig;
pub use console::{Console, Terminal};
pub use error::{InventoryError, RunError};
pub use inventory::{DomainRecord, EnabledEntry, Inventory};
pub use manager::{Cancel, Outcome, Rollback, SiteManager, Step};
pub use runner::{CommandExecutor, CommandOutput, Invocation, PrivilegedRunner, SystemExecutor};
