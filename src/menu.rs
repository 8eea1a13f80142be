//! Interactive main menu

use crate::console::Console;
use crate::manager::SiteManager;
use crate::runner::CommandExecutor;
use std::io;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
    List,
    Add,
    Enable,
    Delete,
    Https,
    Quit,
}

impl MenuChoice {
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_lowercase().as_str() {
            "1" => Some(Self::List),
            "2" => Some(Self::Add),
            "3" => Some(Self::Enable),
            "4" => Some(Self::Delete),
            "5" => Some(Self::Https),
            "q" => Some(Self::Quit),
            _ => None,
        }
    }
}

const MENU: &[&str] = &[
    "\n--- Nginx Domain Management ---",
    "  1. List all configured domains",
    "  2. Add a new domain (Reverse Proxy)",
    "  3. Enable an existing domain",
    "  4. Delete an existing domain",
    "  5. Add HTTPS to a domain (Certbot - Manual Step)",
    "  q. Quit",
];

/// Run the menu until the operator quits or input ends
pub fn run<E, C>(manager: &SiteManager<E>, console: &mut C) -> io::Result<()>
where
    E: CommandExecutor,
    C: Console,
{
    match run_loop(manager, console) {
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
            debug!("Input closed");
            console.say("\nExiting.");
            Ok(())
        }
        other => other,
    }
}

fn run_loop<E, C>(manager: &SiteManager<E>, console: &mut C) -> io::Result<()>
where
    E: CommandExecutor,
    C: Console,
{
    loop {
        console.clear();
        for line in MENU {
            console.say(line);
        }

        let answer = console.prompt("Enter your choice: ")?;

        let outcome = match MenuChoice::parse(&answer) {
            Some(MenuChoice::Quit) => {
                console.say("Exiting.");
                return Ok(());
            }
            Some(MenuChoice::List) => manager.list_domains(console)?,
            Some(MenuChoice::Add) => manager.add_domain(console)?,
            Some(MenuChoice::Enable) => manager.enable_domain(console)?,
            Some(MenuChoice::Delete) => manager.delete_domain(console)?,
            Some(MenuChoice::Https) => manager.add_https(console)?,
            None => {
                console.say("Invalid choice. Please try again.");
                console.pause("\nPress Enter to continue...")?;
                continue;
            }
        };

        info!("Menu choice '{}' finished: {:?}", answer, outcome);
        console.pause("\nPress Enter to return to main menu...")?;
    }
}
