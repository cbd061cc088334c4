//! CLI for checking cookie scopes and locale resolution without a browser.
//!
//! Runs the same engine the browser bindings use, against in-memory ports.

#![allow(clippy::print_stdout, reason = "CLI tool outputs to stdout")]

use std::path::PathBuf;
use std::rc::Rc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use langpref_core::memory::{FixedClientLocale, LocalSignalBus, MemoryCookieJar, StaticAddress};
use langpref_core::persistence::parse_cookie_header;
use langpref_core::types::{DomainScope, PreferenceConfig};
use langpref_core::{
    AddressReader, ChangeOutcome, CookieJar, EnginePorts, PreferenceEngine, Resolution, ScopeResolver,
    SetCookie,
};
use serde::Serialize;
use tracing::{debug, Level};
use tracing_subscriber::FmtSubscriber;

mod recording;
mod settings;

use recording::{RecordedWrite, RecordingJar};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Configuration file (JSON, TOML or YAML); LANGPREF_* variables override it
    #[arg(long, short, global = true, env = "LANGPREF_CONFIG_FILE")]
    config: Option<PathBuf>,

    /// Log engine decisions to stderr
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Prints the cookie scope new writes use on a host
    Scope {
        /// Host name, e.g. apps.openedx.example.com
        host: String,
    },
    /// Prints every scope the reconciler cleans up on a host
    Scopes {
        /// Host name, e.g. apps.openedx.example.com
        host: String,
    },
    /// Runs the initial load (and optionally a change) for a page address
    Resolve {
        /// Page address, e.g. https://apps.openedx.example.com/?locale=ru
        #[arg(long)]
        url: String,
        /// Existing cookies as a Cookie header; each copy is stored host-only
        #[arg(long)]
        cookie: Option<String>,
        /// Client locale signal (navigator.language)
        #[arg(long)]
        client_locale: Option<String>,
        /// Apply a user-initiated change after the initial load
        #[arg(long)]
        change: Option<String>,
        /// Print a JSON report
        #[arg(long)]
        json: bool,
    },
}

#[derive(Debug, Serialize)]
struct ResolveReport {
    host: String,
    scope: DomainScope,
    resolution: Resolution,
    change: Option<ChangeOutcome>,
    writes: Vec<RecordedWrite>,
    cookie_after: String,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    let subscriber =
        FmtSubscriber::builder().with_max_level(level).with_writer(std::io::stderr).finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    let config = settings::load(cli.config.as_deref())?;
    debug!(?config, "Loaded configuration");

    match cli.command {
        Commands::Scope { host } => {
            println!("{}", ScopeResolver::from_config(&config).resolve(&host));
        },
        Commands::Scopes { host } => {
            for scope in ScopeResolver::from_config(&config).candidates(&host) {
                println!("{scope}");
            }
        },
        Commands::Resolve { url, cookie, client_locale, change, json } => {
            let report = resolve(&config, &url, cookie.as_deref(), client_locale.as_deref(), change.as_deref())?;
            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_report(&report);
            }
        },
    }

    Ok(())
}

fn resolve(
    config: &PreferenceConfig,
    url: &str,
    cookie: Option<&str>,
    client_locale: Option<&str>,
    change: Option<&str>,
) -> Result<ResolveReport> {
    let address = StaticAddress::new(url);
    let host = address.hostname().with_context(|| format!("No host in URL: {url}"))?;

    let browser = MemoryCookieJar::new(&host);
    for value in cookie.map(|c| parse_cookie_header(c, &config.cookie_name)).unwrap_or_default() {
        browser
            .store(&SetCookie::new(&config.cookie_name, &value, &DomainScope::HostOnly, config.ttl_days))
            .context("Failed to seed cookie")?;
    }

    let jar = Rc::new(RecordingJar::new(browser.clone()));
    let ports = EnginePorts {
        jar: jar.clone(),
        address: Rc::new(address),
        client: Rc::new(FixedClientLocale(client_locale.map(str::to_string))),
        bus: Rc::new(LocalSignalBus::new()),
    };
    let engine = PreferenceEngine::new(config.clone(), ports).context("Invalid configuration")?;
    let resolution = engine.initialize();
    let change = change
        .map(|code| engine.change_locale(code))
        .transpose()
        .context("Locale change rejected")?;
    engine.teardown();

    Ok(ResolveReport {
        host,
        scope: engine.scope().clone(),
        resolution,
        change,
        writes: jar.writes(),
        cookie_after: browser.header(),
    })
}

fn print_report(report: &ResolveReport) {
    println!("{} {}", "Host:".cyan().bold(), report.host);
    println!("{} {}", "Scope:".cyan().bold(), report.scope);
    println!(
        "{} {} (from {}{})",
        "Locale:".cyan().bold(),
        report.resolution.locale.as_str().green().bold(),
        report.resolution.source,
        if report.resolution.source.is_backfilled() && !report.resolution.persisted {
            ", not persisted"
        } else {
            ""
        }
    );
    if let Some(change) = &report.change {
        let status = if change.persisted { "persisted".green() } else { "not persisted".yellow() };
        println!("{} {} ({status})", "Changed to:".cyan().bold(), change.locale.as_str().green().bold());
    }

    println!("{}", "Cookie writes:".cyan().bold());
    if report.writes.is_empty() {
        println!("  (none)");
    }
    for write in &report.writes {
        let line = format!("Set-Cookie: {}", write.set_cookie);
        match &write.rejected {
            Some(reason) => println!("  {} {}", line.red(), format!("[rejected: {reason}]").red()),
            None if write.removal => println!("  {}", line.dimmed()),
            None => println!("  {line}"),
        }
    }
    println!("{} {}", "Cookie header after:".cyan().bold(), report.cookie_after);
}
