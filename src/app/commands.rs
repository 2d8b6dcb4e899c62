//! Shell command parsing and execution.
use anyhow::Result;
use std::time::Duration;

use super::session::Session;
use crate::health::PerformanceRecord;
use crate::parser::{ParseOutcome, SUPPORTED_SITES};
use crate::update::UpdateStatus;

const DEFAULT_LOG_LINES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ShellCommand {
    Parse {
        url: String,
        line: Option<String>,
        force: bool,
    },
    Lines,
    Use(String),
    Add {
        base_url: String,
        name: String,
    },
    Remove(String),
    Rank,
    Stats,
    History,
    Again(usize),
    ClearHistory,
    Sites,
    Open(String),
    Update,
    Logs(usize),
    Help,
    Quit,
}

/// What the shell loop should do after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Parses one input line. Blank lines are `Ok(None)`; usage mistakes are
/// `Err` with a message for the user.
pub fn parse_command(input: &str) -> Result<Option<ShellCommand>, String> {
    let parts: Vec<&str> = input.split_whitespace().collect();
    let Some((&name, args)) = parts.split_first() else {
        return Ok(None);
    };

    let command = match (name, args) {
        ("parse" | "p", [url]) => ShellCommand::Parse {
            url: url.to_string(),
            line: None,
            force: false,
        },
        ("parse" | "p", [url, line @ ..]) if !line.is_empty() => ShellCommand::Parse {
            url: url.to_string(),
            line: Some(line.join(" ")),
            force: false,
        },
        ("force", [url]) => ShellCommand::Parse {
            url: url.to_string(),
            line: None,
            force: true,
        },
        ("force", [url, line @ ..]) if !line.is_empty() => ShellCommand::Parse {
            url: url.to_string(),
            line: Some(line.join(" ")),
            force: true,
        },
        ("parse" | "p" | "force", _) => return Err(format!("Usage: {} <url> [line]", name)),
        ("lines" | "ls", []) => ShellCommand::Lines,
        ("use", [_, ..]) => ShellCommand::Use(args.join(" ")),
        ("use", []) => return Err("Usage: use <line number or name>".to_string()),
        ("add", [base_url, name @ ..]) if !name.is_empty() => ShellCommand::Add {
            base_url: base_url.to_string(),
            name: name.join(" "),
        },
        ("add", _) => return Err("Usage: add <base_url> <name>".to_string()),
        ("remove" | "rm", [_, ..]) => ShellCommand::Remove(args.join(" ")),
        ("remove" | "rm", []) => return Err("Usage: remove <line number or name>".to_string()),
        ("rank", []) => ShellCommand::Rank,
        ("stats", []) => ShellCommand::Stats,
        ("history" | "h", []) => ShellCommand::History,
        ("again", [n]) => match n.parse() {
            Ok(n) => ShellCommand::Again(n),
            Err(_) => return Err("Usage: again <history number>".to_string()),
        },
        ("again", _) => return Err("Usage: again <history number>".to_string()),
        ("clear-history", []) => ShellCommand::ClearHistory,
        ("sites", []) => ShellCommand::Sites,
        ("open", [_, ..]) => ShellCommand::Open(args.join(" ")),
        ("open", []) => return Err("Usage: open <site number or name>".to_string()),
        ("update", []) => ShellCommand::Update,
        ("logs", []) => ShellCommand::Logs(DEFAULT_LOG_LINES),
        ("logs", [n]) => match n.parse() {
            Ok(n) => ShellCommand::Logs(n),
            Err(_) => return Err("Usage: logs [count]".to_string()),
        },
        ("help" | "?", _) => ShellCommand::Help,
        ("quit" | "exit" | "q", _) => ShellCommand::Quit,
        _ => return Err(format!("Unknown command: {}. Type 'help' for commands.", input.trim())),
    };
    Ok(Some(command))
}

pub async fn execute(command: ShellCommand, session: &mut Session) -> Result<Flow> {
    match command {
        ShellCommand::Parse { url, line, force } => {
            let outcome = session.parse(&url, line.as_deref(), force).await?;
            print_outcome(&outcome);
        }
        ShellCommand::Again(position) => {
            let outcome = session.parse_again(position).await?;
            print_outcome(&outcome);
        }
        ShellCommand::Lines => {
            for (i, line) in session.lines().await.iter().enumerate() {
                let marker = if line.selected { "*" } else { " " };
                let health = line
                    .record
                    .as_ref()
                    .map(format_record)
                    .unwrap_or_else(|| "not probed".to_string());
                println!("{}{:>2}. {:<20} {}", marker, i + 1, line.endpoint.name, health);
            }
        }
        ShellCommand::Use(selector) => {
            let endpoint = session.select_line(&selector).await?;
            println!("✅ Default line: {}", endpoint.name);
        }
        ShellCommand::Add { base_url, name } => {
            session.add_line(&base_url, &name).await?;
            println!("✅ Line {} saved", name);
        }
        ShellCommand::Remove(selector) => {
            let removed = session.remove_line(&selector).await?;
            println!("🗑️  Removed line {}", removed.name);
        }
        ShellCommand::Rank => {
            println!("🔍 Probing lines...");
            print_ranking(&session.rank().await);
        }
        ShellCommand::Stats => {
            let (stats, limit, ttl) = session.cache_stats();
            println!(
                "Cache: {}/{} entries (ttl {}s), {} hits, {} misses",
                stats.entries,
                limit,
                ttl.as_secs(),
                stats.hits,
                stats.misses
            );
            for (name, record) in session.tracker().snapshot() {
                println!("  {:<20} {}", name, format_record(&record));
            }
        }
        ShellCommand::History => {
            if session.history().is_empty() {
                println!("No history yet.");
            }
            for (i, entry) in session.history().iter().enumerate() {
                println!("{:>2}. [{}] {}", i + 1, entry.added_at.format("%H:%M:%S"), entry.url);
            }
        }
        ShellCommand::ClearHistory => {
            session.clear_history();
            println!("History cleared.");
        }
        ShellCommand::Sites => {
            for (i, site) in SUPPORTED_SITES.iter().enumerate() {
                println!("{:>2}. {:<14} {}", i + 1, site.name, site.home);
            }
        }
        ShellCommand::Open(selector) => {
            let site = session.open_site(&selector)?;
            println!("🌐 Opened {}", site.name);
        }
        ShellCommand::Update => match session.check_update().await? {
            UpdateStatus::UpToDate { current } => {
                println!("✅ Version {} is up to date", current);
            }
            UpdateStatus::Available(info) => {
                println!("⬆️  Version {} is available (current {})", info.latest, info.current);
                for change in &info.changelog {
                    println!("  - {}", change);
                }
                session.apply_update(&info)?;
                println!("Opened download link: {}", info.download_url);
            }
        },
        ShellCommand::Logs(count) => {
            for entry in session.recent_logs(count) {
                println!("{}", entry);
            }
        }
        ShellCommand::Help => print_help(),
        ShellCommand::Quit => return Ok(Flow::Quit),
    }
    Ok(Flow::Continue)
}

pub fn print_outcome(outcome: &ParseOutcome) {
    let source = if outcome.cached { " (cached)" } else { "" };
    println!("▶️  {} via {}{}", outcome.action_url, outcome.endpoint, source);
}

pub fn print_ranking(ranking: &[(String, Option<PerformanceRecord>)]) {
    for (i, (name, record)) in ranking.iter().enumerate() {
        let health = record
            .as_ref()
            .map(format_record)
            .unwrap_or_else(|| "not probed".to_string());
        println!("{:>2}. {:<20} {}", i + 1, name, health);
    }
}

fn format_record(record: &PerformanceRecord) -> String {
    format!(
        "{:>5.1}% ok, avg {}, {} probes",
        record.success_rate * 100.0,
        format_latency(record.avg_time),
        record.count
    )
}

fn format_latency(latency: Duration) -> String {
    format!("{}ms", latency.as_millis())
}

fn print_help() {
    let help_text = "Available commands:
  parse <url> [line]        - Parse a video page (alias: p)
  force <url> [line]        - Parse a page from an unsupported site
  lines                     - List parse lines
  use <line>                - Make a line the default
  add <base_url> <name>     - Add or replace a line
  remove <line>             - Remove a line
  rank                      - Probe every line and rank them
  stats                     - Cache and probe statistics
  history                   - Recently parsed pages
  again <n>                 - Parse history entry n again
  clear-history             - Forget parsed pages
  sites                     - Supported video sites
  open <site>               - Open a site's home page
  update                    - Check for a new version
  logs [n]                  - Show recent log lines
  help                      - Show this help
  quit                      - Exit";
    println!("{}", help_text);
}
