pub mod args;
mod commands;
mod session;
mod setup;
mod shell;

pub use args::{AppArgs, Command};

use anyhow::{bail, Result};
use std::sync::Arc;

use crate::parser::{Launcher, PrintLauncher, SystemBrowser};
use crate::update::UpdateStatus;
use session::Session;

pub async fn launch() -> Result<()> {
    launch_with_args(AppArgs::from_cli()).await
}

pub async fn launch_with_args(args: AppArgs) -> Result<()> {
    let setup::PreparedApp {
        command,
        data_dir,
        config,
        config_path,
        logs,
    } = setup::prepare(args)?;

    let launcher: Arc<dyn Launcher> = match &command {
        Command::Parse { print: true, .. } => Arc::new(PrintLauncher),
        _ => Arc::new(SystemBrowser),
    };
    let mut session = Session::new(config, config_path, &data_dir, launcher, logs)?;

    let result: Result<()> = match command {
        Command::Shell => return shell::run(session).await,
        Command::Parse {
            url, line, force, ..
        } => session
            .parse(&url, line.as_deref(), force)
            .await
            .map(|outcome| commands::print_outcome(&outcome))
            .map_err(Into::into),
        Command::Rank => {
            commands::print_ranking(&session.rank().await);
            Ok(())
        }
        Command::Lines => commands::execute(commands::ShellCommand::Lines, &mut session)
            .await
            .map(|_| ()),
        Command::CheckUpdate { apply } => check_update(&mut session, apply).await,
    };

    session.shutdown().await;
    result
}

async fn check_update(session: &mut Session, apply: bool) -> Result<()> {
    match session.check_update().await? {
        UpdateStatus::UpToDate { current } => {
            println!("✅ Version {} is up to date", current);
        }
        UpdateStatus::Available(info) => {
            println!("⬆️  Version {} is available (current {})", info.latest, info.current);
            for change in &info.changelog {
                println!("  - {}", change);
            }
            if apply {
                session.apply_update(&info)?;
                println!("Opened download link: {}", info.download_url);
            } else if info.force {
                bail!("Version {} is required; rerun with --apply", info.latest);
            } else {
                println!("Download: {}", info.download_url);
            }
        }
    }
    Ok(())
}
