//! Command-line VIP video parser: sends video pages through third-party parse
//! lines, picking the healthiest line automatically.
mod app;
mod cache;
mod config;
mod endpoints;
mod error;
mod health;
mod logging;
mod parser;
mod sync;
mod update;

use anyhow::Result;

#[tokio::main]
async fn main() -> Result<()> {
    app::launch().await
}
