pub mod config;
pub mod console;
pub mod controller;
pub mod error;
pub mod game;
pub mod mapping;
pub mod ui;

use crate::config::ReactorConfig;
use crate::console::Console;
use crate::controller::GpioInput;
use color_eyre::{eyre::eyre, Result};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    setup()?;

    let config = ReactorConfig::load_or_create().await?;

    info!("Opening controller hardware");
    let source = GpioInput::open(&config.pins)
        .map_err(|e| eyre!("Failed to open controller hardware: {}", e))?;

    let console = Console::create(config, Box::new(source))
        .initialize()
        .map_err(|e| eyre!("Failed to start console: {}", e))?;

    let stopped = console
        .run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("Unable to listen for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
        })
        .await;
    stopped.finish();

    Ok(())
}

fn setup() -> Result<()> {
    if std::env::var("RUST_LIB_BACKTRACE").is_err() {
        std::env::set_var("RUST_LIB_BACKTRACE", "0")
    }
    color_eyre::install()?;
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info")
    }
    setup_logging_env();
    Ok(())
}

fn setup_logging_env() {
    FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(false)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true)
        .pretty()
        .init();
}
