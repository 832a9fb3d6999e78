use anyhow::Result;
use clap::Parser as _;
use event_loop::event_loop;
use output::Output;
use zbus::Connection;

mod args;
mod dbus;
mod engine;
mod event_loop;
mod lrc;
mod output;
mod player;
mod track;
mod utils;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = args::Args::parse();
    args.init_tracing_subscriber()?;
    let settings = args.settings()?;

    let connection = Connection::session().await?;
    let output = Output::new(settings.output, &connection).await?;
    event_loop(connection, settings, output).await
}
