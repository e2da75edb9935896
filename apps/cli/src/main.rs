use anyhow::Result;
use clap::{Parser, Subcommand};
use clipwatch_core::{ClipboardMode, DataMap, MonitorConfig, MIME_TEXT, MIME_WINDOW_TITLE};
use clipwatch_monitor::{MonitorCommand, MonitorEvent};
use std::path::PathBuf;
use tokio::sync::mpsc::{self, Sender, UnboundedReceiver};
use tokio::sync::oneshot;
use tracing::{info, warn};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Watch the X11 clipboard and primary selection and print every change
    Watch {
        /// TOML file with monitor settings
        #[arg(short, long)]
        config: Option<PathBuf>,
        #[arg(long)]
        no_clipboard: bool,
        #[arg(long)]
        no_selection: bool,
        /// Put this text into the clipboard once monitoring has started
        #[arg(long)]
        copy: Option<String>,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            config,
            no_clipboard,
            no_selection,
            copy,
        } => {
            let mut config = match config {
                Some(path) => MonitorConfig::load(&path)?,
                None => MonitorConfig::default(),
            };
            config.monitor_clipboard &= !no_clipboard;
            config.monitor_selection &= !no_selection;
            run_watch(config, copy).await
        }
    }
}

#[cfg(target_os = "linux")]
async fn run_watch(config: MonitorConfig, copy: Option<String>) -> Result<()> {
    use clipwatch_clipboard::{ArboardStore, OwnerChangeListener, X11Clipboard, X11OwnerListener};
    use clipwatch_monitor::{run_monitor, ClipboardMonitor};

    let (event_tx, event_rx) = mpsc::unbounded_channel();
    let (owner_tx, owner_rx) = mpsc::unbounded_channel();
    let (cmd_tx, cmd_rx) = mpsc::channel(32);

    let mut monitor = ClipboardMonitor::new(
        &config,
        Box::new(X11Clipboard::new(config.read_timeout())?),
        Box::new(ArboardStore::new()?),
        clipwatch_input::default_pointer_source(),
        event_tx,
    );
    monitor.start_monitoring(config.formats.clone());

    X11OwnerListener::new().start_listener(Box::new(move |mode| {
        let _ = owner_tx.send(mode);
    }))?;

    if let Some(text) = copy {
        let mut data = DataMap::new();
        data.insert(MIME_TEXT.to_string(), text.into_bytes());
        cmd_tx.send(MonitorCommand::SetData(ClipboardMode::Clipboard, data)).await?;
    }

    let stop_tx = cmd_tx.clone();
    let stop = async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!("Failed to listen for Ctrl-C: {}", e);
        }
        let _ = stop_tx.send(MonitorCommand::Stop).await;
    };

    tokio::join!(
        run_monitor(monitor, owner_rx, cmd_rx),
        print_changes(event_rx, cmd_tx),
        stop
    );
    Ok(())
}

#[cfg(not(target_os = "linux"))]
async fn run_watch(_config: MonitorConfig, _copy: Option<String>) -> Result<()> {
    anyhow::bail!("clipwatch needs an X11 session")
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
async fn print_changes(mut events: UnboundedReceiver<MonitorEvent>, cmd_tx: Sender<MonitorCommand>) {
    while let Some(event) = events.recv().await {
        match event {
            // Already written to tracing by the monitor.
            MonitorEvent::Log { .. } => {}
            MonitorEvent::Changed(mode) => {
                let (reply, data) = oneshot::channel();
                let query = MonitorCommand::Data {
                    mode,
                    formats: Vec::new(),
                    reply,
                };
                if cmd_tx.send(query).await.is_err() {
                    break;
                }
                match data.await {
                    Ok(data) => info!("{} changed: {}", mode, describe(&data)),
                    Err(_) => break,
                }
            }
            MonitorEvent::Stopped => break,
        }
    }
}

#[cfg_attr(not(target_os = "linux"), allow(dead_code))]
fn describe(data: &DataMap) -> String {
    let owner = data
        .get(MIME_WINDOW_TITLE)
        .map(|title| String::from_utf8_lossy(title).into_owned())
        .unwrap_or_default();
    let formats: Vec<&str> = data
        .keys()
        .map(String::as_str)
        .filter(|format| *format != MIME_WINDOW_TITLE)
        .collect();

    match data.get(MIME_TEXT) {
        Some(text) => {
            let text = String::from_utf8_lossy(text);
            let preview: String = text.chars().take(60).collect();
            format!("{:?} [{}] from \"{}\"", preview, formats.join(", "), owner)
        }
        None => format!("[{}] from \"{}\"", formats.join(", "), owner),
    }
}
