use clap::Parser;
use simplelog::{ConfigBuilder, LevelFilter, WriteLogger};
use std::fs::File;
use termline::core::config::{self, CliOverrides};
use termline::core::state::Mode;
use termline::transport::shell_handler;

#[derive(Parser)]
#[command(name = "termline", about = "Line-oriented terminal for sockets, event streams and shells")]
struct Args {
    /// Where commands go (overrides config file and TERMLINE_MODE)
    #[arg(short, long, value_enum)]
    mode: Option<Mode>,

    /// Endpoint for socket or event-stream mode
    #[arg(short, long)]
    url: Option<String>,
}

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();
    dotenv::dotenv().ok();

    // Initialize file logger - stdout belongs to the TUI
    let log_config = ConfigBuilder::new()
        .set_time_format_rfc3339()
        .add_filter_ignore_str("tungstenite")
        .build();

    if let Ok(log_file) = File::create("termline.log") {
        let _ = WriteLogger::init(LevelFilter::Debug, log_config, log_file);
    }

    let file_config = config::load_config().map_err(|e| {
        log::error!("{}", e);
        std::io::Error::other(e.to_string())
    })?;
    let overrides = CliOverrides {
        mode: args.mode,
        url: args.url,
    };
    let resolved = config::resolve(&file_config, &overrides);

    log::info!("Termline starting up in {:?} mode", resolved.mode);

    let handler = match resolved.mode {
        Mode::Controlled => Some(shell_handler(resolved.shell.clone())),
        _ => None,
    };

    termline::tui::run(resolved, handler)
}
