//! scrot-select: select a screen region or window and save it
//!
//! Runs one interactive selection on the X display, grabs the selected
//! area and writes it to a file, or prints the rectangle as JSON.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use scrot_select::{
    Selector,
    capture::ImageBuffer,
    display::X11Display,
    error::SelectionError,
    model::{LineOptions, SelectionMode, SelectionOptions},
    util::encode::{DEFAULT_QUALITY, save_image},
};

#[derive(Parser)]
#[command(name = "scrot-select")]
#[command(about = "Select a screen region with the mouse and save it as an image")]
struct Cli {
    /// Selection mode
    #[arg(long = "select", value_enum, default_value_t = SelectionMode::Capture)]
    mode: SelectionMode,

    /// Outline style, e.g. "mode=edge,style=dash,width=3,color=red,opacity=40"
    #[arg(short, long)]
    line: Option<String>,

    /// Ignore key presses during selection (Escape still aborts)
    #[arg(short, long)]
    ignore_keyboard: bool,

    /// Do not ring the bell after selecting
    #[arg(short = 'z', long)]
    silent: bool,

    /// Seconds to wait before grabbing the screen
    #[arg(short, long, default_value_t = 0)]
    delay: u64,

    /// Print a countdown while waiting
    #[arg(short, long)]
    countdown: bool,

    /// Record the mouse pointer
    #[arg(short, long)]
    pointer: bool,

    /// Include the window manager frame when clicking a window
    #[arg(short, long)]
    border: bool,

    /// Image quality (1-100, for JPEG; picks PNG compression)
    #[arg(short, long, default_value_t = DEFAULT_QUALITY)]
    quality: u8,

    /// X display to connect to (defaults to $DISPLAY)
    #[arg(long)]
    display: Option<String>,

    /// Print the selected rectangle as JSON instead of capturing
    #[arg(long)]
    print_rect: bool,

    /// Output file; defaults to a timestamped PNG in the current directory
    out: Option<PathBuf>,
}

impl Cli {
    fn options(&self) -> Result<SelectionOptions, SelectionError> {
        let line = match self.line.as_deref() {
            Some(value) => LineOptions::parse(value)?,
            None => LineOptions::default(),
        };
        if !(1..=100).contains(&self.quality) {
            return Err(SelectionError::invalid_option("quality", "must be between 1 and 100"));
        }

        let options = SelectionOptions {
            mode: self.mode,
            line,
            ignore_keyboard: self.ignore_keyboard,
            silent: self.silent,
            delay: self.delay,
            countdown: self.countdown,
            pointer: self.pointer,
            border: self.border,
        };
        options.validate()?;
        Ok(options)
    }
}

fn main() {
    // Initialize logging
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("scrot_select=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(&cli) {
        Ok(true) => {}
        Ok(false) => std::process::exit(1),
        Err(e) => {
            eprintln!("scrot-select: {e}");
            if let Some(selection) = e.downcast_ref::<SelectionError>() {
                eprintln!("hint: {}", selection.remediation_hint());
            }
            std::process::exit(1);
        }
    }
}

/// Returns `Ok(false)` when the selection was aborted
fn run(cli: &Cli) -> Result<bool> {
    let options = cli.options()?;
    let display = X11Display::connect(cli.display.as_deref())?;
    let mut selector = Selector::new(&display, options);

    if cli.print_rect {
        let Some(rect) = selector.get_user_selection()? else {
            tracing::warn!("Selection aborted");
            return Ok(false);
        };
        println!("{}", serde_json::to_string(&rect)?);
        return Ok(true);
    }

    let Some(capture) = selector.select_mode()? else {
        tracing::warn!("Selection aborted");
        return Ok(false);
    };

    let path = cli.out.clone().unwrap_or_else(|| default_output_path(&capture));
    save_image(&capture, &path, cli.quality)?;
    tracing::info!("Saved {}x{} capture to {}", capture.width(), capture.height(), path.display());
    Ok(true)
}

/// `%Y-%m-%d-%H%M%S_<w>x<h>_scrot.png` in local time
fn default_output_path(capture: &ImageBuffer) -> PathBuf {
    let stamp = chrono::Local::now().format("%Y-%m-%d-%H%M%S");
    PathBuf::from(format!("{}_{}x{}_scrot.png", stamp, capture.width(), capture.height()))
}
