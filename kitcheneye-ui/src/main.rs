//! kitcheneye-ui - terminal client for the KitchenEye detection service
//!
//! Drives the acquisition/detection/recipe workflow from the console:
//! every command line is one event for the single controller actor, and
//! network/camera completions are applied as they arrive.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use kitcheneye_common::config::{self, CliOverrides, ClientConfig};
use kitcheneye_common::events::WorkflowState;
use kitcheneye_ui::console::{apply_command, parse_command, TerminalRenderer, HELP_TEXT};
use kitcheneye_ui::host::{load_file, NativeHost};
use kitcheneye_ui::{ControllerSettings, HttpKitchenApi, Projection, WorkflowController};
use tokio::io::AsyncBufReadExt;
use tokio::sync::mpsc;
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Command-line arguments for kitcheneye-ui
#[derive(Parser, Debug)]
#[command(name = "kitcheneye-ui")]
#[command(about = "Detect ingredients in a photo and generate a recipe")]
#[command(version)]
struct Args {
    /// TOML config file (defaults to the platform config location)
    #[arg(short, long, env = "KITCHENEYE_CONFIG")]
    config: Option<PathBuf>,

    /// Base URL of the detection/recipe service
    #[arg(long)]
    service_url: Option<String>,

    /// Still image served as the camera feed
    #[arg(long)]
    frame_source: Option<PathBuf>,

    /// Directory the preview image is written to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Interactive console (default)
    Run,
    /// Detect objects in one image and exit
    Detect {
        /// Image file to upload
        path: PathBuf,
        /// Also generate a recipe from the detected objects
        #[arg(long)]
        recipe: bool,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let args = Args::parse();

    let toml_config = config::load_toml_config(args.config.as_deref());
    let overrides = CliOverrides {
        service_url: args.service_url.clone(),
        frame_source: args.frame_source.clone(),
        output_dir: args.output_dir.clone(),
    };
    let client_config = match &toml_config {
        Ok(toml) => config::resolve_config(&overrides, toml),
        Err(_) => Ok(ClientConfig::default()),
    };
    let log_level = client_config
        .as_ref()
        .map(|c| c.log_level.clone())
        .unwrap_or_else(|_| "info".to_string());

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("kitcheneye_ui={0},kitcheneye_common={0}", log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    toml_config.context("Failed to load configuration")?;
    let client_config = client_config.context("Invalid configuration")?;

    info!("Starting kitcheneye-ui v{}", env!("CARGO_PKG_VERSION"));
    info!("Service: {}", client_config.service_url);
    info!("Output directory: {}", client_config.output_dir.display());

    let api = HttpKitchenApi::from_config(&client_config)
        .context("Failed to create service client")?;
    let host = NativeHost::new(
        client_config.frame_source.clone(),
        client_config.default_frame_size,
    );
    let mut controller = WorkflowController::new(
        Arc::new(api),
        Arc::new(host),
        ControllerSettings::from(&client_config),
    );
    let renderer = TerminalRenderer::new(client_config.output_dir.clone());

    let result = match args.command.unwrap_or(Command::Run) {
        Command::Run => run_console(&mut controller, &renderer).await,
        Command::Detect { path, recipe } => {
            run_once(&mut controller, &renderer, path, recipe).await
        }
    };

    controller.dispose();
    info!("Shutdown complete");
    result
}

fn render(controller: &WorkflowController, renderer: &TerminalRenderer) -> Result<()> {
    let projection = Projection::of(controller);
    let text = renderer
        .render(&projection, controller.host().as_ref())
        .context("Failed to write preview")?;
    println!("{}", text);
    Ok(())
}

/// Interactive loop: console lines and completions share one actor
async fn run_console(controller: &mut WorkflowController, renderer: &TerminalRenderer) -> Result<()> {
    let (line_tx, mut line_rx) = mpsc::unbounded_channel::<String>();
    tokio::spawn(async move {
        let mut lines = tokio::io::BufReader::new(tokio::io::stdin()).lines();
        while let Ok(Some(line)) = lines.next_line().await {
            if line_tx.send(line).is_err() {
                break;
            }
        }
    });

    println!("{}", HELP_TEXT);
    render(controller, renderer)?;

    loop {
        tokio::select! {
            line = line_rx.recv() => {
                let Some(line) = line else {
                    info!("Input closed");
                    break;
                };
                match parse_command(&line) {
                    Ok(Some(command)) => {
                        if !apply_command(controller, command) {
                            break;
                        }
                        render(controller, renderer)?;
                    }
                    Ok(None) => {}
                    Err(message) => eprintln!("{}", message),
                }
            }
            settled = controller.settle() => {
                debug!(?settled, "Completion applied");
                render(controller, renderer)?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted");
                break;
            }
        }
    }

    Ok(())
}

/// Upload one file, detect, optionally generate a recipe, then print
async fn run_once(
    controller: &mut WorkflowController,
    renderer: &TerminalRenderer,
    path: PathBuf,
    recipe: bool,
) -> Result<()> {
    let file = load_file(&path).with_context(|| format!("Failed to read {}", path.display()))?;
    controller.select_file(Some(file))?;
    controller.detect()?;
    while controller.state() == WorkflowState::Detecting {
        controller.settle().await;
    }

    if recipe && controller.recipe_enabled() {
        controller.generate_recipe();
        while controller.state() == WorkflowState::GeneratingRecipe {
            controller.settle().await;
        }
    }

    render(controller, renderer)?;

    if controller.state() != WorkflowState::Detected {
        let message = controller
            .status()
            .map(|s| s.text.clone())
            .unwrap_or_else(|| "detection failed".to_string());
        return Err(anyhow!(message));
    }
    Ok(())
}
