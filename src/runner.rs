//! Application runner - resolves settings and dispatches the subcommand.

use anyhow::{Context, Result};
use log::{info, trace};
use std::path::Path;
use std::sync::Arc;

use crate::cli::{Args, Command, FilterArgs};
use crate::config::{self, PathConfig, Settings};
use crate::console::Console;
use crate::core::source::FrameSource;
use crate::shell::Shell;

/// Settings file merged with CLI overrides.
pub fn resolve_settings(args: &Args, path_config: &PathConfig) -> Settings {
    let mut settings = Settings::load(path_config);
    if let Some(tool) = &args.tool {
        settings.tool = tool.clone();
    }
    if let Some(ms) = args.debounce_ms {
        settings.debounce_ms = ms;
    }
    settings
}

pub fn run(args: Args) -> Result<()> {
    let path_config = PathConfig::from_env_and_cli(args.config_dir.clone());
    info!(
        "Config path: {}",
        config::config_file(config::SETTINGS_FILE, &path_config).display()
    );
    trace!("Command-line args: {:?}", args);

    let settings = resolve_settings(&args, &path_config);
    let shell = Shell::new(settings).context("Failed to set up cache directory")?;

    match args.command {
        Command::Preview { file } => {
            let console = Console::open(&shell, file)?;
            console.run(std::io::stdin().lock())
        }
        Command::Frame {
            file,
            time,
            out,
            filters,
        } => render_frame(&shell, &file, time, &out, &filters),
        Command::Export { file, filters } => {
            let out = shell
                .exporter()
                .export(&file, &filters.to_state())
                .map_err(|e| anyhow::anyhow!("Export failed: {}", e.diagnostic().trim_end()))?;
            println!("{}", out.display());
            Ok(())
        }
    }
}

fn render_frame(shell: &Shell, file: &Path, time: f64, out: &Path, filters: &FilterArgs) -> Result<()> {
    let source: Arc<dyn FrameSource> = shell.open_source(file);
    let rendered = shell
        .render_frame(source, time, &filters.to_state())
        .map_err(|e| anyhow::anyhow!("Render failed: {}", e.diagnostic().trim_end()))?;
    config::ensure_parent(out)?;
    std::fs::copy(&rendered, out)
        .with_context(|| format!("Failed to copy {} to {}", rendered.display(), out.display()))?;
    println!("{}", out.display());
    Ok(())
}
