//! Line-oriented preview session.
//!
//! Stands in for a player UI: owns the filter state and the video state
//! (position, play flag), turns typed commands into scheduler events and
//! prints every display update as it is published.

use anyhow::{Context, Result};
use log::{debug, info};
use std::io::{BufRead, Write};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread;

use crate::core::filters::{FilterParam, FilterState, SLIDER_MAX, SLIDER_MIN, filter_chain};
use crate::core::events::PreviewUpdate;
use crate::core::scheduler::PreviewScheduler;
use crate::core::source::FrameSource;
use crate::shell::Shell;

pub const HELP: &str = "\
Commands:
  seek <seconds>          move the playhead
  play | pause            toggle playback (playing hides the preview)
  set <param> <0..100>    move a slider: contrast, brightness, saturation, gamma
  custom [expr]           set or clear the custom filter expression
  lut [path]              set or clear the 3D LUT file
  reset                   restore all filters to neutral
  filters                 show the current filter chain
  status                  show position, scheduler phase and displayed frame
  export                  re-encode the whole file with the current filters
  help                    this text
  quit                    leave";

#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Seek(f64),
    Play,
    Pause,
    Set(FilterParam, f64),
    Custom(String),
    Lut(String),
    Reset,
    Filters,
    Status,
    Export,
    Help,
    Quit,
}

/// Parse one input line. `Ok(None)` for blank lines.
pub fn parse_command(line: &str) -> Result<Option<ConsoleCommand>, String> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((w, r)) => (w, r.trim()),
        None => (line, ""),
    };

    let cmd = match word.to_ascii_lowercase().as_str() {
        "" => return Ok(None),
        "seek" | "s" => {
            let t: f64 = rest
                .parse()
                .map_err(|_| format!("seek: expected seconds, got '{rest}'"))?;
            if !t.is_finite() || t < 0.0 {
                return Err(format!("seek: position must be >= 0, got {t}"));
            }
            ConsoleCommand::Seek(t)
        }
        "play" => ConsoleCommand::Play,
        "pause" => ConsoleCommand::Pause,
        "set" => {
            let mut parts = rest.split_whitespace();
            let (Some(name), Some(value), None) = (parts.next(), parts.next(), parts.next()) else {
                return Err("set: usage: set <param> <0..100>".to_string());
            };
            let param =
                FilterParam::from_key(name).ok_or_else(|| format!("set: unknown parameter '{name}'"))?;
            let slider: f64 = value
                .parse()
                .map_err(|_| format!("set: expected a number, got '{value}'"))?;
            if !(SLIDER_MIN..=SLIDER_MAX).contains(&slider) {
                return Err(format!("set: slider must be within 0..100, got {slider}"));
            }
            ConsoleCommand::Set(param, slider)
        }
        "custom" => ConsoleCommand::Custom(rest.to_string()),
        "lut" => ConsoleCommand::Lut(rest.to_string()),
        "reset" => ConsoleCommand::Reset,
        "filters" | "f" => ConsoleCommand::Filters,
        "status" => ConsoleCommand::Status,
        "export" => ConsoleCommand::Export,
        "help" | "?" => ConsoleCommand::Help,
        "quit" | "exit" | "q" => ConsoleCommand::Quit,
        other => return Err(format!("unknown command '{other}' (try 'help')")),
    };
    Ok(Some(cmd))
}

/// Human-readable chain, as passed to the render tool.
pub fn filter_preview(filters: &FilterState) -> String {
    let chain = filter_chain(filters);
    if chain.is_empty() {
        "(none)".to_string()
    } else {
        chain.join(", ")
    }
}

pub fn describe_update(update: &PreviewUpdate) -> String {
    match update {
        PreviewUpdate::FrameReady(path) => format!("frame: {}", path.display()),
        PreviewUpdate::FrameCleared => "frame: (cleared)".to_string(),
        PreviewUpdate::Error(text) => format!("error:\n{}", text.trim_end()),
    }
}

/// Interactive session over one source file.
pub struct Console<'a> {
    shell: &'a Shell,
    scheduler: PreviewScheduler,
    file: PathBuf,
    source: Arc<dyn FrameSource>,
    filters: FilterState,
    time: Option<f64>,
    playing: bool,
}

impl<'a> Console<'a> {
    pub fn open(shell: &'a Shell, file: PathBuf) -> Result<Self> {
        let scheduler = shell
            .spawn_scheduler()
            .context("Failed to start preview scheduler")?;
        let source: Arc<dyn FrameSource> = shell.open_source(&file);
        scheduler.load_source(Arc::clone(&source));
        Ok(Self {
            shell,
            scheduler,
            file,
            source,
            filters: FilterState::default(),
            time: None,
            playing: false,
        })
    }

    /// Read commands from `input` until `quit` or end of input.
    pub fn run(self, input: impl BufRead) -> Result<()> {
        let updates = self.scheduler.updates().clone();
        let printer = thread::Builder::new()
            .name("livegrade-console".into())
            .spawn(move || {
                for update in updates.iter() {
                    println!("{}", describe_update(&update));
                }
            })
            .context("Failed to start update printer")?;

        println!("{} (type 'help' for commands)", self.source.describe());
        if let Some(d) = self.source.duration() {
            println!("duration: {d:.3}s");
        }

        let mut console = self;
        // Position is known once the source is open; start at the first frame
        console.apply(ConsoleCommand::Seek(0.0));
        prompt();

        for line in input.lines() {
            let line = line.context("Failed to read input")?;
            match parse_command(&line) {
                Ok(Some(ConsoleCommand::Quit)) => break,
                Ok(Some(cmd)) => console.apply(cmd),
                Ok(None) => {}
                Err(msg) => println!("{msg}"),
            }
            prompt();
        }

        console.scheduler.shutdown();
        // The update channel closes with the scheduler thread
        let _ = printer.join();
        info!("Preview session ended");
        Ok(())
    }

    fn apply(&mut self, cmd: ConsoleCommand) {
        debug!("Console command: {:?}", cmd);
        match cmd {
            ConsoleCommand::Seek(t) => {
                let t = match self.source.duration() {
                    Some(d) => t.min(d),
                    None => t,
                };
                self.time = Some(t);
                self.scheduler.set_time(self.time);
            }
            ConsoleCommand::Play => {
                self.playing = true;
                self.scheduler.set_playing(true);
            }
            ConsoleCommand::Pause => {
                self.playing = false;
                self.scheduler.set_playing(false);
            }
            ConsoleCommand::Set(param, slider) => {
                self.filters.set_slider(param, slider);
                println!("{} = {:.3}", param, self.filters.value(param));
                self.push_filters();
            }
            ConsoleCommand::Custom(expr) => {
                self.filters.set_custom_expression(expr);
                self.push_filters();
            }
            ConsoleCommand::Lut(path) => {
                self.filters.set_lut3d_path(path);
                self.push_filters();
            }
            ConsoleCommand::Reset => {
                self.filters.reset();
                self.push_filters();
            }
            ConsoleCommand::Filters => println!("filters: {}", filter_preview(&self.filters)),
            ConsoleCommand::Status => self.print_status(),
            ConsoleCommand::Export => self.export(),
            ConsoleCommand::Help => println!("{HELP}"),
            ConsoleCommand::Quit => {}
        }
    }

    fn push_filters(&self) {
        self.scheduler.set_filters(self.filters.clone());
    }

    fn export(&self) {
        println!("exporting {} ...", self.file.display());
        match self.shell.exporter().export(&self.file, &self.filters) {
            Ok(out) => println!("exported: {}", out.display()),
            Err(e) => println!("export failed:\n{}", e.diagnostic().trim_end()),
        }
    }

    fn print_status(&self) {
        let display = self.scheduler.display();
        let position = match self.time {
            Some(t) => format!("{t:.3}s"),
            None => "-".to_string(),
        };
        let stats = self.shell.pipeline().cache().stats();
        println!("position: {position}  playing: {}", self.playing);
        println!("scheduler: {}  renders: {}", self.scheduler.phase(), self.scheduler.renders_started());
        println!(
            "frame: {}",
            display
                .frame
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string())
        );
        if let Some(err) = &display.error {
            println!("error: {}", err.trim_end());
        }
        println!(
            "raw cache: {} hits, {} misses ({:.0}% hit rate)",
            stats.hits(),
            stats.misses(),
            stats.hit_rate() * 100.0
        );
    }
}

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}
