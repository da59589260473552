use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

use crate::core::filters::{FilterParam, FilterState};

// Build version with target info
const VERSION_INFO: &str = const_format::concatcp!(
    env!("CARGO_PKG_VERSION"), "\n",
    "Render: external tool (ffmpeg-compatible CLI)\n",
    "Target: ", std::env::consts::ARCH, "-", std::env::consts::OS
);

/// Live filter preview and export for video files
#[derive(Parser, Debug)]
#[command(author, version = VERSION_INFO, about, long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Enable logging to file (default: livegrade.log in the data directory)
    #[arg(short = 'l', long = "log", value_name = "LOG_FILE", global = true)]
    pub log_file: Option<Option<PathBuf>>,

    /// Increase logging verbosity (default: warn, -v: info, -vv: debug, -vvv+: trace)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count, global = true)]
    pub verbosity: u8,

    /// Custom configuration directory (overrides default platform paths)
    #[arg(short = 'c', long = "config-dir", value_name = "DIR", global = true)]
    pub config_dir: Option<PathBuf>,

    /// Render tool executable (overrides settings)
    #[arg(long = "tool", value_name = "PATH", global = true)]
    pub tool: Option<String>,

    /// Quiet period before a preview render starts, in milliseconds (overrides settings)
    #[arg(long = "debounce-ms", value_name = "MS", global = true)]
    pub debounce_ms: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Interactive preview session (type `help` at the prompt)
    Preview {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// Render one filtered frame and copy it to OUT
    Frame {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Timeline position in seconds
        #[arg(short = 't', long = "time", value_name = "SECONDS")]
        time: f64,

        #[arg(short = 'o', long = "out", value_name = "OUT")]
        out: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },
    /// Re-encode the whole file with the filter chain (writes <FILE>-encoded.mp4)
    Export {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[command(flatten)]
        filters: FilterArgs,
    },
}

/// Filter parameters in their natural units; values outside a range are clamped.
#[derive(ClapArgs, Debug, Default, Clone)]
pub struct FilterArgs {
    /// Contrast, 0.5..2.0 (neutral 1.0)
    #[arg(long, value_name = "V", allow_negative_numbers = true)]
    pub contrast: Option<f64>,

    /// Brightness, -0.2..0.3 (neutral 0.0)
    #[arg(long, value_name = "V", allow_negative_numbers = true)]
    pub brightness: Option<f64>,

    /// Saturation, 0.0..3.0 (neutral 1.0)
    #[arg(long, value_name = "V", allow_negative_numbers = true)]
    pub saturation: Option<f64>,

    /// Gamma, 0.6..3.0 (neutral 1.0)
    #[arg(long, value_name = "V", allow_negative_numbers = true)]
    pub gamma: Option<f64>,

    /// Custom filter expression placed first in the chain
    #[arg(long = "custom", value_name = "EXPR")]
    pub custom: Option<String>,

    /// 3D LUT file applied after the custom expression
    #[arg(long = "lut", value_name = "PATH")]
    pub lut: Option<String>,
}

impl FilterArgs {
    pub fn to_state(&self) -> FilterState {
        let mut state = FilterState::default();
        let values = [
            (FilterParam::Contrast, self.contrast),
            (FilterParam::Brightness, self.brightness),
            (FilterParam::Saturation, self.saturation),
            (FilterParam::Gamma, self.gamma),
        ];
        for (param, value) in values {
            if let Some(v) = value {
                state.set_value(param, v);
            }
        }
        if let Some(custom) = &self.custom {
            state.set_custom_expression(custom.as_str());
        }
        if let Some(lut) = &self.lut {
            state.set_lut3d_path(lut.as_str());
        }
        state
    }
}
