//! Command-line interface.

use clap::Parser;
use std::path::PathBuf;

use crate::container::CliOverrides;

#[derive(Debug, Parser)]
#[command(name = "v2x-runtime", version, about = "V2X SUMO perception pipeline")]
pub struct Cli {
    /// SUMO scenario (.sumocfg)
    #[arg(long = "config", value_name = "SUMOCFG")]
    pub sumocfg: Option<PathBuf>,

    /// Launch sumo-gui instead of sumo
    #[arg(long)]
    pub gui: bool,

    /// Disable SVG views
    #[arg(long = "no-viz")]
    pub no_viz: bool,

    /// Output directory
    #[arg(long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// TOML settings file
    #[arg(long, value_name = "FILE")]
    pub settings: Option<PathBuf>,

    /// Replay a recorded trace instead of running SUMO
    #[arg(long, value_name = "FILE")]
    pub trace: Option<PathBuf>,

    /// Record the run to a trace file
    #[arg(long, value_name = "FILE")]
    pub record: Option<PathBuf>,

    /// Stop after this many frames (0 = no limit)
    #[arg(long = "max-frames", value_name = "N")]
    pub max_frames: Option<u64>,
}

impl Cli {
    pub fn overrides(&self) -> CliOverrides {
        CliOverrides {
            sumocfg: self.sumocfg.clone(),
            gui: self.gui,
            no_viz: self.no_viz,
            output_dir: self.output.clone(),
            trace_file: self.trace.clone(),
            record_file: self.record.clone(),
            max_frames: self.max_frames,
        }
    }
}
