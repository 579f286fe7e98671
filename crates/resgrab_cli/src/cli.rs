//! Command-line arguments.

use std::path::PathBuf;

use clap::{ArgAction, Parser, ValueEnum};
use resgrab_core::{EnumPatternMode, SpecGrabOptions};

/// Extract every resource referenced by a GoldSrc `.bsp` map.
///
/// Reads `<map>.res` next to the map (running resgen when it is missing),
/// copies each listed resource from the mod directory into
/// `<output-dir>/<map>/` and lists unresolved entries in `missing.txt`.
#[derive(Parser, Debug)]
#[command(name = "resgrab", version)]
pub struct Cli {
    /// Path to the .bsp file (e.g. cstrike/maps/de_dust2.bsp)
    #[arg(value_name = "BSP")]
    pub bsp: Option<PathBuf>,

    /// Output directory (defaults to the current directory)
    #[arg(short, long, env = "RESGRAB_OUTPUT_DIR")]
    pub output_dir: Option<PathBuf>,

    /// Path to the resgen executable, used when the .res file is missing
    #[arg(long, env = "RESGRAB_RESGEN")]
    pub resgen: Option<PathBuf>,

    /// Only grab entries matching this pattern (repeatable)
    #[arg(long = "include", value_name = "PATTERN")]
    pub patterns_include: Vec<String>,

    /// Skip entries matching this pattern (repeatable)
    #[arg(long = "exclude", value_name = "PATTERN")]
    pub patterns_exclude: Vec<String>,

    /// How --include/--exclude patterns are interpreted
    #[arg(long, value_enum, default_value_t = PatternMode::Glob)]
    pub pattern_mode: PatternMode,

    /// Report what would be copied without writing anything
    #[arg(long)]
    pub dry_run: bool,

    /// Never prompt; fail when a required path is not given
    #[arg(long)]
    pub no_prompt: bool,

    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Only log warnings and errors
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum PatternMode {
    Glob,
    Regex,
    Literal,
}

impl From<PatternMode> for EnumPatternMode {
    fn from(value: PatternMode) -> Self {
        match value {
            PatternMode::Glob => Self::Glob,
            PatternMode::Regex => Self::Regex,
            PatternMode::Literal => Self::Literal,
        }
    }
}

impl Cli {
    pub fn grab_options(&self) -> SpecGrabOptions {
        let to_option = |l: &[String]| (!l.is_empty()).then(|| l.to_vec());
        SpecGrabOptions {
            patterns_include: to_option(&self.patterns_include),
            patterns_exclude: to_option(&self.patterns_exclude),
            rule_pattern: self.pattern_mode.into(),
            if_dry_run: self.dry_run,
        }
    }

    /// Default `EnvFilter` directive when `RUST_LOG` is unset.
    pub fn log_directive(&self) -> &'static str {
        if self.quiet {
            return "warn";
        }
        match self.verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
