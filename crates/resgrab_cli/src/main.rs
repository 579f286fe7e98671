//! `resgrab`: extract the resources referenced by a GoldSrc `.bsp` map.
//!
//! # Usage
//!
//! ```bash
//! resgrab cstrike/maps/de_dust2.bsp --output-dir out --resgen /opt/resgen
//! ```
//!
//! Paths that are not given on the command line are asked for interactively
//! unless `--no-prompt` is set or stdin is not a terminal.

mod cli;
mod prompt;

use std::io::{self, IsTerminal, StdinLock, Stdout};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use anyhow::{Context, Result, bail};
use clap::Parser;
use resgrab_core::{
    EnumManifestSource, EnumRunOutcome, ProcessGenerator, ResGrabError, SpecRunContext, run_grab,
};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::Cli;
use crate::prompt::Prompter;

const N_EXIT_SUCCESS: u8 = 0;
const N_EXIT_FAILURE: u8 = 1;
const N_EXIT_INTERRUPTED: u8 = 130;

type TypeStdPrompter = Prompter<StdinLock<'static>, Stdout>;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.log_directive());

    let flag_interrupt = Arc::new(AtomicBool::new(false));
    let flag_pipeline = Arc::new(AtomicBool::new(false));
    install_interrupt_handler(Arc::clone(&flag_interrupt), Arc::clone(&flag_pipeline));

    let res_run = run(&cli, &flag_interrupt, &flag_pipeline);
    ExitCode::from(derive_exit_code(&res_run, &flag_interrupt))
}

/// Map the run result to a process exit status, logging the outcome.
///
/// A raised interrupt flag wins over a successful result: the last copy or
/// the report write may have finished after Ctrl+C was pressed.
fn derive_exit_code(res_run: &Result<()>, flag_interrupt: &AtomicBool) -> u8 {
    let b_interrupted = flag_interrupt.load(Ordering::SeqCst)
        || matches!(
            res_run
                .as_ref()
                .err()
                .and_then(|e| e.downcast_ref::<ResGrabError>()),
            Some(ResGrabError::Interrupted)
        );
    if b_interrupted {
        warn!("Process interrupted by user");
        return N_EXIT_INTERRUPTED;
    }
    match res_run {
        Ok(()) => N_EXIT_SUCCESS,
        Err(e) => {
            error!("{e:#}");
            N_EXIT_FAILURE
        }
    }
}

fn init_logging(c_default_directive: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(c_default_directive));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_writer(io::stderr),
        )
        .init();
}

/// Outside the copy phase an interrupt exits at once; during it the engine
/// stops between entries. A second interrupt always exits at once.
fn install_interrupt_handler(flag_interrupt: Arc<AtomicBool>, flag_pipeline: Arc<AtomicBool>) {
    let res_handler = ctrlc::set_handler(move || {
        let b_was_set = flag_interrupt.swap(true, Ordering::SeqCst);
        if b_was_set || !flag_pipeline.load(Ordering::SeqCst) {
            eprintln!("\nProcess interrupted by user.");
            std::process::exit(i32::from(N_EXIT_INTERRUPTED));
        }
        eprintln!("\nInterrupt received; stopping after the current file...");
    });
    if let Err(e) = res_handler {
        warn!(error = %e, "Failed to install Ctrl+C handler");
    }
}

fn run(cli: &Cli, flag_interrupt: &AtomicBool, flag_pipeline: &AtomicBool) -> Result<()> {
    let mut prompter: Option<TypeStdPrompter> =
        (!cli.no_prompt && io::stdin().is_terminal())
            .then(|| Prompter::new(io::stdin().lock(), io::stdout()));

    let path_dir_output = match (&cli.output_dir, prompter.as_mut()) {
        (Some(path), _) => path.clone(),
        (None, Some(prompter)) => prompter.ask_output_dir()?,
        (None, None) => std::env::current_dir().context("failed to resolve current directory")?,
    };
    let path_file_bsp = match (&cli.bsp, prompter.as_mut()) {
        (Some(path), _) => path.clone(),
        (None, Some(prompter)) => prompter.ask_bsp_path()?,
        (None, None) => bail!("no .bsp path given (pass it as an argument)"),
    };

    let spec_run_ctx = SpecRunContext::new(&path_dir_output, &path_file_bsp)?;
    info!(
        map = spec_run_ctx.name_artifact(),
        content_root = %spec_run_ctx.path_dir_content_root().display(),
        "Map located"
    );

    let path_resgen = cli.resgen.clone();
    let derive_generator = move || -> resgrab_core::Result<ProcessGenerator> {
        let path_file_exe = match (path_resgen, prompter.as_mut()) {
            (Some(path), _) => path,
            (None, Some(prompter)) => {
                prompter
                    .ask_resgen_path()
                    .map_err(|e| ResGrabError::GeneratorNotFound {
                        path: PathBuf::new(),
                        message: format!("{e:#}"),
                    })?
            }
            (None, None) => {
                return Err(ResGrabError::GeneratorNotFound {
                    path: PathBuf::new(),
                    message: "no generator path given (use --resgen)".to_string(),
                });
            }
        };
        Ok(ProcessGenerator::new(path_file_exe))
    };

    flag_pipeline.store(true, Ordering::SeqCst);
    let outcome = run_grab(
        &spec_run_ctx,
        &cli.grab_options(),
        derive_generator,
        flag_interrupt,
    );
    flag_pipeline.store(false, Ordering::SeqCst);

    match outcome? {
        EnumRunOutcome::NoResources { manifest } => {
            println!(
                "No resources found in {}.",
                manifest.path().display()
            );
        }
        EnumRunOutcome::Completed {
            manifest,
            report,
            path_file_report,
        } => {
            if let EnumManifestSource::Generated(path) = &manifest {
                info!(manifest = %path.display(), "Manifest generated by resgen");
            }
            for warning in &report.warnings {
                warn!("{warning}");
            }
            if let Some(path) = &path_file_report {
                println!("Missing files saved to: {}", path.display());
            }

            let summary = report.summary();
            println!();
            println!("Process completed!");
            println!("Summary:");
            println!("   - Total resources: {}", summary.cnt_total);
            if summary.if_dry_run {
                println!("   - Would copy: {}", summary.cnt_copied);
            } else {
                println!("   - Successfully copied: {}", summary.cnt_copied);
            }
            println!("   - Missing files: {}", summary.cnt_missing);
            println!("   - Output directory: {}", summary.path_dir_output.display());
            info!("{summary}");
        }
    }
    Ok(())
}
