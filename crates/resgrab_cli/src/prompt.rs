//! Interactive prompts for paths not given on the command line.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::{Context, Result, bail};

pub struct Prompter<R, W> {
    reader: R,
    writer: W,
}

impl<R: BufRead, W: Write> Prompter<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Print `question` and return the trimmed answer.
    pub fn ask(&mut self, question: &str) -> Result<String> {
        write!(self.writer, "{question}").context("failed to write prompt")?;
        self.writer.flush().context("failed to flush prompt")?;

        let mut answer = String::new();
        let n_read = self
            .reader
            .read_line(&mut answer)
            .context("failed to read answer")?;
        if n_read == 0 {
            bail!("input closed while waiting for: {}", question.trim_end());
        }
        Ok(answer.trim().to_string())
    }

    /// Empty answer means the current directory.
    pub fn ask_output_dir(&mut self) -> Result<PathBuf> {
        let answer = self.ask("Output directory (Enter to use current directory): ")?;
        if answer.is_empty() {
            return std::env::current_dir().context("failed to resolve current directory");
        }
        Ok(PathBuf::from(answer))
    }

    pub fn ask_bsp_path(&mut self) -> Result<PathBuf> {
        let answer = self.ask("Full path to the .bsp file (e.g. cstrike/maps/de_dust2.bsp): ")?;
        if answer.is_empty() {
            bail!("no .bsp path given");
        }
        Ok(PathBuf::from(answer))
    }

    pub fn ask_resgen_path(&mut self) -> Result<PathBuf> {
        writeln!(self.writer, "Please provide the path to resgen")?;
        let answer = self.ask("Path to resgen: ")?;
        if answer.is_empty() {
            bail!("no resgen path given");
        }
        Ok(PathBuf::from(answer))
    }
}
