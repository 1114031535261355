use std::io::{IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::cli::html::{self, Zoom};
use crate::cli::renderer;
use crate::core::view::View;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OutputFormat {
    Html,
    Text,
}

impl OutputFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "html" => Some(Self::Html),
            "text" => Some(Self::Text),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OutputOptions {
    pub format: OutputFormat,
    pub use_color: bool,
    pub zoom: Zoom,
    /// Write rendered output here instead of stdout.
    pub output: Option<PathBuf>,
}

impl OutputOptions {
    /// Spinner and in-place redraws only make sense on an interactive stderr.
    pub fn interactive(&self) -> bool {
        self.format == OutputFormat::Text && self.output.is_none() && std::io::stderr().is_terminal()
    }

    pub fn render(&self, view: &View) -> String {
        match self.format {
            OutputFormat::Html => html::render_view(view, self.zoom),
            OutputFormat::Text => renderer::render_view(view, self.use_color),
        }
    }

    /// Text that continues an already emitted fragment. HTML skips the zoom
    /// controls so their element ids appear once per stream.
    pub fn render_continuation(&self, text: &str) -> String {
        match self.format {
            OutputFormat::Html => html::render_pre(text, self.zoom),
            OutputFormat::Text => renderer::render_view(&View::Plain(text.to_string()), self.use_color),
        }
    }

    pub fn render_error(&self, message: &str) -> String {
        match self.format {
            OutputFormat::Html => html::render_error(message, self.zoom),
            OutputFormat::Text => renderer::render_error(message, self.use_color),
        }
    }

    /// Writes to the output file if one was given, stdout otherwise.
    pub fn emit(&self, content: &str) -> Result<()> {
        match &self.output {
            Some(path) => std::fs::write(path, content)
                .with_context(|| format!("Failed to write {}", path.display())),
            None => {
                let mut stdout = std::io::stdout().lock();
                writeln!(stdout, "{}", content.trim_end_matches('\n'))?;
                stdout.flush()?;
                Ok(())
            }
        }
    }
}

/// `color` is the config setting (`auto`, `always`, `never`).
pub fn detect_color(color_flag: bool, color: &str) -> bool {
    if !color_flag {
        return false;
    }
    match color {
        "always" => true,
        "never" => false,
        _ => {
            if std::env::var("NO_COLOR").is_ok() {
                return false;
            }
            std::io::stdout().is_terminal()
        }
    }
}
