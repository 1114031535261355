use std::io::{self, IsTerminal, Write};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    cursor,
    terminal::{self, ClearType},
    QueueableCommand,
};
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::cli::output::OutputOptions;
use crate::cli::report_cmd;
use crate::core::config::AppConfig;
use crate::core::live::{LiveController, LiveMode, LiveUpdate, DEFAULT_PERIOD};
use crate::core::models::request::{CommandRequest, ReportKind, ReportOptions};
use crate::core::pipeline::{render, RenderContext};
use crate::core::process::Invoker;
use crate::core::state::UiState;
use crate::core::view::View;

/// How long a stopped session waits for ticks that were already dispatched.
const LATE_TICK_GRACE: Duration = Duration::from_secs(10);

/// Tracks what has already reached the terminal so a growing transcript is
/// printed incrementally.
struct LivePrinter<'a> {
    opts: &'a OutputOptions,
    breakdown: bool,
    /// Snapshots redraw the screen instead of scrolling.
    redraw: bool,
    printed: usize,
    /// Whether the first transcript chunk has gone out.
    started: bool,
}

impl<'a> LivePrinter<'a> {
    fn show(&mut self, update: LiveUpdate) -> Result<()> {
        match update {
            LiveUpdate::Transcript(text) => self.transcript(&text),
            LiveUpdate::Snapshot(raw) => {
                match render(&raw, &RenderContext::new(self.breakdown, true)) {
                    Ok(view) => self.replace(&self.opts.render(&view)),
                    Err(e) => self.replace(&self.opts.render_error(&e.to_string())),
                }
            }
            LiveUpdate::Error(message) => {
                let rendered = self.opts.render_error(&message);
                if self.opts.output.is_some() {
                    self.opts.emit(&rendered)
                } else {
                    eprintln!("{}", rendered);
                    Ok(())
                }
            }
            LiveUpdate::Ignored => Ok(()),
        }
    }

    fn transcript(&mut self, text: &str) -> Result<()> {
        match self.transcript_chunk(text) {
            Some(chunk) => self.opts.emit(&chunk),
            None => Ok(()),
        }
    }

    /// The part of `text` not yet shown. An output file is rewritten whole
    /// each time; stdout gets the full fragment once, then bare continuations.
    fn transcript_chunk(&mut self, text: &str) -> Option<String> {
        if self.opts.output.is_some() || self.printed > text.len() {
            self.printed = text.len();
            self.started = true;
            return Some(self.opts.render(&View::Plain(text.to_string())));
        }
        let fresh = &text[self.printed..];
        self.printed = text.len();
        if fresh.trim().is_empty() {
            return None;
        }
        if self.started {
            return Some(self.opts.render_continuation(fresh));
        }
        self.started = true;
        Some(self.opts.render(&View::Plain(fresh.to_string())))
    }

    fn replace(&self, rendered: &str) -> Result<()> {
        if self.redraw {
            let mut stdout = io::stdout();
            stdout
                .queue(terminal::Clear(ClearType::All))?
                .queue(cursor::MoveTo(0, 0))?;
            stdout.flush()?;
        }
        self.opts.emit(rendered)
    }
}

/// Report a line typed during live monitoring switches to.
fn view_for_key(line: &str) -> Option<ReportKind> {
    match line.trim() {
        "d" => Some(ReportKind::Daily),
        "m" => Some(ReportKind::Monthly),
        "s" => Some(ReportKind::Session),
        "b" => Some(ReportKind::Blocks),
        _ => None,
    }
}

/// Lines typed on an interactive stdin. Blocking reads stay on their own
/// thread so they never hold up runtime shutdown.
fn spawn_key_reader() -> mpsc::UnboundedReceiver<String> {
    let (tx, rx) = mpsc::unbounded_channel();
    if io::stdin().is_terminal() {
        std::thread::spawn(move || {
            for line in io::stdin().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    }
    rx
}

/// Polls `blocks --active` until Ctrl-C, or until another report is chosen.
pub async fn run(
    state: &mut UiState,
    options: &ReportOptions,
    config: &AppConfig,
    opts: &OutputOptions,
) -> Result<()> {
    let invoker = Arc::new(Invoker::from_config(&config.collaborator));
    let period = match config.settings.refresh_secs {
        0 => DEFAULT_PERIOD,
        secs => Duration::from_secs(secs),
    };
    let (mut live, mut outcomes) = LiveController::new(invoker, period);

    let token = live
        .start(CommandRequest::new(state.view(), options))
        .context("Live monitoring is already running")?;

    let mut printer = LivePrinter {
        opts,
        breakdown: options.breakdown,
        redraw: live.mode() == LiveMode::Structured && opts.interactive(),
        printed: 0,
        started: false,
    };
    printer.show(LiveUpdate::Transcript(live.state().accumulated_text.clone()))?;

    let mut keys = spawn_key_reader();
    if opts.interactive() {
        eprintln!("Ctrl-C stops monitoring; d, m, s or b then Enter switches report.");
    }

    let mut next_view = None;
    while live.is_polling() {
        tokio::select! {
            Some(outcome) = outcomes.recv() => {
                let update = live.apply(outcome);
                printer.show(update)?;
            }
            Some(line) = keys.recv() => {
                if let Some(view) = view_for_key(&line).filter(|v| state.select(*v)) {
                    next_view = Some(view);
                    break;
                }
            }
            signal = tokio::signal::ctrl_c() => {
                signal.context("Failed to listen for Ctrl-C")?;
                break;
            }
        }
    }

    match next_view {
        Some(view) => {
            live.switch_view(view);
            drop(token);
            report_cmd::run(state, options, config, opts).await
        }
        None => {
            printer.show(live.stop(token))?;
            let deadline = Instant::now() + LATE_TICK_GRACE;
            while live.pending_ticks() > 0 {
                tokio::select! {
                    late = tokio::time::timeout_at(deadline, outcomes.recv()) => match late {
                        Ok(Some(outcome)) => printer.show(live.apply(outcome))?,
                        _ => {
                            tracing::debug!(pending = live.pending_ticks(), "gave up waiting for late ticks");
                            break;
                        }
                    },
                    _ = tokio::signal::ctrl_c() => break,
                }
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::html::Zoom;
    use crate::cli::output::OutputFormat;

    #[test]
    fn keys_map_to_reports() {
        assert_eq!(view_for_key("d\n"), Some(ReportKind::Daily));
        assert_eq!(view_for_key(" m "), Some(ReportKind::Monthly));
        assert_eq!(view_for_key("s"), Some(ReportKind::Session));
        assert_eq!(view_for_key("b"), Some(ReportKind::Blocks));
        assert_eq!(view_for_key("x"), None);
        assert_eq!(view_for_key(""), None);
    }

    #[test]
    fn html_stream_carries_controls_once() {
        let opts = OutputOptions {
            format: OutputFormat::Html,
            use_color: false,
            zoom: Zoom::default(),
            output: None,
        };
        let mut printer = LivePrinter {
            opts: &opts,
            breakdown: false,
            redraw: false,
            printed: 0,
            started: false,
        };

        let mut text = String::from("Live monitoring started\n");
        let first = printer.transcript_chunk(&text).unwrap();
        assert!(first.contains("output-controls"));

        text.push_str("[10:00:00] tick 0\n");
        let second = printer.transcript_chunk(&text).unwrap();
        assert!(second.contains("<pre"));
        assert!(second.contains("tick 0"));
        assert!(!second.contains("Live monitoring started"));
        assert!(!second.contains("output-controls"));

        text.push('\n');
        assert!(printer.transcript_chunk(&text).is_none());
    }

    #[test]
    fn file_output_rewrites_whole_transcript() {
        let opts = OutputOptions {
            format: OutputFormat::Html,
            use_color: false,
            zoom: Zoom::default(),
            output: Some(std::env::temp_dir().join("ccview-live-unused.html")),
        };
        let mut printer = LivePrinter {
            opts: &opts,
            breakdown: false,
            redraw: false,
            printed: 0,
            started: false,
        };
        printer.transcript_chunk("Live monitoring started\n");
        let again = printer
            .transcript_chunk("Live monitoring started\n[10:00:00] tick 0\n")
            .unwrap();
        assert!(again.contains("output-controls"));
        assert!(again.contains("Live monitoring started"));
    }
}
