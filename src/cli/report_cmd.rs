use anyhow::{bail, Result};

use crate::cli::output::OutputOptions;
use crate::core::config::AppConfig;
use crate::core::models::request::{ReportKind, ReportOptions};
use crate::core::pipeline::{render, RenderContext};
use crate::core::process::{CommandResult, Invoker};
use crate::core::state::UiState;

async fn fetch(invoker: &Invoker, kind: ReportKind, options: &ReportOptions) -> CommandResult {
    match kind {
        ReportKind::Daily => invoker.daily(options).await,
        ReportKind::Monthly => invoker.monthly(options).await,
        ReportKind::Session => invoker.session(options).await,
        ReportKind::Blocks => invoker.blocks(options).await,
        ReportKind::BlocksLive => invoker.blocks_live(options).await,
    }
}

fn start_spinner(message: String) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let frames = ['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];
        let mut i = 0usize;
        loop {
            eprint!("\r {} {}", frames[i % frames.len()], message);
            i = i.wrapping_add(1);
            tokio::time::sleep(std::time::Duration::from_millis(80)).await;
        }
    })
}

/// Runs the report selected in `state` and renders it. A failed run is shown
/// as an error view and the process exits non-zero.
pub async fn run(
    state: &mut UiState,
    options: &ReportOptions,
    config: &AppConfig,
    opts: &OutputOptions,
) -> Result<()> {
    let kind = state.view();
    if !state.try_begin() {
        bail!("A report is already running");
    }

    let invoker = Invoker::from_config(&config.collaborator);

    // Show spinner on stderr (interactive text mode only)
    let spinner = opts
        .interactive()
        .then(|| start_spinner(format!("Running ccusage {}...", kind.command())));

    let result = fetch(&invoker, kind, options).await;

    if let Some(s) = spinner {
        s.abort();
        eprint!("\r\x1b[2K");
    }
    state.finish();

    let message = match result {
        Ok(raw) => match render(&raw, &RenderContext::new(options.breakdown, false)) {
            Ok(view) => return opts.emit(&opts.render(&view)),
            Err(e) => e.to_string(),
        },
        Err(e) => {
            let detail = e.detail();
            tracing::debug!(args = ?detail.args, cwd = ?detail.cwd, "report failed");
            e.to_string()
        }
    };

    opts.emit(&opts.render_error(&message))?;
    std::process::exit(1);
}
