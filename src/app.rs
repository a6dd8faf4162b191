use std::io::BufRead;
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::cli::{Cli, ProviderArg, RecordArgs};
use crate::config::Config;
use crate::error::{AppError, AppResult};
use crate::notify::{ConsoleNotifier, Notice, Notifier, ReadbackMode};
use crate::output::{print_json, print_lines, tail};
use crate::permission::ConfigAuthority;
use crate::provider::{LocationProvider, ReplayProvider, SimulatedProvider};
use crate::session::{Command, Outcome, SessionManager};
use crate::store::LogStore;

const POLL_INTERVAL: Duration = Duration::from_millis(20);

pub(crate) struct CommandContext<'a> {
    pub(crate) cli: &'a Cli,
    pub(crate) config: &'a Config,
    pub(crate) log_path: PathBuf,
}

fn build_provider(args: &RecordArgs) -> AppResult<Arc<dyn LocationProvider>> {
    match args.provider {
        ProviderArg::Replay => {
            let Some(path) = &args.samples else {
                return Err(AppError::InvalidConfig {
                    reason: "--samples is required with the replay provider".to_string(),
                });
            };
            let mut provider = ReplayProvider::from_file(path, args.batch_size)?;
            if let Some(count) = args.count {
                provider = provider.truncate(usize::try_from(count).unwrap_or(usize::MAX));
            }
            debug!(fixes = provider.len(), path = %path.display(), "replay loaded");
            Ok(Arc::new(provider))
        }
        ProviderArg::Simulated => {
            let mut provider = SimulatedProvider::new(args.origin);
            if let Some(count) = args.count {
                provider = provider.with_limit(count);
            }
            Ok(Arc::new(provider))
        }
    }
}

/// Flag raised when a line (or EOF) arrives on stdin
fn watch_stdin() -> Arc<AtomicBool> {
    let flag = Arc::new(AtomicBool::new(false));
    let raised = Arc::clone(&flag);
    let spawned = thread::Builder::new()
        .name("stdin-stop".to_string())
        .spawn(move || {
            let mut line = String::new();
            let _ = std::io::stdin().lock().read_line(&mut line);
            raised.store(true, Ordering::Relaxed);
        });
    if let Err(e) = spawned {
        warn!("cannot watch stdin: {e}");
    }
    flag
}

/// Block until the provider runs dry, the duration passes, or the user
/// presses Enter
fn wait_for_stop(manager: &SessionManager, args: &RecordArgs, notifier: &dyn Notifier) {
    let deadline = args
        .duration_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let endless = args.provider == ProviderArg::Simulated && args.count.is_none() && deadline.is_none();
    let stop_requested = if endless {
        notifier.status("Press Enter to stop logging");
        Some(watch_stdin())
    } else {
        None
    };

    loop {
        if !manager.is_active() {
            return;
        }
        if manager.provider_exhausted() {
            debug!(logged = manager.samples_logged(), "provider exhausted");
            return;
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            return;
        }
        if stop_requested
            .as_ref()
            .is_some_and(|flag| flag.load(Ordering::Relaxed))
        {
            return;
        }
        thread::sleep(POLL_INTERVAL);
    }
}

pub(crate) fn handle_record(args: &RecordArgs, ctx: &CommandContext<'_>) -> AppResult<()> {
    let session_config = args.session_config(ctx.config);
    session_config.validate()?;
    let provider = build_provider(args)?;

    let readback = if ctx.cli.json || args.quiet_readback {
        ReadbackMode::Off
    } else {
        ReadbackMode::Text
    };
    let notifier: Arc<dyn Notifier> = Arc::new(ConsoleNotifier::new(readback));

    let store = Arc::new(LogStore::new(&ctx.log_path));
    if store.initialize().is_err() && store.claim_degraded_notice() {
        notifier.notify(Notice::StorageDegraded);
    }

    let storage_dir = ctx
        .log_path
        .parent()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));
    let authority = Arc::new(ConfigAuthority::new(
        args.location_allowed(ctx.config),
        storage_dir,
    ));

    let manager = SessionManager::new(provider, authority, Arc::clone(&notifier), store);
    manager.execute(Command::StartLogging(session_config))?;
    debug!(config = ?manager.active_config(), "recording");
    wait_for_stop(&manager, args, notifier.as_ref());

    if let Outcome::Stopped(report) = manager.execute(Command::StopLogging)? {
        if ctx.cli.json {
            print_json(&report);
        }
        if report.write_failures > 0 {
            warn!(
                failures = report.write_failures,
                "some samples could not be written"
            );
        }
    }
    Ok(())
}

pub(crate) fn handle_show(tail_lines: Option<usize>, ctx: &CommandContext<'_>) -> AppResult<()> {
    let store = LogStore::new(&ctx.log_path);
    let lines = store.read_all()?;
    let shown = tail(&lines, tail_lines);
    if ctx.cli.json {
        print_json(&serde_json::json!({
            "log_file": store.path(),
            "lines": shown,
        }));
    } else {
        print_lines(shown);
    }
    Ok(())
}

pub(crate) fn handle_path(ctx: &CommandContext<'_>) {
    if ctx.cli.json {
        print_json(&serde_json::json!({ "log_file": ctx.log_path }));
    } else {
        println!("{}", ctx.log_path.display());
    }
}
