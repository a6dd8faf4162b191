mod app;
mod cli;
mod config;
mod consts;
mod core;
mod error;
mod logging;
mod notify;
mod output;
mod permission;
mod provider;
mod session;
mod store;

use clap::Parser;

use app::{CommandContext, handle_path, handle_record, handle_show};
use cli::{Cli, Commands};
use config::Config;
use logging::init_logging;
use store::resolve_log_path;

fn main() {
    let cli = Cli::parse();
    let loaded = Config::load();
    init_logging(cli.debug_enabled(&loaded.config));
    loaded.report();

    let config = &loaded.config;
    let ctx = CommandContext {
        cli: &cli,
        config,
        log_path: resolve_log_path(cli.log_file.as_deref(), config.log_file.as_deref()),
    };

    let result = match &cli.command {
        Commands::Record(args) => handle_record(args, &ctx),
        Commands::Show { tail } => handle_show(*tail, &ctx),
        Commands::Path => {
            handle_path(&ctx);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("{e}");
        std::process::exit(1);
    }
}
