pub(crate) mod args;
pub(crate) mod commands;

pub(crate) use args::{Cli, ProviderArg, RecordArgs};
pub(crate) use commands::Commands;
