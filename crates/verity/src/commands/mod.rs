//! Command dispatch: bridges CLI args -> resource requests -> output formatting.

pub mod auth;
pub mod config_cmd;
pub mod resource;
pub mod resources;
pub mod run;
pub mod util;

use verity_api::Action;

use crate::cli::{Command, GlobalOpts};
use crate::config::Context;
use crate::error::CliError;

/// Dispatch a controller-bound command to the appropriate handler.
pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Auth => auth::handle(ctx, global).await,
        Command::Create(args) => resource::handle_write(ctx, Action::Create, args, global).await,
        Command::Update(args) => resource::handle_write(ctx, Action::Update, args, global).await,
        Command::Delete(args) => resource::handle_delete(ctx, args, global).await,
        Command::Run(args) => run::handle(ctx, args, global).await,
        // Resources, Config and Completions are handled before dispatch
        Command::Resources | Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
