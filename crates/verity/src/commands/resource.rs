//! `verity create|update|delete` handlers.

use tracing::debug;

use verity_api::{Action, ResourceRequest};

use crate::cli::{DeleteArgs, GlobalOpts, WriteArgs};
use crate::config::Context;
use crate::error::CliError;
use crate::output;

use super::util;

pub async fn handle_write(
    ctx: &Context,
    action: Action,
    args: WriteArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let payload = util::read_payload(&args.payload)?;
    let request = util::build_request(
        &ctx.catalog,
        &args.resource,
        action,
        &args.query,
        Some(payload),
    )?;
    execute(ctx, &request, global).await
}

pub async fn handle_delete(
    ctx: &Context,
    args: DeleteArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let request = util::build_request(
        &ctx.catalog,
        &args.resource,
        Action::Delete,
        &args.query,
        None,
    )?;

    let target = describe_query(&request);
    if !util::confirm(
        &format!("Delete from '{}'{target}? This is destructive.", args.resource),
        Action::Delete,
        global.yes,
    )? {
        return Ok(());
    }
    execute(ctx, &request, global).await
}

async fn execute(
    ctx: &Context,
    request: &ResourceRequest,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    debug!(profile = %ctx.profile, resource = %request.endpoint.name, action = %request.action, "running");

    let result = ctx.dispatcher.run(&ctx.settings.auth, request).await?;

    let color = output::should_color(global.color_mode());
    let out = output::render_single(
        global.output_format(),
        &result,
        |r| output::result_detail(r, color),
        |r| output::response_plain(&r.response),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}

fn describe_query(request: &ResourceRequest) -> String {
    let pairs = request.query_pairs();
    if pairs.is_empty() {
        return String::new();
    }
    let joined: Vec<String> = pairs.iter().map(|(k, v)| format!("{k}={v}")).collect();
    format!(" ({})", joined.join(", "))
}
