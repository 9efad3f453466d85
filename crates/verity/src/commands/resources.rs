//! `verity resources`: list the endpoint catalog.

use tabled::Tabled;

use verity_api::ResourceEndpoint;

use crate::cli::GlobalOpts;
use crate::config::Config;
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct ResourceRow {
    #[tabled(rename = "Resource")]
    name: String,
    #[tabled(rename = "Path")]
    path: String,
}

pub fn handle(cfg: &Config, global: &GlobalOpts) -> Result<(), CliError> {
    let endpoints: Vec<ResourceEndpoint> = cfg.catalog()?.iter().cloned().collect();

    let out = output::render_list(
        global.output_format(),
        &endpoints,
        |e| ResourceRow {
            name: e.name.clone(),
            path: format!("/api{}", e.path),
        },
        |e| e.name.clone(),
    );
    output::print_output(&out, global.quiet);
    Ok(())
}
