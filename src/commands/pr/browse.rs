//! `yx pr browse`: open the change request in a web browser.

use anyhow::Context;
use clap::Args;
use tracing::warn;

use super::common::{RepoContext, TargetArgs, resolve_context};
use super::error::Result;
use crate::infra::yunxiao::{CodeupClient, YunxiaoClient};
use crate::shared::config::Config;
use crate::shared::json::first_str;

const WEB_BASE_URL: &str = "https://codeup.aliyun.com";
const URL_KEYS: &[&str] = &["detailUrl", "webUrl", "web_url", "url"];

#[derive(Args, Clone, Debug, PartialEq, Eq)]
pub struct BrowseArgs {
    #[command(flatten)]
    pub target: TargetArgs,

    /// Print the URL instead of opening it
    #[arg(short = 'n', long = "no-browser")]
    pub no_browser: bool,
}

pub async fn run(args: &BrowseArgs, config: &Config) -> Result<()> {
    let client = YunxiaoClient::from_config(&config.api)?;
    run_with_client(args, config, &client).await
}

pub async fn run_with_client(
    args: &BrowseArgs,
    config: &Config,
    client: &dyn CodeupClient,
) -> Result<()> {
    let ctx = resolve_context(&args.target, &config.defaults)?;
    let url = change_request_url(client, &ctx, args.target.id).await;

    if args.no_browser {
        println!("{url}");
        return Ok(());
    }
    eprintln!("Opening {url} in your browser.");
    open::that(&url).with_context(|| format!("Failed to open {url}"))?;
    Ok(())
}

/// The web URL reported by the API, or one built from the context when the
/// detail is unavailable or carries no URL.
pub(crate) async fn change_request_url(
    client: &dyn CodeupClient,
    ctx: &RepoContext,
    local_id: u64,
) -> String {
    match client
        .fetch_change_request_detail(&ctx.organization_id, &ctx.repository_id, local_id)
        .await
    {
        Ok(detail) => {
            if let Some(url) = first_str(&detail, URL_KEYS).filter(|u| u.starts_with("http")) {
                return url;
            }
        }
        Err(e) => warn!(error = %e, "failed to fetch change request detail"),
    }
    format!(
        "{WEB_BASE_URL}/{}/{}/change/{local_id}",
        ctx.organization_id, ctx.repository_id
    )
}
