use serde_json::json;

use rw_core::entities::{NewWatchList, WatchCriteria};
use rw_db::repos::match_record::MatchFilter;
use rw_db::updates::watch_list::WatchListUpdateBuilder;

use crate::cli::GlobalFlags;
use crate::cli::subcommands::WatchlistCommands;
use crate::commands::shared::limit::effective_limit;
use crate::commands::shared::parse::parse_threshold;
use crate::context::AppContext;
use crate::output::output;

/// Handle `regwatch watchlist`.
pub async fn handle(
    action: &WatchlistCommands,
    ctx: &AppContext,
    flags: &GlobalFlags,
) -> anyhow::Result<()> {
    match action {
        WatchlistCommands::Create {
            owner,
            name,
            description,
            keyword,
            authority,
            sector,
            threshold,
            disabled,
        } => {
            let list = ctx
                .service
                .create_watch_list(NewWatchList {
                    owner_id: owner.clone(),
                    name: name.clone(),
                    description: description.clone(),
                    criteria: WatchCriteria {
                        keywords: keyword.clone(),
                        authorities: authority.clone(),
                        sectors: sector.clone(),
                    },
                    alert_threshold: parse_threshold(threshold)?,
                    alert_enabled: !disabled,
                })
                .await?;
            output(&list, flags.format)
        }
        WatchlistCommands::Get { id } => {
            let list = ctx.service.get_watch_list(id).await?;
            let summary = ctx.service.match_summary(id).await?;
            output(&json!({ "watch_list": list, "matches": summary }), flags.format)
        }
        WatchlistCommands::List { owner } => {
            let lists = ctx.service.list_watch_lists(owner.as_deref()).await?;
            output(&lists, flags.format)
        }
        WatchlistCommands::Update {
            id,
            name,
            description,
            keyword,
            authority,
            sector,
            threshold,
            expected_version,
        } => {
            let mut builder = WatchListUpdateBuilder::new();
            if let Some(name) = name {
                builder = builder.name(name.as_str());
            }
            if let Some(description) = description {
                builder = builder.description(Some(description.clone()));
            }
            if !keyword.is_empty() {
                builder = builder.keywords(keyword.clone());
            }
            if !authority.is_empty() {
                builder = builder.authorities(authority.clone());
            }
            if !sector.is_empty() {
                builder = builder.sectors(sector.clone());
            }
            if let Some(threshold) = threshold {
                builder = builder.alert_threshold(parse_threshold(threshold)?);
            }
            if let Some(version) = expected_version {
                builder = builder.expected_version(*version);
            }
            let list = ctx.service.update_watch_list(id, builder.build()).await?;
            output(&list, flags.format)
        }
        WatchlistCommands::Enable { id } => {
            let list = ctx.service.set_watch_list_alerts(id, true).await?;
            output(&list, flags.format)
        }
        WatchlistCommands::Disable { id } => {
            let list = ctx.service.set_watch_list_alerts(id, false).await?;
            output(&list, flags.format)
        }
        WatchlistCommands::Delete { id } => {
            let deletion = ctx.service.delete_watch_list(id).await?;
            output(&deletion, flags.format)
        }
        WatchlistCommands::Matches {
            id,
            unreviewed,
            min_score,
            limit,
        } => {
            let filter = MatchFilter {
                reviewed: unreviewed.then_some(false),
                min_score: *min_score,
                limit: Some(effective_limit(*limit, flags, &ctx.config.general)),
            };
            let matches = ctx.service.get_matches_for_watch_list(id, &filter).await?;
            output(&matches, flags.format)
        }
        WatchlistCommands::Review { match_id } => {
            let record = ctx.service.mark_reviewed(match_id).await?;
            output(&record, flags.format)
        }
        WatchlistCommands::ReviewAll { id } => {
            let flipped = ctx.service.mark_all_reviewed(id).await?;
            output(&json!({ "watch_list_id": id, "reviewed": flipped }), flags.format)
        }
    }
}
