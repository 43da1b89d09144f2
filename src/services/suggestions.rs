use std::collections::HashSet;
use std::time::Instant;

use futures::{stream, StreamExt};
use uuid::Uuid;

use crate::{
    db::WatchlistStore,
    error::AppResult,
    models::{MediaType, Suggestion, SuggestionsResponse, WatchStatus},
    services::{
        providers::{CompletionProvider, MetadataProvider},
        scope,
    },
};

/// Suggestions requested from the completion model per call.
const SUGGESTION_COUNT: usize = 3;

/// Title lookups and searches in flight at once.
const LOOKUP_CONCURRENCY: usize = 4;

/// One line of completion output after parsing.
#[derive(Debug, PartialEq)]
struct ParsedSuggestion {
    title: String,
    reason: String,
}

/// Asks the completion model for titles adjacent to the user's backlog,
/// then grounds each suggested line in a metadata search so the response
/// only carries real, resolvable titles.
pub async fn suggest_titles(
    store: &dyn WatchlistStore,
    metadata: &dyn MetadataProvider,
    completions: &dyn CompletionProvider,
    user_id: Uuid,
) -> AppResult<SuggestionsResponse> {
    let start = Instant::now();

    // 1. Canonical titles for the user's backlog
    let backlog = backlog_titles(store, metadata, user_id).await?;
    if backlog.is_empty() {
        tracing::info!(user_id = %user_id, "Empty backlog, skipping completion call");
        return Ok(SuggestionsResponse {
            recommendations: Vec::new(),
        });
    }

    // 2. One completion round-trip; a provider failure fails the request
    let prompt = build_prompt(&backlog);
    let raw = completions.complete(&prompt).await?;

    // 3. Parse the numbered lines and resolve each against search
    let parsed = parse_suggestions(&raw);
    let recommendations = resolve_suggestions(metadata, parsed).await;

    tracing::info!(
        user_id = %user_id,
        backlog = backlog.len(),
        resolved = recommendations.len(),
        processing_time_ms = start.elapsed().as_millis(),
        "Suggestions built"
    );

    Ok(SuggestionsResponse { recommendations })
}

/// Canonical titles for every unwatched item across the user's visible
/// watchlists, deduplicated by TMDB identity. Failed lookups drop the
/// entry from the prompt with a warning.
async fn backlog_titles(
    store: &dyn WatchlistStore,
    metadata: &dyn MetadataProvider,
    user_id: Uuid,
) -> AppResult<Vec<String>> {
    let visible = scope::visible_watchlists(store, user_id).await?;
    if visible.is_empty() {
        return Ok(Vec::new());
    }

    let watchlist_ids: Vec<Uuid> = visible.iter().map(|w| w.id).collect();
    let items = store.items_in_watchlists(&watchlist_ids).await?;

    let mut seen = HashSet::new();
    let backlog: Vec<(MediaType, i64)> = items
        .into_iter()
        .filter(|item| item.status != WatchStatus::Watched)
        .map(|item| (item.media_type, item.tmdb_id))
        .filter(|key| seen.insert(*key))
        .collect();

    let titles = stream::iter(backlog)
        .map(|(media_type, tmdb_id)| async move {
            match metadata.lookup_title(media_type, tmdb_id).await {
                Ok(title) => Some(title),
                Err(e) => {
                    tracing::warn!(
                        media_type = %media_type,
                        tmdb_id = tmdb_id,
                        error = %e,
                        "Title lookup failed, dropping from prompt"
                    );
                    None
                }
            }
        })
        .buffered(LOOKUP_CONCURRENCY)
        .collect::<Vec<Option<String>>>()
        .await
        .into_iter()
        .flatten()
        .collect();

    Ok(titles)
}

/// Prompt asking for exactly SUGGESTION_COUNT lines of
/// `<number>. <title> - <one-sentence reason>`.
fn build_prompt(titles: &[String]) -> String {
    format!(
        "I have these movies and shows on my watchlist: {}. \
         Recommend exactly {} other titles I might enjoy, and do not repeat \
         anything already on the list. Respond with one suggestion per line \
         in the format: <number>. <title> - <one-sentence reason>",
        titles.join(", "),
        SUGGESTION_COUNT
    )
}

/// Splits completion output into suggestion lines. Blank lines are
/// skipped; a line without a ` - ` separator becomes a title with an
/// empty reason rather than being discarded.
fn parse_suggestions(raw: &str) -> Vec<ParsedSuggestion> {
    raw.lines().filter_map(parse_line).collect()
}

fn parse_line(line: &str) -> Option<ParsedSuggestion> {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return None;
    }

    let unnumbered = strip_ordinal(trimmed);
    let parsed = match unnumbered.split_once(" - ") {
        Some((title, reason)) => ParsedSuggestion {
            title: title.trim().to_string(),
            reason: reason.trim().to_string(),
        },
        None => ParsedSuggestion {
            title: unnumbered.to_string(),
            reason: String::new(),
        },
    };

    Some(parsed)
}

/// Strips a leading ordinal like `1.` or `2)`. Bare numbers stay put, so
/// a line starting with "1984" keeps its title.
fn strip_ordinal(line: &str) -> &str {
    let rest = line.trim_start_matches(|c: char| c.is_ascii_digit());
    if rest.len() == line.len() {
        return line;
    }

    match rest.strip_prefix('.').or_else(|| rest.strip_prefix(')')) {
        Some(after) => after.trim_start(),
        None => line,
    }
}

/// Resolves parsed lines against search, keeping parse order. A line with
/// no hits is dropped with a log; a failed search drops the line with a
/// warning instead of failing the batch.
async fn resolve_suggestions(
    metadata: &dyn MetadataProvider,
    parsed: Vec<ParsedSuggestion>,
) -> Vec<Suggestion> {
    stream::iter(parsed)
        .map(|suggestion| async move {
            match metadata.search(&suggestion.title).await {
                Ok(matches) => match matches.into_iter().next() {
                    Some(hit) => Some(Suggestion {
                        id: hit.tmdb_id,
                        title: hit.title,
                        overview: hit.overview,
                        poster_path: hit.poster_path,
                        vote_average: hit.vote_average,
                        reason: suggestion.reason,
                    }),
                    None => {
                        tracing::info!(
                            title = %suggestion.title,
                            "No search match, dropping suggestion"
                        );
                        None
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        title = %suggestion.title,
                        error = %e,
                        "Search failed, dropping suggestion"
                    );
                    None
                }
            }
        })
        .buffered(LOOKUP_CONCURRENCY)
        .collect::<Vec<Option<Suggestion>>>()
        .await
        .into_iter()
        .flatten()
        .collect()
}
