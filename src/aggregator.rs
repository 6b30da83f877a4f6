//! Content aggregation: concurrent page fetches against the upstream search
//! service, per-record normalization, and the merge/dedup/shuffle policy.
//!
//! Nothing in this module surfaces an error to its callers. Upstream
//! trouble of any kind degrades to fewer (or zero) results, so the HTTP
//! layer can always answer 200 with a well-formed body.

use futures::future::join_all;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashSet;
use std::future::Future;
use std::time::Instant;

use crate::cache::{CacheKey, QueryCache};
use crate::constants::{EMBED_URL_BASE, MAX_CATEGORIES, MAX_TITLE_CHARS};
use crate::upstream::{RawVideo, SearchClient, SearchPage};

/// The stable internal shape every upstream record is mapped into. Also the
/// wire shape: serialized camelCase straight into API responses.
///
/// Invariant: `embed_url` is never empty in a value returned to a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NormalizedVideo {
    pub id: String,
    pub title: String,
    pub poster: String,
    pub rating: f64,
    pub categories: Vec<String>,
    pub duration_minutes: String,
    pub embed_url: String,
    #[serde(default)]
    pub views: u64,
    #[serde(default)]
    pub added: String,
    #[serde(default)]
    pub is_vr: bool,
}

/// Result of one aggregated fetch. `any_page_succeeded` distinguishes a
/// legitimately empty result set from total upstream failure, which is what
/// decides whether stale cache data should be served instead.
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub videos: Vec<NormalizedVideo>,
    pub total: u64,
    pub any_page_succeeded: bool,
}

/// Fetch a single upstream page, swallowing every failure.
///
/// `None` means the page failed (network, timeout, non-200, bad body);
/// `Some` with an empty list is a real empty page. No retry either way.
pub async fn fetch_page(
    client: &SearchClient,
    term: &str,
    page: u32,
    order: &str,
    per_page: u32,
) -> Option<SearchPage> {
    match client.search(term, page, order, per_page).await {
        Ok(body) => Some(body),
        Err(e) => {
            eprintln!("Fetch error for page {} of '{}': {}", page, term, e);
            None
        }
    }
}

/// Map a raw upstream record into the stable shape, or discard it.
///
/// Discarded: records with no id (nothing to key on and no way to build an
/// embed URL) and records that fail even the lenient decode. Missing or
/// malformed numeric fields coerce to zero instead of sinking the record.
pub fn normalize(raw: &Value) -> Option<NormalizedVideo> {
    let record: RawVideo = serde_json::from_value(raw.clone()).ok()?;

    let id = coerce_string(record.id.as_ref())?;
    if id.is_empty() {
        return None;
    }

    // Upstream embed fields are sometimes relative or missing outright;
    // an absolute URL can always be built from the id.
    let embed_url = if record.embed.starts_with("http") {
        record.embed.clone()
    } else {
        format!("{}{}", EMBED_URL_BASE, id)
    };

    let categories = record
        .keywords
        .split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .take(MAX_CATEGORIES)
        .map(String::from)
        .collect();

    Some(NormalizedVideo {
        id,
        title: truncate_chars(&record.title, MAX_TITLE_CHARS),
        poster: record.default_thumb.src.clone(),
        rating: coerce_f64(record.rate.as_ref()),
        categories,
        duration_minutes: coerce_string(record.length_min.as_ref()).unwrap_or_else(|| "0".to_string()),
        embed_url,
        views: coerce_u64(record.views.as_ref()),
        added: record.added.clone(),
        is_vr: coerce_bool(record.is_vr.as_ref()),
    })
}

/// Pure merge step over per-page fetch results, in page order.
///
/// Drops unusable records, deduplicates by id (first occurrence wins, since
/// the upstream repeats entries across adjacent pages) and takes the total
/// as the maximum reported by any successful page, the upstream's per-page
/// totals being only a best estimate.
pub fn merge_pages(pages: &[Option<SearchPage>]) -> (Vec<NormalizedVideo>, u64) {
    let mut videos = Vec::new();
    let mut seen = HashSet::new();
    let mut total = 0u64;

    for page in pages.iter().flatten() {
        total = total.max(page.total_count);
        for raw in &page.videos {
            if let Some(video) = normalize(raw) {
                if seen.insert(video.id.clone()) {
                    videos.push(video);
                }
            }
        }
    }

    (videos, total)
}

/// Fetch `page_count` consecutive upstream pages starting at `first_page`,
/// all in flight at once, then merge. One slow page delays the response by
/// at most its own timeout; it never blocks the other fetches.
pub async fn load_content(
    client: &SearchClient,
    term: &str,
    first_page: u32,
    page_count: u32,
    order: &str,
    per_page: u32,
    shuffle: bool,
) -> FetchOutcome {
    let first_page = first_page.max(1);
    let last_page = first_page.saturating_add(page_count.max(1) - 1);

    let fetches = (first_page..=last_page).map(|page| fetch_page(client, term, page, order, per_page));
    let results: Vec<Option<SearchPage>> = join_all(fetches).await;

    let any_page_succeeded = results.iter().any(Option::is_some);
    let (mut videos, total) = merge_pages(&results);
    if shuffle {
        apply_shuffle(&mut videos);
    }

    FetchOutcome {
        videos,
        total,
        any_page_succeeded,
    }
}

/// Cache-aware entry point used by the HTTP layer.
pub async fn load_content_cached(
    client: &SearchClient,
    cache: &QueryCache,
    term: &str,
    first_page: u32,
    page_count: u32,
    order: &str,
    per_page: u32,
    shuffle: bool,
    refresh: bool,
) -> (Vec<NormalizedVideo>, u64) {
    let key = CacheKey::new(term, order, first_page.max(1), per_page);
    resolve_with_cache(cache, key, shuffle, refresh, || {
        load_content(client, term, first_page, page_count, order, per_page, shuffle)
    })
    .await
}

/// Cache read/write policy around one aggregated fetch, independent of how
/// the fetch itself happens.
///
/// Read side: a fresh entry short-circuits the fetch entirely, unless the
/// caller forces a refresh or shuffling is on (serving a cached permutation
/// would defeat "different every refresh"). Write side: any fetch with at
/// least one surviving page overwrites the entry. When every page fails,
/// an existing entry is served no matter how stale: old results beat an
/// empty grid.
async fn resolve_with_cache<F, Fut>(
    cache: &QueryCache,
    key: CacheKey,
    shuffle: bool,
    refresh: bool,
    fetch: F,
) -> (Vec<NormalizedVideo>, u64)
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = FetchOutcome>,
{
    if !refresh && !shuffle {
        if let Some((videos, total)) = cache.get_fresh(&key, Instant::now()) {
            return (videos, total);
        }
    }

    let outcome = fetch().await;
    if outcome.any_page_succeeded {
        cache.insert(key, outcome.videos.clone(), outcome.total, Instant::now());
        return (outcome.videos, outcome.total);
    }

    if let Some((videos, total)) = cache.get_any(&key) {
        eprintln!("Upstream unavailable, serving cached results");
        return (videos, total);
    }

    (outcome.videos, outcome.total)
}

/// Uniform full shuffle of the merged set. A presentation choice, applied
/// post-merge and never as a sort.
fn apply_shuffle(videos: &mut [NormalizedVideo]) {
    videos.shuffle(&mut rand::rng());
}

fn truncate_chars(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

fn coerce_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn coerce_f64(value: Option<&Value>) -> f64 {
    match value {
        Some(Value::Number(n)) => n.as_f64().unwrap_or(0.0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0.0),
        _ => 0.0,
    }
}

fn coerce_u64(value: Option<&Value>) -> u64 {
    match value {
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0),
        Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}

fn coerce_bool(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_u64().unwrap_or(0) != 0,
        Some(Value::String(s)) => s == "1" || s.eq_ignore_ascii_case("true"),
        _ => false,
    }
}
