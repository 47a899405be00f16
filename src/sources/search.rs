// Marketplace search for the `plugin search` command

use crate::http;
use crate::manifest::Source;
use crate::sources::Endpoints;
use serde::Deserialize;
use std::cmp::Ordering;

const SEARCH_LIMIT: usize = 10;

/// Trait for items that can be searched
pub trait Searchable {
    /// Get the name to compare against the search query
    fn search_name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchHit {
    pub source: Source,
    pub name: String,
    pub description: String,
}

impl Searchable for SearchHit {
    fn search_name(&self) -> &str {
        &self.name
    }
}

/// Rank search results with exact matches first, preserving original order for ties
/// The marketplaces already order hits by relevance.
pub fn rank_search_results_stable<T: Searchable>(results: &mut [T], query: &str) {
    let query_lower = query.to_lowercase();

    results.sort_by(|a, b| {
        let a_exact = a.search_name().to_lowercase() == query_lower;
        let b_exact = b.search_name().to_lowercase() == query_lower;

        match (a_exact, b_exact) {
            (true, false) => Ordering::Less,
            (false, true) => Ordering::Greater,
            _ => Ordering::Equal,
        }
    });
}

#[derive(Debug, Deserialize)]
struct ModrinthSearch {
    hits: Vec<ModrinthHit>,
}

#[derive(Debug, Deserialize)]
struct ModrinthHit {
    slug: String,
    #[serde(default)]
    description: String,
}

#[derive(Debug, Deserialize)]
struct HangarSearch {
    result: Vec<HangarProject>,
}

#[derive(Debug, Deserialize)]
struct HangarProject {
    name: String,
    #[serde(default)]
    description: String,
}

pub async fn search_modrinth(endpoints: &Endpoints, query: &str) -> anyhow::Result<Vec<SearchHit>> {
    let url = format!(
        "{}/search?query={}&facets={}&limit={}",
        endpoints.modrinth,
        urlencoding::encode(query),
        urlencoding::encode(r#"[["project_type:plugin"]]"#),
        SEARCH_LIMIT
    );
    let response: ModrinthSearch = http::fetch_json(&url).await?;

    let mut hits: Vec<SearchHit> = response
        .hits
        .into_iter()
        .map(|hit| SearchHit {
            source: Source::Modrinth,
            name: hit.slug,
            description: hit.description,
        })
        .collect();
    rank_search_results_stable(&mut hits, query);
    Ok(hits)
}

pub async fn search_hangar(endpoints: &Endpoints, query: &str) -> anyhow::Result<Vec<SearchHit>> {
    let url = format!(
        "{}/projects?q={}&limit={}",
        endpoints.hangar,
        urlencoding::encode(query),
        SEARCH_LIMIT
    );
    let response: HangarSearch = http::fetch_json(&url).await?;

    let mut hits: Vec<SearchHit> = response
        .result
        .into_iter()
        .map(|project| SearchHit {
            source: Source::Hangar,
            name: project.name,
            description: project.description,
        })
        .collect();
    rank_search_results_stable(&mut hits, query);
    Ok(hits)
}

/// Query both marketplaces concurrently. A failing marketplace yields no
/// hits instead of failing the search.
pub async fn search_all(endpoints: &Endpoints, query: &str) -> (Vec<SearchHit>, Vec<SearchHit>) {
    let (modrinth, hangar) = futures::join!(
        search_modrinth(endpoints, query),
        search_hangar(endpoints, query)
    );

    let modrinth = modrinth.unwrap_or_else(|e| {
        log::debug!("Modrinth search failed: {}", e);
        Vec::new()
    });
    let hangar = hangar.unwrap_or_else(|e| {
        log::debug!("Hangar search failed: {}", e);
        Vec::new()
    });
    (modrinth, hangar)
}

/// Truncate a description for one-line display.
pub fn truncate_description(description: &str, max: usize) -> String {
    if description.chars().count() <= max {
        return description.to_string();
    }
    let kept: String = description.chars().take(max.saturating_sub(3)).collect();
    format!("{}...", kept)
}
