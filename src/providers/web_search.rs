//! Web search fallback links
//!
//! One entry per configured engine, appended after the ranked results for
//! every non-blank query. These never compete for the top-N slots.

use url::form_urlencoded;

use super::{Placement, QueryContext, ResultProvider};
use crate::candidate::{Candidate, CandidateAction, CandidateKind, Query, ScoredCandidate};
use crate::config::SearchEngine;

const QUERY_PLACEHOLDER: &str = "{query}";

pub struct WebSearchProvider {
    engines: Vec<SearchEngine>,
}

impl WebSearchProvider {
    pub fn new(engines: Vec<SearchEngine>) -> Self {
        WebSearchProvider { engines }
    }
}

/// Substitute the form-encoded query into an engine's URL template
pub fn search_url(engine: &SearchEngine, query: &str) -> String {
    let encoded: String = form_urlencoded::byte_serialize(query.as_bytes()).collect();
    engine.url_template.replace(QUERY_PLACEHOLDER, &encoded)
}

impl ResultProvider for WebSearchProvider {
    fn name(&self) -> &'static str {
        "web-search"
    }

    fn placement(&self) -> Placement {
        Placement::Tail
    }

    fn provide(&self, query: &Query, _context: &QueryContext) -> anyhow::Result<Vec<ScoredCandidate>> {
        if query.is_blank() {
            return Ok(Vec::new());
        }
        let text = query.raw().trim();

        let results = self
            .engines
            .iter()
            .map(|engine| {
                let url = search_url(engine, text);
                let candidate = Candidate::new(
                    format!("web-search-{}", engine.id),
                    format!("Search {} for \"{}\"", engine.name, text),
                    url.clone(),
                    CandidateKind::WebSuggestion,
                    CandidateAction::OpenUrl { url },
                );
                ScoredCandidate::new(candidate, 0.0)
            })
            .collect();
        Ok(results)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::WebSearchConfig;

    fn provider() -> WebSearchProvider {
        WebSearchProvider::new(WebSearchConfig::default().engines)
    }

    #[test]
    fn test_one_entry_per_engine_in_order() {
        let results = provider()
            .provide(&Query::new("qzzzzz"), &QueryContext::default())
            .unwrap();
        let ids: Vec<_> = results.iter().map(|r| r.candidate.id.as_str()).collect();
        assert_eq!(ids, vec!["web-search-google", "web-search-duckduckgo"]);
        assert!(results
            .iter()
            .all(|r| r.candidate.kind == CandidateKind::WebSuggestion));
    }

    #[test]
    fn test_query_is_encoded() {
        let engine = SearchEngine {
            id: "g".to_string(),
            name: "G".to_string(),
            url_template: "https://example.com/search?q={query}".to_string(),
        };
        assert_eq!(
            search_url(&engine, "rust & c++"),
            "https://example.com/search?q=rust+%26+c%2B%2B"
        );
    }

    #[test]
    fn test_blank_query_has_no_fallbacks() {
        assert!(provider()
            .provide(&Query::new("  "), &QueryContext::default())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_is_tail_placed() {
        assert_eq!(provider().placement(), Placement::Tail);
    }
}
