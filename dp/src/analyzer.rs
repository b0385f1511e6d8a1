//! Content analysis for the knowledge index
//!
//! Turns arbitrary text into a small set of keywords, themes and entities.
//! The model does the work when it can; a word-frequency fallback covers
//! every failure so indexing never fails.

use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::llm::{CompletionRequest, GenerationParams, LlmClient, Message};
use crate::prompts::PromptLoader;

/// Keywords kept per analysis
pub const MAX_KEYWORDS: usize = 10;

/// Fallback keywords must be longer than this
const MIN_FALLBACK_WORD_CHARS: usize = 3;

static FENCED: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)^```(?:json)?\s*(.*?)\s*```$").expect("fence regex is valid"));

static NON_WORD: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^\w\s]").expect("non-word regex is valid"));

/// Compact description of a piece of content
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContentAnalysis {
    pub keywords: Vec<String>,
    pub themes: Vec<String>,
    pub entities: Vec<String>,
    pub summary: String,
}

impl ContentAnalysis {
    /// Keywords stored on an index entry: keywords, then themes, then entities
    pub fn to_keywords(&self) -> Vec<String> {
        self.keywords
            .iter()
            .chain(&self.themes)
            .chain(&self.entities)
            .filter(|k| !k.trim().is_empty())
            .cloned()
            .collect()
    }
}

/// Analyzes content with the model, falling back to local word counting
pub struct ContentAnalyzer {
    llm: Arc<dyn LlmClient>,
    prompts: Arc<PromptLoader>,
    params: GenerationParams,
}

impl ContentAnalyzer {
    pub fn new(llm: Arc<dyn LlmClient>, prompts: Arc<PromptLoader>, params: GenerationParams) -> Self {
        Self { llm, prompts, params }
    }

    /// Analyze `text`; never fails
    pub async fn analyze(&self, text: &str) -> ContentAnalysis {
        debug!(text_len = text.len(), "ContentAnalyzer::analyze: called");

        let system_prompt = match self.prompts.render("analyze", &serde_json::json!({})) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "Analysis prompt failed to render, using fallback");
                return fallback_analysis(text);
            }
        };

        let request = CompletionRequest {
            system_prompt,
            messages: vec![Message::user(text)],
            params: self.params.clone(),
        };

        let reply = match self.llm.complete(request).await {
            Ok(response) => response.into_text(),
            Err(e) => {
                warn!(error = %e, "Content analysis call failed, using fallback");
                return fallback_analysis(text);
            }
        };

        match parse_analysis(&reply) {
            Some(analysis) => {
                debug!(keyword_count = analysis.keywords.len(), "ContentAnalyzer::analyze: model analysis accepted");
                analysis
            }
            None => {
                warn!(reply_len = reply.len(), "Content analysis reply was not valid JSON, using fallback");
                fallback_analysis(text)
            }
        }
    }
}

/// Parse a model reply, tolerating a surrounding code fence
fn parse_analysis(reply: &str) -> Option<ContentAnalysis> {
    let trimmed = reply.trim();
    let body = FENCED
        .captures(trimmed)
        .and_then(|c| c.get(1))
        .map_or(trimmed, |m| m.as_str());

    let mut analysis: ContentAnalysis = serde_json::from_str(body).ok()?;
    analysis.keywords.truncate(MAX_KEYWORDS);
    Some(analysis)
}

/// Word-frequency analysis used whenever the model cannot help
///
/// Keywords are the most frequent lowercase words longer than three
/// characters, ties broken by first occurrence.
pub fn fallback_analysis(text: &str) -> ContentAnalysis {
    debug!(text_len = text.len(), "fallback_analysis: called");
    let cleaned = NON_WORD.replace_all(&text.to_lowercase(), "").into_owned();

    let mut order: Vec<&str> = Vec::new();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in cleaned.split_whitespace() {
        if word.chars().count() <= MIN_FALLBACK_WORD_CHARS {
            continue;
        }
        let count = counts.entry(word).or_insert(0);
        if *count == 0 {
            order.push(word);
        }
        *count += 1;
    }

    // Stable sort keeps first-occurrence order among equal counts
    order.sort_by(|a, b| counts[b].cmp(&counts[a]));

    ContentAnalysis {
        keywords: order.into_iter().take(MAX_KEYWORDS).map(String::from).collect(),
        ..ContentAnalysis::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::client::mock::{MockLlmClient, MockReply};
    use proptest::prelude::*;

    fn analyzer(client: MockLlmClient) -> (ContentAnalyzer, Arc<MockLlmClient>) {
        let client = Arc::new(client);
        let prompts = Arc::new(PromptLoader::embedded().unwrap());
        let analyzer = ContentAnalyzer::new(client.clone(), prompts, GenerationParams::analysis());
        (analyzer, client)
    }

    #[test]
    fn test_fallback_paris() {
        let analysis = fallback_analysis("Paris is the capital of France");
        assert_eq!(analysis.keywords, vec!["paris", "capital", "france"]);
        assert!(analysis.themes.is_empty());
        assert!(analysis.entities.is_empty());
        assert!(analysis.summary.is_empty());
    }

    #[test]
    fn test_fallback_ranks_by_frequency_then_first_seen() {
        let analysis = fallback_analysis("alpha beta! gamma, beta. delta gamma? beta");
        assert_eq!(analysis.keywords, vec!["beta", "gamma", "alpha", "delta"]);
    }

    #[test]
    fn test_fallback_caps_keywords() {
        let text = (0..25).map(|i| format!("word{:02}", i)).collect::<Vec<_>>().join(" ");
        assert_eq!(fallback_analysis(&text).keywords.len(), MAX_KEYWORDS);
    }

    #[test]
    fn test_fallback_empty_text() {
        assert_eq!(fallback_analysis("").keywords, Vec::<String>::new());
        assert_eq!(fallback_analysis("a an the, of").keywords, Vec::<String>::new());
    }

    #[test]
    fn test_to_keywords_concatenates_and_drops_blanks() {
        let analysis = ContentAnalysis {
            keywords: vec!["rust".into(), " ".into()],
            themes: vec!["systems".into()],
            entities: vec!["".into(), "Mozilla".into()],
            summary: "ignored".into(),
        };
        assert_eq!(analysis.to_keywords(), vec!["rust", "systems", "Mozilla"]);
    }

    #[test]
    fn test_parse_analysis_fenced_and_partial() {
        let fenced = "```json\n{\"keywords\": [\"rust\"], \"summary\": \"About Rust.\"}\n```";
        let analysis = parse_analysis(fenced).unwrap();
        assert_eq!(analysis.keywords, vec!["rust"]);
        assert!(analysis.themes.is_empty());
        assert_eq!(analysis.summary, "About Rust.");

        let bare = "  {\"themes\": [\"travel\"]}  ";
        assert_eq!(parse_analysis(bare).unwrap().themes, vec!["travel"]);

        assert!(parse_analysis("I think the keywords are rust and go").is_none());
    }

    #[test]
    fn test_parse_analysis_truncates_keywords() {
        let keywords: Vec<String> = (0..15).map(|i| format!("k{}", i)).collect();
        let reply = serde_json::json!({ "keywords": keywords }).to_string();
        assert_eq!(parse_analysis(&reply).unwrap().keywords.len(), MAX_KEYWORDS);
    }

    #[tokio::test]
    async fn test_analyze_uses_model_reply() {
        let reply = r#"{"keywords":["paris","capital"],"themes":["geography"],"entities":["France"],"summary":"Paris is the capital."}"#;
        let (analyzer, client) = analyzer(MockLlmClient::with_texts(&[reply]));

        let analysis = analyzer.analyze("Paris is the capital of France").await;
        assert_eq!(analysis.to_keywords(), vec!["paris", "capital", "geography", "France"]);

        let requests = client.requests();
        assert_eq!(requests.len(), 1);
        assert!(requests[0].system_prompt.contains("JSON"));
        assert_eq!(requests[0].messages[0].content, "Paris is the capital of France");
        assert_eq!(requests[0].params, GenerationParams::analysis());
    }

    #[tokio::test]
    async fn test_analyze_falls_back_on_model_error() {
        let (analyzer, _) = analyzer(MockLlmClient::new(vec![MockReply::ApiError(500)]));
        let analysis = analyzer.analyze("Paris is the capital of France").await;
        assert_eq!(analysis, fallback_analysis("Paris is the capital of France"));
    }

    #[tokio::test]
    async fn test_analyze_falls_back_on_prose_reply() {
        let (analyzer, _) = analyzer(MockLlmClient::with_texts(&["Sure, the keywords are: paris, france"]));
        let analysis = analyzer.analyze("Paris is the capital of France").await;
        assert_eq!(analysis.keywords, vec!["paris", "capital", "france"]);
    }

    proptest! {
        #[test]
        fn prop_fallback_keywords_are_clean(text in "[a-zA-Z0-9 .,!?'()-]{0,200}") {
            let analysis = fallback_analysis(&text);
            prop_assert!(analysis.keywords.len() <= MAX_KEYWORDS);
            for keyword in &analysis.keywords {
                prop_assert!(keyword.chars().count() > MIN_FALLBACK_WORD_CHARS);
                prop_assert_eq!(keyword, &keyword.to_lowercase());
                prop_assert!(!NON_WORD.is_match(keyword));
            }
        }
    }
}
