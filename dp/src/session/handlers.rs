//! Turn handlers
//!
//! Handlers read session state and return a [`Delta`] describing what should
//! change. They never mutate anything; `Session::apply` does that.

use knowledgestore::KnowledgeIndex;
use tracing::{debug, warn};

use super::conversation::{MessageCategory, NewMessage};
use crate::analyzer::ContentAnalyzer;
use crate::context::ContextBuilder;
use crate::llm::{CompletionRequest, GenerationParams, LlmClient, Message};
use crate::plan::{ActionPlan, extract_plan, strip_plan_block};

pub const EMPTY_INDEX_CONTENT_TEXT: &str =
    "There is nothing to index. Add the content after the command, for example: index this: <text>";
pub const MODEL_ERROR_TEXT: &str = "Sorry, I couldn't reach the language model service. Please try again.";
pub const PARSE_ERROR_TEXT: &str =
    "I had trouble understanding how to turn that into a plan. Could you rephrase or simplify the request?";
pub const PROMPT_ERROR_TEXT: &str = "Sorry, I couldn't prepare the request. Check the prompt templates and try again.";
pub const NON_TASK_FALLBACK_TEXT: &str =
    "That doesn't look like a task I can perform on the computer. Describe something to do, or index some content first.";

/// Change to the knowledge index
#[derive(Debug, Clone, PartialEq)]
pub enum IndexChange {
    Add { content: String, keywords: Vec<String> },
    Clear,
}

/// Change to the confirmation gate
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateChange {
    /// Wait for a decision on the plan carried by the delta's messages
    Await,
}

/// Everything one handler wants changed, applied atomically by the session
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Delta {
    pub messages: Vec<NewMessage>,
    pub index: Option<IndexChange>,
    pub gate: Option<GateChange>,
}

impl Delta {
    /// A delta that only logs one agent message
    pub fn message(category: MessageCategory, text: impl Into<String>) -> Self {
        Self {
            messages: vec![NewMessage::agent(category, text)],
            ..Self::default()
        }
    }
}

/// Analyze `content` and add it to the index
///
/// `entry_count` is the index size before this entry is added.
pub async fn index_content(analyzer: &ContentAnalyzer, entry_count: usize, content: &str) -> Delta {
    debug!(content_len = content.len(), entry_count, "index_content: called");
    if content.trim().is_empty() {
        debug!("index_content: nothing to index");
        return Delta::message(MessageCategory::Info, EMPTY_INDEX_CONTENT_TEXT);
    }

    let analysis = analyzer.analyze(content).await;
    let keywords = analysis.to_keywords();

    let mut text = format!(
        "Content indexed successfully. Extracted {} keywords: {}. Index now contains {} entries.",
        keywords.len(),
        keywords.join(", "),
        entry_count + 1
    );
    if !analysis.summary.trim().is_empty() {
        text.push_str(&format!("\n\nSummary: {}", analysis.summary.trim()));
    }

    Delta {
        messages: vec![NewMessage::agent(MessageCategory::Indexing, text)],
        index: Some(IndexChange::Add {
            content: content.to_string(),
            keywords,
        }),
        gate: None,
    }
}

/// Ask the model for a plan for `query`
pub async fn plan_task(
    context: &ContextBuilder,
    llm: &dyn LlmClient,
    params: &GenerationParams,
    index: &KnowledgeIndex,
    query: &str,
) -> Delta {
    debug!(query_len = query.len(), "plan_task: called");
    let system_prompt = match context.build(query, index) {
        Ok(prompt) => prompt,
        Err(e) => {
            warn!(error = %e, "Failed to build context");
            return Delta::message(MessageCategory::Error, PROMPT_ERROR_TEXT);
        }
    };

    let request = CompletionRequest {
        system_prompt,
        messages: vec![Message::user(query)],
        params: params.clone(),
    };
    let reply = match llm.complete(request).await {
        Ok(response) => response.into_text(),
        Err(e) => {
            warn!(error = %e, "Plan request failed");
            return Delta::message(MessageCategory::Error, MODEL_ERROR_TEXT);
        }
    };

    match extract_plan(&reply) {
        Ok(plan) if plan.is_actionable() => plan_delta(plan),
        Ok(_) => {
            debug!("plan_task: reply is not a task");
            let text = strip_plan_block(&reply);
            let text = if text.is_empty() { NON_TASK_FALLBACK_TEXT.to_string() } else { text };
            Delta::message(MessageCategory::Info, text)
        }
        Err(e) => {
            warn!(error = %e, "Could not extract a plan from the reply");
            Delta::message(MessageCategory::Error, PARSE_ERROR_TEXT)
        }
    }
}

fn plan_delta(plan: ActionPlan) -> Delta {
    let text = format!(
        "I've created a plan for: {}\n\n{}\n\nPlease confirm to proceed.",
        plan.task(),
        plan.render_steps()
    );
    Delta {
        messages: vec![NewMessage::agent(MessageCategory::Plan, text).with_plan(plan)],
        index: None,
        gate: Some(GateChange::Await),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::config::RetrievalConfig;
    use crate::llm::client::mock::{MockLlmClient, MockReply};
    use crate::prompts::PromptLoader;

    fn prompts() -> Arc<PromptLoader> {
        Arc::new(PromptLoader::embedded().unwrap())
    }

    fn context() -> ContextBuilder {
        ContextBuilder::new(prompts(), RetrievalConfig::default())
    }

    async fn plan_with(reply: MockReply) -> Delta {
        let client = MockLlmClient::new(vec![reply]);
        plan_task(&context(), &client, &GenerationParams::default(), &KnowledgeIndex::new(), "open notepad").await
    }

    #[tokio::test]
    async fn test_index_content_with_fallback() {
        let analyzer = ContentAnalyzer::new(
            Arc::new(MockLlmClient::new(vec![MockReply::ApiError(503)])),
            prompts(),
            GenerationParams::analysis(),
        );
        let delta = index_content(&analyzer, 2, "Paris is the capital of France").await;

        assert_eq!(
            delta.index,
            Some(IndexChange::Add {
                content: "Paris is the capital of France".to_string(),
                keywords: vec!["paris".into(), "capital".into(), "france".into()],
            })
        );
        let text = &delta.messages[0].text;
        assert!(text.contains("Extracted 3 keywords: paris, capital, france"));
        assert!(text.contains("Index now contains 3 entries"));
        assert!(!text.contains("Summary:"));
        assert_eq!(delta.messages[0].category, Some(MessageCategory::Indexing));
    }

    #[tokio::test]
    async fn test_index_content_includes_summary() {
        let reply = r#"{"keywords":["rust"],"themes":["systems"],"entities":[],"summary":"Rust is fast."}"#;
        let analyzer = ContentAnalyzer::new(
            Arc::new(MockLlmClient::with_texts(&[reply])),
            prompts(),
            GenerationParams::analysis(),
        );
        let delta = index_content(&analyzer, 0, "Rust is a fast systems language").await;
        assert!(delta.messages[0].text.ends_with("Summary: Rust is fast."));
    }

    #[tokio::test]
    async fn test_index_content_empty() {
        let client = Arc::new(MockLlmClient::new(vec![]));
        let analyzer = ContentAnalyzer::new(client.clone(), prompts(), GenerationParams::analysis());
        let delta = index_content(&analyzer, 0, "   ").await;

        assert!(delta.index.is_none());
        assert_eq!(delta.messages[0].category, Some(MessageCategory::Info));
        assert_eq!(client.call_count(), 0);
    }

    #[tokio::test]
    async fn test_plan_task_actionable() {
        let reply = "Here's the plan:\n```json\n{\"task\":\"Open Notepad\",\"steps\":[{\"step\":1,\"description\":\"Open Notepad\",\"application\":\"Notepad\"}]}\n```";
        let delta = plan_with(MockReply::Text(reply.to_string())).await;

        assert_eq!(delta.gate, Some(GateChange::Await));
        let message = &delta.messages[0];
        assert_eq!(message.category, Some(MessageCategory::Plan));
        assert!(message.text.starts_with("I've created a plan for: Open Notepad"));
        assert!(message.text.contains("1. Open Notepad [Notepad]"));
        assert!(message.text.ends_with("Please confirm to proceed."));
        assert_eq!(message.plan.as_ref().map(|p| p.task()), Some("Open Notepad"));
    }

    #[tokio::test]
    async fn test_plan_task_non_task_reply() {
        let reply = "Hello! How can I help?\n```json\n{\"task\": \"\", \"steps\": []}\n```";
        let delta = plan_with(MockReply::Text(reply.to_string())).await;

        assert!(delta.gate.is_none());
        assert_eq!(delta.messages[0].category, Some(MessageCategory::Info));
        assert_eq!(delta.messages[0].text, "Hello! How can I help?");
        assert!(delta.messages[0].plan.is_none());
    }

    #[tokio::test]
    async fn test_plan_task_bare_empty_plan_uses_fallback_text() {
        let delta = plan_with(MockReply::Text("```json\n{\"task\":\"\",\"steps\":[]}\n```".to_string())).await;
        assert_eq!(delta.messages[0].text, NON_TASK_FALLBACK_TEXT);
    }

    #[tokio::test]
    async fn test_plan_task_parse_error() {
        let delta = plan_with(MockReply::Text("no json here".to_string())).await;
        assert!(delta.gate.is_none());
        assert_eq!(delta.messages[0].category, Some(MessageCategory::Error));
        assert_eq!(delta.messages[0].text, PARSE_ERROR_TEXT);
    }

    #[tokio::test]
    async fn test_plan_task_model_error() {
        let delta = plan_with(MockReply::ApiError(500)).await;
        assert!(delta.gate.is_none());
        assert_eq!(delta.messages[0].text, MODEL_ERROR_TEXT);
    }

    #[tokio::test]
    async fn test_plan_task_sends_context_and_query() {
        let client = MockLlmClient::with_texts(&["no json here"]);
        let mut index = KnowledgeIndex::new();
        index.add("Notepad is in the start menu", vec!["notepad".into()]);

        plan_task(&context(), &client, &GenerationParams::default(), &index, "open notepad").await;

        let request = &client.requests()[0];
        assert!(request.system_prompt.contains("Notepad is in the start menu"));
        assert_eq!(request.messages.len(), 1);
        assert_eq!(request.messages[0].content, "open notepad");
    }
}
