//! Persona prompt rendering

use std::collections::HashMap;

use crate::config::PersonaConfig;
use crate::llm::PromptTemplate;
use crate::models::Message;
use crate::models::SimilarMatch;
use crate::rag::ContextBundle;

const PERSONA_TEMPLATE: &str = r"You are {{persona_name}}. You should act and speak like {{persona_name}}: {{persona_voice}}.
Your language and behavior should be consistent with that character. If the
user explicitly asks who you are, say you are {{persona_name}}.

Context information is below:
--------------------
{{context}}
--------------------

Previous messages are below:
--------------------
{{history}}
--------------------

Given the context information, answer the following question:
Question: {{question}}

If the context doesn't contain relevant information, tease the user with a
joke or a riddle in the manner of the character.

Don't be too verbose.
Don't repeat yourself.
Don't state that you're the character unless the user asks who you are.";

/// Renders the assembled context into a model-ready prompt.
///
/// Pure: no I/O, no failure modes. Section order is fixed - persona
/// instructions, similarity context, recent history, question - so that
/// prompts are stable across runs. Swapping personas is purely a matter of
/// the [`PersonaConfig`] passed in.
pub struct PersonaPromptBuilder {
    template: PromptTemplate,
}

impl PersonaPromptBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self {
            template: PromptTemplate::new(PERSONA_TEMPLATE),
        }
    }

    /// Render the prompt for one query
    #[must_use]
    pub fn build(&self, bundle: &ContextBundle, question: &str, persona: &PersonaConfig) -> String {
        let mut values = HashMap::new();
        values.insert("persona_name".to_string(), persona.name.clone());
        values.insert("persona_voice".to_string(), persona.voice.clone());
        values.insert("context".to_string(), render_matches(&bundle.matches));
        values.insert("history".to_string(), render_history(&bundle.history));
        values.insert("question".to_string(), question.to_string());
        self.template.render(&values)
    }
}

impl Default for PersonaPromptBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn render_matches(matches: &[SimilarMatch]) -> String {
    if matches.is_empty() {
        return "No similar messages available.".to_string();
    }

    matches
        .iter()
        .map(|m| format!("{:.2} - {}", m.score, m.metadata.content))
        .collect::<Vec<_>>()
        .join("\n")
}

fn render_history(history: &[Message]) -> String {
    if history.is_empty() {
        return "No recent message history available.".to_string();
    }

    history
        .iter()
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    use crate::tests::mocks::match_for;
    use crate::tests::mocks::message_in;

    fn persona() -> PersonaConfig {
        PersonaConfig {
            name: "Echo".to_string(),
            voice: "dry and concise".to_string(),
        }
    }

    #[test]
    fn test_sections_render_in_stable_order() {
        let channel = Uuid::new_v4();
        let network = Uuid::new_v4();
        let bundle = ContextBundle {
            history: vec![message_in(network, channel, "earlier chat line")],
            matches: vec![match_for(
                &message_in(network, channel, "deploy is via CI"),
                0.87,
            )],
        };

        let prompt = PersonaPromptBuilder::new().build(&bundle, "how do we deploy?", &persona());

        let persona_at = prompt.find("You are Echo").unwrap();
        let context_at = prompt.find("0.87 - deploy is via CI").unwrap();
        let history_at = prompt.find("earlier chat line").unwrap();
        let question_at = prompt.find("Question: how do we deploy?").unwrap();
        assert!(persona_at < context_at);
        assert!(context_at < history_at);
        assert!(history_at < question_at);
    }

    #[test]
    fn test_empty_sections_use_fallback_text() {
        let prompt =
            PersonaPromptBuilder::new().build(&ContextBundle::default(), "anyone there?", &persona());
        assert!(prompt.contains("No similar messages available."));
        assert!(prompt.contains("No recent message history available."));
    }

    #[test]
    fn test_persona_swap_changes_prompt_only_through_config() {
        let other = PersonaConfig {
            name: "Sage".to_string(),
            voice: "solemn".to_string(),
        };
        let builder = PersonaPromptBuilder::new();
        let bundle = ContextBundle::default();

        let a = builder.build(&bundle, "q", &persona());
        let b = builder.build(&bundle, "q", &other);
        assert!(a.contains("Echo"));
        assert!(b.contains("Sage"));
    }
}
