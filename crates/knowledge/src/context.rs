//! Prompt-context assembly from style guidance and ranked knowledge.

use crate::library::RoleKnowledgeLibrary;
use crate::ranker::SimilarityRanker;
use tracing::warn;

/// Builds the knowledge context block injected into the system prompt.
///
/// Two sections, both optional:
/// 1. the role's language style, injected on every turn it exists
/// 2. knowledge items ranked against the current user question
pub struct ContextBuilder {
    library: RoleKnowledgeLibrary,
    ranker: SimilarityRanker,
    top_k: usize,
}

impl ContextBuilder {
    pub fn new(library: RoleKnowledgeLibrary, ranker: SimilarityRanker, top_k: usize) -> Self {
        Self { library, ranker, top_k }
    }

    /// Assemble the context block for one turn. `None` when the role has
    /// neither style guidance nor relevant knowledge.
    ///
    /// Ranking failures degrade to a style-only (or empty) block; a chat
    /// turn never fails because retrieval did.
    pub async fn build(&self, role_name: &str, user_question: &str) -> Option<String> {
        let mut lines: Vec<String> = Vec::new();

        let mut has_style = false;
        if let Some(style) = self.library.style(role_name).await {
            if style.has_content() {
                has_style = true;
                lines.push("【语言风格说明】".into());

                if let Some(rules) = &style.rules {
                    lines.push(rules.trim().to_string());
                }

                if let Some(examples) = &style.examples {
                    if !examples.is_empty() {
                        lines.push(
                            "\n可参考的典型表达（用于模仿语气和节奏，不要逐字照抄）：".into(),
                        );
                        for (idx, example) in examples.iter().enumerate() {
                            if example.text.is_empty() {
                                continue;
                            }
                            lines.push(format!("\n例句 {}：{}", idx + 1, example.text));
                        }
                    }
                }

                if let Some(avoid) = &style.avoid {
                    if !avoid.is_empty() {
                        lines.push("\n需要避免的表达方式：".into());
                        for example in avoid {
                            if example.text.is_empty() {
                                continue;
                            }
                            lines.push(format!("\n避免：{}", example.text));
                        }
                    }
                }

                lines.push("\n".into());
            }
        }

        let candidates = self.library.candidates(role_name).await;
        let items = match self.ranker.rank(candidates, user_question, self.top_k).await {
            Ok(items) => items,
            Err(e) => {
                warn!(role = %role_name, error = %e, "Knowledge ranking failed");
                Vec::new()
            }
        };

        if !items.is_empty() {
            lines.push("【角色知识库参考（仅在相关时使用）】".into());

            for (idx, item) in items.iter().enumerate() {
                lines.push(format!("\n{}. [{}]", idx + 1, item.category));
                if !item.text.is_empty() {
                    lines.push(item.text.clone());
                } else {
                    if let Some(question) = &item.question {
                        lines.push(format!("问：{question}"));
                    }
                    if let Some(answer) = &item.answer {
                        lines.push(format!("答：{answer}"));
                    }
                }
            }

            lines.push(
                "\n请在回答用户问题时，优先参考以上资料；如果资料未覆盖，也可以在合理范围内推理，但不要与上述资料出现明显矛盾。".into(),
            );
        }

        if !has_style && items.is_empty() {
            return None;
        }

        Some(lines.join("\n"))
    }
}
