//! File-backed role knowledge library.
//!
//! Layout under the knowledge root:
//! - `index.json` — maps role name → knowledge file name
//! - per-role files — `{ "roleName": ..., "knowledge": { "languageStyle"?: {...},
//!   "<category>": [ {id?, text?, question?, answer?}, ... ] } }`
//!
//! Loading is best-effort throughout: a missing root, an unknown role, or an
//! unparseable file all degrade to "no knowledge" rather than failing the
//! turn.

use rolechat_core::knowledge::{KnowledgeItem, StyleBlock};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::PathBuf;
use tracing::debug;

/// The reserved knowledge key holding style guidance instead of items.
const LANGUAGE_STYLE_KEY: &str = "languageStyle";

#[derive(Debug, Deserialize)]
struct KnowledgeFile {
    #[serde(default)]
    knowledge: serde_json::Map<String, serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct RawKnowledgeItem {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    question: Option<String>,
    #[serde(default)]
    answer: Option<String>,
}

/// Read-only access to per-role knowledge files.
pub struct RoleKnowledgeLibrary {
    root: PathBuf,
}

impl RoleKnowledgeLibrary {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Load a role's knowledge file. Any failure along the way — missing
    /// index, unindexed role, unreadable or malformed file — yields `None`.
    async fn load(&self, role_name: &str) -> Option<KnowledgeFile> {
        let index_path = self.root.join("index.json");
        let index_raw = match tokio::fs::read_to_string(&index_path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %index_path.display(), error = %e, "Knowledge index unavailable");
                return None;
            }
        };

        let index: HashMap<String, String> = match serde_json::from_str(&index_raw) {
            Ok(index) => index,
            Err(e) => {
                debug!(error = %e, "Knowledge index unparseable");
                return None;
            }
        };

        let file_name = index.get(role_name.trim())?;
        let file_path = self.root.join(file_name);
        let raw = match tokio::fs::read_to_string(&file_path).await {
            Ok(raw) => raw,
            Err(e) => {
                debug!(path = %file_path.display(), error = %e, "Knowledge file unreadable");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(file) => Some(file),
            Err(e) => {
                debug!(path = %file_path.display(), error = %e, "Knowledge file unparseable");
                None
            }
        }
    }

    /// The role's style block, when one exists and parses.
    pub async fn style(&self, role_name: &str) -> Option<StyleBlock> {
        let file = self.load(role_name).await?;
        let style_value = file.knowledge.get(LANGUAGE_STYLE_KEY)?;
        serde_json::from_value(style_value.clone()).ok()
    }

    /// All ranking candidates for the role, flattened across categories.
    ///
    /// Items with no usable text (empty `text` and empty question/answer
    /// concatenation) are excluded; missing ids default to
    /// `{category}_{index}`.
    pub async fn candidates(&self, role_name: &str) -> Vec<KnowledgeItem> {
        let Some(file) = self.load(role_name).await else {
            return Vec::new();
        };

        let mut items = Vec::new();
        for (category, value) in &file.knowledge {
            // languageStyle is an object, not an item list
            let Some(list) = value.as_array() else { continue };

            for (idx, raw_value) in list.iter().enumerate() {
                let Ok(raw) = serde_json::from_value::<RawKnowledgeItem>(raw_value.clone())
                else {
                    continue;
                };

                let question = raw.question.filter(|q| !q.trim().is_empty());
                let answer = raw.answer.filter(|a| !a.trim().is_empty());

                let text = match raw.text.as_deref().map(str::trim) {
                    Some(t) if !t.is_empty() => t.to_string(),
                    _ => {
                        let mut parts = Vec::new();
                        if let Some(q) = &question {
                            parts.push(q.trim());
                        }
                        if let Some(a) = &answer {
                            parts.push(a.trim());
                        }
                        parts.join("\n")
                    }
                };

                if text.is_empty() {
                    continue;
                }

                items.push(KnowledgeItem {
                    id: raw.id.unwrap_or_else(|| format!("{category}_{idx}")),
                    category: category.clone(),
                    text,
                    question,
                    answer,
                    score: 0.0,
                });
            }
        }
        items
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const KNOWLEDGE_JSON: &str = r#"{
        "roleName": "张三",
        "knowledge": {
            "languageStyle": {
                "rules": "说话简短，多用口语。",
                "examples": [{"id": "ex1", "text": "嗨，今天咋样？"}],
                "avoid": [{"id": "av1", "text": "书面语"}]
            },
            "faq": [
                {"id": "faq_greeting", "question": "你是谁？", "answer": "我是张三。"},
                {"question": "   ", "answer": ""},
                {"text": "张三出生于北京。"}
            ],
            "facts": [
                {"text": "   "}
            ]
        }
    }"#;

    fn write_library(dir: &tempfile::TempDir) -> RoleKnowledgeLibrary {
        std::fs::write(
            dir.path().join("index.json"),
            r#"{"张三": "zhangsan.json"}"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("zhangsan.json"), KNOWLEDGE_JSON).unwrap();
        RoleKnowledgeLibrary::new(dir.path())
    }

    #[tokio::test]
    async fn loads_style_block() {
        let dir = tempfile::tempdir().unwrap();
        let library = write_library(&dir);

        let style = library.style("张三").await.unwrap();
        assert_eq!(style.rules.as_deref(), Some("说话简短，多用口语。"));
        assert_eq!(style.examples.unwrap().len(), 1);
        assert_eq!(style.avoid.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn style_lookup_trims_role_name() {
        let dir = tempfile::tempdir().unwrap();
        let library = write_library(&dir);
        assert!(library.style(" 张三 ").await.is_some());
    }

    #[tokio::test]
    async fn candidates_exclude_empty_and_style() {
        let dir = tempfile::tempdir().unwrap();
        let library = write_library(&dir);

        let items = library.candidates("张三").await;
        // Two usable faq items; the whitespace-only entries are dropped and
        // languageStyle never becomes a candidate.
        assert_eq!(items.len(), 2);
        assert!(items.iter().all(|it| it.category == "faq"));
    }

    #[tokio::test]
    async fn question_answer_concatenation_and_default_ids() {
        let dir = tempfile::tempdir().unwrap();
        let library = write_library(&dir);

        let items = library.candidates("张三").await;
        let qa = items.iter().find(|it| it.id == "faq_greeting").unwrap();
        assert_eq!(qa.text, "你是谁？\n我是张三。");

        let bare = items.iter().find(|it| it.id == "faq_2").unwrap();
        assert_eq!(bare.text, "张三出生于北京。");
        assert!(bare.question.is_none());
    }

    #[tokio::test]
    async fn unknown_role_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let library = write_library(&dir);

        assert!(library.style("王五").await.is_none());
        assert!(library.candidates("王五").await.is_empty());
    }

    #[tokio::test]
    async fn missing_root_yields_nothing() {
        let library = RoleKnowledgeLibrary::new("/nonexistent/knowledge");
        assert!(library.style("张三").await.is_none());
        assert!(library.candidates("张三").await.is_empty());
    }
}
