//! Tutor Instruction Preamble
//!
//! The preamble is the persona and class protocol handed to the model as the
//! first user turn of every request. It is a plain-text template with three
//! placeholders: `{topic_name}`, `{topic_id}` and `{topic_content}`.

use crate::lesson::LessonContext;
use anyhow::{Context, Result};
use std::path::Path;

/// File name looked up inside a prompts directory.
pub const PREAMBLE_FILE_NAME: &str = "tutor_preamble.md";

/// Model-side reply to the preamble, closing the synthetic first exchange.
pub const PREAMBLE_ACKNOWLEDGEMENT: &str =
    "Understood. I am ready to guide the learner following the class protocol strictly.";

const BUILTIN_PREAMBLE: &str = include_str!("../prompts/tutor_preamble.md");

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreambleTemplate {
    template: String,
}

impl Default for PreambleTemplate {
    fn default() -> Self {
        Self::builtin()
    }
}

impl PreambleTemplate {
    /// The preamble compiled into the crate.
    pub fn builtin() -> Self {
        Self::new(BUILTIN_PREAMBLE)
    }

    pub fn new(template: impl Into<String>) -> Self {
        Self {
            template: template.into(),
        }
    }

    /// Loads a template from a file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let template = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read preamble template {}", path.display()))?;
        if template.trim().is_empty() {
            anyhow::bail!("Preamble template {} is empty", path.display());
        }
        Ok(Self::new(template))
    }

    /// Loads `tutor_preamble.md` from a prompts directory, or the built-in
    /// template when the directory has no such file.
    pub fn from_dir(dir: &Path) -> Result<Self> {
        let path = dir.join(PREAMBLE_FILE_NAME);
        if path.is_file() {
            Self::from_file(&path)
        } else {
            Ok(Self::builtin())
        }
    }

    /// Substitutes the lesson into the template.
    ///
    /// Placeholders are expanded in a single pass, so placeholder-looking text
    /// inside the lesson itself is copied through untouched.
    pub fn render(&self, lesson: &LessonContext) -> String {
        let mut out = String::with_capacity(self.template.len() + lesson.topic_content.len());
        let mut rest = self.template.as_str();

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let substitution = [
                ("{topic_name}", lesson.topic_name.as_str()),
                ("{topic_id}", lesson.topic_id.as_str()),
                ("{topic_content}", lesson.topic_content.as_str()),
            ]
            .into_iter()
            .find(|(placeholder, _)| tail.starts_with(placeholder));

            match substitution {
                Some((placeholder, value)) => {
                    out.push_str(value);
                    rest = &tail[placeholder.len()..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }
        out.push_str(rest);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lesson() -> LessonContext {
        LessonContext::new(Some("topic-3".into()), "Ohm's law", "V = I * R")
    }

    #[test]
    fn test_builtin_mentions_every_lesson_field() {
        let rendered = PreambleTemplate::builtin().render(&lesson());
        assert!(rendered.contains("Name: \"Ohm's law\""));
        assert!(rendered.contains("ID: \"topic-3\""));
        assert!(rendered.contains("V = I * R"));
        assert!(rendered.contains(r#""subtopic_id": "topic-3""#));
        assert!(!rendered.contains("{topic_"));
    }

    #[test]
    fn test_render_leaves_other_braces_alone() {
        let template = PreambleTemplate::new(r#"{"id": "{topic_id}"} {unknown} {"#);
        assert_eq!(template.render(&lesson()), r#"{"id": "topic-3"} {unknown} {"#);
    }

    #[test]
    fn test_render_is_single_pass() {
        let template = PreambleTemplate::new("{topic_content}|{topic_name}");
        let lesson = LessonContext::new(None, "Sets", "literal {topic_name}");
        assert_eq!(template.render(&lesson), "literal {topic_name}|Sets");
    }

    #[test]
    fn test_from_dir_without_file_uses_builtin() {
        let dir = std::env::temp_dir().join(format!("tutor-prompts-missing-{}", std::process::id()));
        let template = PreambleTemplate::from_dir(&dir).unwrap();
        assert_eq!(template, PreambleTemplate::builtin());
    }

    #[test]
    fn test_from_dir_reads_override() {
        let dir = std::env::temp_dir().join(format!("tutor-prompts-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        std::fs::write(dir.join(PREAMBLE_FILE_NAME), "Teach {topic_name}.").unwrap();

        let template = PreambleTemplate::from_dir(&dir).unwrap();
        assert_eq!(template.render(&lesson()), "Teach Ohm's law.");

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_from_file_rejects_empty_template() {
        let path = std::env::temp_dir().join(format!("tutor-empty-{}.md", std::process::id()));
        std::fs::write(&path, "  \n").unwrap();
        assert!(PreambleTemplate::from_file(&path).is_err());
        std::fs::remove_file(&path).unwrap();
    }
}
