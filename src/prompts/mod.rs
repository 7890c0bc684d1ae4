//! Prompt templates
//!
//! A prompt is the base block, a separator, and the template block with
//! every `{topic}` placeholder filled in. Built-in blocks ship in the binary;
//! a prompts directory may override any of them with `<name>.md`.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::str::FromStr;

use crate::error::{ResearchError, Result};

/// Separator between the base block and the template block.
pub const SECTION_SEPARATOR: &str = "\n\n---\n\n";

/// Placeholder replaced by the topic in template blocks.
pub const TOPIC_PLACEHOLDER: &str = "{topic}";

const BASE: &str = include_str!("../../prompts/base.md");
const COMPANY: &str = include_str!("../../prompts/company.md");
const PERSON: &str = include_str!("../../prompts/person.md");
const PRODUCT: &str = include_str!("../../prompts/product.md");

/// Named prompt structure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Template {
    Company,
    Person,
    Product,
    /// The topic is the full query.
    Custom,
}

impl Template {
    pub const ALL: [Template; 4] = [
        Template::Company,
        Template::Person,
        Template::Product,
        Template::Custom,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Template::Company => "company",
            Template::Person => "person",
            Template::Product => "product",
            Template::Custom => "custom",
        }
    }

    fn builtin_block(&self) -> Option<&'static str> {
        match self {
            Template::Company => Some(COMPANY),
            Template::Person => Some(PERSON),
            Template::Product => Some(PRODUCT),
            Template::Custom => None,
        }
    }
}

impl fmt::Display for Template {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Template {
    type Err = ResearchError;

    fn from_str(s: &str) -> Result<Self> {
        Template::ALL
            .into_iter()
            .find(|t| t.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ResearchError::InvalidTemplate {
                name: s.to_string(),
                available: Template::ALL.map(|t| t.as_str()).join(", "),
            })
    }
}

/// Source of prompt blocks.
#[derive(Debug, Clone, Default)]
pub struct PromptLibrary {
    overrides: Option<PathBuf>,
}

impl PromptLibrary {
    /// Built-in blocks only.
    pub fn builtin() -> Self {
        Self::default()
    }

    /// Built-in blocks, overridden by `<dir>/<name>.md` where present.
    pub fn with_overrides(dir: impl Into<PathBuf>) -> Self {
        Self {
            overrides: Some(dir.into()),
        }
    }

    fn block(&self, name: &str, builtin: &'static str) -> Result<String> {
        if let Some(dir) = &self.overrides {
            let path = dir.join(format!("{}.md", name));
            match fs::read_to_string(&path) {
                Ok(text) => {
                    tracing::debug!(path = %path.display(), "using prompt override");
                    return Ok(text);
                }
                Err(e) if e.kind() == io::ErrorKind::NotFound => {}
                Err(e) => return Err(e.into()),
            }
        }
        Ok(builtin.to_string())
    }

    /// Assemble the full prompt for `template` and `topic`.
    pub fn render(&self, template: Template, topic: &str) -> Result<String> {
        let base = self.block("base", BASE)?;
        let body = match template.builtin_block() {
            Some(builtin) => self
                .block(template.as_str(), builtin)?
                .replace(TOPIC_PLACEHOLDER, topic),
            None => topic.to_string(),
        };
        Ok(format!("{}{}{}", base.trim_end(), SECTION_SEPARATOR, body))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_parse_templates() {
        assert_eq!("company".parse::<Template>().unwrap(), Template::Company);
        assert_eq!("Person".parse::<Template>().unwrap(), Template::Person);

        match "biography".parse::<Template>() {
            Err(ResearchError::InvalidTemplate { name, available }) => {
                assert_eq!(name, "biography");
                assert_eq!(available, "company, person, product, custom");
            }
            other => panic!("expected InvalidTemplate, got {:?}", other),
        }
    }

    #[test]
    fn test_render_fills_topic() {
        let prompt = PromptLibrary::builtin()
            .render(Template::Company, "Acme Robotics")
            .unwrap();

        assert!(prompt.starts_with(BASE.trim_end()));
        assert!(prompt.contains(SECTION_SEPARATOR));
        assert!(prompt.contains("Company research: Acme Robotics"));
        assert!(!prompt.contains(TOPIC_PLACEHOLDER));
    }

    #[test]
    fn test_render_custom_appends_query() {
        let query = "How do {topic} placeholders survive in custom queries?";
        let prompt = PromptLibrary::builtin().render(Template::Custom, query).unwrap();

        assert!(prompt.ends_with(&format!("{}{}", SECTION_SEPARATOR, query)));
    }

    #[test]
    fn test_every_builtin_template_renders() {
        for template in Template::ALL {
            let prompt = PromptLibrary::builtin().render(template, "Zed").unwrap();
            assert!(prompt.contains("Zed"), "{} lost the topic", template);
        }
    }

    #[test]
    fn test_overrides() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("person.md"), "Profile {topic} briefly.").unwrap();

        let library = PromptLibrary::with_overrides(dir.path());
        let person = library.render(Template::Person, "Ada").unwrap();
        assert!(person.ends_with("Profile Ada briefly."));

        // No override for company: built-in block
        let company = library.render(Template::Company, "Acme").unwrap();
        assert!(company.contains("Company research: Acme"));
    }
}
