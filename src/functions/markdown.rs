use std::{collections::HashMap, sync::Arc};

use crate::{highlighter::Highlighter, markdown::markdown_to_html};

/// `{{ text | markdown | safe }}` renders a string as Markdown, with fenced
/// code highlighted like page bodies.
pub struct Markdown {
    highlighter: Arc<Highlighter>,
}

impl Markdown {
    pub fn new(highlighter: Arc<Highlighter>) -> Self {
        Self { highlighter }
    }
}

impl tera::Filter for Markdown {
    fn filter(
        &self,
        value: &tera::Value,
        _args: &HashMap<String, tera::Value>,
    ) -> tera::Result<tera::Value> {
        let input = tera::from_value::<String>(value.clone())?;

        let contents =
            markdown_to_html(&input, &self.highlighter, None).map_err(tera::Error::msg)?;

        Ok(tera::to_value(contents.trim_end())?)
    }
}

#[cfg(test)]
mod tests {
    use tera::Filter;

    use super::*;

    fn markdown() -> Markdown {
        Markdown::new(Arc::new(Highlighter::with_syntaxes(None).unwrap()))
    }

    #[test]
    fn renders_inline_markdown() {
        let value = markdown()
            .filter(&tera::to_value("Runs *Atari 2600* games").unwrap(), &HashMap::new())
            .unwrap();

        assert_eq!(value, "<p>Runs <em>Atari 2600</em> games</p>");
    }

    #[test]
    fn highlights_fenced_code() {
        let value = markdown()
            .filter(
                &tera::to_value("```rust\nfn main() {}\n```\n").unwrap(),
                &HashMap::new(),
            )
            .unwrap();
        let html = value.as_str().unwrap();

        assert!(html.starts_with("<pre style="), "{html}");
        assert!(!html.contains("<code"), "{html}");
    }

    #[test]
    fn leaves_relative_images_alone() {
        let value = markdown()
            .filter(&tera::to_value("![shot](images/pitfall.png)").unwrap(), &HashMap::new())
            .unwrap();

        assert!(value.as_str().unwrap().contains("src=\"images/pitfall.png\""));
    }
}
