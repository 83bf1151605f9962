use std::path::Path;

use anyhow::anyhow;
use syntect::{
    highlighting::{Theme, ThemeSet},
    html::highlighted_html_for_string,
    parsing::SyntaxSet,
};

use crate::Context;

const THEME: &str = "base16-ocean.dark";

pub struct Highlighter {
    syntax_set: SyntaxSet,
    theme: Theme,
}

impl Highlighter {
    /// Default syntaxes, plus any `.sublime-syntax` files under `syntaxes/`.
    pub fn new(context: &Context) -> anyhow::Result<Self> {
        Self::with_syntaxes(Some(&context.absolute("syntaxes")))
    }

    pub fn with_syntaxes(syntax_dir: Option<&Path>) -> anyhow::Result<Self> {
        let mut syntax_set_builder = SyntaxSet::load_defaults_newlines().into_builder();

        if let Some(syntax_dir) = syntax_dir.filter(|d| d.is_dir()) {
            syntax_set_builder.add_from_folder(syntax_dir, true)?;
        }

        let syntax_set = syntax_set_builder.build();

        let mut theme_set = ThemeSet::load_defaults();
        let theme = theme_set
            .themes
            .remove(THEME)
            .ok_or_else(|| anyhow!("missing highlighting theme {THEME}"))?;

        Ok(Self { syntax_set, theme })
    }

    pub fn highlight(&self, lang: &str, input: &str) -> anyhow::Result<String> {
        let syntax = self
            .syntax_set
            .find_syntax_by_token(lang)
            .unwrap_or_else(|| self.syntax_set.find_syntax_plain_text());

        Ok(highlighted_html_for_string(
            input,
            &self.syntax_set,
            syntax,
            &self.theme,
        )?)
    }
}
