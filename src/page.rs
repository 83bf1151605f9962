use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::Stylesheet;

/// How a content file's body is turned into markup.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContentFormat {
    /// Markup used verbatim, apart from shortcode expansion.
    Html,
    Markdown,
}

impl ContentFormat {
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension {
            "html" | "htm" => Some(Self::Html),
            "md" | "markdown" => Some(Self::Markdown),
            _ => None,
        }
    }
}

#[derive(Deserialize, Default, Debug)]
pub struct FrontMatter {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub stylesheets: Vec<Stylesheet>,
}

/// What shortcodes and markdown rendering get to see of a page whose body
/// is still being compiled.
#[derive(Serialize)]
pub struct PartialPage {
    pub name: String,
    pub title: Option<String>,
    pub description: String,
    pub permalink: Url,
}

#[derive(Serialize, Clone, Debug)]
pub struct Page {
    pub name: String,
    #[serde(skip)]
    pub source_path: PathBuf,
    pub title: Option<String>,
    pub description: String,
    pub stylesheets: Vec<Stylesheet>,
    pub content: String,
    pub permalink: String,
}

impl Page {
    pub fn document_title(&self, site_title: &str) -> String {
        match &self.title {
            Some(title) => format!("{title} - {site_title}"),
            None => site_title.to_string(),
        }
    }
}
