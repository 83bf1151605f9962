use std::{collections::BTreeMap, fs};

use anyhow::{anyhow, bail};
use walkdir::WalkDir;

use crate::{
    fragments, frontmatter,
    markdown::Renderer,
    page::{ContentFormat, FrontMatter, Page, PartialPage},
    Context,
};

/// Every page body under `content/`, keyed by page name.
#[derive(Default)]
pub struct Site {
    pub pages: BTreeMap<String, Page>,
}

impl Site {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> Option<&Page> {
        self.pages.get(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    /// Compiles each top-level file in `content/` into a [`Page`].
    ///
    /// Files starting with `_` are drafts and skipped, as are extensions
    /// that are neither markup nor Markdown.
    pub fn load(context: &Context, renderer: &Renderer) -> anyhow::Result<Self> {
        let mut site = Site::new();

        let content_dir = context.absolute("content");

        for entry in WalkDir::new(&content_dir).min_depth(1).max_depth(1).sort_by_file_name() {
            let entry = entry?;

            if !entry.file_type().is_file() {
                continue;
            }

            let path = entry.path();
            let relative = context.relative(path)?;

            let Some(name) = path.file_stem().map(|s| s.to_string_lossy().to_string()) else {
                continue;
            };

            if name.starts_with('_') || name.starts_with('.') {
                tracing::debug!(path = %relative.display(), "skipping draft");
                continue;
            }

            let extension = path
                .extension()
                .map(|e| e.to_string_lossy().to_ascii_lowercase())
                .unwrap_or_default();

            let Some(format) = ContentFormat::from_extension(&extension) else {
                tracing::warn!(path = %relative.display(), "skipping unsupported content file");
                continue;
            };

            if let Some(existing) = site.pages.get(&name) {
                bail!(
                    "{} and {} both define page '{name}'",
                    existing.source_path.display(),
                    relative.display()
                );
            }

            tracing::info!(path = %relative.display(), "compiling");

            let contents = fs::read_to_string(path)?;

            let (frontmatter, body) = frontmatter::parse::<FrontMatter>(&contents)
                .map_err(|e| anyhow!("{}: {e}", relative.display()))?;

            let partial = PartialPage {
                name: name.clone(),
                title: frontmatter.title,
                description: frontmatter.description.unwrap_or_default(),
                permalink: context.config.make_permalink(&name)?,
            };

            let content = renderer
                .render_content(body, format, &partial)
                .map_err(|e| anyhow!("{}: {e}", relative.display()))?;

            if let Some(id) = fragments::claimed_block_id(&content) {
                bail!(
                    "{}: declares id \"{id}\", which is reserved for the page layout",
                    relative.display()
                );
            }

            let page = Page {
                name: partial.name,
                source_path: relative,
                title: partial.title,
                description: partial.description,
                stylesheets: frontmatter.stylesheets,
                content,
                permalink: partial.permalink.into(),
            };

            site.pages.insert(page.name.clone(), page);
        }

        Ok(site)
    }
}
