use std::{fmt::Write, sync::Arc};

use tera::{escape_html, Tera};

use crate::{
    fragments::{self, FragmentKind, CONTENT_ID},
    highlighter::Highlighter,
    markdown::Renderer,
    page::Page,
    setup_template_engine,
    site::Site,
    Config, Context,
};

#[derive(Debug, thiserror::Error)]
pub enum ComposeError {
    #[error("no page named '{0}'")]
    NotFound(String),
    #[error("the {0} fragment is missing")]
    FragmentMissing(FragmentKind),
    #[error("the {kind} fragment declares id \"{id}\", which wraps another block")]
    DuplicateBlockId { kind: FragmentKind, id: &'static str },
    #[error("failed to render the {kind} fragment")]
    Render {
        kind: FragmentKind,
        #[source]
        source: tera::Error,
    },
}

/// Assembles complete documents from a page body and the shared fragments.
///
/// Everything is loaded up front; composing never mutates anything, so one
/// composer can be shared by any number of concurrent requests.
pub struct Composer {
    config: Config,
    tera: Tera,
    site: Site,
}

impl Composer {
    pub fn new(config: Config, tera: Tera, site: Site) -> Self {
        for kind in fragments::missing(&tera) {
            tracing::warn!(
                fragment = %kind,
                template = kind.template_name(),
                "shared fragment not found, pages will fail to render"
            );
        }

        Self { config, tera, site }
    }

    /// Loads templates, compiles every page under `content/` and builds a composer.
    pub fn load(context: &Context) -> anyhow::Result<Self> {
        let highlighter = Arc::new(Highlighter::new(context)?);
        let tera = setup_template_engine(context, highlighter.clone())?;

        let site = Site::load(
            context,
            &Renderer {
                config: &context.config,
                tera: &tera,
                highlighter: &highlighter,
            },
        )?;

        tracing::info!(pages = ?site.names().collect::<Vec<_>>(), "loaded pages");

        Ok(Self::new(context.config.clone(), tera, site))
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn site(&self) -> &Site {
        &self.site
    }

    pub fn compose(&self, name: &str) -> Result<String, ComposeError> {
        let page = self
            .site
            .get(name)
            .ok_or_else(|| ComposeError::NotFound(name.to_string()))?;

        let header = self.render_fragment(FragmentKind::Header, page)?;
        let footer = self.render_fragment(FragmentKind::Footer, page)?;
        let menu = self.render_fragment(FragmentKind::Menu, page)?;

        let mut document = self.document_head(page);

        push_block(&mut document, FragmentKind::Header.element_id(), &header);
        push_block(&mut document, CONTENT_ID, &page.content);
        push_block(&mut document, FragmentKind::Footer.element_id(), &footer);
        push_block(&mut document, FragmentKind::Menu.element_id(), &menu);

        document.push_str("</body>\n</html>\n");

        Ok(document)
    }

    fn render_fragment(&self, kind: FragmentKind, page: &Page) -> Result<String, ComposeError> {
        if !kind.is_loaded(&self.tera) {
            return Err(ComposeError::FragmentMissing(kind));
        }

        let mut ctx = tera::Context::new();
        ctx.insert("config", &self.config);
        ctx.insert("page", page);
        ctx.insert("current_url", &page.permalink);

        let markup = self
            .tera
            .render(kind.template_name(), &ctx)
            .map_err(|source| ComposeError::Render { kind, source })?;

        if let Some(id) = fragments::claimed_block_id(&markup) {
            return Err(ComposeError::DuplicateBlockId { kind, id });
        }

        Ok(markup)
    }

    fn document_head(&self, page: &Page) -> String {
        let mut head = String::from("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
        head.push_str("<meta charset=\"utf-8\">\n");

        // writing into a String cannot fail
        let _ = writeln!(
            head,
            "<title>{}</title>",
            escape_html(&page.document_title(&self.config.title))
        );

        if !page.description.is_empty() {
            let _ = writeln!(
                head,
                "<meta name=\"description\" content=\"{}\">",
                escape_html(&page.description)
            );
        }

        for stylesheet in self.config.stylesheets.iter().chain(&page.stylesheets) {
            // serialized URLs are already percent-encoded
            let href = match self.config.resolve(&stylesheet.href) {
                Ok(url) => url.to_string(),
                Err(_) => escape_html(&stylesheet.href),
            };

            let _ = writeln!(
                head,
                "<link rel=\"stylesheet\" type=\"text/css\" media=\"{}\" href=\"{href}\">",
                escape_html(&stylesheet.media),
            );
        }

        head.push_str("</head>\n<body>\n");
        head
    }
}

fn push_block(document: &mut String, id: &str, markup: &str) {
    let _ = writeln!(document, "<div id=\"{id}\">");
    document.push_str(markup.trim());
    document.push_str("\n</div>\n");
}
