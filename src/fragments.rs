use std::fmt;

use tera::Tera;

/// The shared blocks spliced around every page body.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FragmentKind {
    Header,
    Footer,
    Menu,
}

impl FragmentKind {
    pub const ALL: [FragmentKind; 3] = [Self::Header, Self::Footer, Self::Menu];

    pub fn template_name(self) -> &'static str {
        match self {
            Self::Header => "fragments/header.html",
            Self::Footer => "fragments/footer.html",
            Self::Menu => "fragments/menu.html",
        }
    }

    /// `id` of the element the fragment is wrapped in.
    pub fn element_id(self) -> &'static str {
        match self {
            Self::Header => "header",
            Self::Footer => "footer",
            Self::Menu => "menu",
        }
    }

    pub fn is_loaded(self, tera: &Tera) -> bool {
        tera.get_template_names().any(|t| t == self.template_name())
    }
}

impl fmt::Display for FragmentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.element_id())
    }
}

/// `id` of the element wrapping the page body.
pub const CONTENT_ID: &str = "content";

/// Ids the composer gives its own wrapper elements; markup inside a block
/// must not declare any of them.
pub const BLOCK_IDS: [&str; 4] = ["header", CONTENT_ID, "footer", "menu"];

pub fn claimed_block_id(markup: &str) -> Option<&'static str> {
    BLOCK_IDS.into_iter().find(|id| {
        markup.contains(&format!("id=\"{id}\"")) || markup.contains(&format!("id='{id}'"))
    })
}

pub fn missing(tera: &Tera) -> Vec<FragmentKind> {
    FragmentKind::ALL
        .into_iter()
        .filter(|kind| !kind.is_loaded(tera))
        .collect()
}
