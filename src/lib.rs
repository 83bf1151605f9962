use std::{
    fs,
    net::SocketAddr,
    path::{Path, PathBuf},
    sync::Arc,
};

use anyhow::anyhow;
use serde::{Deserialize, Serialize};
use tera::Tera;
use url::Url;

use crate::{
    functions::{get_url::GetURL, markdown::Markdown},
    highlighter::Highlighter,
};

pub mod build;
pub mod composer;
pub mod fragments;
pub mod frontmatter;
pub mod functions;
pub mod highlighter;
pub mod markdown;
pub mod page;
pub mod server;
pub mod site;

pub use composer::{ComposeError, Composer};
pub use fragments::FragmentKind;

/// Base URL used when previewing a build locally.
pub const LOCAL_BASE_URL: &str = "http://127.0.0.1:1111";

/// `serve --local` links everything to the address being served.
pub fn serve_base_url(bind: SocketAddr, local: bool) -> anyhow::Result<Option<Url>> {
    local
        .then(|| Url::parse(&format!("http://{bind}/")))
        .transpose()
        .map_err(Into::into)
}

pub fn build_base_url(local: bool) -> anyhow::Result<Option<Url>> {
    local
        .then(|| Url::parse(LOCAL_BASE_URL))
        .transpose()
        .map_err(Into::into)
}

/// Where a site lives on disk, plus its parsed `config.toml`.
pub struct Context {
    home: PathBuf,
    pub config: Config,
}

impl Context {
    pub fn new(home: PathBuf, base_url: Option<Url>) -> anyhow::Result<Self> {
        let config_file = home.join("config.toml");
        let config_text = fs::read_to_string(&config_file)
            .map_err(|e| anyhow!("unable to read {}: {e}", config_file.display()))?;
        let mut config: Config = toml::from_str(&config_text)?;

        if let Some(base_url) = base_url {
            config.base_url = base_url;
        }

        Ok(Self { home, config })
    }

    pub fn home(&self) -> &Path {
        &self.home
    }

    pub fn absolute<P: AsRef<Path>>(&self, path: P) -> PathBuf {
        self.home.join(path.as_ref())
    }

    pub fn relative(&self, path: &Path) -> anyhow::Result<PathBuf> {
        Ok(path.strip_prefix(&self.home)?.into())
    }

    pub fn static_dir(&self) -> PathBuf {
        self.absolute("static")
    }
}

#[derive(Deserialize, Serialize, Clone, Debug, PartialEq, Eq)]
pub struct Stylesheet {
    pub href: String,
    #[serde(default = "default_media")]
    pub media: String,
}

fn default_media() -> String {
    "screen".to_string()
}

fn default_stylesheets() -> Vec<Stylesheet> {
    vec![
        Stylesheet {
            href: "css/stella.css".to_string(),
            media: "screen".to_string(),
        },
        Stylesheet {
            href: "css/print.css".to_string(),
            media: "print".to_string(),
        },
    ]
}

#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct Config {
    pub title: String,
    pub base_url: Url,
    #[serde(default = "default_stylesheets")]
    pub stylesheets: Vec<Stylesheet>,
    #[serde(default)]
    pub extra: toml::Table,
}

impl Config {
    /// The page called `index` lives at the site root.
    pub fn make_permalink(&self, name: &str) -> anyhow::Result<Url> {
        let path = if name == "index" { "" } else { name };
        Ok(self.base_url.join(path)?)
    }

    pub fn resolve(&self, href: &str) -> anyhow::Result<Url> {
        Ok(self.base_url.join(href.trim())?)
    }
}

/// Loads every template under `templates/` and registers the site helpers.
pub fn setup_template_engine(
    context: &Context,
    highlighter: Arc<Highlighter>,
) -> anyhow::Result<Tera> {
    let template_dir = context.absolute("templates");

    let mut tera = Tera::new(&template_dir.join("**").join("*").to_string_lossy())?;

    tera.register_function("get_url", GetURL::new(context.config.base_url.clone()));
    tera.register_filter("markdown", Markdown::new(highlighter));

    tracing::info!(
        templates = ?tera.get_template_names().collect::<Vec<_>>(),
        "loaded templates"
    );

    Ok(tera)
}
