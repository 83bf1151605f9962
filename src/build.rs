use std::{
    fs::{self, create_dir_all, remove_dir_all},
    path::{Component, Path, PathBuf},
};

use anyhow::bail;
use walkdir::WalkDir;

use crate::{composer::Composer, Context};

/// Destination of a static build.
pub struct Output {
    dir: PathBuf,
}

impl Output {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    /// Refuses a directory whose cleaning would delete site sources: the site
    /// itself, anything containing it, or anything inside its source dirs.
    fn check(&self, context: &Context) -> anyhow::Result<()> {
        let output = canonical(&self.dir)?;
        let home = canonical(context.home())?;

        if home.starts_with(&output) {
            bail!(
                "refusing to build into {}: it contains the site at {}",
                self.dir.display(),
                context.home().display()
            );
        }

        for source in ["content", "templates", "static", "syntaxes"] {
            if output.starts_with(home.join(source)) {
                bail!(
                    "refusing to build into {}: it is inside the site's {source}/ directory",
                    self.dir.display()
                );
            }
        }

        Ok(())
    }

    fn clean(&self) -> anyhow::Result<()> {
        if self.dir.exists() {
            remove_dir_all(&self.dir)?;
        }
        create_dir_all(&self.dir)?;
        Ok(())
    }

    fn create_dir(&self, path: &Path) -> anyhow::Result<()> {
        let output = self.dir.join(path);
        Ok(fs::create_dir_all(output)?)
    }

    fn copy(&self, file: &Path, path: &Path) -> anyhow::Result<()> {
        path.parent().map(|p| self.create_dir(p)).transpose()?;

        fs::copy(file, self.dir.join(path))?;

        Ok(())
    }

    fn write(&self, path: &Path, contents: &str) -> anyhow::Result<()> {
        path.parent().map(|p| self.create_dir(p)).transpose()?;

        fs::write(self.dir.join(path), contents)?;

        Ok(())
    }
}

/// Resolves symlinks and `..` through the part of `path` that exists, so
/// paths that do not exist yet can still be compared.
fn canonical(path: &Path) -> anyhow::Result<PathBuf> {
    let path = if path.is_absolute() {
        path.to_path_buf()
    } else {
        std::env::current_dir()?.join(path)
    };

    for ancestor in path.ancestors() {
        if ancestor.exists() {
            let rest = path.strip_prefix(ancestor)?;
            if rest
                .components()
                .any(|c| !matches!(c, Component::Normal(_)))
            {
                bail!("unable to resolve {}", path.display());
            }
            return Ok(ancestor.canonicalize()?.join(rest));
        }
    }

    Ok(path)
}

fn copy_static_files(context: &Context, output: &Output) -> anyhow::Result<()> {
    let static_dir = context.static_dir();

    if !static_dir.is_dir() {
        return Ok(());
    }

    for entry in WalkDir::new(&static_dir) {
        let entry = entry?;

        if !entry.file_type().is_file() {
            continue;
        }

        output.copy(entry.path(), entry.path().strip_prefix(&static_dir)?)?;
    }

    Ok(())
}

/// Writes every page to `<name>.html` and copies `static/` alongside.
///
/// The first page that fails to compose aborts the build.
pub fn build_site(context: &Context, composer: &Composer, output: &Output) -> anyhow::Result<()> {
    output.check(context)?;
    output.clean()?;

    copy_static_files(context, output)?;

    for name in composer.site().names() {
        let document = composer.compose(name)?;
        let path = PathBuf::from(format!("{name}.html"));

        tracing::info!(page = name, path = %path.display(), "writing");

        output.write(&path, &document)?;
    }

    Ok(())
}
