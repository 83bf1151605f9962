use anyhow::anyhow;

const MARKER: &str = "+++";

/// Splits a content file into its `+++` delimited TOML frontmatter and body.
///
/// A file that does not open with the marker has no frontmatter, and
/// `D::default()` is returned alongside the untouched input. A leading
/// byte order mark is dropped either way.
pub fn parse<D>(data: &str) -> anyhow::Result<(D, &str)>
where
    D: serde::de::DeserializeOwned + Default,
{
    let data = data.strip_prefix('\u{feff}').unwrap_or(data);

    if !data.trim_start().starts_with(MARKER) {
        return Ok((D::default(), data));
    }

    let start = data.find(MARKER).unwrap_or_default() + MARKER.len();

    let end = data[start..]
        .find(MARKER)
        .ok_or_else(|| anyhow!("unterminated frontmatter"))?;

    let frontmatter = &data[start..start + end];

    let end = start + end + MARKER.len();
    let extra = &data[end..];

    Ok((toml::from_str::<D>(frontmatter.trim())?, extra.trim_start()))
}
