use std::collections::HashMap;
use url::Url;

/// `get_url(path="css/stella.css")` resolves a site-relative path against `base_url`.
pub struct GetURL {
    base_url: Url,
}

impl GetURL {
    pub fn new(base_url: Url) -> Self {
        GetURL { base_url }
    }
}

impl tera::Function for GetURL {
    fn call(&self, args: &HashMap<String, tera::Value>) -> tera::Result<tera::Value> {
        let path = args
            .get("path")
            .cloned()
            .map(tera::from_value::<String>)
            .transpose()?
            .ok_or_else(|| tera::Error::msg("get_url: missing `path` argument"))?;

        let result = self
            .base_url
            .join(path.trim())
            .map_err(|e| tera::Error::msg(format!("get_url: invalid path '{path}': {e}")))?;

        Ok(tera::to_value::<String>(result.into())?)
    }

    fn is_safe(&self) -> bool {
        true
    }
}
