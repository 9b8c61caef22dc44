use crate::anthropic;

#[derive(Clone)]
pub struct CompanionConfig {
    pub api_key: String,
    pub base_url: String,
}

impl std::fmt::Debug for CompanionConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompanionConfig")
            .field("api_key", &"<redacted>")
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl CompanionConfig {
    /// Reads `ANTHROPIC_API_KEY` (required) and `LIBRETTO_API_BASE_URL`.
    pub fn from_env() -> anyhow::Result<Self> {
        let api_key = std::env::var("ANTHROPIC_API_KEY")
            .map_err(|_| anyhow::anyhow!("ANTHROPIC_API_KEY is not set"))?;
        let base_url = std::env::var("LIBRETTO_API_BASE_URL").ok();
        Self::new(api_key, base_url)
    }

    pub fn new(api_key: String, base_url: Option<String>) -> anyhow::Result<Self> {
        if api_key.trim().is_empty() {
            anyhow::bail!("ANTHROPIC_API_KEY is empty");
        }
        let base_url = match base_url {
            Some(url) if !url.trim().is_empty() => url.trim().to_owned(),
            _ => anthropic::DEFAULT_BASE_URL.to_owned(),
        };
        Ok(Self { api_key, base_url })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_defaults_base_url() -> anyhow::Result<()> {
        let config = CompanionConfig::new("sk-test".to_owned(), None)?;
        assert_eq!(config.base_url, anthropic::DEFAULT_BASE_URL);

        let config = CompanionConfig::new("sk-test".to_owned(), Some("  ".to_owned()))?;
        assert_eq!(config.base_url, anthropic::DEFAULT_BASE_URL);

        let config =
            CompanionConfig::new("sk-test".to_owned(), Some("http://127.0.0.1:1/v1".to_owned()))?;
        assert_eq!(config.base_url, "http://127.0.0.1:1/v1");
        Ok(())
    }

    #[test]
    fn new_rejects_blank_key() {
        assert!(CompanionConfig::new(" ".to_owned(), None).is_err());
    }

    #[test]
    fn debug_redacts_api_key() -> anyhow::Result<()> {
        let config = CompanionConfig::new("sk-secret".to_owned(), None)?;
        assert!(!format!("{config:?}").contains("sk-secret"));
        Ok(())
    }
}
