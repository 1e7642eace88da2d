//! Initialize a new site

use anyhow::Result;
use std::fs;
use std::path::Path;

/// Default `_config.yml` written by `init`
const DEFAULT_CONFIG: &str = r#"# spacetraveling configuration

# Site
title: spacetraveling
language: pt-BR
timezone: America/Sao_Paulo

# URL
url: http://localhost:3000
root: /

# Directory
public_dir: public

# Content source
# The access token and endpoint can also be set with the
# PRISMIC_ACCESS_TOKEN and PRISMIC_API_ENDPOINT environment variables.
cms:
  endpoint: https://spacetraveling.cdn.prismic.io/api/v2
  document_type: p1

# Home page
listing:
  page_size: 2
  revalidate: 86400
  load_more_label: Carregar mais posts

# Post pages
post:
  prerender_limit: 2
  words_per_minute: 200
  loading_label: Carregando...

# Date format
date_format: dd MMM yyyy
"#;

/// Initialize a new site in the given directory
pub fn init_site(target_dir: &Path) -> Result<()> {
    fs::create_dir_all(target_dir)?;

    let config_path = target_dir.join("_config.yml");
    if config_path.exists() {
        anyhow::bail!("{:?} already exists", config_path);
    }
    fs::write(&config_path, DEFAULT_CONFIG)?;
    tracing::debug!("Wrote {:?}", config_path);

    fs::write(target_dir.join(".gitignore"), "public/\n")?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SiteConfig;

    #[test]
    fn test_default_config_matches_defaults() {
        let parsed: SiteConfig = serde_yaml::from_str(DEFAULT_CONFIG).unwrap();
        let defaults = SiteConfig::default();
        assert_eq!(parsed.title, defaults.title);
        assert_eq!(parsed.cms.endpoint, defaults.cms.endpoint);
        assert_eq!(parsed.cms.document_type, defaults.cms.document_type);
        assert_eq!(parsed.listing.page_size, defaults.listing.page_size);
        assert_eq!(parsed.listing.revalidate, defaults.listing.revalidate);
        assert_eq!(parsed.post.loading_label, defaults.post.loading_label);
        assert_eq!(parsed.date_format, defaults.date_format);
    }

    #[test]
    fn test_init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("blog");
        init_site(&target).unwrap();
        assert!(target.join("_config.yml").is_file());
        assert!(init_site(&target).is_err());
    }
}
