use serde::Deserialize;

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AdSettings {
    /// Global kill switch for in-content ads.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Ad slot rendered right after the table of contents.
    #[serde(default)]
    pub toc_slot: Option<String>,

    /// Ad slot rendered before a heading near the middle of the article.
    #[serde(default)]
    pub middle_slot: Option<String>,
}

impl Default for AdSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            toc_slot: None,
            middle_slot: None,
        }
    }
}

impl AdSettings {
    pub fn with_toc_slot(mut self, slot: impl Into<String>) -> Self {
        self.toc_slot = Some(slot.into());
        self
    }

    pub fn with_middle_slot(mut self, slot: impl Into<String>) -> Self {
        self.middle_slot = Some(slot.into());
        self
    }

    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    // Blank slot ids count as "not configured".
    pub fn toc_slot(&self) -> Option<&str> {
        self.toc_slot.as_deref().filter(|s| !s.trim().is_empty())
    }

    pub fn middle_slot(&self) -> Option<&str> {
        self.middle_slot.as_deref().filter(|s| !s.trim().is_empty())
    }
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct RenderSettings {
    /// Render visible diagnostics for unknown or failing blocks.
    #[serde(default)]
    pub diagnostics: bool,

    #[serde(default)]
    pub ads: AdSettings,
}

impl RenderSettings {
    pub fn from_toml(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    pub fn with_diagnostics(mut self, on: bool) -> Self {
        self.diagnostics = on;
        self
    }

    pub fn with_ads(mut self, ads: AdSettings) -> Self {
        self.ads = ads;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_gives_defaults() {
        let s = RenderSettings::from_toml("").unwrap();
        assert!(!s.diagnostics);
        assert!(s.ads.enabled);
        assert_eq!(s.ads.toc_slot(), None);
        assert_eq!(s.ads.middle_slot(), None);
    }

    #[test]
    fn full_toml() {
        let s = RenderSettings::from_toml(
            r#"
diagnostics = true

[ads]
enabled = false
toc_slot = "AD1"
middle_slot = "AD2"
"#,
        )
        .unwrap();
        assert!(s.diagnostics);
        assert!(!s.ads.enabled);
        assert_eq!(s.ads.toc_slot(), Some("AD1"));
        assert_eq!(s.ads.middle_slot(), Some("AD2"));
    }

    #[test]
    fn blank_slot_is_unset() {
        let ads = AdSettings::default().with_toc_slot("  ");
        assert_eq!(ads.toc_slot(), None);
    }

    #[test]
    fn unknown_type_is_rejected() {
        assert!(RenderSettings::from_toml("diagnostics = \"yes\"").is_err());
    }
}
