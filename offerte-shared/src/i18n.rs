use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

pub const FALLBACK_LANGUAGE: &str = "de";

/// Text keyed by language code, e.g. `{"de": "Reinigung", "en": "Cleaning"}`.
/// A bare string is accepted on input and stored under the fallback language.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct LocalizedText(pub BTreeMap<String, String>);

#[derive(Deserialize)]
#[serde(untagged)]
enum LocalizedRepr {
    Map(BTreeMap<String, String>),
    Plain(String),
}

impl<'de> Deserialize<'de> for LocalizedText {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match LocalizedRepr::deserialize(deserializer)? {
            LocalizedRepr::Map(map) => Self(map),
            LocalizedRepr::Plain(text) => Self::new().with(FALLBACK_LANGUAGE, &text),
        })
    }
}

impl LocalizedText {
    pub fn new() -> Self {
        Self(BTreeMap::new())
    }

    pub fn with(mut self, language: &str, text: &str) -> Self {
        self.0.insert(language.to_string(), text.to_string());
        self
    }

    /// Requested language, then German, then whatever entry exists.
    pub fn get(&self, language: &str) -> &str {
        self.0
            .get(language)
            .or_else(|| self.0.get(FALLBACK_LANGUAGE))
            .or_else(|| self.0.values().next())
            .map(String::as_str)
            .unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
