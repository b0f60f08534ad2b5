//! Static city → informational URL lookup.
//!
//! The built-in table covers the sample cities; `[links]` entries from the
//! config are merged over it at startup. The merged table is immutable for
//! the life of the process.

use std::collections::HashMap;
use std::sync::LazyLock;

static BUILTIN_LINKS: LazyLock<HashMap<&'static str, &'static str>> = LazyLock::new(|| {
    HashMap::from([
        ("Dallas", "https://en.wikipedia.org/wiki/Dallas"),
        ("Plano", "https://en.wikipedia.org/wiki/Plano,_Texas"),
        ("Arlington", "https://en.wikipedia.org/wiki/Arlington,_Texas"),
        ("Frisco", "https://en.wikipedia.org/wiki/Frisco,_Texas"),
        ("Denton", "https://en.wikipedia.org/wiki/Denton,_Texas"),
        ("Richardson", "https://en.wikipedia.org/wiki/Richardson,_Texas"),
        ("Irving", "https://en.wikipedia.org/wiki/Irving,_Texas"),
    ])
});

/// Immutable name → URL table built once at startup.
#[derive(Debug, Clone)]
pub struct LinkTable {
    entries: HashMap<String, String>,
}

impl LinkTable {
    /// Built-in entries plus config overrides, config winning on conflict.
    pub fn build(config_links: &HashMap<String, String>) -> Self {
        let mut entries: HashMap<String, String> = BUILTIN_LINKS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        for (name, url) in config_links {
            entries.insert(name.clone(), url.clone());
        }
        LinkTable { entries }
    }

    pub fn resolve(&self, city: &str) -> Option<&str> {
        self.entries.get(city).map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_builtin_city() {
        let table = LinkTable::build(&HashMap::new());
        assert_eq!(
            table.resolve("Dallas"),
            Some("https://en.wikipedia.org/wiki/Dallas")
        );
        assert_eq!(table.resolve("Springfield"), None);
    }

    #[test]
    fn config_entries_override_builtins() {
        let mut extra = HashMap::new();
        extra.insert("Dallas".to_string(), "https://example.com/dallas".to_string());
        extra.insert("Springfield".to_string(), "https://example.com/sf".to_string());
        let table = LinkTable::build(&extra);
        assert_eq!(table.resolve("Dallas"), Some("https://example.com/dallas"));
        assert_eq!(table.resolve("Springfield"), Some("https://example.com/sf"));
        // untouched builtins survive the merge
        assert!(table.resolve("Plano").is_some());
    }
}
