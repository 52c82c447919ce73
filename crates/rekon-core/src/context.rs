//! Per-session reconciliation context.
//!
//! Built once from configuration and the taxonomy tables, then borrowed by
//! the import service and the audit reconciler.

use std::collections::HashMap;

use crate::config::ReconcileConfig;
use crate::normalize::PathNormalizer;
use crate::parser::MetadataParser;
use crate::paths::PathResolver;

/// Genre and decade display-name -> id maps
#[derive(Debug, Clone, Default)]
pub struct Taxonomy {
    genres: HashMap<String, i64>,
    decades: HashMap<String, i64>,
}

impl Taxonomy {
    /// Build the reverse maps from `(id, display name)` rows.
    ///
    /// Rows with a non-positive id or a blank name are ignored; names are
    /// trimmed and lowercased.
    pub fn from_rows<G, D>(genres: G, decades: D) -> Self
    where
        G: IntoIterator<Item = (i64, String)>,
        D: IntoIterator<Item = (i64, String)>,
    {
        Self {
            genres: reverse_map(genres),
            decades: reverse_map(decades),
        }
    }

    pub fn genre_id(&self, name: &str) -> Option<i64> {
        self.genres.get(&name.trim().to_lowercase()).copied()
    }

    pub fn decade_id(&self, name: &str) -> Option<i64> {
        self.decades.get(&name.trim().to_lowercase()).copied()
    }

    pub fn genre_count(&self) -> usize {
        self.genres.len()
    }

    pub fn decade_count(&self) -> usize {
        self.decades.len()
    }

    /// Resolve a raw genre string ("Rock, Pop") to the three genre slots.
    ///
    /// At most the first three names are considered. Matches fill the slots
    /// in order; with no match the first slot gets `unclassified_id`.
    pub fn resolve_genres(&self, raw: &str, unclassified_id: i64) -> [i64; 3] {
        let mut ids = [0; 3];
        let matched = raw
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .take(3)
            .filter_map(|name| self.genre_id(name));

        for (slot, id) in ids.iter_mut().zip(matched) {
            *slot = id;
        }
        if ids[0] == 0 {
            ids[0] = unclassified_id;
        }
        ids
    }

    /// Decade id for a year, 0 when unknown or before 1900
    pub fn resolve_decade(&self, year: i64) -> i64 {
        decade_label(year)
            .and_then(|label| self.decade_id(&label))
            .unwrap_or(0)
    }
}

/// Display label of the decade containing `year`, e.g. 1985 -> "1980's"
pub fn decade_label(year: i64) -> Option<String> {
    (year >= 1900).then(|| format!("{}'s", (year / 10) * 10))
}

fn reverse_map<I>(rows: I) -> HashMap<String, i64>
where
    I: IntoIterator<Item = (i64, String)>,
{
    rows.into_iter()
        .filter(|(id, name)| *id > 0 && !name.trim().is_empty())
        .map(|(id, name)| (name.trim().to_lowercase(), id))
        .collect()
}

/// Configuration and lookup tables shared by one reconciliation session
#[derive(Debug, Clone)]
pub struct ReconcileContext {
    pub config: ReconcileConfig,
    pub taxonomy: Taxonomy,
    pub resolver: PathResolver,
    pub parser: MetadataParser,
    pub normalizer: PathNormalizer,
}

impl ReconcileContext {
    pub fn new(config: ReconcileConfig, taxonomy: Taxonomy) -> Self {
        let resolver = PathResolver::new(&config.drive_map);
        let parser = MetadataParser::from_config(&config);
        let normalizer = PathNormalizer::new(config.audit.ignore_drive_letters);
        Self {
            config,
            taxonomy,
            resolver,
            parser,
            normalizer,
        }
    }

    pub fn unclassified_genre_id(&self) -> i64 {
        self.config.unclassified_genre_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn taxonomy() -> Taxonomy {
        Taxonomy::from_rows(
            vec![
                (1, "Rock".to_string()),
                (2, " Pop ".to_string()),
                (3, "Dance".to_string()),
                (0, "Ignored".to_string()),
                (9, "  ".to_string()),
            ],
            vec![(2, "1980's".to_string()), (3, "1990's".to_string())],
        )
    }

    #[test]
    fn test_from_rows_filters_and_lowercases() {
        let t = taxonomy();
        assert_eq!(t.genre_count(), 3);
        assert_eq!(t.genre_id("POP"), Some(2));
        assert_eq!(t.genre_id("ignored"), None);
        assert_eq!(t.decade_count(), 2);
    }

    #[test]
    fn test_resolve_genres() {
        let t = taxonomy();
        assert_eq!(t.resolve_genres("Rock, Pop, Dance", 18), [1, 2, 3]);
        assert_eq!(t.resolve_genres("", 18), [18, 0, 0]);
        assert_eq!(t.resolve_genres("Polka", 18), [18, 0, 0]);
        assert_eq!(t.resolve_genres(" dance ,rock", 18), [3, 1, 0]);
        assert_eq!(t.resolve_genres("Polka, Pop", 18), [2, 0, 0]);
        assert_eq!(t.resolve_genres("Rock, Pop, Polka, Dance", 18), [1, 2, 0]);
    }

    #[test]
    fn test_resolve_decade() {
        let t = taxonomy();
        assert_eq!(t.resolve_decade(1985), 2);
        assert_eq!(t.resolve_decade(1990), 3);
        assert_eq!(t.resolve_decade(0), 0);
        assert_eq!(t.resolve_decade(1875), 0);
        assert_eq!(t.resolve_decade(2005), 0);
    }

    #[test]
    fn test_decade_label() {
        assert_eq!(decade_label(1985).as_deref(), Some("1980's"));
        assert_eq!(decade_label(1900).as_deref(), Some("1900's"));
        assert_eq!(decade_label(1899), None);
    }

    #[test]
    fn test_context_wires_config() {
        let mut config = ReconcileConfig::default();
        config.drive_map.insert("b:".into(), "z:".into());
        config.fallback_artist = "Nobody".into();
        config.audit.ignore_drive_letters = true;

        let ctx = ReconcileContext::new(config, Taxonomy::default());
        assert_eq!(ctx.resolver.to_local("b:\\x.mp3"), "z:\\x.mp3");
        assert_eq!(ctx.parser.fallback_artist(), "Nobody");
        assert!(ctx.normalizer.ignore_drive_letters);
        assert_eq!(ctx.unclassified_genre_id(), 18);
    }
}
