//! Ingestion filter for fetched entries.
//!
//! Entries are dropped before storage when their link points into an
//! excluded domain (or one of its subdomains), or when their title or
//! summary matches one of the configured exclude patterns.
//!
//! # Example
//!
//! ```
//! use knowledge_manager::config::FilterConfig;
//! use knowledge_manager::entry::{Entry, SourceKind};
//! use knowledge_manager::filter::{EntryFilter, FilterResult};
//!
//! let filter = EntryFilter::new(&FilterConfig {
//!     excluded_domains: vec!["medium.com".to_string()],
//!     ..FilterConfig::default()
//! });
//!
//! let entry = Entry::new(SourceKind::Rss, "feed", "Post", "https://blog.medium.com/x");
//! assert!(matches!(filter.check(&entry), FilterResult::Blocked { .. }));
//! ```

use regex::Regex;
use tracing::{debug, warn};

use crate::config::FilterConfig;
use crate::entry::Entry;

/// Result of filtering an entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilterResult {
    /// The entry may be stored.
    Passed,

    /// The entry was dropped.
    Blocked {
        /// Why the entry was dropped.
        reason: String,
    },
}

impl FilterResult {
    /// Whether the entry passed.
    #[must_use]
    pub fn is_passed(&self) -> bool {
        matches!(self, Self::Passed)
    }
}

/// Filter applied to entries before storage.
#[derive(Debug)]
pub struct EntryFilter {
    enabled: bool,
    excluded_domains: Vec<String>,
    patterns: Vec<Regex>,
}

impl Default for EntryFilter {
    fn default() -> Self {
        Self::new(&FilterConfig::default())
    }
}

impl EntryFilter {
    /// Build a filter from configuration.
    ///
    /// Invalid patterns are logged and ignored; [`crate::config::Config::validate`]
    /// rejects them earlier for loaded configurations.
    #[must_use]
    pub fn new(config: &FilterConfig) -> Self {
        let patterns = config
            .exclude_patterns
            .iter()
            .filter_map(|p| match Regex::new(p) {
                Ok(r) => Some(r),
                Err(e) => {
                    warn!(pattern = %p, error = %e, "Invalid exclude pattern");
                    None
                }
            })
            .collect();

        let excluded_domains = config
            .excluded_domains
            .iter()
            .map(|d| d.trim().trim_start_matches('.').to_ascii_lowercase())
            .filter(|d| !d.is_empty())
            .collect();

        Self {
            enabled: config.enabled,
            excluded_domains,
            patterns,
        }
    }

    /// Check if filtering is enabled.
    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Check if `host` is an excluded domain or a subdomain of one.
    #[must_use]
    pub fn is_domain_excluded(&self, host: &str) -> bool {
        let host = host.to_ascii_lowercase();
        self.excluded_domains.iter().any(|domain| {
            host == *domain
                || host
                    .strip_suffix(domain.as_str())
                    .is_some_and(|prefix| prefix.ends_with('.'))
        })
    }

    /// Decide whether `entry` may be stored.
    #[must_use]
    pub fn check(&self, entry: &Entry) -> FilterResult {
        if !self.enabled {
            return FilterResult::Passed;
        }

        if let Some(host) = entry.host() {
            if self.is_domain_excluded(&host) {
                debug!(link = %entry.link, "Entry blocked by excluded domain");
                return FilterResult::Blocked {
                    reason: format!("excluded domain: {host}"),
                };
            }
        }

        for pattern in &self.patterns {
            if pattern.is_match(&entry.title) || pattern.is_match(&entry.summary) {
                debug!(link = %entry.link, pattern = %pattern, "Entry blocked by pattern");
                return FilterResult::Blocked {
                    reason: format!("matched pattern: {pattern}"),
                };
            }
        }

        FilterResult::Passed
    }

    /// Split `entries` into passed entries and the number blocked.
    #[must_use]
    pub fn apply(&self, entries: Vec<Entry>) -> (Vec<Entry>, usize) {
        let total = entries.len();
        let passed: Vec<Entry> = entries
            .into_iter()
            .filter(|e| self.check(e).is_passed())
            .collect();
        let blocked = total - passed.len();
        (passed, blocked)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::SourceKind;

    fn entry(title: &str, summary: &str, link: &str) -> Entry {
        Entry::new(SourceKind::Rss, "feed", title, link).with_summary(summary)
    }

    fn filter(patterns: &[&str], domains: &[&str]) -> EntryFilter {
        EntryFilter::new(&FilterConfig {
            enabled: true,
            exclude_patterns: patterns.iter().map(ToString::to_string).collect(),
            excluded_domains: domains.iter().map(ToString::to_string).collect(),
        })
    }

    #[test]
    fn test_default_passes_everything() {
        let filter = EntryFilter::default();
        assert!(filter.is_enabled());
        assert_eq!(
            filter.check(&entry("Any", "thing", "https://example.com")),
            FilterResult::Passed
        );
    }

    #[test]
    fn test_excluded_domain_and_subdomains() {
        let filter = filter(&[], &["Medium.com", ".spam.io"]);
        assert!(filter.is_domain_excluded("medium.com"));
        assert!(filter.is_domain_excluded("blog.medium.com"));
        assert!(filter.is_domain_excluded("x.SPAM.io"));
        assert!(!filter.is_domain_excluded("notmedium.com"));
        assert!(!filter.is_domain_excluded("medium.com.evil.org"));

        let result = filter.check(&entry("t", "s", "https://blog.medium.com/post"));
        assert_eq!(
            result,
            FilterResult::Blocked {
                reason: "excluded domain: blog.medium.com".to_string()
            }
        );
    }

    #[test]
    fn test_pattern_matches_title_or_summary() {
        let filter = filter(&["(?i)sponsored", r"\bwebinar\b"], &[]);
        assert!(!filter
            .check(&entry("SPONSORED: buy now", "", "https://a.com"))
            .is_passed());
        assert!(!filter
            .check(&entry("Post", "Join our webinar today", "https://a.com"))
            .is_passed());
        assert!(filter
            .check(&entry("Webinars recap", "notes", "https://a.com"))
            .is_passed());
    }

    #[test]
    fn test_disabled_filter_passes() {
        let filter = EntryFilter::new(&FilterConfig {
            enabled: false,
            exclude_patterns: vec![".*".to_string()],
            excluded_domains: vec!["a.com".to_string()],
        });
        assert!(filter.check(&entry("x", "y", "https://a.com")).is_passed());
    }

    #[test]
    fn test_invalid_pattern_ignored() {
        let filter = filter(&["[unclosed", "ok"], &[]);
        assert!(!filter.check(&entry("ok", "", "https://a.com")).is_passed());
        assert!(filter.check(&entry("fine", "", "https://a.com")).is_passed());
    }

    #[test]
    fn test_apply_counts_blocked() {
        let filter = filter(&["ad"], &["b.com"]);
        let (passed, blocked) = filter.apply(vec![
            entry("keep", "", "https://a.com/1"),
            entry("ad", "", "https://a.com/2"),
            entry("keep", "", "https://b.com/3"),
        ]);
        assert_eq!(passed.len(), 1);
        assert_eq!(blocked, 2);
    }

    #[test]
    fn test_unparsable_link_checked_by_patterns_only() {
        let filter = filter(&[], &["a.com"]);
        assert!(filter.check(&entry("t", "", "not a url")).is_passed());
    }
}
