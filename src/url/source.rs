//! Source table: which hosts are crawled and which of their paths are articles
//!
//! Every per-source decision (admissibility, extraction rules, sitemap
//! seeding) hangs off a `SourceProfile`, resolved once per URL through
//! `SourceRegistry::source_of`.

use crate::extract::ExtractorKind;
use crate::url::domain::extract_domain;
use crate::url::matcher::matches_domain;
use url::Url;

/// Source identifier recorded for URLs that belong to no known source
pub const UNKNOWN_SOURCE: &str = "unknown";

/// Path rule deciding whether a URL on a source's host is an article
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Admission {
    /// Path starts with `prefix` and, if set, does not contain `exclude`
    PathPrefix {
        prefix: String,
        exclude: Option<String>,
    },
    /// Path ends with one of the listed suffixes (e.g. ".html")
    Extension(Vec<String>),
}

impl Admission {
    pub fn path_prefix(prefix: &str) -> Self {
        Self::PathPrefix {
            prefix: prefix.to_string(),
            exclude: None,
        }
    }

    pub fn path_prefix_excluding(prefix: &str, exclude: &str) -> Self {
        Self::PathPrefix {
            prefix: prefix.to_string(),
            exclude: Some(exclude.to_string()),
        }
    }

    pub fn extensions(suffixes: &[&str]) -> Self {
        Self::Extension(suffixes.iter().map(|s| s.to_string()).collect())
    }

    /// Applies the rule to a URL path (compared lowercase)
    pub fn admits(&self, path: &str) -> bool {
        let path = path.to_lowercase();
        match self {
            Self::PathPrefix { prefix, exclude } => {
                path.starts_with(prefix.as_str())
                    && exclude.as_ref().map_or(true, |ex| !path.contains(ex.as_str()))
            }
            Self::Extension(suffixes) => suffixes.iter().any(|s| path.ends_with(s.as_str())),
        }
    }
}

/// Which child sitemaps of a sitemap index hold article URLs
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SitemapPlan {
    /// URL of the top-level sitemap index
    pub index_url: String,
    /// Every marker must appear in the child sitemap URL
    pub required: Vec<String>,
    /// At least one marker must appear (ignored when empty)
    pub any_of: Vec<String>,
}

impl SitemapPlan {
    pub fn new(index_url: &str, required: &[&str], any_of: &[&str]) -> Self {
        Self {
            index_url: index_url.to_string(),
            required: required.iter().map(|s| s.to_string()).collect(),
            any_of: any_of.iter().map(|s| s.to_string()).collect(),
        }
    }

    /// Naming predicate applied to child sitemap URLs
    pub fn accepts(&self, child_url: &str) -> bool {
        let child = child_url.to_lowercase();
        self.required.iter().all(|m| child.contains(m.as_str()))
            && (self.any_of.is_empty() || self.any_of.iter().any(|m| child.contains(m.as_str())))
    }
}

/// Everything the crawler knows about one content site
#[derive(Debug, Clone)]
pub struct SourceProfile {
    /// Source identifier stored with each document
    pub name: String,
    /// Registrable domain; subdomains belong to the same source
    pub domain: String,
    pub admission: Admission,
    pub extractor: ExtractorKind,
    pub sitemap: Option<SitemapPlan>,
}

impl SourceProfile {
    pub fn new(name: &str, domain: &str, admission: Admission, extractor: ExtractorKind) -> Self {
        Self {
            name: name.to_string(),
            domain: domain.to_lowercase(),
            admission,
            extractor,
            sitemap: None,
        }
    }

    pub fn with_sitemap(mut self, plan: SitemapPlan) -> Self {
        self.sitemap = Some(plan);
        self
    }

    pub fn matches_host(&self, host: &str) -> bool {
        matches_domain(&self.domain, host)
    }
}

/// The fixed table of crawlable sources
#[derive(Debug, Clone)]
pub struct SourceRegistry {
    profiles: Vec<SourceProfile>,
}

impl SourceRegistry {
    pub fn new(profiles: Vec<SourceProfile>) -> Self {
        Self { profiles }
    }

    /// The three parenting sites the harvester was built for
    pub fn builtin() -> Self {
        Self::new(vec![
            SourceProfile::new(
                "7ya.ru",
                "7ya.ru",
                Admission::path_prefix("/article/"),
                ExtractorKind::Semya,
            ),
            SourceProfile::new(
                "mama.ru",
                "mama.ru",
                Admission::path_prefix_excluding("/articles/", "/category/"),
                ExtractorKind::Mama,
            )
            .with_sitemap(SitemapPlan::new(
                "https://mama.ru/sitemap.xml",
                &["post-sitemap"],
                &[],
            )),
            SourceProfile::new(
                "letidor.ru",
                "letidor.ru",
                Admission::extensions(&[".htm", ".html"]),
                ExtractorKind::Letidor,
            )
            .with_sitemap(SitemapPlan::new(
                "https://letidor.ru/sitemap.xml",
                &["sitemap"],
                &["main", "article", "post"],
            )),
        ])
    }

    pub fn by_name(&self, name: &str) -> Option<&SourceProfile> {
        self.profiles.iter().find(|p| p.name == name)
    }

    /// Maps a URL's host (subdomains included) to its source profile
    pub fn source_of(&self, url: &Url) -> Option<&SourceProfile> {
        let host = extract_domain(url)?;
        self.profiles.iter().find(|p| p.matches_host(&host))
    }

    /// Source identifier for provenance tagging
    pub fn source_name(&self, url: &Url) -> &str {
        self.source_of(url)
            .map_or(UNKNOWN_SOURCE, |p| p.name.as_str())
    }

    /// Whether a URL is an article of a known source
    ///
    /// Hosts outside the table are never admissible, whatever their path.
    pub fn is_admissible(&self, url: &Url) -> bool {
        self.source_of(url)
            .map_or(false, |p| p.admission.admits(url.path()))
    }
}
