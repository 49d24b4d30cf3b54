use url::Url;

/// Extracts the domain from a URL
///
/// Returns the lowercase host without a trailing dot, or `None` when the URL
/// has no host.
///
/// # Examples
///
/// ```
/// use url::Url;
/// use article_harvester::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
///
/// let url = Url::parse("https://sub.example.com./path").unwrap();
/// assert_eq!(extract_domain(&url), Some("sub.example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str()
        .map(|h| h.trim_end_matches('.').to_lowercase())
        .filter(|h| !h.is_empty())
}

/// Returns the `scheme://host[:port]` base robots.txt is fetched from
pub fn domain_base(url: &Url) -> Option<String> {
    let host = url.host_str()?;
    match url.port() {
        Some(port) => Some(format!("{}://{}:{}", url.scheme(), host, port)),
        None => Some(format!("{}://{}", url.scheme(), host)),
    }
}

/// Checks whether two URLs point at the same host and port
pub fn same_host(a: &Url, b: &Url) -> bool {
    extract_domain(a) == extract_domain(b) && a.port_or_known_default() == b.port_or_known_default()
}
