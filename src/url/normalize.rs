use crate::UrlError;
use url::Url;

/// Normalizes a URL into the canonical form used as the dedup and storage key
///
/// # Normalization Steps
///
/// 1. Resolve `url_str` against `base` when one is given, otherwise parse it
/// 2. Reject anything but HTTP(S) and URLs without a host
/// 3. Lowercase scheme and host (the `url` crate does this for web schemes)
/// 4. Empty path becomes `/`
/// 5. Drop `;params` on the last path segment, the query and the fragment
///
/// Normalizing an already-normalized URL returns it unchanged.
///
/// # Examples
///
/// ```
/// use article_harvester::url::normalize;
///
/// let url = normalize("HTTPS://Mama.RU/articles/x?utm=1#top", None).unwrap();
/// assert_eq!(url.as_str(), "https://mama.ru/articles/x");
/// ```
pub fn normalize(url_str: &str, base: Option<&Url>) -> Result<Url, UrlError> {
    let url_str = url_str.trim();
    let parsed = match base {
        Some(base) => base.join(url_str),
        None => Url::parse(url_str),
    };
    let url = parsed.map_err(|e| UrlError::Parse(format!("{}: {}", url_str, e)))?;

    normalize_parsed(url)
}

/// Normalizes an already parsed URL
pub fn normalize_parsed(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingDomain);
    }

    let path = strip_params(url.path());
    let path = if path.is_empty() { "/" } else { path };
    let path = path.to_string();
    url.set_path(&path);

    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Removes `;params` from the last path segment
fn strip_params(path: &str) -> &str {
    let last_segment_start = path.rfind('/').map_or(0, |i| i + 1);
    match path[last_segment_start..].find(';') {
        Some(offset) => &path[..last_segment_start + offset],
        None => path,
    }
}
