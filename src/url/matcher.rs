/// Checks if a host belongs to a source domain
///
/// A host matches when it equals the domain or is any subdomain of it:
/// "mama.ru" matches "mama.ru", "www.mama.ru" and "m.www.mama.ru".
/// Both arguments are expected to be lowercase.
///
/// # Examples
///
/// ```
/// use article_harvester::url::matches_domain;
///
/// assert!(matches_domain("7ya.ru", "7ya.ru"));
/// assert!(matches_domain("7ya.ru", "club.7ya.ru"));
/// assert!(!matches_domain("7ya.ru", "not7ya.ru"));
/// ```
pub fn matches_domain(domain: &str, host: &str) -> bool {
    if domain.is_empty() {
        return false;
    }
    host == domain || host.ends_with(&format!(".{}", domain))
}
