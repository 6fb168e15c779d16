use regex::Regex;
use std::sync::OnceLock;

/// Optional http(s) scheme, optional `www.`, dotted labels ending in a
/// 2+-letter TLD, optional path.
const URL_PATTERN: &str = r"^(https?://)?(www\.)?[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}(/.*)?$";

static URL_RE: OnceLock<Regex> = OnceLock::new();

fn url_regex() -> &'static Regex {
    URL_RE.get_or_init(|| Regex::new(URL_PATTERN).expect("URL_PATTERN is a valid regex"))
}

/// Checks whether a string plausibly names an HTTP(S) resource
///
/// This is a purely syntactic check: no DNS lookup, no network access. It
/// gates the seed URL and filters links pulled from the homepage, so
/// `mailto:`, `javascript:`, explicit ports and bare IP addresses are all
/// rejected.
///
/// # Examples
///
/// ```
/// use site_harvest::url::is_valid_url;
///
/// assert!(is_valid_url("https://www.example.com/about"));
/// assert!(is_valid_url("example.com"));
/// assert!(!is_valid_url("mailto:someone@example.com"));
/// ```
pub fn is_valid_url(candidate: &str) -> bool {
    url_regex().is_match(candidate)
}

/// Gives a seed without a scheme an explicit `https://` prefix
///
/// Seeds such as `example.com` pass [`is_valid_url`] but cannot be fetched
/// or host-extracted until they carry a scheme.
pub fn normalize_seed(seed: &str) -> String {
    let seed = seed.trim();
    if seed.starts_with("http://") || seed.starts_with("https://") {
        seed.to_string()
    } else {
        format!("https://{}", seed)
    }
}
