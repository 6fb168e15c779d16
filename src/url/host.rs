use crate::UrlError;
use url::{ParseError, Url};

/// Host value used when a URL carries no host component
pub const UNKNOWN_HOST: &str = "unknown_site";

/// File name used for resources whose URL path has no final segment
pub const DEFAULT_FILE_NAME: &str = "default.html";

/// Extracts the host identifier used for the output directory and site record
///
/// The host is lowercased and every `www.` is removed from it. A string that
/// parses only as a relative reference, or a URL without a host (such as
/// `mailto:`), yields [`UNKNOWN_HOST`]. Any other parse failure is an error.
///
/// # Examples
///
/// ```
/// use site_harvest::url::extract_host;
///
/// assert_eq!(extract_host("https://www.Example.com/a").unwrap(), "example.com");
/// assert_eq!(extract_host("just/a/path").unwrap(), "unknown_site");
/// ```
pub fn extract_host(url: &str) -> Result<String, UrlError> {
    let parsed = match Url::parse(url) {
        Ok(parsed) => parsed,
        Err(ParseError::RelativeUrlWithoutBase) => return Ok(UNKNOWN_HOST.to_string()),
        Err(source) => {
            return Err(UrlError::Parse {
                url: url.to_string(),
                source,
            })
        }
    };

    let Some(host) = parsed.host_str() else {
        return Ok(UNKNOWN_HOST.to_string());
    };

    let mut host = host.to_lowercase();
    // A single pass can splice a new "www." together ("wwwww..x" style hosts).
    while host.contains("www.") {
        host = host.replace("www.", "");
    }

    if host.is_empty() {
        return Ok(UNKNOWN_HOST.to_string());
    }

    Ok(host)
}

/// Derives the on-disk file name for a downloaded resource
///
/// Takes the part of the URL path after its last `/`. Resources whose path
/// has no final segment are saved as [`DEFAULT_FILE_NAME`]. Two resources
/// ending in the same segment map to the same file.
pub fn resource_file_name(url: &str) -> Result<String, UrlError> {
    let parsed = Url::parse(url).map_err(|source| UrlError::Parse {
        url: url.to_string(),
        source,
    })?;

    let path = parsed.path();
    let segment = path.rsplit('/').next().unwrap_or_default();

    if segment.is_empty() {
        Ok(DEFAULT_FILE_NAME.to_string())
    } else {
        Ok(segment.to_string())
    }
}
