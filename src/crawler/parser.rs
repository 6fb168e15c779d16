//! HTML parser for extracting links from a saved page
//!
//! Links are taken from `<a href>` elements only, resolved against the
//! document base, and kept when they pass the URL validator.

use crate::url::is_valid_url;
use crate::HarvestError;
use scraper::{Html, Selector};
use std::path::Path;
use url::Url;

/// Reads a saved HTML file and returns the absolute URLs its anchors point to
///
/// Relative hrefs are resolved against the document's `<base href>` when it
/// has one, otherwise against `page_url` (the URL the file was fetched
/// from). Results follow document order and keep duplicates.
///
/// # Errors
///
/// Returns `HarvestError::Io` if the file cannot be read.
pub fn extract_links(html_file: &Path, page_url: &Url) -> Result<Vec<String>, HarvestError> {
    let bytes = std::fs::read(html_file)?;
    let html = String::from_utf8_lossy(&bytes);
    parse_links(&html, page_url).map_err(|message| HarvestError::HtmlParse {
        path: html_file.to_path_buf(),
        message,
    })
}

/// Extracts validated absolute anchor URLs from HTML content
///
/// # Example
///
/// ```
/// use site_harvest::crawler::parse_links;
/// use url::Url;
///
/// let html = r#"<a href="/about">About</a><a href="mailto:x@example.com">Mail</a>"#;
/// let base = Url::parse("https://example.com/").unwrap();
/// let links = parse_links(html, &base).unwrap();
/// assert_eq!(links, vec!["https://example.com/about".to_string()]);
/// ```
pub fn parse_links(html: &str, page_url: &Url) -> Result<Vec<String>, String> {
    let document = Html::parse_document(html);
    let base = document_base(&document, page_url)?;

    let anchor_selector = Selector::parse("a[href]")
        .map_err(|e| format!("invalid selector: {:?}", e))?;

    let links = document
        .select(&anchor_selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, &base))
        .filter(|absolute| is_valid_url(absolute))
        .collect();

    Ok(links)
}

/// Returns the URL relative links resolve against
fn document_base(document: &Html, page_url: &Url) -> Result<Url, String> {
    let base_selector = Selector::parse("base[href]")
        .map_err(|e| format!("invalid selector: {:?}", e))?;

    let declared = document
        .select(&base_selector)
        .next()
        .and_then(|element| element.value().attr("href"))
        .and_then(|href| page_url.join(href.trim()).ok());

    Ok(declared.unwrap_or_else(|| page_url.clone()))
}

/// Resolves an href against the base; `None` if it cannot be resolved
fn resolve_link(href: &str, base: &Url) -> Option<String> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    base.join(href).ok().map(|absolute| absolute.to_string())
}
