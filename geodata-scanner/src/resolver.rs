use crate::client::{DEFAULT_DISCOVERY_TIMEOUT_SECS, browser_client};
use crate::error::{Result, ScanError};
use crate::result::ResolvedLink;
use crate::source::SourceDefinition;
use reqwest::Client;
use scraper::{Html, Selector};
use tracing::{debug, error, info};
use url::Url;

const ARCHIVE_EXTENSIONS: [&str; 2] = [".zip", ".rar"];

/// Scrapes source pages and picks out the configured archive links.
pub struct LinkResolver {
    client: Client,
    sources: Vec<SourceDefinition>,
}

/// An `<a href>` as seen on a source page.
struct Anchor {
    href: String,
    text: String,
    resolved: Url,
}

impl LinkResolver {
    pub fn new(sources: Vec<SourceDefinition>) -> Result<Self> {
        Self::with_timeout(sources, DEFAULT_DISCOVERY_TIMEOUT_SECS)
    }

    pub fn with_timeout(sources: Vec<SourceDefinition>, timeout_secs: u64) -> Result<Self> {
        Ok(Self {
            client: browser_client(timeout_secs)?,
            sources,
        })
    }

    /// Resolve every source in order. A source that cannot be fetched is
    /// logged and contributes no links; it never stops the others.
    pub async fn resolve_links(&self) -> Vec<ResolvedLink> {
        info!("Scanning {} source page(s)", self.sources.len());

        let mut links = Vec::new();
        for source in &self.sources {
            match self.resolve_source(source).await {
                Ok(found) => {
                    info!(
                        "{}: {}/{} target(s) matched",
                        source.name,
                        found.len(),
                        source.targets.len()
                    );
                    links.extend(found);
                }
                Err(e) => {
                    error!("Failed to scan {}: {}", source.page_url, e);
                }
            }
        }

        info!("Discovery complete. {} link(s) resolved", links.len());
        links
    }

    /// Fetch one source page and match its targets.
    pub async fn resolve_source(&self, source: &SourceDefinition) -> Result<Vec<ResolvedLink>> {
        debug!("Fetching {}", source.page_url);

        let response = self.client.get(&source.page_url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ScanError::Status {
                url: source.page_url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.text().await?;
        extract_links(&body, &source.page_url, source)
    }
}

/// Match a source's targets against the anchors of an HTML document.
///
/// A target matches an anchor when its term appears (case-insensitively) in
/// the href or in the anchor text, and the link points at a `.zip` or `.rar`
/// file. Anchors are scanned in document order and the first match wins.
/// Terms without a match are skipped.
pub fn extract_links(
    html: &str,
    page_url: &str,
    source: &SourceDefinition,
) -> Result<Vec<ResolvedLink>> {
    let base = Url::parse(page_url)
        .map_err(|e| ScanError::InvalidUrl(format!("{}: {}", page_url, e)))?;
    let anchors = collect_anchors(html, &base)?;

    let mut links = Vec::new();
    for target in &source.targets {
        // Fold to upper case: "ß" and "SS" compare equal that way, not when lowered
        let term = target.term.to_uppercase();
        let found = anchors.iter().find(|anchor| {
            let mentioned = anchor.href.to_uppercase().contains(&term)
                || anchor.text.to_uppercase().contains(&term);
            mentioned && is_archive_url(&anchor.resolved)
        });

        match found {
            Some(anchor) => {
                debug!("{} -> {}", target.term, anchor.resolved);
                links.push(ResolvedLink::new(
                    anchor.resolved.as_str(),
                    &target.filename,
                    &source.name,
                ));
            }
            None => debug!("No archive link for '{}' on {}", target.term, page_url),
        }
    }

    Ok(links)
}

/// True when the URL path ends in a supported archive extension.
pub fn is_archive_url(url: &Url) -> bool {
    let path = url.path().to_ascii_lowercase();
    ARCHIVE_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

fn collect_anchors(html: &str, base: &Url) -> Result<Vec<Anchor>> {
    let document = Html::parse_document(html);
    let selector =
        Selector::parse("a[href]").map_err(|e| ScanError::ParseError(e.to_string()))?;

    let anchors = document
        .select(&selector)
        .filter_map(|element| {
            let href = element.value().attr("href")?.trim();
            let resolved = resolve_url(base, href)?;
            Some(Anchor {
                href: href.to_string(),
                text: element.text().collect::<String>().trim().to_string(),
                resolved,
            })
        })
        .collect();

    Ok(anchors)
}

fn resolve_url(base: &Url, href: &str) -> Option<Url> {
    // Skip empty, javascript:, mailto:, tel:, etc.
    if href.is_empty()
        || href.starts_with("javascript:")
        || href.starts_with("mailto:")
        || href.starts_with("tel:")
        || href.starts_with('#')
    {
        return None;
    }

    let mut url = base.join(href).ok()?;
    url.set_fragment(None);
    Some(url)
}
