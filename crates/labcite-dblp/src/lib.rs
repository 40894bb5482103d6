//! DBLP metadata adapter.
//!
//! Expands an `author_id` entry (a DBLP PID such as `"154/4313"`) into one
//! source record per publication by querying the DBLP XML API, with a
//! time-based response cache so repeated runs don't hammer dblp.org.

mod cache;
pub mod xml_parser;

use std::time::Duration;

use serde_json::{Map, Value};
use thiserror::Error;
use tracing::debug;

use labcite_core::adapter::{AdapterError, SourceAdapter};
use labcite_core::record::Source;

pub use cache::{DEFAULT_TTL, ResponseCache};
pub use xml_parser::{Publication, parse_publications};

/// Base URL of the DBLP author record API.
pub const DBLP_PID_URL: &str = "https://dblp.org/pid";

const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Error, Debug)]
pub enum DblpError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("DBLP returned HTTP {0}")]
    Status(reqwest::StatusCode),
    #[error("XML parse error: {0}")]
    Parse(String),
}

pub struct DblpAdapter {
    client: reqwest::blocking::Client,
    cache: Option<ResponseCache>,
}

impl DblpAdapter {
    pub fn new(cache: Option<ResponseCache>) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent(concat!("labcite/", env!("CARGO_PKG_VERSION")))
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self { client, cache }
    }

    /// Fetch an author's publication record XML, via the cache when fresh.
    fn fetch_author_xml(&self, pid: &str) -> Result<String, DblpError> {
        let url = format!("{DBLP_PID_URL}/{pid}.xml");

        if let Some(cache) = &self.cache
            && let Some(body) = cache.get(&url)
        {
            return Ok(body);
        }

        debug!(url = %url, "querying DBLP");
        let response = self.client.get(&url).send()?;
        if !response.status().is_success() {
            return Err(DblpError::Status(response.status()));
        }
        let body = response.text()?;

        if let Some(cache) = &self.cache {
            cache.put(&url, &body);
        }
        Ok(body)
    }
}

impl SourceAdapter for DblpAdapter {
    fn name(&self) -> &str {
        "dblp"
    }

    fn expand(&self, entry: &Map<String, Value>) -> Result<Vec<Source>, AdapterError> {
        let pid = entry
            .get("author_id")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|pid| !pid.is_empty())
            .ok_or(AdapterError::MissingKey("author_id"))?;

        let xml = self
            .fetch_author_xml(pid)
            .map_err(|e| AdapterError::Other(e.to_string()))?;

        build_sources(xml.as_bytes(), entry)
    }
}

/// Expand a fetched author XML document into source records, overlaying the
/// remaining entry fields onto each one (entry overrides, enabling per-author
/// field pinning). The `author_id` query key itself is dropped.
pub fn build_sources(xml: &[u8], entry: &Map<String, Value>) -> Result<Vec<Source>, AdapterError> {
    let mut overlay_entry = entry.clone();
    overlay_entry.remove("author_id");
    let overlay = Source::from_entry(&overlay_entry)?;

    let publications =
        parse_publications(xml).map_err(|e| AdapterError::Other(e.to_string()))?;

    let mut sources = Vec::new();
    for publication in publications {
        let mut source = source_from_publication(publication);
        source.merge_from(&overlay);
        // A source with neither id nor title can't be cited
        if source.identifier().is_some()
            || source.title.as_deref().is_some_and(|t| !t.is_empty())
        {
            sources.push(source);
        }
    }
    Ok(sources)
}

/// Map one DBLP publication to a source record. A publication with a DOI
/// becomes a bare `doi:` identifier for the resolution service; everything
/// else is described field by field.
fn source_from_publication(publication: Publication) -> Source {
    if let Some(doi) = publication.doi {
        return Source {
            id: Some(format!("doi:{doi}")),
            ..Default::default()
        };
    }

    Source {
        title: publication.title,
        authors: (!publication.authors.is_empty()).then_some(publication.authors),
        publisher: publication.venue,
        date: publication.year.map(|year| format!("{year}-01-01")),
        link: publication.url,
        ..Default::default()
    }
}
