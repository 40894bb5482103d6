//! doi.org citation resolution client.
//!
//! Resolves `doi:` and `arxiv:` identifiers to CSL-JSON citation metadata via
//! content negotiation against doi.org — the same mechanism reference
//! managers use. arXiv ids ride on their DataCite-registered DOIs
//! (`10.48550/arXiv.<id>`).

use std::time::Duration;

use serde_json::Value;
use tracing::debug;

use labcite_core::record::Source;
use labcite_core::resolve::{CitationResolver, ResolveError};

const DOI_ORG_URL: &str = "https://doi.org";
const CSL_JSON: &str = "application/vnd.citationstyles.csl+json";
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

pub struct DoiResolver {
    client: reqwest::blocking::Client,
}

impl DoiResolver {
    /// A `mailto` contact is appended to the User-Agent when given, per the
    /// politeness conventions of the DOI registration agencies.
    pub fn new(mailto: Option<&str>) -> Self {
        let user_agent = match mailto {
            Some(mailto) => format!(
                "labcite/{} (mailto:{mailto})",
                env!("CARGO_PKG_VERSION")
            ),
            None => concat!("labcite/", env!("CARGO_PKG_VERSION")).to_string(),
        };
        let client = reqwest::blocking::Client::builder()
            .user_agent(user_agent)
            .timeout(HTTP_TIMEOUT)
            .build()
            .unwrap_or_else(|_| reqwest::blocking::Client::new());
        Self { client }
    }
}

impl CitationResolver for DoiResolver {
    fn resolve(&self, id: &str) -> Result<Source, ResolveError> {
        let doi = doi_for_identifier(id)?;
        let url = format!("{DOI_ORG_URL}/{doi}");

        debug!(id, doi = %doi, "resolving citation");
        let response = self
            .client
            .get(&url)
            .header("Accept", CSL_JSON)
            .send()
            .map_err(|e| ResolveError::Service(e.to_string()))?;

        if response.status().as_u16() == 404 {
            return Err(ResolveError::NotFound(id.to_string()));
        }
        if !response.status().is_success() {
            return Err(ResolveError::Service(format!(
                "doi.org returned HTTP {}",
                response.status()
            )));
        }

        let data: Value = response
            .json()
            .map_err(|e| ResolveError::Service(format!("invalid CSL-JSON: {e}")))?;
        Ok(source_from_csl(&data, &doi))
    }
}

/// Map a source identifier to the DOI to ask doi.org about.
fn doi_for_identifier(id: &str) -> Result<String, ResolveError> {
    if let Some(doi) = id.strip_prefix("doi:") {
        Ok(doi.to_string())
    } else if let Some(arxiv_id) = id.strip_prefix("arxiv:") {
        Ok(format!("10.48550/arXiv.{arxiv_id}"))
    } else if id.starts_with("10.") {
        Ok(id.to_string())
    } else {
        Err(ResolveError::UnsupportedScheme(id.to_string()))
    }
}

/// Map a CSL-JSON item to citation source fields.
pub fn source_from_csl(data: &Value, doi: &str) -> Source {
    let title = csl_string(&data["title"]);

    let authors: Vec<String> = data["author"]
        .as_array()
        .map(|authors| {
            authors
                .iter()
                .filter_map(|author| {
                    if let Some(family) = author["family"].as_str() {
                        let given = author["given"].as_str().unwrap_or("");
                        Some(format!("{given} {family}").trim().to_string())
                    } else {
                        author["literal"].as_str().map(String::from)
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    let date = data["issued"]["date-parts"][0].as_array().and_then(|parts| {
        let numbers: Vec<i64> = parts.iter().filter_map(Value::as_i64).collect();
        match numbers.as_slice() {
            [] => None,
            [year] => Some(format!("{year}")),
            [year, month] => Some(format!("{year}-{month:02}")),
            [year, month, day, ..] => Some(format!("{year}-{month:02}-{day:02}")),
        }
    });

    let publisher = csl_string(&data["container-title"])
        .filter(|venue| !venue.is_empty())
        .or_else(|| data["publisher"].as_str().map(String::from));

    let link = data["URL"]
        .as_str()
        .map(String::from)
        .unwrap_or_else(|| format!("{DOI_ORG_URL}/{doi}"));

    Source {
        title,
        authors: (!authors.is_empty()).then_some(authors),
        date,
        publisher,
        link: Some(link),
        ..Default::default()
    }
}

/// CSL fields that are nominally strings sometimes arrive as one-element
/// arrays; accept both.
fn csl_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Array(items) => items.first().and_then(Value::as_str).map(String::from),
        _ => None,
    }
}
