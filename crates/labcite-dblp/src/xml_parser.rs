//! SAX-style parser for DBLP author publication XML
//! (`https://dblp.org/pid/{pid}.xml`).
//!
//! The author record wraps each publication in an `<r>` element; publication
//! elements contain `<title>`, `<author>`, `<year>`, `<journal>`/`<booktitle>`,
//! and `<ee>` (electronic edition URL) children. Title elements may contain
//! inline formatting sub-elements (`<i>`, `<sub>`, `<sup>`, `<tt>`) whose text
//! content is accumulated.

use std::io::BufRead;

use once_cell::sync::Lazy;
use quick_xml::Reader;
use quick_xml::events::Event;
use regex::Regex;

use crate::DblpError;

/// One publication from an author's DBLP record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Publication {
    pub title: Option<String>,
    pub year: Option<String>,
    pub authors: Vec<String>,
    /// Journal or booktitle, journal preferred.
    pub venue: Option<String>,
    /// DOI extracted from the first `ee` URL pointing at doi.org.
    pub doi: Option<String>,
    /// First `ee` URL.
    pub url: Option<String>,
}

/// DBLP XML element types that represent publications. Homepage (`www`)
/// records are not publications and are skipped.
const PUB_ELEMENTS: &[&[u8]] = &[
    b"article",
    b"inproceedings",
    b"proceedings",
    b"book",
    b"incollection",
    b"phdthesis",
    b"mastersthesis",
];

fn is_pub_element(name: &[u8]) -> bool {
    PUB_ELEMENTS.iter().any(|&e| e == name)
}

static DOI_URL_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"doi\.org/(.+)$").unwrap());

/// Which field we're currently reading text for.
enum Field {
    Title,
    Author,
    Year,
    Journal,
    Booktitle,
    Ee,
}

impl Field {
    fn element_name(&self) -> &[u8] {
        match self {
            Field::Title => b"title",
            Field::Author => b"author",
            Field::Year => b"year",
            Field::Journal => b"journal",
            Field::Booktitle => b"booktitle",
            Field::Ee => b"ee",
        }
    }
}

/// Parse an author publication XML document into publications.
pub fn parse_publications<R: BufRead>(reader: R) -> Result<Vec<Publication>, DblpError> {
    let mut xml = Reader::from_reader(reader);
    xml.config_mut().trim_text(false);

    let mut buf = Vec::with_capacity(4096);
    let mut publications = Vec::new();

    // State
    let mut in_pub = false;
    let mut title = String::new();
    let mut year = String::new();
    let mut authors: Vec<String> = Vec::new();
    let mut journal = String::new();
    let mut booktitle = String::new();
    let mut ees: Vec<String> = Vec::new();
    let mut reading: Option<Field> = None;
    let mut text_buf = String::new();

    loop {
        match xml.read_event_into(&mut buf) {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                let name_ref = name.as_ref();

                if !in_pub && is_pub_element(name_ref) {
                    in_pub = true;
                    title.clear();
                    year.clear();
                    authors.clear();
                    journal.clear();
                    booktitle.clear();
                    ees.clear();
                    reading = None;
                } else if in_pub && reading.is_none() {
                    match name_ref {
                        b"title" => {
                            reading = Some(Field::Title);
                            text_buf.clear();
                        }
                        b"author" => {
                            reading = Some(Field::Author);
                            text_buf.clear();
                        }
                        b"year" => {
                            reading = Some(Field::Year);
                            text_buf.clear();
                        }
                        b"journal" => {
                            reading = Some(Field::Journal);
                            text_buf.clear();
                        }
                        b"booktitle" => {
                            reading = Some(Field::Booktitle);
                            text_buf.clear();
                        }
                        b"ee" => {
                            reading = Some(Field::Ee);
                            text_buf.clear();
                        }
                        _ => {}
                    }
                }
                // Sub-elements (e.g. <i> inside <title>): continue accumulating
            }

            Ok(Event::Text(ref e)) => {
                if reading.is_some() {
                    if let Ok(text) = e.unescape() {
                        text_buf.push_str(&text);
                    }
                }
            }

            Ok(Event::CData(ref e)) => {
                if reading.is_some() {
                    let text = String::from_utf8_lossy(e.as_ref());
                    text_buf.push_str(&text);
                }
            }

            Ok(Event::End(ref e)) => {
                let name = e.name();
                let name_ref = name.as_ref();

                if let Some(ref field) = reading {
                    if name_ref == field.element_name() {
                        match field {
                            Field::Title => title = text_buf.clone(),
                            Field::Author => {
                                let author = text_buf.trim().to_string();
                                if !author.is_empty() {
                                    authors.push(author);
                                }
                            }
                            Field::Year => year = text_buf.trim().to_string(),
                            Field::Journal => journal = text_buf.trim().to_string(),
                            Field::Booktitle => booktitle = text_buf.trim().to_string(),
                            Field::Ee => {
                                let ee = text_buf.trim().to_string();
                                if !ee.is_empty() {
                                    ees.push(ee);
                                }
                            }
                        }
                        reading = None;
                    }
                    // End of a formatting sub-element: keep accumulating
                } else if in_pub && is_pub_element(name_ref) {
                    publications.push(finish_publication(
                        &title, &year, &authors, &journal, &booktitle, &ees,
                    ));
                    in_pub = false;
                }
            }

            Ok(Event::Eof) => break,
            Ok(_) => {}
            Err(e) => return Err(DblpError::Parse(e.to_string())),
        }
        buf.clear();
    }

    Ok(publications)
}

fn finish_publication(
    title: &str,
    year: &str,
    authors: &[String],
    journal: &str,
    booktitle: &str,
    ees: &[String],
) -> Publication {
    // DBLP titles end with a period
    let title = title.trim().trim_end_matches('.').to_string();

    let venue = if !journal.is_empty() {
        Some(journal.to_string())
    } else if !booktitle.is_empty() {
        Some(booktitle.to_string())
    } else {
        None
    };

    let doi = ees
        .iter()
        .find(|ee| ee.contains("doi.org"))
        .and_then(|ee| DOI_URL_RE.captures(ee))
        .map(|caps| caps[1].to_string());

    Publication {
        title: (!title.is_empty()).then_some(title),
        year: (!year.is_empty()).then(|| year.to_string()),
        authors: authors.to_vec(),
        venue,
        doi,
        url: ees.first().cloned(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const FIXTURE: &str = r#"<?xml version="1.0"?>
<dblpperson name="Jane Doe" pid="154/4313">
  <r>
    <article key="journals/x/Doe23" mdate="2023-06-01">
      <author pid="154/4313">Jane Doe</author>
      <author pid="99/1234">John Roe</author>
      <title>Streaming Graph Partitioning at Scale.</title>
      <journal>ACM Trans. Database Syst.</journal>
      <year>2023</year>
      <ee>https://doi.org/10.1145/3579990</ee>
      <ee>https://example.org/mirror</ee>
    </article>
  </r>
  <r>
    <inproceedings key="conf/y/Doe21">
      <author pid="154/4313">Jane Doe</author>
      <title>Learning <i>k</i>-way Cuts.</title>
      <booktitle>NeurIPS</booktitle>
      <year>2021</year>
      <ee>https://proceedings.example.org/doe21.pdf</ee>
    </inproceedings>
  </r>
  <r>
    <www key="homepages/154/4313">
      <author>Jane Doe</author>
      <title>Home Page</title>
    </www>
  </r>
</dblpperson>
"#;

    #[test]
    fn parses_publications_and_skips_homepage_records() {
        let publications = parse_publications(FIXTURE.as_bytes()).unwrap();
        assert_eq!(publications.len(), 2);
    }

    #[test]
    fn extracts_doi_from_ee_and_strips_trailing_period() {
        let publications = parse_publications(FIXTURE.as_bytes()).unwrap();
        let article = &publications[0];

        assert_eq!(
            article.title.as_deref(),
            Some("Streaming Graph Partitioning at Scale")
        );
        assert_eq!(article.doi.as_deref(), Some("10.1145/3579990"));
        assert_eq!(article.url.as_deref(), Some("https://doi.org/10.1145/3579990"));
        assert_eq!(article.venue.as_deref(), Some("ACM Trans. Database Syst."));
        assert_eq!(article.year.as_deref(), Some("2023"));
        assert_eq!(article.authors, ["Jane Doe", "John Roe"]);
    }

    #[test]
    fn accumulates_title_text_across_formatting_elements() {
        let publications = parse_publications(FIXTURE.as_bytes()).unwrap();
        let paper = &publications[1];

        assert_eq!(paper.title.as_deref(), Some("Learning k-way Cuts"));
        assert_eq!(paper.doi, None);
        assert_eq!(paper.venue.as_deref(), Some("NeurIPS"));
        assert_eq!(
            paper.url.as_deref(),
            Some("https://proceedings.example.org/doe21.pdf")
        );
    }

    #[test]
    fn empty_document_yields_no_publications() {
        let publications =
            parse_publications(r#"<dblpperson name="X" pid="1/1"></dblpperson>"#.as_bytes())
                .unwrap();
        assert!(publications.is_empty());
    }

    #[test]
    fn mismatched_end_tag_is_a_parse_error() {
        let result =
            parse_publications("<dblpperson><r><article></oops></r></dblpperson>".as_bytes());
        assert!(matches!(result, Err(DblpError::Parse(_))));
    }
}
