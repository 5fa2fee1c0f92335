use anyhow::{Context, Result, anyhow};
use ego_tree::NodeId;
use scraper::{ElementRef, Html, Selector};
use std::path::Path;
use std::rc::Rc;
use url::Url;

use crate::dom::{DomElement, DomPage};

/// A saved page snapshot parsed once in memory. Nothing lazy-loads here, so
/// the pseudo scroll height never changes and scrolling is a no-op.
pub struct SnapshotPage {
    doc: Rc<Html>,
    base: Option<Url>,
    height: u64,
}

impl SnapshotPage {
    pub fn from_html(html: &str, base_url: Option<&str>) -> Result<Self> {
        let base = match base_url {
            Some(raw) => Some(
                Url::parse(raw).with_context(|| format!("Invalid base URL {}", raw))?,
            ),
            None => None,
        };

        Ok(SnapshotPage {
            doc: Rc::new(Html::parse_document(html)),
            base,
            height: html.len() as u64,
        })
    }

    pub fn from_file(path: &Path, base_url: Option<&str>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read snapshot {}", path.display()))?;
        Self::from_html(&raw, base_url)
    }
}

fn parse_selector(selector: &str) -> Result<Selector> {
    Selector::parse(selector).map_err(|e| anyhow!("Invalid selector {}: {}", selector, e))
}

impl DomPage for SnapshotPage {
    type Element = SnapshotElement;

    async fn count_matching(&self, selector: &str) -> Result<usize> {
        let selector = parse_selector(selector)?;
        Ok(self.doc.select(&selector).count())
    }

    async fn current_scroll_height(&self) -> Result<u64> {
        Ok(self.height)
    }

    async fn scroll_to_bottom(&self) -> Result<()> {
        Ok(())
    }

    async fn query_all(&self, selector: &str) -> Result<Vec<Self::Element>> {
        let selector = parse_selector(selector)?;
        Ok(self
            .doc
            .select(&selector)
            .map(|element| SnapshotElement {
                doc: Rc::clone(&self.doc),
                node: element.id(),
                base: self.base.clone(),
            })
            .collect())
    }
}

/// Handle to one element in the shared parsed tree. Re-parsing elements as
/// standalone fragments would drop table content (tr/td have no body
/// insertion context), so handles stay inside the original document.
pub struct SnapshotElement {
    doc: Rc<Html>,
    node: NodeId,
    base: Option<Url>,
}

impl SnapshotElement {
    fn element(&self) -> Option<ElementRef<'_>> {
        self.doc.tree.get(self.node).and_then(ElementRef::wrap)
    }

    fn resolve(&self, value: &str) -> String {
        if value.starts_with("http://") || value.starts_with("https://") {
            value.to_string()
        } else if let Some(rest) = value.strip_prefix("//") {
            format!("https://{}", rest)
        } else if let Some(base) = &self.base {
            base.join(value)
                .map(|u| u.to_string())
                .unwrap_or_else(|_| value.to_string())
        } else {
            value.to_string()
        }
    }
}

impl DomElement for SnapshotElement {
    async fn query(&self, selector: &str) -> Result<Option<Self>> {
        let parsed = parse_selector(selector)?;
        let Some(own) = self.element() else {
            return Ok(None);
        };

        // Strict descendants; skip(1) drops the element itself.
        let found = own
            .descendants()
            .skip(1)
            .filter_map(ElementRef::wrap)
            .find(|element| parsed.matches(element));

        Ok(found.map(|element| SnapshotElement {
            doc: Rc::clone(&self.doc),
            node: element.id(),
            base: self.base.clone(),
        }))
    }

    async fn text_content(&self) -> Result<Option<String>> {
        Ok(self
            .element()
            .map(|element| element.text().collect::<String>()))
    }

    async fn attribute(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .element()
            .and_then(|element| element.value().attr(name))
            .map(|value| value.to_string()))
    }

    async fn resolved_url(&self, name: &str) -> Result<Option<String>> {
        Ok(self
            .attribute(name)
            .await?
            .map(|value| self.resolve(&value)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Accessor, FieldRule};
    use crate::extractor::extract;

    const CARDS: &str = r#"
        <html><body>
          <div class="card">
            <h3>  Chess Engine  </h3>
            <a href="/projects/chess">view</a>
            <img src="img/chess.png">
            <span class="author">Ada</span>
          </div>
          <div class="card">
            <h3>Ray Tracer</h3>
            <a href="https://other.example.org/rt">view</a>
            <img src="//cdn.example.com/rt.png">
          </div>
        </body></html>
    "#;

    fn rules() -> Vec<FieldRule> {
        vec![
            FieldRule {
                name: "name".to_string(),
                selector: "h3".to_string(),
                accessor: Accessor::Text,
                fallback: "N/A".to_string(),
            },
            FieldRule {
                name: "link".to_string(),
                selector: "a".to_string(),
                accessor: Accessor::Attribute {
                    name: "href".to_string(),
                },
                fallback: "Link not found".to_string(),
            },
            FieldRule {
                name: "image".to_string(),
                selector: "img".to_string(),
                accessor: Accessor::ResolvedUrl {
                    name: "src".to_string(),
                },
                fallback: "Image not found".to_string(),
            },
            FieldRule {
                name: "author".to_string(),
                selector: ".author".to_string(),
                accessor: Accessor::Text,
                fallback: "Author not found".to_string(),
            },
        ]
    }

    #[tokio::test]
    async fn test_counts_and_queries_cards() {
        let page = SnapshotPage::from_html(CARDS, None).unwrap();
        assert_eq!(page.count_matching(".card").await.unwrap(), 2);
        assert_eq!(page.count_matching(".missing").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_extracts_with_url_resolution() {
        let page =
            SnapshotPage::from_html(CARDS, Some("https://example.com/projects/")).unwrap();

        let records = extract(&page, ".card", &rules()).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("name"), Some("Chess Engine"));
        // href is verbatim; img src resolves against the base.
        assert_eq!(records[0].get("link"), Some("/projects/chess"));
        assert_eq!(
            records[0].get("image"),
            Some("https://example.com/projects/img/chess.png")
        );
        assert_eq!(records[0].get("author"), Some("Ada"));

        assert_eq!(records[1].get("link"), Some("https://other.example.org/rt"));
        assert_eq!(records[1].get("image"), Some("https://cdn.example.com/rt.png"));
        assert_eq!(records[1].get("author"), Some("Author not found"));
    }

    #[tokio::test]
    async fn test_table_rows_keep_their_cells() {
        // tr/td collections must extract real values, not fallbacks.
        let html = r#"
            <table>
              <tr class="hb-table-row">
                <td class="code"><span class="field-content">HIST 101</span></td>
                <td class="title"><a href="/courses/hist101">Global History</a></td>
              </tr>
              <tr class="hb-table-row">
                <td class="title"><a href="/courses/hist205">Medieval Europe</a></td>
              </tr>
            </table>
        "#;
        let row_rules = vec![
            FieldRule {
                name: "code".to_string(),
                selector: ".code .field-content".to_string(),
                accessor: Accessor::Text,
                fallback: "N/A".to_string(),
            },
            FieldRule {
                name: "link".to_string(),
                selector: ".title a".to_string(),
                accessor: Accessor::Attribute {
                    name: "href".to_string(),
                },
                fallback: "N/A".to_string(),
            },
        ];

        let page = SnapshotPage::from_html(html, None).unwrap();
        let records = extract(&page, ".hb-table-row", &row_rules).await.unwrap();

        assert_eq!(records.len(), 2);
        assert_eq!(records[0].get("code"), Some("HIST 101"));
        assert_eq!(records[0].get("link"), Some("/courses/hist101"));
        assert_eq!(records[1].get("code"), Some("N/A"));
        assert_eq!(records[1].get("link"), Some("/courses/hist205"));
    }

    #[tokio::test]
    async fn test_invalid_collection_selector_is_an_error() {
        let page = SnapshotPage::from_html(CARDS, None).unwrap();
        assert!(page.query_all(":::nope").await.is_err());
    }

    #[tokio::test]
    async fn test_nested_query_skips_self_match() {
        let html = r#"<div class="card"><div class="card inner"><h3>Inner</h3></div></div>"#;
        let page = SnapshotPage::from_html(html, None).unwrap();

        let cards = page.query_all("div.card").await.unwrap();
        let inner = cards[0].query("div.card").await.unwrap().unwrap();
        assert_eq!(
            inner.text_content().await.unwrap().as_deref().map(str::trim),
            Some("Inner")
        );
    }
}
