//! arXiv Atom API客户端

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use quick_xml::Reader;
use quick_xml::events::{BytesStart, Event};
use reqwest::Client;
use reqwest::header::{ACCEPT, CONTENT_TYPE};
use std::time::Duration;
use tracing::debug;

use super::{CatalogEntry, CatalogError, CatalogQuery, PaperCatalog};
use crate::config::CatalogConfig;

#[derive(Clone)]
pub struct ArxivClient {
    http: Client,
    base_url: String,
}

impl ArxivClient {
    pub fn new(config: &CatalogConfig) -> Result<Self, CatalogError> {
        let http = Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.timeout_seconds))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.clone(),
        })
    }
}

#[async_trait]
impl PaperCatalog for ArxivClient {
    async fn search(&self, query: &CatalogQuery) -> Result<Vec<CatalogEntry>, CatalogError> {
        let search_query = query.search_expression()?;
        debug!(%search_query, max_results = query.max_results, "🔎 查询arXiv");

        let resp = self
            .http
            .get(&self.base_url)
            .query(&[("search_query", search_query.as_str())])
            .query(&[("start", 0), ("max_results", query.max_results)])
            .query(&[
                ("sortBy", "submittedDate"),
                ("sortOrder", query.sort_order.as_str()),
            ])
            .header(
                ACCEPT,
                "application/atom+xml, application/xml;q=0.9, text/xml;q=0.8",
            )
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            return Err(CatalogError::Status(status));
        }
        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string())
            .unwrap_or_default();
        if !(content_type.contains("xml") || content_type.contains("atom")) {
            let body = resp.text().await.unwrap_or_default();
            let mut preview: String = body.trim().chars().take(200).collect();
            if body.trim().chars().count() > 200 {
                preview.push('…');
            }
            return Err(CatalogError::UnexpectedContentType {
                content_type,
                preview,
            });
        }

        let text = resp.text().await?;
        let mut entries = parse_atom_feed(&text)?;
        entries.truncate(query.max_results);
        debug!(count = entries.len(), "arXiv feed解析完成");
        Ok(entries)
    }
}

/// 正在解析的条目
#[derive(Default)]
struct EntryBuilder {
    id: String,
    title: String,
    published: String,
    summary: String,
    authors: Vec<String>,
    abs_url: Option<String>,
    pdf_url: Option<String>,
}

impl EntryBuilder {
    fn read_link(&mut self, e: &BytesStart<'_>) {
        let mut rel: Option<String> = None;
        let mut href: Option<String> = None;
        let mut typ: Option<String> = None;
        let mut title: Option<String> = None;
        for a in e.attributes().flatten() {
            let v = String::from_utf8_lossy(&a.value).to_string();
            match a.key.local_name().as_ref() {
                b"rel" => rel = Some(v),
                b"href" => href = Some(v),
                b"type" => typ = Some(v),
                b"title" => title = Some(v),
                _ => {}
            }
        }
        let Some(href) = href else { return };
        let is_pdf = typ.as_deref().is_some_and(|t| t.contains("pdf"))
            || title.as_deref().is_some_and(|t| t.eq_ignore_ascii_case("pdf"));
        if is_pdf {
            self.pdf_url.get_or_insert(href);
        } else if rel.as_deref() == Some("alternate") {
            self.abs_url.get_or_insert(href);
        }
    }

    fn build(self) -> Result<CatalogEntry, CatalogError> {
        let published = DateTime::parse_from_rfc3339(self.published.trim())
            .map_err(|e| {
                CatalogError::Parse(format!(
                    "invalid published date {:?} for entry {}: {}",
                    self.published, self.id, e
                ))
            })?
            .with_timezone(&Utc);
        Ok(CatalogEntry {
            entry_id: self.id.trim().to_string(),
            title: self.title.trim().to_string(),
            authors: self.authors,
            published,
            summary: self.summary.trim().to_string(),
            abs_url: self.abs_url,
            pdf_url: self.pdf_url,
        })
    }
}

/// 解析arXiv返回的Atom feed
pub fn parse_atom_feed(xml: &str) -> Result<Vec<CatalogEntry>, CatalogError> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut out = Vec::new();

    let mut current: Option<EntryBuilder> = None;
    let mut text = String::new();

    loop {
        match reader.read_event_into(&mut buf) {
            Ok(Event::Start(e)) => {
                let name = e.local_name().as_ref().to_vec();
                match name.as_slice() {
                    b"entry" => current = Some(EntryBuilder::default()),
                    b"link" => {
                        if let Some(entry) = current.as_mut() {
                            entry.read_link(&e);
                        }
                    }
                    _ => {}
                }
                text.clear();
            }
            Ok(Event::Empty(e)) => {
                if e.local_name().as_ref() == b"link"
                    && let Some(entry) = current.as_mut()
                {
                    entry.read_link(&e);
                }
            }
            Ok(Event::Text(t)) => {
                let unescaped = t
                    .unescape()
                    .map_err(|e| CatalogError::Parse(e.to_string()))?;
                text.push_str(&unescaped);
            }
            Ok(Event::CData(t)) => {
                text.push_str(&String::from_utf8_lossy(&t.into_inner()));
            }
            Ok(Event::End(e)) => {
                let name = e.local_name().as_ref().to_vec();
                if name.as_slice() == b"entry" {
                    if let Some(entry) = current.take() {
                        out.push(entry.build()?);
                    }
                } else if let Some(entry) = current.as_mut() {
                    let value = std::mem::take(&mut text);
                    match name.as_slice() {
                        b"id" => entry.id = value,
                        b"title" => entry.title = value,
                        b"published" => entry.published = value,
                        b"summary" => entry.summary = value,
                        b"name" => entry.authors.push(value.trim().to_string()),
                        _ => {}
                    }
                }
                text.clear();
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(CatalogError::Parse(e.to_string())),
            _ => {}
        }
        buf.clear();
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SortOrder;
    use wiremock::matchers::{method, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title type="html">ArXiv Query: search_query=cat:cs.LG</title>
  <id>http://arxiv.org/api/abc</id>
  <entry>
    <id>http://arxiv.org/abs/2501.01234v1</id>
    <updated>2025-01-15T12:00:00Z</updated>
    <published>2025-01-14T18:30:00Z</published>
    <title>Mixture-of-Experts
  routing</title>
    <summary>We study routing.
Experts &amp; tokens.</summary>
    <author><name>Doe, J.</name></author>
    <author><name>Smith, A.</name></author>
    <link href="http://arxiv.org/abs/2501.01234v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2501.01234v1" rel="related" type="application/pdf"/>
    <arxiv:primary_category xmlns:arxiv="http://arxiv.org/schemas/atom" term="cs.LG" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
  <entry>
    <id>http://arxiv.org/abs/2501.00001v2</id>
    <published>2025-01-13T09:00:00Z</published>
    <title>Second paper</title>
    <summary>Short.</summary>
    <author><name>Roe, R.</name></author>
    <link href="http://arxiv.org/abs/2501.00001v2" rel="alternate" type="text/html"/>
  </entry>
</feed>
"#;

    fn client_for(server: &MockServer) -> ArxivClient {
        let config = CatalogConfig {
            base_url: format!("{}/api/query", server.uri()),
            ..Default::default()
        };
        ArxivClient::new(&config).unwrap()
    }

    #[test]
    fn test_parse_feed_entries() {
        let entries = parse_atom_feed(SAMPLE).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.entry_id, "http://arxiv.org/abs/2501.01234v1");
        assert_eq!(first.title, "Mixture-of-Experts\n  routing");
        assert_eq!(first.authors, vec!["Doe, J.", "Smith, A."]);
        assert_eq!(first.summary, "We study routing.\nExperts & tokens.");
        assert_eq!(
            first.published.format("%Y-%m-%d").to_string(),
            "2025-01-14"
        );
        assert_eq!(
            first.abs_url.as_deref(),
            Some("http://arxiv.org/abs/2501.01234v1")
        );
        assert_eq!(
            first.pdf_url.as_deref(),
            Some("http://arxiv.org/pdf/2501.01234v1")
        );

        let second = &entries[1];
        assert_eq!(second.authors, vec!["Roe, R."]);
        assert!(second.pdf_url.is_none());
    }

    #[test]
    fn test_parse_feed_without_entries() {
        let xml = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom"><title>empty</title></feed>"#;
        assert!(parse_atom_feed(xml).unwrap().is_empty());
    }

    #[test]
    fn test_parse_feed_bad_date() {
        let xml = r#"<feed><entry><id>x</id><published>yesterday</published><title>t</title></entry></feed>"#;
        let err = parse_atom_feed(xml).unwrap_err();
        assert!(matches!(err, CatalogError::Parse(_)));
    }

    #[tokio::test]
    async fn test_search_sends_recency_query() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(query_param("search_query", "cat:cs.AI OR cat:cs.LG"))
            .and(query_param("max_results", "2"))
            .and(query_param("sortBy", "submittedDate"))
            .and(query_param("sortOrder", "descending"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(SAMPLE.as_bytes(), "application/atom+xml"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let query = CatalogQuery {
            categories: vec!["cs.AI".to_string(), "cs.LG".to_string()],
            max_results: 2,
            sort_order: SortOrder::Descending,
        };
        let entries = client.search(&query).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[1].title, "Second paper");
    }

    #[tokio::test]
    async fn test_search_truncates_to_max_results() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(SAMPLE.as_bytes(), "application/atom+xml"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let entries = client
            .search(&CatalogQuery::latest(vec!["cs.LG".to_string()], 1))
            .await
            .unwrap();
        assert_eq!(entries.len(), 1);
    }

    #[tokio::test]
    async fn test_search_http_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .search(&CatalogQuery::latest(vec!["cs.AI".to_string()], 1))
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogError::Status(s) if s.as_u16() == 503));
        assert!(err.to_string().contains("503"));
    }

    #[tokio::test]
    async fn test_search_rejects_html() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_raw("<html>rate limited</html>".as_bytes(), "text/html"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server);
        let err = client
            .search(&CatalogQuery::latest(vec!["cs.AI".to_string()], 1))
            .await
            .unwrap_err();
        match err {
            CatalogError::UnexpectedContentType {
                content_type,
                preview,
            } => {
                assert!(content_type.contains("text/html"));
                assert_eq!(preview, "<html>rate limited</html>");
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
