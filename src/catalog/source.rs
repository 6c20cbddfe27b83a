//! Catalog page access.
//!
//! [`CatalogSource`] is the boundary to the bulletin site: the index maps
//! colleges to department pages, and each department page yields a flat
//! block sequence for the parser. The HTTP implementation keeps all
//! reqwest/scraper details here; the parser never sees HTML.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::catalog::departments::{normalize, INDEX_SKIP};
use crate::catalog::types::{BlockKind, College, ContentBlock};
use crate::core::errors::IngestError;

#[derive(Debug, Clone)]
pub struct DepartmentPage {
    pub college: College,
    pub department: String,
    pub url: String,
}

#[async_trait]
pub trait CatalogSource: Send + Sync {
    /// Department pages grouped out of the bulletin index.
    async fn department_index(&self) -> Result<Vec<DepartmentPage>, IngestError>;

    /// Content blocks of one department page, in document order.
    async fn department_blocks(&self, page: &DepartmentPage)
        -> Result<Vec<ContentBlock>, IngestError>;
}

pub struct HttpCatalogSource {
    base: Url,
    client: Client,
}

impl HttpCatalogSource {
    pub fn new(base_url: &str) -> Result<Self, IngestError> {
        let base = Url::parse(base_url)
            .map_err(|e| IngestError::Parse(format!("invalid catalog base url: {e}")))?;
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| IngestError::fetch(base_url, e))?;
        Ok(HttpCatalogSource { base, client })
    }

    async fn fetch_text(&self, url: &str) -> Result<String, IngestError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| IngestError::fetch(url, e))?;

        if !response.status().is_success() {
            return Err(IngestError::fetch(url, response.status()));
        }

        response.text().await.map_err(|e| IngestError::fetch(url, e))
    }
}

#[async_trait]
impl CatalogSource for HttpCatalogSource {
    async fn department_index(&self) -> Result<Vec<DepartmentPage>, IngestError> {
        let body = self.fetch_text(self.base.as_str()).await?;
        parse_index(&body, &self.base)
    }

    async fn department_blocks(
        &self,
        page: &DepartmentPage,
    ) -> Result<Vec<ContentBlock>, IngestError> {
        let body = self.fetch_text(&page.url).await?;
        parse_blocks(&body)
    }
}

/// Sidebar folders of the bulletin index, by position: the undergraduate
/// college listings sit at fixed offsets after the front-matter folders.
const COLLEGE_FOLDERS: &[(College, usize)] = &[
    (College::Cas, 3),
    (College::Lsb, 4),
    (College::Soe, 5),
];

fn parse_index(body: &str, base: &Url) -> Result<Vec<DepartmentPage>, IngestError> {
    let doc = Html::parse_document(body);
    let folder_sel = Selector::parse("ul.bltFolder").expect("valid selector");
    let anchor_sel = Selector::parse("a").expect("valid selector");

    let folders: Vec<ElementRef> = doc.select(&folder_sel).collect();
    let mut pages = Vec::new();

    for &(college, idx) in COLLEGE_FOLDERS {
        let folder = folders.get(idx).ok_or_else(|| {
            IngestError::Parse(format!(
                "bulletin index has {} sidebar folders, expected at least {}",
                folders.len(),
                idx + 1
            ))
        })?;

        for anchor in folder.select(&anchor_sel) {
            let department = normalize(&anchor.text().collect::<String>());
            if department.is_empty() {
                continue;
            }
            if INDEX_SKIP.iter().any(|skip| normalize(skip) == department) {
                continue;
            }

            let Some(href) = anchor.value().attr("href") else {
                continue;
            };
            let url = base
                .join(href)
                .map_err(|e| IngestError::Parse(format!("bad department link {href}: {e}")))?;

            pages.push(DepartmentPage {
                college,
                department,
                url: url.to_string(),
            });
        }
    }

    Ok(pages)
}

fn parse_blocks(body: &str) -> Result<Vec<ContentBlock>, IngestError> {
    let doc = Html::parse_document(body);
    let content_sel = Selector::parse("body.doc-content").expect("valid selector");

    let content = doc
        .select(&content_sel)
        .next()
        .ok_or_else(|| IngestError::Parse("department page has no doc-content body".into()))?;

    let mut blocks = Vec::new();
    for child in content.children() {
        let Some(element) = ElementRef::wrap(child) else {
            continue;
        };

        let text = element.text().collect::<String>();
        let text = text.trim();
        if text.is_empty() {
            continue;
        }

        let kind = match element.value().name() {
            "h1" | "h2" => BlockKind::SectionHeading,
            "h3" => BlockKind::CourseHeading,
            _ => BlockKind::Text,
        };

        blocks.push(ContentBlock {
            kind,
            text: text.to_string(),
        });
    }

    Ok(blocks)
}
