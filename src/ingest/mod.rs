//! Catalog ingestion pipeline.
//!
//! Scrape path: bulletin index -> per-department parse -> prerequisite
//! extraction -> embed -> store. CSV path: load pre-parsed rows -> embed ->
//! store. A department that fails to fetch or parse contributes nothing and
//! never aborts its siblings. Embedding calls retry with bounded
//! exponential backoff; a record whose embedding never materializes is
//! skipped and counted.

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use crate::catalog::source::{CatalogSource, DepartmentPage};
use crate::catalog::types::{is_course_number, College, CourseRecord};
use crate::catalog::{CatalogParser, PrerequisiteExtractor};
use crate::core::config::IngestSettings;
use crate::core::errors::IngestError;
use crate::llm::EmbeddingProvider;
use crate::rag::CourseStore;

#[derive(Debug, Default)]
pub struct IngestReport {
    pub departments: usize,
    pub failed_departments: Vec<String>,
    pub parsed: usize,
    pub stored: usize,
    pub skipped: usize,
}

pub struct IngestPipeline {
    source: Arc<dyn CatalogSource>,
    embeddings: Arc<dyn EmbeddingProvider>,
    store: Arc<dyn CourseStore>,
    parser: CatalogParser,
    extractor: PrerequisiteExtractor,
    settings: IngestSettings,
}

impl IngestPipeline {
    pub fn new(
        source: Arc<dyn CatalogSource>,
        embeddings: Arc<dyn EmbeddingProvider>,
        store: Arc<dyn CourseStore>,
        settings: IngestSettings,
    ) -> Self {
        IngestPipeline {
            source,
            embeddings,
            store,
            parser: CatalogParser::new(),
            extractor: PrerequisiteExtractor::new(),
            settings,
        }
    }

    /// Full scrape of the bulletin into the course store.
    pub async fn run_scrape(&self) -> Result<IngestReport, IngestError> {
        let pages = self.source.department_index().await?;
        tracing::info!(departments = pages.len(), "catalog index fetched");

        let mut records = Vec::new();
        let mut failed_departments = Vec::new();

        for page in &pages {
            match self.scrape_department(page).await {
                Ok(mut department_records) => {
                    tracing::info!(
                        department = %page.department,
                        courses = department_records.len(),
                        "department parsed"
                    );
                    records.append(&mut department_records);
                }
                Err(err) => {
                    tracing::warn!(
                        department = %page.department,
                        "department skipped: {}",
                        err
                    );
                    failed_departments.push(page.department.clone());
                }
            }
        }

        let records: Vec<CourseRecord> = records
            .into_iter()
            .map(|record| self.apply_prereqs(record))
            .collect();

        let mut report = self.encode_and_store(records).await?;
        report.departments = pages.len();
        report.failed_departments = failed_departments;
        Ok(report)
    }

    /// Ingests a pre-parsed CSV export instead of scraping.
    pub async fn run_csv(&self, path: &Path) -> Result<IngestReport, IngestError> {
        let records = load_csv(path)?;
        self.encode_and_store(records).await
    }

    async fn scrape_department(
        &self,
        page: &DepartmentPage,
    ) -> Result<Vec<CourseRecord>, IngestError> {
        let blocks = self.source.department_blocks(page).await?;
        Ok(self
            .parser
            .parse_department(&blocks, &page.department, page.college))
    }

    fn apply_prereqs(&self, mut record: CourseRecord) -> CourseRecord {
        let (cleaned, info) = self
            .extractor
            .extract(&record.description, &record.number);
        record.description = cleaned;
        record.pre_reqs = info.prereq_text;
        record
    }

    async fn encode_and_store(
        &self,
        records: Vec<CourseRecord>,
    ) -> Result<IngestReport, IngestError> {
        let existing = self
            .store
            .list_ids()
            .await
            .map_err(|e| IngestError::Store(e.to_string()))?;
        let mut resolver = DocIdResolver::new(existing);

        let mut report = IngestReport {
            parsed: records.len(),
            ..Default::default()
        };
        let mut batch: Vec<(String, CourseRecord, Vec<f32>)> = Vec::new();

        for record in records {
            let text = rich_text(&record);
            let embedding = match self.embed_with_retry(&text).await {
                Ok(embedding) => embedding,
                Err(err) => {
                    tracing::warn!(
                        course = %record.title,
                        number = %record.number,
                        "skipping record: {}",
                        err
                    );
                    report.skipped += 1;
                    continue;
                }
            };

            match resolver.resolve(&record) {
                Some(id) => batch.push((id, record, embedding)),
                None => {
                    // All identifying fields were empty; let the store key it.
                    match self.store.add(&record, &embedding).await {
                        Ok(_) => report.stored += 1,
                        Err(err) => {
                            tracing::warn!("auto-id store failed: {}", err);
                            report.skipped += 1;
                        }
                    }
                }
            }

            if batch.len() >= self.settings.batch_size {
                self.flush(&mut batch, &mut report).await;
            }
        }

        self.flush(&mut batch, &mut report).await;
        Ok(report)
    }

    async fn flush(
        &self,
        batch: &mut Vec<(String, CourseRecord, Vec<f32>)>,
        report: &mut IngestReport,
    ) {
        if batch.is_empty() {
            return;
        }

        let items = std::mem::take(batch);
        let count = items.len();
        match self.store.batch_set(&items).await {
            Ok(()) => {
                report.stored += count;
                tracing::info!(uploaded = count, total = report.stored, "batch stored");
            }
            Err(err) => {
                report.skipped += count;
                tracing::warn!(lost = count, "batch upload failed: {}", err);
            }
        }
    }

    async fn embed_with_retry(&self, text: &str) -> Result<Vec<f32>, IngestError> {
        let attempts = self.settings.embed_retries.max(1);
        let inputs = [text.to_string()];

        for attempt in 0..attempts {
            match self.embeddings.embed(&inputs).await {
                Ok(mut vectors) => {
                    return vectors.pop().ok_or_else(|| IngestError::Embedding {
                        attempts: attempt + 1,
                        reason: "backend returned no vector".to_string(),
                    });
                }
                Err(err) => {
                    if attempt + 1 == attempts {
                        return Err(IngestError::Embedding {
                            attempts,
                            reason: err.to_string(),
                        });
                    }
                    let backoff = Duration::from_secs(1 << attempt);
                    tracing::warn!(
                        attempt = attempt + 1,
                        "embedding attempt failed, retrying in {:?}: {}",
                        backoff,
                        err
                    );
                    tokio::time::sleep(backoff).await;
                }
            }
        }

        unreachable!("retry loop returns on the final attempt");
    }
}

/// Embedding input: a structured field block followed by a natural-language
/// restatement, so both exact fields and prose phrasing are represented.
pub fn rich_text(record: &CourseRecord) -> String {
    let mut text = format!(
        "Course Name: {}\nDepartment: {}\nCollege: {}\nCourse Number: {}\nCourse Tag: {}\nDescription: {}\nPrerequisites: {}\n",
        record.title,
        record.category,
        record.college,
        record.number,
        record.tag,
        record.description,
        record.pre_reqs
    );

    let mut summary = format!(
        "This is a {} {} course titled '{}' in the {} department at {}.",
        record.tag, record.number, record.title, record.category, record.college
    );
    if !record.description.is_empty() {
        summary.push(' ');
        summary.push_str(&record.description);
    }
    if !record.pre_reqs.is_empty() {
        summary.push_str(&format!(
            " Students should complete {} before enrolling in this course.",
            record.pre_reqs
        ));
    }

    text.push('\n');
    text.push_str(&summary);
    text
}

/// Resolves storage ids from `(tag, number)` with a deterministic fallback
/// chain; a collision never overwrites an existing document.
pub struct DocIdResolver {
    seen: HashSet<String>,
}

impl DocIdResolver {
    pub fn new(existing: Vec<String>) -> Self {
        DocIdResolver {
            seen: existing.into_iter().collect(),
        }
    }

    /// Returns the id for `record`, or `None` when every identifying field
    /// is empty and the store should assign one.
    pub fn resolve(&mut self, record: &CourseRecord) -> Option<String> {
        let base = sanitize(&format!("{}-{}", record.tag, record.number));
        if base.trim_matches(|c| c == '_' || c == '-').is_empty() {
            return None;
        }

        if self.claim(&base) {
            return Some(base);
        }

        let fallback = if record.tag == "ECON" {
            sanitize(&format!(
                "{}-{}-{}",
                record.tag, record.number, record.college
            ))
        } else if record.tag.is_empty() {
            sanitize(&format!(
                "{}-{}-{}",
                record.college, record.number, record.title
            ))
        } else {
            sanitize(&format!(
                "{}-{}-{}",
                record.tag, record.number, record.category
            ))
        };

        if self.claim(&fallback) {
            return Some(fallback);
        }

        let timestamped = format!("{}-{}", fallback, chrono::Utc::now().timestamp());
        self.claim(&timestamped);
        Some(timestamped)
    }

    fn claim(&mut self, id: &str) -> bool {
        if self.seen.contains(id) {
            return false;
        }
        self.seen.insert(id.to_string());
        true
    }
}

/// Document ids cannot contain spaces or '/'.
fn sanitize(id: &str) -> String {
    id.replace(' ', "_").replace('/', "_")
}

/// Loads `college, department, number, course, description, tag[, pre_reqs]`
/// rows. The header row is skipped; malformed rows are logged and dropped.
pub fn load_csv(path: &Path) -> Result<Vec<CourseRecord>, IngestError> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_path(path)?;

    let mut records = Vec::new();
    for (idx, row) in reader.records().enumerate() {
        let row = row?;
        if row.len() < 6 {
            tracing::warn!(row = idx + 2, "skipping incomplete row (missing required fields)");
            continue;
        }

        let college = match College::from_str(row[0].trim()) {
            Ok(college) => college,
            Err(err) => {
                tracing::warn!(row = idx + 2, "skipping row: {}", err);
                continue;
            }
        };

        let number = row[2].trim().to_string();
        if !is_course_number(&number) {
            tracing::warn!(row = idx + 2, number = %number, "skipping row: invalid course number");
            continue;
        }

        records.push(CourseRecord {
            college,
            category: row[1].trim().to_string(),
            number,
            title: row[3].trim().to_string(),
            description: row[4].trim().to_string(),
            tag: row[5].trim().to_string(),
            pre_reqs: row.get(6).map(str::trim).unwrap_or("").to_string(),
        });
    }

    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record(tag: &str, number: &str, college: College) -> CourseRecord {
        CourseRecord {
            college,
            category: "Economics".to_string(),
            number: number.to_string(),
            title: "Principles".to_string(),
            description: String::new(),
            tag: tag.to_string(),
            pre_reqs: String::new(),
        }
    }

    #[test]
    fn duplicate_econ_ids_append_the_college() {
        let mut resolver = DocIdResolver::new(Vec::new());

        let first = resolver.resolve(&record("ECON", "1", College::Cas)).unwrap();
        let second = resolver.resolve(&record("ECON", "1", College::Lsb)).unwrap();

        assert_eq!(first, "ECON-1");
        assert_eq!(second, "ECON-1-LSB");
        assert_ne!(first, second);
    }

    #[test]
    fn duplicate_ids_with_other_tags_append_the_department() {
        let mut resolver = DocIdResolver::new(Vec::new());
        let mut a = record("HIST", "57", College::Cas);
        a.category = "History".to_string();
        let mut b = a.clone();
        b.category = "Asian Studies".to_string();

        assert_eq!(resolver.resolve(&a).unwrap(), "HIST-57");
        assert_eq!(resolver.resolve(&b).unwrap(), "HIST-57-Asian_Studies");
    }

    #[test]
    fn empty_tags_fall_back_to_college_number_title() {
        let mut resolver = DocIdResolver::new(Vec::new());
        let mut a = record("", "101", College::Cas);
        a.title = "Elementary Arabic".to_string();

        assert_eq!(resolver.resolve(&a).unwrap(), "-101");
        assert_eq!(
            resolver.resolve(&a).unwrap(),
            "CAS-101-Elementary_Arabic"
        );
    }

    #[test]
    fn exhausted_chain_gets_a_timestamp_suffix() {
        let mut resolver = DocIdResolver::new(Vec::new());
        let a = record("ECON", "1", College::Cas);

        let first = resolver.resolve(&a).unwrap();
        let second = resolver.resolve(&a).unwrap();
        let third = resolver.resolve(&a).unwrap();

        assert_eq!(first, "ECON-1");
        assert_eq!(second, "ECON-1-CAS");
        assert!(third.starts_with("ECON-1-CAS-"));
        assert_ne!(second, third);
    }

    #[test]
    fn existing_store_ids_participate_in_collision_checks() {
        let mut resolver = DocIdResolver::new(vec!["ECON-1".to_string()]);
        let resolved = resolver.resolve(&record("ECON", "1", College::Lsb)).unwrap();
        assert_eq!(resolved, "ECON-1-LSB");
    }

    #[test]
    fn sanitize_replaces_spaces_and_slashes() {
        assert_eq!(sanitize("MATH/CSCI-10 A"), "MATH_CSCI-10_A");
    }

    #[test]
    fn rich_text_mentions_every_field() {
        let mut r = record("ECON", "1", College::Cas);
        r.description = "Introductory microeconomics.".to_string();
        r.pre_reqs = "Prerequisite: none.".to_string();

        let text = rich_text(&r);
        assert!(text.contains("Course Name: Principles"));
        assert!(text.contains("Course Tag: ECON"));
        assert!(text.contains("College: CAS"));
        assert!(text.contains("This is a ECON 1 course"));
        assert!(text.contains("Students should complete Prerequisite: none."));
    }

    #[test]
    fn csv_loader_skips_short_and_invalid_rows() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "college,department,number,course,description,tag,pre_reqs").unwrap();
        writeln!(file, "CAS,Economics,1,Principles,Micro basics,ECON,").unwrap();
        writeln!(file, "CAS,Economics,2").unwrap();
        writeln!(file, "BAD,Economics,3,Title,Desc,ECON,").unwrap();
        writeln!(file, "CAS,Economics,Laboratory,Title,Desc,ECON,").unwrap();
        writeln!(
            file,
            "SOE,Computer Science and Engineering,174,Software Engineering,Project based,CSEN,CSEN 146"
        )
        .unwrap();

        let records = load_csv(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].tag, "ECON");
        assert_eq!(records[1].pre_reqs, "CSEN 146");
        assert_eq!(records[1].college, College::Soe);
    }
}
