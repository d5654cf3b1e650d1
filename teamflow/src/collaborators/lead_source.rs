//! Lead sourcing.

use crate::errors::CollaboratorError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// A potential client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Lead {
    /// Display name of the lead (usually the practice name).
    pub name: String,
    /// Contact address.
    pub contact: String,
}

impl Lead {
    /// Creates a new lead.
    #[must_use]
    pub fn new(name: impl Into<String>, contact: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            contact: contact.into(),
        }
    }

    /// Renders the lead as a mailbox string, `Name <contact>`.
    ///
    /// This is how leads are stored in the context.
    #[must_use]
    pub fn mailbox(&self) -> String {
        format!("{} <{}>", self.name, self.contact)
    }

    /// Parses a mailbox string produced by [`Lead::mailbox`].
    #[must_use]
    pub fn from_mailbox(mailbox: &str) -> Option<Self> {
        let (name, rest) = mailbox.rsplit_once('<')?;
        let contact = rest.strip_suffix('>')?.trim();
        let name = name.trim();
        if name.is_empty() || contact.is_empty() {
            return None;
        }
        Some(Self::new(name, contact))
    }
}

/// Source of prospective leads.
#[async_trait]
pub trait LeadSource: Send + Sync {
    /// Fetches at most `limit` leads.
    ///
    /// Ordering is only stable when the source itself is stable.
    async fn fetch_leads(&self, limit: usize) -> Result<Vec<Lead>, CollaboratorError>;
}

/// A deterministic lead source that fabricates numbered leads.
#[derive(Debug, Default)]
pub struct MockLeadSource {
    calls: AtomicUsize,
}

impl MockLeadSource {
    /// Creates a new mock lead source.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the number of times leads were fetched.
    #[must_use]
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LeadSource for MockLeadSource {
    async fn fetch_leads(&self, limit: usize) -> Result<Vec<Lead>, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok((1..=limit)
            .map(|i| Lead::new(format!("Lead {i}"), format!("lead{i}@example.com")))
            .collect())
    }
}

/// Reads leads from a CSV file with a header row.
///
/// The name is taken from the `clinic_name` column, falling back to `name`;
/// the contact from `email`, falling back to `contact`. Rows missing either
/// are skipped. A missing file yields no leads.
#[derive(Debug, Clone)]
pub struct CsvLeadSource {
    path: PathBuf,
}

impl CsvLeadSource {
    /// Creates a lead source reading from `path`.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Returns the CSV path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl LeadSource for CsvLeadSource {
    async fn fetch_leads(&self, limit: usize) -> Result<Vec<Lead>, CollaboratorError> {
        let content = match tokio::fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %self.path.display(), "lead file not found");
                return Ok(Vec::new());
            }
            Err(e) => {
                return Err(CollaboratorError::lead_source(format!(
                    "failed to read {}: {e}",
                    self.path.display()
                )))
            }
        };

        let leads = parse_leads(&content, limit)?;
        tracing::debug!(path = %self.path.display(), count = leads.len(), "read leads");
        Ok(leads)
    }
}

fn parse_leads(content: &str, limit: usize) -> Result<Vec<Lead>, CollaboratorError> {
    // Spreadsheet exports often start with a byte-order mark.
    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(content.as_bytes());

    let header: Vec<String> = reader
        .headers()
        .map_err(|e| CollaboratorError::lead_source(format!("invalid CSV header: {e}")))?
        .iter()
        .map(str::to_lowercase)
        .collect();
    let column = |name: &str| header.iter().position(|h| h == name);
    let name_cols = [column("clinic_name"), column("name")];
    let contact_cols = [column("email"), column("contact")];

    let mut leads = Vec::new();
    for (row, record) in reader.records().enumerate() {
        if leads.len() >= limit {
            break;
        }
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                tracing::debug!(row, error = %e, "skipping malformed lead row");
                continue;
            }
        };
        let pick = |cols: &[Option<usize>]| {
            cols.iter()
                .flatten()
                .filter_map(|&i| record.get(i))
                .find(|f| !f.is_empty())
                .map(str::to_string)
        };
        match (pick(&name_cols[..]), pick(&contact_cols[..])) {
            (Some(name), Some(contact)) => leads.push(Lead::new(name, contact)),
            _ => tracing::debug!(row, "skipping incomplete lead row"),
        }
    }
    Ok(leads)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashSet;

    #[tokio::test]
    async fn test_mock_returns_exactly_limit() {
        let source = MockLeadSource::new();
        let leads = source.fetch_leads(5).await.unwrap();

        assert_eq!(leads.len(), 5);
        assert!(leads.iter().all(|l| !l.name.is_empty() && !l.contact.is_empty()));

        let names: HashSet<_> = leads.iter().map(|l| &l.name).collect();
        let contacts: HashSet<_> = leads.iter().map(|l| &l.contact).collect();
        assert_eq!(names.len(), 5);
        assert_eq!(contacts.len(), 5);
        assert_eq!(source.call_count(), 1);
    }

    #[tokio::test]
    async fn test_mock_zero_limit() {
        assert!(MockLeadSource::new().fetch_leads(0).await.unwrap().is_empty());
    }

    #[test]
    fn test_mailbox_round_trip() {
        let lead = Lead::new("Sunrise Dental", "hello@sunrise.example");
        assert_eq!(lead.mailbox(), "Sunrise Dental <hello@sunrise.example>");
        assert_eq!(Lead::from_mailbox(&lead.mailbox()), Some(lead));
    }

    #[test]
    fn test_from_mailbox_rejects_garbage() {
        assert_eq!(Lead::from_mailbox("no brackets"), None);
        assert_eq!(Lead::from_mailbox("<only@contact>"), None);
        assert_eq!(Lead::from_mailbox("Name <>"), None);
    }

    #[tokio::test]
    async fn test_csv_source_skips_incomplete_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        std::fs::write(
            &path,
            "clinic_name,email,city\n\
             Bright Smiles,info@brightsmiles.example,Austin\n\
             ,missing@name.example,Dallas\n\
             No Email Clinic,,Houston\n\
             \"Oak, Pine & Co\",team@oakpine.example,Waco\n",
        )
        .unwrap();

        let leads = CsvLeadSource::new(&path).fetch_leads(10).await.unwrap();

        assert_eq!(
            leads,
            vec![
                Lead::new("Bright Smiles", "info@brightsmiles.example"),
                Lead::new("Oak, Pine & Co", "team@oakpine.example"),
            ]
        );
    }

    #[tokio::test]
    async fn test_csv_source_fallback_columns_and_limit() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        std::fs::write(
            &path,
            "name,contact\nA,a@x.example\nB,b@x.example\nC,c@x.example\n",
        )
        .unwrap();

        let leads = CsvLeadSource::new(&path).fetch_leads(2).await.unwrap();

        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0], Lead::new("A", "a@x.example"));
        assert_eq!(leads[1], Lead::new("B", "b@x.example"));
    }

    #[tokio::test]
    async fn test_csv_source_quoted_field_spans_lines() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        std::fs::write(
            &path,
            "clinic_name,email,notes\n\
             Acme,acme@x.example,\"call back\nDo Not Contact,optout@x.example\"\n\
             Beta,beta@x.example,\n",
        )
        .unwrap();

        let leads = CsvLeadSource::new(&path).fetch_leads(10).await.unwrap();

        assert_eq!(
            leads,
            vec![
                Lead::new("Acme", "acme@x.example"),
                Lead::new("Beta", "beta@x.example"),
            ]
        );
    }

    #[tokio::test]
    async fn test_csv_source_strips_byte_order_mark() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("leads.csv");
        std::fs::write(
            &path,
            "\u{feff}clinic_name,email\nAcme,acme@x.example\nBeta,beta@x.example\n",
        )
        .unwrap();

        let leads = CsvLeadSource::new(&path).fetch_leads(10).await.unwrap();

        assert_eq!(leads.len(), 2);
        assert_eq!(leads[0], Lead::new("Acme", "acme@x.example"));
    }

    #[tokio::test]
    async fn test_csv_source_missing_file() {
        let source = CsvLeadSource::new("/definitely/not/here/leads.csv");
        assert!(source.fetch_leads(5).await.unwrap().is_empty());
    }
}
