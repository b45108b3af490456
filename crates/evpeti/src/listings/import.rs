use std::io::Read;
use std::path::Path;

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};
use tracing::warn;

use super::catalog::{ListingCatalog, ListingError};
use super::domain::{Listing, ListingDraft};
use super::validation::ListingViolation;
use crate::storage::Repository;
use crate::users::UserId;

#[derive(Debug)]
pub enum ListingImportError {
    Io(std::io::Error),
    Csv(csv::Error),
}

impl std::fmt::Display for ListingImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ListingImportError::Io(err) => write!(f, "failed to read listing export: {}", err),
            ListingImportError::Csv(err) => write!(f, "invalid listing CSV data: {}", err),
        }
    }
}

impl std::error::Error for ListingImportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ListingImportError::Io(err) => Some(err),
            ListingImportError::Csv(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for ListingImportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for ListingImportError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Row refused by the catalog, with the 1-based data line it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRow {
    pub line: usize,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct ImportReport {
    pub imported: Vec<Listing>,
    pub rejected: Vec<RejectedRow>,
}

/// Bulk-loads listings from CSV through the catalog's validated create path.
///
/// Expected header: `owner_id,title,type,location,price,start_date,end_date`. Malformed CSV
/// aborts the import; rows the catalog refuses are reported and skipped.
pub struct ListingImporter;

impl ListingImporter {
    pub fn from_path<P, L>(
        path: P,
        catalog: &ListingCatalog<L>,
    ) -> Result<ImportReport, ListingImportError>
    where
        P: AsRef<Path>,
        L: Repository<Listing> + 'static,
    {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file, catalog)
    }

    pub fn from_reader<R, L>(
        reader: R,
        catalog: &ListingCatalog<L>,
    ) -> Result<ImportReport, ListingImportError>
    where
        R: Read,
        L: Repository<Listing> + 'static,
    {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut report = ImportReport::default();

        for (index, row) in csv_reader.deserialize::<ListingRow>().enumerate() {
            let line = index + 1;
            let created = row?
                .into_draft()
                .map_err(ListingError::from)
                .and_then(|draft| catalog.create(draft));
            match created {
                Ok(listing) => report.imported.push(listing),
                Err(err) => {
                    warn!(line, error = %err, "listing row rejected");
                    report.rejected.push(RejectedRow {
                        line,
                        reason: err.to_string(),
                    });
                }
            }
        }

        Ok(report)
    }
}

#[derive(Debug, Deserialize)]
struct ListingRow {
    owner_id: u64,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    title: Option<String>,
    #[serde(rename = "type")]
    kind: String,
    location: String,
    price: String,
    start_date: NaiveDate,
    end_date: NaiveDate,
}

impl ListingRow {
    fn into_draft(self) -> Result<ListingDraft, ListingViolation> {
        let price = self
            .price
            .parse::<Decimal>()
            .map_err(|_| ListingViolation::UnparseablePrice(self.price.clone()))?;
        Ok(ListingDraft {
            owner_id: UserId(self.owner_id),
            title: self.title,
            kind: self.kind,
            location: self.location,
            price,
            start_date: self.start_date,
            end_date: self.end_date,
            description: None,
            is_available: true,
            is_active: true,
        })
    }
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}
