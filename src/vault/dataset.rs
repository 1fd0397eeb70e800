use crate::error::VaultError;

use csv::{ReaderBuilder, Trim};
use include_dir::{Dir, include_dir};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::PathBuf;

static CSV_ASSETS: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/assets/csv");

pub const DEFAULT_PAGE: usize = 1;
pub const DEFAULT_PAGE_SIZE: usize = 20;

pub type Row = BTreeMap<String, String>;

/// Where datasets are read from.
#[derive(Debug, Clone, Default)]
pub enum DatasetSource {
    #[default]
    Embedded,
    Directory(PathBuf),
}

impl DatasetSource {
    pub fn read(&self, filename: &str) -> Result<Vec<u8>, VaultError> {
        match self {
            DatasetSource::Embedded => CSV_ASSETS
                .get_file(filename)
                .map(|file| file.contents().to_vec())
                .ok_or_else(|| VaultError::FileNotFound(filename.to_string())),
            DatasetSource::Directory(dir) => match std::fs::read(dir.join(filename)) {
                Ok(bytes) => Ok(bytes),
                Err(e) if e.kind() == ErrorKind::NotFound => {
                    Err(VaultError::FileNotFound(filename.to_string()))
                }
                Err(e) => Err(e.into()),
            },
        }
    }
}

/// A parsed CSV file. Never mutated once loaded.
#[derive(Debug, Clone, PartialEq)]
pub struct Dataset {
    pub filename: String,
    pub headers: Vec<String>,
    pub rows: Vec<Row>,
}

impl Dataset {
    // First record is the header row. Blank lines are skipped, short rows padded with "".
    pub fn parse(filename: &str, bytes: &[u8]) -> Result<Self, VaultError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(Trim::Headers)
            .from_reader(bytes);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim().to_string())
            .collect();

        if headers.is_empty() || headers.iter().all(String::is_empty) {
            return Err(VaultError::InvalidFormat(filename.to_string()));
        }

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            if record.iter().all(|field| field.trim().is_empty()) {
                continue;
            }
            let row: Row = headers
                .iter()
                .enumerate()
                .map(|(i, header)| (header.clone(), record.get(i).unwrap_or("").to_string()))
                .collect();
            rows.push(row);
        }

        log::debug!("Parsed {} rows from {}", rows.len(), filename);
        Ok(Self {
            filename: filename.to_string(),
            headers,
            rows,
        })
    }

    pub fn query(&self, options: &QueryOptions) -> Result<QueryPage, VaultError> {
        if options.page == 0 || options.page_size == 0 {
            return Err(VaultError::InvalidPagination);
        }

        let filters: Vec<(&String, String)> = options
            .filters
            .iter()
            .map(|(column, needle)| (column, needle.to_lowercase()))
            .collect();
        let search = options
            .search
            .as_deref()
            .map(str::trim)
            .filter(|term| !term.is_empty())
            .map(str::to_lowercase);

        let matching: Vec<&Row> = self
            .rows
            .iter()
            .filter(|row| {
                filters.iter().all(|(column, needle)| {
                    row.get(*column)
                        .is_some_and(|value| value.to_lowercase().contains(needle.as_str()))
                })
            })
            .filter(|row| match &search {
                Some(term) => row
                    .values()
                    .any(|value| value.to_lowercase().contains(term.as_str())),
                None => true,
            })
            .collect();

        let total = matching.len();
        let start = (options.page - 1).saturating_mul(options.page_size);
        let rows = matching
            .into_iter()
            .skip(start)
            .take(options.page_size)
            .cloned()
            .collect();

        Ok(QueryPage {
            headers: self.headers.clone(),
            rows,
            total,
            page: options.page,
            page_size: options.page_size,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryOptions {
    pub page: usize,
    pub page_size: usize,
    pub filters: BTreeMap<String, String>,
    pub search: Option<String>,
}

impl Default for QueryOptions {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            page_size: DEFAULT_PAGE_SIZE,
            filters: BTreeMap::new(),
            search: None,
        }
    }
}

impl QueryOptions {
    pub fn page(mut self, page: usize) -> Self {
        self.page = page;
        self
    }

    pub fn page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn filter(mut self, column: impl Into<String>, value: impl Into<String>) -> Self {
        self.filters.insert(column.into(), value.into());
        self
    }

    pub fn search(mut self, term: impl Into<String>) -> Self {
        self.search = Some(term.into());
        self
    }

    /// Parses a search box line: `column:value` tokens become filters, the remaining words
    /// form the free-text search.
    pub fn from_query_text(text: &str) -> Self {
        let mut options = Self::default();
        let mut words = Vec::new();
        for token in text.split_whitespace() {
            match token.split_once(':') {
                Some((column, value)) if !column.is_empty() && !value.is_empty() => {
                    options = options.filter(column, value);
                }
                _ => words.push(token),
            }
        }
        if !words.is_empty() {
            options = options.search(words.join(" "));
        }
        options
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryPage {
    pub headers: Vec<String>,
    #[serde(rename = "data")]
    pub rows: Vec<Row>,
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
}

impl QueryPage {
    pub fn total_pages(&self) -> usize {
        self.total.div_ceil(self.page_size.max(1)).max(1)
    }
}
