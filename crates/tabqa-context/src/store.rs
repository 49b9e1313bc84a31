//! In-memory tabular store of ingested candidate rows.

use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tabqa_core::{DocumentId, Error, Result};
use uuid::Uuid;

/// A scalar cell value carried in document metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// Numeric value (ingested as-is or coerced from numeric-looking text).
    Number(f64),
    /// Free-text value.
    Text(String),
}

impl AttributeValue {
    /// Numeric view of this value, if it is a number.
    #[must_use]
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(value) => Some(*value),
            Self::Text(_) => None,
        }
    }
}

/// Parsed rectangular table handed over by the upstream spreadsheet parser.
#[derive(Debug, Clone, Default)]
pub struct RawTable {
    /// Column names in sheet order.
    pub columns: Vec<String>,
    /// One record per sheet row; cells align with `columns`, `None` = blank.
    pub records: Vec<Vec<Option<String>>>,
}

impl RawTable {
    /// Creates a table with the given column names.
    pub fn new<T: Into<String>>(columns: Vec<T>) -> Self {
        Self {
            columns: columns.into_iter().map(Into::into).collect(),
            records: Vec::new(),
        }
    }

    /// Appends a record; cells align positionally with the columns.
    pub fn push_record(&mut self, cells: Vec<Option<String>>) {
        self.records.push(cells);
    }
}

/// The retrievable unit derived from one row: text content plus metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier, unique within the session.
    pub id: DocumentId,
    /// Free-text content used for retrieval.
    pub content: String,
    /// Named attributes of the originating row.
    pub metadata: BTreeMap<String, AttributeValue>,
}

/// Comparison operator for numeric predicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Comparator {
    /// Greater than or equal.
    Ge,
    /// Strictly greater than.
    Gt,
    /// Equal.
    Eq,
    /// Strictly less than.
    Lt,
    /// Less than or equal.
    Le,
}

impl Comparator {
    /// Applies the comparison to a cell value and threshold.
    #[must_use]
    pub fn matches(self, value: f64, threshold: f64) -> bool {
        match self {
            Self::Ge => value >= threshold,
            Self::Gt => value > threshold,
            Self::Eq => (value - threshold).abs() < f64::EPSILON,
            Self::Lt => value < threshold,
            Self::Le => value <= threshold,
        }
    }
}

impl FromStr for Comparator {
    type Err = Error;

    fn from_str(input: &str) -> Result<Self> {
        match input.trim() {
            ">=" | "≥" => Ok(Self::Ge),
            ">" => Ok(Self::Gt),
            "=" | "==" => Ok(Self::Eq),
            "<" => Ok(Self::Lt),
            "<=" | "≤" => Ok(Self::Le),
            other => Err(Error::InvalidArgument(format!(
                "unsupported comparator '{other}', expected one of >=, >, =, <, <="
            ))),
        }
    }
}

/// Numeric predicate over one attribute.
#[derive(Debug, Clone)]
pub struct Predicate {
    /// Attribute the comparison reads.
    pub attribute: String,
    /// Comparison operator.
    pub comparator: Comparator,
    /// Comparison threshold.
    pub threshold: f64,
}

/// In-memory table of ingested rows and their derived documents.
#[derive(Debug, Clone, Default)]
pub struct TabularStore {
    columns: Vec<String>,
    documents: Vec<Document>,
}

impl TabularStore {
    /// Creates an empty store (no ingest has happened yet).
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// Ingests a parsed table, deriving one document per record.
    ///
    /// `content_column` names the free-text column used for retrieval; every
    /// other column becomes metadata. Numeric-looking cells are coerced to
    /// numbers so aggregate and filter tools can read them.
    ///
    /// # Errors
    ///
    /// Returns `Error::Ingest` if the table has no records or the content
    /// column is absent.
    pub fn ingest(table: &RawTable, content_column: &str) -> Result<Self> {
        if table.records.is_empty() {
            return Err(Error::Ingest("table contains no records".to_owned()));
        }

        let content_idx = table
            .columns
            .iter()
            .position(|name| name == content_column)
            .ok_or_else(|| {
                Error::Ingest(format!("content column '{content_column}' is missing"))
            })?;

        let mut documents = Vec::with_capacity(table.records.len());
        for cells in &table.records {
            let content = cells
                .get(content_idx)
                .and_then(Clone::clone)
                .unwrap_or_default();

            let mut metadata = BTreeMap::new();
            for (idx, name) in table.columns.iter().enumerate() {
                if idx == content_idx {
                    continue;
                }
                if let Some(cell) = cells.get(idx).and_then(|cell| cell.as_deref()) {
                    metadata.insert(name.clone(), coerce_cell(cell));
                }
            }

            documents.push(Document {
                id: Uuid::new_v4(),
                content,
                metadata,
            });
        }

        tracing::info!(
            rows = documents.len(),
            columns = table.columns.len(),
            "ingested table"
        );

        Ok(Self {
            columns: table.columns.clone(),
            documents,
        })
    }

    /// Number of ingested rows.
    #[must_use]
    pub fn len(&self) -> usize {
        self.documents.len()
    }

    /// Whether the store holds no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// All documents in insertion order.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    /// Resolves a document by its identifier.
    #[must_use]
    pub fn get(&self, id: DocumentId) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.id == id)
    }

    /// Every non-missing numeric value of the named attribute, in insertion
    /// order. Non-numeric cells of a mixed column are skipped.
    ///
    /// # Errors
    ///
    /// Returns `Error::AttributeNotFound` if the attribute was never ingested.
    pub fn all_values(&self, attribute: &str) -> Result<Vec<f64>> {
        self.check_attribute(attribute)?;

        Ok(self
            .documents
            .iter()
            .filter_map(|doc| doc.metadata.get(attribute))
            .filter_map(AttributeValue::as_number)
            .collect())
    }

    /// Projects `project` for all rows matching the predicate, in insertion
    /// order. An empty result is valid and distinct from a missing attribute.
    ///
    /// # Errors
    ///
    /// Returns `Error::AttributeNotFound` if either the predicate attribute
    /// or the projection attribute was never ingested.
    pub fn filter(&self, predicate: &Predicate, project: &str) -> Result<Vec<AttributeValue>> {
        self.check_attribute(&predicate.attribute)?;
        self.check_attribute(project)?;

        Ok(self
            .documents
            .iter()
            .filter(|doc| {
                doc.metadata
                    .get(&predicate.attribute)
                    .and_then(AttributeValue::as_number)
                    .is_some_and(|value| predicate.comparator.matches(value, predicate.threshold))
            })
            .filter_map(|doc| doc.metadata.get(project).cloned())
            .collect())
    }

    fn check_attribute(&self, attribute: &str) -> Result<()> {
        if self.columns.iter().any(|name| name == attribute) {
            Ok(())
        } else {
            Err(Error::AttributeNotFound(attribute.to_owned()))
        }
    }
}

/// Coerces a cell to a number when it parses as one, keeping text otherwise.
fn coerce_cell(cell: &str) -> AttributeValue {
    cell.trim().parse::<f64>().map_or_else(
        |_| AttributeValue::Text(cell.to_owned()),
        AttributeValue::Number,
    )
}
