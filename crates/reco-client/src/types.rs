//! Data model for the recommendations service.
//!
//! Model containers and builds are identified by opaque server-assigned
//! strings; everything else here is either a request payload or a value
//! decoded from one response record.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

use crate::error::{RecoError, Result};
use crate::xml::{Element, FromRecord};

// =============================================================================
// Identifiers
// =============================================================================

/// Server-assigned identifier of a model container
pub type ModelId = String;

/// Server-assigned identifier of one build of a model
pub type BuildId = String;

// =============================================================================
// Build status
// =============================================================================

/// Lifecycle state of a model build as reported by the service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum BuildStatus {
    Create,
    Queued,
    Building,
    Success,
    Error,
    Cancelling,
    Cancelled,
}

impl BuildStatus {
    pub const ALL: [BuildStatus; 7] = [
        BuildStatus::Create,
        BuildStatus::Queued,
        BuildStatus::Building,
        BuildStatus::Success,
        BuildStatus::Error,
        BuildStatus::Cancelling,
        BuildStatus::Cancelled,
    ];

    /// Success, Error and Cancelled end a build; everything else keeps
    /// the poll loop going
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            BuildStatus::Success | BuildStatus::Error | BuildStatus::Cancelled
        )
    }

    pub fn as_str(self) -> &'static str {
        match self {
            BuildStatus::Create => "Create",
            BuildStatus::Queued => "Queued",
            BuildStatus::Building => "Building",
            BuildStatus::Success => "Success",
            BuildStatus::Error => "Error",
            BuildStatus::Cancelling => "Cancelling",
            BuildStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for BuildStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Case-insensitive; surrounding whitespace is ignored
impl FromStr for BuildStatus {
    type Err = RecoError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim();
        BuildStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RecoError::parse("build status", format!("unknown value '{s}'")))
    }
}

// =============================================================================
// Imports
// =============================================================================

/// Which import endpoint a data file is sent to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ImportKind {
    Catalog,
    Usage,
}

impl fmt::Display for ImportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportKind::Catalog => f.write_str("catalog"),
            ImportKind::Usage => f.write_str("usage"),
        }
    }
}

/// Outcome of one file import
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImportReport {
    /// Base name of the imported file
    pub info: String,
    pub line_count: u64,
    pub error_count: u64,
}

impl ImportReport {
    /// Read `LineCount` / `ErrorCount` from an import response record.
    ///
    /// Children are matched by local name. A missing count stays 0, a
    /// non-numeric one is a parse error.
    pub fn from_record(info: impl Into<String>, record: &Element) -> Result<Self> {
        let mut report = ImportReport {
            info: info.into(),
            line_count: 0,
            error_count: 0,
        };

        for child in record.elements() {
            match child.local_name() {
                "LineCount" => report.line_count = parse_count("LineCount", &child.text())?,
                "ErrorCount" => report.error_count = parse_count("ErrorCount", &child.text())?,
                _ => {}
            }
        }

        Ok(report)
    }

    pub fn imported_lines(&self) -> u64 {
        self.line_count.saturating_sub(self.error_count)
    }
}

fn parse_count(field: &str, text: &str) -> Result<u64> {
    text.trim()
        .parse()
        .map_err(|e| RecoError::parse(format!("import report {field}"), format!("'{text}': {e}")))
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "successfully imported {}/{} lines for {}",
            self.imported_lines(),
            self.line_count,
            self.info
        )
    }
}

// =============================================================================
// Builds
// =============================================================================

/// Build parameters posted with every build request.
///
/// `Default` is the simple build the demo uses: no feature usage, cold
/// items allowed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename = "BuildParametersList", rename_all = "PascalCase")]
pub struct BuildParameters {
    pub number_of_model_iterations: u32,
    pub number_of_model_dimensions: u32,
    pub item_cut_off_lower_bound: u32,
    pub enable_modeling_insights: bool,
    pub use_features_in_model: bool,
    pub modeling_feature_list: String,
    pub allow_cold_item_placement: bool,
    pub enable_feature_correlation: bool,
    pub reasoning_feature_list: String,
}

impl Default for BuildParameters {
    fn default() -> Self {
        Self {
            number_of_model_iterations: 10,
            number_of_model_dimensions: 20,
            item_cut_off_lower_bound: 1,
            enable_modeling_insights: false,
            use_features_in_model: false,
            modeling_feature_list: String::new(),
            allow_cold_item_placement: true,
            enable_feature_correlation: false,
            reasoning_feature_list: String::new(),
        }
    }
}

impl BuildParameters {
    /// Render as the `<BuildParametersList>` request document
    pub fn to_xml(&self) -> Result<String> {
        quick_xml::se::to_string(self).map_err(|e| RecoError::Encode {
            context: "build parameters".to_string(),
            reason: e.to_string(),
        })
    }
}

// =============================================================================
// Catalog and recommendations
// =============================================================================

/// Item from the uploaded catalog, used to seed recommendation queries
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CatalogItem {
    pub id: String,
    pub name: String,
}

impl CatalogItem {
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl fmt::Display for CatalogItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Id: {}, Name: {}", self.id, self.name)
    }
}

/// Parses `ID:NAME`, e.g. `8:Wheel Tire Combo`
impl FromStr for CatalogItem {
    type Err = RecoError;

    fn from_str(s: &str) -> Result<Self> {
        let (id, name) = s
            .split_once(':')
            .ok_or_else(|| RecoError::parse("catalog item", format!("expected ID:NAME, got '{s}'")))?;
        let id = id.trim();
        if id.is_empty() {
            return Err(RecoError::parse("catalog item", format!("empty id in '{s}'")));
        }
        Ok(CatalogItem::new(id, name.trim()))
    }
}

/// One item returned by a recommendation query
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RecommendedItem {
    pub id: String,
    pub name: String,
    /// Service-defined scale, kept verbatim
    pub rating: String,
    pub reasoning: String,
}

/// Child local names are matched case-sensitively; anything else in the
/// record is ignored
impl FromRecord for RecommendedItem {
    fn from_record(record: &Element) -> Result<Self> {
        let mut item = RecommendedItem::default();
        for child in record.elements() {
            match child.local_name() {
                "Id" => item.id = child.text(),
                "Name" => item.name = child.text(),
                "Rating" => item.rating = child.text(),
                "Reasoning" => item.reasoning = child.text(),
                _ => {}
            }
        }
        Ok(item)
    }
}

impl fmt::Display for RecommendedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Name: {}, Id: {}, Rating: {}, Reasoning: {}",
            self.name, self.id, self.rating, self.reasoning
        )
    }
}
