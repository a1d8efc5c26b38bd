//! Request path templates of the recommendations API.
//!
//! Every operation is `{Operation}?{params}&apiVersion='1.0'`, relative to
//! the service root. String parameters are single-quoted and
//! percent-encoded; numbers and booleans are written bare.

use std::fmt::Display;

use crate::types::ImportKind;

/// Root of the hosted service
pub const DEFAULT_ROOT_URI: &str = "https://api.datamarket.azure.com/amla/recommendations/v2/";

pub const API_VERSION: &str = "1.0";

/// Relative request target under construction
#[derive(Debug, Clone)]
pub(crate) struct Query {
    operation: &'static str,
    params: Vec<(&'static str, String)>,
}

impl Query {
    fn new(operation: &'static str) -> Self {
        Self {
            operation,
            params: Vec::new(),
        }
    }

    fn quoted(mut self, name: &'static str, value: &str) -> Self {
        self.params
            .push((name, format!("%27{}%27", urlencoding::encode(value))));
        self
    }

    fn bare(mut self, name: &'static str, value: impl Display) -> Self {
        self.params.push((name, value.to_string()));
        self
    }

    pub(crate) fn operation(&self) -> &'static str {
        self.operation
    }

    /// Render as `Operation?a=..&apiVersion=%271.0%27`
    pub(crate) fn to_relative(&self) -> String {
        let mut out = String::from(self.operation);
        out.push('?');
        for (name, value) in &self.params {
            out.push_str(name);
            out.push('=');
            out.push_str(value);
            out.push('&');
        }
        out.push_str("apiVersion=%27");
        out.push_str(&urlencoding::encode(API_VERSION));
        out.push_str("%27");
        out
    }
}

pub(crate) fn create_model(model_name: &str) -> Query {
    Query::new("CreateModel").quoted("modelName", model_name)
}

pub(crate) fn import_file(kind: ImportKind, model_id: &str, file_name: &str) -> Query {
    let operation = match kind {
        ImportKind::Catalog => "ImportCatalogFile",
        ImportKind::Usage => "ImportUsageFile",
    };
    Query::new(operation)
        .quoted("modelId", model_id)
        .quoted("filename", file_name)
}

pub(crate) fn build_model(model_id: &str, description: &str) -> Query {
    Query::new("BuildModel")
        .quoted("modelId", model_id)
        .quoted("userDescription", description)
}

pub(crate) fn build_statuses(model_id: &str, only_last_build: bool) -> Query {
    Query::new("GetModelBuildsStatus")
        .quoted("modelId", model_id)
        .bare("onlyLastBuild", only_last_build)
}

pub(crate) fn item_recommend(
    model_id: &str,
    item_ids: &str,
    number_of_results: u32,
    include_metadata: bool,
) -> Query {
    Query::new("ItemRecommend")
        .quoted("modelId", model_id)
        .quoted("itemIds", item_ids)
        .bare("numberOfResults", number_of_results)
        .bare("includeMetadata", include_metadata)
}

pub(crate) fn delete_model(model_id: &str) -> Query {
    Query::new("DeleteModel").quoted("id", model_id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_model_target() {
        assert_eq!(
            create_model("demomodel").to_relative(),
            "CreateModel?modelName=%27demomodel%27&apiVersion=%271.0%27"
        );
    }

    #[test]
    fn test_string_params_are_percent_encoded() {
        let target = build_model("m-1", "build of 20261019120000 'x'").to_relative();
        assert_eq!(
            target,
            "BuildModel?modelId=%27m-1%27&userDescription=%27build%20of%2020261019120000%20%27x%27%27&apiVersion=%271.0%27"
        );
    }

    #[test]
    fn test_recommend_target_has_bare_numbers_and_flags() {
        let target = item_recommend("m1", "1,8", 5, false).to_relative();
        assert_eq!(
            target,
            "ItemRecommend?modelId=%27m1%27&itemIds=%271%2C8%27&numberOfResults=5&includeMetadata=false&apiVersion=%271.0%27"
        );
    }

    #[test]
    fn test_import_operation_follows_kind() {
        assert_eq!(import_file(ImportKind::Catalog, "m", "c.txt").operation(), "ImportCatalogFile");
        assert_eq!(import_file(ImportKind::Usage, "m", "u.txt").operation(), "ImportUsageFile");
        assert_eq!(build_statuses("m", false).operation(), "GetModelBuildsStatus");
        assert_eq!(delete_model("m").to_relative(), "DeleteModel?id=%27m%27&apiVersion=%271.0%27");
    }
}
