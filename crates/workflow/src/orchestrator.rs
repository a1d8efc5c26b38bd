//! # Workflow Orchestrator
//!
//! Runs the fixed demonstration sequence against the service:
//! 1. Create a model container
//! 2. Import the catalog file, then the usage file
//! 3. Trigger a build
//! 4. Poll the build status until it ends
//! 5. Wait for the built model to propagate
//! 6. Query recommendations for each seed item, then for all of them
//! 7. Delete the model container
//!
//! The sequence is linear: the first failing step aborts the run and
//! nothing created so far is cleaned up. Progress is reported through
//! [`WorkflowEvent`]s so the caller decides how to present it.

use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use reco_client::{
    BuildId, BuildStatus, CatalogItem, ImportKind, ImportReport, ModelId, RecommendationClient,
    RecommendedItem,
};
use tracing::{info, warn};

use crate::config::WorkflowConfig;
use crate::error::Result;
use crate::monitor::{Sleeper, TokioSleeper};

/// Progress notifications emitted while the workflow runs
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    CreatingModel {
        name: String,
    },
    ModelCreated {
        name: String,
        model_id: ModelId,
    },
    ImportingData,
    FileImported(ImportReport),
    BuildTriggered {
        model_id: ModelId,
        build_id: BuildId,
    },
    /// `next_check` is the wait before the next poll, `None` once polling
    /// stopped
    BuildStatusChecked {
        status: BuildStatus,
        next_check: Option<Duration>,
    },
    BuildFinished {
        build_id: BuildId,
        status: BuildStatus,
    },
    WaitingForPropagation(Duration),
    Recommendations {
        seeds: Vec<CatalogItem>,
        items: Vec<RecommendedItem>,
    },
    ModelDeleted {
        name: String,
        model_id: ModelId,
    },
}

/// What a completed run produced
#[derive(Debug, Clone, PartialEq)]
pub struct WorkflowSummary {
    pub model_id: ModelId,
    pub build_id: BuildId,
    pub build_status: BuildStatus,
    pub imports: Vec<ImportReport>,
    /// Seed items of each query with the items returned, in query order
    pub recommendations: Vec<(Vec<CatalogItem>, Vec<RecommendedItem>)>,
}

/// `build of yyyyMMddHHmmss`, in UTC
pub fn build_description(now: DateTime<Utc>) -> String {
    format!("build of {}", now.format("%Y%m%d%H%M%S"))
}

/// Sequences the demo against one [`RecommendationClient`]
#[derive(Debug, Clone)]
pub struct WorkflowOrchestrator<Z = TokioSleeper> {
    config: WorkflowConfig,
    sleeper: Z,
}

impl WorkflowOrchestrator<TokioSleeper> {
    pub fn new(config: WorkflowConfig) -> Self {
        Self::with_sleeper(config, TokioSleeper)
    }
}

impl<Z: Sleeper> WorkflowOrchestrator<Z> {
    /// Use a custom sleeper for the poll interval and the settle delay
    pub fn with_sleeper(config: WorkflowConfig, sleeper: Z) -> Self {
        Self { config, sleeper }
    }

    pub fn config(&self) -> &WorkflowConfig {
        &self.config
    }

    pub fn sleeper(&self) -> &Z {
        &self.sleeper
    }

    /// Run the whole sequence, reporting progress to `on_event`
    pub async fn run<F>(&self, client: &RecommendationClient, mut on_event: F) -> Result<WorkflowSummary>
    where
        F: FnMut(WorkflowEvent),
    {
        let start_time = Instant::now();
        let name = self.config.model_name.clone();

        // Create the model container
        on_event(WorkflowEvent::CreatingModel { name: name.clone() });
        let model_id = client.create_model(&name).await?;
        on_event(WorkflowEvent::ModelCreated {
            name: name.clone(),
            model_id: model_id.clone(),
        });

        // Import catalog and usage data
        on_event(WorkflowEvent::ImportingData);
        let mut imports = Vec::with_capacity(2);
        for (path, kind) in [
            (self.config.catalog_path(), ImportKind::Catalog),
            (self.config.usage_path(), ImportKind::Usage),
        ] {
            let report = client.import_file(&model_id, &path, kind).await?;
            on_event(WorkflowEvent::FileImported(report.clone()));
            imports.push(report);
        }

        // Trigger a build
        let description = build_description(Utc::now());
        let build_id = client.build_model(&model_id, &description).await?;
        on_event(WorkflowEvent::BuildTriggered {
            model_id: model_id.clone(),
            build_id: build_id.clone(),
        });

        // Monitor the build
        let build_status = self
            .config
            .monitor()
            .wait_for_completion(client, &self.sleeper, &model_id, &build_id, |status, next_check| {
                on_event(WorkflowEvent::BuildStatusChecked { status, next_check })
            })
            .await?;
        on_event(WorkflowEvent::BuildFinished {
            build_id: build_id.clone(),
            status: build_status,
        });
        if build_status != BuildStatus::Success {
            warn!("build {} ended with status {}; continuing", build_id, build_status);
        }

        // Let the built model propagate
        on_event(WorkflowEvent::WaitingForPropagation(self.config.settle_delay));
        self.sleeper.sleep(self.config.settle_delay).await;

        // Single-item queries, then one query for the whole set
        let mut recommendations = Vec::new();
        let seeds = &self.config.seed_items;
        if !seeds.is_empty() {
            let mut queries: Vec<Vec<CatalogItem>> =
                seeds.iter().map(|seed| vec![seed.clone()]).collect();
            queries.push(seeds.clone());

            for query in queries {
                let item_ids: Vec<&str> = query.iter().map(|seed| seed.id.as_str()).collect();
                let items = client
                    .get_recommendation(&model_id, &item_ids, self.config.results_per_query)
                    .await?;
                on_event(WorkflowEvent::Recommendations {
                    seeds: query.clone(),
                    items: items.clone(),
                });
                recommendations.push((query, items));
            }
        }

        // Delete the model container
        client.delete_model(&model_id).await?;
        on_event(WorkflowEvent::ModelDeleted {
            name,
            model_id: model_id.clone(),
        });

        info!(
            "workflow for model {} finished in {:.2?}",
            model_id,
            start_time.elapsed()
        );

        Ok(WorkflowSummary {
            model_id,
            build_id,
            build_status,
            imports,
            recommendations,
        })
    }
}
