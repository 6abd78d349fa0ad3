use crate::config::WatchConfig;
use crate::model::{Condition, HookStatus, Migration, PipelineStage, ResourceCollection, VmStatus};
use crate::phase::{self, PhaseCategory, COMPLETED_PHASE, UNKNOWN_PHASE};
use crate::plan_index::PlanIndex;
use crate::progress::{ProgressEstimate, ProgressResolver};
use crate::selector::select_latest_per_plan;
use crate::volume::VolumeMatcher;
use rayon::prelude::*;
use tracing::{debug, trace};

/// Inputs to [`build_dashboard`] that come from configuration rather than
/// from the snapshot.
#[derive(Debug, Clone, Default)]
pub struct DashboardOptions {
    pub plan_filter: Vec<String>,
    pub matcher: VolumeMatcher,
}

impl From<&WatchConfig> for DashboardOptions {
    fn from(config: &WatchConfig) -> Self {
        Self {
            plan_filter: config.plans.clone(),
            matcher: VolumeMatcher::new(config.match_rules.clone()),
        }
    }
}

/// The current migration of one plan with every VM resolved.
#[derive(Debug, Clone)]
pub struct MigrationView<'a> {
    pub migration: &'a Migration,
    pub plan: &'a str,
    /// Empty when neither the plan nor the migration names one.
    pub target_namespace: &'a str,
    pub warm: bool,
    /// In the order of the migration's status.
    pub vms: Vec<VmView<'a>>,
}

impl<'a> MigrationView<'a> {
    pub fn name(&self) -> &'a str {
        self.migration.name()
    }

    pub fn creation_timestamp(&self) -> &'a str {
        self.migration.creation_timestamp()
    }

    pub fn conditions(&self) -> &'a [Condition] {
        &self.migration.status.conditions
    }
}

#[derive(Debug, Clone)]
pub struct VmView<'a> {
    pub name: &'a str,
    pub phase: &'a str,
    pub progress: ProgressEstimate,
    pub pipeline: &'a [PipelineStage],
    pub error: Option<&'a str>,
    pub status: &'a VmStatus,
}

impl<'a> VmView<'a> {
    fn resolve(
        status: &'a VmStatus,
        resolver: &ProgressResolver,
        transfers: &ResourceCollection,
        target_namespace: &str,
    ) -> Self {
        let progress = resolver.resolve(status, transfers, target_namespace);
        trace!("{}: {:?}", status.name, progress);
        Self {
            name: &status.name,
            phase: status
                .phase
                .as_deref()
                .filter(|phase| !phase.is_empty())
                .unwrap_or(UNKNOWN_PHASE),
            progress,
            pipeline: &status.pipeline,
            error: status.error_message(),
            status,
        }
    }

    pub fn phase_category(&self) -> PhaseCategory {
        PhaseCategory::of(self.phase)
    }

    /// Exactly `"Completed"`; `"CompletedWithWarnings"` does not count.
    pub fn is_completed(&self) -> bool {
        self.phase == COMPLETED_PHASE
    }

    /// An error message, or a failure marker anywhere in the phase.
    pub fn has_failure(&self) -> bool {
        self.error.is_some() || phase::reports_failure(self.phase)
    }

    pub fn conditions(&self) -> &'a [Condition] {
        &self.status.conditions
    }

    pub fn hooks(&self) -> &'a [HookStatus] {
        &self.status.hooks
    }
}

/// Select the current migration per plan and resolve progress for every VM.
///
/// `resources` holds migrations and plans; `transfers` holds the storage
/// transfers of all namespaces. Output is ordered by plan name.
pub fn build_dashboard<'a>(
    resources: &'a ResourceCollection,
    transfers: &ResourceCollection,
    options: &DashboardOptions,
) -> Vec<MigrationView<'a>> {
    let plans = PlanIndex::build(resources);
    let resolver = ProgressResolver::new(options.matcher.clone());
    let migrations = select_latest_per_plan(resources, &options.plan_filter);
    debug!(
        "{} plans indexed, {} current migrations selected",
        plans.len(),
        migrations.len()
    );

    migrations
        .into_iter()
        .filter_map(|migration| {
            let plan = migration.plan_name()?;
            let target_namespace = plans
                .target_namespace(plan)
                .or_else(|| {
                    migration
                        .spec
                        .target_namespace
                        .as_deref()
                        .filter(|ns| !ns.is_empty())
                })
                .unwrap_or("");

            let vms: Vec<VmView<'a>> = migration
                .status
                .vms
                .par_iter()
                .map(|vm| VmView::resolve(vm, &resolver, transfers, target_namespace))
                .collect();
            debug!(
                "{} ({}): {} VMs in namespace '{}'",
                plan,
                migration.name(),
                vms.len(),
                target_namespace
            );

            Some(MigrationView {
                migration,
                plan,
                target_namespace,
                warm: plans.is_warm(plan),
                vms,
            })
        })
        .collect()
}
