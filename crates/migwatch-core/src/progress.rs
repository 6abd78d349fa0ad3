use crate::capacity::{format_bytes, parse_capacity};
use crate::model::{ResourceCollection, StageProgress, VmStatus};
use crate::volume::VolumeMatcher;
use std::fmt;

/// Best available progress for one VM.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProgressEstimate {
    Unavailable,
    /// Storage transfers reported percentages but no usable capacity.
    PercentOnly { percent: f64 },
    /// Storage transfers with capacities; bytes are capacity-weighted.
    PercentWithBytes {
        percent: f64,
        copied_bytes: f64,
        total_bytes: f64,
    },
    /// Byte counters from the migration pipeline.
    BytesOnly { copied_bytes: u64, total_bytes: u64 },
}

/// Where an estimate came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgressSource {
    StorageTransfer,
    Pipeline,
}

impl fmt::Display for ProgressSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProgressSource::StorageTransfer => f.write_str("storage"),
            ProgressSource::Pipeline => f.write_str("pipeline"),
        }
    }
}

impl ProgressEstimate {
    pub fn is_available(&self) -> bool {
        !matches!(self, ProgressEstimate::Unavailable)
    }

    pub fn source(&self) -> Option<ProgressSource> {
        match self {
            ProgressEstimate::Unavailable => None,
            ProgressEstimate::BytesOnly { .. } => Some(ProgressSource::Pipeline),
            _ => Some(ProgressSource::StorageTransfer),
        }
    }

    /// Reported percentage, or copied/total for pipeline counters.
    pub fn percent(&self) -> Option<f64> {
        match *self {
            ProgressEstimate::Unavailable => None,
            ProgressEstimate::PercentOnly { percent }
            | ProgressEstimate::PercentWithBytes { percent, .. } => Some(percent),
            ProgressEstimate::BytesOnly {
                copied_bytes,
                total_bytes,
            } => Some(copied_bytes as f64 / total_bytes as f64 * 100.0),
        }
    }

    pub fn bytes(&self) -> Option<(f64, f64)> {
        match *self {
            ProgressEstimate::PercentWithBytes {
                copied_bytes,
                total_bytes,
                ..
            } => Some((copied_bytes, total_bytes)),
            ProgressEstimate::BytesOnly {
                copied_bytes,
                total_bytes,
            } => Some((copied_bytes as f64, total_bytes as f64)),
            _ => None,
        }
    }
}

impl fmt::Display for ProgressEstimate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            ProgressEstimate::Unavailable => f.write_str("n/a"),
            ProgressEstimate::PercentOnly { percent } => write!(f, "{:.0}%", percent),
            ProgressEstimate::PercentWithBytes {
                percent,
                copied_bytes,
                total_bytes,
            } => write!(
                f,
                "{:.0}% {}/{}",
                percent,
                format_bytes(copied_bytes),
                format_bytes(total_bytes)
            ),
            ProgressEstimate::BytesOnly {
                copied_bytes,
                total_bytes,
            } => write!(
                f,
                "{}/{}",
                format_bytes(copied_bytes as f64),
                format_bytes(total_bytes as f64)
            ),
        }
    }
}

/// `(copied, total)` of the first pipeline stage with usable byte counters.
/// Later stages are not consulted once one qualifies.
pub fn pipeline_progress(vm: &VmStatus) -> Option<(u64, u64)> {
    vm.pipeline
        .iter()
        .find_map(|stage| stage.progress.as_ref().and_then(StageProgress::usable))
}

/// Parse a `"37%"` style string. Unreadable values are absent, not zero.
pub fn parse_percent(raw: &str) -> Option<f64> {
    raw.trim()
        .trim_end_matches('%')
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|percent| percent.is_finite())
}

/// Progress resolution with a configurable volume matcher.
#[derive(Debug, Clone, Default)]
pub struct ProgressResolver {
    matcher: VolumeMatcher,
}

impl ProgressResolver {
    pub fn new(matcher: VolumeMatcher) -> Self {
        Self { matcher }
    }

    /// Aggregate the storage transfers that belong to `vm_name`.
    ///
    /// The percentage is the plain mean of every readable report. Bytes are
    /// summed only over transfers with a known capacity.
    pub fn transfer_progress(
        &self,
        transfers: &ResourceCollection,
        target_namespace: &str,
        vm_name: &str,
    ) -> ProgressEstimate {
        let candidates = self.matcher.find_for_vm(transfers, target_namespace, vm_name);
        if candidates.is_empty() {
            return ProgressEstimate::Unavailable;
        }

        let mut reported: Vec<f64> = Vec::with_capacity(candidates.len());
        let mut copied_bytes = 0.0;
        let mut total_bytes = 0.0;

        for transfer in candidates {
            let Some(percent) = transfer.status.progress.as_deref().and_then(parse_percent) else {
                continue;
            };
            reported.push(percent);

            let capacity = transfer.requested_capacity().map_or(0.0, parse_capacity);
            if capacity > 0.0 {
                total_bytes += capacity;
                copied_bytes += capacity * (percent / 100.0);
            }
        }

        if reported.is_empty() {
            return ProgressEstimate::Unavailable;
        }

        let percent = reported.iter().sum::<f64>() / reported.len() as f64;
        if total_bytes > 0.0 {
            ProgressEstimate::PercentWithBytes {
                percent,
                copied_bytes,
                total_bytes,
            }
        } else {
            ProgressEstimate::PercentOnly { percent }
        }
    }

    /// Storage-transfer progress when there is any, pipeline bytes otherwise.
    pub fn resolve(
        &self,
        vm: &VmStatus,
        transfers: &ResourceCollection,
        target_namespace: &str,
    ) -> ProgressEstimate {
        match self.transfer_progress(transfers, target_namespace, &vm.name) {
            ProgressEstimate::Unavailable => match pipeline_progress(vm) {
                Some((copied_bytes, total_bytes)) => ProgressEstimate::BytesOnly {
                    copied_bytes,
                    total_bytes,
                },
                None => ProgressEstimate::Unavailable,
            },
            estimate => estimate,
        }
    }
}

/// [`ProgressResolver::transfer_progress`] with every match rule enabled.
pub fn transfer_progress(
    transfers: &ResourceCollection,
    target_namespace: &str,
    vm_name: &str,
) -> ProgressEstimate {
    ProgressResolver::default().transfer_progress(transfers, target_namespace, vm_name)
}

/// [`ProgressResolver::resolve`] with every match rule enabled.
pub fn resolve(
    vm: &VmStatus,
    transfers: &ResourceCollection,
    target_namespace: &str,
) -> ProgressEstimate {
    ProgressResolver::default().resolve(vm, transfers, target_namespace)
}
