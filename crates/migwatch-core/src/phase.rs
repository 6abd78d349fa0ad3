/// Phase shown when a VM reports none.
pub const UNKNOWN_PHASE: &str = "Unknown";

/// The one phase hidden unless completed VMs are requested. Matched exactly.
pub const COMPLETED_PHASE: &str = "Completed";

const SUCCEEDED_MARKERS: [&str; 2] = ["Completed", "Succeeded"];
const FAILED_MARKERS: [&str; 3] = ["Failed", "Error", "Canceled"];
const RUNNING_MARKERS: [&str; 6] = [
    "Running",
    "Copying",
    "Executing",
    "PostProcessing",
    "CopyDisks",
    "Precopy",
];

fn contains_any(phase: &str, markers: &[&str]) -> bool {
    markers.iter().any(|marker| phase.contains(marker))
}

/// Display bucket of an open-ended phase string. New controller phases fall
/// into `Unrecognized`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PhaseCategory {
    Succeeded,
    Failed,
    Running,
    Unrecognized,
}

impl PhaseCategory {
    pub fn of(phase: &str) -> Self {
        if contains_any(phase, &SUCCEEDED_MARKERS) {
            PhaseCategory::Succeeded
        } else if contains_any(phase, &FAILED_MARKERS) {
            PhaseCategory::Failed
        } else if contains_any(phase, &RUNNING_MARKERS) {
            PhaseCategory::Running
        } else {
            PhaseCategory::Unrecognized
        }
    }

    pub fn is_failure(self) -> bool {
        self == PhaseCategory::Failed
    }
}

/// Whether `phase` mentions a failure anywhere, independent of the display
/// bucket. `"CompletedWithErrors"` is a success to colour but still a failure.
pub fn reports_failure(phase: &str) -> bool {
    contains_any(phase, &FAILED_MARKERS)
}
