use crate::model::{ResourceCollection, StorageTransfer};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const VM_NAME_LABEL: &str = "vmName";
pub const VENDOR_VM_NAME_LABEL: &str = "forklift.konveyor.io/vmName";
pub const VIRTUAL_MACHINE_KIND: &str = "VirtualMachine";

/// One way of tying a storage transfer to a VM. Rules are tried in list
/// order and the first hit wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchRule {
    /// `labels["vmName"]` equals the VM name.
    VmNameLabel,
    /// `labels["forklift.konveyor.io/vmName"]` equals the VM name.
    VendorVmNameLabel,
    /// An owner reference of kind `VirtualMachine` carries the VM name.
    OwnerReference,
    /// The transfer's own name contains the VM name. Can misattribute when one
    /// VM name is a substring of another's transfer name.
    NameContains,
}

impl MatchRule {
    pub const ALL: [MatchRule; 4] = [
        MatchRule::VmNameLabel,
        MatchRule::VendorVmNameLabel,
        MatchRule::OwnerReference,
        MatchRule::NameContains,
    ];

    pub fn matches(self, transfer: &StorageTransfer, vm_name: &str) -> bool {
        let meta = &transfer.metadata;
        match self {
            MatchRule::VmNameLabel => meta
                .labels
                .get(VM_NAME_LABEL)
                .is_some_and(|label| label == vm_name),
            MatchRule::VendorVmNameLabel => meta
                .labels
                .get(VENDOR_VM_NAME_LABEL)
                .is_some_and(|label| label == vm_name),
            MatchRule::OwnerReference => meta
                .owner_references
                .iter()
                .any(|owner| owner.kind == VIRTUAL_MACHINE_KIND && owner.name == vm_name),
            MatchRule::NameContains => !vm_name.is_empty() && meta.name.contains(vm_name),
        }
    }
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchRule::VmNameLabel => "vm-name-label",
            MatchRule::VendorVmNameLabel => "vendor-vm-name-label",
            MatchRule::OwnerReference => "owner-reference",
            MatchRule::NameContains => "name-contains",
        };
        f.write_str(name)
    }
}

/// An ordered set of [`MatchRule`]s. The default enables all four, exact
/// rules first and the substring rule last.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VolumeMatcher {
    rules: Vec<MatchRule>,
}

impl Default for VolumeMatcher {
    fn default() -> Self {
        Self::new(MatchRule::ALL.to_vec())
    }
}

impl VolumeMatcher {
    pub fn new(rules: Vec<MatchRule>) -> Self {
        Self { rules }
    }

    /// The first rule that ties `transfer` to `vm_name`.
    pub fn matching_rule(&self, transfer: &StorageTransfer, vm_name: &str) -> Option<MatchRule> {
        self.rules
            .iter()
            .copied()
            .find(|rule| rule.matches(transfer, vm_name))
    }

    pub fn matches(&self, transfer: &StorageTransfer, vm_name: &str) -> bool {
        self.matching_rule(transfer, vm_name).is_some()
    }

    /// Transfers in `target_namespace` that belong to `vm_name`. An empty
    /// namespace means the namespace is unknown and nothing matches.
    pub fn find_for_vm<'a>(
        &self,
        transfers: &'a ResourceCollection,
        target_namespace: &str,
        vm_name: &str,
    ) -> Vec<&'a StorageTransfer> {
        if target_namespace.is_empty() {
            return Vec::new();
        }
        transfers
            .storage_transfers()
            .filter(|transfer| transfer.metadata.namespace == target_namespace)
            .filter(|transfer| self.matches(transfer, vm_name))
            .collect()
    }
}

/// [`VolumeMatcher::matches`] with every rule enabled.
pub fn matches(transfer: &StorageTransfer, vm_name: &str) -> bool {
    MatchRule::ALL
        .iter()
        .any(|rule| rule.matches(transfer, vm_name))
}

/// [`VolumeMatcher::find_for_vm`] with every rule enabled.
pub fn find_for_vm<'a>(
    transfers: &'a ResourceCollection,
    target_namespace: &str,
    vm_name: &str,
) -> Vec<&'a StorageTransfer> {
    VolumeMatcher::default().find_for_vm(transfers, target_namespace, vm_name)
}
