use crate::model::ResourceCollection;
use ahash::AHashMap;

/// Plan name -> target namespace, for plans that declare a non-empty one.
pub fn index_target_namespace(resources: &ResourceCollection) -> AHashMap<&str, &str> {
    resources
        .plans()
        .filter(|plan| !plan.metadata.name.is_empty())
        .filter_map(|plan| {
            let namespace = plan.spec.target_namespace.as_deref()?;
            (!namespace.is_empty()).then_some((plan.metadata.name.as_str(), namespace))
        })
        .collect()
}

/// Plan name -> warm transfer flag. An absent flag means cold.
pub fn index_warm_mode(resources: &ResourceCollection) -> AHashMap<&str, bool> {
    resources
        .plans()
        .filter(|plan| !plan.metadata.name.is_empty())
        .map(|plan| (plan.metadata.name.as_str(), plan.spec.warm.unwrap_or(false)))
        .collect()
}

/// Both plan lookups, built once per snapshot.
#[derive(Debug, Default)]
pub struct PlanIndex<'a> {
    target_namespaces: AHashMap<&'a str, &'a str>,
    warm_modes: AHashMap<&'a str, bool>,
}

impl<'a> PlanIndex<'a> {
    pub fn build(resources: &'a ResourceCollection) -> Self {
        Self {
            target_namespaces: index_target_namespace(resources),
            warm_modes: index_warm_mode(resources),
        }
    }

    pub fn target_namespace(&self, plan: &str) -> Option<&'a str> {
        self.target_namespaces.get(plan).copied()
    }

    pub fn is_warm(&self, plan: &str) -> bool {
        self.warm_modes.get(plan).copied().unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.warm_modes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.warm_modes.is_empty()
    }
}
