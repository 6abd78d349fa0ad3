use crate::model::{Migration, ResourceCollection};
use std::collections::btree_map::{BTreeMap, Entry};

/// The current migration of every plan, ordered by plan name.
///
/// Migrations without a plan reference are ignored. A non-empty `plan_filter`
/// restricts the result to those plans. Within a plan the greatest
/// `creationTimestamp` string wins; on equal timestamps the later record in
/// input order wins.
pub fn select_latest_per_plan<'a>(
    resources: &'a ResourceCollection,
    plan_filter: &[String],
) -> Vec<&'a Migration> {
    let mut latest: BTreeMap<&'a str, &'a Migration> = BTreeMap::new();

    for migration in resources.migrations() {
        let Some(plan) = migration.plan_name() else {
            continue;
        };
        if !plan_filter.is_empty() && !plan_filter.iter().any(|wanted| wanted == plan) {
            continue;
        }

        match latest.entry(plan) {
            Entry::Vacant(slot) => {
                slot.insert(migration);
            }
            Entry::Occupied(mut slot) => {
                if migration.creation_timestamp() >= slot.get().creation_timestamp() {
                    slot.insert(migration);
                }
            }
        }
    }

    latest.into_values().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn migration(name: &str, plan: Option<&str>, created: &str) -> Value {
        let spec = match plan {
            Some(plan) => json!({"plan": {"name": plan}}),
            None => json!({}),
        };
        json!({
            "kind": "Migration",
            "metadata": {"name": name, "creationTimestamp": created},
            "spec": spec
        })
    }

    fn collection(items: Vec<Value>) -> ResourceCollection {
        serde_json::from_value(json!({ "items": items })).unwrap()
    }

    fn names(selected: &[&Migration]) -> Vec<String> {
        selected.iter().map(|m| m.name().to_string()).collect()
    }

    #[test]
    fn test_latest_wins_per_plan() {
        let resources = collection(vec![
            migration("b-old", Some("beta"), "2025-01-01T00:00:00Z"),
            migration("a-new", Some("alpha"), "2025-03-01T00:00:00Z"),
            migration("b-new", Some("beta"), "2025-02-01T00:00:00Z"),
            migration("a-old", Some("alpha"), "2025-01-15T00:00:00Z"),
        ]);

        let selected = select_latest_per_plan(&resources, &[]);
        assert_eq!(names(&selected), vec!["a-new", "b-new"]);
    }

    #[test]
    fn test_equal_timestamps_prefer_later_input() {
        let resources = collection(vec![
            migration("first", Some("p"), "2025-01-01T00:00:00Z"),
            migration("second", Some("p"), "2025-01-01T00:00:00Z"),
        ]);

        let selected = select_latest_per_plan(&resources, &[]);
        assert_eq!(names(&selected), vec!["second"]);
    }

    #[test]
    fn test_filter_and_missing_plan() {
        let resources = collection(vec![
            migration("orphan", None, "2025-05-01T00:00:00Z"),
            migration("keep", Some("wanted"), "2025-01-01T00:00:00Z"),
            migration("drop", Some("other"), "2025-01-01T00:00:00Z"),
        ]);

        let filter = vec!["wanted".to_string(), "absent".to_string()];
        let selected = select_latest_per_plan(&resources, &filter);
        assert_eq!(names(&selected), vec!["keep"]);

        let unfiltered = select_latest_per_plan(&resources, &[]);
        assert_eq!(names(&unfiltered), vec!["drop", "keep"]);
    }

    #[test]
    fn test_missing_timestamp_loses() {
        let resources = collection(vec![
            migration("dated", Some("p"), "2025-01-01T00:00:00Z"),
            json!({"kind": "Migration", "metadata": {"name": "undated"}, "spec": {"plan": {"name": "p"}}}),
        ]);

        let selected = select_latest_per_plan(&resources, &[]);
        assert_eq!(names(&selected), vec!["dated"]);
    }
}
