use migwatch_core::model::{ResourceCollection, VmStatus};
use migwatch_core::progress::{self, ProgressEstimate, ProgressResolver};
use migwatch_core::volume::{MatchRule, VolumeMatcher};
use serde_json::{json, Value};

const GI: f64 = 1024.0 * 1024.0 * 1024.0;

fn data_volume(
    name: &str,
    namespace: &str,
    vm: Option<&str>,
    progress: Option<&str>,
    storage: Option<Value>,
) -> Value {
    let mut dv = json!({
        "kind": "DataVolume",
        "metadata": {"name": name, "namespace": namespace, "labels": {}},
        "spec": {},
        "status": {}
    });
    if let Some(vm) = vm {
        dv["metadata"]["labels"]["vmName"] = json!(vm);
    }
    if let Some(progress) = progress {
        dv["status"]["progress"] = json!(progress);
    }
    if let Some(storage) = storage {
        dv["spec"]["storage"] = json!({"resources": {"requests": {"storage": storage}}});
    }
    dv
}

fn transfers(items: Vec<Value>) -> ResourceCollection {
    serde_json::from_value(json!({ "items": items })).unwrap()
}

fn vm(name: &str, pipeline: Value) -> VmStatus {
    serde_json::from_value(json!({"name": name, "phase": "CopyDisks", "pipeline": pipeline})).unwrap()
}

#[test]
fn test_weighted_bytes_with_plain_mean_percent() {
    let dvs = transfers(vec![
        data_volume("d1", "prod", Some("web01"), Some("50%"), Some(json!("10Gi"))),
        data_volume("d2", "prod", Some("web01"), Some("25%"), Some(json!("20Gi"))),
    ]);

    let estimate = progress::transfer_progress(&dvs, "prod", "web01");
    assert_eq!(
        estimate,
        ProgressEstimate::PercentWithBytes {
            percent: 37.5,
            copied_bytes: 10.0 * GI * 0.5 + 20.0 * GI * 0.25,
            total_bytes: 30.0 * GI,
        }
    );
}

#[test]
fn test_percent_only_when_capacity_unknown() {
    let dvs = transfers(vec![
        data_volume("d1", "prod", Some("web01"), Some("40%"), None),
        data_volume("d2", "prod", Some("web01"), Some("60%"), Some(json!("garbage"))),
    ]);

    let estimate = progress::transfer_progress(&dvs, "prod", "web01");
    assert_eq!(estimate, ProgressEstimate::PercentOnly { percent: 50.0 });
}

#[test]
fn test_unreadable_percent_does_not_count_as_zero() {
    let dvs = transfers(vec![
        data_volume("d1", "prod", Some("web01"), Some("80%"), Some(json!("1Gi"))),
        data_volume("d2", "prod", Some("web01"), Some("N/A"), Some(json!("1Gi"))),
        data_volume("d3", "prod", Some("web01"), None, Some(json!("1Gi"))),
    ]);

    let estimate = progress::transfer_progress(&dvs, "prod", "web01");
    assert_eq!(
        estimate,
        ProgressEstimate::PercentWithBytes {
            percent: 80.0,
            copied_bytes: GI * 0.8,
            total_bytes: GI,
        }
    );
}

#[test]
fn test_mixed_capacity_keeps_all_percents_in_mean() {
    let dvs = transfers(vec![
        data_volume("d1", "prod", Some("web01"), Some("100%"), Some(json!(1000))),
        data_volume("d2", "prod", Some("web01"), Some("0%"), None),
    ]);

    let estimate = progress::transfer_progress(&dvs, "prod", "web01");
    assert_eq!(
        estimate,
        ProgressEstimate::PercentWithBytes {
            percent: 50.0,
            copied_bytes: 1000.0,
            total_bytes: 1000.0,
        }
    );
}

#[test]
fn test_pvc_capacity_path_is_used() {
    let mut dv = data_volume("d1", "prod", Some("web01"), Some("10%"), None);
    dv["spec"]["pvc"] = json!({"resources": {"requests": {"storage": "100GB"}}});

    let estimate = progress::transfer_progress(&transfers(vec![dv]), "prod", "web01");
    assert_eq!(estimate.bytes(), Some((10e9, 100e9)));
}

#[test]
fn test_resolve_falls_back_to_pipeline_bytes() {
    let vm = vm(
        "web01",
        json!([{"name": "DiskTransfer", "progress": {"totalBytes": 1000, "copiedBytes": 500}}]),
    );

    let estimate = progress::resolve(&vm, &transfers(vec![]), "prod");
    assert_eq!(
        estimate,
        ProgressEstimate::BytesOnly {
            copied_bytes: 500,
            total_bytes: 1000,
        }
    );
}

#[test]
fn test_resolve_prefers_storage_transfer() {
    let vm = vm(
        "web01",
        json!([{"name": "DiskTransfer", "progress": {"totalBytes": 1000, "copiedBytes": 500}}]),
    );
    let dvs = transfers(vec![data_volume("d1", "prod", Some("web01"), Some("20%"), None)]);

    let estimate = progress::resolve(&vm, &dvs, "prod");
    assert_eq!(estimate, ProgressEstimate::PercentOnly { percent: 20.0 });
}

#[test]
fn test_resolve_unavailable_when_nothing_is_usable() {
    let vm = vm("web01", json!([{"name": "DiskTransfer", "progress": {"totalBytes": 0}}]));
    let dvs = transfers(vec![data_volume("d1", "prod", Some("web01"), Some("pending"), None)]);

    assert_eq!(progress::resolve(&vm, &dvs, "prod"), ProgressEstimate::Unavailable);
}

#[test]
fn test_transfers_in_other_namespace_are_ignored() {
    let dvs = transfers(vec![data_volume("d1", "staging", Some("web01"), Some("20%"), None)]);

    assert_eq!(
        progress::transfer_progress(&dvs, "prod", "web01"),
        ProgressEstimate::Unavailable
    );
    assert_eq!(
        progress::transfer_progress(&dvs, "", "web01"),
        ProgressEstimate::Unavailable
    );
}

#[test]
fn test_resolver_honours_configured_rules() {
    let dvs = transfers(vec![data_volume("web01-disk0", "prod", None, Some("70%"), None)]);
    let vm = vm("web01", json!([]));

    let exact_only = ProgressResolver::new(VolumeMatcher::new(vec![MatchRule::VmNameLabel]));
    assert_eq!(exact_only.resolve(&vm, &dvs, "prod"), ProgressEstimate::Unavailable);
    assert_eq!(
        ProgressResolver::default().resolve(&vm, &dvs, "prod"),
        ProgressEstimate::PercentOnly { percent: 70.0 }
    );
}
