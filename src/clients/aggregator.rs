use chrono::Utc;
use futures_util::future::join_all;
use serde::Deserialize;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::collectors::{
    self, Collector, ConfigMapCollector, IngressCollector, NodeCollector, PodCollector,
    SecretCollector, ServiceCollector,
};
use crate::error::{CollectionError, OverviewError};
use crate::models::overview::{NamespaceSet, Overview, ResourceKind};
use crate::models::views::{
    ConfigMapSummary, IngressSummary, NodeSummary, PodSummary, SecretSummary, ServiceSummary,
};

use super::ClusterApi;

/// What to do when some collectors fail and others succeed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    /// Any failure discards the whole snapshot and returns the first error.
    Strict,
    /// Return what was collected; failed kinds are absent and listed in `errors`.
    #[default]
    Partial,
}

/// Fan-in target. Each collector task writes its own field once.
#[derive(Default)]
struct Accumulator {
    nodes: Option<NodeSummary>,
    pods: Option<PodSummary>,
    services: Option<ServiceSummary>,
    ingress: Option<IngressSummary>,
    secrets: Option<SecretSummary>,
    config_maps: Option<ConfigMapSummary>,
    errors: Vec<CollectionError>,
}

type Shared = Arc<Mutex<Accumulator>>;

pub struct Aggregator {
    policy: FailurePolicy,
    timeout: Option<Duration>,
}

impl Aggregator {
    pub fn new(policy: FailurePolicy, timeout: Option<Duration>) -> Self {
        Self { policy, timeout }
    }

    /// Collect a full snapshot and apply the failure policy.
    pub async fn aggregate(&self, client: Arc<dyn ClusterApi>) -> Result<Overview, OverviewError> {
        let overview = self.collect(client).await?;

        if self.policy == FailurePolicy::Strict {
            if let Some(first) = overview.errors.first() {
                warn!(
                    failed = overview.errors.len(),
                    "discarding overview: {}", first
                );
                return Err(OverviewError::CollectionFailed(first.clone()));
            }
        }
        Ok(overview)
    }

    /// Enumerate namespaces, then run every collector concurrently and wait
    /// for all of them. Errors come back ordered by resource kind.
    pub async fn collect(&self, client: Arc<dyn ClusterApi>) -> Result<Overview, OverviewError> {
        let started = Utc::now();
        let (namespace_set, namespaces) = collectors::namespaces::enumerate(client.as_ref()).await?;
        let namespace_set = Arc::new(namespace_set);
        let shared: Shared = Arc::new(Mutex::new(Accumulator::default()));

        let handles = vec![
            spawn(NodeCollector, &client, &namespace_set, &shared, |a, s| a.nodes = Some(s)),
            spawn(PodCollector, &client, &namespace_set, &shared, |a, s| a.pods = Some(s)),
            spawn(ServiceCollector, &client, &namespace_set, &shared, |a, s| {
                a.services = Some(s)
            }),
            spawn(IngressCollector, &client, &namespace_set, &shared, |a, s| {
                a.ingress = Some(s)
            }),
            spawn(SecretCollector, &client, &namespace_set, &shared, |a, s| {
                a.secrets = Some(s)
            }),
            spawn(ConfigMapCollector, &client, &namespace_set, &shared, |a, s| {
                a.config_maps = Some(s)
            }),
        ];

        let aborts: Vec<_> = handles.iter().map(|(_, h)| h.abort_handle()).collect();
        let kinds: Vec<ResourceKind> = handles.iter().map(|(k, _)| *k).collect();
        let joined = join_all(handles.into_iter().map(|(_, h)| h));

        let results = match self.timeout {
            Some(limit) => match tokio::time::timeout(limit, joined).await {
                Ok(results) => results,
                Err(_) => {
                    for abort in &aborts {
                        abort.abort();
                    }
                    warn!("aggregation timed out after {:?}", limit);
                    return Err(OverviewError::TimedOut(limit));
                }
            },
            None => joined.await,
        };

        let mut acc = std::mem::take(&mut *lock(&shared));
        for (kind, result) in kinds.into_iter().zip(results) {
            if let Err(e) = result {
                acc.errors.push(CollectionError::new(
                    kind,
                    None,
                    format!("collector task failed: {}", e),
                ));
            }
        }
        // Completion order is arbitrary; report failures in kind order.
        acc.errors.sort_by_key(|e| e.kind);

        let elapsed = Utc::now() - started;
        info!(
            namespaces = namespace_set.len(),
            errors = acc.errors.len(),
            elapsed_ms = elapsed.num_milliseconds(),
            "overview collected"
        );

        Ok(Overview {
            namespaces,
            nodes: acc.nodes,
            pods: acc.pods,
            services: acc.services,
            ingress: acc.ingress,
            secrets: acc.secrets,
            config_maps: acc.config_maps,
            errors: acc.errors,
            collected_at: started,
        })
    }
}

fn lock(shared: &Shared) -> std::sync::MutexGuard<'_, Accumulator> {
    shared.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Run one collector on its own task. The lock is taken only to store the
/// outcome, never across the list calls.
fn spawn<C: Collector>(
    collector: C,
    client: &Arc<dyn ClusterApi>,
    namespaces: &Arc<NamespaceSet>,
    shared: &Shared,
    install: fn(&mut Accumulator, C::Summary),
) -> (ResourceKind, JoinHandle<()>) {
    let client = client.clone();
    let namespaces = namespaces.clone();
    let shared = shared.clone();

    let handle = tokio::spawn(async move {
        let outcome = collector.collect(client.as_ref(), &namespaces).await;
        let mut acc = lock(&shared);
        match outcome {
            Ok(summary) => install(&mut acc, summary),
            Err(e) => {
                warn!("{}", e);
                acc.errors.push(e);
            }
        }
    });

    (C::KIND, handle)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clients::fixture::FakeCluster;

    fn strict() -> Aggregator {
        Aggregator::new(FailurePolicy::Strict, None)
    }

    fn partial() -> Aggregator {
        Aggregator::new(FailurePolicy::Partial, None)
    }

    #[tokio::test]
    async fn two_namespace_scenario() {
        let client: Arc<dyn ClusterApi> = Arc::new(FakeCluster::two_namespaces());
        let ov = strict().aggregate(client).await.unwrap();

        let nodes = ov.nodes.as_ref().unwrap();
        assert_eq!(nodes.total, 1);
        assert_eq!(nodes.running, 1);

        let pods = ov.pods.as_ref().unwrap();
        assert_eq!(pods.total["default"], 3);
        assert_eq!(pods.total["kube-system"], 1);
        assert_eq!(pods.running["default"], 2);
        assert_eq!(pods.running["kube-system"], 1);
        assert_eq!(pods.pods.len(), 4);

        assert_eq!(ov.namespaces.total, 2);
        assert!(ov.errors.is_empty());
    }

    #[tokio::test]
    async fn every_count_map_has_one_entry_per_namespace() {
        let mut cluster = FakeCluster::two_namespaces();
        cluster.namespaces.extend(["monitoring".to_string(), "empty".to_string()]);
        let client: Arc<dyn ClusterApi> = Arc::new(cluster);

        let ov = strict().aggregate(client).await.unwrap();
        let set = &ov.namespaces.names;
        let maps = [
            &ov.pods.as_ref().unwrap().total,
            &ov.pods.as_ref().unwrap().running,
            &ov.services.as_ref().unwrap().total,
            &ov.ingress.as_ref().unwrap().total,
            &ov.secrets.as_ref().unwrap().total,
            &ov.config_maps.as_ref().unwrap().total,
        ];
        for map in maps {
            assert_eq!(map.len(), set.len());
            assert!(map.keys().all(|k| set.contains(k)));
        }
        assert_eq!(ov.pods.as_ref().unwrap().total["empty"], 0);

        // Records only belong to listed namespaces.
        assert!(ov.pods.unwrap().pods.iter().all(|p| set.contains(&p.namespace)));
    }

    #[tokio::test]
    async fn repeated_aggregation_is_stable() {
        let client: Arc<dyn ClusterApi> = Arc::new(FakeCluster::two_namespaces());
        let agg = strict();
        let first = agg.aggregate(client.clone()).await.unwrap();
        let second = agg.aggregate(client).await.unwrap();

        let names = |ov: &Overview| -> Vec<String> {
            ov.pods.as_ref().unwrap().pods.iter().map(|p| p.name.clone()).collect()
        };
        assert_eq!(names(&first), names(&second));
        assert_eq!(
            first.pods.as_ref().unwrap().total,
            second.pods.as_ref().unwrap().total
        );
        assert_eq!(
            first.services.as_ref().unwrap().total,
            second.services.as_ref().unwrap().total
        );
        assert_eq!(first.nodes.unwrap().total, second.nodes.unwrap().total);
    }

    #[tokio::test]
    async fn strict_mode_discards_everything_on_one_failure() {
        let cluster = FakeCluster::two_namespaces().failing(ResourceKind::Secret);
        let client: Arc<dyn ClusterApi> = Arc::new(cluster);

        let err = strict().aggregate(client).await.unwrap_err();
        match err {
            OverviewError::CollectionFailed(e) => {
                assert_eq!(e.kind, ResourceKind::Secret);
                assert_eq!(e.namespace.as_deref(), Some("default"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn partial_mode_keeps_successful_kinds() {
        let cluster = FakeCluster::two_namespaces().failing(ResourceKind::Secret);
        let client: Arc<dyn ClusterApi> = Arc::new(cluster);

        let ov = partial().aggregate(client).await.unwrap();
        assert!(ov.secrets.is_none());
        assert!(ov.nodes.is_some());
        assert!(ov.pods.is_some());
        assert!(ov.services.is_some());
        assert!(ov.ingress.is_some());
        assert!(ov.config_maps.is_some());
        assert_eq!(ov.errors.len(), 1);
        assert_eq!(ov.errors[0].kind, ResourceKind::Secret);
    }

    #[tokio::test]
    async fn panicked_collector_is_recorded_as_failure() {
        let cluster = FakeCluster::two_namespaces().panicking(ResourceKind::Ingress);
        let client: Arc<dyn ClusterApi> = Arc::new(cluster);

        let ov = partial().aggregate(client.clone()).await.unwrap();
        assert_eq!(ov.errors.len(), 1);
        assert_eq!(ov.errors[0].kind, ResourceKind::Ingress);
        assert_eq!(ov.errors[0].namespace, None);
        assert!(ov.errors[0].cause.starts_with("collector task failed"));
        assert!(ov.ingress.is_none());
        assert!(ov.nodes.is_some());
        assert!(ov.pods.is_some());
        assert!(ov.services.is_some());
        assert!(ov.secrets.is_some());
        assert!(ov.config_maps.is_some());

        match strict().aggregate(client).await {
            Err(OverviewError::CollectionFailed(e)) => assert_eq!(e.kind, ResourceKind::Ingress),
            other => panic!("unexpected outcome: {:?}", other.map(|_| ())),
        }
    }

    #[tokio::test]
    async fn first_error_is_chosen_by_kind_order() {
        let cluster = FakeCluster::two_namespaces()
            .failing(ResourceKind::ConfigMap)
            .failing(ResourceKind::Service)
            .failing(ResourceKind::Ingress);
        let client: Arc<dyn ClusterApi> = Arc::new(cluster);

        for _ in 0..5 {
            let ov = partial().aggregate(client.clone()).await.unwrap();
            let kinds: Vec<ResourceKind> = ov.errors.iter().map(|e| e.kind).collect();
            assert_eq!(
                kinds,
                vec![
                    ResourceKind::Service,
                    ResourceKind::Ingress,
                    ResourceKind::ConfigMap
                ]
            );

            match strict().aggregate(client.clone()).await {
                Err(OverviewError::CollectionFailed(e)) => {
                    assert_eq!(e.kind, ResourceKind::Service)
                }
                other => panic!("unexpected outcome: {:?}", other.map(|_| ())),
            }
        }
    }

    #[tokio::test]
    async fn namespace_failure_skips_fan_out() {
        let cluster = Arc::new(FakeCluster {
            fail_namespaces: true,
            ..FakeCluster::two_namespaces()
        });
        let client: Arc<dyn ClusterApi> = cluster.clone();

        let err = partial().aggregate(client).await.unwrap_err();
        assert!(matches!(err, OverviewError::UpstreamUnavailable(_)));
        // Only the namespace list was attempted.
        assert_eq!(cluster.call_count(), 1);
    }

    #[tokio::test]
    async fn all_collectors_run_even_when_one_fails() {
        let cluster = Arc::new(FakeCluster::two_namespaces().failing(ResourceKind::Node));
        let client: Arc<dyn ClusterApi> = cluster.clone();

        let _ = strict().aggregate(client).await;
        // 1 namespace list + 1 node list + 2 namespaces x 5 namespaced kinds
        assert_eq!(cluster.call_count(), 12);
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_aborts_collection() {
        let cluster = FakeCluster {
            delay: Some(Duration::from_secs(30)),
            ..FakeCluster::two_namespaces()
        };
        let client: Arc<dyn ClusterApi> = Arc::new(cluster);
        let agg = Aggregator::new(FailurePolicy::Partial, Some(Duration::from_secs(5)));

        let err = agg.aggregate(client).await.unwrap_err();
        assert!(matches!(err, OverviewError::TimedOut(d) if d == Duration::from_secs(5)));
    }

    #[tokio::test]
    async fn overview_serializes_dashboard_shape() {
        let client: Arc<dyn ClusterApi> = Arc::new(FakeCluster::two_namespaces());
        let ov = strict().aggregate(client).await.unwrap();
        let json = serde_json::to_value(&ov).unwrap();

        assert_eq!(json["nodes"]["total"], 1);
        assert_eq!(json["pods"]["running"]["default"], 2);
        assert_eq!(json["namespaces"]["namespacelist"][1], "kube-system");
        assert_eq!(json["ingress"]["ingress"][0]["address"], "203.0.113.7");
        assert_eq!(json["configmaps"]["confs"][0]["datacount"], 2);
        assert_eq!(json["pods"]["pods"][0]["status"], "Ready");
    }
}
