use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use orbit_config::ServiceConfig;
use orbit_core::{LifecycleEventKind, LifecyclePhase, OrbitError, PluginInterface};
use orbit_hooks::{ErrorReporter, ExtensionRegistration};
use orbit_plugins::{PluginDescriptor, PluginRegistry, Service};
use serde_json::{Value, json};

type Journal = Arc<Mutex<Vec<String>>>;

/// Plugin that records its connect/close calls and registers one extra
/// destructor from the attach context.
fn tracked(name: &'static str, phase: LifecyclePhase, journal: &Journal) -> PluginDescriptor {
    let journal = Arc::clone(journal);
    PluginDescriptor::new(name, phase, move |_, ctx| {
        let extra = Arc::clone(&journal);
        ctx.add_destructor(phase, move || {
            let journal = Arc::clone(&extra);
            async move {
                journal.lock().unwrap().push(format!("close:{name}:pool"));
                anyhow::Ok(())
            }
        });
        let (up, down) = (Arc::clone(&journal), Arc::clone(&journal));
        Ok(Some(
            PluginInterface::new()
                .with_connect(move || {
                    let journal = Arc::clone(&up);
                    async move {
                        journal.lock().unwrap().push(format!("connect:{name}"));
                        anyhow::Ok(json!(name))
                    }
                })
                .with_close(move || {
                    let journal = Arc::clone(&down);
                    async move {
                        journal.lock().unwrap().push(format!("close:{name}"));
                        anyhow::Ok(())
                    }
                }),
        ))
    })
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

#[tokio::test]
async fn database_plugins_connect_before_transport_plugins() {
    let journal: Journal = Arc::default();
    let mut registry = PluginRegistry::new();
    registry.register(tracked("amqp", LifecyclePhase::Transport, &journal)).unwrap();
    registry.register(tracked("pg", LifecyclePhase::Database, &journal)).unwrap();

    let service = Service::new(ServiceConfig::default().with_plugins(["amqp", "pg"]), registry).unwrap();
    assert_eq!(service.plugins(), ["pg", "amqp"]);

    let results = service.connect().await.unwrap();
    assert_eq!(results, vec![json!("pg"), json!("amqp")]);
    assert_eq!(entries(&journal), vec!["connect:pg", "connect:amqp"]);
}

#[tokio::test]
async fn close_reverses_phases_and_is_lifo_within_a_phase() {
    let journal: Journal = Arc::default();
    let mut registry = PluginRegistry::new();
    registry.register(tracked("pg", LifecyclePhase::Database, &journal)).unwrap();
    registry.register(tracked("redis", LifecyclePhase::Database, &journal)).unwrap();
    registry.register(tracked("http", LifecyclePhase::Transport, &journal)).unwrap();

    let config = ServiceConfig::default().with_plugins(["http", "pg", "redis"]);
    let service = Service::new(config, registry).unwrap();
    service.close().await.unwrap();

    assert_eq!(
        entries(&journal),
        vec![
            "close:http",
            "close:http:pool",
            "close:redis",
            "close:redis:pool",
            "close:pg",
            "close:pg:pool",
        ]
    );
}

#[tokio::test]
async fn priority_orders_plugins_within_a_phase() {
    let journal: Journal = Arc::default();
    let mut registry = PluginRegistry::new();
    registry.register(tracked("late", LifecyclePhase::Database, &journal).with_priority(10)).unwrap();
    registry.register(tracked("early", LifecyclePhase::Database, &journal).with_priority(-1)).unwrap();

    let service = Service::new(ServiceConfig::default().with_plugins(["late", "early"]), registry).unwrap();
    service.connect().await.unwrap();
    assert_eq!(entries(&journal), vec!["connect:early", "connect:late"]);
}

#[tokio::test]
async fn local_location_shadows_shared_descriptor() {
    let journal: Journal = Arc::default();
    let mut registry = PluginRegistry::new();
    registry.register(tracked("http", LifecyclePhase::Transport, &journal)).unwrap();
    registry
        .register_override(PluginDescriptor::new("http", LifecyclePhase::Transport, |_, _| {
            Ok(Some(PluginInterface::new().with_connect(|| async { anyhow::Ok(json!("override")) })))
        }))
        .unwrap();

    let service = Service::new(ServiceConfig::default().with_plugins(["http"]), registry).unwrap();
    assert_eq!(service.connect().await.unwrap(), vec![json!("override")]);
    assert!(entries(&journal).is_empty());
}

#[test]
fn attach_failure_stops_the_sequence_and_commits_nothing() {
    let later_attached = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&later_attached);

    let mut registry = PluginRegistry::new();
    registry
        .register(PluginDescriptor::new("vault", LifecyclePhase::Essential, |_, ctx| {
            ctx.on_hook("audit", |_args: Vec<Value>| async { anyhow::Ok(Value::Null) });
            ctx.add_connector(LifecyclePhase::Essential, || async { anyhow::Ok(Value::Null) });
            anyhow::bail!("token expired")
        }))
        .unwrap();
    registry
        .register(PluginDescriptor::new("pg", LifecyclePhase::Database, move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
            Ok(None)
        }))
        .unwrap();

    let err = Service::new(ServiceConfig::default().with_plugins(["pg", "vault"]), registry).unwrap_err();
    match err {
        OrbitError::Attach { plugin, source } => {
            assert_eq!(plugin, "vault");
            assert_eq!(source.to_string(), "token expired");
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(later_attached.load(Ordering::SeqCst), 0);
}

#[tokio::test(start_paused = true)]
async fn hook_results_follow_registration_order() {
    let mut registry = PluginRegistry::new();
    registry
        .register(PluginDescriptor::new("metrics", LifecyclePhase::Application, |_, ctx| {
            ctx.on_hook("request", |_args: Vec<Value>| async {
                tokio::time::sleep(Duration::from_millis(5)).await;
                anyhow::Ok(json!("fast"))
            });
            Ok(None)
        }))
        .unwrap();

    let service = Service::builder(ServiceConfig::default().with_plugins(["metrics"]))
        .registry(registry)
        .hook("request", |args: Vec<Value>| async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            anyhow::Ok(json!({"slow": args}))
        })
        .build()
        .unwrap();

    let results = service.hook("request", vec![json!(1)]).await.unwrap();
    assert_eq!(results, vec![json!({"slow": [1]}), json!("fast")]);
    assert!(service.hook("missing", vec![]).await.unwrap().is_empty());
}

#[tokio::test]
async fn extension_points_must_be_enabled() {
    let mut config = ServiceConfig::default();
    config.extensions.enabled = vec!["postHandler".into()];
    let service = Service::builder(config)
        .extensions(vec![
            ExtensionRegistration::new("postHandler", |args: Vec<Value>| async move {
                anyhow::Ok(args.into_iter().next().unwrap_or(Value::Null))
            }),
            ExtensionRegistration::new("postPreHandler", |_args: Vec<Value>| async { anyhow::Ok(Value::Null) }),
        ])
        .build()
        .unwrap();

    assert_eq!(service.exec("postHandler", vec![json!("foo")]).await.unwrap(), vec![json!("foo")]);
    let err = service.exec("postPreHandler", vec![json!("foo")]).await.unwrap_err();
    assert_eq!(err.to_string(), "Not Supported: postPreHandler");
}

#[tokio::test(start_paused = true)]
async fn one_failing_probe_fails_the_summary() {
    let mut registry = PluginRegistry::new();
    registry
        .register(PluginDescriptor::new("pg", LifecyclePhase::Database, |_, _| {
            Ok(Some(PluginInterface::new().with_status(|| async { anyhow::Ok(json!("ok")) })))
        }))
        .unwrap();
    registry
        .register(PluginDescriptor::new("amqp", LifecyclePhase::Transport, |_, ctx| {
            ctx.add_health_check("amqp", || async { Err::<Value, _>(anyhow::anyhow!("channel closed")) });
            Ok(None)
        }))
        .unwrap();

    let service = Service::new(ServiceConfig::default().with_plugins(["pg", "amqp"]), registry).unwrap();
    let summary = service.health_status().await;

    assert!(!summary.is_ok());
    assert_eq!(summary.alive, vec!["pg"]);
    assert_eq!(summary.failed, vec!["amqp"]);
    assert_eq!(summary.failures[0].error, "channel closed");
    let body = serde_json::to_value(&summary).unwrap();
    assert_eq!(body["status"], "fail");
}

#[tokio::test]
async fn lifecycle_events_reach_subscribers() {
    let journal: Journal = Arc::default();
    let mut registry = PluginRegistry::new();
    registry.register(tracked("pg", LifecyclePhase::Database, &journal)).unwrap();
    let service = Service::new(ServiceConfig::default().with_plugins(["pg"]), registry).unwrap();
    let mut events = service.subscribe();

    service.connect().await.unwrap();
    service.close().await.unwrap();

    let mut kinds = Vec::new();
    while let Ok(event) = events.try_recv() {
        assert_eq!(event.service, service.name());
        kinds.push(event.kind);
    }
    assert_eq!(
        kinds,
        vec![
            LifecycleEventKind::PluginConnected,
            LifecycleEventKind::Ready,
            LifecycleEventKind::PluginClosed,
            LifecycleEventKind::PluginClosed,
            LifecycleEventKind::Close,
        ]
    );
}

#[tokio::test]
async fn connect_may_run_again_after_close() {
    let journal: Journal = Arc::default();
    let mut registry = PluginRegistry::new();
    registry.register(tracked("pg", LifecyclePhase::Database, &journal)).unwrap();
    let service = Service::new(ServiceConfig::default().with_plugins(["pg"]), registry).unwrap();

    service.connect().await.unwrap();
    service.close().await.unwrap();
    service.connect().await.unwrap();
    assert_eq!(entries(&journal).iter().filter(|e| *e == "connect:pg").count(), 2);
}

/// Plugin that keeps its error reporter and reports through it from its
/// connector, the way a background consumer would.
fn reporting(name: &'static str, listen: bool, kept: &Arc<Mutex<Option<ErrorReporter>>>) -> PluginDescriptor {
    let kept = Arc::clone(kept);
    PluginDescriptor::new(name, LifecyclePhase::Transport, move |_, ctx| {
        if listen {
            ctx.on_error(|_| {});
        }
        let reporter = ctx.error_reporter();
        *kept.lock().unwrap() = Some(reporter.clone());
        Ok(Some(PluginInterface::new().with_connect(move || {
            let reporter = reporter.clone();
            async move {
                let outcome = reporter.report(anyhow::anyhow!("broker connection lost"));
                anyhow::Ok(json!(outcome.is_ok()))
            }
        })))
    })
}

#[tokio::test]
async fn errors_reported_after_connect_escalate_when_unhandled() {
    let kept = Arc::default();
    let mut registry = PluginRegistry::new();
    registry.register(reporting("amqp", false, &kept)).unwrap();
    let service = Service::new(ServiceConfig::default().with_plugins(["amqp"]), registry).unwrap();

    assert_eq!(service.connect().await.unwrap(), vec![json!(false)]);
    assert_eq!(service.unhandled().await, "broker connection lost");

    let reporter = kept.lock().unwrap().clone().unwrap();
    let err = reporter.report(anyhow::anyhow!("consumer cancelled")).unwrap_err();
    assert!(matches!(err, OrbitError::Unhandled(_)));
}

#[tokio::test]
async fn errors_reported_to_a_listener_are_handled() {
    let kept = Arc::default();
    let mut registry = PluginRegistry::new();
    registry.register(reporting("amqp", true, &kept)).unwrap();
    let service = Service::new(ServiceConfig::default().with_plugins(["amqp"]), registry).unwrap();

    assert_eq!(service.connect().await.unwrap(), vec![json!(true)]);
    let reporter = kept.lock().unwrap().clone().unwrap();
    assert!(reporter.report(anyhow::anyhow!("consumer cancelled")).is_ok());
}
