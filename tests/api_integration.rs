use httpmock::prelude::*;
use serde_json::json;
use url::Url;

use flowctl::client::{ClientError, FlowdaptClient};
use flowctl::errors::FlowctlError;
use flowctl::resources::{
    CallOptions, ResourceKind, create_resource, delete_resource, get_resource, list_resources,
    update_resource,
};
use flowctl::types::{MetricsQuery, RunOptions};

fn client_for(server: &MockServer) -> FlowdaptClient {
    let url = Url::parse(&server.base_url()).unwrap();
    FlowdaptClient::new(&url).unwrap()
}

#[tokio::test]
async fn test_get_sends_version_header() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/workflows/train")
                .header("X-API-Version", "v1alpha1");
            then.status(200)
                .json_body(json!({"kind": "workflow", "metadata": {"name": "train"}}));
        })
        .await;

    let client = client_for(&server);
    let found = get_resource(&client, ResourceKind::Workflow, Some("train"), &CallOptions::default())
        .await
        .unwrap()
        .unwrap();

    mock.assert_async().await;
    assert_eq!(ResourceKind::Workflow.name_of(&found), Some("train"));
}

#[tokio::test]
async fn test_get_missing_is_none() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/configs/nope");
            then.status(404).json_body(json!({"detail": "Not Found"}));
        })
        .await;

    let client = client_for(&server);
    let found = get_resource(&client, ResourceKind::Config, Some("nope"), &CallOptions::default())
        .await
        .unwrap();
    assert!(found.is_none());
}

#[tokio::test]
async fn test_server_error_detail_is_surfaced() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/triggers/");
            then.status(500).json_body(json!({"detail": "boom"}));
        })
        .await;

    let client = client_for(&server);
    let err = list_resources(&client, ResourceKind::TriggerRule, None, &CallOptions::default())
        .await
        .unwrap_err();
    match err {
        FlowctlError::Client(ClientError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "boom");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_list_runs_uses_workflow_and_limit() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/workflows/train/runs")
                .query_param("limit", "3");
            then.status(200)
                .json_body(json!([{"name": "train-1"}, {"name": "train-2"}]));
        })
        .await;

    let client = client_for(&server);
    let opts = CallOptions {
        version: None,
        limit: Some(3),
    };
    let runs = list_resources(&client, ResourceKind::WorkflowRun, Some("train"), &opts)
        .await
        .unwrap();

    mock.assert_async().await;
    assert_eq!(runs.len(), 2);
}

#[tokio::test]
async fn test_unsupported_version_never_hits_server() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/api/workflows/a");
            then.status(200).json_body(json!({}));
        })
        .await;

    let client = client_for(&server);
    let opts = CallOptions {
        version: Some("v9".to_owned()),
        limit: None,
    };
    let err = get_resource(&client, ResourceKind::Workflow, Some("a"), &opts)
        .await
        .unwrap_err();

    assert!(matches!(err, FlowctlError::UnsupportedVersion { .. }));
    mock.assert_hits_async(0).await;
}

#[tokio::test]
async fn test_create_update_delete_paths() {
    let server = MockServer::start_async().await;
    let body = json!({"kind": "config", "metadata": {"name": "c1"}, "spec": {}});

    let create = server
        .mock_async(|when, then| {
            when.method(POST).path("/api/configs/").json_body(json!({
                "kind": "config", "metadata": {"name": "c1"}, "spec": {}
            }));
            then.status(200).json_body(json!({"metadata": {"name": "c1"}}));
        })
        .await;
    let update = server
        .mock_async(|when, then| {
            when.method(PUT).path("/api/configs/c1");
            then.status(200).json_body(json!({"metadata": {"name": "c1"}}));
        })
        .await;
    let delete = server
        .mock_async(|when, then| {
            when.method(DELETE).path("/api/configs/c1");
            then.status(200).json_body(json!({"metadata": {"name": "c1"}}));
        })
        .await;

    let client = client_for(&server);
    let opts = CallOptions::default();
    create_resource(&client, ResourceKind::Config, &body, &opts).await.unwrap();
    update_resource(&client, ResourceKind::Config, Some("c1"), &body, &opts)
        .await
        .unwrap();
    let deleted = delete_resource(&client, ResourceKind::Config, Some("c1"), &opts)
        .await
        .unwrap();

    create.assert_async().await;
    update.assert_async().await;
    delete.assert_async().await;
    assert!(deleted.is_some());
}

#[tokio::test]
async fn test_plugins_cannot_be_created() {
    let server = MockServer::start_async().await;
    let client = client_for(&server);
    let err = create_resource(&client, ResourceKind::Plugin, &json!({}), &CallOptions::default())
        .await
        .unwrap_err();
    assert!(matches!(err, FlowctlError::UnsupportedOperation { .. }));
}

#[tokio::test]
async fn test_run_workflow() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/api/workflows/wf-uid/run")
                .query_param("wait", "true")
                .query_param("namespace", "ns")
                .json_body(json!({"x": 1}));
            then.status(200).json_body(json!({
                "uid": "r1",
                "name": "train-1",
                "state": "finished",
                "result": 42
            }));
        })
        .await;

    let client = client_for(&server);
    let opts = RunOptions {
        wait: true,
        namespace: Some("ns".to_owned()),
        version: "v1alpha1".to_owned(),
    };
    let run = client.run_workflow("wf-uid", &json!({"x": 1}), &opts).await.unwrap();

    mock.assert_async().await;
    assert_eq!(run.state, "finished");
    assert_eq!(run.result, json!(42));
}

#[tokio::test]
async fn test_status_and_ping() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/ping");
            then.status(200).json_body(json!({"version": "0.1.0", "api_version": "v1"}));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/api/system/status");
            then.status(200).json_body(json!({
                "name": "flowdapt",
                "system": {
                    "time": "2024-05-01T12:00:00",
                    "cpu_pct": 3.5,
                    "memory": 1024,
                    "disk_pct": 50,
                    "network_io_sent": 10,
                    "network_io_recv": 20
                },
                "os": {"name": "Linux", "release": "6.1", "machine": "x86_64"},
                "services": {"database": {"status": "OK"}}
            }));
        })
        .await;

    let client = client_for(&server);
    let info = client.ping().await.unwrap();
    let status = client.system_status().await.unwrap();

    assert_eq!(info.version.as_deref(), Some("0.1.0"));
    assert_eq!(status.os.machine, "x86_64");
    assert!(status.services.contains_key("database"));
}

#[tokio::test]
async fn test_metrics_query() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/api/metrics/")
                .query_param("name", "api_request_latency")
                .query_param("max_length", "30");
            then.status(200).json_body(json!({
                "api_request_latency": [
                    {"explicit_bounds": [0.0, 10.0], "bucket_counts": [1, 2]}
                ]
            }));
        })
        .await;

    let client = client_for(&server);
    let query = MetricsQuery {
        name: "api_request_latency".to_owned(),
        start_time: None,
        end_time: None,
        max_length: Some(30),
        version: "v1alpha1".to_owned(),
    };
    let response = client.metrics(&query).await.unwrap();

    mock.assert_async().await;
    let points = &response.0["api_request_latency"];
    assert_eq!(points[0].bucket_counts, vec![1, 2]);
}

#[tokio::test]
async fn test_unreachable_server_is_connection_error() {
    let url = Url::parse("http://127.0.0.1:9").unwrap();
    let client = FlowdaptClient::new(&url).unwrap();
    let err = client.ping().await.unwrap_err();
    assert!(matches!(err, ClientError::Connection { .. }));
}

mod commands {
    use super::*;
    use clap::Parser;
    use flowctl::cli::Cli;
    use flowctl::commands::{Context, Outcome, dispatch};
    use flowctl::config::{Configuration, LoadOptions};

    fn context(server: &MockServer, dir: &tempfile::TempDir) -> Context {
        let opts = LoadOptions {
            app_dir: dir.path().to_path_buf(),
            config_file: None,
            dotenv_files: Vec::new(),
            server: Some(server.base_url()),
        };
        Context::new(Configuration::build(&opts, Vec::new()).unwrap())
    }

    async fn run_cli(args: &[&str], ctx: &mut Context) -> flowctl::errors::Result<Outcome> {
        let cli = Cli::try_parse_from(std::iter::once("flowctl").chain(args.iter().copied())).unwrap();
        dispatch(cli.command.as_ref().unwrap(), ctx).await
    }

    #[tokio::test]
    async fn test_run_missing_workflow_fails() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/workflows/ghost");
                then.status(404);
            })
            .await;
        let dir = tempfile::TempDir::new().unwrap();
        let mut ctx = context(&server, &dir);

        let outcome = run_cli(&["run", "ghost", "--disable-progress"], &mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Failure);
    }

    #[tokio::test]
    async fn test_patch_merges_and_puts() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/configs/c1");
                then.status(200).json_body(json!({
                    "kind": "config",
                    "metadata": {"name": "c1"},
                    "spec": {"data": {"a": 1, "b": 2}}
                }));
            })
            .await;
        let put = server
            .mock_async(|when, then| {
                when.method(PUT).path("/api/configs/c1").json_body(json!({
                    "kind": "config",
                    "metadata": {"name": "c1"},
                    "spec": {"data": {"a": 5, "b": 2}}
                }));
                then.status(200).json_body(json!({"metadata": {"name": "c1"}}));
            })
            .await;
        let dir = tempfile::TempDir::new().unwrap();
        let mut ctx = context(&server, &dir);

        let outcome = run_cli(&["patch", "config", "c1", "--", "--spec.data.a", "5"], &mut ctx)
            .await
            .unwrap();
        put.assert_async().await;
        assert_eq!(outcome, Outcome::Success);
    }

    #[tokio::test]
    async fn test_get_unknown_kind_is_error() {
        let server = MockServer::start_async().await;
        let dir = tempfile::TempDir::new().unwrap();
        let mut ctx = context(&server, &dir);
        let err = run_cli(&["get", "widgets"], &mut ctx).await.unwrap_err();
        assert!(matches!(err, FlowctlError::UnknownResourceKind(_)));
        assert_eq!(err.exit_code(), 2);
    }

    fn write_definition(dir: &std::path::Path, file: &str, contents: &str) -> String {
        let path = dir.join(file);
        std::fs::write(&path, contents).unwrap();
        path.to_string_lossy().into_owned()
    }

    #[tokio::test]
    async fn test_apply_updates_existing_and_creates_new() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/workflows/train");
                then.status(200)
                    .json_body(json!({"kind": "workflow", "metadata": {"name": "train"}}));
            })
            .await;
        let update = server
            .mock_async(|when, then| {
                when.method(PUT).path("/api/workflows/train");
                then.status(200).json_body(json!({"metadata": {"name": "train"}}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/configs/c2");
                then.status(404).json_body(json!({"detail": "Not Found"}));
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/configs/");
                then.status(200).json_body(json!({"metadata": {"name": "c2"}}));
            })
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let defs = tempfile::TempDir::new().unwrap();
        let existing = write_definition(
            defs.path(),
            "train.yaml",
            "kind: workflow\nmetadata:\n  name: train\nspec: {}\n",
        );
        let new = write_definition(defs.path(), "c2.json", r#"{"kind": "config", "metadata": {"name": "c2"}}"#);
        let mut ctx = context(&server, &dir);

        let outcome = run_cli(&["apply", "-p", existing.as_str(), new.as_str()], &mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Success);
        update.assert_hits_async(1).await;
        create.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_apply_skips_definition_without_name() {
        let server = MockServer::start_async().await;
        let lookup = server
            .mock_async(|when, then| {
                when.method(GET).path_contains("/api/workflows/");
                then.status(404);
            })
            .await;
        let create = server
            .mock_async(|when, then| {
                when.method(POST).path("/api/workflows/");
                then.status(200).json_body(json!({}));
            })
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let defs = tempfile::TempDir::new().unwrap();
        let unnamed = write_definition(defs.path(), "wf.yaml", "kind: workflow\nspec: {}\n");
        let mut ctx = context(&server, &dir);

        let outcome = run_cli(&["apply", "-p", unnamed.as_str()], &mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Success);
        lookup.assert_hits_async(0).await;
        create.assert_hits_async(0).await;
    }

    #[tokio::test]
    async fn test_delete_from_files_reports_missing() {
        let server = MockServer::start_async().await;
        let deleted = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/configs/c1");
                then.status(200).json_body(json!({"metadata": {"name": "c1"}}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/api/configs/gone");
                then.status(404).json_body(json!({"detail": "Not Found"}));
            })
            .await;

        let dir = tempfile::TempDir::new().unwrap();
        let defs = tempfile::TempDir::new().unwrap();
        let gone = write_definition(defs.path(), "gone.yaml", "kind: config\nmetadata:\n  name: gone\n");
        let present = write_definition(defs.path(), "c1.yaml", "kind: config\nmetadata:\n  name: c1\n");
        let mut ctx = context(&server, &dir);

        let outcome = run_cli(&["delete", "-p", gone.as_str(), present.as_str()], &mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Failure);
        deleted.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn test_get_empty_list_fails() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/workflows/");
                then.status(200).json_body(json!([]));
            })
            .await;
        let dir = tempfile::TempDir::new().unwrap();
        let mut ctx = context(&server, &dir);

        let outcome = run_cli(&["get", "workflows"], &mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Failure);
    }

    #[tokio::test]
    async fn test_get_select_outcomes() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/api/workflows/");
                then.status(200).json_body(json!([
                    {"metadata": {"uid": "u1", "name": "train", "created_at": "2024-05-01T11:55:00"}}
                ]));
            })
            .await;
        let dir = tempfile::TempDir::new().unwrap();
        let mut ctx = context(&server, &dir);

        let empty = run_cli(&["get", "--select", "[?metadata.name=='nope']", "workflows"], &mut ctx)
            .await
            .unwrap();
        assert_eq!(empty, Outcome::Failure);

        let names = run_cli(&["get", "--select", "[].metadata.name", "-f", "table", "workflows"], &mut ctx)
            .await
            .unwrap();
        assert_eq!(names, Outcome::Success);
    }

    #[tokio::test]
    async fn test_status_renders() {
        let server = MockServer::start_async().await;
        let ping = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/ping");
                then.status(200).json_body(json!({"version": "0.1.0"}));
            })
            .await;
        let status = server
            .mock_async(|when, then| {
                when.method(GET).path("/api/system/status");
                then.status(200).json_body(json!({
                    "name": "flowdapt",
                    "system": {
                        "time": "2024-05-01T12:00:00",
                        "cpu_pct": 3.5,
                        "memory": 1024,
                        "disk_pct": 50,
                        "network_io_sent": 10,
                        "network_io_recv": 20
                    },
                    "os": {"name": "Linux", "release": "6.1", "machine": "x86_64"},
                    "services": {"database": {"status": "OK"}}
                }));
            })
            .await;
        let dir = tempfile::TempDir::new().unwrap();
        let mut ctx = context(&server, &dir);

        let outcome = run_cli(&["status"], &mut ctx).await.unwrap();
        assert_eq!(outcome, Outcome::Success);
        ping.assert_async().await;
        status.assert_async().await;
    }
}
