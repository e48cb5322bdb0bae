//! Workflow integration tests.
//!
//! Run the full workflow through the HTTP client against a mocked Vault server.

use kv_provisioner::{
    MountPolicy, MountOutcome, ProvisioningWorkflow, Step, StepError, TokenHandoff,
    WorkflowFailure, WorkflowPlan, WorkflowReport, WorkflowState,
};
use kv_vault_client::{EngineType, MountPath, SecretPath, VaultClient, VaultConfig, VaultToken};
use test_utils::fixtures::{
    AWS_CREDENTIALS_PATH, DEFAULT_MOUNT, DEV_TOKEN, aws_credentials, kv_read_body, kv_write_body,
    mount_conflict_body, mounts_listing_body, permission_denied_body,
};
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const DATA_PATH: &str = "/v1/secrets/data/aws/credentials";

fn plan() -> WorkflowPlan {
    let mount = MountPath::parse(DEFAULT_MOUNT).unwrap();
    let path = SecretPath::parse(AWS_CREDENTIALS_PATH, &mount).unwrap();
    WorkflowPlan::new(mount, path, aws_credentials("X", "Y"))
        .with_required_fields(vec!["access_key".to_string(), "secret_access_key".to_string()])
}

async fn run(server: &MockServer, plan: WorkflowPlan) -> (Result<WorkflowReport, WorkflowFailure>, String) {
    let config = VaultConfig::new(&server.uri()).unwrap();
    let token = VaultToken::new(DEV_TOKEN).unwrap();
    let handoff = TokenHandoff::new(&config, token.clone(), &plan.mount, &plan.path);
    let client = VaultClient::new(config, token).unwrap();

    let mut out = Vec::new();
    let result = ProvisioningWorkflow::new(&client, plan, handoff)
        .run(&mut out)
        .await;
    (result, String::from_utf8(out).unwrap())
}

async fn mount_enable_ok(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path("/v1/sys/mounts/secrets"))
        .and(header("x-vault-token", DEV_TOKEN))
        .and(body_json(EngineType::KvV2.mount_request()))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_provisions_on_fresh_server() {
    let server = MockServer::start().await;
    mount_enable_ok(&server).await;
    Mock::given(method("POST"))
        .and(path(DATA_PATH))
        .and(header("x-vault-token", DEV_TOKEN))
        .and(body_json(serde_json::json!({
            "data": { "access_key": "X", "secret_access_key": "Y" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(kv_write_body(1)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DATA_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(kv_read_body(&aws_credentials("X", "Y"), 1)),
        )
        .expect(1)
        .mount(&server)
        .await;

    let (result, out) = run(&server, plan()).await;
    let report = result.unwrap();

    assert_eq!(report.state, WorkflowState::Done);
    assert_eq!(report.mount, MountOutcome::Created);
    assert_eq!(report.written.version, 1);
    assert_eq!(report.verified.version, 1);
    assert!(report.verified.created_time.is_some());
    assert_eq!(report.record.get("access_key"), Some("X"));
    assert_eq!(report.record.get("secret_access_key"), Some("Y"));
    assert!(out.contains("Token for external use: dev-only-token"));
    assert!(out.contains(&format!(
        "curl --header \"X-Vault-Token: dev-only-token\" {}{DATA_PATH}",
        server.uri()
    )));
}

#[tokio::test]
async fn test_mount_conflict_skips_write_and_read() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/sys/mounts/secrets"))
        .respond_with(ResponseTemplate::new(400).set_body_json(mount_conflict_body("secrets")))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(path(DATA_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (result, out) = run(&server, plan()).await;
    let failure = result.unwrap_err();

    assert!(matches!(failure.error, StepError::MountConflict { ref mount, .. } if mount == "secrets"));
    assert_eq!(failure.state, WorkflowState::Failed { at: Step::EnableEngine });
    assert!(!failure.error.is_retryable());
    assert!(failure.error.hint().unwrap().contains("--mount-policy reuse"));
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_write_denied_skips_read() {
    let server = MockServer::start().await;
    mount_enable_ok(&server).await;
    Mock::given(method("POST"))
        .and(path(DATA_PATH))
        .respond_with(ResponseTemplate::new(403).set_body_json(permission_denied_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DATA_PATH))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&server)
        .await;

    let (result, _) = run(&server, plan()).await;
    let failure = result.unwrap_err();

    assert!(matches!(failure.error, StepError::WriteFailure { .. }));
    assert_eq!(failure.last_completed, WorkflowState::EngineEnabled);
    assert!(failure.error.hint().unwrap().contains("'create'"));
}

#[tokio::test]
async fn test_read_back_mismatch_fails() {
    let server = MockServer::start().await;
    mount_enable_ok(&server).await;
    Mock::given(method("POST"))
        .and(path(DATA_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(kv_write_body(1)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DATA_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(kv_read_body(&aws_credentials("X", "other"), 1)),
        )
        .mount(&server)
        .await;

    let (result, out) = run(&server, plan()).await;
    let failure = result.unwrap_err();

    assert_eq!(failure.error.code(), "VERIFICATION_MISMATCH");
    assert_eq!(failure.state, WorkflowState::Failed { at: Step::ReadSecret });
    assert!(!failure.to_string().contains("other"));
    assert!(out.is_empty());
}

#[tokio::test]
async fn test_reuse_policy_with_existing_kv_v2_mount() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/sys/mounts"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(mounts_listing_body(&[("secrets", "kv", Some("2"))])),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/sys/mounts/secrets"))
        .respond_with(ResponseTemplate::new(204))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(DATA_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(kv_write_body(4)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(DATA_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(kv_read_body(&aws_credentials("X", "Y"), 4)),
        )
        .mount(&server)
        .await;

    let (result, _) = run(&server, plan().with_mount_policy(MountPolicy::Reuse)).await;
    let report = result.unwrap();

    assert_eq!(report.mount, MountOutcome::Reused);
    assert_eq!(report.written.version, 4);
}

#[tokio::test]
async fn test_unreachable_server() {
    let config = VaultConfig::new("http://127.0.0.1:9").unwrap();
    let token = VaultToken::new(DEV_TOKEN).unwrap();
    let plan = plan();
    let handoff = TokenHandoff::new(&config, token.clone(), &plan.mount, &plan.path);
    let client = VaultClient::new(config, token).unwrap();

    let mut out = Vec::new();
    let failure = ProvisioningWorkflow::new(&client, plan, handoff)
        .run(&mut out)
        .await
        .unwrap_err();

    assert!(matches!(
        failure.error,
        StepError::Unreachable { step: Step::EnableEngine, .. }
    ));
    assert!(failure.error.is_retryable());
    assert!(failure.error.hint().unwrap().contains("Vault running"));
}
