//! Integration tests for the crawler
//!
//! These tests use wiremock to stand up a mock provider portal and run the
//! full crawl cycle end-to-end over real HTTP.

use async_trait::async_trait;
use eligibility_crawler::config::{parse_config, Config};
use eligibility_crawler::crawler::{run_crawl, Coordinator, EligibilitySpider, HttpDispatcher};
use eligibility_crawler::output::{load_statistics, MemorySink};
use eligibility_crawler::services::{DocumentSink, DocumentStatus, DocumentUpload, ServiceError};
use eligibility_crawler::session::{load_credentials, load_members};
use eligibility_crawler::state::{Field, Item, ValidationOutcome};
use eligibility_crawler::storage::{RunStatus, SqliteStorage, Storage};
use eligibility_crawler::{ScrapeMode, SyncStatus};
use std::sync::{Arc, Mutex};
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, Request, Respond, ResponseTemplate};

const CREDENTIALS: &str = r#"[{
    "username": "frontdesk", "password": "pw", "jobid": 42,
    "company": "Bright Smiles", "practice": "Main St", "facility_id": "1001"
}]"#;

const LOGIN_OK: &str = r#"{"portal_user_authenticate": {"response_message": "OK"}}"#;

const ELIGIBILITY_PAGE: &str = r#"<html><body>
<div class="eligLabel">Plan:</div>MEDICAID STAR</div>
<p>This member is on the MEDICAID STAR plan and became eligible for benefits on 01/01/2020.</p>
<p>This member is currently active.</p>
<p>Subscriber is eligible.</p>
<a href="/provider/print/4455">Print Eligibility Confirmation</a>
</body></html>"#;

const PRINT_PAGE: &str = r#"<html><body>
<div class="info"><div class="infoLabel">Subscriber's Name:</div> ANA DIAZ</div>
</body></html>"#;

/// Creates a test configuration pointing at the mock portal
fn create_test_config(base_url: &str, db_path: &str) -> Config {
    parse_config(&format!(
        r#"
[portal]
base-url = "{}"
name = "testportal"

[client]
max-concurrent-requests = 4

[retry]
backoff-ms = [10, 10, 10, 10]

[output]
database-path = "{}"
"#,
        base_url, db_path
    ))
    .expect("Failed to parse test config")
}

fn create_test_spider(config: &Config, mode: ScrapeMode, members: &str) -> EligibilitySpider {
    let credentials = load_credentials(CREDENTIALS).unwrap();
    let targets = load_members(members).unwrap();
    EligibilitySpider::from_config(config, mode, credentials, targets)
        .unwrap()
        .with_host("test-host")
}

fn create_test_coordinator(config: &Config, spider: EligibilitySpider, sink: &MemorySink) -> Coordinator {
    Coordinator::new(
        spider,
        Arc::new(HttpDispatcher::new(config.client.clone())),
        Arc::new(sink.clone()),
    )
}

/// Mounts the homepage (setting a session cookie) and a login that requires it
async fn mount_login(server: &MockServer) {
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("set-cookie", "portal_session=abc123; Path=/")
                .set_body_string(r#"<script>var AUTH_TOKEN = "tok-1";</script>"#),
        )
        .mount(server)
        .await;

    Mock::given(method("POST"))
        .and(path("/login/portal_user_authenticate.json"))
        .and(header("cookie", "portal_session=abc123"))
        .respond_with(ResponseTemplate::new(200).set_body_string(LOGIN_OK))
        .expect(1)
        .mount(server)
        .await;
}

/// Answers the roster list with one member under `a` and none elsewhere
struct LetterRoster;

impl Respond for LetterRoster {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let alpha = request
            .url
            .query_pairs()
            .find(|(k, _)| k == "alpha")
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default();

        let body = if alpha == "a" {
            r#"{"members_roster_list": {"num_recs": "1", "members": {
                "id": 9001, "fname": "Ana", "lname": "Diaz", "city": "Austin",
                "prov_lname": "Smith", "prov_fname": "John", "prov_title": "DDS"}}}"#
        } else {
            r#"{"members_roster_list": {"num_recs": "0", "members": null}}"#
        };
        ResponseTemplate::new(200).set_body_string(body)
    }
}

#[derive(Default)]
struct RecordingDocuments {
    names: Mutex<Vec<String>>,
}

#[async_trait]
impl DocumentSink for RecordingDocuments {
    async fn store(&self, upload: &DocumentUpload) -> Result<DocumentStatus, ServiceError> {
        self.names.lock().unwrap().push(upload.name.clone());
        Ok(DocumentStatus {
            status: "ok".to_string(),
        })
    }
}

fn members(items: &[Item]) -> Vec<&eligibility_crawler::MemberRecord> {
    items
        .iter()
        .filter_map(|item| match item {
            Item::Member(record) => Some(record),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_all_mode_collects_roster_members() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri(), "unused.db");
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/provider/members_roster"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<html><input id="facilityId" value="1001"/></html>"#),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/provider/members_roster_list.json"))
        .and(header("x-requested-with", "XMLHttpRequest"))
        .respond_with(LetterRoster)
        .expect(26)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/provider/get_member_info.json"))
        .and(query_param("id", "9001"))
        .and(query_param("providerFacilityId", "1001"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"get_member_info": {"address1": "12 Oak Ln", "csz": "Austin, TX 78701",
                "dob": "05/01/2012", "telephone": "5125550100", "subscriber_id": 700123}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let spider = create_test_spider(&config, ScrapeMode::All, "[]");
    let summary = create_test_coordinator(&config, spider, &sink)
        .run()
        .await
        .unwrap();

    // Homepage, login, roster, 26 letters, one member
    assert_eq!(summary.requests_dispatched, 30);
    assert_eq!(summary.notifications_sent, 0);

    let items = sink.items();
    assert_eq!(items[0].kind(), "status");
    assert_eq!(items[0].sync_status(), Some(SyncStatus::Pending));

    let found = members(&items);
    assert_eq!(found.len(), 1);
    let member = found[0];
    assert_eq!(member.get(Field::SubscriberId), "700123");
    assert_eq!(member.get(Field::Dob), "05/01/2012");
    assert_eq!(member.get(Field::Address), "12 Oak Ln Austin, TX 78701");
    assert_eq!(member.get(Field::Dentist), "Smith, John DDS");
    assert_eq!(member.get(Field::Username), "frontdesk");
    assert_eq!(member.get(Field::Fid), "1001");
    assert_eq!(member.sync_status(), SyncStatus::UpdatedNoPdf);
    assert_eq!(member.mco_status(), Some(true));
}

#[tokio::test]
async fn test_validate_mode_reports_facilities() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri(), "unused.db");
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/provider/members_roster"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<html><input id="facilityId" value=""/>
            <div id="headerText"><select>
                <option value="0">Select a facility</option>
                <option value="1001">Main St Clinic</option>
                <option value="1002">Uptown Clinic</option>
            </select></div></html>"#,
        ))
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let spider = create_test_spider(&config, ScrapeMode::Validate, "[]");
    create_test_coordinator(&config, spider, &sink)
        .run()
        .await
        .unwrap();

    let items = sink.items();
    assert_eq!(items.len(), 2);
    match &items[1] {
        Item::Validation(validation) => {
            assert_eq!(validation.result, ValidationOutcome::Valid);
            let fid_map = validation.fid_map.as_ref().unwrap();
            assert_eq!(fid_map.len(), 2);
            assert_eq!(fid_map.get("1002").map(String::as_str), Some("Uptown Clinic"));
        }
        other => panic!("expected a validation item, got {:?}", other),
    }
}

#[tokio::test]
async fn test_roster_redirect_invalidates_credential() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri(), "unused.db");
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/provider/members_roster"))
        .respond_with(
            ResponseTemplate::new(302).insert_header("location", format!("{}/expired", server.uri()).as_str()),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/expired"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Session expired</html>"))
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let spider = create_test_spider(&config, ScrapeMode::Validate, "[]");
    let summary = create_test_coordinator(&config, spider, &sink)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.notifications_sent, 1);

    let items = sink.items();
    assert_eq!(items.len(), 3);
    assert_eq!(items[1].sync_status(), Some(SyncStatus::Outdated));
    match &items[2] {
        Item::Validation(validation) => assert_eq!(validation.result, ValidationOutcome::Invalid),
        other => panic!("expected a validation item, got {:?}", other),
    }
}

#[tokio::test]
async fn test_partial_mode_verifies_and_stores_confirmation() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri(), "unused.db");
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/provider/verify_eligibility.json"))
        .and(query_param("verifyDob", "05/01/2012"))
        .and(query_param("verifySubscriberId", "700123"))
        .and(query_param("providerFacilityId", "1001"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"{"verify_eligibility": {"response_message": "OK", "insured": {"id": 4455}}}"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/provider/eligible/4455/700123/2012-05-01/1001/0/1"))
        .respond_with(ResponseTemplate::new(200).set_body_string(ELIGIBILITY_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/provider/print/4455"))
        .respond_with(ResponseTemplate::new(200).set_body_string(PRINT_PAGE))
        .expect(1)
        .mount(&server)
        .await;

    let targets = r#"[
        {"username": "frontdesk", "mid": "", "subscriber_id": "700123", "fid": "1001",
         "dob": "2012-05-01", "jobid": 42, "company": "Bright Smiles"},
        {"username": "someone-else", "mid": "1", "subscriber_id": "1", "fid": "1", "dob": "2010-01-01"}
    ]"#;

    let sink = MemorySink::new();
    let documents = Arc::new(RecordingDocuments::default());
    let spider = create_test_spider(&config, ScrapeMode::Partial, targets);
    let summary = create_test_coordinator(&config, spider, &sink)
        .with_documents(documents.clone())
        .run()
        .await
        .unwrap();

    assert_eq!(summary.documents_stored, 1);
    assert_eq!(summary.secondary_checks, 0);
    assert_eq!(
        *documents.names.lock().unwrap(),
        vec!["DIAZ ANA_Eligibility_700123.pdf".to_string()]
    );

    let items = sink.items();
    let found = members(&items);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].get(Field::Plan), "MEDICAID STAR");
    assert_eq!(found[0].get(Field::BecameEligibleOn), "01/01/2020");
    assert_eq!(found[0].get(Field::Practice), "Main St");
    assert_eq!(found[0].mco_status(), Some(true));
    assert_eq!(found[0].sync_status(), SyncStatus::Updated);

    match items.last() {
        Some(Item::EligibilityRequested(confirmation)) => {
            assert_eq!(confirmation.eligibility, "requested");
            assert_eq!(confirmation.subscriber_id, "700123");
            assert_eq!(confirmation.jobid, "42");
        }
        other => panic!("expected a confirmation item, got {:?}", other),
    }
}

#[tokio::test]
async fn test_malformed_member_info_is_retried_then_abandoned() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri(), "unused.db");
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/provider/members_roster"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(r#"<html><input id="facilityId" value="1001"/></html>"#),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/provider/members_roster_list.json"))
        .respond_with(LetterRoster)
        .mount(&server)
        .await;

    // One original attempt plus four reissues
    Mock::given(method("GET"))
        .and(path("/provider/get_member_info.json"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Service unavailable</html>"))
        .expect(5)
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let spider = create_test_spider(&config, ScrapeMode::All, "[]");
    let summary = create_test_coordinator(&config, spider, &sink)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.retries_scheduled, 4);
    assert_eq!(summary.notifications_sent, 1);
    assert!(members(&sink.items()).is_empty());
}

#[tokio::test]
async fn test_homepage_server_error_notifies() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri(), "unused.db");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let spider = create_test_spider(&config, ScrapeMode::All, "[]");
    let summary = create_test_coordinator(&config, spider, &sink)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.transport_failures, 1);
    assert_eq!(summary.notifications_sent, 1);
    assert!(sink.is_empty());
}

#[tokio::test]
async fn test_validate_mode_server_error_reports_invalid() {
    let server = MockServer::start().await;
    let config = create_test_config(&server.uri(), "unused.db");

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(ResponseTemplate::new(503))
        .mount(&server)
        .await;

    let sink = MemorySink::new();
    let spider = create_test_spider(&config, ScrapeMode::Validate, "[]");
    let summary = create_test_coordinator(&config, spider, &sink)
        .run()
        .await
        .unwrap();

    assert_eq!(summary.transport_failures, 1);
    let validations: Vec<_> = sink
        .items()
        .into_iter()
        .filter_map(|item| match item {
            Item::Validation(v) => Some(v),
            _ => None,
        })
        .collect();
    assert_eq!(validations.len(), 1);
    assert_eq!(validations[0].result, ValidationOutcome::Invalid);
    assert_eq!(validations[0].record.get(Field::Username), "frontdesk");
}

#[tokio::test]
async fn test_run_crawl_persists_items() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("eligibility.db");
    let config = create_test_config(&server.uri(), db_path.to_str().unwrap());
    mount_login(&server).await;

    Mock::given(method("GET"))
        .and(path("/provider/members_roster"))
        .respond_with(ResponseTemplate::new(200).set_body_string(
            r#"<div id="headerText"><option value="1001">Main St Clinic</option></div>"#,
        ))
        .mount(&server)
        .await;

    let credentials = load_credentials(CREDENTIALS).unwrap();
    let summary = run_crawl(&config, "test-hash", ScrapeMode::Validate, credentials, Vec::new())
        .await
        .unwrap();
    assert_eq!(summary.items_emitted, 2);

    let storage = SqliteStorage::new(&db_path).unwrap();
    let run = storage.get_latest_run().unwrap().unwrap();
    assert_eq!(run.status, RunStatus::Completed);
    assert_eq!(run.mode, ScrapeMode::Validate);
    assert_eq!(run.config_hash, "test-hash");

    let stats = load_statistics(&storage, Some(run.id)).unwrap();
    assert_eq!(stats.total_items, 2);
    assert_eq!(stats.kind_count("status"), 1);
    assert_eq!(stats.kind_count("validation"), 1);
    assert_eq!(stats.sync_status_count("Pending"), 1);
}
