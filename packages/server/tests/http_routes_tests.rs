//! Router tests over in-memory dependencies.

use std::sync::Arc;
use std::time::Duration;

use affiliation_core::common::UserId;
use affiliation_core::domains::auth::JwtService;
use affiliation_core::kernel::TestDependencies;
use affiliation_core::server::build_app;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const MEMBER: i64 = 7;
const OWNER: i64 = 11;
const ADMIN: i64 = 1;
const ACME: i64 = 3;

struct TestApp {
    router: Router,
    jwt: Arc<JwtService>,
    deps: TestDependencies,
}

impl TestApp {
    fn new() -> Self {
        let deps = TestDependencies::new()
            .user(ADMIN, "Admin")
            .user(MEMBER, "Ayesha")
            .user(OWNER, "Owner")
            .page(ACME, OWNER, "Acme");
        let jwt = Arc::new(JwtService::new("test_secret", "affiliation".to_string()));
        let router = build_app(
            deps.clone().into_server_deps(),
            jwt.clone(),
            None,
            Duration::from_secs(5),
        );

        Self { router, jwt, deps }
    }

    fn token(&self, user_id: i64, is_admin: bool) -> String {
        self.jwt
            .create_token(UserId::new(user_id), is_admin)
            .unwrap()
    }

    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    async fn post_json(&self, path: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        let mut request = Request::post(path).header(header::CONTENT_TYPE, "application/json");
        if let Some(token) = token {
            request = request.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        self.send(request.body(Body::from(body.to_string())).unwrap())
            .await
    }

    async fn get(&self, path: &str, token: &str) -> (StatusCode, Value) {
        let request = Request::get(path)
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::empty())
            .unwrap();
        self.send(request).await
    }

    async fn post_multipart(
        &self,
        path: &str,
        token: &str,
        fields: &[(&str, &str)],
        files: &[(&str, &str, &[u8])],
    ) -> (StatusCode, Value) {
        let boundary = "affiliation-test-boundary";
        let mut body = Vec::new();
        for (name, value) in fields {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                    boundary, name, value
                )
                .as_bytes(),
            );
        }
        for (name, file_name, bytes) in files {
            body.extend_from_slice(
                format!(
                    "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: application/pdf\r\n\r\n",
                    boundary, name, file_name
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{}--\r\n", boundary).as_bytes());

        let request = Request::post(path)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={}", boundary),
            )
            .header(header::AUTHORIZATION, format!("Bearer {}", token))
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }
}

fn request_body() -> Value {
    json!({
        "companyId": ACME,
        "companyName": "Acme",
        "jobTitle": "Engineer",
        "location": "Lahore",
        "startDate": "2021-03-01",
        "currentlyWorking": true,
        "responsibilities": "Backend services"
    })
}

#[tokio::test]
async fn test_health_without_database() {
    let app = TestApp::new();
    let request = Request::get("/health").body(Body::empty()).unwrap();

    let (status, body) = app.send(request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"]["status"], "skipped");
}

#[tokio::test]
async fn test_missing_token_is_401() {
    let app = TestApp::new();

    let (status, body) = app
        .post_json("/requestmembership", None, request_body())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);

    let (status, _) = app
        .post_json("/requestmembership", Some("not-a-token"), request_body())
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_request_approve_verify_over_http() {
    let app = TestApp::new();
    let member = app.token(MEMBER, false);
    let owner = app.token(OWNER, false);
    let admin = app.token(ADMIN, true);

    let (status, body) = app
        .post_json("/requestmembership", Some(&member), request_body())
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["status"], "pending");
    let id = body["data"]["membership_id"].as_i64().unwrap();

    let (status, _) = app
        .post_json("/requestmembership", Some(&member), request_body())
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = app
        .post_json(&format!("/approveMembership/{}", id), Some(&owner), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "company_approved");

    let (status, body) = app.get("/getUserMembershipsForAdmin", &admin).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let (status, _) = app.get("/getUserMembershipsForAdmin", &owner).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = app
        .post_json(
            "/updateUserMembershipStatus",
            Some(&admin),
            json!({ "membership_id": id, "status": "admin_verified" }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "admin_verified");

    let (status, body) = app.get("/checkverifiedMembershipbadge", &member).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["verified"], true);

    let (status, body) = app
        .post_json(
            "/getUserApprovedMemberships",
            Some(&owner),
            json!({ "page_id": ACME }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"][0]["name"], "Ayesha");
    assert_eq!(body["data"][0]["type"], "user");
}

#[tokio::test]
async fn test_validation_errors_are_keyed_by_field() {
    let app = TestApp::new();
    let member = app.token(MEMBER, false);

    let (status, body) = app
        .post_json(
            "/requestmembership",
            Some(&member),
            json!({ "companyId": ACME, "startDate": "01/03/2021" }),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["errors"]["job_title"].is_array());
    assert!(body["errors"]["start_date"].is_array());
}

#[tokio::test]
async fn test_reject_twice_is_conflict() {
    let app = TestApp::new();
    let member = app.token(MEMBER, false);
    let owner = app.token(OWNER, false);

    let (_, body) = app
        .post_json("/requestmembership", Some(&member), request_body())
        .await;
    let id = body["data"]["membership_id"].as_i64().unwrap();

    let (status, _) = app
        .post_json(&format!("/rejectMembership/{}", id), Some(&owner), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = app
        .post_json(&format!("/rejectMembership/{}", id), Some(&owner), json!({}))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["message"], "Membership is already rejected");
}

#[tokio::test]
async fn test_company_proposal_multipart() {
    let app = TestApp::new();
    let owner = app.token(OWNER, false);
    let member = app.token(MEMBER, false);

    let (status, body) = app
        .post_multipart(
            "/requestMembershipCompanySide",
            &owner,
            &[
                ("companyId", "3"),
                ("user_page_id", "7"),
                ("companyName", "Acme"),
                ("jobTitle", "Engineer"),
                ("location", "Lahore"),
                ("startDate", "2021-03-01"),
                ("currentlyWorking", "1"),
            ],
            &[
                ("confirmation_letter", "letter.pdf", b"%PDF-1.4 letter"),
                ("proof_document", "proof.pdf", b"%PDF-1.4 proof"),
            ],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["initiated_by"], "company");
    assert_eq!(body["data"]["documents"].as_array().unwrap().len(), 2);
    assert_eq!(app.deps.blobs.paths().len(), 2);

    let (status, body) = app
        .post_json("/getCompaniesMemberships", Some(&member), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    let invitation = body["data"][0]["id"].as_i64().unwrap();

    let (status, body) = app
        .post_json(
            "/approvedCompanyInvitations",
            Some(&member),
            json!({ "id": invitation }),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "company_approved");
}

#[tokio::test]
async fn test_proposal_missing_document_is_422() {
    let app = TestApp::new();
    let owner = app.token(OWNER, false);

    let (status, body) = app
        .post_multipart(
            "/requestMembershipCompanySide",
            &owner,
            &[
                ("companyId", "3"),
                ("user_page_id", "7"),
                ("companyName", "Acme"),
                ("jobTitle", "Engineer"),
                ("location", "Lahore"),
                ("startDate", "2021-03-01"),
                ("currentlyWorking", "true"),
            ],
            &[("confirmation_letter", "letter.pdf", b"%PDF-1.4 letter")],
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(
        body["errors"]["proof_document"][0],
        "The proof document field is required."
    );
    assert!(app.deps.memberships.all().is_empty());
}

#[tokio::test]
async fn test_attach_document_multipart() {
    let app = TestApp::new();
    let member = app.token(MEMBER, false);

    let (_, body) = app
        .post_json("/requestmembership", Some(&member), request_body())
        .await;
    let id = body["data"]["membership_id"].as_i64().unwrap();

    let (status, body) = app
        .post_multipart(
            &format!("/membershipDocuments/{}", id),
            &member,
            &[("kind", "proof_document")],
            &[("file", "payslip.pdf", b"%PDF-1.4 payslip")],
        )
        .await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["data"]["kind"], "proof_document");
    assert_eq!(body["data"]["uploaded_by"], "subject");

    let (status, body) = app
        .post_multipart(
            &format!("/membershipDocuments/{}", id),
            &member,
            &[("kind", "passport")],
            &[("file", "payslip.pdf", b"%PDF-1.4 payslip")],
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body["errors"]["kind"].is_array());
}

#[tokio::test]
async fn test_company_invitations_404_when_empty() {
    let app = TestApp::new();
    app.deps.directory.add_page(20, MEMBER, "Ayesha Studio");
    let member = app.token(MEMBER, false);

    let (status, body) = app
        .post_json("/getCompanyInvitations", Some(&member), json!({ "page_id": 20 }))
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "No pending invitations found");
}

#[tokio::test]
async fn test_owner_inbox_for_user_without_pages() {
    let app = TestApp::new();
    let member = app.token(MEMBER, false);

    let (status, body) = app
        .post_json("/getUserMemberships", Some(&member), json!({}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], json!([]));
}

#[tokio::test]
async fn test_getcompanies_without_body() {
    let app = TestApp::new();
    let member = app.token(MEMBER, false);

    let request = Request::post("/getcompanies")
        .header(header::AUTHORIZATION, format!("Bearer {}", member))
        .body(Body::empty())
        .unwrap();
    let (status, body) = app.send(request).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["per_page"], 2);
    assert_eq!(body["data"]["total"], 1);
}

#[tokio::test]
async fn test_malformed_membership_id_uses_envelope() {
    let app = TestApp::new();
    let owner = app.token(OWNER, false);

    let (status, body) = app
        .post_json("/approveMembership/abc", Some(&owner), json!({}))
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert!(body["errors"]["id"].is_array());
}

#[tokio::test]
async fn test_getcompanies_with_huge_page_is_empty() {
    let app = TestApp::new();
    let member = app.token(MEMBER, false);

    let (status, body) = app
        .post_json(
            "/getcompanies",
            Some(&member),
            json!({ "page": i64::MAX, "per_page": 100 }),
        )
        .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["data"], json!([]));
    assert_eq!(body["data"]["total"], 1);
}
