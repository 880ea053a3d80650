pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::assessment::handlers as assessment;
use crate::drafting::handlers as drafting;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let body_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(health::root_handler))
        .route("/health", get(health::health_handler))
        .route("/assess", post(assessment::handle_assess))
        .route("/questions", post(assessment::handle_questions))
        .route("/draft", post(drafting::handle_draft))
        .layer(DefaultBodyLimit::max(body_limit))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{header, Request, StatusCode},
        response::Response,
    };
    use serde_json::Value;
    use tower::ServiceExt;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::*;
    use crate::config::Config;
    use crate::docx::package::test_docx;
    use crate::docx::DocxTemplate;
    use crate::drafting::handlers::{
        DRIVE_FILE_ID_HEADER, DRIVE_UPLOAD_STATUS_HEADER, PLACEHOLDERS_RESOLVED_HEADER,
        PLACEHOLDERS_TOTAL_HEADER,
    };
    use crate::llm_client::fake::ScriptedGenerator;
    use crate::sources::{FetchError, GoogleDriveClient, StaticToken, UnconfiguredStore, WebsiteFetcher};

    const BOUNDARY: &str = "rfp-test-boundary";

    struct Site(&'static str);

    #[async_trait]
    impl WebsiteFetcher for Site {
        async fn fetch(&self, _url: &str) -> Result<String, FetchError> {
            Ok(self.0.to_string())
        }
    }

    fn state(generator: Arc<ScriptedGenerator>) -> AppState {
        AppState {
            config: Config::for_tests(),
            llm: generator,
            fetcher: Arc::new(Site("Acme Pty Ltd, ABN 12 345 678 901, bridge engineers.")),
            store: Arc::new(UnconfiguredStore),
            drive_output: None,
        }
    }

    enum Part<'a> {
        File(&'a str, &'a [u8]),
        Text(&'a str, &'a str),
    }

    fn multipart_request(uri: &str, parts: &[Part]) -> Request<Body> {
        let mut body = Vec::new();
        for part in parts {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            match part {
                Part::File(name, bytes) => {
                    body.extend_from_slice(
                        format!(
                            "Content-Disposition: form-data; name=\"file\"; filename=\"{name}\"\r\n\
                             Content-Type: application/octet-stream\r\n\r\n"
                        )
                        .as_bytes(),
                    );
                    body.extend_from_slice(bytes);
                }
                Part::Text(name, value) => {
                    body.extend_from_slice(
                        format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}")
                            .as_bytes(),
                    );
                }
            }
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

        Request::builder()
            .method("POST")
            .uri(uri)
            .header(
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            )
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_body(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn template() -> Vec<u8> {
        test_docx(concat!(
            r#"<w:p><w:r><w:t>Name: [ClientName], ABN: [ABN]</w:t></w:r></w:p>"#,
            r#"<w:tbl><w:tr><w:tc><w:p><w:r><w:t>[Fee]</w:t></w:r></w:p></w:tc></w:tr></w:tbl>"#,
        ))
    }

    #[tokio::test]
    async fn test_root_and_health() {
        let app = build_router(state(Arc::new(ScriptedGenerator::default())));

        let response = app
            .clone()
            .oneshot(Request::get("/").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(json_body(response).await["message"]
            .as_str()
            .unwrap()
            .ends_with("is running"));

        let response = app
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(json_body(response).await["status"], "ok");
    }

    #[tokio::test]
    async fn test_draft_returns_filled_document() {
        let generator = Arc::new(ScriptedGenerator::replying(&[
            r#"{"ClientName": "Acme Pty Ltd", "ABN": "12 345 678 901"}"#,
        ]));
        let app = build_router(state(generator.clone()));
        let template = template();

        let response = app
            .oneshot(multipart_request(
                "/draft",
                &[
                    Part::File("Tender.docx", &template),
                    Part::Text("company_url", "acme.test"),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let headers = response.headers().clone();
        assert_eq!(
            headers[header::CONTENT_DISPOSITION],
            "attachment; filename=\"Draft_Tender.docx\""
        );
        assert_eq!(headers[PLACEHOLDERS_TOTAL_HEADER], "3");
        assert_eq!(headers[PLACEHOLDERS_RESOLVED_HEADER], "2");
        assert!(headers.get(DRIVE_UPLOAD_STATUS_HEADER).is_none());

        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let draft = DocxTemplate::from_bytes(&bytes).unwrap();
        let texts: Vec<String> = draft
            .document()
            .paragraphs()
            .map(|p| p.text.clone())
            .collect();
        assert_eq!(
            texts,
            vec![
                "Name: Acme Pty Ltd, ABN: 12 345 678 901".to_string(),
                "<<Fee: not found in source material>>".to_string(),
            ]
        );
        assert_eq!(generator.calls(), 1);
    }

    #[tokio::test]
    async fn test_draft_rejects_non_docx() {
        let generator = Arc::new(ScriptedGenerator::default());
        let app = build_router(state(generator.clone()));

        let response = app
            .oneshot(multipart_request(
                "/draft",
                &[Part::File("notes.txt", b"Dear [ClientName]")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "INVALID_DOCUMENT");
        assert_eq!(generator.calls(), 0);
    }

    #[tokio::test]
    async fn test_draft_rejects_corrupt_docx() {
        let app = build_router(state(Arc::new(ScriptedGenerator::default())));
        let response = app
            .oneshot(multipart_request(
                "/draft",
                &[Part::File("broken.docx", b"PK\x03\x04 definitely not a zip")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "INVALID_DOCUMENT");
    }

    #[tokio::test]
    async fn test_missing_file_field_is_validation_error() {
        let app = build_router(state(Arc::new(ScriptedGenerator::default())));
        let response = app
            .oneshot(multipart_request(
                "/draft",
                &[Part::Text("company_url", "acme.test")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json_body(response).await["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_draft_uploads_to_drive_when_configured() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/upload/drive/v3/files"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({"id": "file-1"})))
            .mount(&server)
            .await;
        Mock::given(method("PATCH"))
            .and(path("/drive/v3/files/file-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "file-1",
                "name": "Draft_Tender.docx"
            })))
            .mount(&server)
            .await;

        let drive = GoogleDriveClient::new(
            Arc::new(StaticToken::new("token")),
            None,
            Some("output-folder".to_string()),
        )
        .unwrap()
        .with_base_url(server.uri());
        let mut state = state(Arc::new(ScriptedGenerator::replying(&["{}"])));
        state.drive_output = Some(Arc::new(drive));
        let template = template();

        let response = build_router(state)
            .oneshot(multipart_request(
                "/draft",
                &[
                    Part::File("Tender.docx", &template),
                    Part::Text("company_url", "acme.test"),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[DRIVE_FILE_ID_HEADER], "file-1");
        assert_eq!(response.headers()[DRIVE_UPLOAD_STATUS_HEADER], "success");
    }

    #[tokio::test]
    async fn test_drive_upload_failure_does_not_fail_request() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let drive = GoogleDriveClient::new(Arc::new(StaticToken::new("token")), None, Some("out".to_string()))
            .unwrap()
            .with_base_url(server.uri());
        let mut state = state(Arc::new(ScriptedGenerator::replying(&["{}"])));
        state.drive_output = Some(Arc::new(drive));
        let template = template();

        let response = build_router(state)
            .oneshot(multipart_request(
                "/draft",
                &[Part::File("Tender.docx", &template)],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[DRIVE_UPLOAD_STATUS_HEADER], "failed");
        assert!(response.headers().get(DRIVE_FILE_ID_HEADER).is_none());
    }

    #[tokio::test]
    async fn test_assess_returns_scores() {
        let generator = Arc::new(ScriptedGenerator::replying(&[
            r#"{"score": 55, "recommendation": "No Pursue",
                "criteria_scores": {"strategy": 60, "offerings": 50, "resources": 40, "risks": 70},
                "reasoning": "Outside our core sectors."}"#,
        ]));
        let app = build_router(state(generator.clone()));

        let response = app
            .oneshot(multipart_request(
                "/assess",
                &[Part::File("rfp.txt", b"Request for proposal: offshore wind survey")],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["score"], 55);
        assert_eq!(body["recommendation"], "No Pursue");
        assert_eq!(body["criteria_scores"]["risks"], 70);
        assert!(generator.prompts()[0].contains("offshore wind survey"));
    }

    #[tokio::test]
    async fn test_assess_unusable_response_is_llm_error() {
        let generator = Arc::new(ScriptedGenerator::replying(&["I cannot score this."]));
        let response = build_router(state(generator))
            .oneshot(multipart_request("/assess", &[Part::File("rfp.txt", b"RFP")]))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(json_body(response).await["error"]["code"], "LLM_ERROR");
    }

    #[tokio::test]
    async fn test_questions_use_company_website() {
        let generator = Arc::new(ScriptedGenerator::replying(&[
            r#"[{"question": "Is the budget fixed?", "priority": "Low", "category": "Budget"},
                {"question": "Who sits on the panel?", "priority": "High", "category": "Evaluation"}]"#,
        ]));
        let app = build_router(state(generator.clone()));

        let response = app
            .oneshot(multipart_request(
                "/questions",
                &[
                    Part::File("rfp.md", b"# RFP\nBridge inspection services"),
                    Part::Text("company_url", "acme.test"),
                ],
            ))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let body = json_body(response).await;
        assert_eq!(body["questions"][0]["priority"], "High");
        assert_eq!(body["questions"][1]["category"], "Budget");
        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("bridge engineers"));
        assert!(prompt.contains("Bridge inspection services"));
    }
}
