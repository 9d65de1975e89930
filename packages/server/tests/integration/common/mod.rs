use std::net::SocketAddr;

use reqwest::Client;
use reqwest::multipart::{Form, Part};
use sea_orm::DatabaseConnection;
use serde_json::Value;
use tempfile::TempDir;

use filedrop::config::{
    AppConfig, CorsConfig, DatabaseConfig, IntakeConfig, ServerConfig, StorageConfig,
};
use filedrop::state::AppState;

pub mod routes {
    pub const UPLOADS: &str = "/api/v1/uploads";

    pub fn upload(id: &str) -> String {
        format!("/api/v1/uploads/{id}")
    }

    pub fn download(id: &str) -> String {
        format!("/api/v1/uploads/{id}/download")
    }
}

/// Maximum file size configured for test servers.
pub const MAX_UPLOAD_SIZE: u64 = 64 * 1024;

/// A running test server backed by a throwaway SQLite file and upload dir.
pub struct TestApp {
    pub addr: SocketAddr,
    pub client: Client,
    pub db: DatabaseConnection,
    pub dir: TempDir,
}

/// Parsed HTTP response for test assertions.
pub struct TestResponse {
    pub status: u16,
    /// Raw response body as text.
    pub text: String,
    /// Parsed JSON body, or `Null` if the response is not valid JSON.
    pub body: Value,
}

/// Raw response for download assertions.
pub struct RawResponse {
    pub status: u16,
    pub headers: reqwest::header::HeaderMap,
    pub bytes: Vec<u8>,
}

/// Multipart parts to send. `None` leaves the part out entirely.
pub struct UploadForm<'a> {
    pub file: Option<(&'a str, Vec<u8>)>,
    pub sender: Option<&'a str>,
    pub receiver: Option<&'a str>,
}

impl<'a> UploadForm<'a> {
    pub fn complete(file_name: &'a str, bytes: &[u8]) -> Self {
        Self {
            file: Some((file_name, bytes.to_vec())),
            sender: Some("alice"),
            receiver: Some("bob"),
        }
    }
}

impl TestApp {
    pub async fn spawn() -> Self {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");

        let app_config = AppConfig {
            server: ServerConfig {
                host: "127.0.0.1".to_string(),
                port: 0,
                cors: CorsConfig {
                    allow_origins: vec![],
                    max_age: 3600,
                },
            },
            database: DatabaseConfig {
                url: format!("sqlite://{}?mode=rwc", dir.path().join("filedrop.db").display()),
                max_connections: 5,
            },
            storage: StorageConfig {
                upload_dir: dir.path().join("uploads"),
                max_upload_size: MAX_UPLOAD_SIZE,
            },
            intake: IntakeConfig::default(),
        };

        let db = filedrop::database::init_db(&app_config.database)
            .await
            .expect("Failed to initialize test database");

        let state = AppState::new(app_config, db.clone())
            .await
            .expect("Failed to open upload directory");

        let app = filedrop::build_router(state);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind to random port");
        let addr = listener.local_addr().unwrap();

        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            addr,
            client: Client::new(),
            db,
            dir,
        }
    }

    fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send GET request");

        TestResponse::from_response(res).await
    }

    pub async fn download_raw(&self, path: &str) -> RawResponse {
        let res = self
            .client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to send download request");

        let status = res.status().as_u16();
        let headers = res.headers().clone();
        let bytes = res.bytes().await.expect("Failed to read body").to_vec();
        RawResponse {
            status,
            headers,
            bytes,
        }
    }

    pub async fn upload(&self, form: UploadForm<'_>) -> TestResponse {
        // Send filenames verbatim; the server does its own encoding.
        let mut multipart = Form::new().percent_encode_noop();
        if let Some((file_name, bytes)) = form.file {
            let part = Part::bytes(bytes)
                .file_name(file_name.to_string())
                .mime_str("application/octet-stream")
                .expect("Failed to set MIME type");
            multipart = multipart.part("file", part);
        }
        if let Some(sender) = form.sender {
            multipart = multipart.text("sender", sender.to_string());
        }
        if let Some(receiver) = form.receiver {
            multipart = multipart.text("receiver", receiver.to_string());
        }

        self.post_multipart(multipart).await
    }

    pub async fn post_multipart(&self, form: Form) -> TestResponse {
        let res = self
            .client
            .post(self.url(routes::UPLOADS))
            .multipart(form)
            .send()
            .await
            .expect("Failed to send multipart upload request");

        TestResponse::from_response(res).await
    }

    /// POST a urlencoded form to the upload route.
    pub async fn post_form(&self, fields: &[(&str, &str)]) -> TestResponse {
        let res = self
            .client
            .post(self.url(routes::UPLOADS))
            .form(fields)
            .send()
            .await
            .expect("Failed to send form request");

        TestResponse::from_response(res).await
    }

    /// POST an empty body with no content type to the upload route.
    pub async fn post_empty(&self) -> TestResponse {
        let res = self
            .client
            .post(self.url(routes::UPLOADS))
            .send()
            .await
            .expect("Failed to send empty request");

        TestResponse::from_response(res).await
    }

    /// Upload a valid file and return its identifier.
    pub async fn upload_ok(&self, file_name: &str, bytes: &[u8]) -> String {
        let res = self.upload(UploadForm::complete(file_name, bytes)).await;
        assert_eq!(res.status, 201, "upload failed: {}", res.text);
        res.id()
    }

    /// Number of blob files in the upload directory.
    pub fn blob_count(&self) -> usize {
        std::fs::read_dir(self.dir.path().join("uploads"))
            .expect("upload dir should exist")
            .filter(|entry| {
                entry
                    .as_ref()
                    .map(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
                    .unwrap_or(false)
            })
            .count()
    }
}

impl TestResponse {
    pub async fn from_response(res: reqwest::Response) -> Self {
        let status = res.status().as_u16();
        let text = res.text().await.unwrap_or_default();
        let body = serde_json::from_str(&text).unwrap_or(Value::Null);
        Self { status, text, body }
    }

    pub fn id(&self) -> String {
        self.body["id"]
            .as_str()
            .expect("response body should contain 'id'")
            .to_string()
    }

    pub fn code(&self) -> &str {
        self.body["code"].as_str().unwrap_or_default()
    }
}
