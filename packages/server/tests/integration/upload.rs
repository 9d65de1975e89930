use std::collections::HashSet;

use sea_orm::{EntityTrait, PaginatorTrait};

use filedrop::entity::upload;

use crate::common::{MAX_UPLOAD_SIZE, TestApp, UploadForm, routes};

mod upload_intake {
    use super::*;

    #[tokio::test]
    async fn upload_returns_identifier_and_metadata() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(UploadForm::complete("quarterly report.pdf", b"%PDF-1.4 data"))
            .await;

        assert_eq!(res.status, 201, "{}", res.text);
        let id = res.id();
        assert_eq!(id.len(), 36);
        assert_eq!(res.body["name"].as_str().unwrap(), "quarterly%20report.pdf");
        assert_eq!(res.body["filename"].as_str().unwrap(), "quarterly report.pdf");
        assert_eq!(res.body["size"].as_u64().unwrap(), 13);
        assert!(res.body["time"].as_str().is_some());
    }

    #[tokio::test]
    async fn missing_file_part_wins_over_missing_fields() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(UploadForm {
                file: None,
                sender: None,
                receiver: None,
            })
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "NO_FILE_PART");
        assert_eq!(res.body["message"].as_str().unwrap(), "No file part");
    }

    #[tokio::test]
    async fn fields_without_file_part_is_no_file_part() {
        let app = TestApp::spawn().await;

        let res = app
            .upload(UploadForm {
                file: None,
                sender: Some("alice"),
                receiver: Some("bob"),
            })
            .await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "NO_FILE_PART");
    }

    #[tokio::test]
    async fn urlencoded_form_is_no_file_part() {
        let app = TestApp::spawn().await;

        let res = app.post_form(&[("sender", "alice"), ("receiver", "bob")]).await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.code(), "NO_FILE_PART");
        assert_eq!(res.body["message"].as_str().unwrap(), "No file part");
    }

    #[tokio::test]
    async fn bodyless_post_is_no_file_part() {
        let app = TestApp::spawn().await;

        let res = app.post_empty().await;

        assert_eq!(res.status, 400, "{}", res.text);
        assert_eq!(res.code(), "NO_FILE_PART");
        assert_eq!(upload::Entity::find().count(&app.db).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn file_part_without_filename_is_not_a_file() {
        let app = TestApp::spawn().await;

        let form = reqwest::multipart::Form::new()
            .percent_encode_noop()
            .text("file", "just text")
            .text("sender", "alice")
            .text("receiver", "bob");
        let res = app.post_multipart(form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "NO_FILE_PART");
    }

    #[tokio::test]
    async fn missing_sender_is_rejected() {
        let app = TestApp::spawn().await;

        let mut form = UploadForm::complete("a.txt", b"data");
        form.sender = None;
        form.receiver = None;
        let res = app.upload(form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "NO_SENDER");
    }

    #[tokio::test]
    async fn missing_receiver_is_rejected() {
        let app = TestApp::spawn().await;

        let mut form = UploadForm::complete("a.txt", b"data");
        form.receiver = None;
        let res = app.upload(form).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "NO_RECEIVER");
    }

    #[tokio::test]
    async fn empty_filename_is_rejected() {
        let app = TestApp::spawn().await;

        let res = app.upload(UploadForm::complete("", b"data")).await;

        assert_eq!(res.status, 400);
        assert_eq!(res.code(), "NO_FILENAME_SELECTED");
    }

    #[tokio::test]
    async fn disallowed_extensions_are_rejected() {
        let app = TestApp::spawn().await;

        for name in ["malware.exe", "report.PDF", "archive.tar.gz", "noextension"] {
            let res = app.upload(UploadForm::complete(name, b"data")).await;
            assert_eq!(res.status, 400, "{name} was accepted");
            assert_eq!(res.code(), "DISALLOWED_EXTENSION", "{name}");
        }
    }

    #[tokio::test]
    async fn rejections_leave_no_trace() {
        let app = TestApp::spawn().await;

        app.upload(UploadForm::complete("malware.exe", b"MZ")).await;
        app.upload(UploadForm {
            file: Some(("a.txt", b"data".to_vec())),
            sender: None,
            receiver: Some("bob"),
        })
        .await;

        assert_eq!(upload::Entity::find().count(&app.db).await.unwrap(), 0);
        assert_eq!(app.blob_count(), 0);
    }

    #[tokio::test]
    async fn oversized_file_is_rejected() {
        let app = TestApp::spawn().await;

        let big = vec![b'x'; MAX_UPLOAD_SIZE as usize + 1];
        let res = app.upload(UploadForm::complete("big.zip", &big)).await;

        assert_eq!(res.status, 413);
        assert_eq!(app.blob_count(), 0);
    }

    #[tokio::test]
    async fn identifiers_are_unique_and_paired_with_blobs() {
        let app = TestApp::spawn().await;

        let mut ids = HashSet::new();
        for i in 0..10 {
            let id = app.upload_ok("notes.txt", format!("note {i}").as_bytes()).await;
            ids.insert(id);
        }

        assert_eq!(ids.len(), 10);
        assert_eq!(upload::Entity::find().count(&app.db).await.unwrap(), 10);
        assert_eq!(app.blob_count(), 10);
    }

    #[tokio::test]
    async fn identical_content_gets_separate_uploads() {
        let app = TestApp::spawn().await;

        let a = app.upload_ok("same.txt", b"same bytes").await;
        let b = app.upload_ok("same.txt", b"same bytes").await;

        assert_ne!(a, b);
        assert_eq!(app.blob_count(), 2);
    }
}

mod upload_retrieval {
    use super::*;

    #[tokio::test]
    async fn show_returns_metadata() {
        let app = TestApp::spawn().await;
        let id = app.upload_ok("photo.jpg", b"JPEG").await;

        let res = app.get(&routes::upload(&id)).await;

        assert_eq!(res.status, 200, "{}", res.text);
        assert_eq!(res.body["id"].as_str().unwrap(), id);
        assert_eq!(res.body["filename"].as_str().unwrap(), "photo.jpg");
        assert!(res.body["time"].as_str().is_some());
    }

    #[tokio::test]
    async fn download_round_trips_bytes_and_filename() {
        let app = TestApp::spawn().await;
        let data: Vec<u8> = (0..=255u8).cycle().take(5000).collect();
        let id = app.upload_ok("quarterly report.pdf", &data).await;

        let res = app.download_raw(&routes::download(&id)).await;

        assert_eq!(res.status, 200);
        assert_eq!(res.bytes, data);
        assert_eq!(res.headers["content-type"], "application/pdf");
        assert_eq!(res.headers["content-length"], data.len().to_string().as_str());
        let disposition = res.headers["content-disposition"].to_str().unwrap();
        assert_eq!(
            disposition,
            "attachment; filename=\"quarterlyreport.pdf\"; filename*=UTF-8''quarterly%20report.pdf"
        );
    }

    #[tokio::test]
    async fn unissued_identifier_is_not_found() {
        let app = TestApp::spawn().await;
        let id = uuid::Uuid::new_v4().to_string();

        let meta = app.get(&routes::upload(&id)).await;
        assert_eq!(meta.status, 404);
        assert_eq!(meta.code(), "NOT_FOUND");

        let download = app.download_raw(&routes::download(&id)).await;
        assert_eq!(download.status, 404);
    }

    #[tokio::test]
    async fn malformed_identifier_is_rejected() {
        let app = TestApp::spawn().await;

        for bad in [
            "not-a-uuid",
            "..%2F..%2Fetc%2Fpasswd",
            "67E55044-10B1-426F-9247-BB680E5FE0C8",
        ] {
            let meta = app.get(&routes::upload(bad)).await;
            assert_eq!(meta.status, 400, "{bad}");
            assert_eq!(meta.code(), "VALIDATION_ERROR");

            let download = app.download_raw(&routes::download(bad)).await;
            assert_eq!(download.status, 400, "{bad}");
        }
    }

    #[tokio::test]
    async fn openapi_document_lists_upload_routes() {
        let app = TestApp::spawn().await;

        let res = app.get("/api-docs/openapi.json").await;

        assert_eq!(res.status, 200);
        let paths = res.body["paths"].as_object().unwrap();
        assert!(paths.keys().any(|p| p.ends_with("/{id}/download")));
    }
}
