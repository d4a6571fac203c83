use folio_service::{Error, UploadRequest};

#[tokio::test]
#[ignore = "Requires external Postgres. Set FOLIO_PG_DSN to run."]
async fn reset_removes_document_chunks_and_blob() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping reset_removes_document_chunks_and_blob; set FOLIO_PG_DSN to run this test."
		);

		return;
	};
	let blob_root = super::temp_blob_root();
	let cfg = super::test_config(test_db.dsn().to_string(), &blob_root);
	let service = super::build_service(cfg, super::mock_providers(super::report_pages(), "ok"))
		.await
		.expect("Failed to build service.");
	let uploaded = service
		.upload(UploadRequest {
			file_name: "report.pdf".to_string(),
			content_type: Some("application/pdf".to_string()),
			bytes: super::fake_pdf_bytes(),
		})
		.await
		.expect("Upload failed.");
	let document_dir = blob_root.join(uploaded.document_id.to_string());

	assert!(document_dir.join("report.pdf").exists());

	service.process_document(uploaded.document_id).await.expect("Processing failed.");

	let health = service.health().await.expect("Health failed.");

	assert_eq!(health.status, "healthy");
	assert_eq!(health.documents, 1);
	assert_eq!(health.ready_documents, 1);

	let reset = service.reset(uploaded.document_id).await.expect("Reset failed.");

	assert_eq!(reset.message, format!("Session {} reset successfully.", uploaded.document_id));
	assert!(!document_dir.exists());

	let chunks = folio_storage::chunks::count_chunks(&service.db.pool, uploaded.document_id)
		.await
		.expect("Failed to count chunks.");

	assert_eq!(chunks, 0);

	let health = service.health().await.expect("Health failed.");

	assert_eq!(health.documents, 0);
	assert_eq!(health.pending_jobs, 0);

	let err = service.reset(uploaded.document_id).await.expect_err("Expected a missing session.");

	assert!(matches!(err, Error::NotFound { .. }));

	let err = service.status(uploaded.document_id).await.expect_err("Expected a missing session.");

	assert!(matches!(err, Error::NotFound { ref message } if message.contains("upload the PDF")));

	test_db.cleanup().await.expect("Failed to cleanup test database.");

	let _ = std::fs::remove_dir_all(&blob_root);
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set FOLIO_PG_DSN to run."]
async fn health_counts_pending_jobs() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping health_counts_pending_jobs; set FOLIO_PG_DSN to run this test.");

		return;
	};
	let blob_root = super::temp_blob_root();
	let cfg = super::test_config(test_db.dsn().to_string(), &blob_root);
	let service = super::build_service(cfg, super::mock_providers(super::report_pages(), "ok"))
		.await
		.expect("Failed to build service.");

	for name in ["a.pdf", "b.pdf"] {
		service
			.upload(UploadRequest {
				file_name: name.to_string(),
				content_type: None,
				bytes: super::fake_pdf_bytes(),
			})
			.await
			.expect("Upload failed.");
	}

	let health = service.health().await.expect("Health failed.");

	assert_eq!(health.documents, 2);
	assert_eq!(health.ready_documents, 0);
	assert_eq!(health.pending_jobs, 2);

	test_db.cleanup().await.expect("Failed to cleanup test database.");

	let _ = std::fs::remove_dir_all(&blob_root);
}
