use std::sync::{Arc, Mutex};

use folio_service::{AskRequest, Error, IngestOutcome, Providers, UploadRequest, UploadResponse};

use super::{KeywordEmbedding, ScriptedGeneration, SpyEmbedding, StubPdf, VECTOR_DIM};

fn short_pages() -> Vec<String> {
	[
		"Section one explains the purpose of the audit.",
		"Section two lists the sampled invoices and receipts.",
		"Section three records the exceptions that were found.",
		"Section four proposes fixes for the approval workflow.",
		"Section five sets the date of the follow-up review.",
	]
	.iter()
	.map(|page| page.to_string())
	.collect()
}

async fn upload_fake(service: &folio_service::FolioService) -> UploadResponse {
	service
		.upload(UploadRequest {
			file_name: "audit.pdf".to_string(),
			content_type: Some("application/pdf".to_string()),
			bytes: super::fake_pdf_bytes(),
		})
		.await
		.expect("Upload failed.")
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set FOLIO_PG_DSN to run."]
async fn uploaded_pdf_becomes_answerable() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping uploaded_pdf_becomes_answerable; set FOLIO_PG_DSN to run this test.");

		return;
	};
	let blob_root = super::temp_blob_root();
	let cfg = super::test_config(test_db.dsn().to_string(), &blob_root);
	let generation = Arc::new(ScriptedGeneration::new(vec![
		"Revenue grew because European subscription sales doubled.".to_string(),
	]));
	let prompts = generation.prompts.clone();
	let mut providers = Providers::default();

	providers.embedding = Arc::new(KeywordEmbedding { vector_dim: VECTOR_DIM });
	providers.generation = generation;

	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");
	let pages = super::report_pages();
	let page_refs: Vec<&str> = pages.iter().map(String::as_str).collect();
	let bytes = folio_testkit::pdf_with_pages(&page_refs).expect("Failed to build PDF.");
	let uploaded = service
		.upload(UploadRequest {
			file_name: "quarterly report.pdf".to_string(),
			content_type: Some("application/pdf".to_string()),
			bytes,
		})
		.await
		.expect("Upload failed.");

	assert_eq!(uploaded.file_name, "quarterly report.pdf");
	assert!(
		blob_root.join(uploaded.document_id.to_string()).join("quarterly_report.pdf").exists()
	);
	assert_eq!(uploaded.pages, 3);
	assert!(!uploaded.processing_status.text_extraction);
	assert!(!uploaded.processing_status.ai_ready);

	let outcome =
		service.process_document(uploaded.document_id).await.expect("Processing failed.");
	let IngestOutcome::Ready { total_chunks, embedded } = outcome else {
		panic!("Expected the document to become ready, got {outcome:?}.");
	};

	assert!(total_chunks >= 3);
	assert_eq!(embedded, total_chunks);

	let status = service.status(uploaded.document_id).await.expect("Status failed.");

	assert!(status.processing_status.text_extraction);
	assert!(status.processing_status.vector_embedding);
	assert!(status.processing_status.ai_ready);
	assert_eq!(status.processing_status.current_chunk, total_chunks);
	assert_eq!(status.processing_status.error, None);
	assert!(status.word_count > 0);

	let answer = service
		.ask(AskRequest {
			question: "Why did quarterly revenue grow?".to_string(),
			document_id: uploaded.document_id,
		})
		.await
		.expect("Ask failed.");

	assert_eq!(answer.answer, "Revenue grew because European subscription sales doubled.");
	assert!(!answer.sources.is_empty());
	assert!(answer.sources.iter().any(|source| source.page == 1));
	assert!(answer.sources.iter().all(|source| (1..=3).contains(&source.page)));

	let prompts = prompts.lock().expect("Prompt log poisoned.");
	let user_prompt = prompts[0][1]["content"].as_str().expect("Expected user prompt.");

	assert!(user_prompt.contains("Question: Why did quarterly revenue grow?"));
	assert!(user_prompt.contains("(page 1)"));

	test_db.cleanup().await.expect("Failed to cleanup test database.");

	let _ = std::fs::remove_dir_all(&blob_root);
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set FOLIO_PG_DSN to run."]
async fn chunks_are_embedded_in_configured_batches() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping chunks_are_embedded_in_configured_batches; set FOLIO_PG_DSN to run this test."
		);

		return;
	};
	let blob_root = super::temp_blob_root();
	let mut cfg = super::test_config(test_db.dsn().to_string(), &blob_root);

	cfg.providers.embedding.batch_size = 2;

	let batches = Arc::new(Mutex::new(Vec::new()));
	let providers = Providers::new(
		Arc::new(SpyEmbedding {
			vector_dim: VECTOR_DIM,
			batches: batches.clone(),
			fail_after: None,
		}),
		Arc::new(ScriptedGeneration::new(Vec::new())),
		Arc::new(StubPdf { pages: short_pages() }),
	);
	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");
	let uploaded = upload_fake(&service).await;
	let outcome =
		service.process_document(uploaded.document_id).await.expect("Processing failed.");

	assert_eq!(outcome, IngestOutcome::Ready { total_chunks: 5, embedded: 5 });
	assert_eq!(*batches.lock().expect("Batch log poisoned."), vec![2, 2, 1]);

	let stored =
		folio_storage::chunks::list_leading_chunks(&service.db.pool, uploaded.document_id, 10)
			.await
			.expect("Failed to list chunks.");
	let pages: Vec<i32> = stored.iter().map(|chunk| chunk.page_number).collect();

	assert_eq!(pages, vec![1, 2, 3, 4, 5]);

	test_db.cleanup().await.expect("Failed to cleanup test database.");

	let _ = std::fs::remove_dir_all(&blob_root);
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set FOLIO_PG_DSN to run."]
async fn interrupted_embedding_resumes_from_stored_chunks() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping interrupted_embedding_resumes_from_stored_chunks; set FOLIO_PG_DSN to run \
			 this test."
		);

		return;
	};
	let blob_root = super::temp_blob_root();
	let mut cfg = super::test_config(test_db.dsn().to_string(), &blob_root);

	cfg.providers.embedding.batch_size = 2;

	let first_batches = Arc::new(Mutex::new(Vec::new()));
	let flaky = Providers::new(
		Arc::new(SpyEmbedding {
			vector_dim: VECTOR_DIM,
			batches: first_batches.clone(),
			fail_after: Some(1),
		}),
		Arc::new(ScriptedGeneration::new(Vec::new())),
		Arc::new(StubPdf { pages: short_pages() }),
	);
	let service = super::build_service(cfg, flaky).await.expect("Failed to build service.");
	let uploaded = upload_fake(&service).await;
	let err = service
		.process_document(uploaded.document_id)
		.await
		.expect_err("Expected the embedding outage to fail the run.");

	assert!(matches!(err, Error::Provider { .. }));
	assert!(!err.is_permanent());

	let status = service.status(uploaded.document_id).await.expect("Status failed.");

	assert!(status.processing_status.text_extraction);
	assert_eq!(status.processing_status.current_chunk, 2);
	assert_eq!(status.processing_status.total_chunks, 5);
	assert!(!status.processing_status.vector_embedding);

	let resume_batches = Arc::new(Mutex::new(Vec::new()));
	let mut cfg = super::test_config(test_db.dsn().to_string(), &blob_root);

	cfg.providers.embedding.batch_size = 2;

	let healthy = Providers::new(
		Arc::new(SpyEmbedding {
			vector_dim: VECTOR_DIM,
			batches: resume_batches.clone(),
			fail_after: None,
		}),
		Arc::new(ScriptedGeneration::new(Vec::new())),
		Arc::new(StubPdf { pages: short_pages() }),
	);
	let service = super::build_service(cfg, healthy).await.expect("Failed to build service.");
	let outcome =
		service.process_document(uploaded.document_id).await.expect("Resumed run failed.");

	assert_eq!(outcome, IngestOutcome::Ready { total_chunks: 5, embedded: 3 });
	assert_eq!(*resume_batches.lock().expect("Batch log poisoned."), vec![2, 1]);

	let count = folio_storage::chunks::count_chunks(&service.db.pool, uploaded.document_id)
		.await
		.expect("Failed to count chunks.");

	assert_eq!(count, 5);

	let again = service.process_document(uploaded.document_id).await.expect("Rerun failed.");

	assert_eq!(again, IngestOutcome::Skipped);

	test_db.cleanup().await.expect("Failed to cleanup test database.");

	let _ = std::fs::remove_dir_all(&blob_root);
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set FOLIO_PG_DSN to run."]
async fn textless_document_fails_permanently() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping textless_document_fails_permanently; set FOLIO_PG_DSN to run this test."
		);

		return;
	};
	let blob_root = super::temp_blob_root();
	let cfg = super::test_config(test_db.dsn().to_string(), &blob_root);
	let providers = super::mock_providers(vec!["   ".to_string(), "\n".to_string()], "unused");
	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");
	let uploaded = upload_fake(&service).await;

	assert_eq!(uploaded.pages, 2);
	assert_eq!(uploaded.language, "Unknown");

	let err = service
		.process_document(uploaded.document_id)
		.await
		.expect_err("Expected a document without text to fail.");

	assert!(err.is_permanent());

	service
		.fail_document(uploaded.document_id, &err.to_string())
		.await
		.expect("Failed to record the error.");

	let status = service.status(uploaded.document_id).await.expect("Status failed.");
	let recorded = status.processing_status.error.expect("Expected a recorded error.");

	assert!(recorded.contains("No text could be extracted"));
	assert!(!status.processing_status.ai_ready);

	let ask_err = service
		.ask(AskRequest {
			question: "What is inside?".to_string(),
			document_id: uploaded.document_id,
		})
		.await
		.expect_err("Expected a failed document to refuse questions.");

	assert!(matches!(ask_err, Error::NotReady { .. }));

	let rerun = service.process_document(uploaded.document_id).await.expect("Rerun failed.");

	assert_eq!(rerun, IngestOutcome::Skipped);

	test_db.cleanup().await.expect("Failed to cleanup test database.");

	let _ = std::fs::remove_dir_all(&blob_root);
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set FOLIO_PG_DSN to run."]
async fn questions_wait_for_processing() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping questions_wait_for_processing; set FOLIO_PG_DSN to run this test.");

		return;
	};
	let blob_root = super::temp_blob_root();
	let cfg = super::test_config(test_db.dsn().to_string(), &blob_root);
	let service = super::build_service(cfg, super::mock_providers(short_pages(), "Answer."))
		.await
		.expect("Failed to build service.");
	let uploaded = upload_fake(&service).await;
	let err = service
		.ask(AskRequest {
			question: "When is the review?".to_string(),
			document_id: uploaded.document_id,
		})
		.await
		.expect_err("Expected a pending document to refuse questions.");

	assert!(matches!(err, Error::NotReady { .. }));

	let missing = service
		.ask(AskRequest {
			question: "When is the review?".to_string(),
			document_id: uuid::Uuid::new_v4(),
		})
		.await
		.expect_err("Expected an unknown document to be missing.");

	assert!(matches!(missing, Error::NotFound { .. }));

	test_db.cleanup().await.expect("Failed to cleanup test database.");

	let _ = std::fs::remove_dir_all(&blob_root);
}
