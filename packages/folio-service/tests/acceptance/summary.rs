use std::sync::{Arc, atomic::Ordering};

use folio_service::{Error, FolioService, Providers, SummaryRequest, UploadRequest};
use folio_testkit::TestDatabase;
use uuid::Uuid;

use super::{KeywordEmbedding, ScriptedGeneration, StubPdf, VECTOR_DIM};

async fn ready_document(
	test_db: &TestDatabase,
	blob_root: &std::path::Path,
	generation: Arc<ScriptedGeneration>,
) -> (FolioService, Uuid) {
	let cfg = super::test_config(test_db.dsn().to_string(), blob_root);
	let providers = Providers::new(
		Arc::new(KeywordEmbedding { vector_dim: VECTOR_DIM }),
		generation,
		Arc::new(StubPdf { pages: super::report_pages() }),
	);
	let service = super::build_service(cfg, providers).await.expect("Failed to build service.");
	let uploaded = service
		.upload(UploadRequest {
			file_name: "report.pdf".to_string(),
			content_type: Some("application/pdf".to_string()),
			bytes: super::fake_pdf_bytes(),
		})
		.await
		.expect("Upload failed.");

	service.process_document(uploaded.document_id).await.expect("Processing failed.");

	(service, uploaded.document_id)
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set FOLIO_PG_DSN to run."]
async fn summary_retries_unusable_output() {
	let Some(test_db) = super::test_db().await else {
		eprintln!("Skipping summary_retries_unusable_output; set FOLIO_PG_DSN to run this test.");

		return;
	};
	let blob_root = super::temp_blob_root();
	let generation = Arc::new(ScriptedGeneration::new(vec![
		"I could not produce JSON this time.".to_string(),
		"```json\n[{\"title\":\"Revenue\",\"content\":\"Sales in Europe doubled.\",\"icon\":\"📈\"},\
		 {\"title\":\"\",\"content\":\"dropped\"}]\n```"
			.to_string(),
	]));
	let calls = generation.calls.clone();
	let prompts = generation.prompts.clone();
	let (service, document_id) = ready_document(&test_db, &blob_root, generation).await;
	let summary =
		service.summarize(SummaryRequest { document_id }).await.expect("Summary failed.");

	assert_eq!(calls.load(Ordering::SeqCst), 2);
	assert_eq!(summary.document_id, document_id);
	assert_eq!(summary.summary.len(), 1);
	assert_eq!(summary.summary[0].title, "Revenue");
	assert_eq!(summary.summary[0].icon, "📈");

	let prompts = prompts.lock().expect("Prompt log poisoned.");
	let user_prompt = prompts[0][1]["content"].as_str().expect("Expected user prompt.");

	assert!(user_prompt.contains("Document: report.pdf"));
	assert!(user_prompt.contains("[Page 1]"));

	test_db.cleanup().await.expect("Failed to cleanup test database.");

	let _ = std::fs::remove_dir_all(&blob_root);
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set FOLIO_PG_DSN to run."]
async fn summary_gives_up_after_three_attempts() {
	let Some(test_db) = super::test_db().await else {
		eprintln!(
			"Skipping summary_gives_up_after_three_attempts; set FOLIO_PG_DSN to run this test."
		);

		return;
	};
	let blob_root = super::temp_blob_root();
	let generation = Arc::new(ScriptedGeneration::new(vec!["{\"sections\": []}".to_string()]));
	let calls = generation.calls.clone();
	let (service, document_id) = ready_document(&test_db, &blob_root, generation).await;
	let err = service
		.summarize(SummaryRequest { document_id })
		.await
		.expect_err("Expected the summary to fail.");

	assert!(matches!(err, Error::Provider { .. }));
	assert_eq!(calls.load(Ordering::SeqCst), 3);

	test_db.cleanup().await.expect("Failed to cleanup test database.");

	let _ = std::fs::remove_dir_all(&blob_root);
}
