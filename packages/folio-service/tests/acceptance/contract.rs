use std::sync::Arc;

use folio_service::{AskRequest, Error, Providers, UploadRequest};

use super::{FailingPdf, KeywordEmbedding, ScriptedGeneration, StubPdf, VECTOR_DIM};

#[test]
fn prepared_chunks_carry_pages_and_contiguous_indices() {
	let blob_root = super::temp_blob_root();
	let mut cfg = super::test_config("postgres://unused".to_string(), &blob_root);

	cfg.chunking.chunk_chars = 40;
	cfg.chunking.overlap_chars = 10;
	cfg.chunking.min_chunk_chars = 5;

	let pages = vec![
		"The committee reviewed the annual budget and agreed that the library should extend \
		 its opening hours."
			.to_string(),
		"   ".to_string(),
		"Closing remarks of the report.".to_string(),
	];
	let prepared = folio_service::prepare_document(&pages, &cfg);

	assert_eq!(prepared.page_count, 3);
	assert!(prepared.chunks.iter().filter(|chunk| chunk.page_number == 1).count() >= 3);
	assert!(prepared.chunks.iter().all(|chunk| chunk.page_number != 2));

	for (idx, chunk) in prepared.chunks.iter().enumerate() {
		assert_eq!(chunk.chunk_index, idx as i32);
		assert!(chunk.text.chars().count() <= 40);
	}

	let last = prepared.chunks.last().expect("Expected chunks.");

	assert_eq!(last.page_number, 3);
	assert_eq!(last.text, "Closing remarks of the report.");
}

#[test]
fn prepared_metadata_counts_words_and_detects_language() {
	let blob_root = super::temp_blob_root();
	let cfg = super::test_config("postgres://unused".to_string(), &blob_root);
	let pages = vec![
		"The committee reviewed the annual budget and agreed that the library should extend its \
		 opening hours during the winter months"
			.to_string(),
		"so that students have a warm place to study in the evenings.".to_string(),
	];
	let prepared = folio_service::prepare_document(&pages, &cfg);

	assert_eq!(prepared.word_count, 32);
	assert_eq!(prepared.language.code, "eng");
	assert_eq!(prepared.language.name, "English");
}

#[test]
fn blank_pages_prepare_no_chunks() {
	let blob_root = super::temp_blob_root();
	let cfg = super::test_config("postgres://unused".to_string(), &blob_root);
	let prepared =
		folio_service::prepare_document(&["".to_string(), " \n\t ".to_string()], &cfg);

	assert!(prepared.chunks.is_empty());
	assert_eq!(prepared.word_count, 0);
	assert_eq!(prepared.language.code, "unknown");
}

#[tokio::test]
async fn upload_rejects_declared_non_pdf() {
	let (service, _blob_root) = super::offline_service(super::mock_providers(Vec::new(), "unused"));
	let err = service
		.upload(UploadRequest {
			file_name: "notes.txt".to_string(),
			content_type: Some("text/plain".to_string()),
			bytes: b"plain text".to_vec(),
		})
		.await
		.expect_err("Expected non-PDF rejection.");

	assert!(matches!(err, Error::InvalidRequest { ref message } if message.contains("Only PDF")));
}

#[tokio::test]
async fn upload_rejects_oversized_payload() {
	let (mut service, _blob_root) =
		super::offline_service(super::mock_providers(Vec::new(), "unused"));

	service.cfg.ingest.max_upload_bytes = 8;

	let err = service
		.upload(UploadRequest {
			file_name: "big.pdf".to_string(),
			content_type: Some("application/pdf".to_string()),
			bytes: super::fake_pdf_bytes(),
		})
		.await
		.expect_err("Expected size rejection.");

	assert!(matches!(err, Error::PayloadTooLarge { .. }));
}

#[tokio::test]
async fn unreadable_pdf_is_rejected_and_its_blob_removed() {
	let providers = Providers::new(
		Arc::new(KeywordEmbedding { vector_dim: VECTOR_DIM }),
		Arc::new(ScriptedGeneration::new(Vec::new())),
		Arc::new(FailingPdf),
	);
	let (service, blob_root) = super::offline_service(providers);
	let err = service
		.upload(UploadRequest {
			file_name: "broken.pdf".to_string(),
			content_type: None,
			bytes: super::fake_pdf_bytes(),
		})
		.await
		.expect_err("Expected corrupted PDF rejection.");

	assert!(
		matches!(err, Error::InvalidRequest { ref message } if message == "Invalid or corrupted PDF.")
	);

	let leftover = std::fs::read_dir(&blob_root)
		.map(|entries| entries.count())
		.unwrap_or_default();

	assert_eq!(leftover, 0, "Rejected uploads must not leave blobs behind.");

	let _ = std::fs::remove_dir_all(&blob_root);
}

#[tokio::test]
async fn zero_page_pdf_is_rejected() {
	let providers = Providers::new(
		Arc::new(KeywordEmbedding { vector_dim: VECTOR_DIM }),
		Arc::new(ScriptedGeneration::new(Vec::new())),
		Arc::new(StubPdf { pages: Vec::new() }),
	);
	let (service, blob_root) = super::offline_service(providers);
	let err = service
		.upload(UploadRequest {
			file_name: "empty.pdf".to_string(),
			content_type: Some("application/pdf".to_string()),
			bytes: super::fake_pdf_bytes(),
		})
		.await
		.expect_err("Expected zero-page rejection.");

	assert!(matches!(err, Error::InvalidRequest { .. }));

	let _ = std::fs::remove_dir_all(&blob_root);
}

#[tokio::test]
async fn blank_question_is_rejected_before_retrieval() {
	let generation = Arc::new(ScriptedGeneration::new(vec!["unused".to_string()]));
	let calls = generation.calls.clone();
	let providers = Providers::new(
		Arc::new(KeywordEmbedding { vector_dim: VECTOR_DIM }),
		generation,
		Arc::new(StubPdf { pages: Vec::new() }),
	);
	let (service, _blob_root) = super::offline_service(providers);
	let err = service
		.ask(AskRequest { question: "   ".to_string(), document_id: uuid::Uuid::new_v4() })
		.await
		.expect_err("Expected blank question rejection.");

	assert!(matches!(err, Error::InvalidRequest { .. }));
	assert_eq!(calls.load(std::sync::atomic::Ordering::SeqCst), 0);
}

#[test]
fn permanent_errors_are_classified() {
	assert!(Error::InvalidRequest { message: "x".to_string() }.is_permanent());
	assert!(Error::NotFound { message: "x".to_string() }.is_permanent());
	assert!(!Error::Provider { message: "x".to_string() }.is_permanent());
	assert!(!Error::Storage { message: "x".to_string() }.is_permanent());
}
