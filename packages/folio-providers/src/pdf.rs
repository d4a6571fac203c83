use std::panic::{self, AssertUnwindSafe};

use color_eyre::{Result, eyre};
use lopdf::{Document, Object, content::Content};

/// Extracts the text of every page, in page order.
///
/// `pdf-extract` handles font encodings best but errors or panics on some malformed inputs.
/// Those documents get a second pass that reads the raw text operators with `lopdf`.
pub fn extract_pages(bytes: &[u8]) -> Result<Vec<String>> {
	if !bytes.starts_with(b"%PDF-") {
		return Err(eyre::eyre!("Input is not a PDF document."));
	}

	let extract = || pdf_extract::extract_text_from_mem_by_pages(bytes);
	let failure = match panic::catch_unwind(AssertUnwindSafe(extract)) {
		Ok(Ok(pages)) => {
			tracing::debug!(pages = pages.len(), bytes = bytes.len(), "Extracted PDF text.");

			return Ok(pages);
		},
		Ok(Err(err)) => format!("Failed to extract PDF text: {err}."),
		Err(payload) => {
			let message = if let Some(text) = payload.downcast_ref::<&str>() {
				(*text).to_string()
			} else if let Some(text) = payload.downcast_ref::<String>() {
				text.clone()
			} else {
				"unknown panic".to_string()
			};

			tracing::warn!(panic = %message, "PDF extraction panicked.");

			format!("PDF extraction panicked: {message}.")
		},
	};

	match extract_pages_with_lopdf(bytes) {
		Ok(pages) if pages.iter().any(|page| !page.trim().is_empty()) => {
			tracing::info!(pages = pages.len(), error = %failure, "Recovered PDF text with lopdf.");

			Ok(pages)
		},
		Ok(_) => Err(eyre::eyre!(failure)),
		Err(err) => {
			tracing::debug!(error = %err, "lopdf fallback failed.");

			Err(eyre::eyre!(failure))
		},
	}
}

/// Reads page text straight from the `Tj`/`TJ` operators of each content stream.
///
/// Glyphs are decoded as UTF-8 or Latin-1, so custom font encodings come out garbled.
pub fn extract_pages_with_lopdf(bytes: &[u8]) -> Result<Vec<String>> {
	let doc = Document::load_mem(bytes)
		.map_err(|err| eyre::eyre!("Failed to load PDF with lopdf: {err}."))?;
	let mut pages = Vec::new();

	for (_, page_id) in doc.get_pages() {
		let mut text = String::new();
		let operations = doc
			.get_page_content(page_id)
			.ok()
			.and_then(|content| Content::decode(&content).ok())
			.map(|content| content.operations)
			.unwrap_or_default();

		for op in operations {
			match op.operator.as_str() {
				"Tj" | "'" | "\"" =>
					if let Some(Object::String(raw, _)) = op.operands.last() {
						text.push_str(&decode_pdf_string(raw));
					},
				"TJ" =>
					if let Some(Object::Array(items)) = op.operands.first() {
						for item in items {
							if let Object::String(raw, _) = item {
								text.push_str(&decode_pdf_string(raw));
							}
						}
					},
				"Td" | "TD" | "T*" =>
					if !text.is_empty() && !text.ends_with([' ', '\n']) {
						text.push(' ');
					},
				"ET" =>
					if !text.is_empty() && !text.ends_with('\n') {
						text.push('\n');
					},
				_ => {},
			}
		}

		pages.push(text);
	}

	Ok(pages)
}

fn decode_pdf_string(raw: &[u8]) -> String {
	match std::str::from_utf8(raw) {
		Ok(text) => text.to_string(),
		Err(_) => raw.iter().map(|&byte| byte as char).collect(),
	}
}
