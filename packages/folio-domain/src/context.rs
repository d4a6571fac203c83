use std::collections::HashSet;

use serde::Serialize;

use crate::text::truncate_chars;

/// A chunk returned by similarity search, best match first.
#[derive(Clone, Debug, PartialEq)]
pub struct ChunkMatch {
	pub chunk_index: i32,
	pub page_number: i32,
	pub content: String,
	pub similarity: f32,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ContextBlock {
	pub page_number: i32,
	pub text: String,
}

/// A cited page with the leading text of its context block.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SourceRef {
	pub page: i32,
	pub content: String,
}

/// Selects prompt context from ranked matches.
///
/// Rank order is kept, a page contributes at most one block, and each block holds at most
/// `max_block_chars` characters.
pub fn assemble_context(
	matches: &[ChunkMatch],
	max_blocks: usize,
	max_block_chars: usize,
) -> Vec<ContextBlock> {
	let mut seen_pages = HashSet::new();
	let mut blocks = Vec::new();

	for candidate in matches {
		if blocks.len() >= max_blocks {
			break;
		}
		if !seen_pages.insert(candidate.page_number) {
			continue;
		}

		let text = truncate_chars(candidate.content.trim(), max_block_chars);

		if text.is_empty() {
			continue;
		}

		blocks.push(ContextBlock { page_number: candidate.page_number, text: text.to_string() });
	}

	blocks
}

pub fn sources_for(blocks: &[ContextBlock], preview_chars: usize) -> Vec<SourceRef> {
	blocks
		.iter()
		.map(|block| SourceRef {
			page: block.page_number,
			content: truncate_chars(&block.text, preview_chars).to_string(),
		})
		.collect()
}
