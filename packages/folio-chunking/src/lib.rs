use folio_domain::text::clean_text;

#[derive(Clone, Debug)]
pub struct ChunkingConfig {
	pub chunk_chars: usize,
	pub overlap_chars: usize,
	pub min_chunk_chars: usize,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Chunk {
	pub chunk_index: i32,
	/// 1-based page the chunk was cut from.
	pub page_number: i32,
	/// Character offset into the cleaned page text.
	pub start_offset: usize,
	pub end_offset: usize,
	pub text: String,
}

/// Splits every page into overlapping character windows.
///
/// Pages are cleaned and split independently, so a chunk never spans two pages. Windows shorter
/// than `min_chunk_chars` are dropped before indices are assigned.
pub fn split_pages(pages: &[String], cfg: &ChunkingConfig) -> Vec<Chunk> {
	let mut chunks = Vec::new();

	for (page_idx, page) in pages.iter().enumerate() {
		let cleaned = clean_text(page);
		let chars: Vec<char> = cleaned.chars().collect();
		let page_number = page_idx as i32 + 1;

		for (start, end) in windows(&chars, cfg) {
			if end - start < cfg.min_chunk_chars.max(1) {
				continue;
			}

			chunks.push(Chunk {
				chunk_index: chunks.len() as i32,
				page_number,
				start_offset: start,
				end_offset: end,
				text: chars[start..end].iter().collect(),
			});
		}
	}

	tracing::debug!(pages = pages.len(), chunks = chunks.len(), "Split document into chunks.");

	chunks
}

fn windows(chars: &[char], cfg: &ChunkingConfig) -> Vec<(usize, usize)> {
	let len = chars.len();
	let size = cfg.chunk_chars.max(1);
	let overlap = cfg.overlap_chars.min(size - 1);
	let mut out = Vec::new();
	let mut start = 0_usize;

	while start < len {
		let mut end = (start + size).min(len);

		if end < len
			&& let Some(boundary) = last_space(chars, start + overlap + 1, end)
		{
			end = boundary;
		}

		let (trimmed_start, trimmed_end) = trim_span(chars, start, end);

		if trimmed_start < trimmed_end {
			out.push((trimmed_start, trimmed_end));
		}
		if end >= len {
			break;
		}

		start = end - overlap;
	}

	out
}

fn last_space(chars: &[char], from: usize, to: usize) -> Option<usize> {
	if from >= to {
		return None;
	}

	(from..to).rev().find(|&idx| chars[idx] == ' ')
}

fn trim_span(chars: &[char], mut start: usize, mut end: usize) -> (usize, usize) {
	while start < end && chars[start] == ' ' {
		start += 1;
	}
	while end > start && chars[end - 1] == ' ' {
		end -= 1;
	}

	(start, end)
}
