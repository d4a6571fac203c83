use unicode_normalization::UnicodeNormalization;
use unicode_segmentation::UnicodeSegmentation;

/// Normalizes extracted PDF text into a single line of NFKC text.
///
/// Invisible and control characters are removed and every whitespace run becomes one space.
pub fn clean_text(input: &str) -> String {
	let mut out = String::with_capacity(input.len());
	let mut pending_space = false;

	for ch in input.nfkc() {
		if ch.is_whitespace() {
			pending_space = true;

			continue;
		}
		if is_invisible(ch) || ch.is_control() {
			continue;
		}
		if pending_space && !out.is_empty() {
			out.push(' ');
		}

		pending_space = false;

		out.push(ch);
	}

	out
}

pub fn word_count(input: &str) -> usize {
	input.unicode_words().count()
}

/// Returns the longest prefix of `input` holding at most `max_chars` characters.
pub fn truncate_chars(input: &str, max_chars: usize) -> &str {
	match input.char_indices().nth(max_chars) {
		Some((byte_idx, _)) => &input[..byte_idx],
		None => input,
	}
}

fn is_invisible(ch: char) -> bool {
	matches!(
		ch,
		'\u{00AD}' // soft hyphen
			| '\u{034F}' // combining grapheme joiner
			| '\u{061C}' // arabic letter mark
			| '\u{180E}' // mongolian vowel separator
			| '\u{200B}' // zero width space
			| '\u{200C}' // zero width non-joiner
			| '\u{200D}' // zero width joiner
			| '\u{2060}' // word joiner
			| '\u{FEFF}' // byte-order mark
	)
}
