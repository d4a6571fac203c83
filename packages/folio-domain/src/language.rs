use crate::text::{clean_text, truncate_chars};

pub const UNKNOWN_LANGUAGE: DetectedLanguage = DetectedLanguage { code: "unknown", name: "Unknown" };

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DetectedLanguage {
	/// ISO 639-3 code, or `unknown`.
	pub code: &'static str,
	/// English name of the language, or `Unknown`.
	pub name: &'static str,
}

/// Builds the detection sample from the first `sample_pages` pages.
pub fn language_sample(pages: &[String], sample_pages: usize, max_chars: usize) -> String {
	let joined =
		pages.iter().take(sample_pages).map(|page| page.as_str()).collect::<Vec<_>>().join(" ");
	let cleaned = clean_text(&joined);

	truncate_chars(&cleaned, max_chars).to_string()
}

pub fn detect_language(sample: &str) -> DetectedLanguage {
	if sample.trim().is_empty() {
		return UNKNOWN_LANGUAGE;
	}

	let Some(info) = whatlang::detect(sample) else {
		return UNKNOWN_LANGUAGE;
	};

	if !info.is_reliable() {
		return UNKNOWN_LANGUAGE;
	}

	let lang = info.lang();

	DetectedLanguage { code: lang.code(), name: lang.eng_name() }
}
