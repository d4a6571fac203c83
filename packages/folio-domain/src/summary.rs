use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::text::truncate_chars;

pub const DEFAULT_SECTION_ICON: &str = "📄";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummarySection {
	pub title: String,
	pub content: String,
	pub icon: String,
}

/// Joins page-labelled excerpts until `max_chars` characters are used.
pub fn summary_context<'a, I>(excerpts: I, max_chars: usize) -> String
where
	I: IntoIterator<Item = (i32, &'a str)>,
{
	let mut out = String::new();
	let mut used = 0_usize;

	for (page_number, text) in excerpts {
		let separator = if out.is_empty() { "" } else { "\n\n" };
		let entry = format!("{separator}[Page {page_number}] {}", text.trim());
		let entry_chars = entry.chars().count();

		if used + entry_chars > max_chars {
			let remaining = max_chars.saturating_sub(used);

			out.push_str(truncate_chars(&entry, remaining));

			break;
		}

		used += entry_chars;

		out.push_str(&entry);
	}

	out
}

/// Reads summary sections from model JSON.
///
/// Accepts a bare array or an object wrapping one under `sections` or `summary`. Entries without
/// a title or content are skipped.
pub fn parse_sections(value: &Value) -> Vec<SummarySection> {
	let items = match value {
		Value::Array(items) => items,
		Value::Object(map) => match map.get("sections").or_else(|| map.get("summary")) {
			Some(Value::Array(items)) => items,
			_ => return Vec::new(),
		},
		_ => return Vec::new(),
	};

	items.iter().filter_map(parse_section).collect()
}

fn parse_section(item: &Value) -> Option<SummarySection> {
	let title = item.get("title")?.as_str()?.trim();
	let content = match item.get("content")? {
		Value::String(text) => text.trim().to_string(),
		Value::Array(lines) => lines
			.iter()
			.filter_map(Value::as_str)
			.map(str::trim)
			.filter(|line| !line.is_empty())
			.collect::<Vec<_>>()
			.join("\n"),
		_ => return None,
	};

	if title.is_empty() || content.is_empty() {
		return None;
	}

	let icon = item
		.get("icon")
		.and_then(Value::as_str)
		.map(str::trim)
		.filter(|icon| !icon.is_empty())
		.unwrap_or(DEFAULT_SECTION_ICON);

	Some(SummarySection { title: title.to_string(), content, icon: icon.to_string() })
}
