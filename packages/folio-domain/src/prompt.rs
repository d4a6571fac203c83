use serde_json::Value;

use crate::context::ContextBlock;

const QA_SYSTEM_PROMPT: &str = "You answer questions about a single PDF document. \
Use only the numbered context excerpts supplied by the user. \
If the excerpts do not contain the answer, say that you cannot find it in the document. \
Do not invent facts, quotes, or page numbers. \
Answer in plain text without Markdown headings.";

const SUMMARY_SYSTEM_PROMPT: &str = "You summarize PDF documents for a reading assistant. \
Output must be valid JSON only: an array of 3 to 6 sections. \
Each section is an object with string fields title, content, and icon. \
The title is a short heading, the content is one or two concise paragraphs, and the icon is a \
single emoji that fits the section. \
Base every section strictly on the supplied excerpts.";

pub fn qa_messages(blocks: &[ContextBlock], question: &str) -> Vec<Value> {
	let mut context = String::new();

	for (idx, block) in blocks.iter().enumerate() {
		if idx > 0 {
			context.push_str("\n\n");
		}

		context.push_str(&format!("[{}] (page {})\n{}", idx + 1, block.page_number, block.text));
	}

	if context.is_empty() {
		context.push_str("(no excerpts found)");
	}

	let user_prompt = format!("Context:\n{context}\n\nQuestion: {}", question.trim());

	vec![
		serde_json::json!({ "role": "system", "content": QA_SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}

pub fn summary_messages(file_name: &str, context: &str) -> Vec<Value> {
	let schema = serde_json::json!([
		{ "title": "string", "content": "string", "icon": "emoji" }
	]);
	let user_prompt = format!(
		"Return JSON matching this schema:\n{schema}\n\nDocument: {file_name}\n\nExcerpts:\n{context}"
	);

	vec![
		serde_json::json!({ "role": "system", "content": SUMMARY_SYSTEM_PROMPT }),
		serde_json::json!({ "role": "user", "content": user_prompt }),
	]
}
