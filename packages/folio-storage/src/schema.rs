pub fn render_schema(vector_dim: u32) -> String {
	let init = include_str!("../../../sql/init.sql");
	let expanded = expand_includes(init);

	expanded.replace("<VECTOR_DIM>", &vector_dim.to_string())
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_documents.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_documents.sql")),
				"tables/002_document_chunks.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_document_chunks.sql")),
				"tables/003_ingest_jobs.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_ingest_jobs.sql")),
				"functions/001_match_document_chunks.sql" => out.push_str(include_str!(
					"../../../sql/functions/001_match_document_chunks.sql"
				)),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}

#[cfg(test)]
mod tests {
	use super::render_schema;

	#[test]
	fn renders_vector_dimension_and_includes() {
		let sql = render_schema(768);

		assert!(!sql.contains("\\ir "));
		assert!(!sql.contains("<VECTOR_DIM>"));
		assert!(sql.contains("embedding vector(768)"));
		assert!(sql.contains("query_embedding vector(768)"));
		assert!(sql.contains("CREATE TABLE IF NOT EXISTS ingest_jobs"));
	}

	#[test]
	fn match_function_survives_statement_split() {
		let sql = render_schema(8);
		let statement = sql
			.split(';')
			.find(|statement| statement.contains("FUNCTION match_document_chunks"))
			.expect("Missing match function.");

		assert!(statement.trim_end().ends_with("$$"));
		assert!(statement.contains("LIMIT match_count"));
	}
}
