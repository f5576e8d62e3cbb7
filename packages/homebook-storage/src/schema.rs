pub fn render_schema() -> String {
	let init = include_str!("../../../sql/init.sql");

	expand_includes(init)
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"tables/001_address_records.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_address_records.sql")),
				"tables/002_address_documents.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_address_documents.sql")),
				"tables/003_address_photos.sql" =>
					out.push_str(include_str!("../../../sql/tables/003_address_photos.sql")),
				"tables/004_address_checklist_items.sql" => out
					.push_str(include_str!("../../../sql/tables/004_address_checklist_items.sql")),
				"tables/005_address_notes.sql" =>
					out.push_str(include_str!("../../../sql/tables/005_address_notes.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
