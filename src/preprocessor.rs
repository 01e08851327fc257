use std::collections::HashSet;

use anyhow::{Context, Result, anyhow};

/// Flatten an entry scene file by inlining all `#include` directives.
/// `load` fetches an included file by name; hosts without a filesystem
/// pass a loader that refuses.
pub fn preprocess<F>(filename: &str, src: &str, mut load: F) -> Result<String>
where
	F: FnMut(&str) -> Result<String>,
{
	let mut visited = HashSet::<String>::new();
	inline_file(filename, src, &mut load, &mut visited)
}

fn inline_file<F>(filename: &str, src: &str, load: &mut F, visited: &mut HashSet<String>) -> Result<String>
where
	F: FnMut(&str) -> Result<String>,
{
	if !visited.insert(filename.to_owned()) {
		// Already processed – prevents cyclic includes.
		return Ok(String::new());
	}

	let mut out = String::new();
	for (lineno, line) in src.lines().enumerate() {
		let trimmed = line.trim_start();
		if let Some(rest) = trimmed.strip_prefix("#include") {
			// Extract quoted path even when a trailing comment is present.
			let rest = rest.trim();
			let first_q = rest.find('"').ok_or_else(|| malformed(filename, lineno, line))?;
			let after = &rest[first_q + 1..];
			let second_q = after.find('"').ok_or_else(|| malformed(filename, lineno, line))?;
			let include_name = &after[..second_q];

			let included = load(include_name).with_context(|| format!("Failed to read included file: {}", include_name))?;
			let flattened = inline_file(include_name, &included, load, visited)
				.with_context(|| format!("Error processing include: {}", include_name))?;
			out.push_str(&flattened);
		} else {
			out.push_str(line);
			out.push('\n');
		}
	}

	Ok(out)
}

fn malformed(filename: &str, lineno: usize, line: &str) -> anyhow::Error {
	anyhow!("Malformed #include in {} on line {}: {}", filename, lineno + 1, line)
}
