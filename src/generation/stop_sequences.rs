/// Truncate `text` at the earliest occurrence of any stop sequence.
///
/// Stop sequences are literal strings; the match itself is excluded from the
/// result. When none occurs, the text is returned unmodified (truncation is
/// a no-op). Empty stop sequences are ignored.
pub fn truncate_at_stop_sequences<'a>(text: &'a str, stop_sequences: &[String]) -> &'a str {
	let mut cut_index: Option<usize> = None;

	for stop_sequence in stop_sequences {
		if stop_sequence.is_empty() {
			continue;
		}
		if let Some(index) = text.find(stop_sequence.as_str()) {
			cut_index = Some(cut_index.map_or(index, |current| current.min(index)));
		}
	}

	match cut_index {
		Some(index) => &text[..index],
		None => text,
	}
}

// region:    --- Tests

#[cfg(test)]
mod tests {
	use super::*;

	fn stops(items: &[&str]) -> Vec<String> {
		items.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn test_truncate_at_first_occurrence() {
		let text = "Once upon a time there was a cat.";
		assert_eq!(
			truncate_at_stop_sequences(text, &stops(&["cat"])),
			"Once upon a time there was a "
		);
	}

	#[test]
	fn test_truncate_earliest_of_many() {
		let text = "Once upon a time there was a cat.";
		assert_eq!(truncate_at_stop_sequences(text, &stops(&["cat", "upon"])), "Once ");
	}

	#[test]
	fn test_truncate_no_match_is_noop() {
		let text = "Once upon a time";
		assert_eq!(truncate_at_stop_sequences(text, &stops(&["dog"])), text);
	}

	#[test]
	fn test_truncate_empty_stop_list_is_noop() {
		let text = "Once upon a time";
		assert_eq!(truncate_at_stop_sequences(text, &[]), text);
	}

	#[test]
	fn test_truncate_ignores_empty_stop_sequence() {
		let text = "Once upon a time";
		assert_eq!(truncate_at_stop_sequences(text, &stops(&["", "time"])), "Once upon a ");
	}

	#[test]
	fn test_truncate_match_at_start_yields_empty() {
		let text = "Once upon a time";
		assert_eq!(truncate_at_stop_sequences(text, &stops(&["Once"])), "");
	}
}

// endregion: --- Tests
