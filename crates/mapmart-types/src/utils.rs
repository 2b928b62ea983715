//! Utility functions

use rand::RngExt;

use crate::prelude::*;

pub const SAFE: [char; 62] = [
	'0', '1', '2', '3', '4', '5', '6', '7', '8', '9', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i',
	'j', 'k', 'l', 'm', 'n', 'o', 'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'A', 'B',
	'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', 'P', 'Q', 'R', 'S', 'T', 'U',
	'V', 'W', 'X', 'Y', 'Z',
];

/// Random alphanumeric token of `len` characters
pub fn random_token(len: usize) -> ClResult<String> {
	let mut rng = rand::rng();
	let mut result = String::with_capacity(len);

	for _ in 0..len {
		result.push(SAFE[rng.random_range(0..SAFE.len())]);
	}
	Ok(result)
}

/// Minimal markup neutralisation for user-supplied text: only angle brackets
pub fn escape_angle_brackets(text: &str) -> String {
	text.replace('<', "&lt;").replace('>', "&gt;")
}

/// Lower-cased file extension of `filename`, if any
pub fn file_extension(filename: &str) -> Option<String> {
	let (stem, ext) = filename.rsplit_once('.')?;
	if stem.is_empty() || ext.is_empty() {
		return None;
	}
	Some(ext.to_ascii_lowercase())
}


// vim: ts=4
