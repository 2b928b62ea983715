//! Multipart upload forms

use std::collections::HashMap;

use axum::{
	body::Bytes,
	extract::{multipart::MultipartError, Multipart},
	http::StatusCode,
};

use crate::image::ALLOWED_EXTENSIONS;
use crate::prelude::*;
use mapmart_types::utils::file_extension;

#[derive(Debug)]
pub struct UploadedFile {
	pub file_name: String,
	pub data: Bytes,
}

impl UploadedFile {
	/// Checks name, size and extension of an image upload
	pub fn check_image(&self, max_size: usize) -> ClResult<()> {
		if self.file_name.trim().is_empty() {
			return Err(Error::ValidationError("Empty file name".into()));
		}
		if self.data.len() > max_size {
			return Err(too_large(max_size));
		}
		match file_extension(&self.file_name) {
			Some(ext) if ALLOWED_EXTENSIONS.contains(&ext.as_str()) => Ok(()),
			_ => Err(Error::ValidationError("Unsupported image format".into())),
		}
	}
}

/// Text fields of a multipart form plus at most one file
#[derive(Debug, Default)]
pub struct UploadForm {
	fields: HashMap<String, String>,
	file: Option<UploadedFile>,
}

impl UploadForm {
	/// Reads the whole form. The first part named `file_field` is kept as the
	/// file; other file parts and repeats of it are skipped.
	pub async fn read(multipart: &mut Multipart, file_field: &str, max_size: usize) -> ClResult<Self> {
		let mut form = Self::default();
		while let Some(field) = multipart.next_field().await.map_err(|e| multipart_err(&e, max_size))? {
			let Some(name) = field.name().map(str::to_owned) else {
				continue;
			};
			if name == file_field {
				let file_name = field.file_name().unwrap_or_default().to_owned();
				let data = field.bytes().await.map_err(|e| multipart_err(&e, max_size))?;
				if form.file.is_none() {
					form.file = Some(UploadedFile { file_name, data });
				}
			} else if field.file_name().is_some() {
				debug!("Skipping unexpected file part {}", name);
			} else {
				let value = field.text().await.map_err(|e| multipart_err(&e, max_size))?;
				form.fields.insert(name, value);
			}
		}
		Ok(form)
	}

	pub fn text(&self, name: &str) -> Option<&str> {
		self.fields.get(name).map(String::as_str)
	}

	/// Text field parsed as `true`/`false`, case insensitive
	pub fn flag(&self, name: &str) -> Option<bool> {
		self.text(name).map(|v| v.trim().eq_ignore_ascii_case("true"))
	}

	pub fn take_file(&mut self) -> Option<UploadedFile> {
		self.file.take()
	}
}

fn too_large(max_size: usize) -> Error {
	Error::PayloadTooLarge(format!("Image too large (max {} MB)", max_size / (1024 * 1024)))
}

pub fn multipart_err(err: &MultipartError, max_size: usize) -> Error {
	if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
		too_large(max_size)
	} else {
		debug!("Multipart error: {}", err);
		Error::ValidationError("Malformed upload".into())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn file(name: &str, len: usize) -> UploadedFile {
		UploadedFile { file_name: name.into(), data: Bytes::from(vec![0u8; len]) }
	}

	#[test]
	fn test_check_image() {
		assert!(file("map.PNG", 10).check_image(100).is_ok());
		assert!(matches!(file("map.png", 101).check_image(100), Err(Error::PayloadTooLarge(_))));
		assert!(matches!(file("map.exe", 10).check_image(100), Err(Error::ValidationError(_))));
		assert!(matches!(file("  ", 10).check_image(100), Err(Error::ValidationError(_))));
	}

	#[test]
	fn test_flag_parsing() {
		let mut form = UploadForm::default();
		form.fields.insert("is_premium".into(), "True".into());
		form.fields.insert("is_featured".into(), "no".into());
		assert_eq!(form.flag("is_premium"), Some(true));
		assert_eq!(form.flag("is_featured"), Some(false));
		assert_eq!(form.flag("missing"), None);
	}
}

// vim: ts=4
