use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A file part of a multipart submission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedFile {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub bytes: Vec<u8>,
}

impl UploadedFile {
    pub fn new(filename: Option<String>, content_type: Option<String>, bytes: Vec<u8>) -> Self {
        Self { filename, content_type, bytes }
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    /// Browsers send an unnamed, zero-length part for an untouched file input
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn sha256(&self) -> String {
        let mut hasher = Sha256::new();
        hasher.update(&self.bytes);
        format!("{:x}", hasher.finalize())
    }

    pub fn meta(&self) -> FileMeta {
        FileMeta {
            filename: self.filename.clone().filter(|f| !f.is_empty()),
            content_type: self.content_type.clone(),
            size: self.size(),
            sha256: self.sha256(),
        }
    }
}

/// What a validated file field deserializes into. The bytes stay on the `FormData`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMeta {
    pub filename: Option<String>,
    pub content_type: Option<String>,
    pub size: usize,
    pub sha256: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormValue {
    Text(String),
    File(UploadedFile),
}

impl FormValue {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            FormValue::Text(s) => Some(s),
            FormValue::File(_) => None,
        }
    }

    pub fn as_file(&self) -> Option<&UploadedFile> {
        match self {
            FormValue::File(f) => Some(f),
            FormValue::Text(_) => None,
        }
    }
}

/// Raw, untyped form submission. Keys may repeat; lookups return the first entry.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormData {
    entries: Vec<(String, FormValue)>,
}

impl FormData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn append(&mut self, key: impl Into<String>, value: FormValue) {
        self.entries.push((key.into(), value));
    }

    pub fn append_text(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.append(key, FormValue::Text(value.into()));
    }

    pub fn append_file(&mut self, key: impl Into<String>, file: UploadedFile) {
        self.append(key, FormValue::File(file));
    }

    /// Builder form of `append_text`
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.append_text(key, value);
        self
    }

    pub fn get(&self, key: &str) -> Option<&FormValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn get_all<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a FormValue> + 'a {
        self.entries.iter().filter(move |(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn text(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(FormValue::as_text)
    }

    pub fn file(&self, key: &str) -> Option<&UploadedFile> {
        self.get(key).and_then(FormValue::as_file)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FormValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut form = FormData::new();
        for (k, v) in iter {
            form.append_text(k, v);
        }
        form
    }
}
