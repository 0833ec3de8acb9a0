//! Request body variants
//!
//! [`BodyKind`] is the closed set of payloads a request can carry. Text,
//! structured and form bodies are encoded to text and labelled with a content
//! type; multipart bodies are handed to the transport as-is.

use std::borrow::Cow;

use serde::Serialize;

use crate::{
    config::FORM_CONTENT_TYPE,
    error::{HttpError, Result},
};

/// Payload of an outgoing request
#[derive(Debug, Clone, Default, PartialEq)]
pub enum BodyKind {
    /// No body
    #[default]
    None,
    /// Raw text, sent verbatim
    Text(String),
    /// Structured value, serialized to JSON text
    Structured(serde_json::Value),
    /// Name/value pairs, sent as `name=value&...` with lowercased names
    Form(Vec<(String, String)>),
    /// Multipart form data
    Multipart(MultipartForm),
}

/// Text-encoded request body ready to be attached to a request
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct EncodedBody {
    pub text: String,
    pub content_type: String,
}

impl BodyKind {
    /// Build a structured body from any serializable value
    pub fn structured<T: Serialize + ?Sized>(value: &T) -> Result<Self> {
        serde_json::to_value(value)
            .map(BodyKind::Structured)
            .map_err(|e| HttpError::Serialization(e.to_string()))
    }

    /// Build a form body from name/value pairs
    pub fn form<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        BodyKind::Form(
            pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_none(&self) -> bool {
        matches!(self, BodyKind::None)
    }

    /// Encode text-like bodies; `None` for absent and multipart bodies
    ///
    /// `content_type` is the caller's explicit choice, `default_content_type`
    /// the configured fallback. Form bodies fall back to the urlencoded type.
    pub(crate) fn encode(
        &self,
        content_type: Option<&str>,
        default_content_type: &str,
    ) -> Result<Option<EncodedBody>> {
        let text = match self {
            BodyKind::None | BodyKind::Multipart(_) => return Ok(None),
            BodyKind::Text(text) => text.clone(),
            BodyKind::Structured(value) => serde_json::to_string(value)
                .map_err(|e| HttpError::Serialization(e.to_string()))?,
            BodyKind::Form(pairs) => encode_form(pairs),
        };

        let content_type = match (content_type, self) {
            (Some(ct), _) => ct,
            (None, BodyKind::Form(_)) => FORM_CONTENT_TYPE,
            (None, _) => default_content_type,
        };

        Ok(Some(EncodedBody {
            text,
            content_type: content_type.to_string(),
        }))
    }
}

impl From<String> for BodyKind {
    fn from(text: String) -> Self {
        BodyKind::Text(text)
    }
}

impl From<&str> for BodyKind {
    fn from(text: &str) -> Self {
        BodyKind::Text(text.to_string())
    }
}

impl From<serde_json::Value> for BodyKind {
    fn from(value: serde_json::Value) -> Self {
        BodyKind::Structured(value)
    }
}

impl From<MultipartForm> for BodyKind {
    fn from(form: MultipartForm) -> Self {
        BodyKind::Multipart(form)
    }
}

impl<T: Into<BodyKind>> From<Option<T>> for BodyKind {
    fn from(body: Option<T>) -> Self {
        body.map(Into::into).unwrap_or_default()
    }
}

/// Encode name/value pairs as `name=value` joined by `&`
///
/// Names are lowercased. Both names and values are percent-encoded.
pub fn encode_form(pairs: &[(String, String)]) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (name, value) in pairs {
        serializer.append_pair(&form_key(name), value);
    }
    serializer.finish()
}

/// One part of a multipart body
#[derive(Debug, Clone, PartialEq)]
pub enum MultipartPart {
    Text {
        name: String,
        value: String,
    },
    Bytes {
        name: String,
        data: Vec<u8>,
        file_name: Option<String>,
        mime: Option<String>,
    },
}

/// Multipart form payload
///
/// Kept as plain data so a configured request stays cloneable; it is turned
/// into a transport form only when the request is dispatched.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MultipartForm {
    parts: Vec<MultipartPart>,
}

impl MultipartForm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a text field
    pub fn text(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.parts.push(MultipartPart::Text {
            name: name.into(),
            value: value.into(),
        });
        self
    }

    /// Add a binary field, optionally with a file name and MIME type
    pub fn bytes(
        mut self,
        name: impl Into<String>,
        data: impl Into<Vec<u8>>,
        file_name: Option<String>,
        mime: Option<String>,
    ) -> Self {
        self.parts.push(MultipartPart::Bytes {
            name: name.into(),
            data: data.into(),
            file_name,
            mime,
        });
        self
    }

    pub fn parts(&self) -> &[MultipartPart] {
        &self.parts
    }

    pub fn len(&self) -> usize {
        self.parts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Convert into the transport's multipart form
    pub(crate) fn to_reqwest(&self) -> Result<reqwest::multipart::Form> {
        let mut form = reqwest::multipart::Form::new();
        for part in &self.parts {
            form = match part {
                MultipartPart::Text { name, value } => form.text(name.clone(), value.clone()),
                MultipartPart::Bytes {
                    name,
                    data,
                    file_name,
                    mime,
                } => {
                    let mut p = reqwest::multipart::Part::bytes(data.clone());
                    if let Some(file_name) = file_name {
                        p = p.file_name(file_name.clone());
                    }
                    if let Some(mime) = mime {
                        p = p.mime_str(mime).map_err(|e| {
                            HttpError::InvalidHeader(format!("multipart part {name}: {e}"))
                        })?;
                    }
                    form.part(name.clone(), p)
                }
            };
        }
        Ok(form)
    }
}

fn form_key(name: &str) -> Cow<'_, str> {
    if name.chars().any(char::is_uppercase) {
        Cow::Owned(name.to_lowercase())
    } else {
        Cow::Borrowed(name)
    }
}
