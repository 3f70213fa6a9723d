use std::fmt;
use std::fs;
use std::path::PathBuf;

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("cannot read credential {source_name}: {source}")]
    Io {
        source_name: String,
        #[source]
        source: std::io::Error,
    },
    #[error("credential {source_name} is not valid JSON: {source}")]
    Json {
        source_name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("credential {source_name} has no `{field}` field")]
    MissingField { source_name: String, field: String },
    #[error("credential {source_name} is empty")]
    Empty { source_name: String },
}

/// Where a secret is read from.
#[derive(Clone, PartialEq, Eq)]
pub enum CredentialSource {
    /// A local file holding the secret (plain text or JSON).
    File(PathBuf),
    /// The secret itself.
    Inline(String),
}

// Inline values are secrets and must never reach the log.
impl fmt::Debug for CredentialSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CredentialSource::File(path) => f.debug_tuple("File").field(path).finish(),
            CredentialSource::Inline(_) => f.write_str("Inline(<redacted>)"),
        }
    }
}

impl CredentialSource {
    fn name(&self) -> String {
        match self {
            CredentialSource::File(path) => path.display().to_string(),
            CredentialSource::Inline(_) => "<inline>".to_string(),
        }
    }

    fn raw(&self) -> Result<String, CredentialError> {
        match self {
            CredentialSource::File(path) => {
                fs::read_to_string(path).map_err(|source| CredentialError::Io {
                    source_name: self.name(),
                    source,
                })
            }
            CredentialSource::Inline(value) => Ok(value.clone()),
        }
    }

    /// Read a plain-text secret, trimming surrounding whitespace.
    pub fn load_text(&self) -> Result<String, CredentialError> {
        let value = self.raw()?.trim().to_string();
        if value.is_empty() {
            return Err(CredentialError::Empty {
                source_name: self.name(),
            });
        }
        Ok(value)
    }

    /// Read a JSON document and return the first non-empty string among `fields`.
    pub fn load_json_field(&self, fields: &[&str]) -> Result<String, CredentialError> {
        let raw = self.raw()?;
        let doc: Value = serde_json::from_str(&raw).map_err(|source| CredentialError::Json {
            source_name: self.name(),
            source,
        })?;

        fields
            .iter()
            .filter_map(|field| doc.get(*field).and_then(Value::as_str))
            .map(str::trim)
            .find(|value| !value.is_empty())
            .map(str::to_string)
            .ok_or_else(|| CredentialError::MissingField {
                source_name: self.name(),
                field: fields.join("|"),
            })
    }
}
