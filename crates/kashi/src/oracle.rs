//! The boundary to the AI oracle that refines documents and verifies single tokens.

use crate::{error::OracleError, ParsedLine, TokenId, TokenType};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::{fmt, sync::Arc};
use tokio_util::sync::CancellationToken;

/// What the oracle needs to accept a request.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credentials {
    pub api_key: String,
    /// Which model to ask, the oracle picks its default if not set.
    pub model: Option<String>,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: None,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    pub fn is_usable(&self) -> bool {
        !self.api_key.trim().is_empty()
    }
}

// keeps the key out of logs
impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &"***")
            .field("model", &self.model)
            .finish()
    }
}

/// A token as the oracle returns it. Anything but the text and type may be missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OracleToken {
    #[serde(default)]
    pub id: Option<TokenId>,
    pub text: String,
    #[serde(rename = "type")]
    pub token_type: TokenType,
    #[serde(default)]
    pub reading: Option<String>,
    #[serde(default)]
    pub romaji: Option<String>,
    #[serde(default)]
    pub definition: Option<String>,
}

/// A refined document from the oracle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Refinement {
    /// New lines along with per-line translations.
    Refined {
        parsed_lines: Vec<Vec<OracleToken>>,
        translations: Vec<String>,
    },
    /// Older oracles only return the lines.
    Legacy { parsed_lines: Vec<Vec<OracleToken>> },
}

// the two shapes the oracle responds with
#[derive(Deserialize)]
#[serde(untagged)]
enum RefinementRepr {
    Refined {
        #[serde(rename = "parsedLines")]
        parsed_lines: Vec<Vec<OracleToken>>,
        #[serde(default)]
        translations: Option<Vec<String>>,
    },
    Legacy(Vec<Vec<OracleToken>>),
}

impl Refinement {
    /// Decodes either response shape.
    pub fn from_json(json: &str) -> Result<Self, OracleError> {
        let repr = serde_json::from_str::<RefinementRepr>(json)?;
        Ok(repr.into())
    }

    pub fn parsed_lines(&self) -> &[Vec<OracleToken>] {
        match self {
            Self::Refined { parsed_lines, .. } | Self::Legacy { parsed_lines } => parsed_lines,
        }
    }
}

impl From<RefinementRepr> for Refinement {
    fn from(value: RefinementRepr) -> Self {
        match value {
            RefinementRepr::Refined {
                parsed_lines,
                translations,
            } => Self::Refined {
                parsed_lines,
                translations: translations.unwrap_or_default(),
            },
            RefinementRepr::Legacy(parsed_lines) => Self::Legacy { parsed_lines },
        }
    }
}

/// Identifies a single verification request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RequestId(pub u64);

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "verify-{}", self.0)
    }
}

/// A request to look up a single token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifyRequest {
    pub request_id: RequestId,
    pub token_text: String,
    /// The whole line the token is on.
    pub line_context: String,
}

/// The oracle's answer for a single token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub reading: String,
    pub definition: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[async_trait]
pub trait Oracle: Send + Sync {
    /// Refines a locally parsed document with the context of the whole text.
    async fn refine(
        &self,
        credentials: &Credentials,
        raw_text: &str,
        lines: &[ParsedLine],
    ) -> Result<Refinement, OracleError>;

    /// Looks up a single token. `Ok(None)` means the oracle had no answer.
    ///
    /// The request should be abandoned as soon as `cancel` is cancelled.
    async fn verify(
        &self,
        credentials: &Credentials,
        request: &VerifyRequest,
        cancel: CancellationToken,
    ) -> Result<Option<Verification>, OracleError>;
}

#[async_trait]
impl<T: Oracle + ?Sized> Oracle for Arc<T> {
    async fn refine(
        &self,
        credentials: &Credentials,
        raw_text: &str,
        lines: &[ParsedLine],
    ) -> Result<Refinement, OracleError> {
        (**self).refine(credentials, raw_text, lines).await
    }

    async fn verify(
        &self,
        credentials: &Credentials,
        request: &VerifyRequest,
        cancel: CancellationToken,
    ) -> Result<Option<Verification>, OracleError> {
        (**self).verify(credentials, request, cancel).await
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn decodes_refined_shape() {
        let json = r#"{
            "parsedLines": [[{"text": "忘れた", "type": "kanji", "reading": "わすれた"}]],
            "translations": ["Forgot"]
        }"#;
        let refinement = Refinement::from_json(json).unwrap();
        let Refinement::Refined {
            parsed_lines,
            translations,
        } = refinement
        else {
            panic!("expected refined shape");
        };
        assert_eq!(parsed_lines[0][0].text, "忘れた");
        assert_eq!(parsed_lines[0][0].reading.as_deref(), Some("わすれた"));
        assert_eq!(translations, &["Forgot"]);
    }

    #[test]
    fn decodes_refined_shape_without_translations() {
        let json = r#"{"parsedLines": [[{"text": "物", "type": "kanji"}]], "translations": null}"#;
        let refinement = Refinement::from_json(json).unwrap();
        assert!(matches!(
            refinement,
            Refinement::Refined { ref translations, .. } if translations.is_empty()
        ));
    }

    #[test]
    fn decodes_legacy_shape() {
        let json = r#"[[{"text": "物", "type": "kanji", "reading": "もの"}], []]"#;
        let refinement = Refinement::from_json(json).unwrap();
        assert!(matches!(refinement, Refinement::Legacy { .. }));
        assert_eq!(refinement.parsed_lines().len(), 2);
    }

    #[test]
    fn rejects_malformed() {
        let res = Refinement::from_json(r#"{"lines": []}"#);
        assert!(matches!(res, Err(OracleError::Malformed(_))));
        let res = Refinement::from_json(r#"[[{"text": "物", "type": "noun"}]]"#);
        assert!(matches!(res, Err(OracleError::Malformed(_))));
    }

    #[test]
    fn debug_hides_api_key() {
        let credentials = Credentials::new("secret-key").with_model("some-model");
        let debug = format!("{credentials:?}");
        assert!(!debug.contains("secret-key"));
        assert!(debug.contains("some-model"));
    }
}
