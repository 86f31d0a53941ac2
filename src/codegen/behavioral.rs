//! Behavioral stage: architecture bodies from behavior descriptions.
//!
//! Translation is delegated to an optional [`Translator`]. Without one, or
//! when it fails, the architecture embeds the behavior text line by line as
//! comments so nothing is lost.

use thiserror::Error;

use crate::codegen::HdlLanguage;

/// Failure reported by a translator.
#[derive(Error, Debug)]
pub enum TranslateError {
    #[error("translator unavailable: {0}")]
    Unavailable(String),

    #[error("translation rejected: {0}")]
    Rejected(String),

    #[error("translator returned an empty body")]
    Empty,
}

/// An external behavior translation service.
pub trait Translator {
    /// Identity written into the generated architecture.
    fn name(&self) -> &str;

    /// Translates behavior text into a body in `language`.
    fn translate(&self, source: &str, language: HdlLanguage) -> Result<String, TranslateError>;
}

/// A translator backed by a closure.
pub struct FnTranslator<F> {
    name: String,
    func: F,
}

impl<F> FnTranslator<F>
where
    F: Fn(&str, HdlLanguage) -> Result<String, TranslateError>,
{
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl<F> Translator for FnTranslator<F>
where
    F: Fn(&str, HdlLanguage) -> Result<String, TranslateError>,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn translate(&self, source: &str, language: HdlLanguage) -> Result<String, TranslateError> {
        (self.func)(source, language)
    }
}

fn architecture(name: &str, entity: &str, body: &str) -> String {
    format!("architecture {name} of {entity} is\nbegin\n\n{body}\nend {name};\n")
}

/// Architecture embedding `source` verbatim, one comment line per source line.
pub fn placeholder_architecture(name: &str, entity: &str, source: Option<&str>) -> String {
    let mut body = String::from("    -- Behavior not translated.\n");
    match source {
        Some(text) if !text.trim().is_empty() => {
            body.push_str("    -- Behavior description:\n");
            for line in text.lines() {
                if line.is_empty() {
                    body.push_str("    --\n");
                } else {
                    body.push_str(&format!("    -- {}\n", line));
                }
            }
        }
        _ => body.push_str("    -- No behavior description available.\n"),
    }
    architecture(name, entity, &body)
}

/// Architecture wrapping a translated body, annotated with the translator.
pub fn translated_architecture(name: &str, entity: &str, translator: &str, generated: &str) -> String {
    let mut body = format!("    -- Generated by {}\n", translator);
    for line in generated.lines() {
        if line.trim().is_empty() {
            body.push('\n');
        } else {
            body.push_str(&format!("    {}\n", line));
        }
    }
    architecture(name, entity, &body)
}

/// Runs the translator if there is one, falling back to the placeholder.
///
/// Returns the architecture text and the name of the translator that
/// produced it, if any.
pub fn render_behavior(
    name: &str,
    entity: &str,
    source: Option<&str>,
    language: HdlLanguage,
    translator: Option<&dyn Translator>,
) -> (String, Option<String>) {
    let (Some(translator), Some(text)) = (translator, source) else {
        return (placeholder_architecture(name, entity, source), None);
    };

    let result = translator.translate(text, language).and_then(|body| {
        if body.trim().is_empty() {
            Err(TranslateError::Empty)
        } else {
            Ok(body)
        }
    });
    match result {
        Ok(body) => {
            tracing::debug!(translator = translator.name(), entity, "behavior translated");
            (
                translated_architecture(name, entity, translator.name(), &body),
                Some(translator.name().to_string()),
            )
        }
        Err(error) => {
            tracing::warn!(translator = translator.name(), entity, %error, "translation failed, using placeholder");
            (placeholder_architecture(name, entity, source), None)
        }
    }
}
