//! HDL code generation.
//!
//! Generation runs offline on a [`Part`] declaration, in two independent
//! stages:
//!
//! - **structural**: the part's ports expand into an entity declaration
//!   through a fixed template ([`StructuralTemplate`]);
//! - **behavioral**: the behavior description becomes an architecture body,
//!   either through a [`Translator`] or as a commented placeholder.
//!
//! The structural stage never depends on the behavioral one. A translator
//! failure downgrades the architecture to the placeholder and is logged;
//! it never fails the call.
//!
//! # Example
//!
//! ```
//! use kairo::codegen::{generate, CodegenOptions};
//! use kairo::parts::register;
//!
//! let hdl = generate(&register("dut"), &CodegenOptions::default(), None).unwrap();
//! assert!(hdl.structural.contains("entity register is"));
//! assert!(hdl.behavioral.contains("architecture rtl of register is"));
//! ```

pub mod behavioral;
pub mod structural;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::part::Part;

pub use behavioral::{FnTranslator, TranslateError, Translator};
pub use structural::{PortDecl, StructuralTemplate};

/// Errors that stop code generation.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum CodegenError {
    #[error("unsupported language: {0}")]
    UnsupportedLanguage(String),
}

/// Target hardware description language.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HdlLanguage {
    #[default]
    Vhdl,
}

impl fmt::Display for HdlLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HdlLanguage::Vhdl => f.write_str("VHDL"),
        }
    }
}

impl FromStr for HdlLanguage {
    type Err = CodegenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.eq_ignore_ascii_case("vhdl") {
            Ok(HdlLanguage::Vhdl)
        } else {
            Err(CodegenError::UnsupportedLanguage(s.to_string()))
        }
    }
}

/// Generation settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CodegenOptions {
    /// Target language name, parsed when generating
    pub language: String,
    /// Entity name; defaults to the part class in lower case
    pub entity_name: Option<String>,
    pub architecture_name: String,
}

impl Default for CodegenOptions {
    fn default() -> Self {
        Self {
            language: "VHDL".to_string(),
            entity_name: None,
            architecture_name: "rtl".to_string(),
        }
    }
}

impl CodegenOptions {
    pub fn with_language(mut self, language: impl Into<String>) -> Self {
        self.language = language.into();
        self
    }

    pub fn with_entity_name(mut self, name: impl Into<String>) -> Self {
        self.entity_name = Some(name.into());
        self
    }

    pub fn with_architecture_name(mut self, name: impl Into<String>) -> Self {
        self.architecture_name = name.into();
        self
    }
}

/// Output of both stages.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedHdl {
    pub language: HdlLanguage,
    pub entity_name: String,
    /// Library clause and entity declaration
    pub structural: String,
    /// Architecture
    pub behavioral: String,
    /// Translator that produced the architecture, `None` for the placeholder
    pub translated_by: Option<String>,
}

impl GeneratedHdl {
    /// Both stages as one source file.
    pub fn text(&self) -> String {
        format!("{}\n{}", self.structural, self.behavioral)
    }
}

impl fmt::Display for GeneratedHdl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text())
    }
}

/// Generates an entity and an architecture for `part`.
pub fn generate(
    part: &Part,
    options: &CodegenOptions,
    translator: Option<&dyn Translator>,
) -> Result<GeneratedHdl, CodegenError> {
    let language: HdlLanguage = options.language.parse()?;
    let entity_name = options
        .entity_name
        .clone()
        .unwrap_or_else(|| part.class().to_lowercase());

    let structural = StructuralTemplate::from_part(part, entity_name.as_str()).render_vhdl();
    let (behavioral, translated_by) = behavioral::render_behavior(
        &options.architecture_name,
        &entity_name,
        part.behavior_source(),
        language,
        translator,
    );

    tracing::info!(
        part = part.name(),
        entity = %entity_name,
        %language,
        translated = translated_by.is_some(),
        "HDL generated"
    );
    Ok(GeneratedHdl {
        language,
        entity_name,
        structural,
        behavioral,
        translated_by,
    })
}
