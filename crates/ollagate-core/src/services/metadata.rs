//! Lexical model metadata synthesis.
//!
//! The upstream API only lists identifiers. Ollama clients expect a size
//! class, family, digest and a handful of GGUF-ish fields, so these are
//! derived from the identifier text. Rules are ordered tables evaluated
//! first-match-wins against `identifier + " " + display_name`, lowercased.

use sha2::{Digest, Sha256};

use crate::domain::ModelDescriptor;

/// Placeholder context length reported for every model.
pub const CONTEXT_LENGTH: u64 = 200_000;
/// Placeholder quantization label.
pub const QUANTIZATION_LEVEL: &str = "Q4_K_M";
/// Placeholder model file format.
pub const MODEL_FORMAT: &str = "gguf";
/// Placeholder on-disk size in bytes.
pub const NOMINAL_SIZE: u64 = 270_898_672;

/// Parameter-size rules: `(pattern, label, parameter count)`.
pub const PARAMETER_SIZE_RULES: &[(&str, &str, u64)] = &[
    ("70b", "70B", 70_000_000_000),
    ("13b", "13B", 13_000_000_000),
    ("3b", "3B", 3_000_000_000),
    ("1b", "1B", 1_000_000_000),
];
/// Size class used when no rule matches.
pub const DEFAULT_PARAMETER_SIZE: (&str, u64) = ("7B", 7_000_000_000);

/// Family rules: `(pattern, family)`.
pub const FAMILY_RULES: &[(&str, &str)] = &[
    ("llama", "llama"),
    ("mistral", "mistral"),
    ("gemma", "gemma"),
    ("claude", "claude"),
    ("gpt", "gpt"),
];
/// Family used when no rule matches.
pub const DEFAULT_FAMILY: &str = "transformer";

/// Final `/`-delimited segment of an identifier.
#[must_use]
pub fn display_name(identifier: &str) -> &str {
    identifier.rsplit('/').next().unwrap_or(identifier)
}

/// Build a descriptor for `identifier`. Pure and deterministic.
#[must_use]
pub fn describe(identifier: &str) -> ModelDescriptor {
    let name = display_name(identifier);
    let haystack = format!("{identifier} {name}").to_lowercase();

    let (parameter_size, parameter_count) = PARAMETER_SIZE_RULES
        .iter()
        .find(|(pattern, _, _)| haystack.contains(pattern))
        .map_or(DEFAULT_PARAMETER_SIZE, |&(_, label, count)| (label, count));

    let family = FAMILY_RULES
        .iter()
        .find(|(pattern, _)| haystack.contains(pattern))
        .map_or(DEFAULT_FAMILY, |&(_, family)| family);

    ModelDescriptor {
        identifier: identifier.to_string(),
        display_name: name.to_string(),
        digest: digest(identifier),
        parameter_size: parameter_size.to_string(),
        parameter_count,
        family: family.to_string(),
        quantization_level: QUANTIZATION_LEVEL.to_string(),
        format: MODEL_FORMAT.to_string(),
        context_length: CONTEXT_LENGTH,
        size: NOMINAL_SIZE,
    }
}

/// Lowercase hex SHA-256 of the identifier. An opaque stable id, not an
/// integrity check.
#[must_use]
pub fn digest(identifier: &str) -> String {
    format!("{:x}", Sha256::digest(identifier.as_bytes()))
}
