//! Request and result types shared by the prompt builder, the reply
//! interpreter, and the HTTP surface.
//!
//! Wire names are camelCase to match the design-tool plugin. Config fields
//! deserialize leniently: missing or falsy values resolve to defaults instead
//! of failing the request.

use serde::{Deserialize, Deserializer, Serialize};

/// Default tone when the caller leaves `identity` empty.
pub const DEFAULT_IDENTITY: &str = "General professional Thai (สุภาพทั่วไป)";

/// Default audience when the caller leaves `targetAudience` empty.
pub const DEFAULT_AUDIENCE: &str = "General users";

// ── Config ─────────────────────────────────────────────────────────

/// How closely a variant should track the source text's length.
#[derive(Serialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LengthConstraint {
    #[default]
    Flexible,
    Similar,
    Exact,
}

impl LengthConstraint {
    /// Parse a wire label. Anything unrecognized is `Flexible`.
    pub fn from_label(label: &str) -> Self {
        match label {
            "similar" => LengthConstraint::Similar,
            "exact" => LengthConstraint::Exact,
            _ => LengthConstraint::Flexible,
        }
    }

    /// Human-readable rule rendered into the prompt.
    pub fn description(self) -> &'static str {
        match self {
            LengthConstraint::Flexible => "Flexible (natural length, no strict limit)",
            LengthConstraint::Similar => "Similar length (±10% of original character count)",
            LengthConstraint::Exact => {
                "Exact length (match original character count as closely as possible)"
            }
        }
    }
}

impl<'de> Deserialize<'de> for LengthConstraint {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = serde_json::Value::deserialize(deserializer)?;
        Ok(value
            .as_str()
            .map(LengthConstraint::from_label)
            .unwrap_or_default())
    }
}

/// Stylistic profile for one generation request.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    /// Tone/mood descriptor, e.g. "Gen Z casual" or "luxury".
    #[serde(default)]
    pub identity: Option<String>,
    #[serde(default)]
    pub target_audience: Option<String>,
    /// Whether to add ครับ/ค่ะ. Read by truthiness.
    #[serde(default, deserialize_with = "truthy")]
    pub polite_particles: bool,
    #[serde(default)]
    pub length_constraint: LengthConstraint,
}

impl GenerationConfig {
    /// Identity with the default applied to missing or empty values.
    pub fn identity_or_default(&self) -> &str {
        non_empty(self.identity.as_deref()).unwrap_or(DEFAULT_IDENTITY)
    }

    /// Audience with the default applied to missing or empty values.
    pub fn audience_or_default(&self) -> &str {
        non_empty(self.target_audience.as_deref()).unwrap_or(DEFAULT_AUDIENCE)
    }
}

fn non_empty(s: Option<&str>) -> Option<&str> {
    s.filter(|s| !s.is_empty())
}

/// `null`, `false`, `0` and `""` are false; everything else is true.
fn truthy<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
    use serde_json::Value;

    let value = Value::deserialize(deserializer)?;
    Ok(match value {
        Value::Null => false,
        Value::Bool(b) => b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0 && !f.is_nan()),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    })
}

// ── Nodes ──────────────────────────────────────────────────────────

/// Font metadata reported by the design tool. Carried through, never read.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct FontName {
    #[serde(default)]
    pub family: String,
    #[serde(default)]
    pub style: String,
}

/// One text element scanned from the design document.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TextNode {
    pub id: String,
    #[serde(default)]
    pub name: String,
    /// Literal source text to rewrite.
    #[serde(default)]
    pub characters: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub font_name: Option<FontName>,
    /// Layer path from the document root.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub path: Vec<String>,
}

impl TextNode {
    pub fn new(id: impl Into<String>, characters: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            characters: characters.into(),
            ..Default::default()
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }
}

// ── Results ────────────────────────────────────────────────────────

/// Rewrites produced for one node.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct VariantResult {
    pub node_id: String,
    /// Source text looked up from the request, never taken from upstream.
    pub original: String,
    pub options: Vec<String>,
}

/// Response body for a generation request.
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct GenerationResults {
    pub variants: Vec<VariantResult>,
}

impl GenerationResults {
    /// Whether some entry carries the given node id.
    pub fn covers(&self, node_id: &str) -> bool {
        self.variants.iter().any(|v| v.node_id == node_id)
    }
}

/// Validated inbound request.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct GenerateRequest {
    pub config: GenerationConfig,
    pub nodes: Vec<TextNode>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_when_fields_missing() {
        let config: GenerationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.identity_or_default(), DEFAULT_IDENTITY);
        assert_eq!(config.audience_or_default(), DEFAULT_AUDIENCE);
        assert!(!config.polite_particles);
        assert_eq!(config.length_constraint, LengthConstraint::Flexible);
    }

    #[test]
    fn empty_strings_fall_back_to_defaults() {
        let config: GenerationConfig =
            serde_json::from_str(r#"{"identity":"","targetAudience":null}"#).unwrap();
        assert_eq!(config.identity_or_default(), DEFAULT_IDENTITY);
        assert_eq!(config.audience_or_default(), DEFAULT_AUDIENCE);
    }

    #[test]
    fn unknown_length_constraint_is_flexible() {
        for raw in [r#""shortest""#, "42", "null", r#""EXACT""#, r#"{"a":1}"#] {
            let json = format!(r#"{{"lengthConstraint":{raw}}}"#);
            let config: GenerationConfig = serde_json::from_str(&json).unwrap();
            assert_eq!(config.length_constraint, LengthConstraint::Flexible, "{raw}");
        }
    }

    #[test]
    fn known_length_constraints_parse() {
        let config: GenerationConfig =
            serde_json::from_str(r#"{"lengthConstraint":"exact"}"#).unwrap();
        assert_eq!(config.length_constraint, LengthConstraint::Exact);
        let config: GenerationConfig =
            serde_json::from_str(r#"{"lengthConstraint":"similar"}"#).unwrap();
        assert_eq!(config.length_constraint, LengthConstraint::Similar);
    }

    #[test]
    fn polite_particles_uses_truthiness() {
        let cases = [
            ("true", true),
            ("false", false),
            ("1", true),
            ("0", false),
            (r#""yes""#, true),
            (r#""""#, false),
            ("null", false),
        ];
        for (raw, expected) in cases {
            let json = format!(r#"{{"politeParticles":{raw}}}"#);
            let config: GenerationConfig = serde_json::from_str(&json).unwrap();
            assert_eq!(config.polite_particles, expected, "{raw}");
        }
    }

    #[test]
    fn text_node_carries_metadata() {
        let json = r#"{
            "id": "12:34",
            "name": "Title",
            "characters": "สวัสดี",
            "fontName": {"family": "Sarabun", "style": "Bold"},
            "path": ["Page", "Frame"]
        }"#;
        let node: TextNode = serde_json::from_str(json).unwrap();
        assert_eq!(node.id, "12:34");
        assert_eq!(node.font_name.as_ref().unwrap().family, "Sarabun");
        assert_eq!(node.path, vec!["Page", "Frame"]);
    }

    #[test]
    fn variant_result_serializes_camel_case() {
        let result = VariantResult {
            node_id: "1".into(),
            original: "Hello".into(),
            options: vec!["A".into()],
        };
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["nodeId"], "1");
        assert!(json.get("node_id").is_none());
    }
}
