//! Prompt construction for Thai copy variants.
//!
//! Two strings go upstream per request: the static [`system_instruction`]
//! and the per-request text from [`build_prompt`], which states the
//! stylistic profile and enumerates every node to rewrite.

use crate::model::{GenerationConfig, TextNode};

const PARTICLES_YES: &str = "Yes, add appropriately";
const PARTICLES_NO: &str = "No";

const OUTPUT_FORMAT: &str = r#"{
  "variants": [
    {
      "nodeId": "node-id-here",
      "options": ["variant1", "variant2", "variant3"]
    }
  ]
}"#;

const SYSTEM_INSTRUCTION: &str = r#"You are an expert Thai UX copywriter with deep knowledge of Thai language nuances, tone, and cultural context.

Your task is to generate Thai text variants based on specific Identity/Mood profiles provided by the user.

Key Rules:
1. Thai text has NO SPACES between words - write naturally flowing Thai
2. Respect polite particles (ครับ/ค่ะ/นะ) when requested
3. Match the identity/mood precisely (formal, casual, sarcastic, luxury, Gen Z, etc.)
4. Preserve any variables in curly braces (e.g., {userName}) EXACTLY as they appear
5. Generate exactly 3 distinct variants for each text
6. Each variant should be meaningfully different while matching the same identity/mood
7. Consider the target audience when choosing words and tone
8. Return ONLY valid JSON, no additional text

Output format:
{
  "variants": [
    {
      "nodeId": "123:456",
      "options": ["variant1", "variant2", "variant3"]
    }
  ]
}"#;

/// Persona and domain rules sent as the system message.
pub fn system_instruction() -> &'static str {
    SYSTEM_INSTRUCTION
}

/// One enumerated line for a node. `index` is 1-based.
pub fn render_node_line(index: usize, node: &TextNode) -> String {
    format!(
        "{index}. [Node: {}, ID: {}] \"{}\"",
        node.name, node.id, node.characters
    )
}

/// Build the user message for a batch of nodes.
///
/// Does not validate `nodes`; an empty slice yields a prompt with an empty
/// text list.
pub fn build_prompt(config: &GenerationConfig, nodes: &[TextNode]) -> String {
    let particles = if config.polite_particles {
        PARTICLES_YES
    } else {
        PARTICLES_NO
    };

    let texts = nodes
        .iter()
        .enumerate()
        .map(|(i, node)| render_node_line(i + 1, node))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "Generate Thai text variants with the following profile:

**Identity/Mood:** {identity}
**Target Audience:** {audience}
**Polite Particles (Ka/Krub):** {particles}
**Length Constraint:** {length}

**Original texts to rewrite:**
{texts}

Generate exactly 3 distinct variants for EACH text above. Each variant should:
- Match the specified Identity/Mood tone and style
- Be appropriate for the Target Audience
- Follow the length constraint guidelines
- Include polite particles if requested
- Be meaningfully different from each other

Return ONLY the JSON response with this exact format:
{OUTPUT_FORMAT}",
        identity = config.identity_or_default(),
        audience = config.audience_or_default(),
        length = config.length_constraint.description(),
    )
}
