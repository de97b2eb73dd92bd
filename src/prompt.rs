//! The classification prompt.
//!
//! The taxonomy lives entirely in the prompt: the model is told the four
//! scenarios, the classification rules and the exact JSON shape to answer
//! with. Code only checks the answer against that shape, see
//! [`crate::classifier`].

use crate::models::CandidateItem;

/// Render the classification prompt for one item.
///
/// `title`, `source` and `summary` are embedded verbatim.
pub fn render(item: &CandidateItem) -> String {
    format!(
        r#"
You are an anticipatory intelligence analyst specializing in AI's impact on democracy.

Assess whether this news item is a relevant anticipatory signal about how AI is affecting
democratic life, institutions, participation, or the information environment.

If relevant, classify it using these four scenarios:

1. STRENGTHENS: AI reinforces and extends existing democratic institutions, participation,
   rule of law, or civic capacity. Current democratic structures adapt and remain legitimate.
   Examples: AI improving electoral administration, expanding civic participation,
   strengthening oversight of technology, transparent public sector AI deployment.

2. NEW_DEMOCRACY: AI enables genuinely new democratic forms not reducible to existing
   institutions. New modes of collective decision-making, legitimacy, or sovereignty emerge.
   Examples: AI-facilitated deliberative assemblies at scale, algorithmic commons governance,
   post-representative participation models, citizen co-design of public AI infrastructure.

3. WEAKENS: AI gradually narrows civic space, concentrates power, erodes rights, or
   hollows out democratic procedures while maintaining democratic facades.
   Examples: algorithmic political manipulation, surveillance creep, technocratic displacement
   of deliberation, platform monopolization of political discourse, AI-enabled gerrymandering.

4. COLLAPSE: AI contributes to acute, visible breakdown of democratic governance,
   legitimacy, or institutions. Crisis-level events rather than gradual erosion.
   Examples: election infrastructure failure, AI disinformation causing institutional
   delegitimization, authoritarian crackdowns enabled by AI, rapid power concentration
   bypassing constitutional limits.

CLASSIFICATION RULES:
- A signal may point toward multiple scenarios simultaneously.
- Assign exactly one PRIMARY category (the dominant reading).
- Add SECONDARY categories where the signal also has meaningful resonance.
  Never repeat the primary category among the secondary categories.
- Use AMBIGUOUS as primary only when no scenario clearly dominates and the item is
  genuinely relevant. Do not use it to avoid a difficult judgment.
- Confidence reflects clarity of mapping, not relevance.

DOMAIN OPTIONS:
- epistemic: truth, information environment, media
- procedural: elections, voting, formal democratic processes
- institutional: governance bodies, regulation, rule of law
- participatory: civic engagement, deliberation, public input
- power: concentration or distribution of political power
- multiple: clearly spans several domains

SIGNAL STRENGTH:
- weak: early or isolated indicator
- moderate: clear but not yet established trend
- strong: documented, recurring, or systemic pattern

SIGNAL TYPE:
- emerging: new and just appearing
- accelerating: growing faster
- plateauing: levelling off
- reversing: previously strong signal now weakening

News item:
TITLE: {title}
SOURCE: {source}
SUMMARY: {summary}

Respond ONLY with valid JSON, no preamble, no markdown backticks:
{{
  "relevant": true or false,
  "primary_category": "STRENGTHENS|NEW_DEMOCRACY|WEAKENS|COLLAPSE|AMBIGUOUS",
  "secondary_categories": [],
  "signal_strength": "weak|moderate|strong",
  "signal_type": "emerging|accelerating|plateauing|reversing",
  "domain": "epistemic|procedural|institutional|participatory|power|multiple",
  "confidence": 0.0 to 1.0,
  "rationale": "2-3 sentences on the primary reading",
  "secondary_rationale": "1-2 sentences on secondary dimensions, or empty string if none",
  "finnish_relevance": true or false
}}
"#,
        title = item.title,
        source = item.source,
        summary = item.summary,
    )
}
