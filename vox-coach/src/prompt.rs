//! Coaching prompt construction
//!
//! [`build_prompt`] is a pure function of the attempt context. Everything
//! that varies by duration or round comes from the lookup tables below.

use vox_common::api::{AttemptNumber, DurationCategory, PriorAttempt};
use vox_common::ScoreCard;

/// Structural rules for one duration category
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DurationTier {
    pub duration: DurationCategory,
    /// Required rhetorical structure, in order
    pub structure: &'static [&'static str],
    /// What the evaluation should prioritize
    pub priority: &'static str,
    pub example: Option<&'static str>,
}

pub const DURATION_TIERS: [DurationTier; 3] = [
    DurationTier {
        duration: DurationCategory::Short,
        structure: &["Who you are", "What you do (specific)", "Hook (memorable line)"],
        priority: "Clarity, sharp wording, no filler",
        example: Some(
            "I'm a product designer who helps startups turn messy ideas into clean experiences, and I obsess over simplicity.",
        ),
    },
    DurationTier {
        duration: DurationCategory::Medium,
        structure: &["Hook", "Who you help", "Problem", "What you do", "Result"],
        priority: "Audience clarity, outcome over process, strong verbs",
        example: Some(
            "Most teams waste months building the wrong thing. I help startups validate ideas fast through rapid prototyping. We've saved clients 6 months of dev time.",
        ),
    },
    DurationTier {
        duration: DurationCategory::Long,
        structure: &[
            "Hook",
            "Context",
            "Who you help",
            "Problem",
            "Method",
            "Example",
            "Result",
            "Strong closing",
        ],
        priority: "Logical flow, one concrete example, authority in ending",
        example: None,
    },
];

impl DurationTier {
    pub fn for_duration(duration: DurationCategory) -> &'static DurationTier {
        match duration {
            DurationCategory::Short => &DURATION_TIERS[0],
            DurationCategory::Medium => &DURATION_TIERS[1],
            DurationCategory::Long => &DURATION_TIERS[2],
        }
    }
}

/// Coaching focus for one round
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundGuidance {
    pub title: &'static str,
    pub tasks: &'static [&'static str],
    pub spoken_template: &'static str,
}

const ROUND_GUIDANCE: [RoundGuidance; 3] = [
    RoundGuidance {
        title: "Baseline Assessment",
        tasks: &[
            "Calculate initial scores (clarity, structure, impact out of 10)",
            "Identify what they're trying to say",
            "Rewrite using correct structure",
            "Explain why it works",
        ],
        spoken_template: "Good. I can hear what you're trying to say. [Briefly state what needs work]. I rewrote it to [main change]. Notice how [principle]. [What changed]. Let's tighten this in the next round.",
    },
    RoundGuidance {
        title: "Structured Improvement",
        tasks: &[
            "Calculate new scores",
            "Compare against the previous round",
            "Point out weak language",
            "Provide stronger alternatives",
        ],
        spoken_template: "Much clearer. [Brief improvement]. Your [strength]. What still needs work: [issue]. I rewrote it to [change]. This works because [principle]. [What changed]. Final round, make it yours.",
    },
    RoundGuidance {
        title: "Final Assessment",
        tasks: &[
            "Calculate final scores",
            "Compare against the first round",
            "Show transformation arc",
            "Give communication archetype",
        ],
        spoken_template: "Alright, strong final round. In round one, you were [state]. By round three, you're [state]. That's progress. Your [strengths]. What needed sharpening: [issues]. I rewrote it to [change]. Notice how [principle]. The biggest change: [insight]. This now sounds [outcome].",
    },
];

impl RoundGuidance {
    pub fn for_attempt(attempt: AttemptNumber) -> &'static RoundGuidance {
        // AttemptNumber is always 1..=3
        &ROUND_GUIDANCE[usize::from(attempt.get() - 1)]
    }
}

/// Everything the prompt depends on
#[derive(Debug, Clone, Copy)]
pub struct PromptInput<'a> {
    pub transcript: &'a str,
    pub duration: DurationCategory,
    pub attempt: AttemptNumber,
    pub previous_attempts: &'a [PriorAttempt],
}

impl PromptInput<'_> {
    fn previous_scores(&self) -> Option<&ScoreCard> {
        self.previous_attempts.last()?.scores.as_ref()
    }
}

/// Build the coaching prompt for one attempt
pub fn build_prompt(input: &PromptInput<'_>) -> String {
    let tier = DurationTier::for_duration(input.duration);
    let round = RoundGuidance::for_attempt(input.attempt);
    let seconds = input.duration.seconds();

    let mut lines: Vec<String> = vec![
        "You are VoxMentor, an energetic, warm, intelligent communication coach.".to_string(),
        String::new(),
        "CONTEXT:".to_string(),
        format!("- Round: {} of {}", input.attempt, AttemptNumber::FINAL),
        format!("- Duration: {} seconds", seconds),
        format!("- Transcript: \"{}\"", input.transcript),
    ];

    if !input.previous_attempts.is_empty() {
        lines.push(String::new());
        lines.push("PREVIOUS ATTEMPTS:".to_string());
        for (i, attempt) in input.previous_attempts.iter().enumerate() {
            lines.push(format!("Round {}: \"{}\"", i + 1, attempt.transcript));
            if let Some(scores) = &attempt.scores {
                lines.push(format!(
                    "Scores: Clarity {}, Structure {}, Impact {}, Overall {}",
                    scores.clarity,
                    scores.structure,
                    scores.impact,
                    scores.computed_overall()
                ));
            }
        }
    }

    lines.push(String::new());
    lines.push(format!("STRUCTURE RULE FOR {}s:", seconds));
    lines.push(tier.structure.join(" -> "));
    lines.push(format!("Priority: {}", tier.priority));
    if let Some(example) = tier.example {
        lines.push(format!("Example: \"{}\"", example));
    }

    lines.push(String::new());
    lines.push(
        "CRITICAL: Generate TWO separate outputs:\n\
         1. FULL DETAILED TEXT FEEDBACK (for display)\n\
         2. SPOKEN SUMMARY (25-30 seconds, 120-160 words) - This is what AI will speak\n\
         \n\
         SPOKEN SUMMARY MUST:\n\
         - Sound like a real mentor wrapping up a session\n\
         - Be conversational and warm\n\
         - Cover key insights in compressed form\n\
         - NO section headings\n\
         - NO bullet points\n\
         - NO robotic tone"
            .to_string(),
    );

    lines.push(String::new());
    lines.push(format!("ROUND {}: {}", input.attempt, round.title));
    lines.extend(round.tasks.iter().map(|task| format!("- {}", task)));
    lines.push(String::new());
    lines.push("SPOKEN SUMMARY STRUCTURE:".to_string());
    lines.push(format!("\"{}\"", round.spoken_template));

    if input.attempt.is_final() {
        lines.push(String::new());
        lines.push("ALSO generate spoken_transformation (20 seconds, 80-100 words):".to_string());
        lines.push(
            "\"[Summarize journey]. [Breakthrough]. [Archetype revealed]. [Final encouragement].\""
                .to_string(),
        );
    }

    lines.push(String::new());
    lines.push("Score clarity, structure and impact from 0 to 10 (one decimal allowed).".to_string());
    lines.push(format!(
        "overall_score is clarity + structure + impact (0 to {}).",
        ScoreCard::MAX_OVERALL
    ));
    lines.push(String::new());
    lines.push("Return JSON with EXACT structure:".to_string());
    lines.push(response_schema(input));

    lines.join("\n")
}

/// JSON schema block, with optional sections for the round
fn response_schema(input: &PromptInput<'_>) -> String {
    let mut schema = String::from(
        "{\n  \"scores\": {\n    \"clarity\": 7.5,\n    \"structure\": 6.0,\n    \"impact\": 7.0,\n    \"overall_score\": 20.5\n  },\n",
    );

    if !input.attempt.is_first() && input.previous_scores().is_some() {
        schema.push_str(
            "  \"improvement\": {\n    \"clarity_change\": \"number (new - old)\",\n    \"structure_change\": \"number\",\n    \"impact_change\": \"number\",\n    \"overall_change\": \"number\",\n    \"percentage_improvement\": \"number (percentage)\"\n  },\n",
        );
    }

    schema.push_str(
        "  \"spoken_summary\": \"120-160 word mentor summary. Warm, conversational. This will be spoken by AI.\",\n\
         \x20 \"spoken_intro\": \"2-3 sentence warm opening for text\",\n\
         \x20 \"what_hearing\": {\n    \"core_identity\": \"...\",\n    \"what_they_do\": \"...\",\n    \"whats_unclear\": \"...\"\n  },\n\
         \x20 \"what_needs_sharpening\": [\"point 1\", \"point 2\", \"point 3\"],\n\
         \x20 \"rewritten_version\": \"Improved version with structure\",\n\
         \x20 \"why_this_works\": \"Explanation with principle\",\n\
         \x20 \"what_changed\": \"Specific changes made\",\n\
         \x20 \"rephrase_options\": [\"option 1\", \"option 2\"],\n",
    );

    if input.attempt.is_final() {
        schema.push_str(
            "  \"transformation_summary\": {\n    \"round_1\": \"...\",\n    \"round_2\": \"...\",\n    \"round_3\": \"...\",\n    \"breakthrough_moment\": \"...\",\n    \"archetype\": \"Professional archetype name\",\n    \"what_you_learned\": [\"lesson 1\", \"lesson 2\", \"lesson 3\"],\n    \"spoken_transformation\": \"80-100 word transformation summary for voice\"\n  },\n",
        );
    }

    schema.push_str("  \"next_instruction\": \"Motivational direction\"\n}");
    schema
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prior(transcript: &str, scores: Option<ScoreCard>) -> PriorAttempt {
        PriorAttempt {
            transcript: transcript.to_string(),
            scores,
        }
    }

    #[test]
    fn test_tiers_cover_every_duration() {
        for duration in DurationCategory::ALL {
            assert_eq!(DurationTier::for_duration(duration).duration, duration);
        }
        assert_eq!(DurationTier::for_duration(DurationCategory::Short).structure.len(), 3);
        assert_eq!(DurationTier::for_duration(DurationCategory::Medium).structure.len(), 5);
        assert_eq!(DurationTier::for_duration(DurationCategory::Long).structure.len(), 8);
    }

    #[test]
    fn test_first_round_prompt() {
        let prompt = build_prompt(&PromptInput {
            transcript: "Hi I'm Sarah a software engineer",
            duration: DurationCategory::Medium,
            attempt: AttemptNumber::FIRST,
            previous_attempts: &[],
        });

        assert!(prompt.contains("Round: 1 of 3"));
        assert!(prompt.contains("Transcript: \"Hi I'm Sarah a software engineer\""));
        assert!(prompt.contains("Hook -> Who you help -> Problem -> What you do -> Result"));
        assert!(prompt.contains("ROUND 1: Baseline Assessment"));
        assert!(!prompt.contains("PREVIOUS ATTEMPTS"));
        assert!(!prompt.contains("\"improvement\""));
        assert!(!prompt.contains("\"transformation_summary\""));
    }

    #[test]
    fn test_second_round_lists_previous_attempt_and_requests_improvement() {
        let previous = [prior("Hi I'm Sarah", Some(ScoreCard::new(5.0, 4.0, 6.0)))];
        let prompt = build_prompt(&PromptInput {
            transcript: "I'm Sarah, I build payment systems",
            duration: DurationCategory::Short,
            attempt: AttemptNumber::new(2).unwrap(),
            previous_attempts: &previous,
        });

        assert!(prompt.contains("Round 1: \"Hi I'm Sarah\""));
        assert!(prompt.contains("Scores: Clarity 5, Structure 4, Impact 6, Overall 15"));
        assert!(prompt.contains("\"improvement\""));
        assert!(prompt.contains("Structured Improvement"));
        assert!(!prompt.contains("\"transformation_summary\""));
    }

    #[test]
    fn test_improvement_omitted_when_previous_unscored() {
        let previous = [prior("Hi I'm Sarah", None)];
        let prompt = build_prompt(&PromptInput {
            transcript: "I'm Sarah",
            duration: DurationCategory::Short,
            attempt: AttemptNumber::new(2).unwrap(),
            previous_attempts: &previous,
        });
        assert!(!prompt.contains("\"improvement\""));
    }

    #[test]
    fn test_final_round_requests_transformation() {
        let previous = [
            prior("one", Some(ScoreCard::new(4.0, 4.0, 4.0))),
            prior("two", Some(ScoreCard::new(6.0, 6.0, 6.0))),
        ];
        let prompt = build_prompt(&PromptInput {
            transcript: "three",
            duration: DurationCategory::Long,
            attempt: AttemptNumber::FINAL,
            previous_attempts: &previous,
        });

        assert!(prompt.contains("\"transformation_summary\""));
        assert!(prompt.contains("spoken_transformation"));
        assert!(prompt.contains("Final Assessment"));
        assert!(prompt.contains("Round 2: \"two\""));
        assert!(prompt.contains("Strong closing"));
    }

    #[test]
    fn test_sections_appear_in_order() {
        let previous = [prior("Hi I'm Sarah", Some(ScoreCard::new(5.0, 4.0, 6.0)))];
        let prompt = build_prompt(&PromptInput {
            transcript: "Hi I'm Sarah, I build scheduling tools for clinics",
            duration: DurationCategory::Long,
            attempt: AttemptNumber::new(2).unwrap(),
            previous_attempts: &previous,
        });

        let positions: Vec<usize> = [
            "CONTEXT:",
            "PREVIOUS ATTEMPTS:",
            "STRUCTURE RULE FOR 60s:",
            "CRITICAL: Generate TWO separate outputs:",
            "ROUND 2: Structured Improvement",
            "SPOKEN SUMMARY STRUCTURE:",
            "Return JSON with EXACT structure:",
        ]
        .iter()
        .map(|heading| prompt.find(heading).unwrap_or_else(|| panic!("missing {}", heading)))
        .collect();

        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(prompt.ends_with('}'));
        assert!(!prompt.contains("\n\n\n"));
    }
}
