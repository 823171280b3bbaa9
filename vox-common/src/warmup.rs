//! Warm-up quiz
//!
//! Five multiple-choice questions shown before the first recording. The
//! communication style is picked from the answers to the first two
//! questions; every other combination maps to the default style.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::{Error, Result};

/// One selectable answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizOption {
    pub text: &'static str,
    pub value: &'static str,
    pub emoji: &'static str,
}

/// One quiz question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct QuizQuestion {
    pub id: u8,
    pub question: &'static str,
    pub options: [QuizOption; 4],
}

/// Communication style revealed at the end of the quiz
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CommunicationStyle {
    pub title: &'static str,
    pub emoji: &'static str,
    pub description: &'static str,
}

/// Answers keyed by question id
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizAnswers {
    pub answers: BTreeMap<u8, String>,
}

const fn option(text: &'static str, value: &'static str, emoji: &'static str) -> QuizOption {
    QuizOption { text, value, emoji }
}

pub const QUESTIONS: [QuizQuestion; 5] = [
    QuizQuestion {
        id: 1,
        question: "When speaking in public, you usually...",
        options: [
            option("Plan every word carefully", "planner", "📝"),
            option("Go with the flow", "spontaneous", "🌊"),
            option("Feel nervous but push through", "brave", "💪"),
            option("Thrive on the energy", "energetic", "⚡"),
        ],
    },
    QuizQuestion {
        id: 2,
        question: "Pick a word that describes you best:",
        options: [
            option("Analytical", "analytical", "🧠"),
            option("Creative", "creative", "🎨"),
            option("Empathetic", "empathetic", "❤️"),
            option("Ambitious", "ambitious", "🎯"),
        ],
    },
    QuizQuestion {
        id: 3,
        question: "Your biggest struggle when explaining yourself:",
        options: [
            option("Organizing my thoughts", "organization", "🧩"),
            option("Finding the right words", "vocabulary", "💬"),
            option("Managing anxiety", "anxiety", "😰"),
            option("Being concise", "brevity", "⏱️"),
        ],
    },
    QuizQuestion {
        id: 4,
        question: "In conversations, you tend to:",
        options: [
            option("Listen more than speak", "listener", "👂"),
            option("Lead the discussion", "leader", "🗣️"),
            option("Ask lots of questions", "curious", "❓"),
            option("Share stories and examples", "storyteller", "📖"),
        ],
    },
    QuizQuestion {
        id: 5,
        question: "When you meet someone new, you:",
        options: [
            option("Wait for them to start talking", "reserved", "🤫"),
            option("Introduce myself confidently", "confident", "🤝"),
            option("Feel excited to connect", "social", "😊"),
            option("Assess the situation first", "observer", "👀"),
        ],
    },
];

/// Styles keyed by `<answer to question 1>-<answer to question 2>`
const STYLES: [(&str, CommunicationStyle); 6] = [
    (
        "planner-analytical",
        CommunicationStyle {
            title: "Strategic Architect",
            emoji: "🏗️",
            description: "You're methodical and precise, but you may overthink under pressure. Your strength is preparation; your challenge is spontaneity.",
        },
    ),
    (
        "planner-creative",
        CommunicationStyle {
            title: "Visionary Planner",
            emoji: "🎨📋",
            description: "You blend creativity with structure. You craft beautiful presentations but sometimes get lost in details.",
        },
    ),
    (
        "spontaneous-creative",
        CommunicationStyle {
            title: "Free Spirit",
            emoji: "🦋",
            description: "You're naturally expressive and think on your feet, and structure will help you shine even brighter.",
        },
    ),
    (
        "brave-analytical",
        CommunicationStyle {
            title: "Thoughtful Builder",
            emoji: "🧠⚒️",
            description: "You're smart and push through fear, but you overthink under pressure. Let's build your confidence.",
        },
    ),
    (
        "energetic-ambitious",
        CommunicationStyle {
            title: "Dynamic Leader",
            emoji: "⚡🎯",
            description: "You thrive on energy and goals. Your passion is clear, so let's channel it with precision.",
        },
    ),
    (
        "brave-empathetic",
        CommunicationStyle {
            title: "Compassionate Connector",
            emoji: "❤️👂",
            description: "You understand people deeply. Your challenge is expressing your own voice as clearly as you hear others.",
        },
    ),
];

pub const DEFAULT_STYLE: CommunicationStyle = CommunicationStyle {
    title: "Unique Communicator",
    emoji: "✨",
    description: "You have a unique communication style. Let's discover your strengths and refine your approach.",
};

fn find_question(id: u8) -> Option<&'static QuizQuestion> {
    QUESTIONS.iter().find(|q| q.id == id)
}

/// Classify a set of quiz answers
///
/// # Errors
/// `InvalidInput` if the first two questions are unanswered, a question id
/// is unknown, or an answer is not one of that question's option values.
pub fn classify(answers: &QuizAnswers) -> Result<CommunicationStyle> {
    for (id, value) in &answers.answers {
        let question = find_question(*id)
            .ok_or_else(|| Error::InvalidInput(format!("unknown question id {}", id)))?;
        if !question.options.iter().any(|o| o.value == value) {
            return Err(Error::InvalidInput(format!(
                "'{}' is not an option for question {}",
                value, id
            )));
        }
    }

    let first = answers
        .answers
        .get(&1)
        .ok_or_else(|| Error::InvalidInput("question 1 is unanswered".to_string()))?;
    let second = answers
        .answers
        .get(&2)
        .ok_or_else(|| Error::InvalidInput("question 2 is unanswered".to_string()))?;

    let key = format!("{}-{}", first, second);
    let style = STYLES
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, style)| *style)
        .unwrap_or(DEFAULT_STYLE);

    Ok(style)
}
