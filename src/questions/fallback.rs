//! Static fallback question list

use super::{QuestionRecord, ResumeAnalysis};

/// Number of questions in the fallback list
pub const FALLBACK_QUESTION_COUNT: usize = 10;

/// Names longer than this are probably a heading, not a name
const MAX_NAME_CHARS: usize = 30;

const FALLBACK_EXPERIENCE: &str = "Analyzed (Fallback)";
const FALLBACK_SKILLS: [&str; 4] = ["React", "TypeScript", "System Design", "Performance"];

const QUESTIONS: [(&str, &str); FALLBACK_QUESTION_COUNT - 1] = [
    (
        "Technical Choice",
        "I see you've worked with a lot of modern frameworks. If you were starting a complex, high-traffic web application from scratch today, what would be your go-to tech stack, and why?",
    ),
    (
        "Performance",
        "When we're talking about large-scale apps, performance and Core Web Vitals are always top of mind. What's your personal checklist for ensuring a web app stays snappy and performant as it scales?",
    ),
    (
        "System Design",
        "Could you walk me through how you'd design a robust state management system for a dashboard that handles real-time data? I'd love to hear your thoughts on when to use global state versus keeping it local.",
    ),
    (
        "Collaboration",
        "Engineering is a team sport. Tell me about a time you had a significant technical disagreement with a colleague. How did you handle that, and what was the eventual outcome?",
    ),
    (
        "Accessibility",
        "Accessibility is often overlooked but it's crucial. How do you integrate accessibility into your development workflow? What are the key patterns you follow to ensure your UIs are usable for everyone?",
    ),
    (
        "Testing Strategy",
        "What's your philosophy when it comes to testing? How do you strike the right balance between unit, integration, and end-to-end tests for a frontend project?",
    ),
    (
        "Code Quality",
        "In a fast-moving environment, technical debt can pile up quickly. How do you approach code reviews and maintain high standards for code quality while still meeting tight deadlines?",
    ),
    (
        "Future Tech",
        "The frontend world moves so fast. Is there a specific technology or architectural pattern that you've been keeping an eye on recently? Something you think might change the way we build web apps?",
    ),
    (
        "Closing",
        "This has been a really insightful conversation. To wrap up, where do you see yourself growing over the next couple of years, and what kind of impact are you looking to make in your next role?",
    ),
];

/// Guess the candidate's name from the first resume line
///
/// Empty input yields "Candidate"; a first line too long to be a name
/// yields "there" so greetings still read naturally.
#[must_use]
pub fn candidate_name_from_resume(resume_text: &str) -> String {
    let first = resume_text.lines().next().map(str::trim).unwrap_or_default();

    if first.is_empty() {
        "Candidate".to_string()
    } else if first.chars().count() > MAX_NAME_CHARS {
        "there".to_string()
    } else {
        first.to_string()
    }
}

/// Build the fallback analysis for `resume_text`
///
/// The list always opens with the personalised introduction and closes with
/// the wrap-up question; shorter sessions drop questions from the middle.
#[must_use]
pub fn fallback_analysis(resume_text: &str, count: usize) -> ResumeAnalysis {
    let name = candidate_name_from_resume(resume_text);
    let count = count.clamp(1, FALLBACK_QUESTION_COUNT);

    let intro = (
        "Introduction".to_string(),
        format!(
            "Hi {name}, it's great to meet you! I've been looking over your profile and I'm really impressed with your background. To kick things off, why don't you tell me a bit about your journey in frontend engineering and what you're most passionate about building?"
        ),
    );

    let rest = QUESTIONS.iter().map(|(label, text)| ((*label).to_string(), (*text).to_string()));
    let mut selected: Vec<(String, String)> = std::iter::once(intro).chain(rest).collect();

    if count < selected.len() {
        let closing = selected.pop();
        selected.truncate(count.saturating_sub(1));
        if count > 1 {
            selected.extend(closing);
        }
    }

    let questions = selected
        .into_iter()
        .enumerate()
        .map(|(idx, (label, text))| QuestionRecord {
            id: u32::try_from(idx + 1).unwrap_or(u32::MAX),
            label,
            text,
            completed: false,
            is_current: idx == 0,
        })
        .collect();

    ResumeAnalysis {
        candidate_name: name,
        skills: FALLBACK_SKILLS.iter().map(ToString::to_string).collect(),
        experience: FALLBACK_EXPERIENCE.to_string(),
        questions,
    }
}
