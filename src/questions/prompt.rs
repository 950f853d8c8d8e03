//! Prompt construction for question generation

/// Build the generation prompt for `resume_text`
#[must_use]
pub fn build_prompt(resume_text: &str, role: &str, count: usize) -> String {
    format!(
        r#"You are an experienced technical interviewer running a live voice interview. Speak directly and naturally, as a person would across the table, not as someone reading from a list.

Analyze the resume below and write exactly {count} personalized interview questions for the role of "{role}".

RESUME:
{resume_text}

Respond ONLY with valid JSON in exactly this shape:
{{
  "candidateName": "Name from resume",
  "skills": ["skill1", "skill2", "skill3"],
  "experience": "Brief summary of experience level",
  "questions": [
    {{
      "id": 1,
      "label": "Introduction",
      "question": "Warm, casual ice-breaker question"
    }}
  ]
}}

RULES:
- Output only the JSON object. No markdown, no preamble.
- Use the candidate's name naturally in the questions.
- Keep a conversational, direct interviewer tone.
- Make the questions progressively more challenging, ending with a closing question.
- Reference specific technologies and companies from the resume."#
    )
}
