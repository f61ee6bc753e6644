//! Prompts for the resume critique.
//!
//! The model is asked for a single JSON object shaped like
//! [`crate::record::Feedback`]; [`AI_RESPONSE_FORMAT`] spells that shape out
//! in TypeScript-like notation because models follow it more reliably than
//! a JSON schema.

/// System message sent ahead of every critique request.
pub const REVIEWER_SYSTEM_PROMPT: &str = "You are an expert recruiter and Applicant Tracking \
System (ATS) specialist. You read resumes from the page images you are given and answer with \
a single JSON object, never with prose.";

/// Shape of the JSON object the model must return.
pub const AI_RESPONSE_FORMAT: &str = r#"interface Feedback {
  overallScore: number; // max 100
  ATS: {
    score: number; // how well the resume would pass an ATS scan, max 100
    tips: {
      type: "good" | "improve";
      tip: string; // short title
    }[]; // give 3-4 tips
  };
  toneAndStyle: {
    score: number; // max 100
    tips: {
      type: "good" | "improve";
      tip: string; // short title
      explanation: string; // detailed explanation
    }[]; // give 3-4 tips
  };
  content: {
    score: number; // max 100
    tips: { type: "good" | "improve"; tip: string; explanation: string; }[];
  };
  structure: {
    score: number; // max 100
    tips: { type: "good" | "improve"; tip: string; explanation: string; }[];
  };
  skills: {
    score: number; // max 100
    tips: { type: "good" | "improve"; tip: string; explanation: string; }[];
  };
}"#;

/// Build the user instructions for one submission.
///
/// Blank job fields are stated as "not provided" so the model falls back to
/// a general review instead of inventing a role.
pub fn prepare_instructions(job_title: &str, job_description: &str) -> String {
    let title = non_blank(job_title);
    let description = non_blank(job_description);
    format!(
        "Analyze and rate this resume and suggest how to improve it.\n\
Scores may be low if the resume is weak; be thorough and point out every mistake or \
area for improvement, since the goal is to help the candidate improve.\n\
Take the job description into account when it is provided.\n\
The job title is: {title}\n\
The job description is: {description}\n\
Provide the feedback using the following format:\n\
{AI_RESPONSE_FORMAT}\n\
Return the analysis as a JSON object, without any other text and without backticks.\n\
Do not include any other text or comments."
    )
}

fn non_blank(s: &str) -> &str {
    let s = s.trim();
    if s.is_empty() {
        "not provided"
    } else {
        s
    }
}
