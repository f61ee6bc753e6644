//! Markdown rendering of a hydrated review.
//!
//! The layout follows the detail view: a summary of scores, the ATS block
//! with its tips, then one section per narrative category.

use crate::record::{Feedback, ResumeRecord, Section, Tip, TipKind};
use crate::viewer::{ResumeView, ViewState};
use std::fmt::Write;

/// Render the whole view as Markdown.
pub fn render_view(view: &ResumeView) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# Resume Review\n");

    let Some(record) = view.record.as_ref() else {
        let _ = writeln!(out, "_No review stored under `{}` yet._", view.id);
        return out;
    };
    render_header(&mut out, record);

    if let Some(ref resume) = view.resume {
        let _ = writeln!(out, "- Resume: `{}` ({} bytes)", resume.path, resume.len());
    }
    if let Some(ref preview) = view.preview {
        let _ = writeln!(out, "- Preview: `{}` ({} bytes)", preview.path, preview.len());
    }
    for issue in &view.issues {
        let _ = writeln!(out, "- ⚠ {issue}");
    }
    out.push('\n');

    match (view.state(), view.feedback()) {
        (ViewState::Ready, Some(feedback)) => render_feedback(&mut out, feedback),
        _ => {
            let _ = writeln!(out, "_Analysis still in progress._");
        }
    }
    out
}

fn render_header(out: &mut String, record: &ResumeRecord) {
    if !record.company_name.is_empty() {
        let _ = writeln!(out, "**Company:** {}  ", record.company_name);
    }
    if !record.job_title.is_empty() {
        let _ = writeln!(out, "**Role:** {}  ", record.job_title);
    }
    let _ = writeln!(out, "**Id:** `{}`\n", record.id);
}

/// Render the critique alone.
pub fn render_feedback(out: &mut String, feedback: &Feedback) {
    let _ = writeln!(out, "## Summary\n");
    if let Some(score) = feedback.overall_score() {
        let _ = writeln!(out, "Overall score: **{}/100**\n", fmt_score(score));
    }
    let _ = writeln!(out, "| Category | Score |");
    let _ = writeln!(out, "|----------|-------|");
    let ats = feedback.ats();
    let sections = feedback.sections();
    let _ = writeln!(out, "| ATS | {} |", fmt_score(ats.score));
    for (name, section) in &sections {
        let _ = writeln!(out, "| {} | {} |", name, fmt_score(section.score));
    }
    out.push('\n');

    let _ = writeln!(out, "## ATS Score: {}/100\n", fmt_score(ats.score));
    render_tips(out, &ats);

    for (name, section) in &sections {
        let _ = writeln!(out, "## {}: {}/100\n", name, fmt_score(section.score));
        render_tips(out, section);
    }
}

fn render_tips(out: &mut String, section: &Section) {
    if section.tips.is_empty() {
        let _ = writeln!(out, "_No tips._\n");
        return;
    }
    for tip in &section.tips {
        let _ = writeln!(out, "- {} {}", marker(tip), tip.text());
        if let Some(explanation) = tip.explanation() {
            let _ = writeln!(out, "  {explanation}");
        }
    }
    out.push('\n');
}

fn marker(tip: &Tip) -> &'static str {
    match tip.kind() {
        Some(TipKind::Good) => "✓",
        Some(TipKind::Improve) => "✗",
        None => "•",
    }
}

fn fmt_score(score: f64) -> String {
    if score.fract() == 0.0 {
        format!("{}", score as i64)
    } else {
        format!("{score:.1}")
    }
}
