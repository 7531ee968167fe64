// Prompt templates for résumé analysis and cover-letter generation.
// Placeholders: {job_description}, {resume_text}.

pub const ANALYSIS_SYSTEM: &str = "\
You are an expert resume optimization assistant. Compare the candidate's resume with \
the job description and give concrete, actionable improvements.

Cover:
1. Skills gap: skills the job asks for that the resume lacks or underplays.
2. Content suggestions for the summary, experience, skills and achievements sections, \
   each with the current text (or null), a suggested replacement and the reason.
3. ATS keywords from the job description the resume should contain.
4. An overall fit score out of 100 with a one-line explanation.

Return a JSON object with this structure:
{
  \"skills_gap\": [\"skill\"],
  \"suggestions\": [
    {\"section\": \"summary|experience|skills|achievements\", \"current_text\": \"... or null\",
     \"suggested_text\": \"...\", \"reason\": \"...\"}
  ],
  \"ats_keywords\": [\"keyword\"],
  \"overall_score\": \"NN/100 - explanation\"
}";

pub const ANALYSIS_PROMPT_TEMPLATE: &str = "\
JOB DESCRIPTION:
{job_description}

CURRENT RESUME:
{resume_text}

Analyze the resume against the job description and return the JSON described above.";

pub const COVER_LETTER_SYSTEM: &str = "\
You are a professional career consultant who writes tailored cover letters. Write TWO \
cover letters for the candidate, grounded only in facts from the resume.

Short version (about 250 words): opening with the role and the strongest qualification, \
one body paragraph on the most critical requirement with a quantified example, closing \
with a call to action.

Long version (450 to 600 words): opening hook, two or three body paragraphs mapping \
specific achievements to the key requirements, a paragraph on motivation and culture fit, \
closing with a clear call to action.

Both must be specific to the job, professional and ready to send with minimal editing.

Return a JSON object: {\"short_version\": \"...\", \"long_version\": \"...\"}";

pub const COVER_LETTER_PROMPT_TEMPLATE: &str = "\
JOB DESCRIPTION:
{job_description}

CANDIDATE'S RESUME:
{resume_text}

Write both cover letter versions and return them as the JSON object described above.";

/// Fills a template's `{job_description}` and `{resume_text}` placeholders.
pub fn render(template: &str, job_description: &str, resume_text: &str) -> String {
    template
        .replace("{job_description}", job_description)
        .replace("{resume_text}", resume_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_fills_both_placeholders() {
        let prompt = render(ANALYSIS_PROMPT_TEMPLATE, "Rust role", "Jane, 5y Rust");
        assert!(prompt.contains("Rust role"));
        assert!(prompt.contains("Jane, 5y Rust"));
        assert!(!prompt.contains("{job_description}"));
        assert!(!prompt.contains("{resume_text}"));
    }

    #[test]
    fn test_render_does_not_expand_placeholders_in_inputs() {
        // the resume is substituted last, so braces inside it stay literal
        let prompt = render(COVER_LETTER_PROMPT_TEMPLATE, "jd", "uses {job_description} literally");
        assert!(prompt.contains("uses {job_description} literally"));
    }
}
