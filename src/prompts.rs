//! Prompts for the three LLM steps.
//!
//! Every prompt lives here so wording changes touch exactly one file and
//! unit tests can check the contract the parsers in
//! [`crate::pipeline::parse`] rely on (the `SOURCES:` marker, the
//! `- Title | URL` line format, the bare integer / `N/A` rating reply).

/// Marker separating analysis prose from cited sources.
pub const SOURCES_MARKER: &str = "SOURCES:";

/// Prefix of the analysis text when the analysis call failed.
pub const AI_ERROR_PREFIX: &str = "AI Error:";

const CLEANUP_INSTRUCTIONS: &str = "You are a text cleanup assistant. Given OCR-extracted text that may contain spelling errors, \
missing spaces, or formatting issues, correct all spelling mistakes and make the text coherent and readable. \
Preserve the original meaning and structure. Only fix errors - do not add, remove, or rephrase content unnecessarily. \
Output ONLY the corrected text without any preamble or explanation.";

const ANALYSIS_INSTRUCTIONS: &str = r#"You are a fact-check assistant.
Analyze the following text for factual accuracy.
Instructions:
1) Provide a clear, concise analysis explaining whether the claim(s) are accurate, misleading, or false.
2) Focus only on factual accuracy; do NOT mention grammar, spelling, punctuation, or style.
3) Be explicit about your conclusion: clearly state whether the statement is 'accurate', 'mostly accurate', 'partially true', 'misleading', 'mostly false', or 'false'.
4) Keep your analysis brief but informative (2-4 sentences).
5) Write in clear, coherent, and grammatically correct English. Use complete sentences with proper punctuation.
6) Do NOT use asterisks (*) anywhere in your response. No bold, no bullet markers with asterisks, no emphasis with asterisks.
7) After your analysis, output a blank line, then 'SOURCES:' on its own line, followed by 2-4 credible reference sources that support your fact-check. Each source on its own line in this format: '- Source Title | https://example.com/page'
   Only cite real, well-known sources (e.g., Reuters, AP News, BBC, Wikipedia, WHO, CDC, official .gov sites, major newspapers). Do NOT invent URLs."#;

const RATING_INSTRUCTIONS: &str = r#"You are a strict accuracy scoring system. Read the fact-check analysis below and output a single accuracy score from 1 to 10.

CRITICAL RULES (you must follow these exactly):
1. Look for the conclusion keyword in the analysis (e.g. 'false', 'accurate', 'misleading', etc.)
2. If the analysis concludes the statement is FALSE, FABRICATED, DEBUNKED, INCORRECT, or COMPLETELY WRONG, you MUST output 1 or 2. Never output higher than 2 for false statements.
3. If the analysis says MISLEADING, EXAGGERATED, LACKS CONTEXT, MOSTLY FALSE, or MOSTLY INACCURATE, output 3 or 4.
4. If the analysis says PARTIALLY TRUE, MIXED, or has significant caveats, output 5 or 6.
5. If the analysis says MOSTLY ACCURATE or LARGELY TRUE with only minor issues, output 7 or 8.
6. If the analysis says TRUE, ACCURATE, CORRECT, VERIFIED, or CONFIRMED with no caveats, output 9 or 10.
7. If the analysis cannot determine accuracy or says INSUFFICIENT INFO, output N/A.

IMPORTANT: A score of 9-10 should be RARE, only for clearly verified true statements. When in doubt, score LOWER rather than higher.

Output ONLY the integer (1-10) or 'N/A'. Nothing else."#;

/// Prompt asking the model to fix OCR noise without rewording.
pub fn cleanup_prompt(raw_text: &str) -> String {
    format!("{CLEANUP_INSTRUCTIONS}\n\nText to clean:\n{raw_text}")
}

/// Prompt for the fact-check analysis with a trailing SOURCES block.
pub fn analysis_prompt(text: &str) -> String {
    format!("{ANALYSIS_INSTRUCTIONS}\n\nText to evaluate:\n{text}")
}

/// Prompt asking for a 1–10 score (or N/A) of an existing analysis.
pub fn rating_prompt(analysis: &str) -> String {
    format!("{RATING_INSTRUCTIONS}\n\nFact-check analysis:\n{analysis}")
}
