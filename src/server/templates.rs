//! Askama template structs for the web interface.
//!
//! Each struct corresponds to an HTML file in the `templates/` directory.
//! Fields are flattened to plain strings and flags so the templates never
//! need pattern matching.

use askama::Template;

use crate::output::{FactCheckReport, Source};

/// Shown in the rating slot and in `/reanalyze` replies when unrated.
pub const FALLBACK_BAR_COLOR: &str = "var(--accent)";

/// Upload form.
#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub max_upload_mb: usize,
}

/// A source line on the result page.
pub struct SourceRow {
    pub name: String,
    pub has_link: bool,
    pub href: String,
}

impl From<&Source> for SourceRow {
    fn from(source: &Source) -> Self {
        let href = source.href().unwrap_or_default().to_string();
        Self {
            name: source.name.clone(),
            has_link: !href.is_empty(),
            href,
        }
    }
}

/// Result page for one uploaded screenshot.
#[derive(Template)]
#[template(path = "result.html")]
pub struct ResultTemplate<'a> {
    pub filename: &'a str,
    pub data_uri: String,
    pub extracted_text: &'a str,
    pub analysis: &'a str,
    pub has_rating: bool,
    pub rating: u8,
    pub rating_percent: u8,
    pub bar_color: &'a str,
    pub sources: Vec<SourceRow>,
    pub warnings: Vec<String>,
}

impl<'a> ResultTemplate<'a> {
    pub fn from_report(report: &'a FactCheckReport) -> Self {
        let fc = &report.fact_check;
        Self {
            filename: &report.filename,
            data_uri: report.data_uri(),
            extracted_text: &report.extracted_text,
            analysis: &fc.analysis,
            has_rating: fc.rating.is_some(),
            rating: fc.rating.unwrap_or(0),
            rating_percent: fc.rating_percent,
            bar_color: fc.bar_color.as_deref().unwrap_or(FALLBACK_BAR_COLOR),
            sources: fc.sources.iter().map(SourceRow::from).collect(),
            warnings: report.warnings.iter().map(ToString::to_string).collect(),
        }
    }
}
