//! HTML report assembly.
//!
//! A `Report` is a titled list of `ReportSection`s; each section holds maud
//! markup blocks and embedded Plotly plots. Rendering produces a single
//! self-contained HTML page (plots load plotly.js from the CDN).
use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use chrono::Local;
use maud::{html, Markup, PreEscaped, DOCTYPE};
use plotly::Plot;

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.12.1.min.js";

const REPORT_CSS: &str = "
body { font-family: sans-serif; margin: 2rem auto; max-width: 60rem; color: #222; }
h1 { border-bottom: 2px solid #444; padding-bottom: 0.3rem; }
h2 { margin-top: 2rem; color: #333; }
p.subtitle { font-size: 1.1rem; color: #555; }
p.generated { font-size: 0.8rem; color: #888; }
div.block { margin: 1rem 0; }
img.logo { max-height: 4rem; }
";

/// One titled block of report content.
pub struct ReportSection {
    title: String,
    blocks: Vec<Markup>,
}

impl ReportSection {
    pub fn new(title: &str) -> Self {
        ReportSection {
            title: title.to_string(),
            blocks: Vec::new(),
        }
    }

    /// Append a block of maud markup.
    pub fn add_content(&mut self, content: Markup) {
        self.blocks.push(content);
    }

    /// Append an embedded Plotly plot.
    pub fn add_plot(&mut self, plot: Plot) {
        self.blocks.push(PreEscaped(plot.to_inline_html(None)));
    }

    fn render(&self) -> Markup {
        html! {
            section {
                h2 { (self.title) }
                @for block in &self.blocks {
                    div.block { (block) }
                }
            }
        }
    }
}

/// A full HTML report.
pub struct Report {
    title: String,
    version: String,
    logo: Option<String>,
    subtitle: String,
    sections: Vec<ReportSection>,
}

impl Report {
    pub fn new(title: &str, version: &str, logo: Option<&str>, subtitle: &str) -> Self {
        Report {
            title: title.to_string(),
            version: version.to_string(),
            logo: logo.map(str::to_string),
            subtitle: subtitle.to_string(),
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, section: ReportSection) {
        self.sections.push(section);
    }

    /// Render the report to an HTML string.
    pub fn render(&self) -> String {
        let generated = Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
        let markup = html! {
            (DOCTYPE)
            html {
                head {
                    meta charset="utf-8";
                    title { (self.title) }
                    script src=(PLOTLY_CDN) {}
                    style { (PreEscaped(REPORT_CSS)) }
                }
                body {
                    @if let Some(logo) = &self.logo {
                        img.logo src=(logo) alt="logo";
                    }
                    h1 { (self.title) " " small { "v" (self.version) } }
                    p.subtitle { (self.subtitle) }
                    p.generated { "Generated " (generated) }
                    @for section in &self.sections {
                        (section.render())
                    }
                }
            }
        };
        markup.into_string()
    }

    /// Render and write the report to `path`.
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(&path, self.render())
            .with_context(|| format!("Failed to write report: {}", path.as_ref().display()))
    }
}
