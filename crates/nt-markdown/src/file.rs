//! Markdown parsing: front matter split and ATX heading scan.

use std::path::Path;

use crate::{MarkdownError, Result};

/// A parsed Markdown file.
///
/// `content` is the exact bytes read from disk; `body` is the content with
/// the front matter block removed. Headings are line-level ATX headings
/// (`#`..`######`); anything inside a fenced code block is body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkdownFile {
    /// Raw file content, preserved for diffing.
    pub content: String,
    /// Raw YAML between the `---` fences, without the fences.
    pub front_matter: String,
    /// Content after the front matter block.
    pub body: String,
    /// Text before the first heading.
    pub preamble: String,
    /// Headings in document order.
    pub headings: Vec<Heading>,
}

/// One ATX heading and the raw text that follows it, up to the next
/// heading of any level.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// Number of `#` characters (1–6).
    pub level: usize,
    /// Heading text, trimmed.
    pub title: String,
    /// Raw lines between this heading and the next one.
    pub content: String,
    /// 1-based line of the heading within the body.
    pub line: usize,
}

impl MarkdownFile {
    /// Read and parse a Markdown file from disk.
    pub fn read(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| MarkdownError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content)
    }

    /// Parse Markdown content.
    pub fn parse(content: &str) -> Result<Self> {
        let (front_matter, body) = split_front_matter(content)?;
        let (preamble, headings) = scan_headings(&body);
        Ok(MarkdownFile {
            content: content.to_string(),
            front_matter,
            body,
            preamble,
            headings,
        })
    }

    /// Parsed front matter as a YAML mapping. Empty front matter yields an
    /// empty mapping; non-mapping front matter is an error.
    pub fn front_matter_mapping(&self) -> Result<serde_yaml::Mapping> {
        if self.front_matter.trim().is_empty() {
            return Ok(serde_yaml::Mapping::new());
        }
        let value: serde_yaml::Value = serde_yaml::from_str(&self.front_matter)
            .map_err(|e| MarkdownError::FrontMatter(e.to_string()))?;
        match value {
            serde_yaml::Value::Mapping(mapping) => Ok(mapping),
            serde_yaml::Value::Null => Ok(serde_yaml::Mapping::new()),
            other => Err(MarkdownError::FrontMatter(format!(
                "expected a mapping, got {}",
                yaml_kind(&other)
            ))),
        }
    }

    /// The heading content span of `headings[i]` including its sub-headings:
    /// everything until the next heading of level ≤ the heading's own.
    pub fn section_text(&self, i: usize) -> String {
        let level = self.headings[i].level;
        let mut out = self.headings[i].content.clone();
        for h in &self.headings[i + 1..] {
            if h.level <= level {
                break;
            }
            out.push_str(&format!("{} {}\n", "#".repeat(h.level), h.title));
            out.push_str(&h.content);
        }
        out
    }

    /// Indices of the headings nested directly or transitively under `i`.
    pub fn subheadings(&self, i: usize) -> Vec<usize> {
        let level = self.headings[i].level;
        let mut out = Vec::new();
        for (j, h) in self.headings.iter().enumerate().skip(i + 1) {
            if h.level <= level {
                break;
            }
            out.push(j);
        }
        out
    }
}

fn yaml_kind(value: &serde_yaml::Value) -> &'static str {
    match value {
        serde_yaml::Value::Null => "null",
        serde_yaml::Value::Bool(_) => "a boolean",
        serde_yaml::Value::Number(_) => "a number",
        serde_yaml::Value::String(_) => "a string",
        serde_yaml::Value::Sequence(_) => "a sequence",
        serde_yaml::Value::Mapping(_) => "a mapping",
        serde_yaml::Value::Tagged(_) => "a tagged value",
    }
}

/// Split a leading `---` front matter block from the body.
fn split_front_matter(content: &str) -> Result<(String, String)> {
    let mut lines = content.lines();
    match lines.next() {
        Some(first) if first.trim_end() == "---" => {}
        _ => return Ok((String::new(), content.to_string())),
    }

    let mut front = String::new();
    while let Some(line) = lines.next() {
        if line.trim_end() == "---" {
            let body: String = lines.map(|l| format!("{l}\n")).collect();
            return Ok((front, body));
        }
        front.push_str(line);
        front.push('\n');
    }
    Err(MarkdownError::UnterminatedFrontMatter)
}

/// Scan ATX headings, ignoring anything inside ``` / ~~~ fences.
fn scan_headings(body: &str) -> (String, Vec<Heading>) {
    let mut preamble = String::new();
    let mut headings: Vec<Heading> = Vec::new();
    let mut fence: Option<&str> = None;

    for (line_no, line) in body.lines().enumerate() {
        let trimmed = line.trim_start();
        if let Some(open) = fence {
            if trimmed.starts_with(open) {
                fence = None;
            }
            append_line(&mut preamble, &mut headings, line);
            continue;
        }
        if trimmed.starts_with("```") {
            fence = Some("```");
            append_line(&mut preamble, &mut headings, line);
            continue;
        }
        if trimmed.starts_with("~~~") {
            fence = Some("~~~");
            append_line(&mut preamble, &mut headings, line);
            continue;
        }

        if let Some((level, title)) = parse_atx(line) {
            headings.push(Heading {
                level,
                title,
                content: String::new(),
                line: line_no + 1,
            });
        } else {
            append_line(&mut preamble, &mut headings, line);
        }
    }

    (preamble, headings)
}

fn append_line(preamble: &mut String, headings: &mut [Heading], line: &str) {
    match headings.last_mut() {
        Some(last) => {
            last.content.push_str(line);
            last.content.push('\n');
        }
        None => {
            preamble.push_str(line);
            preamble.push('\n');
        }
    }
}

/// Parse an ATX heading line: 1–6 `#` followed by a space.
fn parse_atx(line: &str) -> Option<(usize, String)> {
    let hashes = line.len() - line.trim_start_matches('#').len();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = &line[hashes..];
    if !rest.starts_with(' ') {
        return None;
    }
    let title = rest.trim().trim_end_matches(" #").trim();
    Some((hashes, title.to_string()))
}
