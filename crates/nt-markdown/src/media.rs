//! Internal media reference extraction.
//!
//! Collects image/audio/video references whose targets are relative paths
//! (external `http(s)://` and protocol-relative URLs are ignored). Targets
//! are kept verbatim; the caller resolves them against the referring
//! file's directory.

use std::sync::OnceLock;

use regex::Regex;

/// One media reference found in a Markdown body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaRef {
    /// Alt text or empty.
    pub alt: String,
    /// The raw target as written in the document.
    pub target: String,
    /// Line (1-based) of the reference.
    pub line: usize,
}

fn image_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"!\[([^\]]*)\]\(([^)\s]+)(?:\s+"[^"]*")?\)"#).expect("valid regex"))
}

fn src_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r#"<(?:img|audio|video|source)[^>]*\ssrc\s*=\s*"([^"]+)""#).expect("valid regex")
    })
}

fn is_external(target: &str) -> bool {
    target.starts_with("http://")
        || target.starts_with("https://")
        || target.starts_with("//")
        || target.starts_with("data:")
}

/// Extract internal media references from a Markdown body, in order.
pub fn extract_media_refs(body: &str) -> Vec<MediaRef> {
    let mut refs = Vec::new();
    let mut fence: Option<&str> = None;

    for (line_no, line) in body.lines().enumerate() {
        let trimmed = line.trim_start();
        if let Some(open) = fence {
            if trimmed.starts_with(open) {
                fence = None;
            }
            continue;
        }
        if trimmed.starts_with("```") {
            fence = Some("```");
            continue;
        }
        if trimmed.starts_with("~~~") {
            fence = Some("~~~");
            continue;
        }

        for caps in image_re().captures_iter(line) {
            let target = caps[2].to_string();
            if !is_external(&target) {
                refs.push(MediaRef {
                    alt: caps[1].to_string(),
                    target,
                    line: line_no + 1,
                });
            }
        }
        for caps in src_re().captures_iter(line) {
            let target = caps[1].to_string();
            if !is_external(&target) {
                refs.push(MediaRef {
                    alt: String::new(),
                    target,
                    line: line_no + 1,
                });
            }
        }
    }
    refs
}
