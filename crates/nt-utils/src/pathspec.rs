//! Gitignore-style pathspec matching for working-tree filtering.
//!
//! A `PathSpec` is a glob, optionally prefixed with `!` for negation:
//! `**` crosses directory boundaries, `*` and `?` stop at `/`, a leading
//! `/` anchors the pattern to the repository root, and a trailing `/`
//! matches a directory and everything below it. The sentinel `.` matches
//! every path.

use std::fmt;

use crate::path::RepoPath;
use crate::{Result, UtilError};

/// A single compiled pathspec pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSpec {
    /// The raw input string.
    raw: String,
    /// `!`-prefixed pattern: matching paths are excluded.
    negated: bool,
    /// The `.` sentinel, matching everything.
    dot: bool,
    /// Trailing `/`: match the directory subtree.
    dir_only: bool,
    /// Leading `/` or an internal `/`: match from the repository root.
    anchored: bool,
    /// `/`-separated pattern segments (`**` kept as its own segment).
    segments: Vec<String>,
}

impl PathSpec {
    /// Parse a single pathspec. Invalid globs are fatal at load time.
    pub fn parse(input: &str) -> Result<Self> {
        let raw = input.to_string();
        let (negated, body) = match input.strip_prefix('!') {
            Some(rest) => (true, rest),
            None => (false, input),
        };

        if body.is_empty() {
            return Err(UtilError::InvalidPathSpec {
                spec: raw,
                reason: "empty pattern".to_string(),
            });
        }

        if body == "." {
            return Ok(PathSpec {
                raw,
                negated,
                dot: true,
                dir_only: false,
                anchored: false,
                segments: Vec::new(),
            });
        }

        let body = body.replace('\\', "/");
        let (anchored_prefix, body) = match body.strip_prefix('/') {
            Some(rest) => (true, rest.to_string()),
            None => (false, body),
        };
        let (dir_only, body) = match body.strip_suffix('/') {
            Some(rest) => (true, rest.to_string()),
            None => (false, body),
        };

        let segments: Vec<String> = body.split('/').map(str::to_string).collect();
        for seg in &segments {
            if seg.is_empty() {
                return Err(UtilError::InvalidPathSpec {
                    spec: raw,
                    reason: "empty path segment".to_string(),
                });
            }
            if seg.contains("***") {
                return Err(UtilError::InvalidPathSpec {
                    spec: raw,
                    reason: "more than two consecutive stars".to_string(),
                });
            }
        }

        // A pattern with an internal slash is anchored even without the
        // leading `/`; a bare name matches at any depth.
        let anchored = anchored_prefix || segments.len() > 1;

        Ok(PathSpec {
            raw,
            negated,
            dot: false,
            dir_only,
            anchored,
            segments,
        })
    }

    pub fn is_negated(&self) -> bool {
        self.negated
    }

    pub fn is_dot(&self) -> bool {
        self.dot
    }

    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Check whether the pattern (ignoring negation) matches a path.
    pub fn matches(&self, path: &RepoPath) -> bool {
        if self.dot {
            return true;
        }
        let path_segs: Vec<&str> = path.segments().collect();
        if self.anchored {
            self.match_from(&self.segments, &path_segs)
        } else {
            // Unanchored: the pattern may start at any depth.
            (0..=path_segs.len())
                .any(|start| self.match_from(&self.segments, &path_segs[start..]))
        }
    }

    fn match_from(&self, pattern: &[String], path: &[&str]) -> bool {
        match pattern.first() {
            None => {
                if path.is_empty() {
                    return true;
                }
                // Remaining path below a matched directory prefix counts for
                // dir-only patterns and for wildcard-free prefixes
                // (`nt add projects` matches projects/todo.md).
                self.dir_only || !self.has_wildcards()
            }
            Some(seg) if seg == "**" => (0..=path.len())
                .any(|skip| self.match_from(&pattern[1..], &path[skip..])),
            Some(seg) => match path.first() {
                None => false,
                Some(head) => {
                    segment_matches(seg, head) && self.match_from(&pattern[1..], &path[1..])
                }
            },
        }
    }

    fn has_wildcards(&self) -> bool {
        self.segments
            .iter()
            .any(|s| s.contains('*') || s.contains('?') || s.contains('['))
    }
}

impl fmt::Display for PathSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

/// Match a single pattern segment against a single path segment.
/// `*` and `?` never cross `/` (segments are already split); `**` inside a
/// segment degrades to `*`.
fn segment_matches(pattern: &str, text: &str) -> bool {
    let pat: Vec<char> = pattern.chars().collect();
    let txt: Vec<char> = text.chars().collect();
    seg_match(&pat, &txt)
}

fn seg_match(pat: &[char], txt: &[char]) -> bool {
    match pat.first() {
        None => txt.is_empty(),
        Some('*') => {
            let rest = if pat.get(1) == Some(&'*') { &pat[2..] } else { &pat[1..] };
            (0..=txt.len()).any(|skip| seg_match(rest, &txt[skip..]))
        }
        Some('?') => !txt.is_empty() && seg_match(&pat[1..], &txt[1..]),
        Some(&c) => txt.first() == Some(&c) && seg_match(&pat[1..], &txt[1..]),
    }
}

/// An ordered list of pathspecs.
///
/// A path matches the list iff at least one positive spec matches and no
/// negation spec matches.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct PathSpecs {
    specs: Vec<PathSpec>,
}

impl PathSpecs {
    pub fn parse(inputs: &[&str]) -> Result<Self> {
        let mut specs = Vec::with_capacity(inputs.len());
        for input in inputs {
            specs.push(PathSpec::parse(input)?);
        }
        Ok(PathSpecs { specs })
    }

    pub fn parse_owned(inputs: &[String]) -> Result<Self> {
        let refs: Vec<&str> = inputs.iter().map(String::as_str).collect();
        Self::parse(&refs)
    }

    /// The `AnyPath` sentinel: `["."]`.
    pub fn any() -> Self {
        PathSpecs {
            specs: vec![PathSpec::parse(".").expect(". always parses")],
        }
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PathSpec> {
        self.specs.iter()
    }

    /// True when a `.` spec is present and no negation is: the list is
    /// guaranteed to match every path.
    pub fn match_all(&self) -> bool {
        self.specs.iter().any(PathSpec::is_dot) && !self.specs.iter().any(PathSpec::is_negated)
    }

    pub fn matches(&self, path: &RepoPath) -> bool {
        let mut included = false;
        for spec in &self.specs {
            if spec.is_negated() {
                if spec.matches(path) {
                    return false;
                }
            } else if !included && spec.matches(path) {
                included = true;
            }
        }
        included
    }
}
