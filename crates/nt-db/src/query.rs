//! The query language used by `nt search` and deck definitions.
//!
//! Space-separated terms: `#tag`, `-#tag`, `@key:value`,
//! `@key:"quoted value"`, `kind:note`, `path:"references/"`, and bare
//! words matched against titles and bodies.

use crate::DbError;

/// A parsed query.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Query {
    pub tags: Vec<String>,
    pub excluded_tags: Vec<String>,
    pub attributes: Vec<(String, String)>,
    pub kinds: Vec<String>,
    pub paths: Vec<String>,
    pub keywords: Vec<String>,
}

impl Query {
    pub fn parse(input: &str) -> Result<Query, DbError> {
        let mut query = Query::default();
        let mut chars = input.chars().peekable();

        loop {
            while matches!(chars.peek(), Some(c) if c.is_whitespace()) {
                chars.next();
            }
            let Some(&c) = chars.peek() else { break };

            match c {
                '#' => {
                    chars.next();
                    query.tags.push(read_word(&mut chars)?);
                }
                '-' => {
                    chars.next();
                    match chars.peek() {
                        Some('#') => {
                            chars.next();
                            query.excluded_tags.push(read_word(&mut chars)?);
                        }
                        Some(other) => {
                            return Err(DbError::QuerySyntax(format!(
                                "unexpected token '-{other}'"
                            )));
                        }
                        None => {
                            return Err(DbError::QuerySyntax("unexpected EOF".to_string()));
                        }
                    }
                }
                '@' => {
                    chars.next();
                    let key = read_until(&mut chars, ':')?;
                    expect(&mut chars, ':')?;
                    let value = read_value(&mut chars)?;
                    query.attributes.push((key, value));
                }
                '"' => {
                    query.keywords.push(read_quoted(&mut chars)?);
                }
                _ => {
                    let word = read_word(&mut chars)?;
                    if let Some(':') = chars.peek().copied() {
                        chars.next();
                        let value = read_value(&mut chars)?;
                        match word.as_str() {
                            "kind" => query.kinds.push(value),
                            "path" => query.paths.push(value),
                            other => {
                                return Err(DbError::QuerySyntax(format!(
                                    "unknown qualifier '{other}:'"
                                )));
                            }
                        }
                    } else {
                        query.keywords.push(word);
                    }
                }
            }
        }

        Ok(query)
    }

    pub fn is_empty(&self) -> bool {
        self == &Query::default()
    }
}

fn read_word(chars: &mut std::iter::Peekable<std::str::Chars>) -> Result<String, DbError> {
    let mut word = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == ':' {
            break;
        }
        word.push(c);
        chars.next();
    }
    if word.is_empty() {
        return Err(DbError::QuerySyntax("unexpected EOF".to_string()));
    }
    Ok(word)
}

fn read_until(
    chars: &mut std::iter::Peekable<std::str::Chars>,
    stop: char,
) -> Result<String, DbError> {
    let mut out = String::new();
    while let Some(&c) = chars.peek() {
        if c == stop || c.is_whitespace() {
            break;
        }
        out.push(c);
        chars.next();
    }
    if out.is_empty() {
        return Err(DbError::QuerySyntax("unexpected EOF".to_string()));
    }
    Ok(out)
}

fn expect(chars: &mut std::iter::Peekable<std::str::Chars>, wanted: char) -> Result<(), DbError> {
    match chars.next() {
        Some(c) if c == wanted => Ok(()),
        Some(c) => Err(DbError::QuerySyntax(format!(
            "expected '{wanted}', got '{c}'"
        ))),
        None => Err(DbError::QuerySyntax("unexpected EOF".to_string())),
    }
}

fn read_value(chars: &mut std::iter::Peekable<std::str::Chars>) -> Result<String, DbError> {
    match chars.peek() {
        Some('"') => read_quoted(chars),
        Some(_) => read_word(chars),
        None => Err(DbError::QuerySyntax("unexpected EOF".to_string())),
    }
}

fn read_quoted(chars: &mut std::iter::Peekable<std::str::Chars>) -> Result<String, DbError> {
    expect(chars, '"')?;
    let mut out = String::new();
    for c in chars.by_ref() {
        if c == '"' {
            return Ok(out);
        }
        out.push(c);
    }
    Err(DbError::QuerySyntax("unexpected EOF".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_all_term_kinds() {
        let q = Query::parse(
            r#"#go -#draft @author:"Rob Pike" @year:2009 kind:flashcard path:"references/" braces"#,
        )
        .unwrap();
        assert_eq!(q.tags, vec!["go"]);
        assert_eq!(q.excluded_tags, vec!["draft"]);
        assert_eq!(
            q.attributes,
            vec![
                ("author".to_string(), "Rob Pike".to_string()),
                ("year".to_string(), "2009".to_string()),
            ]
        );
        assert_eq!(q.kinds, vec!["flashcard"]);
        assert_eq!(q.paths, vec!["references/"]);
        assert_eq!(q.keywords, vec!["braces"]);
    }

    #[test]
    fn empty_query() {
        assert!(Query::parse("").unwrap().is_empty());
        assert!(Query::parse("   ").unwrap().is_empty());
    }

    #[test]
    fn truncated_terms_report_eof() {
        for input in ["#", "-#", "@key:", "@", "\"unterminated", "-"] {
            let err = Query::parse(input).unwrap_err();
            assert!(
                matches!(&err, DbError::QuerySyntax(msg) if msg.contains("unexpected EOF")),
                "input {input:?} gave {err}"
            );
        }
    }

    #[test]
    fn bare_dash_prefix_is_rejected() {
        let err = Query::parse("-word").unwrap_err();
        assert!(matches!(&err, DbError::QuerySyntax(msg) if msg.contains("unexpected token")));
    }

    #[test]
    fn unknown_qualifier_is_rejected() {
        assert!(Query::parse("size:3").is_err());
    }

    #[test]
    fn quoted_keyword() {
        let q = Query::parse(r#""exact phrase""#).unwrap();
        assert_eq!(q.keywords, vec!["exact phrase"]);
    }
}
