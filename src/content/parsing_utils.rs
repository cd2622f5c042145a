use std::str::{self, Lines};

use lazy_static::lazy_static;
use regex::Regex;
use serde::Deserialize;
use serde_yaml::Value;

use crate::content::{MetadataError, MetadataParser, PostMetadata};

/// Default metadata parser. Understands the three header layouts posts are
/// written in:
///
/// ```text
/// #rust #blog                  <!--                         <!--
///                              [TAGS]: # (rust blog)        title: Some title
/// # Some title                 [AUTHOR]: # (devin)          tags: ['#rust', blog]
///                              -->                          -->
///                              # Some title
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct HeaderParser;

#[derive(Debug, Default, PartialEq)]
struct CommentHeader {
    title: Option<String>,
    tags: Vec<String>,
    author: Option<String>,
}

#[derive(Deserialize, Default)]
struct FrontMatter {
    title: Option<String>,
    tags: Option<Value>,
    author: Option<String>,
}

impl MetadataParser for HeaderParser {
    fn parse_metadata(&self, raw: &[u8]) -> Result<PostMetadata, MetadataError> {
        let content = str::from_utf8(raw).map_err(|_| MetadataError::InvalidEncoding)?;
        let mut lines = content.lines();
        let mut maybe_line = lines.next();

        // Empty lines are ok
        while let Some(line) = maybe_line {
            if !line.trim().is_empty() {
                break;
            }
            maybe_line = lines.next();
        }

        let Some(first_line) = maybe_line else {
            return Err(MetadataError::MissingTitle);
        };

        if first_line.trim() == "<!--" {
            let (header, lines) = parse_comment_header(lines)?;
            let title = match header.title {
                Some(title) if !title.trim().is_empty() => title.trim().to_string(),
                _ => parse_title(lines)?,
            };
            return Ok(PostMetadata {
                title,
                tags: header.tags,
                author: header.author.filter(|a| !a.trim().is_empty()),
            });
        }

        // A markdown heading on the first line means the post has no tag line
        if let Some(title) = heading_text(first_line).filter(|_| first_line.starts_with("# ")) {
            return Ok(PostMetadata {
                title: title.to_string(),
                tags: vec![],
                author: None,
            });
        }

        let tags = extract_tag_line(first_line);
        let title = parse_title(lines)?;
        Ok(PostMetadata {
            title,
            tags,
            author: None,
        })
    }
}

fn parse_comment_header(mut lines: Lines) -> Result<(CommentHeader, Lines), MetadataError> {
    let mut block: Vec<&str> = vec![];
    loop {
        match lines.next() {
            Some(line) if line.trim() == "-->" => break,
            Some(line) => block.push(line),
            None => return Err(MetadataError::UnterminatedHeader),
        }
    }

    let keyed: Option<Vec<(&str, &str)>> = block.iter()
        .filter(|line| !line.trim().is_empty())
        .map(|line| extract_texted_header(*line))
        .collect();

    let header = match keyed {
        Some(pairs) if !pairs.is_empty() => keyed_header(pairs),
        _ => yaml_header(&block.join("\n"))?,
    };

    Ok((header, lines))
}

fn keyed_header(pairs: Vec<(&str, &str)>) -> CommentHeader {
    let mut header = CommentHeader::default();
    for (key, val) in pairs {
        match key {
            "TITLE" => header.title = Some(val.trim().to_string()),
            "TAGS" => header.tags = extract_tags(val),
            "AUTHOR" => header.author = Some(val.trim().to_string()),
            _ => {}
        }
    }
    header
}

fn yaml_header(yaml: &str) -> Result<CommentHeader, MetadataError> {
    if yaml.trim().is_empty() {
        return Ok(CommentHeader::default());
    }

    let front_matter: FrontMatter = serde_yaml::from_str(yaml)
        .map_err(|e| MetadataError::InvalidFrontMatter(e.to_string()))?;

    let tags = match front_matter.tags {
        None | Some(Value::Null) => vec![],
        Some(Value::String(line)) => extract_tags(&line),
        Some(Value::Sequence(items)) => {
            let mut tags = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(tag) => tags.push(tag),
                    other => return Err(MetadataError::InvalidTags(format!("expected a string, found {:?}", other))),
                }
            }
            tags
        }
        Some(other) => return Err(MetadataError::InvalidTags(format!("expected a list or a string, found {:?}", other))),
    };

    Ok(CommentHeader {
        title: front_matter.title,
        tags,
        author: front_matter.author,
    })
}

/// The title is the first non-empty markdown heading
fn parse_title(lines: Lines) -> Result<String, MetadataError> {
    lines.filter_map(heading_text)
        .next()
        .map(|title| title.to_string())
        .ok_or(MetadataError::MissingTitle)
}

fn heading_text(line: &str) -> Option<&str> {
    if !line.starts_with('#') {
        return None;
    }
    let text = line.trim_start_matches('#').trim();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}

fn extract_tag_line(line: &str) -> Vec<String> {
    line.split_whitespace()
        .filter(|token| token.contains('#'))
        .map(|token| token.to_string())
        .collect()
}

fn extract_tags(tags_str: &str) -> Vec<String> {
    tags_str.split(' ')
        .filter(|x| !x.is_empty())
        .map(|s| s.to_string())
        .collect()
}

fn extract_texted_header(line: &str) -> Option<(&str, &str)> {
    lazy_static! {
        static ref HEADER_REGEX: Regex = Regex::new(r"^\s*\[(?P<key>\w+)\]: # \((?P<value>.*)\)\s*$").unwrap();
    }

    HEADER_REGEX.captures(line).and_then(|cap| {
        let key = cap.name("key").map(|key| key.as_str());
        let val = cap.name("value").map(|val| val.as_str());
        match (key, val) {
            (Some(key), Some(val)) => Some((key, val)),
            _ => None
        }
    })
}
