//! Readers for the bodies of the special blocks extracted by the first pass
//!
//! Each block accepts a small fixed vocabulary, one directive per line.
//! Anything else is reported as a compile error at the offending line.

use super::handler::{PluginRepository, RepositoryKind};
use super::outline::Body;
use crate::{
    error::{Error, Result},
    types::Location,
};
use regex::Regex;
use std::sync::LazyLock;

static PLUGIN_DECLARATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^id\s*\(?\s*["']([^"']*)["']\s*\)?(?:\s*\.?\s*version\s*\(?\s*["']([^"']*)["']\s*\)?)?$"#,
    )
    .expect("valid plugin declaration regex")
});

static CLASSPATH_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(repository|classpath)\s*\(?\s*["']([^"']*)["']\s*\)?$"#)
        .expect("valid classpath directive regex")
});

static REPOSITORY_DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"^(maven|ivy)\s*\(?\s*["']([^"']*)["']\s*\)?$"#)
        .expect("valid repository directive regex")
});

/// `id("x")` with an optional `version("1.0")`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginDeclaration {
    pub id: String,
    pub version: Option<String>,
    pub location: Location,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClasspathDirective {
    Repository(String),
    Classpath(String),
}

pub fn plugin_declarations(script: &str, body: &Body) -> Result<Vec<PluginDeclaration>> {
    lines(body)
        .into_iter()
        .map(|(location, line)| {
            let captures = PLUGIN_DECLARATION.captures(&line).ok_or_else(|| {
                Error::compile(
                    script,
                    Some(location),
                    "only id(String) plugin declarations, optionally followed by version(String), are allowed in plugins {} blocks",
                )
            })?;
            Ok(PluginDeclaration {
                id: captures[1].to_string(),
                version: captures.get(2).map(|m| m.as_str().to_string()),
                location,
            })
        })
        .collect()
}

pub fn classpath_directives(
    script: &str,
    block_name: &str,
    body: &Body,
) -> Result<Vec<ClasspathDirective>> {
    lines(body)
        .into_iter()
        .map(|(location, line)| {
            let captures = CLASSPATH_DIRECTIVE.captures(&line).ok_or_else(|| {
                Error::compile(
                    script,
                    Some(location),
                    format!(
                        "only repository(String) and classpath(String) are allowed in {block_name} {{}} blocks"
                    ),
                )
            })?;
            let value = captures[2].to_string();
            Ok(match &captures[1] {
                "repository" => ClasspathDirective::Repository(value),
                _ => ClasspathDirective::Classpath(value),
            })
        })
        .collect()
}

pub fn plugin_repositories(script: &str, body: &Body) -> Result<Vec<PluginRepository>> {
    lines(body)
        .into_iter()
        .map(|(location, line)| {
            let captures = REPOSITORY_DIRECTIVE.captures(&line).ok_or_else(|| {
                Error::compile(
                    script,
                    Some(location),
                    "only maven(String) and ivy(String) are allowed in pluginRepositories {} blocks",
                )
            })?;
            let kind = match &captures[1] {
                "maven" => RepositoryKind::Maven,
                _ => RepositoryKind::Ivy,
            };
            Ok(PluginRepository {
                kind,
                url: captures[2].to_string(),
            })
        })
        .collect()
}

/// Non-empty lines of a block body with their positions, comments removed
fn lines(body: &Body) -> Vec<(Location, String)> {
    let text = blank_comments(&body.text);
    text.split('\n')
        .enumerate()
        .filter_map(|(index, raw)| {
            let indent = raw.chars().take_while(|c| c.is_whitespace()).count() as u32;
            let line = raw.trim();
            if line.is_empty() {
                return None;
            }
            let location = if index == 0 {
                Location::new(body.location.line, body.location.column + indent)
            } else {
                Location::new(body.location.line + index as u32, indent + 1)
            };
            Some((location, line.to_string()))
        })
        .collect()
}

/// Replace `//` and `/* */` comments outside of string literals with spaces.
/// Newlines are kept so that line and column positions stay valid.
fn blank_comments(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    let mut quote: Option<char> = None;
    let mut escaped = false;

    while let Some(c) = chars.next() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            out.push(c);
            continue;
        }

        match (c, chars.peek()) {
            ('"' | '\'', _) => {
                quote = Some(c);
                out.push(c);
            }
            ('/', Some('/')) => {
                while chars.next_if(|next| *next != '\n').is_some() {
                    out.push(' ');
                }
                out.push(' ');
            }
            ('/', Some('*')) => {
                chars.next();
                out.push_str("  ");
                let mut previous = '\0';
                for next in chars.by_ref() {
                    out.push(if next == '\n' { '\n' } else { ' ' });
                    if previous == '*' && next == '/' {
                        break;
                    }
                    previous = next;
                }
            }
            _ => out.push(c),
        }
    }
    out
}
