//! Sphinx convention: `:param x:` / `:type x:` / `:returns:` / `:rtype:` fields

use super::clean::indent_of;
use super::{DocParam, DocReturns, Headers, ParsedDocstring, Section};
use crate::syntax::collapse_whitespace;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashMap;

static PARAM_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:param\s+(?:([^:]+?)\s+)?(\*{0,2}\w+)\s*:\s*(.*)$").unwrap());
static TYPE_FIELD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^:type\s+(\*{0,2}\w+)\s*:\s*(.*)$").unwrap());
static RETURNS_FIELD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^:returns?\s*:\s*(.*)$").unwrap());
static RTYPE_FIELD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^:rtype\s*:\s*(.*)$").unwrap());
static ANY_FIELD: Lazy<Regex> = Lazy::new(|| Regex::new(r"^:[^:\s][^:]*:").unwrap());

/// Field whose text the next continuation line extends
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Target {
    None,
    Param(usize),
    Returns,
    Ignored,
}

pub(super) fn parse(cleaned: &str, headers: Headers) -> ParsedDocstring {
    let mut parsed = ParsedDocstring::default();
    let mut description: Vec<&str> = Vec::new();
    let mut params: Vec<DocParam> = Vec::new();
    let mut types: HashMap<String, String> = HashMap::new();
    let mut returns_text: Vec<String> = Vec::new();
    let mut rtype: Option<String> = None;
    let mut example: Vec<&str> = Vec::new();
    let mut in_examples = false;
    let mut seen_field = false;
    let mut target = Target::None;

    for line in cleaned.lines() {
        let trimmed = line.trim();

        if ANY_FIELD.is_match(trimmed) {
            seen_field = true;
            if in_examples {
                in_examples = false;
                parsed.push_example(&std::mem::take(&mut example));
            }
            target = if let Some(caps) = PARAM_FIELD.captures(trimmed) {
                params.push(DocParam {
                    name: caps[2].trim_start_matches('*').to_string(),
                    type_hint: caps.get(1).map(|m| m.as_str().trim().to_string()),
                    description: caps[3].to_string(),
                });
                Target::Param(params.len() - 1)
            } else if let Some(caps) = TYPE_FIELD.captures(trimmed) {
                types.insert(
                    caps[1].trim_start_matches('*').to_string(),
                    caps[2].trim().to_string(),
                );
                Target::Ignored
            } else if let Some(caps) = RETURNS_FIELD.captures(trimmed) {
                returns_text.push(caps[1].to_string());
                Target::Returns
            } else if let Some(caps) = RTYPE_FIELD.captures(trimmed) {
                rtype = Some(caps[1].trim().to_string()).filter(|t| !t.is_empty());
                Target::Ignored
            } else {
                Target::Ignored
            };
            continue;
        }

        let header = trimmed.trim_end_matches(':');
        if indent_of(line) == 0
            && trimmed.ends_with(':')
            && headers.classify(header) == Some(Section::Examples)
        {
            in_examples = true;
            target = Target::None;
            continue;
        }

        if in_examples {
            if trimmed.is_empty() {
                parsed.push_example(&std::mem::take(&mut example));
            } else {
                example.push(line);
            }
            continue;
        }

        if trimmed.is_empty() {
            continue;
        }
        match target {
            Target::Param(index) => {
                let param = &mut params[index];
                param.description.push(' ');
                param.description.push_str(trimmed);
            }
            Target::Returns => returns_text.push(trimmed.to_string()),
            Target::Ignored => {}
            Target::None if !seen_field => description.push(trimmed),
            Target::None => {}
        }
    }
    if !example.is_empty() {
        parsed.push_example(&example);
    }

    parsed.set_description(&description);
    for mut param in params {
        if param.type_hint.is_none() {
            param.type_hint = types.get(&param.name).cloned();
        }
        parsed.push_param(param);
    }
    if !returns_text.is_empty() || rtype.is_some() {
        parsed.returns = Some(DocReturns {
            type_hint: rtype,
            description: collapse_whitespace(&returns_text.join(" ")),
        });
    }
    parsed
}
