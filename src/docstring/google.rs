//! Google convention: `Args:` / `Returns:` / `Examples:` sections

use super::clean::indent_of;
use super::{split_typed_text, DocParam, DocReturns, Headers, ParsedDocstring, Section};
use crate::syntax::collapse_whitespace;
use once_cell::sync::Lazy;
use regex::Regex;

/// `name (type): text`
static TYPED_ENTRY: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(\*{0,2}\w+)\s*\(([^)]*)\)\s*:\s*(.*)$").unwrap());
/// `name: text`
static PLAIN_ENTRY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(\*{0,2}\w+)\s*:\s*(.*)$").unwrap());

/// Parse one `Args:` entry line
pub(super) fn parse_entry(trimmed: &str) -> Option<DocParam> {
    if let Some(caps) = TYPED_ENTRY.captures(trimmed) {
        return Some(DocParam {
            name: caps[1].to_string(),
            type_hint: clean_type_hint(&caps[2]),
            description: caps[3].to_string(),
        });
    }
    PLAIN_ENTRY.captures(trimmed).map(|caps| DocParam {
        name: caps[1].to_string(),
        type_hint: None,
        description: caps[2].to_string(),
    })
}

/// Drop the `optional` marker from `str, optional`
pub(super) fn clean_type_hint(raw: &str) -> Option<String> {
    let hint = raw.trim();
    let hint = hint
        .strip_suffix("optional")
        .map(|rest| rest.trim_end().trim_end_matches(',').trim_end())
        .unwrap_or(hint);
    (!hint.is_empty()).then(|| hint.to_string())
}

/// Section switch for a line at the left margin: `Args:` or `Returns: text`
fn section_header<'l>(line: &'l str, headers: Headers) -> Option<(Section, Option<&'l str>)> {
    if indent_of(line) > 0 {
        return None;
    }
    let trimmed = line.trim();
    if let Some(title) = trimmed.strip_suffix(':') {
        if let Some(section) = headers.classify(title) {
            return Some((section, None));
        }
    }
    let (title, rest) = trimmed.split_once(':')?;
    let rest = rest.trim();
    match headers.classify(title) {
        Some(section @ (Section::Returns | Section::Examples)) if !rest.is_empty() => {
            Some((section, Some(rest)))
        }
        _ => None,
    }
}

struct GoogleState<'l> {
    parsed: ParsedDocstring,
    section: Section,
    description: Vec<&'l str>,
    current: Option<DocParam>,
    entry_indent: Option<usize>,
    returns: Vec<&'l str>,
    example: Vec<&'l str>,
}

impl<'l> GoogleState<'l> {
    fn close_section(&mut self) {
        if let Some(param) = self.current.take() {
            self.parsed.push_param(param);
        }
        self.close_example();
        self.entry_indent = None;
    }

    fn close_example(&mut self) {
        if !self.example.is_empty() {
            let lines = std::mem::take(&mut self.example);
            self.parsed.push_example(&lines);
        }
    }

    fn content(&mut self, line: &'l str) {
        let trimmed = line.trim();
        match self.section {
            Section::Description => {
                if !trimmed.is_empty() {
                    self.description.push(trimmed);
                }
            }
            Section::Parameters => {
                if trimmed.is_empty() {
                    return;
                }
                let indent = indent_of(line);
                let at_entry_level = self.entry_indent.map_or(true, |level| indent <= level);
                if at_entry_level {
                    if let Some(param) = parse_entry(trimmed) {
                        if let Some(done) = self.current.take() {
                            self.parsed.push_param(done);
                        }
                        self.entry_indent.get_or_insert(indent);
                        self.current = Some(param);
                        return;
                    }
                }
                if let Some(param) = self.current.as_mut() {
                    param.description.push(' ');
                    param.description.push_str(trimmed);
                }
            }
            Section::Returns => {
                if !trimmed.is_empty() {
                    self.returns.push(trimmed);
                }
            }
            Section::Examples => {
                if trimmed.is_empty() {
                    self.close_example();
                } else {
                    self.example.push(line);
                }
            }
            Section::Ignored => {}
        }
    }

    fn finish(mut self) -> ParsedDocstring {
        self.close_section();
        self.parsed.set_description(&self.description);
        if let Some((first, rest)) = self.returns.split_first() {
            let (type_hint, head) = split_typed_text(first);
            let mut text = vec![head.as_str()];
            text.extend(rest.iter().copied());
            self.parsed.returns = Some(DocReturns {
                type_hint,
                description: collapse_whitespace(&text.join(" ")),
            });
        }
        self.parsed
    }
}

pub(super) fn parse(cleaned: &str, headers: Headers) -> ParsedDocstring {
    let mut state = GoogleState {
        parsed: ParsedDocstring::default(),
        section: Section::Description,
        description: Vec::new(),
        current: None,
        entry_indent: None,
        returns: Vec::new(),
        example: Vec::new(),
    };

    for line in cleaned.lines() {
        if let Some((section, inline)) = section_header(line, headers) {
            state.close_section();
            state.section = section;
            if let Some(rest) = inline {
                state.content(rest);
            }
            continue;
        }
        state.content(line);
    }

    state.finish()
}
