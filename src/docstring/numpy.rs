//! NumPy convention: section titles underlined with dashes

use super::clean::indent_of;
use super::google::clean_type_hint;
use super::{DocParam, DocReturns, Headers, ParsedDocstring, Section};
use crate::syntax::collapse_whitespace;
use crate::types::parse_type_expr;

fn is_underline(line: Option<&&str>) -> bool {
    line.map(|l| l.trim())
        .is_some_and(|l| l.len() >= 3 && l.chars().all(|c| c == '-'))
}

#[derive(Default)]
struct NumpyState<'l> {
    parsed: ParsedDocstring,
    description: Vec<&'l str>,
    /// Entry line currently collecting description lines; several names may
    /// share one entry (`x, y : float`)
    current: Vec<DocParam>,
    returns: Option<DocReturns>,
    returns_text: Vec<&'l str>,
    example: Vec<&'l str>,
}

impl<'l> NumpyState<'l> {
    fn flush_params(&mut self) {
        for param in std::mem::take(&mut self.current) {
            self.parsed.push_param(param);
        }
    }

    fn flush_example(&mut self) {
        if !self.example.is_empty() {
            let lines = std::mem::take(&mut self.example);
            self.parsed.push_example(&lines);
        }
    }

    fn parameter_line(&mut self, line: &'l str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        if indent_of(line) > 0 {
            for param in &mut self.current {
                param.description.push(' ');
                param.description.push_str(trimmed);
            }
            return;
        }

        self.flush_params();
        let (names, type_hint) = match trimmed.split_once(':') {
            Some((names, hint)) => (names, clean_type_hint(hint)),
            None => (trimmed, None),
        };
        self.current = names
            .split(',')
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| DocParam {
                name: name.to_string(),
                type_hint: type_hint.clone(),
                description: String::new(),
            })
            .collect();
    }

    fn returns_line(&mut self, line: &'l str) {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return;
        }
        if indent_of(line) > 0 || self.returns.is_some() {
            self.returns_text.push(trimmed);
            return;
        }
        // `name : type` or a bare type
        let hint = trimmed
            .split_once(':')
            .map(|(_, hint)| hint.trim())
            .unwrap_or(trimmed);
        if parse_type_expr(hint).is_ok() {
            self.returns = Some(DocReturns {
                type_hint: Some(hint.to_string()),
                description: String::new(),
            });
        } else {
            self.returns = Some(DocReturns::default());
            self.returns_text.push(trimmed);
        }
    }

    fn finish(mut self) -> ParsedDocstring {
        self.flush_params();
        self.flush_example();
        self.parsed.set_description(&self.description);
        if let Some(mut returns) = self.returns.take() {
            returns.description = collapse_whitespace(&self.returns_text.join(" "));
            self.parsed.returns = Some(returns);
        }
        self.parsed
    }
}

pub(super) fn parse(cleaned: &str, headers: Headers) -> ParsedDocstring {
    let lines: Vec<&str> = cleaned.lines().collect();
    let mut state = NumpyState::default();
    let mut section = Section::Description;

    let mut i = 0;
    while i < lines.len() {
        let line = lines[i];
        let trimmed = line.trim();

        if !trimmed.is_empty() && indent_of(line) == 0 && is_underline(lines.get(i + 1)) {
            state.flush_params();
            state.flush_example();
            section = headers.classify(trimmed).unwrap_or(Section::Ignored);
            i += 2;
            continue;
        }

        match section {
            Section::Description => {
                if !trimmed.is_empty() {
                    state.description.push(trimmed);
                }
            }
            Section::Parameters => state.parameter_line(line),
            Section::Returns => state.returns_line(line),
            Section::Examples => {
                if trimmed.is_empty() {
                    state.flush_example();
                } else {
                    state.example.push(line);
                }
            }
            Section::Ignored => {}
        }
        i += 1;
    }

    state.finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DocstringConfig;
    use indoc::indoc;
    use pretty_assertions::assert_eq;

    fn numpy(text: &str) -> ParsedDocstring {
        let config = DocstringConfig::default();
        parse(&super::super::cleandoc(text), Headers::new(&config))
    }

    #[test]
    fn test_numpy_sections() {
        let parsed = numpy(indoc! {"
            Compute a moving average.

            Parameters
            ----------
            values : list of float
                Input samples.
            window : int, optional
                Window size in
                samples.

            Returns
            -------
            List[float]
                The averaged series.

            Raises
            ------
            ValueError
                If the window is empty.
        "});

        assert_eq!(parsed.description, "Compute a moving average.");
        assert_eq!(
            parsed.params,
            vec![
                DocParam {
                    name: "values".into(),
                    type_hint: Some("list of float".into()),
                    description: "Input samples.".into(),
                },
                DocParam {
                    name: "window".into(),
                    type_hint: Some("int".into()),
                    description: "Window size in samples.".into(),
                },
            ]
        );
        assert_eq!(
            parsed.returns,
            Some(DocReturns {
                type_hint: Some("List[float]".into()),
                description: "The averaged series.".into(),
            })
        );
    }

    #[test]
    fn test_shared_entry_names() {
        let parsed = numpy(indoc! {"
            Move a point.

            Parameters
            ----------
            x, y : float
                Coordinates.
        "});
        let names: Vec<&str> = parsed.params.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(names, vec!["x", "y"]);
        assert_eq!(parsed.params[1].description, "Coordinates.");
    }

    #[test]
    fn test_returns_without_type() {
        let parsed = numpy(indoc! {"
            Summary.

            Returns
            -------
            The generated report text.
        "});
        assert_eq!(
            parsed.returns,
            Some(DocReturns {
                type_hint: None,
                description: "The generated report text.".into(),
            })
        );
    }
}
