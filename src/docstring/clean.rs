/// Normalize docstring indentation the way Python's `inspect.cleandoc` does.
///
/// Tabs expand to 8 columns, the first line loses its leading whitespace, the
/// common indentation of the remaining lines is removed, and leading and
/// trailing blank lines are dropped.
pub fn cleandoc(raw: &str) -> String {
    let lines: Vec<String> = raw.lines().map(expand_tabs).collect();
    if lines.is_empty() {
        return String::new();
    }

    let margin = lines
        .iter()
        .skip(1)
        .filter(|line| !line.trim().is_empty())
        .map(|line| line.len() - line.trim_start().len())
        .min()
        .unwrap_or(0);

    let mut cleaned: Vec<&str> = Vec::with_capacity(lines.len());
    cleaned.push(lines[0].trim_start());
    for line in &lines[1..] {
        let indent = line.len() - line.trim_start().len();
        cleaned.push(line.get(indent.min(margin)..).unwrap_or(line.trim_start()));
    }

    let first = cleaned.iter().position(|l| !l.trim().is_empty());
    let last = cleaned.iter().rposition(|l| !l.trim().is_empty());
    match (first, last) {
        (Some(first), Some(last)) => cleaned[first..=last]
            .iter()
            .map(|line| line.trim_end())
            .collect::<Vec<_>>()
            .join("\n"),
        _ => String::new(),
    }
}

fn expand_tabs(line: &str) -> String {
    if !line.contains('\t') {
        return line.to_string();
    }
    let mut out = String::with_capacity(line.len() + 8);
    let mut column = 0;
    for c in line.chars() {
        if c == '\t' {
            let spaces = 8 - column % 8;
            out.extend(std::iter::repeat(' ').take(spaces));
            column += spaces;
        } else {
            out.push(c);
            column += 1;
        }
    }
    out
}

/// Width of the leading whitespace of a cleaned line
pub fn indent_of(line: &str) -> usize {
    line.len() - line.trim_start().len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_cleandoc_removes_common_margin() {
        let raw = "Get weather.\n    \n    Args:\n        location: Where\n    ";
        assert_eq!(cleandoc(raw), "Get weather.\n\nArgs:\n    location: Where");
    }

    #[test]
    fn test_cleandoc_leading_blank_lines() {
        let raw = "\n    Summary line.\n\n    More text.\n";
        assert_eq!(cleandoc(raw), "Summary line.\n\nMore text.");
    }

    #[test]
    fn test_cleandoc_tabs_and_empty() {
        assert_eq!(cleandoc("A\n\tB"), "A\nB");
        assert_eq!(cleandoc("   \n  "), "");
        assert_eq!(cleandoc(""), "");
    }

    #[test]
    fn test_indent_of() {
        assert_eq!(indent_of("    x"), 4);
        assert_eq!(indent_of("x"), 0);
    }
}
