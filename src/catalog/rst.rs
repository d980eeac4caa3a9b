/*!
 * Extraction of translatable paragraphs from RST sources.
 */

/// Characters used for section title underlines
const TITLE_MARKERS: [char; 3] = ['=', '-', '~'];

/// Whether a trimmed line is a title underline such as `=====`
fn is_title_rule(line: &str) -> bool {
    TITLE_MARKERS
        .iter()
        .any(|&marker| !line.is_empty() && line.chars().all(|c| c == marker))
}

/// Whether a trimmed line is a substitution definition or a bare substitution
fn is_substitution_line(line: &str) -> bool {
    line.len() > 1 && line.starts_with('|') && line.ends_with('|')
}

/// Paragraphs of an RST document that end up as messages.
///
/// Lines of one paragraph are joined with single spaces. Comments and
/// directives, substitution lines and section titles are skipped. A
/// reference left open at the end of a line keeps the following lines in the
/// same unit even if they look like titles.
pub fn translatable_units(rst: &str) -> Vec<String> {
    let lines: Vec<&str> = rst.lines().map(str::trim).collect();
    let mut units = Vec::new();
    let mut current: Vec<&str> = Vec::new();
    let mut in_reference = false;

    for (index, &line) in lines.iter().enumerate() {
        if line.is_empty() {
            if !current.is_empty() {
                units.push(current.join(" "));
                current.clear();
            }
            in_reference = false;
            continue;
        }

        if in_reference {
            current.push(line);
            in_reference = !line.contains('`');
            continue;
        }

        if line.starts_with("..") || is_substitution_line(line) {
            continue;
        }

        if !line.contains(":ref:") {
            let underlined = lines.get(index + 1).is_some_and(|next| is_title_rule(next));
            if underlined || is_title_rule(line) {
                continue;
            }
        }

        current.push(line);
        in_reference = opens_reference(line);
    }

    if !current.is_empty() {
        units.push(current.join(" "));
    }

    units
}

/// Whether the last `:ref:` on the line has no closing backtick
fn opens_reference(line: &str) -> bool {
    line.rfind(":ref:`")
        .is_some_and(|start| !line[start + ":ref:`".len()..].contains('`'))
}

/// Join a possibly wrapped message into one line, trimming every line.
///
/// Used to compare RST paragraphs with PO msgids, which wrap differently.
pub fn normalize_text(text: &str) -> String {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
