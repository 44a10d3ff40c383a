// parser.rs

/// A parse failure, tagged with the 1-based line it occurred on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseError {
    pub line: usize,
    pub reason: String,
}

/// Splits comma-separated text into rows of fields. A field wrapped in
/// double quotes may contain commas and newlines, and `""` inside it is a
/// literal quote. Blank lines are skipped. Each row carries the line it
/// starts on.
pub fn parse_records(content: &str) -> Result<Vec<(usize, Vec<String>)>, ParseError> {
    let mut rows = Vec::new();
    let mut row: Vec<String> = Vec::new();
    let mut cur = String::new();
    let mut chars = content.chars().peekable();
    #[derive(Clone, Copy)]
    enum State { Start, Bare, Quoted, AfterQuote }
    let mut state = State::Start;
    let mut line = 1;
    let mut row_line = 1;
    let fail = |line: usize, reason: String| ParseError { line, reason };
    while let Some(ch) = chars.next() {
        match state {
            State::Start | State::Bare | State::AfterQuote if ch == '\r' && chars.peek() == Some(&'\n') => {}
            State::Start | State::Bare | State::AfterQuote if ch == '\n' => {
                let blank = row.is_empty() && cur.is_empty() && matches!(state, State::Start);
                if !blank {
                    row.push(std::mem::take(&mut cur));
                    rows.push((row_line, std::mem::take(&mut row)));
                }
                state = State::Start;
                line += 1;
                row_line = line;
            }
            State::Start => match ch {
                '"' => state = State::Quoted,
                ',' => row.push(String::new()),
                _ => {
                    cur.push(ch);
                    state = State::Bare;
                }
            },
            State::Bare => match ch {
                ',' => {
                    row.push(std::mem::take(&mut cur));
                    state = State::Start;
                }
                '"' => return Err(fail(line, format!("unexpected quote in unquoted field '{}'", cur))),
                _ => cur.push(ch),
            },
            State::Quoted => match ch {
                '"' => {
                    if let Some(&'"') = chars.peek() {
                        cur.push('"');
                        chars.next();
                    } else {
                        state = State::AfterQuote;
                    }
                }
                '\n' => {
                    cur.push(ch);
                    line += 1;
                }
                _ => cur.push(ch),
            },
            State::AfterQuote => match ch {
                ',' => {
                    row.push(std::mem::take(&mut cur));
                    state = State::Start;
                }
                c => return Err(fail(line, format!("unexpected '{}' after closing quote", c))),
            },
        }
    }
    match state {
        State::Quoted => Err(fail(row_line, "unterminated quoted field".to_string())),
        State::Start if row.is_empty() && cur.is_empty() => Ok(rows),
        _ => {
            row.push(cur);
            rows.push((row_line, row));
            Ok(rows)
        }
    }
}

/// Quotes a field only when it would not survive `parse_records` bare.
pub fn quote_field(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields(content: &str) -> Vec<Vec<String>> {
        parse_records(content).unwrap().into_iter().map(|(_, row)| row).collect()
    }

    #[test]
    fn splits_bare_fields() {
        assert_eq!(fields("Add,2.0,3.0,5.0\n"), vec![vec!["Add", "2.0", "3.0", "5.0"]]);
    }

    #[test]
    fn keeps_empty_fields() {
        assert_eq!(fields("a,,b,"), vec![vec!["a", "", "b", ""]]);
    }

    #[test]
    fn skips_blank_lines_and_tracks_line_numbers() {
        let rows = parse_records("h1,h2\r\n\r\na,b\n").unwrap();
        assert_eq!(rows, vec![(1, vec!["h1".to_string(), "h2".to_string()]), (3, vec!["a".to_string(), "b".to_string()])]);
    }

    #[test]
    fn quoted_field_with_comma_newline_and_escaped_quote() {
        let rows = parse_records("\"a, \"\"b\"\"\nc\",1\nnext,2\n").unwrap();
        assert_eq!(rows[0], (1, vec!["a, \"b\"\nc".to_string(), "1".to_string()]));
        assert_eq!(rows[1], (3, vec!["next".to_string(), "2".to_string()]));
    }

    #[test]
    fn quote_field_only_when_needed() {
        assert_eq!(quote_field("Add"), "Add");
        assert_eq!(quote_field("a,b"), "\"a,b\"");
        assert_eq!(quote_field("say \"hi\""), "\"say \"\"hi\"\"\"");
        assert_eq!(quote_field("two\nlines"), "\"two\nlines\"");
    }

    #[test]
    fn rejects_malformed_quotes() {
        assert_eq!(parse_records("ok,1\n\"open,1").unwrap_err().line, 2);
        assert!(parse_records("\"a\"b,1").is_err());
        assert_eq!(parse_records("x\na\"b,1").unwrap_err().line, 2);
    }
}
