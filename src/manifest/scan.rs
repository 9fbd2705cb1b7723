//! Statement scanner for Gradle build scripts
//!
//! Splits a script into statements and block open/close tokens. Comments are
//! dropped, string literals are kept verbatim, and braces or parentheses inside
//! string literals are not counted. A statement ends at a newline or `;`
//! unless a parenthesis is still open.

/// A scanned token with its 1-based source line
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Token {
    /// A complete statement (trimmed, never empty)
    Statement { text: String, line: usize },
    /// `header {`; the header is the text before the brace, possibly empty
    Open { header: String, line: usize },
    /// `}`
    Close { line: usize },
}

/// Structural error found while scanning
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ScanError {
    pub line: usize,
    pub message: String,
}

impl ScanError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

#[derive(Default)]
struct Scanner {
    tokens: Vec<Token>,
    buffer: String,
    buffer_line: Option<usize>,
    /// Open delimiters with the line they were opened on
    stack: Vec<(char, usize)>,
    line: usize,
}

impl Scanner {
    fn paren_level(&self) -> usize {
        self.stack.iter().filter(|(c, _)| *c == '(').count()
    }

    fn push_char(&mut self, c: char) {
        if self.buffer_line.is_none() && !c.is_whitespace() {
            self.buffer_line = Some(self.line);
        }
        self.buffer.push(c);
    }

    fn push_str(&mut self, s: &str, start_line: usize) {
        if self.buffer_line.is_none() {
            self.buffer_line = Some(start_line);
        }
        self.buffer.push_str(s);
    }

    fn take_buffer(&mut self) -> (String, usize) {
        let text = self.buffer.trim().to_string();
        let line = self.buffer_line.unwrap_or(self.line);
        self.buffer.clear();
        self.buffer_line = None;
        (text, line)
    }

    fn flush(&mut self) {
        let (text, line) = self.take_buffer();
        if !text.is_empty() {
            self.tokens.push(Token::Statement { text, line });
        }
    }
}

/// Scans a build script into tokens
pub(crate) fn scan(content: &str) -> Result<Vec<Token>, ScanError> {
    let chars: Vec<char> = content.chars().collect();
    let mut s = Scanner {
        line: 1,
        ..Default::default()
    };
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let next = chars.get(i + 1).copied();

        match c {
            '/' if next == Some('/') => {
                while i < chars.len() && chars[i] != '\n' {
                    i += 1;
                }
                continue;
            }
            '/' if next == Some('*') => {
                let start = s.line;
                i += 2;
                loop {
                    if i >= chars.len() {
                        return Err(ScanError::new(start, "unterminated block comment"));
                    }
                    if chars[i] == '*' && chars.get(i + 1) == Some(&'/') {
                        i += 2;
                        break;
                    }
                    if chars[i] == '\n' {
                        s.line += 1;
                    }
                    i += 1;
                }
                s.push_char(' ');
                continue;
            }
            '"' | '\'' => {
                let start = s.line;
                let end = read_string(&chars, i, &mut s.line)?;
                let literal: String = chars[i..end].iter().collect();
                s.push_str(&literal, start);
                i = end;
                continue;
            }
            '(' => {
                s.stack.push(('(', s.line));
                s.push_char(c);
            }
            ')' => {
                match s.stack.last() {
                    Some(('(', _)) => {
                        s.stack.pop();
                    }
                    Some((_, opened)) => {
                        return Err(ScanError::new(
                            s.line,
                            format!("unbalanced parentheses: ')' closes '{{' opened at line {}", opened),
                        ));
                    }
                    None => {
                        return Err(ScanError::new(s.line, "unbalanced parentheses: unexpected ')'"));
                    }
                }
                s.push_char(c);
            }
            '{' => {
                if s.paren_level() == 0 {
                    let (header, line) = s.take_buffer();
                    let line = if header.is_empty() { s.line } else { line };
                    s.tokens.push(Token::Open { header, line });
                } else {
                    s.push_char(c);
                }
                s.stack.push(('{', s.line));
            }
            '}' => {
                match s.stack.last() {
                    Some(('{', _)) => {
                        s.stack.pop();
                    }
                    Some((_, opened)) => {
                        return Err(ScanError::new(
                            s.line,
                            format!("unbalanced parentheses: '(' opened at line {} is never closed", opened),
                        ));
                    }
                    None => {
                        return Err(ScanError::new(s.line, "unbalanced braces: unexpected '}'"));
                    }
                }
                if s.paren_level() == 0 {
                    s.flush();
                    s.tokens.push(Token::Close { line: s.line });
                } else {
                    s.push_char(c);
                }
            }
            '\n' => {
                if s.paren_level() == 0 {
                    s.flush();
                } else {
                    s.push_char(' ');
                }
                s.line += 1;
            }
            ';' if s.paren_level() == 0 => s.flush(),
            _ => s.push_char(c),
        }
        i += 1;
    }

    if let Some((open, line)) = s.stack.last() {
        let message = match open {
            '{' => "unbalanced braces: '{' is never closed",
            _ => "unbalanced parentheses: '(' is never closed",
        };
        return Err(ScanError::new(*line, message));
    }

    s.flush();
    Ok(s.tokens)
}

/// Reads a string literal starting at `start`, returning the index just past
/// its closing quote. Triple-quoted strings may span lines.
fn read_string(chars: &[char], start: usize, line: &mut usize) -> Result<usize, ScanError> {
    let quote = chars[start];
    let opened_at = *line;

    let triple = quote == '"' && chars.get(start + 1) == Some(&'"') && chars.get(start + 2) == Some(&'"');
    if triple {
        let mut i = start + 3;
        while i < chars.len() {
            if chars[i] == '"' && chars.get(i + 1) == Some(&'"') && chars.get(i + 2) == Some(&'"') {
                return Ok(i + 3);
            }
            if chars[i] == '\n' {
                *line += 1;
            }
            i += 1;
        }
        return Err(ScanError::new(opened_at, "unterminated string literal"));
    }

    let mut i = start + 1;
    let mut interpolation = 0usize;
    while i < chars.len() {
        let c = chars[i];
        match c {
            '\\' => {
                i += 2;
                continue;
            }
            '\n' => break,
            '$' if quote == '"' && chars.get(i + 1) == Some(&'{') => {
                interpolation += 1;
                i += 2;
                continue;
            }
            '}' if interpolation > 0 => interpolation -= 1,
            _ if interpolation > 0 => {}
            _ if c == quote => return Ok(i + 1),
            _ => {}
        }
        i += 1;
    }
    Err(ScanError::new(opened_at, "unterminated string literal"))
}
