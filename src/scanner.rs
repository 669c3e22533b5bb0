//! Turns a raw input line into an ordered sequence of lexemes: words and
//! operator tokens. Quoting is resolved here; operator recognition and
//! pipeline structure are the pipeline builder's job.

/// A single lexeme produced by [`scan`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lexeme {
    Word(String),
    Pipe,
    Less,
    Great,
    DGreat,
    Amp,
}

/// States for the tokenizer state machine.
enum State {
    /// Between tokens — whitespace is skipped, operators are recognized.
    Normal,
    /// Building an unquoted word — whitespace or an operator ends it.
    InWord,
    /// Inside double quotes — whitespace and operators are preserved.
    InDoubleQuote,
    /// Inside single quotes — everything is literal.
    InSingleQuote,
}

/// Scan a shell input line into lexemes.
///
/// A line whose first non-whitespace character is `#` is a comment and
/// scans to the empty sequence. An unterminated quote is accepted: the
/// quoted region simply runs to end of input as part of the current word,
/// matching this scanner's long-standing permissive behavior rather than
/// treating it as a hard error.
pub fn scan(input: &str) -> Vec<Lexeme> {
    let trimmed_start = input.trim_start();
    if trimmed_start.starts_with('#') {
        return Vec::new();
    }

    let mut lexemes: Vec<Lexeme> = Vec::new();
    let mut current = String::new();
    let mut in_word = false;
    let mut state = State::Normal;
    let mut chars = input.chars().peekable();

    macro_rules! flush_word {
        () => {
            if in_word {
                lexemes.push(Lexeme::Word(std::mem::take(&mut current)));
                in_word = false;
            }
        };
    }

    while let Some(ch) = chars.next() {
        match (&state, ch) {
            (State::Normal, ' ' | '\t') => {}
            (State::Normal, '"') => {
                state = State::InDoubleQuote;
                in_word = true;
            }
            (State::Normal, '\'') => {
                state = State::InSingleQuote;
                in_word = true;
            }
            (State::Normal, '|') => lexemes.push(Lexeme::Pipe),
            (State::Normal, '<') => lexemes.push(Lexeme::Less),
            (State::Normal, '>') => {
                if chars.peek() == Some(&'>') {
                    chars.next();
                    lexemes.push(Lexeme::DGreat);
                } else {
                    lexemes.push(Lexeme::Great);
                }
            }
            (State::Normal, '&') => lexemes.push(Lexeme::Amp),
            (State::Normal, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
                in_word = true;
                state = State::InWord;
            }
            (State::Normal, c) => {
                current.push(c);
                in_word = true;
                state = State::InWord;
            }

            (State::InWord, ' ' | '\t') => {
                flush_word!();
                state = State::Normal;
            }
            (State::InWord, '|') => {
                flush_word!();
                lexemes.push(Lexeme::Pipe);
                state = State::Normal;
            }
            (State::InWord, '<') => {
                flush_word!();
                lexemes.push(Lexeme::Less);
                state = State::Normal;
            }
            (State::InWord, '>') => {
                flush_word!();
                if chars.peek() == Some(&'>') {
                    chars.next();
                    lexemes.push(Lexeme::DGreat);
                } else {
                    lexemes.push(Lexeme::Great);
                }
                state = State::Normal;
            }
            (State::InWord, '&') => {
                flush_word!();
                lexemes.push(Lexeme::Amp);
                state = State::Normal;
            }
            (State::InWord, '"') => state = State::InDoubleQuote,
            (State::InWord, '\'') => state = State::InSingleQuote,
            (State::InWord, '\\') => {
                if let Some(next) = chars.next() {
                    current.push(next);
                }
            }
            (State::InWord, c) => current.push(c),

            (State::InDoubleQuote, '"') => state = State::InWord,
            (State::InDoubleQuote, '\\') => match chars.peek() {
                Some(&'"' | &'\\' | &'$' | &'`') => current.push(chars.next().unwrap()),
                _ => current.push('\\'),
            },
            (State::InDoubleQuote, c) => current.push(c),

            (State::InSingleQuote, '\'') => state = State::InWord,
            (State::InSingleQuote, c) => current.push(c),
        }
    }

    flush_word!();

    lexemes
}
