//! Single-line tokenizer for comma-separated input.
//!
//! The tokenizer is a two-state machine (`Unquoted`, `Quoted`) that walks the
//! line once, left to right:
//!
//! - Outside quotes, `,` ends the current field and `"` enters quoted mode.
//! - Inside quotes, `""` yields one literal `"`, a lone `"` leaves quoted mode,
//!   and every other character (commas included) is kept verbatim.
//! - The end of the line always flushes the last field, even when empty.
//!
//! Malformed quoting never fails: an unterminated quote is closed by the end
//! of the line.

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Unquoted,
    Quoted,
}

/// Split one line into its fields.
///
/// Fields are returned untrimmed; callers decide whether surrounding
/// whitespace matters.
///
/// # Example
/// ```
/// use rowbeam::tokenize;
///
/// assert_eq!(tokenize(r#"a,"b,c",d"#), vec!["a", "b,c", "d"]);
/// assert_eq!(tokenize(r#"a,"b""c",d"#), vec!["a", "b\"c", "d"]);
/// assert_eq!(tokenize(""), vec![""]);
/// ```
#[must_use]
pub fn tokenize(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut state = State::Unquoted;
    let mut chars = line.chars().peekable();

    while let Some(ch) = chars.next() {
        state = match (state, ch) {
            (State::Unquoted, ',') => {
                fields.push(std::mem::take(&mut current));
                State::Unquoted
            }
            (State::Unquoted, '"') => State::Quoted,
            (State::Quoted, '"') => {
                if chars.next_if_eq(&'"').is_some() {
                    current.push('"');
                    State::Quoted
                } else {
                    State::Unquoted
                }
            }
            (state, other) => {
                current.push(other);
                state
            }
        };
    }

    fields.push(current);
    fields
}
