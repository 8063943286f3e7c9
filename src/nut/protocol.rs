use super::error::NutError;
use std::collections::BTreeMap;

/// One line of a `upsd` answer.
#[derive(Debug, Clone, PartialEq)]
pub enum ResponseLine {
    /// `BEGIN LIST <query...>`
    Begin(Vec<String>),
    /// `END LIST <query...>`
    End(Vec<String>),
    /// `ERR <code> [extra]`
    Error(String),
    /// Any other line, e.g. `VAR <ups> <name> "<value>"`
    Item(Vec<String>),
}

/// Split a line into whitespace separated tokens.
///
/// Double quoted tokens may contain whitespace, and a backslash escapes
/// the following character inside them.
pub fn split_tokens(line: &str) -> Result<Vec<String>, NutError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let Some(&first) = chars.peek() else {
            break;
        };

        let mut token = String::new();
        if first == '"' {
            chars.next();
            let mut closed = false;
            while let Some(c) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some(escaped) => token.push(escaped),
                        None => {
                            return Err(NutError::Protocol(format!(
                                "Dangling escape in line: {}",
                                line
                            )));
                        }
                    },
                    '"' => {
                        closed = true;
                        break;
                    }
                    c => token.push(c),
                }
            }
            if !closed {
                return Err(NutError::Protocol(format!(
                    "Unterminated quoted string in line: {}",
                    line
                )));
            }
        } else {
            while let Some(&c) = chars.peek() {
                if c.is_whitespace() {
                    break;
                }
                token.push(c);
                chars.next();
            }
        }
        tokens.push(token);
    }

    Ok(tokens)
}

pub fn parse_line(line: &str) -> Result<ResponseLine, NutError> {
    let mut tokens = split_tokens(line)?;
    if tokens.is_empty() {
        return Err(NutError::Protocol("Empty line".to_string()));
    }

    match (tokens[0].as_str(), tokens.get(1).map(String::as_str)) {
        ("BEGIN", Some("LIST")) => Ok(ResponseLine::Begin(tokens.split_off(2))),
        ("END", Some("LIST")) => Ok(ResponseLine::End(tokens.split_off(2))),
        ("ERR", Some(code)) => Ok(ResponseLine::Error(code.to_string())),
        ("ERR", None) => Err(NutError::Protocol("ERR without code".to_string())),
        _ => Ok(ResponseLine::Item(tokens)),
    }
}

/// Quote a command argument when it would not survive tokenization as is.
pub fn quote_argument(argument: &str) -> String {
    let needs_quotes = argument.is_empty()
        || argument
            .chars()
            .any(|c| c.is_whitespace() || c == '"' || c == '\\');
    if !needs_quotes {
        return argument.to_string();
    }

    let mut quoted = String::with_capacity(argument.len() + 2);
    quoted.push('"');
    for c in argument.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}

/// Build `UPS <name> "<description>"` items into a map.
pub fn collect_units(items: Vec<Vec<String>>) -> Result<BTreeMap<String, String>, NutError> {
    items
        .into_iter()
        .map(|item| match item.as_slice() {
            [kind, name, description, ..] if kind == "UPS" => {
                Ok((name.clone(), description.clone()))
            }
            _ => Err(NutError::Protocol(format!("Unexpected UPS entry: {:?}", item))),
        })
        .collect()
}

/// Build `VAR <ups> <name> "<value>"` items into a map.
pub fn collect_variables(
    unit: &str,
    items: Vec<Vec<String>>,
) -> Result<BTreeMap<String, String>, NutError> {
    items
        .into_iter()
        .map(|item| match item.as_slice() {
            [kind, ups, name, value, ..] if kind == "VAR" && ups == unit => {
                Ok((name.clone(), value.clone()))
            }
            _ => Err(NutError::Protocol(format!("Unexpected VAR entry: {:?}", item))),
        })
        .collect()
}
