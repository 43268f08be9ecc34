//! JCAMP-DX ASDF ordinate decompression
//!
//! `##XYDATA=(X++(Y..Y))` tables abbreviate each line's ordinates with
//! single-character digit encodings:
//!
//! - **SQZ** (`@`, `A`-`I`, `a`-`i`): the character replaces the sign and
//!   leading digit of an absolute value.
//! - **DIF** (`%`, `J`-`R`, `j`-`r`): the character starts a difference
//!   added to the previous ordinate.
//! - **DUP** (`S`-`Z`, `s`): the character starts a count repeating the
//!   previous value or difference.
//!
//! Each data line opens with a plain abscissa value (dropped here; the x
//! axis is reconstructed analytically from the header range). When a line
//! ends in DIF mode, the first ordinate of the next line is a check value
//! that duplicates the last computed ordinate.

use crate::coords::DecodeError;

#[derive(Debug, Clone, Copy)]
enum Token {
    /// Plain or SQZ absolute value.
    Value(f64),
    /// DIF difference relative to the previous ordinate.
    Dif(f64),
    /// DUP repeat count.
    Dup(usize),
    /// `?` placeholder for an unmeasured point.
    Missing,
}

#[derive(Debug, Clone, Copy)]
enum LastOp {
    None,
    Value(f64),
    Dif(f64),
}

/// Decode the ordinate lines of an `(X++(Y..Y))` table.
///
/// `data` is everything after the variable-list line. Returned ordinates
/// are already scaled by `y_factor`.
pub fn decode_ordinates(data: &str, y_factor: f64) -> Result<Vec<f64>, DecodeError> {
    let mut y: Vec<f64> = Vec::new();
    let mut last_op = LastOp::None;
    let mut line_ended_in_dif = false;

    for line in data.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let mut tokens = tokenize(line)?.into_iter();
        // first token is the line's abscissa
        if tokens.next().is_none() {
            continue;
        }

        let mut first_ordinate = true;
        for token in tokens {
            match token {
                Token::Value(v) => {
                    if first_ordinate && line_ended_in_dif {
                        // DIF check value: resync instead of emitting
                        if let Some(last) = y.last_mut() {
                            *last = v;
                        }
                    } else {
                        y.push(v);
                    }
                    last_op = LastOp::Value(v);
                }
                Token::Dif(d) => {
                    let base = y.last().copied().unwrap_or(0.0);
                    y.push(base + d);
                    last_op = LastOp::Dif(d);
                }
                Token::Dup(count) => match last_op {
                    LastOp::Value(v) => {
                        for _ in 1..count {
                            y.push(v);
                        }
                    }
                    LastOp::Dif(d) => {
                        for _ in 1..count {
                            let base = y.last().copied().unwrap_or(0.0);
                            y.push(base + d);
                        }
                    }
                    LastOp::None => {
                        return Err(DecodeError::InvalidToken(format!(
                            "DUP count {count} with no preceding ordinate"
                        )))
                    }
                },
                Token::Missing => {
                    y.push(f64::NAN);
                    last_op = LastOp::None;
                }
            }
            first_ordinate = false;
        }
        line_ended_in_dif = matches!(last_op, LastOp::Dif(_));
    }

    for v in &mut y {
        *v *= y_factor;
    }
    Ok(y)
}

/// SQZ digit: sign and leading digit of an absolute value.
fn sqz_digit(c: char) -> Option<(i32, bool)> {
    match c {
        '@' => Some((0, false)),
        'A'..='I' => Some((c as i32 - 'A' as i32 + 1, false)),
        'a'..='i' => Some((c as i32 - 'a' as i32 + 1, true)),
        _ => None,
    }
}

/// DIF digit: sign and leading digit of a difference.
fn dif_digit(c: char) -> Option<(i32, bool)> {
    match c {
        '%' => Some((0, false)),
        'J'..='R' => Some((c as i32 - 'J' as i32 + 1, false)),
        'j'..='r' => Some((c as i32 - 'j' as i32 + 1, true)),
        _ => None,
    }
}

/// DUP digit: leading digit of a repeat count.
fn dup_digit(c: char) -> Option<i32> {
    match c {
        'S'..='Z' => Some(c as i32 - 'S' as i32 + 1),
        's' => Some(9),
        _ => None,
    }
}

fn tokenize(line: &str) -> Result<Vec<Token>, DecodeError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars().peekable();

    while let Some(&c) = chars.peek() {
        if c.is_whitespace() || c == ',' || c == ';' {
            chars.next();
            continue;
        }
        if c == '?' {
            chars.next();
            tokens.push(Token::Missing);
            continue;
        }

        if c == '+' || c == '-' || c == '.' || c.is_ascii_digit() {
            let mut buf = String::new();
            buf.push(c);
            chars.next();
            consume_number_tail(&mut chars, &mut buf);
            let value: f64 = buf
                .parse()
                .map_err(|_| DecodeError::InvalidToken(buf.clone()))?;
            tokens.push(Token::Value(value));
        } else if let Some((digit, negative)) = sqz_digit(c) {
            chars.next();
            let value = pseudo_digit_value(&mut chars, digit, negative)?;
            tokens.push(Token::Value(value));
        } else if let Some((digit, negative)) = dif_digit(c) {
            chars.next();
            let value = pseudo_digit_value(&mut chars, digit, negative)?;
            tokens.push(Token::Dif(value));
        } else if let Some(digit) = dup_digit(c) {
            chars.next();
            let value = pseudo_digit_value(&mut chars, digit, false)?;
            tokens.push(Token::Dup(value as usize));
        } else {
            return Err(DecodeError::InvalidToken(c.to_string()));
        }
    }

    Ok(tokens)
}

/// Complete a pseudo-digit token: the decoded leading digit followed by the
/// remaining literal digits.
fn pseudo_digit_value(
    chars: &mut std::iter::Peekable<std::str::Chars>,
    leading: i32,
    negative: bool,
) -> Result<f64, DecodeError> {
    let mut buf = leading.to_string();
    consume_number_tail(chars, &mut buf);
    let value: f64 = buf
        .parse()
        .map_err(|_| DecodeError::InvalidToken(buf.clone()))?;
    Ok(if negative { -value } else { value })
}

fn consume_number_tail(chars: &mut std::iter::Peekable<std::str::Chars>, buf: &mut String) {
    while let Some(&c) = chars.peek() {
        if c.is_ascii_digit() || c == '.' {
            buf.push(c);
            chars.next();
        } else {
            break;
        }
    }
}
