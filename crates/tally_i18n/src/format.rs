//! printf-style template formatting
//!
//! Supported placeholder grammar: `%[argnum$][flags][width][.precision]conversion`
//! with flags `-` (left align) and `0` (zero pad), and conversions `s`, `d`,
//! `i`, `u`, `f`, `F`, `x`, `X`. `%%` is a literal percent sign.

use crate::error::TranslationError;
use std::fmt;

/// Largest width or precision a placeholder may ask for
pub const MAX_WIDTH: usize = 1024;

/// A substitution argument
#[derive(Debug, Clone, PartialEq)]
pub enum Arg {
    Str(String),
    Int(i64),
    Float(f64),
}

impl Arg {
    fn as_int(&self) -> i64 {
        match self {
            Arg::Int(value) => *value,
            Arg::Float(value) => value.trunc() as i64,
            // Non-numeric strings count as 0, numeric ones are truncated
            Arg::Str(value) => {
                let trimmed = value.trim();
                trimmed
                    .parse::<i64>()
                    .ok()
                    .or_else(|| trimmed.parse::<f64>().ok().map(|f| f.trunc() as i64))
                    .unwrap_or(0)
            }
        }
    }

    fn as_float(&self) -> f64 {
        match self {
            Arg::Int(value) => *value as f64,
            Arg::Float(value) => *value,
            Arg::Str(value) => value.trim().parse::<f64>().unwrap_or(0.0),
        }
    }
}

impl fmt::Display for Arg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Arg::Str(value) => f.write_str(value),
            Arg::Int(value) => write!(f, "{}", value),
            Arg::Float(value) => write!(f, "{}", value),
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Arg::Str(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Arg::Str(value)
    }
}

impl From<&String> for Arg {
    fn from(value: &String) -> Self {
        Arg::Str(value.clone())
    }
}

macro_rules! int_arg {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Arg {
                fn from(value: $ty) -> Self {
                    Arg::Int(value as i64)
                }
            }
        )*
    };
}

int_arg!(i8, i16, i32, i64, u8, u16, u32, u64, usize, isize);

impl From<f32> for Arg {
    fn from(value: f32) -> Self {
        Arg::Float(value as f64)
    }
}

impl From<f64> for Arg {
    fn from(value: f64) -> Self {
        Arg::Float(value)
    }
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Literal(String),
    Placeholder(Directive),
}

#[derive(Debug, Clone, PartialEq)]
struct Directive {
    /// Zero-based argument index
    index: usize,
    left_align: bool,
    zero_pad: bool,
    width: usize,
    precision: Option<usize>,
    conversion: char,
}

fn parse(template: &str) -> Result<Vec<Piece>, TranslationError> {
    let bytes = template.as_bytes();
    let mut pieces = Vec::new();
    let mut literal = String::new();
    let mut next_arg = 0usize;
    let mut pos = 0usize;

    while pos < bytes.len() {
        let Some(offset) = template[pos..].find('%') else {
            literal.push_str(&template[pos..]);
            break;
        };
        literal.push_str(&template[pos..pos + offset]);
        let start = pos + offset;
        let mut cursor = start + 1;

        if bytes.get(cursor) == Some(&b'%') {
            literal.push('%');
            pos = cursor + 1;
            continue;
        }

        // `end` may land inside a multibyte character; widen it to include
        // the whole character
        let bad = |end: usize| {
            let mut end = end.min(template.len());
            while !template.is_char_boundary(end) {
                end += 1;
            }
            TranslationError::BadPlaceholder {
                position: start,
                placeholder: template[start..end].to_string(),
            }
        };

        // argnum$ or width, told apart by the trailing '$'
        let digits_start = cursor;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        let mut index = None;
        if cursor > digits_start && bytes.get(cursor) == Some(&b'$') {
            let position: usize = template[digits_start..cursor].parse().map_err(|_| bad(cursor))?;
            if position == 0 {
                return Err(bad(cursor + 1));
            }
            index = Some(position - 1);
            cursor += 1;
        } else {
            cursor = digits_start;
        }

        let mut left_align = false;
        let mut zero_pad = false;
        while let Some(flag) = bytes.get(cursor) {
            match flag {
                b'-' => left_align = true,
                b'0' => zero_pad = true,
                _ => break,
            }
            cursor += 1;
        }

        let width_start = cursor;
        while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
            cursor += 1;
        }
        let width = if cursor > width_start {
            template[width_start..cursor].parse().map_err(|_| bad(cursor))?
        } else {
            0
        };
        if width > MAX_WIDTH {
            return Err(bad(cursor));
        }

        let mut precision = None;
        if bytes.get(cursor) == Some(&b'.') {
            cursor += 1;
            let precision_start = cursor;
            while cursor < bytes.len() && bytes[cursor].is_ascii_digit() {
                cursor += 1;
            }
            let value = if cursor > precision_start {
                template[precision_start..cursor].parse().map_err(|_| bad(cursor))?
            } else {
                0
            };
            if value > MAX_WIDTH {
                return Err(bad(cursor));
            }
            precision = Some(value);
        }

        let conversion = match bytes.get(cursor) {
            Some(c @ (b's' | b'd' | b'i' | b'u' | b'f' | b'F' | b'x' | b'X')) => *c as char,
            _ => return Err(bad(cursor + 1)),
        };
        cursor += 1;

        let index = index.unwrap_or_else(|| {
            let index = next_arg;
            next_arg += 1;
            index
        });

        if !literal.is_empty() {
            pieces.push(Piece::Literal(std::mem::take(&mut literal)));
        }
        pieces.push(Piece::Placeholder(Directive {
            index,
            left_align,
            zero_pad,
            width,
            precision,
            conversion,
        }));
        pos = cursor;
    }

    if !literal.is_empty() {
        pieces.push(Piece::Literal(literal));
    }
    Ok(pieces)
}

fn render(directive: &Directive, arg: &Arg) -> String {
    let body = match directive.conversion {
        's' => {
            let text = arg.to_string();
            match directive.precision {
                Some(max) => text.chars().take(max).collect(),
                None => text,
            }
        }
        'd' | 'i' => arg.as_int().to_string(),
        'u' => (arg.as_int() as u64).to_string(),
        'f' | 'F' => format!("{:.*}", directive.precision.unwrap_or(6), arg.as_float()),
        'x' => format!("{:x}", arg.as_int() as u64),
        'X' => format!("{:X}", arg.as_int() as u64),
        _ => unreachable!("conversion validated by parse"),
    };

    let len = body.chars().count();
    if len >= directive.width {
        return body;
    }
    let fill = directive.width - len;
    if directive.left_align {
        format!("{}{}", body, " ".repeat(fill))
    } else if directive.zero_pad && directive.conversion != 's' {
        match body.strip_prefix('-') {
            Some(digits) => format!("-{}{}", "0".repeat(fill), digits),
            None => format!("{}{}", "0".repeat(fill), body),
        }
    } else {
        format!("{}{}", " ".repeat(fill), body)
    }
}

fn arg_count(pieces: &[Piece]) -> usize {
    pieces
        .iter()
        .filter_map(|piece| match piece {
            Piece::Placeholder(directive) => Some(directive.index + 1),
            Piece::Literal(_) => None,
        })
        .max()
        .unwrap_or(0)
}

/// Number of arguments a template consumes
pub fn expected_args(template: &str) -> Result<usize, TranslationError> {
    Ok(arg_count(&parse(template)?))
}

/// Substitute `args` into `template`.
///
/// Fails when the template is malformed or when the number of arguments
/// differs from what the template consumes.
pub fn sprintf(template: &str, args: &[Arg]) -> Result<String, TranslationError> {
    let pieces = parse(template)?;
    let expected = arg_count(&pieces);

    if expected != args.len() {
        return Err(TranslationError::FormatMismatch {
            expected,
            supplied: args.len(),
        });
    }

    let mut out = String::with_capacity(template.len());
    for piece in &pieces {
        match piece {
            Piece::Literal(text) => out.push_str(text),
            Piece::Placeholder(directive) => out.push_str(&render(directive, &args[directive.index])),
        }
    }
    Ok(out)
}
