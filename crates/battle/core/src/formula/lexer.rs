use super::FormulaError;

#[derive(Clone, Debug, PartialEq)]
pub(super) enum Token {
    Number(f64),
    Ident(String),
    Dot,
    Comma,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Question,
    Colon,
    Semicolon,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
}

/// Token with its byte offset in the source.
pub(super) type Spanned = (Token, usize);

pub(super) fn tokenize(source: &str) -> Result<Vec<Spanned>, FormulaError> {
    let bytes = source.as_bytes();
    let mut tokens = Vec::new();
    let mut pos = 0;

    while pos < bytes.len() {
        let c = bytes[pos];
        if c.is_ascii_whitespace() {
            pos += 1;
            continue;
        }

        let start = pos;
        if c.is_ascii_digit() || (c == b'.' && bytes.get(pos + 1).is_some_and(u8::is_ascii_digit))
        {
            while pos < bytes.len() && (bytes[pos].is_ascii_digit() || bytes[pos] == b'.') {
                pos += 1;
            }
            let text = &source[start..pos];
            let value = text.parse::<f64>().map_err(|_| FormulaError::Parse {
                position: start,
                message: "malformed number",
            })?;
            tokens.push((Token::Number(value), start));
            continue;
        }

        if c.is_ascii_alphabetic() || c == b'_' || c == b'$' {
            while pos < bytes.len()
                && (bytes[pos].is_ascii_alphanumeric() || bytes[pos] == b'_' || bytes[pos] == b'$')
            {
                pos += 1;
            }
            tokens.push((Token::Ident(source[start..pos].to_string()), start));
            continue;
        }

        let next = bytes.get(pos + 1).copied();
        let third = bytes.get(pos + 2).copied();
        let (token, width) = match (c, next) {
            (b'=', Some(b'=')) => (Token::EqEq, if third == Some(b'=') { 3 } else { 2 }),
            (b'!', Some(b'=')) => (Token::NotEq, if third == Some(b'=') { 3 } else { 2 }),
            (b'<', Some(b'=')) => (Token::Le, 2),
            (b'>', Some(b'=')) => (Token::Ge, 2),
            (b'&', Some(b'&')) => (Token::AndAnd, 2),
            (b'|', Some(b'|')) => (Token::OrOr, 2),
            (b'.', _) => (Token::Dot, 1),
            (b',', _) => (Token::Comma, 1),
            (b'(', _) => (Token::LParen, 1),
            (b')', _) => (Token::RParen, 1),
            (b'[', _) => (Token::LBracket, 1),
            (b']', _) => (Token::RBracket, 1),
            (b'+', _) => (Token::Plus, 1),
            (b'-', _) => (Token::Minus, 1),
            (b'*', _) => (Token::Star, 1),
            (b'/', _) => (Token::Slash, 1),
            (b'%', _) => (Token::Percent, 1),
            (b'!', _) => (Token::Bang, 1),
            (b'?', _) => (Token::Question, 1),
            (b':', _) => (Token::Colon, 1),
            (b';', _) => (Token::Semicolon, 1),
            (b'<', _) => (Token::Lt, 1),
            (b'>', _) => (Token::Gt, 1),
            _ => {
                return Err(FormulaError::Parse {
                    position: start,
                    message: "unexpected character",
                });
            }
        };
        tokens.push((token, start));
        pos += width;
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<Token> {
        tokenize(source)
            .expect("tokenizes")
            .into_iter()
            .map(|(token, _)| token)
            .collect()
    }

    #[test]
    fn splits_member_access_and_operators() {
        assert_eq!(
            kinds("a.atk * 4 - b.def"),
            vec![
                Token::Ident("a".into()),
                Token::Dot,
                Token::Ident("atk".into()),
                Token::Star,
                Token::Number(4.0),
                Token::Minus,
                Token::Ident("b".into()),
                Token::Dot,
                Token::Ident("def".into()),
            ]
        );
    }

    #[test]
    fn strict_equality_reads_as_equality() {
        assert_eq!(kinds("1 === 1"), kinds("1 == 1"));
        assert_eq!(kinds("1 !== 2"), kinds("1 != 2"));
    }

    #[test]
    fn rejects_assignment_and_strings() {
        assert!(tokenize("a.hp = 0").is_err());
        assert!(tokenize("'text'").is_err());
    }
}
