use super::Regex;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    Lit(char),
    Class(Class),
    Pipe,
    Star,
    Plus,
    Query,
    LPar,
    RPar,
}

/// The escape classes the surface syntax recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Class {
    Digit,
    Word,
    Space,
}

impl Class {
    fn chars(self) -> Vec<char> {
        match self {
            Self::Digit => ('0'..='9').collect(),
            Self::Word => ('A'..='Z')
                .chain('a'..='z')
                .chain('0'..='9')
                .chain(['_'])
                .collect(),
            Self::Space => vec![' ', '\t', '\n', '\r'],
        }
    }

    /// A class is sugar for an alternation of its member literals.
    #[must_use]
    pub fn expand(self) -> Regex<char> {
        Regex::Alt(self.chars().into_iter().map(Regex::Lit).collect())
    }
}

#[inline]
#[must_use]
pub fn is_metachar(c: char) -> bool {
    matches!(c, '|' | '*' | '+' | '?' | '(' | ')' | '\\')
}

fn lex(pattern: &str) -> Result<Vec<(usize, Token)>> {
    let mut toks = Vec::new();
    let mut it = pattern.char_indices();

    while let Some((pos, c)) = it.next() {
        let tok = match c {
            '|' => Token::Pipe,
            '*' => Token::Star,
            '+' => Token::Plus,
            '?' => Token::Query,
            '(' => Token::LPar,
            ')' => Token::RPar,
            '\\' => match it.next() {
                None => return Err(Error::syntax(pos, "unterminated escape")),
                Some((_, 'd')) => Token::Class(Class::Digit),
                Some((_, 'w')) => Token::Class(Class::Word),
                Some((_, 's')) => Token::Class(Class::Space),
                Some((_, e)) => Token::Lit(e),
            },
            c => Token::Lit(c),
        };
        toks.push((pos, tok));
    }

    Ok(toks)
}

/// Recursive descent over the positioned token stream. Precedence low→high:
/// alternation, concatenation, postfix.
struct Parser<'a> {
    toks: &'a [(usize, Token)],
    at: usize,
    end: usize,
}

impl Parser<'_> {
    #[inline]
    fn peek(&self) -> Option<Token> { self.toks.get(self.at).map(|&(_, t)| t) }

    #[inline]
    fn pos(&self) -> usize { self.toks.get(self.at).map_or(self.end, |&(p, _)| p) }

    #[inline]
    fn bump(&mut self) { self.at += 1; }

    fn alternation(&mut self) -> Result<Regex<char>> {
        let mut branches = vec![self.concatenation()?];
        while self.peek() == Some(Token::Pipe) {
            self.bump();
            branches.push(self.concatenation()?);
        }

        Ok(if branches.len() == 1 {
            branches.pop().unwrap_or_else(|| unreachable!())
        } else {
            Regex::Alt(branches)
        })
    }

    fn concatenation(&mut self) -> Result<Regex<char>> {
        let mut parts = Vec::new();
        loop {
            match self.peek() {
                None | Some(Token::Pipe | Token::RPar) => break,
                Some(Token::Star | Token::Plus | Token::Query) => {
                    return Err(Error::syntax(self.pos(), "dangling postfix operator"));
                },
                Some(_) => parts.push(self.postfix()?),
            }
        }

        // An empty run of parts is the empty string, so `a|` and `()` parse
        Ok(if parts.len() == 1 {
            parts.pop().unwrap_or_else(|| unreachable!())
        } else {
            Regex::Cat(parts)
        })
    }

    fn postfix(&mut self) -> Result<Regex<char>> {
        let mut re = self.atom()?;
        loop {
            match self.peek() {
                Some(Token::Star) => re = Regex::Star(re.into()),
                Some(Token::Plus) => re = Regex::Plus(re.into()),
                Some(Token::Query) => re = Regex::Opt(re.into()),
                _ => break,
            }
            self.bump();
        }

        Ok(re)
    }

    fn atom(&mut self) -> Result<Regex<char>> {
        match self.peek() {
            Some(Token::Lit(c)) => {
                self.bump();
                Ok(Regex::Lit(c))
            },
            Some(Token::Class(class)) => {
                self.bump();
                Ok(class.expand())
            },
            Some(Token::LPar) => {
                let open = self.pos();
                self.bump();
                let re = self.alternation()?;

                if self.peek() == Some(Token::RPar) {
                    self.bump();
                    Ok(re)
                } else {
                    Err(Error::syntax(open, "unmatched opening parenthesis"))
                }
            },
            _ => Err(Error::syntax(self.pos(), "expected literal, class, or group")),
        }
    }
}

pub fn parse(pattern: &str) -> Result<Regex<char>> {
    let toks = lex(pattern)?;
    let mut parser = Parser {
        toks: &toks,
        at: 0,
        end: pattern.len(),
    };

    let re = parser.alternation()?;
    match parser.peek() {
        None => Ok(re),
        Some(Token::RPar) => Err(Error::syntax(
            parser.pos(),
            "unmatched closing parenthesis",
        )),
        Some(_) => Err(Error::syntax(parser.pos(), "unexpected token")),
    }
}
