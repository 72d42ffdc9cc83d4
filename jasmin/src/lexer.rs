//! Jasmin source text → token queue.

use crate::error::{Error, Result};
use std::collections::VecDeque;

/// What a [`Token`] is, before its text is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenType {
	Directive,
	Keyword,
	Identifier,
	StringLiteral,
	NumericLiteral,
	ArithmeticOperator,
	Newline,
	Colon,
	Dot,
	Bracket,
	Brace,
	Paren,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Token {
	pub ty: TokenType,
	pub value: String,
	/// 1-based source line.
	pub line: u32,
	/// 1-based column of the token's first character.
	pub col: u32,
	/// Byte offset of the token's first character.
	pub offset: usize,
}

/// Directive names; `.` immediately followed by one of these lexes as a
/// single [`TokenType::Directive`] token carrying the name.
pub const DIRECTIVES: &[&str] = &[
	"catch", "class", "end", "field", "implements", "interface", "limit",
	"line", "method", "source", "super", "throws", "var",
];

const KEYWORDS: &[&str] = &[
	"public", "private", "protected", "static", "volatile", "transient",
	"final", "abstract", "native", "synchronized",
];

fn is_identifier_start(ch: char) -> bool {
	ch.is_ascii_alphabetic() || matches!(ch, '_' | '$' | '<')
}

// Wide enough for descriptors like `(I)V` and `Ljava/lang/String;`, special
// names like `<init>` and file names like `Hello.j`. A `;` only opens a
// comment and a `.` only opens a directive at token start.
fn is_identifier_part(ch: char) -> bool {
	ch.is_ascii_alphanumeric()
		|| matches!(ch, '_' | '$' | '/' | '(' | ')' | '[' | ']' | '<' | '>' | ';' | '.')
}

pub struct Lexer<'a> {
	src: &'a str,
	pos: usize,
	line: u32,
	col: u32,
}

impl<'a> Lexer<'a> {
	/// Tokenizes the whole source.
	pub fn lex(source: &str) -> Result<VecDeque<Token>> {
		let mut lexer = Lexer { src: source, pos: 0, line: 1, col: 1 };

		let mut tokens = VecDeque::new();
		while lexer.has_more_after_skip() {
			tokens.push_back(lexer.lex_next()?);
		}
		Ok(tokens)
	}

	fn peek(&self) -> Option<char> {
		self.src[self.pos..].chars().next()
	}

	fn get(&mut self) -> Option<char> {
		let ch = self.peek()?;
		self.pos += ch.len_utf8();
		if ch == '\n' {
			self.line += 1;
			self.col = 1;
		} else {
			self.col += 1;
		}
		Some(ch)
	}

	fn has_more_after_skip(&mut self) -> bool {
		self.skip_whitespace_and_comments();
		self.peek().is_some()
	}

	fn skip_whitespace_and_comments(&mut self) {
		loop {
			match self.peek() {
				Some(ch) if ch.is_whitespace() && ch != '\n' => {
					self.get();
				},
				Some(';') => {
					// a line comment runs to the newline, which stays
					while self.peek().is_some_and(|ch| ch != '\n') {
						self.get();
					}
				},
				_ => return,
			}
		}
	}

	fn lex_next(&mut self) -> Result<Token> {
		let (line, col, offset) = (self.line, self.col, self.pos);
		let token = |ty, value: &str| Token { ty, value: value.to_owned(), line, col, offset };

		let Some(ch) = self.peek() else {
			return Err(self.error("no input left to lex"));
		};

		match ch {
			'.' => {
				self.get();
				self.lex_directive(line, col, offset)
			},
			':' => {
				self.get();
				Ok(token(TokenType::Colon, ":"))
			},
			'\n' => {
				self.get();
				Ok(token(TokenType::Newline, "\n"))
			},
			'+' | '-' | '*' | '/' => {
				self.get();
				Ok(token(TokenType::ArithmeticOperator, ch.encode_utf8(&mut [0; 4])))
			},
			'(' | ')' => {
				self.get();
				Ok(token(TokenType::Paren, ch.encode_utf8(&mut [0; 4])))
			},
			'[' | ']' => {
				self.get();
				Ok(token(TokenType::Bracket, ch.encode_utf8(&mut [0; 4])))
			},
			'{' | '}' => {
				self.get();
				Ok(token(TokenType::Brace, ch.encode_utf8(&mut [0; 4])))
			},
			'"' => self.lex_string_literal(line, col, offset),
			ch if ch.is_ascii_digit() => {
				let run = self.take_while(|ch| ch.is_ascii_digit());
				Ok(Token { ty: TokenType::NumericLiteral, value: run, line, col, offset })
			},
			ch if is_identifier_start(ch) => {
				let run = self.take_while(|ch| is_identifier_part(ch) && ch != ':');
				let ty = if KEYWORDS.contains(&run.as_str()) {
					TokenType::Keyword
				} else {
					TokenType::Identifier
				};
				Ok(Token { ty, value: run, line, col, offset })
			},
			ch => Err(self.error(format!("encountered unknown character {ch:?}"))),
		}
	}

	/// Called with the `.` already consumed.
	fn lex_directive(&mut self, line: u32, col: u32, offset: usize) -> Result<Token> {
		let name = self.take_while(|ch| ch.is_ascii_alphabetic());

		if DIRECTIVES.contains(&name.as_str()) {
			Ok(Token { ty: TokenType::Directive, value: name, line, col, offset })
		} else {
			Err(Error::Lex {
				message: format!("a dot must begin a directive, {name:?} is not one"),
				line,
				col,
			})
		}
	}

	fn lex_string_literal(&mut self, line: u32, col: u32, offset: usize) -> Result<Token> {
		self.get(); // opening quote

		let start = self.pos;
		while self.peek().is_some_and(|ch| ch != '"') {
			self.get();
		}
		let value = self.src[start..self.pos].to_owned();

		if self.get().is_none() {
			return Err(Error::Lex {
				message: "string literal is missing its closing '\"'".to_owned(),
				line,
				col,
			});
		}

		Ok(Token { ty: TokenType::StringLiteral, value, line, col, offset })
	}

	fn take_while(&mut self, keep: impl Fn(char) -> bool) -> String {
		let start = self.pos;
		while self.peek().is_some_and(&keep) {
			self.get();
		}
		self.src[start..self.pos].to_owned()
	}

	fn error(&self, message: impl Into<String>) -> Error {
		Error::Lex {
			message: message.into(),
			line: self.line,
			col: self.col,
		}
	}
}
