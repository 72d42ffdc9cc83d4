//! Token queue → syntax tree.

use crate::ast::{Arg, Node};
use crate::error::{Error, Result};
use crate::lexer::{Token, TokenType};
use std::collections::VecDeque;

pub struct Parser {
	tokens: VecDeque<Token>,
	// position of the last popped token, for errors at end of input
	last_line: u32,
	last_col: u32,
}

impl Parser {
	pub fn new(tokens: VecDeque<Token>) -> Parser {
		Parser { tokens, last_line: 1, last_col: 1 }
	}

	pub fn parse_all(mut self) -> Result<Vec<Node>> {
		let mut nodes = Vec::new();
		while self.has_more_after_skip() {
			nodes.push(self.parse_next()?);
		}
		Ok(nodes)
	}

	/// Newlines separate top-level nodes but carry no content of their own,
	/// so only non-newline tokens count as remaining input.
	fn has_more_after_skip(&mut self) -> bool {
		self.skip_newlines();
		!self.tokens.is_empty()
	}

	fn skip_newlines(&mut self) {
		while self.front_is(TokenType::Newline) {
			self.tokens.pop_front();
		}
	}

	fn front_is(&self, ty: TokenType) -> bool {
		matches!(self.tokens.front(), Some(token) if token.ty == ty)
	}

	fn parse_next(&mut self) -> Result<Node> {
		self.skip_newlines();

		if self.front_is(TokenType::Directive) {
			return self.parse_directive();
		}

		let first = self.pop()?;
		if self.front_is(TokenType::Colon) {
			self.parse_label(first)
		} else {
			self.parse_instruction(first)
		}
	}

	fn parse_directive(&mut self) -> Result<Node> {
		let directive = self.pop()?;

		// every remaining token on the line becomes a parameter string
		let mut params = Vec::new();
		while let Some(front) = self.tokens.front() {
			if front.ty == TokenType::Newline {
				break;
			}
			params.push(self.pop()?.value);
		}
		self.tokens.pop_front(); // the newline, unless the input just ended

		Ok(Node::Directive { name: directive.value, params })
	}

	fn parse_label(&mut self, name: Token) -> Result<Node> {
		self.expect(TokenType::Colon)?;
		self.expect(TokenType::Newline)?;

		// the body runs until a blank line; each nested node eats its own
		// trailing newline, so a Newline at the front means two in a row
		let mut body = Vec::new();
		while let Some(front) = self.tokens.front() {
			if front.ty == TokenType::Newline {
				break;
			}
			body.push(self.parse_next()?);
		}
		self.tokens.pop_front();

		Ok(Node::Label { name: name.value, body })
	}

	fn parse_instruction(&mut self, name: Token) -> Result<Node> {
		let mut args = Vec::new();
		while let Some(front) = self.tokens.front() {
			if front.ty == TokenType::Newline {
				break;
			}
			args.push(self.parse_arg()?);
		}
		self.tokens.pop_front();

		Ok(Node::Instruction { name: name.value, args })
	}

	fn parse_arg(&mut self) -> Result<Arg> {
		let token = self.pop()?;
		match token.ty {
			TokenType::Identifier | TokenType::StringLiteral => Ok(Arg::Str(token.value)),
			TokenType::NumericLiteral => Ok(Arg::Num(numeric_value(&token)?)),
			TokenType::ArithmeticOperator if token.value == "-" => {
				let number = self.pop()?;
				if number.ty != TokenType::NumericLiteral {
					return Err(Error::Parse {
						message: format!("expected a number after '-', found {:?}", number.ty),
						line: number.line,
						col: number.col,
					});
				}
				Ok(Arg::Num(-numeric_value(&number)?))
			},
			ty => Err(Error::Parse {
				message: format!("cannot use a {ty:?} token as an instruction argument"),
				line: token.line,
				col: token.col,
			}),
		}
	}

	fn pop(&mut self) -> Result<Token> {
		let Some(token) = self.tokens.pop_front() else {
			return Err(Error::Parse {
				message: "ran out of tokens".to_owned(),
				line: self.last_line,
				col: self.last_col,
			});
		};
		self.last_line = token.line;
		self.last_col = token.col;
		Ok(token)
	}

	fn expect(&mut self, ty: TokenType) -> Result<Token> {
		let token = self.pop()?;
		if token.ty != ty {
			return Err(Error::Parse {
				message: format!("expected a {ty:?} token, found {:?}", token.ty),
				line: token.line,
				col: token.col,
			});
		}
		Ok(token)
	}
}

fn numeric_value(token: &Token) -> Result<f64> {
	token.value.parse().map_err(|_| Error::Parse {
		message: format!("{:?} is not a number", token.value),
		line: token.line,
		col: token.col,
	})
}
