//! Errors of the textual front-end.
//!
//! Lex and parse failures carry the line and column of the offending input.
//! Codec failures surfacing through the assembler keep their own kind and
//! convert transparently.

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("lex error at {line}:{col}: {message}")]
	Lex { message: String, line: u32, col: u32 },

	#[error("parse error at {line}:{col}: {message}")]
	Parse { message: String, line: u32, col: u32 },

	/// A malformed construct noticed while building the class file, after
	/// the token positions are gone.
	#[error("assembler error: {message}")]
	Assemble { message: String },

	#[error("not implemented: {what}")]
	NotImplemented { what: String },

	#[error(transparent)]
	Class(#[from] classfile::error::Error),
}

impl Error {
	pub(crate) fn assemble(message: impl Into<String>) -> Error {
		Error::Assemble { message: message.into() }
	}
}

impl From<std::io::Error> for Error {
	fn from(source: std::io::Error) -> Error {
		Error::Class(classfile::error::Error::IoBad { source, pos: None })
	}
}
