//! The error type of the codec.
//!
//! Every fallible operation in this crate returns [`Result`]. Errors are
//! returned, never panicked across an API boundary, and each layer wraps the
//! inner error with a short context string via [`ErrorContext`], so a failure
//! deep inside a nested attribute reads like
//! `while parsing method 3: while parsing attribute 0: short read at byte 0x91`.

pub type Result<T, E = Error> = std::result::Result<T, E>;

/// The tag of an [`Error`], for checking what went wrong without
/// destructuring variant payloads. [`Error::kind`] sees through any number of
/// [`Error::Context`] wrappers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
	IoShort,
	IoBad,
	UnknownTag,
	UnknownOpcode,
	UnknownMnemonic,
	NotImplemented,
	OutOfBounds,
	NullSlot,
	TypeMismatch,
	UnresolvableName,
	UnresolvableDescriptor,
	CyclicReference,
	LengthMismatch,
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// The byte source ran out before the requested number of bytes.
	#[error("short read at byte {pos:#x}: wanted {wanted} more byte(s)")]
	IoShort { wanted: usize, pos: u64 },

	/// An underlying I/O fault other than a short read.
	#[error("i/o fault{}: {source}", fmt_pos(.pos))]
	IoBad {
		#[source]
		source: std::io::Error,
		pos: Option<u64>,
	},

	/// A constant pool tag byte outside the enumerated set.
	#[error("unknown constant pool tag {tag}{}", fmt_pos(.pos))]
	UnknownTag { tag: u8, pos: Option<u64> },

	/// An opcode byte that is not in the instruction catalog.
	#[error("unknown opcode {opcode:#04x}{}", fmt_pos(.pos))]
	UnknownOpcode { opcode: u8, pos: Option<u64> },

	/// A mnemonic that maps to no opcode.
	#[error("unknown opcode mnemonic {mnemonic:?}")]
	UnknownMnemonic { mnemonic: String },

	/// A construct the codec recognizes but does not handle, like the
	/// `tableswitch`/`lookupswitch`/`wide` instructions.
	#[error("not implemented: {what}")]
	NotImplemented { what: String },

	#[error("{what}: index {index} is out of bounds (limit {limit})")]
	OutOfBounds {
		what: &'static str,
		index: usize,
		limit: usize,
	},

	/// Access to the placeholder slot that follows a `Long` or `Double`.
	#[error("pool index {index} is the unusable slot after a long or double")]
	NullSlot { index: u16 },

	#[error("expected {expected}, found {found}")]
	TypeMismatch {
		expected: &'static str,
		found: &'static str,
	},

	#[error("cannot resolve a name through pool index {index}: {detail}")]
	UnresolvableName { index: u16, detail: String },

	#[error("cannot resolve a descriptor through pool index {index}: {detail}")]
	UnresolvableDescriptor { index: u16, detail: String },

	/// A name or descriptor resolution chain revisited a pool index.
	#[error("resolution chain visits pool index {index} twice")]
	CyclicReference { index: u16 },

	/// A declared length disagrees with the measured one, or a recomputed
	/// length does not fit its wire field.
	#[error("{message}")]
	LengthMismatch { message: String },

	/// An inner error wrapped with caller context.
	#[error("{context}: {source}")]
	Context {
		context: String,
		#[source]
		source: Box<Error>,
	},
}

impl Error {
	pub fn kind(&self) -> ErrorKind {
		match self {
			Error::IoShort { .. } => ErrorKind::IoShort,
			Error::IoBad { .. } => ErrorKind::IoBad,
			Error::UnknownTag { .. } => ErrorKind::UnknownTag,
			Error::UnknownOpcode { .. } => ErrorKind::UnknownOpcode,
			Error::UnknownMnemonic { .. } => ErrorKind::UnknownMnemonic,
			Error::NotImplemented { .. } => ErrorKind::NotImplemented,
			Error::OutOfBounds { .. } => ErrorKind::OutOfBounds,
			Error::NullSlot { .. } => ErrorKind::NullSlot,
			Error::TypeMismatch { .. } => ErrorKind::TypeMismatch,
			Error::UnresolvableName { .. } => ErrorKind::UnresolvableName,
			Error::UnresolvableDescriptor { .. } => ErrorKind::UnresolvableDescriptor,
			Error::CyclicReference { .. } => ErrorKind::CyclicReference,
			Error::LengthMismatch { .. } => ErrorKind::LengthMismatch,
			Error::Context { source, .. } => source.kind(),
		}
	}

	/// The byte offset recorded closest to the failure, if any.
	pub fn position(&self) -> Option<u64> {
		match self {
			Error::IoShort { pos, .. } => Some(*pos),
			Error::IoBad { pos, .. } => *pos,
			Error::UnknownTag { pos, .. } => *pos,
			Error::UnknownOpcode { pos, .. } => *pos,
			Error::Context { source, .. } => source.position(),
			_ => None,
		}
	}

	pub(crate) fn not_implemented(what: impl Into<String>) -> Error {
		Error::NotImplemented { what: what.into() }
	}

	pub(crate) fn length_mismatch(message: impl Into<String>) -> Error {
		Error::LengthMismatch { message: message.into() }
	}
}

fn fmt_pos(pos: &Option<u64>) -> String {
	match pos {
		Some(pos) => format!(" at byte {pos:#x}"),
		None => String::new(),
	}
}

/// Adds caller context to an error, keeping its kind and position.
pub trait ErrorContext<T> {
	fn context(self, context: impl Into<String>) -> Result<T>;
	fn with_context(self, f: impl FnOnce() -> String) -> Result<T>;
}

impl<T> ErrorContext<T> for Result<T> {
	fn context(self, context: impl Into<String>) -> Result<T> {
		self.map_err(|source| Error::Context {
			context: context.into(),
			source: Box::new(source),
		})
	}

	fn with_context(self, f: impl FnOnce() -> String) -> Result<T> {
		self.map_err(|source| Error::Context {
			context: f(),
			source: Box::new(source),
		})
	}
}

#[cfg(test)]
mod testing {
	use super::{Error, ErrorContext, ErrorKind, Result};

	#[test]
	fn context_keeps_kind_and_position() {
		let inner: Result<()> = Err(Error::IoShort { wanted: 4, pos: 0x20 });
		let wrapped = inner
			.context("while parsing constant 3")
			.context("while parsing constant pool")
			.unwrap_err();

		assert_eq!(wrapped.kind(), ErrorKind::IoShort);
		assert_eq!(wrapped.position(), Some(0x20));
		assert_eq!(
			wrapped.to_string(),
			"while parsing constant pool: while parsing constant 3: \
			short read at byte 0x20: wanted 4 more byte(s)"
		);
	}

	#[test]
	fn positions_are_optional() {
		let err = Error::UnknownMnemonic { mnemonic: "retrun".to_owned() };
		assert_eq!(err.position(), None);
		assert_eq!(err.kind(), ErrorKind::UnknownMnemonic);
	}
}
