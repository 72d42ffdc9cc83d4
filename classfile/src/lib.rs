//! A crate for reading and writing [Java class files](https://docs.oracle.com/javase/specs/jvms/se8/html/jvms-4.html).
//!
//! [`parse_class_file`] decodes the big-endian byte stream into a [`ClassFile`]
//! value tree; [`serialize_class_file`] writes the tree back out. For every
//! input the parser accepts, serializing the parsed tree reproduces the input
//! byte for byte.
//!
//! ```
//! use std::io::Cursor;
//!
//! // The smallest parseable class file: empty pool, no members.
//! let bytes: &[u8] = &[
//! 	0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34,
//! 	0x00, 0x01, 0x00, 0x21, 0x00, 0x01, 0x00, 0x01,
//! 	0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
//! ];
//!
//! let class = classfile::parse_class_file(&mut Cursor::new(bytes)).unwrap();
//! assert_eq!(class.major_version, 52);
//!
//! let mut out = Vec::new();
//! classfile::serialize_class_file(&mut out, &class).unwrap();
//! assert_eq!(out.as_slice(), bytes);
//! ```

pub mod error;
pub mod flags;
mod attribute;
mod class;
mod insn;
mod parser;
mod pool;
mod serializer;

pub use attribute::{attribute_name, Attribute, AttributeInfo, ExceptionHandler};
pub use class::{ClassFile, FieldMethodInfo, MAGIC};
pub use insn::{mnemonic_from_opcode, opcode_from_mnemonic, Instruction, OperandType, MAX_OPERANDS};
pub use parser::parse_class_file;
pub use pool::{tag, ConstantPool, PoolEntry};
pub use serializer::serialize_class_file;

use error::{Error, Result};
use std::io::{Read, Seek, Write};

/// Big-endian primitive reads over a seekable byte source.
///
/// A short read reports [`Error::IoShort`] with the byte offset the source
/// was at; any other fault reports [`Error::IoBad`].
pub(crate) trait ClassRead {
	fn marker(&mut self) -> Result<u64>;

	fn read_n<const N: usize>(&mut self) -> Result<[u8; N]>;
	fn read_u8(&mut self) -> Result<u8> {
		Ok(u8::from_be_bytes(self.read_n()?))
	}
	fn read_u16(&mut self) -> Result<u16> {
		Ok(u16::from_be_bytes(self.read_n()?))
	}
	fn read_u32(&mut self) -> Result<u32> {
		Ok(u32::from_be_bytes(self.read_n()?))
	}
	fn read_i8(&mut self) -> Result<i8> {
		Ok(i8::from_be_bytes(self.read_n()?))
	}
	fn read_i16(&mut self) -> Result<i16> {
		Ok(i16::from_be_bytes(self.read_n()?))
	}
	fn read_i32(&mut self) -> Result<i32> {
		Ok(i32::from_be_bytes(self.read_n()?))
	}

	fn read_u16_as_usize(&mut self) -> Result<usize> {
		Ok(self.read_u16()? as usize)
	}
	fn read_u8_vec(&mut self, size: usize) -> Result<Vec<u8>>;
	fn read_vec<T, S, E>(&mut self, get_size: S, mut get_element: E) -> Result<Vec<T>>
	where
		S: FnOnce(&mut Self) -> Result<usize>,
		E: FnMut(&mut Self) -> Result<T>,
	{
		let size = get_size(self)?;
		let mut vec = Vec::with_capacity(size);
		for _ in 0..size {
			vec.push(get_element(self)?);
		}
		Ok(vec)
	}
}

impl<T: Read + Seek> ClassRead for T {
	fn marker(&mut self) -> Result<u64> {
		self.stream_position()
			.map_err(|source| Error::IoBad { source, pos: None })
	}

	fn read_n<const N: usize>(&mut self) -> Result<[u8; N]> {
		let mut buf = [0u8; N];
		if let Err(source) = self.read_exact(&mut buf) {
			let pos = self.stream_position().unwrap_or(0);
			return Err(match source.kind() {
				std::io::ErrorKind::UnexpectedEof => Error::IoShort { wanted: N, pos },
				_ => Error::IoBad { source, pos: Some(pos) },
			});
		}
		Ok(buf)
	}

	fn read_u8_vec(&mut self, size: usize) -> Result<Vec<u8>> {
		let mut vec = vec![0u8; size];
		if let Err(source) = self.read_exact(&mut vec) {
			let pos = self.stream_position().unwrap_or(0);
			return Err(match source.kind() {
				std::io::ErrorKind::UnexpectedEof => Error::IoShort { wanted: size, pos },
				_ => Error::IoBad { source, pos: Some(pos) },
			});
		}
		Ok(vec)
	}
}

/// Big-endian primitive writes. The sink needs no position tracking.
pub(crate) trait ClassWrite {
	fn write_u8(&mut self, value: u8) -> Result<()> {
		self.write_u8_slice(&[value])
	}
	fn write_u16(&mut self, value: u16) -> Result<()> {
		self.write_u8_slice(&value.to_be_bytes())
	}
	fn write_u32(&mut self, value: u32) -> Result<()> {
		self.write_u8_slice(&value.to_be_bytes())
	}
	fn write_i8(&mut self, value: i8) -> Result<()> {
		self.write_u8_slice(&value.to_be_bytes())
	}
	fn write_i16(&mut self, value: i16) -> Result<()> {
		self.write_u8_slice(&value.to_be_bytes())
	}
	fn write_i32(&mut self, value: i32) -> Result<()> {
		self.write_u8_slice(&value.to_be_bytes())
	}

	fn write_usize_as_u16(&mut self, value: usize) -> Result<()> {
		let value = u16::try_from(value).map_err(|_| {
			Error::length_mismatch(format!("{value} does not fit into a u16 length field"))
		})?;
		self.write_u16(value)
	}

	fn write_u8_slice(&mut self, buf: &[u8]) -> Result<()>;
	fn write_slice<'t, T>(
		&mut self,
		slice: &'t [T],
		put_size: impl FnOnce(&mut Self, usize) -> Result<()>,
		mut put_element: impl FnMut(&mut Self, &'t T) -> Result<()>,
	) -> Result<()> {
		put_size(self, slice.len())?;
		for value in slice {
			put_element(self, value)?;
		}
		Ok(())
	}
}

impl<T: Write> ClassWrite for T {
	fn write_u8_slice(&mut self, buf: &[u8]) -> Result<()> {
		self.write_all(buf)
			.map_err(|source| Error::IoBad { source, pos: None })
	}
}

#[cfg(test)]
mod testing {
	use super::{ClassRead, ClassWrite};
	use crate::error::ErrorKind;
	use std::io::Cursor;

	#[test]
	fn reads_are_big_endian() {
		let mut cursor = Cursor::new(vec![0x12, 0x34, 0x56, 0x78, 0xFF]);
		assert_eq!(cursor.read_u16().unwrap(), 0x1234);
		assert_eq!(cursor.read_u16().unwrap(), 0x5678);
		assert_eq!(cursor.read_i8().unwrap(), -1);
	}

	#[test]
	fn short_read_reports_offset() {
		let mut cursor = Cursor::new(vec![0x00, 0x01]);
		cursor.read_u16().unwrap();

		let err = cursor.read_u32().unwrap_err();
		assert_eq!(err.kind(), ErrorKind::IoShort);
		assert_eq!(err.position(), Some(2));
	}

	#[test]
	fn writes_mirror_reads() {
		let mut out = Vec::new();
		out.write_u32(0xCAFEBABE).unwrap();
		out.write_i16(-2).unwrap();
		assert_eq!(out, [0xCA, 0xFE, 0xBA, 0xBE, 0xFF, 0xFE]);
	}

	#[test]
	fn oversized_counts_are_rejected() {
		let mut out = Vec::new();
		let err = out.write_usize_as_u16(70_000).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::LengthMismatch);
	}
}
