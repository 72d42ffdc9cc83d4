//! End-to-end checks of the parse/serialize round trip on hand-built inputs.

use classfile::error::ErrorKind;
use classfile::{parse_class_file, serialize_class_file, AttributeInfo, PoolEntry};
use pretty_assertions::assert_eq;
use std::io::Cursor;

/// Builds big-endian byte streams for the inputs below.
struct Bytes(Vec<u8>);

impl Bytes {
	fn new() -> Bytes {
		Bytes(Vec::new())
	}
	fn u8(mut self, value: u8) -> Bytes {
		self.0.push(value);
		self
	}
	fn u16(mut self, value: u16) -> Bytes {
		self.0.extend_from_slice(&value.to_be_bytes());
		self
	}
	fn u32(mut self, value: u32) -> Bytes {
		self.0.extend_from_slice(&value.to_be_bytes());
		self
	}
	fn raw(mut self, bytes: &[u8]) -> Bytes {
		self.0.extend_from_slice(bytes);
		self
	}
	/// A whole `Utf8` constant: tag, length, bytes.
	fn utf8(self, s: &str) -> Bytes {
		self.u8(1).u16(s.len() as u16).raw(s.as_bytes())
	}
	fn header(self, pool_count: u16) -> Bytes {
		self.u32(0xCAFEBABE).u16(0).u16(52).u16(pool_count)
	}
}

fn roundtrip(bytes: &[u8]) -> classfile::ClassFile {
	let class = parse_class_file(&mut Cursor::new(bytes)).unwrap();

	let mut out = Vec::new();
	serialize_class_file(&mut out, &class).unwrap();
	assert_eq!(out.as_slice(), bytes);

	class
}

#[test]
fn minimal_class_with_empty_pool() {
	let bytes: &[u8] = &[
		0xCA, 0xFE, 0xBA, 0xBE, 0x00, 0x00, 0x00, 0x34, 0x00, 0x01, 0x00, 0x21,
		0x00, 0x01, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00,
	];

	let class = roundtrip(bytes);

	assert_eq!(class.magic, 0xCAFEBABE);
	assert_eq!(class.minor_version, 0);
	assert_eq!(class.major_version, 52);
	assert_eq!(class.const_pool.count(), 1);
	assert_eq!(class.const_pool.size(), 0);
	assert_eq!(class.access_flags, 0x0021);
	assert_eq!(class.this_class, 1);
	assert_eq!(class.super_class, 1);
	assert!(class.interfaces.is_empty());
	assert!(class.fields.is_empty());
	assert!(class.methods.is_empty());
	assert!(class.attributes.is_empty());
}

#[test]
fn class_with_code_attribute() {
	let bytes = Bytes::new()
		.header(6)
		.utf8("Code") // 1
		.utf8("main") // 2
		.utf8("()V") // 3
		.u8(7).u16(5) // 4: Class -> 5
		.utf8("Foo") // 5
		.u16(0x0021) // access
		.u16(4) // this
		.u16(0) // super
		.u16(0) // interfaces
		.u16(0) // fields
		.u16(1) // methods
		.u16(0x0009).u16(2).u16(3).u16(1) // main, one attribute
		.u16(1).u32(16) // Code, body length
		.u16(1).u16(1) // max_stack, max_locals
		.u32(4).raw(&[0x03, 0x10, 0x05, 0xB1]) // iconst_0, bipush 5, return
		.u16(0) // no handlers
		.u16(0) // no nested attributes
		.u16(0) // no class attributes
		.0;

	let class = roundtrip(&bytes);

	assert_eq!(class.const_pool.lookup_string(4).unwrap(), "Foo");
	assert_eq!(class.methods.len(), 1);

	let AttributeInfo::Code { max_stack, max_locals, ref code, .. } =
		class.methods[0].attributes[0].info
	else {
		panic!("expected a Code attribute, got {:?}", class.methods[0].attributes[0]);
	};

	assert_eq!((max_stack, max_locals), (1, 1));
	let mnemonics: Vec<_> = code.iter().map(|i| i.mnemonic()).collect();
	assert_eq!(mnemonics, ["iconst_0", "bipush", "return"]);
	assert_eq!(code[1].get_operand(0).unwrap(), 5);
}

#[test]
fn long_constant_spans_two_wire_slots() {
	let bytes = Bytes::new()
		.header(4)
		.utf8("X") // 1
		.u8(5).u32(1).u32(2) // 2: Long (slot 3 is its placeholder)
		.u16(0).u16(0).u16(0)
		.u16(0).u16(0).u16(0).u16(0)
		.0;

	let class = roundtrip(&bytes);

	let pool = &class.const_pool;
	assert_eq!(pool.size(), 3);
	assert_eq!(pool.count(), 4);
	assert!(matches!(pool.get(2), Some(PoolEntry::Long { high_bytes: 1, low_bytes: 2 })));
	assert_eq!(pool.get(3), None);
	assert_eq!(pool.entry(3).unwrap_err().kind(), ErrorKind::NullSlot);
}

#[test]
fn unknown_attribute_falls_back_to_raw() {
	let mystery = [0xDE, 0xAD, 0xBE, 0xEF, 0x42];

	let bytes = Bytes::new()
		.header(4)
		.utf8("Mystery") // 1
		.utf8("f") // 2
		.utf8("I") // 3
		.u16(0x0021).u16(0).u16(0)
		.u16(0) // interfaces
		.u16(1) // fields
		.u16(0x0002).u16(2).u16(3).u16(1) // private f I, one attribute
		.u16(1).u32(mystery.len() as u32).raw(&mystery)
		.u16(0).u16(0)
		.0;

	let class = roundtrip(&bytes);

	let AttributeInfo::Raw { ref bytes } = class.fields[0].attributes[0].info else {
		panic!("expected a Raw attribute, got {:?}", class.fields[0].attributes[0]);
	};
	assert_eq!(bytes.as_slice(), mystery);
}

#[test]
fn complex_instruction_is_rejected() {
	let bytes = Bytes::new()
		.header(2)
		.utf8("Code") // 1
		.u16(0).u16(0).u16(0)
		.u16(0).u16(0)
		.u16(1) // one method
		.u16(0).u16(0).u16(0).u16(1)
		.u16(1).u32(13) // Code
		.u16(0).u16(0)
		.u32(1).u8(0xAA) // a lone tableswitch
		.u16(0).u16(0)
		.u16(0)
		.0;

	let err = parse_class_file(&mut Cursor::new(&bytes)).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::NotImplemented);
	assert!(err.to_string().contains("tableswitch"), "{err}");
}

#[test]
fn code_length_mismatch_is_fatal() {
	let bytes = Bytes::new()
		.header(2)
		.utf8("Code")
		.u16(0).u16(0).u16(0)
		.u16(0).u16(0)
		.u16(1)
		.u16(0).u16(0).u16(0).u16(1)
		.u16(1).u32(15)
		.u16(0).u16(0)
		// declares two code bytes, but the second instruction is a
		// two-byte bipush, so three bytes get consumed
		.u32(2).raw(&[0x03, 0x10, 0x05])
		.u16(0).u16(0)
		.u16(0)
		.0;

	let err = parse_class_file(&mut Cursor::new(&bytes)).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::LengthMismatch);
}

#[test]
fn declared_attribute_length_must_match() {
	let bytes = Bytes::new()
		.header(3)
		.utf8("ConstantValue") // 1
		.u8(3).u32(7) // 2: Integer
		.u16(0).u16(0).u16(0)
		.u16(0)
		.u16(1) // one field
		.u16(0).u16(0).u16(0).u16(1)
		.u16(1).u32(4) // ConstantValue must declare 2
		.u16(2)
		.u16(0).u16(0)
		.u16(0)
		.0;

	let err = parse_class_file(&mut Cursor::new(&bytes)).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::LengthMismatch);
}

#[test]
fn unknown_pool_tag_is_rejected_with_position() {
	let bytes = Bytes::new().header(2).u8(2).u16(0).0;

	let err = parse_class_file(&mut Cursor::new(&bytes)).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::UnknownTag);
	// the tag byte sits right after the 10-byte header
	assert_eq!(err.position(), Some(10));
	assert!(err.to_string().contains("while parsing constant 1"), "{err}");
}

#[test]
fn truncated_input_reports_a_short_read() {
	let bytes = [0xCA, 0xFE, 0xBA];

	let err = parse_class_file(&mut Cursor::new(&bytes)).unwrap_err();
	assert_eq!(err.kind(), ErrorKind::IoShort);
}

#[test]
fn every_pool_tag_roundtrips() {
	let bytes = Bytes::new()
		.header(18)
		.utf8("HelloWorld") // 1
		.u8(3).u32(0xFFFF_FFFF) // 2: Integer
		.u8(4).u32(0x4048_F5C3) // 3: Float
		.u8(5).u32(0x0000_0001).u32(0x0000_0002) // 4: Long (+5)
		.u8(6).u32(0x4009_21FB).u32(0x5444_2D18) // 6: Double (+7)
		.u8(7).u16(1) // 8: Class
		.u8(8).u16(1) // 9: String
		.u8(9).u16(8).u16(12) // 10: FieldRef
		.u8(10).u16(8).u16(12) // 11: MethodRef
		.u8(12).u16(1).u16(13) // 12: NameAndType
		.utf8("()V") // 13
		.u8(11).u16(8).u16(12) // 14: InterfaceMethodRef
		.u8(15).u8(5).u16(11) // 15: MethodHandle
		.u8(16).u16(13) // 16: MethodType
		.u8(18).u16(0).u16(12) // 17: InvokeDynamic
		.u16(0x0021).u16(8).u16(0)
		.u16(0).u16(0).u16(0).u16(0)
		.0;

	let class = roundtrip(&bytes);

	assert_eq!(class.const_pool.size(), 17);
	assert_eq!(class.const_pool.lookup_string(9).unwrap(), "HelloWorld");
	assert_eq!(class.const_pool.lookup_string(11).unwrap(), "HelloWorld");
	assert_eq!(class.const_pool.lookup_descriptor(17).unwrap(), "()V");
}
