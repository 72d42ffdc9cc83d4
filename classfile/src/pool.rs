//! The constant pool: a 1-indexed table of tagged entries.

use crate::error::{Error, ErrorContext, Result};

/// Tag bytes of the constant kinds, jvms-4.4.
pub mod tag {
	pub const UTF8: u8 = 1;
	pub const INTEGER: u8 = 3;
	pub const FLOAT: u8 = 4;
	pub const LONG: u8 = 5;
	pub const DOUBLE: u8 = 6;
	pub const CLASS: u8 = 7;
	pub const STRING: u8 = 8;
	pub const FIELD_REF: u8 = 9;
	pub const METHOD_REF: u8 = 10;
	pub const INTERFACE_METHOD_REF: u8 = 11;
	pub const NAME_AND_TYPE: u8 = 12;
	pub const METHOD_HANDLE: u8 = 15;
	pub const METHOD_TYPE: u8 = 16;
	pub const INVOKE_DYNAMIC: u8 = 18;
}

/// One `cp_info` entry.
///
/// `Utf8` keeps the raw bytes read off the wire. Modified UTF-8 is never
/// normalized, so writing an entry back reproduces the input exactly even for
/// strings Rust would not accept.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum PoolEntry {
	Utf8 { bytes: Vec<u8> },
	Integer { bytes: u32 },
	Float { bytes: u32 },
	Long { high_bytes: u32, low_bytes: u32 },
	Double { high_bytes: u32, low_bytes: u32 },
	Class { name_index: u16 },
	String { string_index: u16 },
	FieldRef { class_index: u16, name_and_type_index: u16 },
	MethodRef { class_index: u16, name_and_type_index: u16 },
	InterfaceMethodRef { class_index: u16, name_and_type_index: u16 },
	NameAndType { name_index: u16, descriptor_index: u16 },
	MethodHandle { reference_kind: u8, reference_index: u16 },
	MethodType { descriptor_index: u16 },
	InvokeDynamic { bootstrap_method_attr_index: u16, name_and_type_index: u16 },
}

impl PoolEntry {
	pub fn tag(&self) -> u8 {
		match self {
			PoolEntry::Utf8 { .. } => tag::UTF8,
			PoolEntry::Integer { .. } => tag::INTEGER,
			PoolEntry::Float { .. } => tag::FLOAT,
			PoolEntry::Long { .. } => tag::LONG,
			PoolEntry::Double { .. } => tag::DOUBLE,
			PoolEntry::Class { .. } => tag::CLASS,
			PoolEntry::String { .. } => tag::STRING,
			PoolEntry::FieldRef { .. } => tag::FIELD_REF,
			PoolEntry::MethodRef { .. } => tag::METHOD_REF,
			PoolEntry::InterfaceMethodRef { .. } => tag::INTERFACE_METHOD_REF,
			PoolEntry::NameAndType { .. } => tag::NAME_AND_TYPE,
			PoolEntry::MethodHandle { .. } => tag::METHOD_HANDLE,
			PoolEntry::MethodType { .. } => tag::METHOD_TYPE,
			PoolEntry::InvokeDynamic { .. } => tag::INVOKE_DYNAMIC,
		}
	}

	pub fn tag_name(&self) -> &'static str {
		match self {
			PoolEntry::Utf8 { .. } => "Utf8",
			PoolEntry::Integer { .. } => "Integer",
			PoolEntry::Float { .. } => "Float",
			PoolEntry::Long { .. } => "Long",
			PoolEntry::Double { .. } => "Double",
			PoolEntry::Class { .. } => "Class",
			PoolEntry::String { .. } => "String",
			PoolEntry::FieldRef { .. } => "FieldRef",
			PoolEntry::MethodRef { .. } => "MethodRef",
			PoolEntry::InterfaceMethodRef { .. } => "InterfaceMethodRef",
			PoolEntry::NameAndType { .. } => "NameAndType",
			PoolEntry::MethodHandle { .. } => "MethodHandle",
			PoolEntry::MethodType { .. } => "MethodType",
			PoolEntry::InvokeDynamic { .. } => "InvokeDynamic",
		}
	}

	/// Long and double entries occupy two pool slots.
	pub fn is_wide(&self) -> bool {
		matches!(self, PoolEntry::Long { .. } | PoolEntry::Double { .. })
	}

	pub fn as_utf8(&self) -> Result<&[u8]> {
		let PoolEntry::Utf8 { bytes } = self else {
			return Err(self.mismatch("Utf8"));
		};
		Ok(bytes)
	}

	pub fn as_class(&self) -> Result<u16> {
		let PoolEntry::Class { name_index } = self else {
			return Err(self.mismatch("Class"));
		};
		Ok(*name_index)
	}

	pub fn as_name_and_type(&self) -> Result<(u16, u16)> {
		let PoolEntry::NameAndType { name_index, descriptor_index } = self else {
			return Err(self.mismatch("NameAndType"));
		};
		Ok((*name_index, *descriptor_index))
	}

	fn mismatch(&self, expected: &'static str) -> Error {
		Error::TypeMismatch {
			expected,
			found: self.tag_name(),
		}
	}
}

/// A list container of pool entries that uses 1-based indexing.
///
/// Slot 0 is reserved and unusable; the slot after every long or double holds
/// a placeholder no accessor will hand out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConstantPool {
	// inner[0] is the reserved zero slot, placeholders are `None`.
	inner: Vec<Option<PoolEntry>>,
}

impl Default for ConstantPool {
	fn default() -> ConstantPool {
		ConstantPool::new()
	}
}

impl ConstantPool {
	pub fn new() -> ConstantPool {
		ConstantPool { inner: vec![None] }
	}

	pub fn reserve(&mut self, n: u16) {
		self.inner.reserve(n as usize);
	}

	/// Appends an entry; a long or double is followed by its placeholder slot.
	pub fn add(&mut self, entry: PoolEntry) {
		let wide = entry.is_wide();
		self.inner.push(Some(entry));
		if wide {
			self.inner.push(None);
		}
	}

	/// Number of occupied slots, placeholders included.
	pub fn size(&self) -> u16 {
		(self.inner.len() - 1) as u16
	}

	/// The on-wire `constant_pool_count`, which is [`ConstantPool::size`] plus one.
	pub fn count(&self) -> u16 {
		self.inner.len() as u16
	}

	/// Returns `None` for index zero, out-of-bounds indices and placeholder slots.
	pub fn get(&self, index: u16) -> Option<&PoolEntry> {
		if index == 0 {
			return None;
		}
		self.inner.get(index as usize)?.as_ref()
	}

	/// Like [`ConstantPool::get`], but telling the three failures apart.
	pub fn entry(&self, index: u16) -> Result<&PoolEntry> {
		if index == 0 || index as usize >= self.inner.len() {
			return Err(Error::OutOfBounds {
				what: "constant pool",
				index: index as usize,
				limit: self.size() as usize,
			});
		}
		self.inner[index as usize]
			.as_ref()
			.ok_or(Error::NullSlot { index })
	}

	/// The non-placeholder entries, in pool order.
	pub fn iter(&self) -> impl Iterator<Item = &PoolEntry> {
		self.inner.iter().flatten()
	}

	/// All addressable slots with their indices; placeholders come as `None`.
	pub fn slots(&self) -> impl Iterator<Item = (u16, Option<&PoolEntry>)> {
		self.inner
			.iter()
			.enumerate()
			.skip(1)
			.map(|(index, slot)| (index as u16, slot.as_ref()))
	}

	/// The text of the `Utf8` entry at `index`.
	pub fn get_utf8(&self, index: u16) -> Result<&str> {
		let bytes = self.entry(index)?.as_utf8().pool_context(index)?;
		std::str::from_utf8(bytes).map_err(|_| Error::UnresolvableName {
			index,
			detail: "the Utf8 entry does not decode as UTF-8".to_owned(),
		})
	}

	pub fn get_class(&self, index: u16) -> Result<u16> {
		self.entry(index)?.as_class().pool_context(index)
	}

	pub fn get_name_and_type(&self, index: u16) -> Result<(u16, u16)> {
		self.entry(index)?.as_name_and_type().pool_context(index)
	}

	/// Resolves `index` to the text of a `Utf8` entry by following name edges:
	/// `String` → its string, `Class` → its name, `NameAndType` → its name,
	/// and the four refs → their `NameAndType`'s name.
	pub fn lookup_string(&self, index: u16) -> Result<&str> {
		self.resolve_utf8(index, false)
	}

	/// Resolves `index` to the text of a `Utf8` entry by following descriptor
	/// edges: `NameAndType` and `MethodType` → their descriptor, the refs →
	/// their `NameAndType`'s descriptor.
	pub fn lookup_descriptor(&self, index: u16) -> Result<&str> {
		self.resolve_utf8(index, true)
	}

	fn resolve_utf8(&self, start: u16, descriptor: bool) -> Result<&str> {
		let unresolvable = |detail: String| {
			if descriptor {
				Error::UnresolvableDescriptor { index: start, detail }
			} else {
				Error::UnresolvableName { index: start, detail }
			}
		};

		// Chains are at most a couple of hops in well-formed files, but a
		// hostile pool can knot its indices into a loop.
		let mut visited = Vec::new();
		let mut index = start;
		loop {
			if visited.contains(&index) {
				return Err(Error::CyclicReference { index });
			}
			visited.push(index);

			index = match self.entry(index)? {
				PoolEntry::Utf8 { bytes } => {
					return std::str::from_utf8(bytes).map_err(|_| {
						unresolvable("the Utf8 entry does not decode as UTF-8".to_owned())
					});
				},
				PoolEntry::String { string_index } if !descriptor => *string_index,
				PoolEntry::Class { name_index } if !descriptor => *name_index,
				PoolEntry::MethodType { descriptor_index } if descriptor => *descriptor_index,
				PoolEntry::NameAndType { name_index, descriptor_index } => {
					if descriptor {
						*descriptor_index
					} else {
						*name_index
					}
				},
				PoolEntry::FieldRef { name_and_type_index, .. }
				| PoolEntry::MethodRef { name_and_type_index, .. }
				| PoolEntry::InterfaceMethodRef { name_and_type_index, .. }
				| PoolEntry::InvokeDynamic { name_and_type_index, .. } => *name_and_type_index,
				other => {
					return Err(unresolvable(format!(
						"a {} entry has no such reference",
						other.tag_name()
					)));
				},
			};
		}
	}
}

/// Tiny helper trait for adding pool indices to errors.
trait PoolContext {
	fn pool_context(self, index: u16) -> Self;
}

impl<T> PoolContext for Result<T> {
	fn pool_context(self, index: u16) -> Self {
		self.with_context(|| format!("while getting pool index {index}"))
	}
}

#[cfg(test)]
mod testing {
	use super::{ConstantPool, PoolEntry};
	use crate::error::ErrorKind;

	fn utf8(s: &str) -> PoolEntry {
		PoolEntry::Utf8 { bytes: s.as_bytes().to_vec() }
	}

	#[test]
	fn long_occupies_two_slots() {
		let mut pool = ConstantPool::new();
		pool.add(utf8("X"));
		pool.add(PoolEntry::Long { high_bytes: 1, low_bytes: 2 });

		assert_eq!(pool.size(), 3);
		assert_eq!(pool.count(), 4);

		assert!(matches!(pool.get(1), Some(PoolEntry::Utf8 { .. })));
		assert!(matches!(pool.get(2), Some(PoolEntry::Long { .. })));
		assert_eq!(pool.get(3), None);
		assert_eq!(pool.entry(3).unwrap_err().kind(), ErrorKind::NullSlot);
	}

	#[test]
	fn index_zero_and_past_the_end_are_out_of_bounds() {
		let mut pool = ConstantPool::new();
		pool.add(utf8("only"));

		assert_eq!(pool.get(0), None);
		assert_eq!(pool.get(2), None);
		assert_eq!(pool.entry(0).unwrap_err().kind(), ErrorKind::OutOfBounds);
		assert_eq!(pool.entry(2).unwrap_err().kind(), ErrorKind::OutOfBounds);
	}

	#[test]
	fn names_resolve_through_refs() {
		let mut pool = ConstantPool::new();
		pool.add(utf8("MyClass")); // 1
		pool.add(PoolEntry::Class { name_index: 1 }); // 2
		pool.add(PoolEntry::NameAndType { name_index: 1, descriptor_index: 4 }); // 3
		pool.add(utf8("()V")); // 4
		pool.add(PoolEntry::MethodRef { class_index: 2, name_and_type_index: 3 }); // 5

		assert_eq!(pool.lookup_string(5).unwrap(), "MyClass");
		assert_eq!(pool.lookup_descriptor(5).unwrap(), "()V");
		assert_eq!(pool.lookup_string(2).unwrap(), "MyClass");
		assert_eq!(pool.lookup_string(1).unwrap(), "MyClass");
		assert_eq!(pool.lookup_descriptor(3).unwrap(), "()V");
	}

	#[test]
	fn descriptor_resolves_through_method_type() {
		let mut pool = ConstantPool::new();
		pool.add(utf8("(I)J")); // 1
		pool.add(PoolEntry::MethodType { descriptor_index: 1 }); // 2

		assert_eq!(pool.lookup_descriptor(2).unwrap(), "(I)J");
		// a MethodType has a descriptor but no name
		let err = pool.lookup_string(2).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::UnresolvableName);
	}

	#[test]
	fn integers_have_no_name() {
		let mut pool = ConstantPool::new();
		pool.add(PoolEntry::Integer { bytes: 42 });

		assert_eq!(pool.lookup_string(1).unwrap_err().kind(), ErrorKind::UnresolvableName);
		assert_eq!(
			pool.lookup_descriptor(1).unwrap_err().kind(),
			ErrorKind::UnresolvableDescriptor
		);
	}

	#[test]
	fn self_referential_class_is_a_cycle() {
		let mut pool = ConstantPool::new();
		pool.add(PoolEntry::Class { name_index: 1 });

		let err = pool.lookup_string(1).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::CyclicReference);
	}

	#[test]
	fn two_entry_cycle_is_detected() {
		let mut pool = ConstantPool::new();
		pool.add(PoolEntry::Class { name_index: 2 }); // 1
		pool.add(PoolEntry::String { string_index: 1 }); // 2

		let err = pool.lookup_string(1).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::CyclicReference);
	}

	#[test]
	fn typed_accessors_check_the_tag() {
		let mut pool = ConstantPool::new();
		pool.add(PoolEntry::Integer { bytes: 7 });

		let err = pool.get_utf8(1).unwrap_err();
		assert_eq!(err.kind(), ErrorKind::TypeMismatch);
		assert!(err.to_string().contains("expected Utf8, found Integer"));
	}

	#[test]
	fn typed_accessors_return_the_payload() {
		let mut pool = ConstantPool::new();
		pool.add(utf8("Name")); // 1
		pool.add(PoolEntry::Class { name_index: 1 }); // 2
		pool.add(PoolEntry::NameAndType { name_index: 1, descriptor_index: 1 }); // 3

		assert_eq!(pool.get_utf8(1).unwrap(), "Name");
		assert_eq!(pool.get_class(2).unwrap(), 1);
		assert_eq!(pool.get_name_and_type(3).unwrap(), (1, 1));
		assert_eq!(pool.get_class(3).unwrap_err().kind(), ErrorKind::TypeMismatch);
	}

	#[test]
	fn non_utf8_bytes_do_not_resolve() {
		let mut pool = ConstantPool::new();
		pool.add(PoolEntry::Utf8 { bytes: vec![0xC0, 0x80] }); // modified-UTF-8 NUL

		assert_eq!(pool.get_utf8(1).unwrap_err().kind(), ErrorKind::UnresolvableName);
	}
}
