//! An interning builder for the constant pool.
//!
//! Identical entries share one index, a long or double burns two slots, and
//! insertion order is what the finished pool serializes in.

use crate::error::{Error, Result};
use classfile::{ConstantPool, PoolEntry};
use indexmap::IndexMap;

pub(crate) struct PoolBuilder {
	// next index to hand out; starts at 1, the zero slot is reserved
	next_index: u16,
	entries: IndexMap<PoolEntry, u16>,
}

impl PoolBuilder {
	pub(crate) fn new() -> PoolBuilder {
		PoolBuilder {
			next_index: 1,
			entries: IndexMap::new(),
		}
	}

	fn put(&mut self, entry: PoolEntry) -> Result<u16> {
		if let Some(&index) = self.entries.get(&entry) {
			return Ok(index);
		}

		let index = self.next_index;
		let slots = if entry.is_wide() { 2 } else { 1 };
		self.next_index = self.next_index.checked_add(slots).ok_or_else(|| {
			Error::assemble(format!("constant pool grew past 65535 slots at {entry:?}"))
		})?;
		self.entries.insert(entry, index);

		Ok(index)
	}

	pub(crate) fn put_utf8(&mut self, value: &str) -> Result<u16> {
		self.put(PoolEntry::Utf8 { bytes: value.as_bytes().to_vec() })
	}

	pub(crate) fn put_class(&mut self, name: &str) -> Result<u16> {
		let name_index = self.put_utf8(name)?;
		self.put(PoolEntry::Class { name_index })
	}

	pub(crate) fn put_string(&mut self, value: &str) -> Result<u16> {
		let string_index = self.put_utf8(value)?;
		self.put(PoolEntry::String { string_index })
	}

	pub(crate) fn put_integer(&mut self, value: i32) -> Result<u16> {
		self.put(PoolEntry::Integer { bytes: value as u32 })
	}

	pub(crate) fn put_name_and_type(&mut self, name: &str, descriptor: &str) -> Result<u16> {
		let name_index = self.put_utf8(name)?;
		let descriptor_index = self.put_utf8(descriptor)?;
		self.put(PoolEntry::NameAndType { name_index, descriptor_index })
	}

	pub(crate) fn put_field_ref(
		&mut self,
		class: &str,
		name: &str,
		descriptor: &str,
	) -> Result<u16> {
		let class_index = self.put_class(class)?;
		let name_and_type_index = self.put_name_and_type(name, descriptor)?;
		self.put(PoolEntry::FieldRef { class_index, name_and_type_index })
	}

	pub(crate) fn put_method_ref(
		&mut self,
		class: &str,
		name: &str,
		descriptor: &str,
	) -> Result<u16> {
		let class_index = self.put_class(class)?;
		let name_and_type_index = self.put_name_and_type(name, descriptor)?;
		self.put(PoolEntry::MethodRef { class_index, name_and_type_index })
	}

	pub(crate) fn finish(self) -> ConstantPool {
		let mut pool = ConstantPool::new();
		for (entry, _) in self.entries {
			// `add` appends the placeholder slot after wide entries, which
			// keeps the pool's indices aligned with the ones handed out
			pool.add(entry);
		}
		pool
	}
}

#[cfg(test)]
mod testing {
	use super::PoolBuilder;
	use classfile::PoolEntry;

	#[test]
	fn entries_are_interned() {
		let mut builder = PoolBuilder::new();

		let a = builder.put_class("Foo").unwrap();
		let b = builder.put_class("Foo").unwrap();
		let c = builder.put_utf8("Foo").unwrap();

		assert_eq!(a, b);
		// the class entry references the already-interned name
		assert_eq!((a, c), (2, 1));
	}

	#[test]
	fn refs_intern_their_parts() {
		let mut builder = PoolBuilder::new();

		let method = builder.put_method_ref("Foo", "bar", "()V").unwrap();
		let again = builder.put_method_ref("Foo", "bar", "()V").unwrap();
		assert_eq!(method, again);

		let pool = builder.finish();
		assert_eq!(pool.lookup_string(method).unwrap(), "bar");
		assert_eq!(pool.lookup_descriptor(method).unwrap(), "()V");
	}

	#[test]
	fn finished_pool_indices_match_the_handed_out_ones() {
		let mut builder = PoolBuilder::new();

		builder.put(PoolEntry::Long { high_bytes: 0, low_bytes: 1 }).unwrap();
		let after_long = builder.put_utf8("behind the placeholder").unwrap();
		assert_eq!(after_long, 3);

		let pool = builder.finish();
		assert_eq!(pool.get(3), Some(&PoolEntry::Utf8 {
			bytes: b"behind the placeholder".to_vec(),
		}));
		assert_eq!(pool.get(2), None);
	}
}
