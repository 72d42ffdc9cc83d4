//! Access flag constants (jvms-4.1, 4.5, 4.6) and helpers for naming them.

pub const ACC_PUBLIC: u16 = 0x0001; // class, field, method
pub const ACC_PRIVATE: u16 = 0x0002; // field, method
pub const ACC_PROTECTED: u16 = 0x0004; // field, method
pub const ACC_STATIC: u16 = 0x0008; // field, method
pub const ACC_FINAL: u16 = 0x0010; // class, field, method
pub const ACC_SUPER: u16 = 0x0020; // class
pub const ACC_SYNCHRONIZED: u16 = 0x0020; // method
pub const ACC_VOLATILE: u16 = 0x0040; // field
pub const ACC_BRIDGE: u16 = 0x0040; // method
pub const ACC_TRANSIENT: u16 = 0x0080; // field
pub const ACC_VARARGS: u16 = 0x0080; // method
pub const ACC_NATIVE: u16 = 0x0100; // method
pub const ACC_INTERFACE: u16 = 0x0200; // class
pub const ACC_ABSTRACT: u16 = 0x0400; // class, method
pub const ACC_STRICT: u16 = 0x0800; // method
pub const ACC_SYNTHETIC: u16 = 0x1000; // class, field, method
pub const ACC_ANNOTATION: u16 = 0x2000; // class
pub const ACC_ENUM: u16 = 0x4000; // class, field

const CLASS_NAMES: &[(u16, &str)] = &[
	(ACC_PUBLIC, "PUBLIC"),
	(ACC_FINAL, "FINAL"),
	(ACC_SUPER, "SUPER"),
	(ACC_INTERFACE, "INTERFACE"),
	(ACC_ABSTRACT, "ABSTRACT"),
	(ACC_SYNTHETIC, "SYNTHETIC"),
	(ACC_ANNOTATION, "ANNOTATION"),
	(ACC_ENUM, "ENUM"),
];

const MEMBER_NAMES: &[(u16, &str)] = &[
	(ACC_PUBLIC, "PUBLIC"),
	(ACC_PRIVATE, "PRIVATE"),
	(ACC_PROTECTED, "PROTECTED"),
	(ACC_STATIC, "STATIC"),
	(ACC_FINAL, "FINAL"),
	(ACC_SYNCHRONIZED, "SYNCHRONIZED"),
	(ACC_BRIDGE, "BRIDGE"),
	(ACC_VARARGS, "VARARGS"),
	(ACC_NATIVE, "NATIVE"),
	(ACC_ABSTRACT, "ABSTRACT"),
	(ACC_STRICT, "STRICT"),
	(ACC_SYNTHETIC, "SYNTHETIC"),
];

fn names(flags: u16, table: &'static [(u16, &'static str)]) -> Vec<&'static str> {
	table
		.iter()
		.filter(|(bit, _)| flags & bit != 0)
		.map(|&(_, name)| name)
		.collect()
}

/// The set class-level flag names of an access word, in a fixed order.
pub fn class_flag_names(flags: u16) -> Vec<&'static str> {
	names(flags, CLASS_NAMES)
}

/// The set field/method-level flag names of an access word.
pub fn member_flag_names(flags: u16) -> Vec<&'static str> {
	names(flags, MEMBER_NAMES)
}

#[cfg(test)]
mod testing {
	use super::{class_flag_names, member_flag_names, ACC_PUBLIC, ACC_STATIC, ACC_SUPER};

	#[test]
	fn flag_words_name_their_bits() {
		assert_eq!(class_flag_names(ACC_PUBLIC | ACC_SUPER), ["PUBLIC", "SUPER"]);
		assert_eq!(member_flag_names(ACC_PUBLIC | ACC_STATIC), ["PUBLIC", "STATIC"]);
		assert_eq!(class_flag_names(0), [""; 0]);
	}
}
