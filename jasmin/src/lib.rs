//! Assembler and disassembler for the Jasmin textual form of class files.
//!
//! The pipeline is lexer → parser → assembler: [`Lexer::lex`] turns source
//! text into a token queue, [`Parser::parse_all`] builds the syntax tree and
//! [`assemble`] produces a [`classfile::ClassFile`] ready for
//! [`classfile::serialize_class_file`]. [`disassemble`] goes the other way;
//! its text is readable Jasmin, not a byte-exact inverse.
//!
//! ```
//! let source = "\
//! .class public Hello
//! .super java/lang/Object
//! .method public static main([Ljava/lang/String;)V
//! .limit stack 2
//! 	return
//! .end method
//! ";
//!
//! let class = jasmin::assemble_source(source).unwrap();
//! assert_eq!(class.const_pool.lookup_string(class.this_class).unwrap(), "Hello");
//! ```

pub mod error;
mod assembler;
mod ast;
mod disassembler;
mod lexer;
mod parser;

pub use assembler::assemble;
pub use ast::{Arg, Node};
pub use disassembler::{disassemble, DisassemblerConfig};
pub use lexer::{Lexer, Token, TokenType, DIRECTIVES};
pub use parser::Parser;

use error::Result;

/// Lexes, parses and assembles Jasmin source in one go.
pub fn assemble_source(source: &str) -> Result<classfile::ClassFile> {
	let tokens = Lexer::lex(source)?;
	let nodes = Parser::new(tokens).parse_all()?;
	assemble(nodes)
}
