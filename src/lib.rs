pub mod ast;
pub mod ast_printer;
pub mod environment;
pub mod error;
pub mod frontend;
pub mod interpreter;
pub mod node;
pub mod parser;
pub mod token;
pub mod value;
