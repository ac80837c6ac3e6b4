pub mod command;
pub mod scanner;
pub mod server;
pub mod trie;
pub mod wire;

pub use scanner::PathIndex;
pub use trie::Trie;
