pub mod command;

pub use command::{decode, encode, Command, DecodeError};
