#[macro_use]
extern crate serde;

pub mod commands;
pub mod daemon;
pub mod error;
pub mod network;
pub mod ovo;
pub mod plugin;

#[cfg(test)]
pub(crate) mod test;
