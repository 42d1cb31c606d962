#![doc = include_str!("../README.md")]
#![deny(rustdoc::broken_intra_doc_links, rust_2018_idioms)]
#![warn(
    clippy::clone_on_ref_ptr,
    clippy::dbg_macro,
    clippy::explicit_iter_loop,
    clippy::future_not_send,
    clippy::todo,
    clippy::unimplemented,
    clippy::use_self,
    clippy::doc_markdown,
    clippy::print_stdout,
    missing_debug_implementations,
    unused_crate_dependencies,
    unreachable_pub,
    missing_docs
)]

mod errors;
pub use errors::Error;

mod types;
pub use types::*;

mod buffer;
pub use buffer::*;

mod binary;
pub use binary::*;

mod descriptor;
pub use descriptor::*;

mod exception;
pub use exception::*;

mod frame;
pub use frame::*;

mod message;
pub use message::*;

mod status;
pub use status::*;

mod serialize;
pub use serialize::*;

mod context;
pub use context::*;

mod client_codec;
pub use client_codec::*;

mod server_codec;
pub use server_codec::*;

// Unused crate lint workaround for dev dependency.
#[cfg(test)]
use criterion as _;
