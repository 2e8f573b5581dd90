//! Typed - 型付き Task API
//!
//! task 名と payload 型をコンパイル時に対応付け、Handler が
//! 自分用の payload だけを受け取ることを保証します。
//!
//! # 二層構造
//! - **表層（Typed）**: `Task` trait, `Handler<T>` trait - 型安全
//! - **内部（Dyn）**: `DynHandler` trait - object-safe, registry が保持

pub mod codec;
pub mod handler;
pub mod registry;
pub mod task;

pub use self::codec::{CodecError, PayloadCodec};
pub use self::handler::{DynHandler, Execution, Handler, Prepared, TypedHandler};
pub use self::registry::{RegistryError, TypedRegistry};
pub use self::task::Task;
