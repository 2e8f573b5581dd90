//! App - アプリケーション層
//!
//! ports と typed handler を組み合わせて lifecycle を実装します。
//!
//! # 主要コンポーネント
//! - **AdapterConfig**: プロセス設定（TOML + `RELAY_*` 環境変数）
//! - **AppBuilder**: 登録と起動時検証
//! - **OutboundSender**: 派生 envelope の生成と timeout 付き送信
//! - **Dispatcher**: 1 envelope 分の triggered → started → finished
//! - **Service**: subscribe ループと graceful shutdown

pub mod builder;
pub mod config;
pub mod dispatcher;
pub mod outbound;
pub mod service;

pub use self::builder::{App, AppBuilder, BuildError};
pub use self::config::{AdapterConfig, ConfigError, UnhandledPolicy};
pub use self::dispatcher::{DispatchError, Disposition, Dispatcher};
pub use self::outbound::{Ack, OutboundSender, SendError};
pub use self::service::{Service, ServiceError, ServiceHandle};
