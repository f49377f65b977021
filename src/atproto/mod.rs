//! AT Protocol 客户端层 - URI 解析、DID 文档、XRPC 查询

pub mod error;
pub mod identity;
pub mod uri;
pub mod xrpc;

pub use error::{ResolveError, ResolveResult};
pub use identity::{DidDocument, DidDocumentSource, HttpDidDocumentSource, PdsLocator, DEFAULT_PLC_DIRECTORY};
pub use uri::CanonicalUri;
pub use xrpc::{build_http_client, RecordResponse, XrpcClient, DEFAULT_APPVIEW_URL};
