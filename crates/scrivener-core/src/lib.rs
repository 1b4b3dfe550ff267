pub mod config;
pub mod diff;
pub mod types;

pub use config::{ConfigError, GatewayConfig};
pub use diff::{diff, modified_side, original_side};
pub use types::{
    CheckIssue, CheckRequest, CheckResult, ConversationTurn, DiffKind, DiffSegment, EditRequest,
    Operation, PolishChange, PolishRequest, PolishResult, RewriteRequest, RewriteResult, Role,
    TranslateRequest, TranslateResult, TypedResult,
};
