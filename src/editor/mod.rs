//! エディタモジュール
//!
//! モーションの実行、オペレータの合成、行削除のバッチ管理

pub mod deletion;
pub mod motion;
pub mod operator;

// 公開API
pub use deletion::{BatchPoll, DeletionBatch, FollowUp};
pub use operator::{plan, resolve_target, resolve_visual, EditPlan, OperatorTarget, PendingOperator, Resolved, TargetKind, Verb};
