//! 削除バッチ
//!
//! ホストの行削除は非同期に反映される。完了通知は無いので、対象リージョンが
//! レジストリから消えるまでポーリングし、期限を過ぎたら打ち切る。

use crate::host::RegionId;
use crate::input::mode::Mode;
use std::time::{Duration, Instant};

/// バッチ完了後に適用する状態
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FollowUp {
    /// 復帰するモード
    pub mode: Mode,
    /// キャレットを置くリージョン（削除後も残るもの）
    pub anchor: Option<RegionId>,
    /// `anchor` が見つからないときの行番号
    pub line: usize,
    pub offset: usize,
}

/// ポーリング結果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPoll {
    /// まだ対象が残っている
    Pending,
    /// すべての対象が消えた
    Completed(FollowUp),
    /// 期限切れ
    TimedOut(FollowUp),
}

/// 発行済みの削除バッチ
#[derive(Debug, Clone)]
pub struct DeletionBatch {
    targets: Vec<RegionId>,
    follow_up: FollowUp,
    interval: Duration,
    next_poll: Instant,
    deadline: Instant,
}

impl DeletionBatch {
    pub fn new(
        targets: Vec<RegionId>,
        follow_up: FollowUp,
        issued_at: Instant,
        interval: Duration,
        timeout: Duration,
    ) -> Self {
        Self {
            targets,
            follow_up,
            interval,
            next_poll: issued_at + interval,
            deadline: issued_at + timeout,
        }
    }

    pub fn targets(&self) -> &[RegionId] {
        &self.targets
    }

    /// 次のポーリング時刻に達したか
    pub fn is_due(&self, now: Instant) -> bool {
        now >= self.next_poll
    }

    /// `present` はリージョンがまだレジストリにあるかを返す
    pub fn poll<F>(&mut self, now: Instant, present: F) -> BatchPoll
    where
        F: Fn(RegionId) -> bool,
    {
        if self.targets.iter().all(|target| !present(*target)) {
            return BatchPoll::Completed(self.follow_up);
        }
        if now >= self.deadline {
            return BatchPoll::TimedOut(self.follow_up);
        }
        self.next_poll = now + self.interval;
        BatchPoll::Pending
    }

    /// セッション終了時の破棄。残っていた対象を返す
    pub fn cancel<F>(self, present: F) -> Vec<RegionId>
    where
        F: Fn(RegionId) -> bool,
    {
        self.targets.into_iter().filter(|target| present(*target)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn follow_up() -> FollowUp {
        FollowUp {
            mode: Mode::Normal,
            anchor: Some(RegionId(1)),
            line: 0,
            offset: 0,
        }
    }

    fn batch(start: Instant) -> DeletionBatch {
        DeletionBatch::new(
            vec![RegionId(2), RegionId(3)],
            follow_up(),
            start,
            Duration::from_millis(50),
            Duration::from_millis(200),
        )
    }

    #[test]
    fn completes_when_targets_disappear() {
        let start = Instant::now();
        let mut batch = batch(start);
        assert!(!batch.is_due(start));
        assert!(batch.is_due(start + Duration::from_millis(50)));

        let now = start + Duration::from_millis(50);
        assert_eq!(batch.poll(now, |region| region == RegionId(3)), BatchPoll::Pending);
        assert!(!batch.is_due(now));
        assert_eq!(
            batch.poll(now + Duration::from_millis(50), |_| false),
            BatchPoll::Completed(follow_up())
        );
    }

    #[test]
    fn times_out_at_deadline() {
        let start = Instant::now();
        let mut batch = batch(start);
        let late = start + Duration::from_millis(200);
        assert_eq!(batch.poll(late, |_| true), BatchPoll::TimedOut(follow_up()));
    }

    #[test]
    fn completion_wins_over_timeout() {
        let start = Instant::now();
        let mut batch = batch(start);
        let late = start + Duration::from_secs(5);
        assert_eq!(batch.poll(late, |_| false), BatchPoll::Completed(follow_up()));
    }

    #[test]
    fn cancel_reports_outstanding_targets() {
        let batch = batch(Instant::now());
        assert_eq!(batch.cancel(|region| region == RegionId(2)), vec![RegionId(2)]);
    }
}
