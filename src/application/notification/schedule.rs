use crate::application::ServiceDependencies;
use chrono::{DateTime, Days, NaiveTime, Utc};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use super::late_loan_notifier::notify_late_loans;

const ONE_DAY: Duration = Duration::from_secs(24 * 60 * 60);

/// 1日1回、決まった時刻（UTC）に発火するスケジュール
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DailySchedule {
    at: NaiveTime,
}

impl DailySchedule {
    pub fn new(at: NaiveTime) -> Self {
        Self { at }
    }

    /// 毎日0時
    pub fn midnight() -> Self {
        Self::new(NaiveTime::MIN)
    }

    pub fn at(&self) -> NaiveTime {
        self.at
    }

    /// now より厳密に後の次回発火時刻
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.at).and_utc();
        if today > now {
            return today;
        }
        now.date_naive()
            .checked_add_days(Days::new(1))
            .map(|tomorrow| tomorrow.and_time(self.at).and_utc())
            .unwrap_or(today)
    }

    /// 次回発火までの待ち時間
    pub fn until_next(&self, now: DateTime<Utc>) -> Duration {
        (self.next_after(now) - now).to_std().unwrap_or_default()
    }
}

impl Default for DailySchedule {
    fn default() -> Self {
        Self::midnight()
    }
}

/// 延滞通知ジョブを起動する
///
/// 次回の発火時刻まで待ち、その後は24時間ごとに `notify_late_loans` を実行する。
/// 失敗はログに記録し、翌日の発火で自然に回復する。
/// `cancel` がキャンセルされると速やかに終了する。
pub fn spawn_late_loan_notifier(
    deps: ServiceDependencies,
    schedule: DailySchedule,
    message: String,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let first = Instant::now() + schedule.until_next(Utc::now());
        let mut ticker = tokio::time::interval_at(first, ONE_DAY);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(at = %schedule.at(), "late loan notifier started");

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("late loan notifier stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let today = Utc::now().date_naive();
                    match notify_late_loans(&deps, &message, today).await {
                        Ok(count) => {
                            tracing::info!(recipients = count, "late loan notification finished");
                        }
                        Err(e) => {
                            tracing::error!(error = ?e, "late loan notification failed");
                        }
                    }
                }
            }
        }
    })
}
