//! Attendance statistics.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use super::UseCase;
use crate::domain::ports::{StatsFilter, StatsRepository};
use crate::domain::{Error, TimeRange, UserApptStats, UserId};

/// Weeks assumed per month when averaging.
const WEEKS_PER_MONTH: u32 = 4;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GetUserMonthlyStatsRequest {
    pub user_id: UserId,
    pub year: i32,
    pub month: u32,
}

/// Per-child counters for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChildMonthlyStats {
    pub name: String,
    pub completed: u32,
    pub leave: u32,
    pub absent: u32,
    /// Completed sessions per week, in hundredths.
    pub weekly_average_hundredths: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMonthlyStats {
    pub total_sessions: u32,
    pub total_leave: u32,
    pub children: Vec<ChildMonthlyStats>,
}

impl From<UserApptStats> for UserMonthlyStats {
    fn from(stats: UserApptStats) -> Self {
        let children = stats
            .children
            .into_iter()
            .map(|child| {
                let booked = u32::try_from(child.appointments.len()).unwrap_or(u32::MAX);
                ChildMonthlyStats {
                    absent: booked
                        .saturating_sub(child.checked_in_count)
                        .saturating_sub(child.on_leave_count),
                    weekly_average_hundredths: child.checked_in_count.saturating_mul(100)
                        / WEEKS_PER_MONTH,
                    completed: child.checked_in_count,
                    leave: child.on_leave_count,
                    name: child.child_label,
                }
            })
            .collect();
        Self {
            total_sessions: stats.total_appointments,
            total_leave: stats.on_leave_count,
            children,
        }
    }
}

/// Calendar month `year`-`month` in UTC, ending one second before the next.
fn month_range(year: i32, month: u32) -> Option<TimeRange> {
    let first = NaiveDate::from_ymd_opt(year, month, 1)?;
    let (next_year, next_month) = if month == 12 {
        (year.checked_add(1)?, 1)
    } else {
        (year, month + 1)
    };
    let next = NaiveDate::from_ymd_opt(next_year, next_month, 1)?;
    let start: DateTime<Utc> = first.and_hms_opt(0, 0, 0)?.and_utc();
    let end = next.and_hms_opt(0, 0, 0)?.and_utc() - Duration::seconds(1);
    TimeRange::new(start, end).ok()
}

pub struct GetUserMonthlyStats<S> {
    stats: Arc<S>,
}

impl<S> GetUserMonthlyStats<S> {
    pub fn new(stats: Arc<S>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl<S> UseCase for GetUserMonthlyStats<S>
where
    S: StatsRepository,
{
    type Request = GetUserMonthlyStatsRequest;
    type Response = UserMonthlyStats;

    fn name(&self) -> &'static str {
        "GetUserMonthlyStats"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        let name = self.name();
        let range = month_range(request.year, request.month).ok_or_else(|| {
            Error::invalid_request(
                name,
                "INVALID_MONTH",
                format!("{}-{} is not a calendar month", request.year, request.month),
            )
        })?;
        let stats = self
            .stats
            .user_stats(&request.user_id, &StatsFilter::TrainTimeRange(range))
            .await
            .map_err(|err| Error::wrap(name, "QUERY_STATS", err))?;
        Ok(stats.map(UserMonthlyStats::from).unwrap_or_default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryAllUserApptStatsRequest {
    pub range: TimeRange,
}

/// Statistics of every user with bookings in a range.
pub struct QueryAllUserApptStats<S> {
    stats: Arc<S>,
}

impl<S> QueryAllUserApptStats<S> {
    pub fn new(stats: Arc<S>) -> Self {
        Self { stats }
    }
}

#[async_trait]
impl<S> UseCase for QueryAllUserApptStats<S>
where
    S: StatsRepository,
{
    type Request = QueryAllUserApptStatsRequest;
    type Response = Vec<UserApptStats>;

    fn name(&self) -> &'static str {
        "QueryAllUserApptStats"
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        self.stats
            .all_user_stats(&StatsFilter::TrainTimeRange(request.range))
            .await
            .map_err(|err| Error::wrap(self.name(), "QUERY_STATS", err))
    }
}
