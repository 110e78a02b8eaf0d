//! Driving operations of the booking core.
//!
//! Each use case owns one business operation and orchestrates entity guards,
//! repository calls and compensation. Requests and responses are plain data.

use async_trait::async_trait;
use tracing::{Instrument, debug, info_span, warn};

use super::Error;

mod appointment_write;
mod booking_queries;
mod check_in;
mod leave_write;
mod lookup;
mod registry;
mod schedule;
mod stats_queries;
mod train_date_queries;
mod train_date_write;

pub use appointment_write::{
    CancelAppointment, CancelAppointmentRequest, CreateAppointment, CreateAppointmentRequest,
};
pub use booking_queries::{QueryUserBookings, QueryUserBookingsRequest};
pub use check_in::{CheckIn, CheckInRequest};
pub use leave_write::{CancelLeave, CancelLeaveRequest, CreateLeave, CreateLeaveRequest};
pub use registry::{BookingPorts, SharedUseCase, UseCaseRegistry, UseCaseSettings};
pub use schedule::{
    AttendeeStatus, DaySchedule, QueryTwoWeeksSchedule, QueryTwoWeeksScheduleRequest,
    ScheduleAttendee, ScheduleDirection, ScheduleSlot, TwoWeeksSchedule, WeekSchedule,
};
pub use stats_queries::{
    ChildMonthlyStats, GetUserMonthlyStats, GetUserMonthlyStatsRequest, QueryAllUserApptStats,
    QueryAllUserApptStatsRequest, UserMonthlyStats,
};
pub use train_date_queries::{
    AdminQueryRecentTrain, AdminQueryTrainRange, FindNearestTrainByTime, FindTrainHasApptsById,
    QueryFutureTrain, TrainByIdRequest, TrainRangeRequest, TrainsAfterRequest,
    UserQueryFutureTrain, UserQueryTrainById, UserTrainByIdRequest, UserTrainsAfterRequest,
};
pub use train_date_write::{
    BatchCreateTrainDates, BatchCreateTrainDatesRequest, CreateTrainDate, CreateTrainDateRequest,
    DeleteTrainDate, DeleteTrainDateRequest,
};

/// One business operation with a stable name for observability.
#[async_trait]
pub trait UseCase: Send + Sync {
    type Request: Send + 'static;
    type Response: Send + 'static;

    /// Stable identifier used in logs and error categories.
    fn name(&self) -> &'static str;

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error>;
}

/// Decorator that runs a use case inside a `use_case` span and logs failures.
#[derive(Debug, Clone)]
pub struct Logged<U> {
    inner: U,
}

impl<U> Logged<U> {
    pub fn new(inner: U) -> Self {
        Self { inner }
    }

    pub fn inner(&self) -> &U {
        &self.inner
    }
}

#[async_trait]
impl<U> UseCase for Logged<U>
where
    U: UseCase,
{
    type Request = U::Request;
    type Response = U::Response;

    fn name(&self) -> &'static str {
        self.inner.name()
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        let name = self.inner.name();
        async move {
            let result = self.inner.execute(request).await;
            match &result {
                Ok(_) => debug!("use case completed"),
                Err(err) => warn!(
                    code = ?err.code(),
                    category = err.category(),
                    reason = err.reason(),
                    error = %err,
                    "use case failed"
                ),
            }
            result
        }
        .instrument(info_span!("use_case", use_case = name))
        .await
    }
}
