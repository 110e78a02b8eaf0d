//! Paginated listing of a user's bookings.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use pagination::{Page, PageSize};

use super::UseCase;
use crate::domain::ports::{
    AppointmentCursor, AppointmentFilter, AppointmentRepository, TrainDateFilter,
};
use crate::domain::{AppointmentWithTrainDate, Error, ErrorCode, ErrorKind, UserId};

/// Bookings of `user_id` whose slot starts at or after `starts_after`.
///
/// Without a cursor the first page is returned using `page_size` (or the
/// configured default). A cursor carries its own page size.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryUserBookingsRequest {
    pub user_id: UserId,
    pub starts_after: DateTime<Utc>,
    pub cursor: Option<String>,
    pub page_size: Option<u32>,
}

pub struct QueryUserBookings<A> {
    appointments: Arc<A>,
    default_page_size: PageSize,
}

impl<A> QueryUserBookings<A> {
    pub fn new(appointments: Arc<A>, default_page_size: PageSize) -> Self {
        Self {
            appointments,
            default_page_size,
        }
    }
}

impl<A> QueryUserBookings<A> {
    const NAME: &'static str = "QueryUserBookings";

    fn page_token(&self, request: &QueryUserBookingsRequest) -> Result<String, Error> {
        if let Some(token) = &request.cursor {
            if token.trim().is_empty() {
                return Err(Error::invalid_request(
                    Self::NAME,
                    "INVALID_CURSOR",
                    "cursor must not be empty",
                ));
            }
            return Ok(token.clone());
        }
        let page_size = match request.page_size {
            Some(size) => PageSize::try_new(size).map_err(|err| {
                Error::invalid_request(Self::NAME, "INVALID_PAGE_SIZE", err.to_string())
            })?,
            None => self.default_page_size,
        };
        AppointmentCursor::first(page_size).encode().map_err(|err| {
            Error::new(
                ErrorKind::UseCase,
                ErrorCode::InternalError,
                Self::NAME,
                "ENCODE_CURSOR",
                err.to_string(),
            )
        })
    }
}

#[async_trait]
impl<A> UseCase for QueryUserBookings<A>
where
    A: AppointmentRepository,
{
    type Request = QueryUserBookingsRequest;
    type Response = Page<AppointmentWithTrainDate>;

    fn name(&self) -> &'static str {
        Self::NAME
    }

    async fn execute(&self, request: Self::Request) -> Result<Self::Response, Error> {
        let token = self.page_token(&request)?;
        self.appointments
            .page_find_with_train_date(
                &AppointmentFilter::ByUser(request.user_id),
                &TrainDateFilter::StartsFrom(request.starts_after),
                &token,
            )
            .await
            .map_err(|err| Error::wrap(Self::NAME, "PAGE_FIND_APPOINTMENTS", err))
    }
}
