//! Use cases built once at start-up and shared by reference.

use std::sync::Arc;

use mockable::Clock;
use pagination::{Page, PageSize};

use super::{
    AdminQueryRecentTrain, AdminQueryTrainRange, BatchCreateTrainDates,
    BatchCreateTrainDatesRequest, CancelAppointment, CancelAppointmentRequest, CancelLeave,
    CancelLeaveRequest, CheckIn, CheckInRequest, CreateAppointment, CreateAppointmentRequest,
    CreateLeave, CreateLeaveRequest, CreateTrainDate, CreateTrainDateRequest, DeleteTrainDate,
    DeleteTrainDateRequest, FindNearestTrainByTime, FindTrainHasApptsById, GetUserMonthlyStats,
    GetUserMonthlyStatsRequest, Logged, QueryAllUserApptStats, QueryAllUserApptStatsRequest,
    QueryFutureTrain, QueryTwoWeeksSchedule, QueryTwoWeeksScheduleRequest, QueryUserBookings,
    QueryUserBookingsRequest, TrainByIdRequest, TrainRangeRequest, TrainsAfterRequest,
    TwoWeeksSchedule, UseCase, UserMonthlyStats, UserQueryFutureTrain, UserQueryTrainById,
    UserTrainByIdRequest, UserTrainsAfterRequest,
};
use crate::domain::compensation::CompensationPolicy;
use crate::domain::ports::{
    AppointmentRepository, CacheQueue, IdentityGenerator, StatsRepository, TrainRepository,
};
use crate::domain::{
    Appointment, AppointmentWithTrainDate, TrainDate, TrainDateWithAppointments, UserApptStats,
    UserTrainDateView,
};

/// Type-erased, logged use case.
pub type SharedUseCase<Req, Resp> = Arc<dyn UseCase<Request = Req, Response = Resp>>;

/// Tunables applied while wiring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UseCaseSettings {
    pub default_page_size: PageSize,
    pub compensation: CompensationPolicy,
}

/// Driven adapters the use cases run against.
pub struct BookingPorts<T, A, S> {
    pub trains: Arc<T>,
    pub appointments: Arc<A>,
    pub stats: Arc<S>,
    pub ids: Arc<dyn IdentityGenerator>,
    pub cache: Arc<dyn CacheQueue>,
    pub clock: Arc<dyn Clock>,
}

/// Every use case of the booking core.
#[derive(Clone)]
pub struct UseCaseRegistry {
    pub create_appointment: SharedUseCase<CreateAppointmentRequest, Vec<Appointment>>,
    pub cancel_appointment: SharedUseCase<CancelAppointmentRequest, Appointment>,
    pub create_leave: SharedUseCase<CreateLeaveRequest, Appointment>,
    pub cancel_leave: SharedUseCase<CancelLeaveRequest, Appointment>,
    pub check_in: SharedUseCase<CheckInRequest, Vec<Appointment>>,
    pub create_train_date: SharedUseCase<CreateTrainDateRequest, TrainDate>,
    pub batch_create_train_dates: SharedUseCase<BatchCreateTrainDatesRequest, Vec<TrainDate>>,
    pub delete_train_date: SharedUseCase<DeleteTrainDateRequest, TrainDate>,
    pub query_user_bookings:
        SharedUseCase<QueryUserBookingsRequest, Page<AppointmentWithTrainDate>>,
    pub get_user_monthly_stats: SharedUseCase<GetUserMonthlyStatsRequest, UserMonthlyStats>,
    pub query_all_user_appt_stats:
        SharedUseCase<QueryAllUserApptStatsRequest, Vec<UserApptStats>>,
    pub query_future_train: SharedUseCase<TrainsAfterRequest, Vec<TrainDateWithAppointments>>,
    pub admin_query_train_range:
        SharedUseCase<TrainRangeRequest, Vec<TrainDateWithAppointments>>,
    pub admin_query_recent_train: SharedUseCase<TrainRangeRequest, Vec<TrainDate>>,
    pub find_nearest_train_by_time: SharedUseCase<TrainsAfterRequest, TrainDateWithAppointments>,
    pub find_train_has_appts_by_id: SharedUseCase<TrainByIdRequest, TrainDateWithAppointments>,
    pub user_query_future_train: SharedUseCase<UserTrainsAfterRequest, Vec<UserTrainDateView>>,
    pub user_query_train_by_id: SharedUseCase<UserTrainByIdRequest, UserTrainDateView>,
    pub query_two_weeks_schedule: SharedUseCase<QueryTwoWeeksScheduleRequest, TwoWeeksSchedule>,
}

fn shared<U>(use_case: U) -> SharedUseCase<U::Request, U::Response>
where
    U: UseCase + 'static,
{
    Arc::new(Logged::new(use_case))
}

impl UseCaseRegistry {
    pub fn new<T, A, S>(ports: BookingPorts<T, A, S>, settings: UseCaseSettings) -> Self
    where
        T: TrainRepository + 'static,
        A: AppointmentRepository + 'static,
        S: StatsRepository + 'static,
    {
        let BookingPorts {
            trains,
            appointments,
            stats,
            ids,
            cache,
            clock,
        } = ports;

        Self {
            create_appointment: shared(
                CreateAppointment::new(
                    Arc::clone(&trains),
                    Arc::clone(&appointments),
                    Arc::clone(&ids),
                    Arc::clone(&cache),
                    Arc::clone(&clock),
                )
                .with_compensation(settings.compensation),
            ),
            cancel_appointment: shared(
                CancelAppointment::new(
                    Arc::clone(&trains),
                    Arc::clone(&appointments),
                    Arc::clone(&cache),
                    Arc::clone(&clock),
                )
                .with_compensation(settings.compensation),
            ),
            create_leave: shared(
                CreateLeave::new(
                    Arc::clone(&trains),
                    Arc::clone(&appointments),
                    Arc::clone(&cache),
                    Arc::clone(&clock),
                )
                .with_compensation(settings.compensation),
            ),
            cancel_leave: shared(
                CancelLeave::new(
                    Arc::clone(&trains),
                    Arc::clone(&appointments),
                    Arc::clone(&cache),
                    Arc::clone(&clock),
                )
                .with_compensation(settings.compensation),
            ),
            check_in: shared(CheckIn::new(
                Arc::clone(&trains),
                Arc::clone(&appointments),
                Arc::clone(&cache),
                Arc::clone(&clock),
            )),
            create_train_date: shared(CreateTrainDate::new(
                Arc::clone(&trains),
                Arc::clone(&ids),
                Arc::clone(&clock),
            )),
            batch_create_train_dates: shared(BatchCreateTrainDates::new(
                Arc::clone(&trains),
                Arc::clone(&ids),
                Arc::clone(&clock),
            )),
            delete_train_date: shared(DeleteTrainDate::new(
                Arc::clone(&trains),
                Arc::clone(&clock),
            )),
            query_user_bookings: shared(QueryUserBookings::new(
                Arc::clone(&appointments),
                settings.default_page_size,
            )),
            get_user_monthly_stats: shared(GetUserMonthlyStats::new(Arc::clone(&stats))),
            query_all_user_appt_stats: shared(QueryAllUserApptStats::new(stats)),
            query_future_train: shared(QueryFutureTrain::new(Arc::clone(&trains))),
            admin_query_train_range: shared(AdminQueryTrainRange::new(Arc::clone(&trains))),
            admin_query_recent_train: shared(AdminQueryRecentTrain::new(Arc::clone(&trains))),
            find_nearest_train_by_time: shared(FindNearestTrainByTime::new(Arc::clone(&trains))),
            find_train_has_appts_by_id: shared(FindTrainHasApptsById::new(Arc::clone(&trains))),
            user_query_future_train: shared(UserQueryFutureTrain::new(Arc::clone(&trains))),
            user_query_train_by_id: shared(UserQueryTrainById::new(Arc::clone(&trains))),
            query_two_weeks_schedule: shared(QueryTwoWeeksSchedule::new(trains, clock)),
        }
    }
}
