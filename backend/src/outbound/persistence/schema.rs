//! Diesel table definitions for the booking schema.
//!
//! These must match `backend/migrations` exactly. Regenerate with
//! `diesel print-schema` after changing a migration.

diesel::table! {
    /// Bookable slots. `available_capacity` is the contended counter.
    train_dates (id) {
        id -> Text,
        coach_id -> Text,
        location -> Text,
        max_capacity -> Int4,
        available_capacity -> Int4,
        start_time -> Timestamptz,
        end_time -> Timestamptz,
        /// `ACTIVE` or `INACTIVE`.
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

diesel::table! {
    /// One child's seat in one slot; unique on `(user_id, train_date_id, child_label)`.
    appointments (id) {
        id -> Text,
        train_date_id -> Text,
        user_id -> Text,
        user_name -> Text,
        child_label -> Text,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        verified_at -> Nullable<Timestamptz>,
        leave_reason -> Text,
        leave_status -> Text,
        leave_created_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(appointments -> train_dates (train_date_id));
diesel::allow_tables_to_appear_in_same_query!(appointments, train_dates);
