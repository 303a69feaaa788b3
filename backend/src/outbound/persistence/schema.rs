//! Diesel table definitions for the PostgreSQL schema.
//!
//! These definitions must match `backend/migrations` exactly. The
//! `diesel print-schema` command can regenerate them from a migrated
//! database.

diesel::table! {
    /// Participants and their cached points total.
    users (id) {
        id -> Uuid,
        display_name -> Varchar,
        /// Sum of the user's ledger deltas; written only by the award pipeline.
        points -> Int8,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Plant and update submissions awaiting or past verification.
    tree_records (id) {
        id -> Uuid,
        owner_id -> Uuid,
        /// `plant` or `update`.
        kind -> Varchar,
        /// Set for updates only; references the planted tree.
        parent_id -> Nullable<Uuid>,
        species -> Varchar,
        verified -> Bool,
        authenticity_score -> Int2,
        created_at -> Timestamptz,
        verified_at -> Nullable<Timestamptz>,
    }
}

diesel::table! {
    /// Append-only points ledger.
    ledger_entries (id) {
        id -> Uuid,
        user_id -> Uuid,
        delta -> Int4,
        category -> Varchar,
        reason -> Nullable<Text>,
        tree_record_id -> Nullable<Uuid>,
        created_at -> Timestamptz,
    }
}

diesel::table! {
    /// Certification catalog; names are unique.
    certifications (id) {
        id -> Uuid,
        name -> Varchar,
        description -> Text,
        icon -> Varchar,
        tier -> Varchar,
        required_points -> Int8,
        required_trees -> Int8,
        required_verification_rate -> Int4,
    }
}

diesel::table! {
    /// Certifications earned by users. The composite key keeps awards unique.
    user_certifications (user_id, certification_id) {
        user_id -> Uuid,
        certification_id -> Uuid,
        points_at_award -> Int8,
        earned_at -> Timestamptz,
    }
}

diesel::table! {
    /// Per-user notification inbox.
    notifications (id) {
        id -> Uuid,
        recipient_id -> Uuid,
        sender_id -> Nullable<Uuid>,
        kind -> Varchar,
        title -> Varchar,
        message -> Text,
        tree_record_id -> Nullable<Uuid>,
        points -> Nullable<Int4>,
        is_read -> Bool,
        created_at -> Timestamptz,
        read_at -> Nullable<Timestamptz>,
    }
}

diesel::joinable!(tree_records -> users (owner_id));
diesel::joinable!(ledger_entries -> users (user_id));
diesel::joinable!(user_certifications -> users (user_id));
diesel::joinable!(user_certifications -> certifications (certification_id));
diesel::joinable!(notifications -> users (recipient_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    tree_records,
    ledger_entries,
    certifications,
    user_certifications,
    notifications,
);
