table! {
    users (id) {
        id -> Uuid,
        email -> Text,
        name -> Nullable<Text>,
        phone -> Nullable<Text>,
        address_street -> Nullable<Text>,
        address_city -> Nullable<Text>,
        address_state -> Nullable<Text>,
        address_zip -> Nullable<Text>,
        role -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    subscriptions (id) {
        id -> Uuid,
        user_id -> Uuid,
        plan_type -> Text,
        frequency -> Text,
        pickup_day_1 -> Text,
        pickup_day_2 -> Nullable<Text>,
        pickup_window_start -> Text,
        pickup_window_end -> Text,
        bag_count -> Int4,
        status -> Text,
        billing_subscription_id -> Nullable<Text>,
        billing_customer_id -> Nullable<Text>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        paused_at -> Nullable<Timestamptz>,
        cancelled_at -> Nullable<Timestamptz>,
        last_event_at -> Nullable<Timestamptz>,
    }
}

table! {
    pickups (id) {
        id -> Uuid,
        subscription_id -> Uuid,
        provider_id -> Nullable<Uuid>,
        scheduled_date -> Date,
        scheduled_window_start -> Text,
        scheduled_window_end -> Text,
        status -> Text,
        pickup_photo_url -> Nullable<Text>,
        delivery_photo_url -> Nullable<Text>,
        picked_up_at -> Nullable<Timestamptz>,
        delivered_at -> Nullable<Timestamptz>,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
    }
}

table! {
    waitlist (id) {
        id -> Uuid,
        email -> Text,
        zip_code -> Text,
        created_at -> Timestamptz,
    }
}

table! {
    support_tickets (id) {
        id -> Uuid,
        user_id -> Uuid,
        ticket_type -> Text,
        subject -> Text,
        message -> Text,
        status -> Text,
        created_at -> Timestamptz,
        updated_at -> Timestamptz,
        resolved_at -> Nullable<Timestamptz>,
    }
}

table! {
    processed_webhook_events (event_id) {
        event_id -> Text,
        event_type -> Text,
        processed_at -> Timestamptz,
    }
}

table! {
    operators (operator_id) {
        operator_id -> Uuid,
        username -> Text,
        password_hash -> Text,
    }
}

joinable!(pickups -> subscriptions (subscription_id));
joinable!(subscriptions -> users (user_id));
joinable!(support_tickets -> users (user_id));

allow_tables_to_appear_in_same_query!(
    users,
    subscriptions,
    pickups,
    waitlist,
    support_tickets,
    processed_webhook_events,
    operators,
);
