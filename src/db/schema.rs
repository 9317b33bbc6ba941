diesel::table! {
    users (id) {
        id -> BigInt,
        display_name -> Text,
        website_url -> Nullable<Text>,
        avatar_url -> Nullable<Text>,
        registered_at -> Text,
    }
}

diesel::table! {
    user_meta (user_id, meta_key) {
        user_id -> BigInt,
        meta_key -> Text,
        meta_value -> Text,
    }
}

diesel::table! {
    profile_fields (id) {
        id -> BigInt,
        slug -> Text,
        label -> Text,
    }
}

diesel::table! {
    profile_field_values (user_id, field_id) {
        user_id -> BigInt,
        field_id -> BigInt,
        value -> Text,
    }
}

diesel::table! {
    view_events (id) {
        id -> Text,
        profile_user_id -> BigInt,
        viewer_id -> BigInt,
        ip_address -> Text,
        viewed_on -> Text,
        viewed_at -> Text,
    }
}

diesel::table! {
    connections (id) {
        id -> Text,
        initiator_id -> BigInt,
        friend_id -> BigInt,
        status -> Text,
        created_at -> Text,
    }
}

diesel::joinable!(profile_field_values -> profile_fields (field_id));

diesel::allow_tables_to_appear_in_same_query!(
    connections,
    profile_field_values,
    profile_fields,
    user_meta,
    users,
    view_events,
);
