// Mirrors sql/schema.sql.

diesel::table! {
    users (id) {
        id -> Integer,
        email -> Text,
        role -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    students (id) {
        id -> Integer,
        user_id -> Integer,
        full_name -> Text,
        group_name -> Text,
        course -> Integer,
    }
}

diesel::table! {
    teachers (id) {
        id -> Integer,
        user_id -> Integer,
        full_name -> Text,
    }
}

diesel::table! {
    chats (id) {
        id -> Integer,
        kind -> Text,
        subject -> Nullable<Text>,
        created_at -> Timestamp,
        updated_at -> Timestamp,
    }
}

diesel::table! {
    chat_participants (id) {
        id -> Integer,
        chat_id -> Integer,
        user_id -> Integer,
        joined_at -> Timestamp,
        last_read_at -> Nullable<Timestamp>,
    }
}

diesel::table! {
    messages (id) {
        id -> Integer,
        chat_id -> Integer,
        sender_id -> Integer,
        content -> Text,
        reply_to -> Nullable<Integer>,
        created_at -> Timestamp,
        is_read -> Bool,
    }
}

diesel::table! {
    notifications (id) {
        id -> Integer,
        user_id -> Integer,
        title -> Text,
        body -> Text,
        category -> Text,
        reference_id -> Nullable<Integer>,
        payload -> Nullable<Text>,
        is_read -> Bool,
        created_at -> Timestamp,
    }
}

diesel::table! {
    push_tokens (id) {
        id -> Integer,
        user_id -> Integer,
        token -> Text,
        created_at -> Timestamp,
    }
}

diesel::table! {
    announcements (id) {
        id -> Integer,
        teacher_id -> Integer,
        title -> Text,
        content -> Text,
        recipient_type -> Text,
        recipient_id -> Nullable<Text>,
        is_pinned -> Bool,
        created_at -> Timestamp,
    }
}

diesel::joinable!(students -> users (user_id));
diesel::joinable!(teachers -> users (user_id));
diesel::joinable!(chat_participants -> chats (chat_id));
diesel::joinable!(chat_participants -> users (user_id));
diesel::joinable!(messages -> chats (chat_id));
diesel::joinable!(notifications -> users (user_id));
diesel::joinable!(push_tokens -> users (user_id));

diesel::allow_tables_to_appear_in_same_query!(
    users,
    students,
    teachers,
    chats,
    chat_participants,
    messages,
    notifications,
    push_tokens,
    announcements,
);
