#[cfg(test)]
mod tests {
    use std::time::Duration;

    use axum::Router;
    use axum::body::{Body, to_bytes};
    use axum::http::{Request, StatusCode, header};
    use diesel::{ExpressionMethods, RunQueryDsl};
    use serde_json::{Value, json};
    use tower::ServiceExt;
    use url::Url;

    use campus_messenger::integration::{self, Env, db, push};
    use campus_messenger::schema::{students, teachers, users};
    use campus_messenger::state::AppState;

    struct TestApp {
        router: Router,
        pool: db::Pool,
    }

    fn app() -> TestApp {
        let config = integration::Config {
            env: Env::Local,
            db: db::Config::memory(),
            // nothing listens on the discard port, every push fails fast
            push: push::Config::new(
                Url::parse("http://127.0.0.1:9/push").unwrap(),
                Duration::from_millis(200),
            ),
            join_secret: None,
            ws_buffer: 16,
        };
        let pool = config.db.connect();

        TestApp {
            router: campus_messenger::app(&config.env, AppState::init(&config, pool.clone())),
            pool,
        }
    }

    fn user(app: &TestApp, email: &str, role: &str) -> i32 {
        let mut conn = app.pool.get().unwrap();
        diesel::insert_into(users::table)
            .values((users::email.eq(email), users::role.eq(role)))
            .returning(users::id)
            .get_result::<i32>(&mut conn)
            .unwrap()
    }

    fn student(app: &TestApp, name: &str, group: &str) -> i32 {
        let id = user(app, &format!("{name}@students.test"), "student");
        diesel::insert_into(students::table)
            .values((
                students::user_id.eq(id),
                students::full_name.eq(name),
                students::group_name.eq(group),
                students::course.eq(2),
            ))
            .execute(&mut app.pool.get().unwrap())
            .unwrap();
        id
    }

    fn teacher(app: &TestApp, name: &str) -> i32 {
        let id = user(app, &format!("{name}@teachers.test"), "teacher");
        diesel::insert_into(teachers::table)
            .values((teachers::user_id.eq(id), teachers::full_name.eq(name)))
            .execute(&mut app.pool.get().unwrap())
            .unwrap();
        id
    }

    async fn call(app: &TestApp, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json");
        let request = match body {
            Some(body) => request.body(Body::from(body.to_string())).unwrap(),
            None => request.body(Body::empty()).unwrap(),
        };

        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();

        (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
    }

    async fn personal_chat(app: &TestApp, student: i32, teacher: i32) -> i64 {
        let (_, body) = call(
            app,
            "POST",
            "/api/chats/personal",
            Some(json!({ "student_id": student, "teacher_id": teacher })),
        )
        .await;
        body["data"]["chat_id"].as_i64().unwrap()
    }

    #[tokio::test]
    async fn test_health() {
        let app = app();

        let (status, body) = call(&app, "GET", "/api/health", None).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["message"], "Server is working!");
    }

    #[tokio::test]
    async fn test_personal_chat_is_created_once() {
        let app = app();
        let jora = student(&app, "jora", "IT-21");
        let igor = teacher(&app, "igor");
        let params = json!({ "student_id": jora, "teacher_id": igor });

        let (first_status, first) =
            call(&app, "POST", "/api/chats/personal", Some(params.clone())).await;
        let (second_status, second) = call(&app, "POST", "/api/chats/personal", Some(params)).await;

        assert_eq!(first_status, StatusCode::CREATED);
        assert_eq!(second_status, StatusCode::OK);
        assert_eq!(first["data"]["chat_id"], second["data"]["chat_id"]);
    }

    #[tokio::test]
    async fn test_send_read_and_count() {
        let app = app();
        let jora = student(&app, "jora", "IT-21");
        let igor = teacher(&app, "igor");
        let chat_id = personal_chat(&app, jora, igor).await;

        let (status, sent) = call(
            &app,
            "POST",
            &format!("/api/chats/{chat_id}/messages"),
            Some(json!({ "sender_id": igor, "content": "hi" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(sent["success"], true);
        assert_eq!(sent["data"]["is_read"], false);

        let unread_uri = format!("/api/chats/{chat_id}/unread-count?user_id={jora}");
        let (_, unread) = call(&app, "GET", &unread_uri, None).await;
        assert_eq!(unread["data"]["unread_count"], 1);

        let (_, own) = call(
            &app,
            "GET",
            &format!("/api/chats/{chat_id}/unread-count?user_id={igor}"),
            None,
        )
        .await;
        assert_eq!(own["data"]["unread_count"], 0);

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/chats/{chat_id}/mark-read"),
            Some(json!({ "user_id": jora })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);

        let (_, unread) = call(&app, "GET", &unread_uri, None).await;
        assert_eq!(unread["data"]["unread_count"], 0);

        let (_, page) = call(
            &app,
            "GET",
            &format!("/api/chats/{chat_id}/messages?page=1&per_page=10"),
            None,
        )
        .await;
        assert_eq!(page["data"]["total"], 1);
        assert_eq!(page["data"]["items"][0]["is_read"], true);

        let (_, inbox) = call(
            &app,
            "GET",
            &format!("/api/notifications?user_id={jora}&type=message"),
            None,
        )
        .await;
        assert_eq!(inbox["data"]["total"], 1);
        assert_eq!(inbox["data"]["items"][0]["title"], "New message");
    }

    #[tokio::test]
    async fn test_validation_errors() {
        let app = app();
        let jora = student(&app, "jora", "IT-21");
        let igor = teacher(&app, "igor");
        let chat_id = personal_chat(&app, jora, igor).await;

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/chats/{chat_id}/messages"),
            Some(json!({ "sender_id": jora })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "missing required field: content");

        let (status, _) = call(
            &app,
            "POST",
            &format!("/api/chats/{chat_id}/messages/read"),
            Some(json!({ "user_id": jora, "message_ids": [] })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(
            &app,
            "POST",
            "/api/push-token",
            Some(json!({ "user_id": jora, "token": "garbage" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = call(&app, "GET", "/api/chats/999/unread-count?user_id=1", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_announcement_for_missing_user_is_not_stored() {
        let app = app();
        let igor = teacher(&app, "igor");

        let (status, body) = call(
            &app,
            "POST",
            "/api/announcements",
            Some(json!({
                "teacher_id": igor,
                "title": "Exam",
                "content": "Room 204",
                "recipient_type": "individual",
                "recipient_id": 404
            })),
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["success"], false);

        let (_, list) = call(&app, "GET", &format!("/api/announcements?user_id={igor}"), None).await;
        assert_eq!(list["data"], json!([]));
    }

    #[tokio::test]
    async fn test_announcement_reaches_group() {
        let app = app();
        let igor = teacher(&app, "igor");
        let jora = student(&app, "jora", "IT-21");

        let (status, created) = call(
            &app,
            "POST",
            "/api/announcements",
            Some(json!({
                "teacher_id": igor,
                "title": "Exam",
                "content": "Room 204",
                "recipient_type": "group",
                "recipient_id": "IT-21",
                "is_pinned": true
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        let id = created["data"]["announcement_id"].as_i64().unwrap();

        let (_, found) = call(&app, "GET", &format!("/api/announcements/{id}"), None).await;
        assert_eq!(found["data"]["recipient_type"], "group");
        assert_eq!(found["data"]["is_pinned"], true);

        let (_, inbox) = call(&app, "GET", &format!("/api/notifications?user_id={jora}"), None).await;
        assert_eq!(inbox["data"]["items"][0]["body"], "Exam: Room 204");
    }

    #[tokio::test]
    async fn test_malformed_body_is_enveloped() {
        let app = app();
        let jora = student(&app, "jora", "IT-21");
        let igor = teacher(&app, "igor");
        let chat_id = personal_chat(&app, jora, igor).await;

        let (status, body) = call(
            &app,
            "POST",
            &format!("/api/chats/{chat_id}/messages"),
            Some(json!({ "sender_id": "seven", "content": "hi" })),
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("invalid request body"));
    }

    #[tokio::test]
    async fn test_non_json_body_is_enveloped() {
        let app = app();

        let request = Request::builder()
            .method("POST")
            .uri("/api/push-token")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from("{not json"))
            .unwrap();
        let response = app.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
    }

    #[tokio::test]
    async fn test_malformed_path_is_enveloped() {
        let app = app();

        let (status, body) = call(&app, "GET", "/api/chats/abc/unread-count?user_id=1", None).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("invalid path"));
    }

    #[tokio::test]
    async fn test_malformed_query_is_enveloped() {
        let app = app();
        let jora = student(&app, "jora", "IT-21");
        let igor = teacher(&app, "igor");
        let chat_id = personal_chat(&app, jora, igor).await;

        let (status, body) = call(
            &app,
            "GET",
            &format!("/api/chats/{chat_id}/unread-count?user_id=seven"),
            None,
        )
        .await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"].as_str().unwrap().starts_with("invalid query"));
    }

    #[tokio::test]
    async fn test_huge_page_is_empty() {
        let app = app();
        let jora = student(&app, "jora", "IT-21");
        let igor = teacher(&app, "igor");
        let chat_id = personal_chat(&app, jora, igor).await;

        let (status, page) = call(
            &app,
            "GET",
            &format!("/api/chats/{chat_id}/messages?page={}", i64::MAX),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(page["data"]["items"], json!([]));

        let (status, _) = call(
            &app,
            "GET",
            &format!("/api/notifications?user_id={jora}&page={}", i64::MAX),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
    }
}
