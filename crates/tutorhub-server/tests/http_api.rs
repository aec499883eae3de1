use serde_json::{json, Value};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tutorhub_model::{Role, TimeOfDay, UserId, Weekday};
use tutorhub_server::{build_router, ApiConfig, AppState, RateLimitConfig};
use tutorhub_store::{NewUser, Store};

async fn spawn_app(api: ApiConfig) -> (std::net::SocketAddr, AppState) {
    let store = Store::open_in_memory().expect("open store");
    let state = AppState::with_config(store, api);
    let app = build_router(state.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind listener");
    let addr = listener.local_addr().expect("local addr");
    tokio::spawn(async move { axum::serve(listener, app).await.expect("serve app") });
    (addr, state)
}

async fn send_raw(
    addr: std::net::SocketAddr,
    method: &str,
    path: &str,
    token: Option<&str>,
    body: Option<&Value>,
) -> (u16, String, String) {
    let mut stream = tokio::net::TcpStream::connect(addr)
        .await
        .expect("connect server");
    let payload = body.map(Value::to_string).unwrap_or_default();
    let mut req = format!("{method} {path} HTTP/1.1\r\nHost: {addr}\r\nConnection: close\r\n");
    if let Some(token) = token {
        req.push_str(&format!("Authorization: Bearer {token}\r\n"));
    }
    if body.is_some() {
        req.push_str("Content-Type: application/json\r\n");
    }
    req.push_str(&format!("Content-Length: {}\r\n\r\n", payload.len()));
    req.push_str(&payload);
    stream
        .write_all(req.as_bytes())
        .await
        .expect("write request");
    let mut response = String::new();
    stream
        .read_to_string(&mut response)
        .await
        .expect("read response");
    let (head, body) = response
        .split_once("\r\n\r\n")
        .expect("http response must have separator");
    let status = head
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .expect("http status");
    (status, head.to_string(), body.to_string())
}

fn seed_user(state: &AppState, role: Role, token: &str) -> UserId {
    state
        .store
        .create_user(NewUser {
            id: None,
            name: Some(format!("{token}-name")),
            full_name: None,
            email: Some(format!("{token}@example.com")),
            role,
            token_identifier: token.to_string(),
        })
        .expect("seed user")
        .id
}

fn error_code(body: &str) -> String {
    let json: Value = serde_json::from_str(body).expect("error json");
    json.get("error")
        .and_then(|e| e.get("code"))
        .and_then(Value::as_str)
        .expect("error code")
        .to_string()
}

fn booking_body(tutor_id: &UserId, start_time: &str) -> Value {
    json!({
        "subject": "Mathematics",
        "tutorId": tutor_id,
        "sessionDate": "2026-09-01",
        "startTime": start_time,
    })
}

#[tokio::test]
async fn booking_lifecycle_and_conflicts() {
    let (addr, state) = spawn_app(ApiConfig::default()).await;
    let tutor = seed_user(&state, Role::Tutor, "tok-tutor");
    seed_user(&state, Role::Student, "tok-student");
    seed_user(&state, Role::Student, "tok-other-student");

    // no token -> 401
    let (status, _, body) = send_raw(addr, "GET", "/v1/sessions", None, None).await;
    assert_eq!(status, 401);
    assert_eq!(error_code(&body), "unauthorized");

    // booking defaults to a 60-minute scheduled session
    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/v1/sessions",
        Some("tok-student"),
        Some(&booking_body(&tutor, "10:00")),
    )
    .await;
    assert_eq!(status, 201, "unexpected body: {body}");
    let created: Value = serde_json::from_str(&body).expect("session json");
    let session = created.get("session").expect("session envelope");
    assert_eq!(session["status"], "scheduled");
    assert_eq!(session["duration_minutes"], 60);
    assert_eq!(session["tutor"]["id"], json!(tutor));
    let session_id = session["id"].as_str().expect("id").to_string();

    // overlapping booking by another student -> 409
    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/v1/sessions",
        Some("tok-other-student"),
        Some(&booking_body(&tutor, "10:30")),
    )
    .await;
    assert_eq!(status, 409);
    assert_eq!(error_code(&body), "booking_conflict");

    // back-to-back is allowed
    let (status, _, _) = send_raw(
        addr,
        "POST",
        "/v1/sessions",
        Some("tok-other-student"),
        Some(&booking_body(&tutor, "11:00")),
    )
    .await;
    assert_eq!(status, 201);

    // each student only sees their own bookings
    let (status, _, body) = send_raw(addr, "GET", "/v1/sessions", Some("tok-student"), None).await;
    assert_eq!(status, 200);
    let listing: Value = serde_json::from_str(&body).expect("sessions json");
    let sessions = listing["sessions"].as_array().expect("array");
    assert_eq!(sessions.len(), 1);
    assert_eq!(sessions[0]["id"], json!(session_id));

    // cancelling frees the slot for a rebooking
    let (status, _, _) = send_raw(
        addr,
        "PATCH",
        &format!("/v1/sessions/{session_id}"),
        Some("tok-student"),
        Some(&json!({"status": "cancelled"})),
    )
    .await;
    assert_eq!(status, 200);
    let (status, _, _) = send_raw(
        addr,
        "POST",
        "/v1/sessions",
        Some("tok-other-student"),
        Some(&booking_body(&tutor, "10:00")),
    )
    .await;
    assert_eq!(status, 201);
}

#[tokio::test]
async fn completed_sessions_are_terminal() {
    let (addr, state) = spawn_app(ApiConfig::default()).await;
    let tutor = seed_user(&state, Role::Tutor, "tok-tutor");
    seed_user(&state, Role::Student, "tok-student");

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/v1/sessions",
        Some("tok-student"),
        Some(&booking_body(&tutor, "09:00")),
    )
    .await;
    assert_eq!(status, 201);
    let created: Value = serde_json::from_str(&body).expect("session json");
    let session_id = created["session"]["id"].as_str().expect("id").to_string();

    let (status, _, _) = send_raw(
        addr,
        "PATCH",
        &format!("/v1/sessions/{session_id}"),
        Some("tok-tutor"),
        Some(&json!({"status": "completed"})),
    )
    .await;
    assert_eq!(status, 200);

    let (status, _, body) = send_raw(
        addr,
        "PATCH",
        &format!("/v1/sessions/{session_id}"),
        Some("tok-tutor"),
        Some(&json!({"status": "scheduled"})),
    )
    .await;
    assert_eq!(status, 400);
    assert_eq!(error_code(&body), "validation_failed");
}

#[tokio::test]
async fn parent_visibility_requires_a_link() {
    let (addr, state) = spawn_app(ApiConfig::default()).await;
    let tutor = seed_user(&state, Role::Tutor, "tok-tutor");
    let student = seed_user(&state, Role::Student, "tok-student");
    let parent = seed_user(&state, Role::Parent, "tok-parent");

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/v1/sessions",
        Some("tok-student"),
        Some(&booking_body(&tutor, "14:00")),
    )
    .await;
    assert_eq!(status, 201);
    let created: Value = serde_json::from_str(&body).expect("session json");
    let session_id = created["session"]["id"].as_str().expect("id").to_string();

    // unlinked parent cannot read the session or the progress
    let (status, _, _) = send_raw(
        addr,
        "GET",
        &format!("/v1/sessions/{session_id}"),
        Some("tok-parent"),
        None,
    )
    .await;
    assert_eq!(status, 403);
    let (status, _, body) = send_raw(
        addr,
        "GET",
        &format!("/v1/progress?student_id={}", student.as_str()),
        Some("tok-parent"),
        None,
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(error_code(&body), "forbidden");

    state
        .store
        .add_parent_link(&parent, &student, Some("mother"), true)
        .expect("link");

    let (status, _, _) = send_raw(
        addr,
        "GET",
        &format!("/v1/sessions/{session_id}"),
        Some("tok-parent"),
        None,
    )
    .await;
    assert_eq!(status, 200);
    let (status, _, body) = send_raw(
        addr,
        "GET",
        &format!("/v1/progress?student_id={}", student.as_str()),
        Some("tok-parent"),
        None,
    )
    .await;
    assert_eq!(status, 200);
    let progress: Value = serde_json::from_str(&body).expect("progress json");
    assert_eq!(progress["progress"]["summary"]["completedTasks"], 0);
}

#[tokio::test]
async fn subject_mutations_are_admin_only() {
    let (addr, state) = spawn_app(ApiConfig::default()).await;
    seed_user(&state, Role::Student, "tok-student");
    seed_user(&state, Role::Admin, "tok-admin");

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/v1/subjects",
        Some("tok-student"),
        Some(&json!({"name": "Latin"})),
    )
    .await;
    assert_eq!(status, 403);
    assert_eq!(error_code(&body), "forbidden");

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/v1/subjects",
        Some("tok-admin"),
        Some(&json!({"name": "Latin", "level": "beginner"})),
    )
    .await;
    assert_eq!(status, 201);
    let created: Value = serde_json::from_str(&body).expect("subject json");
    let subject_id = created["subject"]["id"].as_str().expect("id").to_string();

    // PATCH without a name is rejected
    let (status, _, _) = send_raw(
        addr,
        "PATCH",
        &format!("/v1/subjects/{subject_id}"),
        Some("tok-admin"),
        Some(&json!({"description": "Classical language"})),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _, _) = send_raw(
        addr,
        "DELETE",
        &format!("/v1/subjects/{subject_id}"),
        Some("tok-admin"),
        None,
    )
    .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn quiz_generator_splits_question_types() {
    let (addr, state) = spawn_app(ApiConfig::default()).await;
    seed_user(&state, Role::Tutor, "tok-tutor");

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/v1/ai/quiz",
        Some("tok-tutor"),
        Some(&json!({"subject": "Mathematics", "topic": "Algebra", "questionCount": 5})),
    )
    .await;
    assert_eq!(status, 200, "unexpected body: {body}");
    let json: Value = serde_json::from_str(&body).expect("quiz json");
    let questions = json["quiz"]["questions"].as_array().expect("questions");
    assert_eq!(questions.len(), 5);
    let mc = questions
        .iter()
        .filter(|q| q["type"] == "multiple-choice")
        .count();
    assert_eq!(mc, 3);
    assert_eq!(questions.len() - mc, 2);
    assert!(json["quiz"]["ai_generated"].as_bool().expect("flag"));

    // both question types disabled is a validation error
    let (status, _, _) = send_raw(
        addr,
        "POST",
        "/v1/ai/quiz",
        Some("tok-tutor"),
        Some(&json!({
            "subject": "Mathematics",
            "topic": "Algebra",
            "includeMultipleChoice": false,
            "includeShortAnswer": false,
        })),
    )
    .await;
    assert_eq!(status, 400);
}

#[tokio::test]
async fn slots_respect_windows_bookings_and_exceptions() {
    let (addr, state) = spawn_app(ApiConfig::default()).await;
    let tutor = seed_user(&state, Role::Tutor, "tok-tutor");
    seed_user(&state, Role::Student, "tok-student");

    // 2026-09-01 is a Tuesday; give the tutor a Tuesday morning window.
    state
        .store
        .add_availability_window(
            &tutor,
            Weekday::Tuesday,
            TimeOfDay::parse("09:00").expect("start"),
            TimeOfDay::parse("12:00").expect("end"),
            true,
        )
        .expect("window");

    let slots_path = format!("/v1/tutors/{}/slots?date=2026-09-01", tutor.as_str());
    let (status, _, body) = send_raw(addr, "GET", &slots_path, Some("tok-student"), None).await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("slots json");
    let slots = json["slots"].as_array().expect("slots");
    assert_eq!(slots.first().and_then(Value::as_str), Some("09:00"));
    assert_eq!(slots.len(), 5);

    // a booking carves its interval out of the grid
    let (status, _, _) = send_raw(
        addr,
        "POST",
        "/v1/sessions",
        Some("tok-student"),
        Some(&booking_body(&tutor, "10:00")),
    )
    .await;
    assert_eq!(status, 201);
    let (_, _, body) = send_raw(addr, "GET", &slots_path, Some("tok-student"), None).await;
    let json: Value = serde_json::from_str(&body).expect("slots json");
    let slots: Vec<&str> = json["slots"]
        .as_array()
        .expect("slots")
        .iter()
        .filter_map(Value::as_str)
        .collect();
    assert_eq!(slots, ["09:00", "11:00"]);

    // a wrong-weekday date yields no slots at all
    let (_, _, body) = send_raw(
        addr,
        "GET",
        &format!("/v1/tutors/{}/slots?date=2026-09-02", tutor.as_str()),
        Some("tok-student"),
        None,
    )
    .await;
    let json: Value = serde_json::from_str(&body).expect("slots json");
    assert!(json["slots"].as_array().expect("slots").is_empty());

    // a full-day unavailability exception empties the grid
    let (status, _, _) = send_raw(
        addr,
        "POST",
        "/v1/tutors/availability/exceptions",
        Some("tok-tutor"),
        Some(&json!({"exceptionDate": "2026-09-01", "isAvailable": false, "reason": "holiday"})),
    )
    .await;
    assert_eq!(status, 201);
    let (_, _, body) = send_raw(addr, "GET", &slots_path, Some("tok-student"), None).await;
    let json: Value = serde_json::from_str(&body).expect("slots json");
    assert!(json["slots"].as_array().expect("slots").is_empty());
}

#[tokio::test]
async fn tutor_listing_filters_by_subject_id() {
    let (addr, state) = spawn_app(ApiConfig::default()).await;
    let teaching = seed_user(&state, Role::Tutor, "tok-t1");
    seed_user(&state, Role::Tutor, "tok-t2");
    seed_user(&state, Role::Student, "tok-student");
    let math = state
        .store
        .list_subjects()
        .expect("subjects")
        .into_iter()
        .find(|s| s.name == "Mathematics")
        .expect("seeded");
    state
        .store
        .add_tutor_subject(&teaching, &math.id, "advanced")
        .expect("link");

    let (status, _, body) = send_raw(addr, "GET", "/v1/tutors", Some("tok-student"), None).await;
    assert_eq!(status, 200, "unexpected body: {body}");
    let json: Value = serde_json::from_str(&body).expect("tutors json");
    assert_eq!(json["tutors"].as_array().expect("tutors").len(), 2);

    let (status, _, body) = send_raw(
        addr,
        "GET",
        &format!("/v1/tutors?subject={}", math.id),
        Some("tok-student"),
        None,
    )
    .await;
    assert_eq!(status, 200, "unexpected body: {body}");
    let json: Value = serde_json::from_str(&body).expect("tutors json");
    let tutors = json["tutors"].as_array().expect("tutors");
    assert_eq!(tutors.len(), 1);
    assert_eq!(tutors[0]["id"], json!(teaching));
    assert_eq!(tutors[0]["subjects"][0]["subject_id"], json!(math.id));
}

#[tokio::test]
async fn availability_management_is_tutor_scoped() {
    let (addr, state) = spawn_app(ApiConfig::default()).await;
    let tutor = seed_user(&state, Role::Tutor, "tok-tutor");
    seed_user(&state, Role::Student, "tok-student");

    // students cannot publish availability
    let window_body = json!({"dayOfWeek": "monday", "startTime": "09:00", "endTime": "11:00"});
    let (status, _, _) = send_raw(
        addr,
        "POST",
        "/v1/tutors/availability",
        Some("tok-student"),
        Some(&window_body),
    )
    .await;
    assert_eq!(status, 403);

    // dayOfWeek also accepts the numeric form the booking form submits
    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/v1/tutors/availability",
        Some("tok-tutor"),
        Some(&json!({"dayOfWeek": 1, "startTime": "09:00", "endTime": "11:00"})),
    )
    .await;
    assert_eq!(status, 201, "unexpected body: {body}");
    let created: Value = serde_json::from_str(&body).expect("availability json");
    assert_eq!(created["availability"]["day"], "monday");
    let window_id = created["availability"]["id"]
        .as_str()
        .expect("id")
        .to_string();

    // inverted ranges are rejected
    let (status, _, _) = send_raw(
        addr,
        "POST",
        "/v1/tutors/availability",
        Some("tok-tutor"),
        Some(&json!({"dayOfWeek": "monday", "startTime": "11:00", "endTime": "09:00"})),
    )
    .await;
    assert_eq!(status, 400);

    let (status, _, body) = send_raw(
        addr,
        "GET",
        &format!("/v1/tutors/availability?tutor_id={}", tutor.as_str()),
        Some("tok-student"),
        None,
    )
    .await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("availability json");
    assert_eq!(json["availability"].as_array().expect("windows").len(), 1);
    assert!(json["bookedSessions"].as_array().expect("booked").is_empty());

    // only the owner (or an admin) can delete a window
    let (status, _, _) = send_raw(
        addr,
        "DELETE",
        &format!("/v1/tutors/availability/{window_id}"),
        Some("tok-student"),
        None,
    )
    .await;
    assert_eq!(status, 403);
    let (status, _, _) = send_raw(
        addr,
        "DELETE",
        &format!("/v1/tutors/availability/{window_id}"),
        Some("tok-tutor"),
        None,
    )
    .await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn ops_endpoints_serve_without_auth() {
    let (addr, _state) = spawn_app(ApiConfig::default()).await;

    let (status, _, body) = send_raw(addr, "GET", "/healthz", None, None).await;
    assert_eq!(status, 200);
    assert_eq!(body, "ok");

    let (status, _, body) = send_raw(addr, "GET", "/readyz", None, None).await;
    assert_eq!(status, 200);
    assert_eq!(body, "ready");

    let (status, headers, body) = send_raw(addr, "GET", "/v1/version", None, None).await;
    assert_eq!(status, 200);
    assert!(headers.contains("x-request-id: "));
    let json: Value = serde_json::from_str(&body).expect("version json");
    assert_eq!(json["server"]["crate"], "tutorhub-server");

    let (status, _, body) = send_raw(addr, "GET", "/metrics", None, None).await;
    assert_eq!(status, 200);
    assert!(body.contains("tutorhub_build_info"));
    assert!(body.contains("tutorhub_http_requests_total"));

    let (status, _, body) = send_raw(addr, "GET", "/v1/openapi.json", None, None).await;
    assert_eq!(status, 200);
    let spec: Value = serde_json::from_str(&body).expect("openapi json");
    assert!(spec["paths"]["/v1/sessions"].is_object());
}

#[tokio::test]
async fn rate_limit_returns_429_when_enabled() {
    let api = ApiConfig {
        rate_limit_enabled: true,
        rate_limit_per_ip: RateLimitConfig {
            capacity: 2.0,
            refill_per_sec: 0.0,
        },
        ..ApiConfig::default()
    };
    let (addr, state) = spawn_app(api).await;
    seed_user(&state, Role::Student, "tok-student");

    for _ in 0..2 {
        let (status, _, _) =
            send_raw(addr, "GET", "/v1/subjects", Some("tok-student"), None).await;
        assert_eq!(status, 200);
    }
    let (status, _, body) =
        send_raw(addr, "GET", "/v1/subjects", Some("tok-student"), None).await;
    assert_eq!(status, 429);
    assert_eq!(error_code(&body), "rate_limited");

    // ops endpoints are exempt from the limiter
    let (status, _, _) = send_raw(addr, "GET", "/healthz", None, None).await;
    assert_eq!(status, 200);
}

#[tokio::test]
async fn recommendations_persist_and_scope_to_student() {
    let (addr, state) = spawn_app(ApiConfig::default()).await;
    let student = seed_user(&state, Role::Student, "tok-student");
    seed_user(&state, Role::Student, "tok-other-student");

    let (status, _, body) = send_raw(
        addr,
        "POST",
        "/v1/ai/recommendations",
        Some("tok-student"),
        Some(&json!({"subject": "Mathematics"})),
    )
    .await;
    assert_eq!(status, 200, "unexpected body: {body}");
    let json: Value = serde_json::from_str(&body).expect("recommendations json");
    let recs = json["recommendations"].as_array().expect("array");
    assert_eq!(recs.len(), 4);
    assert_eq!(recs[0]["student_id"], json!(student));
    assert!(recs.iter().all(|r| !r["id"].as_str().expect("id").is_empty()));

    // a student cannot request recommendations for someone else
    let (status, _, _) = send_raw(
        addr,
        "POST",
        "/v1/ai/recommendations",
        Some("tok-other-student"),
        Some(&json!({"subject": "Mathematics", "studentId": student})),
    )
    .await;
    assert_eq!(status, 403);
}

#[tokio::test]
async fn admins_list_children_per_parent() {
    let (addr, state) = spawn_app(ApiConfig::default()).await;
    seed_user(&state, Role::Admin, "tok-admin");
    let parent = seed_user(&state, Role::Parent, "tok-parent");
    let student = seed_user(&state, Role::Student, "tok-student");
    state
        .store
        .add_parent_link(&parent, &student, Some("mother"), true)
        .expect("link");

    // an admin must name the family
    let (status, _, body) = send_raw(addr, "GET", "/v1/children", Some("tok-admin"), None).await;
    assert_eq!(status, 400);
    assert_eq!(error_code(&body), "invalid_query_parameter");

    let (status, _, body) = send_raw(
        addr,
        "GET",
        &format!("/v1/children?parent_id={parent}"),
        Some("tok-admin"),
        None,
    )
    .await;
    assert_eq!(status, 200, "unexpected body: {body}");
    let json: Value = serde_json::from_str(&body).expect("children json");
    let children = json["children"].as_array().expect("children");
    assert_eq!(children.len(), 1);
    assert_eq!(children[0]["id"], json!(student));
    assert_eq!(children[0]["relationship"], "mother");

    // parents keep listing their own children without the parameter
    let (status, _, body) = send_raw(addr, "GET", "/v1/children", Some("tok-parent"), None).await;
    assert_eq!(status, 200);
    let json: Value = serde_json::from_str(&body).expect("children json");
    assert_eq!(json["children"].as_array().expect("children").len(), 1);
}

#[tokio::test]
async fn draining_server_refuses_api_work_but_keeps_probes() {
    let (addr, state) = spawn_app(ApiConfig::default()).await;
    seed_user(&state, Role::Student, "tok-student");

    state
        .accepting_requests
        .store(false, std::sync::atomic::Ordering::Relaxed);

    let (status, _, body) = send_raw(addr, "GET", "/v1/sessions", Some("tok-student"), None).await;
    assert_eq!(status, 503);
    assert_eq!(error_code(&body), "not_ready");

    // liveness stays up so the orchestrator does not kill the drain early
    let (status, _, body) = send_raw(addr, "GET", "/healthz", None, None).await;
    assert_eq!(status, 200);
    assert_eq!(body, "ok");
}
