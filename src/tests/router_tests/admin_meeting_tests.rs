// src/tests/router_tests/admin_meeting_tests.rs
use serde_json::json;

use crate::auth::Role;
use crate::router::handle;
use crate::tests::utils::*;

const DAY: i64 = 24 * 60 * 60;

fn book(app: &TestApp, token: &str, pid: i64, offset: i64) -> i64 {
    let resp = handle(
        post_json(
            "/api/meetings",
            Some(token),
            json!({
                "propertyId": pid,
                "phone": "+21622333444",
                "scheduledAt": future_date(offset)
            }),
        ),
        &app.state,
    )
    .expect("booking failed");
    body_json(resp)["data"]["id"].as_i64().unwrap()
}

#[test]
fn admin_list_filters_by_status_and_search() {
    let app = test_app();
    let (_, admin_token) = seed_user(&app.state.db, "Root", "root@example.com", Role::Admin);
    let (_, dupont) = seed_user(&app.state.db, "Jean Dupont", "jean@example.com", Role::User);
    let (_, martin) = seed_user(&app.state.db, "Alice Martin", "alice@example.com", Role::User);
    let pid = seed_property(&app.state.db, "Villa Azur", None);

    let dupont_meeting = book(&app, &dupont, pid, DAY);
    let martin_meeting = book(&app, &martin, pid, 5 * DAY);

    // Reject Martin's so only Dupont's stays pending.
    handle(
        patch_json(
            &format!("/api/meetings/{martin_meeting}/status"),
            Some(&admin_token),
            json!({ "status": "rejected", "adminResponse": "slot gone" }),
        ),
        &app.state,
    )
    .unwrap();

    let resp = handle(
        get(
            "/api/meetings/admin/all?status=pending&search=Dupont",
            Some(&admin_token),
        ),
        &app.state,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);
    let body = body_json(resp);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"].as_i64(), Some(dupont_meeting));
    assert_eq!(body["pagination"]["total"], 1);
    assert_eq!(body["pagination"]["pages"], 1);

    // status=all is a pass-through, not a filter value.
    let resp = handle(
        get("/api/meetings/admin/all?status=all", Some(&admin_token)),
        &app.state,
    )
    .unwrap();
    assert_eq!(body_json(resp)["data"].as_array().unwrap().len(), 2);
}

#[test]
fn admin_list_paginates_and_sorts() {
    let app = test_app();
    let (_, admin_token) = seed_user(&app.state.db, "Root", "root@example.com", Role::Admin);
    let (_, user_token) = seed_user(&app.state.db, "Jean", "jean@example.com", Role::User);

    // Dates a day apart so the requester's conflict window never trips.
    let mut ids = Vec::new();
    for day in 1..=3 {
        let pid = seed_property(&app.state.db, &format!("Villa {day}"), None);
        ids.push(book(&app, &user_token, pid, day * DAY));
    }

    let resp = handle(
        get(
            "/api/meetings/admin/all?page=2&limit=2&sortBy=meetingDate&sortOrder=asc",
            Some(&admin_token),
        ),
        &app.state,
    )
    .unwrap();
    let body = body_json(resp);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["id"].as_i64(), Some(ids[2]));
    assert_eq!(body["pagination"]["total"], 3);
    assert_eq!(body["pagination"]["page"], 2);
    assert_eq!(body["pagination"]["limit"], 2);
    assert_eq!(body["pagination"]["pages"], 2);
}

#[test]
fn stats_count_by_status_and_window() {
    let app = test_app();
    let (_, admin_token) = seed_user(&app.state.db, "Root", "root@example.com", Role::Admin);
    let (_, user_token) = seed_user(&app.state.db, "Jean", "jean@example.com", Role::User);

    let pid_a = seed_property(&app.state.db, "Villa A", None);
    let pid_b = seed_property(&app.state.db, "Villa B", None);
    let accepted = book(&app, &user_token, pid_a, 2 * DAY);
    book(&app, &user_token, pid_b, 5 * DAY);

    handle(
        patch_json(
            &format!("/api/meetings/{accepted}/status"),
            Some(&admin_token),
            json!({ "status": "accepted" }),
        ),
        &app.state,
    )
    .unwrap();

    let resp = handle(get("/api/meetings/admin/stats", Some(&admin_token)), &app.state).unwrap();
    assert_eq!(resp.status(), 200);
    let body = body_json(resp);
    assert_eq!(body["data"]["total"], 2);
    assert_eq!(body["data"]["pending"], 1);
    assert_eq!(body["data"]["accepted"], 1);
    assert_eq!(body["data"]["rejected"], 0);
    assert_eq!(body["data"]["cancelled"], 0);
    assert_eq!(body["data"]["today"], 2);
    assert_eq!(body["data"]["upcoming"], 1);
}

#[test]
fn admin_list_rejects_unknown_status_value() {
    let app = test_app();
    let (_, admin_token) = seed_user(&app.state.db, "Root", "root@example.com", Role::Admin);

    let err = outcome(handle(
        get("/api/meetings/admin/all?status=bogus", Some(&admin_token)),
        &app.state,
    ));
    match err {
        Err(crate::errors::ServerError::Validation(_)) => {}
        other => panic!("expected Validation, got {other:?}"),
    }
}
