// src/tests/router_tests/meeting_tests.rs
use serde_json::json;

use crate::auth::Role;
use crate::router::handle;
use crate::tests::utils::*;

const DAY: i64 = 24 * 60 * 60;

#[test]
fn create_then_accept_flows_end_to_end() {
    let app = test_app();
    let (_, admin_token) = seed_user(&app.state.db, "Root", "root@example.com", Role::Admin);
    let (_, user_token) = seed_user(&app.state.db, "Jean Dupont", "jean@example.com", Role::User);
    let pid = seed_property(&app.state.db, "Villa Azur", Some("Leila"));

    // Requester books a viewing two days out.
    let resp = handle(
        post_json(
            "/api/meetings",
            Some(&user_token),
            json!({
                "propertyId": pid,
                "phone": "+21622333444",
                "scheduledAt": future_date(2 * DAY),
                "notes": "prefer mornings"
            }),
        ),
        &app.state,
    )
    .unwrap();
    assert_eq!(resp.status(), 201);
    let body = body_json(resp);
    assert_eq!(body["status"], "success");
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["propertyTitle"], "Villa Azur");
    assert_eq!(body["data"]["requesterEmail"], "jean@example.com");
    assert!(body["data"]["respondedAt"].is_null());
    let meeting_id = body["data"]["id"].as_i64().unwrap();

    // The admin was notified of the new request.
    wait_for_sends(&app.fake, 1);
    assert_eq!(app.fake.sent.lock().unwrap()[0].0, "root@example.com");

    // Admin accepts with a note.
    let resp = handle(
        patch_json(
            &format!("/api/meetings/{meeting_id}/status"),
            Some(&admin_token),
            json!({ "status": "accepted", "adminResponse": "See you then" }),
        ),
        &app.state,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);
    let body = body_json(resp);
    assert_eq!(body["data"]["status"], "accepted");
    assert_eq!(body["data"]["adminResponse"], "See you then");
    assert!(!body["data"]["respondedAt"].is_null());
    assert_eq!(body["emailSent"], true);

    // The requester got exactly one decision email.
    let sent = app.fake.sent.lock().unwrap();
    assert_eq!(sent.len(), 2);
    assert_eq!(sent[1].0, "jean@example.com");
    assert!(sent[1].1.contains("confirmed"));
}

#[test]
fn reschedule_resets_to_pending_and_renotifies() {
    let app = test_app();
    seed_user(&app.state.db, "Root", "root@example.com", Role::Admin);
    let (_, user_token) = seed_user(&app.state.db, "Jean", "jean@example.com", Role::User);
    let pid = seed_property(&app.state.db, "Villa Azur", None);

    let resp = handle(
        post_json(
            "/api/meetings",
            Some(&user_token),
            json!({
                "propertyId": pid,
                "phone": "+21622333444",
                "scheduledAt": future_date(DAY)
            }),
        ),
        &app.state,
    )
    .unwrap();
    let meeting_id = body_json(resp)["data"]["id"].as_i64().unwrap();
    wait_for_sends(&app.fake, 1);

    let new_date = future_date(3 * DAY);
    let resp = handle(
        patch_json(
            &format!("/api/meetings/{meeting_id}/reschedule"),
            Some(&user_token),
            json!({ "scheduledAt": new_date }),
        ),
        &app.state,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);
    let body = body_json(resp);
    assert_eq!(body["data"]["status"], "pending");
    assert_eq!(body["data"]["adminResponse"], "");
    assert!(body["data"]["respondedAt"].is_null());

    // Admins hear about the new slot, with the old date in the notes.
    wait_for_sends(&app.fake, 2);
}

#[test]
fn cancel_is_idempotent_failure_after_terminal() {
    let app = test_app();
    let (_, user_token) = seed_user(&app.state.db, "Jean", "jean@example.com", Role::User);
    let pid = seed_property(&app.state.db, "Villa Azur", None);

    let resp = handle(
        post_json(
            "/api/meetings",
            Some(&user_token),
            json!({
                "propertyId": pid,
                "phone": "+21622333444",
                "scheduledAt": future_date(DAY)
            }),
        ),
        &app.state,
    )
    .unwrap();
    let meeting_id = body_json(resp)["data"]["id"].as_i64().unwrap();

    let resp = handle(
        delete(&format!("/api/meetings/{meeting_id}"), Some(&user_token)),
        &app.state,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        body_json(resp)["message"],
        "Meeting cancelled successfully"
    );

    // A second cancel hits the terminal-state guard.
    let err = outcome(handle(
        delete(&format!("/api/meetings/{meeting_id}"), Some(&user_token)),
        &app.state,
    ));
    match err {
        Err(crate::errors::ServerError::Validation(_)) => {}
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[test]
fn create_rejects_conflicts_and_bad_input() {
    let app = test_app();
    let (_, user_token) = seed_user(&app.state.db, "Jean", "jean@example.com", Role::User);
    let pid = seed_property(&app.state.db, "Villa Azur", None);

    let book = |date: String| {
        outcome(handle(
            post_json(
                "/api/meetings",
                Some(&user_token),
                json!({
                    "propertyId": pid,
                    "phone": "+21622333444",
                    "scheduledAt": date
                }),
            ),
            &app.state,
        ))
    };

    book(future_date(DAY)).unwrap();

    // Thirty minutes away: inside the ±1h window.
    match book(future_date(DAY + 1800)) {
        Err(crate::errors::ServerError::Conflict(_)) => {}
        other => panic!("expected Conflict, got {other:?}"),
    }

    // Unknown property.
    let err = outcome(handle(
        post_json(
            "/api/meetings",
            Some(&user_token),
            json!({
                "propertyId": 9999,
                "phone": "+21622333444",
                "scheduledAt": future_date(5 * DAY)
            }),
        ),
        &app.state,
    ));
    match err {
        Err(crate::errors::ServerError::NotFound(_)) => {}
        other => panic!("expected NotFound, got {other:?}"),
    }

    // Missing phone.
    let err = outcome(handle(
        post_json(
            "/api/meetings",
            Some(&user_token),
            json!({ "propertyId": pid, "scheduledAt": future_date(5 * DAY) }),
        ),
        &app.state,
    ));
    match err {
        Err(crate::errors::ServerError::Validation(_)) => {}
        other => panic!("expected Validation, got {other:?}"),
    }

    // Past date.
    let err = book(future_date(-DAY));
    match err {
        Err(crate::errors::ServerError::Validation(msg)) => assert!(msg.contains("future")),
        other => panic!("expected Validation, got {other:?}"),
    }
}

#[test]
fn my_meetings_returns_caller_scope_with_property_card() {
    let app = test_app();
    let (_, jean_token) = seed_user(&app.state.db, "Jean", "jean@example.com", Role::User);
    let (_, paul_token) = seed_user(&app.state.db, "Paul", "paul@example.com", Role::User);
    let pid = seed_property(&app.state.db, "Villa Azur", None);

    for (token, offset) in [(&jean_token, DAY), (&paul_token, 5 * DAY)] {
        handle(
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
        .unwrap();
    }

    let resp = handle(get("/api/meetings/my-meetings", Some(&jean_token)), &app.state).unwrap();
    assert_eq!(resp.status(), 200);
    let body = body_json(resp);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["requesterName"], "Jean");
    assert_eq!(items[0]["property"]["title"], "Villa Azur");
    assert_eq!(items[0]["property"]["image"], "cover.jpg");
}

#[test]
fn property_availability_is_public_and_accepted_only() {
    let app = test_app();
    let (_, admin_token) = seed_user(&app.state.db, "Root", "root@example.com", Role::Admin);
    let (_, user_token) = seed_user(&app.state.db, "Jean", "jean@example.com", Role::User);
    let pid = seed_property(&app.state.db, "Villa Azur", None);

    let resp = handle(
        post_json(
            "/api/meetings",
            Some(&user_token),
            json!({
                "propertyId": pid,
                "phone": "+21622333444",
                "scheduledAt": future_date(DAY)
            }),
        ),
        &app.state,
    )
    .unwrap();
    let meeting_id = body_json(resp)["data"]["id"].as_i64().unwrap();

    // Pending meetings are not shown publicly.
    let resp = handle(get(&format!("/api/meetings/property/{pid}"), None), &app.state).unwrap();
    assert_eq!(body_json(resp)["data"].as_array().unwrap().len(), 0);

    handle(
        patch_json(
            &format!("/api/meetings/{meeting_id}/status"),
            Some(&admin_token),
            json!({ "status": "accepted" }),
        ),
        &app.state,
    )
    .unwrap();

    let resp = handle(get(&format!("/api/meetings/property/{pid}"), None), &app.state).unwrap();
    let body = body_json(resp);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["status"], "accepted");
}
