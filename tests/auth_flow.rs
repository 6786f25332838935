mod common;

use anyhow::Result;
use axum::http::StatusCode;
use common::{acquire_db_lock, body_json, TestApp};
use nyayasathi::auth::Role;
use serde_json::json;

#[tokio::test]
async fn login_and_me_roundtrip() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let (_, token) = app.signed_in("asha", Role::Citizen).await?;

    let response = app.get("/api/auth/me", Some(&token)).await?;
    assert_eq!(response.status(), StatusCode::OK);
    let user = body_json(response).await?;
    assert_eq!(user["username"], "asha");
    assert_eq!(user["role"], "citizen");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn registration_validates_passwords_and_usernames() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let mismatch = app
        .post_json(
            "/api/auth/register",
            &json!({"username": "ravi", "password": "one-pass", "confirm_password": "two-pass"}),
            None,
        )
        .await?;
    assert_eq!(mismatch.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(mismatch).await?["error"], "passwords don't match");

    let created = app
        .post_json(
            "/api/auth/register",
            &json!({
                "username": "ravi",
                "password": "one-pass",
                "confirm_password": "one-pass",
                "email": "ravi@example.com"
            }),
            None,
        )
        .await?;
    assert_eq!(created.status(), StatusCode::CREATED);
    let body = body_json(created).await?;
    assert_eq!(body["user"]["role"], "citizen");
    assert!(body["access_token"].as_str().is_some());

    let taken = app
        .post_json(
            "/api/auth/register",
            &json!({"username": "ravi", "password": "other-pass"}),
            None,
        )
        .await?;
    assert_eq!(taken.status(), StatusCode::BAD_REQUEST);

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn officers_must_log_in_through_the_officer_zone() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    let registered = app
        .post_json(
            "/api/auth/officers/register",
            &json!({"badge_id": "KA-1024", "password": "patrol-pass", "confirm_password": "patrol-pass"}),
            None,
        )
        .await?;
    assert_eq!(registered.status(), StatusCode::CREATED);
    let body = body_json(registered).await?;
    assert_eq!(body["user"]["role"], "officer");
    assert_eq!(body["user"]["badge_id"], "KA-1024");

    let wrong_zone = app
        .post_json(
            "/api/auth/login",
            &json!({"username": "KA-1024", "password": "patrol-pass"}),
            None,
        )
        .await?;
    assert_eq!(wrong_zone.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        body_json(wrong_zone).await?["error"],
        "invalid login for citizen zone"
    );

    let token = app.login_token("KA-1024", "patrol-pass", Role::Officer).await?;
    let me = body_json(app.get("/api/auth/me", Some(&token)).await?).await?;
    assert_eq!(me["role"], "officer");

    app.cleanup().await?;
    Ok(())
}

#[tokio::test]
async fn bad_credentials_are_unauthorized() -> Result<()> {
    let _lock = acquire_db_lock().await;
    let app = TestApp::new().await?;

    app.insert_user("meera", "right-pass", Role::Citizen).await?;
    for (username, password) in [("meera", "wrong-pass"), ("nobody", "right-pass")] {
        let response = app
            .post_json(
                "/api/auth/login",
                &json!({"username": username, "password": password}),
                None,
            )
            .await?;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    let anonymous = app.get("/api/auth/me", None).await?;
    assert_eq!(anonymous.status(), StatusCode::UNAUTHORIZED);

    app.cleanup().await?;
    Ok(())
}
