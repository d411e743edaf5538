//! Post/redirect/get form flows on the server-rendered pages

mod common;

use axum::http::StatusCode;
use common::{TestApp, ADMIN_EMAIL, ADMIN_PASSWORD, PASSWORD};
use serde_json::json;

#[tokio::test]
async fn test_login_form_follows_safe_next_only() {
    let app = TestApp::new().await;

    let reply = app
        .post_form(
            "/login",
            None,
            &[("email", ADMIN_EMAIL), ("password", ADMIN_PASSWORD), ("next", "/admin/talent")],
        )
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), Some("/admin/talent"));
    assert!(reply.session_token().is_some());

    let reply = app
        .post_form(
            "/login",
            None,
            &[("email", ADMIN_EMAIL), ("password", ADMIN_PASSWORD), ("next", "//evil.example.com")],
        )
        .await;
    assert_eq!(reply.location(), Some("/admin"));
}

#[tokio::test]
async fn test_login_form_rerenders_on_failure() {
    let app = TestApp::new().await;
    let reply = app
        .post_form(
            "/login",
            None,
            &[("email", ADMIN_EMAIL), ("password", "wrong-password")],
        )
        .await;
    assert_eq!(reply.status, StatusCode::UNAUTHORIZED);
    assert!(reply.body.contains("<h1>Sign in</h1>"));
    assert!(reply.body.contains(r#"class="error""#));
    assert!(reply.session_token().is_none());

    let reply = app
        .post_form("/login", None, &[("email", "nope"), ("password", "")])
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.contains("field-error"));
}

#[tokio::test]
async fn test_logout_clears_cookie() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let reply = app.post_form("/logout", Some(&admin), &[]).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), Some("/login"));
    let cookie = reply.headers["set-cookie"].to_str().unwrap();
    assert!(cookie.contains("Max-Age=0"));

    let reply = app.get("/admin", Some(&admin)).await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_invite_page_accepts_once() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;

    let reply = app
        .post_form(
            "/admin/invites",
            Some(&admin),
            &[("email", "new@example.com"), ("role", "talent"), ("note", "")],
        )
        .await;
    assert_eq!(reply.status, StatusCode::CREATED);
    assert!(reply.body.contains("Send them this link"));

    // The form does not expose the token to tests, so issue a second one over RPC
    let token = app.invite(&admin, "new@example.com", "talent").await;
    let uri = format!("/invite/{}", token);

    let reply = app.get(&uri, None).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Join talentdeck as talent"));

    let reply = app
        .post_form(&uri, None, &[("display_name", "New Person"), ("password", "short")])
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.contains("field-error"));
    assert!(reply.body.contains(r#"value="New Person""#));

    let reply = app
        .post_form(&uri, None, &[("display_name", "New Person"), ("password", PASSWORD)])
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), Some("/talent"));
    let talent = reply.session_token().unwrap();

    let reply = app.get("/talent", Some(&talent)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("draft"));

    let reply = app.get(&uri, None).await;
    assert!(reply.body.contains("Invite accepted"));

    let reply = app
        .post_form(&uri, None, &[("display_name", "Someone Else"), ("password", PASSWORD)])
        .await;
    assert_eq!(reply.status, StatusCode::PRECONDITION_FAILED);
}

#[tokio::test]
async fn test_reissued_invite_revokes_the_first() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let first = app.invite(&admin, "twice@example.com", "founder").await;
    let _second = app.invite(&admin, "twice@example.com", "founder").await;

    let reply = app
        .query("invite.verify", Some(json!({"token": first})), None)
        .await;
    assert_eq!(reply.data()["status"], "revoked");
}

#[tokio::test]
async fn test_talent_profile_form_saves() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let talent = app
        .onboard(&admin, "ada@example.com", "talent", "Ada")
        .await;

    let reply = app
        .post_form(
            "/talent",
            Some(&talent),
            &[
                ("full_name", "Ada Lovelace"),
                ("headline", "Analytical engines"),
                ("skills", "Rust, math, rust"),
                ("years_experience", "12"),
                ("availability", "passive"),
            ],
        )
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    assert_eq!(reply.location(), Some("/talent?done=saved"));

    let reply = app.get("/talent?done=saved", Some(&talent)).await;
    assert!(reply.body.contains("Changes saved."));
    assert!(reply.body.contains(r#"value="Rust, math""#));

    let reply = app
        .post_form(
            "/talent",
            Some(&talent),
            &[("full_name", "Ada"), ("skills", "Rust"), ("years_experience", "lots")],
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.contains("whole number"));
}

#[tokio::test]
async fn test_founder_requests_and_admin_reviews_through_pages() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (talent_id, _) = app
        .published_talent(&admin, "ada@example.com", "Ada Lovelace")
        .await;
    let founder = app
        .onboard(&admin, "grace@example.com", "founder", "Grace")
        .await;

    let reply = app.get("/founder?skill=rust", Some(&founder)).await;
    assert_eq!(reply.status, StatusCode::OK);
    assert!(reply.body.contains("Ada Lovelace"));

    let uri = format!("/founder/talent/{}", talent_id);
    let reply = app
        .post_form(&uri, Some(&founder), &[("message", "too short")])
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);

    let reply = app
        .post_form(&uri, Some(&founder), &[("message", "We would love to introduce ourselves.")])
        .await;
    assert_eq!(reply.location(), Some("/founder/intros?done=requested"));

    let reply = app
        .post_form(&uri, Some(&founder), &[("message", "Just checking in again on this one.")])
        .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert!(reply.body.contains("already have a pending intro request"));

    let pending = app
        .query("intro.list", Some(json!({"status": "pending"})), Some(&admin))
        .await;
    let intro_id = pending.data()[0]["id"].as_str().unwrap().to_string();

    let reply = app
        .post_form(
            &format!("/admin/intros/{}", intro_id),
            Some(&admin),
            &[("decision", "reject"), ("note", "")],
        )
        .await;
    assert_eq!(reply.location(), Some("/admin/intros?status=pending&done=reviewed"));

    let reply = app.get("/founder/intros", Some(&founder)).await;
    assert!(reply.body.contains("rejected"));
}

#[tokio::test]
async fn test_admin_curation_form() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let talent = app
        .onboard(&admin, "ada@example.com", "talent", "Ada")
        .await;
    let id = app.query("talent.me", None, Some(&talent)).await.data()["account_id"]
        .as_str()
        .unwrap()
        .to_string();

    let uri = format!("/admin/talent/{}", id);
    let reply = app
        .post_form(
            &uri,
            Some(&admin),
            &[("status", "published"), ("featured", "true"), ("admin_notes", "strong referral")],
        )
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);

    let profile = app.query("talent.get", Some(json!({"id": id})), Some(&admin)).await;
    assert_eq!(profile.data()["status"], "published");
    assert_eq!(profile.data()["featured"], true);
    assert_eq!(profile.data()["admin_notes"], "strong referral");

    let reply = app.get("/admin/talent?status=published", Some(&admin)).await;
    assert!(reply.body.contains("Ada"));
}

#[tokio::test]
async fn test_founder_shortlist_pages() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (talent_id, _) = app
        .published_talent(&admin, "grace@example.com", "Grace Hopper")
        .await;
    let founder = app
        .onboard(&admin, "founder@example.com", "founder", "Fran")
        .await;

    let reply = app
        .post_form(
            &format!("/founder/talent/{}/shortlist", talent_id),
            Some(&founder),
            &[("note", "compiler background")],
        )
        .await;
    assert_eq!(reply.location(), Some("/founder/shortlist?done=shortlisted"));

    let page = app.get("/founder/shortlist", Some(&founder)).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Grace Hopper"));
    assert!(page.body.contains("compiler background"));
    let page = app.get(&format!("/founder/talent/{}", talent_id), Some(&founder)).await;
    assert!(!page.body.contains("Add to shortlist"));

    let reply = app
        .post_form(
            &format!("/founder/shortlist/{}/note", talent_id),
            Some(&founder),
            &[("note", "call next week")],
        )
        .await;
    assert_eq!(reply.location(), Some("/founder/shortlist?done=saved"));
    let page = app.get("/founder/shortlist", Some(&founder)).await;
    assert!(page.body.contains("call next week"));

    let reply = app
        .post_form(&format!("/founder/shortlist/{}/remove", talent_id), Some(&founder), &[])
        .await;
    assert_eq!(reply.location(), Some("/founder/shortlist?done=removed"));
    let page = app.get("/founder/shortlist", Some(&founder)).await;
    assert!(page.body.contains("Your shortlist is empty."));
}

#[tokio::test]
async fn test_founder_cancels_pending_intro_from_page() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (talent_id, _) = app
        .published_talent(&admin, "grace@example.com", "Grace Hopper")
        .await;
    let founder = app
        .onboard(&admin, "founder@example.com", "founder", "Fran")
        .await;
    let created = app
        .mutation(
            "intro.create",
            json!({"talent_id": talent_id, "message": "We are hiring compiler engineers."}),
            Some(&founder),
        )
        .await;
    let intro_id = created.data()["id"].as_str().unwrap().to_string();

    let page = app.get("/founder/intros", Some(&founder)).await;
    assert!(page.body.contains("Cancel"));

    let uri = format!("/founder/intros/{}/cancel", intro_id);
    let reply = app.post_form(&uri, Some(&founder), &[]).await;
    assert_eq!(reply.location(), Some("/founder/intros?done=cancelled"));
    let page = app.get("/founder/intros?done=cancelled", Some(&founder)).await;
    assert!(page.body.contains("Intro request cancelled."));
    assert!(page.body.contains("You have not requested any introductions yet."));

    let reply = app.post_form(&uri, Some(&founder), &[]).await;
    assert_eq!(reply.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_talent_experience_pages() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let talent = app
        .onboard(&admin, "grace@example.com", "talent", "Grace")
        .await;

    let reply = app
        .post_form(
            "/talent/experience",
            Some(&talent),
            &[
                ("company_name", "Remington Rand"),
                ("title", "Senior Mathematician"),
                ("start_date", "1949-06-01"),
                ("end_date", ""),
                ("description", "UNIVAC compilers"),
            ],
        )
        .await;
    assert_eq!(reply.location(), Some("/talent/experience?done=added"));

    let page = app.get("/talent/experience", Some(&talent)).await;
    assert_eq!(page.status, StatusCode::OK);
    assert!(page.body.contains("Remington Rand"));
    assert!(page.body.contains("Jun 1949 to present"));

    let reply = app
        .post_form(
            "/talent/experience",
            Some(&talent),
            &[
                ("company_name", "Harvard"),
                ("title", "Programmer"),
                ("start_date", "1944-07-01"),
                ("end_date", "1940-01-01"),
            ],
        )
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.contains("must not be before the start date"));

    let roles = app.query("experience.list", None, Some(&talent)).await;
    assert_eq!(roles.data().as_array().unwrap().len(), 1);
    let role_id = roles.data()[0]["id"].as_str().unwrap().to_string();
    let reply = app
        .post_form(&format!("/talent/experience/{}/delete", role_id), Some(&talent), &[])
        .await;
    assert_eq!(reply.location(), Some("/talent/experience?done=deleted"));
    let roles = app.query("experience.list", None, Some(&talent)).await;
    assert!(roles.data().as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_admin_rating_and_tag_forms() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    let (talent_id, _) = app
        .published_talent(&admin, "grace@example.com", "Grace Hopper")
        .await;

    let reply = app
        .post_form("/admin/tags", Some(&admin), &[("name", "Compilers"), ("color", "#2F855A")])
        .await;
    assert_eq!(reply.location(), Some("/admin/tags?done=added"));
    let reply = app
        .post_form("/admin/tags", Some(&admin), &[("name", "compilers"), ("color", "")])
        .await;
    assert_eq!(reply.status, StatusCode::CONFLICT);
    assert!(reply.body.contains("already exists"));

    let tags = app.query("tag.list", None, Some(&admin)).await;
    let tag_id = tags.data()[0]["id"].as_str().unwrap().to_string();
    let detail_uri = format!("/admin/talent/{}", talent_id);
    let reply = app
        .post_form(&format!("{}/tags", detail_uri), Some(&admin), &[("tag_id", tag_id.as_str())])
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);
    let reply = app
        .post_form(&format!("{}/rating", detail_uri), Some(&admin), &[("rating", "4")])
        .await;
    assert_eq!(reply.status, StatusCode::SEE_OTHER);

    let page = app.get(&detail_uri, Some(&admin)).await;
    assert!(page.body.contains(r#"class="tag""#));
    assert!(page.body.contains(r#"value="4" selected"#));

    let reply = app
        .post_form(&format!("{}/rating", detail_uri), Some(&admin), &[("rating", "9")])
        .await;
    assert_eq!(reply.status, StatusCode::BAD_REQUEST);
    assert!(reply.body.contains("must be between 1 and 5"));
}

#[tokio::test]
async fn test_admin_invite_list_pages() {
    let app = TestApp::new().await;
    let admin = app.admin_token().await;
    for n in 0..51 {
        app.invite(&admin, &format!("person{}@example.com", n), "talent")
            .await;
    }

    let first = app.get("/admin/invites", Some(&admin)).await;
    assert!(first.body.contains("Older"));
    assert!(!first.body.contains("Newer"));
    assert_eq!(first.body.matches("/revoke").count(), 50);

    let second = app.get("/admin/invites?offset=50", Some(&admin)).await;
    assert!(second.body.contains("Newer"));
    assert!(!second.body.contains("Older"));
    assert_eq!(second.body.matches("/revoke").count(), 1);
}
