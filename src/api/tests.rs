use axum::http::{Method, StatusCode};
use rust_decimal::Decimal;
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::db::types::{PaymentStatus, UserRole};
use crate::services::payment_gateway::sign_payment;
use crate::test_support::{
    bearer_token, insert_admin, insert_student, insert_test, json_request, read_json,
    setup_test_context, TestContext, TEST_PAYMENT_SECRET,
};

async fn send(
    ctx: &TestContext,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = ctx
        .app
        .clone()
        .oneshot(json_request(method, uri, token, body))
        .await
        .expect("response");
    let status = response.status();
    (status, read_json(response).await)
}

fn money(value: &Value) -> f64 {
    value.as_f64().expect("numeric amount")
}

async fn pay(ctx: &TestContext, token: &str, verify_uri: &str, order_id: &str) -> (StatusCode, Value) {
    let payment_id = format!("pay_{order_id}");
    let signature = sign_payment(TEST_PAYMENT_SECRET, order_id, &payment_id);
    send(
        ctx,
        Method::POST,
        verify_uri,
        Some(token),
        Some(json!({
            "razorpay_order_id": order_id,
            "razorpay_payment_id": payment_id,
            "razorpay_signature": signature,
        })),
    )
    .await
}

async fn age_order(ctx: &TestContext, order_id: &str) {
    sqlx::query("UPDATE payment_orders SET created_at = created_at - INTERVAL '2 hours' WHERE id = $1")
        .bind(order_id)
        .execute(ctx.state.db())
        .await
        .expect("age order");
}

async fn order_refund(ctx: &TestContext, order_id: &str) -> (PaymentStatus, Decimal) {
    sqlx::query_as("SELECT status, refund_amount FROM payment_orders WHERE id = $1")
        .bind(order_id)
        .fetch_one(ctx.state.db())
        .await
        .expect("order refund")
}

async fn purchased_count(ctx: &TestContext, student_id: &str) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM purchases WHERE student_id = $1")
        .bind(student_id)
        .fetch_one(ctx.state.db())
        .await
        .expect("purchase count")
}

#[tokio::test]
#[ignore = "requires local postgres"]
async fn register_then_login_returns_student_token() {
    let ctx = setup_test_context().await;

    let (status, body) = send(
        &ctx,
        Method::POST,
        "/api/register",
        None,
        Some(json!({ "email": "Asha@Example.com", "name": "Asha", "password": "s3cret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["user"]["email"], "asha@example.com");
    assert_eq!(body["user"]["role"], "student");

    let (status, _) = send(
        &ctx,
        Method::POST,
        "/api/register",
        None,
        Some(json!({ "email": "asha@example.com", "name": "Asha", "password": "s3cret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = send(
        &ctx,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": "ASHA@example.com", "password": "s3cret-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let token = body["access_token"].as_str().expect("token").to_string();

    let (status, body) = send(&ctx, Method::GET, "/api/me", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Asha");

    let (status, _) = send(
        &ctx,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": "asha@example.com", "password": "wrong-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
#[ignore = "requires local postgres"]
async fn cart_rejects_duplicates_and_prices_bundles() {
    let ctx = setup_test_context().await;
    let admin = insert_admin(ctx.state.db(), "admin@example.com").await;
    let student = insert_student(ctx.state.db(), "student@example.com").await;
    let polity = insert_test(ctx.state.db(), &admin, "Polity", "299", &[1, 0, 2]).await;
    let history = insert_test(ctx.state.db(), &admin, "History", "199", &[3]).await;
    let token = bearer_token(&student, ctx.state.settings());

    let (status, body) =
        send(&ctx, Method::POST, &format!("/api/cart/add/{}", polity.id), Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["item_count"], 1);
    assert_eq!(money(&body["discount"]), 0.0);

    let (status, _) =
        send(&ctx, Method::POST, &format!("/api/cart/add/{}", polity.id), Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) =
        send(&ctx, Method::POST, &format!("/api/cart/add/{}", history.id), Some(&token), None)
            .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["item_count"], 2);
    assert_eq!(money(&body["subtotal"]), 498.0);
    assert_eq!(money(&body["discount"]), 49.8);
    assert_eq!(money(&body["total"]), 448.2);
    assert_eq!(money(&body["discount_percent"]), 10.0);

    let (status, _) =
        send(&ctx, Method::POST, "/api/cart/add/does-not-exist", Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(
        &ctx,
        Method::DELETE,
        &format!("/api/cart/remove/{}", history.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item_count"], 1);

    let (status, _) = send(
        &ctx,
        Method::DELETE,
        &format!("/api/cart/remove/{}", history.id),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = send(&ctx, Method::DELETE, "/api/cart/clear", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["item_count"], 0);

    let (status, _) = send(&ctx, Method::POST, "/api/cart/checkout", Some(&token), None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
#[ignore = "requires local postgres"]
async fn cart_checkout_verifies_once_and_grants_each_test() {
    let ctx = setup_test_context().await;
    let admin = insert_admin(ctx.state.db(), "admin@example.com").await;
    let student = insert_student(ctx.state.db(), "student@example.com").await;
    let first = insert_test(ctx.state.db(), &admin, "Economy", "300", &[0]).await;
    let second = insert_test(ctx.state.db(), &admin, "Geography", "200", &[1]).await;
    let token = bearer_token(&student, ctx.state.settings());

    for test in [&first, &second] {
        let (status, _) =
            send(&ctx, Method::POST, &format!("/api/cart/add/{}", test.id), Some(&token), None)
                .await;
        assert_eq!(status, StatusCode::CREATED);
    }

    let (status, order) = send(&ctx, Method::POST, "/api/cart/checkout", Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED, "{order}");
    assert_eq!(order["purpose"], "cart");
    assert_eq!(money(&order["amount"]), 450.0);
    assert_eq!(order["amount_minor"], 45_000);
    assert_eq!(order["currency"], "INR");
    let order_id = order["order_id"].as_str().expect("order id").to_string();

    let (status, body) = pay(&ctx, &token, "/api/cart/verify-payment", &order_id).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(body["already_verified"], false);
    assert_eq!(body["test_ids"].as_array().expect("test ids").len(), 2);

    let (status, body) = pay(&ctx, &token, "/api/cart/verify-payment", &order_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["already_verified"], true);

    assert_eq!(purchased_count(&ctx, &student.id).await, 2);

    let (_, cart) = send(&ctx, Method::GET, "/api/cart", Some(&token), None).await;
    assert_eq!(cart["item_count"], 0);

    let (status, my_tests) = send(&ctx, Method::GET, "/api/my-tests", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(my_tests.as_array().expect("tests").len(), 2);

    let (status, _) =
        send(&ctx, Method::POST, &format!("/api/cart/add/{}", first.id), Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) =
        send(&ctx, Method::POST, &format!("/api/tests/{}/purchase", first.id), Some(&token), None)
            .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
#[ignore = "requires local postgres"]
async fn bad_signature_fails_order_without_granting() {
    let ctx = setup_test_context().await;
    let admin = insert_admin(ctx.state.db(), "admin@example.com").await;
    let student = insert_student(ctx.state.db(), "student@example.com").await;
    let test = insert_test(ctx.state.db(), &admin, "Science", "149", &[2]).await;
    let token = bearer_token(&student, ctx.state.settings());

    let (status, order) =
        send(&ctx, Method::POST, &format!("/api/tests/{}/purchase", test.id), Some(&token), None)
            .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(order["purpose"], "single");
    let order_id = order["order_id"].as_str().expect("order id").to_string();

    let (status, body) = send(
        &ctx,
        Method::POST,
        "/api/verify-payment",
        Some(&token),
        Some(json!({
            "order_id": order_id,
            "payment_id": "pay_forged",
            "signature": "deadbeef",
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["detail"], "Payment verification failed");

    let order_status: PaymentStatus =
        sqlx::query_scalar("SELECT status FROM payment_orders WHERE id = $1")
            .bind(&order_id)
            .fetch_one(ctx.state.db())
            .await
            .expect("order status");
    assert_eq!(order_status, PaymentStatus::Failed);
    assert_eq!(purchased_count(&ctx, &student.id).await, 0);

    let other = insert_student(ctx.state.db(), "other@example.com").await;
    let other_token = bearer_token(&other, ctx.state.settings());
    let (status, _) = pay(&ctx, &other_token, "/api/verify-payment", &order_id).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, body) = pay(&ctx, &token, "/api/verify-payment", &order_id).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(purchased_count(&ctx, &student.id).await, 1);
}

#[tokio::test]
#[ignore = "requires local postgres"]
async fn overlapping_orders_never_grant_a_test_twice() {
    let ctx = setup_test_context().await;
    let admin = insert_admin(ctx.state.db(), "admin@example.com").await;
    let student = insert_student(ctx.state.db(), "student@example.com").await;
    let economy = insert_test(ctx.state.db(), &admin, "Economy", "300", &[0]).await;
    let geography = insert_test(ctx.state.db(), &admin, "Geography", "200", &[1]).await;
    let history = insert_test(ctx.state.db(), &admin, "History", "300", &[2]).await;
    let token = bearer_token(&student, ctx.state.settings());

    let (status, single) =
        send(&ctx, Method::POST, &format!("/api/tests/{}/purchase", economy.id), Some(&token), None)
            .await;
    assert_eq!(status, StatusCode::CREATED, "{single}");
    let single_id = single["order_id"].as_str().expect("order id").to_string();

    let (status, again) =
        send(&ctx, Method::POST, &format!("/api/tests/{}/purchase", economy.id), Some(&token), None)
            .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(again["order_id"], single_id.as_str());

    let (status, _) =
        send(&ctx, Method::POST, &format!("/api/cart/add/{}", economy.id), Some(&token), None)
            .await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, body) = send(&ctx, Method::POST, "/api/cart/checkout", Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    // Once the single order is stale the cart may open its own order for the same test.
    age_order(&ctx, &single_id).await;
    let (status, cart_order) =
        send(&ctx, Method::POST, "/api/cart/checkout", Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED, "{cart_order}");
    let cart_id = cart_order["order_id"].as_str().expect("order id").to_string();
    assert_ne!(cart_id, single_id);

    let (status, body) = pay(&ctx, &token, "/api/verify-payment", &single_id).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(money(&body["refund_due"]), 0.0);

    let (status, body) = pay(&ctx, &token, "/api/cart/verify-payment", &cart_id).await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");
    assert!(body["detail"].as_str().expect("detail").contains("refund"));
    let (order_status, refund) = order_refund(&ctx, &cart_id).await;
    assert_eq!(order_status, PaymentStatus::RefundPending);
    assert_eq!(refund, "300.00".parse::<Decimal>().unwrap());
    assert_eq!(purchased_count(&ctx, &student.id).await, 1);

    let (status, _) = pay(&ctx, &token, "/api/cart/verify-payment", &cart_id).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (_, cart) = send(&ctx, Method::GET, "/api/cart", Some(&token), None).await;
    assert_eq!(cart["item_count"], 0);

    // A bundle that overlaps a later single purchase keeps the new test and refunds the rest.
    for test in [&geography, &history] {
        let (status, _) =
            send(&ctx, Method::POST, &format!("/api/cart/add/{}", test.id), Some(&token), None)
                .await;
        assert_eq!(status, StatusCode::CREATED);
    }
    let (status, bundle) = send(&ctx, Method::POST, "/api/cart/checkout", Some(&token), None).await;
    assert_eq!(status, StatusCode::CREATED, "{bundle}");
    assert_eq!(money(&bundle["amount"]), 450.0);
    let bundle_id = bundle["order_id"].as_str().expect("order id").to_string();
    age_order(&ctx, &bundle_id).await;

    let (status, single) =
        send(&ctx, Method::POST, &format!("/api/tests/{}/purchase", geography.id), Some(&token), None)
            .await;
    assert_eq!(status, StatusCode::CREATED, "{single}");
    let single_id = single["order_id"].as_str().expect("order id").to_string();
    let (status, _) = pay(&ctx, &token, "/api/verify-payment", &single_id).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = pay(&ctx, &token, "/api/cart/verify-payment", &bundle_id).await;
    assert_eq!(status, StatusCode::OK, "{body}");
    assert_eq!(money(&body["refund_due"]), 180.0);
    assert_eq!(purchased_count(&ctx, &student.id).await, 3);

    let (status, body) = pay(&ctx, &token, "/api/cart/verify-payment", &bundle_id).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["already_verified"], true);
    assert_eq!(money(&body["refund_due"]), 180.0);
    let (order_status, _) = order_refund(&ctx, &bundle_id).await;
    assert_eq!(order_status, PaymentStatus::RefundPending);
}

#[tokio::test]
#[ignore = "requires local postgres"]
async fn take_submit_and_review_solutions() {
    let ctx = setup_test_context().await;
    let admin = insert_admin(ctx.state.db(), "admin@example.com").await;
    let student = insert_student(ctx.state.db(), "student@example.com").await;
    let test = insert_test(ctx.state.db(), &admin, "Polity", "99", &[1, 0, 2]).await;
    let token = bearer_token(&student, ctx.state.settings());

    let (status, _) =
        send(&ctx, Method::GET, &format!("/api/tests/{}/take", test.id), Some(&token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (_, order) =
        send(&ctx, Method::POST, &format!("/api/tests/{}/purchase", test.id), Some(&token), None)
            .await;
    let order_id = order["order_id"].as_str().expect("order id").to_string();
    let (status, _) = pay(&ctx, &token, "/api/verify-payment", &order_id).await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) =
        send(&ctx, Method::GET, &format!("/api/test-solutions/{}", test.id), Some(&token), None)
            .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, taken) =
        send(&ctx, Method::GET, &format!("/api/tests/{}/take", test.id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{taken}");
    let questions = taken["questions"].as_array().expect("questions");
    assert_eq!(questions.len(), 3);
    for question in questions {
        assert!(question.get("correct_answer").is_none());
        assert!(question.get("explanation").is_none());
        assert_eq!(question["options"].as_array().expect("options").len(), 4);
    }
    assert!(taken["remaining_seconds"].as_i64().expect("remaining") > 0);

    let (_, retaken) =
        send(&ctx, Method::GET, &format!("/api/tests/{}/take", test.id), Some(&token), None).await;
    assert_eq!(retaken["session_id"], taken["session_id"]);
    assert_eq!(retaken["deadline_at"], taken["deadline_at"]);

    let (status, _) = send(
        &ctx,
        Method::POST,
        &format!("/api/tests/{}/submit", test.id),
        Some(&token),
        Some(json!({ "answers": [1, 0] })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, result) = send(
        &ctx,
        Method::POST,
        &format!("/api/tests/{}/submit", test.id),
        Some(&token),
        Some(json!({ "answers": [1, 0, 3], "time_taken_minutes": 4 })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{result}");
    assert_eq!(result["score"], 2);
    assert_eq!(result["total_questions"], 3);
    assert_eq!(result["percentage"], 67);
    assert_eq!(result["is_late"], false);

    let (status, _) = send(
        &ctx,
        Method::POST,
        &format!("/api/tests/{}/submit", test.id),
        Some(&token),
        Some(json!({ "answers": [1, 0, 2] })),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, _) =
        send(&ctx, Method::GET, &format!("/api/tests/{}/take", test.id), Some(&token), None).await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, solutions) =
        send(&ctx, Method::GET, &format!("/api/test-solutions/{}", test.id), Some(&token), None)
            .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(solutions["score"], 2);
    let items = solutions["solutions"].as_array().expect("solutions");
    let correct = items.iter().filter(|item| item["is_correct"] == true).count();
    assert_eq!(correct, 2);
    assert_eq!(items[2]["student_answer"], 3);
    assert_eq!(items[2]["correct_answer"], 2);

    let (_, results) = send(&ctx, Method::GET, "/api/my-results", Some(&token), None).await;
    let results = results.as_array().expect("results");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0]["percentage"], 67);
}

#[tokio::test]
#[ignore = "requires local postgres"]
async fn question_upload_waits_for_open_sessions() {
    let ctx = setup_test_context().await;
    let admin = insert_admin(ctx.state.db(), "admin@example.com").await;
    let student = insert_student(ctx.state.db(), "student@example.com").await;
    let test = insert_test(ctx.state.db(), &admin, "Ethics", "99", &[0, 1]).await;
    let admin_token = bearer_token(&admin, ctx.state.settings());
    let token = bearer_token(&student, ctx.state.settings());
    let upload = json!({
        "test_id": test.id,
        "questions": [{
            "question_text": "Which article abolishes untouchability?",
            "options": ["14", "15", "17", "21"],
            "correct_answer": 2
        }]
    });

    let (_, order) =
        send(&ctx, Method::POST, &format!("/api/tests/{}/purchase", test.id), Some(&token), None)
            .await;
    let order_id = order["order_id"].as_str().expect("order id").to_string();
    let (status, _) = pay(&ctx, &token, "/api/verify-payment", &order_id).await;
    assert_eq!(status, StatusCode::OK);

    let (status, taken) =
        send(&ctx, Method::GET, &format!("/api/tests/{}/take", test.id), Some(&token), None).await;
    assert_eq!(status, StatusCode::OK, "{taken}");
    assert_eq!(taken["questions"].as_array().expect("questions").len(), 2);

    let (status, body) = send(
        &ctx,
        Method::POST,
        "/api/admin/bulk-upload-questions",
        Some(&admin_token),
        Some(upload.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT, "{body}");

    let (status, result) = send(
        &ctx,
        Method::POST,
        &format!("/api/tests/{}/submit", test.id),
        Some(&token),
        Some(json!({ "answers": [0, 1] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK, "{result}");
    assert_eq!(result["score"], 2);

    let (status, body) = send(
        &ctx,
        Method::POST,
        "/api/admin/bulk-upload-questions",
        Some(&admin_token),
        Some(upload),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["questions_count"], 3);
}

#[tokio::test]
#[ignore = "requires local postgres"]
async fn admin_manages_tests_and_questions() {
    let ctx = setup_test_context().await;
    let admin = insert_admin(ctx.state.db(), "admin@example.com").await;
    let student = insert_student(ctx.state.db(), "student@example.com").await;
    let admin_token = bearer_token(&admin, ctx.state.settings());
    let student_token = bearer_token(&student, ctx.state.settings());
    assert_eq!(admin.role, UserRole::Admin);

    let payload = json!({
        "title": "Modern History Mock",
        "description": "Full-length paper",
        "price": 249,
        "duration_minutes": 45,
        "questions": [{
            "question_text": "Who founded the Servants of India Society?",
            "options": ["Gokhale", "Tilak", "Naoroji", "Ranade"],
            "correct_answer": 0,
            "explanation": "Gopal Krishna Gokhale, 1905."
        }]
    });

    let (status, _) =
        send(&ctx, Method::POST, "/api/admin/tests", Some(&student_token), Some(payload.clone()))
            .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, created) =
        send(&ctx, Method::POST, "/api/admin/tests", Some(&admin_token), Some(payload)).await;
    assert_eq!(status, StatusCode::CREATED, "{created}");
    let test_id = created["id"].as_str().expect("test id").to_string();
    assert_eq!(created["questions"][0]["correct_answer"], 0);

    let (status, body) = send(
        &ctx,
        Method::POST,
        "/api/admin/bulk-upload-questions",
        Some(&admin_token),
        Some(json!({
            "test_id": test_id,
            "questions": [{
                "question_text": "Year of the Lucknow Pact?",
                "options": ["1916", "1919", "1905", "1911"],
                "correct_answer": 0
            }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["questions_added"], 1);
    assert_eq!(body["questions_count"], 2);

    let (status, body) = send(
        &ctx,
        Method::POST,
        "/api/admin/bulk-upload-questions",
        Some(&admin_token),
        Some(json!({
            "test_id": test_id,
            "questions": [{
                "question_text": "Broken row",
                "options": ["a", "b", "c"],
                "correct_answer": 5
            }]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");

    let (_, catalog) = send(&ctx, Method::GET, "/api/tests", None, None).await;
    let catalog = catalog.as_array().expect("catalog");
    assert_eq!(catalog.len(), 1);
    assert_eq!(catalog[0]["questions_count"], 2);
    assert!(catalog[0].get("questions").is_none());

    let (status, _) =
        send(&ctx, Method::DELETE, &format!("/api/admin/tests/{test_id}"), Some(&admin_token), None)
            .await;
    assert_eq!(status, StatusCode::OK);

    let (_, catalog) = send(&ctx, Method::GET, "/api/tests", None, None).await;
    assert!(catalog.as_array().expect("catalog").is_empty());

    let (status, _) = send(
        &ctx,
        Method::POST,
        &format!("/api/tests/{test_id}/purchase"),
        Some(&student_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, students) =
        send(&ctx, Method::GET, "/api/admin/students", Some(&admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(students.as_array().expect("students").len(), 1);
}

#[tokio::test]
#[ignore = "requires local postgres"]
async fn password_reset_token_replaces_password_once() {
    let ctx = setup_test_context().await;
    let student = insert_student(ctx.state.db(), "student@example.com").await;

    let token = crate::services::password_reset::request(&ctx.state, &student.email)
        .await
        .expect("request")
        .expect("token issued");

    let reset = json!({
        "email": "student@example.com",
        "reset_token": token,
        "new_password": "brand-new-pass",
    });
    let (status, body) =
        send(&ctx, Method::POST, "/api/reset-password", None, Some(reset.clone())).await;
    assert_eq!(status, StatusCode::OK, "{body}");

    let (status, _) = send(&ctx, Method::POST, "/api/reset-password", None, Some(reset)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(
        &ctx,
        Method::POST,
        "/api/login",
        None,
        Some(json!({ "email": "student@example.com", "password": "brand-new-pass" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(
        &ctx,
        Method::POST,
        "/api/forgot-password",
        None,
        Some(json!({ "email": "nobody@example.com" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["message"].as_str().expect("message").starts_with("If an account"));
}
