// tests/respondent_tests.rs

use serde_json::{Value, json};
use sqlx::SqlitePool;
use survey_collector::{
    config::{Config, Tenancy},
    models::question::QuestionType,
    proforma, routes,
    state::AppState,
    store,
};

/// Helper function to spawn the app on a random port for testing.
async fn spawn_app() -> (String, SqlitePool) {
    let pool = store::connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600,
        rust_log: "error".to_string(),
        tenancy: Tenancy::Multi,
        bind_addr: "127.0.0.1:0".to_string(),
    };

    let state = AppState::build(pool.clone(), config)
        .await
        .expect("Failed to build app state");
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let address = format!("http://127.0.0.1:{}", listener.local_addr().unwrap().port());

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    (address, pool)
}

/// Registers an owner and creates a two-question survey.
/// Returns the token and the survey id. `settings` is merged into the create request.
async fn setup_survey(
    client: &reqwest::Client,
    address: &str,
    settings: Value,
    publish: bool,
) -> (String, i64) {
    let email = format!("r_{}@example.org", &uuid::Uuid::new_v4().to_string()[..8]);
    client
        .post(format!("{}/api/auth/register", address))
        .json(&json!({ "email": email, "name": "Owner", "password": "password123" }))
        .send()
        .await
        .unwrap();
    let login: Value = client
        .post(format!("{}/api/auth/login", address))
        .json(&json!({ "email": email, "password": "password123" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let token = login["token"].as_str().unwrap().to_string();

    let mut body = json!({ "title": "Vaccination access", "consent": "Participation is voluntary." });
    if let (Some(body), Some(extra)) = (body.as_object_mut(), settings.as_object()) {
        body.extend(extra.clone());
    }
    let survey: Value = client
        .post(format!("{}/api/surveys", address))
        .bearer_auth(&token)
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let id = survey["id"].as_i64().unwrap();

    for question in [
        json!({ "type": "single_choice", "text": "Is the centre open daily?", "required": true, "options": ["Yes", "No"] }),
        json!({ "type": "multi_choice", "text": "Information sources", "options": ["Radio", "LHW", "Mosque"] }),
    ] {
        client
            .post(format!("{}/api/surveys/{}/questions", address, id))
            .bearer_auth(&token)
            .json(&question)
            .send()
            .await
            .unwrap();
    }

    if publish {
        let response = client
            .post(format!("{}/api/surveys/{}/publish", address, id))
            .bearer_auth(&token)
            .json(&json!({ "published": true }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status().as_u16(), 200);
    }

    (token, id)
}

#[tokio::test]
async fn unpublished_surveys_are_hidden() {
    let (address, _) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, id) = setup_survey(&client, &address, json!({}), false).await;

    let response = client
        .get(format!("{}/api/public/surveys/{}", address, id))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);

    let response = client
        .post(format!("{}/api/public/surveys/{}/responses", address, id))
        .json(&json!({ "answers": { "q1": "Yes" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn public_view_has_no_owner_data() {
    let (address, _) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, id) = setup_survey(&client, &address, json!({}), true).await;

    let survey: Value = client
        .get(format!("{}/api/public/surveys/{}", address, id))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(survey["title"], "Vaccination access");
    assert_eq!(survey["page_count"], 2);
    assert!(survey.get("owner_id").is_none());
}

#[tokio::test]
async fn required_answers_block_navigation() {
    let (address, _) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, id) = setup_survey(&client, &address, json!({}), true).await;

    let response = client
        .post(format!("{}/api/public/surveys/{}/pages/0/validate", address, id))
        .json(&json!({ "answers": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fields"]["q1"], "This field is required.");

    let body: Value = client
        .post(format!("{}/api/public/surveys/{}/pages/0/validate", address, id))
        .json(&json!({ "answers": { "q1": "Yes" } }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "next_page": 1, "is_last": false }));

    // Optional last page
    let body: Value = client
        .post(format!("{}/api/public/surveys/{}/pages/1/validate", address, id))
        .json(&json!({ "answers": {} }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body, json!({ "next_page": null, "is_last": true }));

    let response = client
        .post(format!("{}/api/public/surveys/{}/pages/7/validate", address, id))
        .json(&json!({ "answers": {} }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn submission_is_validated_and_unknown_answers_dropped() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, id) = setup_survey(&client, &address, json!({}), true).await;
    let url = format!("{}/api/public/surveys/{}/responses", address, id);

    let response = client
        .post(&url)
        .json(&json!({ "answers": { "q2": ["Radio"] } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);

    let response = client
        .post(&url)
        .json(&json!({ "answers": { "q1": "Maybe" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 422);

    let response = client
        .post(&url)
        .json(&json!({ "answers": { "q1": "Yes", "q2": ["Radio", "LHW"], "q9": "stale" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let stored: String = sqlx::query_scalar("SELECT answers FROM responses WHERE survey_id = ?")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let stored: Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored, json!({ "q1": "Yes", "q2": ["Radio", "LHW"] }));
}

#[tokio::test]
async fn response_limit_closes_the_survey() {
    let (address, _) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, id) = setup_survey(&client, &address, json!({ "response_limit": 1 }), true).await;
    let url = format!("{}/api/public/surveys/{}/responses", address, id);

    let response = client
        .post(&url)
        .json(&json!({ "answers": { "q1": "Yes" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 201);

    let response = client
        .post(&url)
        .json(&json!({ "answers": { "q1": "No" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);

    let html = client
        .get(format!("{}/take/{}", address, id))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("response limit"));
}

#[tokio::test]
async fn past_closing_date_rejects_submissions() {
    let (address, _) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, id) = setup_survey(
        &client,
        &address,
        json!({ "closing_date": "2020-01-01T00:00:00Z" }),
        true,
    )
    .await;

    let response = client
        .post(format!("{}/api/public/surveys/{}/responses", address, id))
        .json(&json!({ "answers": { "q1": "Yes" } }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 409);
}

#[tokio::test]
async fn html_taker_walks_pages_and_submits() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();
    let (_, id) = setup_survey(&client, &address, json!({}), true).await;
    let url = format!("{}/take/{}", address, id);

    let html = client.get(&url).send().await.unwrap().text().await.unwrap();
    assert!(html.contains("Section 1 of 2"));
    assert!(html.contains("Participation is voluntary."));
    assert!(html.contains("value=\"prev\" disabled"));

    // Next without the required answer stays on page 1
    let html = client
        .post(&url)
        .form(&[("__page", "0"), ("__action", "next")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Section 1 of 2"));
    assert!(html.contains("This field is required."));

    let html = client
        .post(&url)
        .form(&[("__page", "0"), ("__action", "next"), ("q1", "Yes")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Section 2 of 2"));
    assert!(html.contains("type=\"hidden\" name=\"q1\" value=\"Yes\""));
    assert!(html.contains("value=\"submit\""));

    // Prev keeps answers
    let html = client
        .post(&url)
        .form(&[("__page", "1"), ("__action", "prev"), ("q1", "Yes"), ("q2", "Radio")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Section 1 of 2"));
    assert!(html.contains("value=\"Yes\" checked"));

    let html = client
        .post(&url)
        .form(&[
            ("__page", "1"),
            ("__action", "submit"),
            ("q1", "Yes"),
            ("q2", "Radio"),
            ("q2", "Mosque"),
        ])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Your response has been recorded."));

    let stored: String = sqlx::query_scalar("SELECT answers FROM responses WHERE survey_id = ?")
        .bind(id)
        .fetch_one(&pool)
        .await
        .unwrap();
    let stored: Value = serde_json::from_str(&stored).unwrap();
    assert_eq!(stored, json!({ "q1": "Yes", "q2": ["Radio", "Mosque"] }));
}

/// Form pairs answering every proforma question with a valid value.
fn complete_proforma_form() -> Vec<(String, String)> {
    let pages = proforma::pages();
    let mut pairs = vec![
        ("__page".to_string(), (pages.len() - 1).to_string()),
        ("__action".to_string(), "submit".to_string()),
    ];
    for question in pages.iter().flat_map(|p| p.questions.iter()) {
        let value = match question.question_type {
            QuestionType::Number => "2".to_string(),
            t if t.is_choice() => question.options[0].clone(),
            _ => format!("{} answer", question.id),
        };
        pairs.push((question.id.clone(), value));
    }
    pairs
}

#[tokio::test]
async fn proforma_collects_lists_and_exports() {
    let (address, _) = spawn_app().await;
    let client = reqwest::Client::new();

    let html = client
        .get(format!("{}/proforma", address))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("<td id=\"total-responses\">0</td>"));
    assert!(html.contains("<td id=\"last-collection\">N/A</td>"));

    let html = client
        .get(format!("{}/proforma/take", address))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("DEMOGRAPHIC INFORMATION"));

    // Notes page requires language and tehsil
    let mut missing_notes = complete_proforma_form();
    missing_notes.retain(|(k, _)| k != "tehsil");
    let html = client
        .post(format!("{}/proforma/take", address))
        .form(&missing_notes)
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Survey Notes"));
    assert!(html.contains("This field is required."));

    let html = client
        .post(format!("{}/proforma/take", address))
        .form(&complete_proforma_form())
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("Participant ID: P-"));

    let list: Value = client
        .get(format!("{}/api/proforma/responses", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let list = list.as_array().unwrap();
    assert_eq!(list.len(), 1);
    let pid = list[0]["participantId"].as_str().unwrap().to_string();
    assert!(pid.starts_with("P-"));
    assert_eq!(list[0]["notes"]["tehsil"], "tehsil answer");
    assert!(list[0]["answers"].get("tehsil").is_none());
    assert_eq!(list[0]["answers"]["age"], 2.0);

    let csv = client
        .get(format!("{}/proforma/export/csv", address))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    let header = csv.lines().next().unwrap();
    assert!(header.starts_with("participantId,timestamp,notes_language,notes_tehsil,notes_observations,demographic_name"));
    assert_eq!(csv.lines().count(), 2);

    let txt = client
        .get(format!("{}/proforma/responses/{}/export/txt", address, pid))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(txt.contains(&format!("Participant ID: {}", pid)));
    assert!(txt.contains("Tehsil: tehsil answer"));

    let html = client
        .get(format!("{}/proforma/responses", address))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(html.contains("1 response(s) found."));
    assert!(html.contains(&pid));

    let response = client
        .delete(format!("{}/api/proforma/responses/{}", address, pid))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 204);

    let response = client
        .delete(format!("{}/api/proforma/responses/{}", address, pid))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn corrupt_proforma_storage_reads_as_empty() {
    let (address, pool) = spawn_app().await;
    let client = reqwest::Client::new();

    sqlx::query("INSERT INTO kv (key, value, updated_at) VALUES ('surveyResponses', '{not json', '2024-01-01T00:00:00Z')")
        .execute(&pool)
        .await
        .unwrap();

    let list: Value = client
        .get(format!("{}/api/proforma/responses", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(list, json!([]));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn simultaneous_proforma_submissions_are_all_kept() {
    let (address, _) = spawn_app().await;
    let client = reqwest::Client::new();

    let tasks: Vec<_> = (0..10)
        .map(|_| {
            let client = client.clone();
            let url = format!("{}/proforma/take", address);
            tokio::spawn(async move {
                client
                    .post(url)
                    .form(&complete_proforma_form())
                    .send()
                    .await
                    .unwrap()
                    .text()
                    .await
                    .unwrap()
            })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().contains("Survey submitted successfully!"));
    }

    let list: Value = client
        .get(format!("{}/api/proforma/responses", address))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let mut ids: Vec<&str> = list
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["participantId"].as_str().unwrap())
        .collect();
    assert_eq!(ids.len(), 10);
    ids.sort();
    ids.dedup();
    assert_eq!(ids.len(), 10);
}
