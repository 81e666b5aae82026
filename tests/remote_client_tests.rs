mod common;

use common::{LoginMode, MockEcpp, TOKEN};
use ecpp_assistant::remote::{
    BusinessSenderFields, EcppClient, EcppOperations, SenderSearch, SenderSummary,
};
use ecpp_assistant::EcppError;
use serde_json::json;

fn acme_fields() -> BusinessSenderFields {
    serde_json::from_value(common::business_sender_arguments()).unwrap()
}

async fn logged_in(mock: MockEcpp) -> (EcppClient, MockEcpp) {
    let base = mock.clone().spawn().await;
    let client = EcppClient::new(&base);
    client.login("alice", "secret").await.unwrap();
    (client, mock)
}

#[tokio::test]
async fn test_login_stores_token_from_json_cookie() {
    let mock = MockEcpp::default();
    let base = mock.clone().spawn().await;
    let client = EcppClient::new(&base);

    let profile = client.login("alice", "secret").await.unwrap();

    assert_eq!(client.session().token(), TOKEN);
    assert_eq!(profile.username, "alice");
    assert_eq!(profile.display_name, "Alice Tan");
    assert_eq!(profile.partner, "EMQ");
    assert_eq!(profile.roles, vec!["maker", "viewer"]);

    let login = &mock.requests_to("/auth/login")[0];
    assert_eq!(login.method, "POST");
    assert_eq!(
        login.body,
        json!({"username": "alice", "password": "secret", "admin": false})
    );

    let authenticate = &mock.requests_to("/auth/authenticate")[0];
    assert_eq!(authenticate.body, json!({"emqsess": TOKEN}));

    let me = &mock.requests_to("/auth/me")[0];
    assert_eq!(me.method, "GET");
    assert_eq!(me.body, json!({"emqsess": TOKEN}));
}

#[tokio::test]
async fn test_login_falls_back_to_set_cookie_header() {
    let mock = MockEcpp {
        login_mode: LoginMode::SetCookieHeader,
        ..MockEcpp::default()
    };
    let base = mock.clone().spawn().await;
    let client = EcppClient::new(&base);

    client.login("alice", "secret").await.unwrap();
    assert_eq!(client.session().token(), "fromheader");
}

#[tokio::test]
async fn test_login_without_cookie_is_auth_error() {
    let mock = MockEcpp {
        login_mode: LoginMode::NoCookie,
        ..MockEcpp::default()
    };
    let base = mock.clone().spawn().await;
    let client = EcppClient::new(&base);

    let err = client.login("alice", "wrong").await.unwrap_err();
    assert!(matches!(err, EcppError::Auth(_)));
    assert!(!client.session().is_authenticated());
    assert!(mock.requests_to("/auth/authenticate").is_empty());
}

#[tokio::test]
async fn test_login_without_user_data_keeps_session_empty() {
    let mock = MockEcpp {
        authenticate_response: json!({"status": {"code": 401, "message": "expired"}}),
        ..MockEcpp::default()
    };
    let base = mock.clone().spawn().await;
    let client = EcppClient::new(&base);

    let err = client.login("alice", "secret").await.unwrap_err();
    assert_eq!(err, EcppError::Auth("no user data".to_string()));
    assert_eq!(client.session().token(), "");
}

#[tokio::test]
async fn test_search_without_login_makes_no_request() {
    let mock = MockEcpp::default();
    let base = mock.clone().spawn().await;
    let client = EcppClient::new(&base);

    let err = client.search_senders("Acme").await.unwrap_err();
    assert_eq!(err, EcppError::Unauthenticated);
    assert!(mock.requests().is_empty());
}

#[tokio::test]
async fn test_search_sends_token_and_preserves_order() {
    let (client, mock) = logged_in(MockEcpp::default()).await;

    let first = client.search_senders("Acme").await.unwrap();
    let second = client.search_senders("Acme").await.unwrap();
    assert_eq!(first, second);
    assert_eq!(
        first,
        SenderSearch::Found(vec![
            SenderSummary::Business {
                company_name: "Acme Ltd".into()
            },
            SenderSummary::Individual {
                last_name: "Tan".into(),
                first_name: "Mei".into()
            },
        ])
    );

    let search = &mock.requests_to("/senders/search")[0];
    assert_eq!(search.authorization.as_deref(), Some(TOKEN));
    assert_eq!(
        search.body,
        json!({
            "page": 1,
            "name": "Acme",
            "recipient_name": "",
            "page_size": 20,
            "include_recipeint": false
        })
    );
}

#[tokio::test]
async fn test_search_empty_and_missing_data() {
    let (client, _) = logged_in(MockEcpp {
        search_response: json!({"status": {"code": 200}, "data": {"senders": []}}).to_string(),
        ..MockEcpp::default()
    })
    .await;
    assert_eq!(
        client.search_senders("Nobody").await.unwrap(),
        SenderSearch::Found(vec![])
    );

    let (client, _) = logged_in(MockEcpp {
        search_response: json!({"status": {"code": 404, "message": "missing"}}).to_string(),
        ..MockEcpp::default()
    })
    .await;
    assert_eq!(
        client.search_senders("Nobody").await.unwrap(),
        SenderSearch::NoData {
            status_code: Some("404".into())
        }
    );
}

#[tokio::test]
async fn test_search_unparsable_body_is_parse_error() {
    let html = format!("<html>{}</html>", "x".repeat(200));
    let (client, _) = logged_in(MockEcpp {
        search_response: html.clone(),
        ..MockEcpp::default()
    })
    .await;

    match client.search_senders("Acme").await.unwrap_err() {
        EcppError::Parse { raw_prefix, .. } => {
            assert_eq!(raw_prefix, html.chars().take(100).collect::<String>());
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_create_business_sender() {
    let (client, mock) = logged_in(MockEcpp::default()).await;

    let created = client.create_business_sender(&acme_fields()).await.unwrap();
    assert_eq!(created, "Acme Ltd");

    let request = &mock.requests_to("/senders/business")[0];
    assert_eq!(request.authorization.as_deref(), Some(TOKEN));
    assert_eq!(request.body["segment"], "business");
    assert_eq!(request.body["country"], "SG");
    assert_eq!(request.body["mobile_number"], "+6591234567");
}

#[tokio::test]
async fn test_create_business_sender_duplicate_is_remote_error() {
    let (client, _) = logged_in(MockEcpp {
        create_response: json!({"status": {"code": 400, "message": "duplicate registration"}}),
        ..MockEcpp::default()
    })
    .await;

    let err = client.create_business_sender(&acme_fields()).await.unwrap_err();
    assert_eq!(err, EcppError::Remote("duplicate registration".into()));
}

#[tokio::test]
async fn test_list_created_reviews() {
    let (client, mock) = logged_in(MockEcpp::default()).await;

    let batches = client.list_created_reviews().await.unwrap();
    assert_eq!(batches.len(), 2);
    assert_eq!(batches[0].batch_id, "B-1001");
    assert_eq!(batches[0].exchange_amount, "1500");
    assert_eq!(batches[1].exchange_amount, "25.5");
    assert_eq!(batches[1].checker, "carol");

    let request = &mock.requests_to("/transfer-batch/created-by-you")[0];
    assert_eq!(
        request.body,
        json!({"page_number": 0, "status": -1, "business_type": "all"})
    );
}
