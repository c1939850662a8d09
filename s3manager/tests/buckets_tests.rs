mod common;

use common::*;

use aws_sdk_s3::{
    operation::{
        create_bucket::{CreateBucketError, CreateBucketOutput},
        delete_bucket::DeleteBucketOutput,
        get_object::GetObjectOutput,
        list_buckets::ListBucketsOutput,
        list_objects_v2::{ListObjectsV2Error, ListObjectsV2Output},
    },
    primitives::{ByteStream, DateTime},
    types::{
        error::{BucketAlreadyOwnedByYou, NoSuchBucket},
        Bucket, CommonPrefix, Object,
    },
};
use aws_smithy_mocks::{mock, mock_client, RuleMode};
use http::{header, StatusCode};
use serde_json::json;

#[tokio::test]
async fn test_root_redirects_to_buckets() {
    let client = offline_client();
    let setup = TestSetup::new(client, test_configuration());

    let response = setup.send_get_request("/").await.expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::PERMANENT_REDIRECT);
    assert_eq!(response.headers()[header::LOCATION], "/buckets");
}

#[tokio::test]
async fn test_health() {
    let client = offline_client();
    let setup = TestSetup::new(client, test_configuration());

    let response = setup
        .send_get_request("/health")
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let body = parse_response_body(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_static_assets() {
    let client = offline_client();
    let setup = TestSetup::new(client, test_configuration());

    let response = setup
        .send_get_request("/static/style.css")
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.headers()[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/css"));

    let response = setup
        .send_get_request("/static/missing.js")
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_buckets_page_lists_buckets() {
    let rule = mock!(aws_sdk_s3::Client::list_buckets).then_output(|| {
        ListBucketsOutput::builder()
            .buckets(
                Bucket::builder()
                    .name("photos")
                    .creation_date(DateTime::from_secs(1_700_000_000))
                    .build(),
            )
            .buckets(Bucket::builder().name("backups").build())
            .build()
    });
    let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&rule]);
    let setup = TestSetup::new(client, test_configuration());

    let response = setup
        .send_get_request("/buckets")
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let html = response_text(response).await;
    assert!(html.contains("/buckets/photos"));
    assert!(html.contains("/buckets/backups"));
    assert!(html.contains("2023-11-14 22:13:20 UTC"));
    assert!(html.contains("data-delete-bucket"));
}

#[tokio::test]
async fn test_buckets_page_appends_shared_buckets() {
    let list_rule = mock!(aws_sdk_s3::Client::list_buckets).then_output(|| {
        ListBucketsOutput::builder()
            .buckets(Bucket::builder().name("own").build())
            .build()
    });
    let shared_rule = mock!(aws_sdk_s3::Client::get_object)
        .match_requests(|req| {
            req.bucket() == Some("config") && req.key() == Some("team/shared.yaml")
        })
        .then_output(|| {
            GetObjectOutput::builder()
                .body(ByteStream::from_static(b"- team-assets\n"))
                .build()
        });
    let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&list_rule, &shared_rule]);
    let setup = TestSetup::new(
        client,
        s3manager::types::Configuration {
            shared_buckets_path: "config/team/shared.yaml".to_string(),
            ..test_configuration()
        },
    );

    let response = setup
        .send_get_request("/buckets")
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let html = response_text(response).await;
    let own = html.find("/buckets/own").unwrap();
    let shared = html.find("/buckets/team-assets").unwrap();
    assert!(own < shared);
}

#[tokio::test]
async fn test_buckets_page_hides_delete_when_disallowed() {
    let rule = mock!(aws_sdk_s3::Client::list_buckets).then_output(|| {
        ListBucketsOutput::builder()
            .buckets(Bucket::builder().name("photos").build())
            .build()
    });
    let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&rule]);
    let setup = TestSetup::new(
        client,
        s3manager::types::Configuration {
            allow_delete: false,
            ..test_configuration()
        },
    );

    let response = setup
        .send_get_request("/buckets")
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let html = response_text(response).await;
    assert!(html.contains("/buckets/photos"));
    assert!(!html.contains("data-delete-bucket"));
}

#[tokio::test]
async fn test_bucket_page_lists_folders_and_objects() {
    let rule = mock!(aws_sdk_s3::Client::list_objects_v2)
        .match_requests(|req| req.bucket() == Some("photos") && req.prefix() == Some("2024/"))
        .then_output(|| {
            ListObjectsV2Output::builder()
                .common_prefixes(CommonPrefix::builder().prefix("2024/june/").build())
                .contents(Object::builder().key("2024/cover.png").size(2048).build())
                .build()
        });
    let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&rule]);
    let setup = TestSetup::new(client, test_configuration());

    let response = setup
        .send_get_request("/buckets/photos/2024/")
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let html = response_text(response).await;
    assert!(html.contains("june/"));
    assert!(html.contains("cover.png"));
    assert!(html.contains("2.0 KiB"));
    assert!(html.contains("<i class=\"material-icons\">photo</i>"));
}

#[tokio::test]
async fn test_bucket_page_without_trailing_slash_lists_folder() {
    let rule = mock!(aws_sdk_s3::Client::list_objects_v2)
        .match_requests(|req| req.bucket() == Some("photos") && req.prefix() == Some("2024/"))
        .then_output(|| {
            ListObjectsV2Output::builder()
                .common_prefixes(CommonPrefix::builder().prefix("2024/june/").build())
                .contents(Object::builder().key("2024/report.pdf").size(10).build())
                .build()
        });
    let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&rule]);
    let setup = TestSetup::new(client, test_configuration());

    let response = setup
        .send_get_request("/buckets/photos/2024")
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::OK);
    let html = response_text(response).await;
    assert!(html.contains("<i class=\"material-icons\">folder</i> june/"));
    assert!(html.contains("<i class=\"material-icons\">insert_drive_file</i> report.pdf"));
    assert!(!html.contains("</i> /"));
}

#[tokio::test]
async fn test_bucket_page_missing_bucket() {
    let rule = mock!(aws_sdk_s3::Client::list_objects_v2)
        .then_error(|| ListObjectsV2Error::NoSuchBucket(NoSuchBucket::builder().build()));
    let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&rule]);
    let setup = TestSetup::new(client, test_configuration());

    let response = setup
        .send_get_request("/buckets/missing")
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"]["code"], "not_found");
    assert_eq!(body["allowRetry"], false);
}

#[tokio::test]
async fn test_create_bucket() {
    let rule = mock!(aws_sdk_s3::Client::create_bucket)
        .match_requests(|req| req.bucket() == Some("new-bucket"))
        .then_output(|| CreateBucketOutput::builder().build());
    let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&rule]);
    let setup = TestSetup::new(client, test_configuration());

    let response = setup
        .send_post_request("/api/buckets", json!({ "name": "new-bucket" }))
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = parse_response_body(response).await;
    assert_eq!(body["name"], "new-bucket");
    assert!(body["creation_date"].is_string());
}

#[tokio::test]
async fn test_create_bucket_already_exists() {
    let rule = mock!(aws_sdk_s3::Client::create_bucket).then_error(|| {
        CreateBucketError::BucketAlreadyOwnedByYou(BucketAlreadyOwnedByYou::builder().build())
    });
    let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&rule]);
    let setup = TestSetup::new(client, test_configuration());

    let response = setup
        .send_post_request("/api/buckets", json!({ "name": "taken" }))
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_create_bucket_invalid_payloads() {
    let client = offline_client();
    let setup = TestSetup::new(client, test_configuration());

    let response = setup
        .send_raw_post_request("/api/buckets", "application/json", "{not json")
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"]["code"], "invalid_json");

    let response = setup
        .send_post_request("/api/buckets", json!({ "name": "  " }))
        .await
        .expect("Failed to send request");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = parse_response_body(response).await;
    assert_eq!(body["error"]["code"], "invalid_bucket_name");
}

#[tokio::test]
async fn test_delete_bucket() {
    let rule = mock!(aws_sdk_s3::Client::delete_bucket)
        .match_requests(|req| req.bucket() == Some("old"))
        .then_output(|| DeleteBucketOutput::builder().build());
    let client = mock_client!(aws_sdk_s3, RuleMode::MatchAny, &[&rule]);
    let setup = TestSetup::new(client, test_configuration());

    let response = setup
        .send_delete_request("/api/buckets/old")
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn test_delete_bucket_not_routed_when_disallowed() {
    let client = offline_client();
    let setup = TestSetup::new(
        client,
        s3manager::types::Configuration {
            allow_delete: false,
            ..test_configuration()
        },
    );

    let response = setup
        .send_delete_request("/api/buckets/old")
        .await
        .expect("Failed to send request");

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
