//! S3 Client Integration Tests
//!
//! Drives the aws-sdk backed `S3Client` and the upload workflow against a
//! wiremock server that speaks just enough of the S3 REST API.
//!
//! ## Test Coverage
//!
//! - ListBuckets response parsing
//! - CreateBucket only when the bucket is missing
//! - BucketAlreadyOwnedByYou treated as success, BucketAlreadyExists fatal
//! - PutObject ETag passthrough
//! - Deadline abandoning a slow PutObject

#[cfg(test)]
mod tests {
    use s3_put::config::S3Config;
    use s3_put::s3::{ObjectStore, S3Client, StoreError};
    use s3_put::upload::{UploadError, UploadOutcome, UploadRequest, UploadWorkflow};
    use std::io::Write;
    use std::time::{Duration, Instant};
    use tempfile::NamedTempFile;
    use wiremock::matchers::{method, path, path_regex};
    use wiremock::{Mock, MockServer, Request, ResponseTemplate};

    const ETAG: &str = "\"d41d8cd98f00b204e9800998ecf8427e\"";

    async fn client_for(server: &MockServer) -> S3Client {
        let config = S3Config {
            region: "us-east-1".to_string(),
            endpoint: Some(server.uri()),
            force_path_style: true,
            access_key: Some("test-access".to_string()),
            secret_key: Some("test-secret".to_string()),
            session_token: None,
        };
        S3Client::new(&config).await.unwrap()
    }

    fn list_buckets_xml(names: &[&str]) -> String {
        let buckets: String = names
            .iter()
            .map(|name| {
                format!(
                    "<Bucket><Name>{name}</Name><CreationDate>2024-01-01T00:00:00.000Z</CreationDate></Bucket>"
                )
            })
            .collect();
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<ListAllMyBucketsResult xmlns="http://s3.amazonaws.com/doc/2006-03-01/"><Owner><ID>owner</ID><DisplayName>owner</DisplayName></Owner><Buckets>{buckets}</Buckets></ListAllMyBucketsResult>"#
        )
    }

    fn error_xml(code: &str, message: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<Error><Code>{code}</Code><Message>{message}</Message><RequestId>test-request</RequestId></Error>"#
        )
    }

    async fn mount_list_buckets(server: &MockServer, names: &[&str]) {
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(list_buckets_xml(names), "application/xml"),
            )
            .expect(1)
            .mount(server)
            .await;
    }

    /// Path-style CreateBucket goes to `/{bucket}` with or without a trailing slash
    fn bucket_path(bucket: &str) -> String {
        format!("^/{bucket}/?$")
    }

    /// `METHOD /path` for each received request, trailing slash dropped
    async fn request_lines(server: &MockServer) -> Vec<String> {
        let requests: Vec<Request> = server.received_requests().await.unwrap();
        requests
            .iter()
            .map(|request| {
                let path = request.url.path();
                let path = if path.len() > 1 {
                    path.trim_end_matches('/')
                } else {
                    path
                };
                format!("{} {}", request.method.as_str(), path)
            })
            .collect()
    }

    fn sample_file(contents: &[u8]) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents).unwrap();
        file
    }

    // ========================================================================
    // TEST: Raw client operations
    // ========================================================================

    #[tokio::test]
    async fn test_list_buckets_returns_names_in_order() {
        let server = MockServer::start().await;
        mount_list_buckets(&server, &["alpha", "beta", "gamma"]).await;

        let client = client_for(&server).await;
        let names = client.list_buckets().await.unwrap();

        assert_eq!(names, vec!["alpha", "beta", "gamma"]);
    }

    #[tokio::test]
    async fn test_list_buckets_access_denied_is_service_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_raw(error_xml("AccessDenied", "Access Denied"), "application/xml"),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.list_buckets().await.unwrap_err();

        match err {
            StoreError::Service { operation, code, .. } => {
                assert_eq!(operation, "ListBuckets");
                assert_eq!(code, "AccessDenied");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_create_bucket_already_owned() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path_regex(bucket_path("mine")))
            .respond_with(ResponseTemplate::new(409).set_body_raw(
                error_xml("BucketAlreadyOwnedByYou", "Your previous request succeeded"),
                "application/xml",
            ))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.create_bucket("mine").await.unwrap_err();

        assert!(matches!(err, StoreError::BucketAlreadyOwned(ref name) if name == "mine"));
    }

    // ========================================================================
    // TEST: Full workflow over HTTP
    // ========================================================================

    #[tokio::test]
    async fn test_missing_bucket_is_created_then_object_uploaded() {
        let server = MockServer::start().await;
        mount_list_buckets(&server, &[]).await;

        Mock::given(method("PUT"))
            .and(path_regex(bucket_path("my-bucket")))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/my-bucket/file.txt"))
            .respond_with(ResponseTemplate::new(200).insert_header("ETag", ETAG))
            .expect(1)
            .mount(&server)
            .await;

        let file = sample_file(b"Hello, World!");
        let request =
            UploadRequest::new("my-bucket", "file.txt", file.path(), Duration::ZERO).unwrap();
        let workflow = UploadWorkflow::new(client_for(&server).await);

        let outcome = workflow.run(&request).await;

        match outcome {
            UploadOutcome::Success(receipt) => {
                assert_eq!(receipt.bucket, "my-bucket");
                assert_eq!(receipt.key, "file.txt");
                assert_eq!(receipt.bytes, 13);
                assert_eq!(receipt.etag.as_deref(), Some(ETAG));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(
            request_lines(&server).await,
            vec!["GET /", "PUT /my-bucket", "PUT /my-bucket/file.txt"]
        );
    }

    #[tokio::test]
    async fn test_existing_bucket_is_not_created() {
        let server = MockServer::start().await;
        mount_list_buckets(&server, &["existing"]).await;

        Mock::given(method("PUT"))
            .and(path_regex(bucket_path("existing")))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/existing/file.txt"))
            .respond_with(ResponseTemplate::new(200).insert_header("ETag", ETAG))
            .expect(1)
            .mount(&server)
            .await;

        let file = sample_file(b"data");
        let request =
            UploadRequest::new("existing", "file.txt", file.path(), Duration::from_secs(30))
                .unwrap();
        let outcome = UploadWorkflow::new(client_for(&server).await)
            .run(&request)
            .await;

        assert!(outcome.is_success());
        assert_eq!(
            request_lines(&server).await,
            vec!["GET /", "PUT /existing/file.txt"]
        );
    }

    #[tokio::test]
    async fn test_bucket_owned_elsewhere_stops_before_upload() {
        let server = MockServer::start().await;
        mount_list_buckets(&server, &[]).await;

        Mock::given(method("PUT"))
            .and(path_regex(bucket_path("taken")))
            .respond_with(ResponseTemplate::new(409).set_body_raw(
                error_xml("BucketAlreadyExists", "The requested bucket name is not available"),
                "application/xml",
            ))
            .expect(1)
            .mount(&server)
            .await;

        Mock::given(method("PUT"))
            .and(path("/taken/file.txt"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let file = sample_file(b"data");
        let request = UploadRequest::new("taken", "file.txt", file.path(), Duration::ZERO).unwrap();
        let outcome = UploadWorkflow::new(client_for(&server).await)
            .run(&request)
            .await;

        assert!(matches!(
            outcome,
            UploadOutcome::Failed(UploadError::CreateBucket { .. })
        ));
        assert_eq!(outcome.exit_code(), 1);
        assert_eq!(request_lines(&server).await, vec!["GET /", "PUT /taken"]);
    }

    #[tokio::test]
    async fn test_slow_put_times_out() {
        let server = MockServer::start().await;
        mount_list_buckets(&server, &["existing"]).await;

        Mock::given(method("PUT"))
            .and(path("/existing/file.txt"))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("ETag", ETAG)
                    .set_delay(Duration::from_secs(10)),
            )
            .mount(&server)
            .await;

        let file = sample_file(b"slow upload");
        let request =
            UploadRequest::new("existing", "file.txt", file.path(), Duration::from_millis(500))
                .unwrap();

        let started = Instant::now();
        let outcome = UploadWorkflow::new(client_for(&server).await)
            .run(&request)
            .await;

        assert!(outcome.is_timed_out(), "unexpected outcome: {outcome:?}");
        assert!(started.elapsed() < Duration::from_secs(5));
        assert_eq!(outcome.exit_code(), 1);
    }

    #[tokio::test]
    async fn test_put_access_denied_is_failure_not_timeout() {
        let server = MockServer::start().await;
        mount_list_buckets(&server, &["existing"]).await;

        Mock::given(method("PUT"))
            .and(path("/existing/file.txt"))
            .respond_with(
                ResponseTemplate::new(403)
                    .set_body_raw(error_xml("AccessDenied", "Access Denied"), "application/xml"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let file = sample_file(b"data");
        let request =
            UploadRequest::new("existing", "file.txt", file.path(), Duration::from_secs(30))
                .unwrap();
        let outcome = UploadWorkflow::new(client_for(&server).await)
            .run(&request)
            .await;

        match outcome {
            UploadOutcome::Failed(UploadError::Upload(StoreError::Service { code, .. })) => {
                assert_eq!(code, "AccessDenied")
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }
}
