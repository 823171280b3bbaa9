//! Outbound client tests against local mock servers

use std::time::Duration;

use chrono::Utc;
use serde_json::json;
use vox_coach::models::AttemptRecord;
use vox_coach::services::{
    CoachingStore, FeedbackGenerator, GeminiClient, GenerationError, GoogleSpeechClient,
    GoogleTtsClient, PersistenceError, RestCoachingStore, RetryPolicy, SpeechSynthesizer,
    SpeechTranscriber, SynthesisError, TranscriptionError,
};
use vox_common::api::UserProfile;
use wiremock::matchers::{body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TIMEOUT: Duration = Duration::from_secs(5);

fn fast_retry() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
    }
}

// ============================================================================
// Speech-to-text
// ============================================================================

#[tokio::test]
async fn test_speech_client_joins_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .and(query_param("key", "speech-key"))
        .and(body_partial_json(json!({
            "config": { "encoding": "WEBM_OPUS", "sampleRateHertz": 48000, "languageCode": "en-US" },
            "audio": { "content": "AAAA" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                { "alternatives": [{ "transcript": "Hi I'm Sarah", "confidence": 0.93 }] },
                { "alternatives": [{ "transcript": "a software engineer" }] }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GoogleSpeechClient::new("speech-key".into(), Some(server.uri()), TIMEOUT, fast_retry()).unwrap();
    let transcript = client.transcribe("AAAA").await.unwrap();

    assert_eq!(transcript, "Hi I'm Sarah a software engineer");
}

#[tokio::test]
async fn test_speech_client_no_results_is_empty() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let client = GoogleSpeechClient::new("k".into(), Some(server.uri()), TIMEOUT, fast_retry()).unwrap();
    assert_eq!(client.transcribe("AAAA").await.unwrap(), "");
}

#[tokio::test]
async fn test_speech_client_surfaces_google_error_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": { "code": 400, "message": "Invalid recognition 'config': bad encoding", "status": "INVALID_ARGUMENT" }
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GoogleSpeechClient::new("k".into(), Some(server.uri()), TIMEOUT, fast_retry()).unwrap();

    match client.transcribe("AAAA").await {
        Err(TranscriptionError::Api { status, message }) => {
            assert_eq!(status, 400);
            assert_eq!(message, "Invalid recognition 'config': bad encoding");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_speech_client_retries_transient_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .with_priority(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/speech:recognize"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{ "alternatives": [{ "transcript": "second try" }] }]
        })))
        .mount(&server)
        .await;

    let client = GoogleSpeechClient::new("k".into(), Some(server.uri()), TIMEOUT, fast_retry()).unwrap();
    assert_eq!(client.transcribe("AAAA").await.unwrap(), "second try");
}

// ============================================================================
// Generation
// ============================================================================

#[tokio::test]
async fn test_gemini_client_requests_json_output() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1beta/models/gemini-2.5-flash:generateContent"))
        .and(query_param("key", "gemini-key"))
        .and(body_partial_json(json!({
            "generationConfig": { "temperature": 0.85, "responseMimeType": "application/json" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": "{\"scores\":" }, { "text": "{}}" }] },
                "finishReason": "STOP"
            }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new(
        "gemini-key".into(),
        Some(server.uri()),
        None,
        None,
        TIMEOUT,
        fast_retry(),
    )
    .unwrap();

    assert_eq!(client.generate("prompt").await.unwrap(), "{\"scores\":{}}");
}

#[tokio::test]
async fn test_gemini_client_gives_up_after_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_json(json!({
            "error": { "code": 429, "message": "Resource has been exhausted" }
        })))
        .expect(3)
        .mount(&server)
        .await;

    let client = GeminiClient::new("k".into(), Some(server.uri()), None, None, TIMEOUT, fast_retry()).unwrap();

    match client.generate("prompt").await {
        Err(GenerationError::Api { status, message }) => {
            assert_eq!(status, 429);
            assert_eq!(message, "Resource has been exhausted");
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}

#[tokio::test]
async fn test_gemini_client_does_not_retry_client_errors() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
        .expect(1)
        .mount(&server)
        .await;

    let client = GeminiClient::new("k".into(), Some(server.uri()), None, None, TIMEOUT, fast_retry()).unwrap();
    assert!(matches!(
        client.generate("prompt").await,
        Err(GenerationError::Api { status: 403, .. })
    ));
}

#[tokio::test]
async fn test_gemini_client_empty_candidates() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "candidates": [] })))
        .mount(&server)
        .await;

    let client = GeminiClient::new("k".into(), Some(server.uri()), None, None, TIMEOUT, fast_retry()).unwrap();
    assert!(matches!(client.generate("prompt").await, Err(GenerationError::EmptyReply(_))));
}

// ============================================================================
// Text-to-speech
// ============================================================================

#[tokio::test]
async fn test_tts_client_returns_audio_content() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/text:synthesize"))
        .and(query_param("key", "speech-key"))
        .and(body_partial_json(json!({
            "input": { "text": "Nice work" },
            "voice": { "name": "en-US-Neural2-F", "ssmlGender": "FEMALE" },
            "audioConfig": { "audioEncoding": "MP3" }
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "audioContent": "SUQzBAAA" })))
        .expect(1)
        .mount(&server)
        .await;

    let client = GoogleTtsClient::new("speech-key".into(), Some(server.uri()), TIMEOUT).unwrap();
    assert_eq!(client.synthesize("Nice work").await.unwrap(), "SUQzBAAA");
}

#[tokio::test]
async fn test_tts_client_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .mount(&server)
        .await;

    let client = GoogleTtsClient::new("k".into(), Some(server.uri()), TIMEOUT).unwrap();
    assert!(matches!(
        client.synthesize("Nice work").await,
        Err(SynthesisError::Api { status: 500, .. })
    ));
}

// ============================================================================
// REST datastore
// ============================================================================

fn record() -> AttemptRecord {
    AttemptRecord {
        user_id: Some("user_1".into()),
        user_email: Some("sarah@example.com".into()),
        user_name: Some("Sarah".into()),
        duration: 15,
        attempt_number: 1,
        transcript: "Hi I'm Sarah".into(),
        scores: "{}".into(),
        coaching_data: "{}".into(),
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_rest_store_inserts_attempt_with_service_key() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/attempts"))
        .and(header("apikey", "service-key"))
        .and(header("authorization", "Bearer service-key"))
        .and(header("prefer", "return=minimal"))
        .and(body_partial_json(json!({ "user_email": "sarah@example.com", "attempt_number": 1, "duration": 15 })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let store = RestCoachingStore::new(format!("{}/", server.uri()), "service-key".into(), TIMEOUT).unwrap();
    store.save_attempt(&record()).await.unwrap();
}

#[tokio::test]
async fn test_rest_store_inserts_user() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/users"))
        .and(body_partial_json(json!({ "name": "Sarah", "role": "Engineer" })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let store = RestCoachingStore::new(server.uri(), "service-key".into(), TIMEOUT).unwrap();
    store
        .save_user(&UserProfile::new("Sarah", "sarah@example.com", "Engineer"))
        .await
        .unwrap();
}

#[tokio::test]
async fn test_rest_store_reports_server_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("{\"message\":\"relation does not exist\"}"))
        .mount(&server)
        .await;

    let store = RestCoachingStore::new(server.uri(), "service-key".into(), TIMEOUT).unwrap();

    match store.save_attempt(&record()).await {
        Err(PersistenceError::Api { status, message }) => {
            assert_eq!(status, 500);
            assert!(message.contains("relation does not exist"));
        }
        other => panic!("expected Api error, got {:?}", other),
    }
}
