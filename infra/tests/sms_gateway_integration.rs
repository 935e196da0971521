//! SMS gateways against a local mock HTTP server

use otp_core::services::sms::{DeliveryStatus, SmsGateway};
use otp_core::OtpError;
use otp_infra::sms::{BrevoSmsGateway, TwilioSmsGateway};
use otp_shared::config::SmsConfig;
use wiremock::matchers::{body_json, body_string_contains, header, header_exists, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const PHONE: &str = "+573001234567";

fn brevo_config(server: &MockServer) -> SmsConfig {
    SmsConfig {
        brevo_api_key: Some("xkeysib-test".to_string()),
        brevo_base_url: server.uri(),
        retry_delay_ms: 10,
        ..Default::default()
    }
}

fn twilio_config(server: &MockServer) -> SmsConfig {
    SmsConfig {
        twilio_account_sid: Some("AC123".to_string()),
        twilio_auth_token: Some("secret".to_string()),
        twilio_from_number: Some("+15005550006".to_string()),
        twilio_base_url: server.uri(),
        retry_delay_ms: 10,
        ..Default::default()
    }
}

#[tokio::test]
async fn test_brevo_sends_transactional_sms() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/transactionalSMS/sms"))
        .and(header("api-key", "xkeysib-test"))
        .and(body_json(serde_json::json!({
            "type": "transactional",
            "unicodeEnabled": false,
            "recipient": PHONE,
            "content": "Your YourExchange verification code is: 042137. This code expires in 5 minutes.",
            "sender": "YourExchange"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "reference": "ab1cde2fgh3i4jklmno",
            "messageId": 1511882900176220u64
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = BrevoSmsGateway::new(&brevo_config(&server), 5).unwrap();
    let receipt = gateway.send(PHONE, "042137").await.unwrap();

    assert_eq!(receipt.message_id, "1511882900176220");
    assert_eq!(receipt.provider, "brevo");
}

#[tokio::test]
async fn test_brevo_retries_server_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/transactionalSMS/sms"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v3/transactionalSMS/sms"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({ "messageId": 7 })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = BrevoSmsGateway::new(&brevo_config(&server), 5).unwrap();
    let receipt = gateway.send(PHONE, "123456").await.unwrap();

    assert_eq!(receipt.message_id, "7");
}

#[tokio::test]
async fn test_brevo_does_not_retry_client_errors() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/v3/transactionalSMS/sms"))
        .respond_with(ResponseTemplate::new(401).set_body_string("Key not found"))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = BrevoSmsGateway::new(&brevo_config(&server), 5).unwrap();

    match gateway.send(PHONE, "123456").await {
        Err(OtpError::GatewayError { message }) => assert!(message.contains("401")),
        other => panic!("expected GatewayError, got {:?}", other),
    }
}

#[tokio::test]
async fn test_brevo_gives_up_on_persistent_throttling() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429))
        .expect(3)
        .mount(&server)
        .await;

    let gateway = BrevoSmsGateway::new(&brevo_config(&server), 5).unwrap();

    assert!(matches!(
        gateway.send(PHONE, "123456").await,
        Err(OtpError::GatewayError { .. })
    ));
}

#[tokio::test]
async fn test_twilio_sends_form_with_basic_auth() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/2010-04-01/Accounts/AC123/Messages.json"))
        .and(header_exists("authorization"))
        .and(body_string_contains("To=%2B573001234567"))
        .and(body_string_contains("From=%2B15005550006"))
        .and(body_string_contains("042137"))
        .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
            "sid": "SM0123456789abcdef",
            "status": "queued"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = TwilioSmsGateway::new(&twilio_config(&server), 5).unwrap();
    let receipt = gateway.send(PHONE, "042137").await.unwrap();

    assert_eq!(receipt.message_id, "SM0123456789abcdef");
    assert_eq!(receipt.provider, "twilio");
}

#[tokio::test]
async fn test_twilio_delivery_status() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/2010-04-01/Accounts/AC123/Messages/SM42.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sid": "SM42",
            "status": "delivered"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/2010-04-01/Accounts/AC123/Messages/SM43.json"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "sid": "SM43",
            "status": "undelivered"
        })))
        .mount(&server)
        .await;

    let gateway = TwilioSmsGateway::new(&twilio_config(&server), 5).unwrap();

    assert_eq!(gateway.delivery_status("SM42").await.unwrap(), DeliveryStatus::Delivered);
    assert_eq!(gateway.delivery_status("SM43").await.unwrap(), DeliveryStatus::Failed);
}

#[tokio::test]
async fn test_twilio_rejection_is_gateway_error() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(serde_json::json!({
            "code": 21211,
            "message": "The 'To' number is not a valid phone number."
        })))
        .expect(1)
        .mount(&server)
        .await;

    let gateway = TwilioSmsGateway::new(&twilio_config(&server), 5).unwrap();

    assert!(matches!(
        gateway.send(PHONE, "123456").await,
        Err(OtpError::GatewayError { .. })
    ));
}
