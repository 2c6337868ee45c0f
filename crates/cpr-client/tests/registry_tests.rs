//! Client tests against a mocked registry endpoint.

use chrono::NaiveDate;
use cpr_client::{
    ClientCertificate, Cpr, CprClient, CprError, FamilyLookup, InvocationContext, LookupLog,
    LookupRequest, TransportError, TransportTimeouts,
};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

mockall::mock! {
    Log {}

    impl LookupLog for Log {
        fn lookup_attempt(&self, redacted_cpr: &str);
        fn lookup_completed(&self, redacted_cpr: &str, matches: usize);
    }
}

fn context() -> InvocationContext {
    InvocationContext::new("agreement-uuid", "user-uuid", "system-uuid")
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 10, 17).unwrap()
}

fn field(r: &str, v: &str) -> String {
    format!(r#"<Field r="{}" v="{}"/>"#, r, v)
}

fn family_row(name: &str, birth: &str, relation: &str) -> String {
    format!(
        "<Row>{}{}{}</Row>",
        field("ADRNVN", name),
        field("PNR_FOEDDATO", birth),
        field("FAMMRK", relation)
    )
}

fn gctp_document(rows: &[String]) -> String {
    format!(
        r#"<root xmlns="http://www.cpr.dk"><Gctp v="1.0"><System r="CprSoeg"><Service r="Familie"><CprData u="O"><Rolle r="Familie"><Table>{}</Table></Rolle></CprData></Service></System></Gctp></root>"#,
        rows.concat()
    )
}

fn soap_response(result: &str) -> String {
    let escaped = result
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;");
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?><soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><callGctpServiceResponse xmlns="http://serviceplatformen.dk/xml/wsdl/soap11/CprService/1/"><callGCTPCheckServiceResponse><result>{}</result></callGCTPCheckServiceResponse></callGctpServiceResponse></soap:Body></soap:Envelope>"#,
        escaped
    )
}

fn soap_fault(message: &str) -> String {
    format!(
        r#"<soap:Envelope xmlns:soap="http://schemas.xmlsoap.org/soap/envelope/"><soap:Body><soap:Fault><faultcode>soap:Client</faultcode><faultstring>{}</faultstring></soap:Fault></soap:Body></soap:Envelope>"#,
        message
    )
}

fn client(mock_server: &MockServer) -> CprClient {
    CprClient::builder(format!("{}/cpr", mock_server.uri()))
        .build()
        .unwrap()
}

fn request() -> LookupRequest {
    let cpr = Cpr::parse("1503856789").unwrap();
    LookupRequest::build(&cpr, &context())
}

#[tokio::test]
async fn test_call_sends_soap_envelope() {
    let mock_server = MockServer::start().await;
    let document = gctp_document(&[]);

    Mock::given(method("POST"))
        .and(path("/cpr"))
        .and(header("SOAPAction", "\"callGctpService\""))
        .and(body_string_contains("<ServiceAgreementUUID>agreement-uuid</ServiceAgreementUUID>"))
        .and(body_string_contains("v=&quot;1503856789&quot;"))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_response(&document)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let raw = client(&mock_server).call(&request()).await.unwrap();
    assert_eq!(raw, document);
}

#[tokio::test]
async fn test_invoke_parses_rows() {
    let mock_server = MockServer::start().await;
    let document = gctp_document(&[
        family_row("Jensen,Anna", "0101151234", "Barn"),
        family_row("Jensen,Peter", "1503856789", "Far"),
    ]);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_response(&document)))
        .mount(&mock_server)
        .await;

    let parsed = client(&mock_server).invoke(&request()).await.unwrap();
    assert_eq!(parsed.rows().len(), 2);
    assert_eq!(parsed.rows()[0].get("ADRNVN"), Some("Jensen,Anna"));
    assert_eq!(parsed.rows()[1].get("FAMMRK"), Some("Far"));
}

#[tokio::test]
async fn test_soap_fault_is_remote_fault() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string(soap_fault("Unknown agreement")))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).call(&request()).await.unwrap_err();
    match err {
        CprError::Transport(TransportError::RemoteFault { status, message }) => {
            assert_eq!(status, 500);
            assert_eq!(message, "Unknown agreement");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_forbidden_is_handshake_failure() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(403))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).call(&request()).await.unwrap_err();
    assert!(matches!(err, CprError::Transport(TransportError::Handshake(_))));
}

#[tokio::test]
async fn test_refused_connection_is_handshake_failure() {
    // Bind then drop to get a local port nothing listens on
    let port = std::net::TcpListener::bind("127.0.0.1:0")
        .unwrap()
        .local_addr()
        .unwrap()
        .port();

    let client = CprClient::builder(format!("http://127.0.0.1:{port}/cpr"))
        .build()
        .unwrap();

    let err = client.call(&request()).await.unwrap_err();
    assert!(!err.is_timeout());
    assert!(matches!(err, CprError::Transport(TransportError::Handshake(_))));
}

#[tokio::test]
async fn test_slow_registry_times_out() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(soap_response(&gctp_document(&[])))
                .set_delay(Duration::from_secs(5)),
        )
        .mount(&mock_server)
        .await;

    let client = CprClient::builder(mock_server.uri())
        .timeouts(TransportTimeouts {
            send: Duration::from_millis(200),
            ..TransportTimeouts::default()
        })
        .build()
        .unwrap();

    let err = client.call(&request()).await.unwrap_err();
    assert!(err.is_timeout());
    assert!(matches!(
        err,
        CprError::Transport(TransportError::Timeout { phase: "send", .. })
    ));
}

#[tokio::test]
async fn test_malformed_result_is_reported() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_response("<Gctp/>")))
        .mount(&mock_server)
        .await;

    let err = client(&mock_server).invoke(&request()).await.unwrap_err();
    assert!(matches!(err, CprError::MalformedResponse(_)));
}

#[test]
fn test_missing_certificate_file() {
    let err = CprClient::builder("https://registry.example")
        .client_certificate(ClientCertificate::new("/nonexistent/client.p12", "secret"))
        .build()
        .unwrap_err();

    match err {
        TransportError::CertificateLoad { path, .. } => {
            assert_eq!(path.to_str(), Some("/nonexistent/client.p12"));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[test]
fn test_garbage_certificate_file() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"definitely not pkcs12").unwrap();

    let err = CprClient::builder("https://registry.example")
        .client_certificate(ClientCertificate::new(file.path(), "secret"))
        .build()
        .unwrap_err();

    assert!(matches!(err, TransportError::CertificateLoad { .. }));
}

#[tokio::test]
async fn test_lookup_returns_minor_children() {
    let mock_server = MockServer::start().await;
    let document = gctp_document(&[
        family_row("Jensen,Peter", "1503856789", "Far"),
        family_row("Jensen,Anna", "0101151234", "Barn"),
        family_row("Jensen,Bo", "0101051234", "Barn"),
        family_row("Jensen,Ida", "0101201234", "Barn"),
    ]);

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_string(soap_response(&document)))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut log = MockLog::new();
    log.expect_lookup_attempt()
        .withf(|cpr| cpr.to_string() == "150385-XXXX")
        .times(1)
        .return_const(());
    log.expect_lookup_completed()
        .withf(|cpr, matches| cpr.to_string() == "150385-XXXX" && *matches == 2)
        .times(1)
        .return_const(());

    let lookup = FamilyLookup::with_log(client(&mock_server), context(), Arc::new(log));
    let children = lookup.minor_children("1503856789", today()).await.unwrap();

    let names: Vec<_> = children
        .iter()
        .filter_map(|c| c.display_name.as_deref())
        .collect();
    assert_eq!(names, vec!["Jensen,Anna", "Jensen,Ida"]);
    assert_eq!(children[0].birth_identifier, "0101151234");
}

#[tokio::test]
async fn test_lookup_invalid_cpr_never_reaches_registry() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let mut log = MockLog::new();
    log.expect_lookup_attempt().never();

    let lookup = FamilyLookup::with_log(client(&mock_server), context(), Arc::new(log));
    let err = lookup.minor_children("3213856789", today()).await.unwrap_err();

    assert!(matches!(err, CprError::InvalidIdentifier));
}
