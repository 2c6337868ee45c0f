//! Lookup request construction.

use crate::identifier::Cpr;

/// Service UUID of the CPR family lookup on the registry side.
pub const FAMILY_SERVICE_UUID: &str = "2419e94b-1760-4fc5-935c-2419ac956e79";

const SOAP_ENV_NS: &str = "http://schemas.xmlsoap.org/soap/envelope/";
const SERVICE_NS: &str = "http://serviceplatformen.dk/xml/wsdl/soap11/CprService/1/";
const INVOCATION_CONTEXT_NS: &str = "http://serviceplatformen.dk/xml/schemas/InvocationContext/1/";

/// Identifies the calling service, agreement, user and system to the
/// registry. Sent with every request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationContext {
    pub service_uuid: String,
    pub service_agreement_uuid: String,
    pub user_uuid: String,
    pub user_system_uuid: String,
}

impl InvocationContext {
    /// Build a context for the family lookup service.
    pub fn new(
        service_agreement_uuid: impl Into<String>,
        user_uuid: impl Into<String>,
        user_system_uuid: impl Into<String>,
    ) -> Self {
        Self {
            service_uuid: FAMILY_SERVICE_UUID.to_string(),
            service_agreement_uuid: service_agreement_uuid.into(),
            user_uuid: user_uuid.into(),
            user_system_uuid: user_system_uuid.into(),
        }
    }

    /// Override the service UUID.
    pub fn with_service_uuid(mut self, service_uuid: impl Into<String>) -> Self {
        self.service_uuid = service_uuid.into();
        self
    }
}

/// A single family lookup: invocation context plus GCTP query document.
#[derive(Debug, Clone)]
pub struct LookupRequest {
    pub invocation_context: InvocationContext,
    pub query_document: String,
}

impl LookupRequest {
    pub fn build(cpr: &Cpr, invocation_context: &InvocationContext) -> Self {
        Self {
            invocation_context: invocation_context.clone(),
            query_document: family_query(cpr),
        }
    }

    /// Render the SOAP 1.1 envelope sent to the registry.
    pub fn to_envelope(&self) -> String {
        let ctx = &self.invocation_context;
        format!(
            concat!(
                r#"<?xml version="1.0" encoding="utf-8"?>"#,
                r#"<soap:Envelope xmlns:soap="{env}">"#,
                "<soap:Body>",
                r#"<GCTPLookupRequest xmlns="{svc}">"#,
                r#"<InvocationContext xmlns="{ic}">"#,
                "<ServiceAgreementUUID>{agreement}</ServiceAgreementUUID>",
                "<UserSystemUUID>{system}</UserSystemUUID>",
                "<UserUUID>{user}</UserUUID>",
                "<ServiceUUID>{service}</ServiceUUID>",
                "</InvocationContext>",
                "<gctpMessage>{message}</gctpMessage>",
                "</GCTPLookupRequest>",
                "</soap:Body>",
                "</soap:Envelope>",
            ),
            env = SOAP_ENV_NS,
            svc = SERVICE_NS,
            ic = INVOCATION_CONTEXT_NS,
            agreement = escape_xml(&ctx.service_agreement_uuid),
            system = escape_xml(&ctx.user_system_uuid),
            user = escape_xml(&ctx.user_uuid),
            service = escape_xml(&ctx.service_uuid),
            message = escape_xml(&self.query_document),
        )
    }
}

// The CPR is digits only, so it goes in unescaped.
fn family_query(cpr: &Cpr) -> String {
    format!(
        r#"<Gctp v="1.0"><System r="CprSoeg"><Service r="Familie"><CprServiceHeader r="Familie"><Key><Field r="PNR" v="{}"/></Key></CprServiceHeader></Service></System></Gctp>"#,
        cpr.as_str()
    )
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}
