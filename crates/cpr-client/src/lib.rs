//! CPR registry family lookup client.
//!
//! Validates a CPR number, sends a GCTP family query to the registry over
//! mutually authenticated TLS, and selects the person's children under 18
//! from the tabular response.

mod client;
mod error;
mod family;
mod identifier;
mod lookup;
mod request;
mod response;

pub use client::{
    ClientCertificate, CprClient, CprClientBuilder, RevocationCheck, TransportTimeouts,
    DEFAULT_SOAP_ACTION,
};
pub use error::{CprError, TransportError};
pub use family::{
    filter_minor_children, FamilyMember, FIELD_BIRTH, FIELD_NAME, FIELD_RELATION, RELATION_CHILD,
};
pub use identifier::{redact, validate, Cpr, MASK};
pub use lookup::{FamilyLookup, LookupLog, TracingLookupLog};
pub use request::{InvocationContext, LookupRequest, FAMILY_SERVICE_UUID};
pub use response::{Dataset, GctpService, GctpSystem, ResponseDocument, Row, Table};
