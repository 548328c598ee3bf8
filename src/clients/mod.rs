//! HTTP clients for the third-party services behind the API.
//!
//! Each client owns a `reqwest` client plus its config section, and every
//! base URL comes from config so tests can point them at a local mock
//! server.

mod email;
mod google;
mod openai;
mod stripe;

pub use email::{ContactForm, EmailClient};
pub use google::{GoogleClient, GoogleProfile};
pub use openai::OpenAiClient;
pub use stripe::{
    verify_signature, CheckoutSession, Customer, PaymentIntent, StripeClient,
    SubscriptionSummary, WebhookEvent,
};
