pub mod lead_feed;
pub mod webhook;

pub use lead_feed::PgLeadFeedAdapter;
pub use webhook::WebhookAutomationAdapter;
