pub mod classify;
pub mod domain;
pub mod export;
pub mod normalize;
pub mod ports;
pub mod reply;

pub use classify::{ClarificationPolicy, KeywordClarificationPolicy};
pub use domain::{ChatRole, ChatTurn, Lead, OutboundMessage, Rating, SearchOptions};
pub use export::{leads_to_csv, leads_to_tsv, CSV_FILENAME, SHEET_URL};
pub use normalize::normalize_lead;
pub use ports::{AutomationService, LeadFeedService, LeadRowStream, PortError, PortResult};
pub use reply::AutomationReply;
