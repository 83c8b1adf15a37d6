//! services/api/src/web/protocol.rs
//!
//! Defines the WebSocket message protocol between the browser client and the API server
//! for the lead generation application.

use leadmaster_core::domain::{Lead, SearchOptions};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

//=========================================================================================
// Messages Sent FROM the Client (Browser) TO the Server
//=========================================================================================

/// Represents the structured text messages a client can send to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Starts a new top-level query session, superseding any current one.
    SubmitQuery {
        text: String,
        #[serde(default)]
        options: Option<SearchOptions>,
    },

    /// Answers an open clarification question within the current session.
    FollowUp { text: String },

    /// Requests the current lead list as a CSV download payload.
    ExportCsv,

    /// Requests the current lead list as a clipboard TSV plus a
    /// spreadsheet-creation URL.
    ExportSheets,
}

//=========================================================================================
// Messages Sent FROM the Server TO the Client (Browser)
//=========================================================================================

/// Represents the structured text messages the server can send to the client.
#[derive(Serialize, Debug, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// A new session was opened for a submitted query.
    SessionStarted { session_id: Uuid },

    /// Rotating progress text while a top-level dispatch is in flight.
    StatusUpdate { text: String },

    /// The automation accepted the query; leads now arrive over the feed.
    QueryAccepted { message: String },

    /// An assistant turn was appended; the clarification view should open
    /// (or stay open) and render it.
    ClarificationAsked { text: String },

    /// The clarification dialogue ended; `text` carries a final assistant
    /// turn, if the closing response had visible output.
    ClarificationClosed { text: Option<String> },

    /// The "assistant is typing" indicator state.
    AssistantTyping { active: bool },

    /// One lead was accepted into the current session, newest first.
    LeadAdded { lead: Lead },

    /// CSV payload for a file download.
    CsvExport { filename: String, content: String },

    /// TSV for the clipboard plus the spreadsheet-creation URL to open.
    /// The two client-side steps are independent: a clipboard failure must
    /// not stop the open-sheet step.
    SheetsExport { tsv: String, open_url: String },

    /// A transient user-visible notice (validation, timeout, transport).
    Notice { title: String, message: String },

    /// Reports a fatal error to the client, which should display an error message.
    Error { message: String },
}
