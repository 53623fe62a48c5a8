//! The wire protocol: requests, responses, notifications.
//!
//! The source of truth for request/response pairing is
//! [`server`](crate::server)'s dispatcher; the type system deliberately does
//! not encode which payload answers which request.

use std::path::PathBuf;

use loam_core::{LineCol, SourcePath, Span, SymbolName};
use loam_ide::{
    CompletionItem, DocumentSymbol, HoverInfo, Location, ResolvedCompletion, SignatureHelp,
    TypeCoverageResult,
};
use loam_lang::DefKind;
use serde::{Deserialize, Serialize};

use crate::config::DaemonConfig;
use crate::error::DaemonError;

/// A document reference in a request.
///
/// Supplied `contents` are the editor's unsaved view and create or refresh an
/// entry; a bare path means "read disk", and any existing entry is kept
/// as-is.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocLoc {
    pub path: SourcePath,
    pub contents: Option<String>,
}

impl DocLoc {
    pub fn on_disk(path: SourcePath) -> Self {
        Self {
            path,
            contents: None,
        }
    }

    pub fn edited(path: SourcePath, contents: impl Into<String>) -> Self {
        Self {
            path,
            contents: Some(contents.into()),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum Request {
    Initialize {
        root: PathBuf,
        saved_state_path: Option<PathBuf>,
        use_ranked_autocomplete: bool,
        config: DaemonConfig,
    },
    Shutdown,
    Verbose(bool),
    FileOpened {
        path: SourcePath,
        contents: String,
    },
    FileClosed {
        path: SourcePath,
    },
    FileChanged {
        path: SourcePath,
    },
    Hover {
        doc: DocLoc,
        pos: LineCol,
    },
    Completion {
        doc: DocLoc,
        pos: LineCol,
        is_manually_invoked: bool,
    },
    CompletionResolve {
        symbol: SymbolName,
        kind: DefKind,
    },
    CompletionResolveLocation {
        doc: DocLoc,
        pos: LineCol,
        kind: DefKind,
    },
    DocumentHighlight {
        doc: DocLoc,
        pos: LineCol,
    },
    SignatureHelp {
        doc: DocLoc,
        pos: LineCol,
    },
    Definition {
        doc: DocLoc,
        pos: LineCol,
    },
    TypeDefinition {
        doc: DocLoc,
        pos: LineCol,
    },
    DocumentSymbol {
        doc: DocLoc,
    },
    TypeCoverage {
        doc: DocLoc,
    },
}

impl Request {
    pub fn method(&self) -> &'static str {
        match self {
            Request::Initialize { .. } => "initialize",
            Request::Shutdown => "shutdown",
            Request::Verbose(_) => "verbose",
            Request::FileOpened { .. } => "file_opened",
            Request::FileClosed { .. } => "file_closed",
            Request::FileChanged { .. } => "file_changed",
            Request::Hover { .. } => "hover",
            Request::Completion { .. } => "completion",
            Request::CompletionResolve { .. } => "completion_resolve",
            Request::CompletionResolveLocation { .. } => "completion_resolve_location",
            Request::DocumentHighlight { .. } => "document_highlight",
            Request::SignatureHelp { .. } => "signature_help",
            Request::Definition { .. } => "definition",
            Request::TypeDefinition { .. } => "type_definition",
            Request::DocumentSymbol { .. } => "document_symbol",
            Request::TypeCoverage { .. } => "type_coverage",
        }
    }

    /// Notification-style requests produce no `Response`.
    pub fn expects_response(&self) -> bool {
        !matches!(self, Request::FileChanged { .. } | Request::Verbose(_))
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ResponsePayload {
    Ok,
    Initialized {
        num_changed_files_to_process: usize,
    },
    Hover(Option<HoverInfo>),
    Completion(Vec<CompletionItem>),
    CompletionResolve(Option<ResolvedCompletion>),
    DocumentHighlight(Vec<Span>),
    SignatureHelp(Option<SignatureHelp>),
    Definition(Option<Location>),
    TypeDefinition(Option<Location>),
    DocumentSymbol(Vec<DocumentSymbol>),
    TypeCoverage(TypeCoverageResult),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Notification {
    /// Backlog progress. `processed` never exceeds `total`.
    Processing { processed: usize, total: usize },
    /// The backlog set is empty.
    Done,
    VerboseChanged(bool),
}

/// An inbound frame. Requests that expect a response carry an `id`, echoed
/// back in the matching [`ServerMessage::Response`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ClientMessage {
    pub id: Option<u64>,
    pub request: Request,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum ServerMessage {
    Response {
        id: u64,
        /// Wall-clock seconds since the epoch at which the daemon unblocked
        /// to process the request.
        unblocked_time: f64,
        result: Result<ResponsePayload, DaemonError>,
    },
    Notification(Notification),
}
