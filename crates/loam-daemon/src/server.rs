//! The request loop: state machine, fairness policy, dispatch.

use std::panic::AssertUnwindSafe;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use futures::{SinkExt, StreamExt};
use tokio::io::{AsyncRead, AsyncWrite};
use tokio_util::bytes::{Bytes, BytesMut};
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};

use loam_decl::{respect_but_quarantine_unsaved_changes, Snapshot};

use crate::backlog;
use crate::config::DaemonConfig;
use crate::error::DaemonError;
use crate::init::{self, InitializeParams};
use crate::protocol::{ClientMessage, Notification, Request, ResponsePayload, ServerMessage};
use crate::state::{DaemonState, InitializedState};
use crate::telemetry::RequestMetrics;
use crate::wire;

pub struct Daemon<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> {
    reader: FramedRead<R, LengthDelimitedCodec>,
    writer: FramedWrite<W, LengthDelimitedCodec>,
    state: DaemonState,
    metrics: RequestMetrics,
    flush_interval: Duration,
    verbose_hook: Option<Box<dyn Fn(bool) + Send>>,
}

enum Turn {
    Frame(Option<std::io::Result<BytesMut>>),
    Telemetry,
    Backlog,
}

enum Outcome {
    Respond(Result<ResponsePayload, DaemonError>),
    Notify(Notification),
    Silent,
}

impl<R: AsyncRead + Unpin, W: AsyncWrite + Unpin> Daemon<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            reader: wire::framed_read(reader),
            writer: wire::framed_write(writer),
            state: DaemonState::Pending,
            metrics: RequestMetrics::default(),
            flush_interval: DaemonConfig::default().telemetry_flush_interval(),
            verbose_hook: None,
        }
    }

    pub fn with_flush_interval(mut self, interval: Duration) -> Self {
        self.flush_interval = interval;
        self
    }

    /// Called when the client toggles verbose logging; the binary wires this
    /// to the subscriber's reload handle.
    pub fn with_verbose_hook(mut self, hook: impl Fn(bool) + Send + 'static) -> Self {
        self.verbose_hook = Some(Box::new(hook));
        self
    }

    /// Drive the daemon until shutdown, input EOF or a transport failure.
    ///
    /// Strict priority: a readable frame always beats the backlog; the
    /// backlog is touched only when the pipe has nothing for us; the
    /// telemetry flush rides the same loop.
    pub async fn run(mut self) -> std::io::Result<()> {
        let mut telemetry = tokio::time::interval(self.flush_interval);
        telemetry.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; consume it so the first flush
        // happens one interval in.
        telemetry.tick().await;

        loop {
            let backlog_ready = matches!(
                &self.state,
                DaemonState::Initialized(state) if !state.changed_files.is_empty()
            );
            let turn = tokio::select! {
                biased;
                frame = self.reader.next() => Turn::Frame(frame),
                _ = telemetry.tick() => Turn::Telemetry,
                _ = std::future::ready(()), if backlog_ready => Turn::Backlog,
            };

            match turn {
                Turn::Frame(None) => {
                    tracing::info!(target = "loam.daemon", "input pipe closed; exiting");
                    break;
                }
                Turn::Frame(Some(Err(err))) => {
                    // Transport failure: close up shop.
                    tracing::error!(target = "loam.daemon", error = %err, "transport read failed");
                    return Err(err);
                }
                Turn::Frame(Some(Ok(frame))) => {
                    let unblocked_time = unix_time_now();
                    let message: ClientMessage = match wire::decode(&frame) {
                        Ok(message) => message,
                        Err(err) => {
                            tracing::warn!(
                                target = "loam.daemon",
                                error = %err,
                                len = frame.len(),
                                "dropping undecodable frame"
                            );
                            continue;
                        }
                    };
                    if self.handle_message(message, unblocked_time).await? {
                        break;
                    }
                }
                Turn::Telemetry => self.metrics.flush(),
                Turn::Backlog => {
                    if let DaemonState::Initialized(state) = &mut self.state {
                        let notifications = backlog::process_one_changed_file(state);
                        for notification in notifications {
                            self.notify(notification).await?;
                        }
                    }
                }
            }
        }

        self.metrics.flush();
        Ok(())
    }

    /// Returns `true` when the loop should exit.
    async fn handle_message(
        &mut self,
        message: ClientMessage,
        unblocked_time: f64,
    ) -> std::io::Result<bool> {
        let method = message.request.method();
        let start = Instant::now();
        tracing::debug!(target = "loam.daemon", method, id = ?message.id, "handling message");

        // Shutdown exits from any state; the stubs directory goes away when
        // the initialized state drops.
        if matches!(message.request, Request::Shutdown) {
            if let Some(id) = message.id {
                self.respond(id, unblocked_time, Ok(ResponsePayload::Ok))
                    .await?;
            }
            self.metrics.record(method, start.elapsed(), false);
            tracing::info!(target = "loam.daemon", state = self.state.describe(), "shutting down");
            return Ok(true);
        }

        let mut followups: Vec<Notification> = Vec::new();
        let outcome = match (&mut self.state, message.request) {
            (
                DaemonState::Pending,
                Request::Initialize {
                    root,
                    saved_state_path,
                    use_ranked_autocomplete,
                    config,
                },
            ) => {
                let verbose = config.verbose;
                let params = InitializeParams {
                    root,
                    saved_state_path,
                    use_ranked_autocomplete,
                    config,
                };
                let result = std::panic::catch_unwind(AssertUnwindSafe(|| init::initialize(params)))
                    .unwrap_or_else(|panic| {
                        Err(DaemonError::InitUncaught {
                            debug: panic_message(&panic),
                        })
                    });
                match result {
                    Ok(state) => {
                        let num_changed_files_to_process = state.changed_files.len();
                        if num_changed_files_to_process == 0 {
                            followups.push(Notification::Done);
                        }
                        self.state = DaemonState::Initialized(Box::new(state));
                        if verbose {
                            if let Some(hook) = &self.verbose_hook {
                                hook(true);
                            }
                        }
                        Outcome::Respond(Ok(ResponsePayload::Initialized {
                            num_changed_files_to_process,
                        }))
                    }
                    Err(err) => {
                        self.state = DaemonState::Failed(err.clone());
                        Outcome::Respond(Err(err))
                    }
                }
            }
            (DaemonState::Pending, _) => Outcome::Respond(Err(DaemonError::not_yet_initialized())),
            (DaemonState::Failed(err), _) => Outcome::Respond(Err(err.clone())),
            (DaemonState::Initialized(_), Request::Initialize { .. }) => {
                Outcome::Respond(Err(DaemonError::already_initialized()))
            }
            (DaemonState::Initialized(_), Request::Verbose(enabled)) => {
                if let Some(hook) = &self.verbose_hook {
                    hook(enabled);
                }
                tracing::info!(target = "loam.daemon", enabled, "verbose logging toggled");
                Outcome::Notify(Notification::VerboseChanged(enabled))
            }
            (DaemonState::Initialized(state), Request::FileChanged { path }) => {
                state.queue_changed_file(path);
                Outcome::Silent
            }
            (DaemonState::Initialized(state), Request::FileOpened { path, contents }) => {
                Outcome::Respond(state.open_file(path, contents).map(|()| ResponsePayload::Ok))
            }
            (DaemonState::Initialized(state), Request::FileClosed { path }) => {
                state.close_file(&path);
                Outcome::Respond(Ok(ResponsePayload::Ok))
            }
            (DaemonState::Initialized(state), request) => {
                let result =
                    std::panic::catch_unwind(AssertUnwindSafe(|| handle_query(state, request)))
                        .unwrap_or_else(|panic| {
                            Err(DaemonError::HandlerUncaught {
                                debug: panic_message(&panic),
                            })
                        });
                Outcome::Respond(result)
            }
        };

        let mut is_error = false;
        match outcome {
            Outcome::Respond(result) => {
                is_error = result.is_err();
                match message.id {
                    Some(id) => self.respond(id, unblocked_time, result).await?,
                    None => {
                        if let Err(err) = result {
                            tracing::warn!(
                                target = "loam.daemon",
                                method,
                                error = %err,
                                "error on a message that carries no id"
                            );
                        }
                    }
                }
            }
            Outcome::Notify(notification) => self.notify(notification).await?,
            Outcome::Silent => {}
        }
        for notification in followups {
            self.notify(notification).await?;
        }

        self.metrics.record(method, start.elapsed(), is_error);
        Ok(false)
    }

    async fn respond(
        &mut self,
        id: u64,
        unblocked_time: f64,
        result: Result<ResponsePayload, DaemonError>,
    ) -> std::io::Result<()> {
        self.send(ServerMessage::Response {
            id,
            unblocked_time,
            result,
        })
        .await
    }

    async fn notify(&mut self, notification: Notification) -> std::io::Result<()> {
        self.send(ServerMessage::Notification(notification)).await
    }

    async fn send(&mut self, message: ServerMessage) -> std::io::Result<()> {
        let bytes = wire::encode(&message)?;
        self.writer.send(Bytes::from(bytes)).await
    }
}

/// Dispatch one query against the initialized state. The request→payload
/// pairing lives here, not in the types.
fn handle_query(
    state: &mut InitializedState,
    request: Request,
) -> Result<ResponsePayload, DaemonError> {
    match request {
        Request::Hover { doc, pos } => {
            let entry = state.entry_for(&doc)?;
            Ok(ResponsePayload::Hover(respect_but_quarantine_unsaved_changes(
                &state.ctx,
                state.naming(),
                |snap| loam_ide::hover(snap, &entry, pos),
            )))
        }
        Request::Completion {
            doc,
            pos,
            is_manually_invoked,
        } => {
            let entry = state.entry_for(&doc)?;
            let items = respect_but_quarantine_unsaved_changes(&state.ctx, state.naming(), |snap| {
                loam_ide::completion(snap, &state.symbol_index, &entry, pos, is_manually_invoked)
            });
            Ok(ResponsePayload::Completion(items))
        }
        Request::CompletionResolve { symbol, kind } => {
            // By-name resolve reads only the shared decls; no quarantine.
            let snap = Snapshot::shared(&state.ctx, state.naming());
            Ok(ResponsePayload::CompletionResolve(
                loam_ide::completion_resolve(&snap, &symbol, kind),
            ))
        }
        Request::CompletionResolveLocation { doc, pos, kind } => {
            let entry = state.entry_for(&doc)?;
            let resolved = respect_but_quarantine_unsaved_changes(&state.ctx, state.naming(), |snap| {
                loam_ide::completion_resolve_location(snap, &entry, pos, kind)
            });
            Ok(ResponsePayload::CompletionResolve(resolved))
        }
        Request::DocumentHighlight { doc, pos } => {
            let entry = state.entry_for(&doc)?;
            let spans = respect_but_quarantine_unsaved_changes(&state.ctx, state.naming(), |_snap| {
                loam_ide::document_highlight(&entry, pos)
            });
            Ok(ResponsePayload::DocumentHighlight(spans))
        }
        Request::SignatureHelp { doc, pos } => {
            let entry = state.entry_for(&doc)?;
            let help = respect_but_quarantine_unsaved_changes(&state.ctx, state.naming(), |snap| {
                loam_ide::signature_help(snap, &entry, pos)
            });
            Ok(ResponsePayload::SignatureHelp(help))
        }
        Request::Definition { doc, pos } => {
            let entry = state.entry_for(&doc)?;
            let location = respect_but_quarantine_unsaved_changes(&state.ctx, state.naming(), |snap| {
                loam_ide::definition(snap, &entry, pos)
            });
            Ok(ResponsePayload::Definition(location))
        }
        Request::TypeDefinition { doc, pos } => {
            let entry = state.entry_for(&doc)?;
            let location = respect_but_quarantine_unsaved_changes(&state.ctx, state.naming(), |snap| {
                loam_ide::type_definition(snap, &entry, pos)
            });
            Ok(ResponsePayload::TypeDefinition(location))
        }
        Request::DocumentSymbol { doc } => {
            // Entry-local syntax only; no quarantine.
            let entry = state.entry_for(&doc)?;
            Ok(ResponsePayload::DocumentSymbol(loam_ide::document_symbol(
                &entry,
            )))
        }
        Request::TypeCoverage { doc } => {
            let entry = state.entry_for(&doc)?;
            let coverage = respect_but_quarantine_unsaved_changes(&state.ctx, state.naming(), |snap| {
                loam_ide::type_coverage(snap, &entry)
            });
            Ok(ResponsePayload::TypeCoverage(coverage))
        }
        other => Err(DaemonError::HandlerUncaught {
            debug: format!("request {:?} is not a query", other.method()),
        }),
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

fn unix_time_now() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs_f64())
        .unwrap_or_default()
}
