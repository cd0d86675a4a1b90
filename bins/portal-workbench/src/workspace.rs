//! Challenge workspace state machine
//!
//! **Core Responsibility:**
//! Own the interaction sequence of the challenge workbench: selecting a
//! challenge, holding the in-progress code buffer, gating Run/Submit while
//! a call is outstanding, and folding settled gateway results back into
//! renderable state.
//!
//! **Critical Properties:**
//! - Knows nothing about HTTP: operations return `Dispatch` values
//!   describing the gateway call to perform, settled calls come back as
//!   `Outcome` values through `apply`.
//! - State is an explicit tagged union (`Browsing | Viewing | Busy`);
//!   illegal combinations such as "busy with no selected challenge"
//!   cannot be represented.
//! - Every dispatch and outcome carries the session epoch active when the
//!   call left; `apply` drops any outcome whose epoch no longer matches,
//!   so a response for a discarded or replaced session never touches the
//!   current one.

use portal_common::types::{Challenge, ExecutionOutput, Submission, SubmissionOutcome};
use thiserror::Error;
use tracing::{debug, warn};

use crate::gateway::GatewayError;
use crate::transcript;

/// Transient state of one selected challenge. Exists only while the
/// challenge is selected; discarded wholesale on "back".
#[derive(Debug)]
pub struct Session {
    pub challenge: Challenge,
    pub code_buffer: String,
    pub last_output: Option<String>,
    pub submissions: Vec<Submission>,
    /// True while a history refresh is outstanding. History is a
    /// convenience view: its failure never blocks anything.
    pub history_loading: bool,
}

impl Session {
    fn new(challenge: Challenge) -> Self {
        Self {
            challenge,
            code_buffer: String::new(),
            last_output: None,
            submissions: Vec::new(),
            history_loading: true,
        }
    }
}

/// The one in-flight gateway call of a `Busy` session.
/// Run and Submit are mutually exclusive within a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingCall {
    Run,
    Submit,
}

pub enum WorkspaceState {
    Browsing,
    Viewing(Session),
    Busy {
        session: Session,
        call: PendingCall,
    },
}

/// A gateway call the driver must perform. The code snapshot is taken at
/// dispatch time: buffer edits made while the call is in flight are not
/// observed by it.
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatch {
    Run {
        epoch: u64,
        code: String,
        input: String,
    },
    Submit {
        epoch: u64,
        challenge_id: i64,
        code: String,
    },
    FetchHistory {
        epoch: u64,
        challenge_id: i64,
    },
}

/// A settled gateway call, tagged with the epoch it was dispatched under.
#[derive(Debug)]
pub enum Outcome {
    Run {
        epoch: u64,
        output: ExecutionOutput,
    },
    Submit {
        epoch: u64,
        result: Result<SubmissionOutcome, GatewayError>,
    },
    History {
        epoch: u64,
        result: Result<Vec<Submission>, GatewayError>,
    },
}

impl Outcome {
    pub fn epoch(&self) -> u64 {
        match self {
            Self::Run { epoch, .. } | Self::Submit { epoch, .. } | Self::History { epoch, .. } => {
                *epoch
            }
        }
    }
}

/// Validation failures, surfaced before any network call is made.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("Por favor, escreva algum código antes de continuar.")]
    EmptyCode,
    #[error("Nenhum desafio selecionado.")]
    NoChallengeSelected,
    #[error("Aguarde a chamada em andamento terminar.")]
    CallInFlight,
}

pub struct Workspace {
    state: WorkspaceState,
    /// Session generation, bumped on every select and back. Outcomes from
    /// older generations are discarded on arrival.
    epoch: u64,
}

impl Workspace {
    pub fn new() -> Self {
        Self {
            state: WorkspaceState::Browsing,
            epoch: 0,
        }
    }

    pub fn state(&self) -> &WorkspaceState {
        &self.state
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn session(&self) -> Option<&Session> {
        match &self.state {
            WorkspaceState::Browsing => None,
            WorkspaceState::Viewing(session) => Some(session),
            WorkspaceState::Busy { session, .. } => Some(session),
        }
    }

    pub fn is_busy(&self) -> bool {
        matches!(self.state, WorkspaceState::Busy { .. })
    }

    /// Enter a fresh session for `challenge`. Always resets the code
    /// buffer and output, even when re-selecting the same challenge, and
    /// kicks off a history fetch for it. Valid from any state: selecting
    /// while busy abandons the old session and invalidates its in-flight
    /// call.
    pub fn select_challenge(&mut self, challenge: Challenge) -> Dispatch {
        self.epoch += 1;
        let challenge_id = challenge.id;
        debug!(challenge_id, epoch = self.epoch, "Challenge selected");

        self.state = WorkspaceState::Viewing(Session::new(challenge));
        Dispatch::FetchHistory {
            epoch: self.epoch,
            challenge_id,
        }
    }

    /// Discard the session unconditionally, including the unsaved buffer
    /// and the eventual result of any in-flight call.
    pub fn back(&mut self) {
        if matches!(self.state, WorkspaceState::Browsing) {
            return;
        }
        self.epoch += 1;
        debug!(epoch = self.epoch, "Session discarded");
        self.state = WorkspaceState::Browsing;
    }

    /// Replace the code buffer. Allowed while busy: the running call keeps
    /// the snapshot it was dispatched with.
    pub fn set_code(&mut self, code: String) -> Result<(), WorkspaceError> {
        match &mut self.state {
            WorkspaceState::Browsing => Err(WorkspaceError::NoChallengeSelected),
            WorkspaceState::Viewing(session) | WorkspaceState::Busy { session, .. } => {
                session.code_buffer = code;
                Ok(())
            }
        }
    }

    /// Start an ungraded run against `input`. Empty code is rejected here,
    /// before any call leaves the client.
    pub fn start_run(&mut self, input: &str) -> Result<Dispatch, WorkspaceError> {
        match std::mem::replace(&mut self.state, WorkspaceState::Browsing) {
            WorkspaceState::Browsing => Err(WorkspaceError::NoChallengeSelected),
            WorkspaceState::Busy { session, call } => {
                self.state = WorkspaceState::Busy { session, call };
                Err(WorkspaceError::CallInFlight)
            }
            WorkspaceState::Viewing(mut session) => {
                if session.code_buffer.trim().is_empty() {
                    self.state = WorkspaceState::Viewing(session);
                    return Err(WorkspaceError::EmptyCode);
                }

                session.last_output = None;
                let dispatch = Dispatch::Run {
                    epoch: self.epoch,
                    code: session.code_buffer.clone(),
                    input: input.to_string(),
                };
                self.state = WorkspaceState::Busy {
                    session,
                    call: PendingCall::Run,
                };
                Ok(dispatch)
            }
        }
    }

    /// Start a graded submission of the current buffer.
    pub fn start_submit(&mut self) -> Result<Dispatch, WorkspaceError> {
        match std::mem::replace(&mut self.state, WorkspaceState::Browsing) {
            WorkspaceState::Browsing => Err(WorkspaceError::NoChallengeSelected),
            WorkspaceState::Busy { session, call } => {
                self.state = WorkspaceState::Busy { session, call };
                Err(WorkspaceError::CallInFlight)
            }
            WorkspaceState::Viewing(mut session) => {
                if session.code_buffer.trim().is_empty() {
                    self.state = WorkspaceState::Viewing(session);
                    return Err(WorkspaceError::EmptyCode);
                }

                session.last_output = None;
                let dispatch = Dispatch::Submit {
                    epoch: self.epoch,
                    challenge_id: session.challenge.id,
                    code: session.code_buffer.clone(),
                };
                self.state = WorkspaceState::Busy {
                    session,
                    call: PendingCall::Submit,
                };
                Ok(dispatch)
            }
        }
    }

    /// Fold a settled gateway call back into the workspace. Returns the
    /// follow-up dispatch when one is required (the history refresh after
    /// a successful submission).
    ///
    /// Outcomes from a superseded epoch are dropped without touching the
    /// current state.
    pub fn apply(&mut self, outcome: Outcome) -> Option<Dispatch> {
        if outcome.epoch() != self.epoch {
            warn!(
                outcome_epoch = outcome.epoch(),
                current_epoch = self.epoch,
                "Discarding stale gateway outcome"
            );
            return None;
        }

        match outcome {
            Outcome::Run { output, .. } => {
                self.settle_call(PendingCall::Run, |session| {
                    session.last_output = Some(transcript::render_run(&output));
                    None
                })
            }
            Outcome::Submit { result, .. } => match result {
                Ok(graded) => {
                    let epoch = self.epoch;
                    self.settle_call(PendingCall::Submit, |session| {
                        session.last_output = Some(transcript::render_submission(&graded));
                        session.history_loading = true;
                        Some(Dispatch::FetchHistory {
                            epoch,
                            challenge_id: session.challenge.id,
                        })
                    })
                }
                Err(e) => {
                    warn!(error = %e, "Submission gateway call failed");
                    self.settle_call(PendingCall::Submit, |session| {
                        session.last_output = Some(transcript::SUBMIT_FAILED.to_string());
                        None
                    })
                }
            },
            Outcome::History { result, .. } => {
                let session = match &mut self.state {
                    WorkspaceState::Viewing(session) => session,
                    WorkspaceState::Busy { session, .. } => session,
                    WorkspaceState::Browsing => return None,
                };
                match result {
                    Ok(submissions) => {
                        debug!(count = submissions.len(), "Submission history refreshed");
                        session.submissions = submissions;
                    }
                    Err(e) => {
                        // Convenience view only: log and keep whatever was
                        // displayed before.
                        warn!(error = %e, "History fetch failed");
                    }
                }
                session.history_loading = false;
                None
            }
        }
    }

    /// Move Busy(expected) back to Viewing, letting `settle` update the
    /// session and produce an optional follow-up dispatch.
    fn settle_call<F>(&mut self, expected: PendingCall, settle: F) -> Option<Dispatch>
    where
        F: FnOnce(&mut Session) -> Option<Dispatch>,
    {
        match std::mem::replace(&mut self.state, WorkspaceState::Browsing) {
            WorkspaceState::Busy { mut session, call } if call == expected => {
                let follow_up = settle(&mut session);
                self.state = WorkspaceState::Viewing(session);
                follow_up
            }
            other => {
                // Same epoch but no matching in-flight call: nothing to
                // settle against.
                warn!("Dropping outcome with no matching in-flight call");
                self.state = other;
                None
            }
        }
    }
}

impl Default for Workspace {
    fn default() -> Self {
        Self::new()
    }
}
