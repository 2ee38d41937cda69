use crate::api::{ApiError, Backend};
use crate::cache::{QueryKey, Ticket};
use crate::models::{
    CurrentUser, DigestSchedule, Email, EmailListResponse, Model, SummaryStyle, ThreadsResponse,
};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;

/// A server round-trip that finished. Fetch results carry the key and ticket
/// they were started with.
#[derive(Debug)]
pub enum AppEvent {
    Emails {
        key: QueryKey,
        ticket: Ticket,
        result: Result<EmailListResponse, ApiError>,
    },
    EmailDetail {
        key: QueryKey,
        ticket: Ticket,
        result: Result<Email, ApiError>,
    },
    Threads {
        key: QueryKey,
        ticket: Ticket,
        result: Result<ThreadsResponse, ApiError>,
    },
    Models {
        ticket: Ticket,
        result: Result<Vec<Model>, ApiError>,
    },
    Styles {
        ticket: Ticket,
        result: Result<Vec<SummaryStyle>, ApiError>,
    },
    CurrentUser {
        ticket: Ticket,
        result: Result<CurrentUser, ApiError>,
    },
    Digest {
        ticket: Ticket,
        result: Result<DigestSchedule, ApiError>,
    },
    AuthUrl(Result<String, ApiError>),
    Mutation {
        mutation: Mutation,
        result: Result<(), ApiError>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mutation {
    Resummarize { email_id: String },
    UpdateLlm,
    UpdateDigest,
    Logout,
}

impl Mutation {
    pub fn success_message(&self) -> &'static str {
        match self {
            Mutation::Resummarize { .. } => "Summary regenerated",
            Mutation::UpdateLlm => "Model settings updated",
            Mutation::UpdateDigest => "Digest settings updated",
            Mutation::Logout => "Signed out",
        }
    }

    pub fn failure_message(&self) -> &'static str {
        match self {
            Mutation::Resummarize { .. } => "Could not regenerate the summary",
            Mutation::UpdateLlm => "Could not update model settings",
            Mutation::UpdateDigest => "Could not update digest settings",
            Mutation::Logout => "Could not sign out",
        }
    }
}

/// Runs backend calls off the UI task and reports back over the event channel.
#[derive(Clone)]
pub struct Dispatch {
    backend: Arc<dyn Backend>,
    tx: UnboundedSender<AppEvent>,
}

impl Dispatch {
    pub fn new(backend: Arc<dyn Backend>, tx: UnboundedSender<AppEvent>) -> Self {
        Self { backend, tx }
    }

    pub fn backend(&self) -> &Arc<dyn Backend> {
        &self.backend
    }

    pub fn spawn<F, Fut>(&self, job: F)
    where
        F: FnOnce(Arc<dyn Backend>) -> Fut,
        Fut: Future<Output = AppEvent> + Send + 'static,
    {
        let fut = job(self.backend.clone());
        let tx = self.tx.clone();
        tokio::spawn(async move {
            // The receiver only goes away on shutdown.
            let _ = tx.send(fut.await);
        });
    }

    pub fn mutate<F, Fut>(&self, mutation: Mutation, job: F)
    where
        F: FnOnce(Arc<dyn Backend>) -> Fut,
        Fut: Future<Output = Result<(), ApiError>> + Send + 'static,
    {
        self.spawn(move |api| {
            let fut = job(api);
            async move {
                AppEvent::Mutation {
                    mutation,
                    result: fut.await,
                }
            }
        });
    }
}
