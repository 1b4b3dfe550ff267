//! Request orchestration: prompt → gateway → extraction → assembly.

use scrivener_core::{ConversationTurn, EditRequest, Operation, TypedResult};
use thiserror::Error;
use tracing::{Instrument, error, info, info_span};

use crate::assemble::{RequestMeta, assemble};
use crate::extract::extract;
use crate::gateway::{GatewayClient, GatewayError};
use crate::prompts;

/// The one failure a caller sees: the model could not be reached or answered
/// with an unusable envelope. Problems with the reply's content never surface
/// here; they degrade inside the result instead.
#[derive(Error, Debug)]
#[error("text {operation} failed")]
pub struct ServiceError {
    pub operation: Operation,
    #[source]
    pub source: GatewayError,
}

/// Runs the four editing operations against one gateway.
#[derive(Clone)]
pub struct EditingService {
    gateway: GatewayClient,
}

impl EditingService {
    pub fn new(gateway: GatewayClient) -> Self {
        Self { gateway }
    }

    /// Run one request end to end on behalf of `user_id`.
    ///
    /// Every event emitted along the way, gateway retries included, carries
    /// the caller and the operation through the enclosing span.
    pub async fn edit(
        &self,
        request: &EditRequest,
        user_id: &str,
    ) -> Result<TypedResult, ServiceError> {
        let operation = request.operation();
        let span = info_span!("edit", user_id, %operation);
        self.run(request, user_id).instrument(span).await
    }

    async fn run(
        &self,
        request: &EditRequest,
        user_id: &str,
    ) -> Result<TypedResult, ServiceError> {
        let operation = request.operation();
        info!("processing text {operation} request");

        let no_history: &[ConversationTurn] = &[];
        let (prompt, history, meta) = match request {
            EditRequest::Check(req) => (
                prompts::check_prompt(&req.text, &prompts::check_types(req), req.strict_mode),
                no_history,
                RequestMeta {
                    user_id,
                    ..RequestMeta::default()
                },
            ),
            EditRequest::Polish(req) => (
                prompts::polish_prompt(
                    &req.text,
                    req.focus_on.as_deref(),
                    req.target_audience.as_deref(),
                ),
                no_history,
                RequestMeta {
                    user_id,
                    ..RequestMeta::default()
                },
            ),
            EditRequest::Translate(req) => (
                prompts::translate_prompt(
                    &req.text,
                    &req.language,
                    &req.target_language,
                    req.preserve_terminology,
                ),
                no_history,
                RequestMeta {
                    source_language: &req.language,
                    target_language: &req.target_language,
                    user_id,
                    history_len: 0,
                },
            ),
            EditRequest::Rewrite(req) => (
                prompts::rewrite_prompt(&req.text, &req.instruction, true),
                req.conversation_history.as_slice(),
                RequestMeta {
                    user_id,
                    history_len: req.conversation_history.len(),
                    ..RequestMeta::default()
                },
            ),
        };

        let reply = self
            .gateway
            .call(&prompt, history)
            .await
            .map_err(|source| {
                error!(error = %source, "text operation failed");
                ServiceError { operation, source }
            })?;

        let result = assemble(operation, &extract(&reply), request.text(), &meta);
        info!(
            segments = result.diffs().len(),
            final_length = result.final_text().chars().count(),
            "text {operation} completed"
        );
        Ok(result)
    }
}
