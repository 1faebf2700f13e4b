//! SMS gateway service implementation.

use std::sync::Arc;
use tonic::{Request, Response, Status};
use tracing::{debug, error, info, instrument, warn};

use super::messages::{SendSmsRequest, SendSmsResponse, SenderExistsRequest, SenderExistsResponse};
use super::proto::sms_gateway_server::SmsGateway;
use crate::ratelimit::{AdmissionControl, GateResult};
use crate::sms::SmsSender;

/// Status returned for a delivered message.
pub const SENT_STATUS: &str = "SMS sent successfully.";

/// Implementation of the `SmsGateway` gRPC interface.
///
/// Every send passes through the admission gate before it reaches the
/// delivery backend.
pub struct SmsGatewayService<A: AdmissionControl, S: SmsSender> {
    /// The admission gate
    gate: Arc<A>,
    /// The delivery backend
    sender: Arc<S>,
}

impl<A: AdmissionControl, S: SmsSender> SmsGatewayService<A, S> {
    /// Create a new service over the given gate and delivery backend.
    pub fn new(gate: Arc<A>, sender: Arc<S>) -> Self {
        Self { gate, sender }
    }
}

/// Map a rejected admission to the status reported to the client.
fn rejection_status(result: GateResult, phone_number: &str) -> Option<Status> {
    match result {
        GateResult::Admitted => None,
        GateResult::GlobalLimitExceeded => {
            Some(Status::resource_exhausted("Too many global requests."))
        }
        GateResult::IdentityLimitExceeded(capacity) => Some(Status::resource_exhausted(format!(
            "Sender {} exceeded limit ({} requests per second).",
            phone_number, capacity
        ))),
    }
}

#[tonic::async_trait]
impl<A, S> SmsGateway for SmsGatewayService<A, S>
where
    A: AdmissionControl + 'static,
    S: SmsSender + 'static,
{
    /// Admit and deliver a single SMS.
    #[instrument(
        skip(self, request),
        fields(phone_number = %request.get_ref().phone_number)
    )]
    async fn send(
        &self,
        request: Request<SendSmsRequest>,
    ) -> Result<Response<SendSmsResponse>, Status> {
        let req = request.into_inner();

        if req.phone_number.is_empty() || req.message.is_empty() {
            warn!("Received send request without phone number or message");
            return Err(Status::invalid_argument(
                "Phone number and message are required.",
            ));
        }

        let decision = self.gate.admit(&req.phone_number);
        debug!(decision = ?decision, "Admission decision made");

        if let Some(status) = rejection_status(decision, &req.phone_number) {
            info!(decision = ?decision, "Send rejected");
            return Err(status);
        }

        if let Err(e) = self.sender.send(&req.phone_number, &req.message).await {
            error!(error = %e, "SMS delivery failed");
            return Err(Status::internal("Failed to send SMS."));
        }

        info!("SMS sent");
        Ok(Response::new(SendSmsResponse {
            status: SENT_STATUS.to_string(),
        }))
    }

    /// Report whether limiter state exists for a sender.
    async fn sender_exists(
        &self,
        request: Request<SenderExistsRequest>,
    ) -> Result<Response<SenderExistsResponse>, Status> {
        let req = request.into_inner();

        if req.phone_number.is_empty() {
            return Err(Status::invalid_argument("Phone number is required."));
        }

        Ok(Response::new(SenderExistsResponse {
            exists: self.gate.identity_exists(&req.phone_number),
        }))
    }
}
