//! Request normalization into delivery tasks.

use std::sync::Arc;

use push_core::{DeliveryTask, DispatchConfig, Message, Platform, PushRequest, ValidationError};

/// Validate a request and split its recipients into ordered batches.
///
/// Concatenating the tokens of the returned tasks reproduces the request's
/// token order exactly. Pure function of the request and config.
pub fn normalize(
    req: &PushRequest,
    config: &DispatchConfig,
) -> Result<Vec<DeliveryTask>, ValidationError> {
    let platform: Platform = req.platform.parse()?;

    if req.tokens.is_empty() {
        return Err(ValidationError::EmptyRecipients);
    }
    if let Some(index) = req.tokens.iter().position(|t| t.trim().is_empty()) {
        return Err(ValidationError::InvalidToken { index });
    }

    let batch_size = config.batch_size_for(platform).max(1);
    let message = Arc::new(Message {
        payload: req.payload.clone(),
        overrides: req.overrides.clone().unwrap_or_default(),
    });

    Ok(req
        .tokens
        .chunks(batch_size)
        .enumerate()
        .map(|(index, batch)| {
            DeliveryTask::new(index, platform, batch.to_vec(), Arc::clone(&message))
        })
        .collect())
}
