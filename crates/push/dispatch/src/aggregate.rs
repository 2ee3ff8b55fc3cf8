//! Outcome aggregation.

use push_core::{DispatchError, DispatchReply, TaskOutcome};

/// Collect outcomes into a reply ordered by task creation position.
///
/// `expected` is the number of tasks the normalizer produced. Each index in
/// `0..expected` must appear exactly once; anything else is an engine bug.
pub fn aggregate(
    request_id: impl Into<String>,
    outcomes: impl IntoIterator<Item = TaskOutcome>,
    expected: usize,
) -> Result<DispatchReply, DispatchError> {
    let mut slots: Vec<Option<TaskOutcome>> = vec![None; expected];

    for outcome in outcomes {
        let index = outcome.index;
        let slot = slots
            .get_mut(index)
            .ok_or(DispatchError::UnknownTask { index })?;
        if slot.replace(outcome).is_some() {
            return Err(DispatchError::DuplicateOutcome { index });
        }
    }

    let missing: Vec<usize> = slots
        .iter()
        .enumerate()
        .filter_map(|(index, slot)| slot.is_none().then_some(index))
        .collect();
    if !missing.is_empty() {
        return Err(DispatchError::IncompleteDispatch { missing });
    }

    Ok(DispatchReply::new(
        request_id,
        slots.into_iter().flatten().collect(),
    ))
}
