use crate::{error::SvReconError, utils::util::Result};
use std::{any::Any, thread};

pub(super) fn panic_payload_message(panic_payload: &(dyn Any + Send + 'static)) -> String {
    if let Some(message) = panic_payload.downcast_ref::<&str>() {
        return (*message).to_owned();
    }
    if let Some(message) = panic_payload.downcast_ref::<String>() {
        return message.clone();
    }
    "unknown panic payload".to_owned()
}

pub(super) fn join_thread_result<T>(
    thread_name: &str,
    handle: thread::JoinHandle<Result<T>>,
) -> Result<T> {
    match handle.join() {
        Ok(result) => {
            result.map_err(|e| crate::svrecon_error!("{thread_name} thread failed: {e}"))
        }
        Err(panic_payload) => Err(crate::svrecon_error!(
            "{thread_name} thread panicked: {}",
            panic_payload_message(panic_payload.as_ref())
        )),
    }
}

pub(super) fn aggregate_shutdown_errors(errors: Vec<SvReconError>) -> Result<()> {
    let mut errors = errors.into_iter();
    let Some(first) = errors.next() else {
        return Ok(());
    };
    let rest: Vec<SvReconError> = errors.collect();
    if rest.is_empty() {
        return Err(first);
    }
    let summary = std::iter::once(first)
        .chain(rest)
        .enumerate()
        .map(|(index, error)| format!("{}. {}", index + 1, error))
        .collect::<Vec<_>>()
        .join("; ");
    Err(crate::svrecon_error!("Multiple run shutdown errors: {summary}"))
}
