use classdeck_core::ContentCategory;
use thiserror::Error;

/// Failures surfaced to the user. `Display` is the message shown.
///
/// None of these escape the workflow: each is turned into a state
/// transition plus a notice where it occurs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WorkflowError {
    #[error("Not connected to server. Make sure the backend is running.")]
    TransportUnavailable,

    #[error("Connection to server lost. Send a request to reconnect.")]
    ConnectionLost,

    #[error("{}", empty_result_message(.category))]
    EmptyResult { category: Option<ContentCategory> },

    #[error("Received a malformed message: {0}")]
    MalformedPayload(String),

    #[error("Please select a content type before sending.")]
    ValidationError,

    #[error("Failed to insert slides: {0}")]
    InsertionFailure(String),

    #[error("No slides to insert.")]
    NothingToInsert,

    #[error("Failed to apply edit. Please try again.")]
    EditRejected,

    #[error("{0}")]
    Server(String),
}

fn empty_result_message(category: &Option<ContentCategory>) -> String {
    match category {
        Some(category) => {
            format!("No {category} content generated. Please try a different request.")
        }
        None => "No slides generated. Please try a different request.".to_string(),
    }
}
