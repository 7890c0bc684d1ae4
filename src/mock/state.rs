//! Mock job state

use research_protocol::{
    Annotation, ContentPart, IncompleteDetails, OutputItem, ResponseError, ResponseObject,
    ResponseStatus, Usage,
};

/// How a mock job ends
#[derive(Debug, Clone)]
pub enum Outcome {
    /// Completed with this report text and its citations
    Complete {
        text: String,
        annotations: Vec<Annotation>,
        usage: Usage,
    },
    /// Failed with an error object
    Fail { code: String, message: String },
    /// Cancelled upstream
    Cancel,
    /// Stopped early
    Incomplete { reason: String },
}

impl Outcome {
    fn status(&self) -> ResponseStatus {
        match self {
            Outcome::Complete { .. } => ResponseStatus::Completed,
            Outcome::Fail { .. } => ResponseStatus::Failed,
            Outcome::Cancel => ResponseStatus::Cancelled,
            Outcome::Incomplete { .. } => ResponseStatus::Incomplete,
        }
    }
}

/// A job held by the mock API
#[derive(Debug, Clone)]
pub struct MockJob {
    pub response: ResponseObject,
    pub outcome: Outcome,
    /// Retrievals since the last state change
    pub polls_since_step: u32,
    /// Held jobs never advance
    pub held: bool,
}

impl MockJob {
    pub fn new(response: ResponseObject, outcome: Outcome) -> Self {
        Self {
            response,
            outcome,
            polls_since_step: 0,
            held: false,
        }
    }

    pub fn status(&self) -> ResponseStatus {
        self.response.status
    }

    /// Move one step along queued → in_progress → outcome.
    pub fn advance(&mut self) {
        self.polls_since_step = 0;
        match self.response.status {
            ResponseStatus::Queued => self.response.status = ResponseStatus::InProgress,
            ResponseStatus::InProgress => self.finish(),
            _ => {}
        }
    }

    /// Jump straight to the outcome.
    pub fn finish(&mut self) {
        self.response.status = self.outcome.status();
        match &self.outcome {
            Outcome::Complete {
                text,
                annotations,
                usage,
            } => {
                self.response.output = vec![
                    OutputItem::Other,
                    OutputItem::Message {
                        content: vec![ContentPart::OutputText {
                            text: text.clone(),
                            annotations: annotations.clone(),
                        }],
                    },
                ];
                self.response.usage = Some(*usage);
            }
            Outcome::Fail { code, message } => {
                self.response.error = Some(ResponseError {
                    code: Some(code.clone()),
                    message: message.clone(),
                });
            }
            Outcome::Cancel => {}
            Outcome::Incomplete { reason } => {
                self.response.incomplete_details = Some(IncompleteDetails {
                    reason: reason.clone(),
                });
            }
        }
    }
}
