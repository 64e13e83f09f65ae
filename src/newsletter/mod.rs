//! Newsletter signup form

mod form;
mod validate;

pub use form::{MessageKind, NewsletterForm, SubmitOutcome};
pub use validate::is_valid_email;
