mod newsletter;

pub use newsletter::{NewsletterService, OptOutError, SignUpError};
