//! Record types shared by the tracker, the record store and the REST layer.
//!
//! Everything here serializes as camelCase JSON, which is what the browser
//! form wizard and the admin dashboard speak.

mod attribution;
mod form_session;
mod lead;
mod visitor;

pub use attribution::Attribution;
pub use form_session::{
    FormSession, SessionStatus, StepEvent, StepEventInput, MAX_STEP_SECONDS,
};
pub use lead::{Lead, LeadInput};
pub use visitor::{PageView, PageViewInput, VisitorSession};
