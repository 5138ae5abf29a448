//! Step-by-step collection of an exposure profile.
//!
//! The [`Wizard`](machine::Wizard) owns the session: subject, product and
//! application snapshots, the last report and the last error. It hands out
//! [`PendingCalculation`](machine::PendingCalculation)s tagged with the session
//! generation, so a response that arrives after a reset is recognised and
//! dropped. The [`Dispatcher`](dispatch::Dispatcher) runs those calculations
//! off the caller's thread.

pub mod dispatch;
pub mod machine;

pub use dispatch::{Dispatcher, Finished};
pub use machine::{Completion, Mode, PendingCalculation, Session, Step, Ticket, Wizard, WizardError};
