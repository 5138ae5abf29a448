//! Runs calculations off the caller's thread.
//!
//! Each dispatched calculation gets its own worker thread, which performs the
//! single service call and posts a [`Finished`] message on a channel. The
//! caller drains the channel between events and hands each message to
//! [`Wizard::complete_calculation`](crate::machine::Wizard::complete_calculation).

use std::sync::Arc;
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use essence_client::{CalculationService, ClientError};
use essence_core::report::CalculationReport;
use tracing::debug;

use crate::machine::{Completion, PendingCalculation, Ticket, Wizard};

/// A calculation outcome tagged with the ticket it was started under.
#[derive(Debug)]
pub struct Finished {
    pub ticket: Ticket,
    pub result: Result<CalculationReport, ClientError>,
}

impl Finished {
    /// Hands the outcome to `wizard`.
    pub fn apply(self, wizard: &mut Wizard) -> Completion {
        wizard.complete_calculation(self.ticket, self.result)
    }
}

/// Sends pending calculations to a service on worker threads.
pub struct Dispatcher {
    service: Arc<dyn CalculationService>,
    tx: Sender<Finished>,
    rx: Receiver<Finished>,
}

impl Dispatcher {
    pub fn new(service: Arc<dyn CalculationService>) -> Self {
        let (tx, rx) = mpsc::channel();
        Self { service, tx, rx }
    }

    /// Starts `pending` on a new worker thread.
    pub fn dispatch(&self, pending: PendingCalculation) -> JoinHandle<()> {
        let service = Arc::clone(&self.service);
        let tx = self.tx.clone();
        debug!(generation = pending.ticket.generation(), "dispatching calculation");
        thread::spawn(move || {
            let result = service.calculate(&pending.request);
            // The receiver is gone only when the dispatcher was dropped.
            let _ = tx.send(Finished {
                ticket: pending.ticket,
                result,
            });
        })
    }

    /// Returns a finished calculation if one is waiting.
    pub fn try_next(&self) -> Option<Finished> {
        self.rx.try_recv().ok()
    }

    /// Blocks until a calculation finishes or `timeout` elapses.
    pub fn wait(&self, timeout: Duration) -> Option<Finished> {
        match self.rx.recv_timeout(timeout) {
            Ok(finished) => Some(finished),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::machine::Step;
    use essence_client::HealthStatus;
    use essence_core::enums::Route;
    use essence_core::forms::{ApplicationForm, OilDraft, SubjectForm};
    use essence_core::model::{CalculationRequest, Constituent};
    use std::sync::Mutex;

    /// Answers each call once the test releases it.
    struct GatedService {
        gate: Mutex<Receiver<Result<CalculationReport, ClientError>>>,
    }

    impl CalculationService for GatedService {
        fn calculate(&self, _request: &CalculationRequest) -> essence_client::Result<CalculationReport> {
            self.gate
                .lock()
                .unwrap()
                .recv()
                .unwrap_or(Err(ClientError::Transport("gate closed".into())))
        }

        fn health(&self) -> essence_client::Result<HealthStatus> {
            Ok(HealthStatus { status: "ok".into() })
        }

        fn reference_data(&self) -> essence_client::Result<serde_json::Value> {
            Ok(serde_json::Value::Null)
        }
    }

    fn gated() -> (Dispatcher, Sender<Result<CalculationReport, ClientError>>) {
        let (release, gate) = mpsc::channel();
        let service = GatedService {
            gate: Mutex::new(gate),
        };
        (Dispatcher::new(Arc::new(service)), release)
    }

    fn report() -> CalculationReport {
        serde_json::from_str(r#"{"dose_recommendation": {"final_dose_mg": 5.0}}"#).unwrap()
    }

    fn ready_wizard() -> Wizard {
        let mut w = Wizard::new();
        w.submit_subject(&SubjectForm {
            body_weight: Some(70.0),
            ..SubjectForm::default()
        })
        .unwrap();
        w.submit_single_oil(&OilDraft {
            name: "Lavender".into(),
            constituents: vec![Constituent::new("linalool", 0.4)],
            ..OilDraft::default()
        })
        .unwrap();
        w
    }

    fn oral() -> ApplicationForm {
        ApplicationForm {
            route: Route::Oral,
            daily_amount: Some(10.0),
            duration_days: Some(3),
            ..ApplicationForm::default()
        }
    }

    #[test]
    fn result_is_delivered_and_applied() {
        let (dispatcher, release) = gated();
        let mut wizard = ready_wizard();
        let worker = dispatcher.dispatch(wizard.submit_application(&oral()).unwrap());

        assert!(dispatcher.try_next().is_none());
        assert!(wizard.is_calculating());
        // Navigation stays available while the call is pending.
        wizard.go_to(Step::Subject).unwrap();

        release.send(Ok(report())).unwrap();
        worker.join().unwrap();
        let finished = dispatcher.wait(Duration::from_secs(5)).unwrap();
        assert_eq!(finished.apply(&mut wizard), Completion::Applied);
        assert!(wizard.has_results());
    }

    #[test]
    fn stale_result_after_reset_does_not_populate_new_session() {
        let (dispatcher, release) = gated();
        let mut wizard = ready_wizard();
        let worker = dispatcher.dispatch(wizard.submit_application(&oral()).unwrap());

        wizard.reset();
        release.send(Ok(report())).unwrap();
        worker.join().unwrap();

        let finished = dispatcher.wait(Duration::from_secs(5)).unwrap();
        assert_eq!(finished.apply(&mut wizard), Completion::Discarded);
        assert_eq!(wizard.step(), Step::Subject);
        assert!(wizard.session().report.is_none());
        assert!(!wizard.has_results());
    }

    #[test]
    fn wait_times_out_without_work() {
        let (dispatcher, _release) = gated();
        assert!(dispatcher.wait(Duration::from_millis(10)).is_none());
    }
}
