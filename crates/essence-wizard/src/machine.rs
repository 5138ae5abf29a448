//! The four-step session state machine.

use std::fmt;

use chrono::{DateTime, Utc};
use essence_client::ClientError;
use essence_core::forms::{ApplicationForm, FormulaEntryDraft, OilDraft, SubjectForm};
use essence_core::model::{Application, CalculationRequest, EssentialOil, Formula, Individual};
use essence_core::report::CalculationReport;
use essence_core::validation::{FieldErrors, validate_formula_complete};
use essence_formula::engine;
use tracing::{debug, info, warn};

// ---------------------------------------------------------------------------
// Steps and modes
// ---------------------------------------------------------------------------

/// A wizard step, numbered 1 to 4.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    Subject = 1,
    OilOrFormula = 2,
    ApplicationParams = 3,
    Results = 4,
}

impl Step {
    pub const ALL: [Step; 4] = [
        Step::Subject,
        Step::OilOrFormula,
        Step::ApplicationParams,
        Step::Results,
    ];

    pub fn number(self) -> u8 {
        self as u8
    }

    pub fn from_number(n: u8) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.number() == n)
    }

    pub fn label(self) -> &'static str {
        match self {
            Step::Subject => "Subject",
            Step::OilOrFormula => "Oil or formula",
            Step::ApplicationParams => "Application",
            Step::Results => "Results",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.number(), self.label())
    }
}

/// Whether step 2 collects one oil or a blend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Mode {
    #[default]
    SingleOil,
    MultiOil,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::SingleOil => "single-oil",
            Mode::MultiOil => "multi-oil",
        })
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Why a wizard action was refused. The session is unchanged in every case.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WizardError {
    #[error("{0}")]
    Validation(FieldErrors),

    #[error("not available at step {current}; expected step {expected}")]
    WrongStep { expected: Step, current: Step },

    #[error("only available in {0} mode")]
    WrongMode(Mode),

    #[error("a calculation is already in progress")]
    CalculationInFlight,

    #[error("step {0} cannot be selected yet")]
    StepLocked(Step),

    #[error("session is incomplete: missing {0}")]
    IncompleteSession(&'static str),

    #[error("no formula entry at index {0}")]
    NoSuchEntry(usize),
}

impl From<FieldErrors> for WizardError {
    fn from(errors: FieldErrors) -> Self {
        Self::Validation(errors)
    }
}

impl WizardError {
    /// Field errors, when the refusal came from validation.
    pub fn field_errors(&self) -> Option<&FieldErrors> {
        match self {
            Self::Validation(errors) => Some(errors),
            _ => None,
        }
    }
}

/// Result alias for wizard actions.
pub type Result<T> = std::result::Result<T, WizardError>;

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Everything collected during one calculation session.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Session {
    pub individual: Option<Individual>,
    /// Single-oil mode product.
    pub essential_oil: Option<EssentialOil>,
    /// Multi-oil mode product, built up entry by entry.
    pub formula: Formula,
    pub application: Option<Application>,
    pub report: Option<CalculationReport>,
    /// Last service or transport failure, as shown to the user.
    pub error: Option<String>,
    pub completed_at: Option<DateTime<Utc>>,
}

/// Identifies the session generation a calculation was started in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    generation: u64,
}

impl Ticket {
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// A calculation the caller must run and report back through
/// [`Wizard::complete_calculation`].
#[derive(Debug, Clone, PartialEq)]
pub struct PendingCalculation {
    pub ticket: Ticket,
    pub request: CalculationRequest,
}

/// Outcome of handing a calculation result back to the wizard.
#[derive(Debug, Clone, PartialEq)]
pub enum Completion {
    /// The report was stored.
    Applied,
    /// The call failed; the message is now the session error.
    Failed(String),
    /// The result belonged to an earlier session or was already handled.
    Discarded,
}

// ---------------------------------------------------------------------------
// Wizard
// ---------------------------------------------------------------------------

/// Owner of the session and of the step/mode state.
#[derive(Debug, Clone)]
pub struct Wizard {
    step: Step,
    mode: Mode,
    session: Session,
    generation: u64,
    calculating: bool,
    has_results: bool,
}

impl Default for Wizard {
    fn default() -> Self {
        Self {
            step: Step::Subject,
            mode: Mode::default(),
            session: Session::default(),
            generation: 0,
            calculating: false,
            has_results: false,
        }
    }
}

impl Wizard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn step(&self) -> Step {
        self.step
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn is_calculating(&self) -> bool {
        self.calculating
    }

    pub fn has_results(&self) -> bool {
        self.has_results
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    fn require_step(&self, expected: Step) -> Result<()> {
        if self.step() == expected {
            Ok(())
        } else {
            Err(WizardError::WrongStep {
                expected,
                current: self.step(),
            })
        }
    }

    fn require_mode(&self, expected: Mode) -> Result<()> {
        if self.mode == expected {
            Ok(())
        } else {
            Err(WizardError::WrongMode(expected))
        }
    }

    fn advance(&mut self, to: Step) {
        debug!(from = %self.step(), to = %to, "wizard step");
        self.step = to;
    }

    // -- step 1 --------------------------------------------------------------

    /// Validates the subject and moves to step 2.
    pub fn submit_subject(&mut self, form: &SubjectForm) -> Result<()> {
        self.require_step(Step::Subject)?;
        self.session.individual = Some(form.to_individual()?);
        self.advance(Step::OilOrFormula);
        Ok(())
    }

    // -- step 2 --------------------------------------------------------------

    /// Switches between single-oil and multi-oil entry.
    ///
    /// Only the product of the mode being left is discarded, together with
    /// any report computed for it; a calculation still in flight for that
    /// product will be discarded when it completes. Selecting the current
    /// mode changes nothing.
    pub fn set_mode(&mut self, mode: Mode) -> Result<()> {
        self.require_step(Step::OilOrFormula)?;
        if mode == self.mode {
            return Ok(());
        }
        match mode {
            Mode::SingleOil => self.session.formula = Formula::default(),
            Mode::MultiOil => self.session.essential_oil = None,
        }
        self.session.report = None;
        self.session.completed_at = None;
        if self.calculating {
            self.generation += 1;
            self.calculating = false;
        }
        debug!(%mode, generation = self.generation, "wizard mode");
        self.mode = mode;
        Ok(())
    }

    /// Adds an oil to the formula under construction.
    pub fn add_formula_oil(&mut self, draft: &FormulaEntryDraft) -> Result<()> {
        self.require_step(Step::OilOrFormula)?;
        self.require_mode(Mode::MultiOil)?;
        self.session.formula = engine::add_oil(&self.session.formula, draft)?;
        Ok(())
    }

    /// Removes the formula entry at `index`.
    pub fn remove_formula_oil(&mut self, index: usize) -> Result<()> {
        self.require_step(Step::OilOrFormula)?;
        self.require_mode(Mode::MultiOil)?;
        self.session.formula = engine::remove_oil(&self.session.formula, index)
            .ok_or(WizardError::NoSuchEntry(index))?;
        Ok(())
    }

    /// Validates a single oil and moves to step 3.
    pub fn submit_single_oil(&mut self, draft: &OilDraft) -> Result<()> {
        self.require_step(Step::OilOrFormula)?;
        self.require_mode(Mode::SingleOil)?;
        self.session.essential_oil = Some(draft.to_single_oil()?);
        self.advance(Step::ApplicationParams);
        Ok(())
    }

    /// Checks that the formula totals 100% and moves to step 3.
    pub fn submit_formula(&mut self) -> Result<()> {
        self.require_step(Step::OilOrFormula)?;
        self.require_mode(Mode::MultiOil)?;
        validate_formula_complete(&self.session.formula).into_result()?;
        self.session.formula = engine::with_merged_constituents(&self.session.formula);
        self.advance(Step::ApplicationParams);
        Ok(())
    }

    // -- step 3 --------------------------------------------------------------

    /// Validates the application and starts a calculation.
    ///
    /// The returned request must be sent by the caller and its outcome handed
    /// back through [`Wizard::complete_calculation`]. Until then, further
    /// submissions are refused.
    pub fn submit_application(&mut self, form: &ApplicationForm) -> Result<PendingCalculation> {
        if self.calculating {
            return Err(WizardError::CalculationInFlight);
        }
        self.require_step(Step::ApplicationParams)?;
        let application = form.to_application()?;
        let request = self.build_request(application.clone())?;

        self.session.application = Some(application);
        self.session.error = None;
        self.calculating = true;
        info!(generation = self.generation, "calculation started");
        Ok(PendingCalculation {
            ticket: Ticket {
                generation: self.generation,
            },
            request,
        })
    }

    fn build_request(&self, application: Application) -> Result<CalculationRequest> {
        let individual = self
            .session
            .individual
            .clone()
            .ok_or(WizardError::IncompleteSession("subject"))?;
        match self.mode {
            Mode::SingleOil => {
                let oil = self
                    .session
                    .essential_oil
                    .clone()
                    .ok_or(WizardError::IncompleteSession("essential oil"))?;
                Ok(CalculationRequest::for_oil(individual, oil, application))
            }
            Mode::MultiOil => {
                if self.session.formula.is_empty() {
                    return Err(WizardError::IncompleteSession("formula"));
                }
                // Step 2 may have been edited and skipped through navigation.
                validate_formula_complete(&self.session.formula).into_result()?;
                Ok(CalculationRequest::for_formula(
                    individual,
                    engine::with_merged_constituents(&self.session.formula),
                    application,
                ))
            }
        }
    }

    /// Hands back the outcome of a calculation.
    ///
    /// Results from an earlier generation are dropped without touching the
    /// session. A report moves the wizard to step 4 if it is still waiting at
    /// step 3; a failure leaves the collected data in place for a retry.
    pub fn complete_calculation(
        &mut self,
        ticket: Ticket,
        result: std::result::Result<CalculationReport, ClientError>,
    ) -> Completion {
        if ticket.generation != self.generation || !self.calculating {
            warn!(
                ticket = ticket.generation,
                current = self.generation,
                "discarding stale calculation result"
            );
            return Completion::Discarded;
        }
        self.calculating = false;

        match result {
            Ok(report) => {
                info!(generation = self.generation, "calculation succeeded");
                self.session.report = Some(report);
                self.session.error = None;
                self.session.completed_at = Some(Utc::now());
                self.has_results = true;
                if self.step() == Step::ApplicationParams {
                    self.advance(Step::Results);
                }
                Completion::Applied
            }
            Err(err) => {
                warn!(error = %err, "calculation failed");
                let message = err.user_message();
                self.session.error = Some(message.clone());
                Completion::Failed(message)
            }
        }
    }

    // -- navigation ----------------------------------------------------------

    /// Jumps directly to `step`.
    ///
    /// Earlier steps are always reachable and keep their data. Later steps
    /// are reachable only once a calculation has succeeded in this session,
    /// and the results step only while a report is held.
    pub fn go_to(&mut self, step: Step) -> Result<()> {
        if step > self.step() {
            if !self.has_results {
                return Err(WizardError::StepLocked(step));
            }
            if step == Step::Results && self.session.report.is_none() {
                return Err(WizardError::StepLocked(step));
            }
        }
        self.advance(step);
        Ok(())
    }

    /// Discards the whole session and returns to step 1.
    ///
    /// A calculation still in flight will be discarded when it completes.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.session = Session::default();
        self.step = Step::Subject;
        self.mode = Mode::default();
        self.calculating = false;
        self.has_results = false;
        info!(generation = self.generation, "session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use essence_core::enums::Route;
    use essence_core::model::Constituent;
    use essence_core::validation::fields;
    use pretty_assertions::assert_eq;

    fn subject() -> SubjectForm {
        SubjectForm {
            body_weight: Some(65.0),
            ..SubjectForm::default()
        }
    }

    fn oil(name: &str, fractions: &[(&str, f64)]) -> OilDraft {
        OilDraft {
            name: name.into(),
            constituents: fractions.iter().map(|(n, f)| Constituent::new(*n, *f)).collect(),
            ..OilDraft::default()
        }
    }

    fn oral() -> ApplicationForm {
        ApplicationForm {
            route: Route::Oral,
            daily_amount: Some(20.0),
            duration_days: Some(7),
            ..ApplicationForm::default()
        }
    }

    fn report() -> CalculationReport {
        serde_json::from_str(r#"{"dose_recommendation": {"final_dose_mg": 5.0}}"#).unwrap()
    }

    fn at_application() -> Wizard {
        let mut w = Wizard::new();
        w.submit_subject(&subject()).unwrap();
        w.submit_single_oil(&oil("Lavender", &[("linalool", 0.4)])).unwrap();
        w
    }

    fn finished() -> Wizard {
        let mut w = at_application();
        let pending = w.submit_application(&oral()).unwrap();
        assert_eq!(w.complete_calculation(pending.ticket, Ok(report())), Completion::Applied);
        w
    }

    #[test]
    fn single_oil_happy_path() {
        let mut w = at_application();
        assert_eq!(w.step(), Step::ApplicationParams);
        let pending = w.submit_application(&oral()).unwrap();
        assert!(w.is_calculating());
        assert!(pending.request.essential_oil.is_some());
        assert!(pending.request.formula.is_none());

        assert_eq!(w.complete_calculation(pending.ticket, Ok(report())), Completion::Applied);
        assert_eq!(w.step(), Step::Results);
        assert!(w.has_results());
        assert!(!w.is_calculating());
        assert!(w.session().completed_at.is_some());
    }

    #[test]
    fn invalid_subject_blocks_transition() {
        let mut w = Wizard::new();
        let err = w.submit_subject(&SubjectForm::default()).unwrap_err();
        assert!(err.field_errors().unwrap().contains(fields::BODY_WEIGHT));
        assert_eq!(w.step(), Step::Subject);
        assert!(w.session().individual.is_none());
    }

    #[test]
    fn multi_oil_flow_builds_formula_request() {
        let mut w = Wizard::new();
        w.submit_subject(&subject()).unwrap();
        w.set_mode(Mode::MultiOil).unwrap();
        w.add_formula_oil(&FormulaEntryDraft::new(oil("Lavender", &[("linalool", 1.0)]), 70.0))
            .unwrap();
        let err = w.submit_formula().unwrap_err();
        assert!(err.field_errors().unwrap().contains(fields::TOTAL_PERCENTAGE));

        w.add_formula_oil(&FormulaEntryDraft::new(oil("Tea tree", &[("terpinen-4-ol", 1.0)]), 30.0))
            .unwrap();
        w.submit_formula().unwrap();
        assert_eq!(w.session().formula.merged_constituents.len(), 2);

        let pending = w.submit_application(&oral()).unwrap();
        assert!(pending.request.essential_oil.is_none());
        assert_eq!(pending.request.formula.as_ref().unwrap().len(), 2);
    }

    #[test]
    fn formula_entry_with_bad_fractions_is_rejected() {
        let mut w = Wizard::new();
        w.submit_subject(&subject()).unwrap();
        w.set_mode(Mode::MultiOil).unwrap();
        let draft = FormulaEntryDraft::new(oil("A", &[("x", 0.6), ("y", 0.3), ("z", 0.2)]), 50.0);
        let err = w.add_formula_oil(&draft).unwrap_err();
        assert!(err.field_errors().unwrap().contains(fields::FRACTION_TOTAL));
        assert!(w.session().formula.is_empty());
    }

    #[test]
    fn mode_switch_discards_only_other_product() {
        let mut w = finished();
        w.go_to(Step::OilOrFormula).unwrap();
        w.set_mode(Mode::MultiOil).unwrap();
        w.add_formula_oil(&FormulaEntryDraft::new(oil("A", &[("x", 1.0)]), 100.0)).unwrap();
        assert!(w.session().essential_oil.is_none());

        w.set_mode(Mode::SingleOil).unwrap();
        assert!(w.session().formula.is_empty());
        assert!(w.session().individual.is_some());
        assert!(w.session().application.is_some());

        w.set_mode(Mode::MultiOil).unwrap();
        assert!(w.session().formula.is_empty());
    }

    #[test]
    fn skipping_formula_submit_cannot_send_incomplete_formula() {
        let mut w = finished();
        w.go_to(Step::OilOrFormula).unwrap();
        w.set_mode(Mode::MultiOil).unwrap();
        w.add_formula_oil(&FormulaEntryDraft::new(oil("Lavender", &[("linalool", 1.0)]), 50.0))
            .unwrap();
        w.go_to(Step::ApplicationParams).unwrap();

        let err = w.submit_application(&oral()).unwrap_err();
        assert!(err.field_errors().unwrap().contains(fields::TOTAL_PERCENTAGE));
        assert!(!w.is_calculating());

        w.go_to(Step::OilOrFormula).unwrap();
        w.add_formula_oil(&FormulaEntryDraft::new(oil("Clove", &[("eugenol", 1.0)]), 50.0))
            .unwrap();
        w.go_to(Step::ApplicationParams).unwrap();
        let pending = w.submit_application(&oral()).unwrap();
        let formula = pending.request.formula.as_ref().unwrap();
        assert_eq!(formula.total_percentage, 100.0);
        assert_eq!(formula.merged_constituents.len(), 2);
    }

    #[test]
    fn mode_switch_drops_report_for_discarded_product() {
        let mut w = finished();
        w.go_to(Step::OilOrFormula).unwrap();
        w.set_mode(Mode::MultiOil).unwrap();
        assert!(w.session().report.is_none());
        assert!(w.session().completed_at.is_none());
        assert_eq!(w.go_to(Step::Results), Err(WizardError::StepLocked(Step::Results)));
    }

    #[test]
    fn in_flight_result_is_discarded_after_mode_switch() {
        let mut w = at_application();
        let pending = w.submit_application(&oral()).unwrap();
        w.go_to(Step::OilOrFormula).unwrap();
        w.set_mode(Mode::MultiOil).unwrap();
        assert!(!w.is_calculating());

        assert_eq!(w.complete_calculation(pending.ticket, Ok(report())), Completion::Discarded);
        assert!(w.session().report.is_none());
        assert!(!w.has_results());
        assert_eq!(w.step(), Step::OilOrFormula);
    }

    #[test]
    fn mode_change_is_only_allowed_on_step_two() {
        let mut w = Wizard::new();
        assert_eq!(
            w.set_mode(Mode::MultiOil),
            Err(WizardError::WrongStep {
                expected: Step::OilOrFormula,
                current: Step::Subject
            })
        );
    }

    #[test]
    fn resubmission_is_gated_while_calculating() {
        let mut w = at_application();
        let _pending = w.submit_application(&oral()).unwrap();
        assert_eq!(w.submit_application(&oral()), Err(WizardError::CalculationInFlight));
    }

    #[test]
    fn failure_keeps_payload_and_allows_retry() {
        let mut w = at_application();
        let pending = w.submit_application(&oral()).unwrap();
        let outcome = w.complete_calculation(
            pending.ticket,
            Err(ClientError::Service {
                status: 400,
                detail: Some("Body weight out of range".into()),
            }),
        );
        assert_eq!(outcome, Completion::Failed("Body weight out of range".into()));
        assert_eq!(w.step(), Step::ApplicationParams);
        assert_eq!(w.session().error.as_deref(), Some("Body weight out of range"));
        assert!(w.session().essential_oil.is_some());

        let retry = w.submit_application(&oral()).unwrap();
        assert!(w.session().error.is_none());
        assert_eq!(w.complete_calculation(retry.ticket, Ok(report())), Completion::Applied);
        assert_eq!(w.step(), Step::Results);
    }

    #[test]
    fn stale_response_after_reset_is_discarded() {
        let mut w = at_application();
        let pending = w.submit_application(&oral()).unwrap();
        w.reset();
        assert_eq!(w.generation(), 1);
        assert_eq!(w.complete_calculation(pending.ticket, Ok(report())), Completion::Discarded);
        assert_eq!(w.step(), Step::Subject);
        assert!(w.session().report.is_none());
        assert!(!w.has_results());

        // The new session can calculate on its own.
        w.submit_subject(&subject()).unwrap();
        w.submit_single_oil(&oil("Lavender", &[("linalool", 0.4)])).unwrap();
        assert!(w.submit_application(&oral()).is_ok());
    }

    #[test]
    fn duplicate_completion_is_discarded() {
        let mut w = at_application();
        let pending = w.submit_application(&oral()).unwrap();
        assert_eq!(w.complete_calculation(pending.ticket, Ok(report())), Completion::Applied);
        assert_eq!(w.complete_calculation(pending.ticket, Ok(report())), Completion::Discarded);
    }

    #[test]
    fn completion_while_navigated_back_keeps_step() {
        let mut w = at_application();
        let pending = w.submit_application(&oral()).unwrap();
        w.go_to(Step::Subject).unwrap();
        assert_eq!(w.complete_calculation(pending.ticket, Ok(report())), Completion::Applied);
        assert_eq!(w.step(), Step::Subject);
        assert!(w.has_results());
        w.go_to(Step::Results).unwrap();
    }

    #[test]
    fn forward_navigation_requires_results() {
        let mut w = at_application();
        w.go_to(Step::Subject).unwrap();
        assert_eq!(w.session().individual.as_ref().unwrap().body_weight, 65.0);
        assert_eq!(w.go_to(Step::OilOrFormula), Err(WizardError::StepLocked(Step::OilOrFormula)));

        let mut w = finished();
        w.go_to(Step::Subject).unwrap();
        w.go_to(Step::ApplicationParams).unwrap();
        w.go_to(Step::Results).unwrap();
    }

    #[test]
    fn reset_discards_everything() {
        let mut w = finished();
        w.reset();
        assert_eq!(w.step(), Step::Subject);
        assert_eq!(w.mode(), Mode::SingleOil);
        assert_eq!(w.session(), &Session::default());
        assert!(!w.has_results());
        assert_eq!(w.go_to(Step::Results), Err(WizardError::StepLocked(Step::Results)));
    }

    #[test]
    fn wrong_mode_is_refused() {
        let mut w = Wizard::new();
        w.submit_subject(&subject()).unwrap();
        assert_eq!(w.submit_formula(), Err(WizardError::WrongMode(Mode::MultiOil)));
        assert_eq!(w.remove_formula_oil(0), Err(WizardError::WrongMode(Mode::MultiOil)));
        w.set_mode(Mode::MultiOil).unwrap();
        assert_eq!(w.remove_formula_oil(0), Err(WizardError::NoSuchEntry(0)));
    }

    #[test]
    fn step_numbers() {
        assert_eq!(Step::from_number(3), Some(Step::ApplicationParams));
        assert_eq!(Step::from_number(5), None);
        assert_eq!(Step::Results.to_string(), "4 (Results)");
    }
}
