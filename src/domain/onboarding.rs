//! The sign-up wizard: household size, frequency, plan, schedule, checkout.
//!
//! Each variant of [`Onboarding`] is one visible step. Answers accumulate in a
//! [`CheckoutDraft`] that travels with the step; only the checkout step
//! validates, and only a validated [`CheckoutRequest`] reaches billing.

use crate::billing::{Billing, CheckoutCustomer, CheckoutSession};
use crate::domain::{
    BagCount, FieldErrors, Frequency, PhoneNumber, PickupDay, PickupSchedule, PickupWindow,
    Plan, PlanType, ScheduleError, ZipCode,
};
use serde::{Deserialize, Deserializer, Serialize};

const DEFAULT_STATE: &str = "AZ";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    HouseholdSize,
    Frequency,
    Plan,
    Schedule,
    Checkout,
}

impl Step {
    pub const ALL: [Step; 5] = [
        Step::HouseholdSize,
        Step::Frequency,
        Step::Plan,
        Step::Schedule,
        Step::Checkout,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Step::HouseholdSize => "Household",
            Step::Frequency => "Frequency",
            Step::Plan => "Plan",
            Step::Schedule => "Schedule",
            Step::Checkout => "Checkout",
        }
    }

    fn index(&self) -> usize {
        Step::ALL.iter().position(|s| s == self).unwrap_or(0)
    }

    fn next(&self) -> Step {
        Step::ALL[(self.index() + 1).min(Step::ALL.len() - 1)]
    }

    fn previous(&self) -> Step {
        Step::ALL[self.index().saturating_sub(1)]
    }
}

/// Everything the customer has chosen so far. Also the body of the
/// checkout-session request, so the server revalidates the same shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutDraft {
    pub plan_type: PlanType,
    pub frequency: Frequency,
    /// `None` means the catalog allowance for the plan type.
    #[serde(default)]
    pub bag_count: Option<i64>,
    pub pickup_day1: PickupDay,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub pickup_day2: Option<PickupDay>,
    pub pickup_window_start: String,
    pub pickup_window_end: String,
    #[serde(default)]
    pub address_street: String,
    #[serde(default)]
    pub address_city: String,
    #[serde(default)]
    pub address_state: String,
    #[serde(default)]
    pub address_zip: String,
    #[serde(default)]
    pub phone: String,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<PickupDay>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(day) => PickupDay::try_from(day)
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}

impl Default for CheckoutDraft {
    fn default() -> Self {
        let window = PickupWindow::default();
        CheckoutDraft {
            plan_type: PlanType::Medium,
            frequency: Frequency::Weekly,
            bag_count: None,
            pickup_day1: PickupDay::Monday,
            pickup_day2: None,
            pickup_window_start: window.start(),
            pickup_window_end: window.end(),
            address_street: String::new(),
            address_city: String::new(),
            address_state: DEFAULT_STATE.to_string(),
            address_zip: String::new(),
            phone: String::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Address {
    pub street: String,
    pub city: String,
    pub state: String,
    pub zip: ZipCode,
}

/// A draft that passed checkout validation.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutRequest {
    pub plan: Plan,
    pub schedule: PickupSchedule,
    pub address: Address,
    pub phone: PhoneNumber,
}

impl CheckoutDraft {
    pub fn bag_count(&self) -> i64 {
        self.bag_count
            .unwrap_or_else(|| i64::from(self.plan_type.bag_count().value()))
    }

    pub fn monthly_price(&self) -> u32 {
        self.plan_type.monthly_price(self.frequency)
    }

    pub fn validate(&self) -> Result<CheckoutRequest, FieldErrors> {
        let mut errors = FieldErrors::default();

        let bag_count = match BagCount::parse(self.bag_count()) {
            Ok(count) => Some(count),
            Err(_) => {
                errors.insert("bagCount", "Bag count must be between 1 and 10");
                None
            }
        };

        let window = match PickupWindow::parse(&self.pickup_window_start, &self.pickup_window_end)
        {
            Ok(window) => Some(window),
            Err(_) => {
                errors.insert("pickupWindow", "Select a pickup window");
                None
            }
        };

        let schedule = match PickupSchedule::new(
            self.frequency,
            self.pickup_day1,
            self.pickup_day2,
            window.unwrap_or_default(),
        ) {
            Ok(schedule) => window.map(|_| schedule),
            Err(ScheduleError::MissingSecondDay | ScheduleError::SameDayTwice) => {
                errors.insert(
                    "pickupDay2",
                    "Select a second pickup day different from the first",
                );
                None
            }
        };

        let street = self.address_street.trim();
        if street.is_empty() {
            errors.insert("addressStreet", "Address is required");
        }
        let city = self.address_city.trim();
        if city.is_empty() {
            errors.insert("addressCity", "City is required");
        }
        let zip = match ZipCode::parse(&self.address_zip) {
            Ok(zip) => Some(zip),
            Err(_) => {
                errors.insert("addressZip", "Valid zip code is required");
                None
            }
        };
        let phone = match PhoneNumber::parse(&self.phone) {
            Ok(phone) => Some(phone),
            Err(_) => {
                errors.insert("phone", "Valid phone number is required");
                None
            }
        };
        let state = match self.address_state.trim() {
            "" => DEFAULT_STATE,
            state => state,
        };

        match (bag_count, schedule, zip, phone) {
            (Some(bag_count), Some(schedule), Some(zip), Some(phone)) if errors.is_empty() => {
                Ok(CheckoutRequest {
                    plan: Plan {
                        plan_type: self.plan_type,
                        frequency: self.frequency,
                        bag_count,
                    },
                    schedule,
                    address: Address {
                        street: street.to_string(),
                        city: city.to_string(),
                        state: state.to_string(),
                        zip,
                    },
                    phone,
                })
            }
            _ => Err(errors),
        }
    }
}

/// A single answer given on one of the steps.
#[derive(Debug, Clone, PartialEq)]
pub enum Selection {
    PlanType(PlanType),
    Frequency(Frequency),
    BagCount(BagCount),
    PickupDay1(PickupDay),
    PickupDay2(PickupDay),
    PickupWindow(PickupWindow),
    AddressStreet(String),
    AddressCity(String),
    AddressState(String),
    AddressZip(String),
    Phone(String),
}

impl Selection {
    fn name(&self) -> &'static str {
        match self {
            Selection::PlanType(_) => "planType",
            Selection::Frequency(_) => "frequency",
            Selection::BagCount(_) => "bagCount",
            Selection::PickupDay1(_) => "pickupDay1",
            Selection::PickupDay2(_) => "pickupDay2",
            Selection::PickupWindow(_) => "pickupWindow",
            Selection::AddressStreet(_) => "addressStreet",
            Selection::AddressCity(_) => "addressCity",
            Selection::AddressState(_) => "addressState",
            Selection::AddressZip(_) => "addressZip",
            Selection::Phone(_) => "phone",
        }
    }

    /// The plan step doubles as the customization screen, so it accepts the
    /// household size and frequency again.
    fn accepted_at(&self, step: Step) -> bool {
        match self {
            Selection::PlanType(_) => matches!(step, Step::HouseholdSize | Step::Plan),
            Selection::Frequency(_) => matches!(step, Step::Frequency | Step::Plan),
            Selection::BagCount(_) => step == Step::Plan,
            Selection::PickupDay1(_) | Selection::PickupDay2(_) | Selection::PickupWindow(_) => {
                step == Step::Schedule
            }
            Selection::AddressStreet(_)
            | Selection::AddressCity(_)
            | Selection::AddressState(_)
            | Selection::AddressZip(_)
            | Selection::Phone(_) => step == Step::Checkout,
        }
    }

    fn apply(self, draft: &mut CheckoutDraft) {
        match self {
            Selection::PlanType(plan_type) => {
                draft.plan_type = plan_type;
                draft.bag_count = None;
            }
            Selection::Frequency(frequency) => draft.frequency = frequency,
            Selection::BagCount(count) => draft.bag_count = Some(i64::from(count.value())),
            Selection::PickupDay1(day) => draft.pickup_day1 = day,
            Selection::PickupDay2(day) => draft.pickup_day2 = Some(day),
            Selection::PickupWindow(window) => {
                draft.pickup_window_start = window.start();
                draft.pickup_window_end = window.end();
            }
            Selection::AddressStreet(street) => draft.address_street = street,
            Selection::AddressCity(city) => draft.address_city = city,
            Selection::AddressState(state) => draft.address_state = state,
            Selection::AddressZip(zip) => draft.address_zip = zip,
            Selection::Phone(phone) => draft.phone = phone,
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum WizardError {
    #[error("{selection} cannot be chosen on the {} step.", .step.label())]
    NotOnThisStep {
        selection: &'static str,
        step: Step,
    },
    #[error("A second pickup day is only offered for twice-weekly plans.")]
    SecondDayNotOffered,
    #[error("Onboarding is already complete.")]
    Finished,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Onboarding {
    HouseholdSize(CheckoutDraft),
    Frequency(CheckoutDraft),
    Plan(CheckoutDraft),
    Schedule(CheckoutDraft),
    Checkout {
        draft: CheckoutDraft,
        errors: FieldErrors,
    },
    /// Terminal: the checkout session was created.
    Submitted {
        request: CheckoutRequest,
        session: CheckoutSession,
    },
}

impl Onboarding {
    /// Starts at the first step, carrying over a zip code that already passed
    /// the service-area check.
    pub fn start(zip: Option<&str>) -> Onboarding {
        let draft = CheckoutDraft {
            address_zip: zip.unwrap_or_default().to_string(),
            ..CheckoutDraft::default()
        };
        Onboarding::HouseholdSize(draft)
    }

    pub fn step(&self) -> Option<Step> {
        match self {
            Onboarding::HouseholdSize(_) => Some(Step::HouseholdSize),
            Onboarding::Frequency(_) => Some(Step::Frequency),
            Onboarding::Plan(_) => Some(Step::Plan),
            Onboarding::Schedule(_) => Some(Step::Schedule),
            Onboarding::Checkout { .. } => Some(Step::Checkout),
            Onboarding::Submitted { .. } => None,
        }
    }

    pub fn draft(&self) -> Option<&CheckoutDraft> {
        match self {
            Onboarding::HouseholdSize(draft)
            | Onboarding::Frequency(draft)
            | Onboarding::Plan(draft)
            | Onboarding::Schedule(draft)
            | Onboarding::Checkout { draft, .. } => Some(draft),
            Onboarding::Submitted { .. } => None,
        }
    }

    pub fn errors(&self) -> Option<&FieldErrors> {
        match self {
            Onboarding::Checkout { errors, .. } => Some(errors),
            _ => None,
        }
    }

    pub fn next(self) -> Onboarding {
        match self {
            Onboarding::Checkout { .. } | Onboarding::Submitted { .. } => self,
            other => other.move_by(Step::next),
        }
    }

    pub fn back(self) -> Onboarding {
        other_or_self(self, Step::previous)
    }

    /// "Customize my plan": from the plan summary straight to scheduling.
    pub fn customize(self) -> Onboarding {
        match self {
            Onboarding::Plan(draft) => Onboarding::Schedule(draft),
            other => other,
        }
    }

    /// Records an answer on the current step and clears field errors.
    pub fn select(&mut self, selection: Selection) -> Result<(), WizardError> {
        let step = self.step().ok_or(WizardError::Finished)?;
        if !selection.accepted_at(step) {
            return Err(WizardError::NotOnThisStep {
                selection: selection.name(),
                step,
            });
        }
        if let Onboarding::Checkout { errors, .. } = self {
            errors.clear();
        }
        let draft = match self {
            Onboarding::HouseholdSize(draft)
            | Onboarding::Frequency(draft)
            | Onboarding::Plan(draft)
            | Onboarding::Schedule(draft)
            | Onboarding::Checkout { draft, .. } => draft,
            Onboarding::Submitted { .. } => return Err(WizardError::Finished),
        };
        if matches!(selection, Selection::PickupDay2(_)) && !draft.frequency.requires_second_day()
        {
            return Err(WizardError::SecondDayNotOffered);
        }
        selection.apply(draft);
        Ok(())
    }

    /// Validates the draft and opens a checkout session. Any failure keeps
    /// the wizard on the checkout step with errors to show.
    pub async fn submit(self, billing: &dyn Billing, customer: &CheckoutCustomer) -> Onboarding {
        let draft = match self {
            Onboarding::Checkout { draft, .. } => draft,
            other => return other,
        };
        let request = match draft.validate() {
            Ok(request) => request,
            Err(errors) => return Onboarding::Checkout { draft, errors },
        };
        match billing.create_checkout_session(customer, &request).await {
            Ok(session) => Onboarding::Submitted { request, session },
            Err(error) => {
                tracing::error!(error.cause_chain = ?error, "Failed to create a checkout session");
                let mut errors = FieldErrors::default();
                errors.insert("general", "Something went wrong. Please try again.");
                Onboarding::Checkout { draft, errors }
            }
        }
    }

    fn move_by(self, towards: fn(&Step) -> Step) -> Onboarding {
        let (step, draft) = match self {
            Onboarding::HouseholdSize(draft) => (Step::HouseholdSize, draft),
            Onboarding::Frequency(draft) => (Step::Frequency, draft),
            Onboarding::Plan(draft) => (Step::Plan, draft),
            Onboarding::Schedule(draft) => (Step::Schedule, draft),
            Onboarding::Checkout { draft, .. } => (Step::Checkout, draft),
            submitted @ Onboarding::Submitted { .. } => return submitted,
        };
        match towards(&step) {
            Step::HouseholdSize => Onboarding::HouseholdSize(draft),
            Step::Frequency => Onboarding::Frequency(draft),
            Step::Plan => Onboarding::Plan(draft),
            Step::Schedule => Onboarding::Schedule(draft),
            Step::Checkout => Onboarding::Checkout {
                draft,
                errors: FieldErrors::default(),
            },
        }
    }
}

fn other_or_self(onboarding: Onboarding, towards: fn(&Step) -> Step) -> Onboarding {
    match onboarding {
        Onboarding::HouseholdSize(_) | Onboarding::Submitted { .. } => onboarding,
        other => other.move_by(towards),
    }
}
