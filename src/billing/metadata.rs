use crate::domain::{
    BagCount, Frequency, NewSubscription, PickupDay, PickupSchedule, PickupWindow, Plan, PlanType,
};
use anyhow::{anyhow, Context};
use std::collections::HashMap;
use uuid::Uuid;

pub(crate) const USER_ID: &str = "user_id";
const PLAN_TYPE: &str = "plan_type";
const FREQUENCY: &str = "frequency";
const BAG_COUNT: &str = "bag_count";
const PICKUP_DAY_1: &str = "pickup_day_1";
const PICKUP_DAY_2: &str = "pickup_day_2";
const PICKUP_WINDOW_START: &str = "pickup_window_start";
const PICKUP_WINDOW_END: &str = "pickup_window_end";

/// The plan and schedule a customer paid for, carried through the billing
/// provider as string metadata on both the checkout session and the
/// subscription it creates.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutMetadata {
    pub user_id: Uuid,
    pub plan: Plan,
    pub schedule: PickupSchedule,
}

impl CheckoutMetadata {
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (USER_ID, self.user_id.to_string()),
            (PLAN_TYPE, self.plan.plan_type.as_str().to_string()),
            (FREQUENCY, self.plan.frequency.as_str().to_string()),
            (BAG_COUNT, self.plan.bag_count.value().to_string()),
            (PICKUP_DAY_1, self.schedule.first_day().as_str().to_string()),
            (
                PICKUP_DAY_2,
                self.schedule
                    .second_day()
                    .map(|day| day.as_str().to_string())
                    .unwrap_or_default(),
            ),
            (PICKUP_WINDOW_START, self.schedule.window.start()),
            (PICKUP_WINDOW_END, self.schedule.window.end()),
        ]
    }

    pub fn from_map(metadata: &HashMap<String, String>) -> Result<CheckoutMetadata, anyhow::Error> {
        let get = |key: &str| {
            metadata
                .get(key)
                .map(String::as_str)
                .ok_or_else(|| anyhow!("Checkout metadata is missing '{}'.", key))
        };

        let user_id = Uuid::parse_str(get(USER_ID)?).context("Invalid user id in metadata.")?;
        let plan_type = PlanType::try_from(get(PLAN_TYPE)?).map_err(|e| anyhow!(e))?;
        let frequency = Frequency::try_from(get(FREQUENCY)?).map_err(|e| anyhow!(e))?;
        let bag_count = get(BAG_COUNT)?
            .parse::<i64>()
            .context("Invalid bag count in metadata.")
            .and_then(|count| BagCount::parse(count).map_err(|e| anyhow!(e)))?;
        let first_day = PickupDay::try_from(get(PICKUP_DAY_1)?).map_err(|e| anyhow!(e))?;
        let second_day = match metadata.get(PICKUP_DAY_2).map(String::as_str) {
            None | Some("") => None,
            Some(day) => Some(PickupDay::try_from(day).map_err(|e| anyhow!(e))?),
        };
        let window = PickupWindow::parse(get(PICKUP_WINDOW_START)?, get(PICKUP_WINDOW_END)?)
            .map_err(|e| anyhow!(e))?;
        let schedule = PickupSchedule::new(frequency, first_day, second_day, window)
            .context("Inconsistent pickup days in metadata.")?;

        Ok(CheckoutMetadata {
            user_id,
            plan: Plan {
                plan_type,
                frequency,
                bag_count,
            },
            schedule,
        })
    }

    pub fn into_new_subscription(
        self,
        billing_subscription_id: String,
        billing_customer_id: Option<String>,
    ) -> NewSubscription {
        NewSubscription {
            user_id: self.user_id,
            plan: self.plan,
            schedule: self.schedule,
            billing_subscription_id,
            billing_customer_id,
        }
    }
}
