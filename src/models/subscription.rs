use crate::domain::{
    BagCount, Frequency, PickupDay, PickupSchedule, PickupWindow, Plan, PlanType, Subscription,
    SubscriptionStatus,
};
use crate::schema::subscriptions;
use anyhow::{anyhow, Context};
use chrono::{DateTime, Utc};
use uuid::Uuid;

#[derive(Queryable)]
pub struct SubscriptionRow {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_type: String,
    pub frequency: String,
    pub pickup_day_1: String,
    pub pickup_day_2: Option<String>,
    pub pickup_window_start: String,
    pub pickup_window_end: String,
    pub bag_count: i32,
    pub status: String,
    pub billing_subscription_id: Option<String>,
    pub billing_customer_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub paused_at: Option<DateTime<Utc>>,
    pub cancelled_at: Option<DateTime<Utc>>,
    pub last_event_at: Option<DateTime<Utc>>,
}

#[derive(Insertable)]
#[table_name = "subscriptions"]
pub struct NewSubscriptionRow<'a> {
    pub id: &'a Uuid,
    pub user_id: &'a Uuid,
    pub plan_type: &'a str,
    pub frequency: &'a str,
    pub pickup_day_1: &'a str,
    pub pickup_day_2: Option<&'a str>,
    pub pickup_window_start: &'a str,
    pub pickup_window_end: &'a str,
    pub bag_count: i32,
    pub status: &'a str,
    pub billing_subscription_id: Option<&'a str>,
    pub billing_customer_id: Option<&'a str>,
    pub created_at: &'a DateTime<Utc>,
    pub updated_at: &'a DateTime<Utc>,
}

impl TryFrom<SubscriptionRow> for Subscription {
    type Error = anyhow::Error;

    fn try_from(row: SubscriptionRow) -> Result<Self, Self::Error> {
        let plan_type = PlanType::try_from(row.plan_type.as_str()).map_err(|e| anyhow!(e))?;
        let frequency = Frequency::try_from(row.frequency.as_str()).map_err(|e| anyhow!(e))?;
        let bag_count = BagCount::parse(i64::from(row.bag_count)).map_err(|e| anyhow!(e))?;
        let first_day = PickupDay::try_from(row.pickup_day_1.as_str()).map_err(|e| anyhow!(e))?;
        let second_day = row
            .pickup_day_2
            .as_deref()
            .map(PickupDay::try_from)
            .transpose()
            .map_err(|e| anyhow!(e))?;
        let window = PickupWindow::parse(&row.pickup_window_start, &row.pickup_window_end)
            .map_err(|e| anyhow!(e))?;
        let schedule = PickupSchedule::new(frequency, first_day, second_day, window)
            .with_context(|| format!("Subscription {} has inconsistent pickup days.", row.id))?;

        Ok(Subscription {
            id: row.id,
            user_id: row.user_id,
            plan: Plan {
                plan_type,
                frequency,
                bag_count,
            },
            schedule,
            status: SubscriptionStatus::try_from(row.status.as_str()).map_err(|e| anyhow!(e))?,
            billing_subscription_id: row.billing_subscription_id,
            billing_customer_id: row.billing_customer_id,
            created_at: row.created_at,
            paused_at: row.paused_at,
            cancelled_at: row.cancelled_at,
        })
    }
}
