//! Static plan catalog: household size, pickup frequency, bag allowance and
//! monthly price.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    Small,
    Medium,
    Large,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Biweekly,
    Weekly,
    TwiceWeekly,
}

impl PlanType {
    pub const ALL: [PlanType; 3] = [PlanType::Small, PlanType::Medium, PlanType::Large];

    pub fn as_str(&self) -> &'static str {
        match self {
            PlanType::Small => "small",
            PlanType::Medium => "medium",
            PlanType::Large => "large",
        }
    }

    /// Household size shown to customers.
    pub fn label(&self) -> &'static str {
        match self {
            PlanType::Small => "1-2 People",
            PlanType::Medium => "3-4 People",
            PlanType::Large => "5+ People",
        }
    }

    /// Bags included with the plan. Independent of the pickup frequency.
    pub fn bag_count(&self) -> BagCount {
        match self {
            PlanType::Small => BagCount(2),
            PlanType::Medium => BagCount(4),
            PlanType::Large => BagCount(6),
        }
    }

    /// Monthly price in whole US dollars.
    pub fn monthly_price(&self, frequency: Frequency) -> u32 {
        use Frequency::*;
        match (self, frequency) {
            (PlanType::Small, Biweekly) => 49,
            (PlanType::Small, Weekly) => 79,
            (PlanType::Small, TwiceWeekly) => 139,
            (PlanType::Medium, Biweekly) => 69,
            (PlanType::Medium, Weekly) => 109,
            (PlanType::Medium, TwiceWeekly) => 189,
            (PlanType::Large, Biweekly) => 89,
            (PlanType::Large, Weekly) => 149,
            (PlanType::Large, TwiceWeekly) => 259,
        }
    }

    /// Identifier of the recurring price registered with the billing provider.
    pub fn price_id(&self, frequency: Frequency) -> &'static str {
        use Frequency::*;
        match (self, frequency) {
            (PlanType::Small, Biweekly) => "price_small_biweekly",
            (PlanType::Small, Weekly) => "price_small_weekly",
            (PlanType::Small, TwiceWeekly) => "price_small_twice_weekly",
            (PlanType::Medium, Biweekly) => "price_medium_biweekly",
            (PlanType::Medium, Weekly) => "price_medium_weekly",
            (PlanType::Medium, TwiceWeekly) => "price_medium_twice_weekly",
            (PlanType::Large, Biweekly) => "price_large_biweekly",
            (PlanType::Large, Weekly) => "price_large_weekly",
            (PlanType::Large, TwiceWeekly) => "price_large_twice_weekly",
        }
    }
}

impl TryFrom<&str> for PlanType {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "small" => Ok(Self::Small),
            "medium" => Ok(Self::Medium),
            "large" => Ok(Self::Large),
            other => Err(format!("{} is not a valid plan type.", other)),
        }
    }
}

impl Frequency {
    pub const ALL: [Frequency; 3] = [
        Frequency::Biweekly,
        Frequency::Weekly,
        Frequency::TwiceWeekly,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Frequency::Biweekly => "biweekly",
            Frequency::Weekly => "weekly",
            Frequency::TwiceWeekly => "twice_weekly",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Frequency::Biweekly => "Every Other Week",
            Frequency::Weekly => "Weekly",
            Frequency::TwiceWeekly => "Twice a Week",
        }
    }

    pub fn requires_second_day(&self) -> bool {
        matches!(self, Frequency::TwiceWeekly)
    }
}

impl TryFrom<&str> for Frequency {
    type Error = String;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        match s {
            "biweekly" => Ok(Self::Biweekly),
            "weekly" => Ok(Self::Weekly),
            "twice_weekly" => Ok(Self::TwiceWeekly),
            other => Err(format!("{} is not a valid frequency.", other)),
        }
    }
}

/// Number of bags collected per pickup, between 1 and 10.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BagCount(u8);

impl BagCount {
    pub const MAX: u8 = 10;

    pub fn parse(count: i64) -> Result<BagCount, String> {
        if (1..=i64::from(Self::MAX)).contains(&count) {
            Ok(BagCount(count as u8))
        } else {
            Err(format!("{} is not a valid bag count.", count))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

/// A fully chosen plan: size, cadence and bag allowance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Plan {
    pub plan_type: PlanType,
    pub frequency: Frequency,
    pub bag_count: BagCount,
}

impl Plan {
    /// A plan with the catalog bag allowance.
    pub fn new(plan_type: PlanType, frequency: Frequency) -> Plan {
        Plan {
            plan_type,
            frequency,
            bag_count: plan_type.bag_count(),
        }
    }

    pub fn monthly_price(&self) -> u32 {
        self.plan_type.monthly_price(self.frequency)
    }

    pub fn price_id(&self) -> &'static str {
        self.plan_type.price_id(self.frequency)
    }
}
