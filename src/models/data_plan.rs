// Network State - Cellular Data Plans
// Copyright (C) 2026 Christos A. Daggas
// SPDX-License-Identifier: MIT

//! Usage and expiration accounting for metered cellular plans.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::config::DataPlanThresholds;
use super::network::DataLeft;
use super::property::PropertyDict;
use crate::parser::{dict_string, keys};

const MEGABYTE: i64 = 1024 * 1024;

/// Billing model of a data plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DataPlanType {
    #[default]
    Unlimited = 0,
    MeteredPaid = 1,
    MeteredBase = 2,
}

impl DataPlanType {
    pub fn from_key(value: &str) -> Self {
        match value {
            keys::PLAN_TYPE_METERED_PAID => Self::MeteredPaid,
            keys::PLAN_TYPE_METERED_BASE => Self::MeteredBase,
            _ => Self::Unlimited,
        }
    }

    pub fn is_metered(&self) -> bool {
        matches!(self, Self::MeteredPaid | Self::MeteredBase)
    }
}

/// A data plan reported by the carrier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CellularDataPlan {
    pub plan_name: String,
    pub plan_type: DataPlanType,
    pub update_time: DateTime<Utc>,
    pub plan_start_time: DateTime<Utc>,
    pub plan_end_time: DateTime<Utc>,
    pub plan_data_bytes: i64,
    pub data_bytes_used: i64,
}

impl Default for CellularDataPlan {
    fn default() -> Self {
        Self {
            plan_name: "Unknown".to_string(),
            plan_type: DataPlanType::Unlimited,
            update_time: DateTime::<Utc>::default(),
            plan_start_time: DateTime::<Utc>::default(),
            plan_end_time: DateTime::<Utc>::default(),
            plan_data_bytes: 0,
            data_bytes_used: 0,
        }
    }
}

impl CellularDataPlan {
    /// Build from a data plan dictionary. Times are Unix seconds.
    pub fn from_dict(dict: &PropertyDict) -> Self {
        let int = |key: &str| dict.get(key).and_then(|v| v.as_i64()).unwrap_or(0);
        let time = |key: &str| DateTime::from_timestamp(int(key), 0).unwrap_or_default();
        Self {
            plan_name: dict_string(dict, keys::PLAN_NAME),
            plan_type: DataPlanType::from_key(&dict_string(dict, keys::PLAN_TYPE)),
            update_time: time(keys::PLAN_UPDATE_TIME),
            plan_start_time: time(keys::PLAN_START),
            plan_end_time: time(keys::PLAN_END),
            plan_data_bytes: int(keys::PLAN_DATA_BYTES),
            data_bytes_used: int(keys::PLAN_DATA_BYTES_USED),
        }
    }

    /// Bytes left in the plan, never negative.
    pub fn remaining_data(&self) -> i64 {
        self.plan_data_bytes.saturating_sub(self.data_bytes_used).max(0)
    }

    /// Time left until the plan expires, never negative.
    pub fn remaining_time(&self) -> Duration {
        self.remaining_time_at(Utc::now())
    }

    pub fn remaining_time_at(&self, now: DateTime<Utc>) -> Duration {
        (self.plan_end_time - now).max(Duration::zero())
    }

    pub fn remaining_minutes(&self) -> i64 {
        self.remaining_time().num_minutes()
    }

    /// Identity of a plan: name, type, start, end and size.
    ///
    /// Usage and update time are not part of it, so a usage update of the
    /// same plan keeps the identifier.
    pub fn unique_identifier(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.plan_name,
            self.plan_type as i32,
            self.plan_start_time.timestamp_micros(),
            self.plan_end_time.timestamp_micros(),
            self.plan_data_bytes
        )
    }

    pub fn plan_description(&self) -> String {
        let start = self.plan_start_time.format("%b %-d, %Y");
        match self.plan_type {
            DataPlanType::Unlimited => format!("Unlimited data purchased on {}", start),
            DataPlanType::MeteredPaid => {
                format!("{} purchased on {}", format_bytes(self.plan_data_bytes), start)
            }
            DataPlanType::MeteredBase => {
                format!("Received {} free data on {}", format_bytes(self.plan_data_bytes), start)
            }
        }
    }

    /// Warning text when the plan is close to running out, else empty.
    pub fn remaining_warning(&self, thresholds: &DataPlanThresholds) -> String {
        self.remaining_warning_at(thresholds, Utc::now())
    }

    pub fn remaining_warning_at(&self, thresholds: &DataPlanThresholds, now: DateTime<Utc>) -> String {
        if self.plan_type.is_metered() {
            if self.remaining_data() <= thresholds.very_low_data_bytes {
                return format!("{} MB remaining", self.remaining_data() / MEGABYTE);
            }
        } else if self.remaining_time_at(now).num_seconds() <= thresholds.very_low_data_secs {
            return self.plan_expiration_at(now);
        }
        String::new()
    }

    pub fn data_remaining_description(&self) -> String {
        if self.plan_type.is_metered() {
            format_bytes(self.remaining_data())
        } else {
            "Unlimited".to_string()
        }
    }

    pub fn usage_info(&self) -> String {
        if !self.plan_type.is_metered() {
            return self.plan_expiration();
        }
        let remaining = self.remaining_data();
        if remaining == 0 {
            "No data available".to_string()
        } else if remaining < MEGABYTE {
            "Less than 1 MB available".to_string()
        } else {
            format!("{} MB available", remaining / MEGABYTE)
        }
    }

    pub fn plan_expiration(&self) -> String {
        self.plan_expiration_at(Utc::now())
    }

    fn plan_expiration_at(&self, now: DateTime<Utc>) -> String {
        let left = self.remaining_time_at(now);
        if left.num_days() > 0 {
            format!("{} days left", left.num_days())
        } else if left.num_hours() > 0 {
            format!("{} hours left", left.num_hours())
        } else if left.num_minutes() > 0 {
            format!("{} mins left", left.num_minutes())
        } else {
            format!("{} secs left", left.num_seconds())
        }
    }
}

/// Human readable byte count using binary units.
pub fn format_bytes(bytes: i64) -> String {
    const UNITS: [&str; 5] = ["B", "kB", "MB", "GB", "TB"];
    let mut value = bytes.max(0) as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes.max(0), UNITS[0])
    } else if value >= 100.0 {
        format!("{:.0} {}", value, UNITS[unit])
    } else {
        format!("{:.1} {}", value, UNITS[unit])
    }
}

/// The plan that best describes the current allowance.
///
/// The first plan wins, except that a base (free) allowance gives way to
/// any later plan.
pub fn significant_plan(plans: &[CellularDataPlan]) -> Option<&CellularDataPlan> {
    let mut significant: Option<&CellularDataPlan> = None;
    for plan in plans {
        match significant {
            None => significant = Some(plan),
            Some(current) if current.plan_type == DataPlanType::MeteredBase => {
                significant = Some(plan)
            }
            Some(_) => {}
        }
    }
    significant
}

impl DataLeft {
    /// Classify the remaining allowance of `plan`.
    pub fn compute(
        plan: Option<&CellularDataPlan>,
        thresholds: &DataPlanThresholds,
        now: DateTime<Utc>,
    ) -> Self {
        let Some(plan) = plan else {
            return Self::None;
        };
        if plan.plan_type.is_metered() {
            let remaining = plan.remaining_data();
            if remaining == 0 {
                Self::None
            } else if remaining <= thresholds.very_low_data_bytes {
                Self::VeryLow
            } else if remaining <= thresholds.low_data_bytes {
                Self::Low
            } else {
                Self::Normal
            }
        } else {
            let secs = plan.remaining_time_at(now).num_seconds();
            if secs <= 0 {
                Self::None
            } else if secs <= thresholds.very_low_data_secs {
                Self::VeryLow
            } else if secs <= thresholds.low_data_secs {
                Self::Low
            } else {
                Self::Normal
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    fn metered(bytes: i64, used: i64) -> CellularDataPlan {
        CellularDataPlan {
            plan_name: "Basic".into(),
            plan_type: DataPlanType::MeteredPaid,
            plan_data_bytes: bytes,
            data_bytes_used: used,
            ..CellularDataPlan::default()
        }
    }

    #[test]
    fn test_defaults() {
        let plan = CellularDataPlan::default();
        assert_eq!(plan.plan_name, "Unknown");
        assert_eq!(plan.plan_type, DataPlanType::Unlimited);
    }

    #[test]
    fn test_remaining_data_clamps_at_zero() {
        assert_eq!(metered(1000, 400).remaining_data(), 600);
        assert_eq!(metered(1000, 1500).remaining_data(), 0);
        assert_eq!(metered(i64::MAX, i64::MIN).remaining_data(), i64::MAX);
        assert_eq!(metered(i64::MIN, i64::MAX).remaining_data(), 0);
    }

    #[test]
    fn test_remaining_time_clamps_at_zero() {
        let mut plan = CellularDataPlan::default();
        plan.plan_end_time = now() - Duration::hours(2);
        assert_eq!(plan.remaining_time_at(now()), Duration::zero());
        plan.plan_end_time = now() + Duration::minutes(90);
        assert_eq!(plan.remaining_time_at(now()).num_minutes(), 90);
    }

    #[test]
    fn test_unique_identifier_ignores_usage() {
        let mut plan = metered(5 * MEGABYTE, 0);
        plan.plan_start_time = Utc.timestamp_opt(1, 0).unwrap();
        plan.plan_end_time = Utc.timestamp_opt(2, 0).unwrap();
        let id = plan.unique_identifier();
        assert_eq!(id, format!("Basic|1|1000000|2000000|{}", 5 * MEGABYTE));

        plan.data_bytes_used = 42;
        plan.update_time = now();
        assert_eq!(plan.unique_identifier(), id);
    }

    #[test]
    fn test_from_dict() {
        let dict = json!({
            "CellularPlanName": "Day Pass",
            "CellularPlanType": "METERED_BASE",
            "CellularPlanStart": 1_700_000_000,
            "CellularPlanEnd": 1_700_086_400,
            "CellularPlanDataBytes": 100,
            "CellularDataBytesUsed": 30,
        });
        let plan = CellularDataPlan::from_dict(dict.as_object().unwrap());
        assert_eq!(plan.plan_name, "Day Pass");
        assert_eq!(plan.plan_type, DataPlanType::MeteredBase);
        assert_eq!(plan.plan_start_time.timestamp(), 1_700_000_000);
        assert_eq!(plan.remaining_data(), 70);
    }

    #[test]
    fn test_significant_plan() {
        assert!(significant_plan(&[]).is_none());

        let mut base = metered(10, 0);
        base.plan_type = DataPlanType::MeteredBase;
        base.plan_name = "Free".into();
        let paid = metered(20, 0);
        let plans = vec![base.clone(), paid.clone()];
        assert_eq!(significant_plan(&plans).unwrap().plan_name, "Basic");

        let plans = vec![paid, base];
        assert_eq!(significant_plan(&plans).unwrap().plan_name, "Basic");
    }

    #[test]
    fn test_data_left_metered() {
        let thresholds = DataPlanThresholds::default();
        let low = thresholds.low_data_bytes;
        let very_low = thresholds.very_low_data_bytes;
        let check = |plan: CellularDataPlan| DataLeft::compute(Some(&plan), &thresholds, now());
        assert_eq!(check(metered(low * 4, 0)), DataLeft::Normal);
        assert_eq!(check(metered(low, 0)), DataLeft::Low);
        assert_eq!(check(metered(very_low, 0)), DataLeft::VeryLow);
        assert_eq!(check(metered(very_low, very_low * 2)), DataLeft::None);
        assert_eq!(DataLeft::compute(None, &thresholds, now()), DataLeft::None);
    }

    #[test]
    fn test_data_left_unlimited() {
        let thresholds = DataPlanThresholds::default();
        let mut plan = CellularDataPlan::default();
        plan.plan_end_time = now() + Duration::days(10);
        assert_eq!(DataLeft::compute(Some(&plan), &thresholds, now()), DataLeft::Normal);
        plan.plan_end_time = now() + Duration::minutes(45);
        assert_eq!(DataLeft::compute(Some(&plan), &thresholds, now()), DataLeft::Low);
        plan.plan_end_time = now() + Duration::minutes(10);
        assert_eq!(DataLeft::compute(Some(&plan), &thresholds, now()), DataLeft::VeryLow);
        plan.plan_end_time = now();
        assert_eq!(DataLeft::compute(Some(&plan), &thresholds, now()), DataLeft::None);
    }

    #[test]
    fn test_descriptions() {
        let thresholds = DataPlanThresholds::default();
        assert_eq!(metered(0, 0).usage_info(), "No data available");
        assert_eq!(metered(1000, 0).usage_info(), "Less than 1 MB available");
        assert_eq!(metered(5 * MEGABYTE, 0).usage_info(), "5 MB available");
        assert_eq!(metered(5 * MEGABYTE, 0).remaining_warning(&thresholds), "5 MB remaining");
        assert_eq!(metered(500 * MEGABYTE, 0).remaining_warning(&thresholds), "");
        assert_eq!(CellularDataPlan::default().data_remaining_description(), "Unlimited");

        let mut plan = CellularDataPlan::default();
        plan.plan_end_time = now() + Duration::minutes(20);
        assert_eq!(plan.remaining_warning_at(&thresholds, now()), "20 mins left");
    }

    #[test]
    fn test_plan_description() {
        let mut plan = CellularDataPlan {
            plan_start_time: Utc.with_ymd_and_hms(2026, 3, 5, 9, 30, 0).unwrap(),
            ..CellularDataPlan::default()
        };
        assert_eq!(plan.plan_description(), "Unlimited data purchased on Mar 5, 2026");

        plan.plan_type = DataPlanType::MeteredPaid;
        plan.plan_data_bytes = 512 * MEGABYTE;
        assert_eq!(plan.plan_description(), "512 MB purchased on Mar 5, 2026");

        plan.plan_type = DataPlanType::MeteredBase;
        plan.plan_data_bytes = 50 * MEGABYTE;
        assert_eq!(plan.plan_description(), "Received 50.0 MB free data on Mar 5, 2026");
    }

    #[test]
    fn test_format_bytes() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1536), "1.5 kB");
        assert_eq!(format_bytes(200 * MEGABYTE), "200 MB");
        assert_eq!(format_bytes(-5), "0 B");
    }
}
