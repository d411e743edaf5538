//! Past roles a talent lists on their profile

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Editable fields of a past role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleDetails {
    pub company_name: String,
    pub title: String,
    pub start_date: NaiveDate,
    /// `None` while the role is ongoing
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PastRole {
    pub id: Uuid,
    pub talent_id: Uuid,
    pub company_name: String,
    pub title: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PastRole {
    pub fn new(talent_id: Uuid, details: RoleDetails, now: DateTime<Utc>) -> Self {
        let mut role = Self {
            id: Uuid::new_v4(),
            talent_id,
            company_name: String::new(),
            title: String::new(),
            start_date: details.start_date,
            end_date: None,
            description: None,
            created_at: now,
            updated_at: now,
        };
        role.apply(details, now);
        role
    }

    /// Replace the editable fields, trimming text and dropping a blank description
    pub fn apply(&mut self, details: RoleDetails, now: DateTime<Utc>) {
        self.company_name = details.company_name.trim().to_string();
        self.title = details.title.trim().to_string();
        self.start_date = details.start_date;
        self.end_date = details.end_date;
        self.description = details
            .description
            .map(|d| d.trim().to_string())
            .filter(|d| !d.is_empty());
        self.updated_at = now;
    }

    pub fn is_current(&self) -> bool {
        self.end_date.is_none()
    }
}

/// Most recent start first; ongoing roles before finished ones that started the same day
pub fn sort_newest_first(roles: &mut [PastRole]) {
    roles.sort_by(|a, b| {
        b.start_date
            .cmp(&a.start_date)
            .then_with(|| a.end_date.is_some().cmp(&b.end_date.is_some()))
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn details(company: &str, start: (i32, u32), end: Option<(i32, u32)>) -> RoleDetails {
        RoleDetails {
            company_name: company.to_string(),
            title: "Engineer".to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, 1).unwrap(),
            end_date: end.and_then(|(y, m)| NaiveDate::from_ymd_opt(y, m, 1)),
            description: Some("   ".to_string()),
        }
    }

    #[test]
    fn test_new_trims_and_drops_blank_description() {
        let mut d = details("  Initech ", (2019, 3), None);
        d.title = " Staff Engineer ".to_string();
        let role = PastRole::new(Uuid::new_v4(), d, Utc::now());
        assert_eq!(role.company_name, "Initech");
        assert_eq!(role.title, "Staff Engineer");
        assert_eq!(role.description, None);
        assert!(role.is_current());
    }

    #[test]
    fn test_apply_touches_updated_at() {
        let now = Utc::now();
        let mut role = PastRole::new(Uuid::new_v4(), details("Initech", (2019, 3), None), now);
        let later = now + Duration::minutes(3);
        role.apply(details("Initrode", (2019, 3), Some((2021, 6))), later);
        assert_eq!(role.company_name, "Initrode");
        assert!(!role.is_current());
        assert_eq!(role.created_at, now);
        assert_eq!(role.updated_at, later);
    }

    #[test]
    fn test_sort_newest_first() {
        let talent = Uuid::new_v4();
        let now = Utc::now();
        let mut roles = vec![
            PastRole::new(talent, details("Old", (2012, 1), Some((2015, 1))), now),
            PastRole::new(talent, details("Finished", (2020, 5), Some((2022, 1))), now),
            PastRole::new(talent, details("Current", (2020, 5), None), now),
        ];
        sort_newest_first(&mut roles);
        let order: Vec<_> = roles.iter().map(|r| r.company_name.as_str()).collect();
        assert_eq!(order, vec!["Current", "Finished", "Old"]);
    }
}
