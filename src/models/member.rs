//! Lending member model

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Member record, one per registered reader account
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Member {
    pub id: i32,
    pub user_id: i32,
    pub membership_id: String,
    pub phone: String,
    pub address: String,
    pub date_joined: NaiveDate,
}

impl Member {
    /// Membership number derived from the owning user's id (`M0042`)
    pub fn membership_id_for(user_id: i32) -> String {
        format!("M{:04}", user_id)
    }
}

/// Member with the identity fields of its user, for display
#[derive(Debug, Clone, Serialize, FromRow, ToSchema)]
pub struct MemberProfile {
    pub id: i32,
    pub membership_id: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub date_joined: NaiveDate,
}

/// Profile fields a member may edit
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct MemberForm {
    #[serde(default)]
    #[validate(length(max = 15, message = "Phone must be at most 15 characters"))]
    pub phone: String,
    #[serde(default)]
    pub address: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_id_is_zero_padded_user_id() {
        assert_eq!(Member::membership_id_for(1), "M0001");
        assert_eq!(Member::membership_id_for(42), "M0042");
        assert_eq!(Member::membership_id_for(9999), "M9999");
        assert_eq!(Member::membership_id_for(12345), "M12345");
    }

    #[test]
    fn phone_length_is_bounded() {
        let form = MemberForm {
            phone: "0123456789012345".into(),
            address: String::new(),
        };
        assert!(form.validate().is_err());

        let form = MemberForm {
            phone: "+33 1 23 45 67".into(),
            address: "1 rue des Livres".into(),
        };
        assert!(form.validate().is_ok());
    }
}
