use serde::{Deserialize, Serialize};
use validator::Validate;

pub(crate) use crate::core::time::format_primitive;
use crate::db::models::User;
use crate::db::types::UserRole;

fn default_all() -> String {
    "all".to_string()
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserCreate {
    #[validate(email)]
    pub(crate) email: String,
    #[validate(length(min = 1, max = 64))]
    pub(crate) roll_no: String,
    #[validate(length(min = 1, max = 255))]
    pub(crate) full_name: String,
    #[validate(length(min = 8, max = 128))]
    pub(crate) password: String,
    #[serde(default = "default_all")]
    pub(crate) college: String,
    #[serde(default = "default_all")]
    pub(crate) batch: String,
    #[serde(default = "default_all")]
    pub(crate) department: String,
}

#[derive(Debug, Deserialize, Validate)]
pub(crate) struct UserLogin {
    #[validate(email)]
    pub(crate) email: String,
    #[validate(length(min = 1))]
    pub(crate) password: String,
}

#[derive(Debug, Serialize)]
pub(crate) struct UserResponse {
    pub(crate) id: String,
    pub(crate) email: String,
    pub(crate) roll_no: String,
    pub(crate) full_name: String,
    pub(crate) role: UserRole,
    pub(crate) college: String,
    pub(crate) batch: String,
    pub(crate) department: String,
    pub(crate) is_active: bool,
    pub(crate) created_at: String,
}

impl UserResponse {
    pub(crate) fn from_db(user: User) -> Self {
        Self {
            id: user.id,
            email: user.email,
            roll_no: user.roll_no,
            full_name: user.full_name,
            role: user.role,
            college: user.college,
            batch: user.batch,
            department: user.department,
            is_active: user.is_active,
            created_at: format_primitive(user.created_at),
        }
    }
}
