use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::users::repo_types::{Profile, Role, User};

/// Job-seeker fields of a registration form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct JobSeekerForm {
    pub aadhaar: String,
    pub age: Option<u8>,
    pub gender: String,
    pub experience: String,
    pub work_type: Vec<String>,
    pub skills: Vec<String>,
    pub expected_salary: Option<u32>,
    pub availability: Vec<String>,
    pub languages: Vec<String>,
}

/// Employer fields of a registration form.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct EmployerForm {
    pub company_name: String,
    pub company_type: String,
    pub company_address: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "role")]
pub enum RoleForm {
    #[serde(rename = "job")]
    JobSeeker(JobSeekerForm),
    #[serde(rename = "hire")]
    Employer(EmployerForm),
}

impl RoleForm {
    pub fn role(&self) -> Role {
        match self {
            RoleForm::JobSeeker(_) => Role::JobSeeker,
            RoleForm::Employer(_) => Role::Employer,
        }
    }
}

/// Request body for registration: raw form values tagged with the role.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub confirm_password: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(flatten)]
    pub form: RoleForm,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LoginMethod {
    #[default]
    Name,
    Phone,
}

/// Request body for login.
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub method: LoginMethod,
    pub identifier: String,
    pub password: String,
    pub role: Role,
}

/// Record returned to the client; everything but the password hash.
#[derive(Debug, Serialize)]
pub struct PublicUser {
    pub id: Option<u64>,
    pub name: String,
    pub phone: String,
    pub email: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub is_active: bool,
}

impl From<User> for PublicUser {
    fn from(u: User) -> Self {
        Self {
            id: u.id,
            name: u.name,
            phone: u.phone,
            email: u.email,
            city: u.city,
            address: u.address,
            profile: u.profile,
            created_at: u.created_at,
            updated_at: u.updated_at,
            is_active: u.is_active,
        }
    }
}
