use thiserror::Error;
use time::OffsetDateTime;
use tracing::{debug, warn};

use crate::storage::{StoreError, UserStore};
use crate::users::{
    builder::{build_record, sanitize},
    dto::{LoginMethod, RegisterRequest, RoleForm},
    password::{hash_password, verify_password},
    repo::{filter_by_field, Field},
    repo_types::{Role, User},
    validate::{
        is_option, normalize_phone, validate_aadhaar, validate_email, validate_password,
        validate_phone, PasswordViolation, AGE_RANGE, AVAILABILITY_OPTIONS, COMPANY_TYPES,
        EXPERIENCE_LEVELS, GENDERS, SALARY_RANGE, WORK_TYPES,
    },
};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Missing required field: {0}")]
    MissingField(&'static str),
    #[error("Passwords do not match.")]
    PasswordMismatch,
    #[error("Invalid {field}: {value}")]
    InvalidOption { field: &'static str, value: String },
    #[error("Age must be between 16 and 70.")]
    InvalidAge,
    #[error("Expected salary must be between 5000 and 50000.")]
    InvalidSalary,
    #[error("Invalid Aadhaar Number. Must be exactly 12 digits.")]
    InvalidAadhaar,
    #[error("Invalid Phone Number. Must be exactly 10 digits.")]
    InvalidPhone,
    #[error("Invalid email format")]
    InvalidEmail,
    #[error(transparent)]
    WeakPassword(#[from] PasswordViolation),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Duplicate {
    #[error("Phone number already registered")]
    Phone,
    #[error("Email already registered")]
    Email,
}

#[derive(Debug, Error)]
pub enum RegisterError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Duplicate(Duplicate),
    #[error("failed to hash password: {0}")]
    Hash(anyhow::Error),
    #[error("failed to save user data: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for RegisterError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::DuplicatePhone => RegisterError::Duplicate(Duplicate::Phone),
            StoreError::DuplicateEmail => RegisterError::Duplicate(Duplicate::Email),
            other => RegisterError::Storage(other),
        }
    }
}

fn require(value: &str, field: &'static str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::MissingField(field));
    }
    Ok(())
}

fn require_option(options: &[&str], value: &str, field: &'static str) -> Result<(), ValidationError> {
    require(value, field)?;
    if !is_option(options, value) {
        return Err(ValidationError::InvalidOption {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

fn require_options(
    options: &[&str],
    values: &[String],
    field: &'static str,
) -> Result<(), ValidationError> {
    match values.iter().find(|v| !is_option(options, v)) {
        Some(value) => Err(ValidationError::InvalidOption {
            field,
            value: value.clone(),
        }),
        None => Ok(()),
    }
}

/// Checks sanitized input against the registration rules, stopping at the first failure.
pub fn validate_registration(req: &RegisterRequest) -> Result<(), ValidationError> {
    require(&req.name, "name")?;
    require(&req.phone, "phone")?;
    require(&req.password, "password")?;
    match &req.form {
        RoleForm::JobSeeker(f) => {
            require(&f.aadhaar, "aadhaar")?;
            require(&f.gender, "gender")?;
            require(&f.experience, "experience")?;
            if f.work_type.is_empty() {
                return Err(ValidationError::MissingField("work_type"));
            }
            if f.availability.is_empty() {
                return Err(ValidationError::MissingField("availability"));
            }
        }
        RoleForm::Employer(f) => {
            require(&f.company_name, "company_name")?;
            require(&f.company_type, "company_type")?;
        }
    }

    if let Some(confirm) = &req.confirm_password {
        if *confirm != req.password {
            return Err(ValidationError::PasswordMismatch);
        }
    }

    match &req.form {
        RoleForm::JobSeeker(f) => {
            require_option(GENDERS, &f.gender, "gender")?;
            require_option(EXPERIENCE_LEVELS, &f.experience, "experience")?;
            require_options(WORK_TYPES, &f.work_type, "work_type")?;
            require_options(AVAILABILITY_OPTIONS, &f.availability, "availability")?;
            if f.age.is_some_and(|age| !AGE_RANGE.contains(&age)) {
                return Err(ValidationError::InvalidAge);
            }
            if f.expected_salary.is_some_and(|salary| !SALARY_RANGE.contains(&salary)) {
                return Err(ValidationError::InvalidSalary);
            }
            if !validate_aadhaar(&f.aadhaar) {
                return Err(ValidationError::InvalidAadhaar);
            }
        }
        RoleForm::Employer(f) => {
            require_option(COMPANY_TYPES, &f.company_type, "company_type")?;
        }
    }

    if !validate_phone(&req.phone) {
        return Err(ValidationError::InvalidPhone);
    }
    if let Some(email) = &req.email {
        if !validate_email(email) {
            return Err(ValidationError::InvalidEmail);
        }
    }
    if let Some(violation) = validate_password(&req.password) {
        return Err(violation.into());
    }
    Ok(())
}

/// Validates, hashes and stores a new user. Nothing is written unless every check passes.
pub async fn register(store: &dyn UserStore, raw: RegisterRequest) -> Result<User, RegisterError> {
    let req = sanitize(raw);
    let role = req.form.role();

    if let Err(e) = validate_registration(&req) {
        warn!(%role, error = %e, "registration rejected");
        return Err(e.into());
    }

    let password_hash = hash_password(&req.password).map_err(RegisterError::Hash)?;
    let now = OffsetDateTime::now_utc();

    let user = store
        .insert(Box::new(move |id| build_record(req, password_hash, id, now)))
        .await?;
    debug!(user_id = ?user.id, %role, "record stored");
    Ok(user)
}

/// First record of `role` whose identifier and password both match, if any.
pub async fn authenticate(
    store: &dyn UserStore,
    method: LoginMethod,
    identifier: &str,
    password: &str,
    role: Role,
) -> Option<User> {
    let identifier = identifier.trim();
    if identifier.is_empty() || password.is_empty() {
        return None;
    }
    let (field, key) = match method {
        LoginMethod::Phone => (Field::Phone, normalize_phone(identifier)?),
        LoginMethod::Name => (Field::Name, identifier.to_string()),
    };

    let users = store.load().await;
    let found = filter_by_field(&users, field, &key)
        .filter(|u| u.role() == role)
        .find(|u| match verify_password(password, &u.password_hash) {
            Ok(ok) => ok,
            Err(e) => {
                warn!(user_id = ?u.id, error = %e, "stored password hash unreadable");
                false
            }
        })
        .cloned();
    found
}
