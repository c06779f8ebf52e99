use time::OffsetDateTime;

use crate::users::{
    dto::{EmployerForm, JobSeekerForm, RegisterRequest, RoleForm},
    repo_types::{EmployerDetails, JobSeekerDetails, Profile, User},
    validate::{normalize_aadhaar, normalize_phone},
};

fn clean(value: &str) -> String {
    value.trim().to_string()
}

fn clean_opt(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Trimmed, de-duplicated, without blank entries; keeps the first-seen order.
fn clean_set(values: Vec<String>) -> Vec<String> {
    let mut out: Vec<String> = Vec::with_capacity(values.len());
    for v in values {
        let v = v.trim();
        if !v.is_empty() && !out.iter().any(|seen| seen == v) {
            out.push(v.to_string());
        }
    }
    out
}

/// Normalizes raw form input. The password is left exactly as typed.
pub fn sanitize(req: RegisterRequest) -> RegisterRequest {
    let form = match req.form {
        RoleForm::JobSeeker(f) => RoleForm::JobSeeker(JobSeekerForm {
            aadhaar: clean(&f.aadhaar),
            age: f.age,
            gender: clean(&f.gender),
            experience: clean(&f.experience),
            work_type: clean_set(f.work_type),
            skills: clean_set(f.skills),
            expected_salary: f.expected_salary,
            availability: clean_set(f.availability),
            languages: clean_set(f.languages),
        }),
        RoleForm::Employer(f) => RoleForm::Employer(EmployerForm {
            company_name: clean(&f.company_name),
            company_type: clean(&f.company_type),
            company_address: clean(&f.company_address),
        }),
    };

    RegisterRequest {
        name: clean(&req.name),
        phone: clean(&req.phone),
        password: req.password,
        confirm_password: req.confirm_password,
        email: clean_opt(req.email).map(|e| e.to_lowercase()),
        city: clean_opt(req.city),
        address: clean_opt(req.address),
        form,
    }
}

/// Assembles a complete record from sanitized, validated input.
///
/// Phone and Aadhaar are stored in canonical digit form when they parse;
/// otherwise the sanitized value is kept as-is.
pub fn build_record(req: RegisterRequest, password_hash: String, id: u64, now: OffsetDateTime) -> User {
    let profile = match req.form {
        RoleForm::JobSeeker(f) => Profile::JobSeeker(JobSeekerDetails {
            aadhaar: normalize_aadhaar(&f.aadhaar).unwrap_or(f.aadhaar),
            age: f.age,
            gender: f.gender,
            experience: f.experience,
            work_type: f.work_type,
            skills: f.skills,
            expected_salary: f.expected_salary,
            availability: f.availability,
            languages: f.languages,
        }),
        RoleForm::Employer(f) => Profile::Employer(EmployerDetails {
            company_name: f.company_name,
            company_type: f.company_type,
            company_address: f.company_address,
            job_postings: Vec::new(),
        }),
    };

    User {
        id: Some(id),
        phone: normalize_phone(&req.phone).unwrap_or(req.phone),
        name: req.name,
        password_hash,
        email: req.email,
        city: req.city,
        address: req.address,
        profile,
        created_at: now,
        updated_at: now,
        is_active: true,
    }
}
