use serde::{Deserialize, Deserializer, Serialize};
use time::OffsetDateTime;

/// Which side of the marketplace a user is on.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "job")]
    JobSeeker,
    #[serde(rename = "hire")]
    Employer,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::JobSeeker => "job",
            Role::Employer => "hire",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Profile of someone looking for work.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct JobSeekerDetails {
    pub aadhaar: String,
    #[serde(default)]
    pub age: Option<u8>,
    pub gender: String,
    pub experience: String,
    #[serde(default)]
    pub work_type: Vec<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    #[serde(default)]
    pub expected_salary: Option<u32>,
    #[serde(default)]
    pub availability: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
}

/// Profile of a hiring household or company.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct EmployerDetails {
    pub company_name: String,
    pub company_type: String,
    #[serde(default)]
    pub company_address: String,
    #[serde(default)]
    pub job_postings: Vec<serde_json::Value>,
}

/// Role-specific payload, tagged by `role` in the stored object.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "role")]
pub enum Profile {
    #[serde(rename = "job")]
    JobSeeker(JobSeekerDetails),
    #[serde(rename = "hire")]
    Employer(EmployerDetails),
}

impl Profile {
    pub fn role(&self) -> Role {
        match self {
            Profile::JobSeeker(_) => Role::JobSeeker,
            Profile::Employer(_) => Role::Employer,
        }
    }
}

/// User record as persisted in the records file.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    #[serde(default, deserialize_with = "lenient_id")]
    pub id: Option<u64>,                // None when the stored id is missing or unusable
    pub name: String,
    pub phone: String,                  // canonical 10 digits
    pub password_hash: String,          // argon2 PHC string, salt included
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(flatten)]
    pub profile: Profile,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
    pub is_active: bool,
}

impl User {
    pub fn role(&self) -> Role {
        self.profile.role()
    }
}

/// Accepts positive integers and numeric strings; anything else reads as no id.
fn lenient_id<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(parse_id(&value))
}

fn parse_id(value: &serde_json::Value) -> Option<u64> {
    let id = match value {
        serde_json::Value::Number(n) => n.as_u64(),
        serde_json::Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    };
    id.filter(|id| *id > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn stored(id: serde_json::Value) -> serde_json::Value {
        json!({
            "id": id,
            "name": "Ravi",
            "phone": "9876543210",
            "password_hash": "$argon2id$v=19$m=19456,t=2,p=1$c2FsdHNhbHQ$aGFzaGhhc2g",
            "role": "hire",
            "company_name": "Ravi Homes",
            "company_type": "Small Business",
            "created_at": "2024-05-01T10:00:00Z",
            "updated_at": "2024-05-01T10:00:00Z",
            "is_active": true
        })
    }

    #[test]
    fn ids_are_read_leniently() {
        let cases = [
            (json!(7), Some(7)),
            (json!("12"), Some(12)),
            (json!("bad"), None),
            (json!(-1), None),
            (json!(0), None),
            (json!(null), None),
            (json!(2.5), None),
        ];
        for (raw, expected) in cases {
            let user: User = serde_json::from_value(stored(raw.clone())).unwrap();
            assert_eq!(user.id, expected, "id {raw}");
        }
    }

    #[test]
    fn missing_id_reads_as_none() {
        let mut raw = stored(json!(1));
        raw.as_object_mut().unwrap().remove("id");
        let user: User = serde_json::from_value(raw).unwrap();
        assert_eq!(user.id, None);
    }

    #[test]
    fn role_tag_selects_the_payload() {
        let user: User = serde_json::from_value(stored(json!(3))).unwrap();
        assert_eq!(user.role(), Role::Employer);
        match &user.profile {
            Profile::Employer(details) => {
                assert_eq!(details.company_name, "Ravi Homes");
                assert!(details.job_postings.is_empty());
            }
            other => panic!("unexpected profile {other:?}"),
        }

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["role"], "hire");
        assert_eq!(json["company_type"], "Small Business");
    }

    #[test]
    fn unknown_role_is_rejected() {
        let mut raw = stored(json!(1));
        raw["role"] = json!("admin");
        assert!(serde_json::from_value::<User>(raw).is_err());
    }
}
