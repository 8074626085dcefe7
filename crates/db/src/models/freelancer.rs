use gigsync_core::platform::FreelancerProfile;
use gigsync_core::status::FreelancerStatus;
use gigsync_core::types::{EntityId, OrgId, Timestamp};
use serde::{Deserialize, Serialize};

/// A row from the `freelancers` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Freelancer {
    pub id: EntityId,
    pub organization_id: OrgId,
    pub full_name: String,
    pub email: String,
    pub headline: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub country: Option<String>,
    pub status: FreelancerStatus,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Freelancer {
    /// The data pushed to platforms on account creation / update.
    pub fn profile(&self) -> FreelancerProfile {
        FreelancerProfile {
            entity_id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
            headline: self.headline.clone(),
            skills: self.skills.clone(),
            country: self.country.clone(),
        }
    }
}

/// DTO for creating a new freelancer.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateFreelancer {
    pub organization_id: OrgId,
    pub full_name: String,
    pub email: String,
    pub headline: Option<String>,
    #[serde(default)]
    pub skills: Vec<String>,
    pub country: Option<String>,
}
