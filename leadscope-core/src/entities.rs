//! Lead entities as returned by the `/leads/combined-data` endpoint.

use serde::{Deserialize, Serialize};

/// A scraped or pending lead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lead {
    pub id: String,
    pub domain: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scraper_progress_id: String,
    #[serde(default)]
    pub scraped: bool,
    #[serde(default)]
    pub google_done: bool,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// Industry a lead has been classified under.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Industry {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Email {
    pub id: String,
    pub lead_id: String,
    pub email: String,
    #[serde(default)]
    pub page_source: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phone {
    pub id: String,
    pub lead_id: String,
    pub phone: String,
    #[serde(default)]
    pub page_source: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Social {
    pub id: String,
    pub lead_id: String,
    pub platform: String,
    pub handle: String,
    #[serde(default)]
    pub page_source: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub updated_at: String,
}

/// A lead together with its industry and every contact found for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeadWithContacts {
    #[serde(flatten)]
    pub lead: Lead,
    #[serde(default)]
    pub industry: Option<Industry>,
    #[serde(default)]
    pub emails: Vec<Email>,
    #[serde(default)]
    pub phones: Vec<Phone>,
    #[serde(default)]
    pub socials: Vec<Social>,
}

impl LeadWithContacts {
    /// Build a contact-less entry, mostly useful for fixtures.
    pub fn bare(lead: Lead) -> Self {
        Self {
            lead,
            industry: None,
            emails: Vec::new(),
            phones: Vec::new(),
            socials: Vec::new(),
        }
    }

    pub fn id(&self) -> &str {
        &self.lead.id
    }

    /// Total number of contact points (emails, phones and socials).
    pub fn contact_count(&self) -> usize {
        self.emails.len() + self.phones.len() + self.socials.len()
    }
}
