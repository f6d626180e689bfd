//! Saved delivery addresses.

use serde::{Deserialize, Serialize};

use bazaar_core::AddressId;

/// A saved address belonging to one user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: AddressId,
    /// Label such as "home" or "office"; unique per user.
    pub address_type: String,
    pub country: String,
    pub city: String,
    pub address1: String,
    pub address2: Option<String>,
    pub zip_code: String,
}

/// Address fields as submitted by the client.
///
/// With `id` set the matching saved address is replaced; without it a new
/// address is added.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressInput {
    #[serde(default)]
    pub id: Option<AddressId>,
    pub address_type: String,
    pub country: String,
    pub city: String,
    pub address1: String,
    #[serde(default)]
    pub address2: Option<String>,
    pub zip_code: String,
}

impl AddressInput {
    /// Trim every field and reject blank required ones.
    ///
    /// # Errors
    ///
    /// Returns the name of the first required field that is blank.
    pub fn normalized(&self) -> Result<Self, &'static str> {
        fn required(value: &str, field: &'static str) -> Result<String, &'static str> {
            let value = value.trim();
            if value.is_empty() {
                Err(field)
            } else {
                Ok(value.to_owned())
            }
        }

        Ok(Self {
            id: self.id,
            address_type: required(&self.address_type, "addressType")?,
            country: required(&self.country, "country")?,
            city: required(&self.city, "city")?,
            address1: required(&self.address1, "address1")?,
            address2: self
                .address2
                .as_deref()
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_owned),
            zip_code: required(&self.zip_code, "zipCode")?,
        })
    }

    /// Build the saved form under `id`.
    #[must_use]
    pub fn into_address(self, id: AddressId) -> Address {
        Address {
            id,
            address_type: self.address_type,
            country: self.country,
            city: self.city,
            address1: self.address1,
            address2: self.address2,
            zip_code: self.zip_code,
        }
    }
}
