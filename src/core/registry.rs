use serde::{Deserialize, Serialize};

use super::error::{FatturaError, ValidationError};
use super::types::*;

/// Client/supplier registry (rubrica).
///
/// Contacts get a stable [`ContactId`] on insert. Lookups by denomination
/// are exact and case-sensitive, so "Acme Srl" and "ACME SRL" are two
/// different contacts.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContactRegistry {
    contacts: Vec<Contact>,
    next_id: u64,
}

impl ContactRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a contact, or overwrite the details of the contact with exactly
    /// this denomination. New contacts default to [`ContactKind::Client`];
    /// an existing contact keeps its kind unless `details.kind` is set.
    pub fn upsert(
        &mut self,
        denomination: &str,
        details: ContactDetails,
    ) -> Result<ContactId, FatturaError> {
        if denomination.trim().is_empty() {
            return Err(FatturaError::Validation(
                ValidationError::new("denomination", "denomination must not be empty").to_string(),
            ));
        }
        if let Some(code) = &details.sdi_code {
            validate_sdi_code(code)?;
        }

        if let Some(existing) = self
            .contacts
            .iter_mut()
            .find(|c| c.denomination == denomination)
        {
            existing.vat_number = details.vat_number;
            existing.fiscal_code = details.fiscal_code;
            existing.address = details.address;
            existing.sdi_code = details
                .sdi_code
                .unwrap_or_else(|| DEFAULT_SDI_CODE.to_string());
            existing.pec = details.pec;
            existing.email = details.email;
            if let Some(kind) = details.kind {
                existing.kind = kind;
            }
            tracing::debug!(contact_id = %existing.id, denomination, "contact updated");
            return Ok(existing.id);
        }

        self.next_id += 1;
        let id = ContactId(self.next_id);
        self.contacts.push(Contact {
            id,
            denomination: denomination.to_string(),
            vat_number: details.vat_number,
            fiscal_code: details.fiscal_code,
            address: details.address,
            sdi_code: details
                .sdi_code
                .unwrap_or_else(|| DEFAULT_SDI_CODE.to_string()),
            pec: details.pec,
            email: details.email,
            kind: details.kind.unwrap_or_default(),
        });
        tracing::debug!(contact_id = %id, denomination, "contact created");
        Ok(id)
    }

    /// Exact-match lookup. Absence is not an error.
    pub fn lookup_by_denomination(&self, name: &str) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.denomination == name)
    }

    pub fn get(&self, id: ContactId) -> Option<&Contact> {
        self.contacts.iter().find(|c| c.id == id)
    }

    /// Rename or otherwise edit a contact through its stable id.
    pub fn get_mut(&mut self, id: ContactId) -> Option<&mut Contact> {
        self.contacts.iter_mut().find(|c| c.id == id)
    }

    /// Contacts whose kind is in `kinds`, in registry order.
    pub fn list_by_kind(&self, kinds: &[ContactKind]) -> Vec<&Contact> {
        self.contacts
            .iter()
            .filter(|c| kinds.contains(&c.kind))
            .collect()
    }

    /// VAT number or fiscal code to show next to a counterparty name.
    pub fn tax_id_display(&self, name: &str) -> Option<&str> {
        self.lookup_by_denomination(name).and_then(Contact::tax_id)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Contact> {
        self.contacts.iter()
    }

    pub fn len(&self) -> usize {
        self.contacts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contacts.is_empty()
    }
}

/// The routing code must be exactly seven alphanumeric characters.
pub fn validate_sdi_code(code: &str) -> Result<(), FatturaError> {
    if code.len() == 7 && code.bytes().all(|b| b.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(FatturaError::Validation(
            ValidationError::new(
                "sdi_code",
                format!("'{code}' must be 7 alphanumeric characters"),
            )
            .to_string(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn milano() -> Address {
        Address {
            street: "Via Roma 1".into(),
            postal_code: "20121".into(),
            municipality: "Milano".into(),
            province: "MI".into(),
            country_code: "IT".into(),
        }
    }

    #[test]
    fn insert_defaults_to_client_and_default_sdi_code() {
        let mut reg = ContactRegistry::new();
        let id = reg
            .upsert(
                "Acme Srl",
                ContactDetails {
                    vat_number: Some("01234567890".into()),
                    ..Default::default()
                },
            )
            .unwrap();
        let c = reg.get(id).unwrap();
        assert_eq!(c.kind, ContactKind::Client);
        assert_eq!(c.sdi_code, DEFAULT_SDI_CODE);
    }

    #[test]
    fn same_denomination_updates_in_place() {
        let mut reg = ContactRegistry::new();
        let first = reg
            .upsert(
                "Acme Srl",
                ContactDetails {
                    kind: Some(ContactKind::Supplier),
                    ..Default::default()
                },
            )
            .unwrap();
        let second = reg
            .upsert(
                "Acme Srl",
                ContactDetails {
                    address: milano(),
                    ..Default::default()
                },
            )
            .unwrap();
        assert_eq!(first, second);
        assert_eq!(reg.len(), 1);
        let c = reg.lookup_by_denomination("Acme Srl").unwrap();
        assert_eq!(c.address.municipality, "Milano");
        // kind not supplied on update: kept
        assert_eq!(c.kind, ContactKind::Supplier);
    }

    #[test]
    fn lookup_is_exact_and_case_sensitive() {
        let mut reg = ContactRegistry::new();
        reg.upsert("Acme Srl", ContactDetails::default()).unwrap();
        assert!(reg.lookup_by_denomination("ACME SRL").is_none());
        assert!(reg.lookup_by_denomination("Acme Srl ").is_none());
        assert!(reg.lookup_by_denomination("Acme Srl").is_some());
    }

    #[test]
    fn empty_denomination_rejected() {
        let mut reg = ContactRegistry::new();
        assert!(reg.upsert("  ", ContactDetails::default()).is_err());
        assert!(reg.is_empty());
    }

    #[test]
    fn bad_sdi_code_rejected() {
        let mut reg = ContactRegistry::new();
        let details = ContactDetails {
            sdi_code: Some("ABC".into()),
            ..Default::default()
        };
        assert!(reg.upsert("Acme Srl", details).is_err());
        assert!(validate_sdi_code("M5UXCR1").is_ok());
    }

    #[test]
    fn list_by_kind_filters() {
        let mut reg = ContactRegistry::new();
        reg.upsert("Cliente Uno", ContactDetails::default()).unwrap();
        reg.upsert(
            "Fornitore Uno",
            ContactDetails {
                kind: Some(ContactKind::Supplier),
                ..Default::default()
            },
        )
        .unwrap();
        let clients = reg.list_by_kind(&[ContactKind::Client]);
        assert_eq!(clients.len(), 1);
        assert_eq!(clients[0].denomination, "Cliente Uno");
        assert_eq!(
            reg.list_by_kind(&[ContactKind::Client, ContactKind::Supplier])
                .len(),
            2
        );
    }

    #[test]
    fn tax_id_display_backfills_from_registry() {
        let mut reg = ContactRegistry::new();
        reg.upsert(
            "Mario Rossi",
            ContactDetails {
                fiscal_code: Some("RSSMRA80A01F205X".into()),
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(reg.tax_id_display("Mario Rossi"), Some("RSSMRA80A01F205X"));
        assert_eq!(reg.tax_id_display("Sconosciuto"), None);
    }
}
