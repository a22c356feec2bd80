use std::fmt;
use std::path::PathBuf;

use chrono::{Datelike, NaiveDate};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::lifecycle::InvoiceState;

/// SdI routing code used when the counterparty receives invoices by PEC
/// or through the tax authority's reserved area.
pub const DEFAULT_SDI_CODE: &str = "0000000";

/// Stable identifier of a registry contact, assigned on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ContactId(pub u64);

impl fmt::Display for ContactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "C{:04}", self.0)
    }
}

/// Stable identifier of a stored invoice, assigned on insert.
///
/// Unlike a row position it survives deletions of other invoices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InvoiceId(pub u64);

impl fmt::Display for InvoiceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "D{:04}", self.0)
    }
}

/// Role of a registry contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContactKind {
    #[default]
    Client,
    Supplier,
}

impl ContactKind {
    /// Italian label used in tables and on screen.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Client => "Cliente",
            Self::Supplier => "Fornitore",
        }
    }

    /// Parse from the Italian label (case-insensitive).
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_lowercase().as_str() {
            "cliente" => Some(Self::Client),
            "fornitore" => Some(Self::Supplier),
            _ => None,
        }
    }
}

/// Postal address (Sede).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Address {
    /// Street and house number (Indirizzo).
    pub street: String,
    /// Postal code (CAP).
    pub postal_code: String,
    /// Municipality (Comune).
    pub municipality: String,
    /// Two-letter province abbreviation (Provincia).
    pub province: String,
    /// ISO 3166-1 alpha-2 country code (Nazione).
    pub country_code: String,
}

impl Default for Address {
    fn default() -> Self {
        Self {
            street: String::new(),
            postal_code: String::new(),
            municipality: String::new(),
            province: String::new(),
            country_code: "IT".into(),
        }
    }
}

impl Address {
    /// Second address line as printed on documents: "20121 Milano (MI)".
    pub fn locality_line(&self) -> String {
        let mut out = String::new();
        if !self.postal_code.is_empty() {
            out.push_str(&self.postal_code);
            out.push(' ');
        }
        out.push_str(&self.municipality);
        if !self.province.is_empty() {
            out.push_str(&format!(" ({})", self.province));
        }
        out.trim().to_string()
    }
}

/// Mutable details of a contact; everything except the identity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContactDetails {
    /// Partita IVA.
    pub vat_number: Option<String>,
    /// Codice fiscale.
    pub fiscal_code: Option<String>,
    pub address: Address,
    /// Codice destinatario; `None` means [`DEFAULT_SDI_CODE`].
    pub sdi_code: Option<String>,
    /// Certified e-mail (PEC).
    pub pec: Option<String>,
    pub email: Option<String>,
    /// `None` keeps the current kind on update and means Client on insert.
    pub kind: Option<ContactKind>,
}

/// Client or supplier record held by the registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    pub id: ContactId,
    /// Denominazione / ragione sociale.
    pub denomination: String,
    pub vat_number: Option<String>,
    pub fiscal_code: Option<String>,
    pub address: Address,
    /// Seven-character SdI routing code.
    pub sdi_code: String,
    pub pec: Option<String>,
    pub email: Option<String>,
    pub kind: ContactKind,
}

impl Contact {
    /// VAT number if present, otherwise the fiscal code.
    pub fn tax_id(&self) -> Option<&str> {
        non_blank(&self.vat_number).or_else(|| non_blank(&self.fiscal_code))
    }

    /// Snapshot of the mutable fields, e.g. to pre-fill an edit form.
    pub fn details(&self) -> ContactDetails {
        ContactDetails {
            vat_number: self.vat_number.clone(),
            fiscal_code: self.fiscal_code.clone(),
            address: self.address.clone(),
            sdi_code: Some(self.sdi_code.clone()),
            pec: self.pec.clone(),
            email: self.email.clone(),
            kind: Some(self.kind),
        }
    }
}

pub(crate) fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Legal form of the issuing business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum LegalForm {
    #[default]
    LegalPerson,
    NaturalPerson,
    Other,
}

impl LegalForm {
    pub fn label(&self) -> &'static str {
        match self {
            Self::LegalPerson => "PERSONA GIURIDICA",
            Self::NaturalPerson => "PERSONA FISICA",
            Self::Other => "ALTRO",
        }
    }
}

/// Regime fiscale codes accepted for the issuer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TaxRegime {
    /// RF01: Ordinario.
    #[default]
    Ordinary,
    /// RF02: Contribuenti minimi.
    Minimum,
    /// RF04: Agricoltura e attività connesse.
    Agriculture,
    /// RF05: Vendita sali e tabacchi.
    SaltAndTobacco,
    /// RF06: Commercio fiammiferi.
    Matches,
    /// RF12: Regime speciale agenzie viaggi.
    TravelAgencies,
    /// RF13: Agriturismo.
    FarmHolidays,
    /// RF18: Altro.
    Other,
    /// RF19: Forfetario.
    Flat,
}

impl TaxRegime {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ordinary => "RF01",
            Self::Minimum => "RF02",
            Self::Agriculture => "RF04",
            Self::SaltAndTobacco => "RF05",
            Self::Matches => "RF06",
            Self::TravelAgencies => "RF12",
            Self::FarmHolidays => "RF13",
            Self::Other => "RF18",
            Self::Flat => "RF19",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Ordinary => "Ordinario",
            Self::Minimum => "Contribuenti minimi",
            Self::Agriculture => "Agricoltura e attività connesse",
            Self::SaltAndTobacco => "Vendita sali e tabacchi",
            Self::Matches => "Commercio fiammiferi",
            Self::TravelAgencies => "Regime speciale agenzie viaggi",
            Self::FarmHolidays => "Agriturismo",
            Self::Other => "Altro",
            Self::Flat => "Forfetario",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "RF01" => Some(Self::Ordinary),
            "RF02" => Some(Self::Minimum),
            "RF04" => Some(Self::Agriculture),
            "RF05" => Some(Self::SaltAndTobacco),
            "RF06" => Some(Self::Matches),
            "RF12" => Some(Self::TravelAgencies),
            "RF13" => Some(Self::FarmHolidays),
            "RF18" => Some(Self::Other),
            "RF19" => Some(Self::Flat),
            _ => None,
        }
    }
}

/// The practice issuing the invoices (cedente/prestatore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Issuer {
    pub denomination: String,
    pub legal_form: LegalForm,
    pub vat_number: String,
    pub fiscal_code: Option<String>,
    pub tax_regime: TaxRegime,
    pub address: Address,
    pub pec: Option<String>,
    pub sdi_code: Option<String>,
}

impl Issuer {
    pub fn new(
        denomination: impl Into<String>,
        vat_number: impl Into<String>,
        address: Address,
    ) -> Self {
        Self {
            denomination: denomination.into(),
            legal_form: LegalForm::default(),
            vat_number: vat_number.into(),
            fiscal_code: None,
            tax_regime: TaxRegime::default(),
            address,
            pec: None,
            sdi_code: None,
        }
    }
}

/// VAT rates accepted on invoice lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VatRate {
    /// 22%: aliquota ordinaria.
    Standard,
    /// 10%: aliquota ridotta.
    Reduced10,
    /// 5%: aliquota ridotta.
    Reduced5,
    /// 4%: aliquota minima.
    Minimum4,
    /// 0%: requires a [`VatNature`] in the XML.
    Zero,
}

impl VatRate {
    pub const ALL: [VatRate; 5] = [
        VatRate::Standard,
        VatRate::Reduced10,
        VatRate::Reduced5,
        VatRate::Minimum4,
        VatRate::Zero,
    ];

    pub fn percent(&self) -> Decimal {
        match self {
            Self::Standard => dec!(22),
            Self::Reduced10 => dec!(10),
            Self::Reduced5 => dec!(5),
            Self::Minimum4 => dec!(4),
            Self::Zero => Decimal::ZERO,
        }
    }

    /// Parse from a percentage such as `22`, `22.00` or `4`.
    pub fn from_percent(percent: Decimal) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|r| r.percent() == percent.normalize())
    }
}

/// Natura codes explaining why a zero-rated line carries no VAT.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum VatNature {
    /// N1: escluse ex art. 15.
    Excluded,
    /// N2.1: non soggette ex artt. da 7 a 7-septies.
    NotSubjectTerritorial,
    /// N2.2: non soggette, altri casi.
    NotSubjectOther,
    /// N3.1: non imponibili, esportazioni.
    NonTaxableExport,
    /// N3.2: non imponibili, cessioni intracomunitarie.
    NonTaxableIntraCommunity,
    /// N4: esenti.
    Exempt,
    /// N5: regime del margine.
    MarginScheme,
    /// N6.9: inversione contabile, altri casi.
    ReverseCharge,
    /// N7: IVA assolta in altro stato UE.
    OtherEuState,
}

impl VatNature {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Excluded => "N1",
            Self::NotSubjectTerritorial => "N2.1",
            Self::NotSubjectOther => "N2.2",
            Self::NonTaxableExport => "N3.1",
            Self::NonTaxableIntraCommunity => "N3.2",
            Self::Exempt => "N4",
            Self::MarginScheme => "N5",
            Self::ReverseCharge => "N6.9",
            Self::OtherEuState => "N7",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "N1" => Some(Self::Excluded),
            "N2.1" => Some(Self::NotSubjectTerritorial),
            "N2.2" => Some(Self::NotSubjectOther),
            "N3.1" => Some(Self::NonTaxableExport),
            "N3.2" => Some(Self::NonTaxableIntraCommunity),
            "N4" => Some(Self::Exempt),
            "N5" => Some(Self::MarginScheme),
            "N6.9" => Some(Self::ReverseCharge),
            "N7" => Some(Self::OtherEuState),
            _ => None,
        }
    }
}

/// A single invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub vat_rate: VatRate,
    /// Only meaningful for [`VatRate::Zero`].
    pub nature: Option<VatNature>,
}

impl InvoiceLine {
    pub fn new(
        description: impl Into<String>,
        quantity: Decimal,
        unit_price: Decimal,
        vat_rate: VatRate,
    ) -> Self {
        Self {
            description: description.into(),
            quantity,
            unit_price,
            vat_rate,
            nature: None,
        }
    }

    pub fn with_nature(mut self, nature: VatNature) -> Self {
        self.nature = Some(nature);
        self
    }

    /// Nature code that applies to this line: the explicit one for zero-rated
    /// lines, N2.2 when none was given, nothing for taxed lines.
    pub fn effective_nature(&self) -> Option<VatNature> {
        match self.vat_rate {
            VatRate::Zero => Some(self.nature.unwrap_or(VatNature::NotSubjectOther)),
            _ => None,
        }
    }
}

/// FatturaPA TipoDocumento codes handled by the practice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DocumentType {
    /// TD01: Fattura.
    #[default]
    Invoice,
    /// TD02: Acconto/anticipo su fattura.
    Advance,
    /// TD04: Nota di credito.
    CreditNote,
    /// TD05: Nota di debito.
    DebitNote,
}

impl DocumentType {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Invoice => "TD01",
            Self::Advance => "TD02",
            Self::CreditNote => "TD04",
            Self::DebitNote => "TD05",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code.trim().to_uppercase().as_str() {
            "TD01" => Some(Self::Invoice),
            "TD02" => Some(Self::Advance),
            "TD04" => Some(Self::CreditNote),
            "TD05" => Some(Self::DebitNote),
            _ => None,
        }
    }

    /// Title printed on the courtesy copy.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Invoice => "FATTURA",
            Self::Advance => "ACCONTO/ANTICIPO SU FATTURA",
            Self::CreditNote => "NOTA DI CREDITO",
            Self::DebitNote => "NOTA DI DEBITO",
        }
    }
}

/// ModalitaPagamento codes offered on the invoice form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum PaymentMethod {
    /// MP01.
    Cash,
    /// MP02.
    Cheque,
    /// MP05.
    #[default]
    BankTransfer,
    /// MP08.
    Card,
}

impl PaymentMethod {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Cash => "MP01",
            Self::Cheque => "MP02",
            Self::BankTransfer => "MP05",
            Self::Card => "MP08",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Cash => "Contanti",
            Self::Cheque => "Assegno",
            Self::BankTransfer => "Bonifico bancario",
            Self::Card => "Carta di pagamento",
        }
    }
}

/// Payment terms printed on the PDF and written to DatiPagamento.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    pub method: PaymentMethod,
    pub iban: Option<String>,
    pub due_date: Option<NaiveDate>,
}

/// Unrounded taxable and tax amounts of one line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LineTotals {
    pub taxable: Decimal,
    pub tax: Decimal,
}

/// DatiRiepilogo: totals for one (rate, nature) group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VatSummary {
    pub rate: VatRate,
    pub nature: Option<VatNature>,
    /// Rounded to cents.
    pub taxable: Decimal,
    /// Rounded to cents.
    pub tax: Decimal,
}

/// Invoice totals as stored and rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Sum of the group taxable amounts.
    pub taxable: Decimal,
    /// Sum of the group tax amounts.
    pub tax: Decimal,
    /// Flat stamp duty (bollo), zero when not applied.
    pub stamp_duty: Decimal,
    /// taxable + tax + stamp_duty.
    pub total: Decimal,
    pub vat_summary: Vec<VatSummary>,
}

/// An issued document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub doc_type: DocumentType,
    /// `FT<year><seq>`, e.g. "FT2025007".
    pub number: String,
    pub issue_date: NaiveDate,
    /// Registry contact the invoice is addressed to.
    pub counterparty: ContactId,
    /// Denomination as printed on the document.
    pub counterparty_name: String,
    pub lines: Vec<InvoiceLine>,
    /// Causale.
    pub notes: Option<String>,
    pub payment: Payment,
    pub totals: Totals,
    pub state: InvoiceState,
    /// External reference, filled only by flows that need one.
    pub uuid: Option<Uuid>,
    /// Location of the rendered courtesy copy.
    pub pdf_path: Option<PathBuf>,
}

impl Invoice {
    pub fn year(&self) -> i32 {
        self.issue_date.year()
    }

    pub fn month(&self) -> u32 {
        self.issue_date.month()
    }
}
