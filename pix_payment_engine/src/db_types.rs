use std::{borrow::Borrow, fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use log::error;
pub use pix_common::Centavos;
use serde::{Deserialize, Serialize};
use thiserror::Error;

//--------------------------------------        UserId         ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub String);

impl<S: Into<String>> From<S> for UserId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl UserId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

//--------------------------------------       PaymentId       ---------------------------------------------------------
/// The internal identifier of a deposit. Generated once, when the deposit is created, and never reused.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PaymentId(pub String);

impl PaymentId {
    pub const PREFIX: &'static str = "pix_";

    pub fn random() -> Self {
        Self(format!("{}{:016x}", Self::PREFIX, rand::random::<u64>()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for PaymentId {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for PaymentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Borrow<str> for PaymentId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Display for PaymentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------      ProcessorId      ---------------------------------------------------------
/// The identifier the payment processor assigned to a charge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ProcessorId(pub String);

impl ProcessorId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S: Into<String>> From<S> for ProcessorId {
    fn from(value: S) -> Self {
        Self(value.into())
    }
}

impl Borrow<str> for ProcessorId {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl Display for ProcessorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------     PaymentStatus     ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    /// The charge has been created and the payer has not completed the transfer yet.
    Pending,
    /// The processor has confirmed the transfer. The owner's account has been credited.
    Approved,
    /// The processor reported a terminal failure (rejected, cancelled, refunded, charged back).
    Rejected,
    /// The charge went unpaid for longer than the configured timeout.
    Expired,
}

impl PaymentStatus {
    /// Reconciliation never needs to ask the processor about a payment in one of these states again.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }
}

impl Display for PaymentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
            Self::Expired => write!(f, "expired"),
        }
    }
}

#[derive(Debug, Clone, Error)]
#[error("Invalid payment status: {0}")]
pub struct ConversionError(String);

impl FromStr for PaymentStatus {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "approved" => Ok(Self::Approved),
            "rejected" => Ok(Self::Rejected),
            "expired" => Ok(Self::Expired),
            s => Err(ConversionError(s.to_string())),
        }
    }
}

impl From<String> for PaymentStatus {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid payment status: {value}. But this conversion cannot fail. Defaulting to pending");
            PaymentStatus::Pending
        })
    }
}

//--------------------------------------    PayablePayload     ---------------------------------------------------------
/// What the payer needs to complete the PIX transfer: the copy-and-paste code, and its QR image.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayablePayload {
    pub qr_code: String,
    pub qr_code_base64: Option<String>,
    pub ticket_url: Option<String>,
}

impl PayablePayload {
    pub fn new<S: Into<String>>(qr_code: S) -> Self {
        Self { qr_code: qr_code.into(), qr_code_base64: None, ticket_url: None }
    }

    pub fn with_image<S: Into<String>>(mut self, qr_code_base64: S) -> Self {
        self.qr_code_base64 = Some(qr_code_base64.into());
        self
    }
}

//--------------------------------------      NewDeposit       ---------------------------------------------------------
#[derive(Debug, Clone)]
pub struct NewDeposit {
    pub id: PaymentId,
    pub user_id: UserId,
    pub amount: Centavos,
    pub payable: Option<PayablePayload>,
    pub status_detail: Option<String>,
}

impl NewDeposit {
    pub fn new(user_id: UserId, amount: Centavos) -> Self {
        Self { id: PaymentId::random(), user_id, amount, payable: None, status_detail: None }
    }

    pub fn with_id(mut self, id: PaymentId) -> Self {
        self.id = id;
        self
    }

    pub fn with_payable(mut self, payable: PayablePayload) -> Self {
        self.payable = Some(payable);
        self
    }

    pub fn with_status_detail<S: Into<String>>(mut self, detail: Option<S>) -> Self {
        self.status_detail = detail.map(Into::into);
        self
    }
}

//--------------------------------------     PaymentRecord     ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub id: PaymentId,
    pub processor_id: Option<ProcessorId>,
    pub user_id: UserId,
    pub amount: Centavos,
    pub status: PaymentStatus,
    pub status_detail: Option<String>,
    pub payable: Option<PayablePayload>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl PaymentRecord {
    pub fn from_new_deposit(deposit: NewDeposit, now: DateTime<Utc>) -> Self {
        Self {
            id: deposit.id,
            processor_id: None,
            user_id: deposit.user_id,
            amount: deposit.amount,
            status: PaymentStatus::Pending,
            status_detail: deposit.status_detail,
            payable: deposit.payable,
            created_at: now,
            updated_at: now,
        }
    }
}

impl Display for PaymentRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let pid = self.processor_id.as_ref().map(|p| p.as_str()).unwrap_or("unbound");
        write!(f, "Payment {} [{pid}] for {} of {} is {}", self.id, self.user_id, self.amount, self.status)
    }
}

//--------------------------------------       EntryType       ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryType {
    Deposit,
    Purchase,
    Withdrawal,
}

impl EntryType {
    pub fn is_credit(&self) -> bool {
        matches!(self, Self::Deposit)
    }
}

impl Display for EntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Deposit => write!(f, "deposit"),
            Self::Purchase => write!(f, "purchase"),
            Self::Withdrawal => write!(f, "withdrawal"),
        }
    }
}

//--------------------------------------     AccountEntry      ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewAccountEntry {
    pub entry_type: EntryType,
    pub amount: Centavos,
    pub reference: Option<String>,
    pub memo: Option<String>,
}

impl NewAccountEntry {
    pub fn deposit(amount: Centavos, payment_id: &PaymentId) -> Self {
        Self { entry_type: EntryType::Deposit, amount, reference: Some(payment_id.to_string()), memo: None }
    }

    pub fn new(entry_type: EntryType, amount: Centavos) -> Self {
        Self { entry_type, amount, reference: None, memo: None }
    }

    pub fn with_memo<S: Into<String>>(mut self, memo: S) -> Self {
        self.memo = Some(memo.into());
        self
    }

    pub fn with_reference<S: Into<String>>(mut self, reference: S) -> Self {
        self.reference = Some(reference.into());
        self
    }
}

/// One line in an account's history. Entries are append-only and never modified.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccountEntry {
    pub entry_type: EntryType,
    pub amount: Centavos,
    pub reference: Option<String>,
    pub memo: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl AccountEntry {
    pub fn from_new_entry(entry: NewAccountEntry, now: DateTime<Utc>) -> Self {
        let NewAccountEntry { entry_type, amount, reference, memo } = entry;
        Self { entry_type, amount, reference, memo, created_at: now }
    }
}

//--------------------------------------        Account        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    pub user_id: UserId,
    pub balance: Centavos,
    pub history: Vec<AccountEntry>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    pub fn new(user_id: UserId) -> Self {
        let now = Utc::now();
        Self { user_id, balance: Centavos::default(), history: Vec::new(), created_at: now, updated_at: now }
    }

    pub fn deposits(&self) -> impl Iterator<Item = &AccountEntry> {
        self.history.iter().filter(|e| e.entry_type == EntryType::Deposit)
    }
}
