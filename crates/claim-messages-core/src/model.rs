use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessageType {
    Error,
    Warning,
}

impl MessageType {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "ERROR",
            Self::Warning => "WARNING",
        }
    }

    /// Case-insensitive parse of the upstream type name.
    #[must_use]
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ERROR" => Some(Self::Error),
            "WARNING" => Some(Self::Warning),
            _ => None,
        }
    }
}

/// Whether a page of messages concerns the submission as a whole or individual claims.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Hash)]
#[serde(rename_all = "UPPERCASE")]
pub enum MessagesSource {
    Submission,
    Claim,
    None,
}

/// One validation message as reported by the claims-data service.
///
/// A message without a `claim_id` is submission-level.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct ValidationMessage {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Uuid>,
    pub submission_id: Uuid,
    #[serde(default)]
    pub claim_id: Option<Uuid>,
    #[serde(rename = "type")]
    pub message_type: MessageType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    pub display_message: String,
}

impl ValidationMessage {
    /// The claim this message refers to, if it is claim-level.
    #[must_use]
    pub fn claim_ref(&self) -> Option<ClaimRef> {
        self.claim_id.map(|claim_id| ClaimRef { submission_id: self.submission_id, claim_id })
    }
}

/// Page metadata exactly as the upstream service reported it; any field may be missing.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct PartialPageDescriptor {
    pub number: Option<i64>,
    pub size: Option<i64>,
    pub total_elements: Option<i64>,
    pub total_pages: Option<i64>,
}

/// One page of the validation-message query response.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct ValidationMessagesPage {
    #[serde(default)]
    pub content: Vec<ValidationMessage>,
    #[serde(default)]
    pub total_elements: Option<i64>,
    #[serde(default)]
    pub total_claims: Option<i64>,
    #[serde(default)]
    pub number: Option<i64>,
    #[serde(default)]
    pub size: Option<i64>,
    #[serde(default)]
    pub total_pages: Option<i64>,
}

impl ValidationMessagesPage {
    #[must_use]
    pub fn page_descriptor(&self) -> PartialPageDescriptor {
        PartialPageDescriptor {
            number: self.number,
            size: self.size,
            total_elements: self.total_elements,
            total_pages: self.total_pages,
        }
    }
}

/// Filters for one validation-message page request.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct MessageQuery {
    pub submission_id: Uuid,
    pub claim_id: Option<Uuid>,
    pub message_type: Option<MessageType>,
    pub source: Option<String>,
    pub page: Option<i32>,
    pub size: Option<i32>,
}

impl MessageQuery {
    #[must_use]
    pub fn for_submission(submission_id: Uuid) -> Self {
        Self {
            submission_id,
            claim_id: None,
            message_type: None,
            source: None,
            page: None,
            size: None,
        }
    }
}

/// Key of one claim lookup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct ClaimRef {
    pub submission_id: Uuid,
    pub claim_id: Uuid,
}

/// Display fields of one claim.
///
/// `ClaimDetail::default()` is the empty detail used whenever a claim cannot
/// or need not be resolved.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Eq, PartialEq)]
pub struct ClaimDetail {
    #[serde(default, rename = "id")]
    pub claim_id: Option<Uuid>,
    #[serde(default)]
    pub submission_id: Option<Uuid>,
    #[serde(default)]
    pub unique_file_number: Option<String>,
    #[serde(default)]
    pub unique_client_number: Option<String>,
    #[serde(default)]
    pub client_forename: Option<String>,
    #[serde(default)]
    pub client_surname: Option<String>,
    #[serde(default)]
    pub client_2_forename: Option<String>,
    #[serde(default)]
    pub client_2_surname: Option<String>,
    #[serde(default)]
    pub client_2_ucn: Option<String>,
    #[serde(default)]
    pub crime_matter_type_code: Option<String>,
}

impl ClaimDetail {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

/// One display row: a validation message joined with its claim's display fields.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct MessageRow {
    pub submission_reference: Uuid,
    pub claim_reference: Option<Uuid>,
    pub ufn: Option<String>,
    pub ucn: Option<String>,
    pub client: Option<String>,
    pub client_forename: Option<String>,
    pub client_surname: Option<String>,
    pub client_2_forename: Option<String>,
    pub client_2_surname: Option<String>,
    pub client_2_ucn: Option<String>,
    pub crime_matter_type_code: Option<String>,
    pub message: String,
    #[serde(rename = "type")]
    pub message_type: MessageType,
}

/// Canonical page metadata handed to the view layer.
///
/// `size` is always positive; `total_pages` is derived from `total_elements`
/// when the upstream service did not report it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Eq, PartialEq)]
pub struct PageDescriptor {
    pub number: u32,
    pub size: u32,
    pub total_elements: u64,
    pub total_pages: u64,
}

/// Everything the view layer needs to render one page of validation messages.
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
pub struct AggregationResult {
    pub rows: Vec<MessageRow>,
    pub total_message_count: u64,
    pub total_claims_with_messages: u64,
    pub pagination: PageDescriptor,
    pub messages_source: MessagesSource,
}

impl AggregationResult {
    /// Number of ERROR rows on this page.
    #[must_use]
    pub fn error_count(&self) -> usize {
        self.rows.iter().filter(|row| row.message_type == MessageType::Error).count()
    }

    #[must_use]
    pub fn contains_errors(&self) -> bool {
        self.error_count() > 0
    }
}
