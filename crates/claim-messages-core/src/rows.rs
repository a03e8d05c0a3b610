use crate::model::{ClaimDetail, MessageRow, ValidationMessage};

/// Join one validation message with the display fields of its claim.
///
/// `claim` is [`ClaimDetail::default`] for submission-level messages and for
/// claims that could not be resolved, in which case every claim field on the
/// row is empty.
#[must_use]
pub fn to_row(message: &ValidationMessage, claim: &ClaimDetail) -> MessageRow {
    MessageRow {
        submission_reference: message.submission_id,
        claim_reference: message.claim_id,
        ufn: claim.unique_file_number.clone(),
        ucn: claim.unique_client_number.clone(),
        client: client_display_name(claim),
        client_forename: claim.client_forename.clone(),
        client_surname: claim.client_surname.clone(),
        client_2_forename: claim.client_2_forename.clone(),
        client_2_surname: claim.client_2_surname.clone(),
        client_2_ucn: claim.client_2_ucn.clone(),
        crime_matter_type_code: claim.crime_matter_type_code.clone(),
        message: message.display_message.clone(),
        message_type: message.message_type,
    }
}

/// Full client name, preferring the primary client and falling back to the second client.
#[must_use]
pub fn client_display_name(claim: &ClaimDetail) -> Option<String> {
    let primary = (claim.client_forename.as_deref(), claim.client_surname.as_deref());
    let secondary = (claim.client_2_forename.as_deref(), claim.client_2_surname.as_deref());

    [primary, secondary]
        .into_iter()
        .find(|(forename, surname)| !is_blank(*forename) || !is_blank(*surname))
        .map(|(forename, surname)| {
            format!("{} {}", forename.unwrap_or_default(), surname.unwrap_or_default())
                .trim()
                .to_string()
        })
}

fn is_blank(value: Option<&str>) -> bool {
    value.filter(|value| !value.trim().is_empty()).is_none()
}
