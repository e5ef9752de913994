use axum::{
    extract::{Path, State},
    response::IntoResponse,
    Json,
};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::db::models::{Transaction, TransactionDetails};
use crate::domain::TransactionType;
use crate::error::AppError;
use crate::middleware::auth::AuthedUser;
use crate::validation::{
    detect_network, sanitize_string, validate_bank_account, validate_max_len,
    validate_phone_number, validate_positive_amount, validate_required, ValidationError,
    PLAN_NAME_MAX_LEN,
};
use crate::AppState;

#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PurchaseRequest {
    #[schema(value_type = String, example = "750.00")]
    pub amount: BigDecimal,
    pub network: Option<String>,
    pub phone_number: Option<String>,
    pub plan_name: Option<String>,
    pub plan_type: Option<String>,
    pub provider: Option<String>,
    pub smartcard_number: Option<String>,
    pub exam_type: Option<String>,
    pub bank_name: Option<String>,
    pub bank_account: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PurchaseResponse {
    pub success: bool,
    pub transaction: Transaction,
    pub reference: String,
    pub status: String,
    pub message: String,
}

#[utoipa::path(
    post,
    path = "/purchases/{product}",
    params(
        ("product" = String, Path, description = "data | airtime | cable | transfer | airtime2cash | exam")
    ),
    request_body = PurchaseRequest,
    responses(
        (status = 200, description = "Purchase processed; status is completed or failed", body = PurchaseResponse),
        (status = 400, description = "Insufficient balance, invalid request or recording failure"),
        (status = 401, description = "Missing or invalid API key")
    ),
    tag = "Purchases"
)]
pub async fn submit_purchase(
    State(state): State<AppState>,
    AuthedUser(user_id): AuthedUser,
    Path(product): Path<String>,
    Json(payload): Json<PurchaseRequest>,
) -> Result<impl IntoResponse, AppError> {
    let tx_type: TransactionType = product.parse().map_err(AppError::BadRequest)?;

    validate_positive_amount(&payload.amount)?;
    let details = build_details(tx_type, &payload)?;

    let submitted = state
        .recorder
        .submit(user_id, tx_type, payload.amount, details)
        .await?;

    Ok(Json(PurchaseResponse {
        success: true,
        reference: submitted.transaction.reference.clone(),
        status: submitted.transaction.status.clone(),
        message: submitted.message,
        transaction: submitted.transaction,
    }))
}

/// Checks the product-specific required fields and normalizes them into the
/// columns stored on the transaction row. Networks are stored uppercase and
/// inferred from the phone prefix when omitted.
fn build_details(
    tx_type: TransactionType,
    payload: &PurchaseRequest,
) -> Result<TransactionDetails, ValidationError> {
    let mut details = TransactionDetails::default();

    match tx_type {
        TransactionType::Data | TransactionType::Airtime | TransactionType::AirtimeToCash => {
            let phone_number = required_field("phone_number", payload.phone_number.as_deref())?;
            validate_phone_number(&phone_number)?;
            details.network = Some(resolve_network(payload.network.as_deref(), &phone_number)?);
            details.phone_number = Some(phone_number);

            if tx_type == TransactionType::Data {
                let plan_name = required_field("plan_name", payload.plan_name.as_deref())?;
                validate_max_len("plan_name", &plan_name, PLAN_NAME_MAX_LEN)?;
                details.plan_name = Some(plan_name);
                details.plan_type = payload.plan_type.as_deref().map(sanitize_string);
            }

            if tx_type == TransactionType::AirtimeToCash {
                let (bank_name, bank_account) = required_bank_fields(payload)?;
                details.bank_name = Some(bank_name);
                details.bank_account = Some(bank_account);
            }
        }
        TransactionType::Cable => {
            let provider = required_field("provider", payload.provider.as_deref())?;
            let smartcard = required_field("smartcard_number", payload.smartcard_number.as_deref())?;
            let plan_name = required_field("plan_name", payload.plan_name.as_deref())?;
            validate_max_len("plan_name", &plan_name, PLAN_NAME_MAX_LEN)?;
            details.provider = Some(provider.to_uppercase());
            details.smartcard_number = Some(smartcard);
            details.plan_name = Some(plan_name);
        }
        TransactionType::Transfer => {
            let (bank_name, bank_account) = required_bank_fields(payload)?;
            details.bank_name = Some(bank_name);
            details.bank_account = Some(bank_account);
        }
        TransactionType::Exam => {
            let exam_type = required_field("exam_type", payload.exam_type.as_deref())?;
            details.exam_type = Some(exam_type.to_uppercase());
        }
    }

    Ok(details)
}

fn required_field(
    field: &'static str,
    value: Option<&str>,
) -> Result<String, ValidationError> {
    let value = sanitize_string(value.unwrap_or_default());
    validate_required(field, &value)?;
    Ok(value)
}

fn required_bank_fields(payload: &PurchaseRequest) -> Result<(String, String), ValidationError> {
    let bank_name = required_field("bank_name", payload.bank_name.as_deref())?;
    let bank_account = required_field("bank_account", payload.bank_account.as_deref())?;
    validate_bank_account(&bank_account)?;
    Ok((bank_name, bank_account))
}

fn resolve_network(
    network: Option<&str>,
    phone_number: &str,
) -> Result<String, ValidationError> {
    match network {
        Some(network) => {
            let network = sanitize_string(network).to_uppercase();
            crate::validation::validate_network(&network)?;
            Ok(network)
        }
        None => detect_network(phone_number)
            .map(|n| n.to_string())
            .ok_or_else(|| {
                ValidationError::new("network", "could not be detected from phone number")
            }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn request(amount: &str) -> PurchaseRequest {
        PurchaseRequest {
            amount: BigDecimal::from_str(amount).unwrap(),
            network: None,
            phone_number: None,
            plan_name: None,
            plan_type: None,
            provider: None,
            smartcard_number: None,
            exam_type: None,
            bank_name: None,
            bank_account: None,
        }
    }

    #[test]
    fn data_purchase_requires_phone_and_plan() {
        let mut req = request("500");
        assert!(build_details(TransactionType::Data, &req).is_err());

        req.phone_number = Some("08031234567".to_string());
        assert!(build_details(TransactionType::Data, &req).is_err());

        req.plan_name = Some("1GB Daily".to_string());
        let details = build_details(TransactionType::Data, &req).unwrap();
        assert_eq!(details.plan_name.as_deref(), Some("1GB Daily"));
    }

    #[test]
    fn network_detected_from_phone_when_omitted() {
        let mut req = request("100");
        req.phone_number = Some("08031234567".to_string());
        let details = build_details(TransactionType::Airtime, &req).unwrap();
        assert_eq!(details.network.as_deref(), Some("MTN"));
    }

    #[test]
    fn network_is_uppercased_and_checked() {
        let mut req = request("100");
        req.phone_number = Some("08031234567".to_string());
        req.network = Some("glo".to_string());
        let details = build_details(TransactionType::Airtime, &req).unwrap();
        assert_eq!(details.network.as_deref(), Some("GLO"));

        req.network = Some("vodafone".to_string());
        assert!(build_details(TransactionType::Airtime, &req).is_err());
    }

    #[test]
    fn undetectable_network_is_rejected() {
        let mut req = request("100");
        req.phone_number = Some("08001234567".to_string());
        assert!(build_details(TransactionType::Airtime, &req).is_err());
    }

    #[test]
    fn cable_purchase_requires_provider_and_smartcard() {
        let mut req = request("4500");
        assert!(build_details(TransactionType::Cable, &req).is_err());

        req.provider = Some("dstv".to_string());
        req.smartcard_number = Some("1234567890".to_string());
        req.plan_name = Some("Compact".to_string());
        let details = build_details(TransactionType::Cable, &req).unwrap();
        assert_eq!(details.provider.as_deref(), Some("DSTV"));
    }

    #[test]
    fn airtime_to_cash_requires_bank_fields() {
        let mut req = request("2000");
        req.phone_number = Some("08051234567".to_string());
        assert!(build_details(TransactionType::AirtimeToCash, &req).is_err());

        req.bank_name = Some("GTBank".to_string());
        req.bank_account = Some("0123456789".to_string());
        let details = build_details(TransactionType::AirtimeToCash, &req).unwrap();
        assert_eq!(details.network.as_deref(), Some("GLO"));
        assert_eq!(details.bank_account.as_deref(), Some("0123456789"));
    }

    #[test]
    fn exam_purchase_requires_exam_type() {
        let mut req = request("1500");
        assert!(build_details(TransactionType::Exam, &req).is_err());

        req.exam_type = Some("waec".to_string());
        let details = build_details(TransactionType::Exam, &req).unwrap();
        assert_eq!(details.exam_type.as_deref(), Some("WAEC"));
    }
}
