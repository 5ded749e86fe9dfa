use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};

use crate::{
    api::state::AppState,
    domain::{PaymentMethod, PaymentStatus, PaymentSummary, SafePayment},
    error::Result,
    payments::{
        validators, CardDetails, PaymentCredentials, PaymentOutcome, PaymentRequest, Receipt,
    },
    repository::PaymentListFilter,
    service::{PaymentHistory, PaymentStatusView, RefundOutcome},
};

#[derive(Debug, Deserialize)]
pub struct ProcessPaymentDto {
    method: PaymentMethod,
    amount: f64,
    payer_id: String,
    order_id: Option<String>,
    booking_id: Option<String>,
    card_details: Option<CardDetailsDto>,
    upi_id: Option<String>,
    reference: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CardDetailsDto {
    card_number: String,
    expiry_date: String,
    cvv: String,
    card_network: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct ProcessPaymentResponse {
    success: bool,
    data: PaymentOutcome,
    receipt: Receipt,
}

pub async fn process(
    State(state): State<AppState>,
    Json(dto): Json<ProcessPaymentDto>,
) -> Result<(StatusCode, Json<ProcessPaymentResponse>)> {
    let credentials = match (dto.card_details, dto.upi_id) {
        (Some(card), _) => PaymentCredentials::Card(CardDetails {
            card_number: card.card_number,
            expiry_date: card.expiry_date,
            cvv: card.cvv,
            card_network: card.card_network,
        }),
        (None, Some(upi_id)) => PaymentCredentials::Upi { upi_id },
        (None, None) => PaymentCredentials::None,
    };

    let request = PaymentRequest {
        method: dto.method,
        amount: dto.amount,
        payer_id: dto.payer_id,
        order_id: dto.order_id,
        booking_id: dto.booking_id,
        credentials,
        reference: dto.reference,
    };

    let outcome = state.service_context.processor.process(request).await?;
    let receipt = state
        .service_context
        .payment_service
        .receipt(&outcome.transaction_id)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(ProcessPaymentResponse {
            success: true,
            data: outcome,
            receipt,
        }),
    ))
}

#[derive(Debug, Serialize)]
pub struct DataResponse<T> {
    success: bool,
    data: T,
}

impl<T> DataResponse<T> {
    fn new(data: T) -> Self {
        Self { success: true, data }
    }
}

pub async fn get_status(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<DataResponse<PaymentStatusView>>> {
    let status = state
        .service_context
        .payment_service
        .status(&transaction_id)
        .await?;

    Ok(Json(DataResponse::new(status)))
}

pub async fn receipt(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<DataResponse<Receipt>>> {
    let receipt = state
        .service_context
        .payment_service
        .receipt(&transaction_id)
        .await?;

    Ok(Json(DataResponse::new(receipt)))
}

pub async fn refund(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<DataResponse<RefundOutcome>>> {
    let outcome = state
        .service_context
        .payment_service
        .refund(&transaction_id)
        .await?;

    Ok(Json(DataResponse::new(outcome)))
}

pub async fn cancel(
    State(state): State<AppState>,
    Path(transaction_id): Path<String>,
) -> Result<Json<DataResponse<SafePayment>>> {
    let payment = state
        .service_context
        .payment_service
        .cancel(&transaction_id)
        .await?;

    Ok(Json(DataResponse::new(payment.to_safe())))
}

#[derive(Debug, Deserialize)]
pub struct HistoryParams {
    payer_id: String,
    status: Option<PaymentStatus>,
    method: Option<PaymentMethod>,
    #[serde(default = "default_page")]
    page: i64,
    #[serde(default = "default_limit")]
    limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    10
}

pub async fn history(
    State(state): State<AppState>,
    Query(params): Query<HistoryParams>,
) -> Result<Json<DataResponse<PaymentHistory>>> {
    let filter = PaymentListFilter {
        payer_id: params.payer_id,
        status: params.status,
        method: params.method,
        page: params.page,
        limit: params.limit,
    };

    let history = state
        .service_context
        .payment_service
        .history(&filter)
        .await?;

    Ok(Json(DataResponse::new(history)))
}

#[derive(Debug, Deserialize)]
pub struct SummaryParams {
    payer_id: String,
}

pub async fn summary(
    State(state): State<AppState>,
    Query(params): Query<SummaryParams>,
) -> Result<Json<DataResponse<PaymentSummary>>> {
    let summary = state
        .service_context
        .payment_service
        .summary(&params.payer_id)
        .await?;

    Ok(Json(DataResponse::new(summary)))
}

#[derive(Debug, Deserialize)]
pub struct ValidateCardDto {
    card_number: String,
    expiry_date: String,
    cvv: String,
}

#[derive(Debug, Serialize)]
pub struct ValidateResponse {
    valid: bool,
    message: String,
}

pub async fn validate_card(
    Json(dto): Json<ValidateCardDto>,
) -> (StatusCode, Json<ValidateResponse>) {
    let outcome = validators::validate_card(&dto.card_number, &dto.expiry_date, &dto.cvv);

    match outcome.error {
        None => (
            StatusCode::OK,
            Json(ValidateResponse {
                valid: true,
                message: "Card details are valid".to_string(),
            }),
        ),
        Some(error) => (
            StatusCode::BAD_REQUEST,
            Json(ValidateResponse {
                valid: false,
                message: error,
            }),
        ),
    }
}

#[derive(Debug, Deserialize)]
pub struct ValidateUpiDto {
    upi_id: String,
}

pub async fn validate_upi(Json(dto): Json<ValidateUpiDto>) -> (StatusCode, Json<ValidateResponse>) {
    if validators::validate_upi_id(&dto.upi_id) {
        (
            StatusCode::OK,
            Json(ValidateResponse {
                valid: true,
                message: "UPI ID is valid".to_string(),
            }),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            Json(ValidateResponse {
                valid: false,
                message: "Invalid UPI ID format (use: username@bankname)".to_string(),
            }),
        )
    }
}
