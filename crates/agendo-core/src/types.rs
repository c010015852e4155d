// SPDX-FileCopyrightText: 2026 Agendo Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types used across adapter traits and the Agendo engine.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Service id used by synthetic `blocked` appointments.
pub const BLOCKED_SERVICE_ID: &str = "blocked";

/// Unique identifier for an outbound message accepted by a channel.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of adapter behind a trait object.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    Channel,
    Provider,
    Storage,
    Payment,
}

// --- Dialogue ---

/// Which persona state machine owns a dialogue state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StateFamily {
    Client,
    Management,
    Registration,
}

/// Every state a session can be in, across the three persona machines.
///
/// Persisted as its snake_case name; a session always holds exactly one.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum DialogueState {
    // client booking
    MainMenu,
    AwaitingProfessional,
    AwaitingService,
    AwaitingDate,
    AwaitingTime,
    AwaitingName,
    AwaitingEmail,
    AwaitingConfirmation,
    ManagingAppointments,
    AiChat,
    // owner / staff management
    AdminMenu,
    AdminAwaitingConfirm,
    AdminAwaitingPaid,
    AdminAwaitingCancel,
    AdminAwaitingBlock,
    AdminAiChat,
    // professional onboarding
    RegAwaitingNiche,
    RegAwaitingNicheOther,
    RegAwaitingPlan,
    RegAwaitingServices,
    RegAwaitingName,
    RegAwaitingEmail,
    RegAwaitingReady,
}

impl DialogueState {
    /// The persona machine responsible for this state.
    pub fn family(self) -> StateFamily {
        use DialogueState::*;
        match self {
            MainMenu | AwaitingProfessional | AwaitingService | AwaitingDate | AwaitingTime
            | AwaitingName | AwaitingEmail | AwaitingConfirmation | ManagingAppointments
            | AiChat => StateFamily::Client,
            AdminMenu | AdminAwaitingConfirm | AdminAwaitingPaid | AdminAwaitingCancel
            | AdminAwaitingBlock | AdminAiChat => StateFamily::Management,
            RegAwaitingNiche | RegAwaitingNicheOther | RegAwaitingPlan | RegAwaitingServices
            | RegAwaitingName | RegAwaitingEmail | RegAwaitingReady => StateFamily::Registration,
        }
    }

    /// Client states that expect a validated answer and must re-prompt
    /// instead of falling through to AI chat.
    pub fn is_critical(self) -> bool {
        use DialogueState::*;
        matches!(
            self,
            AwaitingProfessional
                | AwaitingService
                | AwaitingDate
                | AwaitingTime
                | AwaitingName
                | AwaitingEmail
                | AwaitingConfirmation
        )
    }
}

/// In-progress booking or registration fields held by a session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Draft {
    pub service_id: Option<String>,
    pub date: Option<String>,
    pub time: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    /// Dates offered by the last date prompt, in display order.
    pub offered_dates: Vec<String>,
    /// Times offered by the last time prompt, in display order.
    pub offered_times: Vec<String>,
    pub niche: Option<String>,
    pub plan: Option<String>,
    pub services: Vec<ParsedService>,
    /// Raw onboarding services text kept when it could not be parsed.
    pub raw_services: Option<String>,
    pub establishment_name: Option<String>,
}

/// A service extracted from free text during onboarding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedService {
    pub name: String,
    pub price_cents: i64,
}

/// Auxiliary ids remembered between turns so numeric answers index the
/// same ordering the user was shown.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionMetadata {
    pub professional_ids: Vec<String>,
    pub service_ids: Vec<String>,
    pub appointment_ids: Vec<String>,
}

/// Durable per-address dialogue state.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    /// Normalized phone digits.
    pub address: String,
    pub state: DialogueState,
    pub user_id: Option<String>,
    pub tenant_id: Option<String>,
    pub draft: Draft,
    pub metadata: SessionMetadata,
    /// RFC 3339 timestamp of the last write.
    pub updated_at: String,
}

impl Session {
    /// A fresh session in the given state with empty draft and metadata.
    pub fn new(address: impl Into<String>, state: DialogueState) -> Self {
        Self {
            address: address.into(),
            state,
            user_id: None,
            tenant_id: None,
            draft: Draft::default(),
            metadata: SessionMetadata::default(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

// --- Accounts and tenants ---

/// Rights held by an account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Client,
    Staff,
    Owner,
    SuperAdmin,
}

impl AccountRole {
    /// Whether the account holds staff/owner/platform rights.
    pub fn is_management(self) -> bool {
        !matches!(self, AccountRole::Client)
    }
}

/// The conversational role resolved for an address.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Persona {
    Guest,
    Client,
    Staff,
    Owner,
    SuperAdmin,
}

impl Persona {
    pub fn is_management(self) -> bool {
        matches!(self, Persona::Staff | Persona::Owner | Persona::SuperAdmin)
    }
}

/// Subscription state of a tenant on the platform.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Trial,
    Active,
    PastDue,
    Cancelled,
}

/// Per-tenant bot settings used when rendering messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BotPersona {
    pub name: Option<String>,
    pub tone: Option<String>,
    pub greeting_template: Option<String>,
    pub confirmation_template: Option<String>,
}

/// A user of the platform: client, staff member, tenant owner, or super-admin.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: String,
    /// Phone digits.
    pub phone: String,
    pub name: Option<String>,
    pub email: Option<String>,
    pub role: AccountRole,
    /// For staff: the owning tenant.
    pub owner_id: Option<String>,
    pub niche: Option<String>,
    pub plan: Option<String>,
    pub subscription_status: SubscriptionStatus,
    pub bot: BotPersona,
    pub initial_services: Option<String>,
    pub created_at: String,
}

impl Account {
    /// A minimal client account for a phone number.
    pub fn guest(id: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            phone: phone.into(),
            name: None,
            email: None,
            role: AccountRole::Client,
            owner_id: None,
            niche: None,
            plan: None,
            subscription_status: SubscriptionStatus::Active,
            bot: BotPersona::default(),
            initial_services: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// The tenant whose calendar this account manages (self for owners).
    pub fn managed_tenant_id(&self) -> &str {
        match self.role {
            AccountRole::Staff => self.owner_id.as_deref().unwrap_or(&self.id),
            _ => &self.id,
        }
    }

    /// Display name, falling back to the phone number.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.phone)
    }
}

/// A bookable service offered by a professional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Service {
    pub id: String,
    pub tenant_id: String,
    pub name: String,
    pub price_cents: i64,
    pub duration_minutes: u32,
}

/// Working-hours template of a professional.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkingHours {
    /// Opening time, `HH:MM`.
    pub open: String,
    /// Closing time, `HH:MM`, exclusive.
    pub close: String,
    pub slot_minutes: u32,
    /// Working weekdays, 0 = Sunday.
    pub weekdays: Vec<u8>,
}

// --- Appointments ---

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,
    Confirmed,
    Cancelled,
    Blocked,
    Completed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

/// A row of the appointment ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: String,
    /// The professional whose calendar holds the slot.
    pub tenant_id: String,
    pub client_id: String,
    pub service_id: String,
    /// `YYYY-MM-DD`.
    pub date: String,
    /// `HH:MM`.
    pub time: String,
    pub status: AppointmentStatus,
    pub payment_status: PaymentStatus,
    pub cancel_reason: Option<String>,
    pub created_at: String,
}

impl Appointment {
    /// Synthetic reservation removing a slot from availability.
    pub fn blocked(tenant_id: &str, date: &str, time: &str) -> Self {
        Self {
            id: format!("block-{tenant_id}-{date}-{time}"),
            tenant_id: tenant_id.to_string(),
            client_id: tenant_id.to_string(),
            service_id: BLOCKED_SERVICE_ID.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            status: AppointmentStatus::Blocked,
            payment_status: PaymentStatus::Pending,
            cancel_reason: None,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    /// Non-cancelled rows occupy their slot.
    pub fn occupies_slot(&self) -> bool {
        self.status != AppointmentStatus::Cancelled
    }

    /// A real client booking that is still active.
    pub fn is_active_booking(&self) -> bool {
        !matches!(
            self.status,
            AppointmentStatus::Cancelled | AppointmentStatus::Blocked
        )
    }
}

/// Query filter for [`list_appointments`](crate::StorageAdapter::list_appointments).
///
/// Empty vectors and `None` fields do not constrain the query.
#[derive(Debug, Clone, Default)]
pub struct AppointmentFilter {
    pub tenant_ids: Vec<String>,
    pub client_id: Option<String>,
    /// Match clients whose phone ends with these digits.
    pub client_phone_suffix: Option<String>,
    pub date: Option<String>,
    pub date_from: Option<String>,
    pub time: Option<String>,
    pub statuses: Vec<AppointmentStatus>,
    pub exclude_cancelled: bool,
    pub exclude_blocked: bool,
    pub payment_status: Option<PaymentStatus>,
}

impl AppointmentFilter {
    /// Rows occupying a specific slot.
    pub fn slot(tenant_id: &str, date: &str, time: &str) -> Self {
        Self {
            tenant_ids: vec![tenant_id.to_string()],
            date: Some(date.to_string()),
            time: Some(time.to_string()),
            exclude_cancelled: true,
            ..Self::default()
        }
    }
}

// --- Channel types ---

/// An inbound chat message delivered by the transport.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    /// Raw sender address (phone, possibly with formatting or a JID suffix).
    pub address: String,
    pub text: String,
    /// The tenant whose channel received the message.
    pub tenant_hint: Option<String>,
    /// The tenant is messaging through its own connected device.
    pub is_self_channel: bool,
    pub received_at: String,
}

impl InboundMessage {
    pub fn new(address: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            text: text.into(),
            tenant_hint: None,
            is_self_channel: false,
            received_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn with_tenant_hint(mut self, tenant_id: impl Into<String>) -> Self {
        self.tenant_hint = Some(tenant_id.into());
        self
    }

    pub fn from_self_channel(mut self) -> Self {
        self.is_self_channel = true;
        self
    }
}

/// A message to be delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub address: String,
    pub text: String,
    /// Tenant whose connected channel should deliver the message.
    pub tenant_id: Option<String>,
}

// --- Provider types ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    System,
    User,
    Assistant,
    Tool,
}

/// A model-requested invocation of a named tool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    pub arguments: serde_json::Value,
}

/// One message in a provider conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: None,
        }
    }

    pub fn assistant(content: impl Into<String>, tool_calls: Vec<ToolCall>) -> Self {
        Self {
            role: ChatRole::Assistant,
            content: content.into(),
            tool_calls,
            tool_call_id: None,
        }
    }

    pub fn tool_result(call_id: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Tool,
            content: content.into(),
            tool_calls: Vec::new(),
            tool_call_id: Some(call_id.into()),
        }
    }
}

/// Schema of a tool exposed to the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSchema {
    pub name: String,
    pub description: String,
    /// JSON Schema of the argument object.
    pub parameters: serde_json::Value,
}

/// A completion request to an LLM provider.
#[derive(Debug, Clone, Default)]
pub struct CompletionRequest {
    pub system_prompt: String,
    pub messages: Vec<ChatMessage>,
    /// `None` means the model may not call tools.
    pub tools: Option<Vec<ToolSchema>>,
    pub max_tokens: Option<u32>,
    pub temperature: Option<f32>,
}

/// The model's answer: text and/or tool calls.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompletionResponse {
    pub text: String,
    pub tool_calls: Vec<ToolCall>,
}

impl CompletionResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            tool_calls: Vec::new(),
        }
    }
}
