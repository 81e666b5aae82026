//! The ECPP tool table and its typed call variants.
//!
//! [`ecpp_tools`] is the single source of the descriptors advertised to the
//! model and served over MCP. [`EcppToolCall::parse`] turns a validated
//! argument object into one typed variant per tool.

use crate::ecpp::error::EcppError;
use crate::ecpp::remote::BusinessSenderFields;
use crate::ecpp::tool_protocol::{ToolMetadata, ToolParameter, ToolParameterType};
use lazy_static::lazy_static;
use serde_json::{Map, Value};

pub const LOGIN_ECPP: &str = "loginECPP";
pub const SEARCH_SENDERS: &str = "searchSenders";
pub const GET_CREATED_REVIEW_BY_YOU: &str = "getCreatedReviewByYou";
pub const CREATE_BUSINESS_SENDER: &str = "createBusinessSender";

/// Arguments of `createBusinessSender`, all required strings.
const BUSINESS_SENDER_FIELDS: [(&str, &str); 9] = [
    ("companyName", "Company name"),
    ("companyTradingName", "Company trading name"),
    ("countryCode", "Country code"),
    ("companyRegistrationNumber", "Company registration number"),
    ("companyRegistrationCountry", "Company registration country"),
    ("addressLine", "Address line"),
    ("addressCity", "Address city"),
    ("addressCountry", "Address country"),
    ("mobileNumber", "Mobile number"),
];

lazy_static! {
    static ref ECPP_TOOLS: Vec<ToolMetadata> = build_tools();
}

fn build_tools() -> Vec<ToolMetadata> {
    let login = ToolMetadata::new(LOGIN_ECPP, "login and auth in ecpp")
        .with_parameter(ToolParameter::new("username", ToolParameterType::String).required())
        .with_parameter(ToolParameter::new("password", ToolParameterType::String).required());

    let search = ToolMetadata::new(SEARCH_SENDERS, "search senders").with_parameter(
        ToolParameter::new("senderName", ToolParameterType::String).with_description("Sender name"),
    );

    let reviews = ToolMetadata::new(
        GET_CREATED_REVIEW_BY_YOU,
        "list created transfers created by user",
    );

    let create = BUSINESS_SENDER_FIELDS.iter().fold(
        ToolMetadata::new(CREATE_BUSINESS_SENDER, "create business sender data"),
        |tool, (field, description)| {
            tool.with_parameter(
                ToolParameter::new(*field, ToolParameterType::String)
                    .with_description(*description)
                    .required(),
            )
        },
    );

    vec![login, search, reviews, create]
}

/// Every ECPP tool, in advertisement order.
pub fn ecpp_tools() -> &'static [ToolMetadata] {
    ECPP_TOOLS.as_slice()
}

pub fn find_tool(name: &str) -> Option<&'static ToolMetadata> {
    ECPP_TOOLS.iter().find(|tool| tool.name == name)
}

/// A tool call whose arguments passed validation.
#[derive(Debug, Clone, PartialEq)]
pub enum EcppToolCall {
    Login { username: String, password: String },
    SearchSenders { sender_name: String },
    ListCreatedReviews,
    CreateBusinessSender(BusinessSenderFields),
}

impl EcppToolCall {
    /// Validate `arguments` against the named tool's descriptor and decode
    /// them into the matching variant.
    pub fn parse(tool_name: &str, arguments: &Value) -> Result<Self, EcppError> {
        let tool =
            find_tool(tool_name).ok_or_else(|| EcppError::UnknownTool(tool_name.to_string()))?;
        let args = tool.validate(arguments)?;

        let call = match tool_name {
            LOGIN_ECPP => EcppToolCall::Login {
                username: string_arg(&args, "username"),
                password: string_arg(&args, "password"),
            },
            SEARCH_SENDERS => EcppToolCall::SearchSenders {
                sender_name: string_arg(&args, "senderName"),
            },
            GET_CREATED_REVIEW_BY_YOU => EcppToolCall::ListCreatedReviews,
            CREATE_BUSINESS_SENDER => {
                let fields: BusinessSenderFields =
                    serde_json::from_value(Value::Object(args)).map_err(|e| {
                        EcppError::invalid_arguments(CREATE_BUSINESS_SENDER, e.to_string())
                    })?;
                EcppToolCall::CreateBusinessSender(fields)
            }
            other => return Err(EcppError::UnknownTool(other.to_string())),
        };
        Ok(call)
    }

    pub fn tool_name(&self) -> &'static str {
        match self {
            EcppToolCall::Login { .. } => LOGIN_ECPP,
            EcppToolCall::SearchSenders { .. } => SEARCH_SENDERS,
            EcppToolCall::ListCreatedReviews => GET_CREATED_REVIEW_BY_YOU,
            EcppToolCall::CreateBusinessSender(_) => CREATE_BUSINESS_SENDER,
        }
    }
}

// Only called after validation, so a missing optional field reads as empty.
fn string_arg(args: &Map<String, Value>, key: &str) -> String {
    args.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}
