//! UI/backend events and error modeling for desktop GUI controller.

use client_core::{ClientError, ControllerSnapshot};

pub enum UiEvent {
    Info(String),
    Snapshot(ControllerSnapshot),
    Error(UiError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorCategory {
    Wallet,
    Network,
    Validation,
    Transport,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiErrorContext {
    BackendStartup,
    Connect,
    Submit,
    Refresh,
    General,
}

pub fn err_label(category: UiErrorCategory) -> &'static str {
    match category {
        UiErrorCategory::Wallet => "Wallet",
        UiErrorCategory::Network => "Network",
        UiErrorCategory::Validation => "Validation",
        UiErrorCategory::Transport => "Transport",
        UiErrorCategory::Unknown => "Unexpected",
    }
}

#[derive(Debug, Clone)]
pub struct UiError {
    category: UiErrorCategory,
    context: UiErrorContext,
    message: String,
}

impl UiError {
    pub fn from_client_error(context: UiErrorContext, err: &ClientError) -> Self {
        let category = match err {
            ClientError::ConnectionRejected(_) | ClientError::NotConnected => {
                UiErrorCategory::Wallet
            }
            ClientError::WrongNetwork(_) => UiErrorCategory::Network,
            ClientError::InvalidInput | ClientError::AlreadyPending => {
                UiErrorCategory::Validation
            }
            ClientError::ReadFailed(_) | ClientError::WriteFailed(_) => {
                UiErrorCategory::Transport
            }
        };
        Self {
            category,
            context,
            message: err.to_string(),
        }
    }

    pub fn from_message(context: UiErrorContext, message: impl Into<String>) -> Self {
        let message = message.into();
        let lower = message.to_ascii_lowercase();
        let category = if lower.contains("rejected") || lower.contains("unauthorized") {
            UiErrorCategory::Wallet
        } else if lower.contains("chain") || lower.contains("network") {
            UiErrorCategory::Network
        } else if lower.contains("invalid") || lower.contains("malformed") {
            UiErrorCategory::Validation
        } else if lower.contains("disconnected")
            || lower.contains("connection")
            || lower.contains("timed out")
            || lower.contains("runtime")
        {
            UiErrorCategory::Transport
        } else {
            UiErrorCategory::Unknown
        };
        Self {
            category,
            context,
            message,
        }
    }

    /// Whether the error deserves the dismissable banner rather than only the
    /// footer line.
    pub fn wants_banner(&self) -> bool {
        self.context == UiErrorContext::BackendStartup
    }

    pub fn category(&self) -> UiErrorCategory {
        self.category
    }

    pub fn context(&self) -> UiErrorContext {
        self.context
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn display(&self) -> String {
        format!("{} error: {}", err_label(self.category), self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejected_connection_is_a_wallet_error_without_banner() {
        let err = UiError::from_client_error(
            UiErrorContext::Connect,
            &ClientError::ConnectionRejected("User rejected the request.".to_string()),
        );
        assert_eq!(err.category(), UiErrorCategory::Wallet);
        assert!(!err.wants_banner());
        assert!(err.message().contains("User rejected the request."));
    }

    #[test]
    fn wrong_network_submit_is_a_network_error() {
        let err = UiError::from_client_error(
            UiErrorContext::Submit,
            &ClientError::WrongNetwork(Some(1)),
        );
        assert_eq!(err.category(), UiErrorCategory::Network);
        assert!(!err.wants_banner());
        assert!(err.display().starts_with("Network error: "));
    }

    #[test]
    fn classifies_backend_command_processor_disconnect_as_transport_error() {
        let err = UiError::from_message(
            UiErrorContext::General,
            "Backend command processor disconnected",
        );
        assert_eq!(err.category(), UiErrorCategory::Transport);
        assert_eq!(err.context(), UiErrorContext::General);
    }

    #[test]
    fn startup_failure_raises_banner() {
        let err = UiError::from_message(
            UiErrorContext::BackendStartup,
            "backend worker startup failure: failed to build runtime",
        );
        assert!(err.wants_banner());
    }
}
