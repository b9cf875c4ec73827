//! Subscriber, plan and subscription event as handed over by the request handler.

use serde::{Deserialize, Serialize};

/// Read-only copy of the subscribing user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRef {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
}

impl UserRef {
    /// "First Last", trimmed when either part is empty.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
            .trim()
            .to_string()
    }
}

/// Read-only copy of the plan being subscribed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanRef {
    pub id: i64,
    pub name: String,
    /// Display amount, already formatted by the plan store (e.g. `"$10.00"`).
    pub formatted_amount: String,
}

/// One plan subscription, consumed by a single fulfillment call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionEvent {
    pub subscriber: UserRef,
    pub plan: PlanRef,
}

impl SubscriptionEvent {
    pub fn new(subscriber: UserRef, plan: PlanRef) -> Self {
        Self { subscriber, plan }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_name_handles_missing_parts() {
        let mut user = UserRef {
            id: 1,
            email: "ada@example.com".into(),
            first_name: "Ada".into(),
            last_name: "Lovelace".into(),
        };
        assert_eq!(user.full_name(), "Ada Lovelace");
        user.last_name.clear();
        assert_eq!(user.full_name(), "Ada");
    }
}
