//! System prompt selection by user role.
//!
//! Each supported role maps to a fixed system instruction. Any tag that is
//! not an exact, case-sensitive match for a known role is treated as a
//! customer.

use std::fmt;

use serde::{Deserialize, Serialize};

const CUSTOMER_PROMPT: &str = "You are a helpful AI assistant for customers. \
Be friendly, clear, and helpful in solving their needs.";

const SUPPORT_AGENT_PROMPT: &str = "You are an AI assistant for support agents. \
Provide detailed, accurate information to help resolve customer issues.";

const MANAGER_PROMPT: &str = "You are an AI assistant for managers. \
Provide strategic insights and data-driven recommendations.";

/// Audience a conversation is tailored to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UserType {
    #[default]
    Customer,
    SupportAgent,
    Manager,
}

impl UserType {
    pub const ALL: [UserType; 3] = [UserType::Customer, UserType::SupportAgent, UserType::Manager];

    /// Map a raw tag to a role. Unrecognized tags map to `Customer`.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "customer" => UserType::Customer,
            "support_agent" => UserType::SupportAgent,
            "manager" => UserType::Manager,
            _ => UserType::Customer,
        }
    }

    pub fn as_tag(self) -> &'static str {
        match self {
            UserType::Customer => "customer",
            UserType::SupportAgent => "support_agent",
            UserType::Manager => "manager",
        }
    }

    pub fn system_prompt(self) -> &'static str {
        match self {
            UserType::Customer => CUSTOMER_PROMPT,
            UserType::SupportAgent => SUPPORT_AGENT_PROMPT,
            UserType::Manager => MANAGER_PROMPT,
        }
    }

    /// Recover the role whose instruction is exactly `prompt`.
    pub fn from_system_prompt(prompt: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.system_prompt() == prompt)
    }
}

impl fmt::Display for UserType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_tag())
    }
}

/// System instruction for a raw role tag.
pub fn system_prompt_for(user_type: &str) -> &'static str {
    UserType::from_tag(user_type).system_prompt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tags_map_to_their_prompt() {
        assert!(system_prompt_for("customer").contains("for customers"));
        assert!(system_prompt_for("support_agent").contains("for support agents"));
        assert!(system_prompt_for("manager").contains("for managers"));
    }

    #[test]
    fn test_prompts_are_distinct() {
        let prompts: Vec<&str> = UserType::ALL.iter().map(|t| t.system_prompt()).collect();
        assert_ne!(prompts[0], prompts[1]);
        assert_ne!(prompts[0], prompts[2]);
        assert_ne!(prompts[1], prompts[2]);
    }

    #[test]
    fn test_unknown_tags_fall_back_to_customer() {
        let customer = system_prompt_for("customer");
        for tag in ["", "   ", "Manager", "MANAGER", " manager", "admin", "support-agent"] {
            assert_eq!(system_prompt_for(tag), customer, "tag {tag:?}");
        }
    }

    #[test]
    fn test_tag_roundtrip() {
        for t in UserType::ALL {
            assert_eq!(UserType::from_tag(t.as_tag()), t);
            assert_eq!(t.to_string(), t.as_tag());
        }
    }

    #[test]
    fn test_reverse_lookup() {
        for t in UserType::ALL {
            assert_eq!(UserType::from_system_prompt(t.system_prompt()), Some(t));
        }
        assert_eq!(UserType::from_system_prompt("something else"), None);
    }

    #[test]
    fn test_serde_uses_tags() {
        let json = serde_json::to_string(&UserType::SupportAgent).unwrap();
        assert_eq!(json, "\"support_agent\"");
    }
}
