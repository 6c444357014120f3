//! Session state: dialogue phase, cart, pending item, customer details

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::conversation::Transcript;
use crate::core::extract;

/// Dialogue phase. `Completed` is terminal; everything else accepts turns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Greeting,
    AskItem,
    AskFlavor,
    AskSize,
    AskMore,
    CollectAddress,
    CollectPhone,
    ConfirmOrder,
    Completed,
}

/// One ordered unit. Only constructed once `name` and, for size-required
/// categories, `size` are resolved - partial items live in [`PendingItem`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub category: String,
    pub name: String,
    pub size: Option<String>,
    pub quantity: u32,
    pub special_request: Option<String>,
}

impl LineItem {
    /// "2x Large Chicken Surprise" - cart rendering for the LLM context.
    pub fn label(&self) -> String {
        match &self.size {
            Some(size) => format!("{}x {} {}", self.quantity, size, self.name),
            None => format!("{}x {}", self.quantity, self.name),
        }
    }

    /// "2 Large Chicken Surprise" - spoken summary rendering.
    pub fn spoken(&self) -> String {
        match &self.size {
            Some(size) => format!("{} {} {}", self.quantity, size, self.name),
            None => format!("{} {}", self.quantity, self.name),
        }
    }
}

/// A cart entry under construction, awaiting a flavor and/or size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingItem {
    pub category: String,
    pub quantity: u32,
    pub name: Option<String>,
    pub special_request: Option<String>,
}

impl PendingItem {
    pub fn pizza(quantity: u32) -> Self {
        Self {
            category: "Pizza".to_string(),
            quantity,
            name: None,
            special_request: None,
        }
    }

    /// Convert into a cart-ready item. Returns `None` while the name is
    /// unresolved - an unnamed item never reaches the cart.
    pub fn finalize(self, size: Option<String>) -> Option<LineItem> {
        let name = self.name?;
        Some(LineItem {
            category: self.category,
            name,
            size,
            quantity: self.quantity,
            special_request: self.special_request,
        })
    }
}

/// The unit of one ordering conversation. Mutated only by the dialogue
/// engine; dropped when the conversation ends.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: Uuid,
    pub phase: Phase,
    pub cart: Vec<LineItem>,
    pub pending: Option<PendingItem>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub transcript: Transcript,
}

impl Session {
    pub fn new(system_prompt: &str, transcript_cap: usize) -> Self {
        Self {
            id: Uuid::new_v4(),
            phase: Phase::Greeting,
            cart: Vec::new(),
            pending: None,
            address: None,
            phone: None,
            transcript: Transcript::new(transcript_cap).with_system(system_prompt),
        }
    }

    pub fn has_valid_address(&self) -> bool {
        self.address
            .as_deref()
            .is_some_and(extract::is_valid_address)
    }

    pub fn has_valid_phone(&self) -> bool {
        self.phone.as_deref().is_some_and(extract::is_valid_phone)
    }

    /// "2x Large Chicken Surprise, 1x Cola" or "Empty".
    pub fn cart_line(&self) -> String {
        if self.cart.is_empty() {
            return "Empty".to_string();
        }
        self.cart
            .iter()
            .map(LineItem::label)
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Spoken answer to an order inquiry.
    pub fn cart_summary(&self) -> String {
        if self.cart.is_empty() {
            return "You haven't ordered anything yet.".to_string();
        }
        let items = self
            .cart
            .iter()
            .map(LineItem::spoken)
            .collect::<Vec<_>>()
            .join(", ");
        format!("You have ordered: {items}.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: u32, size: &str, name: &str) -> LineItem {
        LineItem {
            category: "Pizza".to_string(),
            name: name.to_string(),
            size: Some(size.to_string()),
            quantity,
            special_request: None,
        }
    }

    #[test]
    fn pending_without_name_never_finalizes() {
        let pending = PendingItem::pizza(2);
        assert!(pending.finalize(Some("Large".into())).is_none());

        let mut named = PendingItem::pizza(2);
        named.name = Some("Chicken Surprise".into());
        let line = named.finalize(Some("Large".into())).unwrap();
        assert_eq!(line.label(), "2x Large Chicken Surprise");
        assert_eq!(line.spoken(), "2 Large Chicken Surprise");
    }

    #[test]
    fn cart_rendering() {
        let mut session = Session::new("prompt", 10);
        assert_eq!(session.cart_line(), "Empty");
        assert_eq!(session.cart_summary(), "You haven't ordered anything yet.");

        session.cart.push(item(2, "Large", "Chicken Surprise"));
        session.cart.push(item(1, "Small", "Margherita"));
        assert_eq!(
            session.cart_line(),
            "2x Large Chicken Surprise, 1x Small Margherita"
        );
        assert_eq!(
            session.cart_summary(),
            "You have ordered: 2 Large Chicken Surprise, 1 Small Margherita."
        );
    }

    #[test]
    fn detail_validity_flags() {
        let mut session = Session::new("prompt", 10);
        assert!(!session.has_valid_address());

        session.address = Some("abc".into());
        assert!(!session.has_valid_address());
        session.address = Some("12 Baker Street".into());
        assert!(session.has_valid_address());

        session.phone = Some("123".into());
        assert!(!session.has_valid_phone());
        session.phone = Some("03001234567".into());
        assert!(session.has_valid_phone());
    }
}
