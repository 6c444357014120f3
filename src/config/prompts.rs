//! System prompt and scripted lines for the order assistant
//!
//! The LLM collaborator receives one system prompt per session. It enumerates
//! the menu vocabulary and spells out the bracketed-tag tool syntax the
//! tool-call parser understands. Scripted lines cover the turns that never
//! reach the LLM (greeting, farewell, degraded fallback).

use super::menu::MenuCatalog;

/// Build the per-session system prompt from the loaded catalog.
pub fn order_taker(catalog: &MenuCatalog) -> String {
    let flavors = catalog.flavors().join(", ");
    let sizes = MenuCatalog::size_menu();

    format!(
        r#"You are a friendly restaurant order assistant.

AVAILABLE PIZZA FLAVORS: {flavors}
AVAILABLE SIZES: {sizes}

TOOLS:
1. `[ADD_ITEM: {{"name": "...", "size": "...", "quantity": ...}}]`
   - Use this IMMEDIATELY when the user confirms an item.
2. `[SET_DETAILS: {{"address": "...", "phone": "..."}}]`
   - Use this when the user provides address and phone.
3. `[SAVE_ORDER]`
   - Use this ONLY when the order is CONFIRMED and you have address and phone.

RULES:
1. Keep responses SHORT (max 15 words).
2. Use tools explicitly with valid JSON.
3. If address/phone is missing, ask for it.
4. Do NOT use `[SAVE_ORDER]` or say "Order Confirmed" if you don't have the address and phone.
5. If STATUS says MISSING DETAILS, you MUST ask for them. NEVER successfully confirm.
6. NEVER use placeholders like "..." in tools. Ask the user if you don't know and wait for their response.
7. Example: "Got it! [SET_DETAILS: {{"address": "123 Main", "phone": "555"}}] Confirm order?"

Respond naturally."#
    )
}

/// Lines the engine speaks without consulting the LLM.
pub mod lines {
    /// Opening line when a session is created.
    pub const GREETING: &str = "Hi! Welcome to our restaurant. What can I get you today?";

    /// Farewell on an exit keyword; the session ends with no commit.
    pub const FAREWELL: &str = "Thanks for calling! Have a great day!";

    /// Degraded reply when the LLM collaborator fails; phase is unchanged.
    pub const FALLBACK: &str = "I didn't catch that. Could you say it again?";

    /// Substitute reply when a response was nothing but tool markup.
    pub const DONE: &str = "Done.";
}
