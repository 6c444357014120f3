//! Dialogue state machine with LLM delegation
//!
//! The DialogueEngine is the core of the order assistant. Per turn it:
//! 1. Applies the global rules (exit keywords, order inquiries)
//! 2. Tries to resolve the utterance deterministically with the extractors
//! 3. Otherwise delegates to the LLM collaborator with an injected context
//! 4. Applies any tool calls found in the reply and computes the next phase
//!
//! A phase only advances on a fully-applied turn: when the collaborator
//! fails, the engine answers with a scripted fallback and mutates nothing.

use std::sync::Arc;

use crate::config::menu::{MenuCatalog, SIZES, SIZE_ALIASES};
use crate::config::prompts::{self, lines};
use crate::conversation::{Message, Role};
use crate::core::extract;
use crate::core::order::{self, MissingField, OrderError, OrderLog};
use crate::core::session::{LineItem, PendingItem, Phase, Session};
use crate::core::toolcall::{self, AddItemDirective, ToolCall};
use crate::providers::LlmClient;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// The session accepts further turns.
    Continue,
    /// The conversation is over (committed or cancelled).
    Ended,
}

#[derive(Debug, Clone)]
pub struct TurnResult {
    pub reply: String,
    pub outcome: TurnOutcome,
}

impl TurnResult {
    fn say(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            outcome: TurnOutcome::Continue,
        }
    }

    fn end(reply: impl Into<String>) -> Self {
        Self {
            reply: reply.into(),
            outcome: TurnOutcome::Ended,
        }
    }
}

/// What applying one reply's directives did to the session.
#[derive(Debug, Default)]
struct DirectiveOutcome {
    committed: Option<order::ConfirmedOrder>,
    note: Option<String>,
}

pub struct DialogueEngine {
    catalog: MenuCatalog,
    llm: Arc<dyn LlmClient>,
    log: Arc<OrderLog>,
    transcript_cap: usize,
}

impl DialogueEngine {
    pub fn new(
        catalog: MenuCatalog,
        llm: Arc<dyn LlmClient>,
        log: Arc<OrderLog>,
        transcript_cap: usize,
    ) -> Self {
        Self {
            catalog,
            llm,
            log,
            transcript_cap,
        }
    }

    /// Start a conversation: fresh session with the system prompt pinned.
    pub fn open_session(&self) -> Session {
        Session::new(&prompts::order_taker(&self.catalog), self.transcript_cap)
    }

    pub fn greeting(&self) -> &'static str {
        lines::GREETING
    }

    /// Process one utterance to completion and compute the next phase.
    pub async fn take_turn(&self, session: &mut Session, utterance: &str) -> TurnResult {
        if extract::is_exit(utterance) {
            session.phase = Phase::Completed;
            return TurnResult::end(lines::FAREWELL);
        }
        if extract::is_order_inquiry(utterance) {
            return TurnResult::say(session.cart_summary());
        }

        match session.phase {
            Phase::Greeting | Phase::AskItem => self.handle_item_phase(session, utterance).await,
            Phase::AskFlavor => self.handle_ask_flavor(session, utterance).await,
            Phase::AskSize => self.handle_ask_size(session, utterance).await,
            Phase::AskMore => self.handle_ask_more(session, utterance).await,
            Phase::CollectAddress => self.handle_collect_address(session, utterance),
            Phase::CollectPhone => self.handle_collect_phone(session, utterance),
            Phase::ConfirmOrder => self.handle_confirm_order(session, utterance).await,
            Phase::Completed => TurnResult::end(lines::FAREWELL),
        }
    }

    async fn handle_item_phase(&self, session: &mut Session, utterance: &str) -> TurnResult {
        if extract::is_menu_inquiry(utterance) {
            session.phase = Phase::AskItem;
            return TurnResult::say(self.flavor_listing(utterance, 8, "What would you like to order?"));
        }
        if extract::is_pizza_request(utterance) {
            return self.start_pizza_item(session, utterance);
        }
        self.delegate(
            session,
            utterance,
            "Customer just started conversation. Guide them to order pizza.",
        )
        .await
    }

    async fn handle_ask_flavor(&self, session: &mut Session, utterance: &str) -> TurnResult {
        if extract::is_menu_inquiry(utterance) {
            return TurnResult::say(self.flavor_listing(utterance, 5, "Which one would you like?"));
        }
        if let Some(flavor) = extract::detect_flavor(utterance, self.catalog.flavors()) {
            match session.pending.as_mut() {
                Some(pending) => pending.name = Some(flavor.clone()),
                None => {
                    let mut pending = PendingItem::pizza(extract::extract_quantity(utterance));
                    pending.name = Some(flavor.clone());
                    session.pending = Some(pending);
                }
            }
            session.phase = Phase::AskSize;
            return TurnResult::say(format!(
                "{flavor} pizza! Which size? {}?",
                MenuCatalog::size_menu()
            ));
        }
        self.delegate(session, utterance, "Customer is choosing pizza flavor.")
            .await
    }

    async fn handle_ask_size(&self, session: &mut Session, utterance: &str) -> TurnResult {
        if let Some(size) = extract::detect_size(utterance, SIZES, SIZE_ALIASES) {
            let finalized = session
                .pending
                .take()
                .and_then(|pending| pending.finalize(Some(size.label.to_string())));
            return match finalized {
                Some(item) => {
                    let spoken = item.spoken();
                    session.cart.push(item);
                    session.phase = Phase::AskMore;
                    TurnResult::say(format!("Perfect! {spoken} added. Anything else?"))
                }
                None => {
                    // Sized an item that never got a name; back to flavors.
                    session.phase = Phase::AskFlavor;
                    TurnResult::say("Which flavor would you like?")
                }
            };
        }
        self.delegate(
            session,
            utterance,
            &format!(
                "Customer is choosing pizza size. Available: {}.",
                MenuCatalog::size_menu()
            ),
        )
        .await
    }

    async fn handle_ask_more(&self, session: &mut Session, utterance: &str) -> TurnResult {
        if extract::is_done_signal(utterance) {
            return if !session.has_valid_address() {
                session.phase = Phase::CollectAddress;
                TurnResult::say("Great! Now, please provide your full delivery address.")
            } else if !session.has_valid_phone() {
                session.phase = Phase::CollectPhone;
                TurnResult::say("Got the address. And your phone number please?")
            } else {
                session.phase = Phase::ConfirmOrder;
                TurnResult::say(self.confirmation_summary(session))
            };
        }
        if extract::is_pizza_request(utterance) {
            return self.start_pizza_item(session, utterance);
        }
        self.delegate(
            session,
            utterance,
            &format!(
                "Customer can add more items or finish the order. Current items: {}",
                session.cart.len()
            ),
        )
        .await
    }

    fn handle_collect_address(&self, session: &mut Session, utterance: &str) -> TurnResult {
        // The utterance is the address, verbatim.
        session.address = Some(utterance.trim().to_string());
        session.phase = Phase::CollectPhone;
        TurnResult::say("Got it! And your phone number please?")
    }

    fn handle_collect_phone(&self, session: &mut Session, utterance: &str) -> TurnResult {
        match extract::extract_phone_digits(utterance) {
            Some(digits) => {
                session.phone = Some(digits);
                session.phase = Phase::ConfirmOrder;
                TurnResult::say(self.confirmation_summary(session))
            }
            None => TurnResult::say("I didn't catch the phone number. Please say it again?"),
        }
    }

    async fn handle_confirm_order(&self, session: &mut Session, utterance: &str) -> TurnResult {
        if !extract::is_affirmative(utterance) {
            session.phase = Phase::AskMore;
            return TurnResult::say("No problem. What would you like to change?");
        }

        match order::commit(session, &self.catalog, &self.log).await {
            Ok(order) => {
                session.phase = Phase::Completed;
                TurnResult::end(format!(
                    "Perfect! Your order {} is confirmed. Estimated delivery in 30-45 minutes. Thank you!",
                    order.order_id
                ))
            }
            Err(err @ OrderError::Incomplete(_)) => {
                self.route_to_missing(session, err.missing_fields());
                TurnResult::say(format!("I can't confirm yet. {err}"))
            }
            Err(OrderError::Store(err)) => {
                tracing::error!(error = %err, "order log write failed");
                TurnResult::say("I cannot save the order yet. Please try again in a moment.")
            }
        }
    }

    /// Send the missing-detail validation result back to the right
    /// collection phase.
    fn route_to_missing(&self, session: &mut Session, fields: &[MissingField]) {
        if fields.contains(&MissingField::Address) {
            session.phase = Phase::CollectAddress;
        } else if fields.contains(&MissingField::Phone) {
            session.phase = Phase::CollectPhone;
        } else {
            session.phase = Phase::AskMore;
        }
    }

    fn start_pizza_item(&self, session: &mut Session, utterance: &str) -> TurnResult {
        let quantity = extract::extract_quantity(utterance);
        let mut pending = PendingItem::pizza(quantity);

        match extract::detect_flavor(utterance, self.catalog.flavors()) {
            Some(flavor) => {
                pending.name = Some(flavor.clone());
                session.pending = Some(pending);
                session.phase = Phase::AskSize;
                TurnResult::say(format!(
                    "Great! {quantity} {flavor} pizza. Which size? {}?",
                    MenuCatalog::size_menu()
                ))
            }
            None => {
                session.pending = Some(pending);
                session.phase = Phase::AskFlavor;
                TurnResult::say(format!("Sure! {quantity} pizza. Which flavor would you like?"))
            }
        }
    }

    /// Flavor enumeration for menu inquiries: everything under an "all"
    /// qualifier, a truncated preview otherwise.
    fn flavor_listing(&self, utterance: &str, preview: usize, tail: &str) -> String {
        let flavors = self.catalog.flavors();
        if extract::wants_full_list(utterance) || flavors.len() <= preview {
            format!("We have {}. {}", flavors.join(", "), tail)
        } else {
            format!("We have {}, and more. {}", flavors[..preview].join(", "), tail)
        }
    }

    fn confirmation_summary(&self, session: &Session) -> String {
        let items = session
            .cart
            .iter()
            .map(LineItem::spoken)
            .collect::<Vec<_>>()
            .join(", ");
        format!(
            "Let me confirm. {items}. Delivering to {}. Phone {}. Is this correct?",
            session.address.as_deref().unwrap_or(""),
            session.phone.as_deref().unwrap_or(""),
        )
    }

    /// Delegate the turn to the LLM collaborator.
    ///
    /// The injected context tells the collaborator what the deterministic
    /// side already knows - cart, details, and whether confirming is allowed.
    /// The raw reply (tool markup included) goes to the transcript so the
    /// collaborator's history reflects the calls it issued; the cleaned reply
    /// is surfaced to the customer.
    async fn delegate(&self, session: &mut Session, utterance: &str, phase_hint: &str) -> TurnResult {
        let context = self.build_context(session, phase_hint);
        let user_content = format!("Instruction: {context}\nUser: {utterance}");

        let mut messages: Vec<Message> = session.transcript.messages().to_vec();
        messages.push(Message {
            role: Role::User,
            content: user_content.clone(),
        });

        let raw = match self.llm.chat(&messages).await {
            Ok(text) => text,
            Err(err) => {
                tracing::warn!(error = %err, "LLM collaborator failed, degrading to fallback");
                return TurnResult::say(lines::FALLBACK);
            }
        };

        session.transcript.push_user(&user_content);
        session.transcript.push_assistant(&raw);

        let applied = self.apply_directives(session, &raw).await;

        let mut cleaned = toolcall::strip_directives(&raw);
        if cleaned.is_empty() {
            cleaned = lines::DONE.to_string();
        }

        if let Some(order) = applied.committed {
            session.phase = Phase::Completed;
            return TurnResult::end(format!("{cleaned} Order {} placed successfully!", order.order_id));
        }
        match applied.note {
            Some(note) => TurnResult::say(format!("{cleaned} {note}")),
            None => TurnResult::say(cleaned),
        }
    }

    fn build_context(&self, session: &Session, phase_hint: &str) -> String {
        let mut context = format!("Current Order Cart: [{}]. ", session.cart_line());

        match session.address.as_deref() {
            Some(address) if !address.is_empty() => {
                context.push_str(&format!("Address: {address}. "));
            }
            _ => context.push_str("Address: NOT PROVIDED. "),
        }
        match session.phone.as_deref() {
            Some(phone) if !phone.is_empty() => {
                context.push_str(&format!("Phone: {phone}. "));
            }
            _ => context.push_str("Phone: NOT PROVIDED. "),
        }

        let mut missing = Vec::new();
        if !session.has_valid_address() {
            missing.push("Address");
        }
        if !session.has_valid_phone() {
            missing.push("Phone");
        }
        if missing.is_empty() {
            context.push_str("STATUS: ALL DETAILS PRESENT. READY TO CONFIRM.");
        } else {
            context.push_str(&format!(
                "STATUS: MISSING DETAILS ({}). DO NOT CONFIRM ORDER. ASK FOR MISSING DETAILS.",
                missing.join(", ")
            ));
        }

        context.push(' ');
        context.push_str(phase_hint);

        if session.pending.is_some()
            || matches!(
                session.phase,
                Phase::AskItem | Phase::AskFlavor | Phase::AskSize
            )
        {
            context.push_str(
                " IMPORTANT: If the user provided item details (name/size/quantity), you MUST \
                 use the `[ADD_ITEM]` tool in your response. Do not just blindly acknowledge.",
            );
        }

        context
    }

    /// Apply the directives parsed out of one reply, at most one per pattern.
    async fn apply_directives(&self, session: &mut Session, raw: &str) -> DirectiveOutcome {
        let mut outcome = DirectiveOutcome::default();

        for call in toolcall::parse(raw) {
            match call {
                ToolCall::AddItem(directive) => self.apply_add_item(session, directive),
                ToolCall::SetDetails { address, phone } => {
                    // Last write wins, no merge.
                    if let Some(address) = address {
                        session.address = Some(address);
                    }
                    if let Some(phone) = phone {
                        session.phone = Some(phone);
                    }
                    tracing::debug!("customer details set by collaborator");
                }
                ToolCall::SaveOrder => {
                    if session.cart.is_empty()
                        || session.address.is_none()
                        || session.phone.is_none()
                    {
                        tracing::info!("SAVE_ORDER ignored: cart or details not ready");
                        continue;
                    }
                    match order::commit(session, &self.catalog, &self.log).await {
                        Ok(order) => outcome.committed = Some(order),
                        Err(err @ OrderError::Incomplete(_)) => {
                            self.route_to_missing(session, err.missing_fields());
                            outcome.note = Some(format!("I can't save the order yet. {err}"));
                        }
                        Err(OrderError::Store(err)) => {
                            tracing::error!(error = %err, "order log write failed");
                            outcome.note = Some(
                                "I cannot save the order yet. Please try again in a moment."
                                    .to_string(),
                            );
                        }
                    }
                }
            }
        }

        outcome
    }

    fn apply_add_item(&self, session: &mut Session, directive: AddItemDirective) {
        let AddItemDirective {
            name,
            size,
            quantity,
            special_request,
        } = directive;

        match (name, size) {
            (Some(name), Some(size)) => {
                let item = LineItem {
                    category: "Pizza".to_string(),
                    name,
                    size: Some(size),
                    quantity,
                    special_request,
                };
                tracing::info!(item = %item.label(), "item added by collaborator");
                session.cart.push(item);
            }
            (Some(name), None) => {
                // Partial item: stash it and let the deterministic side
                // collect the size instead of trusting the collaborator again.
                session.pending = Some(PendingItem {
                    category: "Pizza".to_string(),
                    quantity,
                    name: Some(name),
                    special_request,
                });
                session.phase = Phase::AskSize;
                tracing::info!("partial item stashed, re-prompting for size");
            }
            (None, _) => {
                tracing::warn!("ignored ADD_ITEM with no name");
            }
        }
    }
}
