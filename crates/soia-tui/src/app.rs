use std::sync::Arc;

use ratatui::layout::Rect;
use soia_core::{ApiError, ChatApi, ChatResponse, ChatSession, Ticket, TurnOutcome};
use tokio::sync::mpsc::UnboundedSender;

use crate::input::ChatInput;
use crate::tui::AppEvent;
use crate::welcome::EXAMPLES;

pub struct App {
    pub should_quit: bool,

    // Conversation
    pub session: ChatSession,
    pub api: Arc<dyn ChatApi>,
    events: UnboundedSender<AppEvent>,

    // Input box
    pub input: ChatInput,

    // Welcome screen
    pub selected_example: usize,

    // Message list scrolling
    pub chat_scroll: u16,
    pub follow_output: bool,
    pub max_scroll: u16,
    pub chat_height: u16,

    /// Terminal reports Shift+Enter distinctly from Enter
    pub keyboard_enhanced: bool,

    /// `None` until the startup health probe answers
    pub service_online: Option<bool>,

    // Animation state
    pub animation_frame: u8, // 0-2 for the typing indicator

    // Areas for mouse hit-testing (updated during render)
    pub chat_area: Option<Rect>,
    pub example_areas: Vec<Rect>,
}

impl App {
    pub fn new(api: Arc<dyn ChatApi>, events: UnboundedSender<AppEvent>) -> Self {
        Self {
            should_quit: false,
            session: ChatSession::new(),
            api,
            events,
            input: ChatInput::new(),
            selected_example: 0,
            chat_scroll: 0,
            follow_output: true,
            max_scroll: 0,
            chat_height: 0,
            keyboard_enhanced: false,
            service_online: None,
            animation_frame: 0,
            chat_area: None,
            example_areas: Vec::new(),
        }
    }

    /// Start a turn and send it in the background.
    ///
    /// Returns false when the session rejected the text.
    pub fn send(&mut self, text: &str) -> bool {
        let Some(turn) = self.session.submit(text) else {
            return false;
        };

        let api = Arc::clone(&self.api);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = api.send(turn.request).await;
            // The loop is gone if this fails; nothing left to update
            let _ = events.send(AppEvent::Reply {
                ticket: turn.ticket,
                outcome,
            });
        });

        self.animation_frame = 0;
        self.follow_output = true;
        true
    }

    /// Send whatever is in the input box, clearing it if accepted.
    pub fn send_input(&mut self) {
        let text = self.input.text().to_string();
        if self.send(&text) {
            self.input.clear();
        }
    }

    pub fn send_example(&mut self, index: usize) {
        if let Some(example) = EXAMPLES.get(index) {
            self.selected_example = index;
            self.send(example.question);
        }
    }

    pub fn apply_reply(&mut self, ticket: Ticket, outcome: Result<ChatResponse, ApiError>) {
        if self.session.resolve(ticket, outcome) != TurnOutcome::Ignored {
            self.follow_output = true;
        }
    }

    pub fn new_chat(&mut self) {
        self.session.new_chat();
        self.input.clear();
        self.selected_example = 0;
        self.chat_scroll = 0;
        self.follow_output = true;
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.session.is_pending() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }

    pub fn example_nav_down(&mut self) {
        self.selected_example = (self.selected_example + 1) % EXAMPLES.len();
    }

    pub fn example_nav_up(&mut self) {
        self.selected_example = (self.selected_example + EXAMPLES.len() - 1) % EXAMPLES.len();
    }

    pub fn scroll_up(&mut self, amount: u16) {
        self.follow_output = false;
        self.chat_scroll = self.chat_scroll.min(self.max_scroll).saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: u16) {
        self.chat_scroll = self.chat_scroll.saturating_add(amount);
        if self.chat_scroll >= self.max_scroll {
            self.chat_scroll = self.max_scroll;
            self.follow_output = true;
        }
    }

    pub fn half_page(&self) -> u16 {
        (self.chat_height / 2).max(1)
    }
}
