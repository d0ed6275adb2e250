use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::App;
use crate::tui::AppEvent;

const WHEEL_LINES: u16 = 3;

pub fn handle_event(app: &mut App, event: AppEvent) {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => app.tick_animation(),
        AppEvent::Reply { ticket, outcome } => app.apply_reply(ticket, outcome),
        AppEvent::Health(online) => app.service_online = Some(online),
    }
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    // Global keys
    match key.code {
        KeyCode::Char('c') if ctrl => {
            app.should_quit = true;
            return;
        }
        KeyCode::Esc => {
            app.should_quit = true;
            return;
        }
        KeyCode::Char('n') if ctrl => {
            app.new_chat();
            return;
        }
        KeyCode::PageUp => {
            app.scroll_up(app.half_page());
            return;
        }
        KeyCode::PageDown => {
            app.scroll_down(app.half_page());
            return;
        }
        _ => {}
    }

    // Welcome screen: arrows pick an example while nothing is typed
    let on_welcome = app.session.is_empty() && app.input.is_blank();

    match key.code {
        KeyCode::Up if on_welcome => app.example_nav_up(),
        KeyCode::Down if on_welcome => app.example_nav_down(),
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        _ => handle_input_key(app, key),
    }
}

/// Editing keys. The input is disabled while a reply is pending.
fn handle_input_key(app: &mut App, key: KeyEvent) {
    if app.session.is_pending() {
        return;
    }

    match key.code {
        KeyCode::Enter
            if key.modifiers.intersects(KeyModifiers::SHIFT | KeyModifiers::ALT) =>
        {
            app.input.insert_newline();
        }
        KeyCode::Enter => {
            if app.session.is_empty() && app.input.is_blank() {
                app.send_example(app.selected_example);
            } else {
                app.send_input();
            }
        }
        KeyCode::Backspace => app.input.backspace(),
        KeyCode::Delete => app.input.delete(),
        KeyCode::Left => app.input.move_left(),
        KeyCode::Right => app.input.move_right(),
        KeyCode::Home => app.input.move_home(),
        KeyCode::End => app.input.move_end(),
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            app.input.insert_char(c);
        }
        _ => {}
    }
}

fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let (x, y) = (mouse.column, mouse.row);

    match mouse.kind {
        MouseEventKind::ScrollUp => {
            if app.chat_area.is_some_and(|area| point_in_rect(x, y, area)) {
                app.scroll_up(WHEEL_LINES);
            }
        }
        MouseEventKind::ScrollDown => {
            if app.chat_area.is_some_and(|area| point_in_rect(x, y, area)) {
                app.scroll_down(WHEEL_LINES);
            }
        }
        MouseEventKind::Down(MouseButton::Left) => {
            if !app.session.is_empty() || app.session.is_pending() {
                return;
            }
            let clicked = app
                .example_areas
                .iter()
                .position(|&area| point_in_rect(x, y, area));
            if let Some(index) = clicked {
                app.send_example(index);
            }
        }
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::welcome::EXAMPLES;
    use async_trait::async_trait;
    use soia_core::{ApiError, ChatApi, ChatMessage, ChatRequest, ChatResponse, FALLBACK_REPLY};
    use std::sync::Arc;
    use tokio::sync::mpsc;

    struct EchoApi;

    #[async_trait]
    impl ChatApi for EchoApi {
        async fn send(&self, request: ChatRequest) -> Result<ChatResponse, ApiError> {
            Ok(ChatResponse::new("c1", format!("echo: {}", request.message)))
        }
    }

    struct DownApi;

    #[async_trait]
    impl ChatApi for DownApi {
        async fn send(&self, _request: ChatRequest) -> Result<ChatResponse, ApiError> {
            Err(ApiError::Decode("unexpected end of input".to_string()))
        }
    }

    fn app_with(api: Arc<dyn ChatApi>) -> (App, mpsc::UnboundedReceiver<AppEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (App::new(api, tx), rx)
    }

    fn press(app: &mut App, code: KeyCode) {
        press_with(app, code, KeyModifiers::NONE);
    }

    fn press_with(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
        handle_event(app, AppEvent::Key(KeyEvent::new(code, modifiers)));
    }

    fn type_text(app: &mut App, text: &str) {
        for c in text.chars() {
            press(app, KeyCode::Char(c));
        }
    }

    /// Wait for the background request and feed its reply to the handler.
    async fn deliver_reply(app: &mut App, rx: &mut mpsc::UnboundedReceiver<AppEvent>) {
        let event = rx.recv().await.unwrap();
        assert!(matches!(event, AppEvent::Reply { .. }));
        handle_event(app, event);
    }

    #[tokio::test]
    async fn test_enter_sends_trimmed_input() {
        let (mut app, mut rx) = app_with(Arc::new(EchoApi));

        type_text(&mut app, "  Hello ");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.input.text(), "");
        assert_eq!(app.session.messages(), &[ChatMessage::user("Hello")]);
        assert!(app.session.is_pending());

        deliver_reply(&mut app, &mut rx).await;

        assert_eq!(
            app.session.messages(),
            &[ChatMessage::user("Hello"), ChatMessage::assistant("echo: Hello")]
        );
        assert_eq!(app.session.conversation_id(), Some("c1"));
        assert!(!app.session.is_pending());
    }

    #[tokio::test]
    async fn test_input_disabled_while_pending() {
        let (mut app, _rx) = app_with(Arc::new(EchoApi));

        type_text(&mut app, "first");
        press(&mut app, KeyCode::Enter);
        type_text(&mut app, "second");
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.input.text(), "");
        assert_eq!(app.session.messages().len(), 1);
    }

    #[tokio::test]
    async fn test_failure_shows_fallback() {
        let (mut app, mut rx) = app_with(Arc::new(DownApi));

        type_text(&mut app, "Hello");
        press(&mut app, KeyCode::Enter);
        deliver_reply(&mut app, &mut rx).await;

        assert_eq!(
            app.session.messages().last(),
            Some(&ChatMessage::assistant(FALLBACK_REPLY))
        );
        assert_eq!(app.session.conversation_id(), None);
    }

    #[tokio::test]
    async fn test_shift_enter_inserts_newline() {
        let (mut app, _rx) = app_with(Arc::new(EchoApi));

        type_text(&mut app, "line one");
        press_with(&mut app, KeyCode::Enter, KeyModifiers::SHIFT);
        type_text(&mut app, "line two");

        assert_eq!(app.input.text(), "line one\nline two");
        assert!(app.session.is_empty());
        assert_eq!(app.input.height(40), 2);
    }

    #[tokio::test]
    async fn test_alt_enter_inserts_newline() {
        let (mut app, _rx) = app_with(Arc::new(EchoApi));

        type_text(&mut app, "line one");
        press_with(&mut app, KeyCode::Enter, KeyModifiers::ALT);
        type_text(&mut app, "line two");

        assert_eq!(app.input.text(), "line one\nline two");
        assert!(app.session.is_empty());
    }

    #[tokio::test]
    async fn test_welcome_arrows_pick_example() {
        let (mut app, mut rx) = app_with(Arc::new(EchoApi));

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected_example, 1);

        press(&mut app, KeyCode::Up);
        press(&mut app, KeyCode::Up);
        assert_eq!(app.selected_example, EXAMPLES.len() - 1);

        press(&mut app, KeyCode::Enter);
        assert_eq!(
            app.session.messages(),
            &[ChatMessage::user(EXAMPLES[EXAMPLES.len() - 1].question)]
        );
        deliver_reply(&mut app, &mut rx).await;
        assert_eq!(app.session.messages().len(), 2);
    }

    #[tokio::test]
    async fn test_click_on_example_sends_it() {
        let (mut app, _rx) = app_with(Arc::new(EchoApi));
        app.example_areas = vec![Rect::new(0, 10, 40, 4), Rect::new(0, 14, 40, 4)];

        let click = MouseEvent {
            kind: MouseEventKind::Down(MouseButton::Left),
            column: 5,
            row: 15,
            modifiers: KeyModifiers::NONE,
        };
        handle_event(&mut app, AppEvent::Mouse(click));

        assert_eq!(app.session.messages(), &[ChatMessage::user(EXAMPLES[1].question)]);
    }

    #[tokio::test]
    async fn test_new_chat_discards_late_reply() {
        let (mut app, mut rx) = app_with(Arc::new(EchoApi));

        type_text(&mut app, "Hello");
        press(&mut app, KeyCode::Enter);
        press_with(&mut app, KeyCode::Char('n'), KeyModifiers::CONTROL);

        assert!(app.session.is_empty());
        assert!(app.session.is_pending());

        deliver_reply(&mut app, &mut rx).await;

        assert!(app.session.is_empty());
        assert_eq!(app.session.conversation_id(), None);
        assert!(!app.session.is_pending());
    }

    #[tokio::test]
    async fn test_quit_keys() {
        let (mut app, _rx) = app_with(Arc::new(EchoApi));
        press_with(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
        assert_eq!(app.input.text(), "");

        let (mut app, _rx) = app_with(Arc::new(EchoApi));
        press(&mut app, KeyCode::Esc);
        assert!(app.should_quit);
    }

    #[tokio::test]
    async fn test_scroll_keys_leave_follow_mode() {
        let (mut app, _rx) = app_with(Arc::new(EchoApi));
        app.max_scroll = 30;
        app.chat_scroll = 30;
        app.chat_height = 10;

        press(&mut app, KeyCode::PageUp);
        assert_eq!(app.chat_scroll, 25);
        assert!(!app.follow_output);

        press(&mut app, KeyCode::PageDown);
        assert_eq!(app.chat_scroll, 30);
        assert!(app.follow_output);
    }
}
